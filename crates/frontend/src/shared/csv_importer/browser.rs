use wasm_bindgen_futures::JsFuture;

/// Читает выбранный пользователем файл целиком как текст (UTF-8)
pub async fn read_file_text(file: &web_sys::File) -> Result<String, String> {
    let value = JsFuture::from(file.text())
        .await
        .map_err(|e| format!("Ошибка чтения файла: {:?}", e))?;

    value
        .as_string()
        .ok_or_else(|| "Содержимое файла не является текстом".to_string())
}
