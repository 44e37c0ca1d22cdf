use once_cell::sync::Lazy;
use serde::Deserialize;

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub import: ImportConfig,
}

/// Настройки импорта резервирований из CSV
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct ImportConfig {
    /// Endpoint пакетного резервирования (относительный путь -> от api_base)
    pub endpoint: String,
    /// Готовый пример файла для скачивания
    pub sample_file: String,
    /// Единственное допустимое расширение файла
    pub accepted_extension: String,
    /// Значение `number` из примера; если его не заменили, строка ошибочна
    pub placeholder_number: String,
    /// Шаблон MiniJinja для `note` в строках без комментария
    pub note_template: String,
    /// Сколько записей показывать в предпросмотре
    pub preview_rows: usize,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            endpoint: "/api/u508/reservations/batch".to_string(),
            sample_file: "/static/samples/reservations_sample.csv".to_string(),
            accepted_extension: "csv".to_string(),
            placeholder_number: "000000000000".to_string(),
            note_template:
                "Резервирование {{ number }} (товар {{ product_id }}), загружено {{ uploaded_at }}, {{ uploader }}"
                    .to_string(),
            preview_rows: 50,
        }
    }
}

/// Configuration embedded in the bundle
const DEFAULT_CONFIG: &str = r#"
[import]
endpoint = "/api/u508/reservations/batch"
sample_file = "/static/samples/reservations_sample.csv"
accepted_extension = "csv"
placeholder_number = "000000000000"
note_template = "Резервирование {{ number }} (товар {{ product_id }}), загружено {{ uploaded_at }}, {{ uploader }}"
preview_rows = 50
"#;

static CONFIG: Lazy<Config> = Lazy::new(load_config);

pub fn parse_config(source: &str) -> Result<Config, toml::de::Error> {
    toml::from_str(source)
}

/// Load the embedded configuration, falling back to built-in defaults
pub fn load_config() -> Config {
    match parse_config(DEFAULT_CONFIG) {
        Ok(config) => config,
        Err(e) => {
            log::warn!("Embedded config is invalid, using defaults: {}", e);
            Config::default()
        }
    }
}

pub fn import_config() -> &'static ImportConfig {
    &CONFIG.import
}
