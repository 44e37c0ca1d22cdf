//! Файл -> проверенный набор записей.

use chrono::{DateTime, Utc};
use contracts::usecases::u508_import_reservations::{ReservationRecord, FIELD_NOTE};

use super::session::LoadedFile;
use super::validate::validate;
use crate::shared::config::ImportConfig;
use crate::shared::csv_importer::{normalize, read_csv, DerivedField, ImportError};
use crate::system::auth::Uploader;

pub const UPLOADED_AT_FORMAT: &str = "%d.%m.%Y %H:%M";

/// Комментарий для строк, где `note` не заполнен
pub fn note_field(
    config: &ImportConfig,
    uploader: &Uploader,
    uploaded_at: DateTime<Utc>,
) -> Result<DerivedField, ImportError> {
    Ok(DerivedField::new(FIELD_NOTE, config.note_template.as_str())?
        .with_context("uploaded_at", uploaded_at.format(UPLOADED_AT_FORMAT).to_string())
        .with_context("uploader", uploader.contact()))
}

/// Разбор, нормализация и проверка одного файла.
///
/// Ошибка возвращается, если файл нельзя прочитать как CSV или шаблон
/// комментария в настройках некорректен; ошибки в данных попадают в отчёт
/// `LoadedFile::report`.
pub fn load_file(
    file_name: &str,
    size: u64,
    text: &str,
    config: &ImportConfig,
    uploader: &Uploader,
    uploaded_at: DateTime<Utc>,
) -> Result<LoadedFile, ImportError> {
    let table = read_csv(file_name, text.as_bytes(), &config.accepted_extension)?;
    let header = table.header.clone();
    let note = note_field(config, uploader, uploaded_at)?;

    let records: Vec<ReservationRecord> = normalize(&header, table, Some(&note))?
        .into_iter()
        .map(ReservationRecord::from)
        .collect();
    let report = validate(&records, &config.placeholder_number);

    log::info!(
        "Loaded {}: {} records, valid: {}",
        file_name,
        records.len(),
        report.is_valid()
    );

    Ok(LoadedFile {
        name: file_name.to_string(),
        size,
        header,
        records,
        report,
    })
}
