use std::io::Read;
use std::path::Path;

use super::error::ImportError;
use super::types::{Header, RawRow};

/// Разобранный CSV-источник.
///
/// Заголовок читается сразу, строки данных отдаются лениво, по одной, в
/// исходном порядке. Повторно пройти по строкам нельзя: итератор
/// потребляет источник.
pub struct CsvTable<R: Read> {
    pub file_name: String,
    pub header: Header,
    rows: csv::StringRecordsIntoIter<R>,
}

impl<R: Read> Iterator for CsvTable<R> {
    type Item = Result<RawRow, ImportError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.rows
            .next()
            .map(|result| result.map(RawRow::from_record).map_err(ImportError::from))
    }
}

/// Проверка расширения без учёта регистра (`accepted_extension` без точки или с ней)
pub fn is_accepted_file(file_name: &str, accepted_extension: &str) -> bool {
    let accepted = accepted_extension.trim_start_matches('.');
    Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case(accepted))
        .unwrap_or(false)
}

/// Открывает CSV: проверяет имя файла и читает первую строку как заголовок.
///
/// Для неподходящего имени возвращает `UnsupportedFormat`, не трогая источник.
/// Пустой файл даёт пустой заголовок и ни одной строки.
pub fn read_csv<R: Read>(
    file_name: &str,
    source: R,
    accepted_extension: &str,
) -> Result<CsvTable<R>, ImportError> {
    if !is_accepted_file(file_name, accepted_extension) {
        return Err(ImportError::UnsupportedFormat {
            file_name: file_name.to_string(),
        });
    }

    let mut rows = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(source)
        .into_records();

    let header = match rows.next() {
        Some(first) => Header::from_record(&first?),
        None => Header::default(),
    };

    log::debug!(
        "CSV {}: header {:?}",
        file_name,
        header.fields()
    );

    Ok(CsvTable {
        file_name: file_name.to_string(),
        header,
        rows,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepted_extension() {
        assert!(is_accepted_file("reservations.csv", "csv"));
        assert!(is_accepted_file("RESERVATIONS.CSV", ".csv"));
        assert!(!is_accepted_file("reservations.xlsx", "csv"));
        assert!(!is_accepted_file("csv", "csv"));
        assert!(!is_accepted_file("reservations.csv.txt", "csv"));
    }

    #[test]
    fn test_unsupported_format_is_rejected() {
        let err = read_csv("data.xlsx", "a,b\n1,2\n".as_bytes(), "csv")
            .err()
            .unwrap();
        assert_eq!(
            err,
            ImportError::UnsupportedFormat {
                file_name: "data.xlsx".to_string()
            }
        );
    }

    #[test]
    fn test_header_and_rows_in_order() {
        let text = "product_id,number\n1,111\n2,222\n3,333\n";
        let mut table = read_csv("r.csv", text.as_bytes(), "csv").unwrap();
        assert_eq!(table.header, Header::new(["product_id", "number"]));

        let rows: Vec<RawRow> = table.by_ref().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].cells, vec!["1", "111"]);
        assert_eq!(rows[2].cells, vec!["3", "333"]);
        assert_eq!(rows[1].line, 3);
        assert!(table.next().is_none());
    }

    #[test]
    fn test_ragged_rows_are_accepted() {
        let text = "product_id,number,note\n1,111\n2,222,x,extra\n";
        let rows: Vec<RawRow> = read_csv("r.csv", text.as_bytes(), "csv")
            .unwrap()
            .map(|r| r.unwrap())
            .collect();
        assert_eq!(rows[0].cells.len(), 2);
        assert_eq!(rows[1].cells.len(), 4);
    }

    #[test]
    fn test_empty_source() {
        let mut table = read_csv("empty.csv", "".as_bytes(), "csv").unwrap();
        assert!(table.header.is_empty());
        assert!(table.next().is_none());
    }

    #[test]
    fn test_invalid_utf8_is_malformed() {
        let bytes: &[u8] = b"product_id,number\n1,\xff\xfe\n";
        let result: Result<Vec<RawRow>, ImportError> =
            read_csv("r.csv", bytes, "csv").unwrap().collect();
        assert!(matches!(result, Err(ImportError::Malformed { .. })));
    }
}
