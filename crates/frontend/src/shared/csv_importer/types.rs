/// Заголовок файла: имена полей в порядке колонок
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Header(Vec<String>);

impl Header {
    pub fn new<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(fields.into_iter().map(Into::into).collect())
    }

    /// Первая строка файла. UTF-8 BOM (его добавляет Excel) отрезается.
    pub fn from_record(record: &csv::StringRecord) -> Self {
        Self(
            record
                .iter()
                .enumerate()
                .map(|(idx, cell)| {
                    let cell = if idx == 0 {
                        cell.trim_start_matches('\u{FEFF}')
                    } else {
                        cell
                    };
                    cell.trim().to_string()
                })
                .collect(),
        )
    }

    pub fn fields(&self) -> &[String] {
        &self.0
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.iter().any(|f| f == name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Строка данных как она есть в файле
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawRow {
    /// Номер строки в исходном файле (1-based, для сообщений)
    pub line: u64,
    pub cells: Vec<String>,
}

impl RawRow {
    pub fn new<I, S>(line: u64, cells: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            line,
            cells: cells.into_iter().map(Into::into).collect(),
        }
    }

    pub fn from_record(record: csv::StringRecord) -> Self {
        let line = record.position().map(|p| p.line()).unwrap_or(0);
        Self {
            line,
            cells: record.iter().map(str::to_string).collect(),
        }
    }

    /// Все ячейки пустые после trim
    pub fn is_blank(&self) -> bool {
        self.cells.iter().all(|c| c.trim().is_empty())
    }
}

/// Номер строки для пользователя.
///
/// Считаются только записи, пережившие нормализацию, в том порядке, в котором
/// они уходят на сервер: `index`: позиция в этом списке (0-based), результат
/// 1-based. Пустые строки файла в нумерации не участвуют, поэтому номер
/// может не совпадать с номером строки в редакторе.
pub fn row_number(index: usize) -> usize {
    index + 1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_number_is_one_based() {
        assert_eq!(row_number(0), 1);
        assert_eq!(row_number(9), 10);
    }

    #[test]
    fn test_header_strips_bom_and_spaces() {
        let record = csv::StringRecord::from(vec!["\u{FEFF}product_id", " number "]);
        let header = Header::from_record(&record);
        assert_eq!(header.fields(), &["product_id".to_string(), "number".to_string()]);
        assert!(header.contains("number"));
    }

    #[test]
    fn test_blank_row() {
        assert!(RawRow::new(3, ["", "  ", "\t"]).is_blank());
        assert!(RawRow::new(3, Vec::<String>::new()).is_blank());
        assert!(!RawRow::new(3, ["", "x"]).is_blank());
    }
}
