use thiserror::Error;

/// Ошибки разбора входного файла
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ImportError {
    /// Расширение файла не поддерживается. Для UI это не ошибка:
    /// такой файл просто игнорируется.
    #[error("Неподдерживаемый формат файла: {file_name}")]
    UnsupportedFormat { file_name: String },

    #[error("Строка {line}: {message}")]
    Malformed { line: u64, message: String },

    #[error("Ошибка чтения файла: {0}")]
    Read(String),

    #[error("Ошибка формирования CSV: {0}")]
    Write(String),

    #[error("Ошибка шаблона: {0}")]
    Template(String),
}

impl From<csv::Error> for ImportError {
    fn from(err: csv::Error) -> Self {
        let line = err.position().map(|p| p.line()).unwrap_or(0);
        ImportError::Malformed {
            line,
            message: err.to_string(),
        }
    }
}

impl From<minijinja::Error> for ImportError {
    fn from(err: minijinja::Error) -> Self {
        ImportError::Template(err.to_string())
    }
}
