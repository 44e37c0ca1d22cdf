//! Импорт табличных данных из CSV
//!
//! Конвейер: `read_csv` (заголовок + ленивые строки) -> `normalize`
//! (строки -> записи поле/значение). Проверка записей делается
//! в конкретном usecase, здесь только общий разбор.

pub mod browser;
pub mod error;
pub mod ingest;
pub mod normalize;
pub mod types;
pub mod writer;

pub use error::ImportError;
pub use ingest::{is_accepted_file, read_csv, CsvTable};
pub use normalize::{normalize, normalize_row, DerivedField, Fields};
pub use types::{row_number, Header, RawRow};
pub use writer::write_csv;
