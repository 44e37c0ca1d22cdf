//! u508: пакетный импорт резервирований из CSV
//!
//! Файл -> `pipeline::load_file` (разбор, нормализация, проверка) ->
//! `UploadSession` (collecting -> uploading -> completed) ->
//! `BatchSubmitter` (один запрос на весь пакет) -> `Reconciliation`
//! (итоги и выбор строк с ошибками).

pub mod api;
pub mod controller;
pub mod outcome;
pub mod picker;
pub mod pipeline;
pub mod reconcile;
pub mod session;
pub mod validate;
pub mod view;

pub use view::{open_reservations_import, ReservationsImportButton};
