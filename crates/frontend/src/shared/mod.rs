pub mod api_utils;
pub mod config;
pub mod csv_importer;
pub mod export;
pub mod icons;
pub mod modal_frame;
pub mod modal_stack;
