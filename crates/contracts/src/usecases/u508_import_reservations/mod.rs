pub mod record;
pub mod request;
pub mod response;

pub use record::{ReservationRecord, FIELD_NOTE, FIELD_NUMBER, FIELD_PRODUCT_ID};
pub use request::ImportReservationsRequest;
pub use response::{ImportReservationsResponse, RejectedReservationsBody, RowErrors};
