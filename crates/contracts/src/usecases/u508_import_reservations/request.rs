use serde::{Deserialize, Serialize};

use super::record::ReservationRecord;

/// Запрос пакетного резервирования: все строки файла одним запросом
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImportReservationsRequest {
    pub reservations: Vec<ReservationRecord>,
}

impl ImportReservationsRequest {
    pub fn new(reservations: Vec<ReservationRecord>) -> Self {
        Self { reservations }
    }

    pub fn len(&self) -> usize {
        self.reservations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reservations.is_empty()
    }
}
