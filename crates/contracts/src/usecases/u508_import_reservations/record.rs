use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Идентификатор товара, обязательное поле
pub const FIELD_PRODUCT_ID: &str = "product_id";
/// Номер резервирования, обязательное поле
pub const FIELD_NUMBER: &str = "number";
/// Комментарий; если в файле его нет, фронтенд формирует его сам
pub const FIELD_NOTE: &str = "note";

/// Одна строка импорта: имя поля -> значение.
///
/// На проводе это плоский JSON-объект, поэтому тип прозрачен для serde.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReservationRecord(BTreeMap<String, String>);

impl ReservationRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<String>) {
        self.0.insert(field.into(), value.into());
    }

    pub fn product_id(&self) -> Option<&str> {
        self.get(FIELD_PRODUCT_ID)
    }

    pub fn number(&self) -> Option<&str> {
        self.get(FIELD_NUMBER)
    }

    pub fn note(&self) -> Option<&str> {
        self.get(FIELD_NOTE)
    }

    pub fn fields(&self) -> &BTreeMap<String, String> {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl From<BTreeMap<String, String>> for ReservationRecord {
    fn from(fields: BTreeMap<String, String>) -> Self {
        Self(fields)
    }
}

impl<K, V> FromIterator<(K, V)> for ReservationRecord
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serializes_as_flat_object() {
        let record: ReservationRecord = [("product_id", "42"), ("number", "123456789012")]
            .into_iter()
            .collect();
        let json = serde_json::to_string(&record).unwrap();
        assert_eq!(json, r#"{"number":"123456789012","product_id":"42"}"#);
    }

    #[test]
    fn test_accessors() {
        let record: ReservationRecord = [("product_id", "7"), ("note", "manual")]
            .into_iter()
            .collect();
        assert_eq!(record.product_id(), Some("7"));
        assert_eq!(record.number(), None);
        assert_eq!(record.note(), Some("manual"));
        assert!(!record.contains(FIELD_NUMBER));
    }
}
