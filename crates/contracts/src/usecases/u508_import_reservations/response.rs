use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Ошибки по строкам: ключ строки (позиция в отправленном массиве) -> сообщение
pub type RowErrors = BTreeMap<String, String>;

/// Ответ backend на пакетное резервирование (HTTP 2xx).
///
/// Форме ответа мы доверяем не полностью: `errors` может отсутствовать
/// или прийти не объектом, `reserved` может отсутствовать.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImportReservationsResponse {
    /// Созданные резервирования (нас интересует только их количество)
    #[serde(default, deserialize_with = "lenient_reserved")]
    pub reserved: Vec<Value>,
    #[serde(default, deserialize_with = "lenient_row_errors")]
    pub errors: RowErrors,
}

/// Тело ответа HTTP 422: backend отклонил пакет целиком
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RejectedReservationsBody {
    #[serde(default, deserialize_with = "lenient_row_errors")]
    pub errors: RowErrors,
}

fn lenient_reserved<'de, D>(deserializer: D) -> Result<Vec<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Array(items)) => items,
        _ => Vec::new(),
    })
}

/// Не-объект трактуется как "ошибок нет", нестроковые значения
/// сохраняются в виде JSON-текста.
fn lenient_row_errors<'de, D>(deserializer: D) -> Result<RowErrors, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Object(map)) => map
            .into_iter()
            .map(|(key, value)| {
                let message = match value {
                    Value::String(s) => s,
                    other => other.to_string(),
                };
                (key, message)
            })
            .collect(),
        _ => RowErrors::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_errors_absent() {
        let resp: ImportReservationsResponse =
            serde_json::from_str(r#"{"reserved":[{"number":"1"}]}"#).unwrap();
        assert_eq!(resp.reserved.len(), 1);
        assert!(resp.errors.is_empty());
    }

    #[test]
    fn test_errors_not_an_object() {
        let resp: ImportReservationsResponse =
            serde_json::from_str(r#"{"reserved":[],"errors":"boom"}"#).unwrap();
        assert!(resp.errors.is_empty());

        let resp: ImportReservationsResponse =
            serde_json::from_str(r#"{"reserved":[],"errors":null}"#).unwrap();
        assert!(resp.errors.is_empty());
    }

    #[test]
    fn test_non_string_messages_kept_as_json() {
        let resp: ImportReservationsResponse =
            serde_json::from_str(r#"{"errors":{"0":"taken","3":{"code":17}}}"#).unwrap();
        assert!(resp.reserved.is_empty());
        assert_eq!(resp.errors.get("0").map(String::as_str), Some("taken"));
        assert_eq!(resp.errors.get("3").map(String::as_str), Some(r#"{"code":17}"#));
    }

    #[test]
    fn test_rejected_body() {
        let body: RejectedReservationsBody =
            serde_json::from_str(r#"{"errors":{"1":"duplicate"}}"#).unwrap();
        assert_eq!(body.errors.len(), 1);
    }
}
