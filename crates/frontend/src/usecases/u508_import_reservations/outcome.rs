use contracts::usecases::u508_import_reservations::{
    ImportReservationsResponse, RejectedReservationsBody, RowErrors,
};

/// HTTP 422: backend отклонил весь пакет и вернул ошибки по строкам
pub const STATUS_UNPROCESSABLE: u16 = 422;

/// Откуда пришёл полный отказ
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureOrigin {
    /// Обычный ответ, ни одна строка не принята
    Reported,
    /// Ответ 422 с ошибками вместо результата
    Rejected,
}

/// Результат отправки пакета, разобранный один раз на границе с сетью.
/// Дальше по коду сырой ответ не анализируется.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionOutcome {
    Accepted { accepted: usize },
    PartialFailure { accepted: usize, errors: RowErrors },
    TotalFailure { errors: RowErrors, origin: FailureOrigin },
    TransportFailure { reason: String },
}

impl SubmissionOutcome {
    pub fn transport(reason: impl Into<String>) -> Self {
        SubmissionOutcome::TransportFailure {
            reason: reason.into(),
        }
    }

    /// Классификация корректного ответа (2xx)
    pub fn from_response(response: ImportReservationsResponse) -> Self {
        let accepted = response.reserved.len();
        let errors = response.errors;

        if errors.is_empty() {
            SubmissionOutcome::Accepted { accepted }
        } else if accepted == 0 {
            SubmissionOutcome::TotalFailure {
                errors,
                origin: FailureOrigin::Reported,
            }
        } else {
            SubmissionOutcome::PartialFailure { accepted, errors }
        }
    }

    /// Разбор HTTP-ответа по статусу и телу
    pub fn decode(status: u16, body: &str) -> Self {
        if (200..300).contains(&status) {
            return match serde_json::from_str::<ImportReservationsResponse>(body) {
                Ok(response) => SubmissionOutcome::from_response(response),
                Err(e) => SubmissionOutcome::transport(format!(
                    "Некорректный ответ сервера: {}",
                    e
                )),
            };
        }

        if status == STATUS_UNPROCESSABLE {
            if let Ok(rejected) = serde_json::from_str::<RejectedReservationsBody>(body) {
                if !rejected.errors.is_empty() {
                    return SubmissionOutcome::TotalFailure {
                        errors: rejected.errors,
                        origin: FailureOrigin::Rejected,
                    };
                }
            }
        }

        let body = body.trim();
        SubmissionOutcome::transport(if body.is_empty() {
            format!("HTTP {}", status)
        } else {
            format!("HTTP {}: {}", status, body)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn errors(pairs: &[(&str, &str)]) -> RowErrors {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_all_accepted() {
        let outcome = SubmissionOutcome::decode(200, r#"{"reserved":[{},{},{}]}"#);
        assert_eq!(outcome, SubmissionOutcome::Accepted { accepted: 3 });
    }

    #[test]
    fn test_partial_failure() {
        let outcome = SubmissionOutcome::decode(
            200,
            r#"{"reserved":[{},{},{}],"errors":{"1":"x","2":"y"}}"#,
        );
        assert_eq!(
            outcome,
            SubmissionOutcome::PartialFailure {
                accepted: 3,
                errors: errors(&[("1", "x"), ("2", "y")]),
            }
        );
    }

    #[test]
    fn test_total_failure_reported() {
        let outcome = SubmissionOutcome::decode(201, r#"{"reserved":[],"errors":{"0":"x"}}"#);
        assert_eq!(
            outcome,
            SubmissionOutcome::TotalFailure {
                errors: errors(&[("0", "x")]),
                origin: FailureOrigin::Reported,
            }
        );
    }

    #[test]
    fn test_errors_not_an_object_means_no_errors() {
        let outcome = SubmissionOutcome::decode(200, r#"{"reserved":[{}],"errors":[1,2]}"#);
        assert_eq!(outcome, SubmissionOutcome::Accepted { accepted: 1 });
    }

    #[test]
    fn test_unprocessable_with_row_errors() {
        let outcome = SubmissionOutcome::decode(422, r#"{"errors":{"0":"bad","4":"worse"}}"#);
        assert_eq!(
            outcome,
            SubmissionOutcome::TotalFailure {
                errors: errors(&[("0", "bad"), ("4", "worse")]),
                origin: FailureOrigin::Rejected,
            }
        );
    }

    #[test]
    fn test_unprocessable_without_errors_is_transport_failure() {
        let outcome = SubmissionOutcome::decode(422, r#"{"message":"nope"}"#);
        assert!(matches!(outcome, SubmissionOutcome::TransportFailure { .. }));
        let outcome = SubmissionOutcome::decode(422, "");
        assert_eq!(outcome, SubmissionOutcome::transport("HTTP 422"));
    }

    #[test]
    fn test_server_error_and_garbage() {
        assert_eq!(
            SubmissionOutcome::decode(503, "Service Unavailable"),
            SubmissionOutcome::transport("HTTP 503: Service Unavailable")
        );
        assert!(matches!(
            SubmissionOutcome::decode(200, "<html>"),
            SubmissionOutcome::TransportFailure { .. }
        ));
        assert!(matches!(
            SubmissionOutcome::decode(200, "42"),
            SubmissionOutcome::TransportFailure { .. }
        ));
    }
}
