use contracts::usecases::u508_import_reservations::{ReservationRecord, RowErrors};

use super::outcome::{FailureOrigin, SubmissionOutcome};
use super::session::Notice;
use crate::shared::csv_importer::{row_number, write_csv, Fields, Header, ImportError};

/// Итог отправки с точки зрения пользователя
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutcomeKind {
    TotalSuccess,
    PartialSuccess,
    TotalFailure,
    /// Пакет отклонён целиком (422): окно импорта закрывается, сразу
    /// открывается список отклонённых строк
    Rejected,
}

/// Ошибка backend, сопоставленная с исходной строкой
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconciliationItem {
    /// Ключ строки из ответа как есть
    pub key: String,
    /// Позиция записи в отправленном пакете, если ключ удалось сопоставить
    pub index: Option<usize>,
    /// Что показать: `number` записи, иначе текст ошибки
    pub row_label: String,
    pub message: String,
}

impl ReconciliationItem {
    pub fn pair(key: &str, message: &str, records: &[ReservationRecord]) -> Self {
        let index = record_index(key, records.len());
        if index.is_none() {
            log::warn!("Row key {:?} does not match any submitted record", key);
        }

        let row_label = index
            .and_then(|i| records[i].number())
            .unwrap_or(message)
            .to_string();

        Self {
            key: key.to_string(),
            index,
            row_label,
            message: message.to_string(),
        }
    }

    /// Номер строки для пользователя (тот же, что в отчёте проверки)
    pub fn row_number(&self) -> Option<usize> {
        self.index.map(row_number)
    }
}

/// Ключ ошибки -> позиция в отправленном массиве (0-based).
/// `None` для нечисловых ключей и позиций за пределами пакета.
pub fn record_index(key: &str, submitted: usize) -> Option<usize> {
    key.trim()
        .parse::<usize>()
        .ok()
        .filter(|&index| index < submitted)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciliation {
    pub kind: OutcomeKind,
    pub accepted: usize,
    pub items: Vec<ReconciliationItem>,
}

impl Reconciliation {
    /// `Err(reason)` для транспортной ошибки: сверять нечего.
    pub fn from_outcome(
        outcome: SubmissionOutcome,
        records: &[ReservationRecord],
    ) -> Result<Self, String> {
        let (kind, accepted, errors) = match outcome {
            SubmissionOutcome::Accepted { accepted } => {
                (OutcomeKind::TotalSuccess, accepted, RowErrors::new())
            }
            SubmissionOutcome::PartialFailure { accepted, errors } => {
                (OutcomeKind::PartialSuccess, accepted, errors)
            }
            SubmissionOutcome::TotalFailure { errors, origin } => {
                let kind = match origin {
                    FailureOrigin::Reported => OutcomeKind::TotalFailure,
                    FailureOrigin::Rejected => OutcomeKind::Rejected,
                };
                (kind, 0, errors)
            }
            SubmissionOutcome::TransportFailure { reason } => return Err(reason),
        };

        let mut items: Vec<ReconciliationItem> = errors
            .iter()
            .map(|(key, message)| ReconciliationItem::pair(key, message, records))
            .collect();
        // сначала сопоставленные строки по порядку, потом неизвестные ключи
        items.sort_by(|a, b| {
            (a.index.is_none(), a.index, &a.key).cmp(&(b.index.is_none(), b.index, &b.key))
        });

        Ok(Self {
            kind,
            accepted,
            items,
        })
    }

    pub fn failed(&self) -> usize {
        self.items.len()
    }

    /// Хотя бы одна запись сохранена: вызывающему нужно обновить список
    pub fn marks_changed(&self) -> bool {
        self.accepted > 0
    }

    pub fn is_partial(&self) -> bool {
        self.kind == OutcomeKind::PartialSuccess
    }

    pub fn opens_picker(&self) -> bool {
        !self.items.is_empty()
    }

    pub fn closes_dialog(&self) -> bool {
        self.kind == OutcomeKind::Rejected
    }

    pub fn notice(&self) -> Notice {
        match self.kind {
            OutcomeKind::TotalSuccess => {
                Notice::success(format!("Создано резервирований: {}", self.accepted))
            }
            OutcomeKind::PartialSuccess => Notice::warning(format!(
                "Создано резервирований: {}, с ошибками: {}",
                self.accepted,
                self.failed()
            )),
            OutcomeKind::TotalFailure => Notice::error(format!(
                "Ни одно резервирование не создано, строк с ошибками: {}",
                self.failed()
            )),
            OutcomeKind::Rejected => Notice::error(format!(
                "Пакет отклонён сервером, строк с ошибками: {}",
                self.failed()
            )),
        }
    }
}

/// CSV с выбранными строками для исправления и повторной загрузки.
///
/// Строки без сопоставленной записи пропускаются: исходных данных у них нет.
pub fn failed_rows_csv(
    header: &Header,
    records: &[ReservationRecord],
    kept: &[ReconciliationItem],
) -> Result<String, ImportError> {
    let rows: Vec<&Fields> = kept
        .iter()
        .filter_map(|item| item.index)
        .filter_map(|index| records.get(index))
        .map(|record| record.fields())
        .collect();
    write_csv(header, rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn records() -> Vec<ReservationRecord> {
        (0..4)
            .map(|i| {
                [
                    ("product_id", format!("{}", i + 10)),
                    ("number", format!("N{}", i)),
                ]
                .into_iter()
                .collect()
            })
            .collect()
    }

    fn errors(pairs: &[(&str, &str)]) -> RowErrors {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_record_index() {
        assert_eq!(record_index("0", 3), Some(0));
        assert_eq!(record_index(" 2 ", 3), Some(2));
        assert_eq!(record_index("3", 3), None);
        assert_eq!(record_index("-1", 3), None);
        assert_eq!(record_index("row-1", 3), None);
    }

    #[test]
    fn test_total_success() {
        let rec = Reconciliation::from_outcome(SubmissionOutcome::Accepted { accepted: 4 }, &records())
            .unwrap();
        assert_eq!(rec.kind, OutcomeKind::TotalSuccess);
        assert!(rec.marks_changed());
        assert!(!rec.opens_picker());
    }

    #[test]
    fn test_partial_success_opens_picker_with_each_error() {
        let outcome = SubmissionOutcome::PartialFailure {
            accepted: 3,
            errors: errors(&[("1", "x"), ("2", "y")]),
        };
        let rec = Reconciliation::from_outcome(outcome, &records()).unwrap();
        assert_eq!(rec.kind, OutcomeKind::PartialSuccess);
        assert!(rec.marks_changed());
        assert!(rec.is_partial());
        assert!(rec.opens_picker());
        assert_eq!(rec.items.len(), 2);
        assert_eq!(rec.items[0].row_label, "N1");
        assert_eq!(rec.items[0].row_number(), Some(2));
        assert_eq!(rec.items[1].message, "y");
    }

    #[test]
    fn test_total_failure_does_not_mark_changed() {
        let outcome = SubmissionOutcome::TotalFailure {
            errors: errors(&[("0", "x")]),
            origin: FailureOrigin::Reported,
        };
        let rec = Reconciliation::from_outcome(outcome, &records()).unwrap();
        assert_eq!(rec.kind, OutcomeKind::TotalFailure);
        assert!(!rec.marks_changed());
        assert!(rec.opens_picker());
        assert!(!rec.closes_dialog());
    }

    #[test]
    fn test_rejected_closes_dialog() {
        let outcome = SubmissionOutcome::TotalFailure {
            errors: errors(&[("3", "dup")]),
            origin: FailureOrigin::Rejected,
        };
        let rec = Reconciliation::from_outcome(outcome, &records()).unwrap();
        assert_eq!(rec.kind, OutcomeKind::Rejected);
        assert!(rec.closes_dialog());
        assert!(rec.opens_picker());
    }

    #[test]
    fn test_unknown_keys_fall_back_to_message_and_sort_last() {
        let outcome = SubmissionOutcome::PartialFailure {
            accepted: 1,
            errors: errors(&[("batch", "limit exceeded"), ("10", "x"), ("2", "y")]),
        };
        let rec = Reconciliation::from_outcome(outcome, &records()).unwrap();
        let labels: Vec<&str> = rec.items.iter().map(|i| i.row_label.as_str()).collect();
        assert_eq!(labels, vec!["N2", "x", "limit exceeded"]);
        assert_eq!(rec.items[1].index, None);
    }

    #[test]
    fn test_record_without_number_uses_message() {
        let records: Vec<ReservationRecord> = vec![[("product_id", "1")].into_iter().collect()];
        let item = ReconciliationItem::pair("0", "number is required", &records);
        assert_eq!(item.row_label, "number is required");
        assert_eq!(item.index, Some(0));
    }

    #[test]
    fn test_transport_failure_is_not_reconciled() {
        let result = Reconciliation::from_outcome(SubmissionOutcome::transport("HTTP 500"), &records());
        assert_eq!(result, Err("HTTP 500".to_string()));
    }

    #[test]
    fn test_failed_rows_csv_keeps_selected_records() {
        let records = records();
        let kept = vec![
            ReconciliationItem::pair("2", "y", &records),
            ReconciliationItem::pair("99", "lost", &records),
        ];
        let header = Header::new(["product_id", "number"]);
        let csv = failed_rows_csv(&header, &records, &kept).unwrap();
        assert_eq!(csv, "product_id,number\n12,N2\n");
    }
}
