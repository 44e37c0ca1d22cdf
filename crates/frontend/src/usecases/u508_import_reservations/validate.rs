use contracts::usecases::u508_import_reservations::ReservationRecord;
use std::collections::BTreeMap;

use crate::shared::csv_importer::row_number;

/// Правила проверки строк до отправки
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ValidationRule {
    MissingProductId,
    MissingNumber,
    /// `number` оставлен как в примере файла
    SampleNumber,
}

impl ValidationRule {
    pub const ALL: [ValidationRule; 3] = [
        ValidationRule::MissingProductId,
        ValidationRule::MissingNumber,
        ValidationRule::SampleNumber,
    ];

    /// Ключ правила в отчёте
    pub fn key(self) -> &'static str {
        match self {
            ValidationRule::MissingProductId => "csvMissingProductIdFields",
            ValidationRule::MissingNumber => "csvMissingNumberFields",
            ValidationRule::SampleNumber => "csvSampleNumberFields",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            ValidationRule::MissingProductId => "Не заполнен product_id",
            ValidationRule::MissingNumber => "Не заполнен number",
            ValidationRule::SampleNumber => "number оставлен из примера файла",
        }
    }

    fn is_violated_by(self, record: &ReservationRecord, placeholder: &str) -> bool {
        match self {
            ValidationRule::MissingProductId => record.product_id().is_none(),
            ValidationRule::MissingNumber => record.number().is_none(),
            ValidationRule::SampleNumber => record.number() == Some(placeholder),
        }
    }
}

/// Сводный отчёт: правило -> номера строк (1-based), которые его нарушают
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    record_count: usize,
    violations: BTreeMap<ValidationRule, Vec<usize>>,
}

impl ValidationReport {
    pub fn record_count(&self) -> usize {
        self.record_count
    }

    pub fn rows(&self, rule: ValidationRule) -> &[usize] {
        self.violations.get(&rule).map(Vec::as_slice).unwrap_or_default()
    }

    /// Номера строк через запятую, как их видит пользователь
    pub fn display(&self, rule: ValidationRule) -> String {
        self.rows(rule)
            .iter()
            .map(usize::to_string)
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Ключ правила -> строки через запятую (для всех правил, пустая строка, если нарушений нет)
    pub fn entries(&self) -> BTreeMap<&'static str, String> {
        ValidationRule::ALL
            .iter()
            .map(|rule| (rule.key(), self.display(*rule)))
            .collect()
    }

    /// Только нарушенные правила, в порядке `ValidationRule::ALL`
    pub fn violated(&self) -> impl Iterator<Item = (ValidationRule, &[usize])> {
        ValidationRule::ALL
            .into_iter()
            .map(|rule| (rule, self.rows(rule)))
            .filter(|(_, rows)| !rows.is_empty())
    }

    pub fn has_violations(&self) -> bool {
        self.violations.values().any(|rows| !rows.is_empty())
    }

    /// Пакет можно отправлять: строки есть и ни одно правило не нарушено
    pub fn is_valid(&self) -> bool {
        self.record_count > 0 && !self.has_violations()
    }
}

/// Проверка всех записей сразу, чтобы пользователь увидел все ошибки до
/// отправки. Всегда завершается; номера строк: по `row_number`.
pub fn validate(records: &[ReservationRecord], placeholder: &str) -> ValidationReport {
    let mut violations: BTreeMap<ValidationRule, Vec<usize>> = BTreeMap::new();

    for (index, record) in records.iter().enumerate() {
        for rule in ValidationRule::ALL {
            if rule.is_violated_by(record, placeholder) {
                violations.entry(rule).or_default().push(row_number(index));
            }
        }
    }

    ValidationReport {
        record_count: records.len(),
        violations,
    }
}
