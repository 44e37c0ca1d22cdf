use std::collections::BTreeMap;

use minijinja::Environment;

use super::error::ImportError;
use super::types::{Header, RawRow};

/// Запись: имя поля -> значение (ключи уникальны, значения непустые)
pub type Fields = BTreeMap<String, String>;

/// Поле, которое вычисляется по шаблону MiniJinja, если в строке его нет.
///
/// Шаблону доступны поля самой записи и значения из `context` (например
/// время загрузки); при совпадении имён побеждает `context`. Неизвестные
/// переменные подставляются пустой строкой.
#[derive(Debug, Clone)]
pub struct DerivedField {
    pub name: String,
    template: String,
    context: BTreeMap<String, String>,
    env: Environment<'static>,
}

impl DerivedField {
    /// Шаблон компилируется сразу, синтаксическая ошибка возвращается здесь
    pub fn new(name: impl Into<String>, template: impl Into<String>) -> Result<Self, ImportError> {
        let template = template.into();
        Environment::new().template_from_str(&template)?;

        Ok(Self {
            name: name.into(),
            template,
            context: BTreeMap::new(),
            env: Environment::new(),
        })
    }

    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    pub fn render(&self, fields: &Fields) -> Result<String, ImportError> {
        let mut values = fields.clone();
        values.extend(self.context.iter().map(|(k, v)| (k.clone(), v.clone())));
        Ok(self.env.render_str(&self.template, &values)?)
    }
}

/// Одна строка -> запись.
///
/// Пустая строка (все ячейки пустые) даёт `None`. Иначе сначала
/// вычисляется производное поле и только потом отбрасывается запись без
/// единого значения, поэтому строка с данными вне заголовка не теряется,
/// а попадает в проверку как запись без обязательных полей.
/// Ячейки сверх заголовка отбрасываются.
pub fn normalize_row(
    header: &Header,
    row: &RawRow,
    derived: Option<&DerivedField>,
) -> Result<Option<Fields>, ImportError> {
    if row.is_blank() {
        return Ok(None);
    }

    let mut fields: Fields = header
        .iter()
        .zip(row.cells.iter())
        .filter(|(name, _)| !name.is_empty())
        .filter_map(|(name, value)| {
            let value = value.trim();
            (!value.is_empty()).then(|| (name.to_string(), value.to_string()))
        })
        .collect();

    if let Some(derived) = derived {
        if !fields.contains_key(&derived.name) {
            let value = derived.render(&fields)?;
            fields.insert(derived.name.clone(), value);
        }
    }

    if fields.is_empty() {
        log::debug!("Row at line {} has no values under known columns", row.line);
        return Ok(None);
    }

    Ok(Some(fields))
}

/// Все строки -> записи, порядок сохраняется.
///
/// Позиция записи в результате и есть её номер строки (см. `row_number`).
pub fn normalize<I>(header: &Header, rows: I, derived: Option<&DerivedField>) -> Result<Vec<Fields>, ImportError>
where
    I: IntoIterator<Item = Result<RawRow, ImportError>>,
{
    let mut records = Vec::new();
    let mut skipped = 0usize;

    for row in rows {
        match normalize_row(header, &row?, derived)? {
            Some(fields) => records.push(fields),
            None => skipped += 1,
        }
    }

    log::debug!("Normalized {} records, {} empty rows skipped", records.len(), skipped);

    Ok(records)
}
