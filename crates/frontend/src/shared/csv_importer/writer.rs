use super::error::ImportError;
use super::normalize::Fields;
use super::types::Header;

/// Записи обратно в CSV (разделитель: запятая, как на входе).
///
/// Колонки: сначала заголовок исходного файла, затем поля, которых в нём не
/// было (например вычисленный `note`), по алфавиту.
pub fn write_csv<'a, I>(header: &Header, records: I) -> Result<String, ImportError>
where
    I: IntoIterator<Item = &'a Fields>,
{
    let records: Vec<&Fields> = records.into_iter().collect();

    let mut columns: Vec<String> = header.iter().filter(|f| !f.is_empty()).map(str::to_string).collect();
    let mut extra: Vec<&String> = records
        .iter()
        .flat_map(|r| r.keys())
        .filter(|k| !header.contains(k))
        .collect();
    extra.sort();
    extra.dedup();
    columns.extend(extra.into_iter().cloned());

    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(&columns)?;
    for record in records {
        writer.write_record(
            columns
                .iter()
                .map(|c| record.get(c).map(String::as_str).unwrap_or_default()),
        )?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| ImportError::Write(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| ImportError::Write(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_order_then_extra_columns() {
        let header = Header::new(["product_id", "number"]);
        let mut a = Fields::new();
        a.insert("product_id".into(), "1".into());
        a.insert("number".into(), "111".into());
        a.insert("note".into(), "hello, world".into());
        let mut b = Fields::new();
        b.insert("number".into(), "222".into());

        let csv = write_csv(&header, [&a, &b]).unwrap();
        assert_eq!(
            csv,
            "product_id,number,note\n1,111,\"hello, world\"\n,222,\n"
        );
    }
}
