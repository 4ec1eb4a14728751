use crate::report::*;

use calamine::{Range, XlsxError};
use std::collections::HashSet;
use survey_tabs::builder::Builder;

pub const KEY_CODE_COLUMN: &str = "Variables";
pub const KEY_MRQ_CODE_COLUMN: &str = "Variable";
pub const KEY_TEXT_COLUMN: &str = "TEXT";

/// The value of a data cell.
pub fn cell_value(cell: &DataType) -> Value {
    match cell {
        DataType::Int(i) => Value::Number(*i as f64),
        DataType::Float(f) => Value::Number(*f),
        DataType::DateTime(f) => Value::Number(*f),
        DataType::String(s) if s.is_empty() => Value::Missing,
        DataType::String(s) => Value::Text(s.clone()),
        DataType::Bool(b) => Value::Bool(*b),
        DataType::Empty => Value::Missing,
        // Error cells
        _ => Value::Missing,
    }
}

/// The text of a header or key cell, if any.
pub fn cell_text(cell: &DataType) -> Option<String> {
    match cell {
        DataType::String(s) if s.trim().is_empty() => None,
        DataType::String(s) => Some(s.trim().to_string()),
        DataType::Empty => None,
        c => cell_value(c).category().map(|k| k.to_string()),
    }
}

/// Makes the column codes unique: a repeated code gets a suffix, `AC1`, `AC1.1`, `AC1.2`...
pub fn unique_columns(columns: Vec<String>) -> Vec<String> {
    let mut seen: HashSet<String> = columns.iter().cloned().collect();
    let mut used: HashSet<String> = HashSet::new();
    let mut res: Vec<String> = Vec::new();
    for col in columns {
        if used.insert(col.clone()) {
            res.push(col);
            continue;
        }
        let mut n = 1;
        let renamed = loop {
            let candidate = format!("{}.{}", col, n);
            if !seen.contains(&candidate) {
                break candidate;
            }
            n += 1;
        };
        warn!("Repeated column {:?}, renamed to {:?}", col, renamed);
        seen.insert(renamed.clone());
        used.insert(renamed.clone());
        res.push(renamed);
    }
    res
}

/// Reads the records of the database sheet. The first row holds the column codes.
///
/// Rows without any value are skipped.
pub fn parse_database<'a, I>(mut rows: I, grouping_column: &str, sheet: &str) -> BReportResult<Dataset>
where
    I: Iterator<Item = &'a [DataType]>,
{
    let header = rows.next().context(EmptySheetSnafu { sheet })?;
    let columns = unique_columns(
        header
            .iter()
            .enumerate()
            .map(|(idx, c)| cell_text(c).unwrap_or_else(|| format!("Unnamed: {}", idx)))
            .collect(),
    );
    debug!("parse_database: columns: {:?}", columns);
    let col_refs: Vec<&str> = columns.iter().map(|s| s.as_str()).collect();
    let mut builder =
        Builder::new(&col_refs, grouping_column).context(InvalidDatasetSnafu { sheet })?;

    let mut num_empty = 0;
    for row in rows {
        let values: Vec<Value> = (0..columns.len())
            .map(|idx| row.get(idx).map(cell_value).unwrap_or(Value::Missing))
            .collect();
        if values.iter().all(|v| v.is_missing()) {
            num_empty += 1;
            continue;
        }
        builder
            .add_record(values)
            .context(InvalidDatasetSnafu { sheet })?;
    }
    let data = builder.build();
    info!(
        "parse_database: {:?}: {} records, {} columns ({} empty rows skipped)",
        sheet,
        data.len(),
        columns.len(),
        num_empty
    );
    Ok(data)
}

fn find_column(header: &[DataType], name: &str, sheet: &str) -> BReportResult<usize> {
    let idx = header
        .iter()
        .position(|c| cell_text(c).as_deref() == Some(name))
        .context(MissingColumnSnafu {
            sheet,
            column: name,
        })?;
    Ok(idx)
}

/// Reads the (code, label) pairs of a key sheet.
///
/// Rows without a code or without a label are skipped: the code then keeps its
/// default label.
pub fn parse_key<'a, I>(
    mut rows: I,
    code_column: &str,
    text_column: &str,
    sheet: &str,
) -> BReportResult<Vec<(String, String)>>
where
    I: Iterator<Item = &'a [DataType]>,
{
    let header = rows.next().context(EmptySheetSnafu { sheet })?;
    let code_idx = find_column(header, code_column, sheet)?;
    let text_idx = find_column(header, text_column, sheet)?;
    let mut res: Vec<(String, String)> = Vec::new();
    for row in rows {
        let code = row.get(code_idx).and_then(cell_text);
        let text = row.get(text_idx).and_then(cell_text);
        if let (Some(code), Some(text)) = (code, text) {
            res.push((code, text));
        }
    }
    debug!("parse_key: {:?}: {} labels", sheet, res.len());
    Ok(res)
}

/// Reads the multi-response labels. The sheet is optional: when it is absent or cannot be
/// read, a warning is recorded and the general labels are used alone.
pub fn read_optional_key(
    sheet_range: Option<Result<Range<DataType>, XlsxError>>,
    sheet: &str,
    warnings: &mut Vec<String>,
) -> Vec<(String, String)> {
    let parsed = match sheet_range {
        Some(Ok(r)) => parse_key(r.rows(), KEY_MRQ_CODE_COLUMN, KEY_TEXT_COLUMN, sheet)
            .map_err(|e| format!("Could not read the sheet {}: {}", sheet, e)),
        Some(Err(e)) => Err(format!("Could not read the sheet {}: {}", sheet, e)),
        None => Err(format!(
            "The sheet {} is not in the workbook, the multi-response labels come from the key sheet only",
            sheet
        )),
    };
    match parsed {
        Ok(pairs) => pairs,
        Err(msg) => {
            warn!("{}", msg);
            warnings.push(msg);
            vec![]
        }
    }
}

/// Puts together the tables read from the sheets.
pub fn assemble_tables(
    data: Dataset,
    general: &[(String, String)],
    mrq_range: Option<Result<Range<DataType>, XlsxError>>,
    mrq_sheet: &str,
) -> SourceTables {
    let mut warnings: Vec<String> = Vec::new();
    let multi = read_optional_key(mrq_range, mrq_sheet, &mut warnings);
    SourceTables {
        data,
        labels: LabelBook::from_pairs(general, &multi),
        warnings,
    }
}

/// Reads the dataset and the labels from a workbook.
pub fn load_workbook(
    path: &str,
    settings: &DataSourceSettings,
    grouping_column: &str,
) -> BReportResult<SourceTables> {
    info!("Reading workbook {:?}", path);
    let mut workbook: Xlsx<_> = open_workbook(path).context(OpeningExcelSnafu { path })?;

    let db_sheet = settings.database_sheet();
    let db = workbook
        .worksheet_range(&db_sheet)
        .context(MissingSheetSnafu {
            sheet: db_sheet.clone(),
        })?
        .context(ReadingSheetSnafu {
            sheet: db_sheet.clone(),
        })?;
    let data = parse_database(db.rows(), grouping_column, &db_sheet)?;

    let key_sheet = settings.key_sheet();
    let key = workbook
        .worksheet_range(&key_sheet)
        .context(MissingSheetSnafu {
            sheet: key_sheet.clone(),
        })?
        .context(ReadingSheetSnafu {
            sheet: key_sheet.clone(),
        })?;
    let general = parse_key(key.rows(), KEY_CODE_COLUMN, KEY_TEXT_COLUMN, &key_sheet)?;

    let mrq_sheet = settings.key_mrq_sheet();
    let mrq = workbook.worksheet_range(&mrq_sheet);
    Ok(assemble_tables(data, &general, mrq, &mrq_sheet))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(x: &str) -> DataType {
        DataType::String(x.to_string())
    }

    fn slices(rows: &[Vec<DataType>]) -> impl Iterator<Item = &[DataType]> {
        rows.iter().map(|r| r.as_slice())
    }

    #[test]
    fn cell_values() {
        assert_eq!(cell_value(&DataType::Int(3)), Value::Number(3.0));
        assert_eq!(cell_value(&DataType::Float(2.5)), Value::Number(2.5));
        assert_eq!(cell_value(&s("Yes")), Value::Text("Yes".to_string()));
        assert_eq!(cell_value(&s("")), Value::Missing);
        assert_eq!(cell_value(&DataType::Bool(true)), Value::Bool(true));
        assert_eq!(cell_value(&DataType::Empty), Value::Missing);
    }

    #[test]
    fn cell_texts() {
        assert_eq!(cell_text(&s(" AC1 ")), Some("AC1".to_string()));
        assert_eq!(cell_text(&DataType::Float(3.0)), Some("3".to_string()));
        assert_eq!(cell_text(&DataType::Int(12)), Some("12".to_string()));
        assert_eq!(cell_text(&s("  ")), None);
        assert_eq!(cell_text(&DataType::Empty), None);
    }

    #[test]
    fn database() {
        let rows = vec![
            vec![s("District"), s("AC1"), DataType::Empty],
            vec![s("Lodhran"), s("Yes"), DataType::Int(1)],
            vec![DataType::Empty, DataType::Empty, DataType::Empty],
            vec![s("Jamshoro"), s(""), DataType::Float(0.0)],
        ];
        let data = parse_database(slices(&rows), "District", "Database").unwrap();
        assert_eq!(data.columns(), &["District", "AC1", "Unnamed: 2"]);
        assert_eq!(data.len(), 2);
        assert_eq!(data.value(1, "AC1"), Some(&Value::Missing));
        assert_eq!(data.value(1, "Unnamed: 2"), Some(&Value::Number(0.0)));
    }

    #[test]
    fn database_short_rows() {
        let rows = vec![
            vec![s("District"), s("AC1")],
            vec![s("Lodhran")],
        ];
        let data = parse_database(slices(&rows), "District", "Database").unwrap();
        assert_eq!(data.value(0, "AC1"), Some(&Value::Missing));
    }

    #[test]
    fn database_without_grouping_column() {
        let rows = vec![vec![s("AC1")], vec![s("Yes")]];
        let res = parse_database(slices(&rows), "District", "Database");
        assert!(matches!(
            res.map_err(|e| *e),
            Err(ReportError::InvalidDataset { .. })
        ));
    }

    #[test]
    fn empty_sheet() {
        let rows: Vec<Vec<DataType>> = vec![];
        let res = parse_database(slices(&rows), "District", "Database");
        assert!(matches!(res.map_err(|e| *e), Err(ReportError::EmptySheet { .. })));
    }

    #[test]
    fn key() {
        let rows = vec![
            vec![s("TEXT"), s("Variables")],
            vec![s("Received ANC"), s("AC1")],
            vec![DataType::Empty, s("AC2")],
            vec![s("Visits"), s("AC2_new")],
        ];
        let pairs = parse_key(slices(&rows), KEY_CODE_COLUMN, KEY_TEXT_COLUMN, "Key").unwrap();
        assert_eq!(
            pairs,
            vec![
                ("AC1".to_string(), "Received ANC".to_string()),
                ("AC2_new".to_string(), "Visits".to_string()),
            ]
        );
    }

    #[test]
    fn key_missing_column() {
        let rows = vec![vec![s("Variable"), s("TEXT")]];
        let res = parse_key(slices(&rows), KEY_CODE_COLUMN, KEY_TEXT_COLUMN, "Key");
        assert!(matches!(
            res.map_err(|e| *e),
            Err(ReportError::MissingColumn { .. })
        ));
    }

    #[test]
    fn repeated_columns() {
        let rows = vec![
            vec![s("District"), s("AC1"), s("AC1"), s("AC1.1"), s("AC1")],
            vec![s("Lodhran"), s("Yes"), s("No"), s("x"), DataType::Int(2)],
        ];
        let data = parse_database(slices(&rows), "District", "Database").unwrap();
        assert_eq!(
            data.columns(),
            &["District", "AC1", "AC1.2", "AC1.1", "AC1.3"]
        );
        assert_eq!(data.value(0, "AC1"), Some(&Value::Text("Yes".to_string())));
        assert_eq!(data.value(0, "AC1.2"), Some(&Value::Text("No".to_string())));
        assert_eq!(data.value(0, "AC1.3"), Some(&Value::Number(2.0)));
    }

    fn general() -> Vec<(String, String)> {
        vec![("BF4".to_string(), "Pre-lacteal feeds (key)".to_string())]
    }

    fn sample_data() -> Dataset {
        let rows = vec![vec![s("District"), s("BF4_1")], vec![s("Lodhran"), DataType::Int(1)]];
        parse_database(slices(&rows), "District", "Database").unwrap()
    }

    fn range(rows: &[Vec<DataType>]) -> Range<DataType> {
        let width = rows.iter().map(|r| r.len()).max().unwrap_or(1) as u32;
        let mut r = Range::new((0, 0), (rows.len() as u32 - 1, width - 1));
        for (i, row) in rows.iter().enumerate() {
            for (j, c) in row.iter().enumerate() {
                r.set_value((i as u32, j as u32), c.clone());
            }
        }
        r
    }

    #[test]
    fn multi_response_sheet() {
        let mrq = range(&[
            vec![s("Variable"), s("TEXT")],
            vec![s("BF4"), s("Pre-lacteal feeds")],
        ]);
        let tables = assemble_tables(sample_data(), &general(), Some(Ok(mrq)), "Key_MRQ");
        assert!(tables.warnings.is_empty());
        assert!(tables.labels.has_multi_response_labels());
        assert_eq!(tables.labels.resolve("BF4"), "Pre-lacteal feeds");
    }

    #[test]
    fn absent_multi_response_sheet() {
        let tables = assemble_tables(sample_data(), &general(), None, "Key_MRQ");
        assert_eq!(tables.warnings.len(), 1);
        assert!(tables.warnings[0].contains("Key_MRQ"));
        assert!(!tables.labels.has_multi_response_labels());
        assert_eq!(tables.labels.resolve("BF4"), "Pre-lacteal feeds (key)");
        assert_eq!(tables.data.len(), 1);
    }

    #[test]
    fn multi_response_sheet_without_code_column() {
        let mrq = range(&[
            vec![s("Code"), s("TEXT")],
            vec![s("BF4"), s("Pre-lacteal feeds")],
        ]);
        let tables = assemble_tables(sample_data(), &general(), Some(Ok(mrq)), "Key_MRQ");
        assert_eq!(tables.warnings.len(), 1);
        assert!(!tables.labels.has_multi_response_labels());
        assert_eq!(tables.labels.resolve("BF4"), "Pre-lacteal feeds (key)");
    }

    #[test]
    fn unreadable_multi_response_sheet() {
        let err = XlsxError::Unexpected("broken sheet");
        let tables = assemble_tables(sample_data(), &general(), Some(Err(err)), "Key_MRQ");
        assert_eq!(tables.warnings.len(), 1);
        assert!(tables.warnings[0].contains("broken sheet"));
        assert_eq!(tables.labels.resolve("BF4_9"), "BF4_9");
    }
}
