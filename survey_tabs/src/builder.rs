pub use crate::config::*;

/// A builder for assembling a dataset record by record.
///
/// ```
/// pub use survey_tabs::builder::Builder;
/// # use survey_tabs::SurveyError;
///
/// let mut builder = Builder::new(&["District", "AC1"], "District")?;
///
/// builder.add_record_simple(&["Khairpur", "Yes"])?;
/// builder.add_record_simple(&["Lodhran", ""])?;
///
/// let data = builder.build();
/// assert_eq!(data.len(), 2);
///
/// # Ok::<(), SurveyError>(())
/// ```
pub struct Builder {
    pub(crate) _columns: Vec<String>,
    pub(crate) _grouping_column: String,
    pub(crate) _records: Vec<Vec<Value>>,
}

impl Builder {
    pub fn new(columns: &[&str], grouping_column: &str) -> Result<Builder, SurveyError> {
        let mut cols: Vec<String> = Vec::new();
        for c in columns {
            if cols.iter().any(|x| x == c) {
                return Err(SurveyError::DuplicateColumn(c.to_string()));
            }
            cols.push(c.to_string());
        }
        if !cols.iter().any(|c| c == grouping_column) {
            return Err(SurveyError::MissingGroupingColumn(
                grouping_column.to_string(),
            ));
        }
        Ok(Builder {
            _columns: cols,
            _grouping_column: grouping_column.to_string(),
            _records: Vec::new(),
        })
    }

    /// Adds a record written as text, one cell per column.
    ///
    /// Empty cells are missing values and cells that read as numbers are numbers.
    pub fn add_record_simple(&mut self, cells: &[&str]) -> Result<(), SurveyError> {
        let values: Vec<Value> = cells
            .iter()
            .map(|s| {
                if s.is_empty() {
                    Value::Missing
                } else if let Ok(x) = s.parse::<f64>() {
                    Value::Number(x)
                } else {
                    Value::Text(s.to_string())
                }
            })
            .collect();
        self.add_record(values)
    }

    /// Adds a record, one value per column.
    pub fn add_record(&mut self, values: Vec<Value>) -> Result<(), SurveyError> {
        if values.len() != self._columns.len() {
            return Err(SurveyError::RecordLength {
                expected: self._columns.len(),
                found: values.len(),
            });
        }
        self._records.push(values);
        Ok(())
    }

    pub fn build(self) -> Dataset {
        Dataset::from_parts(self._columns, self._grouping_column, self._records)
    }
}
