// ********* Input data structures ***********

use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap};
use std::error::Error;
use std::fmt::Display;
use std::hash::{Hash, Hasher};

/// The label of the synthetic row and column holding the totals.
pub const TOTAL: &str = "Total";

/// A single cell of a respondent record, as found in the survey export.
#[derive(PartialEq, Debug, Clone)]
pub enum Value {
    Number(f64),
    Text(String),
    Bool(bool),
    /// Empty cells, error cells and anything else that could not be read.
    Missing,
}

impl Value {
    /// Numeric coercion of the cell.
    ///
    /// Text is parsed after trimming the whitespaces and booleans count as 1 or 0.
    /// Anything that does not read as a finite number is None.
    pub fn as_number(&self) -> Option<f64> {
        let x = match self {
            Value::Number(n) => *n,
            Value::Text(s) => s.trim().parse::<f64>().ok()?,
            Value::Bool(true) => 1.0,
            Value::Bool(false) => 0.0,
            Value::Missing => return None,
        };
        if x.is_finite() {
            Some(x)
        } else {
            None
        }
    }

    /// The category this value falls into when it is tabulated, None for missing values.
    ///
    /// Text spelling a number exactly as the number is displayed (`"1"`, `"2.5"`) falls in
    /// the category of that number, so that a column mixing both has a single row per label.
    /// Other numeric-looking text (`"01"`, `" 1"`) stays text.
    pub fn category(&self) -> Option<CategoryKey> {
        match self {
            Value::Number(n) if n.is_nan() => None,
            // -0.0 and 0.0 are the same category
            Value::Number(n) if *n == 0.0 => Some(CategoryKey::Number(0.0)),
            Value::Number(n) => Some(CategoryKey::Number(*n)),
            Value::Text(s) => {
                let as_number = s
                    .parse::<f64>()
                    .ok()
                    .filter(|x| x.is_finite())
                    .and_then(|x| Value::Number(x).category())
                    .filter(|k| k.to_string() == *s);
                Some(as_number.unwrap_or_else(|| CategoryKey::Text(s.clone())))
            }
            Value::Bool(true) => Some(CategoryKey::Text("True".to_string())),
            Value::Bool(false) => Some(CategoryKey::Text("False".to_string())),
            Value::Missing => None,
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Value::Missing)
    }
}

/// A distinct value of a tabulated variable or of the grouping dimension.
///
/// Numbers sort before text, numbers in numeric order and text in lexicographic order.
#[derive(Debug, Clone)]
pub enum CategoryKey {
    Number(f64),
    Text(String),
}

impl Ord for CategoryKey {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (CategoryKey::Number(a), CategoryKey::Number(b)) => a.total_cmp(b),
            (CategoryKey::Number(_), CategoryKey::Text(_)) => Ordering::Less,
            (CategoryKey::Text(_), CategoryKey::Number(_)) => Ordering::Greater,
            (CategoryKey::Text(a), CategoryKey::Text(b)) => a.cmp(b),
        }
    }
}

impl PartialOrd for CategoryKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for CategoryKey {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for CategoryKey {}

impl Hash for CategoryKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            CategoryKey::Number(n) => {
                0u8.hash(state);
                n.to_bits().hash(state);
            }
            CategoryKey::Text(s) => {
                1u8.hash(state);
                s.hash(state);
            }
        }
    }
}

impl Display for CategoryKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            // Whole numbers are written without the decimal part: survey codes are integers.
            CategoryKey::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => {
                write!(f, "{}", *n as i64)
            }
            CategoryKey::Number(n) => write!(f, "{}", n),
            CategoryKey::Text(s) => write!(f, "{}", s),
        }
    }
}

/// The respondent-level table, with one grouping column (usually the district).
///
/// Records are immutable once loaded. The only mutations are the load-time derivations
/// (see the classify module), which run before any tabulation.
#[derive(PartialEq, Debug, Clone)]
pub struct Dataset {
    columns: Vec<String>,
    positions: HashMap<String, usize>,
    grouping_column: String,
    rows: Vec<Vec<Value>>,
}

impl Dataset {
    /// Invariant: the columns are unique and every row has one value per column.
    pub(crate) fn from_parts(
        columns: Vec<String>,
        grouping_column: String,
        rows: Vec<Vec<Value>>,
    ) -> Dataset {
        let positions = columns
            .iter()
            .enumerate()
            .map(|(idx, c)| (c.clone(), idx))
            .collect();
        Dataset {
            columns,
            positions,
            grouping_column,
            rows,
        }
    }

    /// The variable codes, in the order of the source columns.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn grouping_column(&self) -> &str {
        &self.grouping_column
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn has_column(&self, code: &str) -> bool {
        self.positions.contains_key(code)
    }

    pub fn column_index(&self, code: &str) -> Option<usize> {
        self.positions.get(code).cloned()
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    pub fn value(&self, row: usize, code: &str) -> Option<&Value> {
        let idx = self.column_index(code)?;
        self.rows.get(row).and_then(|r| r.get(idx))
    }

    /// The grouping value of a record. Records without one are left out of grouped tabulations.
    pub fn group_of(&self, row: &[Value]) -> Option<CategoryKey> {
        self.column_index(&self.grouping_column)
            .and_then(|idx| row.get(idx))
            .and_then(|v| v.category())
    }

    /// The distinct grouping values observed in the records, sorted.
    pub fn groups(&self) -> Vec<CategoryKey> {
        let groups: BTreeSet<CategoryKey> =
            self.rows.iter().filter_map(|r| self.group_of(r)).collect();
        groups.into_iter().collect()
    }

    /// Keeps the records whose grouping value is one of the selected ones.
    ///
    /// An empty selection means no filtering at all: every record is kept.
    pub fn filter_groups(&self, selected: &[String]) -> Dataset {
        if selected.is_empty() {
            return self.clone();
        }
        let rows: Vec<Vec<Value>> = self
            .rows
            .iter()
            .filter(|r| match self.group_of(r) {
                Some(g) => selected.contains(&g.to_string()),
                None => false,
            })
            .cloned()
            .collect();
        Dataset::from_parts(self.columns.clone(), self.grouping_column.clone(), rows)
    }

    /// Adds a column at the end, or overwrites the values of an existing one.
    pub(crate) fn set_column(&mut self, code: &str, values: Vec<Value>) {
        assert_eq!(values.len(), self.rows.len());
        match self.column_index(code) {
            Some(idx) => {
                for (row, v) in self.rows.iter_mut().zip(values) {
                    row[idx] = v;
                }
            }
            None => {
                self.positions.insert(code.to_string(), self.columns.len());
                self.columns.push(code.to_string());
                for (row, v) in self.rows.iter_mut().zip(values) {
                    row.push(v);
                }
            }
        }
    }

    pub(crate) fn retain_rows<F>(&mut self, mut keep: F)
    where
        F: FnMut(&[Value]) -> bool,
    {
        self.rows.retain(|r| keep(r));
    }
}

// ******** Output data structures *********

#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum TabulationKind {
    /// One categorical variable, percentages over the column totals.
    SingleResponse,
    /// An option set, percentages over the respondents who selected any option.
    MultiResponse,
}

/// One cell of a tabulation: a count and its percentage, rounded to one decimal.
#[derive(PartialEq, Debug, Clone, Copy)]
pub struct TabCell {
    pub n: u64,
    pub pct: f64,
}

/// A row of a tabulation, with one cell per grouping value followed by the Total column.
#[derive(PartialEq, Debug, Clone)]
pub struct TabRow {
    pub label: String,
    pub cells: Vec<TabCell>,
}

/// A bar of the grouped bar chart.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct ChartPoint {
    pub category: String,
    pub group: String,
    pub count: u64,
}

#[derive(PartialEq, Debug, Clone)]
pub struct Tabulation {
    /// The variable code, or the prefix of the option set.
    pub code: String,
    /// The resolved label of the variable or of the question.
    pub title: String,
    pub kind: TabulationKind,
    /// The grouping values, in display order. The Total column is not included.
    pub groups: Vec<String>,
    pub rows: Vec<TabRow>,
    pub total: TabRow,
    pub series: Vec<ChartPoint>,
}

/// Why a tabulation produced nothing to show.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum NoDataReason {
    /// The variable is not a column of the dataset.
    MissingVariable,
    /// None of the options of the set is a column of the dataset.
    EmptyOptionSet,
    /// No record with both a value and a grouping value.
    NoRecords,
}

/// The result of a tabulation. An empty result is distinct from a table full of zeros.
#[derive(PartialEq, Debug, Clone)]
pub enum TabulationOutcome {
    Table(Tabulation),
    NoData {
        code: String,
        title: String,
        reason: NoDataReason,
    },
}

impl TabulationOutcome {
    pub fn table(&self) -> Option<&Tabulation> {
        match self {
            TabulationOutcome::Table(t) => Some(t),
            TabulationOutcome::NoData { .. } => None,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            TabulationOutcome::Table(t) => &t.title,
            TabulationOutcome::NoData { title, .. } => title,
        }
    }
}

/// Errors raised while assembling a dataset.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum SurveyError {
    DuplicateColumn(String),
    MissingGroupingColumn(String),
    RecordLength { expected: usize, found: usize },
}

impl Error for SurveyError {}

impl Display for SurveyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SurveyError::DuplicateColumn(c) => write!(f, "Duplicate column {:?}", c),
            SurveyError::MissingGroupingColumn(c) => {
                write!(f, "The grouping column {:?} is not a column of the dataset", c)
            }
            SurveyError::RecordLength { expected, found } => write!(
                f,
                "Record has {} values, expected one per column ({})",
                found, expected
            ),
        }
    }
}
