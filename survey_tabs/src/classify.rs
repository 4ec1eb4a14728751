//! Derived variables and multi-response option sets.

use log::{debug, info, warn};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::config::*;

/// The age classes, in bin order.
pub const AGE_CLASSES: [&str; 3] = ["0–3 Months", "4–7 Months", "8–11 Months"];

/// The open-ended top bucket of the capped visit counts.
pub const VISITS_TOP_BUCKET: &str = "8 and above";

const VISITS_CAP: u64 = 8;

/// `<prefix>_<digits>` at the end of the code.
static OPTION_CODE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(.+)_(\d+)$").unwrap());

/// The age class of an age in months: [0, 3], (3, 7] and (7, 11].
///
/// Returns None for anything outside [0, 11] or not numeric. Such records have no place in
/// the age tabulations and are dropped by `derive_age_class`.
pub fn age_class(value: &Value) -> Option<&'static str> {
    let months = value.as_number()?;
    if !(0.0..=11.0).contains(&months) {
        None
    } else if months <= 3.0 {
        Some(AGE_CLASSES[0])
    } else if months <= 7.0 {
        Some(AGE_CLASSES[1])
    } else {
        Some(AGE_CLASSES[2])
    }
}

/// The visit count as a category: "0" to "7", then "8 and above".
///
/// The count is coerced to a non-negative integer first: non-numeric values and negative
/// counts become 0 and fractions are truncated.
pub fn capped_visits(value: &Value) -> String {
    let count = match value.as_number() {
        Some(x) if x > 0.0 => x.trunc() as u64,
        _ => 0,
    };
    if count >= VISITS_CAP {
        VISITS_TOP_BUCKET.to_string()
    } else {
        count.to_string()
    }
}

/// Adds the age class of `source` as the column `target`.
///
/// Precondition for everything downstream: the records without a valid age (see `age_class`)
/// are removed from the dataset. Returns the number of records removed.
/// A missing source column leaves the dataset untouched.
pub fn derive_age_class(data: &mut Dataset, source: &str, target: &str) -> usize {
    let idx = match data.column_index(source) {
        Some(idx) => idx,
        None => {
            warn!(
                "derive_age_class: column {:?} not found, {:?} not derived",
                source, target
            );
            return 0;
        }
    };
    let before = data.len();
    data.retain_rows(|row| age_class(&row[idx]).is_some());
    let dropped = before - data.len();

    let values: Vec<Value> = data
        .rows()
        .iter()
        .map(|row| match age_class(&row[idx]) {
            Some(c) => Value::Text(c.to_string()),
            None => Value::Missing,
        })
        .collect();
    data.set_column(target, values);
    info!(
        "derive_age_class: {:?} -> {:?}: {} records kept, {} dropped",
        source,
        target,
        data.len(),
        dropped
    );
    dropped
}

/// Adds the capped visit count of `source` as the column `target`.
pub fn derive_visit_cap(data: &mut Dataset, source: &str, target: &str) {
    let idx = match data.column_index(source) {
        Some(idx) => idx,
        None => {
            warn!(
                "derive_visit_cap: column {:?} not found, {:?} not derived",
                source, target
            );
            return;
        }
    };
    let values: Vec<Value> = data
        .rows()
        .iter()
        .map(|row| Value::Text(capped_visits(&row[idx])))
        .collect();
    data.set_column(target, values);
    info!("derive_visit_cap: {:?} -> {:?}", source, target);
}

/// The columns of one multi-response question.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct OptionSet {
    pub prefix: String,
    /// The option codes, in column order.
    pub options: Vec<String>,
}

/// The option set a code belongs to, if it follows the `<prefix>_<digits>` convention.
pub fn option_set_prefix(code: &str) -> Option<&str> {
    OPTION_CODE
        .captures(code)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
}

/// Groups the codes into option sets by prefix.
///
/// The sets come in the order their first option appears, and the options keep the order
/// of the codes.
pub fn discover_option_sets(codes: &[String]) -> Vec<OptionSet> {
    let mut res: Vec<OptionSet> = Vec::new();
    for code in codes {
        if let Some(prefix) = option_set_prefix(code) {
            match res.iter_mut().find(|s| s.prefix == prefix) {
                Some(set) => set.options.push(code.clone()),
                None => res.push(OptionSet {
                    prefix: prefix.to_string(),
                    options: vec![code.clone()],
                }),
            }
        }
    }
    debug!(
        "discover_option_sets: {:?}",
        res.iter().map(|s| &s.prefix).collect::<Vec<_>>()
    );
    res
}

/// The literals that mark an option as selected, after trimming and lowercasing.
pub const SELECTED_LITERALS: [&str; 3] = ["1", "yes", "true"];

/// Whether a respondent selected an option.
///
/// Survey exports encode the selection in several ways. Accepted, and nothing else:
/// - a number equal to 1
/// - text that reads `1`, `yes` or `true` once trimmed and lowercased
/// - the boolean true
///
/// Missing values, blanks and every other value are "not selected".
pub fn is_selected(value: &Value) -> bool {
    match value {
        Value::Number(n) => *n == 1.0,
        Value::Text(s) => SELECTED_LITERALS.contains(&s.trim().to_lowercase().as_str()),
        Value::Bool(b) => *b,
        Value::Missing => false,
    }
}
