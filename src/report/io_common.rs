use crate::report::*;

/// The name of the CSV export of a table.
///
/// Characters that cannot appear in a file name are replaced by underscores.
pub fn table_file_name(title: &str) -> String {
    let clean: String = title
        .trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    let clean = if clean.is_empty() || clean == "." || clean == ".." {
        "table".to_string()
    } else {
        clean
    };
    format!("{}_table.csv", clean)
}

/// The districts line of the report header.
pub fn district_display(selected: &[String], available: &[String]) -> String {
    let covers_all = available.iter().all(|a| selected.contains(a));
    if selected.is_empty() || covers_all {
        "All Districts".to_string()
    } else {
        selected.join(", ")
    }
}

/// The line shown in place of an empty tabulation.
pub fn no_data_message(outcome: &TabulationOutcome) -> String {
    match outcome {
        TabulationOutcome::Table(_) => "".to_string(),
        TabulationOutcome::NoData { reason, .. } => match reason {
            NoDataReason::MissingVariable => "This variable is not in the dataset.".to_string(),
            _ => "No data available for this multi-selection variable.".to_string(),
        },
    }
}
