//! Projections of a tabulation for display and for export. No computation happens here.

use crate::config::*;

/// How a cell stands out in the display grid.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum Emphasis {
    Plain,
    /// Row labels: bold.
    Bold,
    /// The Total row and the Total column: bold, with a distinct background.
    Total,
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct GridCell {
    pub text: String,
    pub emphasis: Emphasis,
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct GridRow {
    pub label: GridCell,
    /// Two cells (N, %) per column, the Total column last.
    pub cells: Vec<GridCell>,
}

/// The display form of a tabulation.
///
/// The header has two levels: the title spans both header rows, then every column
/// (grouping values and Total) spans two sub-columns "N" and "%".
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct DisplayGrid {
    pub title: String,
    pub columns: Vec<String>,
    pub rows: Vec<GridRow>,
}

impl DisplayGrid {
    pub fn sub_columns() -> [&'static str; 2] {
        ["N", "%"]
    }
}

/// Percentages are shown with one decimal and a percent sign.
pub fn format_pct(pct: f64) -> String {
    format!("{:.1}%", pct)
}

fn columns(t: &Tabulation) -> Vec<String> {
    let mut cols = t.groups.clone();
    cols.push(TOTAL.to_string());
    cols
}

pub fn display_grid(t: &Tabulation) -> DisplayGrid {
    let cols = columns(t);
    let total_col = cols.len() - 1;
    let mut rows: Vec<GridRow> = Vec::new();
    let all_rows = t.rows.iter().map(|r| (r, false)).chain([(&t.total, true)]);
    for (row, is_total_row) in all_rows {
        let mut cells: Vec<GridCell> = Vec::new();
        for (idx, c) in row.cells.iter().enumerate() {
            // A cell in both the Total row and the Total column gets the same emphasis once.
            let emphasis = if is_total_row || idx == total_col {
                Emphasis::Total
            } else {
                Emphasis::Plain
            };
            cells.push(GridCell {
                text: c.n.to_string(),
                emphasis,
            });
            cells.push(GridCell {
                text: format_pct(c.pct),
                emphasis,
            });
        }
        rows.push(GridRow {
            label: GridCell {
                text: row.label.clone(),
                emphasis: if is_total_row {
                    Emphasis::Total
                } else {
                    Emphasis::Bold
                },
            },
            cells,
        });
    }
    DisplayGrid {
        title: t.title.clone(),
        columns: cols,
        rows,
    }
}

/// The flat export of a tabulation, one record per line.
///
/// Same shape as the display grid: two header records, then one record per row with
/// the N and % of every column as separate fields.
pub fn export_records(t: &Tabulation) -> Vec<Vec<String>> {
    let grid = display_grid(t);
    let mut res: Vec<Vec<String>> = Vec::new();

    let mut header1 = vec![grid.title.clone()];
    for c in grid.columns.iter() {
        header1.push(c.clone());
        header1.push("".to_string());
    }
    res.push(header1);

    let mut header2 = vec!["".to_string()];
    for _ in grid.columns.iter() {
        header2.extend(DisplayGrid::sub_columns().iter().map(|s| s.to_string()));
    }
    res.push(header2);

    for row in grid.rows {
        let mut rec = vec![row.label.text];
        rec.extend(row.cells.into_iter().map(|c| c.text));
        res.push(rec);
    }
    res
}
