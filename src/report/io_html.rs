use crate::report::*;

use survey_tabs::render::{display_grid, DisplayGrid, Emphasis, GridCell};

const HEADER_COLOR: &str = "#2905f5";
const TOTAL_COLOR: &str = "#5337f3";

fn escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn style(cell: &GridCell) -> String {
    match cell.emphasis {
        Emphasis::Plain => "".to_string(),
        Emphasis::Bold => "font-weight:bold".to_string(),
        Emphasis::Total => format!("font-weight:bold;background:{}", TOTAL_COLOR),
    }
}

fn render_cell(cell: &GridCell) -> String {
    format!(
        "<td style=\"{}\">{}</td>",
        style(cell),
        escape(&cell.text)
    )
}

pub fn render_table(grid: &DisplayGrid) -> String {
    let mut html = String::new();
    html.push_str("<table class=\"customtbl\">\n");
    html.push_str(&format!(
        "<tr><th rowspan=\"2\">{}</th>",
        escape(&grid.title)
    ));
    for col in grid.columns.iter() {
        html.push_str(&format!("<th colspan=\"2\">{}</th>", escape(col)));
    }
    html.push_str("</tr>\n<tr>");
    for _ in grid.columns.iter() {
        for sub in DisplayGrid::sub_columns() {
            html.push_str(&format!("<th>{}</th>", sub));
        }
    }
    html.push_str("</tr>\n");
    for row in grid.rows.iter() {
        html.push_str("<tr>");
        html.push_str(&render_cell(&row.label));
        for c in row.cells.iter() {
            html.push_str(&render_cell(c));
        }
        html.push_str("</tr>\n");
    }
    html.push_str("</table>\n");
    html
}

/// The whole report as a single page.
pub fn render_report(header: &ReportHeader, reports: &[ModuleReport]) -> String {
    let mut html = String::new();
    html.push_str("<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n");
    html.push_str(&format!("<title>{}</title>\n", escape(&header.title)));
    html.push_str("<style>\n");
    html.push_str("table.customtbl {border-collapse: collapse; width: 100%;}\n");
    html.push_str(&format!(
        "table.customtbl th {{background: {}; font-weight: bold; border: 1px solid #aaa; padding: 6px;}}\n",
        HEADER_COLOR
    ));
    html.push_str("table.customtbl td {border: 1px solid #aaa; padding: 6px;}\n");
    html.push_str("</style>\n</head>\n<body>\n");
    html.push_str(&format!("<h1>{}</h1>\n", escape(&header.title)));
    html.push_str(&format!(
        "<p>Districts: {}</p>\n<p style=\"text-align: right; font-weight: bold;\">Total Interviews: {}</p>\n",
        escape(&header.districts),
        header.interviews
    ));
    for report in reports.iter() {
        html.push_str(&format!("<h2>{}</h2>\n", escape(&report.name)));
        for outcome in report.outcomes.iter() {
            match outcome {
                TabulationOutcome::Table(t) => {
                    html.push_str(&render_table(&display_grid(t)));
                }
                TabulationOutcome::NoData { .. } => {
                    html.push_str(&format!(
                        "<h3>{}</h3>\n<p>{}</p>\n",
                        escape(outcome.title()),
                        escape(&no_data_message(outcome))
                    ));
                }
            }
        }
    }
    html.push_str("</body>\n</html>\n");
    html
}
