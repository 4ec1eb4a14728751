use crate::report::*;

use survey_tabs::render::export_records;

/// Writes the export of a table: two header records, then one record per row.
pub fn write_table_csv<W: Write>(writer: W, t: &Tabulation) -> ReportResult<()> {
    let mut wtr = csv::WriterBuilder::new().flexible(false).from_writer(writer);
    for record in export_records(t) {
        wtr.write_record(&record).context(WritingCsvSnafu {})?;
    }
    wtr.flush().context(WritingOutputSnafu { path: "csv" })?;
    Ok(())
}

pub fn table_csv_string(t: &Tabulation) -> ReportResult<String> {
    let mut buf: Vec<u8> = Vec::new();
    write_table_csv(&mut buf, t)?;
    let s = String::from_utf8(buf).whatever_context("CSV export is not valid UTF-8")?;
    Ok(s)
}
