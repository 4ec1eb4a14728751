use log::{debug, info, warn};

use snafu::{prelude::*, Snafu};
use survey_tabs::*;

use std::fs;
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

use calamine::{open_workbook, DataType, Reader, Xlsx};

use serde::{Deserialize, Serialize};
use serde_json::json;
use serde_json::Value as JSValue;
use text_diff::print_diff;

use crate::args::Args;
use crate::report::access::check_access;
use crate::report::cache::*;
use crate::report::config_reader::*;
use crate::report::io_common::*;

pub mod access;
pub mod cache;
pub mod config_reader;
pub mod io_common;
pub mod io_csv;
pub mod io_html;
pub mod io_json;
pub mod io_xlsx;
pub mod session;

#[derive(Debug, Snafu)]
pub enum ReportError {
    #[snafu(display("Error opening workbook {path}"))]
    OpeningExcel {
        source: calamine::XlsxError,
        path: String,
    },
    #[snafu(display("Sheet {sheet} not found in the workbook"))]
    MissingSheet { sheet: String },
    #[snafu(display("Error reading sheet {sheet}"))]
    ReadingSheet {
        source: calamine::XlsxError,
        sheet: String,
    },
    #[snafu(display("Sheet {sheet} is empty"))]
    EmptySheet { sheet: String },
    #[snafu(display("Column {column} not found in sheet {sheet}"))]
    MissingColumn { sheet: String, column: String },
    #[snafu(display("Sheet {sheet} cannot be read as a dataset"))]
    InvalidDataset {
        source: survey_tabs::SurveyError,
        sheet: String,
    },
    #[snafu(display("Error opening JSON file {path}"))]
    OpeningJson {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error parsing JSON"))]
    ParsingJson { source: serde_json::Error },
    #[snafu(display("Error writing {path}"))]
    WritingOutput {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error reading the commands"))]
    ReadingInput { source: std::io::Error },
    #[snafu(display("Error writing CSV record"))]
    WritingCsv { source: csv::Error },
    #[snafu(display("Error reading the reference file {path}"))]
    OpeningReference {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Difference detected between {path} and its reference"))]
    ReferenceMismatch { path: String },
    #[snafu(display("Access denied for user {user}"))]
    AccessDenied { user: String },
    #[snafu(display("Credentials are required to access this report"))]
    MissingCredentials {},
    #[snafu(display("Unknown module {name}"))]
    UnknownModule { name: String },
    #[snafu(display("Unknown output format {format} (expected csv, html or json)"))]
    UnknownFormat { format: String },

    #[snafu(whatever, display("{message}"))]
    Whatever {
        message: String,
        #[snafu(source(from(Box<dyn std::error::Error>, Some)))]
        source: Option<Box<dyn std::error::Error>>,
    },
}

type ReportResult<T> = Result<T, ReportError>;
type BReportResult<T> = Result<T, Box<ReportError>>;

/// The tables delivered by a data source, as read.
#[derive(PartialEq, Debug, Clone)]
pub struct SourceTables {
    pub data: Dataset,
    pub labels: LabelBook,
    /// Problems that did not prevent the loading, for the user to see.
    pub warnings: Vec<String>,
}

/// The dataset ready for tabulation: derivations applied and option sets discovered.
#[derive(PartialEq, Debug, Clone)]
pub struct PreparedData {
    pub data: Dataset,
    pub labels: LabelBook,
    pub option_sets: Vec<OptionSet>,
    pub dropped_records: usize,
    pub warnings: Vec<String>,
}

/// Applies the derivations, once, and discovers the option sets.
///
/// This is the only place where derived columns are computed.
pub fn prepare(tables: SourceTables, derivations: &[Derivation]) -> PreparedData {
    let mut data = tables.data;
    let mut dropped_records = 0;
    for d in derivations {
        match d.kind {
            DerivationKind::AgeClass => {
                dropped_records += derive_age_class(&mut data, &d.source, &d.target);
            }
            DerivationKind::VisitCap => derive_visit_cap(&mut data, &d.source, &d.target),
        }
    }
    let option_sets = discover_option_sets(data.columns());
    info!(
        "prepare: {} records ({} dropped), {} columns, {} option sets",
        data.len(),
        dropped_records,
        data.columns().len(),
        option_sets.len()
    );
    PreparedData {
        data,
        labels: tables.labels,
        option_sets,
        dropped_records,
        warnings: tables.warnings,
    }
}

/// The tabulations of one module, for the current district selection.
#[derive(PartialEq, Debug, Clone)]
pub struct ModuleReport {
    pub name: String,
    pub outcomes: Vec<TabulationOutcome>,
}

/// What the report header shows about the current selection.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct ReportHeader {
    pub title: String,
    pub districts: String,
    pub interviews: usize,
}

pub fn tabulate_module(data: &Dataset, prepared: &PreparedData, module: &ModuleConfig) -> ModuleReport {
    let groups = data.groups();
    let mut outcomes: Vec<TabulationOutcome> = Vec::new();
    if module.multi_response {
        for set in prepared.option_sets.iter() {
            outcomes.push(tabulate_multi(data, set, &groups, &prepared.labels));
        }
    } else {
        for var in module.variables.iter() {
            if !data.has_column(var) {
                debug!(
                    "tabulate_module: {:?}: variable {:?} not in the dataset, skipped",
                    module.name, var
                );
                continue;
            }
            outcomes.push(tabulate_single(data, var, &groups, &prepared.labels));
        }
    }
    ModuleReport {
        name: module.name.clone(),
        outcomes,
    }
}

/// Finds the modules named on the command line, by name or by position (starting at 1).
/// No names means all the modules.
pub fn select_modules<'a>(
    modules: &'a [ModuleConfig],
    names: &[String],
) -> ReportResult<Vec<&'a ModuleConfig>> {
    if names.is_empty() {
        return Ok(modules.iter().collect());
    }
    let mut res: Vec<&ModuleConfig> = Vec::new();
    for name in names {
        let m = match name.trim().parse::<usize>() {
            Ok(idx) if idx >= 1 => modules.get(idx - 1),
            _ => modules.iter().find(|m| m.name == name.trim()),
        };
        res.push(m.context(UnknownModuleSnafu { name: name.clone() })?);
    }
    Ok(res)
}

/// Where the outputs go.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum OutputTarget {
    Stdout,
    Directory(PathBuf),
}

/// Everything needed to produce the outputs, independently of the data.
#[derive(PartialEq, Debug, Clone)]
pub struct RunContext {
    pub title: String,
    pub format: OutputFormat,
    pub target: OutputTarget,
    pub reference: Option<String>,
    pub modules: Vec<ModuleConfig>,
}

/// Tabulates the modules for the selected districts and writes the outputs.
///
/// Returns the paths of the files written. With the standard output as target, everything
/// goes to `out` and nothing is returned.
pub fn emit(
    ctx: &RunContext,
    prepared: &PreparedData,
    modules: &[&ModuleConfig],
    selected: &[String],
    out: &mut dyn Write,
) -> ReportResult<Vec<String>> {
    let available: Vec<String> = prepared
        .data
        .groups()
        .iter()
        .map(|g| g.to_string())
        .collect();
    let data = prepared.data.filter_groups(selected);
    let header = ReportHeader {
        title: ctx.title.clone(),
        districts: district_display(selected, &available),
        interviews: data.len(),
    };
    info!(
        "Districts: {} - Total interviews: {}",
        header.districts, header.interviews
    );

    let reports: Vec<ModuleReport> = modules
        .iter()
        .map(|m| tabulate_module(&data, prepared, m))
        .collect();

    let mut written: Vec<String> = Vec::new();
    match ctx.format {
        OutputFormat::Csv => {
            for report in reports.iter() {
                for outcome in report.outcomes.iter() {
                    let t = match outcome {
                        TabulationOutcome::Table(t) => t,
                        TabulationOutcome::NoData { .. } => {
                            info!("{}: {}", outcome.title(), no_data_message(outcome));
                            continue;
                        }
                    };
                    let file_name = table_file_name(&t.title);
                    let content = io_csv::table_csv_string(t)?;
                    if let Some(ref_dir) = ctx.reference.as_ref() {
                        check_reference(ref_dir, &file_name, &content)?;
                    }
                    if let Some(p) = write_output(&ctx.target, &file_name, &content, out)? {
                        written.push(p);
                    }
                }
            }
        }
        OutputFormat::Html => {
            let content = io_html::render_report(&header, &reports);
            if let Some(p) = write_output(&ctx.target, "report.html", &content, out)? {
                written.push(p);
            }
        }
        OutputFormat::Json => {
            let js = io_json::report_json(&header, &reports);
            let content = serde_json::to_string_pretty(&js).context(ParsingJsonSnafu {})?;
            if let Some(p) = write_output(&ctx.target, "report.json", &content, out)? {
                written.push(p);
            }
        }
    }
    Ok(written)
}

fn write_output(
    target: &OutputTarget,
    file_name: &str,
    content: &str,
    out: &mut dyn Write,
) -> ReportResult<Option<String>> {
    match target {
        OutputTarget::Stdout => {
            writeln!(out, "{}", content).context(WritingOutputSnafu { path: "stdout" })?;
            Ok(None)
        }
        OutputTarget::Directory(dir) => {
            fs::create_dir_all(dir).context(WritingOutputSnafu {
                path: dir.display().to_string(),
            })?;
            let p: PathBuf = dir.join(file_name);
            let path = p.as_path().display().to_string();
            fs::write(&p, content).context(WritingOutputSnafu { path: path.clone() })?;
            info!("Wrote {:?}", path);
            Ok(Some(path))
        }
    }
}

/// Compares a produced export with the file of the same name in the reference directory.
fn check_reference(ref_dir: &str, file_name: &str, content: &str) -> ReportResult<()> {
    let p: PathBuf = [ref_dir, file_name].iter().collect();
    let path = p.as_path().display().to_string();
    let expected =
        fs::read_to_string(&p).context(OpeningReferenceSnafu { path: path.clone() })?;
    if expected != content {
        warn!("Found differences with the reference {:?}", path);
        print_diff(expected.as_str(), content, "\n");
        return ReferenceMismatchSnafu { path }.fail();
    }
    debug!("check_reference: {:?} matches", path);
    Ok(())
}

fn build_context(args: &Args, config: &ReportConfig) -> ReportResult<RunContext> {
    let format_s = args
        .format
        .clone()
        .or_else(|| config.output_settings.format.clone())
        .unwrap_or_else(|| "csv".to_string());
    let out = args
        .out
        .clone()
        .or_else(|| config.output_settings.output_directory.clone());
    let target = match out {
        None => OutputTarget::Stdout,
        Some(s) if s == "stdout" || s.is_empty() => OutputTarget::Stdout,
        Some(s) => OutputTarget::Directory(PathBuf::from(s)),
    };
    Ok(RunContext {
        title: config.report_title(),
        format: OutputFormat::parse(&format_s)?,
        target,
        reference: args.reference.clone(),
        modules: config.modules(),
    })
}

fn input_path(args: &Args, config: &ReportConfig, config_dir: Option<&Path>) -> ReportResult<String> {
    if let Some(p) = args.input.clone() {
        return Ok(p);
    }
    match config.data_source.file_path.as_ref() {
        // Relative paths in the configuration are relative to the configuration file.
        Some(p) => match config_dir {
            Some(dir) => Ok(dir.join(p).as_path().display().to_string()),
            None => Ok(p.clone()),
        },
        None => whatever!("No input workbook: use --input or set dataSource.filePath"),
    }
}

/// Runs the report described by the command line.
pub fn run_report(args: &Args) -> ReportResult<()> {
    let (config, config_dir) = match args.config.as_ref() {
        Some(p) => {
            let config = read_config(p)?;
            let dir = Path::new(p).parent().map(|d| d.to_path_buf());
            (config, dir)
        }
        None => (default_config(), None),
    };
    debug!("run_report: config: {:?}", config);

    let open_source = || -> ReportResult<XlsxSource> {
        Ok(XlsxSource {
            path: input_path(args, &config, config_dir.as_deref())?,
            settings: config.data_source.clone(),
            grouping_column: config.grouping_column(),
        })
    };
    let stdin = std::io::stdin();
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    run_with(args, &config, open_source, stdin.lock(), &mut out)
}

/// Runs the report with the data source built by `open_source`.
///
/// The access gate is checked first: the source is not even built for a user who is
/// not let in.
pub fn run_with<S, F, R>(
    args: &Args,
    config: &ReportConfig,
    open_source: F,
    input: R,
    out: &mut dyn Write,
) -> ReportResult<()>
where
    S: DataSource,
    F: FnOnce() -> ReportResult<S>,
    R: BufRead,
{
    let user = check_access(&config.users, args.user.as_deref(), args.password.as_deref())?;
    if let Some(u) = user {
        info!("Logged in as: {}", u);
    }

    let ctx = build_context(args, config)?;

    if args.list_modules {
        for (idx, m) in ctx.modules.iter().enumerate() {
            writeln!(out, "{:>2}  {}", idx + 1, m.name)
                .context(WritingOutputSnafu { path: "stdout" })?;
        }
        return Ok(());
    }

    let mut cache = DatasetCache::new(open_source()?, config.derivations());

    if args.interactive {
        return session::run_session(&mut cache, &ctx, input, out);
    }

    let modules = select_modules(&ctx.modules, &args.module)?;
    let prepared = match cache.load() {
        Ok(p) => p,
        Err(e) => return Err(*e),
    };
    for w in prepared.warnings.iter() {
        warn!("{}", w);
    }
    let written = emit(&ctx, prepared, &modules, &args.district, out)?;
    info!("{} files written", written.len());
    Ok(())
}
