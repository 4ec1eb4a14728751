use crate::report::*;

use std::io::BufRead;

const HELP: &str = "Commands:
  modules                 list the modules
  module <name|number>    show a module
  districts [a,b,...]     restrict to some districts (no argument: all of them)
  refresh                 reload the data
  help                    this message
  quit                    leave";

#[derive(Eq, PartialEq, Debug, Clone)]
pub enum Command {
    Modules,
    Module(String),
    Districts(Vec<String>),
    Refresh,
    Help,
    Quit,
    Unknown(String),
}

/// Parses one line of input. Blank lines are not commands.
pub fn parse_command(line: &str) -> Option<Command> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((w, r)) => (w, r.trim()),
        None => (line, ""),
    };
    let cmd = match (word.to_lowercase().as_str(), rest) {
        ("modules", "") => Command::Modules,
        ("module", name) if !name.is_empty() => Command::Module(name.to_string()),
        ("districts", list) => Command::Districts(
            list.split(',')
                .map(|s| s.trim())
                .filter(|s| !s.is_empty())
                .map(|s| s.to_string())
                .collect(),
        ),
        ("refresh", "") => Command::Refresh,
        ("help", "") => Command::Help,
        ("quit", "") | ("exit", "") => Command::Quit,
        _ => Command::Unknown(line.to_string()),
    };
    Some(cmd)
}

fn show_module<S: DataSource>(
    cache: &mut DatasetCache<S>,
    ctx: &RunContext,
    module: &ModuleConfig,
    selected: &[String],
    out: &mut dyn Write,
) -> ReportResult<()> {
    let prepared = match cache.load() {
        Ok(p) => p,
        Err(e) => return Err(*e),
    };
    writeln!(out, "== {} ==", module.name).context(WritingOutputSnafu { path: "stdout" })?;
    let written = emit(ctx, prepared, &[module], selected, out)?;
    for p in written {
        writeln!(out, "wrote {}", p).context(WritingOutputSnafu { path: "stdout" })?;
    }
    Ok(())
}

fn refresh<S: DataSource>(
    cache: &mut DatasetCache<S>,
    ctx: &RunContext,
    active: Option<usize>,
    selected: &[String],
    out: &mut dyn Write,
) -> ReportResult<()> {
    cache.invalidate();
    let n = match cache.load() {
        Ok(p) => p.data.len(),
        Err(e) => return Err(*e),
    };
    writeln!(out, "Data reloaded: {} records", n).context(WritingOutputSnafu { path: "stdout" })?;
    match active {
        Some(idx) => show_module(cache, ctx, &ctx.modules[idx], selected, out),
        None => Ok(()),
    }
}

/// Reads commands until `quit` or the end of the input.
///
/// The active module is shown again after every change of the district selection.
/// Errors are reported and the session goes on.
pub fn run_session<S: DataSource, R: BufRead>(
    cache: &mut DatasetCache<S>,
    ctx: &RunContext,
    input: R,
    out: &mut dyn Write,
) -> ReportResult<()> {
    let mut active: Option<usize> = None;
    let mut selected: Vec<String> = Vec::new();
    writeln!(out, "Data source: {}\n{}", cache.source().describe(), HELP)
        .context(WritingOutputSnafu { path: "stdout" })?;
    for line in input.lines() {
        let line = line.context(ReadingInputSnafu {})?;
        let cmd = match parse_command(&line) {
            Some(c) => c,
            None => continue,
        };
        debug!("run_session: {:?}", cmd);
        let res: ReportResult<()> = match cmd {
            Command::Quit => break,
            Command::Help => {
                writeln!(out, "{}", HELP).context(WritingOutputSnafu { path: "stdout" })
            }
            Command::Modules => ctx.modules.iter().enumerate().try_for_each(|(idx, m)| {
                writeln!(out, "{:>2}  {}", idx + 1, m.name)
                    .context(WritingOutputSnafu { path: "stdout" })
            }),
            Command::Unknown(s) => writeln!(out, "Unknown command: {} (try help)", s)
                .context(WritingOutputSnafu { path: "stdout" }),
            Command::Module(name) => {
                match select_modules(&ctx.modules, &[name]) {
                    Ok(found) => {
                        active = ctx.modules.iter().position(|m| m == found[0]);
                        show_module(cache, ctx, found[0], &selected, out)
                    }
                    Err(e) => Err(e),
                }
            }
            Command::Districts(list) => {
                selected = list;
                match active {
                    Some(idx) => show_module(cache, ctx, &ctx.modules[idx], &selected, out),
                    None => Ok(()),
                }
            }
            Command::Refresh => refresh(cache, ctx, active, &selected, out),
        };
        if let Err(e) = res {
            warn!("{}", e);
            writeln!(out, "Error: {}", e).context(WritingOutputSnafu { path: "stdout" })?;
        }
    }
    Ok(())
}
