// periochart CLI - headless chart validation, summaries, navigation, and entry replay

mod exit_codes;
mod replay;

use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use periochart_config::{OutputFormat, Settings, SettingsError};
use periochart_engine::navigation::navigation_map;
use periochart_engine::validation::violation_count;
use periochart_engine::{
    initialize, summarize, validate, CellKey, Chart, Direction, EditTimings, PartialChart,
    SubmitOutcome, ViolationMap,
};

use exit_codes::{EXIT_CHART_INVALID, EXIT_ERROR, EXIT_IO, EXIT_PARSE, EXIT_SUCCESS, EXIT_USAGE};

#[derive(Parser)]
#[command(name = "periochart")]
#[command(about = "Periodontal chart tools (headless)")]
#[command(long_version = long_version())]
#[command(version)]
#[command(subcommand_required = false)]
struct Cli {
    /// Settings file (default: <config dir>/periochart/settings.json)
    #[arg(long, global = true, env = "PERIOCHART_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the default chart (every tooth, both surfaces)
    Template,

    /// Validate a chart (exit 0 = valid, exit 3 = violations)
    #[command(after_help = "\
The chart file holds a partial chart: only the teeth and surfaces that differ
from the defaults need to be present.

Examples:
  periochart validate chart.json
  periochart validate chart.json --json | jq .errors
  cat chart.json | periochart validate -")]
    Validate {
        /// Partial chart JSON (file path, or - for stdin)
        chart: PathBuf,

        /// Output JSON
        #[arg(long)]
        json: bool,
    },

    /// Print mean probing depth, attachment level, plaque and bleeding scores
    Summary {
        /// Partial chart JSON (file path, or - for stdin)
        chart: PathBuf,

        /// Output JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the cell reached by moving from a cell in a direction
    #[command(after_help = "\
Directions are next, prev, up, down, or a key name (Tab, Enter, ArrowLeft, ...)
combined with --shift.

Examples:
  periochart navigate 18-buccal-mobility prev
  periochart navigate 18-buccal-mobility Tab --shift")]
    Navigate {
        /// Cell key, e.g. 18-buccal-probing_depth_mid
        cell: String,

        /// Direction or key name
        direction: String,

        /// Shift held (for Tab and Enter)
        #[arg(long)]
        shift: bool,
    },

    /// Replay a timed entry script through the edit pipeline
    #[command(after_help = "\
Exit code 3 indicates the script's last submit was blocked by violations.

Examples:
  periochart replay session.toml
  periochart replay session.toml --chart baseline.json --output final.json
  periochart replay session.toml --json | jq '.timeline[]'")]
    Replay {
        /// TOML script of [[event]] entries
        script: PathBuf,

        /// Partial chart JSON to start from (default: empty chart)
        #[arg(long)]
        chart: Option<PathBuf>,

        /// Write the final chart as JSON
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,

        /// Output JSON
        #[arg(long)]
        json: bool,

        /// Quiet mode - only print errors
        #[arg(long, short = 'q')]
        quiet: bool,
    },
}

fn long_version() -> &'static str {
    if cfg!(debug_assertions) {
        concat!(
            env!("CARGO_PKG_VERSION"),
            "\nengine:  periochart-engine ", env!("CARGO_PKG_VERSION"),
            "\nbuild:   debug",
        )
    } else {
        concat!(
            env!("CARGO_PKG_VERSION"),
            "\nengine:  periochart-engine ", env!("CARGO_PKG_VERSION"),
            "\nbuild:   release",
        )
    }
}

/// Diagnostics go to stderr, filtered by RUST_LOG (default: warnings only).
fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init();
}

fn main() -> ExitCode {
    init_logging();
    let cli = Cli::parse();

    let result = load_settings(cli.config.as_deref()).and_then(|settings| match cli.command {
        None => {
            // No subcommand = show help
            eprintln!("Usage: periochart <command> [options]");
            eprintln!("       periochart --help for more information");
            Ok(())
        }
        Some(Commands::Template) => cmd_template(&settings),
        Some(Commands::Validate { chart, json }) => cmd_validate(&settings, &chart, json),
        Some(Commands::Summary { chart, json }) => cmd_summary(&settings, &chart, json),
        Some(Commands::Navigate { cell, direction, shift }) => cmd_navigate(&cell, &direction, shift),
        Some(Commands::Replay { script, chart, output, json, quiet }) => {
            cmd_replay(&settings, &script, chart.as_deref(), output.as_deref(), json, quiet)
        }
    });

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn args(msg: impl Into<String>) -> Self {
        Self { code: EXIT_USAGE, message: msg.into(), hint: None }
    }

    pub fn io(msg: impl Into<String>) -> Self {
        Self { code: EXIT_IO, message: msg.into(), hint: None }
    }

    pub fn parse(msg: impl Into<String>) -> Self {
        Self { code: EXIT_PARSE, message: msg.into(), hint: None }
    }

    pub fn general(msg: impl Into<String>) -> Self {
        Self { code: EXIT_ERROR, message: msg.into(), hint: None }
    }

    /// Chart failed validation. Details were already printed to stdout.
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self { code: EXIT_CHART_INVALID, message: msg.into(), hint: None }
    }

    /// Add a hint to an existing error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

impl From<SettingsError> for CliError {
    fn from(err: SettingsError) -> Self {
        match err {
            SettingsError::Io(_) => CliError::io(err.to_string()),
            SettingsError::Parse(_) => CliError::parse(err.to_string()),
        }
    }
}

// ============================================================================
// Shared helpers
// ============================================================================

fn load_settings(path: Option<&Path>) -> Result<Settings, CliError> {
    match path {
        Some(path) => Ok(Settings::load_from(path)?),
        None => Ok(Settings::load()),
    }
}

fn timings(settings: &Settings) -> EditTimings {
    EditTimings::from_millis(
        settings.numeric_debounce_ms,
        settings.text_debounce_ms,
        settings.change_debounce_ms,
    )
}

fn wants_json(settings: &Settings, flag: bool) -> bool {
    flag || settings.output_format == OutputFormat::Json
}

/// Read a file, or stdin when the path is `-`.
fn read_input(path: &Path) -> Result<String, CliError> {
    if path.as_os_str() == "-" {
        let mut content = String::new();
        io::stdin()
            .read_to_string(&mut content)
            .map_err(|e| CliError::io(e.to_string()))?;
        return Ok(content);
    }
    fs::read_to_string(path).map_err(|e| CliError::io(format!("{}: {}", path.display(), e)))
}

/// Build a full chart from a partial chart JSON file.
fn load_chart(path: &Path) -> Result<Chart, CliError> {
    let content = read_input(path)?;
    let partial: PartialChart = serde_json::from_str(&content).map_err(|e| {
        CliError::parse(format!("{}: {}", path.display(), e))
            .with_hint("expected { \"<tooth>\": { \"buccal\": { \"<field>\": value } } }")
    })?;
    log::debug!("loaded {} tooth override(s) from {}", partial.len(), path.display());
    Ok(initialize(&partial))
}

fn to_json(value: &impl Serialize, pretty: bool) -> Result<String, CliError> {
    let json = if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    };
    json.map_err(|e| CliError::general(format!("JSON serialization failed: {}", e)))
}

fn print_json(value: &impl Serialize, pretty: bool) -> Result<(), CliError> {
    let json = to_json(value, pretty)?;
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    writeln!(handle, "{}", json).map_err(|e| CliError::io(e.to_string()))
}

// ============================================================================
// template
// ============================================================================

fn cmd_template(settings: &Settings) -> Result<(), CliError> {
    print_json(&initialize(&PartialChart::new()), settings.pretty)
}

// ============================================================================
// validate
// ============================================================================

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ValidationReport<'a> {
    valid: bool,
    /// Surfaces with at least one violation.
    error_groups: usize,
    violations: usize,
    errors: &'a ViolationMap,
}

fn cmd_validate(settings: &Settings, path: &Path, json: bool) -> Result<(), CliError> {
    let chart = load_chart(path)?;
    let errors = validate(&chart);
    let report = ValidationReport {
        valid: errors.is_empty(),
        error_groups: errors.len(),
        violations: violation_count(&errors),
        errors: &errors,
    };

    if wants_json(settings, json) {
        print_json(&report, settings.pretty)?;
    } else {
        let stdout = io::stdout();
        let mut out = stdout.lock();
        for (site, violations) in &errors {
            let codes: Vec<String> = violations.iter().map(|v| v.code()).collect();
            writeln!(out, "{}: {}", site, codes.join(", ")).map_err(|e| CliError::io(e.to_string()))?;
        }
        if report.valid {
            writeln!(out, "chart valid").map_err(|e| CliError::io(e.to_string()))?;
        }
    }

    if report.valid {
        Ok(())
    } else {
        Err(CliError::invalid(format!(
            "{} violation(s) on {} surface(s)",
            report.violations, report.error_groups
        )))
    }
}

// ============================================================================
// summary
// ============================================================================

fn cmd_summary(settings: &Settings, path: &Path, json: bool) -> Result<(), CliError> {
    let chart = load_chart(path)?;
    let summary = summarize(&chart).formatted();

    if wants_json(settings, json) {
        return print_json(&summary, settings.pretty);
    }

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let lines = [
        ("mean probing depth", format!("{} mm", summary.mean_probing_depth)),
        ("mean attachment level", format!("{} mm", summary.mean_attachment_level)),
        ("plaque", format!("{}%", summary.plaque_percent)),
        ("bleeding on probing", format!("{}%", summary.bleeding_percent)),
    ];
    for (label, value) in lines {
        writeln!(out, "{:<22} {}", format!("{}:", label), value).map_err(|e| CliError::io(e.to_string()))?;
    }
    Ok(())
}

// ============================================================================
// navigate
// ============================================================================

fn parse_direction(raw: &str, shift: bool) -> Option<Direction> {
    raw.parse::<Direction>()
        .ok()
        .or_else(|| Direction::from_key(raw, shift))
}

fn cmd_navigate(cell: &str, direction: &str, shift: bool) -> Result<(), CliError> {
    let key = cell.parse::<CellKey>().map_err(|e| {
        CliError::args(e.to_string()).with_hint("cell keys look like 18-buccal-probing_depth_mid")
    })?;
    let dir = parse_direction(direction, shift).ok_or_else(|| {
        CliError::args(format!("unknown direction {:?}", direction))
            .with_hint("use next, prev, up, down, Tab, Enter, or an arrow key name")
    })?;

    let target = navigation_map()
        .neighbor(&key, dir)
        .ok_or_else(|| CliError::general(format!("no {} neighbor for {}", dir, key)))?;

    println!("{}", target);
    Ok(())
}

// ============================================================================
// replay
// ============================================================================

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ReplayOutput<'a> {
    revision: u64,
    error_groups: usize,
    submitted: usize,
    timeline: &'a [replay::TimelineEntry],
}

fn cmd_replay(
    settings: &Settings,
    script_path: &Path,
    chart_path: Option<&Path>,
    output: Option<&Path>,
    json: bool,
    quiet: bool,
) -> Result<(), CliError> {
    let script = replay::ReplayScript::parse(&read_input(script_path)?)?;
    let initial = match chart_path {
        Some(path) => load_chart(path)?,
        None => Chart::default(),
    };

    let report = replay::run(&script, initial, timings(settings))?;

    if let Some(path) = output {
        let chart_json = to_json(&report.chart, settings.pretty)?;
        fs::write(path, chart_json).map_err(|e| CliError::io(format!("{}: {}", path.display(), e)))?;
    }

    if wants_json(settings, json) {
        print_json(
            &ReplayOutput {
                revision: report.revision,
                error_groups: report.error_groups,
                submitted: report.submitted,
                timeline: &report.timeline,
            },
            settings.pretty,
        )?;
    } else if !quiet {
        let stdout = io::stdout();
        let mut out = stdout.lock();
        for entry in &report.timeline {
            writeln!(out, "{}", entry).map_err(|e| CliError::io(e.to_string()))?;
        }
        writeln!(
            out,
            "replayed {} event(s): revision {}, {} surface(s) with violations",
            script.events.len(),
            report.revision,
            report.error_groups
        )
        .map_err(|e| CliError::io(e.to_string()))?;
    }

    match report.last_submit {
        Some(SubmitOutcome::Blocked { error_groups }) => Err(CliError::invalid(format!(
            "submission blocked: {} surface(s) with violations",
            error_groups
        ))),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_direction() {
        assert_eq!(parse_direction("next", false), Some(Direction::Next));
        assert_eq!(parse_direction("Tab", true), Some(Direction::Prev));
        assert_eq!(parse_direction("Enter", false), Some(Direction::Down));
        assert_eq!(parse_direction("sideways", false), None);
    }

    #[test]
    fn test_settings_error_exit_codes() {
        assert_eq!(CliError::from(SettingsError::Io("x".into())).code, EXIT_IO);
        assert_eq!(CliError::from(SettingsError::Parse("x".into())).code, EXIT_PARSE);
    }

    #[test]
    fn test_timings_from_settings() {
        let mut settings = Settings::default();
        settings.text_debounce_ms = 500;
        let t = timings(&settings);
        assert_eq!(t.text, std::time::Duration::from_millis(500));
        assert_eq!(t.numeric, std::time::Duration::from_millis(150));
    }
}
