//! Output formatting: table or JSON.
//!
//! Table uses `tabled` with `owo-colors` status highlighting; JSON
//! serializes the run summary via serde.

use std::io::{self, IsTerminal, Write};

use owo_colors::OwoColorize;
use tabled::{Table, Tabled, settings::Style};

use ncsync_core::{DeviceReport, Outcome, RunSummary};

use crate::cli::{ColorMode, OutputFormat};
use crate::error::CliError;

// ── Color helpers ────────────────────────────────────────────────────

/// Determine whether color output should be enabled.
pub fn should_color(mode: ColorMode) -> bool {
    match mode {
        ColorMode::Always => true,
        ColorMode::Never => false,
        ColorMode::Auto => io::stdout().is_terminal() && std::env::var("NO_COLOR").is_err(),
    }
}

// ── Rows ─────────────────────────────────────────────────────────────

#[derive(Tabled)]
struct ReportRow {
    #[tabled(rename = "Device")]
    device: String,
    #[tabled(rename = "Identity")]
    identity: String,
    #[tabled(rename = "NETCONF")]
    netconf: String,
    #[tabled(rename = "Applied")]
    applied: String,
    #[tabled(rename = "Backup")]
    backup: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Detail")]
    detail: String,
}

fn row(report: &DeviceReport, color: bool) -> ReportRow {
    let netconf = match report.netconf_enabled {
        Some(true) => paint("enabled", color, Tone::Good),
        Some(false) if report.verified == Some(true) => paint("enabled (now)", color, Tone::Good),
        Some(false) => paint("disabled", color, Tone::Warn),
        None => "-".into(),
    };
    let (status, detail) = match &report.outcome {
        Outcome::Done => (paint("done", color, Tone::Good), String::new()),
        Outcome::Failed(failure) => (
            paint(&format!("failed ({})", failure.phase), color, Tone::Bad),
            failure.detail.clone(),
        ),
    };

    ReportRow {
        device: report.address.clone(),
        identity: report
            .backup
            .as_ref()
            .map_or_else(|| "-".into(), |b| b.device_identity.clone()),
        netconf,
        applied: if report.applied { "yes" } else { "no" }.into(),
        backup: report
            .backup
            .as_ref()
            .map_or_else(|| "-".into(), |b| b.storage_path.display().to_string()),
        status,
        detail,
    }
}

#[derive(Clone, Copy)]
enum Tone {
    Good,
    Warn,
    Bad,
}

fn paint(text: &str, color: bool, tone: Tone) -> String {
    if !color {
        return text.to_owned();
    }
    match tone {
        Tone::Good => text.green().to_string(),
        Tone::Warn => text.yellow().to_string(),
        Tone::Bad => text.red().bold().to_string(),
    }
}

// ── Render dispatchers ───────────────────────────────────────────────

/// Render a run summary in the chosen format.
pub fn render_summary(
    format: OutputFormat,
    summary: &RunSummary,
    color: bool,
) -> Result<String, CliError> {
    match format {
        OutputFormat::Table => {
            let rows: Vec<ReportRow> = summary.reports.iter().map(|r| row(r, color)).collect();
            Ok(render_table(&rows))
        }
        OutputFormat::Json => render_json(summary, false),
        OutputFormat::JsonCompact => render_json(summary, true),
    }
}

/// One-line tally printed after the table.
pub fn tally(summary: &RunSummary, color: bool) -> String {
    let ok = format!("{} succeeded", summary.succeeded());
    let failed = format!("{} failed", summary.failed());
    if summary.failed() == 0 {
        format!("{}, {failed}", paint(&ok, color, Tone::Good))
    } else {
        format!("{ok}, {}", paint(&failed, color, Tone::Bad))
    }
}

/// Print the rendered output to stdout, respecting quiet mode.
pub fn print_output(output: &str, quiet: bool) {
    if quiet || output.is_empty() {
        return;
    }
    let mut stdout = io::stdout().lock();
    let _ = writeln!(stdout, "{output}");
}

// ── Format-specific renderers ────────────────────────────────────────

fn render_table<R: Tabled>(rows: &[R]) -> String {
    Table::new(rows).with(Style::rounded()).to_string()
}

pub(crate) fn render_json<T: serde::Serialize + ?Sized>(
    data: &T,
    compact: bool,
) -> Result<String, CliError> {
    let rendered = if compact {
        serde_json::to_string(data)?
    } else {
        serde_json::to_string_pretty(data)?
    };
    Ok(rendered)
}
