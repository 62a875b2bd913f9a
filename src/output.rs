//! Terminal output formatting.
//!
//! One line per reported outcome, printed the moment the probe finishes.
//! `console` drops the colors automatically when stdout is not a terminal.

use crate::scanner::{OutcomeKind, ProbeOutcome};
use console::{style, Style};
use std::io::{self, Write};

/// Render an outcome as a single line (without trailing newline).
pub fn format_outcome(outcome: &ProbeOutcome) -> String {
    let symbol = outcome.kind.symbol();
    match outcome.kind {
        OutcomeKind::Open => format!(
            "{} {}",
            Style::new()
                .green()
                .apply_to(format!("[{}] {} Is Open", symbol, outcome.port)),
            outcome.address
        ),
        OutcomeKind::ClosedFast => format!(
            "{} {}",
            Style::new()
                .red()
                .apply_to(format!("[{}] {} - Is closed", symbol, outcome.port)),
            outcome.address
        ),
        OutcomeKind::ClosedSlow => format!(
            "{} {}",
            Style::new()
                .yellow()
                .apply_to(format!("[{}] {} - Is closed", symbol, outcome.port)),
            outcome.address
        ),
        OutcomeKind::Unresolvable => format!(
            "{} Is warning",
            Style::new()
                .dim()
                .apply_to(format!("[{}] {}:{} -", symbol, outcome.address, outcome.port)),
        ),
    }
}

/// Print an outcome line to stdout.
///
/// Lines from concurrent probes may interleave with each other but are never
/// split, since each is written under a single stdout lock.
pub fn print_outcome(outcome: &ProbeOutcome) {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    // A closed pipe is not worth aborting a probe over.
    let _ = writeln!(out, "{}", format_outcome(outcome));
}

/// Print the banner shown before scanning starts.
pub fn print_scan_header(port: u16, segments: usize) {
    println!(
        "{} {} v{}",
        style("Starting").cyan(),
        style("lanprobe").cyan().bold(),
        env!("CARGO_PKG_VERSION")
    );
    println!(
        "{} Probing port {} on {} segment(s)...",
        style("•").dim(),
        style(port).white().bold(),
        style(segments).white().bold()
    );
    println!();
}

/// Print an error message.
pub fn print_error(msg: &str) {
    eprintln!("{} {}", style("Error:").red().bold(), msg);
}

/// Print a warning message.
pub fn print_warning(msg: &str) {
    eprintln!("{} {}", style("Warning:").yellow().bold(), msg);
}

/// Print an info message.
pub fn print_info(msg: &str) {
    println!("{} {}", style("ℹ").blue().bold(), msg);
}
