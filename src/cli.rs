//! Command-line interface definitions for lanprobe.
//!
//! Uses `clap` derive macros for declarative argument parsing. Flags are
//! matched case-insensitively, and the bare words `v`, `w` and `help` work
//! like `-v`, `-w` and `--help`.

use crate::config::SettingsOverrides;
use crate::types::{LocalSegment, Port};
use clap::Parser;
use std::ffi::OsString;
use std::path::PathBuf;

/// Sweep every local subnet for hosts answering on one TCP port.
#[derive(Parser, Debug)]
#[command(name = "lanprobe")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Find hosts on the local networks with a given TCP port open", long_about = None)]
#[command(override_usage = "lanprobe <PORT> [-v] [-w]")]
pub struct Args {
    /// TCP port to probe on every host
    #[arg(value_name = "PORT")]
    pub port: Port,

    /// Also report hard closes and unresolvable targets
    #[arg(short, long)]
    pub verbose: bool,

    /// Also report early failures (closed or filtered)
    #[arg(short, long)]
    pub warnings: bool,

    /// Connection timeout in milliseconds [default: 10000]
    #[arg(short = 't', long = "timeout", value_name = "MS")]
    pub timeout_ms: Option<u64>,

    /// Failures taking at least this long are reported as closed, in milliseconds [default: 10000]
    #[arg(long = "threshold", value_name = "MS")]
    pub threshold_ms: Option<u64>,

    /// Cap on simultaneous connection attempts (unbounded by default)
    #[arg(short = 'c', long, value_name = "N")]
    pub max_in_flight: Option<usize>,

    /// Scan this segment instead of enumerating interfaces (repeatable)
    #[arg(short = 's', long = "segment", value_name = "CIDR")]
    pub segments: Vec<LocalSegment>,

    /// Path to a settings file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Diagnostic log filter (RUST_LOG takes precedence)
    #[arg(long, value_name = "FILTER", default_value = "warn")]
    pub log_level: String,
}

impl Args {
    /// Parse the process arguments after normalization.
    pub fn parse_normalized() -> Self {
        Self::parse_from(normalize_args(std::env::args_os()))
    }

    /// Command-line values that override the settings file.
    pub fn overrides(&self) -> SettingsOverrides {
        SettingsOverrides {
            connect_timeout_ms: self.timeout_ms,
            closed_threshold_ms: self.threshold_ms,
            verbose: self.verbose,
            warnings: self.warnings,
            max_in_flight: self.max_in_flight,
        }
    }
}

/// Options whose next argument is a value, in normalized form.
const VALUE_OPTIONS: &[&str] = &[
    "-t",
    "--timeout",
    "--threshold",
    "-c",
    "--max-in-flight",
    "-s",
    "--segment",
    "--config",
    "--log-level",
];

/// Map case variants and bare words onto the canonical flags.
///
/// The first element is the program name and is passed through untouched, as
/// are option values and anything that isn't UTF-8.
pub fn normalize_args<I, T>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    let mut normalized = Vec::new();
    let mut value_next = false;

    for (i, arg) in args.into_iter().enumerate() {
        let arg: OsString = arg.into();
        if i == 0 || value_next {
            value_next = false;
            normalized.push(arg);
            continue;
        }

        let lower = arg.to_str().map(str::to_lowercase);
        let arg = match lower.as_deref() {
            Some("v" | "-v") => "-v".into(),
            Some("w" | "-w") => "-w".into(),
            Some("help" | "--help" | "-h") => "--help".into(),
            Some(lower) if lower.starts_with("--") && !lower.contains('=') => lower.into(),
            _ => arg,
        };
        value_next = lower.as_deref().is_some_and(|l| VALUE_OPTIONS.contains(&l));
        normalized.push(arg);
    }
    normalized
}
