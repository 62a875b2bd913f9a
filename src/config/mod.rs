//! Configuration management for lanprobe.
//!
//! Provides XDG-compliant settings storage and the resolved scan settings
//! threaded into the scanner.

mod settings;

pub use settings::{AppSettings, Paths, ScanSettings, SettingsOverrides};
