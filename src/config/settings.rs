//! Application settings and paths.
//!
//! Settings come from an optional JSON file under the XDG config directory,
//! overridden by command-line flags, and are resolved into a [`ScanSettings`]
//! value that is handed to the scanner at construction time.

use crate::error::{ConfigError, ConfigResult};
use crate::scanner::{Visibility, DEFAULT_CLOSED_THRESHOLD, DEFAULT_CONNECT_TIMEOUT};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// Application directory paths following XDG Base Directory Specification.
#[derive(Debug, Clone)]
pub struct Paths {
    /// Configuration directory (~/.config/lanprobe)
    pub config_dir: PathBuf,
}

impl Paths {
    /// Locate the platform configuration directory.
    pub fn discover() -> ConfigResult<Self> {
        let project = ProjectDirs::from("com", "lanprobe", "lanprobe")
            .ok_or(ConfigError::DirectoryNotFound)?;

        Ok(Self {
            config_dir: project.config_dir().to_path_buf(),
        })
    }

    /// Get the path to the settings file.
    pub fn settings_file(&self) -> PathBuf {
        self.config_dir.join("settings.json")
    }
}

/// Settings as stored on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    /// Upper bound on each connection attempt, in milliseconds.
    pub connect_timeout_ms: u64,
    /// Failures taking at least this long are reported as closed.
    pub closed_threshold_ms: u64,
    /// Report hard closes and unresolvable targets.
    pub verbose: bool,
    /// Report early, ambiguous failures.
    pub warnings: bool,
    /// Cap on simultaneous connection attempts; unbounded when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_in_flight: Option<usize>,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            connect_timeout_ms: DEFAULT_CONNECT_TIMEOUT.as_millis() as u64,
            closed_threshold_ms: DEFAULT_CLOSED_THRESHOLD.as_millis() as u64,
            verbose: false,
            warnings: false,
            max_in_flight: None,
        }
    }
}

impl AppSettings {
    /// Load settings from the default location, falling back to defaults
    /// when there is no settings file.
    pub fn load() -> ConfigResult<Self> {
        let paths = match Paths::discover() {
            Ok(paths) => paths,
            Err(e) => {
                debug!(error = %e, "using default settings");
                return Ok(Self::default());
            }
        };

        let file = paths.settings_file();
        if !file.exists() {
            debug!(path = %file.display(), "no settings file, using defaults");
            return Ok(Self::default());
        }

        Self::load_from(&file)
    }

    /// Load settings from a specific file.
    pub fn load_from(path: &Path) -> ConfigResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::ReadFailed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        serde_json::from_str(&content).map_err(|e| ConfigError::InvalidFormat(e.to_string()))
    }

    /// Apply command-line overrides and validate the result.
    pub fn resolve(&self, overrides: &SettingsOverrides) -> ConfigResult<ScanSettings> {
        let timeout_ms = overrides.connect_timeout_ms.unwrap_or(self.connect_timeout_ms);
        let threshold_ms = overrides
            .closed_threshold_ms
            .unwrap_or(self.closed_threshold_ms);
        let max_in_flight = overrides.max_in_flight.or(self.max_in_flight);

        if timeout_ms == 0 {
            return Err(ConfigError::Invalid("connect timeout must be non-zero".into()));
        }
        if threshold_ms == 0 {
            return Err(ConfigError::Invalid("closed threshold must be non-zero".into()));
        }
        if max_in_flight == Some(0) {
            return Err(ConfigError::Invalid("max in-flight must be non-zero".into()));
        }

        Ok(ScanSettings {
            connect_timeout: Duration::from_millis(timeout_ms),
            closed_threshold: Duration::from_millis(threshold_ms),
            visibility: Visibility::new(
                self.verbose || overrides.verbose,
                self.warnings || overrides.warnings,
            ),
            max_in_flight,
        })
    }
}

/// Values supplied on the command line; `None`/`false` defers to the file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SettingsOverrides {
    pub connect_timeout_ms: Option<u64>,
    pub closed_threshold_ms: Option<u64>,
    pub verbose: bool,
    pub warnings: bool,
    pub max_in_flight: Option<usize>,
}

/// Fully resolved scan configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanSettings {
    pub connect_timeout: Duration,
    pub closed_threshold: Duration,
    pub visibility: Visibility,
    pub max_in_flight: Option<usize>,
}

impl Default for ScanSettings {
    fn default() -> Self {
        Self {
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            closed_threshold: DEFAULT_CLOSED_THRESHOLD,
            visibility: Visibility::default(),
            max_in_flight: None,
        }
    }
}
