//! Error types for lanprobe.
//!
//! Uses `thiserror` for ergonomic error definitions. Only interface
//! enumeration and configuration errors ever reach the top level; range and
//! segment errors are handled where they occur.

use std::path::PathBuf;
use thiserror::Error;

/// Why a segment produced no scannable address range.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RangeError {
    /// The segment is not a scan target at all (loopback, link-local).
    #[error("skipping {segment}: {reason}")]
    Skip { segment: String, reason: &'static str },

    /// The segment has no assignable host addresses.
    #[error("invalid range for {segment}: no usable host addresses")]
    InvalidRange { segment: String },
}

/// Error parsing a segment from CIDR text.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SegmentError {
    #[error("invalid segment '{0}': expected a.b.c.d/prefix")]
    InvalidFormat(String),

    #[error("invalid prefix length {0} (max: 32)")]
    InvalidPrefix(u8),
}

/// Errors enumerating local network interfaces.
#[derive(Error, Debug)]
pub enum InterfaceError {
    #[error("no network interfaces found")]
    NoneFound,
}

/// Configuration loading and validation errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("could not determine configuration directory")]
    DirectoryNotFound,

    #[error("failed to read {path}: {reason}")]
    ReadFailed { path: PathBuf, reason: String },

    #[error("invalid settings format: {0}")]
    InvalidFormat(String),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Result type alias for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;
