//! # lanprobe - Local Subnet Sweeper
//!
//! lanprobe finds hosts on the networks a machine is attached to by
//! attempting a TCP connection to one port on every host address of every
//! local IPv4 segment, and reporting each result the moment it arrives.
//!
//! ## Features
//!
//! - **Automatic targeting**: segments come from the local interfaces;
//!   loopback and link-local networks are never scanned
//! - **Full fan-out**: one async task per host, optionally capped
//! - **Latency classification**: failures are split into hard closes and
//!   ambiguous early failures by a configurable time threshold
//! - **Prompt interruption**: Ctrl+C ends the run without draining probes
//!
//! ## Example Usage
//!
//! ```rust,ignore
//! use lanprobe::scanner::{build_session, ConsoleSink};
//! use lanprobe::config::ScanSettings;
//! use std::sync::Arc;
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() {
//!     let segments = vec!["192.168.1.20/24".parse().unwrap()];
//!     let session = build_session(&ScanSettings::default(), Arc::new(ConsoleSink));
//!     session.run(&segments, 22, &CancellationToken::new()).await;
//! }
//! ```
//!
//! ## Architecture
//!
//! - [`types`] - segments, address ranges and ports
//! - [`scanner`] - probe, coordinator and session
//! - [`config`] - settings file and resolved scan settings
//! - [`interfaces`] - local interface enumeration
//! - [`cli`] - command-line parsing
//! - [`output`] - terminal output
//! - [`error`] - error types

pub mod cli;
pub mod config;
pub mod error;
pub mod interfaces;
pub mod output;
pub mod scanner;
pub mod types;

// Re-export commonly used types
pub use error::{ConfigError, InterfaceError, RangeError, SegmentError};
pub use scanner::{OutcomeKind, ProbeOutcome, ScanSession, SessionExit};
pub use types::{AddressRange, LocalSegment, Port};
