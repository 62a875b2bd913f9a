//! Scanner module - sweeps local segments for hosts answering on one port.
//!
//! The pieces, leaves first:
//!
//! - [`probe`] - one bounded-time TCP connect, classified by elapsed time
//! - [`coordinator`] - one task per host address of a segment
//! - [`session`] - every segment, one shared completion counter, cancellation
//! - [`jobs`] - the shared outstanding-job counter
//!
//! Results are printed by each probe as it finishes, so output order follows
//! network timing rather than address order.

pub mod coordinator;
pub mod jobs;
pub mod outcome;
pub mod probe;
pub mod session;

pub use coordinator::ScanCoordinator;
pub use jobs::{JobGuard, OutstandingJobs, ScanJob};
pub use outcome::{ConsoleSink, MemorySink, OutcomeKind, OutcomeSink, ProbeOutcome, Visibility};
pub use probe::{
    classify, ConnectionProbe, Connector, TcpConnector, DEFAULT_CLOSED_THRESHOLD,
    DEFAULT_CONNECT_TIMEOUT,
};
pub use session::{ScanSession, SessionExit};

use crate::config::ScanSettings;
use std::sync::Arc;

/// Build a session from resolved settings, reporting through `sink`.
pub fn build_session(settings: &ScanSettings, sink: Arc<dyn OutcomeSink>) -> ScanSession {
    let probe = ConnectionProbe::new(sink, settings.visibility)
        .with_timeout(settings.connect_timeout)
        .with_threshold(settings.closed_threshold);

    let coordinator = ScanCoordinator::new(probe);
    let coordinator = match settings.max_in_flight {
        Some(limit) => coordinator.with_max_in_flight(limit),
        None => coordinator,
    };

    ScanSession::new(coordinator)
}
