//! Top-level driver for one scan run.
//!
//! A session hands every segment to the coordinator, accumulating all jobs in
//! a single [`OutstandingJobs`] counter, then waits for that counter to drain.
//! Cancellation stops further launches and ends the wait immediately; in-flight
//! probes are abandoned, not drained.

use crate::scanner::coordinator::ScanCoordinator;
use crate::scanner::jobs::OutstandingJobs;
use crate::types::LocalSegment;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// How a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionExit {
    /// Every launched probe finished and reported.
    Completed { launched: usize },
    /// Cancelled while probes were still in flight.
    Interrupted { outstanding: usize },
}

/// Drives one coordinator across a set of segments.
#[derive(Debug)]
pub struct ScanSession {
    coordinator: ScanCoordinator,
    jobs: Arc<OutstandingJobs>,
}

impl ScanSession {
    pub fn new(coordinator: ScanCoordinator) -> Self {
        Self {
            coordinator,
            jobs: OutstandingJobs::new(),
        }
    }

    /// Jobs currently in flight.
    pub fn outstanding(&self) -> usize {
        self.jobs.outstanding()
    }

    /// Scan every segment on `port` and wait for all probes, or for `cancel`.
    pub async fn run(
        &self,
        segments: &[LocalSegment],
        port: u16,
        cancel: &CancellationToken,
    ) -> SessionExit {
        let mut launched = 0;
        for segment in segments {
            if cancel.is_cancelled() {
                break;
            }
            launched += self.coordinator.scan(segment, port, &self.jobs, cancel).await;
        }
        info!(segments = segments.len(), launched, port, "all probes launched");

        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                let outstanding = self.jobs.outstanding();
                info!(outstanding, "session interrupted");
                SessionExit::Interrupted { outstanding }
            }
            _ = self.jobs.wait_idle() => {
                info!(launched, "session complete");
                SessionExit::Completed { launched }
            }
        }
    }
}
