//! Outstanding-work accounting shared across every segment of a session.
//!
//! The counter is the only mutable state shared between probe tasks. It is
//! incremented when a job is created and decremented exactly once when the
//! job is dropped, whether the probe finished normally or its task was torn
//! down.

use std::net::Ipv4Addr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

/// Count of jobs launched but not yet retired.
#[derive(Debug, Default)]
pub struct OutstandingJobs {
    count: AtomicUsize,
    idle: Notify,
}

impl OutstandingJobs {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Register one unit of work. The count drops again when the guard does.
    pub fn register(self: &Arc<Self>) -> JobGuard {
        self.count.fetch_add(1, Ordering::AcqRel);
        JobGuard {
            jobs: Arc::clone(self),
        }
    }

    /// Current number of outstanding jobs.
    pub fn outstanding(&self) -> usize {
        self.count.load(Ordering::Acquire)
    }

    /// Resolve once no jobs are outstanding.
    pub async fn wait_idle(&self) {
        loop {
            let notified = self.idle.notified();
            tokio::pin!(notified);
            // Register interest before checking, so a retire in between is not missed.
            notified.as_mut().enable();
            if self.outstanding() == 0 {
                return;
            }
            notified.await;
        }
    }

    fn retire(&self) {
        if self.count.fetch_sub(1, Ordering::AcqRel) == 1 {
            self.idle.notify_waiters();
        }
    }
}

/// Registration of one outstanding job.
#[derive(Debug)]
#[must_use = "dropping the guard retires the job immediately"]
pub struct JobGuard {
    jobs: Arc<OutstandingJobs>,
}

impl Drop for JobGuard {
    fn drop(&mut self) {
        self.jobs.retire();
    }
}

/// "Probe `address` on `port`", owned by the task running that probe.
#[derive(Debug)]
pub struct ScanJob {
    pub address: Ipv4Addr,
    pub port: u16,
    _guard: JobGuard,
}

impl ScanJob {
    /// Create a job, registering it against `jobs`.
    pub fn new(address: Ipv4Addr, port: u16, jobs: &Arc<OutstandingJobs>) -> Self {
        Self {
            address,
            port,
            _guard: jobs.register(),
        }
    }
}
