//! Per-segment fan-out.
//!
//! The coordinator derives a segment's host range and spawns one probe task per
//! address in ascending order. It never waits for those tasks: each one holds a
//! [`ScanJob`] registered with the session's [`OutstandingJobs`], and that
//! counter is what tracks completion.
//!
//! Launching stops as soon as the session's cancellation token fires, and the
//! launch loop yields to the runtime every [`LAUNCH_BATCH`] spawns so a signal
//! task can run while a large segment is being fanned out.

use crate::error::RangeError;
use crate::output;
use crate::scanner::jobs::{OutstandingJobs, ScanJob};
use crate::scanner::probe::ConnectionProbe;
use crate::types::{AddressRange, LocalSegment};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Spawns between cooperative yields in the launch loop.
pub const LAUNCH_BATCH: usize = 256;

/// Launches probes for every host of a segment.
#[derive(Debug, Clone)]
pub struct ScanCoordinator {
    probe: Arc<ConnectionProbe>,
    admission: Option<Arc<Semaphore>>,
}

impl ScanCoordinator {
    /// Create a coordinator with unbounded fan-out.
    pub fn new(probe: ConnectionProbe) -> Self {
        Self {
            probe: Arc::new(probe),
            admission: None,
        }
    }

    /// Cap the number of connection attempts in flight at once.
    ///
    /// The cap is shared by every segment scanned through this coordinator.
    /// Jobs are still registered up front; only the connect waits for a permit.
    pub fn with_max_in_flight(mut self, limit: usize) -> Self {
        self.admission = Some(Arc::new(Semaphore::new(limit)));
        self
    }

    /// The probe used for each address.
    pub fn probe(&self) -> &ConnectionProbe {
        &self.probe
    }

    /// Spawn one probe per host address of `segment` and return how many were
    /// launched. Segments with no scannable range launch nothing, and no
    /// further address is launched once `cancel` has fired.
    pub async fn scan(
        &self,
        segment: &LocalSegment,
        port: u16,
        jobs: &Arc<OutstandingJobs>,
        cancel: &CancellationToken,
    ) -> usize {
        let range = match AddressRange::compute(segment) {
            Ok(range) => range,
            Err(RangeError::Skip { segment, reason }) => {
                debug!(%segment, reason, "segment skipped");
                return 0;
            }
            Err(e) => {
                warn!(%segment, error = %e, "segment not scanned");
                output::print_warning(&e.to_string());
                return 0;
            }
        };

        debug!(%segment, %range, hosts = range.len(), port, "launching probes");

        let mut launched = 0;
        for address in range.iter() {
            if launched > 0 && launched % LAUNCH_BATCH == 0 {
                tokio::task::yield_now().await;
            }
            if cancel.is_cancelled() {
                debug!(%segment, launched, "launch interrupted");
                break;
            }

            let job = ScanJob::new(address, port, jobs);
            let probe = Arc::clone(&self.probe);
            let admission = self.admission.clone();

            tokio::spawn(async move {
                let _permit = match admission {
                    Some(semaphore) => semaphore.acquire_owned().await.ok(),
                    None => None,
                };
                probe.probe(job.address, job.port).await;
                drop(job);
            });
            launched += 1;
        }
        launched
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::outcome::{MemorySink, OutcomeKind, Visibility};
    use crate::scanner::probe::scripted::{Behavior, ScriptedConnector};
    use crate::scanner::probe::Connector;
    use async_trait::async_trait;
    use std::io;
    use std::net::{Ipv4Addr, SocketAddr};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn coordinator(
        connector: Arc<dyn Connector>,
        visibility: Visibility,
    ) -> (ScanCoordinator, Arc<MemorySink>) {
        let sink = Arc::new(MemorySink::new());
        let probe = ConnectionProbe::new(sink.clone(), visibility).with_connector(connector);
        (ScanCoordinator::new(probe), sink)
    }

    #[tokio::test]
    async fn test_slash_30_probes_only_hosts() {
        let connector = Arc::new(ScriptedConnector::new(Behavior::Accept));
        let (coordinator, sink) = coordinator(connector.clone(), Visibility::default());
        let jobs = OutstandingJobs::new();

        let launched = coordinator
            .scan(&"192.168.1.10/30".parse().unwrap(), 80, &jobs, &CancellationToken::new())
            .await;
        jobs.wait_idle().await;

        assert_eq!(launched, 2);
        let mut attempts = connector.attempts();
        attempts.sort();
        let expected: Vec<SocketAddr> = vec![
            "192.168.1.9:80".parse().unwrap(),
            "192.168.1.10:80".parse().unwrap(),
        ];
        assert_eq!(attempts, expected);
        assert_eq!(sink.outcomes().len(), 2);
    }

    #[tokio::test]
    async fn test_unscannable_segments_launch_nothing() {
        let connector = Arc::new(ScriptedConnector::new(Behavior::Accept));
        let (coordinator, sink) = coordinator(connector.clone(), Visibility::new(true, true));
        let jobs = OutstandingJobs::new();
        let cancel = CancellationToken::new();

        for segment in ["127.0.0.1/8", "169.254.3.4/16", "10.0.0.1/31", "10.0.0.1/32"] {
            let launched = coordinator.scan(&segment.parse().unwrap(), 22, &jobs, &cancel).await;
            assert_eq!(launched, 0);
        }

        assert_eq!(jobs.outstanding(), 0);
        assert_eq!(connector.calls(), 0);
        assert!(sink.outcomes().is_empty());
    }

    async fn scan_ten_net(visibility: Visibility) -> Vec<(Ipv4Addr, OutcomeKind)> {
        let connector = ScriptedConnector::new(Behavior::Refuse)
            .on(Ipv4Addr::new(10, 0, 0, 1), Behavior::Accept)
            .on(Ipv4Addr::new(10, 0, 0, 2), Behavior::Hang);
        let (coordinator, sink) = coordinator(Arc::new(connector), visibility);
        let jobs = OutstandingJobs::new();

        let launched = coordinator
            .scan(&"10.0.0.5/24".parse().unwrap(), 22, &jobs, &CancellationToken::new())
            .await;
        jobs.wait_idle().await;
        assert_eq!(launched, 254);

        let mut lines: Vec<_> = sink
            .outcomes()
            .into_iter()
            .map(|o| (o.address, o.kind))
            .collect();
        lines.sort();
        lines
    }

    #[tokio::test(start_paused = true)]
    async fn test_open_host_reported_without_flags() {
        let lines = scan_ten_net(Visibility::default()).await;
        assert_eq!(lines, vec![(Ipv4Addr::new(10, 0, 0, 1), OutcomeKind::Open)]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timed_out_host_reported_when_verbose() {
        let lines = scan_ten_net(Visibility::new(true, false)).await;
        assert_eq!(
            lines,
            vec![
                (Ipv4Addr::new(10, 0, 0, 1), OutcomeKind::Open),
                (Ipv4Addr::new(10, 0, 0, 2), OutcomeKind::ClosedFast),
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_refusals_reported_as_warnings() {
        let lines = scan_ten_net(Visibility::new(false, true)).await;
        assert_eq!(lines.len(), 253);
        assert!(lines.contains(&(Ipv4Addr::new(10, 0, 0, 1), OutcomeKind::Open)));
        assert!(!lines.iter().any(|(addr, _)| *addr == Ipv4Addr::new(10, 0, 0, 2)));
        assert!(lines
            .iter()
            .filter(|(addr, _)| *addr != Ipv4Addr::new(10, 0, 0, 1))
            .all(|(_, kind)| *kind == OutcomeKind::ClosedSlow));
    }

    /// Tracks the highest number of simultaneous connects.
    #[derive(Default)]
    struct GaugeConnector {
        current: AtomicUsize,
        peak: AtomicUsize,
    }

    #[async_trait]
    impl Connector for GaugeConnector {
        async fn connect(&self, _addr: SocketAddr) -> io::Result<()> {
            let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(5)).await;
            self.current.fetch_sub(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_max_in_flight_bounds_connects() {
        let gauge = Arc::new(GaugeConnector::default());
        let (coordinator, sink) = coordinator(gauge.clone(), Visibility::default());
        let coordinator = coordinator.with_max_in_flight(3);
        let jobs = OutstandingJobs::new();

        let launched = coordinator
            .scan(&"10.9.8.7/28".parse().unwrap(), 443, &jobs, &CancellationToken::new())
            .await;
        jobs.wait_idle().await;

        assert_eq!(launched, 14);
        assert_eq!(sink.outcomes().len(), 14);
        assert!(gauge.peak.load(Ordering::SeqCst) <= 3);
    }

    #[tokio::test]
    async fn test_cancelled_token_launches_nothing() {
        let connector = Arc::new(ScriptedConnector::new(Behavior::Accept));
        let (coordinator, sink) = coordinator(connector.clone(), Visibility::new(true, true));
        let jobs = OutstandingJobs::new();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let launched = coordinator.scan(&"10.0.0.1/16".parse().unwrap(), 22, &jobs, &cancel).await;

        assert_eq!(launched, 0);
        assert_eq!(jobs.outstanding(), 0);
        assert_eq!(connector.calls(), 0);
        assert!(sink.outcomes().is_empty());
    }

    /// Cancels the token from inside the first connect, then never resolves.
    struct CancelOnConnect(CancellationToken);

    #[async_trait]
    impl Connector for CancelOnConnect {
        async fn connect(&self, _addr: SocketAddr) -> io::Result<()> {
            self.0.cancel();
            std::future::pending().await
        }
    }

    #[tokio::test]
    async fn test_cancel_mid_launch_stops_at_batch_boundary() {
        let cancel = CancellationToken::new();
        let connector = Arc::new(CancelOnConnect(cancel.clone()));
        let (coordinator, _sink) = coordinator(connector, Visibility::default());
        let jobs = OutstandingJobs::new();

        // 10.0.0.0/16 has 65534 hosts; the first yield lets a spawned task cancel.
        let launched = coordinator.scan(&"10.0.0.1/16".parse().unwrap(), 22, &jobs, &cancel).await;

        assert_eq!(launched, LAUNCH_BATCH);
        assert_eq!(jobs.outstanding(), LAUNCH_BATCH);
    }
}
