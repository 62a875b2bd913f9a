//! Single-address TCP connect probe.
//!
//! A failed `connect()` rarely says why it failed, so outcomes are classified
//! by how long the attempt took. Failures that take at least the configured
//! threshold are reported as closed; earlier failures are ambiguous between
//! closed and filtered and only show up as warnings. This is a heuristic:
//! firewalls, OS stack differences and congestion all move the boundary.

use crate::scanner::outcome::{OutcomeKind, OutcomeSink, ProbeOutcome, Visibility};
use async_trait::async_trait;
use std::io;
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::time::{timeout, Instant};
use tracing::trace;

/// Default upper bound on connection establishment.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default elapsed-time boundary between a hard close and an ambiguous one.
pub const DEFAULT_CLOSED_THRESHOLD: Duration = Duration::from_secs(10);

/// Establishes (and immediately discards) a connection.
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self, addr: SocketAddr) -> io::Result<()>;
}

/// Plain OS-level TCP connect.
#[derive(Debug, Default, Clone, Copy)]
pub struct TcpConnector;

#[async_trait]
impl Connector for TcpConnector {
    async fn connect(&self, addr: SocketAddr) -> io::Result<()> {
        // No data is exchanged; dropping the stream closes it.
        TcpStream::connect(addr).await.map(drop)
    }
}

/// Classify a finished attempt.
///
/// Successful connects are always `Open`. Failures at or past `threshold`
/// are `ClosedFast`, earlier ones `ClosedSlow`.
pub fn classify(connected: bool, elapsed: Duration, threshold: Duration) -> OutcomeKind {
    if connected {
        OutcomeKind::Open
    } else if elapsed >= threshold {
        OutcomeKind::ClosedFast
    } else {
        OutcomeKind::ClosedSlow
    }
}

/// Whether `address:port` can be dialed at all.
fn is_dialable(address: Ipv4Addr, port: u16) -> bool {
    port != 0 && !address.is_unspecified() && !address.is_broadcast() && !address.is_multicast()
}

/// Bounded-time connect probe that reports its own outcome.
#[derive(Clone)]
pub struct ConnectionProbe {
    connector: Arc<dyn Connector>,
    sink: Arc<dyn OutcomeSink>,
    timeout: Duration,
    threshold: Duration,
    visibility: Visibility,
}

impl ConnectionProbe {
    /// Create a probe over plain TCP with the default timeout and threshold.
    pub fn new(sink: Arc<dyn OutcomeSink>, visibility: Visibility) -> Self {
        Self {
            connector: Arc::new(TcpConnector),
            sink,
            timeout: DEFAULT_CONNECT_TIMEOUT,
            threshold: DEFAULT_CLOSED_THRESHOLD,
            visibility,
        }
    }

    /// Set the connection timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the closed-fast threshold.
    pub fn with_threshold(mut self, threshold: Duration) -> Self {
        self.threshold = threshold;
        self
    }

    /// Replace the connector.
    pub fn with_connector(mut self, connector: Arc<dyn Connector>) -> Self {
        self.connector = connector;
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn threshold(&self) -> Duration {
        self.threshold
    }

    pub fn visibility(&self) -> Visibility {
        self.visibility
    }

    /// Probe one address once, report the outcome if visible, and return it.
    pub async fn probe(&self, address: Ipv4Addr, port: u16) -> ProbeOutcome {
        let start = Instant::now();

        let attempt = if !is_dialable(address, port) {
            None
        } else {
            let addr = SocketAddr::V4(SocketAddrV4::new(address, port));
            let connected = match timeout(self.timeout, self.connector.connect(addr)).await {
                Ok(Ok(())) => true,
                Ok(Err(e)) => {
                    trace!(%addr, error = %e, "connect failed");
                    false
                }
                Err(_) => {
                    trace!(%addr, timeout = ?self.timeout, "connect timed out");
                    false
                }
            };
            Some(connected)
        };

        let elapsed = start.elapsed();
        let kind = match attempt {
            Some(connected) => classify(connected, elapsed, self.threshold),
            None => OutcomeKind::Unresolvable,
        };
        let outcome = ProbeOutcome::new(address, port, kind, elapsed);
        if self.visibility.should_report(kind) {
            self.sink.emit(&outcome);
        }
        outcome
    }
}

impl std::fmt::Debug for ConnectionProbe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionProbe")
            .field("timeout", &self.timeout)
            .field("threshold", &self.threshold)
            .field("visibility", &self.visibility)
            .finish_non_exhaustive()
    }
}


#[cfg(test)]
mod tests {
    use super::scripted::{Behavior, ScriptedConnector};
    use super::*;
    use crate::scanner::outcome::MemorySink;
    use tokio::net::TcpListener;

    const TEN: Duration = Duration::from_secs(10);

    fn probe_with(
        connector: ScriptedConnector,
        visibility: Visibility,
    ) -> (ConnectionProbe, Arc<MemorySink>) {
        let sink = Arc::new(MemorySink::new());
        let probe = ConnectionProbe::new(sink.clone(), visibility)
            .with_connector(Arc::new(connector));
        (probe, sink)
    }

    #[test]
    fn test_classify_open_regardless_of_time() {
        assert_eq!(classify(true, Duration::ZERO, TEN), OutcomeKind::Open);
        assert_eq!(classify(true, TEN * 3, TEN), OutcomeKind::Open);
    }

    #[test]
    fn test_classify_threshold_is_inclusive() {
        assert_eq!(
            classify(false, TEN - Duration::from_millis(1), TEN),
            OutcomeKind::ClosedSlow
        );
        assert_eq!(classify(false, TEN, TEN), OutcomeKind::ClosedFast);
        assert_eq!(classify(false, TEN + Duration::from_millis(1), TEN), OutcomeKind::ClosedFast);
        assert_eq!(classify(false, Duration::ZERO, TEN), OutcomeKind::ClosedSlow);
    }

    #[test]
    fn test_probe_defaults() {
        let probe = ConnectionProbe::new(Arc::new(MemorySink::new()), Visibility::default());
        assert_eq!(probe.timeout(), DEFAULT_CONNECT_TIMEOUT);
        assert_eq!(probe.threshold(), DEFAULT_CLOSED_THRESHOLD);
    }

    #[tokio::test]
    async fn test_probe_open_local_listener() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let sink = Arc::new(MemorySink::new());
        let probe = ConnectionProbe::new(sink.clone(), Visibility::default())
            .with_timeout(Duration::from_secs(2));

        let outcome = probe.probe(Ipv4Addr::LOCALHOST, port).await;

        assert_eq!(outcome.kind, OutcomeKind::Open);
        assert_eq!(outcome.port, port);
        assert_eq!(sink.outcomes(), vec![outcome]);
    }

    #[tokio::test]
    async fn test_probe_refused_local_port_is_slow_close() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let sink = Arc::new(MemorySink::new());
        let probe = ConnectionProbe::new(sink.clone(), Visibility::new(false, true))
            .with_timeout(Duration::from_secs(2));

        let outcome = probe.probe(Ipv4Addr::LOCALHOST, port).await;

        assert_eq!(outcome.kind, OutcomeKind::ClosedSlow);
        assert_eq!(sink.outcomes().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_probe_timeout_reaches_threshold() {
        let target = Ipv4Addr::new(10, 0, 0, 2);
        let (probe, sink) = probe_with(
            ScriptedConnector::new(Behavior::Hang),
            Visibility::new(true, false),
        );

        let outcome = probe.probe(target, 22).await;

        assert_eq!(outcome.kind, OutcomeKind::ClosedFast);
        assert!(outcome.elapsed >= TEN && outcome.elapsed < TEN + Duration::from_secs(1));
        assert_eq!(sink.outcomes(), vec![outcome]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_probe_slow_refusal_past_threshold() {
        let target = Ipv4Addr::new(10, 0, 0, 3);
        let connector = ScriptedConnector::new(Behavior::RefuseAfter(Duration::from_secs(12)));
        let sink = Arc::new(MemorySink::new());
        let probe = ConnectionProbe::new(sink.clone(), Visibility::new(true, true))
            .with_connector(Arc::new(connector))
            .with_timeout(Duration::from_secs(30));

        let outcome = probe.probe(target, 22).await;

        assert_eq!(outcome.kind, OutcomeKind::ClosedFast);
        assert!(outcome.elapsed >= Duration::from_secs(12));
    }

    #[tokio::test(start_paused = true)]
    async fn test_closed_results_hidden_without_flags() {
        let connector = ScriptedConnector::new(Behavior::Refuse)
            .on(Ipv4Addr::new(10, 0, 0, 2), Behavior::Hang);
        let (probe, sink) = probe_with(connector, Visibility::default());

        let slow = probe.probe(Ipv4Addr::new(10, 0, 0, 1), 22).await;
        let fast = probe.probe(Ipv4Addr::new(10, 0, 0, 2), 22).await;

        assert_eq!(slow.kind, OutcomeKind::ClosedSlow);
        assert_eq!(fast.kind, OutcomeKind::ClosedFast);
        assert!(sink.outcomes().is_empty());
    }

    #[tokio::test]
    async fn test_undialable_endpoint_is_unresolvable() {
        let connector = Arc::new(ScriptedConnector::new(Behavior::Accept));
        let sink = Arc::new(MemorySink::new());
        let probe = ConnectionProbe::new(sink.clone(), Visibility::new(true, false))
            .with_connector(connector.clone());

        let zero_port = probe.probe(Ipv4Addr::new(10, 0, 0, 1), 0).await;
        let broadcast = probe.probe(Ipv4Addr::BROADCAST, 22).await;

        assert_eq!(zero_port.kind, OutcomeKind::Unresolvable);
        assert_eq!(broadcast.kind, OutcomeKind::Unresolvable);
        assert_eq!(connector.calls(), 0);
        assert_eq!(sink.outcomes().len(), 2);
    }

    #[tokio::test]
    async fn test_unresolvable_hidden_without_verbose() {
        let (probe, sink) = probe_with(
            ScriptedConnector::new(Behavior::Accept),
            Visibility::new(false, true),
        );

        let outcome = probe.probe(Ipv4Addr::UNSPECIFIED, 22).await;

        assert_eq!(outcome.kind, OutcomeKind::Unresolvable);
        assert!(sink.outcomes().is_empty());
    }
}
