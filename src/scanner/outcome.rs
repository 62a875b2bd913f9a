//! Probe outcomes and the policy deciding which of them get reported.

use std::fmt;
use std::net::Ipv4Addr;
use std::sync::Mutex;
use std::time::Duration;

/// Classified result of a single probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum OutcomeKind {
    /// The connection was accepted.
    Open,
    /// Connect failed after at least the threshold elapsed.
    ClosedFast,
    /// Connect failed before the threshold; closed or filtered, can't tell.
    ClosedSlow,
    /// The address/port pair is not a dialable endpoint.
    Unresolvable,
}

impl OutcomeKind {
    /// Line prefix symbol.
    pub fn symbol(self) -> char {
        match self {
            Self::Open => '+',
            Self::ClosedFast => '-',
            Self::ClosedSlow | Self::Unresolvable => '!',
        }
    }
}

impl fmt::Display for OutcomeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Open => write!(f, "open"),
            Self::ClosedFast => write!(f, "closed"),
            Self::ClosedSlow => write!(f, "closed|filtered"),
            Self::Unresolvable => write!(f, "unresolvable"),
        }
    }
}

/// Result of probing one address on one port.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbeOutcome {
    pub address: Ipv4Addr,
    pub port: u16,
    pub kind: OutcomeKind,
    /// Time spent from the start of the attempt until it resolved.
    pub elapsed: Duration,
}

impl ProbeOutcome {
    pub fn new(address: Ipv4Addr, port: u16, kind: OutcomeKind, elapsed: Duration) -> Self {
        Self {
            address,
            port,
            kind,
            elapsed,
        }
    }

    pub fn is_open(&self) -> bool {
        self.kind == OutcomeKind::Open
    }
}

/// Which non-open outcomes are worth a line of output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Visibility {
    /// Report hard closes and unresolvable targets.
    pub verbose: bool,
    /// Report ambiguous early failures.
    pub warnings: bool,
}

impl Visibility {
    pub fn new(verbose: bool, warnings: bool) -> Self {
        Self { verbose, warnings }
    }

    /// Open results are always shown; the rest depend on the flags.
    pub fn should_report(&self, kind: OutcomeKind) -> bool {
        match kind {
            OutcomeKind::Open => true,
            OutcomeKind::ClosedFast | OutcomeKind::Unresolvable => self.verbose,
            OutcomeKind::ClosedSlow => self.warnings,
        }
    }
}

/// Destination for reported outcomes.
pub trait OutcomeSink: Send + Sync {
    fn emit(&self, outcome: &ProbeOutcome);
}

/// Writes each outcome as one styled line on stdout.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleSink;

impl OutcomeSink for ConsoleSink {
    fn emit(&self, outcome: &ProbeOutcome) {
        crate::output::print_outcome(outcome);
    }
}

/// Collects outcomes in memory, in the order they were emitted.
#[derive(Debug, Default)]
pub struct MemorySink {
    outcomes: Mutex<Vec<ProbeOutcome>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything emitted so far.
    pub fn outcomes(&self) -> Vec<ProbeOutcome> {
        self.outcomes
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }
}

impl OutcomeSink for MemorySink {
    fn emit(&self, outcome: &ProbeOutcome) {
        let mut guard = self
            .outcomes
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        guard.push(*outcome);
    }
}
