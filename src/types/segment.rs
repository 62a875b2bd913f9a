//! Local segments and the host address ranges derived from them.
//!
//! A [`LocalSegment`] is one address configured on a local interface together
//! with its prefix length. [`AddressRange::compute`] turns it into the closed
//! interval of conventionally assignable host addresses, leaving out the
//! network identifier and the broadcast address.

use crate::error::{RangeError, SegmentError};
use ipnetwork::Ipv4Network;
use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;

/// A local IPv4 address plus its network prefix length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LocalSegment {
    address: Ipv4Addr,
    prefix: u8,
}

impl LocalSegment {
    /// Create a segment, rejecting prefix lengths above 32.
    pub fn new(address: Ipv4Addr, prefix: u8) -> Result<Self, SegmentError> {
        if prefix > 32 {
            return Err(SegmentError::InvalidPrefix(prefix));
        }
        Ok(Self { address, prefix })
    }

    /// The configured local address.
    pub fn address(&self) -> Ipv4Addr {
        self.address
    }

    /// The prefix length (0-32).
    pub fn prefix(&self) -> u8 {
        self.prefix
    }

    /// Netmask as a host-order integer.
    pub fn mask(&self) -> u32 {
        u32::MAX
            .checked_shl(32 - u32::from(self.prefix))
            .unwrap_or(0)
    }

    /// The network identifier (`address & mask`).
    pub fn network(&self) -> Ipv4Addr {
        Ipv4Addr::from(u32::from(self.address) & self.mask())
    }

    /// The broadcast address (`network | !mask`).
    pub fn broadcast(&self) -> Ipv4Addr {
        Ipv4Addr::from(u32::from(self.network()) | !self.mask())
    }

    /// 127.0.0.0/8.
    pub fn is_loopback(&self) -> bool {
        self.address.is_loopback()
    }

    /// 169.254.0.0/16 auto-configuration addresses.
    pub fn is_link_local(&self) -> bool {
        self.address.is_link_local()
    }

    /// Why this segment should never be scanned, if it shouldn't.
    pub fn skip_reason(&self) -> Option<&'static str> {
        if self.is_loopback() {
            Some("loopback segment")
        } else if self.is_link_local() {
            Some("link-local segment")
        } else {
            None
        }
    }
}

impl From<Ipv4Network> for LocalSegment {
    fn from(net: Ipv4Network) -> Self {
        Self {
            address: net.ip(),
            prefix: net.prefix(),
        }
    }
}

impl FromStr for LocalSegment {
    type Err = SegmentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if !s.contains('/') {
            return Err(SegmentError::InvalidFormat(s.to_string()));
        }
        let net: Ipv4Network = s
            .parse()
            .map_err(|_| SegmentError::InvalidFormat(s.to_string()))?;
        Ok(net.into())
    }
}

impl fmt::Display for LocalSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.address, self.prefix)
    }
}

/// A closed interval `[start, finish]` of host addresses inside one segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddressRange {
    start: u32,
    finish: u32,
}

impl AddressRange {
    /// Derive the scannable host range of a segment.
    ///
    /// Loopback and link-local segments yield [`RangeError::Skip`]; segments
    /// without assignable hosts (/31, /32) yield [`RangeError::InvalidRange`].
    pub fn compute(segment: &LocalSegment) -> Result<Self, RangeError> {
        if let Some(reason) = segment.skip_reason() {
            return Err(RangeError::Skip {
                segment: segment.to_string(),
                reason,
            });
        }

        let network = u32::from(segment.network());
        let broadcast = u32::from(segment.broadcast());

        // Both endpoints are excluded, so we need at least two addresses between them.
        if broadcast.saturating_sub(network) < 2 {
            return Err(RangeError::InvalidRange {
                segment: segment.to_string(),
            });
        }

        Ok(Self {
            start: network + 1,
            finish: broadcast - 1,
        })
    }

    /// First host address.
    pub fn start(&self) -> Ipv4Addr {
        Ipv4Addr::from(self.start)
    }

    /// Last host address.
    pub fn finish(&self) -> Ipv4Addr {
        Ipv4Addr::from(self.finish)
    }

    /// Number of addresses in the range.
    pub fn len(&self) -> u64 {
        u64::from(self.finish - self.start) + 1
    }

    /// Always false; a computed range holds at least one address.
    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn contains(&self, addr: Ipv4Addr) -> bool {
        (self.start..=self.finish).contains(&u32::from(addr))
    }

    /// Addresses in ascending numeric order.
    pub fn iter(&self) -> impl Iterator<Item = Ipv4Addr> {
        (self.start..=self.finish).map(Ipv4Addr::from)
    }
}

impl fmt::Display for AddressRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start(), self.finish())
    }
}
