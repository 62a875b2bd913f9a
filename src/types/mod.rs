//! Core type definitions using newtype patterns for type safety.
//!
//! These types prevent common logic errors by making invalid states unrepresentable
//! at compile time.

mod port;
mod segment;

pub use port::{Port, PortError};
pub use segment::{AddressRange, LocalSegment};
