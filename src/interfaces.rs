//! Local interface enumeration.
//!
//! Turns every IPv4 network configured on a local interface into a
//! [`LocalSegment`]. Filtering of loopback and link-local segments happens
//! later, in the scanner.

use crate::error::InterfaceError;
use crate::types::LocalSegment;
use pnet::datalink::{self, NetworkInterface};
use pnet::ipnetwork::IpNetwork;
use tracing::{debug, trace};

/// Enumerate the segments of every local interface.
pub fn local_segments() -> Result<Vec<LocalSegment>, InterfaceError> {
    let interfaces = datalink::interfaces();
    if interfaces.is_empty() {
        return Err(InterfaceError::NoneFound);
    }
    debug!(count = interfaces.len(), "enumerated interfaces");
    Ok(segments_from_interfaces(&interfaces))
}

/// Collect one segment per IPv4 network, in interface order.
pub fn segments_from_interfaces(interfaces: &[NetworkInterface]) -> Vec<LocalSegment> {
    let mut segments = Vec::new();
    for interface in interfaces {
        if interface.ips.is_empty() {
            debug!(interface = %interface.name, "no addresses, skipping");
            continue;
        }
        for network in &interface.ips {
            match network {
                IpNetwork::V4(v4) => match LocalSegment::new(v4.ip(), v4.prefix()) {
                    Ok(segment) => segments.push(segment),
                    Err(e) => debug!(interface = %interface.name, error = %e, "bad network"),
                },
                IpNetwork::V6(v6) => {
                    trace!(interface = %interface.name, network = %v6, "ignoring IPv6 network");
                }
            }
        }
    }
    segments
}

#[cfg(test)]
mod tests {
    use super::*;
    use pnet::ipnetwork::{Ipv4Network, Ipv6Network};
    use std::net::{Ipv4Addr, Ipv6Addr};

    fn interface(name: &str, ips: Vec<IpNetwork>) -> NetworkInterface {
        NetworkInterface {
            name: name.to_string(),
            description: String::new(),
            index: 0,
            mac: None,
            ips,
            flags: 0,
        }
    }

    fn v4(a: [u8; 4], prefix: u8) -> IpNetwork {
        IpNetwork::V4(Ipv4Network::new(Ipv4Addr::from(a), prefix).unwrap())
    }

    #[test]
    fn test_ipv4_networks_become_segments() {
        let interfaces = vec![
            interface("lo", vec![v4([127, 0, 0, 1], 8)]),
            interface(
                "eth0",
                vec![
                    v4([192, 168, 1, 20], 24),
                    IpNetwork::V6(Ipv6Network::new(Ipv6Addr::LOCALHOST, 128).unwrap()),
                    v4([10, 8, 0, 2], 30),
                ],
            ),
            interface("down0", vec![]),
        ];

        let segments: Vec<String> = segments_from_interfaces(&interfaces)
            .iter()
            .map(ToString::to_string)
            .collect();

        assert_eq!(segments, vec!["127.0.0.1/8", "192.168.1.20/24", "10.8.0.2/30"]);
    }
}
