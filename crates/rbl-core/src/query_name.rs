//! Reverse-lookup query name construction
//!
//! RBLs are queried by reversing an IPv4 address's octets and appending the
//! provider's zone: `1.2.3.4` under `bl.example.com` becomes
//! `4.3.2.1.bl.example.com`. IPv6 literals get their nibble-reversed
//! `ip6.arpa` form computed for diagnostic completeness, but the lookup is
//! rejected — the providers this engine queries do not serve IPv6 zones.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use thiserror::Error;

/// Why a candidate address cannot be queried
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NameRejection {
    /// Input is not a recognizable IP address
    #[error("Invalid IP address")]
    InvalidIp,

    /// Input is IPv6; the nibble-reversed name is kept for diagnostics only
    #[error("IPv6 not supported by most RBLs")]
    Ipv6Unsupported {
        /// The `ip6.arpa` form that would have been queried
        arpa_name: String,
    },
}

/// Reverse an IPv4 address for an RBL lookup (without the zone suffix)
///
/// Converts `1.2.3.4` into `4.3.2.1`.
pub fn reverse_ipv4(ip: Ipv4Addr) -> String {
    let o = ip.octets();
    format!("{}.{}.{}.{}", o[3], o[2], o[1], o[0])
}

/// Nibble-reversed `ip6.arpa` name for an IPv6 address
fn reverse_ipv6_arpa(ip: Ipv6Addr) -> String {
    let mut nibbles = Vec::with_capacity(32);
    for byte in ip.octets() {
        nibbles.push(format!("{:x}", byte >> 4));
        nibbles.push(format!("{:x}", byte & 0x0f));
    }
    nibbles.reverse();
    format!("{}.ip6.arpa", nibbles.join("."))
}

/// Build the full RBL query name for `ip` under `suffix`
///
/// `192.168.1.1` + `bl.example.com` -> `1.1.168.192.bl.example.com`.
/// IPv6 input is rejected with its `ip6.arpa` form attached; malformed
/// input is rejected outright.
pub fn build_query_name(ip: &str, suffix: &str) -> Result<String, NameRejection> {
    match ip.parse::<IpAddr>() {
        Ok(IpAddr::V4(v4)) => Ok(format!("{}.{}", reverse_ipv4(v4), suffix)),
        Ok(IpAddr::V6(v6)) => Err(NameRejection::Ipv6Unsupported {
            arpa_name: reverse_ipv6_arpa(v6),
        }),
        Err(_) => Err(NameRejection::InvalidIp),
    }
}
