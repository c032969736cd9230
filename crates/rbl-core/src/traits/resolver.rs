//! # Resolver Trait
//!
//! Defines the interface for performing DNS A-record lookups on behalf of
//! the check engine.
//!
//! ## Implementations
//!
//! - Raw UDP socket to an explicit resolver: `rbl-dns` crate (`SocketResolver`)
//! - Platform-default resolution: `rbl-dns` crate (`SystemResolver`)
//!
//! ## Contract
//!
//! A resolver performs exactly one lookup per invocation and reports the
//! outcome as a [`Lookup`], never as a crate error: transport failures and
//! timeouts are data to the classifier, not exceptions. Retry policy, rate
//! limiting, and deadlines beyond the passed budget are owned by the engine;
//! implementations must not sleep, retry, or cache across calls.

use async_trait::async_trait;
use std::net::Ipv4Addr;
use std::time::Duration;

/// One A record from a DNS answer section
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerRecord {
    /// Decompressed owner name
    pub name: String,

    /// Record time-to-live in seconds
    pub ttl: u32,

    /// The 4-byte address payload
    pub addr: Ipv4Addr,
}

/// Outcome of one DNS lookup
///
/// For RBL queries, `NotFound` (NXDOMAIN or an empty answer section) is the
/// common clean case. `Failure` carries a human-readable reason; resolvers
/// use the literal reason `"timeout"` for an exhausted time budget so the
/// classifier can distinguish it from other transport failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    /// NXDOMAIN or zero answers: the name does not resolve
    NotFound,

    /// Transport or protocol failure; the reason is surfaced verbatim
    Failure(String),

    /// One or more A records were returned
    Found(Vec<AnswerRecord>),
}

impl Lookup {
    /// The conventional timeout failure
    pub fn timeout() -> Self {
        Self::Failure("timeout".to_string())
    }

    /// True if this is a `Failure` whose reason is the timeout marker
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Failure(reason) if reason == "timeout")
    }
}

/// Trait for DNS lookup strategies
///
/// # Thread Safety
///
/// Implementations must be thread-safe and usable across async tasks.
#[async_trait]
pub trait Resolver: Send + Sync {
    /// Resolve `name` to its A records within `timeout`
    ///
    /// # Parameters
    ///
    /// - `name`: fully assembled query name (reversed octets + zone suffix)
    /// - `timeout`: hard budget for the whole round trip
    async fn lookup_a(&self, name: &str, timeout: Duration) -> Lookup;

    /// Short strategy name for logging (e.g., "udp-socket", "system")
    fn strategy(&self) -> &'static str;
}
