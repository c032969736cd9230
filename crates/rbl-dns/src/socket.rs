//! Raw UDP resolver transport
//!
//! Sends the hand-encoded query straight to an explicit resolver on port
//! 53. This path exists for Spamhaus: their zones reject queries arriving
//! via public forwarders, so operators point the engine at a local
//! recursive resolver instead of whatever the platform is configured with.

use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use async_trait::async_trait;
use rbl_core::traits::{Lookup, Resolver};
use tokio::net::UdpSocket;
use tokio::time::Instant;
use tracing::{debug, trace};

use crate::codec;

/// UDP payload ceiling for plain DNS.
const MAX_RESPONSE_SIZE: usize = 512;

/// Minimum bytes for a packet to even carry a DNS header.
const MIN_RESPONSE_SIZE: usize = 12;

/// Resolver that speaks raw DNS over UDP to one explicit server
pub struct SocketResolver {
    resolver_addr: SocketAddr,
}

impl SocketResolver {
    /// Create a resolver targeting `resolver_ip` on the standard DNS port
    pub fn new(resolver_ip: IpAddr) -> Self {
        Self {
            resolver_addr: SocketAddr::new(resolver_ip, 53),
        }
    }

    /// Target an arbitrary socket address, for loopback test servers
    #[cfg(test)]
    pub(crate) fn with_addr(resolver_addr: SocketAddr) -> Self {
        Self { resolver_addr }
    }

    fn bind_addr(&self) -> SocketAddr {
        if self.resolver_addr.is_ipv4() {
            SocketAddr::new(IpAddr::V4(std::net::Ipv4Addr::UNSPECIFIED), 0)
        } else {
            SocketAddr::new(IpAddr::V6(std::net::Ipv6Addr::UNSPECIFIED), 0)
        }
    }
}

#[async_trait]
impl Resolver for SocketResolver {
    async fn lookup_a(&self, name: &str, timeout: Duration) -> Lookup {
        let id = fastrand::u16(1..);
        let query = match codec::encode_query(name, id, true) {
            Ok(query) => query,
            Err(e) => return Lookup::Failure(e.to_string()),
        };

        let deadline = Instant::now() + timeout;

        let socket = match UdpSocket::bind(self.bind_addr()).await {
            Ok(socket) => socket,
            Err(e) => return Lookup::Failure(format!("socket bind failed: {}", e)),
        };
        if let Err(e) = socket.connect(self.resolver_addr).await {
            return Lookup::Failure(format!("connect to {} failed: {}", self.resolver_addr, e));
        }
        if let Err(e) = socket.send(&query).await {
            return Lookup::Failure(format!("send to {} failed: {}", self.resolver_addr, e));
        }

        debug!(
            query = name,
            resolver = %self.resolver_addr,
            transaction_id = id,
            "sent DNS query"
        );

        // Read until the deadline; runt packets are discarded and the loop
        // keeps listening for the real response.
        let mut buf = [0u8; MAX_RESPONSE_SIZE];
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Lookup::timeout();
            }

            match tokio::time::timeout(remaining, socket.recv(&mut buf)).await {
                Err(_) => return Lookup::timeout(),
                Ok(Err(e)) => {
                    return Lookup::Failure(format!(
                        "recv from {} failed: {}",
                        self.resolver_addr, e
                    ));
                }
                Ok(Ok(len)) => {
                    if len < MIN_RESPONSE_SIZE {
                        trace!(len, "discarding runt datagram");
                        continue;
                    }
                    return codec::decode_response(&buf[..len], id);
                }
            }
        }
    }

    fn strategy(&self) -> &'static str {
        "udp-socket"
    }
}
