// # rbl-dns
//
// Resolver transports for the RBL Watch engine.
//
// Two implementations of `rbl_core::traits::Resolver`:
// - **SocketResolver**: raw DNS over UDP to an explicit resolver. Required
//   for Spamhaus zones, which reject queries arriving via public
//   forwarders.
// - **SystemResolver**: the platform's configured resolution path, via
//   hickory-resolver.
//
// `resolver_for()` picks between them from the engine configuration.

pub mod codec;
pub mod socket;
pub mod system;

pub use socket::SocketResolver;
pub use system::SystemResolver;

use rbl_core::CheckConfig;
use rbl_core::traits::Resolver;

/// Select the transport strategy for a configuration
///
/// An explicit resolver address means the raw socket path; otherwise the
/// system resolver is used.
pub fn resolver_for(config: &CheckConfig) -> Box<dyn Resolver> {
    match config.resolver_address {
        Some(ip) => Box::new(SocketResolver::new(ip)),
        None => Box::new(SystemResolver::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_resolver_selects_socket_strategy() {
        let config = CheckConfig::new().with_resolver("127.0.0.1".parse().unwrap());
        assert_eq!(resolver_for(&config).strategy(), "udp-socket");
    }

    #[test]
    fn default_config_selects_system_strategy() {
        let config = CheckConfig::default();
        assert_eq!(resolver_for(&config).strategy(), "system");
    }
}
