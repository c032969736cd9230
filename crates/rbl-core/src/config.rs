//! Configuration types for the check engine

use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::time::Duration;

/// Check engine configuration
///
/// `resolver_address` selects the transport strategy: when set, queries go
/// over a raw UDP socket straight to that resolver (required for Spamhaus,
/// whose zones reject queries arriving via public resolvers); when absent,
/// the platform's default resolution path is used.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckConfig {
    /// Explicit resolver to query, or `None` for the system default
    #[serde(default)]
    pub resolver_address: Option<IpAddr>,

    /// Per-provider DNS lookup timeout in seconds
    #[serde(default = "default_lookup_timeout_secs")]
    pub lookup_timeout_secs: u64,
}

impl CheckConfig {
    /// Create a configuration with defaults
    pub fn new() -> Self {
        Self {
            resolver_address: None,
            lookup_timeout_secs: default_lookup_timeout_secs(),
        }
    }

    /// Use an explicit resolver instead of the system default
    pub fn with_resolver(mut self, resolver: IpAddr) -> Self {
        self.resolver_address = Some(resolver);
        self
    }

    /// Set the per-provider lookup timeout in seconds
    pub fn with_lookup_timeout_secs(mut self, secs: u64) -> Self {
        self.lookup_timeout_secs = secs;
        self
    }

    /// The lookup timeout as a [`Duration`]
    pub fn lookup_timeout(&self) -> Duration {
        Duration::from_secs(self.lookup_timeout_secs)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.lookup_timeout_secs == 0 {
            return Err(crate::Error::config("Lookup timeout must be > 0"));
        }
        Ok(())
    }
}

impl Default for CheckConfig {
    fn default() -> Self {
        Self::new()
    }
}

fn default_lookup_timeout_secs() -> u64 {
    5
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = CheckConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.lookup_timeout(), Duration::from_secs(5));
        assert!(config.resolver_address.is_none());
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let config = CheckConfig::new().with_lookup_timeout_secs(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn deserializes_with_defaults() {
        let config: CheckConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.lookup_timeout_secs, 5);

        let config: CheckConfig =
            serde_json::from_str(r#"{"resolver_address": "127.0.0.1"}"#).unwrap();
        assert_eq!(
            config.resolver_address,
            Some("127.0.0.1".parse::<IpAddr>().unwrap())
        );
    }
}
