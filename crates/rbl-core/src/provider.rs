//! Provider descriptions and the provider registry
//!
//! A provider is one RBL: a DNS zone that answers reversed-octet A queries
//! with a 127.0.0.x listing code. The registry is an ordered, read-only
//! collection owned by the caller; the engine only ever iterates its
//! checkable subset (enabled, not paid-only) ascending by id.

use serde::{Deserialize, Serialize};

/// One RBL provider, immutable for the duration of a check run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Provider {
    /// Opaque registry identity; also the iteration and result key
    pub id: u32,

    /// Display name (e.g., "Spamhaus ZEN")
    pub name: String,

    /// DNS zone the reversed IP is queried under (e.g., "zen.spamhaus.org")
    pub dns_suffix: String,

    /// Disabled providers are never queried
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Paid providers are always skipped by the batch path
    #[serde(default)]
    pub requires_paid: bool,

    /// Minimum spacing between successive queries to this provider
    #[serde(default = "default_rate_limit_ms")]
    pub rate_limit_ms: u64,
}

impl Provider {
    /// Create an enabled, non-paid provider with the default rate limit
    pub fn new(id: u32, name: impl Into<String>, dns_suffix: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            dns_suffix: dns_suffix.into(),
            enabled: true,
            requires_paid: false,
            rate_limit_ms: default_rate_limit_ms(),
        }
    }

    /// Set the rate limit in milliseconds
    pub fn with_rate_limit_ms(mut self, rate_limit_ms: u64) -> Self {
        self.rate_limit_ms = rate_limit_ms;
        self
    }

    /// Enable or disable the provider
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Mark the provider as requiring a paid subscription
    pub fn with_requires_paid(mut self, requires_paid: bool) -> Self {
        self.requires_paid = requires_paid;
        self
    }
}

fn default_enabled() -> bool {
    true
}

fn default_rate_limit_ms() -> u64 {
    100
}

/// Ordered collection of providers consumed by the check engine
///
/// The engine never mutates the registry. `checkable()` is the batch path's
/// view: enabled, non-paid providers in ascending id order regardless of
/// insertion order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProviderRegistry {
    providers: Vec<Provider>,
}

impl ProviderRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry from an existing provider list
    pub fn from_providers(providers: Vec<Provider>) -> Self {
        Self { providers }
    }

    /// The widely monitored public RBLs, with their per-provider rate
    /// limits. Spamhaus and SpamCop get a wider spacing (200 ms); everyone
    /// else runs at the 100 ms floor.
    pub fn builtin() -> Self {
        let defs: &[(&str, &str, u64)] = &[
            ("Barracuda", "b.barracudacentral.org", 100),
            ("SpamCop", "bl.spamcop.net", 200),
            ("SORBS DNSBL", "dnsbl.sorbs.net", 100),
            ("SORBS Spam", "spam.dnsbl.sorbs.net", 100),
            ("SpamRats", "spam.spamrats.com", 100),
            ("PSBL", "psbl.surriel.com", 100),
            ("SpamLab", "rbl.spamlab.com", 100),
            ("SureSupport", "rbl.suresupport.com", 100),
            ("Kundenserver Relays", "relays.bl.kundenserver.de", 100),
            ("Nether Relays", "relays.nether.net", 100),
            ("SORBS SMTP", "smtp.dnsbl.sorbs.net", 100),
            ("SORBS SOCKS", "socks.dnsbl.sorbs.net", 100),
            ("MSRBL Spam", "spam.rbl.msrbl.net", 100),
            ("SpamGuard", "spamguard.leadmon.net", 100),
            ("IMP Spam", "spamrbl.imp.ch", 100),
            ("Unsubscribe Score", "ubl.unsubscore.com", 100),
            ("MSRBL Virus", "virus.rbl.msrbl.net", 100),
            ("SORBS Web", "web.dnsbl.sorbs.net", 100),
            ("IMP Worm", "wormrbl.imp.ch", 100),
            ("Spamhaus XBL", "xbl.spamhaus.org", 200),
            ("Spamhaus ZEN", "zen.spamhaus.org", 200),
            ("SORBS Zombie", "zombie.dnsbl.sorbs.net", 100),
            ("DroneBL", "dnsbl.dronebl.org", 100),
            ("INPS", "dnsbl.inps.de", 100),
            ("NJABL", "dnsbl.njabl.org", 100),
            ("Tornevall", "dnsbl.tornevall.org", 100),
        ];

        let providers = defs
            .iter()
            .enumerate()
            .map(|(i, (name, suffix, rate))| {
                Provider::new(i as u32 + 1, *name, *suffix).with_rate_limit_ms(*rate)
            })
            .collect();

        Self { providers }
    }

    /// Add a provider to the registry
    pub fn push(&mut self, provider: Provider) {
        self.providers.push(provider);
    }

    /// All providers, in insertion order
    pub fn all(&self) -> &[Provider] {
        &self.providers
    }

    /// Number of providers (regardless of enabled/paid flags)
    pub fn len(&self) -> usize {
        self.providers.len()
    }

    /// True if no providers are registered
    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// Look up a provider by id
    pub fn get(&self, id: u32) -> Option<&Provider> {
        self.providers.iter().find(|p| p.id == id)
    }

    /// The batch path's view: enabled, non-paid providers ascending by id
    pub fn checkable(&self) -> Vec<&Provider> {
        let mut checkable: Vec<&Provider> = self
            .providers
            .iter()
            .filter(|p| p.enabled && !p.requires_paid)
            .collect();
        checkable.sort_by_key(|p| p.id);
        checkable
    }
}
