//! Platform-default resolver transport
//!
//! Uses the system's configured resolution path via hickory-resolver. The
//! trade-off is documented on [`SystemResolver`]: convenient, but queries
//! may be forwarded through public resolvers, which Spamhaus zones answer
//! with their open-resolver sentinel instead of a listing.

use std::net::IpAddr;
use std::time::Duration;

use async_trait::async_trait;
use hickory_resolver::TokioResolver;
use hickory_resolver::config::ResolverConfig;
use hickory_resolver::name_server::TokioConnectionProvider;
use rbl_core::traits::{AnswerRecord, Lookup, Resolver};
use tracing::debug;

/// Resolver backed by the platform's configured DNS path
///
/// Falls back from the system configuration to hickory's defaults when
/// `/etc/resolv.conf` (or the platform equivalent) cannot be read.
#[derive(Clone)]
pub struct SystemResolver {
    resolver: TokioResolver,
}

impl SystemResolver {
    /// Create a resolver from the system configuration
    pub fn new() -> Self {
        let resolver = TokioResolver::builder_tokio()
            .map(|builder| builder.build())
            .unwrap_or_else(|_| {
                TokioResolver::builder_with_config(
                    ResolverConfig::default(),
                    TokioConnectionProvider::default(),
                )
                .build()
            });

        Self { resolver }
    }
}

impl Default for SystemResolver {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Resolver for SystemResolver {
    async fn lookup_a(&self, name: &str, timeout: Duration) -> Lookup {
        debug!(query = name, "system resolver lookup");

        let result = tokio::time::timeout(timeout, self.resolver.lookup_ip(name)).await;
        match result {
            Err(_) => Lookup::timeout(),
            Ok(Ok(response)) => {
                let records: Vec<AnswerRecord> = response
                    .iter()
                    .filter_map(|ip| match ip {
                        IpAddr::V4(addr) => Some(AnswerRecord {
                            name: name.trim_end_matches('.').to_string(),
                            // TTLs are not surfaced on this path; the
                            // classifier never reads them.
                            ttl: 0,
                            addr,
                        }),
                        IpAddr::V6(_) => None,
                    })
                    .collect();

                if records.is_empty() {
                    Lookup::NotFound
                } else {
                    Lookup::Found(records)
                }
            }
            Ok(Err(e)) => {
                // NXDOMAIN surfaces as an error here, but for an RBL zone
                // it is the clean answer.
                let reason = e.to_string();
                if reason.contains("NXDomain") || reason.contains("no record") {
                    Lookup::NotFound
                } else {
                    Lookup::Failure(format!("DNS resolution error: {}", reason))
                }
            }
        }
    }

    fn strategy(&self) -> &'static str {
        "system"
    }
}
