//! Response classification
//!
//! Turns a DNS lookup result into a listed/not-listed verdict for one
//! provider. RBLs answer listing queries with A records in the 127.0.0.x
//! range; which exact codes are valid varies by provider. Spamhaus zones
//! accept only a restricted code set and use 127.255.255.254 as a sentinel
//! meaning the *query path* is wrong (public/open resolver), not that the
//! address is listed.

use std::net::Ipv4Addr;

use tracing::debug;

use crate::outcome::CheckOutcome;
use crate::traits::resolver::Lookup;

/// Codes Spamhaus zones return for genuine listings.
/// 2 = SBL, 3 = SBL CSS, 4 = XBL, 9 = DROP, 10/11 = PBL.
const SPAMHAUS_VALID_CODES: &[u8] = &[2, 3, 4, 9, 10, 11];

/// Spamhaus answer meaning the query came through a public/open resolver
/// or from an IP without attributable reverse DNS.
const SPAMHAUS_SENTINEL: Ipv4Addr = Ipv4Addr::new(127, 255, 255, 254);

/// Classify a completed lookup against `dns_suffix`'s validity rules
///
/// Only the first answer record is inspected when several are returned.
/// Out-of-range codes become errors rather than listings: they usually mean
/// resolver misconfiguration, and reporting them as listings would produce
/// false alarms.
pub fn classify(dns_suffix: &str, lookup: &Lookup) -> CheckOutcome {
    match lookup {
        Lookup::NotFound => CheckOutcome::not_listed(vec!["No answer records (not listed)".into()]),
        Lookup::Failure(reason) => {
            let error = if lookup.is_timeout() {
                "DNS lookup timeout (RBL may be slow or unresponsive)".to_string()
            } else {
                format!("DNS lookup error: {}", reason)
            };
            CheckOutcome::failed(error, vec![format!("Lookup failed: {}", reason)])
        }
        Lookup::Found(records) => match records.first() {
            Some(record) => classify_response(dns_suffix, record.addr),
            // Decode guarantees non-empty Found, but nothing downstream
            // should rely on that.
            None => CheckOutcome::not_listed(vec!["Answer section empty".into()]),
        },
    }
}

fn classify_response(dns_suffix: &str, addr: Ipv4Addr) -> CheckOutcome {
    let mut diagnostics = vec![format!("Response IP: {}", addr)];
    let is_spamhaus = dns_suffix.contains("spamhaus.org");
    let octets = addr.octets();

    let verdict = if octets[0] == 127 && octets[1] == 0 && octets[2] == 0 {
        let code = octets[3];
        diagnostics.push(format!(
            "Matches 127.0.0.x pattern, last octet: {}",
            code
        ));

        if is_spamhaus {
            diagnostics.push("Spamhaus RBL detected".into());
            if SPAMHAUS_VALID_CODES.contains(&code) {
                diagnostics.push(format!("Valid Spamhaus code: {}", code));
                Ok(())
            } else {
                diagnostics.push(format!(
                    "Invalid Spamhaus code: {} (not in [2,3,4,9,10,11])",
                    code
                ));
                Err(format!(
                    "Invalid RBL response: {} (Spamhaus code {} not in valid range [2,3,4,9,10,11])",
                    addr, code
                ))
            }
        } else {
            // Non-Spamhaus providers: any 127.0.0.x is a listing. Some
            // RBLs use 127.0.0.0 as a valid response code.
            diagnostics.push(format!("Valid non-Spamhaus code: {}", code));
            Ok(())
        }
    } else {
        diagnostics.push("Does NOT match 127.0.0.x pattern".into());
        if is_spamhaus && addr == SPAMHAUS_SENTINEL {
            Err(format!(
                "Spamhaus query method error ({}): query arrived via a public/open DNS resolver \
                 or from an IP without attributable reverse DNS. Configure your local resolver to \
                 recurse directly to authoritative servers instead of forwarding to public \
                 resolvers (8.8.8.8, 1.1.1.1, etc.). The IP is not necessarily listed.",
                SPAMHAUS_SENTINEL
            ))
        } else {
            Err(format!(
                "Invalid RBL response: {} (not in 127.0.0.x range)",
                addr
            ))
        }
    };

    match verdict {
        Ok(()) => {
            diagnostics.push("Final validation result: VALID".into());
            debug!(suffix = dns_suffix, response = %addr, "valid listing response");
            CheckOutcome::listed(addr.to_string(), diagnostics)
        }
        Err(error) => {
            diagnostics.push("Final validation result: INVALID".into());
            debug!(suffix = dns_suffix, response = %addr, error = %error, "invalid listing response");
            CheckOutcome::failed(error, diagnostics)
        }
    }
}
