//! DNS wire format codec — RFC 1035 Section 4, reduced to what RBL
//! queries need: A/IN questions out, A answers (with name decompression)
//! back in.
//!
//! The decoder is deliberately lenient about record contents (wrong-length
//! A records are skipped, non-A records ignored) and strict about
//! structure: short packets, mismatched transaction ids, and abusive
//! compression pointers all surface as `Lookup::Failure`.

use std::collections::HashSet;
use std::net::Ipv4Addr;

use rbl_core::traits::{AnswerRecord, Lookup};
use thiserror::Error;

/// DNS header size in bytes.
const HEADER_SIZE: usize = 12;

/// Maximum label length per RFC 1035 Section 2.3.4.
const MAX_LABEL_LENGTH: usize = 63;

/// Maximum number of compression-pointer jumps while decoding one name.
const MAX_POINTER_JUMPS: usize = 10;

/// RD (Recursion Desired) bit in the header flags.
const FLAG_RD: u16 = 0x0100;

const TYPE_A: u16 = 1;
const CLASS_IN: u16 = 1;
const RCODE_NXDOMAIN: u8 = 3;

/// Query encoding failure
#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("label '{0}' exceeds 63 bytes")]
    LabelTooLong(String),
}

/// Encode an A/IN query for `name` with the given transaction id
///
/// Layout: 12-byte header (QR=0, opcode 0, RD per `recursion_desired`,
/// QDCOUNT=1), length-prefixed labels, null terminator, QTYPE=A, QCLASS=IN.
pub fn encode_query(name: &str, id: u16, recursion_desired: bool) -> Result<Vec<u8>, EncodeError> {
    let mut packet = Vec::with_capacity(HEADER_SIZE + name.len() + 6);

    let flags: u16 = if recursion_desired { FLAG_RD } else { 0 };
    packet.extend_from_slice(&id.to_be_bytes());
    packet.extend_from_slice(&flags.to_be_bytes());
    packet.extend_from_slice(&1u16.to_be_bytes()); // QDCOUNT
    packet.extend_from_slice(&0u16.to_be_bytes()); // ANCOUNT
    packet.extend_from_slice(&0u16.to_be_bytes()); // NSCOUNT
    packet.extend_from_slice(&0u16.to_be_bytes()); // ARCOUNT

    for label in name.trim_end_matches('.').split('.') {
        if label.len() > MAX_LABEL_LENGTH {
            return Err(EncodeError::LabelTooLong(label.to_string()));
        }
        packet.push(label.len() as u8);
        packet.extend_from_slice(label.as_bytes());
    }
    packet.push(0);

    packet.extend_from_slice(&TYPE_A.to_be_bytes());
    packet.extend_from_slice(&CLASS_IN.to_be_bytes());

    Ok(packet)
}

/// Decode a DNS response into a [`Lookup`]
///
/// NXDOMAIN and an empty answer section are both `NotFound` (the clean
/// case for RBL queries). Only A/IN records with a 4-byte RDATA become
/// answers; anything else in the answer section is skipped with the
/// offset advanced past its RDATA.
pub fn decode_response(payload: &[u8], expected_id: u16) -> Lookup {
    if payload.len() < HEADER_SIZE {
        return Lookup::Failure("response shorter than DNS header".to_string());
    }

    let id = u16::from_be_bytes([payload[0], payload[1]]);
    if id != expected_id {
        return Lookup::Failure(format!(
            "transaction id mismatch (expected {}, got {})",
            expected_id, id
        ));
    }

    let flags = u16::from_be_bytes([payload[2], payload[3]]);
    let rcode = (flags & 0x0F) as u8;
    if rcode != 0 {
        // NXDOMAIN is the normal "not listed" answer for an RBL zone.
        if rcode == RCODE_NXDOMAIN {
            return Lookup::NotFound;
        }
        return Lookup::Failure(format!("server returned RCODE {}", rcode));
    }

    let qdcount = u16::from_be_bytes([payload[4], payload[5]]) as usize;
    let ancount = u16::from_be_bytes([payload[6], payload[7]]) as usize;
    if ancount == 0 {
        return Lookup::NotFound;
    }

    let mut offset = HEADER_SIZE;

    // Question section: names first, then QTYPE + QCLASS.
    for _ in 0..qdcount {
        match decode_name(payload, offset) {
            Ok((_, next)) => offset = next + 4,
            Err(reason) => return Lookup::Failure(reason),
        }
        if offset > payload.len() {
            return Lookup::Failure("truncated question section".to_string());
        }
    }

    let mut records = Vec::new();
    for _ in 0..ancount {
        if offset >= payload.len() {
            break;
        }
        let (name, next) = match decode_name(payload, offset) {
            Ok(decoded) => decoded,
            Err(reason) => return Lookup::Failure(reason),
        };
        offset = next;

        if offset + 10 > payload.len() {
            break;
        }
        let rtype = u16::from_be_bytes([payload[offset], payload[offset + 1]]);
        let rclass = u16::from_be_bytes([payload[offset + 2], payload[offset + 3]]);
        let ttl = u32::from_be_bytes([
            payload[offset + 4],
            payload[offset + 5],
            payload[offset + 6],
            payload[offset + 7],
        ]);
        let rdlength = u16::from_be_bytes([payload[offset + 8], payload[offset + 9]]) as usize;
        offset += 10;

        if offset + rdlength > payload.len() {
            break;
        }

        // A 4-byte A/IN record is an answer; everything else (including an
        // A record with a bogus RDLENGTH) is skipped.
        if rtype == TYPE_A && rclass == CLASS_IN && rdlength == 4 {
            records.push(AnswerRecord {
                name,
                ttl,
                addr: Ipv4Addr::new(
                    payload[offset],
                    payload[offset + 1],
                    payload[offset + 2],
                    payload[offset + 3],
                ),
            });
        }

        offset += rdlength;
    }

    if records.is_empty() {
        Lookup::NotFound
    } else {
        Lookup::Found(records)
    }
}

/// Decode a possibly compressed name starting at `offset`
///
/// Follows RFC 1035 Section 4.1.4 pointers, bounded by a jump counter and
/// a visited-offset set so hostile packets cannot loop the decoder.
/// Returns the dotted name (no trailing dot) and the offset of the field
/// after the name.
fn decode_name(buf: &[u8], mut offset: usize) -> Result<(String, usize), String> {
    let mut name = String::new();
    let mut jumps = 0usize;
    let mut visited = HashSet::new();
    let mut return_offset = None;

    loop {
        if offset >= buf.len() {
            return Err("truncated name".to_string());
        }

        let len = buf[offset] as usize;

        if len & 0xC0 == 0xC0 {
            jumps += 1;
            if jumps > MAX_POINTER_JUMPS {
                return Err("name compression exceeds jump bound".to_string());
            }
            if offset + 1 >= buf.len() {
                return Err("truncated compression pointer".to_string());
            }
            let pointer = ((len & 0x3F) << 8) | buf[offset + 1] as usize;
            if return_offset.is_none() {
                return_offset = Some(offset + 2);
            }
            if !visited.insert(pointer) {
                return Err("name compression loop".to_string());
            }
            offset = pointer;
            continue;
        }

        if len == 0 {
            offset += 1;
            break;
        }

        if len > MAX_LABEL_LENGTH {
            return Err(format!("label length {} exceeds maximum", len));
        }
        if offset + 1 + len > buf.len() {
            return Err("truncated label".to_string());
        }

        if !name.is_empty() {
            name.push('.');
        }
        match std::str::from_utf8(&buf[offset + 1..offset + 1 + len]) {
            Ok(label) => name.push_str(label),
            Err(_) => return Err("label is not valid UTF-8".to_string()),
        }
        offset += len + 1;
    }

    Ok((name, return_offset.unwrap_or(offset)))
}
