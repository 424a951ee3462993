//! Query classification: literal address or ENS name
//!
//! A literal address is 40 hex digits with an optional `0x` prefix. All-lower
//! and all-upper input is accepted as is; mixed case must be a valid EIP-55
//! checksum. Anything else that looks like a dotted domain is an ENS name.

use std::str::FromStr;

use alloy_primitives::Address;

use crate::domain::lookup::LookupError;

/// Classified user query
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryKind {
    /// Literal account address, already resolved
    Address(Address),
    /// Normalized ENS name that still needs remote resolution
    Name(String),
}

impl QueryKind {
    /// Classify raw user input. Fails without touching the network when the
    /// input is neither an address nor a plausible name.
    pub fn classify(input: &str) -> Result<Self, LookupError> {
        let trimmed = input.trim();
        if let Some(address) = parse_address(trimmed) {
            return Ok(QueryKind::Address(address));
        }
        if is_valid_ens_name(trimmed) {
            return Ok(QueryKind::Name(normalize_name(trimmed)));
        }
        Err(LookupError::InvalidQuery(if trimmed.is_empty() {
            "empty query".to_string()
        } else {
            trimmed.to_string()
        }))
    }
}

/// True if `value` is a well-formed address (checksum enforced for mixed case)
pub fn is_address(value: &str) -> bool {
    parse_address(value).is_some()
}

/// Parse a literal address, enforcing the EIP-55 checksum on mixed-case input
pub fn parse_address(value: &str) -> Option<Address> {
    let payload = strip_hex_prefix(value.trim());
    if payload.len() != 40 || !payload.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }

    let address = Address::from_str(payload).ok()?;

    let has_lower = payload.chars().any(|c| c.is_ascii_lowercase());
    let has_upper = payload.chars().any(|c| c.is_ascii_uppercase());
    if has_lower && has_upper {
        let checksummed = address.to_checksum(None);
        if &checksummed[2..] != payload {
            return None;
        }
    }

    Some(address)
}

/// Canonical EIP-55 form of a literal address
pub fn get_address(value: &str) -> Option<String> {
    parse_address(value).map(|address| address.to_checksum(None))
}

/// True if `value` is syntactically an ENS name: at least two non-empty
/// dot-separated labels made of letters, digits, `-`, `_` or non-ASCII
/// characters.
pub fn is_valid_ens_name(value: &str) -> bool {
    let value = value.trim();
    if value.is_empty() {
        return false;
    }

    let labels: Vec<&str> = value.split('.').collect();
    if labels.len() < 2 {
        return false;
    }

    labels.iter().all(|label| {
        !label.is_empty()
            && label.chars().all(|c| {
                c.is_alphanumeric()
                    || c == '-'
                    || c == '_'
                    || (!c.is_ascii() && !c.is_whitespace() && !c.is_control())
            })
    })
}

/// Lowercase a name before hashing.
// TODO: full ENSIP-15 normalization (emoji and confusable handling) once a
// maintained normalizer crate is available for the ENS hash.
fn normalize_name(value: &str) -> String {
    value.trim().to_lowercase()
}

fn strip_hex_prefix(value: &str) -> &str {
    value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
        .unwrap_or(value)
}
