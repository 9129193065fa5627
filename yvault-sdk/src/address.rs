//! Ethereum address helpers.
//!
//! Every address stored by the indexer is kept in one canonical form:
//! `0x` followed by 40 lowercase hex digits.
//!
//! Input may be all lowercase, all uppercase, or mixed case. Mixed-case input
//! must carry a valid EIP-55 checksum.

use alloy_primitives::Address;
use thiserror::Error;

/// Errors returned when an address string is not a 20-byte hex address.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddressError {
    #[error("address must start with 0x")]
    MissingPrefix,
    #[error("address must have 40 hex digits, got {0}")]
    InvalidLength(usize),
    #[error("address contains non-hex characters")]
    InvalidCharacter,
    #[error("mixed-case address has an invalid checksum")]
    InvalidChecksum,
}

/// Validate an address string.
pub fn parse_address(raw: &str) -> Result<Address, AddressError> {
    let raw = raw.trim();
    let digits = raw
        .strip_prefix("0x")
        .or_else(|| raw.strip_prefix("0X"))
        .ok_or(AddressError::MissingPrefix)?;
    if digits.len() != 40 {
        return Err(AddressError::InvalidLength(digits.len()));
    }
    if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(AddressError::InvalidCharacter);
    }

    let has_lower = digits.chars().any(|c| c.is_ascii_lowercase());
    let has_upper = digits.chars().any(|c| c.is_ascii_uppercase());
    if has_lower && has_upper {
        return Address::parse_checksummed(format!("0x{digits}"), None)
            .map_err(|_| AddressError::InvalidChecksum);
    }
    digits
        .parse::<Address>()
        .map_err(|_| AddressError::InvalidCharacter)
}

/// Validate an address and return its canonical lowercase form.
pub fn normalize_address(raw: &str) -> Result<String, AddressError> {
    parse_address(raw).map(|address| format!("{address:#x}"))
}

/// Whether `raw` is a valid address.
pub fn is_address(raw: &str) -> bool {
    parse_address(raw).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_checksummed() {
        let addr = normalize_address("0xabCDeF0123456789AbcdEf0123456789aBCDEF01").unwrap();
        assert_eq!(addr, "0xabcdef0123456789abcdef0123456789abcdef01");
    }

    #[test]
    fn test_mixed_case_with_bad_checksum_is_rejected() {
        assert_eq!(
            normalize_address("0xAbCDEF0123456789abcdef0123456789ABCDEF01"),
            Err(AddressError::InvalidChecksum)
        );
        assert!(!is_address("0xAbCDEF0123456789abcdef0123456789ABCDEF01"));
    }

    #[test]
    fn test_single_case_skips_checksum() {
        assert_eq!(
            normalize_address("0xABCDEF0123456789ABCDEF0123456789ABCDEF01").unwrap(),
            "0xabcdef0123456789abcdef0123456789abcdef01"
        );
        assert_eq!(
            normalize_address(" 0xabcdef0123456789abcdef0123456789abcdef01 ").unwrap(),
            "0xabcdef0123456789abcdef0123456789abcdef01"
        );
    }

    #[test]
    fn test_rejects_bad_addresses() {
        assert_eq!(
            normalize_address("abcdef0123456789abcdef0123456789abcdef01"),
            Err(AddressError::MissingPrefix)
        );
        assert_eq!(
            normalize_address("0xabc"),
            Err(AddressError::InvalidLength(3))
        );
        assert_eq!(
            normalize_address("0xzzcdef0123456789abcdef0123456789abcdef01"),
            Err(AddressError::InvalidCharacter)
        );
        assert!(!is_address(""));
    }
}
