//! Per-family address validation.

use alloy::primitives::Address;

use crate::config::ChainFamily;
use crate::error::{InteractionError, Result};

/// Tron mainnet address prefix byte.
const TRON_PREFIX: u8 = 0x41;

/// Parse an EVM address.
///
/// Requires the `0x` prefix and 40 hex digits. Mixed-case input must carry
/// a valid EIP-55 checksum; single-case input is accepted as is.
///
/// # Errors
///
/// Returns [`InteractionErrorKind::InvalidAddress`](crate::InteractionErrorKind::InvalidAddress).
pub fn parse_evm(input: &str) -> Result<Address> {
    let s = input.trim();
    let hex = s
        .strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .ok_or_else(|| InteractionError::invalid_address(format!("'{s}' is missing the 0x prefix")))?;
    if hex.len() != 40 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(InteractionError::invalid_address(format!(
            "'{s}' is not a 20-byte hex address"
        )));
    }

    let has_lower = hex.bytes().any(|b| b.is_ascii_lowercase());
    let has_upper = hex.bytes().any(|b| b.is_ascii_uppercase());
    if has_lower && has_upper {
        let prefixed = format!("0x{hex}");
        return Address::parse_checksummed(&prefixed, None)
            .map_err(|_| InteractionError::invalid_address(format!("'{s}' has a bad EIP-55 checksum")));
    }

    hex.parse::<Address>()
        .map_err(|e| InteractionError::invalid_address(format!("'{s}': {e}")))
}

fn validate_solana(s: &str) -> Result<()> {
    let bytes = bs58::decode(s)
        .into_vec()
        .map_err(|e| InteractionError::invalid_address(format!("'{s}' is not base58: {e}")))?;
    if bytes.len() != 32 {
        return Err(InteractionError::invalid_address(format!(
            "'{s}' decodes to {} bytes, expected 32",
            bytes.len()
        )));
    }
    Ok(())
}

fn validate_tron(s: &str) -> Result<()> {
    let bytes = bs58::decode(s)
        .with_check(None)
        .into_vec()
        .map_err(|e| InteractionError::invalid_address(format!("'{s}' is not base58check: {e}")))?;
    if bytes.len() != 21 || bytes[0] != TRON_PREFIX {
        return Err(InteractionError::invalid_address(format!(
            "'{s}' is not a Tron address"
        )));
    }
    Ok(())
}

/// Validate an address for a chain family and return its canonical form.
///
/// EVM addresses come back EIP-55 checksummed; Solana and Tron addresses
/// are returned trimmed but otherwise unchanged.
///
/// # Errors
///
/// Returns [`InteractionErrorKind::InvalidAddress`](crate::InteractionErrorKind::InvalidAddress).
pub fn validate(family: ChainFamily, input: &str) -> Result<String> {
    let s = input.trim();
    if s.is_empty() {
        return Err(InteractionError::invalid_address("address is empty"));
    }
    match family {
        ChainFamily::Evm => parse_evm(s).map(|a| a.to_checksum(None)),
        ChainFamily::Solana => validate_solana(s).map(|()| s.to_string()),
        ChainFamily::Tron => validate_tron(s).map(|()| s.to_string()),
    }
}
