//! Uniswap V2 style integration: reserve reading, fiat price fallback, market statistics and the
//! approve-then-swap sequence, all driven through a caller supplied
//! [`ChainClient`](pairswap_common::traits::ChainClient).

#[cfg(test)]
#[macro_use]
extern crate pretty_assertions;

pub mod abi;
pub mod config;
pub mod executor;
pub mod oracle;
pub mod reserves;
pub mod revert;
pub mod stats;

#[cfg(test)]
pub mod test_fixtures;

use std::str::FromStr;

use alloy::primitives::{Address, U256};
use num_bigint::BigUint;
use pairswap_common::errors::SwapError;

/// Conversion between on-chain `U256` words and the `BigUint` used by the models.
///
/// # Examples
/// ```
/// use alloy::primitives::U256;
/// use num_bigint::BigUint;
/// use pairswap_ethereum::BigUintCodec;
///
/// let word = U256::from(1_000_000u64);
/// let value = word.to_biguint();
/// assert_eq!(value, BigUint::from(1_000_000u64));
/// assert_eq!(U256::from_biguint(&value).unwrap(), word);
/// ```
pub trait BigUintCodec: Sized {
    /// Converts the word into a big integer. Never fails.
    fn to_biguint(self) -> BigUint;

    /// Converts a big integer into a word.
    ///
    /// Fails with [`SwapError::InvalidAmount`] if the value does not fit into 256 bits.
    fn from_biguint(value: &BigUint) -> Result<Self, SwapError>;
}

impl BigUintCodec for U256 {
    fn to_biguint(self) -> BigUint {
        BigUint::from_bytes_be(&self.to_be_bytes::<32>())
    }

    fn from_biguint(value: &BigUint) -> Result<Self, SwapError> {
        U256::try_from_be_slice(&value.to_bytes_be())
            .ok_or_else(|| SwapError::InvalidAmount(format!("{value} does not fit into 256 bits")))
    }
}

/// Parses a well-formed, non-zero account address (`0x` followed by 40 hex digits).
///
/// Mixed-case input must carry a valid EIP-55 checksum; all-lowercase and all-uppercase input is
/// taken as is.
pub fn parse_address(input: &str) -> Result<Address, SwapError> {
    let trimmed = input.trim();
    let hex = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .ok_or_else(|| SwapError::InvalidAddress(format!("missing 0x prefix: '{trimmed}'")))?;
    if hex.len() != 40 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(SwapError::InvalidAddress(format!(
            "expected 40 hex digits, got '{trimmed}'"
        )));
    }
    let mixed_case = hex.bytes().any(|b| b.is_ascii_lowercase()) &&
        hex.bytes().any(|b| b.is_ascii_uppercase());
    let address = if mixed_case {
        Address::parse_checksummed(format!("0x{hex}"), None)
            .map_err(|e| SwapError::InvalidAddress(format!("'{trimmed}': {e}")))?
    } else {
        Address::from_str(hex)
            .map_err(|e| SwapError::InvalidAddress(format!("'{trimmed}': {e}")))?
    };
    if address.is_zero() {
        return Err(SwapError::InvalidAddress("zero address".to_string()));
    }
    Ok(address)
}
