use std::fmt;

use num_bigint::BigUint;
use num_traits::Zero;
use serde::{Deserialize, Serialize};

use crate::{
    errors::SwapError,
    models::Decimal,
    units::{format_units, pow10},
};

/// An unsigned amount in base units, always paired with the precision it was produced with.
///
/// Arithmetic between amounts of different precision is rejected; use [`Amount::rescale`] to
/// convert explicitly first.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Amount {
    value: BigUint,
    decimals: u8,
}

impl Amount {
    pub fn new(value: BigUint, decimals: u8) -> Self {
        Self { value, decimals }
    }

    pub fn zero(decimals: u8) -> Self {
        Self::new(BigUint::zero(), decimals)
    }

    pub fn value(&self) -> &BigUint {
        &self.value
    }

    pub fn into_value(self) -> BigUint {
        self.value
    }

    pub fn decimals(&self) -> u8 {
        self.decimals
    }

    pub fn is_zero(&self) -> bool {
        self.value.is_zero()
    }

    /// Exact human readable value, e.g. `1_500_000` at 6 decimals is `1.5`.
    pub fn to_decimal(&self) -> Decimal {
        Decimal::from_base_units(&self.value, self.decimals)
    }

    /// Exact human readable string with trailing zeros trimmed.
    pub fn to_human(&self) -> String {
        format_units(&self.value, self.decimals)
    }

    /// Converts to another precision.
    ///
    /// Increasing precision is exact. Decreasing precision truncates towards zero, the returned
    /// flag is `true` if a non-zero remainder was dropped.
    pub fn rescale(&self, decimals: u8) -> (Amount, bool) {
        if decimals >= self.decimals {
            let factor = pow10(u32::from(decimals - self.decimals));
            (Amount::new(&self.value * factor, decimals), false)
        } else {
            let factor = pow10(u32::from(self.decimals - decimals));
            let remainder = &self.value % &factor;
            (Amount::new(&self.value / factor, decimals), !remainder.is_zero())
        }
    }

    pub fn checked_add(&self, other: &Amount) -> Result<Amount, SwapError> {
        self.ensure_same_precision(other)?;
        Ok(Amount::new(&self.value + &other.value, self.decimals))
    }

    pub fn checked_sub(&self, other: &Amount) -> Result<Amount, SwapError> {
        self.ensure_same_precision(other)?;
        if other.value > self.value {
            return Err(SwapError::InvalidAmount(format!(
                "cannot subtract {} from {}",
                other.to_human(),
                self.to_human()
            )));
        }
        Ok(Amount::new(&self.value - &other.value, self.decimals))
    }

    fn ensure_same_precision(&self, other: &Amount) -> Result<(), SwapError> {
        if self.decimals != other.decimals {
            return Err(SwapError::InvalidAmount(format!(
                "precision mismatch: {} vs {} decimals",
                self.decimals, other.decimals
            )));
        }
        Ok(())
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_human())
    }
}
