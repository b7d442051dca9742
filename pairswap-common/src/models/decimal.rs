use std::{
    fmt,
    ops::{Add, Mul},
    str::FromStr,
};

use num_bigint::{BigInt, BigUint};
use num_rational::BigRational;
use num_traits::{One, Zero};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::{
    errors::SwapError,
    units::{format_units, parse_digits, pow10, split_decimal},
};

/// Number of fractional digits rendered by `Display` and used for serialization.
pub const DISPLAY_SCALE: u8 = 18;

/// An exact, non-negative decimal quantity.
///
/// Backed by a big rational so that reserve ratios, fiat conversions and market figures never
/// pass through floating point. Rendering truncates to a fixed number of fractional digits.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct Decimal(BigRational);

impl Decimal {
    pub fn zero() -> Self {
        Self(BigRational::zero())
    }

    pub fn one() -> Self {
        Self(BigRational::one())
    }

    /// Interprets `value` as an integer amount with `decimals` implied fractional digits.
    pub fn from_base_units(value: &BigUint, decimals: u8) -> Self {
        Self(BigRational::new(BigInt::from(value.clone()), BigInt::from(pow10(u32::from(decimals)))))
    }

    /// Builds `numer / denom`, `None` if the denominator is zero.
    pub fn from_ratio(numer: BigUint, denom: BigUint) -> Option<Self> {
        if denom.is_zero() {
            return None;
        }
        Some(Self(BigRational::new(BigInt::from(numer), BigInt::from(denom))))
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn checked_div(&self, rhs: &Decimal) -> Option<Decimal> {
        if rhs.is_zero() {
            return None;
        }
        Some(Self(&self.0 / &rhs.0))
    }

    /// Converts back to base units at `decimals` precision, truncating any remainder.
    pub fn to_base_units(&self, decimals: u8) -> BigUint {
        let scaled = self.0.numer().magnitude() * pow10(u32::from(decimals));
        scaled / self.0.denom().magnitude()
    }

    /// Renders the value with at most `scale` fractional digits, truncated and trimmed.
    pub fn to_string_with_scale(&self, scale: u8) -> String {
        format_units(&self.to_base_units(scale), scale)
    }
}

impl From<u64> for Decimal {
    fn from(value: u64) -> Self {
        Self(BigRational::from_integer(BigInt::from(value)))
    }
}

impl From<BigUint> for Decimal {
    fn from(value: BigUint) -> Self {
        Self(BigRational::from_integer(BigInt::from(value)))
    }
}

impl FromStr for Decimal {
    type Err = SwapError;

    /// Parses a plain decimal literal such as `"312.45"` exactly.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (int_part, frac_part) = split_decimal(s)?;
        let numer = parse_digits(&format!("{int_part}{frac_part}"))?;
        let frac_digits = u32::try_from(frac_part.len())
            .map_err(|_| SwapError::InvalidAmount(format!("too many fractional digits: {s}")))?;
        Ok(Self(BigRational::new(BigInt::from(numer), BigInt::from(pow10(frac_digits)))))
    }
}

impl fmt::Display for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_string_with_scale(DISPLAY_SCALE))
    }
}

impl Add for Decimal {
    type Output = Decimal;

    fn add(self, rhs: Decimal) -> Decimal {
        Decimal(self.0 + rhs.0)
    }
}

impl<'a> Add<&'a Decimal> for &'a Decimal {
    type Output = Decimal;

    fn add(self, rhs: &'a Decimal) -> Decimal {
        Decimal(&self.0 + &rhs.0)
    }
}

impl Mul for Decimal {
    type Output = Decimal;

    fn mul(self, rhs: Decimal) -> Decimal {
        Decimal(self.0 * rhs.0)
    }
}

impl<'a> Mul<&'a Decimal> for &'a Decimal {
    type Output = Decimal;

    fn mul(self, rhs: &'a Decimal) -> Decimal {
        Decimal(&self.0 * &rhs.0)
    }
}

impl Serialize for Decimal {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Decimal {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse()
            .map_err(serde::de::Error::custom)
    }
}
