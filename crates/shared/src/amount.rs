use std::{fmt, str::FromStr};

use primitive_types::U256;
use serde::{Deserialize, Serialize};

use crate::error::ValidationFailure;

pub const DECIMALS: usize = 18;

fn scale() -> U256 {
    U256::exp10(DECIMALS)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Amount(U256);

impl Amount {
    pub const ZERO: Self = Self(U256([0; 4]));

    pub fn from_raw(raw: U256) -> Self {
        Self(raw)
    }

    pub fn raw(&self) -> U256 {
        self.0
    }

    pub fn from_units(units: u64) -> Self {
        Self(U256::from(units).saturating_mul(scale()))
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn checked_add(self, other: Self) -> Option<Self> {
        self.0.checked_add(other.0).map(Self)
    }

    pub fn saturating_add(self, other: Self) -> Self {
        Self(self.0.saturating_add(other.0))
    }

    pub fn parse(input: &str) -> Result<Self, ValidationFailure> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(ValidationFailure::Empty);
        }
        if trimmed.starts_with('-') {
            return Err(ValidationFailure::Negative(trimmed.to_string()));
        }

        let (whole, fraction) = match trimmed.split_once('.') {
            Some((whole, fraction)) => (whole, fraction),
            None => (trimmed, ""),
        };
        if whole.is_empty() && fraction.is_empty() {
            return Err(ValidationFailure::Malformed(trimmed.to_string()));
        }
        if !whole.chars().all(|c| c.is_ascii_digit())
            || !fraction.chars().all(|c| c.is_ascii_digit())
        {
            return Err(ValidationFailure::Malformed(trimmed.to_string()));
        }
        if fraction.len() > DECIMALS {
            return Err(ValidationFailure::TooPrecise {
                input: trimmed.to_string(),
                max_decimals: DECIMALS,
            });
        }

        let overflow = || ValidationFailure::Overflow(trimmed.to_string());
        let whole = if whole.is_empty() {
            U256::zero()
        } else {
            U256::from_dec_str(whole).map_err(|_| overflow())?
        };
        let padded = format!("{fraction:0<width$}", width = DECIMALS);
        let fraction = U256::from_dec_str(&padded).map_err(|_| overflow())?;

        whole
            .checked_mul(scale())
            .and_then(|scaled| scaled.checked_add(fraction))
            .map(Self)
            .ok_or_else(overflow)
    }

    /// Formats with exactly `places` decimals, rounding half up.
    pub fn to_fixed(&self, places: usize) -> String {
        let places = places.min(DECIMALS);
        let divisor = U256::exp10(DECIMALS - places);
        let half = divisor / 2;
        let rounded = if divisor > U256::one() {
            self.0.saturating_add(half) / divisor
        } else {
            self.0
        };

        if places == 0 {
            return rounded.to_string();
        }
        let unit = U256::exp10(places);
        let whole = rounded / unit;
        let fraction = rounded % unit;
        format!("{whole}.{:0>width$}", fraction.to_string(), width = places)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let whole = self.0 / scale();
        let fraction = format!("{:0>width$}", (self.0 % scale()).to_string(), width = DECIMALS);
        let fraction = fraction.trim_end_matches('0');
        if fraction.is_empty() {
            write!(f, "{whole}.0")
        } else {
            write!(f, "{whole}.{fraction}")
        }
    }
}

impl FromStr for Amount {
    type Err = ValidationFailure;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl std::iter::Sum for Amount {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Self::saturating_add)
    }
}

impl Serialize for Amount {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}
