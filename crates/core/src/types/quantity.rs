//! Bounded positive integers: ingredient amounts and cooking times.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Error returned when a quantity falls outside its allowed range.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuantityError {
    #[error("ensure this value is greater than or equal to {min}")]
    TooSmall { min: u32 },
    #[error("ensure this value is less than or equal to {max}")]
    TooLarge { max: u32 },
}

fn check_range(value: i64, min: u32, max: u32) -> Result<u32, QuantityError> {
    if value < i64::from(min) {
        return Err(QuantityError::TooSmall { min });
    }
    u32::try_from(value)
        .ok()
        .filter(|v| *v <= max)
        .ok_or(QuantityError::TooLarge { max })
}

/// Quantity of one ingredient in a recipe, in that ingredient's unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct Amount(u32);

impl Amount {
    pub const MIN: u32 = 1;
    pub const MAX: u32 = 32_767;

    /// Validate a raw amount.
    ///
    /// # Errors
    ///
    /// Returns [`QuantityError`] if `value` is below [`Self::MIN`] or above [`Self::MAX`].
    pub fn new(value: i64) -> Result<Self, QuantityError> {
        check_range(value, Self::MIN, Self::MAX).map(Self)
    }

    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }

    /// The amount as a database integer.
    #[must_use]
    #[allow(clippy::cast_possible_wrap)] // MAX fits in i32
    pub const fn as_i32(self) -> i32 {
        self.0 as i32
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = i64::deserialize(deserializer)?;
        Self::new(raw).map_err(serde::de::Error::custom)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Recipe cooking time in minutes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct CookingTime(u32);

impl CookingTime {
    pub const MIN: u32 = 1;
    pub const MAX: u32 = 32_767;

    /// Validate a raw cooking time in minutes.
    ///
    /// # Errors
    ///
    /// Returns [`QuantityError`] if `minutes` is below [`Self::MIN`] or above [`Self::MAX`].
    pub fn new(minutes: i64) -> Result<Self, QuantityError> {
        check_range(minutes, Self::MIN, Self::MAX).map(Self)
    }

    #[must_use]
    pub const fn minutes(self) -> u32 {
        self.0
    }

    /// The cooking time as a database integer.
    #[must_use]
    #[allow(clippy::cast_possible_wrap)] // MAX fits in i32
    pub const fn as_i32(self) -> i32 {
        self.0 as i32
    }
}

impl<'de> Deserialize<'de> for CookingTime {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = i64::deserialize(deserializer)?;
        Self::new(raw).map_err(serde::de::Error::custom)
    }
}

impl fmt::Display for CookingTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
