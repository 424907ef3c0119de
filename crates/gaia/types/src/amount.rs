//! Stake and resource quantities
//!
//! Voting weight is an unsigned magnitude. Allocation amounts are decimal
//! quantities that oracles may resolve to fractional values, so they are
//! f64-backed but can only be constructed finite and non-negative.

use crate::{CoordinatorError, CoordinatorResult};
use serde::{Deserialize, Serialize};

/// Voting stake committed by a voter
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct Stake(pub u64);

impl Stake {
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn zero() -> Self {
        Self(0)
    }

    pub fn saturating_add(self, other: Self) -> Self {
        Self(self.0.saturating_add(other.0))
    }

    pub fn saturating_sub(self, other: Self) -> Self {
        Self(self.0.saturating_sub(other.0))
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl std::fmt::Display for Stake {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::iter::Sum for Stake {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Stake::zero(), Stake::saturating_add)
    }
}

/// Resource quantity held by an allocation owner
///
/// Always finite and non-negative. Deserialization goes through the same
/// validation as [`Quantity::new`].
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd, Serialize, Deserialize, Default)]
#[serde(try_from = "f64", into = "f64")]
pub struct Quantity(f64);

impl Quantity {
    /// Validate a raw amount
    pub fn new(value: f64) -> CoordinatorResult<Self> {
        if !value.is_finite() {
            return Err(CoordinatorError::InvalidInput(format!(
                "amount must be finite, got {}",
                value
            )));
        }
        if value < 0.0 {
            return Err(CoordinatorError::InvalidInput(format!(
                "amount must be non-negative, got {}",
                value
            )));
        }
        // Normalizes -0.0
        Ok(Self(value + 0.0))
    }

    pub fn zero() -> Self {
        Self(0.0)
    }

    pub fn value(&self) -> f64 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0.0
    }

    /// Add two quantities, failing if the sum leaves the finite range
    pub fn checked_add(self, other: Self) -> CoordinatorResult<Self> {
        Self::new(self.0 + other.0)
    }
}

impl TryFrom<f64> for Quantity {
    type Error = CoordinatorError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Quantity> for f64 {
    fn from(quantity: Quantity) -> Self {
        quantity.0
    }
}

impl std::fmt::Display for Quantity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
