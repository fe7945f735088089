use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, Neg, Sub};

/// A credit amount with exactly two decimal places, stored as an integer
/// number of hundredths. Service definitions allow half-credit pricing, so
/// amounts are fractional but must never accumulate float drift.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, sqlx::Type)]
#[sqlx(transparent)]
pub struct Credits(i64);

impl Credits {
    pub const ZERO: Credits = Credits(0);

    pub fn from_hundredths(raw: i64) -> Self {
        Credits(raw)
    }

    pub fn hundredths(self) -> i64 {
        self.0
    }

    /// Rejects amounts with more than two decimal places rather than
    /// rounding them silently.
    pub fn try_from_decimal(value: Decimal) -> Option<Self> {
        let scaled = value * Decimal::from(100);
        if scaled.fract() != Decimal::ZERO {
            return None;
        }
        scaled.to_i64().map(Credits)
    }

    pub fn to_decimal(self) -> Decimal {
        Decimal::new(self.0, 2)
    }

    pub fn is_negative(self) -> bool {
        self.0 < 0
    }
}

impl Add for Credits {
    type Output = Credits;
    fn add(self, rhs: Credits) -> Credits {
        Credits(self.0 + rhs.0)
    }
}

impl Sub for Credits {
    type Output = Credits;
    fn sub(self, rhs: Credits) -> Credits {
        Credits(self.0 - rhs.0)
    }
}

impl Neg for Credits {
    type Output = Credits;
    fn neg(self) -> Credits {
        Credits(-self.0)
    }
}

impl Sum for Credits {
    fn sum<I: Iterator<Item = Credits>>(iter: I) -> Credits {
        Credits(iter.map(|c| c.0).sum())
    }
}

impl fmt::Display for Credits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_decimal())
    }
}

impl Serialize for Credits {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        // UFCS: Decimal has inherent serialize/deserialize methods for raw
        // byte arrays that would otherwise shadow the serde trait methods.
        serde::Serialize::serialize(&self.to_decimal(), serializer)
    }
}

impl<'de> Deserialize<'de> for Credits {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = <Decimal as serde::Deserialize>::deserialize(deserializer)?;
        Credits::try_from_decimal(value)
            .ok_or_else(|| serde::de::Error::custom("credit amounts are limited to 2 decimal places"))
    }
}
