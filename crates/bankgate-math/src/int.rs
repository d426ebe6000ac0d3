//! Arbitrary precision integer type

use num_bigint::BigInt;
use num_traits::{Signed, Zero};
use serde::de::{self, Visitor};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Arbitrary precision signed integer
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Int(BigInt);

// Always emitted as a decimal string so amounts above 2^53 survive JSON
impl Serialize for Int {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0.to_string())
    }
}

struct IntVisitor;

impl<'de> Visitor<'de> for IntVisitor {
    type Value = Int;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("an integer or a decimal integer string")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Int, E> {
        Int::from_str(v).map_err(E::custom)
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Int, E> {
        Ok(Int::from_u64(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Int, E> {
        Ok(Int::from_i64(v))
    }
}

impl<'de> Deserialize<'de> for Int {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        deserializer.deserialize_any(IntVisitor)
    }
}

impl Int {
    /// Create a new Int from i64
    pub fn from_i64(n: i64) -> Self {
        Self(BigInt::from(n))
    }

    /// Create a new Int from u64
    pub fn from_u64(n: u64) -> Self {
        Self(BigInt::from(n))
    }

    /// Check if zero
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Check if negative
    pub fn is_negative(&self) -> bool {
        self.0.is_negative()
    }

    /// Check if positive
    pub fn is_positive(&self) -> bool {
        self.0.is_positive()
    }
}

impl FromStr for Int {
    type Err = num_bigint::ParseBigIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(BigInt::from_str(s)?))
    }
}

impl fmt::Display for Int {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
