//! Coin and Coins types for handling tokens

use crate::int::Int;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoinError {
    #[error("invalid denomination:: {0}")]
    InvalidDenom(String),

    #[error("invalid amount:: {0}")]
    InvalidAmount(String),

    #[error("negative amount not allowed")]
    NegativeAmount,

    #[error("duplicate denomination:: {0}")]
    DuplicateDenom(String),

    #[error("invalid coin expression:: {0}")]
    InvalidExpression(String),
}

/// A single coin with denomination and amount
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawCoin")]
pub struct Coin {
    pub denom: String,
    pub amount: Int,
}

#[derive(Deserialize)]
struct RawCoin {
    denom: String,
    amount: Int,
}

impl TryFrom<RawCoin> for Coin {
    type Error = CoinError;

    fn try_from(raw: RawCoin) -> Result<Self, Self::Error> {
        Coin::new(raw.denom, raw.amount)
    }
}

impl Coin {
    /// Create a new coin, validating denomination and amount
    pub fn new(denom: impl Into<String>, amount: Int) -> Result<Self, CoinError> {
        let denom = denom.into();
        if !is_valid_denom(&denom) {
            return Err(CoinError::InvalidDenom(denom));
        }

        if amount.is_negative() {
            return Err(CoinError::NegativeAmount);
        }

        Ok(Self { denom, amount })
    }

    /// Check if coin is zero
    pub fn is_zero(&self) -> bool {
        self.amount.is_zero()
    }
}

impl fmt::Display for Coin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.amount, self.denom)
    }
}

impl FromStr for Coin {
    type Err = CoinError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_coin(s)
    }
}

/// A collection of coins, always sorted by denomination with zero coins removed
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Coin>", into = "Vec<Coin>")]
pub struct Coins(Vec<Coin>);

impl Coins {
    /// Create a new Coins collection from a vector of coins.
    /// Enforces sorting by denomination and no duplicates
    pub fn new(mut coins: Vec<Coin>) -> Result<Self, CoinError> {
        coins.retain(|c| !c.is_zero());

        coins.sort_by(|a, b| a.denom.cmp(&b.denom));

        for window in coins.windows(2) {
            if window[0].denom == window[1].denom {
                return Err(CoinError::DuplicateDenom(window[0].denom.clone()));
            }
        }

        Ok(Self(coins))
    }

    /// Create an empty Coins collection
    pub fn empty() -> Self {
        Self(Vec::new())
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of distinct denominations
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Get coins as slice
    pub fn as_slice(&self) -> &[Coin] {
        &self.0
    }

    /// Iterate coins in denomination order
    pub fn iter(&self) -> std::slice::Iter<'_, Coin> {
        self.0.iter()
    }

    /// True when every coin has a strictly positive amount and the set is non-empty
    pub fn is_all_positive(&self) -> bool {
        !self.0.is_empty() && self.0.iter().all(|c| c.amount.is_positive())
    }
}

impl TryFrom<Vec<Coin>> for Coins {
    type Error = CoinError;

    fn try_from(coins: Vec<Coin>) -> Result<Self, Self::Error> {
        Coins::new(coins)
    }
}

impl From<Coins> for Vec<Coin> {
    fn from(coins: Coins) -> Self {
        coins.0
    }
}

impl fmt::Display for Coins {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s: Vec<String> = self.0.iter().map(|c| c.to_string()).collect();
        write!(f, "{}", s.join(","))
    }
}

impl FromStr for Coins {
    type Err = CoinError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_coins(s)
    }
}

/// Parse a single coin expression such as `"10stake"` or `"10 stake"`
pub fn parse_coin(expr: &str) -> Result<Coin, CoinError> {
    let expr = expr.trim();
    let split_pos = expr
        .find(|c: char| !c.is_ascii_digit())
        .ok_or_else(|| CoinError::InvalidExpression(expr.to_string()))?;

    let (amount_str, denom) = expr.split_at(split_pos);
    if amount_str.is_empty() {
        return Err(CoinError::InvalidExpression(expr.to_string()));
    }

    let amount = amount_str
        .parse::<Int>()
        .map_err(|e| CoinError::InvalidAmount(format!("{amount_str}: {e}")))?;

    Coin::new(denom.trim_start(), amount)
}

/// Parse a comma separated list of coins into a validated, sorted set.
///
/// The empty string yields an empty set, so `parse_coins(&coins.to_string())`
/// returns `coins` for every valid set.
pub fn parse_coins(text: &str) -> Result<Coins, CoinError> {
    let text = text.trim();
    if text.is_empty() {
        return Ok(Coins::empty());
    }

    let coins = text
        .split(',')
        .map(parse_coin)
        .collect::<Result<Vec<_>, _>>()?;

    Coins::new(coins)
}

/// Validate denomination format
fn is_valid_denom(denom: &str) -> bool {
    if denom.is_empty() || denom.len() > 127 {
        return false;
    }

    let mut chars = denom.chars();
    if !chars.next().is_some_and(|c| c.is_ascii_alphabetic()) {
        return false;
    }

    chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '/' | ':' | '.' | '_' | '-'))
}
