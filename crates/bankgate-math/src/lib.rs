//! Arbitrary precision integers and coin amounts for bankgate
//!
//! [`Coins`] is the canonical amount set carried by transfer messages and
//! fees; [`parse_coins`] turns its textual form back into a validated set.

pub mod coin;
pub mod int;

pub use coin::{parse_coin, parse_coins, Coin, CoinError, Coins};
pub use int::Int;
