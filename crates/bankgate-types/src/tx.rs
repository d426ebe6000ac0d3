//! Fee and sign document types

use crate::msgs::Msg;
use bankgate_math::Coins;
use serde::{Deserialize, Serialize};

/// Fee paid by a transaction and the gas it may consume
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StdFee {
    pub amount: Coins,
    #[serde(with = "crate::request::u64_string")]
    pub gas: u64,
}

impl StdFee {
    pub fn new(amount: Coins, gas: u64) -> Self {
        Self { amount, gas }
    }
}

/// Everything a signer commits to: the messages plus the signing context.
///
/// Also returned unsigned to callers that only want the transaction generated.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StdSignMsg {
    pub chain_id: String,
    #[serde(with = "crate::request::u64_string")]
    pub account_number: u64,
    #[serde(with = "crate::request::u64_string")]
    pub sequence: u64,
    pub fee: StdFee,
    pub msgs: Vec<Msg>,
    #[serde(default)]
    pub memo: String,
}
