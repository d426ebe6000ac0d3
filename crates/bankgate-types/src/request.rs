//! Inbound send request bodies

use bankgate_math::Coins;
use serde::{Deserialize, Serialize};

/// Signing parameters and local identity shared by every transaction request
#[derive(Clone, Deserialize, Serialize)]
pub struct BaseTx {
    #[serde(with = "u64_string")]
    pub gas: u64,
    #[serde(default)]
    pub fees: Coins,
    pub chain_id: String,
    #[serde(with = "u64_string")]
    pub account_number: u64,
    #[serde(with = "u64_string")]
    pub sequence: u64,
    pub local_account_name: String,
    pub password: String,
    #[serde(default)]
    pub memo: String,
}

// Keep the password out of logs
impl std::fmt::Debug for BaseTx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BaseTx")
            .field("gas", &self.gas)
            .field("fees", &self.fees)
            .field("chain_id", &self.chain_id)
            .field("account_number", &self.account_number)
            .field("sequence", &self.sequence)
            .field("local_account_name", &self.local_account_name)
            .field("password", &"<redacted>")
            .field("memo", &self.memo)
            .finish()
    }
}

/// Body of a send-coins request
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct SendRequest {
    pub amount: Coins,
    pub base_tx: BaseTx,
}

/// `u64` fields that clients send either as JSON numbers or decimal strings.
/// Serialized as strings.
pub mod u64_string {
    use serde::de::{self, Visitor};
    use serde::{Deserializer, Serializer};
    use std::fmt;

    pub fn serialize<S: Serializer>(value: &u64, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(value)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
        struct U64Visitor;

        impl<'de> Visitor<'de> for U64Visitor {
            type Value = u64;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a non-negative integer or decimal string")
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<u64, E> {
                Ok(v)
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<u64, E> {
                u64::try_from(v).map_err(|_| E::custom(format!("negative value: {v}")))
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<u64, E> {
                v.parse().map_err(E::custom)
            }
        }

        deserializer.deserialize_any(U64Visitor)
    }
}
