//! Signed transaction types

use bankgate_crypto::PublicKey;
use bankgate_types::request::u64_string;
use bankgate_types::{Msg, StdFee};
use serde::{Deserialize, Serialize};

/// One signer's signature over a `StdSignMsg`
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StdSignature {
    pub pub_key: PublicKey,
    #[serde(with = "base64_bytes")]
    pub signature: Vec<u8>,
    #[serde(with = "u64_string")]
    pub account_number: u64,
    #[serde(with = "u64_string")]
    pub sequence: u64,
}

/// A signed transaction, ready to hand to a node
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StdTx {
    pub msg: Vec<Msg>,
    pub fee: StdFee,
    pub signatures: Vec<StdSignature>,
    #[serde(default)]
    pub memo: String,
}

mod base64_bytes {
    use base64::{engine::general_purpose, Engine as _};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&general_purpose::STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(deserializer)?;
        general_purpose::STANDARD
            .decode(s)
            .map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bankgate_crypto::{KeyType, PrivateKey};
    use bankgate_math::parse_coins;
    use bankgate_types::msgs::bank::build_msg;
    use bankgate_types::AccAddress;

    #[test]
    fn test_std_tx_json_shape() {
        let key = PrivateKey::generate(KeyType::Secp256k1);
        let to = AccAddress::from_pubkey(&[9u8; 33]);
        let msg = build_msg(
            key.public_key().to_address(),
            to,
            parse_coins("10stake").unwrap(),
        );
        let tx = StdTx {
            msg: vec![msg.into()],
            fee: StdFee::new(parse_coins("1stake").unwrap(), 50_000),
            signatures: vec![StdSignature {
                pub_key: key.public_key(),
                signature: vec![0xab; 64],
                account_number: 7,
                sequence: 3,
            }],
            memo: String::new(),
        };

        let json = serde_json::to_value(&tx).unwrap();
        assert_eq!(json["msg"][0]["type"], "cosmos-sdk/Send");
        assert_eq!(json["signatures"][0]["account_number"], "7");
        assert_eq!(
            json["signatures"][0]["pub_key"]["type"],
            "tendermint/PubKeySecp256k1"
        );
        assert_eq!(json["signatures"][0]["signature"].as_str().unwrap().len(), 88);

        let back: StdTx = serde_json::from_value(json).unwrap();
        assert_eq!(back, tx);
    }
}
