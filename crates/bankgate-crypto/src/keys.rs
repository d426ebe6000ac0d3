//! Key representations using static enum dispatch

use base64::{engine::general_purpose, Engine as _};
use bankgate_types::address::AccAddress;
use ed25519_dalek::{SigningKey as Ed25519PrivKey, VerifyingKey as Ed25519PubKey};
use k256::ecdsa::{SigningKey as Secp256k1PrivKey, VerifyingKey as Secp256k1PubKey};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Supported key algorithms
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyType {
    Secp256k1,
    Ed25519,
}

impl fmt::Display for KeyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyType::Secp256k1 => f.write_str("secp256k1"),
            KeyType::Ed25519 => f.write_str("ed25519"),
        }
    }
}

impl FromStr for KeyType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "secp256k1" => Ok(KeyType::Secp256k1),
            "ed25519" => Ok(KeyType::Ed25519),
            other => Err(format!("unknown key type: {other}")),
        }
    }
}

/// All supported public key types
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PublicKey {
    Secp256k1(Secp256k1PubKey),
    Ed25519(Ed25519PubKey),
}

/// All supported private key types
#[derive(Clone)]
pub enum PrivateKey {
    Secp256k1(Secp256k1PrivKey),
    Ed25519(Ed25519PrivKey),
}

// Never print key material
impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PrivateKey({})", self.key_type())
    }
}

impl PublicKey {
    /// Derive address from public key
    pub fn to_address(&self) -> AccAddress {
        AccAddress::from_pubkey(&self.to_bytes())
    }

    /// Amino type name of this key
    pub fn type_name(&self) -> &'static str {
        match self {
            PublicKey::Secp256k1(_) => "tendermint/PubKeySecp256k1",
            PublicKey::Ed25519(_) => "tendermint/PubKeyEd25519",
        }
    }

    pub fn key_type(&self) -> KeyType {
        match self {
            PublicKey::Secp256k1(_) => KeyType::Secp256k1,
            PublicKey::Ed25519(_) => KeyType::Ed25519,
        }
    }

    /// Raw bytes: compressed SEC1 point for secp256k1, 32 bytes for ed25519
    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            PublicKey::Secp256k1(key) => key.to_encoded_point(true).as_bytes().to_vec(),
            PublicKey::Ed25519(key) => key.as_bytes().to_vec(),
        }
    }

    /// Rebuild a key from its amino type name and raw bytes
    pub fn from_type_and_bytes(type_name: &str, value: &[u8]) -> Result<Self, String> {
        match type_name {
            "tendermint/PubKeySecp256k1" => {
                let key = Secp256k1PubKey::from_sec1_bytes(value).map_err(|e| e.to_string())?;
                Ok(PublicKey::Secp256k1(key))
            }
            "tendermint/PubKeyEd25519" => {
                let bytes: &[u8; 32] = value
                    .try_into()
                    .map_err(|_| "invalid ed25519 key length".to_string())?;
                let key = Ed25519PubKey::from_bytes(bytes).map_err(|e| e.to_string())?;
                Ok(PublicKey::Ed25519(key))
            }
            _ => Err(format!("unknown public key type: {type_name}")),
        }
    }
}

impl PrivateKey {
    /// Generate a fresh random key
    pub fn generate(key_type: KeyType) -> Self {
        match key_type {
            KeyType::Secp256k1 => {
                PrivateKey::Secp256k1(Secp256k1PrivKey::random(&mut rand::rngs::OsRng))
            }
            KeyType::Ed25519 => {
                PrivateKey::Ed25519(Ed25519PrivKey::from_bytes(&rand::random::<[u8; 32]>()))
            }
        }
    }

    /// Rebuild a key from its 32 secret bytes
    pub fn from_bytes(key_type: KeyType, bytes: &[u8]) -> Result<Self, String> {
        match key_type {
            KeyType::Secp256k1 => Secp256k1PrivKey::from_slice(bytes)
                .map(PrivateKey::Secp256k1)
                .map_err(|e| format!("invalid secp256k1 key: {e}")),
            KeyType::Ed25519 => {
                let bytes: &[u8; 32] = bytes
                    .try_into()
                    .map_err(|_| "invalid ed25519 key length".to_string())?;
                Ok(PrivateKey::Ed25519(Ed25519PrivKey::from_bytes(bytes)))
            }
        }
    }

    /// Secret scalar bytes
    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            PrivateKey::Secp256k1(key) => key.to_bytes().to_vec(),
            PrivateKey::Ed25519(key) => key.to_bytes().to_vec(),
        }
    }

    pub fn key_type(&self) -> KeyType {
        match self {
            PrivateKey::Secp256k1(_) => KeyType::Secp256k1,
            PrivateKey::Ed25519(_) => KeyType::Ed25519,
        }
    }

    /// Get the corresponding public key
    pub fn public_key(&self) -> PublicKey {
        match self {
            PrivateKey::Secp256k1(key) => PublicKey::Secp256k1(*key.verifying_key()),
            PrivateKey::Ed25519(key) => PublicKey::Ed25519(key.verifying_key()),
        }
    }
}

#[derive(Serialize, Deserialize)]
struct PublicKeyData {
    #[serde(rename = "type")]
    key_type: String,
    value: String,
}

// Serialized as {"type": <amino name>, "value": <base64 bytes>}
impl Serialize for PublicKey {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        PublicKeyData {
            key_type: self.type_name().to_string(),
            value: general_purpose::STANDARD.encode(self.to_bytes()),
        }
        .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for PublicKey {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let data = PublicKeyData::deserialize(deserializer)?;
        let bytes = general_purpose::STANDARD
            .decode(&data.value)
            .map_err(serde::de::Error::custom)?;

        PublicKey::from_type_and_bytes(&data.key_type, &bytes).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secp256k1_address_uses_compressed_key() {
        let key = PrivateKey::generate(KeyType::Secp256k1);
        let pubkey = key.public_key();
        assert_eq!(pubkey.to_bytes().len(), 33);
        assert_eq!(
            pubkey.to_address(),
            AccAddress::from_pubkey(&pubkey.to_bytes())
        );
    }

    #[test]
    fn test_private_key_bytes_round_trip() {
        for key_type in [KeyType::Secp256k1, KeyType::Ed25519] {
            let key = PrivateKey::generate(key_type);
            let restored = PrivateKey::from_bytes(key_type, &key.to_bytes()).unwrap();
            assert_eq!(restored.public_key(), key.public_key());
        }
    }

    #[test]
    fn test_public_key_json() {
        let pubkey = PrivateKey::generate(KeyType::Secp256k1).public_key();
        let json = serde_json::to_value(&pubkey).unwrap();
        assert_eq!(json["type"], "tendermint/PubKeySecp256k1");

        let back: PublicKey = serde_json::from_value(json).unwrap();
        assert_eq!(back, pubkey);
    }

    #[test]
    fn test_debug_hides_secret() {
        let key = PrivateKey::generate(KeyType::Ed25519);
        assert_eq!(format!("{key:?}"), "PrivateKey(ed25519)");
    }

    #[test]
    fn test_key_type_parsing() {
        assert_eq!("secp256k1".parse::<KeyType>(), Ok(KeyType::Secp256k1));
        assert!("rsa".parse::<KeyType>().is_err());
    }
}
