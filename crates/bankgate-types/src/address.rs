//! Account addresses and their bech32 form

use bech32::primitives::decode::CheckedHrpstring;
use bech32::{Bech32, Hrp};
use ripemd::Ripemd160;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Human readable part used when none is configured
pub const DEFAULT_BECH32_PREFIX: &str = "cosmos";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AddressError {
    #[error("invalid bech32 address:: {0}")]
    Bech32(String),

    #[error("invalid human readable part:: {0}")]
    InvalidHrp(String),

    #[error("invalid address length:: expected 20 bytes, got {0}")]
    InvalidLength(usize),

    #[error("unexpected address prefix:: expected {expected}, got {actual}")]
    PrefixMismatch { expected: String, actual: String },

    #[error("empty address")]
    Empty,
}

/// Account address: 20 bytes plus the human readable part it is rendered with
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AccAddress {
    hrp: Hrp,
    bytes: [u8; 20],
}

impl AccAddress {
    /// Wrap raw address bytes under the default prefix
    pub fn from_bytes(bytes: [u8; 20]) -> Self {
        Self {
            hrp: Hrp::parse_unchecked(DEFAULT_BECH32_PREFIX),
            bytes,
        }
    }

    /// Derive an address from a public key: ripemd160(sha256(pubkey_bytes))
    pub fn from_pubkey(pubkey_bytes: &[u8]) -> Self {
        let sha256_hash = Sha256::digest(pubkey_bytes);
        let ripemd160_hash = Ripemd160::digest(sha256_hash);
        let mut bytes = [0u8; 20];
        bytes.copy_from_slice(&ripemd160_hash);
        Self::from_bytes(bytes)
    }

    /// Same account, rendered with another prefix
    pub fn with_prefix(self, hrp: &str) -> Result<Self, AddressError> {
        Ok(Self {
            hrp: parse_hrp(hrp)?,
            bytes: self.bytes,
        })
    }

    /// Human readable part this address is rendered with
    pub fn prefix(&self) -> &str {
        self.hrp.as_str()
    }

    /// Whether both addresses name the same account, whatever their prefixes
    pub fn same_account(&self, other: &AccAddress) -> bool {
        self.bytes == other.bytes
    }

    /// Convert to Bech32 string with the given prefix
    pub fn to_bech32(&self, hrp: &str) -> Result<String, AddressError> {
        encode(parse_hrp(hrp)?, &self.bytes)
    }

    /// Parse a Bech32 string; the address keeps the prefix it carried
    pub fn from_bech32(s: &str) -> Result<Self, AddressError> {
        if s.trim().is_empty() {
            return Err(AddressError::Empty);
        }

        let checked = CheckedHrpstring::new::<Bech32>(s)
            .map_err(|e| AddressError::Bech32(e.to_string()))?;
        let data: Vec<u8> = checked.byte_iter().collect();
        if data.len() != 20 {
            return Err(AddressError::InvalidLength(data.len()));
        }

        let mut bytes = [0u8; 20];
        bytes.copy_from_slice(&data);
        Ok(Self {
            hrp: parse_hrp(&checked.hrp().to_lowercase())?,
            bytes,
        })
    }

    /// Parse a Bech32 string that must carry `expected_prefix`
    pub fn from_bech32_with_prefix(s: &str, expected_prefix: &str) -> Result<Self, AddressError> {
        let addr = Self::from_bech32(s)?;
        if addr.prefix() != expected_prefix {
            return Err(AddressError::PrefixMismatch {
                expected: expected_prefix.to_string(),
                actual: addr.prefix().to_string(),
            });
        }
        Ok(addr)
    }

    /// Get the raw bytes
    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.bytes
    }
}

fn parse_hrp(hrp: &str) -> Result<Hrp, AddressError> {
    Hrp::parse(hrp).map_err(|e| AddressError::InvalidHrp(e.to_string()))
}

fn encode(hrp: Hrp, bytes: &[u8]) -> Result<String, AddressError> {
    bech32::encode::<Bech32>(hrp, bytes).map_err(|e| AddressError::Bech32(e.to_string()))
}

impl Default for AccAddress {
    fn default() -> Self {
        Self::from_bytes([0u8; 20])
    }
}

impl fmt::Display for AccAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let encoded = encode(self.hrp, &self.bytes).map_err(|_| fmt::Error)?;
        f.write_str(&encoded)
    }
}

impl fmt::Debug for AccAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AccAddress({self})")
    }
}

impl FromStr for AccAddress {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_bech32(s)
    }
}

impl Serialize for AccAddress {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for AccAddress {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_from_pubkey_is_deterministic() {
        let a = AccAddress::from_pubkey(&[1u8; 33]);
        let b = AccAddress::from_pubkey(&[1u8; 33]);
        let c = AccAddress::from_pubkey(&[2u8; 33]);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(matches!(
            AccAddress::from_bech32("not-a-valid-address"),
            Err(AddressError::Bech32(_))
        ));
        assert_eq!(AccAddress::from_bech32(""), Err(AddressError::Empty));
    }

    #[test]
    fn test_rejects_wrong_length() {
        let hrp = Hrp::parse("cosmos").unwrap();
        let short = bech32::encode::<Bech32>(hrp, &[7u8; 10]).unwrap();
        assert_eq!(
            AccAddress::from_bech32(&short),
            Err(AddressError::InvalidLength(10))
        );
    }

    #[test]
    fn test_rejects_corrupted_checksum() {
        let addr = AccAddress::from_bytes([9u8; 20]).to_string();
        let mut corrupted = addr.clone();
        let last = corrupted.pop().unwrap();
        corrupted.push(if last == 'q' { 'p' } else { 'q' });
        assert!(AccAddress::from_bech32(&corrupted).is_err());
    }

    #[test]
    fn test_prefix_check() {
        let addr = AccAddress::from_bytes([3u8; 20]);
        let iaa = addr.to_bech32("iaa").unwrap();
        assert_eq!(
            AccAddress::from_bech32_with_prefix(&iaa, "iaa"),
            addr.with_prefix("iaa")
        );
        assert!(matches!(
            AccAddress::from_bech32_with_prefix(&iaa, "cosmos"),
            Err(AddressError::PrefixMismatch { .. })
        ));
    }

    #[test]
    fn test_parsed_prefix_survives_serialization() {
        let iaa = AccAddress::from_bytes([6u8; 20]).to_bech32("iaa").unwrap();
        let addr: AccAddress = iaa.parse().unwrap();
        assert_eq!(addr.prefix(), "iaa");
        assert_eq!(addr.to_string(), iaa);
        assert_eq!(serde_json::to_string(&addr).unwrap(), format!("\"{iaa}\""));

        let cosmos = AccAddress::from_bytes([6u8; 20]);
        assert_ne!(addr, cosmos);
        assert!(addr.same_account(&cosmos));
        assert_eq!(cosmos.with_prefix("iaa").unwrap(), addr);
    }

    #[test]
    fn test_uppercase_input_is_normalized() {
        let lower = AccAddress::from_bytes([2u8; 20]).to_string();
        let addr = AccAddress::from_bech32(&lower.to_uppercase()).unwrap();
        assert_eq!(addr.prefix(), "cosmos");
        assert_eq!(addr.to_string(), lower);
    }

    #[test]
    fn test_serde_as_bech32_string() {
        let addr = AccAddress::from_bytes([5u8; 20]);
        let json = serde_json::to_string(&addr).unwrap();
        assert_eq!(json, format!("\"{addr}\""));
        let back: AccAddress = serde_json::from_str(&json).unwrap();
        assert_eq!(back, addr);
    }

    proptest! {
        #[test]
        fn prop_decode_encode_reproduces_input(
            bytes in any::<[u8; 20]>(),
            hrp in "[a-z]{1,10}",
        ) {
            let encoded = AccAddress::from_bytes(bytes).to_bech32(&hrp).unwrap();
            let addr = AccAddress::from_bech32(&encoded).unwrap();
            prop_assert_eq!(addr.prefix(), hrp.as_str());
            prop_assert_eq!(addr.to_string(), encoded);
        }
    }
}
