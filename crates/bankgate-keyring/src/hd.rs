//! BIP32/BIP44 hierarchical deterministic derivation
//!
//! Keys imported or created from a mnemonic are derived along the standard
//! Cosmos path `m/44'/118'/0'/0/0`.

use crate::KeyringError;
use bankgate_crypto::PrivateKey;
use bip39::{Language, Mnemonic};
use hmac::{Hmac, Mac};
use k256::ecdsa::SigningKey as Secp256k1PrivKey;
use k256::elliptic_curve::PrimeField;
use k256::{FieldBytes, NonZeroScalar, Scalar};
use rand::RngCore;
use sha2::Sha512;
use zeroize::Zeroize;

type HmacSha512 = Hmac<Sha512>;

/// SLIP-0044 coin type registered for Cosmos
pub const COSMOS_COIN_TYPE: u32 = 118;

/// Standard Cosmos HD derivation path
pub const COSMOS_HD_PATH: &str = "m/44'/118'/0'/0/0";

const HARDENED_OFFSET: u32 = 1 << 31;

/// A parsed derivation path such as `m/44'/118'/0'/0/0`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DerivationPath {
    indices: Vec<u32>,
}

impl DerivationPath {
    pub fn parse(path: &str) -> Result<Self, KeyringError> {
        let rest = path
            .strip_prefix("m/")
            .or_else(|| path.strip_prefix("M/"))
            .ok_or_else(|| {
                KeyringError::BackendError(format!("derivation path must start with m/: {path}"))
            })?;

        let mut indices = Vec::new();
        for component in rest.split('/').filter(|c| !c.is_empty()) {
            let (digits, hardened) = match component
                .strip_suffix('\'')
                .or_else(|| component.strip_suffix('h'))
            {
                Some(digits) => (digits, true),
                None => (component, false),
            };

            let index = digits.parse::<u32>().map_err(|_| {
                KeyringError::BackendError(format!("invalid path component: {component}"))
            })?;
            if index >= HARDENED_OFFSET {
                return Err(KeyringError::BackendError(format!(
                    "path index out of range: {component}"
                )));
            }

            indices.push(if hardened {
                index + HARDENED_OFFSET
            } else {
                index
            });
        }

        Ok(DerivationPath { indices })
    }

    /// `m/44'/118'/{account}'/0/{address_index}`
    pub fn cosmos(account: u32, address_index: u32) -> Self {
        DerivationPath {
            indices: vec![
                44 + HARDENED_OFFSET,
                COSMOS_COIN_TYPE + HARDENED_OFFSET,
                account | HARDENED_OFFSET,
                0,
                address_index & !HARDENED_OFFSET,
            ],
        }
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }
}

impl Default for DerivationPath {
    fn default() -> Self {
        DerivationPath::cosmos(0, 0)
    }
}

/// Secret key plus chain code at some node of the HD tree
#[derive(Clone)]
pub struct ExtendedPrivateKey {
    secret: [u8; 32],
    chain_code: [u8; 32],
    depth: u8,
}

impl Drop for ExtendedPrivateKey {
    fn drop(&mut self) {
        self.secret.zeroize();
        self.chain_code.zeroize();
    }
}

impl ExtendedPrivateKey {
    /// Master node from a BIP39 seed
    pub fn from_seed(seed: &[u8]) -> Result<Self, KeyringError> {
        if !(16..=64).contains(&seed.len()) {
            return Err(KeyringError::BackendError(
                "seed must be between 16 and 64 bytes".to_string(),
            ));
        }

        let mut mac = HmacSha512::new_from_slice(b"Bitcoin seed")
            .map_err(|e| KeyringError::BackendError(e.to_string()))?;
        mac.update(seed);
        let (secret, chain_code) = split_output(&mac.finalize().into_bytes());

        // Reject IL == 0 or IL >= n
        Secp256k1PrivKey::from_slice(&secret).map_err(|_| {
            KeyringError::BackendError("seed produced an invalid master key".to_string())
        })?;

        Ok(ExtendedPrivateKey {
            secret,
            chain_code,
            depth: 0,
        })
    }

    pub fn derive_child(&self, index: u32) -> Result<Self, KeyringError> {
        let parent = Secp256k1PrivKey::from_slice(&self.secret)
            .map_err(|e| KeyringError::BackendError(format!("invalid parent key: {e}")))?;

        let mut mac = HmacSha512::new_from_slice(&self.chain_code)
            .map_err(|e| KeyringError::BackendError(e.to_string()))?;
        if index >= HARDENED_OFFSET {
            mac.update(&[0u8]);
            mac.update(&self.secret);
        } else {
            mac.update(parent.verifying_key().to_encoded_point(true).as_bytes());
        }
        mac.update(&index.to_be_bytes());
        let (mut tweak, chain_code) = split_output(&mac.finalize().into_bytes());

        let tweak_scalar = Option::<Scalar>::from(Scalar::from_repr(FieldBytes::clone_from_slice(
            &tweak,
        )));
        tweak.zeroize();
        let tweak_scalar = tweak_scalar.ok_or_else(|| {
            KeyringError::BackendError(format!("derivation tweak out of range at index {index}"))
        })?;

        let child = NonZeroScalar::new(*parent.as_nonzero_scalar().as_ref() + tweak_scalar);
        let child = Option::<NonZeroScalar>::from(child).ok_or_else(|| {
            KeyringError::BackendError(format!("derived a zero key at index {index}"))
        })?;

        let mut secret = [0u8; 32];
        secret.copy_from_slice(&child.to_repr());

        Ok(ExtendedPrivateKey {
            secret,
            chain_code,
            depth: self.depth.saturating_add(1),
        })
    }

    pub fn derive_path(&self, path: &DerivationPath) -> Result<Self, KeyringError> {
        path.indices()
            .iter()
            .try_fold(self.clone(), |key, index| key.derive_child(*index))
    }

    pub fn depth(&self) -> u8 {
        self.depth
    }

    pub fn private_key(&self) -> Result<PrivateKey, KeyringError> {
        let key = Secp256k1PrivKey::from_slice(&self.secret)
            .map_err(|e| KeyringError::BackendError(format!("invalid derived key: {e}")))?;
        Ok(PrivateKey::Secp256k1(key))
    }
}

fn split_output(output: &[u8]) -> ([u8; 32], [u8; 32]) {
    let mut left = [0u8; 32];
    let mut right = [0u8; 32];
    left.copy_from_slice(&output[..32]);
    right.copy_from_slice(&output[32..64]);
    (left, right)
}

/// Derive the signing key for `mnemonic` (empty BIP39 passphrase)
pub fn derive_private_key_from_mnemonic(
    mnemonic: &str,
    path: &DerivationPath,
) -> Result<PrivateKey, KeyringError> {
    let mnemonic =
        Mnemonic::parse_in(Language::English, mnemonic).map_err(|_| KeyringError::InvalidMnemonic)?;
    let mut seed = mnemonic.to_seed("");
    let master = ExtendedPrivateKey::from_seed(&seed);
    seed.zeroize();
    master?.derive_path(path)?.private_key()
}

/// Fresh 24-word English mnemonic
pub fn generate_mnemonic() -> Result<Mnemonic, KeyringError> {
    let mut entropy = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut entropy);
    let mnemonic = Mnemonic::from_entropy_in(Language::English, &entropy)
        .map_err(|e| KeyringError::BackendError(format!("failed to generate mnemonic: {e}")));
    entropy.zeroize();
    mnemonic
}

pub fn validate_mnemonic(mnemonic: &str) -> Result<(), KeyringError> {
    Mnemonic::parse_in(Language::English, mnemonic)
        .map(|_| ())
        .map_err(|_| KeyringError::InvalidMnemonic)
}

#[cfg(test)]
mod tests {
    use super::*;

    const ABANDON: &str = "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";

    #[test]
    fn test_parse_cosmos_path() {
        let path = DerivationPath::parse(COSMOS_HD_PATH).unwrap();
        assert_eq!(
            path.indices(),
            &[44 + HARDENED_OFFSET, 118 + HARDENED_OFFSET, HARDENED_OFFSET, 0, 0]
        );
        assert_eq!(path, DerivationPath::default());
        assert_eq!(DerivationPath::parse("m/44h/118h/0h/0/0").unwrap(), path);
    }

    #[test]
    fn test_parse_rejects_malformed_paths() {
        assert!(DerivationPath::parse("44'/118'/0'/0/0").is_err());
        assert!(DerivationPath::parse("m/44'/abc'/0'").is_err());
        assert!(DerivationPath::parse("m/2147483648").is_err());
    }

    #[test]
    fn test_seed_length_bounds() {
        assert!(ExtendedPrivateKey::from_seed(&[7u8; 15]).is_err());
        assert!(ExtendedPrivateKey::from_seed(&[7u8; 65]).is_err());
        assert_eq!(ExtendedPrivateKey::from_seed(&[7u8; 32]).unwrap().depth(), 0);
    }

    #[test]
    fn test_hardened_and_normal_children_differ() {
        let master = ExtendedPrivateKey::from_seed(&[1u8; 64]).unwrap();
        let hardened = master.derive_child(HARDENED_OFFSET).unwrap();
        let normal = master.derive_child(0).unwrap();
        assert_eq!(hardened.depth(), 1);
        assert_ne!(
            hardened.private_key().unwrap().to_bytes(),
            normal.private_key().unwrap().to_bytes()
        );
    }

    #[test]
    fn test_known_cosmos_address() {
        // Widely published address for the all-"abandon" test mnemonic
        let key = derive_private_key_from_mnemonic(ABANDON, &DerivationPath::default()).unwrap();
        let address = key.public_key().to_address().to_bech32("cosmos").unwrap();
        assert_eq!(address, "cosmos19rl4cm2hmr8afy4kldpxz3fka4jguq0auqdal4");
    }

    #[test]
    fn test_account_index_changes_key() {
        let first =
            derive_private_key_from_mnemonic(ABANDON, &DerivationPath::cosmos(0, 0)).unwrap();
        let second =
            derive_private_key_from_mnemonic(ABANDON, &DerivationPath::cosmos(1, 0)).unwrap();
        assert_ne!(first.to_bytes(), second.to_bytes());
    }

    #[test]
    fn test_generated_mnemonic_is_valid() {
        let mnemonic = generate_mnemonic().unwrap().to_string();
        assert_eq!(mnemonic.split_whitespace().count(), 24);
        validate_mnemonic(&mnemonic).unwrap();
    }

    #[test]
    fn test_invalid_mnemonics() {
        let bad_checksum = ABANDON.replace("about", "abandon");
        assert!(matches!(
            validate_mnemonic(&bad_checksum),
            Err(KeyringError::InvalidMnemonic)
        ));
        assert!(
            derive_private_key_from_mnemonic("not a mnemonic", &DerivationPath::default()).is_err()
        );
    }
}
