//! Key management for bankgate
//!
//! Named local identities, each protected by its own password. Public
//! information (public key, address) can be read without the password;
//! signing requires it.

use async_trait::async_trait;
use bankgate_crypto::PublicKey;
use bankgate_types::address::AccAddress;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod file;
pub mod hd;
pub mod memory;

pub use file::FileKeyring;
pub use memory::MemoryKeyring;

#[derive(Error, Debug)]
pub enum KeyringError {
    #[error("key not found:: {0}")]
    KeyNotFound(String),

    #[error("key already exists:: {0}")]
    KeyExists(String),

    #[error("invalid key name:: {0:?}")]
    InvalidName(String),

    #[error("wrong password for key:: {0}")]
    WrongPassword(String),

    #[error("invalid mnemonic")]
    InvalidMnemonic,

    #[error("backend error:: {0}")]
    BackendError(String),
}

impl KeyringError {
    /// Whether the failure is about the caller's credentials rather than the store
    pub fn is_auth(&self) -> bool {
        matches!(
            self,
            KeyringError::KeyNotFound(_)
                | KeyringError::WrongPassword(_)
                | KeyringError::InvalidName(_)
        )
    }
}

/// Public information about a stored key
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyInfo {
    pub name: String,
    pub pubkey: PublicKey,
    pub address: AccAddress,
}

impl KeyInfo {
    pub fn new(name: impl Into<String>, pubkey: PublicKey) -> Self {
        let address = pubkey.to_address();
        KeyInfo {
            name: name.into(),
            pubkey,
            address,
        }
    }
}

#[async_trait]
pub trait Keyring: Send + Sync {
    /// Create a key from a fresh mnemonic, returned once so it can be backed up
    async fn create_key(
        &mut self,
        name: &str,
        password: &str,
    ) -> Result<(KeyInfo, String), KeyringError>;

    /// Import a key from a BIP39 mnemonic
    async fn import_key(
        &mut self,
        name: &str,
        mnemonic: &str,
        password: &str,
    ) -> Result<KeyInfo, KeyringError>;

    async fn list_keys(&self) -> Result<Vec<KeyInfo>, KeyringError>;

    async fn get_key(&self, name: &str) -> Result<KeyInfo, KeyringError>;

    /// Sign `data` with the named key, returning the signature and signer public key
    async fn sign(
        &self,
        name: &str,
        password: &str,
        data: &[u8],
    ) -> Result<(Vec<u8>, PublicKey), KeyringError>;

    async fn delete_key(&mut self, name: &str, password: &str) -> Result<(), KeyringError>;
}

/// Run Argon2 work on the blocking pool so it does not stall async workers
pub(crate) async fn run_blocking<T, F>(f: F) -> Result<T, KeyringError>
where
    F: FnOnce() -> Result<T, KeyringError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| KeyringError::BackendError(format!("keyring task failed: {e}")))?
}

/// Names become file names in the file backend
pub(crate) fn validate_name(name: &str) -> Result<(), KeyringError> {
    let valid = !name.is_empty()
        && name.len() <= 64
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
        && !name.starts_with('.');
    if valid {
        Ok(())
    } else {
        Err(KeyringError::InvalidName(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_name() {
        assert!(validate_name("alice").is_ok());
        assert!(validate_name("validator-1_backup.v2").is_ok());
        assert!(validate_name("").is_err());
        assert!(validate_name("../etc").is_err());
        assert!(validate_name(".hidden").is_err());
        assert!(validate_name("a b").is_err());
    }

    #[test]
    fn test_auth_classification() {
        assert!(KeyringError::WrongPassword("alice".into()).is_auth());
        assert!(KeyringError::KeyNotFound("bob".into()).is_auth());
        assert!(KeyringError::InvalidName("../x".into()).is_auth());
        assert!(!KeyringError::BackendError("disk full".into()).is_auth());
    }
}
