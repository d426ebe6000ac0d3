//! In-memory keyring, for tests and embedders that supply their own keys

use std::collections::HashMap;

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use async_trait::async_trait;
use bankgate_crypto::{sign_message, PrivateKey, PublicKey};
use tracing::debug;
use zeroize::Zeroizing;

use crate::hd::{derive_private_key_from_mnemonic, generate_mnemonic, DerivationPath};
use crate::{run_blocking, validate_name, KeyInfo, Keyring, KeyringError};

struct MemoryEntry {
    info: KeyInfo,
    privkey: PrivateKey,
    /// Argon2 PHC string
    password_hash: String,
}

/// Keys held in process memory; lost on drop
#[derive(Default)]
pub struct MemoryKeyring {
    keys: HashMap<String, MemoryEntry>,
}

impl MemoryKeyring {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store an existing private key under `name`
    pub fn add_private_key(
        &mut self,
        name: &str,
        privkey: PrivateKey,
        password: &str,
    ) -> Result<KeyInfo, KeyringError> {
        validate_name(name)?;
        if self.keys.contains_key(name) {
            return Err(KeyringError::KeyExists(name.to_string()));
        }

        let salt = SaltString::generate(&mut OsRng);
        let password_hash = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| KeyringError::BackendError(format!("failed to hash password: {e}")))?
            .to_string();

        let info = KeyInfo::new(name, privkey.public_key());
        self.keys.insert(
            name.to_string(),
            MemoryEntry {
                info: info.clone(),
                privkey,
                password_hash,
            },
        );
        debug!(name = %name, "stored key in memory keyring");
        Ok(info)
    }

    async fn unlock(&self, name: &str, password: &str) -> Result<&MemoryEntry, KeyringError> {
        let entry = self
            .keys
            .get(name)
            .ok_or_else(|| KeyringError::KeyNotFound(name.to_string()))?;

        let password_hash = entry.password_hash.clone();
        let password = Zeroizing::new(password.to_string());
        let key_name = name.to_string();
        run_blocking(move || {
            let hash = PasswordHash::new(&password_hash)
                .map_err(|e| KeyringError::BackendError(format!("corrupt password hash: {e}")))?;
            Argon2::default()
                .verify_password(password.as_bytes(), &hash)
                .map_err(|_| KeyringError::WrongPassword(key_name))
        })
        .await?;
        Ok(entry)
    }
}

#[async_trait]
impl Keyring for MemoryKeyring {
    async fn create_key(
        &mut self,
        name: &str,
        password: &str,
    ) -> Result<(KeyInfo, String), KeyringError> {
        let mnemonic = generate_mnemonic()?.to_string();
        let info = self.import_key(name, &mnemonic, password).await?;
        Ok((info, mnemonic))
    }

    async fn import_key(
        &mut self,
        name: &str,
        mnemonic: &str,
        password: &str,
    ) -> Result<KeyInfo, KeyringError> {
        validate_name(name)?;
        if self.keys.contains_key(name) {
            return Err(KeyringError::KeyExists(name.to_string()));
        }
        let privkey = derive_private_key_from_mnemonic(mnemonic, &DerivationPath::default())?;
        self.add_private_key(name, privkey, password)
    }

    async fn list_keys(&self) -> Result<Vec<KeyInfo>, KeyringError> {
        let mut keys: Vec<KeyInfo> = self.keys.values().map(|e| e.info.clone()).collect();
        keys.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(keys)
    }

    async fn get_key(&self, name: &str) -> Result<KeyInfo, KeyringError> {
        self.keys
            .get(name)
            .map(|e| e.info.clone())
            .ok_or_else(|| KeyringError::KeyNotFound(name.to_string()))
    }

    async fn sign(
        &self,
        name: &str,
        password: &str,
        data: &[u8],
    ) -> Result<(Vec<u8>, PublicKey), KeyringError> {
        let entry = self.unlock(name, password).await?;
        let signature = sign_message(&entry.privkey, data)
            .map_err(|e| KeyringError::BackendError(e.to_string()))?;
        Ok((signature, entry.info.pubkey.clone()))
    }

    async fn delete_key(&mut self, name: &str, password: &str) -> Result<(), KeyringError> {
        self.unlock(name, password).await?;
        self.keys.remove(name);
        Ok(())
    }
}
