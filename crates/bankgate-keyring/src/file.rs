//! File-based keyring backend
//!
//! One JSON file per key. The secret key is encrypted with AES-256-GCM
//! under a key stretched from that key's password with Argon2; the public
//! key and address are stored in the clear so they can be listed without
//! unlocking anything.

use std::path::{Path, PathBuf};

use aes_gcm::aead::{Aead, AeadCore, KeyInit, OsRng};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use argon2::Argon2;
use async_trait::async_trait;
use base64::{engine::general_purpose, Engine as _};
use bankgate_crypto::{sign_message, KeyType, PrivateKey, PublicKey};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use tokio::fs;
use tracing::{debug, warn};
use zeroize::Zeroizing;

use crate::hd::{derive_private_key_from_mnemonic, generate_mnemonic, DerivationPath};
use crate::{run_blocking, validate_name, KeyInfo, Keyring, KeyringError};

const SALT_LEN: usize = 16;
const NONCE_LEN: usize = 12;
const KEY_FILE_EXTENSION: &str = "json";

pub struct FileKeyring {
    dir: PathBuf,
}

#[derive(Serialize, Deserialize)]
struct EncryptedKeyFile {
    name: String,
    key_type: KeyType,
    pubkey: PublicKey,
    /// base64
    salt: String,
    /// base64
    nonce: String,
    /// base64
    ciphertext: String,
}

impl EncryptedKeyFile {
    fn info(&self) -> KeyInfo {
        KeyInfo::new(self.name.clone(), self.pubkey.clone())
    }
}

impl FileKeyring {
    /// Open (creating if needed) a keyring rooted at `dir`
    pub async fn new(dir: impl AsRef<Path>) -> Result<Self, KeyringError> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir).await.map_err(|e| {
            KeyringError::BackendError(format!(
                "failed to create keyring directory {}: {e}",
                dir.display()
            ))
        })?;
        Ok(FileKeyring { dir })
    }

    /// `~/.bankgate/keyring`
    pub fn default_dir() -> Result<PathBuf, KeyringError> {
        let home = dirs::home_dir().ok_or_else(|| {
            KeyringError::BackendError("could not determine home directory".to_string())
        })?;
        Ok(home.join(".bankgate").join("keyring"))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn key_path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{name}.{KEY_FILE_EXTENSION}"))
    }

    async fn read_key_file(&self, name: &str) -> Result<EncryptedKeyFile, KeyringError> {
        validate_name(name)?;
        let path = self.key_path(name);
        let data = match fs::read_to_string(&path).await {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(KeyringError::KeyNotFound(name.to_string()))
            }
            Err(e) => {
                return Err(KeyringError::BackendError(format!(
                    "failed to read {}: {e}",
                    path.display()
                )))
            }
        };
        serde_json::from_str(&data).map_err(|e| {
            KeyringError::BackendError(format!("failed to parse {}: {e}", path.display()))
        })
    }

    async fn store(
        &self,
        name: &str,
        privkey: &PrivateKey,
        password: &str,
    ) -> Result<KeyInfo, KeyringError> {
        let path = self.key_path(name);
        if fs::try_exists(&path).await.unwrap_or(false) {
            return Err(KeyringError::KeyExists(name.to_string()));
        }

        let mut salt = [0u8; SALT_LEN];
        rand::thread_rng().fill_bytes(&mut salt);
        let cipher = cipher_for(password, &salt).await?;
        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
        let secret = Zeroizing::new(privkey.to_bytes());
        let ciphertext = cipher
            .encrypt(&nonce, secret.as_slice())
            .map_err(|e| KeyringError::BackendError(format!("failed to encrypt key: {e}")))?;

        let file = EncryptedKeyFile {
            name: name.to_string(),
            key_type: privkey.key_type(),
            pubkey: privkey.public_key(),
            salt: general_purpose::STANDARD.encode(salt),
            nonce: general_purpose::STANDARD.encode(nonce),
            ciphertext: general_purpose::STANDARD.encode(ciphertext),
        };
        let json = serde_json::to_string_pretty(&file)
            .map_err(|e| KeyringError::BackendError(format!("failed to encode key file: {e}")))?;
        fs::write(&path, json).await.map_err(|e| {
            KeyringError::BackendError(format!("failed to write {}: {e}", path.display()))
        })?;

        debug!(name = %name, path = %path.display(), "wrote key file");
        Ok(file.info())
    }

    async fn unlock(&self, name: &str, password: &str) -> Result<PrivateKey, KeyringError> {
        let file = self.read_key_file(name).await?;
        let salt = decode_field(&file.salt, "salt")?;
        let nonce = decode_field(&file.nonce, "nonce")?;
        let ciphertext = decode_field(&file.ciphertext, "ciphertext")?;
        if nonce.len() != NONCE_LEN {
            return Err(KeyringError::BackendError(format!(
                "corrupt key file for {name}: bad nonce length"
            )));
        }

        let cipher = cipher_for(password, &salt).await?;
        let secret = Zeroizing::new(
            cipher
                .decrypt(Nonce::from_slice(&nonce), ciphertext.as_slice())
                .map_err(|_| KeyringError::WrongPassword(name.to_string()))?,
        );
        PrivateKey::from_bytes(file.key_type, &secret).map_err(KeyringError::BackendError)
    }
}

async fn cipher_for(password: &str, salt: &[u8]) -> Result<Aes256Gcm, KeyringError> {
    let password = Zeroizing::new(password.to_string());
    let salt = salt.to_vec();
    run_blocking(move || derive_cipher(&password, &salt)).await
}

fn derive_cipher(password: &str, salt: &[u8]) -> Result<Aes256Gcm, KeyringError> {
    let mut key = Zeroizing::new([0u8; 32]);
    Argon2::default()
        .hash_password_into(password.as_bytes(), salt, &mut key[..])
        .map_err(|e| KeyringError::BackendError(format!("key derivation failed: {e}")))?;
    Ok(Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&key[..])))
}

fn decode_field(value: &str, field: &str) -> Result<Vec<u8>, KeyringError> {
    general_purpose::STANDARD
        .decode(value)
        .map_err(|e| KeyringError::BackendError(format!("corrupt key file {field}: {e}")))
}

#[async_trait]
impl Keyring for FileKeyring {
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
        let privkey = derive_private_key_from_mnemonic(mnemonic, &DerivationPath::default())?;
        self.store(name, &privkey, password).await
    }

    async fn list_keys(&self) -> Result<Vec<KeyInfo>, KeyringError> {
        let mut entries = fs::read_dir(&self.dir).await.map_err(|e| {
            KeyringError::BackendError(format!("failed to read keyring directory: {e}"))
        })?;

        let mut keys = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(|e| {
            KeyringError::BackendError(format!("failed to read directory entry: {e}"))
        })? {
            let path = entry.path();
            if path.extension().and_then(|s| s.to_str()) != Some(KEY_FILE_EXTENSION) {
                continue;
            }
            let Some(name) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            // A corrupt file should not hide the others
            match self.read_key_file(name).await {
                Ok(file) => keys.push(file.info()),
                Err(e) => warn!(name = %name, error = %e, "skipping unreadable key file"),
            }
        }

        keys.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(keys)
    }

    async fn get_key(&self, name: &str) -> Result<KeyInfo, KeyringError> {
        Ok(self.read_key_file(name).await?.info())
    }

    async fn sign(
        &self,
        name: &str,
        password: &str,
        data: &[u8],
    ) -> Result<(Vec<u8>, PublicKey), KeyringError> {
        let privkey = self.unlock(name, password).await?;
        let signature =
            sign_message(&privkey, data).map_err(|e| KeyringError::BackendError(e.to_string()))?;
        Ok((signature, privkey.public_key()))
    }

    async fn delete_key(&mut self, name: &str, password: &str) -> Result<(), KeyringError> {
        self.unlock(name, password).await?;
        let path = self.key_path(name);
        fs::remove_file(&path).await.map_err(|e| {
            KeyringError::BackendError(format!("failed to remove {}: {e}", path.display()))
        })?;
        debug!(name = %name, "deleted key file");
        Ok(())
    }
}
