//! Gateway configuration, stored as TOML

use serde::{Deserialize, Serialize};
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use thiserror::Error;
use url::Url;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("io error:: {0}")]
    Io(#[from] std::io::Error),

    #[error("toml parsing error:: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("toml serialization error:: {0}")]
    TomlSer(#[from] toml::ser::Error),

    #[error("invalid configuration:: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    pub server: ServerConfig,
    pub node: NodeConfig,
    pub keyring: KeyringConfig,
    pub chain: ChainConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address the REST server binds to
    pub listen_address: String,
    /// Largest accepted request body, in bytes
    pub max_request_size: usize,
    pub request_timeout_seconds: u64,
    pub enable_cors: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_address: "127.0.0.1:1317".to_string(),
            max_request_size: 1024 * 1024,
            request_timeout_seconds: 30,
            enable_cors: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    /// Tendermint RPC endpoint
    pub rpc_url: String,
    pub timeout_seconds: u64,
    /// Synchronous broadcasts wait for the block instead of the mempool check
    pub wait_for_commit: bool,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            rpc_url: "http://localhost:26657".to_string(),
            timeout_seconds: 30,
            wait_for_commit: true,
        }
    }
}

/// Keys are created with `bankgate keys add` and read by the server from the same directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyringConfig {
    /// Key directory; relative paths resolve against the home directory
    pub dir: PathBuf,
}

impl Default for KeyringConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("keyring"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChainConfig {
    /// Human readable part of account addresses
    pub bech32_prefix: String,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            bech32_prefix: bankgate_types::DEFAULT_BECH32_PREFIX.to_string(),
        }
    }
}

impl GatewayConfig {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        let config: GatewayConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        if let Some(parent) = path.as_ref().parent() {
            fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// `~/.bankgate`
    pub fn default_home() -> PathBuf {
        match dirs::home_dir() {
            Some(home) => home.join(".bankgate"),
            None => PathBuf::from(".bankgate"),
        }
    }

    pub fn default_config_file() -> PathBuf {
        Self::default_home().join("config.toml")
    }

    /// Load `path` if it exists, otherwise fall back to defaults
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        if path.as_ref().exists() {
            Self::load_from_file(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.listen_addr()?;
        Url::parse(&self.node.rpc_url).map_err(|e| {
            ConfigError::Invalid(format!("node.rpc_url {:?}: {e}", self.node.rpc_url))
        })?;
        if self.server.max_request_size == 0 {
            return Err(ConfigError::Invalid(
                "server.max_request_size must be positive".to_string(),
            ));
        }
        if self.server.request_timeout_seconds == 0 || self.node.timeout_seconds == 0 {
            return Err(ConfigError::Invalid("timeouts must be positive".to_string()));
        }
        let prefix = &self.chain.bech32_prefix;
        let well_formed = prefix
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit());
        if prefix.is_empty() || !well_formed {
            return Err(ConfigError::Invalid(format!(
                "chain.bech32_prefix {prefix:?} must be lower-case alphanumeric"
            )));
        }
        Ok(())
    }

    pub fn listen_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.server.listen_address.parse().map_err(|e| {
            ConfigError::Invalid(format!(
                "server.listen_address {:?}: {e}",
                self.server.listen_address
            ))
        })
    }

    /// Keyring directory, resolved against `home` when relative
    pub fn keyring_dir(&self, home: &Path) -> PathBuf {
        if self.keyring.dir.is_absolute() {
            self.keyring.dir.clone()
        } else {
            home.join(&self.keyring.dir)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_are_valid() {
        let config = GatewayConfig::default();
        config.validate().unwrap();
        assert_eq!(config.listen_addr().unwrap().port(), 1317);
        assert_eq!(config.node.rpc_url, "http://localhost:26657");
        assert!(config.node.wait_for_commit);
        assert_eq!(config.keyring.dir, PathBuf::from("keyring"));
        assert_eq!(config.chain.bech32_prefix, "cosmos");
    }

    #[test]
    fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = GatewayConfig::default();
        config.node.wait_for_commit = false;
        config.keyring.dir = PathBuf::from("/var/lib/bankgate/keys");
        config.save_to_file(&path).unwrap();

        assert_eq!(GatewayConfig::load_from_file(&path).unwrap(), config);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let config: GatewayConfig = toml::from_str(
            r#"
            [node]
            rpc_url = "http://10.0.0.5:26657"

            [chain]
            bech32_prefix = "iaa"
            "#,
        )
        .unwrap();
        assert_eq!(config.node.rpc_url, "http://10.0.0.5:26657");
        assert_eq!(config.node.timeout_seconds, 30);
        assert_eq!(config.server, ServerConfig::default());
        assert_eq!(config.chain.bech32_prefix, "iaa");
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let dir = TempDir::new().unwrap();
        let config = GatewayConfig::load_or_default(dir.path().join("absent.toml")).unwrap();
        assert_eq!(config, GatewayConfig::default());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = GatewayConfig::default();
        config.server.listen_address = "localhost".to_string();
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let mut config = GatewayConfig::default();
        config.node.rpc_url = "not a url".to_string();
        assert!(config.validate().is_err());

        let mut config = GatewayConfig::default();
        config.chain.bech32_prefix = "Cosmos".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_keyring_dir_resolution() {
        let mut config = GatewayConfig::default();
        assert_eq!(
            config.keyring_dir(Path::new("/srv/gw")),
            PathBuf::from("/srv/gw/keyring")
        );

        config.keyring.dir = PathBuf::from("/keys");
        assert_eq!(config.keyring_dir(Path::new("/srv/gw")), PathBuf::from("/keys"));
    }

    #[test]
    fn test_legacy_backend_key_is_ignored() {
        let config: GatewayConfig = toml::from_str(
            r#"
            [keyring]
            backend = "memory"
            dir = "keys"
            "#,
        )
        .unwrap();
        assert_eq!(config.keyring.dir, PathBuf::from("keys"));
    }
}
