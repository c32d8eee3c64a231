//! Engine configuration with TOML file support.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tessera_types::Network;
use tessera_utils::LogFormat;

use crate::keystore::KdfParams;
use crate::WalletError;

/// Configuration for a wallet engine.
///
/// Can be loaded from a TOML file via [`EngineConfig::from_toml_file`] or
/// built programmatically (e.g. for tests).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Base URL of the transaction-indexing service.
    #[serde(default = "default_tx_service_url")]
    pub tx_service_url: String,

    /// Base URL of the user API (authentication).
    #[serde(default = "default_api_root")]
    pub api_root: String,

    /// Sent as the `Api-Key` header on every request.
    #[serde(default)]
    pub api_key: String,

    #[serde(default)]
    pub network: Network,

    /// Directory holding `keystore.json`. Without one the keystore lives
    /// only in memory.
    #[serde(default)]
    pub data_dir: Option<PathBuf>,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    #[serde(default = "default_sync_timeout_secs")]
    pub sync_timeout_secs: u64,

    #[serde(default)]
    pub log_format: LogFormat,

    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Argon2id cost for new keystores.
    #[serde(default)]
    pub kdf: KdfParams,
}

fn default_tx_service_url() -> String {
    "http://127.0.0.1:8080".to_string()
}

fn default_api_root() -> String {
    "http://127.0.0.1:8080/api".to_string()
}

fn default_request_timeout_secs() -> u64 {
    15
}

fn default_sync_timeout_secs() -> u64 {
    60
}

fn default_log_level() -> String {
    "info".to_string()
}

impl EngineConfig {
    pub fn from_toml_file(path: &Path) -> Result<Self, WalletError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| WalletError::Config(e.to_string()))?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(s: &str) -> Result<Self, WalletError> {
        toml::from_str(s).map_err(|e| WalletError::Config(e.to_string()))
    }

    pub fn to_toml_string(&self) -> Result<String, WalletError> {
        toml::to_string_pretty(self).map_err(|e| WalletError::Config(e.to_string()))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn sync_timeout(&self) -> Duration {
        Duration::from_secs(self.sync_timeout_secs)
    }

    pub fn keystore_path(&self) -> Option<PathBuf> {
        self.data_dir.as_ref().map(|dir| dir.join("keystore.json"))
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tx_service_url: default_tx_service_url(),
            api_root: default_api_root(),
            api_key: String::new(),
            network: Network::default(),
            data_dir: None,
            request_timeout_secs: default_request_timeout_secs(),
            sync_timeout_secs: default_sync_timeout_secs(),
            log_format: LogFormat::default(),
            log_level: default_log_level(),
            kdf: KdfParams::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_round_trips_through_toml() {
        let config = EngineConfig {
            data_dir: Some(PathBuf::from("/var/lib/tessera")),
            ..EngineConfig::default()
        };
        let toml_str = config.to_toml_string().unwrap();
        let parsed = EngineConfig::from_toml_str(&toml_str).expect("should parse");
        assert_eq!(parsed, config);
    }

    #[test]
    fn minimal_toml_uses_defaults() {
        let config = EngineConfig::from_toml_str("").expect("empty toml should use defaults");
        assert_eq!(config.network, Network::Mainnet);
        assert_eq!(config.sync_timeout_secs, 60);
        assert_eq!(config.log_format, LogFormat::Human);
        assert_eq!(config.kdf, KdfParams::default());
        assert!(config.keystore_path().is_none());
    }

    #[test]
    fn partial_toml_overrides() {
        let toml = r#"
            network = "testnet"
            api_key = "k"
            log_format = "json"

            [kdf]
            memory_kib = 1024
            iterations = 1
            parallelism = 1
        "#;
        let config = EngineConfig::from_toml_str(toml).expect("should parse");
        assert_eq!(config.network, Network::Testnet);
        assert_eq!(config.api_key, "k");
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(config.kdf.memory_kib, 1024);
        assert_eq!(config.request_timeout_secs, 15);
    }

    #[test]
    fn missing_file_returns_config_error() {
        let result = EngineConfig::from_toml_file(Path::new("/nonexistent/tessera.toml"));
        assert!(matches!(result, Err(WalletError::Config(_))));
    }
}
