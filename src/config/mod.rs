//! Configuration management for the payment service
//!
//! Handles configuration loading (TOML or JSON), validation, and construction
//! of the network, trust store and signer it describes.

use crate::params::NetworkContext;
use crate::pki::{RequestSigner, TrustStore};
use crate::script::parse_btc;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Payment service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentConfig {
    /// Network name ("main", "test", "regtest"; "mainnet"/"testnet" accepted)
    #[serde(default = "default_network")]
    pub network: String,

    /// Payments are posted to `<payment_url_base>/<wallet id>`
    #[serde(default = "default_payment_url_base")]
    pub payment_url_base: String,

    /// Lifetime of a payment request in seconds (default: 3600)
    #[serde(default = "default_expires_in_seconds")]
    pub expires_in_seconds: u64,

    /// Amount requested when none is given, in ledger units (default: "0.5")
    #[serde(default = "default_amount")]
    pub default_amount: String,

    /// PEM bundle of trusted root certificates for verifying requests
    #[serde(default)]
    pub trust_store_path: Option<PathBuf>,

    /// Request signing (payee side)
    #[serde(default)]
    pub signing: Option<SigningConfig>,

    #[serde(default)]
    pub logging: Option<LoggingConfig>,
}

/// Payment request signing configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SigningConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// RSA private key, PKCS#8 or PKCS#1 PEM
    pub private_key_path: PathBuf,

    /// Certificate chain PEM, leaf first
    pub certificate_chain_path: PathBuf,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "blvm_payment_protocol=debug")
    /// If not set, uses RUST_LOG environment variable or defaults to "info"
    #[serde(default)]
    pub filter: Option<String>,

    /// Enable JSON logging format (requires the json-logging feature)
    #[serde(default)]
    pub json_format: bool,
}

fn default_network() -> String {
    "test".to_string()
}

fn default_payment_url_base() -> String {
    "http://localhost:8080/payment".to_string()
}

fn default_expires_in_seconds() -> u64 {
    3600
}

fn default_amount() -> String {
    "0.5".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for PaymentConfig {
    fn default() -> Self {
        Self {
            network: default_network(),
            payment_url_base: default_payment_url_base(),
            expires_in_seconds: default_expires_in_seconds(),
            default_amount: default_amount(),
            trust_store_path: None,
            signing: None,
            logging: None,
        }
    }
}

impl PaymentConfig {
    /// Load configuration from file (TOML by `.toml` extension, JSON otherwise)
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;

        if path.extension().and_then(|s| s.to_str()) == Some("toml") {
            let config: PaymentConfig = toml::from_str(&content)
                .map_err(|e| anyhow::anyhow!("Failed to parse TOML config: {}", e))?;
            Ok(config)
        } else {
            let config: PaymentConfig = serde_json::from_str(&content)
                .map_err(|e| anyhow::anyhow!("Failed to parse JSON config: {}", e))?;
            Ok(config)
        }
    }

    pub fn from_json_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: PaymentConfig = serde_json::from_str(&content)?;
        Ok(config)
    }

    pub fn from_toml_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: PaymentConfig = toml::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Failed to parse TOML config: {}", e))?;
        Ok(config)
    }

    pub fn to_json_file(&self, path: &Path) -> anyhow::Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn to_toml_file(&self, path: &Path) -> anyhow::Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| anyhow::anyhow!("Failed to serialize TOML config: {}", e))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        self.network_context()?;
        self.default_amount_satoshis()?;

        if self.expires_in_seconds == 0 {
            return Err(anyhow::anyhow!("expires_in_seconds must be greater than 0"));
        }
        if self.payment_url_base.trim().is_empty() {
            return Err(anyhow::anyhow!("payment_url_base must not be empty"));
        }
        if let Some(signing) = self.signing.as_ref().filter(|s| s.enabled) {
            if signing.private_key_path.as_os_str().is_empty()
                || signing.certificate_chain_path.as_os_str().is_empty()
            {
                return Err(anyhow::anyhow!(
                    "Signing enabled but private_key_path or certificate_chain_path is empty"
                ));
            }
        }
        Ok(())
    }

    pub fn network_context(&self) -> anyhow::Result<NetworkContext> {
        self.network
            .parse()
            .map_err(|e| anyhow::anyhow!("Invalid network in config: {}", e))
    }

    /// `default_amount` in satoshis
    pub fn default_amount_satoshis(&self) -> anyhow::Result<i64> {
        parse_btc(&self.default_amount).map_err(|e| {
            anyhow::anyhow!("Invalid default_amount {:?}: {}", self.default_amount, e)
        })
    }

    /// Trust store from `trust_store_path`; empty when unset
    pub fn load_trust_store(&self) -> anyhow::Result<TrustStore> {
        match &self.trust_store_path {
            Some(path) => TrustStore::from_pem_file(path),
            None => Ok(TrustStore::new()),
        }
    }

    /// Signer from the `[signing]` section, if present and enabled
    pub fn load_signer(&self) -> anyhow::Result<Option<RequestSigner>> {
        let signing = match self.signing.as_ref().filter(|s| s.enabled) {
            Some(signing) => signing,
            None => return Ok(None),
        };

        #[cfg(unix)]
        {
            if let Ok(metadata) = std::fs::metadata(&signing.private_key_path) {
                use std::os::unix::fs::PermissionsExt;
                let mode = metadata.permissions().mode();
                if mode & 0o077 != 0 {
                    tracing::warn!(
                        "SECURITY WARNING: Signing key {:?} is readable by others (mode: {:o}). \
                         Consider setting permissions to 600.",
                        signing.private_key_path,
                        mode
                    );
                }
            }
        }

        RequestSigner::from_pem_files(&signing.private_key_path, &signing.certificate_chain_path)
            .map(Some)
    }
}
