//! # Register Configuration
//!
//! Where the backend lives, what goes on the receipt, and where the held
//! sale is kept.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Command-line flags (highest priority, applied by the binary)       │
//! │     --api-url http://10.0.0.5:5000/pos                                 │
//! │                                                                         │
//! │  2. Environment Variables                                              │
//! │     TILL_API_URL, TILL_API_TIMEOUT, TILL_STORE_NAME,                   │
//! │     TILL_HELD_SALE_PATH                                                │
//! │                                                                         │
//! │  3. TOML Config File (TILL_CONFIG or the platform default)             │
//! │     ~/.config/till-pos/register.toml (Linux)                           │
//! │     ~/Library/Application Support/com.till.pos/register.toml (macOS)   │
//! │                                                                         │
//! │  4. Default Values (lowest priority)                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! [api]
//! base_url = "http://127.0.0.1:5000/pos"
//! timeout_secs = 15
//!
//! [store]
//! name = "Corner Shop"
//! address = ["12 High Street", "Springfield"]
//! phone = "555-0100"
//! currency_symbol = "$"
//!
//! [receipt]
//! paper_width = 42
//! footer = ["Thank you for your business!"]
//!
//! [held_sale]
//! path = "/var/lib/till/held_sale.json"
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

use till_core::receipt::{DEFAULT_PAPER_WIDTH, MIN_PAPER_WIDTH};
use till_core::{Money, StoreInfo};

use crate::error::{ClientError, ClientResult};

// =============================================================================
// API Settings
// =============================================================================

/// Backend connection settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL every endpoint path is appended to.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Timeout applied to every request (seconds).
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_base_url() -> String {
    "http://127.0.0.1:5000/pos".to_string()
}

fn default_timeout() -> u64 {
    15
}

impl Default for ApiConfig {
    fn default() -> Self {
        ApiConfig {
            base_url: default_base_url(),
            timeout_secs: default_timeout(),
        }
    }
}

impl ApiConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        ApiConfig {
            base_url: base_url.into(),
            ..ApiConfig::default()
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

// =============================================================================
// Store & Receipt Settings
// =============================================================================

/// Store details printed in the receipt header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreSettings {
    #[serde(default = "default_store_name")]
    pub name: String,

    #[serde(default)]
    pub address: Vec<String>,

    #[serde(default)]
    pub phone: Option<String>,

    #[serde(default = "default_currency_symbol")]
    pub currency_symbol: String,
}

fn default_store_name() -> String {
    "Till POS".to_string()
}

fn default_currency_symbol() -> String {
    "$".to_string()
}

impl Default for StoreSettings {
    fn default() -> Self {
        StoreSettings {
            name: default_store_name(),
            address: Vec::new(),
            phone: None,
            currency_symbol: default_currency_symbol(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceiptSettings {
    /// Paper width in columns (minimum 32).
    #[serde(default = "default_paper_width")]
    pub paper_width: usize,

    /// Footer lines; empty means the built-in thank-you and return policy.
    #[serde(default)]
    pub footer: Vec<String>,
}

fn default_paper_width() -> usize {
    DEFAULT_PAPER_WIDTH
}

impl Default for ReceiptSettings {
    fn default() -> Self {
        ReceiptSettings {
            paper_width: default_paper_width(),
            footer: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeldSaleSettings {
    /// Snapshot file; defaults to the platform data directory.
    #[serde(default)]
    pub path: Option<PathBuf>,
}

// =============================================================================
// Register Configuration
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterConfig {
    #[serde(default)]
    pub api: ApiConfig,

    #[serde(default)]
    pub store: StoreSettings,

    #[serde(default)]
    pub receipt: ReceiptSettings,

    #[serde(default)]
    pub held_sale: HeldSaleSettings,
}

impl RegisterConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file: `config_path`, else `TILL_CONFIG`, else the platform default
    /// 3. Environment variables
    ///
    /// An explicitly named file that does not exist is an error; a missing
    /// default file is not.
    pub fn load(config_path: Option<PathBuf>) -> ClientResult<Self> {
        let explicit = config_path.or_else(|| std::env::var_os("TILL_CONFIG").map(PathBuf::from));
        let mut config = match explicit {
            Some(path) => {
                if !path.exists() {
                    return Err(ClientError::Config(format!(
                        "config file not found: {}",
                        path.display()
                    )));
                }
                Self::from_file(&path)?
            }
            None => match Self::default_config_path() {
                Some(path) if path.exists() => Self::from_file(&path)?,
                Some(path) => {
                    debug!(?path, "Config file not found, using defaults");
                    Self::default()
                }
                None => Self::default(),
            },
        };

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Parses a TOML file without applying overrides.
    pub fn from_file(path: &std::path::Path) -> ClientResult<Self> {
        info!(?path, "Loading register config from file");
        let contents = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&contents)?)
    }

    /// Validates the configuration.
    pub fn validate(&self) -> ClientResult<()> {
        let url = Url::parse(&self.api.base_url)?;
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(ClientError::Config(format!(
                "API URL must start with http:// or https://, got: {}",
                self.api.base_url
            )));
        }

        if self.api.timeout_secs == 0 {
            return Err(ClientError::Config(
                "timeout_secs must be greater than 0".into(),
            ));
        }

        if self.receipt.paper_width < MIN_PAPER_WIDTH {
            return Err(ClientError::Config(format!(
                "paper_width must be at least {}, got {}",
                MIN_PAPER_WIDTH, self.receipt.paper_width
            )));
        }

        if self.store.currency_symbol.trim().is_empty() {
            return Err(ClientError::Config("currency_symbol must not be empty".into()));
        }

        Ok(())
    }

    /// Applies `TILL_*` environment variable overrides.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Applies overrides from any key lookup (the environment in production).
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup("TILL_API_URL") {
            debug!(url = %url, "Overriding API URL from environment");
            self.api.base_url = url;
        }

        if let Some(timeout) = lookup("TILL_API_TIMEOUT") {
            match timeout.parse::<u64>() {
                Ok(secs) => self.api.timeout_secs = secs,
                Err(_) => warn!(value = %timeout, "Ignoring non-numeric TILL_API_TIMEOUT"),
            }
        }

        if let Some(name) = lookup("TILL_STORE_NAME") {
            self.store.name = name;
        }

        if let Some(path) = lookup("TILL_HELD_SALE_PATH") {
            debug!(path = %path, "Overriding held sale path from environment");
            self.held_sale.path = Some(PathBuf::from(path));
        }
    }

    /// Returns the default config file path.
    pub fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "till", "pos")
            .map(|dirs| dirs.config_dir().join("register.toml"))
    }

    /// Where the held sale is stored.
    pub fn held_sale_path(&self) -> ClientResult<PathBuf> {
        if let Some(path) = &self.held_sale.path {
            return Ok(path.clone());
        }
        directories::ProjectDirs::from("com", "till", "pos")
            .map(|dirs| dirs.data_dir().join("held_sale.json"))
            .ok_or_else(|| {
                ClientError::Config("no home directory; set held_sale.path".to_string())
            })
    }

    // =========================================================================
    // Convenience Methods
    // =========================================================================

    /// Receipt header/footer derived from the store and receipt sections.
    pub fn store_info(&self) -> StoreInfo {
        let mut info = StoreInfo {
            name: self.store.name.clone(),
            address: self.store.address.clone(),
            phone: self.store.phone.clone(),
            currency_symbol: self.store.currency_symbol.clone(),
            ..StoreInfo::default()
        };
        if !self.receipt.footer.is_empty() {
            info.footer = self.receipt.footer.clone();
        }
        info
    }

    /// Formats an amount with the configured currency symbol.
    pub fn format_currency(&self, amount: Money) -> String {
        amount.format_with(&self.store.currency_symbol)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config() {
        let config = RegisterConfig::default();
        assert_eq!(config.api.base_url, "http://127.0.0.1:5000/pos");
        assert_eq!(config.api.timeout_secs, 15);
        assert_eq!(config.receipt.paper_width, 42);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: RegisterConfig = toml::from_str(
            r#"
            [store]
            name = "Corner Shop"
            currency_symbol = "£"

            [receipt]
            footer = ["Cheers!"]
            "#,
        )
        .unwrap();
        assert_eq!(config.api.timeout_secs, 15);
        assert_eq!(config.store.name, "Corner Shop");
        assert_eq!(config.format_currency(Money::from_cents(1050)), "£10.50");

        let info = config.store_info();
        assert_eq!(info.footer, vec!["Cheers!".to_string()]);
    }

    #[test]
    fn test_overrides() {
        let env: HashMap<&str, &str> = [
            ("TILL_API_URL", "https://pos.example.com/pos"),
            ("TILL_API_TIMEOUT", "30"),
            ("TILL_STORE_NAME", "Night Shop"),
            ("TILL_HELD_SALE_PATH", "/tmp/held.json"),
        ]
        .into_iter()
        .collect();

        let mut config = RegisterConfig::default();
        config.apply_overrides(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.api.base_url, "https://pos.example.com/pos");
        assert_eq!(config.api.timeout(), Duration::from_secs(30));
        assert_eq!(config.store.name, "Night Shop");
        assert_eq!(config.held_sale_path().unwrap(), PathBuf::from("/tmp/held.json"));
    }

    #[test]
    fn test_bad_timeout_override_ignored() {
        let mut config = RegisterConfig::default();
        config.apply_overrides(|key| (key == "TILL_API_TIMEOUT").then(|| "soon".to_string()));
        assert_eq!(config.api.timeout_secs, 15);
    }

    #[test]
    fn test_validation() {
        let mut config = RegisterConfig::default();
        config.api.base_url = "ftp://example.com".to_string();
        assert!(config.validate().is_err());

        config.api.base_url = "not a url".to_string();
        assert!(config.validate().is_err());

        let mut config = RegisterConfig::default();
        config.api.timeout_secs = 0;
        assert!(config.validate().is_err());

        let mut config = RegisterConfig::default();
        config.receipt.paper_width = 20;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_missing_explicit_file_fails() {
        let err = RegisterConfig::load(Some(PathBuf::from("/definitely/not/here.toml"))).unwrap_err();
        assert!(matches!(err, ClientError::Config(_)));
    }

    #[test]
    fn test_toml_serialization() {
        let config = RegisterConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("[api]"));
        assert!(toml_str.contains("[store]"));
    }
}
