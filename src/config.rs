use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use crate::auth::{PrivateKeySigner, checksum_address, signer_from_private_key};
use crate::types::OrderTemplate;
use crate::{API_BASE, DEFAULT_ENV, DEFAULT_LOG_DIR, SANDBOX_API_BASE};

/// Default run-settings file path.
pub const CONFIG_PATH: &str = "latency.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} not set in env")]
    Missing(&'static str),

    #[error("invalid {var}: {reason}")]
    Invalid { var: &'static str, reason: String },
}

/// Exchange connection and credential bundle, resolved once at startup.
#[derive(Clone)]
pub struct ClientConfig {
    pub base_url: Url,
    pub chain_id: Option<u64>,
    pub exchange_contract_address: Option<String>,
    pub sandbox: bool,
    pub wallet_private_key: String,
    /// EIP-55 checksummed address derived from `wallet_private_key`.
    pub wallet_address: String,
    pub api_key: String,
    pub api_secret: String,
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("base_url", &self.base_url.as_str())
            .field("chain_id", &self.chain_id)
            .field("exchange_contract_address", &self.exchange_contract_address)
            .field("sandbox", &self.sandbox)
            .field("wallet_private_key", &"<redacted>")
            .field("wallet_address", &self.wallet_address)
            .field("api_key", &self.api_key)
            .field("api_secret", &"<redacted>")
            .finish()
    }
}

impl ClientConfig {
    /// Load from process environment. Call `dotenvy::dotenv()` first to honour `.env`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from an arbitrary variable source. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let require = |key: &'static str| get(key).ok_or(ConfigError::Missing(key));

        let sandbox = get("SANDBOX").as_deref() == Some("true");

        let default_base = if sandbox { SANDBOX_API_BASE } else { API_BASE };
        let base_url_raw = get("BASE_URL").unwrap_or_else(|| default_base.to_string());
        let base_url = parse_base_url(&base_url_raw)?;

        let chain_id = get("CHAIN_ID")
            .map(|raw| {
                raw.parse::<u64>().map_err(|e| ConfigError::Invalid {
                    var: "CHAIN_ID",
                    reason: e.to_string(),
                })
            })
            .transpose()?;

        let wallet_private_key = require("WALLET_PRIVATE_KEY")?;
        let signer = signer_from_private_key(&wallet_private_key)?;
        let wallet_address = checksum_address(&signer);

        Ok(Self {
            base_url,
            chain_id,
            exchange_contract_address: get("EXCHANGE_CONTRACT_ADDRESS"),
            sandbox,
            wallet_private_key,
            wallet_address,
            api_key: require("API_KEY")?,
            api_secret: require("API_SECRET")?,
        })
    }

    /// Rebuild the wallet signer from the stored private key.
    pub fn signer(&self) -> Result<PrivateKeySigner, ConfigError> {
        signer_from_private_key(&self.wallet_private_key)
    }
}

/// Parse a base URL, normalising it to end with `/` so relative joins keep any path prefix.
fn parse_base_url(raw: &str) -> Result<Url, ConfigError> {
    let mut url = Url::parse(raw).map_err(|e| ConfigError::Invalid {
        var: "BASE_URL",
        reason: e.to_string(),
    })?;
    if url.cannot_be_a_base() {
        return Err(ConfigError::Invalid {
            var: "BASE_URL",
            reason: format!("{raw} cannot be used as a base URL"),
        });
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

/// Top-level run settings deserialized from `latency.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    #[serde(default)]
    pub settings: SettingsConfig,
    #[serde(default)]
    pub order: OrderTemplate,
}

/// Measurement cadence and log placement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettingsConfig {
    /// Pause between probes, e.g. `30s`, `1m`.
    #[serde(default = "default_interval")]
    pub interval: String,
    /// Total run length, e.g. `30m`, `2h`.
    #[serde(default = "default_duration")]
    pub duration: String,
    /// Environment name embedded in the log path.
    #[serde(default = "default_env")]
    pub env: String,
    #[serde(default = "default_log_dir")]
    pub log_dir: PathBuf,
}

fn default_interval() -> String {
    "1m".to_string()
}

fn default_duration() -> String {
    "30m".to_string()
}

fn default_env() -> String {
    DEFAULT_ENV.to_string()
}

fn default_log_dir() -> PathBuf {
    PathBuf::from(DEFAULT_LOG_DIR)
}

impl Default for SettingsConfig {
    fn default() -> Self {
        Self {
            interval: default_interval(),
            duration: default_duration(),
            env: default_env(),
            log_dir: default_log_dir(),
        }
    }
}

impl RunConfig {
    /// Load config from the given TOML file path.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let config: Self = toml::from_str(&contents)
            .with_context(|| format!("failed to parse {}", path.display()))?;
        Ok(config)
    }

    /// Load config if the file exists, otherwise fall back to built-in defaults.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Write config to the given TOML file path.
    pub fn save(&self, path: &Path) -> Result<()> {
        let contents = toml::to_string_pretty(self).context("failed to serialize config")?;
        std::fs::write(path, contents)
            .with_context(|| format!("failed to write {}", path.display()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use rust_decimal_macros::dec;

    use super::*;
    use crate::types::OrderSide;

    const TEST_KEY: &str = "0x0000000000000000000000000000000000000000000000000000000000000001";

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    fn required() -> Vec<(&'static str, &'static str)> {
        vec![
            ("WALLET_PRIVATE_KEY", TEST_KEY),
            ("API_KEY", "key"),
            ("API_SECRET", "secret"),
        ]
    }

    #[test]
    fn derives_wallet_address() {
        let config = ClientConfig::from_lookup(lookup(&required())).unwrap();
        assert_eq!(
            config.wallet_address,
            "0x7E5F4552091A69125d5DfCb7b8C2659029395Bdf"
        );
    }

    #[test]
    fn base_url_defaults_follow_sandbox_flag() {
        let config = ClientConfig::from_lookup(lookup(&required())).unwrap();
        assert!(!config.sandbox);
        assert_eq!(config.base_url.as_str(), "https://api.idex.io/");

        let mut vars = required();
        vars.push(("SANDBOX", "true"));
        let config = ClientConfig::from_lookup(lookup(&vars)).unwrap();
        assert!(config.sandbox);
        assert_eq!(config.base_url.as_str(), "https://api-sandbox.idex.io/");
    }

    #[test]
    fn sandbox_requires_exact_true() {
        let mut vars = required();
        vars.push(("SANDBOX", "yes"));
        let config = ClientConfig::from_lookup(lookup(&vars)).unwrap();
        assert!(!config.sandbox);
    }

    #[test]
    fn explicit_values_are_used() {
        let mut vars = required();
        vars.push(("BASE_URL", "https://example.test/api"));
        vars.push(("CHAIN_ID", "137"));
        vars.push((
            "EXCHANGE_CONTRACT_ADDRESS",
            "0x1111111111111111111111111111111111111111",
        ));
        let config = ClientConfig::from_lookup(lookup(&vars)).unwrap();
        assert_eq!(config.base_url.as_str(), "https://example.test/api/");
        assert_eq!(config.chain_id, Some(137));
        assert_eq!(
            config.exchange_contract_address.as_deref(),
            Some("0x1111111111111111111111111111111111111111")
        );
    }

    #[test]
    fn base_url_must_accept_paths() {
        let mut vars = required();
        vars.push(("BASE_URL", "mailto:ops@example.com"));
        let err = ClientConfig::from_lookup(lookup(&vars)).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { var: "BASE_URL", .. }));
    }

    #[test]
    fn missing_required_variables() {
        for missing in ["WALLET_PRIVATE_KEY", "API_KEY", "API_SECRET"] {
            let vars: Vec<_> = required().into_iter().filter(|(k, _)| *k != missing).collect();
            let err = ClientConfig::from_lookup(lookup(&vars)).unwrap_err();
            assert!(matches!(err, ConfigError::Missing(var) if var == missing));
        }
    }

    #[test]
    fn empty_value_counts_as_missing() {
        let mut vars = required();
        vars.retain(|(k, _)| *k != "API_SECRET");
        vars.push(("API_SECRET", "  "));
        let err = ClientConfig::from_lookup(lookup(&vars)).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("API_SECRET")));
    }

    #[test]
    fn invalid_chain_id() {
        let mut vars = required();
        vars.push(("CHAIN_ID", "polygon"));
        let err = ClientConfig::from_lookup(lookup(&vars)).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { var: "CHAIN_ID", .. }));
    }

    #[test]
    fn debug_redacts_secrets() {
        let config = ClientConfig::from_lookup(lookup(&required())).unwrap();
        let rendered = format!("{config:?}");
        assert!(!rendered.contains(TEST_KEY));
        assert!(!rendered.contains("\"secret\""));
        assert!(rendered.contains("<redacted>"));
    }

    #[test]
    fn run_config_defaults_when_file_missing() {
        let dir = tempfile::tempdir().unwrap();
        let config = RunConfig::load_or_default(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config, RunConfig::default());
        assert_eq!(config.settings.interval, "1m");
        assert_eq!(config.settings.duration, "30m");
        assert_eq!(config.settings.env, "prod");
        assert_eq!(config.settings.log_dir, PathBuf::from("logs"));
    }

    #[test]
    fn run_config_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("latency.toml");
        std::fs::write(
            &path,
            r#"
            [settings]
            interval = "30s"
            env = "sandbox"

            [order]
            side = "sell"
            quantity = "1.25"
            "#,
        )
        .unwrap();

        let config = RunConfig::load(&path).unwrap();
        assert_eq!(config.settings.interval, "30s");
        assert_eq!(config.settings.duration, "30m");
        assert_eq!(config.settings.env, "sandbox");
        assert_eq!(config.order.side, OrderSide::Sell);
        assert_eq!(config.order.quantity, dec!(1.25));
        assert_eq!(config.order.market, "ETH-USD");
    }

    #[test]
    fn run_config_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("latency.toml");
        let mut config = RunConfig::default();
        config.settings.env = "staging".to_string();
        config.save(&path).unwrap();

        assert_eq!(RunConfig::load(&path).unwrap(), config);
    }

    #[test]
    fn run_config_parse_error_names_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.toml");
        std::fs::write(&path, "[settings\n").unwrap();
        let err = RunConfig::load(&path).unwrap_err();
        assert!(format!("{err}").contains("broken.toml"));
    }
}
