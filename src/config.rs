//! Pipeline configuration.
//!
//! Settings that rarely change between runs (target site, client identity,
//! throttling, exchange rate) live in an optional YAML file. Every key is
//! optional; anything missing falls back to [`PipelineConfig::default`].
//!
//! ```yaml
//! base_url: https://fashion-studio.dicoding.dev
//! timeout_secs: 20
//! delay_ms: 100
//! exchange_rate: 16000
//! ```

use crate::error::EtlError;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use tracing::{info, instrument};
use url::Url;

pub const DEFAULT_BASE_URL: &str = "https://fashion-studio.dicoding.dev";
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) Chrome/122 Safari/537.36";
pub const DEFAULT_TIMEOUT_SECS: u64 = 20;
pub const DEFAULT_DELAY_MS: u64 = 100;
pub const DEFAULT_EXCHANGE_RATE: f64 = 16000.0;

/// Runtime settings for one scrape-and-load run.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Catalog root; page 1 is `{base_url}/`, page n is `{base_url}/page{n}`.
    pub base_url: String,
    /// `User-Agent` header sent with every page request.
    pub user_agent: String,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
    /// Pause after each page, in milliseconds.
    pub delay_ms: u64,
    /// Multiplier from the listed currency into the target integer unit.
    pub exchange_rate: f64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            delay_ms: DEFAULT_DELAY_MS,
            exchange_rate: DEFAULT_EXCHANGE_RATE,
        }
    }
}

impl PipelineConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }

    /// Parse a YAML document and validate it.
    pub fn from_yaml(yaml: &str) -> Result<Self, EtlError> {
        let config: PipelineConfig =
            serde_yaml::from_str(yaml).map_err(|e| EtlError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), EtlError> {
        let url = Url::parse(&self.base_url)
            .map_err(|e| EtlError::Config(format!("base_url {:?}: {e}", self.base_url)))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(EtlError::Config(format!(
                "base_url must be http(s), got {:?}",
                self.base_url
            )));
        }
        if !(self.exchange_rate.is_finite() && self.exchange_rate > 0.0) {
            return Err(EtlError::Config(format!(
                "exchange_rate must be a positive number, got {}",
                self.exchange_rate
            )));
        }
        Ok(())
    }
}

/// Load the config file at `path`, or the defaults when no path is given.
#[instrument(level = "info")]
pub fn load_config(path: Option<&Path>) -> Result<PipelineConfig, EtlError> {
    let Some(path) = path else {
        return Ok(PipelineConfig::default());
    };
    let yaml = std::fs::read_to_string(path)
        .map_err(|e| EtlError::Config(format!("{}: {e}", path.display())))?;
    let config = PipelineConfig::from_yaml(&yaml)?;
    info!(base_url = %config.base_url, "Loaded pipeline config");
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_without_path() {
        let config = load_config(None).unwrap();
        assert_eq!(config, PipelineConfig::default());
        assert_eq!(config.timeout(), Duration::from_secs(20));
        assert_eq!(config.delay(), Duration::from_millis(100));
    }

    #[test]
    fn test_partial_yaml_falls_back_to_defaults() {
        let config = PipelineConfig::from_yaml("delay_ms: 0\nexchange_rate: 15500\n").unwrap();
        assert_eq!(config.delay_ms, 0);
        assert_eq!(config.exchange_rate, 15500.0);
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.user_agent, DEFAULT_USER_AGENT);
    }

    #[test]
    fn test_rejects_relative_base_url() {
        let err = PipelineConfig::from_yaml("base_url: not-a-url\n").unwrap_err();
        assert!(matches!(err, EtlError::Config(_)));
    }

    #[test]
    fn test_rejects_non_positive_exchange_rate() {
        assert!(PipelineConfig::from_yaml("exchange_rate: 0\n").is_err());
    }

    #[test]
    fn test_load_config_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pipeline.yaml");
        std::fs::write(&path, "base_url: http://127.0.0.1:8080\ntimeout_secs: 5\n").unwrap();
        let config = load_config(Some(&path)).unwrap();
        assert_eq!(config.base_url, "http://127.0.0.1:8080");
        assert_eq!(config.timeout_secs, 5);
    }

    #[test]
    fn test_load_config_missing_file() {
        let err = load_config(Some(Path::new("/definitely/not/here.yaml"))).unwrap_err();
        assert!(matches!(err, EtlError::Config(_)));
    }
}
