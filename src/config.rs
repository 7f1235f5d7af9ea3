//! Runtime configuration
//!
//! Sources, later ones winning:
//! 1. `.env` in the working directory (loaded into the environment)
//! 2. `billing.toml` / `billing.json` / ... (optional)
//! 3. `BILLING_*` environment variables, `__` for nesting
//!    (`BILLING_HOME_STATE`, `BILLING_PRICING__GOODS__SHARE`); `segments`
//!    takes a comma-separated list (`BILLING_SEGMENTS=RES,COM,AGRI`)

use config::{Config as Cfg, Environment, File};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::tax::pricing::{PricingConfig, PricingEngine};
use crate::types::SegmentCatalog;
use crate::utils::validation::validate_state_name;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Deserialize, Clone)]
pub struct BillingConfig {
    /// Seller's home state, compared against each customer's place of supply
    pub home_state: String,
    #[serde(default = "default_counter_dir")]
    pub counter_dir: PathBuf,
    #[serde(default = "default_lock_timeout_ms")]
    pub lock_timeout_ms: u64,
    #[serde(default = "default_segments")]
    pub segments: Vec<String>,
    #[serde(default)]
    pub pricing: PricingConfig,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_counter_dir() -> PathBuf {
    PathBuf::from("data/counters")
}

fn default_lock_timeout_ms() -> u64 {
    5000
}

fn default_segments() -> Vec<String> {
    SegmentCatalog::DEFAULT_CODES
        .iter()
        .map(|c| c.to_string())
        .collect()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl BillingConfig {
    /// Load from `.env`, an optional `billing.*` file and `BILLING_*` variables
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let config = Cfg::builder()
            .add_source(File::with_name("billing").required(false))
            .add_source(environment())
            .build()?;

        Self::finish(config)
    }

    /// Load from a specific file, still honouring `BILLING_*` overrides
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let config = Cfg::builder()
            .add_source(File::from(path.as_ref()))
            .add_source(environment())
            .build()?;

        Self::finish(config)
    }

    fn finish(config: Cfg) -> Result<Self, ConfigError> {
        let config: Self = config.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_state_name(&self.home_state)
            .map_err(|e| ConfigError::Invalid(format!("home_state: {}", e)))?;
        self.segment_catalog()?;
        self.pricing_engine()?;
        Ok(())
    }

    pub fn segment_catalog(&self) -> Result<SegmentCatalog, ConfigError> {
        SegmentCatalog::new(self.segments.iter().cloned())
            .map_err(|e| ConfigError::Invalid(format!("segments: {}", e)))
    }

    pub fn pricing_engine(&self) -> Result<PricingEngine, ConfigError> {
        PricingEngine::new(self.pricing.clone())
            .map_err(|e| ConfigError::Invalid(format!("pricing: {}", e)))
    }

    pub fn lock_timeout(&self) -> Duration {
        Duration::from_millis(self.lock_timeout_ms)
    }
}

fn environment() -> Environment {
    Environment::with_prefix("BILLING")
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
        .list_separator(",")
        .with_list_parse_key("segments")
}
