//! Engine Configuration Module
//!
//! Loads [`EngineConfig`] from an optional TOML file layered under
//! `SWAP_`-prefixed environment variables. Nested keys use a double
//! underscore, e.g. `SWAP_FEE__NUMERATOR=5`.

use anyhow::{bail, Context, Result};
use config_crate::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Default swap fee, 3 / 1000
pub const DEFAULT_FEE_NUMERATOR: u32 = 3;
pub const DEFAULT_FEE_DENOMINATOR: u32 = 1_000;
/// Minutes added to "now" when a caller asks for a default deadline
pub const DEFAULT_DEADLINE_MINUTES: u64 = 20;
/// Default slippage tolerance in basis points (0.5%)
pub const DEFAULT_SLIPPAGE_BPS: u32 = 50;
pub const MAX_SLIPPAGE_BPS: u32 = 10_000;

/// Prefix for environment overrides
pub const ENV_PREFIX: &str = "SWAP";

/// Main engine configuration structure
#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct EngineConfig {
    pub fee: FeeConfig,
    pub deadline: DeadlineConfig,
    pub slippage: SlippageConfig,
    pub logging: LoggingConfig,
    pub persistence: PersistenceConfig,

    /// Pools registered at startup
    pub pools: Vec<PoolSeed>,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct FeeConfig {
    pub numerator: u32,
    pub denominator: u32,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct DeadlineConfig {
    pub default_minutes: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct SlippageConfig {
    pub default_bps: u32,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    /// `tracing_subscriber::EnvFilter` directive, e.g. `"info"` or `"swap_engine=debug"`
    pub level: String,
    pub json: bool,
}

#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct PersistenceConfig {
    /// Where snapshots are written; `$VARS` and `~` are expanded
    pub snapshot_path: Option<PathBuf>,
}

/// A token pair to create on startup, addresses as `0x`-prefixed hex
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct PoolSeed {
    pub token_a: String,
    pub token_b: String,
}

impl Default for FeeConfig {
    fn default() -> Self {
        Self {
            numerator: DEFAULT_FEE_NUMERATOR,
            denominator: DEFAULT_FEE_DENOMINATOR,
        }
    }
}

impl Default for DeadlineConfig {
    fn default() -> Self {
        Self {
            default_minutes: DEFAULT_DEADLINE_MINUTES,
        }
    }
}

impl Default for SlippageConfig {
    fn default() -> Self {
        Self {
            default_bps: DEFAULT_SLIPPAGE_BPS,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

/// Decode a `0x`-prefixed (or bare) 20-byte hex address
pub fn parse_hex_address(value: &str) -> Result<[u8; 20]> {
    let value = value.trim();
    let cleaned = value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
        .unwrap_or(value);

    let mut bytes = [0u8; 20];
    hex::decode_to_slice(cleaned, &mut bytes)
        .with_context(|| format!("{:?} is not a 20-byte hex address", value))?;
    Ok(bytes)
}

impl EngineConfig {
    /// Load configuration from an optional file with environment overrides
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder();

        if let Some(path) = path {
            info!("Loading engine config: {:?}", path);
            builder = builder.add_source(File::from(path).required(true));
        } else {
            debug!("No config file given, using defaults and environment");
        }

        // Override with environment variables (SWAP_ prefix)
        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build().context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }

    /// Reject values the engine cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.fee.denominator == 0 {
            bail!("fee.denominator must be positive");
        }
        if self.fee.numerator >= self.fee.denominator {
            bail!(
                "fee.numerator ({}) must be below fee.denominator ({})",
                self.fee.numerator,
                self.fee.denominator
            );
        }
        if self.slippage.default_bps > MAX_SLIPPAGE_BPS {
            bail!(
                "slippage.default_bps ({}) exceeds {}",
                self.slippage.default_bps,
                MAX_SLIPPAGE_BPS
            );
        }
        for (index, pool) in self.pools.iter().enumerate() {
            let token_a = parse_hex_address(&pool.token_a)
                .with_context(|| format!("pools[{}].token_a", index))?;
            let token_b = parse_hex_address(&pool.token_b)
                .with_context(|| format!("pools[{}].token_b", index))?;
            if token_a == token_b {
                bail!("pools[{}]: token_a and token_b are identical", index);
            }
        }
        Ok(())
    }

    /// Expand environment variables in path values
    pub fn expand_env_vars(&mut self) -> Result<()> {
        if let Some(path) = &self.persistence.snapshot_path {
            let raw = path.to_string_lossy();
            let expanded =
                shellexpand::full(&raw).context("Failed to expand snapshot path")?;
            self.persistence.snapshot_path = Some(PathBuf::from(expanded.as_ref()));
        }
        Ok(())
    }
}

/// Convenience function: load, expand and validate in one step
pub fn load_config(path: Option<&Path>) -> Result<EngineConfig> {
    let mut config = EngineConfig::load(path)?;
    config.expand_env_vars()?;
    config.validate()?;
    Ok(config)
}
