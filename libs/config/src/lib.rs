//! # Swap Engine Configuration
//!
//! This crate provides layered configuration for the pool engine and the
//! `amm-sim` driver.
//!
//! ## Features
//!
//! - **Fee Schedule**: Swap fee numerator and denominator
//! - **Deadlines and Slippage**: Defaults used by request builders
//! - **Logging**: Filter directive and JSON switch for the subscriber
//! - **Pools**: Token pairs registered at startup
//!
//! ## Usage
//!
//! ```rust,no_run
//! use swap_config::load_config;
//!
//! let config = load_config(None).expect("valid configuration");
//! assert!(config.fee.numerator < config.fee.denominator);
//! ```

pub mod engine_config;

// Re-export commonly used types
pub use engine_config::{
    load_config, parse_hex_address, DeadlineConfig, EngineConfig, FeeConfig, LoggingConfig,
    PersistenceConfig, PoolSeed, SlippageConfig,
};
