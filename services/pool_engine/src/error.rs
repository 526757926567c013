//! Engine-level errors

use swap_amm::{AmmError, PoolKey};
use thiserror::Error;

pub type EngineResult<T> = Result<T, EngineError>;

#[derive(Debug, Error)]
pub enum EngineError {
    /// A pool operation was rejected; the pool is unchanged
    #[error(transparent)]
    Amm(#[from] AmmError),

    #[error("No pool registered for key {0}")]
    PoolNotFound(PoolKey),

    #[error("Pool {0} already exists")]
    PoolExists(PoolKey),

    #[error("Snapshot serialization error: {0}")]
    Snapshot(#[from] bincode::Error),

    #[error("Snapshot rejected: {0}")]
    InvalidSnapshot(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl EngineError {
    /// Stable kind name for display layers
    pub fn code(&self) -> &'static str {
        match self {
            EngineError::Amm(err) => err.code(),
            EngineError::PoolNotFound(_) => "PoolNotFound",
            EngineError::PoolExists(_) => "PoolExists",
            EngineError::Snapshot(_) => "Snapshot",
            EngineError::InvalidSnapshot(_) => "InvalidSnapshot",
            EngineError::InvalidConfig(_) => "InvalidConfig",
        }
    }

    /// The pool-level kind, when the failure came from a pool guard
    pub fn amm(&self) -> Option<AmmError> {
        match self {
            EngineError::Amm(err) => Some(*err),
            _ => None,
        }
    }
}
