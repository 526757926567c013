//! Pool error kinds
//!
//! One variant per failure kind the pool can report. Every operation that
//! returns one of these has left the pool untouched.

use thiserror::Error;

/// Result alias for pool operations
pub type AmmResult<T> = Result<T, AmmError>;

/// Failure kinds reported by pool math and pool state transitions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AmmError {
    #[error("Deadline has passed")]
    Expired,

    #[error("Swap path does not match the pool's token pair")]
    InvalidPath,

    #[error("Pool tokens must be different")]
    IdenticalAddresses,

    #[error("Zero address is not a valid token or recipient")]
    ZeroAddress,

    #[error("Input amount must be greater than zero")]
    InsufficientInputAmount,

    #[error("Output amount is zero or below the requested minimum")]
    InsufficientOutputAmount,

    #[error("Pool reserves are insufficient for this operation")]
    InsufficientLiquidity,

    #[error("Pool has no liquidity")]
    NoLiquidity,

    #[error("Token A amount is below the requested minimum")]
    InsufficientAmountA,

    #[error("Token B amount is below the requested minimum")]
    InsufficientAmountB,

    #[error("Deposit too small to mint liquidity shares")]
    InsufficientLiquidityMinted,

    #[error("Withdrawal too small to return both tokens")]
    InsufficientLiquidityBurned,

    #[error("Requested shares exceed the caller's liquidity balance")]
    InsufficientLiquidityBalance,

    #[error("Re-entrant call into a pool that is already being mutated")]
    ReentrancyGuardReentrantCall,

    #[error("Invalid fee schedule: {0}")]
    InvalidFee(&'static str),

    #[error("Invalid token amount: {0}")]
    InvalidUnits(&'static str),

    #[error("Arithmetic overflow: {0}")]
    Overflow(&'static str),
}

impl AmmError {
    /// Stable kind name, identical across releases.
    ///
    /// Display layers match on this instead of the human-readable message.
    pub fn code(&self) -> &'static str {
        match self {
            AmmError::Expired => "Expired",
            AmmError::InvalidPath => "InvalidPath",
            AmmError::IdenticalAddresses => "IdenticalAddresses",
            AmmError::ZeroAddress => "ZeroAddress",
            AmmError::InsufficientInputAmount => "InsufficientInputAmount",
            AmmError::InsufficientOutputAmount => "InsufficientOutputAmount",
            AmmError::InsufficientLiquidity => "InsufficientLiquidity",
            AmmError::NoLiquidity => "NoLiquidity",
            AmmError::InsufficientAmountA => "InsufficientAmountA",
            AmmError::InsufficientAmountB => "InsufficientAmountB",
            AmmError::InsufficientLiquidityMinted => "InsufficientLiquidityMinted",
            AmmError::InsufficientLiquidityBurned => "InsufficientLiquidityBurned",
            AmmError::InsufficientLiquidityBalance => "InsufficientLiquidityBalance",
            AmmError::ReentrancyGuardReentrantCall => "ReentrancyGuardReentrantCall",
            AmmError::InvalidFee(_) => "InvalidFee",
            AmmError::InvalidUnits(_) => "InvalidUnits",
            AmmError::Overflow(_) => "Overflow",
        }
    }

    /// Slippage-floor failures a caller can retry with looser minimums
    pub fn is_slippage(&self) -> bool {
        matches!(
            self,
            AmmError::InsufficientOutputAmount
                | AmmError::InsufficientAmountA
                | AmmError::InsufficientAmountB
        )
    }
}
