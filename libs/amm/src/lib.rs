//! # Swap AMM Library - Constant-Product Pool Core
//!
//! ## Purpose
//!
//! Exact integer mathematics and state transitions for a two-token
//! constant-product pool. Provides swap pricing with an input-side fee,
//! proportional liquidity provision, pro-rata withdrawal and the LP share
//! ledger. All amounts are `U256` base units; every division floors.
//!
//! ## Integration Points
//!
//! - **Input Sources**: Typed requests from the pool engine with a caller, recipient and deadline
//! - **Output Destinations**: Outcomes and [`PoolEvent`] records consumed by the engine's sinks
//! - **Identity**: Pools are keyed by `keccak256` of the sorted token pair ([`PoolKey`])
//! - **Validation**: Every operation returns [`AmmError`] before touching state
//!
//! ## Architecture Role
//!
//! ```text
//! v2_math ──▶ pool ◀── ledger
//!              │  ▲
//!      events ◀┘  └── pair
//! ```
//!
//! The library carries no locking or clock; the engine layers concurrency,
//! time and persistence on top of [`Pool`].

pub mod error;
pub mod events;
pub mod ledger;
pub mod pair;
pub mod pool;
pub mod pool_traits;
pub mod units;
pub mod v2_math;

pub use error::{AmmError, AmmResult};
pub use events::PoolEvent;
pub use ledger::LiquidityLedger;
pub use pair::{PoolKey, Side, TokenPair};
pub use pool::{
    AddLiquidityOutcome, AddLiquidityRequest, Pool, PoolInfo, RemoveLiquidityOutcome,
    RemoveLiquidityRequest, SwapOutcome, SwapRequest,
};
pub use pool_traits::AmmPool;
pub use units::{format_units, parse_units};
pub use v2_math::{FeeSchedule, V2Math};

/// Common types for AMM calculations
pub use rust_decimal::Decimal;
pub use web3::types::{Address, U256};
