//! Records emitted by successful pool mutations

use crate::pair::PoolKey;
use serde::{Deserialize, Serialize};
use web3::types::{Address, U256};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event")]
pub enum PoolEvent {
    LiquidityAdded {
        pool: PoolKey,
        sequence: u64,
        user: Address,
        amount_a: U256,
        amount_b: U256,
        liquidity: U256,
    },
    LiquidityRemoved {
        pool: PoolKey,
        sequence: u64,
        user: Address,
        amount_a: U256,
        amount_b: U256,
        liquidity: U256,
    },
    TokensSwapped {
        pool: PoolKey,
        sequence: u64,
        user: Address,
        token_in: Address,
        token_out: Address,
        amount_in: U256,
        amount_out: U256,
    },
}

impl PoolEvent {
    pub fn pool(&self) -> PoolKey {
        match self {
            PoolEvent::LiquidityAdded { pool, .. }
            | PoolEvent::LiquidityRemoved { pool, .. }
            | PoolEvent::TokensSwapped { pool, .. } => *pool,
        }
    }

    pub fn sequence(&self) -> u64 {
        match self {
            PoolEvent::LiquidityAdded { sequence, .. }
            | PoolEvent::LiquidityRemoved { sequence, .. }
            | PoolEvent::TokensSwapped { sequence, .. } => *sequence,
        }
    }

    pub fn user(&self) -> Address {
        match self {
            PoolEvent::LiquidityAdded { user, .. }
            | PoolEvent::LiquidityRemoved { user, .. }
            | PoolEvent::TokensSwapped { user, .. } => *user,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            PoolEvent::LiquidityAdded { .. } => "LiquidityAdded",
            PoolEvent::LiquidityRemoved { .. } => "LiquidityRemoved",
            PoolEvent::TokensSwapped { .. } => "TokensSwapped",
        }
    }
}
