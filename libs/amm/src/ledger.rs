//! LP share ledger
//!
//! Balances and total supply only change together, through [`LiquidityLedger::mint`]
//! and [`LiquidityLedger::burn`], so `sum(balances) == total_supply` holds by
//! construction.

use crate::error::{AmmError, AmmResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use web3::types::{Address, U256};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiquidityLedger {
    balances: HashMap<Address, U256>,
    total_supply: U256,
}

impl LiquidityLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn total_supply(&self) -> U256 {
        self.total_supply
    }

    pub fn balance_of(&self, owner: &Address) -> U256 {
        self.balances.get(owner).copied().unwrap_or_default()
    }

    /// Number of providers holding a non-zero balance
    pub fn holders(&self) -> usize {
        self.balances.len()
    }

    /// Credit `amount` shares to `to`. Nothing changes on error.
    pub fn mint(&mut self, to: Address, amount: U256) -> AmmResult<()> {
        let new_supply = self
            .total_supply
            .checked_add(amount)
            .ok_or(AmmError::Overflow("total supply"))?;
        let new_balance = self
            .balance_of(&to)
            .checked_add(amount)
            .ok_or(AmmError::Overflow("liquidity balance"))?;

        self.total_supply = new_supply;
        if !new_balance.is_zero() {
            self.balances.insert(to, new_balance);
        }
        Ok(())
    }

    /// Debit `amount` shares from `from`. Nothing changes on error.
    pub fn burn(&mut self, from: Address, amount: U256) -> AmmResult<()> {
        let new_balance = self
            .balance_of(&from)
            .checked_sub(amount)
            .ok_or(AmmError::InsufficientLiquidityBalance)?;
        let new_supply = self
            .total_supply
            .checked_sub(amount)
            .ok_or(AmmError::InsufficientLiquidityBalance)?;

        self.total_supply = new_supply;
        if new_balance.is_zero() {
            self.balances.remove(&from);
        } else {
            self.balances.insert(from, new_balance);
        }
        Ok(())
    }

    /// Recompute the supply from balances; used to verify restored state
    pub fn is_consistent(&self) -> bool {
        let mut sum = U256::zero();
        for balance in self.balances.values() {
            match sum.checked_add(*balance) {
                Some(next) => sum = next,
                None => return false,
            }
        }
        sum == self.total_supply
    }
}
