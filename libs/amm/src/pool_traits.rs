//! Pool trait definitions for a uniform pricing interface

use crate::error::AmmResult;
use crate::pool::Pool;
use crate::v2_math::V2Math;
use rust_decimal::Decimal;
use web3::types::{Address, U256};

/// Read-only pricing against live reserves
pub trait AmmPool {
    /// Output for selling `amount_in` of `token_in`
    fn amount_out_for(&self, token_in: &Address, amount_in: U256) -> AmmResult<U256>;

    /// Input needed to buy `amount_out` of `token_out`
    fn amount_in_for(&self, token_out: &Address, amount_out: U256) -> AmmResult<U256>;

    /// Current reserves `(a, b)`
    fn get_liquidity(&self) -> (U256, U256);

    /// Percentage move of the spot price caused by selling `amount_in` of `token_in`
    fn price_impact_for(&self, token_in: &Address, amount_in: U256) -> AmmResult<Decimal>;
}

impl AmmPool for Pool {
    fn amount_out_for(&self, token_in: &Address, amount_in: U256) -> AmmResult<U256> {
        let (reserve_in, reserve_out) = self.reserves_for(token_in)?;
        V2Math::get_amount_out(amount_in, reserve_in, reserve_out, self.fee())
    }

    fn amount_in_for(&self, token_out: &Address, amount_out: U256) -> AmmResult<U256> {
        let (reserve_out, reserve_in) = self.reserves_for(token_out)?;
        V2Math::get_amount_in(amount_out, reserve_in, reserve_out, self.fee())
    }

    fn get_liquidity(&self) -> (U256, U256) {
        (self.reserve_a(), self.reserve_b())
    }

    fn price_impact_for(&self, token_in: &Address, amount_in: U256) -> AmmResult<Decimal> {
        let (reserve_in, reserve_out) = self.reserves_for(token_in)?;
        if reserve_in.is_zero() || reserve_out.is_zero() {
            return Ok(Decimal::ZERO);
        }
        let amount_out = V2Math::get_amount_out(amount_in, reserve_in, reserve_out, self.fee())?;
        V2Math::price_impact(amount_in, reserve_in, reserve_out, amount_out)
    }
}
