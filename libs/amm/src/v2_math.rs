//! Constant-product (x * y = k) pool math
//!
//! Integer arithmetic on `U256` with checked operations. Every division
//! floors, so rounding remainders always stay with the pool.

use crate::error::{AmmError, AmmResult};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use web3::types::U256;

/// Default swap fee numerator (3 / 1000 = 0.3%)
pub const FEE_NUMERATOR: u32 = 3;
/// Default swap fee denominator
pub const FEE_DENOMINATOR: u32 = 1_000;
/// Basis-point denominator (10 000 = 100%)
pub const BPS_DENOMINATOR: u32 = 10_000;
/// Decimal places used for scaled prices
pub const PRICE_DECIMALS: usize = 18;

/// `10^18`, the fixed-point scale for prices
pub fn price_scale() -> U256 {
    U256::exp10(PRICE_DECIMALS)
}

/// Swap fee taken on the input amount, as `numerator / denominator`
///
/// Deserialization goes through [`FeeSchedule::new`], so a decoded schedule
/// always has a positive denominator above the numerator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawFeeSchedule")]
pub struct FeeSchedule {
    numerator: u32,
    denominator: u32,
}

#[derive(Deserialize)]
struct RawFeeSchedule {
    numerator: u32,
    denominator: u32,
}

impl TryFrom<RawFeeSchedule> for FeeSchedule {
    type Error = AmmError;

    fn try_from(raw: RawFeeSchedule) -> AmmResult<Self> {
        Self::new(raw.numerator, raw.denominator)
    }
}

impl FeeSchedule {
    pub fn new(numerator: u32, denominator: u32) -> AmmResult<Self> {
        if denominator == 0 {
            return Err(AmmError::InvalidFee("denominator must be positive"));
        }
        if numerator >= denominator {
            return Err(AmmError::InvalidFee("fee must be below 100%"));
        }
        Ok(Self {
            numerator,
            denominator,
        })
    }

    pub fn numerator(&self) -> u32 {
        self.numerator
    }

    pub fn denominator(&self) -> u32 {
        self.denominator
    }

    /// `denominator - numerator`, the share of the input that is priced
    pub fn retained(&self) -> u32 {
        self.denominator - self.numerator
    }

    pub fn is_zero(&self) -> bool {
        self.numerator == 0
    }
}

impl Default for FeeSchedule {
    fn default() -> Self {
        Self {
            numerator: FEE_NUMERATOR,
            denominator: FEE_DENOMINATOR,
        }
    }
}

/// Constant-product math with floor rounding
pub struct V2Math;

impl V2Math {
    /// Maximum output the constant product allows for `amount_in`, fee taken on input
    ///
    /// ```text
    /// in_with_fee = amount_in * (D - N)
    /// amount_out  = in_with_fee * reserve_out / (reserve_in * D + in_with_fee)
    /// ```
    pub fn get_amount_out(
        amount_in: U256,
        reserve_in: U256,
        reserve_out: U256,
        fee: FeeSchedule,
    ) -> AmmResult<U256> {
        if amount_in.is_zero() {
            return Err(AmmError::InsufficientInputAmount);
        }
        if reserve_in.is_zero() || reserve_out.is_zero() {
            return Err(AmmError::InsufficientLiquidity);
        }

        let amount_in_with_fee = amount_in
            .checked_mul(U256::from(fee.retained()))
            .ok_or(AmmError::Overflow("amount_in with fee"))?;
        let numerator = amount_in_with_fee
            .checked_mul(reserve_out)
            .ok_or(AmmError::Overflow("amount_out numerator"))?;
        let denominator = reserve_in
            .checked_mul(U256::from(fee.denominator()))
            .and_then(|scaled| scaled.checked_add(amount_in_with_fee))
            .ok_or(AmmError::Overflow("amount_out denominator"))?;

        Ok(numerator / denominator)
    }

    /// Smallest input that yields at least `amount_out` (rounded up by one unit)
    pub fn get_amount_in(
        amount_out: U256,
        reserve_in: U256,
        reserve_out: U256,
        fee: FeeSchedule,
    ) -> AmmResult<U256> {
        if amount_out.is_zero() {
            return Err(AmmError::InsufficientOutputAmount);
        }
        if reserve_in.is_zero() || reserve_out.is_zero() || amount_out >= reserve_out {
            return Err(AmmError::InsufficientLiquidity);
        }

        let numerator = reserve_in
            .checked_mul(amount_out)
            .and_then(|n| n.checked_mul(U256::from(fee.denominator())))
            .ok_or(AmmError::Overflow("amount_in numerator"))?;
        let denominator = (reserve_out - amount_out)
            .checked_mul(U256::from(fee.retained()))
            .ok_or(AmmError::Overflow("amount_in denominator"))?;

        (numerator / denominator)
            .checked_add(U256::one())
            .ok_or(AmmError::Overflow("amount_in rounding"))
    }

    /// Amount of B matching `amount_a` at the current reserve ratio (floored)
    pub fn quote(amount_a: U256, reserve_a: U256, reserve_b: U256) -> AmmResult<U256> {
        if amount_a.is_zero() {
            return Err(AmmError::InsufficientInputAmount);
        }
        if reserve_a.is_zero() || reserve_b.is_zero() {
            return Err(AmmError::InsufficientLiquidity);
        }
        let numerator = amount_a
            .checked_mul(reserve_b)
            .ok_or(AmmError::Overflow("quote numerator"))?;
        Ok(numerator / reserve_a)
    }

    /// `floor(sqrt(a * b))`, the share count minted by a first deposit
    pub fn geometric_mean(amount_a: U256, amount_b: U256) -> AmmResult<U256> {
        let product = amount_a
            .checked_mul(amount_b)
            .ok_or(AmmError::Overflow("initial deposit product"))?;
        Ok(product.integer_sqrt())
    }

    /// Price of one base unit in quote units, scaled by `10^18`
    pub fn spot_price(reserve_base: U256, reserve_quote: U256) -> AmmResult<U256> {
        if reserve_base.is_zero() || reserve_quote.is_zero() {
            return Err(AmmError::NoLiquidity);
        }
        let numerator = reserve_quote
            .checked_mul(price_scale())
            .ok_or(AmmError::Overflow("spot price"))?;
        Ok(numerator / reserve_base)
    }

    /// Price impact of a trade as a percentage with two decimal places
    ///
    /// Compares the scaled spot price before and after applying
    /// `(+amount_in, -amount_out)` to the reserves. Empty reserves report zero.
    pub fn price_impact(
        amount_in: U256,
        reserve_in: U256,
        reserve_out: U256,
        amount_out: U256,
    ) -> AmmResult<Decimal> {
        if reserve_in.is_zero() || reserve_out.is_zero() {
            return Ok(Decimal::ZERO);
        }

        let before = Self::spot_price(reserve_in, reserve_out)?;
        let out_after = reserve_out
            .checked_sub(amount_out)
            .ok_or(AmmError::InsufficientLiquidity)?;
        let in_after = reserve_in
            .checked_add(amount_in)
            .ok_or(AmmError::Overflow("reserve_in after trade"))?;
        let after = out_after
            .checked_mul(price_scale())
            .ok_or(AmmError::Overflow("spot price after trade"))?
            / in_after;

        if before.is_zero() {
            return Ok(Decimal::ZERO);
        }

        let diff = if after > before {
            after - before
        } else {
            before - after
        };
        let bps = diff
            .checked_mul(U256::from(BPS_DENOMINATOR))
            .ok_or(AmmError::Overflow("price impact"))?
            / before;

        // the after-price never exceeds the before-price for a real trade
        let bps = bps.min(U256::from(BPS_DENOMINATOR)).low_u64();
        Ok(Decimal::new(bps as i64, 2))
    }

    /// Slippage floor: `amount * (10000 - bps) / 10000`
    pub fn min_amount_after_slippage(amount: U256, slippage_bps: u32) -> AmmResult<U256> {
        if slippage_bps > BPS_DENOMINATOR {
            return Err(AmmError::InvalidUnits("slippage above 100%"));
        }
        let kept = amount
            .checked_mul(U256::from(BPS_DENOMINATOR - slippage_bps))
            .ok_or(AmmError::Overflow("slippage floor"))?;
        Ok(kept / U256::from(BPS_DENOMINATOR))
    }
}
