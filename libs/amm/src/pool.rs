//! Constant-product pool state machine
//!
//! A [`Pool`] owns the reserves of one token pair and its LP ledger. The
//! three mutating operations compute their complete result first and only
//! then write it back, so any returned error leaves the pool unchanged.
//!
//! ```text
//!           add_liquidity                swap (self-loop)
//!   Empty ───────────────▶ Funded ◀──────────────┐
//!     ▲                      │  └────────────────┘
//!     └──────────────────────┘
//!      remove_liquidity (all shares)
//! ```

use crate::error::{AmmError, AmmResult};
use crate::events::PoolEvent;
use crate::ledger::LiquidityLedger;
use crate::pair::{PoolKey, Side, TokenPair};
use crate::v2_math::{FeeSchedule, V2Math};
use serde::{Deserialize, Serialize};
use tracing::debug;
use web3::types::{Address, U256};

/// Snapshot of the pool totals, read atomically
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolInfo {
    pub reserve_a: U256,
    pub reserve_b: U256,
    pub total_supply: U256,
}

/// Deposit into a pool. Tokens may be given in either order; amounts follow them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddLiquidityRequest {
    pub token_a: Address,
    pub token_b: Address,
    pub amount_a_desired: U256,
    pub amount_b_desired: U256,
    pub amount_a_min: U256,
    pub amount_b_min: U256,
    pub to: Address,
    pub deadline: u64,
}

/// Withdrawal of `liquidity` shares owned by the caller
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoveLiquidityRequest {
    pub token_a: Address,
    pub token_b: Address,
    pub liquidity: U256,
    pub amount_a_min: U256,
    pub amount_b_min: U256,
    pub to: Address,
    pub deadline: u64,
}

/// Exact-input swap along `path = [token_in, token_out]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapRequest {
    pub amount_in: U256,
    pub amount_out_min: U256,
    pub path: Vec<Address>,
    pub to: Address,
    pub deadline: u64,
}

/// Amounts are reported in the caller's token order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddLiquidityOutcome {
    pub amount_a: U256,
    pub amount_b: U256,
    pub liquidity: U256,
    pub event: PoolEvent,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoveLiquidityOutcome {
    pub amount_a: U256,
    pub amount_b: U256,
    pub to: Address,
    pub event: PoolEvent,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapOutcome {
    /// `[amount_in, amount_out]`
    pub amounts: Vec<U256>,
    pub to: Address,
    pub event: PoolEvent,
}

impl SwapOutcome {
    pub fn amount_out(&self) -> U256 {
        self.amounts[1]
    }
}

fn ensure_live(deadline: u64, now: u64) -> AmmResult<()> {
    if now > deadline {
        return Err(AmmError::Expired);
    }
    Ok(())
}

fn ensure_recipient(to: &Address) -> AmmResult<()> {
    if to.is_zero() {
        return Err(AmmError::ZeroAddress);
    }
    Ok(())
}

/// Swap A/B labels on slippage errors when the caller used reversed order
fn reorient(err: AmmError, reversed: bool) -> AmmError {
    match (err, reversed) {
        (AmmError::InsufficientAmountA, true) => AmmError::InsufficientAmountB,
        (AmmError::InsufficientAmountB, true) => AmmError::InsufficientAmountA,
        (other, _) => other,
    }
}

/// Reserve state and LP ledger for one token pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pool {
    pair: TokenPair,
    fee: FeeSchedule,
    reserve_a: U256,
    reserve_b: U256,
    ledger: LiquidityLedger,
    sequence: u64,
}

impl Pool {
    /// Create an empty pool for `(token_a, token_b)`
    pub fn new(token_a: Address, token_b: Address, fee: FeeSchedule) -> AmmResult<Self> {
        Ok(Self {
            pair: TokenPair::new(token_a, token_b)?,
            fee,
            reserve_a: U256::zero(),
            reserve_b: U256::zero(),
            ledger: LiquidityLedger::new(),
            sequence: 0,
        })
    }

    pub fn pair(&self) -> &TokenPair {
        &self.pair
    }

    pub fn key(&self) -> PoolKey {
        self.pair.key()
    }

    pub fn token_a(&self) -> Address {
        self.pair.token_a()
    }

    pub fn token_b(&self) -> Address {
        self.pair.token_b()
    }

    pub fn fee(&self) -> FeeSchedule {
        self.fee
    }

    pub fn reserve_a(&self) -> U256 {
        self.reserve_a
    }

    pub fn reserve_b(&self) -> U256 {
        self.reserve_b
    }

    pub fn total_supply(&self) -> U256 {
        self.ledger.total_supply()
    }

    pub fn liquidity_balance(&self, user: &Address) -> U256 {
        self.ledger.balance_of(user)
    }

    pub fn ledger(&self) -> &LiquidityLedger {
        &self.ledger
    }

    /// Count of successful mutations applied to this pool
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    pub fn is_empty(&self) -> bool {
        self.ledger.total_supply().is_zero()
    }

    pub fn info(&self) -> PoolInfo {
        PoolInfo {
            reserve_a: self.reserve_a,
            reserve_b: self.reserve_b,
            total_supply: self.ledger.total_supply(),
        }
    }

    fn reserve(&self, side: Side) -> U256 {
        match side {
            Side::A => self.reserve_a,
            Side::B => self.reserve_b,
        }
    }

    /// `(reserve_in, reserve_out)` when selling `token_in`
    pub fn reserves_for(&self, token_in: &Address) -> AmmResult<(U256, U256)> {
        let side = self.pair.side_of(token_in).ok_or(AmmError::InvalidPath)?;
        Ok((self.reserve(side), self.reserve(side.other())))
    }

    /// Pure pricing with this pool's fee; does not read the reserves
    pub fn get_amount_out(
        &self,
        amount_in: U256,
        reserve_in: U256,
        reserve_out: U256,
    ) -> AmmResult<U256> {
        V2Math::get_amount_out(amount_in, reserve_in, reserve_out, self.fee)
    }

    /// Price of one `base` in `quote` units, scaled by `10^18`
    pub fn get_price(&self, base: &Address, quote: &Address) -> AmmResult<U256> {
        let reversed = self.pair.orientation(base, quote)?;
        if reversed {
            V2Math::spot_price(self.reserve_b, self.reserve_a)
        } else {
            V2Math::spot_price(self.reserve_a, self.reserve_b)
        }
    }

    /// Structural invariants: symmetric emptiness and a closed ledger
    pub fn check_invariants(&self) -> bool {
        let reserves_ok = self.reserve_a.is_zero() == self.reserve_b.is_zero();
        let supply_ok = self.ledger.total_supply().is_zero() == self.reserve_a.is_zero();
        reserves_ok && supply_ok && self.ledger.is_consistent()
    }

    /// Deposit along the current reserve ratio and mint LP shares to `request.to`
    ///
    /// First deposit mints `floor(sqrt(a * b))`; later deposits mint
    /// `min(a * L / Ra, b * L / Rb)` after trimming the larger side to the
    /// pool ratio.
    pub fn add_liquidity(
        &mut self,
        caller: Address,
        request: &AddLiquidityRequest,
        now: u64,
    ) -> AmmResult<AddLiquidityOutcome> {
        ensure_live(request.deadline, now)?;
        ensure_recipient(&request.to)?;
        let reversed = self.pair.orientation(&request.token_a, &request.token_b)?;

        let (a_desired, b_desired, a_min, b_min) = if reversed {
            (
                request.amount_b_desired,
                request.amount_a_desired,
                request.amount_b_min,
                request.amount_a_min,
            )
        } else {
            (
                request.amount_a_desired,
                request.amount_b_desired,
                request.amount_a_min,
                request.amount_b_min,
            )
        };

        let (amount_a, amount_b, minted) = self
            .plan_deposit(a_desired, b_desired, a_min, b_min)
            .map_err(|e| reorient(e, reversed))?;

        let new_reserve_a = self
            .reserve_a
            .checked_add(amount_a)
            .ok_or(AmmError::Overflow("reserve_a after deposit"))?;
        let new_reserve_b = self
            .reserve_b
            .checked_add(amount_b)
            .ok_or(AmmError::Overflow("reserve_b after deposit"))?;

        let seeding = self.is_empty();
        self.ledger.mint(request.to, minted)?;
        self.reserve_a = new_reserve_a;
        self.reserve_b = new_reserve_b;
        self.sequence += 1;
        if seeding {
            debug!(pool = %self.key(), %minted, "pool seeded");
        }

        let event = PoolEvent::LiquidityAdded {
            pool: self.key(),
            sequence: self.sequence,
            user: caller,
            amount_a,
            amount_b,
            liquidity: minted,
        };

        let (amount_a, amount_b) = if reversed {
            (amount_b, amount_a)
        } else {
            (amount_a, amount_b)
        };
        Ok(AddLiquidityOutcome {
            amount_a,
            amount_b,
            liquidity: minted,
            event,
        })
    }

    /// `(used_a, used_b, minted)` in pool order, without touching state
    fn plan_deposit(
        &self,
        a_desired: U256,
        b_desired: U256,
        a_min: U256,
        b_min: U256,
    ) -> AmmResult<(U256, U256, U256)> {
        let total = self.ledger.total_supply();

        if total.is_zero() {
            let minted = V2Math::geometric_mean(a_desired, b_desired)?;
            if minted.is_zero() {
                return Err(AmmError::InsufficientLiquidityMinted);
            }
            return Ok((a_desired, b_desired, minted));
        }

        let b_optimal = a_desired
            .checked_mul(self.reserve_b)
            .ok_or(AmmError::Overflow("optimal amount B"))?
            / self.reserve_a;

        let (used_a, used_b) = if b_optimal <= b_desired {
            if b_optimal < b_min {
                return Err(AmmError::InsufficientAmountB);
            }
            (a_desired, b_optimal)
        } else {
            let a_optimal = b_desired
                .checked_mul(self.reserve_a)
                .ok_or(AmmError::Overflow("optimal amount A"))?
                / self.reserve_b;
            if a_optimal < a_min {
                return Err(AmmError::InsufficientAmountA);
            }
            (a_optimal, b_desired)
        };

        let from_a = used_a
            .checked_mul(total)
            .ok_or(AmmError::Overflow("shares from A"))?
            / self.reserve_a;
        let from_b = used_b
            .checked_mul(total)
            .ok_or(AmmError::Overflow("shares from B"))?
            / self.reserve_b;
        let minted = from_a.min(from_b);

        if minted.is_zero() {
            return Err(AmmError::InsufficientLiquidityMinted);
        }
        Ok((used_a, used_b, minted))
    }

    /// Burn `liquidity` of the caller's shares for a pro-rata cut of both reserves
    pub fn remove_liquidity(
        &mut self,
        caller: Address,
        request: &RemoveLiquidityRequest,
        now: u64,
    ) -> AmmResult<RemoveLiquidityOutcome> {
        ensure_live(request.deadline, now)?;
        ensure_recipient(&request.to)?;
        let reversed = self.pair.orientation(&request.token_a, &request.token_b)?;

        if request.liquidity > self.ledger.balance_of(&caller) {
            return Err(AmmError::InsufficientLiquidityBalance);
        }
        if request.liquidity.is_zero() {
            return Err(AmmError::InsufficientLiquidityBurned);
        }

        // balance >= liquidity > 0, so supply is non-zero
        let total = self.ledger.total_supply();
        let amount_a = request
            .liquidity
            .checked_mul(self.reserve_a)
            .ok_or(AmmError::Overflow("withdrawal A"))?
            / total;
        let amount_b = request
            .liquidity
            .checked_mul(self.reserve_b)
            .ok_or(AmmError::Overflow("withdrawal B"))?
            / total;

        if amount_a.is_zero() || amount_b.is_zero() {
            return Err(AmmError::InsufficientLiquidityBurned);
        }

        let (a_min, b_min) = if reversed {
            (request.amount_b_min, request.amount_a_min)
        } else {
            (request.amount_a_min, request.amount_b_min)
        };
        if amount_a < a_min {
            return Err(reorient(AmmError::InsufficientAmountA, reversed));
        }
        if amount_b < b_min {
            return Err(reorient(AmmError::InsufficientAmountB, reversed));
        }

        self.ledger.burn(caller, request.liquidity)?;
        self.reserve_a -= amount_a;
        self.reserve_b -= amount_b;
        self.sequence += 1;
        if self.is_empty() {
            debug!(pool = %self.key(), "pool drained");
        }

        let event = PoolEvent::LiquidityRemoved {
            pool: self.key(),
            sequence: self.sequence,
            user: caller,
            amount_a,
            amount_b,
            liquidity: request.liquidity,
        };

        let (amount_a, amount_b) = if reversed {
            (amount_b, amount_a)
        } else {
            (amount_a, amount_b)
        };
        Ok(RemoveLiquidityOutcome {
            amount_a,
            amount_b,
            to: request.to,
            event,
        })
    }

    /// Sell exactly `amount_in` of `path[0]` for at least `amount_out_min` of `path[1]`
    pub fn swap_exact_tokens_for_tokens(
        &mut self,
        caller: Address,
        request: &SwapRequest,
        now: u64,
    ) -> AmmResult<SwapOutcome> {
        ensure_live(request.deadline, now)?;
        ensure_recipient(&request.to)?;

        let (token_in, token_out) = match request.path.as_slice() {
            [token_in, token_out] => (*token_in, *token_out),
            _ => return Err(AmmError::InvalidPath),
        };
        let side_in = match self.pair.orientation(&token_in, &token_out)? {
            false => Side::A,
            true => Side::B,
        };

        let reserve_in = self.reserve(side_in);
        let reserve_out = self.reserve(side_in.other());
        let amount_out = self.get_amount_out(request.amount_in, reserve_in, reserve_out)?;

        if amount_out.is_zero() || amount_out < request.amount_out_min {
            return Err(AmmError::InsufficientOutputAmount);
        }

        let new_reserve_in = reserve_in
            .checked_add(request.amount_in)
            .ok_or(AmmError::Overflow("reserve_in after swap"))?;
        // amount_out < reserve_out by construction of the formula
        let new_reserve_out = reserve_out - amount_out;

        match side_in {
            Side::A => {
                self.reserve_a = new_reserve_in;
                self.reserve_b = new_reserve_out;
            }
            Side::B => {
                self.reserve_b = new_reserve_in;
                self.reserve_a = new_reserve_out;
            }
        }
        self.sequence += 1;

        let event = PoolEvent::TokensSwapped {
            pool: self.key(),
            sequence: self.sequence,
            user: caller,
            token_in,
            token_out,
            amount_in: request.amount_in,
            amount_out,
        };

        Ok(SwapOutcome {
            amounts: vec![request.amount_in, amount_out],
            to: request.to,
            event,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: u64 = 1_700_000_000;

    fn addr(byte: u8) -> Address {
        Address::repeat_byte(byte)
    }

    fn u(v: u64) -> U256 {
        U256::from(v)
    }

    fn pool() -> Pool {
        Pool::new(addr(0x0a), addr(0x0b), FeeSchedule::default()).unwrap()
    }

    fn deposit(a: u64, b: u64, to: Address) -> AddLiquidityRequest {
        AddLiquidityRequest {
            token_a: addr(0x0a),
            token_b: addr(0x0b),
            amount_a_desired: u(a),
            amount_b_desired: u(b),
            amount_a_min: U256::zero(),
            amount_b_min: U256::zero(),
            to,
            deadline: NOW + 1200,
        }
    }

    fn sell_a(amount_in: u64) -> SwapRequest {
        SwapRequest {
            amount_in: u(amount_in),
            amount_out_min: U256::zero(),
            path: vec![addr(0x0a), addr(0x0b)],
            to: addr(0xc1),
            deadline: NOW + 1200,
        }
    }

    #[test]
    fn test_first_deposit_uses_geometric_mean() {
        let mut pool = pool();
        let alice = addr(0xa1);
        let outcome = pool.add_liquidity(addr(0xa1), &deposit(1000, 2000, alice), NOW).unwrap();

        assert_eq!(outcome.amount_a, u(1000));
        assert_eq!(outcome.amount_b, u(2000));
        assert_eq!(outcome.liquidity, u(1414));
        assert_eq!(pool.liquidity_balance(&alice), u(1414));
        assert_eq!(
            pool.info(),
            PoolInfo {
                reserve_a: u(1000),
                reserve_b: u(2000),
                total_supply: u(1414),
            }
        );
        assert!(pool.check_invariants());
    }

    #[test]
    fn test_second_deposit_trims_to_ratio() {
        let mut pool = pool();
        pool.add_liquidity(addr(0xa1), &deposit(1000, 2000, addr(0xa1)), NOW).unwrap();

        // B side over-supplied: only 1000 B is used for 500 A
        let outcome = pool.add_liquidity(addr(0xa1), &deposit(500, 5000, addr(0xb0)), NOW).unwrap();
        assert_eq!(outcome.amount_a, u(500));
        assert_eq!(outcome.amount_b, u(1000));
        assert_eq!(outcome.liquidity, u(707));

        // A side over-supplied
        let outcome = pool.add_liquidity(addr(0xa1), &deposit(5000, 300, addr(0xb0)), NOW).unwrap();
        assert_eq!(outcome.amount_a, u(150));
        assert_eq!(outcome.amount_b, u(300));
        assert!(pool.check_invariants());
    }

    #[test]
    fn test_deposit_slippage_floors() {
        let mut pool = pool();
        pool.add_liquidity(addr(0xa1), &deposit(1000, 2000, addr(0xa1)), NOW).unwrap();
        let before = pool.clone();

        let mut req = deposit(500, 5000, addr(0xb0));
        req.amount_b_min = u(1001);
        assert_eq!(
            pool.add_liquidity(addr(0xa1), &req, NOW),
            Err(AmmError::InsufficientAmountB)
        );

        let mut req = deposit(5000, 300, addr(0xb0));
        req.amount_a_min = u(151);
        assert_eq!(
            pool.add_liquidity(addr(0xa1), &req, NOW),
            Err(AmmError::InsufficientAmountA)
        );
        assert_eq!(pool, before);
    }

    #[test]
    fn test_reversed_token_order_reports_in_caller_order() {
        let mut pool = pool();
        let req = AddLiquidityRequest {
            token_a: addr(0x0b),
            token_b: addr(0x0a),
            ..deposit(2000, 1000, addr(0xa1))
        };
        let outcome = pool.add_liquidity(addr(0xa1), &req, NOW).unwrap();

        assert_eq!(pool.reserve_a(), u(1000));
        assert_eq!(pool.reserve_b(), u(2000));
        assert_eq!(outcome.amount_a, u(2000));
        assert_eq!(outcome.amount_b, u(1000));

        // caller's "A" is the pool's B
        let mut req = AddLiquidityRequest {
            token_a: addr(0x0b),
            token_b: addr(0x0a),
            ..deposit(5000, 500, addr(0xa1))
        };
        req.amount_a_min = u(1001);
        assert_eq!(
            pool.add_liquidity(addr(0xa1), &req, NOW),
            Err(AmmError::InsufficientAmountA)
        );
    }

    #[test]
    fn test_dust_first_deposit_rejected() {
        let mut pool = pool();
        assert_eq!(
            pool.add_liquidity(addr(0xa1), &deposit(0, 2000, addr(0xa1)), NOW),
            Err(AmmError::InsufficientLiquidityMinted)
        );
        assert!(pool.is_empty());
    }

    #[test]
    fn test_swap_moves_reserves_and_grows_k() {
        let mut pool = pool();
        pool.add_liquidity(addr(0xa1), &deposit(10_000, 10_000, addr(0xa1)), NOW).unwrap();

        let outcome = pool
            .swap_exact_tokens_for_tokens(addr(0xc1), &sell_a(1000), NOW)
            .unwrap();
        assert_eq!(outcome.amounts, vec![u(1000), u(906)]);
        assert_eq!(pool.reserve_a(), u(11_000));
        assert_eq!(pool.reserve_b(), u(9_094));
        assert!(u(11_000) * u(9_094) > u(10_000) * u(10_000));
        assert!(matches!(
            outcome.event,
            PoolEvent::TokensSwapped { sequence: 2, .. }
        ));
    }

    #[test]
    fn test_swap_guards_leave_pool_unchanged() {
        let mut pool = pool();
        pool.add_liquidity(addr(0xa1), &deposit(10_000, 10_000, addr(0xa1)), NOW).unwrap();
        let before = pool.clone();

        let expired = SwapRequest {
            deadline: NOW - 1,
            ..sell_a(1000)
        };
        assert_eq!(
            pool.swap_exact_tokens_for_tokens(addr(0xc1), &expired, NOW),
            Err(AmmError::Expired)
        );

        let bad_path = SwapRequest {
            path: vec![addr(0x0a), addr(0x0a)],
            ..sell_a(1000)
        };
        assert_eq!(
            pool.swap_exact_tokens_for_tokens(addr(0xc1), &bad_path, NOW),
            Err(AmmError::InvalidPath)
        );

        let long_path = SwapRequest {
            path: vec![addr(0x0a), addr(0x0b), addr(0x0a)],
            ..sell_a(1000)
        };
        assert_eq!(
            pool.swap_exact_tokens_for_tokens(addr(0xc1), &long_path, NOW),
            Err(AmmError::InvalidPath)
        );

        let greedy = SwapRequest {
            amount_out_min: u(907),
            ..sell_a(1000)
        };
        assert_eq!(
            pool.swap_exact_tokens_for_tokens(addr(0xc1), &greedy, NOW),
            Err(AmmError::InsufficientOutputAmount)
        );

        assert_eq!(
            pool.swap_exact_tokens_for_tokens(addr(0xc1), &sell_a(1), NOW),
            Err(AmmError::InsufficientOutputAmount)
        );

        assert_eq!(
            pool.swap_exact_tokens_for_tokens(addr(0xc1), &sell_a(0), NOW),
            Err(AmmError::InsufficientInputAmount)
        );
        assert_eq!(pool, before);
    }

    #[test]
    fn test_swap_on_empty_pool_fails() {
        let mut pool = pool();
        assert_eq!(
            pool.swap_exact_tokens_for_tokens(addr(0xc1), &sell_a(1000), NOW),
            Err(AmmError::InsufficientLiquidity)
        );
    }

    #[test]
    fn test_deadline_equal_to_now_is_live() {
        let mut pool = pool();
        let req = AddLiquidityRequest {
            deadline: NOW,
            ..deposit(1000, 1000, addr(0xa1))
        };
        assert!(pool.add_liquidity(addr(0xa1), &req, NOW).is_ok());
    }

    #[test]
    fn test_remove_all_returns_to_empty() {
        let mut pool = pool();
        let alice = addr(0xa1);
        pool.add_liquidity(addr(0xa1), &deposit(1000, 2000, alice), NOW).unwrap();

        let req = RemoveLiquidityRequest {
            token_a: addr(0x0a),
            token_b: addr(0x0b),
            liquidity: u(1414),
            amount_a_min: U256::zero(),
            amount_b_min: U256::zero(),
            to: alice,
            deadline: NOW,
        };
        let outcome = pool.remove_liquidity(alice, &req, NOW).unwrap();

        assert_eq!(outcome.amount_a, u(1000));
        assert_eq!(outcome.amount_b, u(2000));
        assert!(pool.is_empty());
        assert_eq!(pool.info().reserve_a, U256::zero());
        assert!(pool.check_invariants());

        // re-seed with a different ratio
        pool.add_liquidity(addr(0xa1), &deposit(10, 40, alice), NOW).unwrap();
        assert_eq!(pool.total_supply(), u(20));
    }

    #[test]
    fn test_remove_over_balance_rejected() {
        let mut pool = pool();
        let alice = addr(0xa1);
        pool.add_liquidity(addr(0xa1), &deposit(1000, 2000, alice), NOW).unwrap();
        let before = pool.clone();

        let req = RemoveLiquidityRequest {
            token_a: addr(0x0a),
            token_b: addr(0x0b),
            liquidity: u(1415),
            amount_a_min: U256::zero(),
            amount_b_min: U256::zero(),
            to: alice,
            deadline: NOW,
        };
        assert_eq!(
            pool.remove_liquidity(alice, &req, NOW),
            Err(AmmError::InsufficientLiquidityBalance)
        );
        // someone else's shares are not the caller's
        assert_eq!(
            pool.remove_liquidity(addr(0xee), &RemoveLiquidityRequest { liquidity: u(1), ..req.clone() }, NOW),
            Err(AmmError::InsufficientLiquidityBalance)
        );
        assert_eq!(pool, before);
    }

    #[test]
    fn test_remove_slippage_and_dust() {
        let mut pool = pool();
        let alice = addr(0xa1);
        pool.add_liquidity(addr(0xa1), &deposit(1000, 2000, alice), NOW).unwrap();

        let base = RemoveLiquidityRequest {
            token_a: addr(0x0a),
            token_b: addr(0x0b),
            liquidity: u(707),
            amount_a_min: U256::zero(),
            amount_b_min: U256::zero(),
            to: alice,
            deadline: NOW,
        };
        let req = RemoveLiquidityRequest {
            amount_a_min: u(501),
            ..base.clone()
        };
        assert_eq!(
            pool.remove_liquidity(alice, &req, NOW),
            Err(AmmError::InsufficientAmountA)
        );
        let req = RemoveLiquidityRequest {
            amount_b_min: u(1001),
            ..base.clone()
        };
        assert_eq!(
            pool.remove_liquidity(alice, &req, NOW),
            Err(AmmError::InsufficientAmountB)
        );
        let req = RemoveLiquidityRequest {
            liquidity: U256::zero(),
            ..base
        };
        assert_eq!(
            pool.remove_liquidity(alice, &req, NOW),
            Err(AmmError::InsufficientLiquidityBurned)
        );
    }

    #[test]
    fn test_zero_recipient_rejected() {
        let mut pool = pool();
        assert_eq!(
            pool.add_liquidity(addr(0xa1), &deposit(1000, 1000, Address::zero()), NOW),
            Err(AmmError::ZeroAddress)
        );
    }

    #[test]
    fn test_price_query() {
        let mut pool = pool();
        assert_eq!(
            pool.get_price(&addr(0x0a), &addr(0x0b)),
            Err(AmmError::NoLiquidity)
        );
        pool.add_liquidity(addr(0xa1), &deposit(1000, 2000, addr(0xa1)), NOW).unwrap();
        assert_eq!(
            pool.get_price(&addr(0x0a), &addr(0x0b)).unwrap(),
            U256::exp10(18) * u(2)
        );
        assert_eq!(
            pool.get_price(&addr(0x0b), &addr(0x0a)).unwrap(),
            U256::exp10(17) * u(5)
        );
    }
}
