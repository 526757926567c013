//! Pool Engine
//!
//! Registry of constant-product pools keyed by [`PoolKey`]. Each pool sits
//! behind its own `RwLock`: mutations hold the write lock for the whole
//! operation (giving a total order per pool) and queries take the read lock
//! for an atomic view of reserves and supply.

use crate::clock::{Clock, SystemClock};
use crate::error::{EngineError, EngineResult};
use crate::guard::ReentrancyGuard;
use crate::sink::EventSink;
use crate::traits::Stateful;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use parking_lot::RwLock;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use swap_amm::{
    AddLiquidityOutcome, AddLiquidityRequest, Address, AmmError, AmmPool, AmmResult,
    FeeSchedule, Pool, PoolEvent, PoolInfo, PoolKey, RemoveLiquidityOutcome,
    RemoveLiquidityRequest, SwapOutcome, SwapRequest, V2Math, U256,
};
use swap_config::EngineConfig;
use tracing::{debug, info, warn};

/// Parse a `0x`-prefixed (or bare) 20-byte hex address
pub fn parse_address(value: &str) -> EngineResult<Address> {
    value.trim().parse::<Address>().map_err(|e| {
        EngineError::InvalidConfig(format!("{:?} is not a 20-byte hex address: {}", value, e))
    })
}

/// Counters for operations processed by the engine
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineStats {
    pub total_pools: usize,
    pub liquidity_added: u64,
    pub liquidity_removed: u64,
    pub swaps: u64,
    pub rejected: u64,
    pub last_update: u64,
}

#[derive(Debug, Clone, Copy)]
enum Operation {
    AddLiquidity,
    RemoveLiquidity,
    Swap,
}

impl Operation {
    fn as_str(self) -> &'static str {
        match self {
            Operation::AddLiquidity => "add_liquidity",
            Operation::RemoveLiquidity => "remove_liquidity",
            Operation::Swap => "swap",
        }
    }
}

trait Emits {
    fn event(&self) -> &PoolEvent;
}

impl Emits for AddLiquidityOutcome {
    fn event(&self) -> &PoolEvent {
        &self.event
    }
}

impl Emits for RemoveLiquidityOutcome {
    fn event(&self) -> &PoolEvent {
        &self.event
    }
}

impl Emits for SwapOutcome {
    fn event(&self) -> &PoolEvent {
        &self.event
    }
}

/// Helper struct for serialization
#[derive(Serialize, Deserialize)]
struct SnapshotData {
    fee: FeeSchedule,
    pools: Vec<Pool>,
    stats: EngineStats,
}

/// Owns every pool and serializes mutations per pool
pub struct PoolEngine {
    pools: DashMap<PoolKey, Arc<RwLock<Pool>>>,
    fee: FeeSchedule,
    clock: Arc<dyn Clock>,
    sinks: RwLock<Vec<Arc<dyn EventSink>>>,
    stats: Arc<RwLock<EngineStats>>,
    default_deadline_minutes: u64,
    default_slippage_bps: u32,
}

impl Default for PoolEngine {
    fn default() -> Self {
        Self::new(FeeSchedule::default(), Arc::new(SystemClock))
    }
}

impl PoolEngine {
    pub fn new(fee: FeeSchedule, clock: Arc<dyn Clock>) -> Self {
        Self {
            pools: DashMap::new(),
            fee,
            clock,
            sinks: RwLock::new(Vec::new()),
            stats: Arc::new(RwLock::new(EngineStats::default())),
            default_deadline_minutes: swap_config::engine_config::DEFAULT_DEADLINE_MINUTES,
            default_slippage_bps: swap_config::engine_config::DEFAULT_SLIPPAGE_BPS,
        }
    }

    /// Build an engine from configuration and register its seed pools
    pub fn from_config(config: &EngineConfig, clock: Arc<dyn Clock>) -> EngineResult<Self> {
        let fee = FeeSchedule::new(config.fee.numerator, config.fee.denominator)?;
        let mut engine = Self::new(fee, clock);
        engine.default_deadline_minutes = config.deadline.default_minutes;
        engine.default_slippage_bps = config.slippage.default_bps;

        for seed in &config.pools {
            let token_a = parse_address(&seed.token_a)?;
            let token_b = parse_address(&seed.token_b)?;
            engine.create_pool(token_a, token_b)?;
        }

        info!(
            "PoolEngine initialized: fee {}/{}, {} pools",
            fee.numerator(),
            fee.denominator(),
            engine.pools.len()
        );
        Ok(engine)
    }

    pub fn fee(&self) -> FeeSchedule {
        self.fee
    }

    pub fn now(&self) -> u64 {
        self.clock.now()
    }

    /// `now + minutes * 60`
    pub fn deadline_after_minutes(&self, minutes: u64) -> u64 {
        self.clock.now().saturating_add(minutes.saturating_mul(60))
    }

    /// Deadline using the configured default window
    pub fn default_deadline(&self) -> u64 {
        self.deadline_after_minutes(self.default_deadline_minutes)
    }

    pub fn default_slippage_bps(&self) -> u32 {
        self.default_slippage_bps
    }

    /// Register a sink that receives every subsequent event
    pub fn subscribe(&self, sink: Arc<dyn EventSink>) {
        info!("Subscribed event sink '{}'", sink.name());
        self.sinks.write().push(sink);
    }

    pub fn stats(&self) -> EngineStats {
        self.stats.read().clone()
    }

    // ---- registry ----

    /// Create an empty pool for `(token_a, token_b)`; the creation order fixes A and B
    pub fn create_pool(&self, token_a: Address, token_b: Address) -> EngineResult<PoolKey> {
        let pool = Pool::new(token_a, token_b, self.fee)?;
        let key = pool.key();

        match self.pools.entry(key) {
            Entry::Occupied(_) => Err(EngineError::PoolExists(key)),
            Entry::Vacant(slot) => {
                slot.insert(Arc::new(RwLock::new(pool)));
                let mut stats = self.stats.write();
                stats.total_pools += 1;
                info!(pool = %key, ?token_a, ?token_b, "Created pool");
                Ok(key)
            }
        }
    }

    pub fn has_pool(&self, token_x: Address, token_y: Address) -> bool {
        self.pools.contains_key(&PoolKey::for_tokens(token_x, token_y))
    }

    pub fn pool_count(&self) -> usize {
        self.pools.len()
    }

    /// Keys of all registered pools, sorted
    pub fn pool_keys(&self) -> Vec<PoolKey> {
        let mut keys: Vec<PoolKey> = self.pools.iter().map(|entry| *entry.key()).collect();
        keys.sort();
        keys
    }

    /// Copy of a pool's full state
    pub fn pool_snapshot(&self, token_x: Address, token_y: Address) -> EngineResult<Pool> {
        self.read(self.pair_key(token_x, token_y)?, |pool| Ok(pool.clone()))
    }

    fn pair_key(&self, token_x: Address, token_y: Address) -> EngineResult<PoolKey> {
        if token_x == token_y {
            return Err(AmmError::IdenticalAddresses.into());
        }
        if token_x.is_zero() || token_y.is_zero() {
            return Err(AmmError::ZeroAddress.into());
        }
        Ok(PoolKey::for_tokens(token_x, token_y))
    }

    fn handle(&self, key: &PoolKey) -> EngineResult<Arc<RwLock<Pool>>> {
        // clone out of the map so no shard lock is held while the pool is locked
        self.pools
            .get(key)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or(EngineError::PoolNotFound(*key))
    }

    fn read<T>(&self, key: PoolKey, query: impl FnOnce(&Pool) -> AmmResult<T>) -> EngineResult<T> {
        if ReentrancyGuard::is_active(&key) {
            return Err(AmmError::ReentrancyGuardReentrantCall.into());
        }
        let handle = self.handle(&key)?;
        let pool = handle.read();
        Ok(query(&*pool)?)
    }

    fn mutate<T: Emits>(
        &self,
        key: PoolKey,
        operation: Operation,
        apply: impl FnOnce(&mut Pool, u64) -> AmmResult<T>,
    ) -> EngineResult<T> {
        let _guard = ReentrancyGuard::enter(key)?;
        let handle = self.handle(&key)?;
        let mut pool = handle.write();
        let now = self.clock.now();

        match apply(&mut *pool, now) {
            Ok(outcome) => {
                {
                    let mut stats = self.stats.write();
                    match operation {
                        Operation::AddLiquidity => stats.liquidity_added += 1,
                        Operation::RemoveLiquidity => stats.liquidity_removed += 1,
                        Operation::Swap => stats.swaps += 1,
                    }
                    stats.last_update = now;
                }
                debug!(
                    pool = %key,
                    sequence = pool.sequence(),
                    reserve_a = %pool.reserve_a(),
                    reserve_b = %pool.reserve_b(),
                    total_supply = %pool.total_supply(),
                    "Applied {}",
                    operation.as_str()
                );
                self.dispatch(outcome.event());
                Ok(outcome)
            }
            Err(err) => {
                self.stats.write().rejected += 1;
                warn!(pool = %key, code = err.code(), "Rejected {}", operation.as_str());
                Err(err.into())
            }
        }
    }

    fn dispatch(&self, event: &PoolEvent) {
        let sinks: Vec<Arc<dyn EventSink>> = self.sinks.read().clone();
        for sink in sinks {
            if let Err(err) = sink.send(event) {
                warn!(
                    sink = sink.name(),
                    sequence = event.sequence(),
                    "Event delivery failed: {}",
                    err
                );
            }
        }
    }

    // ---- operations ----

    /// Pure pricing with the engine fee
    pub fn get_amount_out(
        &self,
        amount_in: U256,
        reserve_in: U256,
        reserve_out: U256,
    ) -> EngineResult<U256> {
        Ok(V2Math::get_amount_out(amount_in, reserve_in, reserve_out, self.fee)?)
    }

    pub fn add_liquidity(
        &self,
        caller: Address,
        request: &AddLiquidityRequest,
    ) -> EngineResult<AddLiquidityOutcome> {
        let key = self.pair_key(request.token_a, request.token_b)?;
        self.mutate(key, Operation::AddLiquidity, |pool, now| {
            pool.add_liquidity(caller, request, now)
        })
    }

    pub fn remove_liquidity(
        &self,
        caller: Address,
        request: &RemoveLiquidityRequest,
    ) -> EngineResult<RemoveLiquidityOutcome> {
        let key = self.pair_key(request.token_a, request.token_b)?;
        self.mutate(key, Operation::RemoveLiquidity, |pool, now| {
            pool.remove_liquidity(caller, request, now)
        })
    }

    /// Returns `[amount_in, amount_out]`
    pub fn swap_exact_tokens_for_tokens(
        &self,
        caller: Address,
        request: &SwapRequest,
    ) -> EngineResult<SwapOutcome> {
        let key = match request.path.as_slice() {
            [token_in, token_out] if token_in != token_out => {
                PoolKey::for_tokens(*token_in, *token_out)
            }
            _ => return Err(AmmError::InvalidPath.into()),
        };
        self.mutate(key, Operation::Swap, |pool, now| {
            pool.swap_exact_tokens_for_tokens(caller, request, now)
        })
    }

    // ---- queries ----

    pub fn get_pool_info(&self, token_a: Address, token_b: Address) -> EngineResult<PoolInfo> {
        self.read(self.pair_key(token_a, token_b)?, |pool| Ok(pool.info()))
    }

    pub fn get_liquidity_balance(
        &self,
        token_a: Address,
        token_b: Address,
        user: Address,
    ) -> EngineResult<U256> {
        self.read(self.pair_key(token_a, token_b)?, |pool| {
            Ok(pool.liquidity_balance(&user))
        })
    }

    /// Price of one `base` in `quote`, scaled by `10^18`
    pub fn get_price(&self, base: Address, quote: Address) -> EngineResult<U256> {
        self.read(self.pair_key(base, quote)?, |pool| pool.get_price(&base, &quote))
    }

    /// Expected output for selling `amount_in` of `token_in` at current reserves
    pub fn quote_swap(
        &self,
        token_in: Address,
        token_out: Address,
        amount_in: U256,
    ) -> EngineResult<U256> {
        self.read(self.pair_key(token_in, token_out)?, |pool| {
            pool.pair().orientation(&token_in, &token_out)?;
            pool.amount_out_for(&token_in, amount_in)
        })
    }

    /// Input needed to receive `amount_out` of `token_out`
    pub fn quote_amount_in(
        &self,
        token_in: Address,
        token_out: Address,
        amount_out: U256,
    ) -> EngineResult<U256> {
        self.read(self.pair_key(token_in, token_out)?, |pool| {
            pool.pair().orientation(&token_in, &token_out)?;
            pool.amount_in_for(&token_out, amount_out)
        })
    }

    /// Amount of `token_b` that pairs with `amount_a` of `token_a` at the current ratio
    pub fn quote_add_liquidity(
        &self,
        token_a: Address,
        token_b: Address,
        amount_a: U256,
    ) -> EngineResult<U256> {
        self.read(self.pair_key(token_a, token_b)?, |pool| {
            let (reserve_a, reserve_b) = pool.reserves_for(&token_a)?;
            V2Math::quote(amount_a, reserve_a, reserve_b)
        })
    }

    /// Percentage move of the spot price caused by the trade
    pub fn price_impact(
        &self,
        token_in: Address,
        token_out: Address,
        amount_in: U256,
    ) -> EngineResult<Decimal> {
        self.read(self.pair_key(token_in, token_out)?, |pool| {
            pool.pair().orientation(&token_in, &token_out)?;
            pool.price_impact_for(&token_in, amount_in)
        })
    }

    /// Slippage floor for a swap quote; `None` uses the configured default tolerance
    pub fn min_amount_out(
        &self,
        token_in: Address,
        token_out: Address,
        amount_in: U256,
        slippage_bps: Option<u32>,
    ) -> EngineResult<U256> {
        let expected = self.quote_swap(token_in, token_out, amount_in)?;
        let bps = slippage_bps.unwrap_or(self.default_slippage_bps);
        Ok(V2Math::min_amount_after_slippage(expected, bps)?)
    }

    // ---- persistence ----

    /// Serialize every pool with bincode
    pub fn export_snapshot(&self) -> EngineResult<Vec<u8>> {
        let mut pools = Vec::with_capacity(self.pools.len());
        for key in self.pool_keys() {
            let handle = self.handle(&key)?;
            let pool = handle.read().clone();
            pools.push(pool);
        }
        let data = SnapshotData {
            fee: self.fee,
            pools,
            stats: self.stats(),
        };
        Ok(bincode::serialize(&data)?)
    }

    /// Replace the registry with a snapshot; nothing changes if it is rejected
    ///
    /// Takes `&mut self`: no handle to an old pool can be in use while the
    /// registry is swapped.
    pub fn import_snapshot(&mut self, snapshot: &[u8]) -> EngineResult<()> {
        let data: SnapshotData = bincode::deserialize(snapshot)?;

        let restored = DashMap::with_capacity(data.pools.len());
        for pool in data.pools {
            if !pool.check_invariants() {
                return Err(EngineError::InvalidSnapshot(format!(
                    "pool {} violates reserve or ledger invariants",
                    pool.key()
                )));
            }
            let key = pool.key();
            if restored.insert(key, Arc::new(RwLock::new(pool))).is_some() {
                return Err(EngineError::InvalidSnapshot(format!("duplicate pool {}", key)));
            }
        }

        self.pools = restored;
        let mut stats = data.stats;
        stats.total_pools = self.pools.len();
        *self.stats.write() = stats;

        info!(
            "Restored {} pools from snapshot (snapshot fee {}/{})",
            self.pools.len(),
            data.fee.numerator(),
            data.fee.denominator()
        );
        Ok(())
    }
}

impl Stateful for PoolEngine {
    type Error = EngineError;

    fn snapshot(&self) -> Result<Vec<u8>, Self::Error> {
        self.export_snapshot()
    }

    fn restore(&mut self, snapshot: &[u8]) -> Result<(), Self::Error> {
        self.import_snapshot(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;

    const START: u64 = 1_700_000_000;

    fn token(byte: u8) -> Address {
        Address::repeat_byte(byte)
    }

    fn engine() -> (PoolEngine, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(START));
        let engine = PoolEngine::new(FeeSchedule::default(), clock.clone());
        engine.create_pool(token(0x0a), token(0x0b)).unwrap();
        (engine, clock)
    }

    fn deposit(a: u64, b: u64, deadline: u64) -> AddLiquidityRequest {
        AddLiquidityRequest {
            token_a: token(0x0a),
            token_b: token(0x0b),
            amount_a_desired: U256::from(a),
            amount_b_desired: U256::from(b),
            amount_a_min: U256::zero(),
            amount_b_min: U256::zero(),
            to: token(0xa1),
            deadline,
        }
    }

    #[test]
    fn test_parse_address() {
        let parsed = parse_address("0x0a0a0a0a0a0a0a0a0a0a0a0a0a0a0a0a0a0a0a0a").unwrap();
        assert_eq!(parsed, token(0x0a));
        assert!(parse_address("0x1234").is_err());
        assert!(parse_address("zz0a0a0a0a0a0a0a0a0a0a0a0a0a0a0a0a0a0a0a").is_err());
        assert_eq!(
            parse_address(" 0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b ").unwrap(),
            token(0x0b)
        );
    }

    #[test]
    fn test_duplicate_pool_rejected_in_either_order() {
        let (engine, _) = engine();
        assert!(matches!(
            engine.create_pool(token(0x0b), token(0x0a)),
            Err(EngineError::PoolExists(_))
        ));
        assert_eq!(engine.pool_count(), 1);
        assert!(matches!(
            engine.create_pool(token(0x0c), token(0x0c)),
            Err(EngineError::Amm(AmmError::IdenticalAddresses))
        ));
    }

    #[test]
    fn test_unknown_pool() {
        let (engine, _) = engine();
        let result = engine.get_pool_info(token(0x0a), token(0x0c));
        assert!(matches!(result, Err(EngineError::PoolNotFound(_))));
        assert_eq!(result.unwrap_err().code(), "PoolNotFound");
    }

    #[test]
    fn test_deadline_uses_engine_clock() {
        let (engine, clock) = engine();
        let deadline = engine.default_deadline();
        assert_eq!(deadline, START + 20 * 60);

        clock.advance(20 * 60 + 1);
        let err = engine
            .add_liquidity(token(0xa1), &deposit(1000, 2000, deadline))
            .unwrap_err();
        assert_eq!(err.amm(), Some(AmmError::Expired));
        assert_eq!(engine.stats().rejected, 1);
    }

    #[test]
    fn test_queries_and_quotes() {
        let (engine, _) = engine();
        engine
            .add_liquidity(token(0xa1), &deposit(10_000, 10_000, START))
            .unwrap();

        assert_eq!(
            engine.quote_swap(token(0x0a), token(0x0b), U256::from(1000)).unwrap(),
            U256::from(906)
        );
        assert_eq!(
            engine
                .quote_add_liquidity(token(0x0b), token(0x0a), U256::from(500))
                .unwrap(),
            U256::from(500)
        );
        assert_eq!(
            engine
                .min_amount_out(token(0x0a), token(0x0b), U256::from(1000), None)
                .unwrap(),
            U256::from(901)
        );
        assert!(
            engine
                .price_impact(token(0x0a), token(0x0b), U256::from(1000))
                .unwrap()
                > Decimal::ZERO
        );
        assert_eq!(
            engine.get_liquidity_balance(token(0x0b), token(0x0a), token(0xa1)).unwrap(),
            U256::from(10_000)
        );
        assert_eq!(
            engine.get_amount_out(U256::from(1000), U256::from(10_000), U256::from(10_000)).unwrap(),
            U256::from(906)
        );
    }

    #[test]
    fn test_snapshot_round_trip_preserves_pools() {
        let (mut engine, _) = engine();
        engine
            .add_liquidity(token(0xa1), &deposit(1000, 2000, START))
            .unwrap();
        let bytes = engine.snapshot().unwrap();

        let (mut restored, _) = engine_without_pools();
        restored.restore(&bytes).unwrap();

        assert_eq!(
            restored.pool_snapshot(token(0x0a), token(0x0b)).unwrap(),
            engine.pool_snapshot(token(0x0a), token(0x0b)).unwrap()
        );
        assert_eq!(restored.stats().liquidity_added, 1);

        // garbage leaves the current registry in place
        assert!(engine.restore(&[0xff, 0x01]).is_err());
        assert_eq!(engine.pool_count(), 1);
    }

    #[test]
    fn test_restore_replaces_whole_registry() {
        let (source, _) = engine();
        source
            .add_liquidity(token(0xa1), &deposit(1000, 2000, START))
            .unwrap();
        let bytes = source.export_snapshot().unwrap();

        let (mut target, _) = engine_without_pools();
        target.create_pool(token(0x0a), token(0x0c)).unwrap();
        target.import_snapshot(&bytes).unwrap();

        assert!(target.has_pool(token(0x0a), token(0x0b)));
        assert!(!target.has_pool(token(0x0a), token(0x0c)));
        assert_eq!(target.pool_count(), 1);
        assert_eq!(target.stats().total_pools, 1);
    }

    #[test]
    fn test_snapshot_with_invalid_fee_rejected() {
        let (mut engine, _) = engine();
        engine
            .add_liquidity(token(0xa1), &deposit(10_000, 10_000, START))
            .unwrap();
        let mut bytes = engine.snapshot().unwrap();

        // bincode writes each fee as two little-endian u32s: 3, 1000
        let fee: Vec<u8> = [3u32.to_le_bytes(), 1000u32.to_le_bytes()].concat();
        let mut rewritten = 0;
        let mut index = 0;
        while index + fee.len() <= bytes.len() {
            if bytes[index..index + fee.len()] == fee[..] {
                bytes[index..index + fee.len()].fill(0);
                rewritten += 1;
                index += fee.len();
            } else {
                index += 1;
            }
        }
        assert_eq!(rewritten, 2);

        let (mut restored, _) = engine_without_pools();
        assert!(matches!(
            restored.restore(&bytes),
            Err(EngineError::Snapshot(_))
        ));
        assert_eq!(restored.pool_count(), 0);

        // the source engine still swaps normally
        let swap = SwapRequest {
            amount_in: U256::from(1000),
            amount_out_min: U256::zero(),
            path: vec![token(0x0a), token(0x0b)],
            to: token(0xcc),
            deadline: START,
        };
        assert_eq!(
            engine
                .swap_exact_tokens_for_tokens(token(0xa1), &swap)
                .unwrap()
                .amount_out(),
            U256::from(906)
        );
    }

    fn engine_without_pools() -> (PoolEngine, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(START));
        (PoolEngine::new(FeeSchedule::default(), clock.clone()), clock)
    }

    #[test]
    fn test_from_config_registers_seed_pools() {
        let mut config = EngineConfig::default();
        config.fee.numerator = 5;
        config.deadline.default_minutes = 5;
        config.pools.push(swap_config::PoolSeed {
            token_a: "0x0a0a0a0a0a0a0a0a0a0a0a0a0a0a0a0a0a0a0a0a".to_string(),
            token_b: "0x0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b".to_string(),
        });

        let engine = PoolEngine::from_config(&config, Arc::new(ManualClock::new(START))).unwrap();
        assert!(engine.has_pool(token(0x0b), token(0x0a)));
        assert_eq!(engine.fee().numerator(), 5);
        assert_eq!(engine.default_deadline(), START + 300);
    }
}
