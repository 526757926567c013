//! # Swap Pool Engine - Concurrent Constant-Product Pools
//!
//! ## Purpose
//!
//! Owns a registry of two-token constant-product pools and serializes every
//! mutation per pool. Wraps the pure pool state machine from `swap-amm` with
//! locking, deadline clocks, event delivery, reentrancy detection and
//! snapshot persistence.
//!
//! ## Integration Points
//!
//! - **Input Sources**: Typed add/remove/swap requests from an in-process caller layer
//! - **Output Destinations**: [`EventSink`] implementations (crossbeam channel, collector, tracing)
//! - **State Persistence**: bincode snapshots via [`Stateful`]
//! - **Configuration**: [`PoolEngine::from_config`] reads `swap-config`'s `EngineConfig`
//!
//! ## Architecture Role
//!
//! ```text
//! caller ──▶ PoolEngine ──▶ DashMap<PoolKey, Arc<RwLock<Pool>>>
//!               │                         │
//!               │  write lock per mutation│
//!               ▼                         ▼
//!          ReentrancyGuard           EventSink fan-out (inside the lock)
//! ```
//!
//! Queries take a read lock and never observe a half-applied operation.

pub mod clock;
pub mod engine;
pub mod error;
pub mod guard;
pub mod scenario;
pub mod sink;
pub mod traits;

pub use clock::{Clock, ManualClock, SystemClock};
pub use engine::{parse_address, EngineStats, PoolEngine};
pub use error::{EngineError, EngineResult};
pub use guard::ReentrancyGuard;
pub use scenario::{RunSummary, Scenario, ScenarioRunner, Step};
pub use sink::{ChannelSink, CollectorSink, EventSink, SinkError, TracingSink};

// Re-export core traits for convenience
pub use traits::Stateful;
