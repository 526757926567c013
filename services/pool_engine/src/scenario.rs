//! Scripted scenarios for the `amm-sim` driver
//!
//! A scenario names tokens and accounts, lists pools to create and replays a
//! sequence of steps against a [`PoolEngine`] on a [`ManualClock`]. Every step
//! produces one JSON line; events raised by the step follow as their own lines.
//! Amounts are decimal strings scaled by the scenario's `decimals`.

use crate::clock::{Clock, ManualClock};
use crate::engine::{parse_address, PoolEngine};
use crate::error::EngineResult;
use crate::sink::ChannelSink;
use anyhow::{Context, Result};
use crossbeam_channel::Receiver;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use swap_amm::{
    format_units, parse_units, AddLiquidityRequest, Address, PoolEvent, RemoveLiquidityRequest,
    SwapRequest, U256,
};
use tracing::{debug, info};

fn default_decimals() -> u32 {
    18
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Scenario {
    #[serde(default = "default_decimals")]
    pub decimals: u32,
    /// Unix seconds the manual clock starts at; defaults to the wall clock
    #[serde(default)]
    pub start_time: Option<u64>,
    /// Name -> hex address for tokens and accounts
    #[serde(default)]
    pub addresses: HashMap<String, String>,
    #[serde(default)]
    pub pools: Vec<[String; 2]>,
    pub steps: Vec<Step>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Step {
    AddLiquidity {
        caller: String,
        token_a: String,
        token_b: String,
        amount_a: String,
        amount_b: String,
        #[serde(default)]
        min_a: Option<String>,
        #[serde(default)]
        min_b: Option<String>,
        #[serde(default)]
        to: Option<String>,
        #[serde(default)]
        deadline: Option<u64>,
    },
    RemoveLiquidity {
        caller: String,
        token_a: String,
        token_b: String,
        /// Share amount, or `"all"` for the caller's whole balance
        liquidity: String,
        #[serde(default)]
        min_a: Option<String>,
        #[serde(default)]
        min_b: Option<String>,
        #[serde(default)]
        to: Option<String>,
        #[serde(default)]
        deadline: Option<u64>,
    },
    Swap {
        caller: String,
        path: Vec<String>,
        amount_in: String,
        /// Explicit floor; otherwise derived from the quote and `slippage_bps`
        #[serde(default)]
        min_out: Option<String>,
        #[serde(default)]
        slippage_bps: Option<u32>,
        #[serde(default)]
        to: Option<String>,
        #[serde(default)]
        deadline: Option<u64>,
    },
    Quote {
        token_in: String,
        token_out: String,
        amount_in: String,
    },
    PoolInfo {
        token_a: String,
        token_b: String,
    },
    Balance {
        token_a: String,
        token_b: String,
        user: String,
    },
    Price {
        base: String,
        quote: String,
    },
    AdvanceClock {
        seconds: u64,
    },
}

impl Step {
    pub fn name(&self) -> &'static str {
        match self {
            Step::AddLiquidity { .. } => "add_liquidity",
            Step::RemoveLiquidity { .. } => "remove_liquidity",
            Step::Swap { .. } => "swap",
            Step::Quote { .. } => "quote",
            Step::PoolInfo { .. } => "pool_info",
            Step::Balance { .. } => "balance",
            Step::Price { .. } => "price",
            Step::AdvanceClock { .. } => "advance_clock",
        }
    }
}

impl Scenario {
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).context("Failed to parse scenario JSON")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read scenario {:?}", path))?;
        Self::from_json(&text)
    }
}

/// Totals reported after a run
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub steps: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub events: usize,
}

/// Replays a scenario against an engine
pub struct ScenarioRunner {
    engine: Arc<PoolEngine>,
    clock: Arc<ManualClock>,
    events: Receiver<PoolEvent>,
    decimals: u32,
    addresses: HashMap<String, Address>,
}

impl ScenarioRunner {
    /// Resolve names, create the scenario's pools and subscribe to events
    pub fn new(
        engine: Arc<PoolEngine>,
        clock: Arc<ManualClock>,
        scenario: &Scenario,
    ) -> Result<Self> {
        let mut addresses = HashMap::with_capacity(scenario.addresses.len());
        for (name, hex) in &scenario.addresses {
            let address =
                parse_address(hex).with_context(|| format!("Bad address for {:?}", name))?;
            addresses.insert(name.clone(), address);
        }

        if let Some(start) = scenario.start_time {
            clock.set(start);
        }

        let (sink, events) = ChannelSink::unbounded();
        engine.subscribe(Arc::new(sink.with_name("scenario")));

        let runner = Self {
            engine,
            clock,
            events,
            decimals: scenario.decimals,
            addresses,
        };

        for [token_a, token_b] in &scenario.pools {
            let a = runner.resolve(token_a)?;
            let b = runner.resolve(token_b)?;
            if !runner.engine.has_pool(a, b) {
                runner
                    .engine
                    .create_pool(a, b)
                    .with_context(|| format!("Failed to create pool {}/{}", token_a, token_b))?;
            }
        }

        Ok(runner)
    }

    fn resolve(&self, name: &str) -> EngineResult<Address> {
        match self.addresses.get(name) {
            Some(address) => Ok(*address),
            None => parse_address(name),
        }
    }

    fn amount(&self, value: &str) -> EngineResult<U256> {
        Ok(parse_units(value, self.decimals)?)
    }

    fn optional_amount(&self, value: &Option<String>) -> EngineResult<U256> {
        match value {
            Some(value) => self.amount(value),
            None => Ok(U256::zero()),
        }
    }

    fn display(&self, value: U256) -> String {
        format_units(value, self.decimals).unwrap_or_else(|_| value.to_string())
    }

    fn recipient(&self, to: &Option<String>, caller: Address) -> EngineResult<Address> {
        match to {
            Some(name) => self.resolve(name),
            None => Ok(caller),
        }
    }

    fn deadline(&self, deadline: Option<u64>) -> u64 {
        deadline.unwrap_or_else(|| self.engine.default_deadline())
    }

    /// Run every step, writing JSON lines to `out`
    pub fn run(&self, steps: &[Step], out: &mut impl Write) -> Result<RunSummary> {
        let mut summary = RunSummary::default();

        for (index, step) in steps.iter().enumerate() {
            summary.steps += 1;
            let line = match self.execute(step) {
                Ok(result) => {
                    summary.succeeded += 1;
                    json!({ "step": index, "op": step.name(), "ok": true, "result": result })
                }
                Err(err) => {
                    summary.failed += 1;
                    json!({
                        "step": index,
                        "op": step.name(),
                        "ok": false,
                        "error": err.code(),
                        "message": err.to_string(),
                    })
                }
            };
            writeln!(out, "{}", line).context("Failed to write step result")?;

            for event in self.events.try_iter() {
                summary.events += 1;
                let line = json!({ "step": index, "event": event });
                writeln!(out, "{}", line).context("Failed to write event")?;
            }
        }

        info!(
            "Scenario finished: {} steps, {} ok, {} failed, {} events",
            summary.steps, summary.succeeded, summary.failed, summary.events
        );
        Ok(summary)
    }

    fn execute(&self, step: &Step) -> EngineResult<Value> {
        debug!(op = step.name(), now = self.clock.now(), "Executing step");
        match step {
            Step::AddLiquidity {
                caller,
                token_a,
                token_b,
                amount_a,
                amount_b,
                min_a,
                min_b,
                to,
                deadline,
            } => {
                let caller = self.resolve(caller)?;
                let request = AddLiquidityRequest {
                    token_a: self.resolve(token_a)?,
                    token_b: self.resolve(token_b)?,
                    amount_a_desired: self.amount(amount_a)?,
                    amount_b_desired: self.amount(amount_b)?,
                    amount_a_min: self.optional_amount(min_a)?,
                    amount_b_min: self.optional_amount(min_b)?,
                    to: self.recipient(to, caller)?,
                    deadline: self.deadline(*deadline),
                };
                let outcome = self.engine.add_liquidity(caller, &request)?;
                Ok(json!({
                    "amount_a": self.display(outcome.amount_a),
                    "amount_b": self.display(outcome.amount_b),
                    "liquidity": self.display(outcome.liquidity),
                }))
            }
            Step::RemoveLiquidity {
                caller,
                token_a,
                token_b,
                liquidity,
                min_a,
                min_b,
                to,
                deadline,
            } => {
                let caller = self.resolve(caller)?;
                let token_a = self.resolve(token_a)?;
                let token_b = self.resolve(token_b)?;
                let liquidity = if liquidity == "all" {
                    self.engine.get_liquidity_balance(token_a, token_b, caller)?
                } else {
                    self.amount(liquidity)?
                };
                let request = RemoveLiquidityRequest {
                    token_a,
                    token_b,
                    liquidity,
                    amount_a_min: self.optional_amount(min_a)?,
                    amount_b_min: self.optional_amount(min_b)?,
                    to: self.recipient(to, caller)?,
                    deadline: self.deadline(*deadline),
                };
                let outcome = self.engine.remove_liquidity(caller, &request)?;
                Ok(json!({
                    "amount_a": self.display(outcome.amount_a),
                    "amount_b": self.display(outcome.amount_b),
                    "liquidity": self.display(liquidity),
                }))
            }
            Step::Swap {
                caller,
                path,
                amount_in,
                min_out,
                slippage_bps,
                to,
                deadline,
            } => {
                let caller = self.resolve(caller)?;
                let path = path
                    .iter()
                    .map(|name| self.resolve(name))
                    .collect::<EngineResult<Vec<_>>>()?;
                let amount_in = self.amount(amount_in)?;
                let amount_out_min = match (min_out, path.as_slice()) {
                    (Some(min_out), _) => self.amount(min_out)?,
                    (None, [token_in, token_out]) => self.engine.min_amount_out(
                        *token_in,
                        *token_out,
                        amount_in,
                        *slippage_bps,
                    )?,
                    (None, _) => U256::zero(),
                };
                let request = SwapRequest {
                    amount_in,
                    amount_out_min,
                    path,
                    to: self.recipient(to, caller)?,
                    deadline: self.deadline(*deadline),
                };
                let outcome = self.engine.swap_exact_tokens_for_tokens(caller, &request)?;
                Ok(json!({
                    "amounts": outcome.amounts.iter().map(|a| self.display(*a)).collect::<Vec<_>>(),
                    "amount_out_min": self.display(amount_out_min),
                }))
            }
            Step::Quote {
                token_in,
                token_out,
                amount_in,
            } => {
                let token_in = self.resolve(token_in)?;
                let token_out = self.resolve(token_out)?;
                let amount_in = self.amount(amount_in)?;
                let amount_out = self.engine.quote_swap(token_in, token_out, amount_in)?;
                let impact = self.engine.price_impact(token_in, token_out, amount_in)?;
                Ok(json!({
                    "amount_out": self.display(amount_out),
                    "price_impact_pct": impact.to_string(),
                }))
            }
            Step::PoolInfo { token_a, token_b } => {
                let info = self
                    .engine
                    .get_pool_info(self.resolve(token_a)?, self.resolve(token_b)?)?;
                Ok(json!({
                    "reserve_a": self.display(info.reserve_a),
                    "reserve_b": self.display(info.reserve_b),
                    "total_supply": self.display(info.total_supply),
                }))
            }
            Step::Balance {
                token_a,
                token_b,
                user,
            } => {
                let balance = self.engine.get_liquidity_balance(
                    self.resolve(token_a)?,
                    self.resolve(token_b)?,
                    self.resolve(user)?,
                )?;
                Ok(json!({ "balance": self.display(balance) }))
            }
            Step::Price { base, quote } => {
                let price = self
                    .engine
                    .get_price(self.resolve(base)?, self.resolve(quote)?)?;
                // prices are always 18-decimal fixed point
                let shown = format_units(price, 18)?;
                Ok(json!({ "price": shown }))
            }
            Step::AdvanceClock { seconds } => {
                let now = self.clock.advance(*seconds);
                Ok(json!({ "now": now }))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use swap_amm::FeeSchedule;

    const SCENARIO: &str = r#"{
        "decimals": 0,
        "start_time": 1700000000,
        "addresses": {
            "TKA": "0x0a0a0a0a0a0a0a0a0a0a0a0a0a0a0a0a0a0a0a0a",
            "TKB": "0x0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b",
            "alice": "0xa1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1"
        },
        "pools": [["TKA", "TKB"]],
        "steps": [
            {"op": "add_liquidity", "caller": "alice", "token_a": "TKA", "token_b": "TKB",
             "amount_a": "10000", "amount_b": "10000"},
            {"op": "swap", "caller": "alice", "path": ["TKA", "TKB"], "amount_in": "1000", "min_out": "0"},
            {"op": "pool_info", "token_a": "TKA", "token_b": "TKB"},
            {"op": "advance_clock", "seconds": 3600},
            {"op": "swap", "caller": "alice", "path": ["TKA", "TKB"], "amount_in": "1000", "deadline": 1700000001}
        ]
    }"#;

    #[test]
    fn test_runner_reports_results_and_errors() {
        let scenario = Scenario::from_json(SCENARIO).unwrap();
        let clock = Arc::new(ManualClock::new(0));
        let engine = Arc::new(PoolEngine::new(FeeSchedule::default(), clock.clone()));
        let runner = ScenarioRunner::new(engine, clock, &scenario).unwrap();

        let mut out = Vec::new();
        let summary = runner.run(&scenario.steps, &mut out).unwrap();
        assert_eq!(summary.steps, 5);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.events, 2);

        let lines: Vec<Value> = String::from_utf8(out)
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        let results: Vec<&Value> = lines.iter().filter(|l| l.get("op").is_some()).collect();

        assert_eq!(results[1]["result"]["amounts"][1], "906.0");
        assert_eq!(results[2]["result"]["reserve_b"], "9094.0");
        assert_eq!(results[4]["error"], "Expired");
    }
}
