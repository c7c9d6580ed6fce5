//! Memoization of projection runs
//!
//! A run is a pure function of its inputs, so results are keyed by a hash of
//! the full input snapshot: settlement table, config, starting cash, valued
//! holdings with their rules, and the ledger.

use log::{debug, warn};
use serde::Serialize;
use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};

use super::engine::{LiquidityProjector, ProjectionConfig};
use super::points::ProjectionResult;
use crate::cashflow::CashFlowLedger;
use crate::portfolio::ValuedHolding;
use crate::rules::SettlementTable;

/// Everything a projection result depends on
#[derive(Serialize)]
struct Snapshot<'a> {
    table: &'a SettlementTable,
    config: &'a ProjectionConfig,
    starting_cash: f64,
    holdings: &'a [ValuedHolding],
    ledger: &'a CashFlowLedger,
}

/// Cache of projection results keyed by input snapshot
#[derive(Debug, Default)]
pub struct ProjectionCache {
    entries: HashMap<u64, ProjectionResult>,

    /// Statistics
    pub cache_hits: u64,
    pub cache_misses: u64,
}

impl ProjectionCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached result for this snapshot, projecting on a miss
    pub fn get_or_project(
        &mut self,
        projector: &LiquidityProjector,
        starting_cash: f64,
        holdings: &[ValuedHolding],
        ledger: &CashFlowLedger,
    ) -> ProjectionResult {
        let key = match snapshot_key(projector, starting_cash, holdings, ledger) {
            Some(key) => key,
            None => {
                self.cache_misses += 1;
                return projector.project(starting_cash, holdings, ledger);
            }
        };

        if let Some(result) = self.entries.get(&key) {
            self.cache_hits += 1;
            debug!("Projection cache hit ({:016x})", key);
            return result.clone();
        }

        self.cache_misses += 1;
        let result = projector.project(starting_cash, holdings, ledger);
        self.entries.insert(key, result.clone());
        result
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.cache_hits = 0;
        self.cache_misses = 0;
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn hit_rate(&self) -> f64 {
        let total = self.cache_hits + self.cache_misses;
        if total == 0 {
            0.0
        } else {
            self.cache_hits as f64 / total as f64
        }
    }
}

/// Hash of the serialized snapshot; `None` if it cannot be serialized
fn snapshot_key(
    projector: &LiquidityProjector,
    starting_cash: f64,
    holdings: &[ValuedHolding],
    ledger: &CashFlowLedger,
) -> Option<u64> {
    let snapshot = Snapshot {
        table: projector.resolver().settlement_table(),
        config: projector.config(),
        starting_cash,
        holdings,
        ledger,
    };

    match serde_json::to_string(&snapshot) {
        Ok(json) => {
            let mut hasher = DefaultHasher::new();
            json.hash(&mut hasher);
            Some(hasher.finish())
        }
        Err(e) => {
            warn!("Projection snapshot not cacheable: {}", e);
            None
        }
    }
}
