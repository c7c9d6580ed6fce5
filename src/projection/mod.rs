//! Daily liquidity projection over a planning horizon

mod cache;
mod engine;
mod points;
mod state;

pub use cache::ProjectionCache;
pub use engine::{LiquidityProjector, ProjectionConfig, DEFAULT_HORIZON_DAYS};
pub use points::{LockReason, LockedHolding, ProjectionPoint, ProjectionResult, ProjectionSummary};
pub use state::ProjectionState;
