//! # rf-slot-stats — Round Statistics for Slot Simulations
//!
//! Turns the results of simulated slot rounds into mergeable statistics:
//! bets and wins, spin kinds, bonus categories, symbol and payline usage,
//! payout distributions and the best rounds of a run.
//!
//! ## Features
//!
//! - **Per-player aggregates**: One [`PlayerRoundsAggregate`] per worker,
//!   fed round by round
//! - **Shard merging**: Every accumulator merges with a peer of the same session
//! - **Bonus categories**: Rounds classified per game into fine and roll-up categories
//! - **Recycling**: Aggregates return to a [`Pool`] and are reused without reallocating
//! - **JSON reports**: Statistics serialize with stable camelCase field names
//!
//! ## Architecture
//!
//! ```text
//! PlayerRoundsAggregate
//!     │
//!     ├── RoundsAggregate (all rounds + one per BonusCategory)
//!     ├── PayoutAggregate (first rounds + one per BonusCategory)
//!     │       ├── PaylineAccumulator (static + all-paylines)
//!     │       └── ScatterAccumulator (wild, scatter, bonus, super, other)
//!     ├── Symbols / Actions / RoundFlags
//!     ├── Histogram (milestones, bonus wheel, multipliers)
//!     └── BestRoundsRetainer (best, best without free spins)
//!           │
//!           v
//!     merge(shard) → serde_json report
//! ```

pub mod best;
pub mod config;
pub mod error;
pub mod grow;
pub mod metrics;
pub mod payouts;
pub mod player;
pub mod pool;
pub mod results;

pub use best::{BestRound, BestRoundsRetainer};
pub use config::*;
pub use error::{StatsError, StatsResult};
pub use grow::GrowVec;
pub use metrics::{
    ActionAccumulator, Actions, BonusCategory, Classification, CountHistogram, FloatHistogram,
    GameId, Histogram, IntHistogram, PaylineAccumulator, PayoutTally, RoundFlagAccumulator,
    RoundFlags, RoundsAggregate, ScatterAccumulator, SymbolAccumulator, Symbols, classify,
};
pub use payouts::PayoutAggregate;
pub use player::{PlayerRoundsAggregate, RoundCounters};
pub use pool::{Pool, Recycle};
pub use results::*;
