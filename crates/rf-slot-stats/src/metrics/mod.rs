//! Leaf accumulators and the per-category rounds aggregate

pub mod action;
pub mod bonus;
pub mod flag;
pub mod histogram;
pub mod payline;
pub mod rounds;
pub mod scatter;
pub mod symbol;

pub use action::{ActionAccumulator, Actions, UNKNOWN_ACTION};
pub use bonus::{BonusCategory, Classification, GameId, classify};
pub use flag::{RoundFlagAccumulator, RoundFlags, UNKNOWN_FLAG};
pub use histogram::{CountHistogram, FloatHistogram, Histogram, IntHistogram, Sample};
pub use payline::{MAX_COUNT, MAX_REELS, PaylineAccumulator, PayoutTally};
pub use rounds::RoundsAggregate;
pub use scatter::ScatterAccumulator;
pub use symbol::{SymbolAccumulator, Symbols};

pub(crate) fn is_zero(v: &u64) -> bool {
    *v == 0
}
