//! Per-player round statistics
//!
//! [`PlayerRoundsAggregate`] is the root of the aggregate tree. Each worker
//! of a simulation owns one, feeds it every round through
//! [`analyse`](PlayerRoundsAggregate::analyse), and the shards are combined
//! with [`merge`](PlayerRoundsAggregate::merge) once the run is done.
//!
//! ## Usage
//!
//! ```rust,ignore
//! let config = SessionConfig::from_json(&json)?;
//! let mut stats = PlayerRoundsAggregate::new(&config)?;
//! for round in rounds {
//!     stats.analyse(100, 100, &round)?;
//! }
//! println!("RTP {:.2}%", stats.rtp());
//! ```

use std::collections::BTreeMap;

use serde::Serialize;

use crate::best::BestRoundsRetainer;
use crate::config::{AnalysisOptions, PaylineDef, SessionConfig};
use crate::error::{StatsError, StatsResult};
use crate::metrics::bonus::{self, BonusCategory, Classification, GameId};
use crate::metrics::{
    Actions, CountHistogram, FloatHistogram, RoundFlags, RoundsAggregate, SymbolAccumulator,
    Symbols, is_zero,
};
use crate::payouts::PayoutAggregate;
use crate::pool::{Pool, Recycle};
use crate::results::{self, ResultData, RoundResult, SpinKind, SpinResult, TriggerEvent};

/// Bucket decimals of the multiplier histogram
pub const MULTIPLIER_DECIMALS: u8 = 1;

/// Shortest grid that can show the player-level wild respin layout
const WILD_RESPIN_GRID: usize = 24;

/// Session sizing and settings, fixed between configure and recycle
#[derive(Debug, Clone, PartialEq, Default)]
struct Session {
    game: GameId,
    reel_count: usize,
    row_count: usize,
    double_spin: bool,
    max_payout: f64,
    start_balance: i64,
    max_symbol: u16,
    symbol_count: usize,
    paylines: Vec<PaylineDef>,
    options: AnalysisOptions,
    best_threshold: f64,
    best_no_free_threshold: f64,
    milestones: [f64; 5],
}

impl Session {
    fn from_config(config: &SessionConfig) -> Self {
        Self {
            game: config.game,
            reel_count: config.reel_count,
            row_count: config.row_count,
            double_spin: config.double_spin,
            max_payout: config.max_payout,
            start_balance: config.start_balance,
            max_symbol: config.max_symbol_id(),
            symbol_count: config.symbol_count(),
            paylines: config.paylines.clone(),
            options: config.options,
            best_threshold: config.best.threshold,
            best_no_free_threshold: config.best.no_free_threshold,
            milestones: config.milestones,
        }
    }
}

/// Scalar round and spin counters
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoundCounters {
    #[serde(skip_serializing_if = "is_zero")]
    pub round_count: u64,
    #[serde(skip_serializing_if = "is_zero")]
    pub win_count: u64,
    #[serde(skip_serializing_if = "is_zero")]
    pub total_spins: u64,
    #[serde(skip_serializing_if = "is_zero")]
    pub regular_spins: u64,
    #[serde(skip_serializing_if = "is_zero")]
    pub first_spins: u64,
    #[serde(skip_serializing_if = "is_zero")]
    pub second_spins: u64,
    #[serde(skip_serializing_if = "is_zero")]
    pub refill_spins: u64,
    #[serde(skip_serializing_if = "is_zero")]
    pub super_spins: u64,
    #[serde(skip_serializing_if = "is_zero")]
    pub super_refills: u64,
    #[serde(skip_serializing_if = "is_zero")]
    pub wild_respins: u64,
    /// Results awarding free games
    #[serde(skip_serializing_if = "is_zero")]
    pub free_times: u64,
    #[serde(skip_serializing_if = "is_zero")]
    pub first_times: u64,
    #[serde(skip_serializing_if = "is_zero")]
    pub second_times: u64,
    #[serde(skip_serializing_if = "is_zero")]
    pub free_times_super: u64,
    #[serde(skip_serializing_if = "is_zero")]
    pub first_times_super: u64,
    #[serde(skip_serializing_if = "is_zero")]
    pub second_times_super: u64,
    /// Free games awarded
    #[serde(skip_serializing_if = "is_zero")]
    pub free_awarded: u64,
    #[serde(skip_serializing_if = "is_zero")]
    pub first_awarded: u64,
    #[serde(skip_serializing_if = "is_zero")]
    pub second_awarded: u64,
    #[serde(skip_serializing_if = "is_zero")]
    pub free_awarded_super: u64,
    #[serde(skip_serializing_if = "is_zero")]
    pub first_awarded_super: u64,
    #[serde(skip_serializing_if = "is_zero")]
    pub second_awarded_super: u64,
    #[serde(skip_serializing_if = "is_zero")]
    pub free_spins: u64,
    #[serde(skip_serializing_if = "is_zero")]
    pub first_free_spins: u64,
    #[serde(skip_serializing_if = "is_zero")]
    pub second_free_spins: u64,
    #[serde(skip_serializing_if = "is_zero")]
    pub super_spins_free: u64,
    #[serde(skip_serializing_if = "is_zero")]
    pub super_refills_free: u64,
    /// Spins with an unrecognised phase tag
    #[serde(skip_serializing_if = "is_zero")]
    pub bad_spins: u64,
    /// Rounds capped at the max payout
    #[serde(skip_serializing_if = "is_zero")]
    pub max_payouts: u64,
    #[serde(skip_serializing_if = "is_zero")]
    pub positive_bal: u64,
    #[serde(skip_serializing_if = "is_zero")]
    pub negative_bal: u64,
}

impl RoundCounters {
    pub fn merge(&mut self, other: &Self) {
        self.round_count += other.round_count;
        self.win_count += other.win_count;
        self.total_spins += other.total_spins;
        self.regular_spins += other.regular_spins;
        self.first_spins += other.first_spins;
        self.second_spins += other.second_spins;
        self.refill_spins += other.refill_spins;
        self.super_spins += other.super_spins;
        self.super_refills += other.super_refills;
        self.wild_respins += other.wild_respins;
        self.free_times += other.free_times;
        self.first_times += other.first_times;
        self.second_times += other.second_times;
        self.free_times_super += other.free_times_super;
        self.first_times_super += other.first_times_super;
        self.second_times_super += other.second_times_super;
        self.free_awarded += other.free_awarded;
        self.first_awarded += other.first_awarded;
        self.second_awarded += other.second_awarded;
        self.free_awarded_super += other.free_awarded_super;
        self.first_awarded_super += other.first_awarded_super;
        self.second_awarded_super += other.second_awarded_super;
        self.free_spins += other.free_spins;
        self.first_free_spins += other.first_free_spins;
        self.second_free_spins += other.second_free_spins;
        self.super_spins_free += other.super_spins_free;
        self.super_refills_free += other.super_refills_free;
        self.bad_spins += other.bad_spins;
        self.max_payouts += other.max_payouts;
        self.positive_bal += other.positive_bal;
        self.negative_bal += other.negative_bal;
    }
}

fn is_zero_i64(v: &i64) -> bool {
    *v == 0
}

/// All statistics of a set of rounds played by one player
///
/// Milestone slots are named after the default thresholds
/// (25x, 100x, 250x, 1000x, 2500x) whatever thresholds are configured.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerRoundsAggregate {
    #[serde(skip)]
    session: Session,

    #[serde(flatten)]
    pub counters: RoundCounters,
    #[serde(skip_serializing_if = "is_zero_i64")]
    pub balance: i64,
    #[serde(skip_serializing_if = "is_zero_i64")]
    pub highest_payout: i64,
    #[serde(skip_serializing_if = "is_zero_i64")]
    pub lowest_balance: i64,
    #[serde(skip_serializing_if = "is_zero_i64")]
    pub highest_balance: i64,

    pub all_rounds: RoundsAggregate,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub bonus_rounds: BTreeMap<BonusCategory, RoundsAggregate>,
    pub first_payouts: PayoutAggregate,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub bonus_payouts: BTreeMap<BonusCategory, PayoutAggregate>,

    /// Rounds played before the first milestone payout
    pub spins_to_25x: CountHistogram,
    pub spins_to_100x: CountHistogram,
    pub spins_to_250x: CountHistogram,
    pub spins_to_1000x: CountHistogram,
    pub spins_to_2500x: CountHistogram,
    pub spins_to_plus_bal: CountHistogram,
    /// Rounds reaching each milestone
    pub count_25x: CountHistogram,
    pub count_100x: CountHistogram,
    pub count_250x: CountHistogram,
    pub count_1000x: CountHistogram,
    pub count_2500x: CountHistogram,
    pub count_plus_bal: CountHistogram,

    pub bonus_wheel: CountHistogram,
    pub multiplier_marks: CountHistogram,
    pub multipliers: FloatHistogram,

    #[serde(skip_serializing_if = "BestRoundsRetainer::is_empty")]
    pub best: BestRoundsRetainer,
    #[serde(skip_serializing_if = "BestRoundsRetainer::is_empty")]
    pub best_no_free: BestRoundsRetainer,

    #[serde(skip_serializing_if = "RoundFlags::is_empty")]
    pub round_flags: RoundFlags,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub instant_bonus: BTreeMap<String, u64>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub player_choice: BTreeMap<String, u64>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub scripts: BTreeMap<i32, u64>,
    #[serde(rename = "playerID", skip_serializing_if = "String::is_empty")]
    pub player_id: String,
    #[serde(skip_serializing_if = "Symbols::is_empty")]
    pub symbols: Symbols,
    #[serde(skip_serializing_if = "Actions::is_empty")]
    pub actions: Actions,

    #[serde(skip)]
    spare_rounds: Vec<RoundsAggregate>,
    #[serde(skip)]
    spare_payouts: Vec<PayoutAggregate>,
}

impl PlayerRoundsAggregate {
    /// Create an aggregate for a session
    pub fn new(config: &SessionConfig) -> StatsResult<Self> {
        let mut stats = Self::default();
        stats.configure(config)?;
        Ok(stats)
    }

    /// Take an aggregate from `pool` and configure it for a session
    pub fn acquire(pool: &Pool<Self>, config: &SessionConfig) -> StatsResult<Self> {
        let mut stats = pool.acquire();
        stats.configure(config)?;
        Ok(stats)
    }

    /// Return this aggregate to `pool` for reuse
    pub fn release(self, pool: &Pool<Self>) {
        pool.release(self);
    }

    /// Clear everything and size for a session
    pub fn configure(&mut self, config: &SessionConfig) -> StatsResult<()> {
        config.validate()?;
        self.recycle();

        let session = Session::from_config(config);
        self.player_id.push_str(&config.player_id);
        self.balance = session.start_balance;
        self.lowest_balance = session.start_balance;
        self.highest_balance = session.start_balance;

        self.all_rounds.configure(session.symbol_count);
        self.first_payouts.configure(
            session.row_count,
            session.max_symbol,
            &session.paylines,
            session.options.no_paylines,
        );
        self.symbols.configure(&config.symbols, session.reel_count);
        self.actions.configure(&config.actions);
        self.round_flags.configure(&config.flags);
        self.best.set_max_best(config.best.max_best);
        self.best_no_free.set_max_best(config.best.max_best);
        if self.multipliers.decimals() != MULTIPLIER_DECIMALS {
            self.multipliers = FloatHistogram::with_decimals(MULTIPLIER_DECIMALS);
        }

        log::debug!(
            "Configured {:?} player '{}': {}x{} grid, {} symbols, {} actions, {} paylines",
            session.game,
            self.player_id,
            session.reel_count,
            session.row_count,
            self.symbols.len(),
            self.actions.len(),
            session.paylines.len()
        );

        self.session = session;
        Ok(())
    }

    /// Skip sections of the analysis
    pub fn with_options(mut self, options: AnalysisOptions) -> Self {
        self.session.options = options;
        self.first_payouts.set_no_paylines(options.no_paylines);
        for p in self.bonus_payouts.values_mut() {
            p.set_no_paylines(options.no_paylines);
        }
        self
    }

    /// Change best-round retention
    pub fn set_best_threshold(&mut self, threshold: f64, max_best: usize) {
        self.session.best_threshold = threshold;
        self.best.set_max_best(max_best);
        self.best_no_free.set_max_best(max_best);
    }

    pub fn game(&self) -> GameId {
        self.session.game
    }

    pub fn options(&self) -> AnalysisOptions {
        self.session.options
    }

    pub fn reel_count(&self) -> usize {
        self.session.reel_count
    }

    pub fn row_count(&self) -> usize {
        self.session.row_count
    }

    pub fn double_spin(&self) -> bool {
        self.session.double_spin
    }

    pub fn start_balance(&self) -> i64 {
        self.session.start_balance
    }

    pub fn best_threshold(&self) -> f64 {
        self.session.best_threshold
    }

    pub fn best_no_free_threshold(&self) -> f64 {
        self.session.best_no_free_threshold
    }

    /// Record one round
    ///
    /// `bet` scales the round's payout factor into a win; `bonus_bet` is
    /// what the round cost the player's balance.
    pub fn analyse(&mut self, bet: i64, bonus_bet: i64, results: &[RoundResult]) -> StatsResult<()> {
        self.analyse_round(bet, bonus_bet, results)
            .inspect_err(|e| log::error!("Round analysis failed: {}", e))
    }

    fn analyse_round(&mut self, bet: i64, bonus_bet: i64, results: &[RoundResult]) -> StatsResult<()> {
        let Some(last_result) = results.last() else {
            return Err(StatsError::InvalidResult("Empty round".into()));
        };
        let last = results.len() - 1;

        let mut factor = results::grand_total(results);
        if factor >= self.session.max_payout {
            log::warn!(
                "Round payout {:.2}x capped at {:.2}x",
                factor,
                self.session.max_payout
            );
            self.counters.max_payouts += 1;
            factor = self.session.max_payout;
        }

        if !self.session.options.skips_milestones() {
            self.analyse_milestones(factor);
        }

        let win = (bet as f64 * factor).round() as i64;
        if win > 0 {
            self.counters.win_count += 1;
            self.highest_payout = self.highest_payout.max(win);
        }

        if !self.session.options.no_balance {
            self.analyse_balance(win - bonus_bet);
        }

        let wild_respin = last > 0
            && self.session.game.has_wild_respin()
            && results[0]
                .as_spin()
                .is_some_and(|s| is_wild_respin(&s.initial));

        let (free, refill, super_spins) = self.analyse_spins(results, wild_respin);
        let class = bonus::classify(self.session.game, results);

        self.counters.round_count += 1;
        self.all_rounds
            .new_round(bet, win, free, refill, super_spins, results);
        for category in categories(class) {
            self.rounds_entry(category)
                .new_round(bet, win, free, refill, super_spins, results);
        }

        if !self.session.options.no_payouts {
            if last == 0 {
                self.first_payouts.analyse_round(win);
            } else {
                for category in categories(class) {
                    self.payouts_entry(category).analyse_round(win);
                }
            }
        }

        for (ix, result) in results.iter().enumerate() {
            self.analyse_result(result, class, ix == 0, ix == last)?;
        }

        if let Some(spin) = last_result.as_spin() {
            if spin.progress_level > 0 {
                self.multiplier_marks.increase(spin.progress_level as u64);
            }
            if spin.multiplier > 0.0 {
                self.multipliers.increase(spin.multiplier);
            }
        }

        if !self.session.options.no_best {
            if factor >= self.session.best_threshold {
                self.best.insert(results, factor);
            }
            if free == 0 && factor > self.session.best_no_free_threshold {
                self.best_no_free.insert(results, factor);
            }
        }

        Ok(())
    }

    fn milestone_mut(&mut self, ix: usize) -> (&mut CountHistogram, &mut CountHistogram) {
        match ix {
            0 => (&mut self.spins_to_25x, &mut self.count_25x),
            1 => (&mut self.spins_to_100x, &mut self.count_100x),
            2 => (&mut self.spins_to_250x, &mut self.count_250x),
            3 => (&mut self.spins_to_1000x, &mut self.count_1000x),
            _ => (&mut self.spins_to_2500x, &mut self.count_2500x),
        }
    }

    /// Only the highest milestone reached counts
    fn analyse_milestones(&mut self, factor: f64) {
        let Some(ix) = self.session.milestones.iter().rposition(|&m| factor >= m) else {
            return;
        };
        let played = self.counters.round_count;
        let (spins_to, count) = self.milestone_mut(ix);
        if !spins_to.has_observed() {
            spins_to.increase(played);
        }
        count.increase_one();
    }

    fn analyse_balance(&mut self, delta: i64) {
        self.balance += delta;
        self.lowest_balance = self.lowest_balance.min(self.balance);
        self.highest_balance = self.highest_balance.max(self.balance);

        if self.balance > self.session.start_balance {
            if !self.spins_to_plus_bal.has_observed() {
                self.spins_to_plus_bal.increase(self.counters.round_count);
            }
            self.count_plus_bal.increase_one();
            self.counters.positive_bal = 1;
            self.counters.negative_bal = 0;
        } else {
            self.counters.positive_bal = 0;
            self.counters.negative_bal = 1;
        }
    }

    /// Count spins by kind; returns the round's free, refill and super spins
    fn analyse_spins(&mut self, results: &[RoundResult], wild_respin: bool) -> (u64, u64, u64) {
        let c = &mut self.counters;
        let (mut free, mut refill, mut super_spins) = (0, 0, 0);

        for result in results {
            let Some(spin) = result.as_spin() else {
                continue;
            };
            c.total_spins += 1;

            let awarded = result.awarded_free_games;
            if awarded > 0 {
                let base = matches!(spin.kind, SpinKind::Regular | SpinKind::First | SpinKind::Second);
                let in_free = spin.kind.is_free();
                if wild_respin {
                    c.free_times_super += 1;
                    c.free_awarded_super += awarded;
                    if base {
                        c.first_times_super += 1;
                        c.first_awarded_super += awarded;
                    } else if in_free {
                        c.second_times_super += 1;
                        c.second_awarded_super += awarded;
                    }
                } else {
                    c.free_times += 1;
                    c.free_awarded += awarded;
                    if base {
                        c.first_times += 1;
                        c.first_awarded += awarded;
                    } else if in_free {
                        c.second_times += 1;
                        c.second_awarded += awarded;
                    }
                }
            }

            match spin.kind {
                SpinKind::Regular => c.regular_spins += 1,
                SpinKind::First if spin.has_super_symbol() => {
                    c.super_spins += 1;
                    super_spins += 1;
                }
                SpinKind::First => c.first_spins += 1,
                SpinKind::Second => c.second_spins += 1,
                SpinKind::Refill => {
                    if wild_respin {
                        c.wild_respins += 1;
                    } else {
                        c.refill_spins += 1;
                    }
                    refill += 1;
                }
                SpinKind::Super if result.free_games > 0 => c.super_refills_free += 1,
                SpinKind::Super => c.super_refills += 1,
                SpinKind::Free => {
                    c.free_spins += 1;
                    free += 1;
                }
                SpinKind::FirstFree if spin.has_super_symbol() => c.super_spins_free += 1,
                SpinKind::FirstFree => c.first_free_spins += 1,
                SpinKind::SecondFree => {
                    c.second_free_spins += 1;
                    free += 1;
                }
                SpinKind::Unknown => c.bad_spins += 1,
            }
        }

        (free, refill, super_spins)
    }

    fn analyse_result(
        &mut self,
        result: &RoundResult,
        class: Classification,
        first: bool,
        last: bool,
    ) -> StatsResult<()> {
        match &result.data {
            ResultData::Spin(spin) => {
                if !self.session.options.no_symbols {
                    self.analyse_symbols(spin, result)?;
                }
                self.analyse_actions(spin.kind, &spin.events);
                self.round_flags.analyse(&spin.round_flags, last);
                if first {
                    *self.scripts.entry(spin.script_id).or_default() += 1;
                }

                if !self.session.options.no_payouts {
                    if class.category == BonusCategory::None {
                        self.first_payouts.analyse(result)?;
                    } else {
                        for category in categories(class) {
                            self.payouts_entry(category).analyse(result)?;
                        }
                    }
                }

                for (key, value) in &spin.choices {
                    *self
                        .player_choice
                        .entry(format!("{}:{}", key, value))
                        .or_default() += 1;
                }
                Ok(())
            }
            ResultData::InstantBonus(instant) => {
                bump(&mut self.instant_bonus, &instant.name);
                self.analyse_actions(SpinKind::First, &instant.events);
                Ok(())
            }
            ResultData::BonusWheel(wheel) => {
                self.bonus_wheel.increase(wheel.result);
                self.analyse_actions(SpinKind::First, &wheel.events);
                Ok(())
            }
            ResultData::BonusSelector(selector) => {
                self.analyse_actions(SpinKind::First, &selector.events);
                Ok(())
            }
            ResultData::Unsupported => Err(StatsError::InvalidResult(
                "Unsupported result kind in round".into(),
            )),
        }
    }

    /// Grid symbols by phase, reel-major over unlocked reels, then payout lengths
    fn analyse_symbols(&mut self, spin: &SpinResult, result: &RoundResult) -> StatsResult<()> {
        match spin.kind {
            SpinKind::Regular => {
                if let Some(s) = spin.bonus_symbol.and_then(|id| self.symbols.get_mut(id)) {
                    s.increase_bonus();
                }
            }
            SpinKind::First | SpinKind::Super => {
                if let Some(s) = spin.sticky_symbol.and_then(|id| self.symbols.get_mut(id)) {
                    s.increase_sticky();
                }
                if let Some(s) = spin.super_symbol.and_then(|id| self.symbols.get_mut(id)) {
                    s.increase_super();
                }
            }
            _ => {}
        }

        let seen: fn(&mut SymbolAccumulator, usize) = match spin.kind {
            SpinKind::Regular | SpinKind::First | SpinKind::Super => SymbolAccumulator::increase_first,
            SpinKind::Second => SymbolAccumulator::increase_second,
            SpinKind::SecondFree => SymbolAccumulator::increase_second_free,
            _ => SymbolAccumulator::increase_free,
        };

        let (reels, rows) = (self.session.reel_count, self.session.row_count);
        let mut offset = 0;
        for reel in 0..reels {
            if spin.is_locked(reel as u8 + 1) {
                continue;
            }
            for _ in 0..rows {
                let Some(&id) = spin.initial.get(offset) else {
                    return Err(StatsError::InvalidResult(format!(
                        "Grid of {} symbols too short for {}x{}",
                        spin.initial.len(),
                        reels,
                        rows
                    )));
                };
                offset += 1;
                if id > 0 {
                    seen(self.symbols.require_mut(id)?, reel);
                }
            }
        }

        for pay in &result.payouts {
            self.symbols.require_mut(pay.symbol)?.add_payout(pay.count, 1);
        }
        Ok(())
    }

    fn analyse_actions(&mut self, kind: SpinKind, events: &[TriggerEvent]) {
        for e in events {
            let a = self.actions.entry(e.id);
            match kind {
                SpinKind::Regular | SpinKind::First => a.increase_first(e.triggered),
                SpinKind::Second => a.increase_second(e.triggered),
                SpinKind::Free | SpinKind::FirstFree => a.increase_free(e.triggered),
                SpinKind::SecondFree => a.increase_second_free(e.triggered),
                SpinKind::Super => a.increase_super(e.triggered),
                SpinKind::Refill => a.increase_refill(e.triggered),
                SpinKind::Unknown => {}
            }
        }
    }

    fn rounds_entry(&mut self, category: BonusCategory) -> &mut RoundsAggregate {
        let symbol_count = self.session.symbol_count;
        let spare = &mut self.spare_rounds;
        self.bonus_rounds.entry(category).or_insert_with(|| {
            log::debug!("Tracking rounds for '{}'", category);
            let mut r = spare.pop().unwrap_or_default();
            r.configure(symbol_count);
            r
        })
    }

    fn payouts_entry(&mut self, category: BonusCategory) -> &mut PayoutAggregate {
        let session = &self.session;
        let spare = &mut self.spare_payouts;
        self.bonus_payouts.entry(category).or_insert_with(|| {
            log::debug!("Tracking payouts for '{}'", category);
            let mut p = spare.pop().unwrap_or_default();
            p.configure(
                session.row_count,
                session.max_symbol,
                &session.paylines,
                session.options.no_paylines,
            );
            p
        })
    }

    /// Fold another shard of the same session into this one
    pub fn merge(&mut self, other: &Self) -> StatsResult<()> {
        self.merge_shard(other)
            .inspect_err(|e| log::error!("Merging player rounds failed: {}", e))
    }

    fn merge_shard(&mut self, other: &Self) -> StatsResult<()> {
        StatsError::check("reel count", self.session.reel_count, other.session.reel_count)?;
        StatsError::check("row count", self.session.row_count, other.session.row_count)?;
        StatsError::check("symbol count", self.symbols.len(), other.symbols.len())?;
        StatsError::check(
            "action count",
            self.actions.configured_len(),
            other.actions.configured_len(),
        )?;

        log::debug!(
            "Merging {} rounds into {}",
            other.counters.round_count,
            self.counters.round_count
        );

        self.counters.merge(&other.counters);
        self.balance += other.balance;
        self.highest_payout = self.highest_payout.max(other.highest_payout);
        self.lowest_balance = self.lowest_balance.min(other.lowest_balance);
        self.highest_balance = self.highest_balance.max(other.highest_balance);

        self.all_rounds.merge(&other.all_rounds)?;
        self.first_payouts.merge(&other.first_payouts)?;

        self.spins_to_25x.merge(&other.spins_to_25x)?;
        self.spins_to_100x.merge(&other.spins_to_100x)?;
        self.spins_to_250x.merge(&other.spins_to_250x)?;
        self.spins_to_1000x.merge(&other.spins_to_1000x)?;
        self.spins_to_2500x.merge(&other.spins_to_2500x)?;
        self.spins_to_plus_bal.merge(&other.spins_to_plus_bal)?;
        self.count_25x.merge(&other.count_25x)?;
        self.count_100x.merge(&other.count_100x)?;
        self.count_250x.merge(&other.count_250x)?;
        self.count_1000x.merge(&other.count_1000x)?;
        self.count_2500x.merge(&other.count_2500x)?;
        self.count_plus_bal.merge(&other.count_plus_bal)?;
        self.bonus_wheel.merge(&other.bonus_wheel)?;
        self.multiplier_marks.merge(&other.multiplier_marks)?;
        self.multipliers.merge(&other.multipliers)?;

        for (category, rounds) in &other.bonus_rounds {
            self.rounds_entry(*category).merge(rounds)?;
        }
        for (category, payouts) in &other.bonus_payouts {
            self.payouts_entry(*category).merge(payouts)?;
        }

        for (key, n) in &other.instant_bonus {
            *self.instant_bonus.entry(key.clone()).or_default() += n;
        }
        for (key, n) in &other.player_choice {
            *self.player_choice.entry(key.clone()).or_default() += n;
        }
        for (id, n) in &other.scripts {
            *self.scripts.entry(*id).or_default() += n;
        }

        self.symbols.merge(&other.symbols)?;
        self.actions.merge(&other.actions)?;
        self.best.merge(&other.best);
        self.best_no_free.merge(&other.best_no_free);
        self.round_flags.merge(&other.round_flags)?;

        self.session.start_balance += other.session.start_balance;
        Ok(())
    }

    /// Zero all data, keeping the session
    pub fn reset(&mut self) {
        let start = self.session.start_balance;
        self.counters = RoundCounters::default();
        self.balance = start;
        self.highest_payout = 0;
        self.lowest_balance = start;
        self.highest_balance = start;

        self.all_rounds.reset();
        self.first_payouts.reset();
        for r in self.bonus_rounds.values_mut() {
            r.reset();
        }
        for p in self.bonus_payouts.values_mut() {
            p.reset();
        }

        for h in [
            &mut self.spins_to_25x,
            &mut self.spins_to_100x,
            &mut self.spins_to_250x,
            &mut self.spins_to_1000x,
            &mut self.spins_to_2500x,
            &mut self.spins_to_plus_bal,
            &mut self.count_25x,
            &mut self.count_100x,
            &mut self.count_250x,
            &mut self.count_1000x,
            &mut self.count_2500x,
            &mut self.count_plus_bal,
            &mut self.bonus_wheel,
            &mut self.multiplier_marks,
        ] {
            h.reset();
        }
        self.multipliers.reset();

        self.best.clear();
        self.best_no_free.clear();
        self.round_flags.reset();
        self.instant_bonus.clear();
        self.player_choice.clear();
        self.scripts.clear();
        self.symbols.reset();
        self.actions.reset();
    }

    /// Return-to-player over all rounds, in percent
    pub fn rtp(&self) -> f64 {
        percent(self.all_rounds.wins.total(), self.all_rounds.bets.total())
    }

    /// Return-to-player over rounds without free spins, in percent
    pub fn rtp_no_free(&self) -> f64 {
        percent(self.all_rounds.wins_no_free.total(), self.all_rounds.bets_no_free.total())
    }

    /// Return-to-player over rounds with free spins, in percent
    pub fn rtp_free(&self) -> f64 {
        percent(self.all_rounds.wins_free.total(), self.all_rounds.bets_free.total())
    }

    /// Winning rounds per round played, in percent
    pub fn hit_rate(&self) -> f64 {
        self.winning_probability() * 100.0
    }

    /// Winning rounds per round played
    pub fn winning_probability(&self) -> f64 {
        if self.all_rounds.count == 0 {
            return 0.0;
        }
        self.counters.win_count as f64 / self.all_rounds.count as f64
    }

    /// Best rounds, highest payout first
    pub fn best(&self) -> &BestRoundsRetainer {
        &self.best
    }

    /// Best rounds without free spins, highest payout first
    pub fn best_no_free(&self) -> &BestRoundsRetainer {
        &self.best_no_free
    }
}

impl Recycle for PlayerRoundsAggregate {
    fn recycle(&mut self) {
        self.reset();

        self.spare_rounds
            .extend(std::mem::take(&mut self.bonus_rounds).into_values());
        self.spare_payouts
            .extend(std::mem::take(&mut self.bonus_payouts).into_values());

        self.symbols.clear();
        self.actions.clear();
        self.round_flags.clear();
        self.player_id.clear();
        self.session = Session::default();
        self.balance = 0;
        self.lowest_balance = 0;
        self.highest_balance = 0;
    }
}

/// Fine category first, then its parent when it has one
fn categories(class: Classification) -> impl Iterator<Item = BonusCategory> {
    std::iter::once(class.category).chain(class.aggregate)
}

/// Player-level wild respin layout (MGD/FPR)
fn is_wild_respin(initial: &[u16]) -> bool {
    initial.len() >= WILD_RESPIN_GRID && bonus::is_mgd_wild_respin(initial)
}

fn bump(map: &mut BTreeMap<String, u64>, key: &str) {
    match map.get_mut(key) {
        Some(n) => *n += 1,
        None => {
            map.insert(key.to_string(), 1);
        }
    }
}

fn percent(wins: i64, bets: i64) -> f64 {
    if bets > 0 {
        wins as f64 * 100.0 / bets as f64
    } else {
        0.0
    }
}
