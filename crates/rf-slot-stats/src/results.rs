//! Round results consumed by the aggregates
//!
//! A round is an ordered slice of [`RoundResult`]s as produced by the game
//! simulator: the initial spin, followed by any refills, respins, free spins
//! and bonus features it triggered.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Phase tag of a spin result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpinKind {
    #[default]
    Regular,
    First,
    Second,
    Super,
    Refill,
    Free,
    FirstFree,
    SecondFree,
    /// Any phase tag this crate does not know
    #[serde(other)]
    Unknown,
}

impl SpinKind {
    /// Is this spin part of a free-spins sequence?
    pub fn is_free(self) -> bool {
        matches!(self, Self::Free | Self::FirstFree | Self::SecondFree)
    }
}

/// Kind of a payout event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayoutKind {
    Winline,
    Wilds,
    Scatters,
    BonusSymbol,
    Cluster,
    BonusGame,
    SuperShape,
    Multiplier,
    BombScatters,
    PlayerChoice,
    ReducePenalty,
    DividePenalty,
}

/// One scored line, shape or symbol group within a spin
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payout {
    pub kind: PayoutKind,
    /// Paying symbol id
    pub symbol: u16,
    /// Matched length (symbols on the line, scatters on the grid)
    pub count: u8,
    /// Payout factor (multiple of the bet)
    pub factor: f64,
    /// Static payline id (0 = all-paylines mode)
    #[serde(default)]
    pub payline_id: u8,
    /// Dynamic payline id used in all-paylines mode
    #[serde(default)]
    pub all_payline_id: i32,
    /// Row per reel of the matched line (all-paylines mode)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub pay_rows: Vec<u8>,
}

impl Payout {
    /// Payout of a given kind without line information
    pub fn new(kind: PayoutKind, symbol: u16, count: u8, factor: f64) -> Self {
        Self {
            kind,
            symbol,
            count,
            factor,
            payline_id: 0,
            all_payline_id: 0,
            pay_rows: Vec::new(),
        }
    }

    /// Winline payout on a static payline
    pub fn winline(payline_id: u8, symbol: u16, count: u8, factor: f64) -> Self {
        Self {
            payline_id,
            ..Self::new(PayoutKind::Winline, symbol, count, factor)
        }
    }

    /// Winline payout in all-paylines mode
    pub fn all_payline(all_payline_id: i32, pay_rows: Vec<u8>, symbol: u16, count: u8, factor: f64) -> Self {
        Self {
            all_payline_id,
            pay_rows,
            ..Self::new(PayoutKind::Winline, symbol, count, factor)
        }
    }
}

/// Triggered-event log entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerEvent {
    /// Action id
    pub id: u16,
    /// Did the action actually fire (as opposed to being evaluated)?
    #[serde(default)]
    pub triggered: bool,
}

/// One grid outcome within a round
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SpinResult {
    #[serde(default)]
    pub kind: SpinKind,
    /// Symbol ids, reel-major (`reel * rows + row`)
    pub initial: Vec<u16>,
    /// Locked reels (1-based)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub locked: Vec<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sticky_symbol: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub super_symbol: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bonus_symbol: Option<u16>,
    /// Progress meter level
    #[serde(default)]
    pub progress_level: u32,
    #[serde(default)]
    pub multiplier: f64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub events: Vec<TriggerEvent>,
    /// Round flag values indexed by flag id
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub round_flags: Vec<i64>,
    /// Player choices (key → value)
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub choices: BTreeMap<String, String>,
    /// Non-zero when the round was bought
    #[serde(default)]
    pub bonus_buy: u8,
    /// Script that produced the round
    #[serde(default)]
    pub script_id: i32,
}

impl SpinResult {
    /// Spin of the given kind over a reel-major grid
    pub fn new(kind: SpinKind, initial: Vec<u16>) -> Self {
        Self {
            kind,
            initial,
            ..Default::default()
        }
    }

    /// Is the (1-based) reel locked?
    pub fn is_locked(&self, reel: u8) -> bool {
        self.locked.contains(&reel)
    }

    /// Occurrences of `symbol` in the grid
    pub fn symbol_count(&self, symbol: u16) -> usize {
        self.initial.iter().filter(|&&id| id == symbol).count()
    }

    /// Is a super symbol active on this spin?
    pub fn has_super_symbol(&self) -> bool {
        matches!(self.super_symbol, Some(id) if id > 0)
    }
}

/// Instant bonus awarded during a round
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstantBonus {
    pub name: String,
    #[serde(default)]
    pub events: Vec<TriggerEvent>,
}

/// Bonus wheel outcome
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BonusWheel {
    /// Segment the wheel stopped on
    pub result: u64,
    #[serde(default)]
    pub events: Vec<TriggerEvent>,
}

/// Bonus selector outcome
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BonusSelector {
    #[serde(default)]
    pub events: Vec<TriggerEvent>,
}

/// Payload of a round result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ResultData {
    Spin(SpinResult),
    InstantBonus(InstantBonus),
    BonusWheel(BonusWheel),
    BonusSelector(BonusSelector),
    /// Any result kind the aggregates do not understand
    #[serde(other)]
    Unsupported,
}

/// One result within a round
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundResult {
    pub data: ResultData,
    /// Free games awarded by this result
    #[serde(default)]
    pub awarded_free_games: u64,
    /// Free games remaining when this result was produced
    #[serde(default)]
    pub free_games: u64,
    /// Payout factor of this result
    #[serde(default)]
    pub total: f64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub payouts: Vec<Payout>,
}

impl RoundResult {
    /// Result wrapping a spin
    pub fn spin(spin: SpinResult, total: f64) -> Self {
        Self {
            data: ResultData::Spin(spin),
            awarded_free_games: 0,
            free_games: 0,
            total,
            payouts: Vec::new(),
        }
    }

    /// Attach payout events
    pub fn with_payouts(mut self, payouts: Vec<Payout>) -> Self {
        self.payouts = payouts;
        self
    }

    /// Set the number of free games awarded
    pub fn with_awarded(mut self, awarded: u64) -> Self {
        self.awarded_free_games = awarded;
        self
    }

    /// The spin payload, when this is a spin
    pub fn as_spin(&self) -> Option<&SpinResult> {
        match &self.data {
            ResultData::Spin(spin) => Some(spin),
            _ => None,
        }
    }
}

/// Sum of payout factors over a round (negative sums count as zero)
pub fn grand_total(results: &[RoundResult]) -> f64 {
    let total: f64 = results.iter().map(|r| r.total).sum();
    if total <= 0.0 { 0.0 } else { total }
}

/// [`grand_total`] capped at `max_payout`
pub fn capped_grand_total(results: &[RoundResult], max_payout: f64) -> f64 {
    grand_total(results).min(max_payout)
}
