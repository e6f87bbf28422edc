//! Session configuration
//!
//! Everything an aggregate needs to know about the game before the first
//! round: grid size, symbol/action/payline/flag sets, thresholds and the
//! sections to skip. Loaded from JSON or YAML and validated before use.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::{StatsError, StatsResult};
use crate::metrics::bonus::GameId;

/// Default payout factor at which a round is capped
pub const DEFAULT_MAX_PAYOUT: f64 = 10_000.0;

/// Default payout factor for best-round retention
pub const DEFAULT_BEST_THRESHOLD: f64 = 2500.0;

/// Default payout factor for best rounds without free spins
pub const DEFAULT_BEST_NO_FREE_THRESHOLD: f64 = 200.0;

/// Default number of rounds kept per best list
pub const DEFAULT_MAX_BEST: usize = 25;

/// Default milestone payout factors (ascending)
pub const DEFAULT_MILESTONES: [f64; 5] = [25.0, 100.0, 250.0, 1000.0, 2500.0];

/// Symbol definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymbolDef {
    pub id: u16,
    pub name: String,
    /// Artwork reference
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub resource: String,
}

impl SymbolDef {
    pub fn new(id: u16, name: &str) -> Self {
        Self {
            id,
            name: name.to_string(),
            resource: String::new(),
        }
    }

    pub fn with_resource(mut self, resource: &str) -> Self {
        self.resource = resource.to_string();
        self
    }
}

/// Spin action definition
///
/// An action may carry a chain of alternates (the same feature with other
/// settings); each alternate has its own id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionDef {
    pub id: u16,
    pub name: String,
    #[serde(default)]
    pub kind: String,
    #[serde(default)]
    pub config: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alternate: Option<Box<ActionDef>>,
}

impl ActionDef {
    pub fn new(id: u16, name: &str, kind: &str, config: &str) -> Self {
        Self {
            id,
            name: name.to_string(),
            kind: kind.to_string(),
            config: config.to_string(),
            alternate: None,
        }
    }

    /// Append an alternate at the end of the chain
    pub fn with_alternate(mut self, alternate: ActionDef) -> Self {
        let tail = match self.alternate.take() {
            Some(next) => (*next).with_alternate(alternate),
            None => alternate,
        };
        self.alternate = Some(Box::new(tail));
        self
    }

    /// This action followed by its alternates
    pub fn chain(&self) -> impl Iterator<Item = &ActionDef> {
        std::iter::successors(Some(self), |d| d.alternate.as_deref())
    }
}

/// Static payline definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaylineDef {
    /// Payline id (1-based; 0 is reserved for all-paylines mode)
    pub id: u8,
    /// Row index per reel
    pub row_map: Vec<u8>,
}

impl PaylineDef {
    pub fn new(id: u8, row_map: &[u8]) -> Self {
        Self {
            id,
            row_map: row_map.to_vec(),
        }
    }
}

/// Round flag definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlagDef {
    pub id: usize,
    pub name: String,
}

impl FlagDef {
    pub fn new(id: usize, name: &str) -> Self {
        Self {
            id,
            name: name.to_string(),
        }
    }
}

/// Sections of the analysis to skip
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisOptions {
    pub no_paylines: bool,
    pub no_payouts: bool,
    pub no_symbols: bool,
    pub no_best: bool,
    pub no_spins: bool,
    pub no_counts: bool,
    pub no_balance: bool,
}

impl AnalysisOptions {
    /// Only bets, wins and spin counts
    pub fn minimal() -> Self {
        Self {
            no_paylines: true,
            no_payouts: true,
            no_symbols: true,
            no_best: true,
            no_spins: true,
            no_counts: true,
            no_balance: true,
        }
    }

    /// Are milestone histograms skipped entirely?
    pub fn skips_milestones(&self) -> bool {
        self.no_spins && self.no_counts
    }
}

/// Best-round retention settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BestConfig {
    /// Minimum payout factor for the best list
    #[serde(default = "default_best_threshold")]
    pub threshold: f64,
    /// Payout factor a round without free spins must exceed
    #[serde(default = "default_best_no_free_threshold")]
    pub no_free_threshold: f64,
    /// Rounds kept per list
    #[serde(default = "default_max_best")]
    pub max_best: usize,
}

fn default_best_threshold() -> f64 {
    DEFAULT_BEST_THRESHOLD
}

fn default_best_no_free_threshold() -> f64 {
    DEFAULT_BEST_NO_FREE_THRESHOLD
}

fn default_max_best() -> usize {
    DEFAULT_MAX_BEST
}

impl Default for BestConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_BEST_THRESHOLD,
            no_free_threshold: DEFAULT_BEST_NO_FREE_THRESHOLD,
            max_best: DEFAULT_MAX_BEST,
        }
    }
}

/// Complete configuration of an analysis session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(default)]
    pub game: GameId,
    #[serde(default)]
    pub player_id: String,
    /// Balance before the first round
    #[serde(default)]
    pub start_balance: i64,
    #[serde(default = "default_reel_count")]
    pub reel_count: usize,
    #[serde(default = "default_row_count")]
    pub row_count: usize,
    #[serde(default)]
    pub double_spin: bool,
    /// Payout factor at which a round is capped
    #[serde(default = "default_max_payout")]
    pub max_payout: f64,
    #[serde(default)]
    pub symbols: Vec<SymbolDef>,
    #[serde(default)]
    pub actions: Vec<ActionDef>,
    #[serde(default)]
    pub paylines: Vec<PaylineDef>,
    #[serde(default)]
    pub flags: Vec<FlagDef>,
    #[serde(default)]
    pub best: BestConfig,
    /// Milestone payout factors, ascending
    #[serde(default = "default_milestones")]
    pub milestones: [f64; 5],
    #[serde(default)]
    pub options: AnalysisOptions,
}

fn default_reel_count() -> usize {
    5
}

fn default_row_count() -> usize {
    3
}

fn default_max_payout() -> f64 {
    DEFAULT_MAX_PAYOUT
}

fn default_milestones() -> [f64; 5] {
    DEFAULT_MILESTONES
}

impl SessionConfig {
    /// Empty configuration for a grid of `reel_count` × `row_count`
    pub fn new(game: GameId, reel_count: usize, row_count: usize) -> Self {
        Self {
            game,
            player_id: String::new(),
            start_balance: 0,
            reel_count,
            row_count,
            double_spin: false,
            max_payout: DEFAULT_MAX_PAYOUT,
            symbols: Vec::new(),
            actions: Vec::new(),
            paylines: Vec::new(),
            flags: Vec::new(),
            best: BestConfig::default(),
            milestones: DEFAULT_MILESTONES,
            options: AnalysisOptions::default(),
        }
    }

    /// Standard 5×3 with 12 symbols and 5 paylines
    pub fn standard_5x3() -> Self {
        let names = [
            "Wild", "Seven", "Bell", "Bar", "Plum", "Orange", "Lemon", "Cherry", "Grape", "Melon",
            "Star", "Scatter",
        ];
        let mut config = Self::new(GameId::Other, 5, 3);
        config.symbols = names
            .iter()
            .enumerate()
            .map(|(ix, name)| SymbolDef::new(ix as u16 + 1, name))
            .collect();
        config.paylines = vec![
            PaylineDef::new(1, &[1, 1, 1, 1, 1]),
            PaylineDef::new(2, &[0, 0, 0, 0, 0]),
            PaylineDef::new(3, &[2, 2, 2, 2, 2]),
            PaylineDef::new(4, &[0, 1, 2, 1, 0]),
            PaylineDef::new(5, &[2, 1, 0, 1, 2]),
        ];
        config
    }

    /// 6×4 ways game (all-paylines mode, no static paylines)
    pub fn ways_6x4() -> Self {
        let mut config = Self::new(GameId::Other, 6, 4);
        config.symbols = (1..=10)
            .map(|id| SymbolDef::new(id, &format!("S{}", id)))
            .collect();
        config
    }

    pub fn with_game(mut self, game: GameId) -> Self {
        self.game = game;
        self
    }

    pub fn with_player(mut self, player_id: &str, start_balance: i64) -> Self {
        self.player_id = player_id.to_string();
        self.start_balance = start_balance;
        self
    }

    pub fn with_options(mut self, options: AnalysisOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_best(mut self, best: BestConfig) -> Self {
        self.best = best;
        self
    }

    /// Parse and validate a JSON document
    pub fn from_json(json: &str) -> StatsResult<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| StatsError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Parse and validate a YAML document
    pub fn from_yaml(yaml: &str) -> StatsResult<Self> {
        let config: Self =
            serde_yml::from_str(yaml).map_err(|e| StatsError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize as pretty JSON
    pub fn to_json(&self) -> StatsResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| StatsError::Config(e.to_string()))
    }

    /// Check internal consistency
    pub fn validate(&self) -> StatsResult<()> {
        if self.reel_count == 0 || self.row_count == 0 {
            return Err(StatsError::Config(format!(
                "Empty grid: {} reels × {} rows",
                self.reel_count, self.row_count
            )));
        }

        if self.max_payout <= 0.0 {
            return Err(StatsError::Config(format!(
                "Max payout must be positive: {}",
                self.max_payout
            )));
        }

        if self.best.max_best == 0 {
            return Err(StatsError::Config("Best list size must be > 0".into()));
        }

        if self.milestones[0] <= 0.0 || self.milestones.windows(2).any(|w| w[0] >= w[1]) {
            return Err(StatsError::Config(format!(
                "Milestones must be positive and ascending: {:?}",
                self.milestones
            )));
        }

        let mut ids = HashSet::new();
        for s in &self.symbols {
            if !ids.insert(s.id) {
                return Err(StatsError::Config(format!("Duplicate symbol id: {}", s.id)));
            }
        }

        let mut ids = HashSet::new();
        for a in self.actions.iter().flat_map(ActionDef::chain) {
            if !ids.insert(a.id) {
                return Err(StatsError::Config(format!("Duplicate action id: {}", a.id)));
            }
        }

        let mut ids = HashSet::new();
        for p in &self.paylines {
            if p.id == 0 {
                return Err(StatsError::Config("Payline id 0 is reserved".into()));
            }
            if !ids.insert(p.id) {
                return Err(StatsError::Config(format!("Duplicate payline id: {}", p.id)));
            }
            if p.row_map.len() > self.reel_count {
                return Err(StatsError::Config(format!(
                    "Payline {} spans {} reels > {}",
                    p.id,
                    p.row_map.len(),
                    self.reel_count
                )));
            }
            if let Some(row) = p.row_map.iter().find(|&&r| r as usize >= self.row_count) {
                return Err(StatsError::Config(format!(
                    "Payline {} uses row {} >= {}",
                    p.id, row, self.row_count
                )));
            }
        }

        Ok(())
    }

    /// Highest configured symbol id (0 without symbols)
    pub fn max_symbol_id(&self) -> u16 {
        self.symbols.iter().map(|s| s.id).max().unwrap_or(0)
    }

    /// Length of symbol-id indexed vectors
    pub fn symbol_count(&self) -> usize {
        self.symbols
            .iter()
            .map(|s| s.id as usize + 1)
            .max()
            .unwrap_or(0)
    }

    /// Total grid positions
    pub fn total_positions(&self) -> usize {
        self.reel_count * self.row_count
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self::standard_5x3()
    }
}
