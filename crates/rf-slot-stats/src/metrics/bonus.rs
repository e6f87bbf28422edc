//! Bonus category classification
//!
//! Every round with more than one result is assigned a [`BonusCategory`]
//! from the game identity and features of the result sequence (scatter
//! counts, wild respin layout, player choices, progress levels, bonus buys).
//! Fine-grained categories roll up into a parent category so reports can
//! show "MGD bonus spins (all)" next to the 3/4-scatter split.

use std::fmt;

use serde::{Deserialize, Serialize, Serializer};

use crate::results::{RoundResult, SpinKind, SpinResult};

/// Symbol id of the MGD/FPR respin wild
pub const RESPIN_WILD: u16 = 10;
/// Symbol id of the MGD/FPR bonus scatter
pub const MGD_SCATTER: u16 = 9;
/// Symbol id of the BTR/BER bonus scatter
pub const BTR_SCATTER: u16 = 11;

/// Leading results inspected for a bonus buy
const BONUS_BUY_WINDOW: usize = 5;

/// Game identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum GameId {
    Bot,
    Ccb,
    Mgd,
    Lam,
    Owl,
    Frm,
    Ofg,
    Fpr,
    Hog,
    Mog,
    Bbs,
    Btr,
    Ber,
    Cas,
    Ana,
    Crw,
    Yyl,
    Frj,
    /// Any game without classification rules
    #[default]
    #[serde(other)]
    Other,
}

impl GameId {
    /// Does this game award the MGD-style wild respin?
    pub fn has_wild_respin(self) -> bool {
        matches!(self, Self::Mgd | Self::Fpr)
    }
}

/// Kind of bonus a round received
///
/// Discriminants are the wire ids and must not be reordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[repr(u8)]
pub enum BonusCategory {
    #[default]
    None = 0,
    BotFreeSpins,
    CcbSuperX,
    CcbFreeSpins,
    MgdWildRespin,
    MgdBonus,
    MgdSuperBonus,
    LamNorth,
    LamSouth,
    LamNorthBB,
    LamSouthBB,
    OwlBonus1,
    OwlBonus2,
    OwlBonus3,
    OwlBonus1BB,
    OwlBonus2BB,
    OwlBonus3BB,
    FrmRefill,
    FrmFreeSpins,
    FrmFreeSpinsBB,
    OfgFreeSpins,
    OfgFreeSpinsBB,
    FprWildRespin,
    FprBonus,
    FprSuperBonus,
    MgdBonus3,
    MgdBonus4,
    MgdSuperBonus3,
    MgdSuperBonus4,
    FprBonus3,
    FprBonus4,
    FprSuperBonus3,
    FprSuperBonus4,
    BtrFreeSpins,
    BtrFreeSpins3,
    BtrFreeSpins4,
    BtrFreeSpins5,
    BtrFreeSpins6,
    BtrFreeSpins33,
    OfgLevel1,
    OfgLevel2,
    OfgLevel3,
    OfgLevel4,
    OfgLevel1BB,
    OfgLevel2BB,
    OfgLevel3BB,
    OfgLevel4BB,
    Unknown,
}

impl BonusCategory {
    /// Every category in id order
    pub const ALL: [BonusCategory; 48] = [
        Self::None,
        Self::BotFreeSpins,
        Self::CcbSuperX,
        Self::CcbFreeSpins,
        Self::MgdWildRespin,
        Self::MgdBonus,
        Self::MgdSuperBonus,
        Self::LamNorth,
        Self::LamSouth,
        Self::LamNorthBB,
        Self::LamSouthBB,
        Self::OwlBonus1,
        Self::OwlBonus2,
        Self::OwlBonus3,
        Self::OwlBonus1BB,
        Self::OwlBonus2BB,
        Self::OwlBonus3BB,
        Self::FrmRefill,
        Self::FrmFreeSpins,
        Self::FrmFreeSpinsBB,
        Self::OfgFreeSpins,
        Self::OfgFreeSpinsBB,
        Self::FprWildRespin,
        Self::FprBonus,
        Self::FprSuperBonus,
        Self::MgdBonus3,
        Self::MgdBonus4,
        Self::MgdSuperBonus3,
        Self::MgdSuperBonus4,
        Self::FprBonus3,
        Self::FprBonus4,
        Self::FprSuperBonus3,
        Self::FprSuperBonus4,
        Self::BtrFreeSpins,
        Self::BtrFreeSpins3,
        Self::BtrFreeSpins4,
        Self::BtrFreeSpins5,
        Self::BtrFreeSpins6,
        Self::BtrFreeSpins33,
        Self::OfgLevel1,
        Self::OfgLevel2,
        Self::OfgLevel3,
        Self::OfgLevel4,
        Self::OfgLevel1BB,
        Self::OfgLevel2BB,
        Self::OfgLevel3BB,
        Self::OfgLevel4BB,
        Self::Unknown,
    ];

    /// Stable wire id
    pub fn id(self) -> u8 {
        self as u8
    }

    /// Category for a wire id
    pub fn from_id(id: u8) -> Option<Self> {
        Self::ALL.get(id as usize).copied()
    }

    /// Report label
    pub fn name(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::BotFreeSpins => "BOT free spins",
            Self::CcbSuperX => "CCB SuperX spins",
            Self::CcbFreeSpins => "CCB free spins",
            Self::MgdWildRespin => "MGD wild respin",
            Self::MgdBonus => "MGD bonus spins (all)",
            Self::MgdSuperBonus => "MGD super bonus spins (all)",
            Self::LamNorth => "LAM free spins North",
            Self::LamSouth => "LAM free spins South",
            Self::LamNorthBB => "LAM free spins North - bonus buy",
            Self::LamSouthBB => "LAM free spins South - bonus buy",
            Self::OwlBonus1 => "OWL bonus spins (1)",
            Self::OwlBonus2 => "OWL bonus spins (2)",
            Self::OwlBonus3 => "OWL bonus spins (3)",
            Self::OwlBonus1BB => "OWL bonus spins (1) - bonus bet",
            Self::OwlBonus2BB => "OWL bonus spins (2) - bonus bet",
            Self::OwlBonus3BB => "OWL bonus spins (3) - bonus bet",
            Self::FrmRefill => "FRM refill spins",
            Self::FrmFreeSpins => "FRM free spins",
            Self::FrmFreeSpinsBB => "FRM free spins - bonus buy",
            Self::OfgFreeSpins => "OFG free spins",
            Self::OfgFreeSpinsBB => "OFG free spins - bonus buy",
            Self::FprWildRespin => "FPR wild respin",
            Self::FprBonus => "FPR bonus spins (all)",
            Self::FprSuperBonus => "FPR super bonus spins (all)",
            Self::MgdBonus3 => "MGD bonus spins (3 scatters)",
            Self::MgdBonus4 => "MGD bonus spins (4 scatters)",
            Self::MgdSuperBonus3 => "MGD super bonus spins (3 scatters)",
            Self::MgdSuperBonus4 => "MGD super bonus spins (4 scatters)",
            Self::FprBonus3 => "FPR bonus spins (3 scatters)",
            Self::FprBonus4 => "FPR bonus spins (4 scatters)",
            Self::FprSuperBonus3 => "FPR super bonus spins (3 scatters)",
            Self::FprSuperBonus4 => "FPR super bonus spins (4 scatters)",
            Self::BtrFreeSpins => "BTR free spins",
            Self::BtrFreeSpins3 => "BTR free spins (3 scatters)",
            Self::BtrFreeSpins4 => "BTR free spins (4 scatters)",
            Self::BtrFreeSpins5 => "BTR free spins (5 scatters)",
            Self::BtrFreeSpins6 => "BTR free spins (6 scatters)",
            Self::BtrFreeSpins33 => "BTR free spins (3+3 scatters)",
            Self::OfgLevel1 => "OFG free spins (level 1)",
            Self::OfgLevel2 => "OFG free spins (level 2)",
            Self::OfgLevel3 => "OFG free spins (level 3)",
            Self::OfgLevel4 => "OFG free spins (level 4)",
            Self::OfgLevel1BB => "OFG free spins (level 1) - bonus buy",
            Self::OfgLevel2BB => "OFG free spins (level 2) - bonus buy",
            Self::OfgLevel3BB => "OFG free spins (level 3) - bonus buy",
            Self::OfgLevel4BB => "OFG free spins (level 4) - bonus buy",
            Self::Unknown => "Free spins",
        }
    }

    /// Parent category a fine-grained category rolls up into
    pub fn aggregate(self) -> Option<Self> {
        match self {
            Self::MgdBonus3 | Self::MgdBonus4 => Some(Self::MgdBonus),
            Self::MgdSuperBonus3 | Self::MgdSuperBonus4 => Some(Self::MgdSuperBonus),
            Self::FprBonus3 | Self::FprBonus4 => Some(Self::FprBonus),
            Self::FprSuperBonus3 | Self::FprSuperBonus4 => Some(Self::FprSuperBonus),
            Self::BtrFreeSpins3
            | Self::BtrFreeSpins4
            | Self::BtrFreeSpins5
            | Self::BtrFreeSpins6
            | Self::BtrFreeSpins33 => Some(Self::BtrFreeSpins),
            Self::OfgLevel1 | Self::OfgLevel2 | Self::OfgLevel3 | Self::OfgLevel4 => {
                Some(Self::OfgFreeSpins)
            }
            Self::OfgLevel1BB | Self::OfgLevel2BB | Self::OfgLevel3BB | Self::OfgLevel4BB => {
                Some(Self::OfgFreeSpinsBB)
            }
            _ => None,
        }
    }

    /// Is this a free-spins/bonus category (anything but `None`)?
    pub fn is_bonus(self) -> bool {
        self != Self::None
    }
}

impl fmt::Display for BonusCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Serialize for BonusCategory {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.id())
    }
}

/// Fine category of a round plus the parent it rolls up into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Classification {
    pub category: BonusCategory,
    pub aggregate: Option<BonusCategory>,
}

impl From<BonusCategory> for Classification {
    fn from(category: BonusCategory) -> Self {
        Self {
            category,
            aggregate: category.aggregate(),
        }
    }
}

/// Classify a round of `game`
///
/// Rounds with at most one result never carry a bonus.
pub fn classify(game: GameId, results: &[RoundResult]) -> Classification {
    determine(game, results).into()
}

fn determine(game: GameId, results: &[RoundResult]) -> BonusCategory {
    if results.len() <= 1 {
        return BonusCategory::None;
    }

    let first = results[0].as_spin();

    match game {
        GameId::Bot => BonusCategory::BotFreeSpins,

        GameId::Ccb => match first {
            Some(s) if s.kind == SpinKind::Super => BonusCategory::CcbSuperX,
            _ => BonusCategory::CcbFreeSpins,
        },

        GameId::Mgd | GameId::Fpr => match first {
            Some(s) => respin_bonus(game, s),
            None => BonusCategory::Unknown,
        },

        GameId::Lam => {
            let bb = is_bonus_buy(results);
            match lam_wing(results) {
                Some("north") if bb => BonusCategory::LamNorthBB,
                Some("north") => BonusCategory::LamNorth,
                Some("south") if bb => BonusCategory::LamSouthBB,
                Some("south") => BonusCategory::LamSouth,
                _ => BonusCategory::Unknown,
            }
        }

        GameId::Ofg => ofg_bonus(results),

        GameId::Btr | GameId::Ber => match first {
            Some(s) => btr_bonus(s, results),
            None => BonusCategory::Unknown,
        },

        _ => BonusCategory::Unknown,
    }
}

/// Does the grid show the MGD/FPR wild respin layout?
///
/// Respin wilds on the top and bottom rows of the first reel pair.
pub fn is_mgd_wild_respin(initial: &[u16]) -> bool {
    initial.len() >= 22
        && [0, 1, 20, 21]
            .iter()
            .all(|&ix| initial[ix] == RESPIN_WILD)
}

/// Player's wing choice on the second result (LAM)
pub fn lam_wing(results: &[RoundResult]) -> Option<&str> {
    results
        .get(1)?
        .as_spin()?
        .choices
        .get("wing")
        .map(String::as_str)
}

/// Was the round started with a bonus buy?
pub fn is_bonus_buy(results: &[RoundResult]) -> bool {
    results
        .iter()
        .take(BONUS_BUY_WINDOW)
        .filter_map(RoundResult::as_spin)
        .any(|s| s.bonus_buy != 0)
}

fn respin_bonus(game: GameId, first: &SpinResult) -> BonusCategory {
    use BonusCategory::*;

    let respin = is_mgd_wild_respin(&first.initial);
    let four = first.symbol_count(MGD_SCATTER) == 4;
    let few = first.symbol_count(MGD_SCATTER) < 3;
    let mgd = game == GameId::Mgd;

    match (respin, few, four) {
        (true, true, _) => if mgd { MgdWildRespin } else { FprWildRespin },
        (true, false, true) => if mgd { MgdSuperBonus4 } else { FprSuperBonus4 },
        (true, false, false) => if mgd { MgdSuperBonus3 } else { FprSuperBonus3 },
        (false, _, true) => if mgd { MgdBonus4 } else { FprBonus4 },
        (false, _, false) => if mgd { MgdBonus3 } else { FprBonus3 },
    }
}

fn ofg_bonus(results: &[RoundResult]) -> BonusCategory {
    use BonusCategory::*;

    let bb = is_bonus_buy(results);
    let Some(last) = results.last().and_then(RoundResult::as_spin) else {
        return if bb { OfgFreeSpinsBB } else { OfgFreeSpins };
    };

    match (last.progress_level, bb) {
        (1..=3, false) => OfgLevel1,
        (4..=7, false) => OfgLevel2,
        (8..=12, false) => OfgLevel3,
        (_, false) => OfgLevel4,
        (1..=3, true) => OfgLevel1BB,
        (4..=7, true) => OfgLevel2BB,
        (8..=12, true) => OfgLevel3BB,
        (_, true) => OfgLevel4BB,
    }
}

fn btr_bonus(first: &SpinResult, results: &[RoundResult]) -> BonusCategory {
    match first.symbol_count(BTR_SCATTER) {
        3 if btr_retrigger_three(results) => BonusCategory::BtrFreeSpins33,
        3 => BonusCategory::BtrFreeSpins3,
        4 => BonusCategory::BtrFreeSpins4,
        5 => BonusCategory::BtrFreeSpins5,
        6 => BonusCategory::BtrFreeSpins6,
        _ => BonusCategory::Unknown,
    }
}

/// Does any later spin show exactly three scatters again?
fn btr_retrigger_three(results: &[RoundResult]) -> bool {
    results
        .iter()
        .skip(1)
        .filter_map(RoundResult::as_spin)
        .any(|s| s.symbol_count(BTR_SCATTER) == 3)
}
