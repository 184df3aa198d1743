//! Pure computation engine for the match lifecycle's economic and
//! statistical rules. Nothing in this module performs I/O; callers load
//! records, invoke these functions, and persist the results.

use crate::domain::{Gp, PlayerId, TeamId, TeamSide};
use thiserror::Error;

pub mod advancement;
pub mod inducements;
pub mod lifecycle;
pub mod postgame;
pub mod valuation;

pub use advancement::{
    AdvancementQueue, AdvancementRequest, CharacteristicOutcome, resolve_characteristic,
};
pub use inducements::{BaselineLock, InducementSession, Purchase};
pub use postgame::{MatchReport, PostGameSheet, SideSheet};
pub use valuation::{current_team_value, inducement_ctv, team_value};

/// Rule-level problems. Collected, shown, and overridable by an explicit
/// human acknowledgment; never silently auto-corrected and never a hard
/// rejection on their own.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RuleWarning {
    #[error("{side} spend {spent} exceeds cap {cap}")]
    SpendCapExceeded { side: TeamSide, cap: Gp, spent: Gp },
    #[error("{side} has {count} star players, limit {max}")]
    StarPlayerLimitExceeded { side: TeamSide, count: u8, max: u8 },
    #[error("{side} has {count}x {item}, limit {max}")]
    ItemLimitExceeded {
        side: TeamSide,
        item: String,
        count: u8,
        max: u8,
    },
    #[error("{side} hired {star}, who does not play for this race")]
    IneligibleStar { side: TeamSide, star: String },
    #[error("{side} hired race-restricted item {item} without the required trait")]
    RestrictedItem { side: TeamSide, item: String },
    #[error("Budget baseline was locked under a different value ordering")]
    StaleBaselineLock,
    #[error("Missing dice entry: {what}")]
    MissingDiceEntry { what: String },
    #[error("Player {player} already has {skill}")]
    DuplicateSkill { player: PlayerId, skill: String },
    #[error("Skill {skill} is not in an allowed category for {player}")]
    SkillCategoryNotAllowed { player: PlayerId, skill: String },
    #[error("Player {player} is {deficit} SPP short for the queued purchases")]
    SppOverspend { player: PlayerId, deficit: i64 },
    #[error("Treasury of {team} would end at {projected}")]
    ProjectedNegativeTreasury { team: TeamId, projected: Gp },
}

/// Accumulated rule warnings from a validation pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidationReport {
    pub warnings: Vec<RuleWarning>,
}

impl ValidationReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, warning: RuleWarning) {
        self.warnings.push(warning);
    }

    pub fn merge(&mut self, other: ValidationReport) {
        self.warnings.extend(other.warnings);
    }

    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }
}

impl std::fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.warnings.is_empty() {
            return write!(f, "no warnings");
        }
        for (i, w) in self.warnings.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{w}")?;
        }
        Ok(())
    }
}
