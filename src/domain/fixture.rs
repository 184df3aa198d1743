//! Fixtures: scheduled matches and the pregame economic snapshot taken at
//! kickoff, which cancellation restores from.

use super::primitives::{Gp, MatchId, TeamId, TeamSide};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FixtureStatus {
    Scheduled,
    InProgress,
    Completed,
    Cancelled,
}

impl std::fmt::Display for FixtureStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FixtureStatus::Scheduled => write!(f, "scheduled"),
            FixtureStatus::InProgress => write!(f, "in_progress"),
            FixtureStatus::Completed => write!(f, "completed"),
            FixtureStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// One side's share of the pregame snapshot. `treasury_spent` is the exact
/// amount debited at kickoff; cancellation credits it back and flips
/// `restored` so a retried cancellation never double-credits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SidePregame {
    pub ctv: Gp,
    pub petty_cash: Gp,
    pub treasury_spent: Gp,
    pub restored: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PregameSnapshot {
    pub home: SidePregame,
    pub away: SidePregame,
    pub first_turn: TeamSide,
}

impl PregameSnapshot {
    pub fn side(&self, side: TeamSide) -> &SidePregame {
        match side {
            TeamSide::Home => &self.home,
            TeamSide::Away => &self.away,
        }
    }

    pub fn side_mut(&mut self, side: TeamSide) -> &mut SidePregame {
        match side {
            TeamSide::Home => &mut self.home,
            TeamSide::Away => &mut self.away,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fixture {
    pub id: MatchId,
    pub season: u32,
    pub round: u32,
    pub home: TeamId,
    pub away: TeamId,
    pub status: FixtureStatus,
    pub score_home: u8,
    pub score_away: u8,
    /// Captured at kickoff; required for cancellation rollback and audit.
    pub pregame: Option<PregameSnapshot>,
}

impl Fixture {
    pub fn new(id: MatchId, season: u32, round: u32, home: TeamId, away: TeamId) -> Self {
        Fixture {
            id,
            season,
            round,
            home,
            away,
            status: FixtureStatus::Scheduled,
            score_home: 0,
            score_away: 0,
            pregame: None,
        }
    }

    pub fn team_id(&self, side: TeamSide) -> &TeamId {
        match side {
            TeamSide::Home => &self.home,
            TeamSide::Away => &self.away,
        }
    }

    pub fn side_of(&self, team: &TeamId) -> Option<TeamSide> {
        if &self.home == team {
            Some(TeamSide::Home)
        } else if &self.away == team {
            Some(TeamSide::Away)
        } else {
            None
        }
    }
}
