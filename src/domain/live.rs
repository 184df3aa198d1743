//! Live-play working document. Created at kickoff from a frozen roster
//! snapshot so concurrent squad edits cannot corrupt an ongoing game;
//! destroyed when the match is reconciled or cancelled.

use super::player::Player;
use super::primitives::{MatchId, PlayerId, TeamId, TeamSide};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Per-player live counters over the frozen snapshot copy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LivePlayer {
    pub player: Player,
    /// Star players earn no SPP and never join the permanent roster.
    pub star: bool,
    pub touchdowns: u8,
    pub casualties: u8,
    pub completions: u8,
    pub interceptions: u8,
    pub deflections: u8,
    pub fouls: u8,
    pub used: bool,
    pub injured: bool,
    pub sent_off: bool,
}

impl LivePlayer {
    pub fn from_snapshot(player: Player, star: bool) -> Self {
        LivePlayer {
            player,
            star,
            touchdowns: 0,
            casualties: 0,
            completions: 0,
            interceptions: 0,
            deflections: 0,
            fouls: 0,
            used: false,
            injured: false,
            sent_off: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiveSide {
    pub team: TeamId,
    pub score: u8,
    pub rerolls_left: u8,
    pub players: Vec<LivePlayer>,
}

impl LiveSide {
    pub fn player_mut(&mut self, id: &PlayerId) -> Option<&mut LivePlayer> {
        self.players.iter_mut().find(|p| &p.player.id == id)
    }

    pub fn player(&self, id: &PlayerId) -> Option<&LivePlayer> {
        self.players.iter().find(|p| &p.player.id == id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LiveActionKind {
    Touchdown,
    Casualty,
    Completion,
    Interception,
    Deflection,
    Foul,
    RerollUsed,
    PlayerUsed,
    Injury,
    SentOff,
    TurnEnd,
}

/// Append-only action log entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiveAction {
    pub side: TeamSide,
    pub kind: LiveActionKind,
    pub player: Option<PlayerId>,
    pub at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActiveMatchState {
    pub match_id: MatchId,
    pub home: LiveSide,
    pub away: LiveSide,
    pub turn: TeamSide,
    pub actions: Vec<LiveAction>,
}

impl ActiveMatchState {
    pub fn side(&self, side: TeamSide) -> &LiveSide {
        match side {
            TeamSide::Home => &self.home,
            TeamSide::Away => &self.away,
        }
    }

    pub fn side_mut(&mut self, side: TeamSide) -> &mut LiveSide {
        match side {
            TeamSide::Home => &mut self.home,
            TeamSide::Away => &mut self.away,
        }
    }

    /// Apply a live action to the counters and append it to the log.
    /// Actions referencing an unknown player still log but move no counter.
    pub fn record(&mut self, action: LiveAction) {
        let side = self.side_mut(action.side);
        match action.kind {
            LiveActionKind::Touchdown => {
                side.score += 1;
                if let Some(p) = action.player.as_ref().and_then(|id| side.player_mut(id)) {
                    p.touchdowns += 1;
                    p.used = true;
                }
            }
            LiveActionKind::Casualty => {
                if let Some(p) = action.player.as_ref().and_then(|id| side.player_mut(id)) {
                    p.casualties += 1;
                    p.used = true;
                }
            }
            LiveActionKind::Completion => {
                if let Some(p) = action.player.as_ref().and_then(|id| side.player_mut(id)) {
                    p.completions += 1;
                    p.used = true;
                }
            }
            LiveActionKind::Interception => {
                if let Some(p) = action.player.as_ref().and_then(|id| side.player_mut(id)) {
                    p.interceptions += 1;
                    p.used = true;
                }
            }
            LiveActionKind::Deflection => {
                if let Some(p) = action.player.as_ref().and_then(|id| side.player_mut(id)) {
                    p.deflections += 1;
                    p.used = true;
                }
            }
            LiveActionKind::Foul => {
                if let Some(p) = action.player.as_ref().and_then(|id| side.player_mut(id)) {
                    p.fouls += 1;
                    p.used = true;
                }
            }
            LiveActionKind::RerollUsed => {
                side.rerolls_left = side.rerolls_left.saturating_sub(1);
            }
            LiveActionKind::PlayerUsed => {
                if let Some(p) = action.player.as_ref().and_then(|id| side.player_mut(id)) {
                    p.used = true;
                }
            }
            LiveActionKind::Injury => {
                if let Some(p) = action.player.as_ref().and_then(|id| side.player_mut(id)) {
                    p.injured = true;
                    p.used = true;
                }
            }
            LiveActionKind::SentOff => {
                if let Some(p) = action.player.as_ref().and_then(|id| side.player_mut(id)) {
                    p.sent_off = true;
                }
            }
            LiveActionKind::TurnEnd => {
                self.turn = self.turn.opponent();
            }
        }
        self.actions.push(action);
    }
}
