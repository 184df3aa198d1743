//! Team records: roster, treasury with its audit log, staff and history.

use super::player::Player;
use super::primitives::{Gp, MatchId, PlayerId, TeamId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Append-only audit entry for every treasury movement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreasuryEvent {
    pub delta: Gp,
    pub balance_after: Gp,
    pub reason: String,
    pub at: DateTime<Utc>,
}

/// Headline record appended per completed match. Doubles as the commit
/// idempotency guard: a team that already carries an entry for a match id
/// has had that match's deltas applied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchHistoryEntry {
    pub match_id: MatchId,
    pub opponent: TeamId,
    pub score_for: u8,
    pub score_against: u8,
    pub winnings: Gp,
    pub at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Team {
    pub id: TeamId,
    pub name: String,
    /// Race key into the catalogue.
    pub race: String,
    /// Insertion order is roster order.
    pub roster: Vec<Player>,
    pub treasury: Gp,
    pub rerolls: u8,
    /// Dedicated fans rating, always within 1..=7.
    pub dedicated_fans: u8,
    pub assistant_coaches: u8,
    pub cheerleaders: u8,
    pub apothecary: bool,
    pub transactions: Vec<TreasuryEvent>,
    pub match_history: Vec<MatchHistoryEntry>,
}

impl Team {
    pub fn available_players(&self) -> impl Iterator<Item = &Player> {
        self.roster.iter().filter(|p| p.is_available())
    }

    pub fn available_count(&self) -> usize {
        self.available_players().count()
    }

    /// Journeymen required to field 11 players.
    pub fn journeymen_needed(&self) -> u8 {
        11u8.saturating_sub(self.available_count() as u8)
    }

    pub fn player(&self, id: &PlayerId) -> Option<&Player> {
        self.roster.iter().find(|p| &p.id == id)
    }

    pub fn player_mut(&mut self, id: &PlayerId) -> Option<&mut Player> {
        self.roster.iter_mut().find(|p| &p.id == id)
    }

    /// Credit the treasury, appending an audit entry.
    pub fn credit(&mut self, amount: Gp, reason: &str, at: DateTime<Utc>) {
        self.treasury += amount;
        self.transactions.push(TreasuryEvent {
            delta: amount,
            balance_after: self.treasury,
            reason: reason.to_string(),
            at,
        });
    }

    /// Debit the treasury, appending an audit entry.
    pub fn debit(&mut self, amount: Gp, reason: &str, at: DateTime<Utc>) {
        self.credit(-amount, reason, at);
    }

    /// Whether a treasury movement with this reason has already been logged.
    pub fn has_transaction(&self, reason: &str) -> bool {
        self.transactions.iter().any(|t| t.reason == reason)
    }

    /// Whether this match's post-game deltas have already been committed.
    pub fn has_played(&self, match_id: &MatchId) -> bool {
        self.match_history.iter().any(|m| &m.match_id == match_id)
    }

    /// Smallest roster number not yet taken, for new hires.
    pub fn next_free_number(&self) -> u8 {
        (1..=u8::MAX)
            .find(|n| !self.roster.iter().any(|p| p.number == *n))
            .unwrap_or(u8::MAX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::player::StatLine;

    fn make_player(id: &str, number: u8) -> Player {
        Player {
            id: PlayerId::new(id.to_string()),
            name: format!("Player {number}"),
            number,
            position: "lineman".to_string(),
            stats: StatLine {
                ma: 6,
                st: 3,
                ag: 3,
                pa: 4,
                av: 9,
            },
            spp: 0,
            skills: vec![],
            advancements: vec![],
            value: Gp::new(50_000),
            dead: false,
            miss_next_game: false,
            temp_retired: false,
            journeyman: false,
        }
    }

    fn make_team(roster_size: u8) -> Team {
        Team {
            id: TeamId::new("t1".to_string()),
            name: "Test Team".to_string(),
            race: "humans".to_string(),
            roster: (1..=roster_size)
                .map(|n| make_player(&format!("p{n}"), n))
                .collect(),
            treasury: Gp::new(100_000),
            rerolls: 2,
            dedicated_fans: 4,
            assistant_coaches: 0,
            cheerleaders: 0,
            apothecary: false,
            transactions: vec![],
            match_history: vec![],
        }
    }

    #[test]
    fn test_journeymen_needed() {
        let mut team = make_team(11);
        assert_eq!(team.journeymen_needed(), 0);
        team.roster[0].miss_next_game = true;
        team.roster[1].dead = true;
        assert_eq!(team.journeymen_needed(), 2);
        let full = make_team(16);
        assert_eq!(full.journeymen_needed(), 0);
    }

    #[test]
    fn test_treasury_audit_log() {
        let mut team = make_team(11);
        let at = Utc::now();
        team.debit(Gp::new(30_000), "kickoff m1", at);
        team.credit(Gp::new(70_000), "winnings m1", at);
        assert_eq!(team.treasury, Gp::new(140_000));
        assert_eq!(team.transactions.len(), 2);
        assert_eq!(team.transactions[0].balance_after, Gp::new(70_000));
        assert!(team.has_transaction("kickoff m1"));
        assert!(!team.has_transaction("kickoff m2"));
    }

    #[test]
    fn test_next_free_number_skips_taken() {
        let mut team = make_team(3);
        assert_eq!(team.next_free_number(), 4);
        team.roster.remove(1);
        assert_eq!(team.next_free_number(), 2);
    }
}
