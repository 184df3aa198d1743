//! Player records: stat lines, skills, SPP and advancement history.

use super::primitives::{Gp, PlayerId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A player's characteristics. MA and ST are plain magnitudes; AG, PA and
/// AV are roll targets where lower is better.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatLine {
    pub ma: u8,
    pub st: u8,
    pub ag: u8,
    pub pa: u8,
    pub av: u8,
}

/// The four advancement purchase kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdvancementKind {
    RandomPrimary,
    ChosenPrimary,
    ChosenSecondary,
    CharacteristicIncrease,
}

impl std::fmt::Display for AdvancementKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AdvancementKind::RandomPrimary => write!(f, "random primary skill"),
            AdvancementKind::ChosenPrimary => write!(f, "chosen primary skill"),
            AdvancementKind::ChosenSecondary => write!(f, "chosen secondary skill"),
            AdvancementKind::CharacteristicIncrease => write!(f, "characteristic increase"),
        }
    }
}

/// Audit record of one materialized advancement purchase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdvancementRecord {
    pub kind: AdvancementKind,
    pub spp_cost: u32,
    pub at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    /// Roster number, unique within a team, 1-16 by convention.
    pub number: u8,
    /// Position key into the race's catalogue entry.
    pub position: String,
    pub stats: StatLine,
    /// Accumulated skill points. May dip negative while a purchase queue is
    /// being priced; never committed negative.
    pub spp: i64,
    pub skills: Vec<String>,
    pub advancements: Vec<AdvancementRecord>,
    /// Recorded purchase cost plus any value surcharges; what team value
    /// sums over.
    pub value: Gp,
    pub dead: bool,
    pub miss_next_game: bool,
    pub temp_retired: bool,
    pub journeyman: bool,
}

impl Player {
    /// Whether this player can take the field next match.
    pub fn is_available(&self) -> bool {
        !self.dead && !self.miss_next_game && !self.temp_retired
    }

    /// Number of prior advancement purchases, independent of kind.
    pub fn advancement_count(&self) -> usize {
        self.advancements.len()
    }

    pub fn has_skill(&self, name: &str) -> bool {
        self.skills.iter().any(|s| s == name)
    }

    /// Add a skill, keeping the set free of duplicates. Returns false if the
    /// player already had it.
    pub fn add_skill(&mut self, name: &str) -> bool {
        if self.has_skill(name) {
            return false;
        }
        self.skills.push(name.to_string());
        true
    }

    pub fn remove_skill(&mut self, name: &str) {
        self.skills.retain(|s| s != name);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_player() -> Player {
        Player {
            id: PlayerId::new("p1".to_string()),
            name: "Grakk".to_string(),
            number: 3,
            position: "lineman".to_string(),
            stats: StatLine {
                ma: 6,
                st: 3,
                ag: 3,
                pa: 4,
                av: 9,
            },
            spp: 6,
            skills: vec!["block".to_string()],
            advancements: vec![],
            value: Gp::new(50_000),
            dead: false,
            miss_next_game: false,
            temp_retired: false,
            journeyman: false,
        }
    }

    #[test]
    fn test_availability_flags() {
        let mut p = make_player();
        assert!(p.is_available());
        p.miss_next_game = true;
        assert!(!p.is_available());
        p.miss_next_game = false;
        p.temp_retired = true;
        assert!(!p.is_available());
        p.temp_retired = false;
        p.dead = true;
        assert!(!p.is_available());
    }

    #[test]
    fn test_add_skill_rejects_duplicates() {
        let mut p = make_player();
        assert!(!p.add_skill("block"));
        assert!(p.add_skill("dodge"));
        assert_eq!(p.skills, vec!["block", "dodge"]);
    }

    #[test]
    fn test_advancement_kind_serialization() {
        let json = serde_json::to_string(&AdvancementKind::ChosenSecondary).unwrap();
        assert_eq!(json, "\"chosen_secondary\"");
    }
}
