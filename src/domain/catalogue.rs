//! Immutable reference data: races, skills, inducements, star players and
//! the rule tables the engine prices against.
//!
//! Loading real catalogue files is an external concern; the defaults here
//! cover every table the engine consults so a league can run out of the box,
//! and every table is plain data so a league can override it.

use super::player::{AdvancementKind, StatLine};
use super::primitives::Gp;
use crate::error::EngineError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A named characteristic on a player's stat line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stat {
    Ma,
    St,
    Ag,
    Pa,
    Av,
}

impl std::fmt::Display for Stat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Stat::Ma => write!(f, "MA"),
            Stat::St => write!(f, "ST"),
            Stat::Ag => write!(f, "AG"),
            Stat::Pa => write!(f, "PA"),
            Stat::Av => write!(f, "AV"),
        }
    }
}

/// Skill catalogue entry. Elite skills add a flat value surcharge to the
/// player when granted, independent of their SPP cost.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkillDef {
    pub name: String,
    pub category: String,
    pub elite: bool,
}

/// A hireable position within a race's roster.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PositionTemplate {
    pub key: String,
    pub name: String,
    pub cost: Gp,
    pub stats: StatLine,
    pub skills: Vec<String>,
    /// Skill categories this position advances in at primary cost.
    pub primary: Vec<String>,
    /// Skill categories available only as secondary picks.
    pub secondary: Vec<String>,
    pub max_count: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Race {
    pub key: String,
    pub name: String,
    pub reroll_cost: Gp,
    /// Special-rule tags; also drive inducement overrides and star
    /// eligibility.
    pub tags: Vec<String>,
    pub positions: Vec<PositionTemplate>,
    /// Position hired as a temporary journeyman to fill the roster to 11.
    pub journeyman_position: String,
}

/// Cost/cap override applied when the hiring team carries a matching tag.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InducementOverride {
    pub tag: String,
    pub cost: Gp,
    pub max: Option<u8>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InducementDef {
    pub name: String,
    pub cost: Gp,
    pub max: Option<u8>,
    /// Tag a team must carry to hire this at all; hiring without it is a
    /// rule warning.
    pub requires_tag: Option<String>,
    pub overrides: Vec<InducementOverride>,
}

impl InducementDef {
    /// Unit cost for a team with the given special-rule tags.
    pub fn cost_for(&self, tags: &[String]) -> Gp {
        self.overrides
            .iter()
            .find(|o| tags.contains(&o.tag))
            .map(|o| o.cost)
            .unwrap_or(self.cost)
    }

    /// Per-match cap for a team with the given special-rule tags.
    pub fn max_for(&self, tags: &[String]) -> Option<u8> {
        self.overrides
            .iter()
            .find(|o| tags.contains(&o.tag))
            .map(|o| o.max.or(self.max))
            .unwrap_or(self.max)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StarPlayerDef {
    pub name: String,
    pub cost: Gp,
    pub stats: StatLine,
    pub skills: Vec<String>,
    /// League tags the hiring race must share; empty means anyone.
    pub plays_for: Vec<String>,
}

impl StarPlayerDef {
    pub fn eligible_for(&self, tags: &[String]) -> bool {
        self.plays_for.is_empty() || self.plays_for.iter().any(|t| tags.contains(t))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StaffCosts {
    pub assistant_coach: Gp,
    pub cheerleader: Gp,
    pub apothecary: Gp,
    /// Used when a team's race key is not in the catalogue.
    pub fallback_reroll: Gp,
}

impl Default for StaffCosts {
    fn default() -> Self {
        Self {
            assistant_coach: Gp::new(10_000),
            cheerleader: Gp::new(10_000),
            apothecary: Gp::new(50_000),
            fallback_reroll: Gp::new(50_000),
        }
    }
}

/// SPP awarded per live-play counter, plus the flat MVP bonus.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SppWeights {
    pub touchdown: u32,
    pub casualty: u32,
    pub interception: u32,
    pub completion: u32,
    pub deflection: u32,
    pub mvp: u32,
}

impl Default for SppWeights {
    fn default() -> Self {
        Self {
            touchdown: 3,
            casualty: 2,
            interception: 2,
            completion: 1,
            deflection: 1,
            mvp: 4,
        }
    }
}

/// SPP cost of the Nth advancement purchase, per kind. Non-decreasing in N;
/// purchases past the table's end stay at the final column.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdvancementCostTable {
    pub random_primary: Vec<u32>,
    pub chosen_primary: Vec<u32>,
    pub chosen_secondary: Vec<u32>,
    pub characteristic: Vec<u32>,
}

impl AdvancementCostTable {
    pub fn cost(&self, kind: AdvancementKind, prior_count: usize) -> u32 {
        let column = match kind {
            AdvancementKind::RandomPrimary => &self.random_primary,
            AdvancementKind::ChosenPrimary => &self.chosen_primary,
            AdvancementKind::ChosenSecondary => &self.chosen_secondary,
            AdvancementKind::CharacteristicIncrease => &self.characteristic,
        };
        let idx = prior_count.min(column.len() - 1);
        column[idx]
    }
}

impl Default for AdvancementCostTable {
    fn default() -> Self {
        Self {
            random_primary: vec![3, 4, 6, 8, 10, 15],
            chosen_primary: vec![6, 8, 12, 16, 20, 30],
            chosen_secondary: vec![12, 14, 18, 22, 26, 40],
            characteristic: vec![18, 20, 24, 28, 32, 50],
        }
    }
}

/// Band of characteristic-increase rolls and the stats they allow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CharacteristicBand {
    pub min_roll: u8,
    pub max_roll: u8,
    pub allowed: Vec<Stat>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MistakeOutcome {
    CrisisAverted,
    MinorIncident,
    MajorIncident,
    Catastrophe,
}

/// Expensive-mistakes lookup: treasury band x d6 roll. Only consulted when
/// the treasury entering the step is at least `threshold`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MistakesTable {
    pub threshold: Gp,
    /// Rows are treasury bands (<200k, then 100k-wide bands, then >=600k);
    /// columns are d6 rolls 1..=6.
    pub rows: [[MistakeOutcome; 6]; 6],
}

impl MistakesTable {
    pub fn applies_to(&self, treasury: Gp) -> bool {
        treasury >= self.threshold
    }

    fn band(treasury: Gp) -> usize {
        match treasury.as_i64() {
            t if t < 200_000 => 0,
            t if t < 300_000 => 1,
            t if t < 400_000 => 2,
            t if t < 500_000 => 3,
            t if t < 600_000 => 4,
            _ => 5,
        }
    }

    pub fn outcome(&self, treasury: Gp, roll: u8) -> MistakeOutcome {
        let row = &self.rows[Self::band(treasury)];
        row[(roll.clamp(1, 6) - 1) as usize]
    }
}

impl Default for MistakesTable {
    fn default() -> Self {
        use MistakeOutcome::{Catastrophe as CT, CrisisAverted as CA, MajorIncident as MJ, MinorIncident as MI};
        Self {
            threshold: Gp::new(100_000),
            rows: [
                [CA, CA, CA, CA, CA, CA],
                [CA, CA, CA, CA, CA, MI],
                [CA, CA, CA, CA, MI, MI],
                [CA, CA, CA, MI, MI, MI],
                [CA, CA, MI, MI, MI, MJ],
                [CA, MI, MI, MI, MJ, CT],
            ],
        }
    }
}

/// The full reference catalogue handed to the engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Catalogue {
    pub races: HashMap<String, Race>,
    pub skills: HashMap<String, SkillDef>,
    pub inducements: HashMap<String, InducementDef>,
    pub stars: HashMap<String, StarPlayerDef>,
    pub staff_costs: StaffCosts,
    pub spp_weights: SppWeights,
    pub advancement_costs: AdvancementCostTable,
    pub mistakes: MistakesTable,
    pub characteristic_bands: Vec<CharacteristicBand>,
    /// Value surcharge when an elite skill is granted.
    pub elite_skill_surcharge: Gp,
    /// Treasury the lower-CTV side may add on top of petty cash.
    pub petty_cash_top_up: Gp,
}

impl Catalogue {
    pub fn race(&self, key: &str) -> Result<&Race, EngineError> {
        self.races.get(key).ok_or(EngineError::UnknownCatalogueKey {
            kind: "race",
            key: key.to_string(),
        })
    }

    pub fn position(&self, race_key: &str, position_key: &str) -> Result<&PositionTemplate, EngineError> {
        self.race(race_key)?
            .positions
            .iter()
            .find(|p| p.key == position_key)
            .ok_or(EngineError::UnknownCatalogueKey {
                kind: "position",
                key: format!("{race_key}/{position_key}"),
            })
    }

    pub fn skill(&self, name: &str) -> Result<&SkillDef, EngineError> {
        self.skills.get(name).ok_or(EngineError::UnknownCatalogueKey {
            kind: "skill",
            key: name.to_string(),
        })
    }

    pub fn inducement(&self, name: &str) -> Result<&InducementDef, EngineError> {
        self.inducements
            .get(name)
            .ok_or(EngineError::UnknownCatalogueKey {
                kind: "inducement",
                key: name.to_string(),
            })
    }

    pub fn star(&self, name: &str) -> Result<&StarPlayerDef, EngineError> {
        self.stars.get(name).ok_or(EngineError::UnknownCatalogueKey {
            kind: "star player",
            key: name.to_string(),
        })
    }

    /// Reroll cost for a race, falling back when the race is unknown.
    pub fn reroll_cost(&self, race_key: &str) -> Gp {
        self.races
            .get(race_key)
            .map(|r| r.reroll_cost)
            .unwrap_or(self.staff_costs.fallback_reroll)
    }

    /// Journeyman template for a race.
    pub fn journeyman_template(&self, race_key: &str) -> Result<&PositionTemplate, EngineError> {
        let race = self.race(race_key)?;
        let key = race.journeyman_position.clone();
        self.position(race_key, &key)
    }

    /// Stats a characteristic-increase roll allows to be raised.
    pub fn characteristic_band(&self, roll: u8) -> &[Stat] {
        self.characteristic_bands
            .iter()
            .find(|b| roll >= b.min_roll && roll <= b.max_roll)
            .map(|b| b.allowed.as_slice())
            .unwrap_or(&[])
    }
}

fn stat_line(ma: u8, st: u8, ag: u8, pa: u8, av: u8) -> StatLine {
    StatLine { ma, st, ag, pa, av }
}

fn skill(name: &str, category: &str, elite: bool) -> (String, SkillDef) {
    (
        name.to_string(),
        SkillDef {
            name: name.to_string(),
            category: category.to_string(),
            elite,
        },
    )
}

impl Default for Catalogue {
    fn default() -> Self {
        let skills = HashMap::from([
            skill("block", "general", false),
            skill("dodge", "agility", false),
            skill("sure_hands", "general", false),
            skill("pass", "passing", false),
            skill("catch", "agility", false),
            skill("mighty_blow", "strength", false),
            skill("guard", "strength", true),
            skill("sprint", "agility", false),
            skill("dirty_player", "general", false),
            skill("loner", "trait", false),
            skill("bone_head", "trait", false),
            skill("sneaky_git", "agility", false),
        ]);

        let humans = Race {
            key: "humans".to_string(),
            name: "Humans".to_string(),
            reroll_cost: Gp::new(50_000),
            tags: vec!["old_world_classic".to_string()],
            positions: vec![
                PositionTemplate {
                    key: "lineman".to_string(),
                    name: "Human Lineman".to_string(),
                    cost: Gp::new(50_000),
                    stats: stat_line(6, 3, 3, 4, 9),
                    skills: vec![],
                    primary: vec!["general".to_string()],
                    secondary: vec!["agility".to_string(), "strength".to_string()],
                    max_count: 16,
                },
                PositionTemplate {
                    key: "thrower".to_string(),
                    name: "Thrower".to_string(),
                    cost: Gp::new(80_000),
                    stats: stat_line(6, 3, 3, 2, 9),
                    skills: vec!["pass".to_string(), "sure_hands".to_string()],
                    primary: vec!["general".to_string(), "passing".to_string()],
                    secondary: vec!["agility".to_string(), "strength".to_string()],
                    max_count: 2,
                },
                PositionTemplate {
                    key: "catcher".to_string(),
                    name: "Catcher".to_string(),
                    cost: Gp::new(65_000),
                    stats: stat_line(8, 2, 3, 5, 8),
                    skills: vec!["catch".to_string(), "dodge".to_string()],
                    primary: vec!["agility".to_string(), "general".to_string()],
                    secondary: vec!["passing".to_string(), "strength".to_string()],
                    max_count: 4,
                },
                PositionTemplate {
                    key: "blitzer".to_string(),
                    name: "Blitzer".to_string(),
                    cost: Gp::new(85_000),
                    stats: stat_line(7, 3, 3, 4, 9),
                    skills: vec!["block".to_string()],
                    primary: vec!["general".to_string(), "strength".to_string()],
                    secondary: vec!["agility".to_string(), "passing".to_string()],
                    max_count: 4,
                },
            ],
            journeyman_position: "lineman".to_string(),
        };

        let goblins = Race {
            key: "goblins".to_string(),
            name: "Goblins".to_string(),
            reroll_cost: Gp::new(60_000),
            tags: vec![
                "badlands_brawl".to_string(),
                "bribery_and_corruption".to_string(),
                "underworld_challenge".to_string(),
            ],
            positions: vec![PositionTemplate {
                key: "goblin".to_string(),
                name: "Goblin".to_string(),
                cost: Gp::new(40_000),
                stats: stat_line(6, 2, 3, 4, 8),
                skills: vec!["dodge".to_string(), "sneaky_git".to_string()],
                primary: vec!["agility".to_string()],
                secondary: vec!["general".to_string(), "strength".to_string()],
                max_count: 16,
            }],
            journeyman_position: "goblin".to_string(),
        };

        let inducements = HashMap::from([
            (
                "bribes".to_string(),
                InducementDef {
                    name: "bribes".to_string(),
                    cost: Gp::new(100_000),
                    max: Some(3),
                    requires_tag: None,
                    overrides: vec![InducementOverride {
                        tag: "bribery_and_corruption".to_string(),
                        cost: Gp::new(50_000),
                        max: Some(5),
                    }],
                },
            ),
            (
                "extra_team_training".to_string(),
                InducementDef {
                    name: "extra_team_training".to_string(),
                    cost: Gp::new(100_000),
                    max: Some(8),
                    requires_tag: None,
                    overrides: vec![],
                },
            ),
            (
                "wandering_apothecary".to_string(),
                InducementDef {
                    name: "wandering_apothecary".to_string(),
                    cost: Gp::new(100_000),
                    max: Some(2),
                    requires_tag: None,
                    overrides: vec![],
                },
            ),
            (
                "halfling_master_chef".to_string(),
                InducementDef {
                    name: "halfling_master_chef".to_string(),
                    cost: Gp::new(300_000),
                    max: Some(1),
                    requires_tag: None,
                    overrides: vec![InducementOverride {
                        tag: "halfling_thimble_cup".to_string(),
                        cost: Gp::new(100_000),
                        max: Some(1),
                    }],
                },
            ),
            (
                "waaagh_drummer".to_string(),
                InducementDef {
                    name: "waaagh_drummer".to_string(),
                    cost: Gp::new(50_000),
                    max: Some(1),
                    requires_tag: Some("badlands_brawl".to_string()),
                    overrides: vec![],
                },
            ),
        ]);

        let stars = HashMap::from([
            (
                "morg_n_thorg".to_string(),
                StarPlayerDef {
                    name: "morg_n_thorg".to_string(),
                    cost: Gp::new(380_000),
                    stats: stat_line(6, 6, 3, 4, 11),
                    skills: vec!["block".to_string(), "mighty_blow".to_string(), "loner".to_string()],
                    plays_for: vec![],
                },
            ),
            (
                "varag_ghoul_chewer".to_string(),
                StarPlayerDef {
                    name: "varag_ghoul_chewer".to_string(),
                    cost: Gp::new(280_000),
                    stats: stat_line(6, 4, 3, 5, 10),
                    skills: vec!["block".to_string(), "mighty_blow".to_string(), "loner".to_string()],
                    plays_for: vec!["badlands_brawl".to_string()],
                },
            ),
            (
                "griff_oberwald".to_string(),
                StarPlayerDef {
                    name: "griff_oberwald".to_string(),
                    cost: Gp::new(320_000),
                    stats: stat_line(7, 4, 2, 3, 9),
                    skills: vec!["block".to_string(), "dodge".to_string(), "sprint".to_string(), "loner".to_string()],
                    plays_for: vec!["old_world_classic".to_string()],
                },
            ),
        ]);

        let characteristic_bands = vec![
            CharacteristicBand {
                min_roll: 1,
                max_roll: 7,
                allowed: vec![Stat::Ma, Stat::Av],
            },
            CharacteristicBand {
                min_roll: 8,
                max_roll: 13,
                allowed: vec![Stat::Ma, Stat::Av, Stat::Pa],
            },
            CharacteristicBand {
                min_roll: 14,
                max_roll: 14,
                allowed: vec![Stat::Ma, Stat::Av, Stat::Pa, Stat::Ag],
            },
            CharacteristicBand {
                min_roll: 15,
                max_roll: 15,
                allowed: vec![Stat::Ma, Stat::Av, Stat::Pa, Stat::Ag, Stat::St],
            },
            CharacteristicBand {
                min_roll: 16,
                max_roll: 16,
                allowed: vec![Stat::Ma, Stat::St, Stat::Ag, Stat::Pa, Stat::Av],
            },
        ];

        Catalogue {
            races: HashMap::from([("humans".to_string(), humans), ("goblins".to_string(), goblins)]),
            skills,
            inducements,
            stars,
            staff_costs: StaffCosts::default(),
            spp_weights: SppWeights::default(),
            advancement_costs: AdvancementCostTable::default(),
            mistakes: MistakesTable::default(),
            characteristic_bands,
            elite_skill_surcharge: Gp::new(10_000),
            petty_cash_top_up: Gp::new(50_000),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_advancement_costs_non_decreasing() {
        let table = AdvancementCostTable::default();
        for kind in [
            AdvancementKind::RandomPrimary,
            AdvancementKind::ChosenPrimary,
            AdvancementKind::ChosenSecondary,
            AdvancementKind::CharacteristicIncrease,
        ] {
            for n in 1..10 {
                assert!(table.cost(kind, n) >= table.cost(kind, n - 1));
            }
        }
    }

    #[test]
    fn test_advancement_cost_past_table_end() {
        let table = AdvancementCostTable::default();
        assert_eq!(table.cost(AdvancementKind::RandomPrimary, 5), 15);
        assert_eq!(table.cost(AdvancementKind::RandomPrimary, 12), 15);
    }

    #[test]
    fn test_bribes_override_for_bribery_race() {
        let cat = Catalogue::default();
        let bribes = cat.inducement("bribes").unwrap();
        let tags = vec!["bribery_and_corruption".to_string()];
        assert_eq!(bribes.cost_for(&tags), Gp::new(50_000));
        assert_eq!(bribes.max_for(&tags), Some(5));
        assert_eq!(bribes.cost_for(&[]), Gp::new(100_000));
        assert_eq!(bribes.max_for(&[]), Some(3));
    }

    #[test]
    fn test_star_eligibility() {
        let cat = Catalogue::default();
        let varag = cat.star("varag_ghoul_chewer").unwrap();
        assert!(varag.eligible_for(&["badlands_brawl".to_string()]));
        assert!(!varag.eligible_for(&["old_world_classic".to_string()]));
        let morg = cat.star("morg_n_thorg").unwrap();
        assert!(morg.eligible_for(&[]));
    }

    #[test]
    fn test_mistakes_pinned_cell() {
        let table = MistakesTable::default();
        assert_eq!(
            table.outcome(Gp::new(450_000), 6),
            MistakeOutcome::MinorIncident
        );
    }

    #[test]
    fn test_mistakes_banding_edges() {
        let table = MistakesTable::default();
        assert_eq!(table.outcome(Gp::new(150_000), 6), MistakeOutcome::CrisisAverted);
        assert_eq!(table.outcome(Gp::new(600_000), 6), MistakeOutcome::Catastrophe);
        assert_eq!(table.outcome(Gp::new(599_999), 6), MistakeOutcome::MajorIncident);
        assert!(table.applies_to(Gp::new(100_000)));
        assert!(!table.applies_to(Gp::new(99_999)));
    }

    #[test]
    fn test_reroll_cost_fallback_for_unknown_race() {
        let cat = Catalogue::default();
        assert_eq!(cat.reroll_cost("humans"), Gp::new(50_000));
        assert_eq!(cat.reroll_cost("unknown_race"), Gp::new(50_000));
        assert_eq!(cat.reroll_cost("goblins"), Gp::new(60_000));
    }

    #[test]
    fn test_characteristic_band_lookup() {
        let cat = Catalogue::default();
        assert_eq!(cat.characteristic_band(3), &[Stat::Ma, Stat::Av]);
        assert!(cat.characteristic_band(15).contains(&Stat::St));
        assert!(!cat.characteristic_band(13).contains(&Stat::Ag));
    }
}
