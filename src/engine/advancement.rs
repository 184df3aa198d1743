//! Advancement pricing: converts a player's accumulated purchase count into
//! the SPP cost of the next purchase, and materializes purchases onto the
//! stat line or skill list.
//!
//! Purchases are queued during post-game and applied exactly once at commit;
//! queue order determines price.

use crate::domain::catalogue::{PositionTemplate, Stat};
use crate::domain::{AdvancementCostTable, AdvancementKind, AdvancementRecord, Catalogue, Player, PlayerId};
use crate::error::EngineError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

const MA_MAX: u8 = 9;
const ST_MAX: u8 = 8;
const TARGET_MIN: u8 = 1;

/// What a characteristic-increase purchase resolved to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CharacteristicOutcome {
    StatIncrease(Stat),
    /// The roll landed outside the band allowing the desired stat; the
    /// purchase grants a secondary skill instead.
    SecondarySkillInstead,
}

/// Resolve an operator-entered characteristic roll against the desired stat.
pub fn resolve_characteristic(catalogue: &Catalogue, roll: u8, desired: Stat) -> CharacteristicOutcome {
    if catalogue.characteristic_band(roll).contains(&desired) {
        CharacteristicOutcome::StatIncrease(desired)
    } else {
        CharacteristicOutcome::SecondarySkillInstead
    }
}

/// One pending advancement purchase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdvancementRequest {
    pub player: PlayerId,
    pub kind: AdvancementKind,
    /// Skill to grant, for the three skill kinds.
    pub skill: Option<String>,
    /// Operator-entered characteristic roll.
    pub roll: Option<u8>,
    pub desired_stat: Option<Stat>,
    /// Skill granted when the characteristic roll misses the desired band.
    pub fallback_skill: Option<String>,
}

/// Pending purchases for one post-game session, in entry order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AdvancementQueue {
    pub entries: Vec<AdvancementRequest>,
}

impl AdvancementQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, request: AdvancementRequest) {
        self.entries.push(request);
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Price every entry. The Nth entry for a player is priced with that
    /// player's committed advancement count plus the earlier queue entries
    /// for the same player, so costs escalate within a single session.
    pub fn price(
        &self,
        table: &AdvancementCostTable,
        committed: impl Fn(&PlayerId) -> usize,
    ) -> Vec<u32> {
        let mut queued: HashMap<&PlayerId, usize> = HashMap::new();
        self.entries
            .iter()
            .map(|e| {
                let earlier = queued.entry(&e.player).or_insert(0);
                let cost = table.cost(e.kind, committed(&e.player) + *earlier);
                *earlier += 1;
                cost
            })
            .collect()
    }

    /// Total SPP spend per player at current queue order.
    pub fn spend_per_player(
        &self,
        table: &AdvancementCostTable,
        committed: impl Fn(&PlayerId) -> usize,
    ) -> HashMap<PlayerId, i64> {
        let costs = self.price(table, committed);
        let mut spend: HashMap<PlayerId, i64> = HashMap::new();
        for (entry, cost) in self.entries.iter().zip(costs) {
            *spend.entry(entry.player.clone()).or_insert(0) += cost as i64;
        }
        spend
    }
}

/// Whether a skill's category is permitted for this position at this
/// purchase kind.
pub fn skill_category_allowed(
    catalogue: &Catalogue,
    position: &PositionTemplate,
    kind: AdvancementKind,
    skill: &str,
) -> bool {
    let Ok(def) = catalogue.skill(skill) else {
        return false;
    };
    match kind {
        AdvancementKind::RandomPrimary | AdvancementKind::ChosenPrimary => {
            position.primary.contains(&def.category)
        }
        AdvancementKind::ChosenSecondary | AdvancementKind::CharacteristicIncrease => {
            position.secondary.contains(&def.category)
        }
    }
}

fn grant_skill(
    player: &mut Player,
    skill: &str,
    catalogue: &Catalogue,
) -> Result<(), EngineError> {
    let def = catalogue.skill(skill)?;
    if player.add_skill(skill) && def.elite {
        player.value += catalogue.elite_skill_surcharge;
    }
    Ok(())
}

fn bump_stat(player: &mut Player, stat: Stat) {
    let stats = &mut player.stats;
    match stat {
        Stat::Ma => stats.ma = (stats.ma + 1).min(MA_MAX),
        Stat::St => stats.st = (stats.st + 1).min(ST_MAX),
        // Roll targets improve downward.
        Stat::Ag => stats.ag = stats.ag.saturating_sub(1).max(TARGET_MIN),
        Stat::Pa => stats.pa = stats.pa.saturating_sub(1).max(TARGET_MIN),
        Stat::Av => stats.av = stats.av.saturating_sub(1).max(TARGET_MIN),
    }
}

/// Materialize a single purchase: mutate the stat line or skill set, spend
/// the SPP, and append the audit record. Callers apply each queued request
/// exactly once.
pub fn apply_advancement(
    player: &mut Player,
    request: &AdvancementRequest,
    cost: u32,
    catalogue: &Catalogue,
    at: DateTime<Utc>,
) -> Result<(), EngineError> {
    match request.kind {
        AdvancementKind::RandomPrimary
        | AdvancementKind::ChosenPrimary
        | AdvancementKind::ChosenSecondary => {
            let skill = request.skill.as_deref().ok_or_else(|| {
                EngineError::MissingAdvancementSelection {
                    player: request.player.clone(),
                    what: "skill",
                }
            })?;
            grant_skill(player, skill, catalogue)?;
        }
        AdvancementKind::CharacteristicIncrease => {
            let roll = request
                .roll
                .ok_or_else(|| EngineError::MissingAdvancementSelection {
                    player: request.player.clone(),
                    what: "characteristic roll",
                })?;
            let desired = request.desired_stat.ok_or_else(|| {
                EngineError::MissingAdvancementSelection {
                    player: request.player.clone(),
                    what: "desired stat",
                }
            })?;
            match resolve_characteristic(catalogue, roll, desired) {
                CharacteristicOutcome::StatIncrease(stat) => bump_stat(player, stat),
                CharacteristicOutcome::SecondarySkillInstead => {
                    let skill = request.fallback_skill.as_deref().ok_or_else(|| {
                        EngineError::MissingAdvancementSelection {
                            player: request.player.clone(),
                            what: "fallback skill",
                        }
                    })?;
                    grant_skill(player, skill, catalogue)?;
                }
            }
        }
    }
    player.spp -= cost as i64;
    player.advancements.push(AdvancementRecord {
        kind: request.kind,
        spp_cost: cost,
        at,
    });
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::player::StatLine;
    use crate::domain::Gp;

    fn make_player(spp: i64) -> Player {
        Player {
            id: PlayerId::new("p1".to_string()),
            name: "Advancer".to_string(),
            number: 4,
            position: "lineman".to_string(),
            stats: StatLine {
                ma: 6,
                st: 3,
                ag: 3,
                pa: 4,
                av: 9,
            },
            spp,
            skills: vec![],
            advancements: vec![],
            value: Gp::new(50_000),
            dead: false,
            miss_next_game: false,
            temp_retired: false,
            journeyman: false,
        }
    }

    fn skill_request(kind: AdvancementKind, skill: &str) -> AdvancementRequest {
        AdvancementRequest {
            player: PlayerId::new("p1".to_string()),
            kind,
            skill: Some(skill.to_string()),
            roll: None,
            desired_stat: None,
            fallback_skill: None,
        }
    }

    #[test]
    fn test_queue_prices_escalate_in_order() {
        let table = AdvancementCostTable::default();
        let mut queue = AdvancementQueue::new();
        queue.push(skill_request(AdvancementKind::ChosenPrimary, "block"));
        queue.push(skill_request(AdvancementKind::ChosenPrimary, "dodge"));
        queue.push(skill_request(AdvancementKind::ChosenSecondary, "mighty_blow"));
        // No committed advancements: positions 0, 1, 2 in the step tables.
        let costs = queue.price(&table, |_| 0);
        assert_eq!(costs, vec![6, 8, 18]);
        // One committed advancement shifts every column.
        let costs = queue.price(&table, |_| 1);
        assert_eq!(costs, vec![8, 12, 22]);
    }

    #[test]
    fn test_spend_per_player() {
        let table = AdvancementCostTable::default();
        let mut queue = AdvancementQueue::new();
        queue.push(skill_request(AdvancementKind::ChosenPrimary, "block"));
        queue.push(skill_request(AdvancementKind::ChosenPrimary, "dodge"));
        let spend = queue.spend_per_player(&table, |_| 0);
        assert_eq!(spend[&PlayerId::new("p1".to_string())], 14);
    }

    #[test]
    fn test_apply_skill_spends_and_records() {
        let cat = Catalogue::default();
        let mut player = make_player(10);
        let request = skill_request(AdvancementKind::ChosenPrimary, "block");
        apply_advancement(&mut player, &request, 6, &cat, Utc::now()).unwrap();
        assert!(player.has_skill("block"));
        assert_eq!(player.spp, 4);
        assert_eq!(player.advancement_count(), 1);
    }

    #[test]
    fn test_elite_skill_adds_value_surcharge() {
        let cat = Catalogue::default();
        let mut player = make_player(20);
        let request = skill_request(AdvancementKind::ChosenSecondary, "guard");
        apply_advancement(&mut player, &request, 12, &cat, Utc::now()).unwrap();
        assert_eq!(player.value, Gp::new(60_000));
    }

    #[test]
    fn test_characteristic_roll_in_band_bumps_stat() {
        let cat = Catalogue::default();
        let mut player = make_player(20);
        let request = AdvancementRequest {
            player: PlayerId::new("p1".to_string()),
            kind: AdvancementKind::CharacteristicIncrease,
            skill: None,
            roll: Some(3),
            desired_stat: Some(Stat::Ma),
            fallback_skill: None,
        };
        apply_advancement(&mut player, &request, 18, &cat, Utc::now()).unwrap();
        assert_eq!(player.stats.ma, 7);
        assert_eq!(player.spp, 2);
    }

    #[test]
    fn test_characteristic_roll_out_of_band_grants_fallback_skill() {
        let cat = Catalogue::default();
        let mut player = make_player(20);
        let request = AdvancementRequest {
            player: PlayerId::new("p1".to_string()),
            kind: AdvancementKind::CharacteristicIncrease,
            skill: None,
            roll: Some(3),
            desired_stat: Some(Stat::St),
            fallback_skill: Some("mighty_blow".to_string()),
        };
        apply_advancement(&mut player, &request, 18, &cat, Utc::now()).unwrap();
        assert_eq!(player.stats.st, 3);
        assert!(player.has_skill("mighty_blow"));
    }

    #[test]
    fn test_target_stats_improve_downward_with_floor() {
        let cat = Catalogue::default();
        let mut player = make_player(100);
        player.stats.ag = 1;
        let request = AdvancementRequest {
            player: PlayerId::new("p1".to_string()),
            kind: AdvancementKind::CharacteristicIncrease,
            skill: None,
            roll: Some(14),
            desired_stat: Some(Stat::Ag),
            fallback_skill: None,
        };
        apply_advancement(&mut player, &request, 18, &cat, Utc::now()).unwrap();
        assert_eq!(player.stats.ag, 1);
    }

    #[test]
    fn test_category_permissions() {
        let cat = Catalogue::default();
        let lineman = cat.position("humans", "lineman").unwrap();
        // general is primary for linemen, strength only secondary.
        assert!(skill_category_allowed(&cat, lineman, AdvancementKind::ChosenPrimary, "block"));
        assert!(!skill_category_allowed(&cat, lineman, AdvancementKind::ChosenPrimary, "mighty_blow"));
        assert!(skill_category_allowed(&cat, lineman, AdvancementKind::ChosenSecondary, "mighty_blow"));
    }

    #[test]
    fn test_missing_selection_is_hard_error() {
        let cat = Catalogue::default();
        let mut player = make_player(20);
        let mut request = skill_request(AdvancementKind::ChosenPrimary, "block");
        request.skill = None;
        let err = apply_advancement(&mut player, &request, 6, &cat, Utc::now()).unwrap_err();
        assert!(err.to_string().contains("skill"));
        assert_eq!(player.advancement_count(), 0);
    }
}
