//! Team Value and Current Team Value.

use crate::domain::{Catalogue, Gp, Team};

fn staff_value(team: &Team, catalogue: &Catalogue) -> Gp {
    let costs = &catalogue.staff_costs;
    let apo = if team.apothecary {
        costs.apothecary
    } else {
        Gp::zero()
    };
    costs.assistant_coach * team.assistant_coaches as i64
        + costs.cheerleader * team.cheerleaders as i64
        + apo
}

/// Full team value: every roster player's recorded value plus rerolls and
/// staff.
pub fn team_value(team: &Team, catalogue: &Catalogue) -> Gp {
    let players: Gp = team.roster.iter().map(|p| p.value).sum();
    players + catalogue.reroll_cost(&team.race) * team.rerolls as i64 + staff_value(team, catalogue)
}

/// Match-day value: as `team_value` but only over players fit to take the
/// field.
pub fn current_team_value(team: &Team, catalogue: &Catalogue) -> Gp {
    let players: Gp = team.available_players().map(|p| p.value).sum();
    players + catalogue.reroll_cost(&team.race) * team.rerolls as i64 + staff_value(team, catalogue)
}

/// CTV as used for inducement negotiation: phantom cost for the journeymen
/// the team will have to field is added on top.
pub fn inducement_ctv(team: &Team, catalogue: &Catalogue, journeyman_cost: Gp) -> Gp {
    current_team_value(team, catalogue) + journeyman_cost * team.journeymen_needed() as i64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::player::StatLine;
    use crate::domain::{Player, PlayerId, TeamId};

    fn make_player(id: &str, value: i64) -> Player {
        Player {
            id: PlayerId::new(id.to_string()),
            name: id.to_string(),
            number: 1,
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
            value: Gp::new(value),
            dead: false,
            miss_next_game: false,
            temp_retired: false,
            journeyman: false,
        }
    }

    fn make_team() -> Team {
        Team {
            id: TeamId::new("t1".to_string()),
            name: "Valuers".to_string(),
            race: "humans".to_string(),
            roster: (0..11)
                .map(|n| make_player(&format!("p{n}"), 50_000))
                .collect(),
            treasury: Gp::new(0),
            rerolls: 2,
            dedicated_fans: 1,
            assistant_coaches: 1,
            cheerleaders: 2,
            apothecary: true,
            transactions: vec![],
            match_history: vec![],
        }
    }

    #[test]
    fn test_team_value_sums_players_rerolls_staff() {
        let cat = Catalogue::default();
        let team = make_team();
        // 11 * 50k players, 2 * 50k rerolls, 10k coach + 20k cheer + 50k apo.
        assert_eq!(team_value(&team, &cat), Gp::new(730_000));
    }

    #[test]
    fn test_ctv_excludes_unavailable_players() {
        let cat = Catalogue::default();
        let mut team = make_team();
        team.roster[0].miss_next_game = true;
        team.roster[1].dead = true;
        assert_eq!(current_team_value(&team, &cat), Gp::new(630_000));
        assert!(current_team_value(&team, &cat) <= team_value(&team, &cat));
    }

    #[test]
    fn test_unknown_race_uses_fallback_reroll_cost() {
        let cat = Catalogue::default();
        let mut team = make_team();
        team.race = "mystery".to_string();
        assert_eq!(team_value(&team, &cat), Gp::new(730_000));
    }

    #[test]
    fn test_inducement_ctv_adds_phantom_journeymen() {
        let cat = Catalogue::default();
        let mut team = make_team();
        team.roster[0].miss_next_game = true;
        team.roster[1].miss_next_game = true;
        let jm_cost = Gp::new(50_000);
        let base = current_team_value(&team, &cat);
        assert_eq!(inducement_ctv(&team, &cat, jm_cost), base + Gp::new(100_000));
    }
}
