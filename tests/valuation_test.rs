use pitchside::domain::player::StatLine;
use pitchside::engine::{current_team_value, inducement_ctv, team_value};
use pitchside::{Catalogue, Gp, Player, PlayerId, Team, TeamId};

fn player(id: &str, number: u8, value: i64) -> Player {
    Player {
        id: PlayerId::new(id.to_string()),
        name: id.to_string(),
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
        value: Gp::new(value),
        dead: false,
        miss_next_game: false,
        temp_retired: false,
        journeyman: false,
    }
}

fn team(roster: Vec<Player>, rerolls: u8) -> Team {
    Team {
        id: TeamId::new("t1".to_string()),
        name: "Valuers".to_string(),
        race: "humans".to_string(),
        roster,
        treasury: Gp::new(50_000),
        rerolls,
        dedicated_fans: 3,
        assistant_coaches: 1,
        cheerleaders: 1,
        apothecary: true,
        transactions: vec![],
        match_history: vec![],
    }
}

#[test]
fn ctv_never_exceeds_tv_across_availability_combinations() {
    let cat = Catalogue::default();
    // Try every combination of the three unavailability flags across a
    // small roster.
    for mask in 0u32..(1 << 6) {
        let mut roster: Vec<Player> = (0..6)
            .map(|n| player(&format!("p{n}"), n as u8 + 1, 50_000 + (n as i64) * 5_000))
            .collect();
        for (i, p) in roster.iter_mut().enumerate() {
            if mask & (1 << i) != 0 {
                match i % 3 {
                    0 => p.dead = true,
                    1 => p.miss_next_game = true,
                    _ => p.temp_retired = true,
                }
            }
        }
        let t = team(roster, 2);
        assert!(
            current_team_value(&t, &cat) <= team_value(&t, &cat),
            "mask {mask}: CTV exceeded TV"
        );
    }
}

#[test]
fn journeyman_phantom_is_bounded_by_needed_times_cost() {
    let cat = Catalogue::default();
    for available in 0..=11u8 {
        let roster = (0..available)
            .map(|n| player(&format!("p{n}"), n + 1, 50_000))
            .collect();
        let t = team(roster, 0);
        let jm_cost = Gp::new(50_000);
        let needed = 11u8.saturating_sub(available) as i64;
        let phantom = inducement_ctv(&t, &cat, jm_cost) - current_team_value(&t, &cat);
        assert_eq!(phantom, jm_cost * needed);
    }
}

#[test]
fn full_roster_has_no_phantom_cost() {
    let cat = Catalogue::default();
    let roster = (0..13).map(|n| player(&format!("p{n}"), n + 1, 60_000)).collect();
    let t = team(roster, 3);
    assert_eq!(
        inducement_ctv(&t, &cat, Gp::new(999_000)),
        current_team_value(&t, &cat)
    );
}

#[test]
fn unavailable_players_reduce_ctv_by_their_value() {
    let cat = Catalogue::default();
    let mut roster: Vec<Player> = (0..12).map(|n| player(&format!("p{n}"), n + 1, 50_000)).collect();
    roster[0].value = Gp::new(130_000);
    let mut t = team(roster, 0);
    let before = current_team_value(&t, &cat);
    t.roster[0].temp_retired = true;
    assert_eq!(current_team_value(&t, &cat), before - Gp::new(130_000));
    // The full value is unchanged.
    assert_eq!(team_value(&t, &cat), before);
}
