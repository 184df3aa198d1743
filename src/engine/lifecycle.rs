//! Fixture state machine: kickoff debit, live snapshot, and the
//! cancellation escape hatch that must invert the debit exactly.

use super::inducements::{InducementSession, Purchase};
use crate::domain::live::{ActiveMatchState, LivePlayer, LiveSide};
use crate::domain::{Catalogue, Fixture, FixtureStatus, Player, PlayerId, Team, TeamSide};
use crate::error::EngineError;
use chrono::{DateTime, Utc};
use uuid::Uuid;

fn kickoff_reason(fixture: &Fixture) -> String {
    format!("kickoff inducements, match {}", fixture.id)
}

fn refund_reason(fixture: &Fixture) -> String {
    format!("cancellation refund, match {}", fixture.id)
}

/// Whether a kickoff debit for this match is outstanding (debited and not
/// refunded). Counting both directions keeps repeated
/// kickoff/cancel/kickoff cycles and mid-write retries idempotent.
fn debit_outstanding(team: &Team, kickoff: &str, refund: &str) -> bool {
    let debits = team.transactions.iter().filter(|t| t.reason == kickoff).count();
    let refunds = team.transactions.iter().filter(|t| t.reason == refund).count();
    debits > refunds
}

pub fn ensure_status(fixture: &Fixture, expected: FixtureStatus) -> Result<(), EngineError> {
    if fixture.status != expected {
        return Err(EngineError::InvalidTransition {
            id: fixture.id.clone(),
            actual: fixture.status.to_string(),
            expected: expected.to_string(),
        });
    }
    Ok(())
}

fn journeyman_player(team: &Team, catalogue: &Catalogue, number: u8) -> Result<Player, EngineError> {
    let template = catalogue.journeyman_template(&team.race)?;
    let mut skills = template.skills.clone();
    if !skills.iter().any(|s| s == "loner") {
        skills.push("loner".to_string());
    }
    Ok(Player {
        id: PlayerId::new(Uuid::new_v4().to_string()),
        name: format!("Journeyman #{number}"),
        number,
        position: template.key.clone(),
        stats: template.stats,
        spp: 0,
        skills,
        advancements: vec![],
        value: template.cost,
        dead: false,
        miss_next_game: false,
        temp_retired: false,
        journeyman: true,
    })
}

fn star_player(catalogue: &Catalogue, name: &str) -> Result<Player, EngineError> {
    let def = catalogue.star(name)?;
    Ok(Player {
        id: PlayerId::new(Uuid::new_v4().to_string()),
        name: def.name.clone(),
        number: 0,
        position: "star".to_string(),
        stats: def.stats,
        spp: 0,
        skills: def.skills.clone(),
        advancements: vec![],
        value: def.cost,
        dead: false,
        miss_next_game: false,
        temp_retired: false,
        journeyman: false,
    })
}

/// Frozen roster copy for one side: available players, the journeymen
/// required to reach 11, and any hired star players.
fn snapshot_side(
    team: &Team,
    session: &InducementSession,
    side: TeamSide,
    catalogue: &Catalogue,
) -> Result<LiveSide, EngineError> {
    let mut players: Vec<LivePlayer> = team
        .available_players()
        .cloned()
        .map(|p| LivePlayer::from_snapshot(p, false))
        .collect();

    let mut next_number = 12u8.max(team.next_free_number());
    for _ in 0..team.journeymen_needed() {
        players.push(LivePlayer::from_snapshot(
            journeyman_player(team, catalogue, next_number)?,
            false,
        ));
        next_number = next_number.saturating_add(1);
    }

    for purchase in &session.side(side).purchases {
        if let Purchase::Star { name } = purchase {
            players.push(LivePlayer::from_snapshot(star_player(catalogue, name)?, true));
        }
    }

    Ok(LiveSide {
        team: team.id.clone(),
        score: 0,
        rerolls_left: team.rerolls,
        players,
    })
}

/// `scheduled -> in_progress`: debit each treasury by its finalized
/// inducement spend (clamped to [0, treasury]), snapshot both rosters into
/// a fresh live document, and record the pregame snapshot the cancellation
/// path restores from.
pub fn kickoff(
    fixture: &mut Fixture,
    home: &mut Team,
    away: &mut Team,
    session: &InducementSession,
    catalogue: &Catalogue,
    first_turn: TeamSide,
    at: DateTime<Utc>,
) -> Result<ActiveMatchState, EngineError> {
    ensure_status(fixture, FixtureStatus::Scheduled)?;
    if session.match_id != fixture.id {
        return Err(EngineError::MalformedDocument {
            path: format!("prematch/{}", session.match_id),
            reason: format!("inducement session is for {}, not {}", session.match_id, fixture.id),
        });
    }

    let kickoff_r = kickoff_reason(fixture);
    let refund_r = refund_reason(fixture);
    let mut snapshot_sides = Vec::with_capacity(2);
    for (side, team) in [(TeamSide::Home, &mut *home), (TeamSide::Away, &mut *away)] {
        let spend = session
            .treasury_spend(catalogue, side)
            .min(team.treasury)
            .floor_zero();
        if !debit_outstanding(team, &kickoff_r, &refund_r) {
            team.debit(spend, &kickoff_r, at);
        }
        snapshot_sides.push(crate::domain::SidePregame {
            ctv: session.side(side).ctv,
            petty_cash: session.petty_cash(catalogue, side),
            treasury_spent: spend,
            restored: false,
        });
    }

    let live = ActiveMatchState {
        match_id: fixture.id.clone(),
        home: snapshot_side(home, session, TeamSide::Home, catalogue)?,
        away: snapshot_side(away, session, TeamSide::Away, catalogue)?,
        turn: first_turn,
        actions: vec![],
    };

    let away_snapshot = snapshot_sides.pop().expect("two sides snapshotted");
    let home_snapshot = snapshot_sides.pop().expect("two sides snapshotted");
    fixture.pregame = Some(crate::domain::PregameSnapshot {
        home: home_snapshot,
        away: away_snapshot,
        first_turn,
    });
    fixture.score_home = 0;
    fixture.score_away = 0;
    fixture.status = FixtureStatus::InProgress;
    Ok(live)
}

/// `in_progress -> scheduled`: credit back exactly what the pregame
/// snapshot says was debited, never a recomputed figure. Safe to re-run
/// after a partial restore; already-refunded sides are left alone.
pub fn cancel(
    fixture: &mut Fixture,
    home: &mut Team,
    away: &mut Team,
    at: DateTime<Utc>,
) -> Result<(), EngineError> {
    ensure_status(fixture, FixtureStatus::InProgress)?;
    let kickoff_r = kickoff_reason(fixture);
    let refund_r = refund_reason(fixture);
    let pregame = fixture.pregame.as_mut().ok_or(EngineError::MalformedDocument {
        path: format!("fixtures/{}", fixture.id),
        reason: "in-progress fixture has no pregame snapshot".to_string(),
    })?;

    for (side, team) in [(TeamSide::Home, &mut *home), (TeamSide::Away, &mut *away)] {
        let entry = pregame.side_mut(side);
        if debit_outstanding(team, &kickoff_r, &refund_r) {
            team.credit(entry.treasury_spent, &refund_r, at);
        }
        entry.restored = true;
    }

    fixture.status = FixtureStatus::Scheduled;
    fixture.score_home = 0;
    fixture.score_away = 0;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::player::StatLine;
    use crate::domain::{Gp, MatchId, TeamId};

    fn make_player(id: &str, number: u8) -> Player {
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
            value: Gp::new(50_000),
            dead: false,
            miss_next_game: false,
            temp_retired: false,
            journeyman: false,
        }
    }

    fn make_team(id: &str, treasury: i64, roster: u8) -> Team {
        Team {
            id: TeamId::new(id.to_string()),
            name: id.to_string(),
            race: "humans".to_string(),
            roster: (1..=roster).map(|n| make_player(&format!("{id}-p{n}"), n)).collect(),
            treasury: Gp::new(treasury),
            rerolls: 2,
            dedicated_fans: 3,
            assistant_coaches: 0,
            cheerleaders: 0,
            apothecary: false,
            transactions: vec![],
            match_history: vec![],
        }
    }

    fn make_fixture() -> Fixture {
        Fixture::new(
            MatchId::new("m1".to_string()),
            1,
            1,
            TeamId::new("home".to_string()),
            TeamId::new("away".to_string()),
        )
    }

    fn setup() -> (Fixture, Team, Team, InducementSession, Catalogue) {
        let cat = Catalogue::default();
        let home = make_team("home", 200_000, 11);
        let away = make_team("away", 100_000, 11);
        let fixture = make_fixture();
        let session =
            InducementSession::new(fixture.id.clone(), &home, &away, &cat).unwrap();
        (fixture, home, away, session, cat)
    }

    #[test]
    fn test_kickoff_debits_and_snapshots() {
        let (mut fixture, mut home, mut away, mut session, cat) = setup();
        session
            .add_purchase(
                &cat,
                TeamSide::Home,
                Purchase::Mercenary {
                    label: "extra muscle".to_string(),
                    cost: Gp::new(150_000),
                },
            )
            .unwrap();
        let live = kickoff(
            &mut fixture,
            &mut home,
            &mut away,
            &session,
            &cat,
            TeamSide::Away,
            Utc::now(),
        )
        .unwrap();

        assert_eq!(fixture.status, FixtureStatus::InProgress);
        assert_eq!(home.treasury, Gp::new(50_000));
        assert_eq!(away.treasury, Gp::new(100_000));
        let pregame = fixture.pregame.as_ref().unwrap();
        assert_eq!(pregame.home.treasury_spent, Gp::new(150_000));
        assert_eq!(pregame.away.treasury_spent, Gp::zero());
        assert_eq!(live.home.players.len(), 11);
        assert_eq!(live.turn, TeamSide::Away);
    }

    #[test]
    fn test_kickoff_requires_scheduled() {
        let (mut fixture, mut home, mut away, session, cat) = setup();
        fixture.status = FixtureStatus::InProgress;
        let err = kickoff(
            &mut fixture,
            &mut home,
            &mut away,
            &session,
            &cat,
            TeamSide::Home,
            Utc::now(),
        )
        .unwrap_err();
        assert!(matches!(err, EngineError::InvalidTransition { .. }));
    }

    #[test]
    fn test_journeymen_fill_to_eleven() {
        let (mut fixture, mut home, mut away, session, cat) = setup();
        home.roster.truncate(9);
        let session2 = InducementSession::new(fixture.id.clone(), &home, &away, &cat).unwrap();
        drop(session);
        let live = kickoff(
            &mut fixture,
            &mut home,
            &mut away,
            &session2,
            &cat,
            TeamSide::Home,
            Utc::now(),
        )
        .unwrap();
        assert_eq!(live.home.players.len(), 11);
        let journeymen: Vec<_> = live
            .home
            .players
            .iter()
            .filter(|p| p.player.journeyman)
            .collect();
        assert_eq!(journeymen.len(), 2);
        assert!(journeymen.iter().all(|p| p.player.has_skill("loner")));
    }

    #[test]
    fn test_cancel_round_trips_treasury() {
        for spend in [0i64, 1_000, 50_000, 200_000] {
            let (mut fixture, mut home, mut away, mut session, cat) = setup();
            session
                .add_purchase(
                    &cat,
                    TeamSide::Home,
                    Purchase::Mercenary {
                        label: "spend".to_string(),
                        cost: Gp::new(spend),
                    },
                )
                .unwrap();
            let before = home.treasury;
            kickoff(
                &mut fixture,
                &mut home,
                &mut away,
                &session,
                &cat,
                TeamSide::Home,
                Utc::now(),
            )
            .unwrap();
            cancel(&mut fixture, &mut home, &mut away, Utc::now()).unwrap();
            assert_eq!(home.treasury, before);
            assert_eq!(fixture.status, FixtureStatus::Scheduled);
        }
    }

    #[test]
    fn test_cancel_retry_does_not_double_credit() {
        let (mut fixture, mut home, mut away, mut session, cat) = setup();
        session
            .add_purchase(
                &cat,
                TeamSide::Home,
                Purchase::Mercenary {
                    label: "spend".to_string(),
                    cost: Gp::new(80_000),
                },
            )
            .unwrap();
        kickoff(
            &mut fixture,
            &mut home,
            &mut away,
            &session,
            &cat,
            TeamSide::Home,
            Utc::now(),
        )
        .unwrap();

        // First cancellation restored the money but the fixture write was
        // lost; the retry sees in_progress again with teams already
        // credited.
        let mut fixture_retry = fixture.clone();
        cancel(&mut fixture, &mut home, &mut away, Utc::now()).unwrap();
        let after_first = home.treasury;
        cancel(&mut fixture_retry, &mut home, &mut away, Utc::now()).unwrap();
        assert_eq!(home.treasury, after_first);
    }

    #[test]
    fn test_rekickoff_after_cancel_debits_again() {
        let (mut fixture, mut home, mut away, mut session, cat) = setup();
        session
            .add_purchase(
                &cat,
                TeamSide::Home,
                Purchase::Mercenary {
                    label: "spend".to_string(),
                    cost: Gp::new(60_000),
                },
            )
            .unwrap();
        kickoff(
            &mut fixture,
            &mut home,
            &mut away,
            &session,
            &cat,
            TeamSide::Home,
            Utc::now(),
        )
        .unwrap();
        cancel(&mut fixture, &mut home, &mut away, Utc::now()).unwrap();
        kickoff(
            &mut fixture,
            &mut home,
            &mut away,
            &session,
            &cat,
            TeamSide::Home,
            Utc::now(),
        )
        .unwrap();
        assert_eq!(home.treasury, Gp::new(140_000));
    }
}
