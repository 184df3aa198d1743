//! Post-game reconciliation: a six-step sequence over one working document.
//! Every step is re-enterable and nothing touches team records until
//! `commit`, which is idempotent per team via the match-history guard.

use super::advancement::{self, AdvancementQueue};
use super::{RuleWarning, ValidationReport};
use crate::domain::catalogue::Stat;
use crate::domain::live::ActiveMatchState;
use crate::domain::{
    Catalogue, Fixture, FixtureStatus, Gp, MatchHistoryEntry, MatchId, MistakeOutcome, PlayerId,
    Team, TeamId, TeamSide,
};
use crate::error::EngineError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

const FANS_MIN: u8 = 1;
const FANS_MAX: u8 = 7;
const WINNINGS_UNIT: i64 = 10_000;
const TARGET_STAT_WORST: u8 = 12;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchOutcome {
    Win,
    Draw,
    Loss,
}

/// Resolution chosen for a player flagged injured during play.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum InjuryOutcome {
    Recovered,
    MissNextGame,
    StatPenalty { stat: Stat },
    Dead,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InjuryResolution {
    pub player: PlayerId,
    pub outcome: InjuryOutcome,
    /// Lasting penalties may additionally shelve the player.
    pub temp_retired: bool,
}

/// Conversion of a used journeyman into a permanent roster entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JourneymanHire {
    pub player: PlayerId,
    pub name: String,
    pub number: u8,
}

/// Staff adjustments between games. Purchases are debited; removals are
/// never refunded, and mid-season rerolls cost double.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct StaffChanges {
    pub assistant_coaches: i8,
    pub cheerleaders: i8,
    pub rerolls: i8,
    pub apothecary: Option<bool>,
}

/// Per-player match statistics carried into the sheet from live play.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerTally {
    pub player: PlayerId,
    pub name: String,
    pub journeyman: bool,
    pub star: bool,
    pub touchdowns: u8,
    pub casualties: u8,
    pub completions: u8,
    pub interceptions: u8,
    pub deflections: u8,
    pub injured: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SideSheet {
    pub side: TeamSide,
    pub team: TeamId,
    pub score: u8,
    pub opponent_score: u8,
    pub own_fans: u8,
    pub opponent_fans: u8,
    pub casualties_inflicted: u8,
    pub players: Vec<PlayerTally>,
    pub no_stalling_bonus: bool,
    pub winnings_override: Option<Gp>,
    /// Operator-entered d6 for dedicated-fans drift.
    pub fans_roll: Option<u8>,
    pub fans_override: Option<i8>,
    /// Up to six non-star nominees; the MVP d6 indexes into this list.
    pub mvp_nominees: Vec<PlayerId>,
    pub mvp_roll: Option<u8>,
    pub advancements: AdvancementQueue,
    pub injuries: Vec<InjuryResolution>,
    pub journeyman_hires: Vec<JourneymanHire>,
    pub staff_changes: StaffChanges,
    /// Manual correction line, applied as-is.
    pub treasury_adjustment: Gp,
    pub mistakes_roll: Option<u8>,
    pub mistakes_d3: Option<u8>,
    pub mistakes_2d6_total: Option<u8>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostGameSheet {
    pub match_id: MatchId,
    pub season: u32,
    pub round: u32,
    pub home: SideSheet,
    pub away: SideSheet,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SppAward {
    pub player: PlayerId,
    pub name: String,
    pub gain: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SideReport {
    pub team: TeamId,
    pub score: u8,
    pub winnings: Gp,
    pub fans_delta: i8,
    pub casualties_inflicted: u8,
    pub mistake: Option<MistakeOutcome>,
    pub spp_awarded: Vec<SppAward>,
}

/// Immutable record written once per completed match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchReport {
    pub match_id: MatchId,
    pub season: u32,
    pub round: u32,
    pub home: SideReport,
    pub away: SideReport,
    pub completed_at: DateTime<Utc>,
}

fn build_side(
    side: TeamSide,
    live: &ActiveMatchState,
    team: &Team,
    opponent: &Team,
) -> SideSheet {
    let live_side = live.side(side);
    let players = live_side
        .players
        .iter()
        .map(|p| PlayerTally {
            player: p.player.id.clone(),
            name: p.player.name.clone(),
            journeyman: p.player.journeyman,
            star: p.star,
            touchdowns: p.touchdowns,
            casualties: p.casualties,
            completions: p.completions,
            interceptions: p.interceptions,
            deflections: p.deflections,
            injured: p.injured,
        })
        .collect::<Vec<_>>();
    SideSheet {
        side,
        team: live_side.team.clone(),
        score: live_side.score,
        opponent_score: live.side(side.opponent()).score,
        own_fans: team.dedicated_fans,
        opponent_fans: opponent.dedicated_fans,
        casualties_inflicted: players.iter().map(|p| p.casualties).sum(),
        players,
        no_stalling_bonus: false,
        winnings_override: None,
        fans_roll: None,
        fans_override: None,
        mvp_nominees: Vec::new(),
        mvp_roll: None,
        advancements: AdvancementQueue::new(),
        injuries: Vec::new(),
        journeyman_hires: Vec::new(),
        staff_changes: StaffChanges::default(),
        treasury_adjustment: Gp::zero(),
        mistakes_roll: None,
        mistakes_d3: None,
        mistakes_2d6_total: None,
    }
}

impl SideSheet {
    pub fn outcome(&self) -> MatchOutcome {
        if self.score > self.opponent_score {
            MatchOutcome::Win
        } else if self.score < self.opponent_score {
            MatchOutcome::Loss
        } else {
            MatchOutcome::Draw
        }
    }

    /// Step 1. Winnings: half the combined fan attendance plus touchdowns
    /// plus the no-stalling bonus, in 10,000 Gp units. An explicit override
    /// supersedes.
    pub fn winnings(&self) -> Gp {
        if let Some(override_value) = self.winnings_override {
            return override_value;
        }
        let attendance = (self.own_fans + self.opponent_fans) as i64;
        let units = attendance / 2
            + self.score as i64
            + if self.no_stalling_bonus { 1 } else { 0 };
        Gp::new(units * WINNINGS_UNIT)
    }

    /// Step 2. Dedicated-fans drift before clamping. None means a required
    /// roll has not been entered yet.
    pub fn fans_delta(&self) -> Option<i8> {
        if let Some(delta) = self.fans_override {
            return Some(delta.clamp(-1, 1));
        }
        match self.outcome() {
            MatchOutcome::Draw => Some(0),
            MatchOutcome::Win => self
                .fans_roll
                .map(|roll| if roll >= self.own_fans { 1 } else { 0 }),
            MatchOutcome::Loss => self
                .fans_roll
                .map(|roll| if roll < self.own_fans { -1 } else { 0 }),
        }
    }

    /// Step 3. MVP selected by the operator d6 over the nominee list; an
    /// out-of-range roll selects no one.
    pub fn mvp(&self) -> Option<&PlayerId> {
        let roll = self.mvp_roll? as usize;
        if roll >= 1 && roll <= self.mvp_nominees.len() {
            self.mvp_nominees.get(roll - 1)
        } else {
            None
        }
    }

    fn tally(&self, player: &PlayerId) -> Option<&PlayerTally> {
        self.players.iter().find(|p| &p.player == player)
    }

    /// SPP earned this match by one player: weighted counters plus the MVP
    /// bonus. Stars earn nothing.
    pub fn spp_gain(&self, player: &PlayerId, catalogue: &Catalogue) -> i64 {
        let Some(tally) = self.tally(player) else {
            return 0;
        };
        if tally.star {
            return 0;
        }
        let w = &catalogue.spp_weights;
        let mut gain = tally.touchdowns as i64 * w.touchdown as i64
            + tally.casualties as i64 * w.casualty as i64
            + tally.interceptions as i64 * w.interception as i64
            + tally.completions as i64 * w.completion as i64
            + tally.deflections as i64 * w.deflection as i64;
        if self.mvp() == Some(player) {
            gain += w.mvp as i64;
        }
        gain
    }

    fn staff_purchase_cost(&self, team: &Team, catalogue: &Catalogue) -> Gp {
        let costs = &catalogue.staff_costs;
        let mut total = Gp::zero();
        if self.staff_changes.assistant_coaches > 0 {
            total += costs.assistant_coach * self.staff_changes.assistant_coaches as i64;
        }
        if self.staff_changes.cheerleaders > 0 {
            total += costs.cheerleader * self.staff_changes.cheerleaders as i64;
        }
        if self.staff_changes.apothecary == Some(true) && !team.apothecary {
            total += costs.apothecary;
        }
        if self.staff_changes.rerolls > 0 {
            // Mid-season rerolls cost double the catalogue rate.
            total += catalogue.reroll_cost(&team.race) * 2 * self.staff_changes.rerolls as i64;
        }
        total
    }

    fn journeyman_hire_cost(&self, live: &ActiveMatchState) -> Gp {
        let live_side = live.side(self.side);
        self.journeyman_hires
            .iter()
            .filter_map(|h| live_side.player(&h.player))
            .map(|p| p.player.value)
            .sum()
    }

    /// Treasury this side would hold entering the expensive-mistakes step:
    /// steps 1-4 applied, nothing committed.
    pub fn projected_treasury(
        &self,
        team: &Team,
        live: &ActiveMatchState,
        catalogue: &Catalogue,
    ) -> Gp {
        team.treasury + self.winnings() + self.treasury_adjustment
            - self.staff_purchase_cost(team, catalogue)
            - self.journeyman_hire_cost(live)
    }

    /// Step 5 outcome for this side, if the step applies and the d6 has been
    /// entered.
    pub fn mistakes_outcome(
        &self,
        team: &Team,
        live: &ActiveMatchState,
        catalogue: &Catalogue,
    ) -> Option<MistakeOutcome> {
        let projected = self.projected_treasury(team, live, catalogue);
        if !catalogue.mistakes.applies_to(projected) {
            return None;
        }
        self.mistakes_roll
            .map(|roll| catalogue.mistakes.outcome(projected, roll))
    }
}

impl PostGameSheet {
    /// Start a reconciliation working document from the live state and both
    /// team records.
    pub fn build(
        fixture: &Fixture,
        live: &ActiveMatchState,
        home_team: &Team,
        away_team: &Team,
    ) -> Result<Self, EngineError> {
        if live.match_id != fixture.id {
            return Err(EngineError::MalformedDocument {
                path: format!("live/{}", live.match_id),
                reason: format!("live state is for {}, not {}", live.match_id, fixture.id),
            });
        }
        Ok(PostGameSheet {
            match_id: fixture.id.clone(),
            season: fixture.season,
            round: fixture.round,
            home: build_side(TeamSide::Home, live, home_team, away_team),
            away: build_side(TeamSide::Away, live, away_team, home_team),
        })
    }

    pub fn side(&self, side: TeamSide) -> &SideSheet {
        match side {
            TeamSide::Home => &self.home,
            TeamSide::Away => &self.away,
        }
    }

    pub fn side_mut(&mut self, side: TeamSide) -> &mut SideSheet {
        match side {
            TeamSide::Home => &mut self.home,
            TeamSide::Away => &mut self.away,
        }
    }

    fn validate_side(
        &self,
        side: TeamSide,
        team: &Team,
        live: &ActiveMatchState,
        catalogue: &Catalogue,
        report: &mut ValidationReport,
    ) {
        let sheet = self.side(side);

        if sheet.fans_delta().is_none() {
            report.push(RuleWarning::MissingDiceEntry {
                what: format!("dedicated fans roll ({side})"),
            });
        }

        // Advancement queue: selections, categories, duplicates, ledger.
        let committed =
            |player: &PlayerId| team.player(player).map(|p| p.advancement_count()).unwrap_or(0);
        let costs = sheet
            .advancements
            .price(&catalogue.advancement_costs, committed);
        for (entry, _cost) in sheet.advancements.entries.iter().zip(&costs) {
            let roster_player = team.player(&entry.player).or_else(|| {
                live.side(side)
                    .player(&entry.player)
                    .map(|lp| &lp.player)
            });
            if entry.kind == crate::domain::AdvancementKind::CharacteristicIncrease
                && entry.roll.is_none()
            {
                report.push(RuleWarning::MissingDiceEntry {
                    what: format!("characteristic roll for {}", entry.player),
                });
            }
            if let (Some(skill), Some(player)) = (entry.skill.as_deref(), roster_player) {
                if player.has_skill(skill) {
                    report.push(RuleWarning::DuplicateSkill {
                        player: entry.player.clone(),
                        skill: skill.to_string(),
                    });
                }
                if let Ok(position) = catalogue.position(&team.race, &player.position) {
                    if !advancement::skill_category_allowed(catalogue, position, entry.kind, skill)
                    {
                        report.push(RuleWarning::SkillCategoryNotAllowed {
                            player: entry.player.clone(),
                            skill: skill.to_string(),
                        });
                    }
                }
            }
        }

        // SPP ledger: baseline + gain - spend must stay non-negative.
        let spend = sheet
            .advancements
            .spend_per_player(&catalogue.advancement_costs, committed);
        for (player_id, spent) in spend {
            let baseline = team
                .player(&player_id)
                .map(|p| p.spp)
                .or_else(|| live.side(side).player(&player_id).map(|p| p.player.spp))
                .unwrap_or(0);
            let remaining = baseline + sheet.spp_gain(&player_id, catalogue) - spent;
            if remaining < 0 {
                report.push(RuleWarning::SppOverspend {
                    player: player_id,
                    deficit: -remaining,
                });
            }
        }

        // Expensive mistakes dice.
        let projected = sheet.projected_treasury(team, live, catalogue);
        if catalogue.mistakes.applies_to(projected) {
            match sheet.mistakes_outcome(team, live, catalogue) {
                None => report.push(RuleWarning::MissingDiceEntry {
                    what: format!("expensive mistakes roll ({side})"),
                }),
                Some(MistakeOutcome::MinorIncident) if sheet.mistakes_d3.is_none() => {
                    report.push(RuleWarning::MissingDiceEntry {
                        what: format!("expensive mistakes d3 ({side})"),
                    })
                }
                Some(MistakeOutcome::Catastrophe) if sheet.mistakes_2d6_total.is_none() => {
                    report.push(RuleWarning::MissingDiceEntry {
                        what: format!("expensive mistakes 2d6 ({side})"),
                    })
                }
                _ => {}
            }
        }

        if projected.is_negative() {
            report.push(RuleWarning::ProjectedNegativeTreasury {
                team: sheet.team.clone(),
                projected,
            });
        }
    }

    /// Pre-commit validation pass. Warnings are surfaced for explicit
    /// acknowledgment; they never block on their own.
    pub fn validate(
        &self,
        live: &ActiveMatchState,
        home_team: &Team,
        away_team: &Team,
        catalogue: &Catalogue,
    ) -> ValidationReport {
        let mut report = ValidationReport::new();
        self.validate_side(TeamSide::Home, home_team, live, catalogue, &mut report);
        self.validate_side(TeamSide::Away, away_team, live, catalogue, &mut report);
        report
    }

    fn commit_side(
        &self,
        side: TeamSide,
        team: &mut Team,
        live: &ActiveMatchState,
        catalogue: &Catalogue,
        at: DateTime<Utc>,
    ) -> Result<SideReport, EngineError> {
        let sheet = self.side(side);
        let match_id = &self.match_id;

        // Already committed for this team: report from history, change
        // nothing. This is what makes a partial-commit retry safe.
        if team.has_played(match_id) {
            return Ok(SideReport {
                team: team.id.clone(),
                score: sheet.score,
                winnings: team
                    .match_history
                    .iter()
                    .find(|m| &m.match_id == match_id)
                    .map(|m| m.winnings)
                    .unwrap_or_else(Gp::zero),
                fans_delta: 0,
                casualties_inflicted: sheet.casualties_inflicted,
                mistake: None,
                spp_awarded: Vec::new(),
            });
        }

        // Step 1: winnings.
        let winnings = sheet.winnings();
        team.credit(winnings, &format!("winnings, match {match_id}"), at);

        // Manual correction line.
        if !sheet.treasury_adjustment.is_zero() {
            team.credit(
                sheet.treasury_adjustment,
                &format!("manual adjustment, match {match_id}"),
                at,
            );
        }

        // Step 2: dedicated-fans drift, clamped to the legal range.
        let fans_delta = sheet.fans_delta().unwrap_or(0);
        team.dedicated_fans =
            (team.dedicated_fans as i16 + fans_delta as i16).clamp(FANS_MIN as i16, FANS_MAX as i16)
                as u8;

        // Step 4 (roster half): journeymen hired onto the permanent roster.
        for hire in &sheet.journeyman_hires {
            let Some(live_player) = live.side(side).player(&hire.player) else {
                return Err(EngineError::UnknownPlayer {
                    team: team.id.clone(),
                    player: hire.player.to_string(),
                });
            };
            let mut player = live_player.player.clone();
            player.name = hire.name.clone();
            player.number = hire.number;
            player.journeyman = false;
            player.remove_skill("loner");
            team.debit(
                player.value,
                &format!("hired {}, match {match_id}", player.name),
                at,
            );
            team.roster.push(player);
        }

        // Step 3: SPP gains for every non-star participant now on the
        // roster, then queued purchases priced in entry order.
        let mut spp_awarded = Vec::new();
        for tally in &sheet.players {
            if tally.star {
                continue;
            }
            let gain = sheet.spp_gain(&tally.player, catalogue);
            if let Some(player) = team.player_mut(&tally.player) {
                player.spp += gain;
                if gain > 0 {
                    spp_awarded.push(SppAward {
                        player: tally.player.clone(),
                        name: tally.name.clone(),
                        gain,
                    });
                }
            }
        }
        let committed_before: Vec<(PlayerId, usize)> = team
            .roster
            .iter()
            .map(|p| (p.id.clone(), p.advancement_count()))
            .collect();
        let costs = sheet.advancements.price(&catalogue.advancement_costs, |id| {
            committed_before
                .iter()
                .find(|(pid, _)| pid == id)
                .map(|(_, n)| *n)
                .unwrap_or(0)
        });
        for (entry, cost) in sheet.advancements.entries.iter().zip(costs) {
            let Some(player) = team.player_mut(&entry.player) else {
                return Err(EngineError::UnknownPlayer {
                    team: team.id.clone(),
                    player: entry.player.to_string(),
                });
            };
            advancement::apply_advancement(player, entry, cost, catalogue, at)?;
        }

        // Step 4 (injuries): outcomes chosen by the operator.
        for injury in &sheet.injuries {
            let Some(player) = team.player_mut(&injury.player) else {
                // Unhired journeymen and stars leave with the live document.
                continue;
            };
            match injury.outcome {
                InjuryOutcome::Recovered => {}
                InjuryOutcome::MissNextGame => player.miss_next_game = true,
                InjuryOutcome::StatPenalty { stat } => {
                    let stats = &mut player.stats;
                    match stat {
                        Stat::Ma => stats.ma = stats.ma.saturating_sub(1).max(1),
                        Stat::St => stats.st = stats.st.saturating_sub(1).max(1),
                        Stat::Ag => stats.ag = (stats.ag + 1).min(TARGET_STAT_WORST),
                        Stat::Pa => stats.pa = (stats.pa + 1).min(TARGET_STAT_WORST),
                        Stat::Av => stats.av = (stats.av + 1).min(TARGET_STAT_WORST),
                    }
                }
                InjuryOutcome::Dead => player.dead = true,
            }
            if injury.temp_retired {
                player.temp_retired = true;
            }
        }

        // Step 4 (staff): purchases debit, removals never refund.
        let staff = &sheet.staff_changes;
        let staff_cost = sheet.staff_purchase_cost(team, catalogue);
        if !staff_cost.is_zero() {
            team.debit(staff_cost, &format!("staff changes, match {match_id}"), at);
        }
        team.assistant_coaches =
            (team.assistant_coaches as i16 + staff.assistant_coaches as i16).max(0) as u8;
        team.cheerleaders = (team.cheerleaders as i16 + staff.cheerleaders as i16).max(0) as u8;
        team.rerolls = (team.rerolls as i16 + staff.rerolls as i16).max(0) as u8;
        if let Some(apothecary) = staff.apothecary {
            team.apothecary = apothecary;
        }

        // Step 5: expensive mistakes against the treasury as it now stands.
        let mistake = if catalogue.mistakes.applies_to(team.treasury) {
            sheet.mistakes_roll.map(|roll| {
                let outcome = catalogue.mistakes.outcome(team.treasury, roll);
                match outcome {
                    MistakeOutcome::CrisisAverted => {}
                    MistakeOutcome::MinorIncident => {
                        let d3 = sheet.mistakes_d3.unwrap_or(1).clamp(1, 3) as i64;
                        team.debit(
                            Gp::new(d3 * 10_000),
                            &format!("minor incident, match {match_id}"),
                            at,
                        );
                    }
                    MistakeOutcome::MajorIncident => {
                        let after = team.treasury.halved_to_nearest(5_000);
                        team.debit(
                            team.treasury - after,
                            &format!("major incident, match {match_id}"),
                            at,
                        );
                    }
                    MistakeOutcome::Catastrophe => {
                        let total = sheet.mistakes_2d6_total.unwrap_or(2) as i64;
                        let after = Gp::new(total * 10_000);
                        team.credit(
                            after - team.treasury,
                            &format!("catastrophe, match {match_id}"),
                            at,
                        );
                    }
                }
                outcome
            })
        } else {
            None
        };

        // Committed treasuries never go negative; an acknowledged overdraft
        // is written off on the audit log.
        if team.treasury.is_negative() {
            team.credit(
                -team.treasury,
                &format!("overdraft write-off, match {match_id}"),
                at,
            );
        }

        // Dead players leave the roster entirely.
        team.roster.retain(|p| !p.dead);

        team.match_history.push(MatchHistoryEntry {
            match_id: match_id.clone(),
            opponent: self.side(side.opponent()).team.clone(),
            score_for: sheet.score,
            score_against: sheet.opponent_score,
            winnings,
            at,
        });

        Ok(SideReport {
            team: team.id.clone(),
            score: sheet.score,
            winnings,
            fans_delta,
            casualties_inflicted: sheet.casualties_inflicted,
            mistake,
            spp_awarded,
        })
    }

    /// Step 6. Apply every computed delta to both team records and produce
    /// the immutable match report. Teams that already carry this match in
    /// their history are skipped, so a retry after a partial persist cannot
    /// double-apply.
    pub fn commit(
        &self,
        fixture: &mut Fixture,
        live: &ActiveMatchState,
        home_team: &mut Team,
        away_team: &mut Team,
        catalogue: &Catalogue,
        at: DateTime<Utc>,
    ) -> Result<MatchReport, EngineError> {
        super::lifecycle::ensure_status(fixture, FixtureStatus::InProgress)?;

        let home_report = self.commit_side(TeamSide::Home, home_team, live, catalogue, at)?;
        let away_report = self.commit_side(TeamSide::Away, away_team, live, catalogue, at)?;

        fixture.score_home = self.home.score;
        fixture.score_away = self.away.score;
        fixture.status = FixtureStatus::Completed;

        Ok(MatchReport {
            match_id: self.match_id.clone(),
            season: self.season,
            round: self.round,
            home: home_report,
            away: away_report,
            completed_at: at,
        })
    }
}
