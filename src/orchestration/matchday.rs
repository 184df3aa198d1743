//! Match-day orchestration: loads records, runs the pure engine, and
//! persists the results in an order that keeps retries safe.
//!
//! The engine never touches the store; every read happens before the
//! computation and every write after it, so a store failure leaves no
//! half-applied in-memory state behind.

use super::random::RandomService;
use crate::domain::{
    ActiveMatchState, Catalogue, Fixture, FixtureStatus, LiveAction, MatchId, Team, TeamId,
    TeamSide,
};
use crate::engine::inducements::InducementSession;
use crate::engine::postgame::{MatchReport, PostGameSheet};
use crate::engine::{lifecycle, ValidationReport};
use crate::error::EngineError;
use crate::store::{paths, read_typed, write_typed, RecordStore, StoreError};
use chrono::Utc;
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum MatchdayError {
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("Validation raised {} warning(s); acknowledge to proceed", .report.warnings.len())]
    UnacknowledgedWarnings { report: ValidationReport },
}

#[derive(Clone)]
pub struct MatchService {
    store: Arc<dyn RecordStore>,
    random: Arc<dyn RandomService>,
    catalogue: Arc<Catalogue>,
}

impl MatchService {
    pub fn new(
        store: Arc<dyn RecordStore>,
        random: Arc<dyn RandomService>,
        catalogue: Arc<Catalogue>,
    ) -> Self {
        Self {
            store,
            random,
            catalogue,
        }
    }

    async fn load_fixture(&self, id: &MatchId) -> Result<(Fixture, String), MatchdayError> {
        read_typed::<Fixture>(self.store.as_ref(), &paths::fixture(id))
            .await?
            .ok_or_else(|| EngineError::UnknownFixture(id.clone()).into())
    }

    async fn load_team(&self, id: &TeamId) -> Result<(Team, String), MatchdayError> {
        read_typed::<Team>(self.store.as_ref(), &paths::team(id))
            .await?
            .ok_or_else(|| EngineError::UnknownTeam(id.clone()).into())
    }

    async fn load_live(&self, id: &MatchId) -> Result<(ActiveMatchState, String), MatchdayError> {
        read_typed::<ActiveMatchState>(self.store.as_ref(), &paths::live(id))
            .await?
            .ok_or_else(|| EngineError::MissingLiveState(id.clone()).into())
    }

    /// Open (or reopen) the pre-match inducement wizard for a fixture. A
    /// stored session keeps its purchases and lock; its CTVs are refreshed
    /// from the current team records.
    pub async fn prematch_session(
        &self,
        match_id: &MatchId,
    ) -> Result<InducementSession, MatchdayError> {
        let (fixture, _) = self.load_fixture(match_id).await?;
        let (home, _) = self.load_team(&fixture.home).await?;
        let (away, _) = self.load_team(&fixture.away).await?;

        let stored =
            read_typed::<InducementSession>(self.store.as_ref(), &paths::prematch(match_id))
                .await?;
        let session = match stored {
            Some((mut session, _)) => {
                session.refresh(&home, &away, &self.catalogue)?;
                session
            }
            None => InducementSession::new(match_id.clone(), &home, &away, &self.catalogue)?,
        };
        self.save_prematch_session(&session).await?;
        Ok(session)
    }

    pub async fn save_prematch_session(
        &self,
        session: &InducementSession,
    ) -> Result<(), MatchdayError> {
        write_typed(
            self.store.as_ref(),
            &paths::prematch(&session.match_id),
            session,
            &format!("Match {}: inducement wizard", session.match_id),
            None,
        )
        .await?;
        Ok(())
    }

    /// `scheduled -> in_progress`. The confirmed inducement purchases are
    /// debited, rosters snapshot into a live document, and the coin flip
    /// decides first turn. Treasury writes land before the fixture flips
    /// status, so an interrupted start retries cleanly.
    pub async fn start_match(
        &self,
        match_id: &MatchId,
        session: &InducementSession,
    ) -> Result<ActiveMatchState, MatchdayError> {
        let (mut fixture, fixture_rev) = self.load_fixture(match_id).await?;
        let (mut home, home_rev) = self.load_team(&fixture.home).await?;
        let (mut away, away_rev) = self.load_team(&fixture.away).await?;

        let first_turn = if self.random.random_int(1, 2) == 1 {
            TeamSide::Home
        } else {
            TeamSide::Away
        };

        let live = lifecycle::kickoff(
            &mut fixture,
            &mut home,
            &mut away,
            session,
            &self.catalogue,
            first_turn,
            Utc::now(),
        )?;

        let description = format!("Match {match_id}: kickoff");
        write_typed(
            self.store.as_ref(),
            &paths::team(&home.id),
            &home,
            &description,
            Some(&home_rev),
        )
        .await?;
        write_typed(
            self.store.as_ref(),
            &paths::team(&away.id),
            &away,
            &description,
            Some(&away_rev),
        )
        .await?;
        write_typed(self.store.as_ref(), &paths::live(match_id), &live, &description, None)
            .await?;
        write_typed(
            self.store.as_ref(),
            &paths::fixture(match_id),
            &fixture,
            &description,
            Some(&fixture_rev),
        )
        .await?;
        self.store
            .delete(&paths::prematch(match_id), &description)
            .await?;

        info!(
            "Match {} started, {} kicks off first",
            match_id, first_turn
        );
        Ok(live)
    }

    /// Live play: apply one scoring action and persist the whole live
    /// document. Last write wins; there is a single writer per match.
    pub async fn record_action(
        &self,
        match_id: &MatchId,
        action: LiveAction,
    ) -> Result<ActiveMatchState, MatchdayError> {
        let (fixture, _) = self.load_fixture(match_id).await?;
        lifecycle::ensure_status(&fixture, FixtureStatus::InProgress)?;

        let (mut live, _) = self.load_live(match_id).await?;
        live.record(action);
        write_typed(
            self.store.as_ref(),
            &paths::live(match_id),
            &live,
            &format!("Match {match_id}: live update"),
            None,
        )
        .await?;
        Ok(live)
    }

    /// `in_progress -> scheduled`. Restores the kickoff debits from the
    /// pregame snapshot and discards the live document.
    pub async fn cancel_match(&self, match_id: &MatchId) -> Result<(), MatchdayError> {
        let (mut fixture, fixture_rev) = self.load_fixture(match_id).await?;
        let (mut home, home_rev) = self.load_team(&fixture.home).await?;
        let (mut away, away_rev) = self.load_team(&fixture.away).await?;

        lifecycle::cancel(&mut fixture, &mut home, &mut away, Utc::now())?;

        let description = format!("Match {match_id}: cancelled");
        write_typed(
            self.store.as_ref(),
            &paths::team(&home.id),
            &home,
            &description,
            Some(&home_rev),
        )
        .await?;
        write_typed(
            self.store.as_ref(),
            &paths::team(&away.id),
            &away,
            &description,
            Some(&away_rev),
        )
        .await?;
        write_typed(
            self.store.as_ref(),
            &paths::fixture(match_id),
            &fixture,
            &description,
            Some(&fixture_rev),
        )
        .await?;
        self.store.delete(&paths::live(match_id), &description).await?;

        info!("Match {} cancelled, treasuries restored", match_id);
        Ok(())
    }

    /// Start a post-game reconciliation sheet from the current live state.
    pub async fn build_postgame(&self, match_id: &MatchId) -> Result<PostGameSheet, MatchdayError> {
        let (fixture, _) = self.load_fixture(match_id).await?;
        lifecycle::ensure_status(&fixture, FixtureStatus::InProgress)?;
        let (live, _) = self.load_live(match_id).await?;
        let (home, _) = self.load_team(&fixture.home).await?;
        let (away, _) = self.load_team(&fixture.away).await?;
        Ok(PostGameSheet::build(&fixture, &live, &home, &away)?)
    }

    /// Run the pre-commit validation pass for a sheet.
    pub async fn validate_postgame(
        &self,
        sheet: &PostGameSheet,
    ) -> Result<ValidationReport, MatchdayError> {
        let (fixture, _) = self.load_fixture(&sheet.match_id).await?;
        let (live, _) = self.load_live(&sheet.match_id).await?;
        let (home, _) = self.load_team(&fixture.home).await?;
        let (away, _) = self.load_team(&fixture.away).await?;
        Ok(sheet.validate(&live, &home, &away, &self.catalogue))
    }

    /// `in_progress -> completed`. Commits every post-game delta, writes the
    /// immutable report, and deletes the live document. Team records go
    /// first: they are the most expensive writes to redo, and the
    /// match-history guard makes redoing them a no-op. Any failure leaves
    /// the fixture in progress for a safe retry.
    pub async fn complete_match(
        &self,
        sheet: &PostGameSheet,
        acknowledge_warnings: bool,
    ) -> Result<MatchReport, MatchdayError> {
        let match_id = &sheet.match_id;
        let (mut fixture, fixture_rev) = self.load_fixture(match_id).await?;
        let (live, _) = self.load_live(match_id).await?;
        let (mut home, home_rev) = self.load_team(&fixture.home).await?;
        let (mut away, away_rev) = self.load_team(&fixture.away).await?;

        let report = sheet.validate(&live, &home, &away, &self.catalogue);
        if !report.is_clean() && !acknowledge_warnings {
            return Err(MatchdayError::UnacknowledgedWarnings { report });
        }

        let match_report = sheet.commit(
            &mut fixture,
            &live,
            &mut home,
            &mut away,
            &self.catalogue,
            Utc::now(),
        )?;

        let description = format!("Match {match_id}: post-game commit");
        write_typed(
            self.store.as_ref(),
            &paths::team(&home.id),
            &home,
            &description,
            Some(&home_rev),
        )
        .await?;
        write_typed(
            self.store.as_ref(),
            &paths::team(&away.id),
            &away,
            &description,
            Some(&away_rev),
        )
        .await?;
        write_typed(
            self.store.as_ref(),
            &paths::report(match_id),
            &match_report,
            &description,
            None,
        )
        .await?;
        write_typed(
            self.store.as_ref(),
            &paths::fixture(match_id),
            &fixture,
            &description,
            Some(&fixture_rev),
        )
        .await?;
        self.store
            .delete(&paths::live(match_id), &description)
            .await?;

        info!(
            "Match {} completed {}-{}",
            match_id, fixture.score_home, fixture.score_away
        );
        Ok(match_report)
    }
}
