pub mod config;
pub mod domain;
pub mod engine;
pub mod error;
pub mod orchestration;
pub mod store;

pub use config::Config;
pub use domain::{
    ActiveMatchState, Catalogue, Fixture, FixtureStatus, Gp, MatchId, Player, PlayerId, StatLine,
    Team, TeamId, TeamSide,
};
pub use engine::{RuleWarning, ValidationReport};
pub use error::EngineError;
pub use orchestration::{MatchService, RandomService, ScriptedRandom};
pub use store::{HttpStore, MemoryStore, RecordStore, StoreError};
