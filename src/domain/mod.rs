//! Domain types for league play: teams, players, fixtures, live match
//! state, and the immutable reference catalogue.

pub mod catalogue;
pub mod fixture;
pub mod live;
pub mod player;
pub mod primitives;
pub mod team;

pub use catalogue::{
    AdvancementCostTable, Catalogue, CharacteristicBand, InducementDef, InducementOverride,
    MistakeOutcome, MistakesTable, PositionTemplate, Race, SkillDef, SppWeights, StaffCosts,
    StarPlayerDef, Stat,
};
pub use fixture::{Fixture, FixtureStatus, PregameSnapshot, SidePregame};
pub use live::{ActiveMatchState, LiveAction, LiveActionKind, LivePlayer, LiveSide};
pub use player::{AdvancementKind, AdvancementRecord, Player, StatLine};
pub use primitives::{Gp, MatchId, PlayerId, TeamId, TeamSide};
pub use team::{MatchHistoryEntry, Team, TreasuryEvent};
