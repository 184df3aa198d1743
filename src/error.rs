use crate::domain::{MatchId, PlayerId, TeamId};
use thiserror::Error;

/// Hard validation failures. These abort the operation with a single
/// actionable message; rule-level problems are `RuleWarning`s instead and
/// never take this path.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Unknown team: {0}")]
    UnknownTeam(TeamId),
    #[error("Unknown fixture: {0}")]
    UnknownFixture(MatchId),
    #[error("No live match state for fixture {0}")]
    MissingLiveState(MatchId),
    #[error("Fixture {id} is {actual}, expected {expected}")]
    InvalidTransition {
        id: MatchId,
        actual: String,
        expected: String,
    },
    #[error("Unknown player {player} on team {team}")]
    UnknownPlayer { team: TeamId, player: String },
    #[error("Unknown catalogue key {kind}: {key}")]
    UnknownCatalogueKey { kind: &'static str, key: String },
    #[error("Advancement for {player} is missing a {what} selection")]
    MissingAdvancementSelection { player: PlayerId, what: &'static str },
    #[error("Malformed document at {path}: {reason}")]
    MalformedDocument { path: String, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_transition_message() {
        let err = EngineError::InvalidTransition {
            id: MatchId::new("m1".to_string()),
            actual: "completed".to_string(),
            expected: "in_progress".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Fixture m1 is completed, expected in_progress"
        );
    }

    #[test]
    fn test_unknown_catalogue_key_message() {
        let err = EngineError::UnknownCatalogueKey {
            kind: "race",
            key: "void_elves".to_string(),
        };
        assert_eq!(err.to_string(), "Unknown catalogue key race: void_elves");
    }
}
