//! I/O orchestration around the pure engine.

pub mod matchday;
pub mod random;

pub use matchday::{MatchService, MatchdayError};
pub use random::{RandomService, ScriptedRandom, ThreadRandom};
