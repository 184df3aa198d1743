//! Injected random-integer service. Engine-side randomness is limited to
//! the kickoff coin flip; gameplay dice stay operator-entered for tabletop
//! fidelity, so nothing here auto-rolls them.

use rand::Rng;
use std::collections::VecDeque;
use std::sync::Mutex;

pub trait RandomService: Send + Sync {
    /// Uniform integer in [min, max], inclusive on both ends.
    fn random_int(&self, min: i32, max: i32) -> i32;
}

/// Default implementation over the thread RNG.
#[derive(Debug, Default)]
pub struct ThreadRandom;

impl RandomService for ThreadRandom {
    fn random_int(&self, min: i32, max: i32) -> i32 {
        rand::thread_rng().gen_range(min..=max)
    }
}

/// Scripted values for tests; returns `min` once the script runs dry.
#[derive(Debug, Default)]
pub struct ScriptedRandom {
    values: Mutex<VecDeque<i32>>,
}

impl ScriptedRandom {
    pub fn new(values: impl IntoIterator<Item = i32>) -> Self {
        Self {
            values: Mutex::new(values.into_iter().collect()),
        }
    }
}

impl RandomService for ScriptedRandom {
    fn random_int(&self, min: i32, max: i32) -> i32 {
        self.values
            .lock()
            .unwrap()
            .pop_front()
            .map(|v| v.clamp(min, max))
            .unwrap_or(min)
    }
}
