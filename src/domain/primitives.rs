//! Domain primitives: Gp, TeamId, PlayerId, MatchId, TeamSide.

use serde::{Deserialize, Serialize};
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign};

/// Currency in gold pieces. All league money is integer Gp.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Gp(pub i64);

impl Gp {
    /// Create a Gp amount.
    pub fn new(amount: i64) -> Self {
        Gp(amount)
    }

    pub fn zero() -> Self {
        Gp(0)
    }

    /// Get the underlying amount.
    pub fn as_i64(&self) -> i64 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    pub fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Clamp to zero from below.
    pub fn floor_zero(self) -> Self {
        Gp(self.0.max(0))
    }

    pub fn min(self, other: Self) -> Self {
        Gp(self.0.min(other.0))
    }

    pub fn abs(self) -> Self {
        Gp(self.0.abs())
    }

    /// Halve, rounding down to the nearest `step`.
    pub fn halved_to_nearest(self, step: i64) -> Self {
        let half = self.0 / 2;
        Gp(half - half.rem_euclid(step))
    }
}

impl Add for Gp {
    type Output = Gp;
    fn add(self, rhs: Gp) -> Gp {
        Gp(self.0 + rhs.0)
    }
}

impl Sub for Gp {
    type Output = Gp;
    fn sub(self, rhs: Gp) -> Gp {
        Gp(self.0 - rhs.0)
    }
}

impl Neg for Gp {
    type Output = Gp;
    fn neg(self) -> Gp {
        Gp(-self.0)
    }
}

impl Mul<i64> for Gp {
    type Output = Gp;
    fn mul(self, rhs: i64) -> Gp {
        Gp(self.0 * rhs)
    }
}

impl AddAssign for Gp {
    fn add_assign(&mut self, rhs: Gp) {
        self.0 += rhs.0;
    }
}

impl SubAssign for Gp {
    fn sub_assign(&mut self, rhs: Gp) {
        self.0 -= rhs.0;
    }
}

impl Sum for Gp {
    fn sum<I: Iterator<Item = Gp>>(iter: I) -> Gp {
        Gp(iter.map(|g| g.0).sum())
    }
}

impl std::fmt::Display for Gp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Team identifier.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TeamId(pub String);

impl TeamId {
    pub fn new(id: String) -> Self {
        TeamId(id)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for TeamId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Player identifier.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PlayerId(pub String);

impl PlayerId {
    pub fn new(id: String) -> Self {
        PlayerId(id)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for PlayerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Fixture/match identifier.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MatchId(pub String);

impl MatchId {
    pub fn new(id: String) -> Self {
        MatchId(id)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for MatchId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Which side of a fixture a team occupies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TeamSide {
    Home,
    Away,
}

impl TeamSide {
    pub fn opponent(&self) -> TeamSide {
        match self {
            TeamSide::Home => TeamSide::Away,
            TeamSide::Away => TeamSide::Home,
        }
    }
}

impl std::fmt::Display for TeamSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TeamSide::Home => write!(f, "home"),
            TeamSide::Away => write!(f, "away"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gp_arithmetic() {
        assert_eq!(Gp::new(50_000) + Gp::new(20_000), Gp::new(70_000));
        assert_eq!(Gp::new(50_000) - Gp::new(70_000), Gp::new(-20_000));
        assert_eq!(Gp::new(10_000) * 3, Gp::new(30_000));
        assert_eq!(Gp::new(-5_000).floor_zero(), Gp::zero());
    }

    #[test]
    fn test_gp_halved_to_nearest() {
        assert_eq!(Gp::new(230_000).halved_to_nearest(5_000), Gp::new(115_000));
        assert_eq!(Gp::new(235_000).halved_to_nearest(5_000), Gp::new(115_000));
        assert_eq!(Gp::new(15_000).halved_to_nearest(5_000), Gp::new(5_000));
    }

    #[test]
    fn test_gp_sum() {
        let total: Gp = [Gp::new(1), Gp::new(2), Gp::new(3)].into_iter().sum();
        assert_eq!(total, Gp::new(6));
    }

    #[test]
    fn test_side_opponent() {
        assert_eq!(TeamSide::Home.opponent(), TeamSide::Away);
        assert_eq!(TeamSide::Away.opponent(), TeamSide::Home);
    }

    #[test]
    fn test_side_serialization() {
        let json = serde_json::to_string(&TeamSide::Home).unwrap();
        assert_eq!(json, "\"home\"");
    }
}
