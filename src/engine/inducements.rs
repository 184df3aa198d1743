//! Pre-match inducement negotiation: asymmetric spend caps, petty cash and
//! the two-step purchase wizard.
//!
//! The lower-CTV side's petty cash depends on how much the higher side
//! actually spends, so the higher side commits first and locks the baseline;
//! the lock is an explicit state, and going back to the first step clears it
//! structurally.

use super::{valuation, RuleWarning, ValidationReport};
use crate::domain::{Catalogue, Gp, MatchId, Team, TeamId, TeamSide};
use crate::error::EngineError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

const STAR_PLAYER_MAX: u8 = 2;

/// Wizard baseline state. `spent_at_lock` freezes the higher side's clamped
/// treasury spend the moment the baseline is locked.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum BaselineLock {
    NotLocked,
    Locked { high_side: TeamSide, spent_at_lock: Gp },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Purchase {
    /// One unit of a catalogue inducement; buy several by adding several.
    Item { name: String },
    Star { name: String },
    /// Free-form line with an operator-entered price.
    Mercenary { label: String, cost: Gp },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SideBudget {
    pub team: TeamId,
    pub race: String,
    pub tags: Vec<String>,
    pub treasury: Gp,
    /// Inducement CTV, phantom journeyman cost included.
    pub ctv: Gp,
    pub purchases: Vec<Purchase>,
}

/// Working document for one fixture's pre-match negotiation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InducementSession {
    pub match_id: MatchId,
    pub home: SideBudget,
    pub away: SideBudget,
    pub lock: BaselineLock,
}

fn build_side(team: &Team, catalogue: &Catalogue) -> Result<SideBudget, EngineError> {
    let needed = team.journeymen_needed();
    let journeyman_cost = if needed > 0 {
        catalogue.journeyman_template(&team.race)?.cost
    } else {
        Gp::zero()
    };
    let tags = catalogue
        .races
        .get(&team.race)
        .map(|r| r.tags.clone())
        .unwrap_or_default();
    Ok(SideBudget {
        team: team.id.clone(),
        race: team.race.clone(),
        tags,
        treasury: team.treasury,
        ctv: valuation::inducement_ctv(team, catalogue, journeyman_cost),
        purchases: Vec::new(),
    })
}

impl InducementSession {
    pub fn new(
        match_id: MatchId,
        home_team: &Team,
        away_team: &Team,
        catalogue: &Catalogue,
    ) -> Result<Self, EngineError> {
        Ok(InducementSession {
            match_id,
            home: build_side(home_team, catalogue)?,
            away: build_side(away_team, catalogue)?,
            lock: BaselineLock::NotLocked,
        })
    }

    /// Recompute CTVs and treasuries from fresh team records while keeping
    /// purchases and the lock. Reopening the wizard after squad edits goes
    /// through here; a lock that no longer matches the ordering is caught by
    /// `validate`.
    pub fn refresh(
        &mut self,
        home_team: &Team,
        away_team: &Team,
        catalogue: &Catalogue,
    ) -> Result<(), EngineError> {
        let home_purchases = std::mem::take(&mut self.home.purchases);
        let away_purchases = std::mem::take(&mut self.away.purchases);
        self.home = build_side(home_team, catalogue)?;
        self.away = build_side(away_team, catalogue)?;
        self.home.purchases = home_purchases;
        self.away.purchases = away_purchases;
        Ok(())
    }

    pub fn side(&self, side: TeamSide) -> &SideBudget {
        match side {
            TeamSide::Home => &self.home,
            TeamSide::Away => &self.away,
        }
    }

    fn side_mut(&mut self, side: TeamSide) -> &mut SideBudget {
        match side {
            TeamSide::Home => &mut self.home,
            TeamSide::Away => &mut self.away,
        }
    }

    /// Side with the higher CTV; None on a tie.
    pub fn high_side(&self) -> Option<TeamSide> {
        if self.home.ctv > self.away.ctv {
            Some(TeamSide::Home)
        } else if self.away.ctv > self.home.ctv {
            Some(TeamSide::Away)
        } else {
            None
        }
    }

    pub fn ctv_diff(&self) -> Gp {
        (self.home.ctv - self.away.ctv).abs()
    }

    fn purchase_cost(&self, catalogue: &Catalogue, side: TeamSide, purchase: &Purchase) -> Gp {
        let tags = &self.side(side).tags;
        match purchase {
            Purchase::Item { name } => catalogue
                .inducements
                .get(name)
                .map(|d| d.cost_for(tags))
                .unwrap_or(Gp::zero()),
            Purchase::Star { name } => catalogue
                .stars
                .get(name)
                .map(|s| s.cost)
                .unwrap_or(Gp::zero()),
            Purchase::Mercenary { cost, .. } => *cost,
        }
    }

    /// Current total spend of one side.
    pub fn spend(&self, catalogue: &Catalogue, side: TeamSide) -> Gp {
        self.side(side)
            .purchases
            .iter()
            .map(|p| self.purchase_cost(catalogue, side, p))
            .sum()
    }

    /// Add a purchase; the key must exist in the catalogue. Rule-level
    /// problems (caps, eligibility) are left to `validate`.
    pub fn add_purchase(
        &mut self,
        catalogue: &Catalogue,
        side: TeamSide,
        purchase: Purchase,
    ) -> Result<(), EngineError> {
        match &purchase {
            Purchase::Item { name } => {
                catalogue.inducement(name)?;
            }
            Purchase::Star { name } => {
                catalogue.star(name)?;
            }
            Purchase::Mercenary { .. } => {}
        }
        self.side_mut(side).purchases.push(purchase);
        Ok(())
    }

    pub fn remove_purchase(&mut self, side: TeamSide, index: usize) {
        let purchases = &mut self.side_mut(side).purchases;
        if index < purchases.len() {
            purchases.remove(index);
        }
    }

    /// The higher side's treasury spend that feeds petty cash: its actual
    /// spend, clamped to its treasury, frozen at lock time when locked.
    fn high_spend_baseline(&self, catalogue: &Catalogue) -> Gp {
        if let BaselineLock::Locked { spent_at_lock, .. } = self.lock {
            return spent_at_lock;
        }
        match self.high_side() {
            Some(high) => self
                .spend(catalogue, high)
                .min(self.side(high).treasury),
            None => Gp::zero(),
        }
    }

    /// Petty cash handed to a side. Only the lower-CTV side receives any;
    /// on a tie neither does.
    pub fn petty_cash(&self, catalogue: &Catalogue, side: TeamSide) -> Gp {
        match self.high_side() {
            Some(high) if high != side => self.ctv_diff() + self.high_spend_baseline(catalogue),
            _ => Gp::zero(),
        }
    }

    /// Maximum a side may spend: its own treasury for the higher side (and
    /// both sides on a tie), petty cash plus the treasury top-up ceiling for
    /// the lower side.
    pub fn spend_cap(&self, catalogue: &Catalogue, side: TeamSide) -> Gp {
        match self.high_side() {
            Some(high) if high != side => {
                let own = self.side(side).treasury.min(catalogue.petty_cash_top_up);
                self.petty_cash(catalogue, side) + own
            }
            _ => self.side(side).treasury,
        }
    }

    /// Complete the first wizard step: the higher side (an arbitrary side on
    /// a tie) locks the petty-cash baseline at its current spend.
    pub fn lock_baseline(&mut self, catalogue: &Catalogue) -> TeamSide {
        let high = self.high_side().unwrap_or(TeamSide::Home);
        let spent_at_lock = self.spend(catalogue, high).min(self.side(high).treasury);
        self.lock = BaselineLock::Locked {
            high_side: high,
            spent_at_lock,
        };
        high
    }

    /// Going back to the first step clears the lock.
    pub fn clear_lock(&mut self) {
        self.lock = BaselineLock::NotLocked;
    }

    /// Amount actually debited from a side's treasury at kickoff: the whole
    /// spend for the higher side, the spill past petty cash for the lower.
    pub fn treasury_spend(&self, catalogue: &Catalogue, side: TeamSide) -> Gp {
        let spend = self.spend(catalogue, side);
        (spend - self.petty_cash(catalogue, side)).floor_zero()
    }

    fn validate_side(&self, catalogue: &Catalogue, side: TeamSide, report: &mut ValidationReport) {
        let budget = self.side(side);

        let spent = self.spend(catalogue, side);
        let cap = self.spend_cap(catalogue, side);
        if spent > cap {
            report.push(RuleWarning::SpendCapExceeded { side, cap, spent });
        }

        let mut item_counts: HashMap<&str, u8> = HashMap::new();
        let mut star_count = 0u8;
        for purchase in &budget.purchases {
            match purchase {
                Purchase::Item { name } => *item_counts.entry(name.as_str()).or_insert(0) += 1,
                Purchase::Star { name } => {
                    star_count += 1;
                    if let Some(star) = catalogue.stars.get(name) {
                        if !star.eligible_for(&budget.tags) {
                            report.push(RuleWarning::IneligibleStar {
                                side,
                                star: name.clone(),
                            });
                        }
                    }
                }
                Purchase::Mercenary { .. } => {}
            }
        }

        if star_count > STAR_PLAYER_MAX {
            report.push(RuleWarning::StarPlayerLimitExceeded {
                side,
                count: star_count,
                max: STAR_PLAYER_MAX,
            });
        }

        for (name, count) in item_counts {
            let Some(def) = catalogue.inducements.get(name) else {
                continue;
            };
            if let Some(tag) = &def.requires_tag {
                if !budget.tags.contains(tag) {
                    report.push(RuleWarning::RestrictedItem {
                        side,
                        item: name.to_string(),
                    });
                }
            }
            if let Some(max) = def.max_for(&budget.tags) {
                if count > max {
                    report.push(RuleWarning::ItemLimitExceeded {
                        side,
                        item: name.to_string(),
                        count,
                        max,
                    });
                }
            }
        }
    }

    /// Collect every rule warning. Nothing here blocks; the caller proceeds
    /// after explicit acknowledgment.
    pub fn validate(&self, catalogue: &Catalogue) -> ValidationReport {
        let mut report = ValidationReport::new();
        if let BaselineLock::Locked { high_side, .. } = self.lock {
            if self.high_side() != Some(high_side) {
                report.push(RuleWarning::StaleBaselineLock);
            }
        }
        self.validate_side(catalogue, TeamSide::Home, &mut report);
        self.validate_side(catalogue, TeamSide::Away, &mut report);
        report
    }
}
