//! Corporation/org state: money and research-point accrual on read,
//! research-tech unlocks, and per-corp prospecting records gating mining.

use crate::error::{Result, SimError};
use crate::ids::{CorpId, LocationId, TeamId, TechId};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

const SECONDS_PER_MONTH: f64 = 30.0 * 86_400.0;
const SECONDS_PER_WEEK: f64 = 7.0 * 86_400.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResearchTeam {
    pub id: TeamId,
    pub cost_per_month_usd: f64,
    pub points_per_week: f64,
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Corporation {
    pub id: CorpId,
    pub name: String,
    pub balance_usd: f64,
    pub research_points: f64,
    pub last_settled_at: f64,
    pub teams: Vec<ResearchTeam>,
    pub unlocked_techs: HashSet<TechId>,
}

/// Debits/credits money and research points for elapsed time since
/// `last_settled_at`, one active research team at a time, then advances
/// the settlement watermark. Idempotent at the same `now_s`.
pub fn settle(corp: &mut Corporation, now_s: f64) {
    let elapsed_s = (now_s - corp.last_settled_at).max(0.0);
    if elapsed_s <= 0.0 {
        corp.last_settled_at = now_s;
        return;
    }
    for team in &corp.teams {
        if !team.active {
            continue;
        }
        corp.balance_usd -= team.cost_per_month_usd * (elapsed_s / SECONDS_PER_MONTH);
        corp.research_points += team.points_per_week * (elapsed_s / SECONDS_PER_WEEK);
    }
    corp.last_settled_at = now_s;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TechDef {
    pub id: TechId,
    pub cost_research_points: f64,
    pub prerequisites: Vec<TechId>,
}

/// Spends research points to unlock a tech. Rejects if the cost exceeds
/// current points or any prerequisite is missing.
pub fn unlock_tech(corp: &mut Corporation, tech: &TechDef) -> Result<()> {
    if corp.unlocked_techs.contains(&tech.id) {
        return Err(SimError::conflict("tech already unlocked"));
    }
    for prereq in &tech.prerequisites {
        if !corp.unlocked_techs.contains(prereq) {
            return Err(SimError::precondition(format!("missing prerequisite {prereq}")));
        }
    }
    if tech.cost_research_points > corp.research_points + 1e-9 {
        return Err(SimError::precondition("insufficient research points"));
    }
    corp.research_points -= tech.cost_research_points;
    corp.unlocked_techs.insert(tech.id.clone());
    Ok(())
}

#[derive(Debug, Clone, Default)]
pub struct ProspectingRecords {
    records: HashMap<(CorpId, LocationId), ResourceDistribution>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceDistribution {
    pub fractions: HashMap<String, f64>,
}

impl ProspectingRecords {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, corp_id: CorpId, site_id: LocationId, distribution: ResourceDistribution) {
        self.records.insert((corp_id, site_id), distribution);
    }

    #[must_use]
    pub fn has_prospected(&self, corp_id: &CorpId, site_id: &LocationId) -> bool {
        self.records
            .contains_key(&(corp_id.clone(), site_id.clone()))
    }

    #[must_use]
    pub fn distribution(&self, corp_id: &CorpId, site_id: &LocationId) -> Option<&ResourceDistribution> {
        self.records.get(&(corp_id.clone(), site_id.clone()))
    }
}
