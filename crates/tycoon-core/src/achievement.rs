//! Achievement definitions and the tracker that evaluates them.
//!
//! Achievements read live metrics through [`MetricSource`], so the tracker
//! never needs to know how the simulation state is laid out.

use crate::id::AchievementId;
use crate::resource::ResourceKind;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ---------------------------------------------------------------------------
// Metrics
// ---------------------------------------------------------------------------

/// A live quantity an achievement is measured against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AchievementMetric {
    /// Number of machine instances currently owned.
    MachinesOwned,
    /// Lifetime production of one resource.
    ResourceProduced(ResourceKind),
    /// Number of researched technologies.
    TechsResearched,
    /// Lifetime money earned from sales and passive income.
    MoneyEarned,
    /// Quantity currently held.
    ResourceOnHand(ResourceKind),
    /// Highest level among owned machines.
    MaxMachineLevel,
    /// Sum of per-cycle output of one resource over running machines.
    ProductionRate(ResourceKind),
}

impl AchievementMetric {
    /// Cumulative metrics never lower an achievement's recorded progress.
    pub fn is_cumulative(&self) -> bool {
        matches!(
            self,
            AchievementMetric::ResourceProduced(_)
                | AchievementMetric::TechsResearched
                | AchievementMetric::MoneyEarned
        )
    }
}

/// Anything that can report the current value of a metric.
pub trait MetricSource {
    fn metric(&self, metric: &AchievementMetric) -> f64;
}

// ---------------------------------------------------------------------------
// Definitions and progress
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AchievementDefinition {
    pub id: AchievementId,
    pub name: String,
    pub description: String,
    pub metric: AchievementMetric,
    pub target: f64,
    /// Hidden achievements are not shown until unlocked.
    pub hidden: bool,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AchievementProgress {
    pub unlocked: bool,
    pub current: f64,
}

// ---------------------------------------------------------------------------
// Tracker
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct AchievementTracker {
    definitions: Vec<AchievementDefinition>,
    progress: BTreeMap<AchievementId, AchievementProgress>,
}

impl AchievementTracker {
    pub fn new(definitions: Vec<AchievementDefinition>) -> Self {
        let progress = definitions
            .iter()
            .map(|def| (def.id.clone(), AchievementProgress::default()))
            .collect();
        Self {
            definitions,
            progress,
        }
    }

    /// Refresh progress from `source` and unlock every achievement whose
    /// target is met. Returns the newly unlocked ids in definition order;
    /// calling again with the same metrics returns nothing.
    pub fn evaluate(&mut self, source: &impl MetricSource) -> Vec<AchievementId> {
        let mut unlocked = Vec::new();
        for def in &self.definitions {
            let Some(progress) = self.progress.get_mut(&def.id) else {
                continue;
            };
            if progress.unlocked {
                continue;
            }

            let value = source.metric(&def.metric).min(def.target);
            progress.current = if def.metric.is_cumulative() {
                progress.current.max(value)
            } else {
                value
            };

            if progress.current >= def.target {
                progress.unlocked = true;
                progress.current = def.target;
                unlocked.push(def.id.clone());
            }
        }
        unlocked
    }

    pub fn definition(&self, id: &AchievementId) -> Option<&AchievementDefinition> {
        self.definitions.iter().find(|def| &def.id == id)
    }

    pub fn progress(&self, id: &AchievementId) -> Option<&AchievementProgress> {
        self.progress.get(id)
    }

    pub fn is_unlocked(&self, id: &AchievementId) -> bool {
        self.progress(id).is_some_and(|p| p.unlocked)
    }

    pub fn unlocked_count(&self) -> usize {
        self.progress.values().filter(|p| p.unlocked).count()
    }

    /// Definitions paired with their progress, in definition order.
    pub fn iter(&self) -> impl Iterator<Item = (&AchievementDefinition, &AchievementProgress)> {
        self.definitions
            .iter()
            .filter_map(|def| self.progress.get(&def.id).map(|p| (def, p)))
    }

    /// Definitions the player may see: every visible one plus unlocked hidden ones.
    pub fn visible(&self) -> impl Iterator<Item = (&AchievementDefinition, &AchievementProgress)> {
        self.iter().filter(|(def, p)| !def.hidden || p.unlocked)
    }

    pub fn progress_map(&self) -> &BTreeMap<AchievementId, AchievementProgress> {
        &self.progress
    }

    /// Overwrite progress for a known achievement. Unknown ids are ignored
    /// and reported as `false`.
    pub fn restore(&mut self, id: &AchievementId, progress: AchievementProgress) -> bool {
        match self.progress.get_mut(id) {
            Some(slot) => {
                *slot = progress;
                true
            }
            None => false,
        }
    }
}
