//! Research module for the factory tycoon simulation.
//!
//! Technologies are registered at startup via [`TechTree::register`]. Each
//! [`TechDefinition`] has prerequisites, a total money cost, a per-tick
//! draw, and a list of [`ResearchEffect`]s.
//!
//! # Overview
//!
//! Game code starts research with [`TechTree::start`] and drives it once per
//! tick with [`TechTree::advance`], which draws `cost_per_tick` from the
//! money balance it is handed. A tick the balance cannot cover suspends the
//! research, keeping its progress. On completion the tree emits
//! [`ResearchEvent::Completed`] carrying the effects to apply; the tree
//! itself never interprets effects.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tycoon_core::id::{MachineKindId, TechId};
use tycoon_core::resource::ResourceKind;

/// Progress value at which research completes.
pub const PROGRESS_COMPLETE: f64 = 100.0;

// ---------------------------------------------------------------------------
// Effects
// ---------------------------------------------------------------------------

/// What completing a technology does. Interpreted by the simulator's
/// effect dispatcher, exactly once per completion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ResearchEffect {
    /// Add a machine kind to the purchasable list.
    UnlockMachine(MachineKindId),

    /// Multiply output rates of owned instances, either of one kind or of
    /// every kind when `machine` is `None`.
    BoostOutput {
        machine: Option<MachineKindId>,
        factor: f64,
    },

    /// Multiply input rates of every owned instance.
    ReduceInput { factor: f64 },

    /// Start generating money every tick.
    EnablePassiveIncome { amount: f64 },

    /// List a resource at its base price, replacing any drifted price.
    AddMarketResource {
        resource: ResourceKind,
        base_price: f64,
    },
}

// ---------------------------------------------------------------------------
// Definitions and state
// ---------------------------------------------------------------------------

/// A researchable technology. Immutable after registration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TechDefinition {
    pub id: TechId,
    pub name: String,
    pub description: String,
    /// Total money spent over the whole research.
    pub cost: f64,
    /// Money drawn every tick while researching.
    pub cost_per_tick: f64,
    pub prerequisites: Vec<TechId>,
    pub effects: Vec<ResearchEffect>,
}

impl TechDefinition {
    /// Progress gained per funded tick at the given game speed.
    pub fn progress_per_tick(&self, speed: f64) -> f64 {
        PROGRESS_COMPLETE / (self.cost / self.cost_per_tick) * speed
    }
}

/// Runtime research state of one technology. `researched` and
/// `researching` are never both true.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TechState {
    pub researched: bool,
    pub researching: bool,
    /// Percent complete, 0 to 100.
    pub progress: f64,
}

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum ResearchEvent {
    Started { tech: TechId, name: String },

    /// The balance could not cover a tick. Progress was kept.
    Suspended { tech: TechId, name: String },

    Completed {
        tech: TechId,
        name: String,
        effects: Vec<ResearchEffect>,
    },
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ResearchError {
    #[error("technology not found: {0}")]
    NotFound(TechId),

    #[error("technology {0} is already researched")]
    AlreadyResearched(TechId),

    #[error("technology {0} is already being researched")]
    AlreadyInProgress(TechId),

    #[error("prerequisite not met: {tech} requires {prereq}")]
    PrerequisiteNotMet { tech: TechId, prereq: TechId },

    #[error("not enough money to research {tech}: need {needed} per tick, have {available}")]
    InsufficientFunds {
        tech: TechId,
        needed: f64,
        available: f64,
    },

    #[error("duplicate technology id: {0}")]
    DuplicateId(TechId),

    #[error("prerequisite {prereq} for technology {tech} does not exist")]
    InvalidPrerequisite { tech: TechId, prereq: TechId },

    #[error("technology {0} must have a positive cost and cost per tick")]
    InvalidCost(TechId),
}

// ---------------------------------------------------------------------------
// TechTree
// ---------------------------------------------------------------------------

/// Technology definitions plus their runtime state, in registration order.
#[derive(Debug, Clone, Default)]
pub struct TechTree {
    definitions: Vec<TechDefinition>,
    states: Vec<TechState>,
    index: HashMap<TechId, usize>,
    /// Events emitted since last drain.
    events: Vec<ResearchEvent>,
}

impl TechTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a tree from definitions in dependency order.
    pub fn from_definitions(
        definitions: impl IntoIterator<Item = TechDefinition>,
    ) -> Result<Self, ResearchError> {
        let mut tree = Self::new();
        for def in definitions {
            tree.register(def)?;
        }
        Ok(tree)
    }

    // -- Registration API --

    /// Register a technology. Prerequisites must already be registered,
    /// which also rules out cycles.
    pub fn register(&mut self, def: TechDefinition) -> Result<TechId, ResearchError> {
        let id = def.id.clone();
        if self.index.contains_key(&id) {
            return Err(ResearchError::DuplicateId(id));
        }
        if !(def.cost > 0.0 && def.cost_per_tick > 0.0) {
            return Err(ResearchError::InvalidCost(id));
        }
        if let Some(prereq) = def
            .prerequisites
            .iter()
            .find(|p| !self.index.contains_key(*p))
        {
            return Err(ResearchError::InvalidPrerequisite {
                tech: id,
                prereq: prereq.clone(),
            });
        }

        self.index.insert(id.clone(), self.definitions.len());
        self.definitions.push(def);
        self.states.push(TechState::default());
        Ok(id)
    }

    // -- Query API --

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    pub fn definition(&self, id: &TechId) -> Option<&TechDefinition> {
        self.index.get(id).map(|&i| &self.definitions[i])
    }

    pub fn state(&self, id: &TechId) -> Option<&TechState> {
        self.index.get(id).map(|&i| &self.states[i])
    }

    /// Definitions paired with state, in registration order.
    pub fn iter(&self) -> impl Iterator<Item = (&TechDefinition, &TechState)> {
        self.definitions.iter().zip(self.states.iter())
    }

    pub fn is_researched(&self, id: &TechId) -> bool {
        self.state(id).is_some_and(|s| s.researched)
    }

    pub fn is_researching(&self, id: &TechId) -> bool {
        self.state(id).is_some_and(|s| s.researching)
    }

    pub fn researched_count(&self) -> usize {
        self.states.iter().filter(|s| s.researched).count()
    }

    /// Whether every prerequisite is researched. Unknown ids are never available.
    pub fn is_available(&self, id: &TechId) -> bool {
        self.definition(id)
            .is_some_and(|def| def.prerequisites.iter().all(|p| self.is_researched(p)))
    }

    /// Funded ticks left until completion at `speed`, or `None` for unknown
    /// or already researched technologies.
    pub fn ticks_remaining(&self, id: &TechId, speed: f64) -> Option<u64> {
        let i = *self.index.get(id)?;
        let state = &self.states[i];
        if state.researched {
            return None;
        }
        let per_tick = self.definitions[i].progress_per_tick(speed);
        let remaining = (PROGRESS_COMPLETE - state.progress).max(0.0);
        Some((remaining / per_tick).ceil() as u64)
    }

    // -- Research actions --

    /// Check that research on `id` could start with `money` on hand.
    pub fn can_start(&self, id: &TechId, money: f64) -> Result<(), ResearchError> {
        let i = *self
            .index
            .get(id)
            .ok_or_else(|| ResearchError::NotFound(id.clone()))?;
        let def = &self.definitions[i];
        let state = &self.states[i];

        if state.researched {
            return Err(ResearchError::AlreadyResearched(id.clone()));
        }
        if state.researching {
            return Err(ResearchError::AlreadyInProgress(id.clone()));
        }
        if let Some(prereq) = def.prerequisites.iter().find(|p| !self.is_researched(p)) {
            return Err(ResearchError::PrerequisiteNotMet {
                tech: id.clone(),
                prereq: prereq.clone(),
            });
        }
        if money < def.cost_per_tick {
            return Err(ResearchError::InsufficientFunds {
                tech: id.clone(),
                needed: def.cost_per_tick,
                available: money,
            });
        }
        Ok(())
    }

    /// Begin (or resume) research. Money is only checked here; the first
    /// draw happens on the next [`advance`](Self::advance).
    pub fn start(&mut self, id: &TechId, money: f64) -> Result<(), ResearchError> {
        self.can_start(id, money)?;
        let i = self.index[id];
        self.states[i].researching = true;
        self.events.push(ResearchEvent::Started {
            tech: id.clone(),
            name: self.definitions[i].name.clone(),
        });
        Ok(())
    }

    /// Advance every in-progress technology by one tick, drawing from `money`.
    pub fn advance(&mut self, money: &mut f64, speed: f64) {
        for (def, state) in self.definitions.iter().zip(self.states.iter_mut()) {
            if !state.researching || state.researched {
                continue;
            }

            if *money < def.cost_per_tick {
                state.researching = false;
                tracing::warn!(tech = %def.id, progress = state.progress, "research suspended");
                self.events.push(ResearchEvent::Suspended {
                    tech: def.id.clone(),
                    name: def.name.clone(),
                });
                continue;
            }

            *money -= def.cost_per_tick;
            state.progress += def.progress_per_tick(speed);

            if state.progress >= PROGRESS_COMPLETE {
                state.progress = PROGRESS_COMPLETE;
                state.researched = true;
                state.researching = false;
                tracing::info!(tech = %def.id, "research completed");
                self.events.push(ResearchEvent::Completed {
                    tech: def.id.clone(),
                    name: def.name.clone(),
                    effects: def.effects.clone(),
                });
            }
        }
    }

    /// Clear progress and in-flight research on everything not yet
    /// researched. Completed technologies are untouched.
    pub fn reset_unfinished(&mut self) {
        for state in self.states.iter_mut().filter(|s| !s.researched) {
            state.researching = false;
            state.progress = 0.0;
        }
    }

    /// Forget all research.
    pub fn reset_all(&mut self) {
        for state in &mut self.states {
            *state = TechState::default();
        }
        self.events.clear();
    }

    /// Overwrite the state of a known technology, normalizing contradictory
    /// flags. Unknown ids are ignored and reported as `false`.
    pub fn restore(&mut self, id: &TechId, mut state: TechState) -> bool {
        let Some(&i) = self.index.get(id) else {
            return false;
        };
        state.progress = state.progress.clamp(0.0, PROGRESS_COMPLETE);
        if state.researched {
            state.researching = false;
        }
        self.states[i] = state;
        true
    }

    // -- Event API --

    /// Drain all pending events.
    pub fn drain_events(&mut self) -> Vec<ResearchEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn pending_events(&self) -> &[ResearchEvent] {
        &self.events
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    fn tech(id: &str, cost: f64, per_tick: f64, prereqs: &[&str]) -> TechDefinition {
        TechDefinition {
            id: TechId::from(id),
            name: id.to_string(),
            description: String::new(),
            cost,
            cost_per_tick: per_tick,
            prerequisites: prereqs.iter().map(|p| TechId::from(*p)).collect(),
            effects: vec![],
        }
    }

    /// mining -> metallurgy -> plastics
    fn setup_chain() -> TechTree {
        let mut mining = tech("mining", 500.0, 10.0, &[]);
        mining.effects = vec![ResearchEffect::BoostOutput {
            machine: Some(MachineKindId::from("oreMiner")),
            factor: 1.5,
        }];
        TechTree::from_definitions([
            mining,
            tech("metallurgy", 1000.0, 25.0, &["mining"]),
            tech("plastics", 2000.0, 50.0, &["metallurgy"]),
        ])
        .unwrap()
    }

    fn id(s: &str) -> TechId {
        TechId::from(s)
    }

    // -----------------------------------------------------------------------
    // Registration
    // -----------------------------------------------------------------------

    #[test]
    fn duplicate_and_dangling_registrations_rejected() {
        let mut tree = setup_chain();
        assert_eq!(
            tree.register(tech("mining", 1.0, 1.0, &[])),
            Err(ResearchError::DuplicateId(id("mining")))
        );
        assert!(matches!(
            tree.register(tech("lasers", 1.0, 1.0, &["optics"])),
            Err(ResearchError::InvalidPrerequisite { .. })
        ));
        assert_eq!(
            tree.register(tech("free", 0.0, 1.0, &[])),
            Err(ResearchError::InvalidCost(id("free")))
        );
        assert_eq!(tree.len(), 3);
    }

    // -----------------------------------------------------------------------
    // Gating
    // -----------------------------------------------------------------------

    #[test]
    fn prerequisites_block_start() {
        let mut tree = setup_chain();
        assert!(!tree.is_available(&id("metallurgy")));
        assert_eq!(
            tree.start(&id("metallurgy"), 1e9),
            Err(ResearchError::PrerequisiteNotMet {
                tech: id("metallurgy"),
                prereq: id("mining"),
            })
        );
        assert!(!tree.is_researching(&id("metallurgy")));
    }

    #[test]
    fn start_requires_one_tick_of_money() {
        let mut tree = setup_chain();
        assert!(matches!(
            tree.start(&id("mining"), 9.99),
            Err(ResearchError::InsufficientFunds { .. })
        ));
        tree.start(&id("mining"), 10.0).unwrap();
        assert_eq!(
            tree.start(&id("mining"), 10.0),
            Err(ResearchError::AlreadyInProgress(id("mining")))
        );
        assert!(matches!(
            tree.drain_events().as_slice(),
            [ResearchEvent::Started { .. }]
        ));
    }

    #[test]
    fn unknown_tech_is_not_found() {
        let mut tree = setup_chain();
        assert_eq!(
            tree.start(&id("warp"), 1e9),
            Err(ResearchError::NotFound(id("warp")))
        );
        assert!(!tree.is_available(&id("warp")));
    }

    // -----------------------------------------------------------------------
    // Progress
    // -----------------------------------------------------------------------

    #[test]
    fn completes_after_cost_over_per_tick_ticks() {
        let mut tree = setup_chain();
        let mut money = 1000.0;
        tree.start(&id("mining"), money).unwrap();
        tree.drain_events();

        for _ in 0..49 {
            tree.advance(&mut money, 1.0);
        }
        assert!(!tree.is_researched(&id("mining")));
        assert_eq!(tree.ticks_remaining(&id("mining"), 1.0), Some(1));

        tree.advance(&mut money, 1.0);
        let state = tree.state(&id("mining")).unwrap();
        assert!(state.researched);
        assert!(!state.researching);
        assert_eq!(state.progress, 100.0);
        assert_eq!(money, 500.0);

        let events = tree.drain_events();
        assert!(matches!(
            events.as_slice(),
            [ResearchEvent::Completed { effects, .. }] if effects.len() == 1
        ));
        assert_eq!(
            tree.start(&id("mining"), money),
            Err(ResearchError::AlreadyResearched(id("mining")))
        );
    }

    #[test]
    fn game_speed_scales_progress_not_cost() {
        let mut tree = setup_chain();
        let mut money = 1000.0;
        tree.start(&id("mining"), money).unwrap();
        tree.advance(&mut money, 5.0);
        assert_eq!(tree.state(&id("mining")).unwrap().progress, 10.0);
        assert_eq!(money, 990.0);
    }

    #[test]
    fn short_funds_suspend_and_keep_progress() {
        let mut tree = setup_chain();
        let mut money = 25.0;
        tree.start(&id("mining"), money).unwrap();
        tree.drain_events();

        tree.advance(&mut money, 1.0);
        tree.advance(&mut money, 1.0);
        tree.advance(&mut money, 1.0);

        let state = tree.state(&id("mining")).unwrap();
        assert!(!state.researching);
        assert_eq!(state.progress, 4.0);
        assert_eq!(money, 5.0);
        assert!(matches!(
            tree.drain_events().as_slice(),
            [ResearchEvent::Suspended { .. }]
        ));

        // Resuming keeps the earlier progress.
        money = 100.0;
        tree.start(&id("mining"), money).unwrap();
        tree.advance(&mut money, 1.0);
        assert_eq!(tree.state(&id("mining")).unwrap().progress, 6.0);
    }

    #[test]
    fn reset_unfinished_keeps_completed() {
        let mut tree = setup_chain();
        let mut money = 1e6;
        tree.start(&id("mining"), money).unwrap();
        for _ in 0..50 {
            tree.advance(&mut money, 1.0);
        }
        tree.start(&id("metallurgy"), money).unwrap();
        tree.advance(&mut money, 1.0);

        tree.reset_unfinished();
        assert!(tree.is_researched(&id("mining")));
        let metallurgy = tree.state(&id("metallurgy")).unwrap();
        assert!(!metallurgy.researching);
        assert_eq!(metallurgy.progress, 0.0);
        assert_eq!(tree.researched_count(), 1);
    }

    // -----------------------------------------------------------------------
    // Persistence helpers
    // -----------------------------------------------------------------------

    #[test]
    fn restore_normalizes_and_skips_unknown() {
        let mut tree = setup_chain();
        let contradictory = TechState {
            researched: true,
            researching: true,
            progress: 140.0,
        };
        assert!(tree.restore(&id("mining"), contradictory));
        assert!(!tree.restore(&id("warp"), TechState::default()));

        let state = tree.state(&id("mining")).unwrap();
        assert!(!state.researching);
        assert_eq!(state.progress, 100.0);
    }

    #[test]
    fn state_serializes_in_camel_case() {
        let json = serde_json::to_string(&TechState {
            researched: false,
            researching: true,
            progress: 12.5,
        })
        .unwrap();
        assert_eq!(json, r#"{"researched":false,"researching":true,"progress":12.5}"#);
        let partial: TechState = serde_json::from_str(r#"{"progress":3.0}"#).unwrap();
        assert!(!partial.researching);
    }
}
