//! Tycoon Core -- the economic building blocks of the factory simulation.
//!
//! This crate holds everything that does not depend on the research graph
//! or on persistence: the resource ledger, machine instances and their
//! production cycle, the drifting market, prestige arithmetic, lifetime
//! statistics, achievements, notifications and display formatting.
//!
//! # Production Cycle
//!
//! Every tick represents 0.1 s of simulated time. A running machine draws
//! `inputRate × level × 0.1` of each input from the [`resource::Ledger`]. If
//! every input is covered they are withdrawn together and progress advances
//! by 10; otherwise nothing is withdrawn and progress resets. At 100 the
//! machine adds `outputRate × level × multiplier` of each output.
//!
//! # Key Types
//!
//! - [`resource::Ledger`] -- quantity owned of every [`resource::ResourceKind`].
//! - [`machine::MachineRegistry`] -- owned instances keyed by
//!   [`id::MachineId`] plus the kinds unlocked for purchase.
//! - [`market::Market`] -- listed sell prices and selected sell amounts.
//! - [`achievement::AchievementTracker`] -- progress against a
//!   [`achievement::MetricSource`].
//! - [`prestige::Prestige`] -- multiplier, points and next cost.
//! - [`rng::SimRng`] -- seedable SplitMix64 for deterministic drift.

pub mod achievement;
pub mod format;
pub mod id;
pub mod machine;
pub mod market;
pub mod notify;
pub mod prestige;
pub mod resource;
pub mod rng;
pub mod stats;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
