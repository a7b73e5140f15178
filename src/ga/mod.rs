//! GA-based roadmap optimization.
//!
//! Searches for the plan with the highest discounted cash-flow value by
//! evolving a population of fully scheduled plans.
//!
//! # Encoding
//!
//! A plan is its own genome: one `(start, daily_effort)` gene per feature,
//! ordered by feature ID. Operators rewrite genes in place and re-derive the
//! plan, so every individual in the population is always fully scored.
//!
//! # Submodules
//!
//! - [`operators`]: mutation and crossover
//! - [`population`]: seeding, re-randomization, ranking
//!
//! # Reference
//! Goldberg (1989), "Genetic Algorithms in Search, Optimization, and Machine Learning"

pub mod operators;
pub mod population;
mod runner;

pub use operators::{cross_over, mutate};
pub use population::{rank, reschedule, seed_population};
pub use runner::{GaConfig, GaResult, GaRunner, StopReason};
