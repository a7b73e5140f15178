//! Value-driven feature sequencing for the U-Engine ecosystem.
//!
//! Orders interdependent features into a roadmap that maximizes discounted
//! cash-flow value under a daily effort bandwidth, using a genetic search
//! over fully scheduled candidate plans.
//!
//! # Modules
//!
//! - **`models`**: Domain types: `Feature`, `FeatureCatalog`, `Plan`,
//!   `PlanParameters`, `Violation`
//! - **`validation`**: Catalog integrity checks (duplicate IDs, unknown
//!   references, DAG cycles, economics)
//! - **`ga`**: Population seeding, mutation, crossover, generational driver
//! - **`finance`**: NPV and payback helpers
//! - **`report`**: Gantt/effort renderer inputs and plan KPIs
//!
//! # Example
//!
//! ```
//! use u_roadmap::ga::{GaConfig, GaRunner};
//! use u_roadmap::models::{Feature, FeatureCatalog};
//!
//! let catalog = FeatureCatalog::new(vec![
//!     Feature::new(1, "Accounts", 30.0, 3000.0, 10000.0).with_child(2),
//!     Feature::new(2, "Payments", 60.0, 6000.0, 24000.0),
//! ])?;
//! let config = GaConfig::default()
//!     .with_population_size(30)
//!     .with_max_generations(10)
//!     .with_seed(42);
//! let result = GaRunner::run(&catalog, &config)?;
//! assert!(result.best.meets_dependencies() || result.best_fitness == 0.0);
//! # Ok::<(), u_roadmap::RoadmapError>(())
//! ```
//!
//! # References
//!
//! - Goldberg (1989), "Genetic Algorithms in Search, Optimization, and Machine Learning"
//! - Brealey, Myers & Allen (2020), "Principles of Corporate Finance", Ch. 2 (NPV)

pub mod error;
pub mod finance;
pub mod ga;
pub mod models;
pub mod report;
pub mod validation;

pub use error::{Result, RoadmapError};
