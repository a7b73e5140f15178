//! Roadmap domain models.
//!
//! Provides the data types for representing a feature-sequencing problem
//! and its candidate solutions.
//!
//! # Domain Mappings
//!
//! | u-roadmap | Product | Consulting | Infrastructure |
//! |-----------|---------|------------|----------------|
//! | Feature | Epic/Feature | Engagement Stream | Migration Wave |
//! | FeatureCatalog | Backlog | Proposal Scope | Migration Inventory |
//! | Plan | Release Roadmap | Delivery Plan | Cut-over Plan |
//! | Effort bandwidth | Team Capacity | Staffed FTEs | Ops Capacity |

mod catalog;
mod feature;
mod plan;

pub use catalog::FeatureCatalog;
pub use feature::{Feature, FeatureId, WORKING_DAYS_PER_YEAR};
pub use plan::{BANDWIDTH_PENALTY, Plan, PlanParameters, Violation};
