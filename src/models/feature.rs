//! Feature (work item) model.
//!
//! A feature is an atomic unit of delivery with an effort, a cost, and an
//! annual revenue run-rate once released. Features carry dependency edges
//! (parents must finish before a feature starts) and a placement: a start
//! day and a daily capacity draw, from which duration and end follow.
//!
//! # Time Representation
//! Days are abstract integer offsets from the plan start (day 0). Start and
//! end are both inclusive.

use serde::{Deserialize, Serialize};

/// Feature identifier.
pub type FeatureId = u32;

/// Working days per year used to spread annual revenue into a daily rate.
pub const WORKING_DAYS_PER_YEAR: f64 = 240.0;

/// A feature to be placed on the roadmap.
///
/// Static fields (`id`, `name`, economics, edges) are fixed at catalog load.
/// Placement fields are derived and only change through [`Feature::place`],
/// [`Feature::shift`] and [`Feature::reassign_effort`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Feature {
    /// Unique feature identifier.
    pub id: FeatureId,
    /// Human-readable name.
    pub name: String,
    /// Effort to complete (person-days).
    pub effort: f64,
    /// Total delivery cost.
    pub cost: f64,
    /// Annual revenue once released.
    pub revenue: f64,
    /// Features that must finish before this one may start.
    #[serde(default)]
    pub parents: Vec<FeatureId>,
    /// Features that may not start before this one finishes.
    #[serde(default)]
    pub children: Vec<FeatureId>,
    #[serde(skip)]
    start: i64,
    #[serde(skip)]
    end: i64,
    #[serde(skip)]
    duration: i64,
    #[serde(skip)]
    avg_daily_effort: u32,
    #[serde(skip)]
    avg_daily_cost: f64,
}

impl Feature {
    /// Creates an unplaced feature with no dependency edges.
    pub fn new(
        id: FeatureId,
        name: impl Into<String>,
        effort: f64,
        cost: f64,
        revenue: f64,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            effort,
            cost,
            revenue,
            parents: Vec::new(),
            children: Vec::new(),
            start: 0,
            end: 0,
            duration: 0,
            avg_daily_effort: 0,
            avg_daily_cost: 0.0,
        }
    }

    /// Adds a prerequisite feature.
    pub fn with_parent(mut self, parent: FeatureId) -> Self {
        self.parents.push(parent);
        self
    }

    /// Adds a dependent feature.
    pub fn with_child(mut self, child: FeatureId) -> Self {
        self.children.push(child);
        self
    }

    /// Places the feature at `start` with a capacity draw of `daily_effort`.
    ///
    /// Duration is `floor(effort / daily_effort)`, clamped to at least one day.
    /// `daily_effort` must be positive.
    pub fn place(&mut self, start: i64, daily_effort: u32) {
        debug_assert!(daily_effort > 0, "daily effort must be positive");
        self.start = start;
        self.avg_daily_effort = daily_effort;
        self.duration = ((self.effort / daily_effort as f64).floor() as i64).max(1);
        self.end = self.start + self.duration - 1;
        self.avg_daily_cost = self.cost / self.duration as f64;
    }

    /// Translates the placement by `delta` days. Duration is unchanged.
    pub fn shift(&mut self, delta: i64) {
        self.start += delta;
        self.end += delta;
    }

    /// Re-derives duration and end from a new capacity draw, keeping the start.
    pub fn reassign_effort(&mut self, daily_effort: u32) {
        self.place(self.start, daily_effort);
    }

    /// First active day (inclusive).
    #[inline]
    pub fn start(&self) -> i64 {
        self.start
    }

    /// Last active day (inclusive).
    #[inline]
    pub fn end(&self) -> i64 {
        self.end
    }

    /// Active days.
    #[inline]
    pub fn duration(&self) -> i64 {
        self.duration
    }

    /// Assigned capacity draw per active day.
    #[inline]
    pub fn avg_daily_effort(&self) -> u32 {
        self.avg_daily_effort
    }

    /// Cost spent per active day.
    #[inline]
    pub fn avg_daily_cost(&self) -> f64 {
        self.avg_daily_cost
    }

    /// Revenue accrued per day once released.
    #[inline]
    pub fn avg_daily_revenue(&self) -> f64 {
        self.revenue / WORKING_DAYS_PER_YEAR
    }

    /// Whether the feature has no prerequisites.
    pub fn is_root(&self) -> bool {
        self.parents.is_empty()
    }

    /// Whether no other feature depends on this one.
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}
