//! Plan (candidate roadmap) model.
//!
//! A plan owns an independent copy of every catalog feature and assigns each
//! a placement. From the placements it derives time and effort aggregates,
//! a daily effort profile, a periodic cash-flow series, and a fitness score.
//!
//! # Derivation Pipeline
//!
//! Every change of placement is followed by the same sequence:
//! 1. Normalize: shift all features so the earliest start is day 0
//! 2. Derive duration, totals, and the daily effort profile
//! 3. Compact: remove days with zero aggregate demand
//! 4. Re-derive, then build the cash-flow series
//! 5. Check dependencies and score
//!
//! # Scoring
//!
//! | Dependencies | Bandwidth | Fitness |
//! |--------------|-----------|---------|
//! | violated | any | 0 |
//! | met | within | NPV |
//! | met | exceeded | 0.9 × NPV |

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::{Feature, FeatureCatalog, FeatureId};
use crate::error::{Result, RoadmapError};
use crate::finance::npv;

/// Multiplier applied to the NPV of a plan that exceeds its bandwidth.
pub const BANDWIDTH_PENALTY: f64 = 0.9;

/// Policy parameters shared by every plan in a search.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlanParameters {
    /// Maximum aggregate daily effort.
    pub effort_bandwidth: u32,
    /// Number of cash-flow periods.
    pub no_periods: usize,
    /// Days per cash-flow period.
    pub period_duration: usize,
    /// Discount rate applied once per period (fraction, not %).
    pub discount_rate: f64,
}

impl Default for PlanParameters {
    fn default() -> Self {
        Self {
            effort_bandwidth: 5,
            no_periods: 24,
            period_duration: 65,
            discount_rate: 0.05,
        }
    }
}

impl PlanParameters {
    /// Sets the effort bandwidth.
    pub fn with_effort_bandwidth(mut self, bandwidth: u32) -> Self {
        self.effort_bandwidth = bandwidth;
        self
    }

    /// Sets the number of cash-flow periods.
    pub fn with_no_periods(mut self, no_periods: usize) -> Self {
        self.no_periods = no_periods;
        self
    }

    /// Sets the period length in days.
    pub fn with_period_duration(mut self, days: usize) -> Self {
        self.period_duration = days;
        self
    }

    /// Sets the per-period discount rate.
    pub fn with_discount_rate(mut self, rate: f64) -> Self {
        self.discount_rate = rate;
        self
    }

    /// Cash-flow horizon in days.
    pub fn horizon_days(&self) -> usize {
        self.no_periods * self.period_duration
    }

    /// Rejects non-positive bandwidth or horizon shape and unusable rates.
    pub fn validate(&self) -> Result<()> {
        if self.effort_bandwidth == 0 {
            return Err(RoadmapError::parameter("effort_bandwidth", "must be positive"));
        }
        if self.no_periods == 0 {
            return Err(RoadmapError::parameter("no_periods", "must be positive"));
        }
        if self.period_duration == 0 {
            return Err(RoadmapError::parameter("period_duration", "must be positive"));
        }
        if !self.discount_rate.is_finite() || self.discount_rate <= -1.0 {
            return Err(RoadmapError::parameter(
                "discount_rate",
                format!("must be finite and greater than -1, got {}", self.discount_rate),
            ));
        }
        Ok(())
    }
}

/// A constraint violation found while deriving a plan.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Violation {
    /// `parent` finishes after `child` was due to start.
    Precedence {
        /// Prerequisite feature.
        parent: FeatureId,
        /// Dependent feature.
        child: FeatureId,
    },
    /// Aggregate demand exceeds the bandwidth; reported for the peak day.
    OverBandwidth {
        /// Day offset of the peak.
        day: i64,
        /// Aggregate demand on that day.
        demand: u64,
    },
}

/// A candidate schedule over the whole feature catalog.
#[derive(Debug, Clone)]
pub struct Plan {
    /// Plan identifier.
    pub id: usize,
    /// Human-readable name.
    pub name: String,
    params: PlanParameters,
    features: BTreeMap<FeatureId, Feature>,
    order: Arc<[FeatureId]>,
    start: i64,
    end: i64,
    duration: i64,
    max_duration: i64,
    effort: f64,
    cost: f64,
    value: f64,
    daily_effort: Vec<u64>,
    daily_cash_flow: Vec<f64>,
    period_cost: Vec<f64>,
    period_revenue: Vec<f64>,
    period_cash_flow: Vec<f64>,
    meets_dependencies: bool,
    in_bandwidth: bool,
    violations: Vec<Violation>,
    fitness_score: f64,
}

impl Plan {
    /// Creates a plan over its own copy of `catalog` and schedules it.
    pub fn new<R: Rng>(
        id: usize,
        name: impl Into<String>,
        params: PlanParameters,
        catalog: &FeatureCatalog,
        rng: &mut R,
    ) -> Self {
        let mut plan = Self {
            id,
            name: name.into(),
            params,
            features: catalog.to_owned_features(),
            order: catalog.placement_order().into(),
            start: 0,
            end: 0,
            duration: 0,
            max_duration: 0,
            effort: 0.0,
            cost: 0.0,
            value: 0.0,
            daily_effort: Vec::new(),
            daily_cash_flow: Vec::new(),
            period_cost: Vec::new(),
            period_revenue: Vec::new(),
            period_cash_flow: Vec::new(),
            meets_dependencies: true,
            in_bandwidth: true,
            violations: Vec::new(),
            fitness_score: 0.0,
        };
        plan.compute_max_duration();
        plan.schedule(rng);
        plan
    }

    /// Sets `max_duration` to the serial sum of all efforts.
    ///
    /// Only used to bound random start draws.
    pub fn compute_max_duration(&mut self) {
        let serial: f64 = self.features.values().map(|f| f.effort).sum();
        self.max_duration = serial.ceil() as i64;
    }

    /// Re-places every feature with a randomly chosen strategy and re-derives.
    ///
    /// Unconstrained and dependency-aware placement are equally likely.
    pub fn schedule<R: Rng>(&mut self, rng: &mut R) {
        if rng.random_bool(0.5) {
            self.place_unconstrained(rng);
        } else {
            self.place_linked(rng);
        }
        self.rederive();
    }

    /// Places one feature directly and re-derives the plan.
    ///
    /// # Errors
    /// [`RoadmapError::UnknownFeature`] if the plan has no such feature, or
    /// [`RoadmapError::InvalidParameter`] if `daily_effort` is zero.
    pub fn reassign_feature(
        &mut self,
        id: FeatureId,
        start: i64,
        daily_effort: u32,
    ) -> Result<()> {
        self.set_placement(id, start, daily_effort)?;
        self.rederive();
        Ok(())
    }

    /// Runs the derivation pipeline: normalize, compact, derive, validate, score.
    pub fn rederive(&mut self) {
        self.normalize_start();
        self.compute_duration();
        self.compute_daily_effort();
        self.remove_idle_time();
        self.compute_duration();
        self.compute_daily_effort();
        self.compute_cashflow();
        self.check_dependencies();
        self.score();
    }

    /// Current `(start, daily_effort)` of a feature.
    pub fn placement(&self, id: FeatureId) -> Option<(i64, u32)> {
        self.features
            .get(&id)
            .map(|f| (f.start(), f.avg_daily_effort()))
    }

    /// Places a feature without re-deriving the plan.
    pub(crate) fn set_placement(
        &mut self,
        id: FeatureId,
        start: i64,
        daily_effort: u32,
    ) -> Result<()> {
        if daily_effort == 0 {
            return Err(RoadmapError::parameter("daily_effort", "must be positive"));
        }
        let feature = self
            .features
            .get_mut(&id)
            .ok_or(RoadmapError::UnknownFeature(id))?;
        feature.place(start, daily_effort);
        Ok(())
    }

    /// Exchanges the `(start, daily_effort)` of every feature in `ids` with
    /// `other`. Neither plan is re-derived.
    pub(crate) fn exchange_placements(&mut self, other: &mut Plan, ids: &[FeatureId]) {
        for id in ids {
            if let (Some(mine), Some(theirs)) =
                (self.features.get_mut(id), other.features.get_mut(id))
            {
                let (start, daily_effort) = (mine.start(), mine.avg_daily_effort());
                mine.place(theirs.start(), theirs.avg_daily_effort());
                theirs.place(start, daily_effort);
            }
        }
    }

    // ======================== Placement ========================

    /// Every feature draws an independent start and capacity, ignoring
    /// dependencies. Infeasible placements are left for scoring to punish.
    fn place_unconstrained<R: Rng>(&mut self, rng: &mut R) {
        let bandwidth = self.params.effort_bandwidth;
        let max_duration = self.max_duration;
        for feature in self.features.values_mut() {
            let start = random_start(max_duration, feature.effort, rng);
            feature.place(start, random_capacity(bandwidth, rng));
        }
    }

    /// Roots draw random placements; every dependent starts the day after
    /// its latest prerequisite ends, with its own capacity draw.
    fn place_linked<R: Rng>(&mut self, rng: &mut R) {
        let bandwidth = self.params.effort_bandwidth;
        let order = Arc::clone(&self.order);

        for id in order.iter() {
            let Some(feature) = self.features.get(id) else {
                continue;
            };
            let start = if feature.is_root() {
                random_start(self.max_duration, feature.effort, rng)
            } else {
                feature
                    .parents
                    .iter()
                    .filter_map(|p| self.features.get(p))
                    .map(Feature::end)
                    .max()
                    .map_or(0, |end| end + 1)
            };
            let daily_effort = random_capacity(bandwidth, rng);
            if let Some(feature) = self.features.get_mut(id) {
                feature.place(start, daily_effort);
            }
        }
    }

    // ======================== Derivation ========================

    fn normalize_start(&mut self) {
        let Some(earliest) = self.features.values().map(Feature::start).min() else {
            return;
        };
        if earliest != 0 {
            for feature in self.features.values_mut() {
                feature.shift(-earliest);
            }
        }
    }

    /// Removes days with zero aggregate demand by shifting every later
    /// feature one day earlier per idle day.
    ///
    /// Idle days are processed from the last to the first; going forward
    /// would invalidate the remaining indices after each shift.
    fn remove_idle_time(&mut self) {
        let idle_days: Vec<i64> = self
            .daily_effort
            .iter()
            .enumerate()
            .filter(|&(_, &demand)| demand == 0)
            .map(|(i, _)| self.start + i as i64)
            .collect();

        for &day in idle_days.iter().rev() {
            for feature in self.features.values_mut() {
                if feature.start() > day {
                    feature.shift(-1);
                }
            }
        }
    }

    /// Plan span and totals over all features.
    pub fn compute_duration(&mut self) {
        self.start = self.features.values().map(Feature::start).min().unwrap_or(0);
        self.end = self.features.values().map(Feature::end).max().unwrap_or(0);
        self.duration = self.end - self.start + 1;
        self.effort = self.features.values().map(|f| f.effort).sum();
        self.cost = self.features.values().map(|f| f.cost).sum();
        self.value = self.features.values().map(|f| f.revenue).sum();
    }

    /// Builds the daily effort profile and checks it against the bandwidth.
    pub fn compute_daily_effort(&mut self) {
        let len = self.duration.max(0) as usize;
        self.daily_effort.clear();
        self.daily_effort.resize(len, 0);

        for feature in self.features.values() {
            let from = (feature.start() - self.start).max(0) as usize;
            let to = ((feature.end() - self.start + 1).max(0) as usize).min(len);
            for demand in &mut self.daily_effort[from.min(to)..to] {
                *demand += u64::from(feature.avg_daily_effort());
            }
        }

        self.violations
            .retain(|v| !matches!(v, Violation::OverBandwidth { .. }));
        // Earliest day with the highest demand
        let peak = self
            .daily_effort
            .iter()
            .copied()
            .enumerate()
            .fold(None, |best: Option<(usize, u64)>, (day, demand)| match best {
                Some((_, top)) if top >= demand => best,
                _ => Some((day, demand)),
            });
        self.in_bandwidth = match peak {
            Some((day, demand)) if demand > u64::from(self.params.effort_bandwidth) => {
                self.violations.push(Violation::OverBandwidth {
                    day: self.start + day as i64,
                    demand,
                });
                false
            }
            _ => true,
        };
    }

    /// Builds daily and per-period cash flows over the horizon.
    ///
    /// While active a feature costs `avg_daily_cost` per day; on every day
    /// after its end, through the end of the horizon, it earns
    /// `avg_daily_revenue`.
    pub fn compute_cashflow(&mut self) {
        let period_duration = self.params.period_duration.max(1);
        let horizon = self.params.horizon_days() as i64;

        let mut daily_cost = vec![0.0; horizon as usize];
        let mut daily_revenue = vec![0.0; horizon as usize];

        for feature in self.features.values() {
            let cost_from = feature.start().clamp(0, horizon);
            let cost_to = (feature.end() + 1).clamp(0, horizon);
            for day in cost_from..cost_to {
                daily_cost[day as usize] += feature.avg_daily_cost();
            }
            let revenue_from = (feature.end() + 1).clamp(0, horizon);
            for day in revenue_from..horizon {
                daily_revenue[day as usize] += feature.avg_daily_revenue();
            }
        }

        self.daily_cash_flow = daily_revenue
            .iter()
            .zip(&daily_cost)
            .map(|(revenue, cost)| revenue - cost)
            .collect();
        self.period_cost = daily_cost
            .chunks(period_duration)
            .map(|c| c.iter().sum())
            .collect();
        self.period_revenue = daily_revenue
            .chunks(period_duration)
            .map(|c| c.iter().sum())
            .collect();
        self.period_cash_flow = self
            .daily_cash_flow
            .chunks(period_duration)
            .map(|c| c.iter().sum())
            .collect();
    }

    /// Flags every prerequisite that ends after a dependent starts.
    pub fn check_dependencies(&mut self) {
        self.violations
            .retain(|v| !matches!(v, Violation::Precedence { .. }));

        for feature in self.features.values().filter(|f| !f.is_leaf()) {
            for child_id in &feature.children {
                if let Some(child) = self.features.get(child_id) {
                    if feature.end() > child.start() {
                        self.violations.push(Violation::Precedence {
                            parent: feature.id,
                            child: *child_id,
                        });
                    }
                }
            }
        }

        self.meets_dependencies = !self
            .violations
            .iter()
            .any(|v| matches!(v, Violation::Precedence { .. }));
    }

    /// Scores the plan from its period cash flow and constraint flags.
    pub fn score(&mut self) {
        self.fitness_score = if !self.meets_dependencies {
            0.0
        } else {
            let value = npv(self.params.discount_rate, &self.period_cash_flow);
            if self.in_bandwidth {
                value
            } else {
                BANDWIDTH_PENALTY * value
            }
        };
    }

    // ======================== Accessors ========================

    /// Policy parameters.
    pub fn params(&self) -> &PlanParameters {
        &self.params
    }

    /// Looks up a feature.
    pub fn feature(&self, id: FeatureId) -> Option<&Feature> {
        self.features.get(&id)
    }

    /// Features in ascending ID order.
    pub fn features(&self) -> impl Iterator<Item = &Feature> {
        self.features.values()
    }

    /// Feature IDs in ascending order.
    pub fn feature_ids(&self) -> impl Iterator<Item = FeatureId> + '_ {
        self.features.keys().copied()
    }

    /// Number of features.
    pub fn feature_count(&self) -> usize {
        self.features.len()
    }

    /// First day (always 0 after derivation).
    pub fn start(&self) -> i64 {
        self.start
    }

    /// Last day any feature is active.
    pub fn end(&self) -> i64 {
        self.end
    }

    /// Span in days.
    pub fn duration(&self) -> i64 {
        self.duration
    }

    /// Serial sum of efforts.
    pub fn max_duration(&self) -> i64 {
        self.max_duration
    }

    /// Total effort.
    pub fn effort(&self) -> f64 {
        self.effort
    }

    /// Total cost.
    pub fn cost(&self) -> f64 {
        self.cost
    }

    /// Total annual revenue.
    pub fn value(&self) -> f64 {
        self.value
    }

    /// Aggregate demand per day of the plan span.
    pub fn daily_effort(&self) -> &[u64] {
        &self.daily_effort
    }

    /// Net cash flow per day of the horizon.
    pub fn daily_cash_flow(&self) -> &[f64] {
        &self.daily_cash_flow
    }

    /// Delivery cost per period.
    pub fn period_cost(&self) -> &[f64] {
        &self.period_cost
    }

    /// Revenue per period.
    pub fn period_revenue(&self) -> &[f64] {
        &self.period_revenue
    }

    /// Net cash flow per period.
    pub fn period_cash_flow(&self) -> &[f64] {
        &self.period_cash_flow
    }

    /// Whether every prerequisite ends no later than its dependents start.
    pub fn meets_dependencies(&self) -> bool {
        self.meets_dependencies
    }

    /// Whether peak daily demand stays within the bandwidth.
    pub fn in_bandwidth(&self) -> bool {
        self.in_bandwidth
    }

    /// Violations found by the last derivation.
    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }

    /// Fitness (higher = better).
    pub fn fitness_score(&self) -> f64 {
        self.fitness_score
    }
}

impl fmt::Display for Plan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Plan id: {}, name: {}, start: {}, end: {}, score: {:.2}",
            self.id, self.name, self.start, self.end, self.fitness_score
        )
    }
}

/// Uniform start in `[1, max_duration / 2 - effort)`, at least one day wide.
fn random_start<R: Rng>(max_duration: i64, effort: f64, rng: &mut R) -> i64 {
    let upper = (max_duration as f64 / 2.0 - effort) as i64;
    rng.random_range(1..upper.max(2))
}

/// Uniform capacity in `[1, bandwidth]`.
fn random_capacity<R: Rng>(bandwidth: u32, rng: &mut R) -> u32 {
    rng.random_range(1..=bandwidth.max(1))
}
