//! Plan reporting: renderer inputs and quality metrics (KPIs).
//!
//! Renderers (Gantt charts, effort bar charts) live outside this crate and
//! consume the row types below; nothing here feeds back into the search.
//!
//! # Metrics
//!
//! | Metric | Definition |
//! |--------|-----------|
//! | Duration | Days from first start to last end |
//! | Peak Daily Effort | Highest aggregate demand on any day |
//! | Avg Utilization | Mean daily demand / bandwidth |
//! | NPV | NPV of the period cash flow, before any penalty |
//! | Payback Period | First period with non-negative cumulative cash flow |

use serde::{Deserialize, Serialize};

use crate::finance::{npv, payback_period};
use crate::models::{FeatureId, Plan};

/// One bar of a Gantt chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GanttRow {
    /// Feature ID.
    pub id: FeatureId,
    /// Feature name.
    pub name: String,
    /// First day.
    pub start: i64,
    /// Days.
    pub duration: i64,
}

/// Per-feature placement in the final plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureTimeline {
    /// Feature ID.
    pub id: FeatureId,
    /// First day (inclusive).
    pub start: i64,
    /// Last day (inclusive).
    pub end: i64,
    /// Capacity drawn per day.
    pub avg_daily_effort: u32,
}

/// Gantt rows in feature-ID order.
pub fn gantt_rows(plan: &Plan) -> Vec<GanttRow> {
    plan.features()
        .map(|f| GanttRow {
            id: f.id,
            name: f.name.clone(),
            start: f.start(),
            duration: f.duration(),
        })
        .collect()
}

/// Placements in feature-ID order.
pub fn timelines(plan: &Plan) -> Vec<FeatureTimeline> {
    plan.features()
        .map(|f| FeatureTimeline {
            id: f.id,
            start: f.start(),
            end: f.end(),
            avg_daily_effort: f.avg_daily_effort(),
        })
        .collect()
}

/// Plan performance indicators.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanKpi {
    /// Plan span (days).
    pub duration_days: i64,
    /// Highest aggregate daily demand.
    pub peak_daily_effort: u64,
    /// Mean daily demand over the span divided by the bandwidth.
    pub avg_utilization: f64,
    /// Total delivery cost.
    pub total_cost: f64,
    /// Total annual revenue.
    pub total_value: f64,
    /// NPV of the period cash flow, before any penalty.
    pub npv: f64,
    /// Fitness score.
    pub fitness_score: f64,
    /// First period whose cumulative cash flow is non-negative.
    pub payback_period: Option<usize>,
    /// Whether every dependency is respected.
    pub meets_dependencies: bool,
    /// Whether demand stays within the bandwidth.
    pub in_bandwidth: bool,
}

impl PlanKpi {
    /// Computes KPIs from a derived plan.
    pub fn calculate(plan: &Plan) -> Self {
        let daily = plan.daily_effort();
        let peak_daily_effort = daily.iter().copied().max().unwrap_or(0);
        let avg_utilization = if daily.is_empty() {
            0.0
        } else {
            let total: f64 = daily.iter().map(|&d| d as f64).sum();
            total / daily.len() as f64 / f64::from(plan.params().effort_bandwidth.max(1))
        };

        Self {
            duration_days: plan.duration(),
            peak_daily_effort,
            avg_utilization,
            total_cost: plan.cost(),
            total_value: plan.value(),
            npv: npv(plan.params().discount_rate, plan.period_cash_flow()),
            fitness_score: plan.fitness_score(),
            payback_period: payback_period(plan.period_cash_flow()),
            meets_dependencies: plan.meets_dependencies(),
            in_bandwidth: plan.in_bandwidth(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Feature, FeatureCatalog, PlanParameters};
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    fn placed_plan() -> Plan {
        let catalog = FeatureCatalog::new(vec![
            Feature::new(1, "One", 30.0, 3000.0, 10000.0).with_child(2),
            Feature::new(2, "Two", 20.0, 2000.0, 24000.0),
        ])
        .unwrap();
        let params = PlanParameters::default()
            .with_effort_bandwidth(10)
            .with_no_periods(6)
            .with_period_duration(10);
        let mut rng = SmallRng::seed_from_u64(42);
        let mut plan = Plan::new(0, "P", params, &catalog, &mut rng);
        plan.reassign_feature(1, 0, 5).unwrap(); // 0..=5
        plan.reassign_feature(2, 6, 4).unwrap(); // 6..=10
        plan
    }

    #[test]
    fn test_gantt_rows() {
        let plan = placed_plan();
        let rows = gantt_rows(&plan);
        assert_eq!(
            rows,
            vec![
                GanttRow { id: 1, name: "One".into(), start: 0, duration: 6 },
                GanttRow { id: 2, name: "Two".into(), start: 6, duration: 5 },
            ]
        );
    }

    #[test]
    fn test_timelines() {
        let plan = placed_plan();
        let rows = timelines(&plan);
        assert_eq!(rows[1], FeatureTimeline { id: 2, start: 6, end: 10, avg_daily_effort: 4 });
    }

    #[test]
    fn test_kpi() {
        let plan = placed_plan();
        let kpi = PlanKpi::calculate(&plan);

        assert_eq!(kpi.duration_days, 11);
        assert_eq!(kpi.peak_daily_effort, 5);
        // (6 * 5 + 5 * 4) / 11 / 10
        assert!((kpi.avg_utilization - 50.0 / 110.0).abs() < 1e-10);
        assert!((kpi.total_cost - 5000.0).abs() < 1e-10);
        assert!((kpi.total_value - 34000.0).abs() < 1e-10);
        assert!((kpi.npv - kpi.fitness_score).abs() < 1e-9);
        assert!(kpi.meets_dependencies);
        assert!(kpi.in_bandwidth);
        assert!(kpi.payback_period.is_some());
    }

    #[test]
    fn test_rows_serialize() {
        let plan = placed_plan();
        let json = serde_json::to_string(&gantt_rows(&plan)).unwrap();
        assert!(json.contains(r#""name":"One""#));
    }
}
