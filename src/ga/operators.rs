//! Genetic operators on plans.
//!
//! Both operators change placements in place and leave every touched plan
//! fully re-derived and re-scored.
//!
//! # Usage
//!
//! ```
//! use rand::SeedableRng;
//! use rand::rngs::SmallRng;
//! use u_roadmap::ga::{cross_over, mutate};
//! use u_roadmap::models::{Feature, FeatureCatalog, Plan, PlanParameters};
//!
//! let catalog = FeatureCatalog::new(vec![
//!     Feature::new(1, "Search", 30.0, 3000.0, 10000.0),
//!     Feature::new(2, "Export", 20.0, 1500.0, 8000.0),
//! ])
//! .unwrap();
//! let mut rng = SmallRng::seed_from_u64(42);
//! let params = PlanParameters::default();
//! let mut a = Plan::new(0, "A", params, &catalog, &mut rng);
//! let mut b = Plan::new(1, "B", params, &catalog, &mut rng);
//!
//! mutate(&mut a, &mut rng);
//! let split = cross_over(&mut a, &mut b, &mut rng);
//! assert!(split < 2);
//! ```

use rand::Rng;

use crate::models::{FeatureId, Plan};

/// Raises one random feature's daily capacity by one unit and re-derives.
///
/// A local perturbation: the start is kept and the feature gets shorter,
/// possibly pushing the plan over its bandwidth.
pub fn mutate<R: Rng>(plan: &mut Plan, rng: &mut R) {
    let count = plan.feature_count();
    if count == 0 {
        return;
    }
    let Some(id) = plan.feature_ids().nth(rng.random_range(0..count)) else {
        return;
    };
    if let Some((start, daily_effort)) = plan.placement(id) {
        if let Err(err) = plan.reassign_feature(id, start, daily_effort.saturating_add(1)) {
            tracing::warn!(%err, "mutation skipped");
        }
    }
}

/// Single-point crossover over the feature-ID ordering.
///
/// Draws a split index uniformly; every feature whose ID ranks below the
/// split trades its `(start, daily_effort)` pair between the two plans.
/// Both plans are then re-derived.
///
/// # Returns
/// The split index.
pub fn cross_over<R: Rng>(plan_a: &mut Plan, plan_b: &mut Plan, rng: &mut R) -> usize {
    let count = plan_a.feature_count().min(plan_b.feature_count());
    if count == 0 {
        return 0;
    }
    let split = rng.random_range(0..count);
    let ids: Vec<FeatureId> = plan_a.feature_ids().take(split).collect();

    plan_a.exchange_placements(plan_b, &ids);
    plan_a.rederive();
    plan_b.rederive();
    split
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Feature, FeatureCatalog, PlanParameters};
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    fn sample_catalog() -> FeatureCatalog {
        FeatureCatalog::new(vec![
            Feature::new(1, "One", 30.0, 3000.0, 10000.0).with_child(5),
            Feature::new(2, "Two", 60.0, 6000.0, 24000.0).with_child(3).with_child(6),
            Feature::new(3, "Three", 90.0, 9000.0, 10000.0).with_child(4),
            Feature::new(4, "Four", 40.0, 4000.0, 25000.0),
            Feature::new(5, "Five", 90.0, 9000.0, 50000.0).with_child(4),
            Feature::new(6, "Six", 60.0, 6000.0, 10000.0).with_child(4),
        ])
        .unwrap()
    }

    fn efforts(plan: &Plan) -> Vec<u32> {
        plan.features().map(|f| f.avg_daily_effort()).collect()
    }

    #[test]
    fn test_mutate_bumps_one_feature() {
        let catalog = sample_catalog();
        let mut rng = SmallRng::seed_from_u64(42);
        let mut plan = Plan::new(0, "P", PlanParameters::default(), &catalog, &mut rng);
        let before = efforts(&plan);

        mutate(&mut plan, &mut rng);
        let after = efforts(&plan);

        let changed: Vec<usize> = (0..before.len()).filter(|&i| before[i] != after[i]).collect();
        assert_eq!(changed.len(), 1);
        assert_eq!(after[changed[0]], before[changed[0]] + 1);
    }

    #[test]
    fn test_mutate_rederives() {
        let catalog = sample_catalog();
        let mut rng = SmallRng::seed_from_u64(3);
        let mut plan = Plan::new(0, "P", PlanParameters::default(), &catalog, &mut rng);

        for _ in 0..30 {
            mutate(&mut plan, &mut rng);
            assert_eq!(plan.start(), 0);
            assert_eq!(plan.daily_effort().len() as i64, plan.duration());
            assert!(plan.daily_effort().iter().all(|&d| d > 0));
            if !plan.meets_dependencies() {
                assert_eq!(plan.fitness_score(), 0.0);
            }
        }
    }

    #[test]
    fn test_cross_over_preserves_effort_multiset() {
        let catalog = sample_catalog();
        let mut rng = SmallRng::seed_from_u64(42);

        for seed in 0..20 {
            let mut a = Plan::new(0, "A", PlanParameters::default(), &catalog, &mut rng);
            let mut b = Plan::new(1, "B", PlanParameters::default(), &catalog, &mut rng);
            let (ea, eb) = (efforts(&a), efforts(&b));

            let split = cross_over(&mut a, &mut b, &mut rng);
            let (na, nb) = (efforts(&a), efforts(&b));

            for i in 0..6 {
                if i < split {
                    assert_eq!(na[i], eb[i], "seed {seed}");
                    assert_eq!(nb[i], ea[i], "seed {seed}");
                } else {
                    assert_eq!(na[i], ea[i], "seed {seed}");
                    assert_eq!(nb[i], eb[i], "seed {seed}");
                }
                let mut pre = [ea[i], eb[i]];
                let mut post = [na[i], nb[i]];
                pre.sort_unstable();
                post.sort_unstable();
                assert_eq!(pre, post);
            }
        }
    }

    #[test]
    fn test_cross_over_rescores_both() {
        let catalog = sample_catalog();
        let mut rng = SmallRng::seed_from_u64(8);
        let mut a = Plan::new(0, "A", PlanParameters::default(), &catalog, &mut rng);
        let mut b = Plan::new(1, "B", PlanParameters::default(), &catalog, &mut rng);

        cross_over(&mut a, &mut b, &mut rng);
        for plan in [&a, &b] {
            assert_eq!(plan.start(), 0);
            assert!(plan.daily_effort().iter().all(|&d| d > 0));
            if !plan.meets_dependencies() {
                assert_eq!(plan.fitness_score(), 0.0);
            }
        }
    }

    #[test]
    fn test_cross_over_split_in_range() {
        let catalog = sample_catalog();
        let mut rng = SmallRng::seed_from_u64(99);
        let mut a = Plan::new(0, "A", PlanParameters::default(), &catalog, &mut rng);
        let mut b = Plan::new(1, "B", PlanParameters::default(), &catalog, &mut rng);

        for _ in 0..50 {
            assert!(cross_over(&mut a, &mut b, &mut rng) < 6);
        }
    }
}
