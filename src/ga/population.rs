//! Population seeding, re-randomization, and ranking.
//!
//! Building or rescheduling a plan is independent of every other plan, so
//! both can run on the rayon pool. Each plan gets its own `SmallRng` seeded
//! from the caller's generator, which keeps results identical whether or
//! not the work is parallel.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;

use crate::models::{FeatureCatalog, Plan, PlanParameters};

/// Builds `size` independently scheduled plans, each over its own copy of
/// the catalog.
pub fn seed_population<R: Rng>(
    size: usize,
    catalog: &FeatureCatalog,
    params: PlanParameters,
    rng: &mut R,
    parallel: bool,
) -> Vec<Plan> {
    let seeds: Vec<u64> = (0..size).map(|_| rng.random()).collect();
    let build = |(id, seed): (usize, u64)| {
        Plan::new(
            id,
            format!("Plan {id}"),
            params,
            catalog,
            &mut SmallRng::seed_from_u64(seed),
        )
    };

    if parallel {
        seeds.into_par_iter().enumerate().map(build).collect()
    } else {
        seeds.into_iter().enumerate().map(build).collect()
    }
}

/// Re-schedules every plan from scratch.
pub fn reschedule<R: Rng>(plans: &mut [Plan], rng: &mut R, parallel: bool) {
    let seeds: Vec<u64> = plans.iter().map(|_| rng.random()).collect();
    let run = |(plan, seed): (&mut Plan, u64)| plan.schedule(&mut SmallRng::seed_from_u64(seed));

    if parallel {
        plans.par_iter_mut().zip(seeds).for_each(run);
    } else {
        plans.iter_mut().zip(seeds).for_each(run);
    }
}

/// Sorts plans by descending fitness. The sort is stable.
pub fn rank(plans: &mut [Plan]) {
    plans.sort_by(|a, b| b.fitness_score().total_cmp(&a.fitness_score()));
}
