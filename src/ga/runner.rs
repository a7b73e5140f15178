//! Generational search driver.
//!
//! Each generation ranks the population and splits it into four contiguous
//! bands by rank:
//!
//! | Band | Ranks (n = population) | Operator |
//! |------|------------------------|----------|
//! | Elite | `[0, 2)` | kept as is |
//! | Low | `[2, n/5)` | [`mutate`] |
//! | Mid | `[n/5, 2n/5)` | [`cross_over`] of parents from the previous generation's top quarter |
//! | Tail | `[2n/5, n)` | rescheduled from scratch |
//!
//! The elite band is never touched, so the best fitness never decreases
//! from one generation to the next.
//!
//! # Stopping
//!
//! After `min_generations`, the search stops once the best fitness is
//! positive and unchanged for `stall_generations` consecutive generations.
//! Otherwise it runs to `max_generations`, or until `time_limit` elapses
//! (checked between generations only).

use std::ops::Range;
use std::time::{Duration, Instant};

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::{Level, event, instrument};

use super::operators::{cross_over, mutate};
use super::population::{rank, reschedule, seed_population};
use crate::error::{Result, RoadmapError};
use crate::models::{FeatureCatalog, Plan, PlanParameters};

/// Number of top-ranked plans carried over unchanged.
const ELITE_COUNT: usize = 2;

/// Search configuration.
///
/// # Example
/// ```
/// use u_roadmap::ga::GaConfig;
/// use u_roadmap::models::PlanParameters;
///
/// let config = GaConfig::default()
///     .with_population_size(100)
///     .with_max_generations(50)
///     .with_seed(42)
///     .with_plan_parameters(PlanParameters::default().with_effort_bandwidth(8));
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GaConfig {
    /// Number of plans per generation.
    pub population_size: usize,
    /// Generation budget.
    pub max_generations: usize,
    /// Generations to run before convergence may stop the search.
    pub min_generations: usize,
    /// Consecutive identical best scores that count as convergence.
    pub stall_generations: usize,
    /// RNG seed; `None` seeds from the OS.
    pub seed: Option<u64>,
    /// Wall-clock budget, checked between generations.
    pub time_limit: Option<Duration>,
    /// Seed and reschedule plans on the rayon pool.
    pub parallel: bool,
    /// Policy parameters for every plan.
    pub plan: PlanParameters,
}

impl Default for GaConfig {
    fn default() -> Self {
        Self {
            population_size: 500,
            max_generations: 500,
            min_generations: 25,
            stall_generations: 3,
            seed: None,
            time_limit: None,
            parallel: true,
            plan: PlanParameters::default(),
        }
    }
}

impl GaConfig {
    /// Sets the population size.
    pub fn with_population_size(mut self, size: usize) -> Self {
        self.population_size = size;
        self
    }

    /// Sets the generation budget.
    pub fn with_max_generations(mut self, generations: usize) -> Self {
        self.max_generations = generations;
        self
    }

    /// Sets the minimum number of generations before convergence applies.
    pub fn with_min_generations(mut self, generations: usize) -> Self {
        self.min_generations = generations;
        self
    }

    /// Sets the stall window for convergence.
    pub fn with_stall_generations(mut self, generations: usize) -> Self {
        self.stall_generations = generations;
        self
    }

    /// Fixes the RNG seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Sets a wall-clock budget.
    pub fn with_time_limit(mut self, limit: Duration) -> Self {
        self.time_limit = Some(limit);
        self
    }

    /// Enables or disables parallel plan evaluation.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Sets the plan policy parameters.
    pub fn with_plan_parameters(mut self, plan: PlanParameters) -> Self {
        self.plan = plan;
        self
    }

    /// Rejects empty populations, zero budgets, and invalid plan parameters.
    pub fn validate(&self) -> Result<()> {
        if self.population_size == 0 {
            return Err(RoadmapError::parameter("population_size", "must be positive"));
        }
        if self.max_generations == 0 {
            return Err(RoadmapError::parameter("max_generations", "must be positive"));
        }
        if self.stall_generations == 0 {
            return Err(RoadmapError::parameter("stall_generations", "must be positive"));
        }
        self.plan.validate()
    }
}

/// Why the search stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StopReason {
    /// Best fitness was positive and stable for the stall window.
    Converged,
    /// The generation budget was used up.
    GenerationLimit,
    /// The wall-clock budget elapsed.
    TimeLimit,
}

/// Outcome of a search.
#[derive(Debug, Clone)]
pub struct GaResult {
    /// Top-ranked plan of the final generation.
    pub best: Plan,
    /// Best fitness (same as `best.fitness_score()`).
    pub best_fitness: f64,
    /// Generations run after seeding.
    pub generations: usize,
    /// Best fitness per generation; index 0 is the seeded population.
    pub history: Vec<f64>,
    /// Why the search stopped.
    pub stop_reason: StopReason,
    /// Wall-clock time spent.
    pub elapsed: Duration,
}

/// Runs the generational search.
pub struct GaRunner;

impl GaRunner {
    /// Searches for the highest-scoring plan over `catalog`.
    ///
    /// # Errors
    /// [`RoadmapError::InvalidParameter`] if `config` fails validation.
    #[instrument(
        level = "info",
        skip_all,
        fields(features = catalog.len(), population = config.population_size)
    )]
    pub fn run(catalog: &FeatureCatalog, config: &GaConfig) -> Result<GaResult> {
        config.validate()?;

        let started = Instant::now();
        let mut rng = match config.seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => SmallRng::from_os_rng(),
        };
        let bands = Bands::new(config.population_size);

        let mut population = seed_population(
            config.population_size,
            catalog,
            config.plan,
            &mut rng,
            config.parallel,
        );
        rank(&mut population);

        let mut history = vec![top_fitness(&population)];
        event!(
            Level::INFO,
            max_generations = config.max_generations,
            seeded_best = history[0],
            "population seeded"
        );
        let mut generations = 0;
        let mut stop_reason = StopReason::GenerationLimit;

        while generations < config.max_generations {
            if config
                .time_limit
                .is_some_and(|limit| started.elapsed() >= limit)
            {
                stop_reason = StopReason::TimeLimit;
                break;
            }

            generations += 1;
            evolve(&mut population, &bands, &mut rng, config.parallel);
            rank(&mut population);

            let best = top_fitness(&population);
            history.push(best);
            event!(Level::DEBUG, generation = generations, best_fitness = best);

            if generations >= config.min_generations
                && is_stalled(&history, config.stall_generations)
            {
                stop_reason = StopReason::Converged;
                break;
            }
        }

        let best = population.swap_remove(0);
        let best_fitness = best.fitness_score();
        let elapsed = started.elapsed();
        event!(
            Level::INFO,
            generations,
            best_fitness,
            stop_reason = ?stop_reason,
            elapsed_ms = elapsed.as_millis() as u64,
            "search finished"
        );

        Ok(GaResult {
            best,
            best_fitness,
            generations,
            history,
            stop_reason,
            elapsed,
        })
    }
}

/// Rank bands of one generation.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Bands {
    mutate: Range<usize>,
    crossover: Range<usize>,
    tail: Range<usize>,
    /// Crossover parents are drawn from the previous generation's top ranks.
    parent_pool: usize,
}

impl Bands {
    fn new(size: usize) -> Self {
        let elite_end = ELITE_COUNT.min(size);
        let mutate_end = (size / 5).max(elite_end);
        let crossover_end = (2 * size / 5).max(mutate_end);
        Self {
            mutate: elite_end..mutate_end,
            crossover: mutate_end..crossover_end,
            tail: crossover_end..size,
            parent_pool: (size / 4).max(1),
        }
    }
}

/// Applies one generation of operators to a ranked population.
fn evolve<R: Rng>(population: &mut [Plan], bands: &Bands, rng: &mut R, parallel: bool) {
    let parents: Vec<Plan> = population[..bands.parent_pool.min(population.len())].to_vec();

    for plan in &mut population[bands.mutate.clone()] {
        mutate(plan, rng);
    }

    if !parents.is_empty() {
        for slot in bands.crossover.clone().step_by(2) {
            let mut a = parents[rng.random_range(0..parents.len())].clone();
            let mut b = parents[rng.random_range(0..parents.len())].clone();
            cross_over(&mut a, &mut b, rng);
            population[slot] = a;
            if slot + 1 < bands.crossover.end {
                population[slot + 1] = b;
            }
        }
    }

    reschedule(&mut population[bands.tail.clone()], rng, parallel);
}

fn top_fitness(population: &[Plan]) -> f64 {
    population.first().map_or(0.0, Plan::fitness_score)
}

/// Whether the last `window` best scores are identical and positive.
fn is_stalled(history: &[f64], window: usize) -> bool {
    if window == 0 || history.len() < window {
        return false;
    }
    let recent = &history[history.len() - window..];
    recent[0] > 0.0 && recent.iter().all(|&f| f == recent[0])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Feature;

    fn sample_catalog() -> FeatureCatalog {
        FeatureCatalog::new(vec![
            Feature::new(1, "One", 30.0, 3000.0, 10000.0).with_child(5),
            Feature::new(2, "Two", 60.0, 6000.0, 24000.0).with_child(3).with_child(6),
            Feature::new(3, "Three", 90.0, 9000.0, 10000.0).with_parent(2).with_child(4),
            Feature::new(4, "Four", 40.0, 4000.0, 25000.0).with_parent(3),
            Feature::new(5, "Five", 90.0, 9000.0, 50000.0).with_parent(1).with_child(4),
            Feature::new(6, "Six", 60.0, 6000.0, 10000.0).with_parent(2).with_child(4),
        ])
        .unwrap()
    }

    fn small_config() -> GaConfig {
        GaConfig::default()
            .with_population_size(40)
            .with_max_generations(15)
            .with_seed(42)
            .with_parallel(false)
    }

    #[test]
    fn test_config_validate() {
        assert!(GaConfig::default().validate().is_ok());
        assert!(GaConfig::default().with_population_size(0).validate().is_err());
        assert!(GaConfig::default().with_max_generations(0).validate().is_err());
        assert!(GaConfig::default().with_stall_generations(0).validate().is_err());
        let bad_plan = PlanParameters::default().with_effort_bandwidth(0);
        assert!(matches!(
            GaConfig::default().with_plan_parameters(bad_plan).validate(),
            Err(RoadmapError::InvalidParameter { name: "effort_bandwidth", .. })
        ));
    }

    #[test]
    fn test_config_serde() {
        let config = small_config().with_time_limit(Duration::from_secs(5));
        let json = serde_json::to_string(&config).unwrap();
        let back: GaConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn test_bands_default_population() {
        let bands = Bands::new(500);
        assert_eq!(bands.mutate, 2..100);
        assert_eq!(bands.crossover, 100..200);
        assert_eq!(bands.tail, 200..500);
        assert_eq!(bands.parent_pool, 125);
    }

    #[test]
    fn test_bands_small_population() {
        let bands = Bands::new(4);
        assert_eq!(bands.mutate, 2..2);
        assert_eq!(bands.crossover, 2..2);
        assert_eq!(bands.tail, 2..4);

        let bands = Bands::new(1);
        assert_eq!(bands.mutate, 1..1);
        assert_eq!(bands.tail, 1..1);
        assert_eq!(bands.parent_pool, 1);
    }

    #[test]
    fn test_is_stalled() {
        assert!(is_stalled(&[1.0, 5.0, 5.0, 5.0], 3));
        assert!(!is_stalled(&[5.0, 4.0, 5.0], 3));
        assert!(!is_stalled(&[0.0, 0.0, 0.0], 3));
        assert!(!is_stalled(&[5.0, 5.0], 3));
    }

    #[test]
    fn test_run_returns_best_plan() {
        let catalog = sample_catalog();
        let result = GaRunner::run(&catalog, &small_config()).unwrap();

        assert_eq!(result.best.feature_count(), 6);
        assert_eq!(result.best_fitness, result.best.fitness_score());
        assert_eq!(result.history.len(), result.generations + 1);
        assert_eq!(*result.history.last().unwrap(), result.best_fitness);
    }

    #[test]
    fn test_elitism_best_never_decreases() {
        let catalog = sample_catalog();
        let config = small_config().with_max_generations(20).with_min_generations(20);
        let result = GaRunner::run(&catalog, &config).unwrap();

        assert!(result.generations >= 10);
        for pair in result.history.windows(2) {
            assert!(pair[1] >= pair[0], "{:?}", result.history);
        }
    }

    #[test]
    fn test_fixed_seed_is_reproducible() {
        let catalog = sample_catalog();
        let a = GaRunner::run(&catalog, &small_config()).unwrap();
        let b = GaRunner::run(&catalog, &small_config().with_parallel(true)).unwrap();

        assert_eq!(a.history, b.history);
        assert_eq!(a.best_fitness, b.best_fitness);
    }

    #[test]
    fn test_converges_on_trivial_catalog() {
        let catalog =
            FeatureCatalog::new(vec![Feature::new(1, "One", 30.0, 3000.0, 10000.0)]).unwrap();
        let config = GaConfig::default()
            .with_population_size(20)
            .with_max_generations(200)
            .with_min_generations(5)
            .with_seed(7)
            .with_parallel(false);
        let result = GaRunner::run(&catalog, &config).unwrap();

        assert_eq!(result.stop_reason, StopReason::Converged);
        assert!(result.generations < 200);
        assert!(result.best_fitness > 0.0);
        // Full bandwidth is the shortest in-bandwidth placement.
        assert_eq!(result.best.feature(1).unwrap().avg_daily_effort(), 5);
    }

    #[test]
    fn test_time_limit_stops_between_generations() {
        let catalog = sample_catalog();
        let config = small_config().with_time_limit(Duration::ZERO);
        let result = GaRunner::run(&catalog, &config).unwrap();

        assert_eq!(result.stop_reason, StopReason::TimeLimit);
        assert_eq!(result.generations, 0);
        assert_eq!(result.history.len(), 1);
    }

    #[test]
    fn test_generation_limit() {
        let catalog = sample_catalog();
        let config = small_config().with_max_generations(3).with_min_generations(25);
        let result = GaRunner::run(&catalog, &config).unwrap();

        assert_eq!(result.stop_reason, StopReason::GenerationLimit);
        assert_eq!(result.generations, 3);
    }

    #[test]
    fn test_run_rejects_invalid_config() {
        let catalog = sample_catalog();
        let config = GaConfig::default().with_population_size(0);
        let err = GaRunner::run(&catalog, &config).unwrap_err();
        assert!(matches!(err, RoadmapError::InvalidParameter { name: "population_size", .. }));
    }
}
