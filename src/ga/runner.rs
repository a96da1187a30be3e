//! Genetic search loop.
//!
//! [`GeneticRunner`] orchestrates the evolutionary process:
//! seeding → evaluation → elitism → weighted selection → crossover → repeat.

use super::config::GeneticConfig;
use super::crossover::cross;
use super::selection::ParentSelector;
use super::types::Individual;
use crate::error::{Error, Result};
use crate::random::rng_for;
use crate::tree::{random_layout, DemandMatrix, TreeLayout};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, instrument, warn};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Result of a genetic search.
#[derive(Debug, Clone)]
pub struct GeneticResult {
    /// The cheapest layout in the final population.
    pub best: TreeLayout,

    /// Cost of `best`.
    pub best_cost: f64,

    /// Last generation whose offspring beat the then-best individual.
    pub generations: usize,

    /// Generations actually executed.
    pub generations_run: usize,

    /// Best cost at the start of each generation.
    pub cost_history: Vec<f64>,

    /// Whether the run was cancelled externally.
    pub cancelled: bool,
}

/// Executes the genetic search.
///
/// # Usage
///
/// ```
/// use treelayout::ga::{GeneticConfig, GeneticRunner};
/// use treelayout::tree::DemandMatrix;
///
/// let demand = DemandMatrix::from_queries(8, &[(0, 7), (1, 6), (2, 5), (0, 7)]).unwrap();
/// let config = GeneticConfig::default()
///     .with_population_size(20)
///     .with_stopping_generations(5)
///     .with_seed(42);
/// let result = GeneticRunner::run(&demand, &[], &config).unwrap();
/// assert!(result.best.validate());
/// ```
pub struct GeneticRunner;

impl GeneticRunner {
    /// Runs the search to completion.
    ///
    /// `seeds` are placed into the initial population first; the rest is
    /// filled with random layouts.
    pub fn run(
        demand: &DemandMatrix,
        seeds: &[TreeLayout],
        config: &GeneticConfig,
    ) -> Result<GeneticResult> {
        Self::run_with_cancel(demand, seeds, config, None)
    }

    /// Runs the search with an optional cancellation token.
    ///
    /// If `cancel` is `Some` and the flag is set to `true`, the search stops
    /// before the next generation and returns the best layout so far.
    ///
    /// # Errors
    /// - [`Error::UnsupportedConfiguration`] for an invalid `config`.
    /// - [`Error::Precondition`] for an empty demand matrix or a seed that is
    ///   not a valid tree over the same vertices.
    /// - [`Error::InvariantViolation`] if crossover produces an invalid tree.
    #[instrument(level = "debug", skip_all, fields(n = demand.len(), population = config.population_size))]
    pub fn run_with_cancel(
        demand: &DemandMatrix,
        seeds: &[TreeLayout],
        config: &GeneticConfig,
        cancel: Option<Arc<AtomicBool>>,
    ) -> Result<GeneticResult> {
        config.validate()?;
        let n = demand.len();
        if n == 0 {
            return Err(Error::Precondition("empty demand matrix".into()));
        }
        for (idx, seed) in seeds.iter().enumerate() {
            if seed.len() != n || !seed.validate() {
                return Err(Error::Precondition(format!(
                    "seed layout {idx} is not a valid tree over {n} vertices"
                )));
            }
        }
        let mut rng = rng_for(config.seed);
        let started = Instant::now();

        // 1. Initialize population: seeds first, cheapest kept on overflow
        let mut population: Vec<Individual> = seeds.iter().cloned().map(Individual::new).collect();
        if population.len() > config.population_size {
            evaluate_population(&mut population, demand, config.parallel)?;
            population.sort_by(|a, b| a.cost_or_worst().total_cmp(&b.cost_or_worst()));
            population.truncate(config.population_size);
            warn!(
                seeds = seeds.len(),
                population = config.population_size,
                "more seeds than population slots, most expensive seeds dropped"
            );
        }
        while population.len() < config.population_size {
            population.push(Individual::new(random_layout(n, &mut rng)));
        }

        // 2. Evaluate initial population
        evaluate_population(&mut population, demand, config.parallel)?;

        let elites = config.elite_count();
        let cross_fit = config.cross_fit_count();
        let mut last_improvement = 0usize;
        let mut generation = 0usize;
        let mut cost_history = Vec::new();
        let mut cancelled = false;

        // 3. Evolutionary loop
        while generation <= last_improvement + config.stopping_generations {
            if generation >= config.max_generations {
                break;
            }
            if let Some(ref flag) = cancel {
                if flag.load(Ordering::Relaxed) {
                    cancelled = true;
                    break;
                }
            }
            if let Some(limit) = config.time_limit_ms {
                if started.elapsed().as_millis() as u64 >= limit {
                    debug!(generation, "time limit reached");
                    break;
                }
            }

            population.sort_by(|a, b| a.cost_or_worst().total_cmp(&b.cost_or_worst()));
            let best_cost = population[0].cost_or_worst();
            cost_history.push(best_cost);
            debug!(
                generation,
                best = best_cost,
                mean = mean_cost(&population),
                "generation started"
            );

            let mut next: Vec<Individual> = population[..elites].to_vec();
            let selector = ParentSelector::new(&mut population[..cross_fit]);
            while next.len() < config.population_size {
                let (i, j) = selector.pick_pair(&mut rng);
                let child = cross(
                    population[i].layout(),
                    population[j].layout(),
                    config.mutation_probability,
                    config.crossover_probability,
                    &mut rng,
                )?;
                next.push(Individual::new(child));
            }

            evaluate_population(&mut next[elites..], demand, config.parallel)?;
            let offspring_best = next[elites..]
                .iter()
                .map(Individual::cost_or_worst)
                .fold(f64::INFINITY, f64::min);
            if offspring_best < best_cost {
                last_improvement = generation;
                info!(generation, cost = offspring_best, "improved layout found");
            }

            population = next;
            generation += 1;
        }

        let best = population
            .iter()
            .min_by(|a, b| a.cost_or_worst().total_cmp(&b.cost_or_worst()))
            .cloned()
            .ok_or_else(|| Error::InvariantViolation("population is empty".into()))?;
        let best_cost = best.cost_or_worst();
        info!(
            cost = best_cost,
            generations = generation,
            last_improvement,
            cancelled,
            "genetic search finished"
        );

        Ok(GeneticResult {
            best: best.into_layout(),
            best_cost,
            generations: last_improvement,
            generations_run: generation,
            cost_history,
            cancelled,
        })
    }
}

/// Convenience entry point with the default ratios and probabilities.
///
/// `seed` fixes the random stream; `None` seeds from the clock.
pub fn run_genetic_search(
    population_size: usize,
    stopping_generations: usize,
    demand: &DemandMatrix,
    seeds: &[TreeLayout],
    seed: Option<u64>,
) -> Result<GeneticResult> {
    let mut config = GeneticConfig::default()
        .with_population_size(population_size)
        .with_stopping_generations(stopping_generations);
    config.seed = seed;
    GeneticRunner::run(demand, seeds, &config)
}

/// Evaluates every individual whose cost is not cached yet.
fn evaluate_population(
    population: &mut [Individual],
    demand: &DemandMatrix,
    parallel: bool,
) -> Result<()> {
    #[cfg(feature = "parallel")]
    if parallel {
        return population
            .par_iter_mut()
            .try_for_each(|ind| ind.evaluate(demand).map(|_| ()));
    }
    #[cfg(not(feature = "parallel"))]
    let _ = parallel;

    for ind in population.iter_mut() {
        ind.evaluate(demand)?;
    }
    Ok(())
}

fn mean_cost(population: &[Individual]) -> f64 {
    let total: f64 = population.iter().map(Individual::cost_or_worst).sum();
    total / population.len() as f64
}

// ============================================================================
// Tests
// ============================================================================
