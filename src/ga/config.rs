//! Genetic search configuration.
//!
//! [`GeneticConfig`] holds all parameters that control the evolutionary loop.

use crate::error::{Error, Result};

/// Configuration for the genetic layout search.
///
/// # Defaults
///
/// ```
/// use treelayout::ga::GeneticConfig;
///
/// let config = GeneticConfig::default();
/// assert_eq!(config.population_size, 100);
/// assert_eq!(config.elite_count(), 10);
/// assert_eq!(config.cross_fit_count(), 40);
/// ```
///
/// # Builder Pattern
///
/// ```
/// use treelayout::ga::GeneticConfig;
///
/// let config = GeneticConfig::default()
///     .with_population_size(40)
///     .with_stopping_generations(10)
///     .with_mutation_probability(0.05)
///     .with_seed(42);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GeneticConfig {
    /// Number of individuals per generation.
    pub population_size: usize,

    /// Generations without an improving offspring before stopping.
    pub stopping_generations: usize,

    /// Fraction of the population copied unchanged into the next
    /// generation (floored, at least one individual).
    pub elite_ratio: f64,

    /// Fraction of the population, best first, eligible as parents
    /// (floored, at least two individuals).
    pub cross_fit_ratio: f64,

    /// Probability that a vertex is re-hung under a random open vertex.
    pub mutation_probability: f64,

    /// Probability that a vertex adopts its parent from the second parent.
    pub crossover_probability: f64,

    /// Hard cap on generations.
    pub max_generations: usize,

    /// Whether to evaluate offspring in parallel using rayon.
    ///
    /// Requires the `parallel` feature.
    pub parallel: bool,

    /// Random seed for reproducibility.
    ///
    /// `None` seeds from the clock.
    pub seed: Option<u64>,

    /// Optional wall-clock time limit in milliseconds, checked between
    /// generations.
    pub time_limit_ms: Option<u64>,
}

impl Default for GeneticConfig {
    fn default() -> Self {
        Self {
            population_size: 100,
            stopping_generations: 30,
            elite_ratio: 0.1,
            cross_fit_ratio: 0.4,
            mutation_probability: 0.02,
            crossover_probability: 0.2,
            max_generations: 10_000,
            parallel: cfg!(feature = "parallel"),
            seed: None,
            time_limit_ms: None,
        }
    }
}

impl GeneticConfig {
    /// Sets the population size.
    pub fn with_population_size(mut self, n: usize) -> Self {
        self.population_size = n;
        self
    }

    /// Sets the number of non-improving generations tolerated.
    pub fn with_stopping_generations(mut self, n: usize) -> Self {
        self.stopping_generations = n;
        self
    }

    /// Sets the elite ratio.
    pub fn with_elite_ratio(mut self, ratio: f64) -> Self {
        self.elite_ratio = ratio;
        self
    }

    /// Sets the parent-pool ratio.
    pub fn with_cross_fit_ratio(mut self, ratio: f64) -> Self {
        self.cross_fit_ratio = ratio;
        self
    }

    /// Sets the per-vertex mutation probability.
    pub fn with_mutation_probability(mut self, p: f64) -> Self {
        self.mutation_probability = p;
        self
    }

    /// Sets the per-vertex crossover probability.
    pub fn with_crossover_probability(mut self, p: f64) -> Self {
        self.crossover_probability = p;
        self
    }

    /// Sets the generation cap.
    pub fn with_max_generations(mut self, n: usize) -> Self {
        self.max_generations = n;
        self
    }

    /// Enables or disables parallel evaluation.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Sets the random seed for reproducibility.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Sets the wall-clock time limit in milliseconds.
    pub fn with_time_limit_ms(mut self, ms: u64) -> Self {
        self.time_limit_ms = Some(ms);
        self
    }

    /// Individuals carried over unchanged each generation.
    pub fn elite_count(&self) -> usize {
        (self.population_size as f64 * self.elite_ratio) as usize
    }

    /// Size of the parent pool.
    pub fn cross_fit_count(&self) -> usize {
        (self.population_size as f64 * self.cross_fit_ratio) as usize
    }

    /// Validates the configuration.
    ///
    /// # Errors
    /// [`Error::UnsupportedConfiguration`] describing the first problem.
    pub fn validate(&self) -> Result<()> {
        let fail = |msg: String| Err(Error::UnsupportedConfiguration(msg));

        for (name, p) in [
            ("elite_ratio", self.elite_ratio),
            ("cross_fit_ratio", self.cross_fit_ratio),
            ("mutation_probability", self.mutation_probability),
            ("crossover_probability", self.crossover_probability),
        ] {
            if !(0.0..=1.0).contains(&p) {
                return fail(format!("{name} must be in [0, 1], got {p}"));
            }
        }
        if self.elite_count() < 1 {
            return fail(format!(
                "population of {} with elite ratio {} keeps no elite",
                self.population_size, self.elite_ratio
            ));
        }
        if self.cross_fit_count() < 2 {
            return fail(format!(
                "population of {} with cross-fit ratio {} leaves fewer than two parents",
                self.population_size, self.cross_fit_ratio
            ));
        }
        if self.parallel && !cfg!(feature = "parallel") {
            return fail("parallel evaluation requested but the `parallel` feature is disabled".into());
        }
        Ok(())
    }
}
