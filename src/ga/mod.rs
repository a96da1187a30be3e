//! Genetic search over tree layouts.
//!
//! Individuals are complete layouts. Each generation keeps the best few
//! unchanged, weights the best fraction by relative cost, and breeds the
//! rest of the next generation with a crossover that never leaves the space
//! of valid binary trees (see [`cross`]).
//!
//! # Key Types
//!
//! - [`GeneticConfig`]: population size, ratios, probabilities, limits
//! - [`GeneticRunner`]: executes the evolutionary loop
//! - [`GeneticResult`]: best layout with run statistics
//!
//! # References
//!
//! - Holland (1975), *Adaptation in Natural and Artificial Systems*
//! - Goldberg (1989), *Genetic Algorithms in Search, Optimization, and Machine Learning*

mod config;
mod crossover;
mod runner;
mod selection;
mod types;

pub use config::GeneticConfig;
pub use crossover::cross;
pub use runner::{run_genetic_search, GeneticResult, GeneticRunner};
pub use selection::ParentSelector;
pub use types::Individual;
