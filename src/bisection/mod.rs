//! Recursive bisection reordering.
//!
//! Finds a vertex ordering in which vertices with heavy mutual demand sit
//! close together, so that [`build_balanced`](crate::tree::build_balanced)
//! over the ordering yields a cheap tree. Each window is split in half and
//! vertices are exchanged across the split while a [`GainStrategy`] reports
//! an improvement; both halves are then processed recursively.
//!
//! # Key Types
//!
//! - [`ReorderConfig`]: depth, iteration budget, strategy, parallelism
//! - [`GainStrategy`]: how candidate exchanges are priced and accepted
//! - [`OrderingLog`]: per-iteration and per-window diagnostics
//!
//! # References
//!
//! - Kernighan & Lin (1970), "An efficient heuristic procedure for
//!   partitioning graphs"
//! - Dhulipala, Kabiljo, Karrer, Ottaviano, Pupyrev & Shalita (2016),
//!   "Compressing graphs and indexes with recursive graph bisection"

mod config;
mod gain;
mod log;
mod runner;

pub use config::{default_max_depth, GainStrategy, ReorderConfig};
pub use log::OrderingLog;
pub use runner::reorder;
