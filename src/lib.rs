//! Demand-aware binary tree layouts.
//!
//! Given an `n × n` matrix of pairwise traffic, find a rooted binary tree
//! over the `n` endpoints that keeps heavily communicating pairs few hops
//! apart, i.e. minimizes `Σ dist(u, v) · demand(u, v)`.
//!
//! - **Tree model** ([`tree`]): parent-pointer layouts, validity, hop
//!   distances, cost, balanced and random constructors.
//! - **Bisection** ([`bisection`]): recursive local-search reordering with
//!   interchangeable gain strategies; the ordering feeds a balanced tree.
//! - **Optimal BST** ([`obst`]): exact interval DP over a fixed ordering.
//! - **Greedy** ([`greedy`]): incremental cheapest-leaf insertion and a
//!   Huffman-ranked variant.
//! - **Genetic search** ([`ga`]): population search whose crossover keeps
//!   every offspring a valid binary tree.
//! - **Pipelines** ([`pipeline`]): bisection followed by a tree builder.
//!
//! # Concurrency
//!
//! With the `parallel` feature (on by default) distance rows, bisection
//! gain grids and recursive halves, and offspring evaluation can run on
//! the rayon pool. Every algorithm is sequential unless its config asks
//! otherwise.
//!
//! # Logging
//!
//! Progress is reported through `tracing`; the crate installs no
//! subscriber.

pub mod bisection;
pub mod error;
pub mod ga;
pub mod greedy;
pub mod obst;
pub mod pipeline;
pub mod random;
pub mod tree;

pub use error::{Error, Result};
