//! Tree model: layouts, validity, distances and cost.
//!
//! Every constructor and optimizer in this crate produces a [`TreeLayout`]
//! and is scored with [`cost`] against a [`DemandMatrix`].
//!
//! # Key Types
//!
//! - [`DemandMatrix`]: pairwise traffic, possibly asymmetric
//! - [`TreeLayout`]: predecessor array with binary-tree validation
//!
//! # Operations
//!
//! - [`cost`] / [`query_cost`]: demand-weighted hop distance
//! - [`build_balanced`]: median-split tree from an ordering
//! - [`random_layout`]: uniformly attached random tree

mod build;
mod demand;
mod layout;

pub use build::{build_balanced, random_layout};
pub use demand::DemandMatrix;
#[cfg(feature = "parallel")]
pub use layout::par_cost;
pub use layout::{cost, query_cost, TreeLayout};
