//! Constructive greedy layouts.
//!
//! - [`greedy_build`] / [`greedy_build_queries`]: vertices arrive in order of
//!   demand and each is hung under the open leaf that is cheapest for it
//!   given everything already placed.
//! - [`huffman_build`]: frequently used vertices are placed near the root,
//!   ranked by Huffman code length.
//!
//! Both return the demand-weighted cost together with the layout and are
//! useful as seeds for the [genetic search](crate::ga).
//!
//! # References
//!
//! - Huffman (1952), "A method for the construction of minimum-redundancy
//!   codes"

mod builder;
mod huffman;

pub use builder::{greedy_build, greedy_build_queries, GreedyBuilder, RankedLeaf};
pub use huffman::{code_lengths, huffman_build};
