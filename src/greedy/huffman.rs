//! Frequency-ranked placement.
//!
//! Vertices that appear in many queries should sit near the root. Huffman
//! code lengths over per-vertex query counts give each vertex a target
//! depth; vertices are then placed shallowest-code first, each under the
//! open leaf closest to the root.

use super::builder::{GreedyBuilder, RankedLeaf};
use crate::error::{Error, Result};
use crate::tree::{DemandMatrix, TreeLayout};
use rand::Rng;
use std::cmp::Reverse;
use std::collections::{BinaryHeap, VecDeque};
use tracing::{debug, instrument};

/// Node of the Huffman tree; internal nodes reference their children by
/// arena index.
#[derive(Debug, Clone, Copy)]
struct HuffmanNode {
    weight: u64,
    symbol: Option<usize>,
    children: Option<(usize, usize)>,
}

/// Huffman code length of every symbol given its frequency.
///
/// A single symbol gets length 1. Zero-frequency symbols take part like any
/// other and end up deepest.
pub fn code_lengths(frequencies: &[u64]) -> Vec<u32> {
    let n = frequencies.len();
    let mut lengths = vec![0; n];
    if n == 0 {
        return lengths;
    }

    let mut arena: Vec<HuffmanNode> = frequencies
        .iter()
        .enumerate()
        .map(|(symbol, &weight)| HuffmanNode {
            weight,
            symbol: Some(symbol),
            children: None,
        })
        .collect();
    let mut queue: BinaryHeap<Reverse<(u64, usize)>> = arena
        .iter()
        .enumerate()
        .map(|(idx, node)| Reverse((node.weight, idx)))
        .collect();

    while queue.len() > 1 {
        let (Some(Reverse((wl, left))), Some(Reverse((wr, right)))) = (queue.pop(), queue.pop())
        else {
            break;
        };
        arena.push(HuffmanNode {
            weight: wl + wr,
            symbol: None,
            children: Some((left, right)),
        });
        queue.push(Reverse((wl + wr, arena.len() - 1)));
    }

    let Some(Reverse((_, root))) = queue.pop() else {
        return lengths;
    };
    let mut bfs = VecDeque::from([(root, 0u32)]);
    while let Some((idx, depth)) = bfs.pop_front() {
        let node = arena[idx];
        if let Some(symbol) = node.symbol {
            lengths[symbol] = depth;
        }
        if let Some((left, right)) = node.children {
            bfs.push_back((left, depth + 1));
            bfs.push_back((right, depth + 1));
        }
    }
    if n == 1 {
        lengths[0] = 1;
    }
    lengths
}

/// Tree built from Huffman code lengths of query endpoint counts.
///
/// Each query counts once for its source and once for its destination.
/// Vertices are placed in increasing code length (ties broken at random),
/// each under the shallowest open leaf (ties broken at random). Returns the
/// query cost of the tree and the layout.
///
/// # Errors
/// [`Error::Precondition`] for `n == 0` or an out-of-range query.
///
/// # Examples
///
/// ```
/// use treelayout::greedy::huffman_build;
/// use treelayout::random::create_rng;
///
/// let queries = [(0, 1), (0, 2), (0, 3), (0, 1)];
/// let (_, layout) = huffman_build(4, &queries, &mut create_rng(7)).unwrap();
/// assert_eq!(layout.root(), Some(0));
/// ```
#[instrument(level = "debug", skip_all, fields(n = n, queries = queries.len()))]
pub fn huffman_build<R: Rng>(
    n: usize,
    queries: &[(usize, usize)],
    rng: &mut R,
) -> Result<(f64, TreeLayout)> {
    if n == 0 {
        return Err(Error::Precondition("no vertices to place".into()));
    }
    let demand = DemandMatrix::from_queries(n, queries)?;

    let mut frequencies = vec![0u64; n];
    for &(src, dst) in queries {
        frequencies[src] += 1;
        frequencies[dst] += 1;
    }
    let lengths = code_lengths(&frequencies);

    let mut order: Vec<(u32, u64, usize)> = (0..n)
        .map(|v| (lengths[v], rng.random::<u64>(), v))
        .collect();
    order.sort_unstable();

    let mut builder = GreedyBuilder::new(&demand);
    let mut leaves = BinaryHeap::<RankedLeaf>::new();
    for (_, _, v) in order {
        builder.insert_by_rank(&mut leaves, v, rng.random());
    }

    let (cost, layout) = builder.finish()?;
    debug!(cost, height = layout.height(), "huffman layout built");
    Ok((cost, layout))
}
