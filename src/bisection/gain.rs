//! Gain functions for the bisection strategies.
//!
//! All functions work on the current window slice: positions `0..mid` are
//! the left half, `mid..len` the right half. A positive gain means the move
//! is expected to lower the cost. Results are raw `f64`; the caller checks
//! them for NaN/∞ before using them.

use super::config::GainStrategy;
use crate::tree::DemandMatrix;
use std::ops::Range;

/// Demand below this is treated as absent when counting neighbours.
const EPS: f64 = 1e-10;

/// Gain of exchanging the vertices at window positions `li` (left half)
/// and `ri` (right half).
pub(crate) fn pair_gain(
    strategy: GainStrategy,
    demand: &DemandMatrix,
    window: &[usize],
    mid: usize,
    li: usize,
    ri: usize,
) -> f64 {
    match strategy {
        GainStrategy::MLogA => mloga_gain(demand, window, mid, li, ri),
        _ => exchange_gain(demand, window, mid, li, ri),
    }
}

/// Kernighan–Lin gain: reduction of symmetric demand crossing the halves.
fn exchange_gain(demand: &DemandMatrix, window: &[usize], mid: usize, li: usize, ri: usize) -> f64 {
    let (l, r) = (window[li], window[ri]);
    let mut gain = 0.0;

    for &other in &window[..mid] {
        if other == l {
            continue;
        }
        gain += demand.symmetric(r, other) - demand.symmetric(l, other);
    }
    for &other in &window[mid..] {
        if other == r {
            continue;
        }
        gain += demand.symmetric(l, other) - demand.symmetric(r, other);
    }

    gain
}

/// Log-distance gain: each pair pays `log2(|pi - pj|)` times its demand.
fn mloga_gain(demand: &DemandMatrix, window: &[usize], mid: usize, li: usize, ri: usize) -> f64 {
    let (l, r) = (window[li], window[ri]);
    let log_dist = |a: usize, b: usize| (a.abs_diff(b) as f64).log2();
    let mut gain = 0.0;

    for (pos, &other) in window.iter().enumerate().take(mid) {
        if pos == li {
            continue;
        }
        let lw = demand.symmetric(l, other);
        let rw = demand.symmetric(r, other);
        gain += (log_dist(li, pos) - log_dist(ri, pos)) * lw;
        gain += (log_dist(ri, pos) - log_dist(li, pos)) * rw;
    }
    for (pos, &other) in window.iter().enumerate().skip(mid) {
        if pos == ri {
            continue;
        }
        let lw = demand.symmetric(l, other);
        let rw = demand.symmetric(r, other);
        gain += (log_dist(li, pos) - log_dist(ri, pos)) * lw;
        gain += (log_dist(ri, pos) - log_dist(li, pos)) * rw;
    }

    gain
}

/// Neighbour counts and weights of one vertex toward the two halves,
/// oriented relative to a move (`same` = the side being left).
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub(crate) struct SectionInfo {
    pub same_neighbors: usize,
    pub other_neighbors: usize,
    pub same_weight: f64,
    pub other_weight: f64,
}

impl SectionInfo {
    fn flipped(self) -> Self {
        Self {
            same_neighbors: self.other_neighbors,
            other_neighbors: self.same_neighbors,
            same_weight: self.other_weight,
            other_weight: self.same_weight,
        }
    }
}

fn section_info(
    vertex: usize,
    window: &[usize],
    from: &Range<usize>,
    to: &Range<usize>,
    weight: impl Fn(usize, usize) -> f64,
) -> SectionInfo {
    let mut info = SectionInfo::default();
    for &other in &window[from.clone()] {
        let w = weight(vertex, other);
        if other == vertex || w.abs() < EPS {
            continue;
        }
        info.same_neighbors += 1;
        info.same_weight += w;
    }
    for &other in &window[to.clone()] {
        let w = weight(vertex, other);
        if other == vertex || w.abs() < EPS {
            continue;
        }
        info.other_neighbors += 1;
        info.other_weight += w;
    }
    info
}

/// Per-iteration table for [`GainStrategy::MLogGap`]: every vertex's
/// directed neighbour counts toward the (left, right) halves.
pub(crate) fn partition_table(demand: &DemandMatrix, window: &[usize], mid: usize) -> Vec<SectionInfo> {
    let (left, right) = (0..mid, mid..window.len());
    (0..demand.len())
        .map(|u| section_info(u, window, &left, &right, |a, b| demand.get(a, b)))
        .collect()
}

/// Gain of moving the vertex at window position `idx` from half `from` to
/// half `to`.
///
/// `table` must be the [`partition_table`] of the current window when the
/// strategy is [`GainStrategy::MLogGap`]; it is ignored otherwise.
pub(crate) fn side_gain(
    strategy: GainStrategy,
    demand: &DemandMatrix,
    window: &[usize],
    idx: usize,
    from: &Range<usize>,
    to: &Range<usize>,
    table: &[SectionInfo],
) -> f64 {
    let n_from = from.len() as f64;
    let n_to = to.len() as f64;
    let vertex = window[idx];

    match strategy {
        GainStrategy::OneHop => {
            let info = section_info(vertex, window, from, to, |a, b| demand.symmetric(a, b));
            one_hop_delta(info, n_from, n_to)
        }
        GainStrategy::MLogGap => {
            // table is oriented (left, right); re-orient toward this move
            let left_side = from.start == 0;
            (0..demand.len())
                .filter(|&u| u != vertex && demand.get(u, vertex) != 0.0)
                .map(|u| {
                    let info = if left_side { table[u] } else { table[u].flipped() };
                    one_hop_delta(info, n_from, n_to)
                })
                .sum()
        }
        _ => log_gap_gain(demand, window, vertex, from, to, n_from, n_to),
    }
}

fn one_hop_delta(info: SectionInfo, n_from: f64, n_to: f64) -> f64 {
    let same = (info.same_neighbors + 1) as f64;
    let other = (info.other_neighbors + 1) as f64;

    info.same_weight * (n_to / same).log2() + info.other_weight * (n_from / other).log2()
        - info.same_weight * ((n_to - 1.0) / same).log2()
        - info.other_weight * ((n_from + 1.0) / other).log2()
}

fn log_gap_gain(
    demand: &DemandMatrix,
    window: &[usize],
    vertex: usize,
    from: &Range<usize>,
    to: &Range<usize>,
    n_from: f64,
    n_to: f64,
) -> f64 {
    let weight = |a: usize, b: usize| demand.symmetric(a, b);
    let mut gain = 0.0;

    // neighbours left behind lose a same-side neighbour; `vertex` is counted
    // in their same side, so the post-move count stays positive
    for &f in &window[from.clone()] {
        let w = weight(vertex, f);
        if f == vertex || w.abs() < EPS {
            continue;
        }
        let info = section_info(f, window, from, to, weight);
        let same = info.same_neighbors as f64;
        let other = info.other_neighbors as f64;
        let before = info.same_weight * (n_from / (same + 1.0)).log2()
            + info.other_weight * (n_to / (other + 1.0)).log2();
        let after = (info.same_weight - w) * (n_from / same).log2()
            + (info.other_weight + w) * (n_to / (other + 2.0)).log2();
        gain += before - after;
    }

    // neighbours on the destination side gain one
    for &t in &window[to.clone()] {
        let w = weight(vertex, t);
        if t == vertex || w.abs() < EPS {
            continue;
        }
        let info = section_info(t, window, to, from, weight);
        let same = info.same_neighbors as f64;
        let other = info.other_neighbors as f64;
        let before = info.same_weight * (n_to / (same + 1.0)).log2()
            + info.other_weight * (n_from / (other + 1.0)).log2();
        let after = (info.same_weight + w) * (n_to / (same + 2.0)).log2()
            + (info.other_weight - w) * (n_from / other).log2();
        gain += before - after;
    }

    gain
}
