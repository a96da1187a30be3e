//! Recursive bisection driver.

use super::config::{GainStrategy, ReorderConfig};
use super::gain::{pair_gain, partition_table, side_gain, SectionInfo};
use super::log::OrderingLog;
use crate::error::{Error, Result};
use crate::tree::DemandMatrix;
use std::ops::Range;
use tracing::{debug, instrument, trace};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Reorders `permutation[window]` so that vertices with heavy mutual demand
/// end up close together.
///
/// The window is split at its midpoint; vertices are exchanged between the
/// halves while the configured [`GainStrategy`] reports a positive gain,
/// then both halves are reordered recursively. Deterministic for a given
/// input and sequential configuration.
///
/// Vertices outside `window` are left untouched. When `log` is given, every
/// iteration and window is appended to it.
///
/// # Errors
/// - [`Error::UnsupportedConfiguration`] if `config` cannot run in this build.
/// - [`Error::Precondition`] if `window` is out of bounds, `permutation` is
///   not a permutation of `0..n`, or its length differs from `demand`.
/// - [`Error::NumericAnomaly`] if a gain evaluates to NaN or infinity.
///   The permutation may be partially reordered in that case.
///
/// # Examples
///
/// ```
/// use treelayout::bisection::{reorder, GainStrategy, OrderingLog, ReorderConfig};
/// use treelayout::tree::DemandMatrix;
///
/// // 0-2 and 1-3 talk; the split [0, 1 | 2, 3] cuts both
/// let demand = DemandMatrix::from_queries(4, &[(0, 2), (1, 3)]).unwrap();
/// let config = ReorderConfig::default().with_strategy(GainStrategy::BasicBestPair);
/// let mut perm = vec![0, 1, 2, 3];
/// let mut log = OrderingLog::new(20);
/// reorder(&demand, &mut perm, 0..4, &config, Some(&mut log)).unwrap();
///
/// let left: Vec<_> = perm[..2].to_vec();
/// assert!(left.contains(&0) == left.contains(&2));
/// assert!(log.total_swaps() > 0);
/// ```
#[instrument(level = "debug", skip_all, fields(n = demand.len(), strategy = %config.strategy))]
pub fn reorder(
    demand: &DemandMatrix,
    permutation: &mut [usize],
    window: Range<usize>,
    config: &ReorderConfig,
    log: Option<&mut OrderingLog>,
) -> Result<()> {
    config.validate()?;
    check_permutation(demand, permutation)?;
    if window.start > window.end || window.end > permutation.len() {
        return Err(Error::Precondition(format!(
            "window {window:?} out of bounds for {} vertices",
            permutation.len()
        )));
    }

    let mut sink = OrderingLog::new(config.max_iterations);
    let result = bisect(
        demand,
        &mut permutation[window],
        config.max_depth,
        config,
        &mut sink,
    );

    debug!(
        windows = sink.iterations().len(),
        swaps = sink.total_swaps(),
        "reordering finished"
    );
    if let Some(log) = log {
        log.merge(sink);
    }
    result
}

fn check_permutation(demand: &DemandMatrix, permutation: &[usize]) -> Result<()> {
    let n = permutation.len();
    if demand.len() != n {
        return Err(Error::Precondition(format!(
            "permutation has {n} vertices, demand has {}",
            demand.len()
        )));
    }
    let mut seen = vec![false; n];
    for &v in permutation {
        if v >= n || seen[v] {
            return Err(Error::Precondition(format!(
                "not a permutation of 0..{n}: vertex {v}"
            )));
        }
        seen[v] = true;
    }
    Ok(())
}

fn bisect(
    demand: &DemandMatrix,
    window: &mut [usize],
    depth: usize,
    config: &ReorderConfig,
    log: &mut OrderingLog,
) -> Result<()> {
    let len = window.len();
    if depth == 0 || len <= config.strategy.min_window() {
        return Ok(());
    }

    let mid = len / 2;
    let mut iterations = 0;
    while iterations < config.max_iterations {
        iterations += 1;
        let (swapped, gain) = if config.strategy.is_per_side() {
            side_iteration(demand, window, mid, config)?
        } else {
            pair_iteration(demand, window, mid, config)?
        };
        log.record_iteration(swapped, gain);
        trace!(len, iteration = iterations, swapped, gain, "bisection iteration");
        if swapped == 0 {
            break;
        }
    }
    log.record_window(iterations);
    debug!(len, iterations, "window settled");

    let depth = depth - 1;
    let (left, right) = window.split_at_mut(mid);

    #[cfg(feature = "parallel")]
    if config.parallel {
        let mut right_log = OrderingLog::new(config.max_iterations);
        let (left_result, right_result) = rayon::join(
            || bisect(demand, left, depth, config, log),
            || bisect(demand, right, depth, config, &mut right_log),
        );
        left_result?;
        right_result?;
        log.merge(right_log);
        return Ok(());
    }

    bisect(demand, left, depth, config, log)?;
    bisect(demand, right, depth, config, log)
}

/// A candidate exchange between left position `li` and right position `ri`.
#[derive(Debug, Clone, Copy)]
struct PairGain {
    gain: f64,
    li: usize,
    ri: usize,
}

fn check_finite(strategy: GainStrategy, value: f64) -> Result<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(Error::NumericAnomaly {
            strategy: strategy.name(),
            value,
        })
    }
}

/// Gains of every left × right exchange, row-major by left position.
fn pair_grid(
    demand: &DemandMatrix,
    window: &[usize],
    mid: usize,
    config: &ReorderConfig,
) -> Vec<PairGain> {
    let right = window.len() - mid;
    let entry = |k: usize| {
        let (li, ri) = (k / right, mid + k % right);
        PairGain {
            gain: pair_gain(config.strategy, demand, window, mid, li, ri),
            li,
            ri,
        }
    };

    #[cfg(feature = "parallel")]
    if config.parallel {
        let mut grid = Vec::with_capacity(mid * right);
        (0..mid * right).into_par_iter().map(entry).collect_into_vec(&mut grid);
        return grid;
    }

    (0..mid * right).map(entry).collect()
}

/// One exchange iteration for the pairwise strategies.
///
/// Returns the number of swaps and their summed gain.
fn pair_iteration(
    demand: &DemandMatrix,
    window: &mut [usize],
    mid: usize,
    config: &ReorderConfig,
) -> Result<(usize, f64)> {
    let strategy = config.strategy;
    let mut grid = pair_grid(demand, window, mid, config);
    for candidate in &grid {
        check_finite(strategy, candidate.gain)?;
    }

    if strategy.single_swap() {
        let best = grid
            .iter()
            .copied()
            .reduce(|best, c| if c.gain > best.gain { c } else { best });
        return Ok(match best {
            Some(best) if best.gain > 0.0 => {
                window.swap(best.li, best.ri);
                (1, best.gain)
            }
            _ => (0, 0.0),
        });
    }

    // gains are priced once against the window at the start of the
    // iteration and not refreshed as swaps are applied
    grid.sort_by(|a, b| b.gain.total_cmp(&a.gain));
    let mut swapped = vec![false; window.len()];
    let (mut count, mut total) = (0, 0.0);
    for candidate in grid {
        if candidate.gain <= 0.0 {
            break;
        }
        if swapped[candidate.li] || swapped[candidate.ri] {
            continue;
        }
        window.swap(candidate.li, candidate.ri);
        swapped[candidate.li] = true;
        swapped[candidate.ri] = true;
        count += 1;
        total += candidate.gain;
    }
    Ok((count, total))
}

/// One exchange iteration for the per-side strategies: each side ranks its
/// own movers and the i-th best of each side are exchanged while their
/// combined gain is positive.
fn side_iteration(
    demand: &DemandMatrix,
    window: &mut [usize],
    mid: usize,
    config: &ReorderConfig,
) -> Result<(usize, f64)> {
    let strategy = config.strategy;
    let (left, right) = (0..mid, mid..window.len());
    let table = if strategy == GainStrategy::MLogGap {
        partition_table(demand, window, mid)
    } else {
        Vec::new()
    };

    let left_gains = ranked_side(demand, window, &left, &right, strategy, &table)?;
    let right_gains = ranked_side(demand, window, &right, &left, strategy, &table)?;

    let (mut count, mut total) = (0, 0.0);
    for (&(lg, li), &(rg, ri)) in left_gains.iter().zip(&right_gains) {
        if lg + rg <= 0.0 {
            break;
        }
        window.swap(li, ri);
        count += 1;
        total += lg + rg;
    }
    Ok((count, total))
}

/// Gains of moving each vertex of `from` across, best first (ties by
/// position).
fn ranked_side(
    demand: &DemandMatrix,
    window: &[usize],
    from: &Range<usize>,
    to: &Range<usize>,
    strategy: GainStrategy,
    table: &[SectionInfo],
) -> Result<Vec<(f64, usize)>> {
    let mut gains = from
        .clone()
        .map(|idx| {
            let g = side_gain(strategy, demand, window, idx, from, to, table);
            check_finite(strategy, g).map(|g| (g, idx))
        })
        .collect::<Result<Vec<_>>>()?;
    gains.sort_by(|a, b| b.0.total_cmp(&a.0).then(a.1.cmp(&b.1)));
    Ok(gains)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::create_rng;
    use rand::Rng;

    fn random_demand(n: usize, density: f64, seed: u64) -> DemandMatrix {
        let mut rng = create_rng(seed);
        let mut demand = DemandMatrix::zeros(n);
        for u in 0..n {
            for v in 0..n {
                if u != v && rng.random_bool(density) {
                    demand.set(u, v, rng.random_range(1.0..10.0)).unwrap();
                }
            }
        }
        demand
    }

    fn is_permutation(perm: &[usize]) -> bool {
        let mut sorted = perm.to_vec();
        sorted.sort_unstable();
        sorted.into_iter().enumerate().all(|(i, v)| i == v)
    }

    /// Symmetric demand crossing the top-level split.
    fn cut(demand: &DemandMatrix, perm: &[usize]) -> f64 {
        let mid = perm.len() / 2;
        let mut total = 0.0;
        for &l in &perm[..mid] {
            for &r in &perm[mid..] {
                total += demand.symmetric(l, r);
            }
        }
        total
    }

    // ---- Preconditions ----

    #[test]
    fn test_rejects_non_permutation() {
        let demand = DemandMatrix::zeros(3);
        let mut perm = vec![0, 0, 2];
        let err = reorder(&demand, &mut perm, 0..3, &ReorderConfig::default(), None);
        assert!(matches!(err, Err(Error::Precondition(_))));
    }

    #[test]
    fn test_rejects_size_mismatch_and_bad_window() {
        let demand = DemandMatrix::zeros(3);
        let mut perm = vec![0, 1];
        assert!(reorder(&demand, &mut perm, 0..2, &ReorderConfig::default(), None).is_err());

        let mut perm = vec![0, 1, 2];
        assert!(reorder(&demand, &mut perm, 1..4, &ReorderConfig::default(), None).is_err());
    }

    // ---- Trivial windows ----

    #[test]
    fn test_tiny_windows_untouched() {
        let demand = random_demand(4, 1.0, 1);
        for strategy in GainStrategy::ALL {
            let config = ReorderConfig::default().with_strategy(strategy);
            let mut perm = vec![3, 1, 0, 2];
            let mut log = OrderingLog::new(config.max_iterations);
            reorder(&demand, &mut perm, 2..3, &config, Some(&mut log)).unwrap();
            reorder(&demand, &mut perm, 1..1, &config, Some(&mut log)).unwrap();
            assert_eq!(perm, vec![3, 1, 0, 2]);
            assert!(log.iterations().is_empty());
        }
    }

    #[test]
    fn test_zero_depth_is_noop() {
        let demand = random_demand(16, 0.3, 2);
        let config = ReorderConfig::default().with_max_depth(0);
        let mut perm: Vec<usize> = (0..16).collect();
        reorder(&demand, &mut perm, 0..16, &config, None).unwrap();
        assert_eq!(perm, (0..16).collect::<Vec<_>>());
    }

    // ---- Behaviour ----

    #[test]
    fn test_every_strategy_keeps_permutation() {
        for (i, strategy) in GainStrategy::ALL.into_iter().enumerate() {
            let demand = random_demand(24, 0.2, 10 + i as u64);
            let config = ReorderConfig::default().with_strategy(strategy);
            let mut perm: Vec<usize> = (0..24).rev().collect();
            reorder(&demand, &mut perm, 0..24, &config, None)
                .unwrap_or_else(|e| panic!("{strategy}: {e}"));
            assert!(is_permutation(&perm), "{strategy}: {perm:?}");
        }
    }

    #[test]
    fn test_window_outside_untouched() {
        let demand = random_demand(12, 0.5, 3);
        let mut perm: Vec<usize> = (0..12).collect();
        reorder(&demand, &mut perm, 4..10, &ReorderConfig::default(), None).unwrap();
        assert_eq!(&perm[..4], &[0, 1, 2, 3]);
        assert_eq!(&perm[10..], &[10, 11]);
        assert!(is_permutation(&perm));
    }

    fn two_cliques() -> DemandMatrix {
        // {0,2,4,6} and {1,3,5,7} only talk among themselves
        let mut demand = DemandMatrix::zeros(8);
        for u in 0..8 {
            for v in 0..8 {
                if u != v && u % 2 == v % 2 {
                    demand.set(u, v, 1.0).unwrap();
                }
            }
        }
        demand
    }

    #[test]
    fn test_best_pair_separates_two_cliques() {
        let demand = two_cliques();
        let config = ReorderConfig::default()
            .with_strategy(GainStrategy::BasicBestPair)
            .with_max_depth(1);
        let mut perm: Vec<usize> = (0..8).collect();
        reorder(&demand, &mut perm, 0..8, &config, None).unwrap();
        assert_eq!(cut(&demand, &perm), 0.0, "{perm:?}");
    }

    #[test]
    fn test_basic_applies_precomputed_gains() {
        // eight pairs tie at gain 4; the four non-conflicting ones in grid
        // order are all taken even though they undo each other's benefit
        let demand = two_cliques();
        let config = ReorderConfig::default().with_max_depth(1).with_max_iterations(1);
        let mut perm: Vec<usize> = (0..8).collect();
        let mut log = OrderingLog::new(1);
        reorder(&demand, &mut perm, 0..8, &config, Some(&mut log)).unwrap();
        assert_eq!(perm, vec![5, 4, 7, 6, 1, 0, 3, 2]);
        assert_eq!(log.swapped_pairs(), &[4]);
        assert_eq!(log.cost_gains(), &[16.0]);
    }

    /// One Basic iteration written out directly: price every pair once,
    /// then take non-conflicting pairs in decreasing gain order.
    fn one_basic_iteration(demand: &DemandMatrix, perm: &mut [usize]) {
        let mid = perm.len() / 2;
        let mut candidates = Vec::new();
        for li in 0..mid {
            for ri in mid..perm.len() {
                let gain = pair_gain(GainStrategy::Basic, demand, perm, mid, li, ri);
                candidates.push((gain, li, ri));
            }
        }
        candidates.sort_by(|a, b| b.0.total_cmp(&a.0));
        let mut used = vec![false; perm.len()];
        for (gain, li, ri) in candidates {
            if gain <= 0.0 {
                break;
            }
            if !used[li] && !used[ri] {
                perm.swap(li, ri);
                used[li] = true;
                used[ri] = true;
            }
        }
    }

    #[test]
    fn test_basic_matches_single_pass_acceptance() {
        let config = ReorderConfig::default().with_max_depth(1).with_max_iterations(1);
        for seed in 0..200 {
            let demand = random_demand(8, 0.4, seed);
            let mut expected: Vec<usize> = (0..8).collect();
            one_basic_iteration(&demand, &mut expected);
            let mut perm: Vec<usize> = (0..8).collect();
            reorder(&demand, &mut perm, 0..8, &config, None).unwrap();
            assert_eq!(perm, expected, "seed {seed}");
        }
    }

    // ---- Numeric anomalies ----

    #[test]
    fn test_overflowing_gain_is_reported() {
        let demand = DemandMatrix::from_triples(4, &[(0, 2, 1e308), (2, 0, 1e308)]).unwrap();
        for strategy in [GainStrategy::Basic, GainStrategy::LogGap, GainStrategy::OneHop] {
            let config = ReorderConfig::default().with_strategy(strategy);
            let mut perm = vec![0, 1, 2, 3];
            let err = reorder(&demand, &mut perm, 0..4, &config, None).unwrap_err();
            match err {
                Error::NumericAnomaly { strategy: name, value } => {
                    assert_eq!(name, strategy.name());
                    assert!(!value.is_finite());
                }
                other => panic!("{strategy}: unexpected {other:?}"),
            }
        }
    }

    #[test]
    fn test_deterministic() {
        let demand = random_demand(20, 0.3, 4);
        let config = ReorderConfig::default().with_strategy(GainStrategy::OneHop);
        let mut a: Vec<usize> = (0..20).collect();
        let mut b = a.clone();
        reorder(&demand, &mut a, 0..20, &config, None).unwrap();
        reorder(&demand, &mut b, 0..20, &config, None).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_log_records_windows_and_bounds() {
        let demand = random_demand(16, 0.3, 5);
        let config = ReorderConfig::default().with_max_iterations(3);
        let mut perm: Vec<usize> = (0..16).collect();
        let mut log = OrderingLog::new(config.max_iterations);
        reorder(&demand, &mut perm, 0..16, &config, Some(&mut log)).unwrap();

        // 1 + 2 + 4 + 8 windows of length > 1
        assert_eq!(log.iterations().len(), 15);
        assert!(log.iterations().iter().all(|&i| (1..=3).contains(&i)));
        assert_eq!(log.swapped_pairs().len(), log.iterations().iter().sum::<usize>());
        assert!(log.cost_gains().iter().all(|&g| g >= 0.0));
    }

    #[test]
    fn test_bounded_depth_limits_windows() {
        let demand = random_demand(32, 0.2, 6);
        let config = ReorderConfig::default().with_max_depth(2);
        let mut perm: Vec<usize> = (0..32).collect();
        let mut log = OrderingLog::new(config.max_iterations);
        reorder(&demand, &mut perm, 0..32, &config, Some(&mut log)).unwrap();
        assert_eq!(log.iterations().len(), 3);
    }

    #[cfg(feature = "parallel")]
    #[test]
    fn test_parallel_matches_window_count() {
        let demand = random_demand(32, 0.2, 7);
        let config = ReorderConfig::default().with_parallel(true);
        let mut perm: Vec<usize> = (0..32).collect();
        let mut log = OrderingLog::new(config.max_iterations);
        reorder(&demand, &mut perm, 0..32, &config, Some(&mut log)).unwrap();
        assert!(is_permutation(&perm));
        assert_eq!(log.iterations().len(), 31);
    }
}
