//! Diagnostics sink for the reorderer.

/// Append-only record of what the reorderer did.
///
/// Written by [`reorder`](super::reorder) and read by the caller afterwards.
/// Parallel recursion gives each branch its own log and merges them after
/// the join, so the sink is never shared between threads.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrderingLog {
    max_iterations: usize,
    swapped_pairs: Vec<usize>,
    cost_gains: Vec<f64>,
    iterations: Vec<usize>,
}

impl OrderingLog {
    /// An empty log for runs capped at `max_iterations` per window.
    pub fn new(max_iterations: usize) -> Self {
        Self {
            max_iterations,
            ..Self::default()
        }
    }

    pub(crate) fn record_iteration(&mut self, swapped: usize, gain: f64) {
        self.swapped_pairs.push(swapped);
        self.cost_gains.push(gain);
    }

    pub(crate) fn record_window(&mut self, iterations: usize) {
        self.iterations.push(iterations);
    }

    /// Appends another log's records after this one's.
    pub fn merge(&mut self, other: OrderingLog) {
        self.swapped_pairs.extend(other.swapped_pairs);
        self.cost_gains.extend(other.cost_gains);
        self.iterations.extend(other.iterations);
    }

    /// Pairs swapped in each iteration, in execution order.
    pub fn swapped_pairs(&self) -> &[usize] {
        &self.swapped_pairs
    }

    /// Claimed gain of each iteration.
    pub fn cost_gains(&self) -> &[f64] {
        &self.cost_gains
    }

    /// Iterations spent in each window.
    pub fn iterations(&self) -> &[usize] {
        &self.iterations
    }

    /// Total pairs swapped.
    pub fn total_swaps(&self) -> usize {
        self.swapped_pairs.iter().sum()
    }

    /// Mean gain per iteration (0 when empty).
    pub fn average_cost_gain(&self) -> f64 {
        mean(self.cost_gains.iter().copied())
    }

    /// Mean pairs swapped per iteration (0 when empty).
    pub fn average_swapped_pairs(&self) -> f64 {
        mean(self.swapped_pairs.iter().map(|&s| s as f64))
    }

    /// Mean iterations per window (0 when empty).
    pub fn average_iterations(&self) -> f64 {
        mean(self.iterations.iter().map(|&i| i as f64))
    }

    /// Windows that exhausted the iteration budget.
    pub fn max_iteration_hits(&self) -> usize {
        self.iterations
            .iter()
            .filter(|&&i| i == self.max_iterations)
            .count()
    }
}

fn mean(values: impl ExactSizeIterator<Item = f64>) -> f64 {
    let len = values.len();
    if len == 0 {
        return 0.0;
    }
    values.sum::<f64>() / len as f64
}
