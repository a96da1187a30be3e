//! Parent selection.
//!
//! The best `cross_fit` individuals form the parent pool. Each is weighted
//! by `best_cost / own_cost`, so the current best has weight 1 and worse
//! individuals proportionally less. Pairs are drawn from that discrete
//! distribution until the two parents differ.

use super::types::Individual;
use rand::distr::weighted::WeightedIndex;
use rand::distr::Distribution;
use rand::Rng;

/// Weighted sampler over the parent pool.
#[derive(Debug, Clone)]
pub struct ParentSelector {
    pool: usize,
    weighted: Option<WeightedIndex<f64>>,
}

impl ParentSelector {
    /// Weights the sorted `pool` (best first) and builds the sampler.
    ///
    /// Falls back to uniform sampling when fewer than two weights are
    /// positive, which happens when the best cost is zero.
    pub fn new(pool: &mut [Individual]) -> Self {
        let best = pool.first().map_or(0.0, Individual::cost_or_worst);
        for ind in pool.iter_mut() {
            let w = best / ind.cost_or_worst();
            ind.set_weight(if w.is_finite() && w > 0.0 { w } else { 0.0 });
        }

        let positive = pool.iter().filter(|ind| ind.weight() > 0.0).count();
        let weighted = if positive >= 2 {
            WeightedIndex::new(pool.iter().map(Individual::weight)).ok()
        } else {
            None
        };
        Self {
            pool: pool.len(),
            weighted,
        }
    }

    /// Whether sampling is weighted or uniform.
    pub fn is_weighted(&self) -> bool {
        self.weighted.is_some()
    }

    fn pick<R: Rng>(&self, rng: &mut R) -> usize {
        match &self.weighted {
            Some(dist) => dist.sample(rng),
            None => rng.random_range(0..self.pool),
        }
    }

    /// Draws two distinct pool indices.
    ///
    /// # Panics
    /// Panics if the pool holds fewer than two individuals.
    pub fn pick_pair<R: Rng>(&self, rng: &mut R) -> (usize, usize) {
        assert!(self.pool >= 2, "parent pool needs at least two individuals");
        let first = self.pick(rng);
        let mut second = self.pick(rng);
        while second == first {
            second = self.pick(rng);
        }
        (first, second)
    }
}
