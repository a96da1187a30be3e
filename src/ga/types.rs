//! Population members.

use crate::error::Result;
use crate::tree::{cost, DemandMatrix, TreeLayout};

/// One layout in the population with its lazily computed cost.
#[derive(Debug, Clone, PartialEq)]
pub struct Individual {
    layout: TreeLayout,
    cost: Option<f64>,
    weight: f64,
}

impl Individual {
    /// An unevaluated individual.
    pub fn new(layout: TreeLayout) -> Self {
        Self {
            layout,
            cost: None,
            weight: 0.0,
        }
    }

    /// An individual with a known cost.
    pub fn with_cost(layout: TreeLayout, cost: f64) -> Self {
        Self {
            layout,
            cost: Some(cost),
            weight: 0.0,
        }
    }

    pub fn layout(&self) -> &TreeLayout {
        &self.layout
    }

    pub fn into_layout(self) -> TreeLayout {
        self.layout
    }

    /// Cached cost, `None` until evaluated.
    pub fn cost(&self) -> Option<f64> {
        self.cost
    }

    /// Cached cost, `+∞` until evaluated. Used for ordering.
    pub(crate) fn cost_or_worst(&self) -> f64 {
        self.cost.unwrap_or(f64::INFINITY)
    }

    /// Computes and caches the cost if it is not known yet.
    pub fn evaluate(&mut self, demand: &DemandMatrix) -> Result<f64> {
        match self.cost {
            Some(c) => Ok(c),
            None => {
                let c = cost(&self.layout, demand)?;
                self.cost = Some(c);
                Ok(c)
            }
        }
    }

    /// Selection weight assigned in the last generation.
    pub fn weight(&self) -> f64 {
        self.weight
    }

    pub(crate) fn set_weight(&mut self, weight: f64) {
        self.weight = weight;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_evaluate_caches() {
        let demand = DemandMatrix::from_queries(2, &[(0, 1)]).unwrap();
        let mut ind = Individual::new(TreeLayout::from_parents(vec![None, Some(0)]));
        assert_eq!(ind.cost(), None);
        assert_eq!(ind.cost_or_worst(), f64::INFINITY);
        assert_eq!(ind.evaluate(&demand).unwrap(), 1.0);
        assert_eq!(ind.cost(), Some(1.0));
    }

    #[test]
    fn test_known_cost_not_recomputed() {
        let demand = DemandMatrix::from_queries(2, &[(0, 1)]).unwrap();
        let mut ind = Individual::with_cost(TreeLayout::from_parents(vec![None, Some(0)]), 7.0);
        assert_eq!(ind.evaluate(&demand).unwrap(), 7.0);
    }
}
