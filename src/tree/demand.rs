//! Pairwise demand (traffic) between vertices.

use crate::error::{Error, Result};

/// An `n × n` matrix of non-negative pairwise demand.
///
/// `get(u, v)` is the traffic sent from `u` to `v`; the matrix may be
/// asymmetric. Immutable for the duration of one optimization run.
///
/// # Examples
///
/// ```
/// use treelayout::tree::DemandMatrix;
///
/// let demand = DemandMatrix::from_queries(3, &[(0, 1), (0, 1), (2, 0)]).unwrap();
/// assert_eq!(demand.get(0, 1), 2.0);
/// assert_eq!(demand.symmetric(0, 2), 1.0);
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(try_from = "Vec<Vec<f64>>", into = "Vec<Vec<f64>>")
)]
pub struct DemandMatrix {
    n: usize,
    weights: Vec<f64>,
}

impl DemandMatrix {
    /// An all-zero matrix over `n` vertices.
    pub fn zeros(n: usize) -> Self {
        Self {
            n,
            weights: vec![0.0; n * n],
        }
    }

    /// Builds a matrix from dense rows.
    ///
    /// Rejects non-square input and negative or non-finite entries.
    pub fn from_rows(rows: Vec<Vec<f64>>) -> Result<Self> {
        let n = rows.len();
        let mut weights = Vec::with_capacity(n * n);
        for (src, row) in rows.into_iter().enumerate() {
            if row.len() != n {
                return Err(Error::Precondition(format!(
                    "row {src} has {} entries, expected {n}",
                    row.len()
                )));
            }
            for (dst, w) in row.into_iter().enumerate() {
                check_weight(src, dst, w)?;
                weights.push(w);
            }
        }
        Ok(Self { n, weights })
    }

    /// Builds a matrix from a multiset of `(src, dst)` unit-weight queries.
    pub fn from_queries(n: usize, queries: &[(usize, usize)]) -> Result<Self> {
        let mut demand = Self::zeros(n);
        for &(src, dst) in queries {
            if src >= n || dst >= n {
                return Err(Error::Precondition(format!(
                    "query ({src}, {dst}) out of range for {n} vertices"
                )));
            }
            demand.weights[src * n + dst] += 1.0;
        }
        Ok(demand)
    }

    /// Builds a matrix from weighted `(src, dst, weight)` triples.
    ///
    /// Repeated pairs overwrite earlier ones, matching a flow file where each
    /// line sets one entry.
    pub fn from_triples(n: usize, triples: &[(usize, usize, f64)]) -> Result<Self> {
        let mut demand = Self::zeros(n);
        for &(src, dst, w) in triples {
            if src >= n || dst >= n {
                return Err(Error::Precondition(format!(
                    "entry ({src}, {dst}) out of range for {n} vertices"
                )));
            }
            demand.set(src, dst, w)?;
        }
        Ok(demand)
    }

    /// Sets one entry.
    pub fn set(&mut self, src: usize, dst: usize, weight: f64) -> Result<()> {
        check_weight(src, dst, weight)?;
        self.weights[src * self.n + dst] = weight;
        Ok(())
    }

    /// Number of vertices.
    pub fn len(&self) -> usize {
        self.n
    }

    /// True when the matrix covers no vertices.
    pub fn is_empty(&self) -> bool {
        self.n == 0
    }

    /// Demand from `src` to `dst`.
    #[inline]
    pub fn get(&self, src: usize, dst: usize) -> f64 {
        self.weights[src * self.n + dst]
    }

    /// Demand in both directions between `u` and `v`.
    #[inline]
    pub fn symmetric(&self, u: usize, v: usize) -> f64 {
        self.get(u, v) + self.get(v, u)
    }

    /// Row of outgoing demand from `src`.
    pub fn row(&self, src: usize) -> &[f64] {
        &self.weights[src * self.n..(src + 1) * self.n]
    }

    /// Sum of all entries.
    pub fn total(&self) -> f64 {
        self.weights.iter().sum()
    }

    /// Matrix re-indexed by ordering position: `new[i][j] = old[ord[i]][ord[j]]`.
    ///
    /// Lets position-based constructors (the optimal-BST solver) run on a
    /// bisection ordering.
    pub fn reordered(&self, ordering: &[usize]) -> Result<Self> {
        if ordering.len() != self.n {
            return Err(Error::Precondition(format!(
                "ordering has {} vertices, demand has {}",
                ordering.len(),
                self.n
            )));
        }
        let mut weights = Vec::with_capacity(self.n * self.n);
        for &src in ordering {
            for &dst in ordering {
                weights.push(self.get(src, dst));
            }
        }
        Ok(Self { n: self.n, weights })
    }
}

/// Dense rows, checked like [`DemandMatrix::from_rows`].
impl TryFrom<Vec<Vec<f64>>> for DemandMatrix {
    type Error = Error;

    fn try_from(rows: Vec<Vec<f64>>) -> Result<Self> {
        Self::from_rows(rows)
    }
}

impl From<DemandMatrix> for Vec<Vec<f64>> {
    fn from(demand: DemandMatrix) -> Self {
        if demand.n == 0 {
            return Vec::new();
        }
        demand.weights.chunks(demand.n).map(<[f64]>::to_vec).collect()
    }
}

fn check_weight(src: usize, dst: usize, w: f64) -> Result<()> {
    if !w.is_finite() || w < 0.0 {
        return Err(Error::Precondition(format!(
            "demand ({src}, {dst}) must be finite and non-negative, got {w}"
        )));
    }
    Ok(())
}
