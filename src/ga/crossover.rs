//! Tree-preserving crossover.
//!
//! Offspring start as a copy of the first parent. Every non-root vertex is
//! visited once, in random order, and may be re-hung under a new parent:
//! its parent in the second parent (crossover) or a random vertex with a
//! free slot (mutation). A re-hang that would break the binary-tree shape
//! is repaired on the spot by a local rotation, so the working tree is a
//! valid binary tree after every step.

use crate::error::{Error, Result};
use crate::tree::TreeLayout;
use rand::Rng;

/// Set of vertices with O(1) insert, remove and uniform sampling.
#[derive(Debug, Clone)]
struct IndexedSet {
    items: Vec<usize>,
    slot: Vec<Option<usize>>,
}

impl IndexedSet {
    fn new(n: usize) -> Self {
        Self {
            items: Vec::with_capacity(n),
            slot: vec![None; n],
        }
    }

    fn insert(&mut self, v: usize) {
        if self.slot[v].is_none() {
            self.slot[v] = Some(self.items.len());
            self.items.push(v);
        }
    }

    fn remove(&mut self, v: usize) {
        if let Some(idx) = self.slot[v].take() {
            self.items.swap_remove(idx);
            if let Some(&moved) = self.items.get(idx) {
                self.slot[moved] = Some(idx);
            }
        }
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.items.len()
    }

    fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    fn sample<R: Rng>(&self, rng: &mut R) -> usize {
        self.items[rng.random_range(0..self.items.len())]
    }
}

/// How the proposed parent relates to the vertex being moved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Relation {
    /// The candidate lies in the vertex's subtree, reached through child `via`.
    Below { via: usize },
    /// The candidate is a proper ancestor of the vertex.
    Above,
    Unrelated,
}

/// Working tree with child lists and the open-slot registry kept in sync.
struct Workspace {
    parents: Vec<Option<usize>>,
    children: Vec<Vec<usize>>,
    open: IndexedSet,
}

impl Workspace {
    fn new(layout: &TreeLayout) -> Self {
        let n = layout.len();
        let children = layout.children();
        let mut open = IndexedSet::new(n);
        for (v, kids) in children.iter().enumerate() {
            if kids.len() < 2 {
                open.insert(v);
            }
        }
        Self {
            parents: layout.parents().to_vec(),
            children,
            open,
        }
    }

    fn refresh(&mut self, v: usize) {
        if self.children[v].len() < 2 {
            self.open.insert(v);
        } else {
            self.open.remove(v);
        }
    }

    /// Moves `v` under `parent`. Slot limits are not checked here; callers
    /// restore them before the step ends.
    fn relink(&mut self, v: usize, parent: usize) {
        if let Some(old) = self.parents[v] {
            self.children[old].retain(|&c| c != v);
            self.refresh(old);
        }
        self.parents[v] = Some(parent);
        self.children[parent].push(v);
        self.refresh(parent);
    }

    fn random_child<R: Rng>(&self, v: usize, rng: &mut R) -> usize {
        let kids = &self.children[v];
        kids[rng.random_range(0..kids.len())]
    }

    /// Walks up from `v` and `candidate` in lock-step until one reaches the
    /// other or both reach the root.
    fn probe(&self, v: usize, candidate: usize) -> Relation {
        let mut from_candidate = Some(candidate);
        let mut last = candidate;
        let mut from_vertex = Some(v);

        while from_candidate.is_some() || from_vertex.is_some() {
            if let Some(x) = from_candidate {
                if x == v {
                    return Relation::Below { via: last };
                }
                last = x;
                from_candidate = self.parents[x];
            }
            if let Some(y) = from_vertex {
                if y == candidate {
                    return Relation::Above;
                }
                from_vertex = self.parents[y];
            }
        }
        Relation::Unrelated
    }
}

/// Breeds one offspring from two parent layouts over the same vertex set.
///
/// Each non-root vertex `v` is resolved once. With probability
/// `mutation_probability` it is proposed a uniformly random vertex with a
/// free slot; with probability `crossover_probability` its parent in
/// `second`; otherwise it keeps its place. A proposal equal to `v` or to its
/// current parent is ignored. Otherwise:
///
/// - candidate below `v` (through child `s`): `v` moves under the
///   candidate and `s` takes `v`'s old place; if the candidate was full,
///   one of its children moves under `v`.
/// - candidate above or unrelated, with a free slot: `v` moves under it.
/// - candidate above or unrelated and full: `v` replaces one of its
///   children, which moves under `v`; if `v` was full, one of `v`'s
///   children first takes `v`'s old place.
///
/// Every relocated vertex counts as resolved, so the loop ends after at
/// most `n - 1` steps.
///
/// # Errors
/// - [`Error::Precondition`] if the parents differ in size or either is
///   not a valid tree.
/// - [`Error::InvariantViolation`] if the offspring fails validation.
///
/// # Examples
///
/// ```
/// use treelayout::ga::cross;
/// use treelayout::random::create_rng;
/// use treelayout::tree::{build_balanced, random_layout};
///
/// let mut rng = create_rng(1);
/// let a = build_balanced(&[0, 1, 2, 3, 4, 5, 6]);
/// let b = random_layout(7, &mut rng);
/// let child = cross(&a, &b, 0.02, 0.5, &mut rng).unwrap();
/// assert!(child.validate());
/// ```
pub fn cross<R: Rng>(
    first: &TreeLayout,
    second: &TreeLayout,
    mutation_probability: f64,
    crossover_probability: f64,
    rng: &mut R,
) -> Result<TreeLayout> {
    breed(first, second, mutation_probability, crossover_probability, rng).map(|(child, _)| child)
}

/// [`cross`] plus the number of vertices drawn from the work set.
fn breed<R: Rng>(
    first: &TreeLayout,
    second: &TreeLayout,
    mutation_probability: f64,
    crossover_probability: f64,
    rng: &mut R,
) -> Result<(TreeLayout, usize)> {
    let n = first.len();
    if second.len() != n {
        return Err(Error::Precondition(format!(
            "parents differ in size: {n} and {}",
            second.len()
        )));
    }
    if !first.validate() || !second.validate() {
        return Err(Error::Precondition("parents must be valid trees".into()));
    }

    let mut ws = Workspace::new(first);
    let mut pending = IndexedSet::new(n);
    for v in (0..n).filter(|&v| ws.parents[v].is_some()) {
        pending.insert(v);
    }

    let mut steps = 0;
    while !pending.is_empty() {
        steps += 1;
        let v = pending.sample(rng);
        pending.remove(v);

        let p: f64 = rng.random();
        let candidate = if p < mutation_probability && !ws.open.is_empty() {
            Some(ws.open.sample(rng))
        } else if p > 1.0 - crossover_probability {
            second.parent(v)
        } else {
            None
        };

        let (Some(c), Some(par)) = (candidate, ws.parents[v]) else {
            continue;
        };
        if c == v || c == par {
            continue;
        }

        match ws.probe(v, c) {
            Relation::Below { via } => {
                let displaced = (ws.children[c].len() >= 2).then(|| ws.random_child(c, rng));
                ws.relink(via, par);
                ws.relink(v, c);
                if let Some(k) = displaced {
                    ws.relink(k, v);
                    pending.remove(k);
                }
                pending.remove(via);
            }
            Relation::Above | Relation::Unrelated if ws.children[c].len() < 2 => {
                ws.relink(v, c);
            }
            Relation::Above | Relation::Unrelated => {
                let k = ws.random_child(c, rng);
                if ws.children[v].len() >= 2 {
                    let g = ws.random_child(v, rng);
                    ws.relink(g, par);
                    pending.remove(g);
                }
                ws.relink(v, c);
                ws.relink(k, v);
                pending.remove(k);
            }
        }
    }

    let child = TreeLayout::from_parents(ws.parents);
    if !child.validate() {
        return Err(Error::InvariantViolation(format!(
            "crossover produced an invalid tree: {:?}",
            child.parents()
        )));
    }
    Ok((child, steps))
}
