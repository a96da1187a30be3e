//! Layout constructors that need no demand information.

use super::layout::TreeLayout;
use rand::Rng;

/// Converts an ordering into a balanced tree by recursive median split.
///
/// The element at `mid = (lo + hi) / 2` of the current range becomes the
/// local root under the given parent; `[lo, mid)` and `[mid + 1, hi)` are
/// attached below it. The in-order traversal of the result is `ordering`,
/// and the shape depends only on `ordering.len()`.
///
/// # Panics
/// Panics if `ordering` is not a permutation of `0..ordering.len()`.
///
/// # Examples
///
/// ```
/// use treelayout::tree::build_balanced;
///
/// let layout = build_balanced(&[0, 1, 2, 3, 4, 5, 6]);
/// assert_eq!(layout.root(), Some(3));
/// assert_eq!(layout.height(), 3);
/// ```
pub fn build_balanced(ordering: &[usize]) -> TreeLayout {
    let n = ordering.len();
    let mut parents = vec![None; n];
    let mut seen = vec![false; n];
    for &v in ordering {
        assert!(v < n && !seen[v], "ordering must be a permutation of 0..{n}");
        seen[v] = true;
    }

    attach_median(ordering, 0, n, None, &mut parents);
    TreeLayout::from_parents(parents)
}

fn attach_median(
    ordering: &[usize],
    lo: usize,
    hi: usize,
    parent: Option<usize>,
    parents: &mut [Option<usize>],
) {
    if lo >= hi {
        return;
    }
    let mid = (lo + hi) / 2;
    let root = ordering[mid];
    parents[root] = parent;

    attach_median(ordering, lo, mid, Some(root), parents);
    attach_median(ordering, mid + 1, hi, Some(root), parents);
}

/// A random valid layout over `n` vertices.
///
/// Vertices are visited in shuffled order; the first becomes the root and
/// every later one hangs under a uniformly chosen vertex that still has a
/// free child slot.
///
/// # Panics
/// Panics if `n == 0`.
pub fn random_layout<R: Rng>(n: usize, rng: &mut R) -> TreeLayout {
    assert!(n > 0, "layout needs at least one vertex");

    let mut order: Vec<usize> = (0..n).collect();
    crate::random::shuffle(&mut order, rng);

    let mut parents = vec![None; n];
    let mut free = vec![0u8; n];
    let mut open = Vec::with_capacity(n);

    free[order[0]] = 2;
    open.push(order[0]);
    for &v in &order[1..] {
        let slot = rng.random_range(0..open.len());
        let p = open[slot];
        parents[v] = Some(p);
        free[p] -= 1;
        if free[p] == 0 {
            open.swap_remove(slot);
        }
        free[v] = 2;
        open.push(v);
    }

    TreeLayout::from_parents(parents)
}
