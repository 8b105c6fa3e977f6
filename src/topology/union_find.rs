//! Disjoint-set merging of node identifiers.
//!
//! This module collapses arbitrary pairwise "same node" relations into
//! equivalence classes over `0..n`. It provides two layers:
//! - free functions [`find`], [`union`] and [`build_roots`] working on flat
//!   `parent`/`rank` arrays,
//! - [`DisjointSets`], an owned structure wrapping the same scratch arrays for
//!   incremental use.
//!
//! Roots are not contiguous; [`canonicalize`] relabels any value array onto a
//! dense, gap-free range.

/// Return the root of `x`, pointing every visited node directly at it.
pub fn find(parent: &mut [usize], x: usize) -> usize {
    let mut root = x;
    while parent[root] != root {
        root = parent[root];
    }
    let mut node = x;
    while parent[node] != root {
        let next = parent[node];
        parent[node] = root;
        node = next;
    }
    root
}

/// Merge the classes of `x` and `y` (union by rank).
///
/// The lower-rank root is attached under the higher-rank one; on ties `y`'s
/// root goes under `x`'s root, whose rank is incremented.
pub fn union(parent: &mut [usize], rank: &mut [u32], x: usize, y: usize) {
    let root_x = find(parent, x);
    let root_y = find(parent, y);
    if root_x == root_y {
        return;
    }
    if rank[root_x] > rank[root_y] {
        parent[root_y] = root_x;
    } else if rank[root_x] < rank[root_y] {
        parent[root_x] = root_y;
    } else {
        parent[root_y] = root_x;
        rank[root_x] += 1;
    }
}

/// Apply every pair of `pairs` to `n` singleton classes and return the root
/// of each element `0..n`.
///
/// Pairs must reference indices in `0..n`.
pub fn build_roots(pairs: &[(usize, usize)], n: usize) -> Vec<usize> {
    let mut sets = DisjointSets::new(n);
    for &(a, b) in pairs {
        debug_assert!(a < n && b < n, "pair ({a}, {b}) out of range for {n} nodes");
        sets.union(a, b);
    }
    sets.roots()
}

/// Relabel `values` by the rank of each value among the sorted distinct
/// values.
///
/// Returns `(labels, distinct)` with `distinct[labels[i]] == values[i]`; the
/// labels cover `0..distinct.len()` without gaps.
pub fn canonicalize(values: &[usize]) -> (Vec<usize>, Vec<usize>) {
    let mut distinct = values.to_vec();
    distinct.sort_unstable();
    distinct.dedup();
    let labels = values
        .iter()
        .map(|v| distinct.partition_point(|d| d < v))
        .collect();
    (labels, distinct)
}

/// Owned union-find scratch over `0..len`.
#[derive(Debug, Clone, Default)]
pub struct DisjointSets {
    parent: Vec<usize>,
    rank: Vec<u32>,
}

impl DisjointSets {
    /// Create `n` singleton classes.
    pub fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
            rank: vec![0; n],
        }
    }

    /// Canonical representative of `x` (with path compression).
    pub fn find(&mut self, x: usize) -> usize {
        find(&mut self.parent, x)
    }

    /// Record that `x` and `y` are the same node.
    pub fn union(&mut self, x: usize, y: usize) {
        union(&mut self.parent, &mut self.rank, x, y);
    }

    /// Root of every element, in element order.
    pub fn roots(mut self) -> Vec<usize> {
        (0..self.parent.len()).map(|i| self.find(i)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chains_collapse_to_one_class() {
        let roots = build_roots(&[(0, 1), (1, 2)], 4);
        assert_eq!(roots[0], roots[1]);
        assert_eq!(roots[1], roots[2]);
        assert_ne!(roots[2], roots[3]);
    }

    #[test]
    fn find_compresses_paths() {
        let mut parent = vec![0, 0, 1, 2];
        assert_eq!(find(&mut parent, 3), 0);
        assert_eq!(parent, vec![0, 0, 0, 0]);
    }

    #[test]
    fn union_by_rank_attaches_lower_rank() {
        let mut parent: Vec<usize> = (0..4).collect();
        let mut rank = vec![0u32; 4];
        union(&mut parent, &mut rank, 0, 1);
        assert_eq!(parent[1], 0);
        assert_eq!(rank[0], 1);
        union(&mut parent, &mut rank, 2, 0);
        assert_eq!(parent[2], 0);
        assert_eq!(rank[0], 1);
        union(&mut parent, &mut rank, 1, 2);
        assert_eq!(rank[0], 1);
    }

    #[test]
    fn canonicalize_is_dense_and_ordered() {
        let (labels, distinct) = canonicalize(&[7, 3, 7, 10, 3]);
        assert_eq!(labels, vec![1, 0, 1, 2, 0]);
        assert_eq!(distinct, vec![3, 7, 10]);
    }

    #[test]
    fn disjoint_sets_track_equivalence() {
        let mut sets = DisjointSets::new(5);
        sets.union(3, 4);
        assert_eq!(sets.find(4), sets.find(3));
        assert_ne!(sets.find(0), sets.find(3));
        assert_eq!(sets.roots().len(), 5);
    }
}
