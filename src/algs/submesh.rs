//! Submesh extraction: restricting a connectivity to a subset of its patches.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::data::nd_array::NdArray;
use crate::mesh_error::MeshGlueError;
use crate::topology::connectivity::MultiPatchConnectivity;
use crate::topology::union_find::canonicalize;

/// Bidirectional mapping between parent and submesh unique node indices.
///
/// Deserialization rejects maps that are not inverse of each other.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawMaps")]
pub struct SubmeshMaps {
    pub parent_to_sub: HashMap<usize, usize>,
    pub sub_to_parent: Vec<usize>,
}

#[derive(Deserialize)]
struct RawMaps {
    parent_to_sub: HashMap<usize, usize>,
    sub_to_parent: Vec<usize>,
}

impl TryFrom<RawMaps> for SubmeshMaps {
    type Error = MeshGlueError;

    fn try_from(raw: RawMaps) -> Result<Self, Self::Error> {
        let maps = Self::from_sub_to_parent(raw.sub_to_parent);
        if maps.parent_to_sub != raw.parent_to_sub {
            return Err(MeshGlueError::NonCanonicalIndices(
                "parent_to_sub is not the inverse of sub_to_parent".to_owned(),
            ));
        }
        Ok(maps)
    }
}

impl SubmeshMaps {
    fn from_sub_to_parent(sub_to_parent: Vec<usize>) -> Self {
        let parent_to_sub = sub_to_parent
            .iter()
            .enumerate()
            .map(|(sub, &parent)| (parent, sub))
            .collect();
        Self {
            parent_to_sub,
            sub_to_parent,
        }
    }

    /// Number of unique nodes in the submesh.
    pub fn len(&self) -> usize {
        self.sub_to_parent.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sub_to_parent.is_empty()
    }
}

/// Renumber the parent unique indices of the collected grids into a new
/// canonical connectivity.
///
/// `parent_inds` holds the grids of `shape_by_patch` concatenated and raveled.
pub(crate) fn recanonicalize(
    parent_inds: &[usize],
    shape_by_patch: Vec<Vec<usize>>,
) -> Result<(MultiPatchConnectivity, SubmeshMaps), MeshGlueError> {
    let (labels, distinct) = canonicalize(parent_inds);
    let conn = MultiPatchConnectivity::from_canonical(labels, shape_by_patch, distinct.len())?;
    Ok((conn, SubmeshMaps::from_sub_to_parent(distinct)))
}

impl MultiPatchConnectivity {
    /// Keep the patches listed in `patches_to_keep`, in that order.
    ///
    /// Returns the restricted connectivity, the kept descriptors and the
    /// mapping from the new unique indices to this connectivity's.
    pub fn subset<S: Clone>(
        &self,
        descriptors: &[S],
        patches_to_keep: &[usize],
    ) -> Result<(MultiPatchConnectivity, Vec<S>, SubmeshMaps), MeshGlueError> {
        if descriptors.len() != self.nb_patches() {
            return Err(MeshGlueError::PatchCountMismatch {
                expected: self.nb_patches(),
                found: descriptors.len(),
            });
        }
        if let Some(&index) = patches_to_keep.iter().find(|&&p| p >= self.nb_patches()) {
            return Err(MeshGlueError::InvalidPatchIndex {
                index,
                nb_patches: self.nb_patches(),
            });
        }
        let separated = self.separated_unique_nodes_inds()?;
        let parent_inds: Vec<usize> = patches_to_keep
            .iter()
            .flat_map(|&p| separated[p].iter().copied())
            .collect();
        let shapes = patches_to_keep
            .iter()
            .map(|&p| self.shape_by_patch()[p].clone())
            .collect();
        let (conn, maps) = recanonicalize(&parent_inds, shapes)?;
        log::debug!(
            "subset of {} patches: {} unique nodes out of {}",
            patches_to_keep.len(),
            conn.nb_unique_nodes(),
            self.nb_unique_nodes()
        );
        let kept = patches_to_keep.iter().map(|&p| descriptors[p].clone()).collect();
        Ok((conn, kept, maps))
    }

    /// Restrict a unique field `(..., nb_unique_nodes)` of this connectivity
    /// to the unique nodes of a submesh.
    pub fn restrict_unique_field<T: Clone>(
        &self,
        unique_field: &NdArray<T>,
        maps: &SubmeshMaps,
    ) -> Result<NdArray<T>, MeshGlueError> {
        let found = unique_field.shape().last().copied().unwrap_or(0);
        if unique_field.ndim() == 0 || found != self.nb_unique_nodes() {
            return Err(MeshGlueError::LengthMismatch {
                what: "unique field nodes",
                expected: self.nb_unique_nodes(),
                found,
            });
        }
        if let Some(&index) = maps.sub_to_parent.iter().find(|&&u| u >= found) {
            return Err(MeshGlueError::NodeIndexOutOfRange {
                index,
                nb_nodes: found,
            });
        }
        let components = unique_field.len() / found.max(1);
        let src = unique_field.as_slice();
        let mut data = Vec::with_capacity(components * maps.len());
        for c in 0..components {
            let row = &src[c * found..(c + 1) * found];
            data.extend(maps.sub_to_parent.iter().map(|&u| row[u].clone()));
        }
        let shape = unique_field.shape()[..unique_field.ndim() - 1]
            .iter()
            .copied()
            .chain([maps.len()])
            .collect();
        NdArray::from_vec(shape, data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Three 1D patches of 3 nodes chained end to end: 9 unpacked, 7 unique.
    fn chain() -> MultiPatchConnectivity {
        MultiPatchConnectivity::from_coincidence_pairs(
            &[(2, 3), (5, 6)],
            vec![vec![3], vec![3], vec![3]],
        )
        .unwrap()
    }

    #[test]
    fn subset_renumbers_kept_patches() {
        let conn = chain();
        let (sub, kept, maps) = conn.subset(&["a", "b", "c"], &[2, 1]).unwrap();
        assert_eq!(kept, vec!["c", "b"]);
        assert_eq!(sub.nb_unique_nodes(), 5);
        assert_eq!(maps.sub_to_parent, vec![2, 3, 4, 5, 6]);
        assert_eq!(maps.parent_to_sub[&4], 2);
        // patch "c" starts at parent unique node 4
        assert_eq!(sub.unique_nodes_inds(), &[2, 3, 4, 0, 1, 2]);
    }

    #[test]
    fn subset_back_mapping_recovers_parent_indices() {
        let conn = chain();
        let (sub, _, maps) = conn.subset(&[(); 3], &[0, 2]).unwrap();
        let parent = conn.separated_unique_nodes_inds().unwrap();
        let expected: Vec<usize> = parent[0].iter().chain(parent[2].iter()).copied().collect();
        let mapped: Vec<usize> = sub
            .unique_nodes_inds()
            .iter()
            .map(|&u| maps.sub_to_parent[u])
            .collect();
        assert_eq!(mapped, expected);
    }

    #[test]
    fn subset_rejects_bad_inputs() {
        let conn = chain();
        assert!(matches!(
            conn.subset(&[(); 3], &[3]),
            Err(MeshGlueError::InvalidPatchIndex { index: 3, nb_patches: 3 })
        ));
        assert!(matches!(
            conn.subset(&[(); 2], &[0]),
            Err(MeshGlueError::PatchCountMismatch { expected: 3, found: 2 })
        ));
    }

    #[test]
    fn restrict_follows_back_mapping() {
        let conn = chain();
        let (_, _, maps) = conn.subset(&[(); 3], &[1]).unwrap();
        let field = NdArray::from_shape_fn(vec![2, 7], |i| 10 * i[0] + i[1]);
        let restricted = conn.restrict_unique_field(&field, &maps).unwrap();
        assert_eq!(restricted.shape(), &[2, 3]);
        assert_eq!(restricted.as_slice(), &[2, 3, 4, 12, 13, 14]);
    }
}
