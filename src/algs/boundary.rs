//! Border extraction: the lower-dimensional mesh formed by patch faces.
//!
//! A patch face lies on the **exterior** boundary of the domain when at least
//! one of its nodes belongs to that patch only, and on the **interior**
//! boundary when every one of its nodes is shared with another patch. The
//! extracted faces become the patches of a new connectivity of parametric
//! dimension `npa - 1`, with face axes in
//! [`face_axes`](crate::topology::orientation::face_axes) order.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::algs::submesh::{SubmeshMaps, recanonicalize};
use crate::mesh_error::MeshGlueError;
use crate::patch::PatchDescriptor;
use crate::topology::connectivity::MultiPatchConnectivity;
use crate::topology::orientation::{Side, extract_face, face_axes};

/// Which patch faces to extract.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum BorderKind {
    /// Faces touching the outer boundary of the domain.
    Exterior,
    /// Faces entirely glued to a neighbouring patch.
    Interior,
}

impl BorderKind {
    fn keeps(self, all_duplicated: bool) -> bool {
        match self {
            BorderKind::Exterior => !all_duplicated,
            BorderKind::Interior => all_duplicated,
        }
    }
}

impl MultiPatchConnectivity {
    /// Extract the faces on the outer boundary of the domain.
    pub fn extract_exterior_borders<S: PatchDescriptor>(
        &self,
        descriptors: &[S],
    ) -> Result<(MultiPatchConnectivity, Vec<S>, SubmeshMaps), MeshGlueError> {
        self.extract_borders(descriptors, BorderKind::Exterior)
    }

    /// Extract the faces shared between patches.
    pub fn extract_interior_borders<S: PatchDescriptor>(
        &self,
        descriptors: &[S],
    ) -> Result<(MultiPatchConnectivity, Vec<S>, SubmeshMaps), MeshGlueError> {
        self.extract_borders(descriptors, BorderKind::Interior)
    }

    /// Extract every patch face of the given kind as a border patch.
    ///
    /// Faces are visited patch by patch, axis by axis, [`Side::Start`] before
    /// [`Side::End`]. A face whose unique nodes are exactly those of a face
    /// already collected is skipped, so a face glued between two patches is
    /// emitted once. Returns the border connectivity, one reduced descriptor
    /// per border patch and the mapping from border unique indices to this
    /// connectivity's unique indices. Fails with
    /// [`MeshGlueError::EmptyPatchSet`] when no face qualifies, e.g. the
    /// exterior border of a closed surface.
    pub fn extract_borders<S: PatchDescriptor>(
        &self,
        descriptors: &[S],
        kind: BorderKind,
    ) -> Result<(MultiPatchConnectivity, Vec<S>, SubmeshMaps), MeshGlueError> {
        let npa = self.npa();
        if npa < 2 {
            return Err(MeshGlueError::DimensionTooLow { npa });
        }
        if descriptors.len() != self.nb_patches() {
            return Err(MeshGlueError::PatchCountMismatch {
                expected: self.nb_patches(),
                found: descriptors.len(),
            });
        }
        let per_patch = descriptors.iter().zip(self.shape_by_patch());
        for (patch, (descriptor, shape)) in per_patch.enumerate() {
            let grid = descriptor.grid_shape();
            if &grid != shape {
                return Err(MeshGlueError::ShapeMismatch {
                    patch,
                    expected: shape.clone(),
                    found: grid,
                });
            }
        }

        let duplicated = self.separate(&self.duplicate_mask())?;
        let unique_inds = self.separated_unique_nodes_inds()?;
        let mut seen: HashSet<Vec<usize>> = HashSet::new();
        let mut parent_inds = Vec::new();
        let mut shapes = Vec::new();
        let mut border_descriptors = Vec::new();
        for (patch, descriptor) in descriptors.iter().enumerate() {
            for axis in 0..npa {
                for side in Side::BOTH {
                    let mask = extract_face(&duplicated[patch], 0, axis, side, 0)?;
                    if !kind.keeps(mask.iter().all(|&d| d)) {
                        continue;
                    }
                    let face = extract_face(&unique_inds[patch], 0, axis, side, 0)?;
                    let mut key = face.as_slice().to_vec();
                    key.sort_unstable();
                    if !seen.insert(key) {
                        continue;
                    }
                    let bases = face_axes(npa, axis, side)
                        .into_iter()
                        .map(|a| descriptor.bases()[a].clone())
                        .collect();
                    border_descriptors.push(S::from_bases(bases));
                    shapes.push(face.shape().to_vec());
                    parent_inds.extend(face.into_vec());
                }
            }
        }
        log::debug!(
            "{kind:?} borders: {} faces out of {} patches",
            shapes.len(),
            self.nb_patches()
        );
        let (conn, maps) = recanonicalize(&parent_inds, shapes)?;
        Ok((conn, border_descriptors, maps))
    }
}
