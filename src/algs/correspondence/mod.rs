//! Border correspondences: which patch faces are glued together, and how.
//!
//! A [`BorderCorrespondence`] records that face `(axis1, side1)` of `patch1`
//! coincides with face `(axis2, side2)` of `patch2` once the face axes of
//! `patch2` are aligned onto those of `patch1` by an [`AxisAlignment`].
//! Records are found by [`BorderCorrespondences::from_patches`] and only ever
//! emitted for verified matches.
//!
//! From the records this module derives
//! - the node connectivity, without any distance computation
//!   ([`BorderCorrespondences::connectivity`]);
//! - aligned pairs of boundary fields and boundary descriptors;
//! - the affine map between the parametric frames of two glued patches
//!   ([`operator`]) and basis derivatives transported across it
//!   ([`derivative`]).

pub mod derivative;
pub mod operator;
pub mod search;

pub use operator::AffineOperator;
pub use search::MatchConfig;

use serde::{Deserialize, Serialize};

use crate::data::nd_array::NdArray;
use crate::mesh_error::MeshGlueError;
use crate::patch::{BSplineBasis, PatchDescriptor};
use crate::topology::connectivity::MultiPatchConnectivity;
use crate::topology::orientation::{AxisAlignment, Side, extract_face, face_axes};

/// One matched pair of patch faces.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BorderCorrespondence {
    pub patch1: usize,
    pub patch2: usize,
    pub axis1: usize,
    pub axis2: usize,
    pub side1: Side,
    pub side2: Side,
    /// Maps the face grid of `patch2` onto the face grid of `patch1`.
    pub alignment: AxisAlignment,
}

impl BorderCorrespondence {
    /// Face axes of `patch1`, in face order.
    pub fn face_axes1(&self, npa: usize) -> Vec<usize> {
        face_axes(npa, self.axis1, self.side1)
    }

    /// Face axes of `patch2`, in face order.
    pub fn face_axes2(&self, npa: usize) -> Vec<usize> {
        face_axes(npa, self.axis2, self.side2)
    }
}

/// Every matched face pair of a set of patches.
///
/// Deserialization goes through [`BorderCorrespondences::new`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawCorrespondences")]
pub struct BorderCorrespondences {
    npa: usize,
    records: Vec<BorderCorrespondence>,
}

#[derive(Deserialize)]
struct RawCorrespondences {
    npa: usize,
    records: Vec<BorderCorrespondence>,
}

impl TryFrom<RawCorrespondences> for BorderCorrespondences {
    type Error = MeshGlueError;

    fn try_from(raw: RawCorrespondences) -> Result<Self, Self::Error> {
        Self::new(raw.npa, raw.records)
    }
}

impl BorderCorrespondences {
    /// Wrap records found elsewhere; every alignment must be a signed
    /// permutation of `npa - 1` face axes.
    pub fn new(npa: usize, records: Vec<BorderCorrespondence>) -> Result<Self, MeshGlueError> {
        for (index, record) in records.iter().enumerate() {
            if record.axis1 >= npa || record.axis2 >= npa {
                return Err(MeshGlueError::InvalidAxis {
                    axis: record.axis1.max(record.axis2),
                    ndim: npa,
                });
            }
            let alignment = &record.alignment;
            if alignment.dim() + 1 != npa
                || alignment.flip.len() != alignment.dim()
                || !alignment.is_permutation()
            {
                return Err(MeshGlueError::InvalidCorrespondence {
                    index,
                    len: records.len(),
                });
            }
        }
        Ok(Self { npa, records })
    }

    /// Parametric dimension of the matched patches.
    pub fn npa(&self) -> usize {
        self.npa
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[BorderCorrespondence] {
        &self.records
    }

    pub fn iter(&self) -> std::slice::Iter<'_, BorderCorrespondence> {
        self.records.iter()
    }

    pub fn get(&self, index: usize) -> Result<&BorderCorrespondence, MeshGlueError> {
        self.records.get(index).ok_or(MeshGlueError::InvalidCorrespondence {
            index,
            len: self.records.len(),
        })
    }

    /// Boundary slices of both patches of every record, the `patch2` slice
    /// aligned onto the `patch1` one.
    ///
    /// `separated_field[p]` has shape `(*field_shape, *patch_shape)`; `offset`
    /// selects the slice that many steps inside the boundary.
    pub fn border_pairs<T: Clone>(
        &self,
        separated_field: &[NdArray<T>],
        offset: usize,
    ) -> Result<Vec<(NdArray<T>, NdArray<T>)>, MeshGlueError> {
        self.records
            .iter()
            .map(|r| {
                let field1 = patch_of(separated_field, r.patch1)?;
                let field2 = patch_of(separated_field, r.patch2)?;
                let lead1 = self.lead_axes(field1, r.patch1)?;
                let lead2 = self.lead_axes(field2, r.patch2)?;
                let border1 = extract_face(field1, lead1, r.axis1, r.side1, offset)?;
                let border2 = extract_face(field2, lead2, r.axis2, r.side2, offset)?;
                Ok((border1, r.alignment.apply(&border2, lead2)?))
            })
            .collect()
    }

    /// Reduced descriptors of both faces of every record, the `patch2` one
    /// aligned onto the `patch1` one (reflected axes get reflected knots).
    pub fn border_descriptor_pairs<S: PatchDescriptor>(
        &self,
        descriptors: &[S],
    ) -> Result<Vec<(S, S)>, MeshGlueError> {
        self.records
            .iter()
            .map(|r| {
                let s1 = patch_of(descriptors, r.patch1)?;
                let s2 = patch_of(descriptors, r.patch2)?;
                let face_bases = |s: &S, axes: Vec<usize>| -> Vec<BSplineBasis> {
                    axes.into_iter().map(|a| s.bases()[a].clone()).collect()
                };
                let bases1 = face_bases(s1, r.face_axes1(self.npa));
                let bases2 = face_bases(s2, r.face_axes2(self.npa));
                Ok((
                    S::from_bases(bases1),
                    S::from_bases(r.alignment.apply_to_bases(&bases2)),
                ))
            })
            .collect()
    }

    /// Node connectivity implied by the records alone.
    ///
    /// The unpacked indices of both faces of every record are aligned and
    /// paired, then merged by [`MultiPatchConnectivity::from_coincidence_pairs`].
    pub fn connectivity(
        &self,
        shape_by_patch: Vec<Vec<usize>>,
    ) -> Result<MultiPatchConnectivity, MeshGlueError> {
        let mut grids = Vec::with_capacity(shape_by_patch.len());
        let mut start = 0;
        for shape in &shape_by_patch {
            if shape.len() != self.npa {
                return Err(MeshGlueError::DimensionMismatch {
                    what: "parametric dimension",
                    patch: grids.len(),
                    expected: self.npa,
                    found: shape.len(),
                });
            }
            let size: usize = shape.iter().product();
            let grid = NdArray::from_vec(shape.clone(), (start..start + size).collect())?;
            grids.push(grid);
            start += size;
        }
        let mut pairs = Vec::new();
        for (record, (border1, border2)) in self.records.iter().zip(self.border_pairs(&grids, 0)?) {
            if border1.shape() != border2.shape() {
                return Err(MeshGlueError::ShapeMismatch {
                    patch: record.patch2,
                    expected: border1.shape().to_vec(),
                    found: border2.shape().to_vec(),
                });
            }
            pairs.extend(border1.iter().copied().zip(border2.iter().copied()));
        }
        log::debug!(
            "{} border correspondences give {} coincident couples",
            self.records.len(),
            pairs.len()
        );
        MultiPatchConnectivity::from_coincidence_pairs(&pairs, shape_by_patch)
    }

    fn lead_axes<T>(&self, field: &NdArray<T>, patch: usize) -> Result<usize, MeshGlueError> {
        field
            .ndim()
            .checked_sub(self.npa)
            .ok_or(MeshGlueError::DimensionMismatch {
                what: "parametric dimension",
                patch,
                expected: self.npa,
                found: field.ndim(),
            })
    }
}

fn patch_of<T>(items: &[T], index: usize) -> Result<&T, MeshGlueError> {
    items.get(index).ok_or(MeshGlueError::InvalidPatchIndex {
        index,
        nb_patches: items.len(),
    })
}
