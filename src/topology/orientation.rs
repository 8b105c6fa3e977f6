//! Boundary faces of tensor-product grids and the signed axis permutations
//! that align one face frame onto another.
//!
//! A boundary face of an `npa`-dimensional grid is selected by an `axis` and a
//! [`Side`]. Its `npa - 1` remaining axes are listed as `axis+1..npa` followed
//! by `0..axis`, reversed on the [`Side::Start`] side, so that the face frames
//! of opposite sides keep a consistent orientation.
//!
//! [`AxisAlignment`] is an element of the hyperoctahedral group on the face
//! axes (a permutation plus a reflection per axis). [`AlignmentTable`]
//! enumerates the whole group once so that searches can share it.

use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::data::nd_array::NdArray;
use crate::mesh_error::MeshGlueError;
use crate::patch::BSplineBasis;

/// Extremal slice of a grid along one axis.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Side {
    /// Index 0, parametric coordinate at the lower span bound.
    Start,
    /// Last index, parametric coordinate at the upper span bound.
    End,
}

impl Side {
    pub const BOTH: [Side; 2] = [Side::Start, Side::End];

    /// Grid index of this side (moved `offset` slices inwards) on an axis of
    /// extent `n`.
    #[inline]
    pub fn index(self, n: usize, offset: usize) -> usize {
        match self {
            Side::Start => offset,
            Side::End => n - 1 - offset,
        }
    }

    /// Unit-cube coordinate of this side.
    #[inline]
    pub fn unit_coordinate(self) -> f64 {
        match self {
            Side::Start => 0.0,
            Side::End => 1.0,
        }
    }

    #[inline]
    pub fn is_end(self) -> bool {
        self == Side::End
    }
}

/// Axes of the boundary face `(axis, side)`, in face order.
pub fn face_axes(npa: usize, axis: usize, side: Side) -> Vec<usize> {
    let mut axes: Vec<usize> = (axis + 1..npa).chain(0..axis).collect();
    if side == Side::Start {
        axes.reverse();
    }
    axes
}

/// Extract the boundary face `(axis, side)` of a grid whose first `lead`
/// axes are field axes.
///
/// The result has shape `(*field_shape, *face_shape)` with face axes in
/// [`face_axes`] order. `offset` selects the slice `offset` steps inside the
/// boundary.
pub fn extract_face<T: Clone>(
    field: &NdArray<T>,
    lead: usize,
    axis: usize,
    side: Side,
    offset: usize,
) -> Result<NdArray<T>, MeshGlueError> {
    let ndim = field.ndim();
    if lead + axis >= ndim {
        return Err(MeshGlueError::InvalidAxis {
            axis: lead + axis,
            ndim,
        });
    }
    let npa = ndim - lead;
    let extent = field.shape()[lead + axis];
    if offset >= extent {
        return Err(MeshGlueError::LengthMismatch {
            what: "face offset",
            expected: extent,
            found: offset,
        });
    }
    let slice = field.take(lead + axis, side.index(extent, offset))?;
    // positions of the face axes once `axis` has been removed
    let reduced = face_axes(npa, axis, side)
        .into_iter()
        .map(|a| lead + if a > axis { a - 1 } else { a });
    let order: Vec<usize> = (0..lead).chain(reduced).collect();
    slice.permute_axes(&order)
}

/// Signed permutation of face axes.
///
/// Applied to a face grid, axis `i` of the result is axis `transpose[i]` of
/// the input, reversed when `flip[i]` is set.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawAlignment")]
pub struct AxisAlignment {
    pub transpose: Vec<usize>,
    pub flip: Vec<bool>,
}

#[derive(Deserialize)]
struct RawAlignment {
    transpose: Vec<usize>,
    flip: Vec<bool>,
}

impl TryFrom<RawAlignment> for AxisAlignment {
    type Error = MeshGlueError;

    fn try_from(raw: RawAlignment) -> Result<Self, Self::Error> {
        Self::new(raw.transpose, raw.flip)
    }
}

impl AxisAlignment {
    /// Checked constructor: `transpose` must be a permutation of
    /// `0..flip.len()`.
    pub fn new(transpose: Vec<usize>, flip: Vec<bool>) -> Result<Self, MeshGlueError> {
        if transpose.len() != flip.len() {
            return Err(MeshGlueError::LengthMismatch {
                what: "alignment flips",
                expected: transpose.len(),
                found: flip.len(),
            });
        }
        let alignment = Self { transpose, flip };
        if !alignment.is_permutation() {
            let dim = alignment.dim();
            let axis = alignment
                .transpose
                .iter()
                .copied()
                .find(|&t| t >= dim)
                .unwrap_or(dim);
            return Err(MeshGlueError::InvalidAxis { axis, ndim: dim });
        }
        Ok(alignment)
    }

    pub fn identity(dim: usize) -> Self {
        Self {
            transpose: (0..dim).collect(),
            flip: vec![false; dim],
        }
    }

    pub fn dim(&self) -> usize {
        self.transpose.len()
    }

    /// Whether `transpose` lists every axis of `0..dim` exactly once.
    pub fn is_permutation(&self) -> bool {
        let mut seen = vec![false; self.dim()];
        self.transpose
            .iter()
            .all(|&t| t < seen.len() && !std::mem::replace(&mut seen[t], true))
    }

    /// Permute and reflect the trailing face axes of `field`, leaving the
    /// first `lead` axes untouched.
    pub fn apply<T: Clone>(
        &self,
        field: &NdArray<T>,
        lead: usize,
    ) -> Result<NdArray<T>, MeshGlueError> {
        if field.ndim() != lead + self.dim() {
            return Err(MeshGlueError::LengthMismatch {
                what: "face grid dimensions",
                expected: lead + self.dim(),
                found: field.ndim(),
            });
        }
        let order: Vec<usize> = (0..lead)
            .chain(self.transpose.iter().map(|&t| lead + t))
            .collect();
        let mut out = field.permute_axes(&order)?;
        for (i, _) in self.flip.iter().enumerate().filter(|(_, f)| **f) {
            out = out.flip(lead + i)?;
        }
        Ok(out)
    }

    /// Permute and reflect per-axis bases; reflected axes get reflected knots.
    pub fn apply_to_bases(&self, bases: &[BSplineBasis]) -> Vec<BSplineBasis> {
        self.transpose
            .iter()
            .zip(&self.flip)
            .map(|(&t, &f)| if f { bases[t].reflected() } else { bases[t].clone() })
            .collect()
    }
}

/// Every alignment of a `dim`-dimensional face, enumerated once.
///
/// Transposes are in lexicographic order; flips enumerate the binary counter
/// with the first axis as the most significant bit.
#[derive(Debug, Clone)]
pub struct AlignmentTable {
    dim: usize,
    transposes: Vec<Vec<usize>>,
    flips: Vec<Vec<bool>>,
}

impl AlignmentTable {
    pub fn new(dim: usize) -> Self {
        let transposes = if dim == 0 {
            vec![Vec::new()]
        } else {
            (0..dim).permutations(dim).collect()
        };
        let flips = (0..1usize << dim)
            .map(|m| (0..dim).map(|i| (m >> (dim - 1 - i)) & 1 == 1).collect())
            .collect();
        Self {
            dim,
            transposes,
            flips,
        }
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn transposes(&self) -> &[Vec<usize>] {
        &self.transposes
    }

    pub fn flips(&self) -> &[Vec<bool>] {
        &self.flips
    }

    /// Number of alignments, `dim! * 2^dim`.
    pub fn len(&self) -> usize {
        self.transposes.len() * self.flips.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn face_axes_rotate_and_reverse() {
        assert_eq!(face_axes(3, 1, Side::End), vec![2, 0]);
        assert_eq!(face_axes(3, 1, Side::Start), vec![0, 2]);
        assert_eq!(face_axes(3, 0, Side::End), vec![1, 2]);
        assert_eq!(face_axes(2, 1, Side::Start), vec![0]);
    }

    #[test]
    fn extract_face_orders_axes() {
        let grid = NdArray::arange(24).into_shape(vec![2, 3, 4]).unwrap();
        let face = extract_face(&grid, 0, 1, Side::End, 0).unwrap();
        assert_eq!(face.shape(), &[4, 2]);
        for k in 0..4 {
            for i in 0..2 {
                assert_eq!(face[&[k, i][..]], grid[&[i, 2, k][..]]);
            }
        }
        let inner = extract_face(&grid, 0, 1, Side::Start, 1).unwrap();
        assert_eq!(inner.shape(), &[2, 4]);
        assert_eq!(inner[&[1, 3][..]], grid[&[1, 1, 3][..]]);
    }

    #[test]
    fn apply_permutes_then_flips() {
        let a = AxisAlignment {
            transpose: vec![1, 0],
            flip: vec![true, false],
        };
        let grid = NdArray::arange(6).into_shape(vec![2, 3]).unwrap();
        let out = a.apply(&grid, 0).unwrap();
        assert_eq!(out.shape(), &[3, 2]);
        for i in 0..3 {
            for j in 0..2 {
                assert_eq!(out[&[i, j][..]], grid[&[j, 2 - i][..]]);
            }
        }
    }

    #[test]
    fn checked_constructor_validates_shape() {
        assert!(AxisAlignment::new(vec![1, 0], vec![true, false]).is_ok());
        assert!(matches!(
            AxisAlignment::new(vec![0, 1], vec![true]),
            Err(MeshGlueError::LengthMismatch { .. })
        ));
        assert!(matches!(
            AxisAlignment::new(vec![0, 3], vec![false, false]),
            Err(MeshGlueError::InvalidAxis { axis: 3, ndim: 2 })
        ));
    }

    #[test]
    fn permutation_check_rejects_repeats() {
        assert!(AxisAlignment::identity(3).is_permutation());
        let repeated = AxisAlignment {
            transpose: vec![1, 1],
            flip: vec![false, false],
        };
        assert!(!repeated.is_permutation());
        let out_of_range = AxisAlignment {
            transpose: vec![0, 2],
            flip: vec![false, false],
        };
        assert!(!out_of_range.is_permutation());
    }

    #[test]
    fn table_enumerates_group() {
        let table = AlignmentTable::new(2);
        assert_eq!(table.len(), 8);
        assert_eq!(table.flips()[1], vec![false, true]);
        assert_eq!(table.transposes().len() * table.flips().len(), 8);
        assert_eq!(AlignmentTable::new(0).len(), 1);
    }
}
