//! Combinatorial search for glued patch faces.
//!
//! For every pair of patches `p1 < p2`, every face of `p1` is tested against
//! every face of `p2` under every alignment of an [`AlignmentTable`]. The
//! tests run cheapest first: degrees, grid extents and knot counts per
//! transpose, then reflected knot vectors and control points per flip. The
//! first alignment passing every test is recorded; a degenerate (e.g.
//! symmetric) face pair admitting several alignments therefore gets the one
//! that comes first in table order.

use itertools::iproduct;
#[cfg(feature = "rayon")]
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::{BorderCorrespondence, BorderCorrespondences};
use crate::data::nd_array::NdArray;
use crate::mesh_error::MeshGlueError;
use crate::patch::{BSplineBasis, PatchDescriptor};
use crate::topology::orientation::{AlignmentTable, AxisAlignment, Side, extract_face, face_axes};

/// Tolerances of the face matching tests.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchConfig {
    /// Relative tolerance on control points.
    pub rtol: f64,
    /// Absolute tolerance on control points.
    pub atol: f64,
    /// Absolute tolerance on knot values.
    pub knot_tolerance: f64,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            rtol: 1e-5,
            atol: 1e-8,
            knot_tolerance: 1e-12,
        }
    }
}

impl MatchConfig {
    /// `|a - b| <= atol + rtol * |b|` for every entry.
    fn all_close(&self, a: &NdArray<f64>, b: &NdArray<f64>) -> bool {
        a.shape() == b.shape()
            && a.iter()
                .zip(b.iter())
                .all(|(x, y)| (x - y).abs() <= self.atol + self.rtol * y.abs())
    }

    fn knots_match(&self, a: &[BSplineBasis], b: &[BSplineBasis]) -> bool {
        a.iter().zip(b).all(|(ba, bb)| {
            ba.knots()
                .iter()
                .zip(bb.knots())
                .all(|(x, y)| (x - y).abs() <= self.knot_tolerance)
        })
    }
}

/// One boundary face of a patch: its control points `(nph, *face_shape)` and
/// per-axis bases, both in face order.
struct Face {
    axis: usize,
    side: Side,
    points: NdArray<f64>,
    bases: Vec<BSplineBasis>,
}

fn faces_of<S: PatchDescriptor>(
    ctrl_pts: &NdArray<f64>,
    descriptor: &S,
) -> Result<Vec<Face>, MeshGlueError> {
    let npa = descriptor.npa();
    iproduct!(0..npa, Side::BOTH)
        .map(|(axis, side)| {
            Ok(Face {
                axis,
                side,
                points: extract_face(ctrl_pts, 1, axis, side, 0)?,
                bases: face_axes(npa, axis, side)
                    .into_iter()
                    .map(|a| descriptor.bases()[a].clone())
                    .collect(),
            })
        })
        .collect()
}

/// First alignment of `table` mapping `f2` onto `f1`, if any.
fn match_faces(
    f1: &Face,
    f2: &Face,
    table: &AlignmentTable,
    config: &MatchConfig,
) -> Result<Option<AxisAlignment>, MeshGlueError> {
    let shape1 = &f1.points.shape()[1..];
    let shape2 = &f2.points.shape()[1..];
    let dim = table.dim();
    for transpose in table.transposes() {
        let compatible = (0..dim).all(|i| {
            let (b1, b2) = (&f1.bases[i], &f2.bases[transpose[i]]);
            b1.degree() == b2.degree()
                && shape1[i] == shape2[transpose[i]]
                && b1.knots().len() == b2.knots().len()
        });
        if !compatible {
            continue;
        }
        for flip in table.flips() {
            let alignment = AxisAlignment {
                transpose: transpose.clone(),
                flip: flip.clone(),
            };
            if !config.knots_match(&f1.bases, &alignment.apply_to_bases(&f2.bases)) {
                continue;
            }
            if config.all_close(&f1.points, &alignment.apply(&f2.points, 1)?) {
                return Ok(Some(alignment));
            }
        }
    }
    Ok(None)
}

/// Every matched face pair between patches `p1` and `p2`, in
/// `(axis1, axis2, side1, side2)` order.
fn match_patches(
    (p1, p2): (usize, usize),
    faces: &[Vec<Face>],
    table: &AlignmentTable,
    config: &MatchConfig,
) -> Result<Vec<BorderCorrespondence>, MeshGlueError> {
    let npa = table.dim() + 1;
    let mut found = Vec::new();
    // faces_of lists faces as (axis, side); candidates are (axis1, axis2, side1, side2)
    for (axis1, axis2, side1, side2) in iproduct!(0..npa, 0..npa, Side::BOTH, Side::BOTH) {
        let f1 = &faces[p1][2 * axis1 + usize::from(side1.is_end())];
        let f2 = &faces[p2][2 * axis2 + usize::from(side2.is_end())];
        debug_assert!(f1.axis == axis1 && f1.side == side1 && f2.axis == axis2 && f2.side == side2);
        if let Some(alignment) = match_faces(f1, f2, table, config)? {
            log::trace!(
                "patch {p1} face ({axis1}, {side1:?}) matches patch {p2} face ({axis2}, {side2:?}) \
                 with transpose {:?} flip {:?}",
                alignment.transpose,
                alignment.flip
            );
            found.push(BorderCorrespondence {
                patch1: p1,
                patch2: p2,
                axis1,
                axis2,
                side1,
                side2,
                alignment,
            });
        }
    }
    Ok(found)
}

/// Parametric and physical dimension shared by every patch.
fn check_patches<S: PatchDescriptor>(
    ctrl_pts: &[NdArray<f64>],
    descriptors: &[S],
) -> Result<usize, MeshGlueError> {
    if ctrl_pts.len() != descriptors.len() {
        return Err(MeshGlueError::PatchCountMismatch {
            expected: descriptors.len(),
            found: ctrl_pts.len(),
        });
    }
    let (first_pts, first) = ctrl_pts
        .first()
        .zip(descriptors.first())
        .ok_or(MeshGlueError::EmptyPatchSet)?;
    let npa = first.npa();
    if npa == 0 {
        return Err(MeshGlueError::DimensionTooLow { npa });
    }
    let nph = first_pts.shape().first().copied().unwrap_or(0);
    for (patch, (pts, descriptor)) in ctrl_pts.iter().zip(descriptors).enumerate() {
        if descriptor.npa() != npa {
            return Err(MeshGlueError::DimensionMismatch {
                what: "parametric dimension",
                patch,
                expected: npa,
                found: descriptor.npa(),
            });
        }
        let found = pts.shape().first().copied().unwrap_or(0);
        if pts.ndim() == 0 || found != nph {
            return Err(MeshGlueError::DimensionMismatch {
                what: "physical dimension",
                patch,
                expected: nph,
                found,
            });
        }
        let grid = descriptor.grid_shape();
        if pts.shape()[1..] != grid[..] {
            return Err(MeshGlueError::ShapeMismatch {
                patch,
                expected: grid,
                found: pts.shape()[1..].to_vec(),
            });
        }
    }
    Ok(npa)
}

impl BorderCorrespondences {
    /// Find every glued face pair of a set of patches.
    ///
    /// `ctrl_pts[p]` has shape `(nph, *grid_shape)` where `grid_shape` is
    /// `descriptors[p].grid_shape()`. Records are ordered by `(patch1,
    /// patch2, axis1, axis2, side1, side2)`, with or without the `rayon`
    /// feature.
    pub fn from_patches<S>(
        ctrl_pts: &[NdArray<f64>],
        descriptors: &[S],
        config: &MatchConfig,
    ) -> Result<Self, MeshGlueError>
    where
        S: PatchDescriptor,
    {
        let npa = check_patches(ctrl_pts, descriptors)?;
        let table = AlignmentTable::new(npa - 1);
        let faces = ctrl_pts
            .iter()
            .zip(descriptors)
            .map(|(pts, descriptor)| faces_of(pts, descriptor))
            .collect::<Result<Vec<_>, _>>()?;
        let n = descriptors.len();
        let pairs: Vec<(usize, usize)> = (0..n)
            .flat_map(|p1| (p1 + 1..n).map(move |p2| (p1, p2)))
            .collect();

        #[cfg(feature = "rayon")]
        let per_pair: Vec<Vec<BorderCorrespondence>> = pairs
            .par_iter()
            .map(|&pair| match_patches(pair, &faces, &table, config))
            .collect::<Result<_, _>>()?;
        #[cfg(not(feature = "rayon"))]
        let per_pair: Vec<Vec<BorderCorrespondence>> = pairs
            .iter()
            .map(|&pair| match_patches(pair, &faces, &table, config))
            .collect::<Result<_, _>>()?;

        let records: Vec<_> = per_pair.into_iter().flatten().collect();
        log::debug!(
            "border search over {} patch pairs ({} alignments each): {} matches",
            pairs.len(),
            table.len(),
            records.len()
        );
        Self::new(npa, records)
    }
}
