//! Geometric detection of coincident control points across patches.
//!
//! Every control point of each patch is compared with every control point of
//! all the patches before it; pairs closer than `epsilon` are coincident. The
//! comparison is not restricted to boundaries: it costs
//! `O(total_nodes^2)` distance evaluations and is meant for meshes of up to a
//! few tens of thousands of nodes. For larger meshes, build the connectivity
//! from [`BorderCorrespondences`](crate::algs::correspondence::BorderCorrespondences)
//! instead, which only compares boundary grids.
//!
//! With the `rayon` feature the comparison runs in parallel over the earlier
//! points; the pair order is the same as in the serial path.

#[cfg(feature = "rayon")]
use rayon::prelude::*;

use crate::data::nd_array::NdArray;
use crate::mesh_error::MeshGlueError;
use crate::topology::connectivity::MultiPatchConnectivity;

/// Default distance below which two control points are the same node.
pub const DEFAULT_COINCIDENCE_EPSILON: f64 = 1e-10;

/// Node count above which the quadratic search logs a warning.
const QUADRATIC_WARNING_NODES: usize = 50_000;

/// Physical dimension and grid shape of every patch, checked for
/// consistency.
fn patch_shapes(ctrl_pts: &[NdArray<f64>]) -> Result<(usize, Vec<Vec<usize>>), MeshGlueError> {
    let first = ctrl_pts.first().ok_or(MeshGlueError::EmptyPatchSet)?;
    let nph = first.shape().first().copied().unwrap_or(0);
    let mut shapes = Vec::with_capacity(ctrl_pts.len());
    for (patch, pts) in ctrl_pts.iter().enumerate() {
        let found = pts.shape().first().copied().unwrap_or(0);
        if pts.ndim() < 2 || found != nph {
            return Err(MeshGlueError::DimensionMismatch {
                what: "physical dimension",
                patch,
                expected: nph,
                found,
            });
        }
        shapes.push(pts.shape()[1..].to_vec());
    }
    Ok((nph, shapes))
}

/// Control points of a `(nph, *grid)` array, one `nph`-vector per node.
fn points_of(pts: &NdArray<f64>, nph: usize) -> Vec<f64> {
    let n = pts.len() / nph.max(1);
    let data = pts.as_slice();
    let mut out = Vec::with_capacity(pts.len());
    for node in 0..n {
        out.extend((0..nph).map(|d| data[d * n + node]));
    }
    out
}

fn close_to(
    previous: &[f64],
    current: &[f64],
    nph: usize,
    p: usize,
    eps2: f64,
    offset: usize,
) -> Vec<(usize, usize)> {
    let a = &previous[p * nph..(p + 1) * nph];
    current
        .chunks_exact(nph)
        .enumerate()
        .filter(|(_, b)| a.iter().zip(*b).map(|(x, y)| (x - y) * (x - y)).sum::<f64>() < eps2)
        .map(|(c, _)| (p, offset + c))
        .collect()
}

/// Unpacked node couples whose control points are closer than `epsilon`,
/// together with the grid shape of every patch.
///
/// `ctrl_pts[p]` has shape `(nph, *grid_shape_p)`. Couples are ordered by
/// patch, then by earlier node, then by current node.
pub fn coincidence_pairs(
    ctrl_pts: &[NdArray<f64>],
    epsilon: f64,
) -> Result<(Vec<(usize, usize)>, Vec<Vec<usize>>), MeshGlueError> {
    let (nph, shapes) = patch_shapes(ctrl_pts)?;
    let total: usize = ctrl_pts.iter().map(|p| p.len() / nph.max(1)).sum();
    if total > QUADRATIC_WARNING_NODES {
        log::warn!(
            "geometric coincidence search over {total} nodes compares every pair of points; \
             consider boundary correspondences instead"
        );
    }
    let eps2 = epsilon * epsilon;
    let mut pairs = Vec::new();
    let mut previous = points_of(&ctrl_pts[0], nph);
    for pts in &ctrl_pts[1..] {
        let current = points_of(pts, nph);
        let offset = previous.len() / nph.max(1);
        #[cfg(feature = "rayon")]
        let found: Vec<Vec<(usize, usize)>> = (0..offset)
            .into_par_iter()
            .map(|p| close_to(&previous, &current, nph, p, eps2, offset))
            .collect();
        #[cfg(not(feature = "rayon"))]
        let found: Vec<Vec<(usize, usize)>> = (0..offset)
            .map(|p| close_to(&previous, &current, nph, p, eps2, offset))
            .collect();
        pairs.extend(found.into_iter().flatten());
        previous.extend(current);
    }
    log::debug!(
        "geometric search over {} patches ({total} nodes) found {} coincident couples",
        ctrl_pts.len(),
        pairs.len()
    );
    Ok((pairs, shapes))
}

impl MultiPatchConnectivity {
    /// Build the connectivity by comparing every couple of control points.
    ///
    /// See the [module documentation](self) for the cost of this search.
    pub fn from_patch_geometry(
        ctrl_pts: &[NdArray<f64>],
        epsilon: f64,
    ) -> Result<Self, MeshGlueError> {
        Self::from_patch_geometry_with_pairs(ctrl_pts, epsilon).map(|(conn, _)| conn)
    }

    /// Same as [`from_patch_geometry`](Self::from_patch_geometry), also
    /// returning the coincident couples that were found.
    pub fn from_patch_geometry_with_pairs(
        ctrl_pts: &[NdArray<f64>],
        epsilon: f64,
    ) -> Result<(Self, Vec<(usize, usize)>), MeshGlueError> {
        let (pairs, shapes) = coincidence_pairs(ctrl_pts, epsilon)?;
        let conn = Self::from_coincidence_pairs(&pairs, shapes)?;
        Ok((conn, pairs))
    }
}
