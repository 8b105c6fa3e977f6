//! MultiPatchConnectivity: node numbering shared by a set of spline patches.
//!
//! Each patch owns a control grid; nodes on common boundaries are stored
//! once per patch. The connectivity relates three views of the same nodes:
//! - **unique**: one entry per physically distinct node, `0..nb_unique_nodes`;
//! - **unpacked**: every (patch, grid slot), patches concatenated in order and
//!   each grid raveled row-major, `0..nb_nodes`;
//! - **separated**: one grid per patch, shaped like that patch's control grid.
//!
//! Fields are [`NdArray`]s whose last axis is the node axis; leading axes hold
//! the field shape (`[3]` for a 3D vector field, `[]` for scalars).
//!
//! `unique_nodes_inds[i]` is the unique index of unpacked node `i`. Its
//! distinct values are exactly `0..nb_unique_nodes`, so unique fields can be
//! allocated densely. A connectivity is immutable once built; border and
//! subset extraction produce new instances.

use num_traits::{Num, NumCast};
use serde::{Deserialize, Serialize};

use crate::data::nd_array::NdArray;
use crate::data::representation::{FieldIndices, PackMethod, Representation};
use crate::debug_invariants::{DebugInvariants, check_canonical_surjection};
use crate::mesh_error::MeshGlueError;
use crate::topology::union_find::{build_roots, canonicalize};

/// Three-representation node numbering of a multi-patch mesh.
///
/// Deserialization goes through [`MultiPatchConnectivity::new`]; the stored
/// counts must agree with the recomputed ones.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawConnectivity")]
pub struct MultiPatchConnectivity {
    unique_nodes_inds: Vec<usize>,
    shape_by_patch: Vec<Vec<usize>>,
    nb_nodes: usize,
    nb_unique_nodes: usize,
    npa: usize,
}

#[derive(Deserialize)]
struct RawConnectivity {
    unique_nodes_inds: Vec<usize>,
    shape_by_patch: Vec<Vec<usize>>,
    nb_nodes: usize,
    nb_unique_nodes: usize,
    npa: usize,
}

impl TryFrom<RawConnectivity> for MultiPatchConnectivity {
    type Error = MeshGlueError;

    fn try_from(raw: RawConnectivity) -> Result<Self, Self::Error> {
        let conn = Self::new(raw.unique_nodes_inds, raw.shape_by_patch, raw.nb_unique_nodes)?;
        if conn.nb_nodes != raw.nb_nodes {
            return Err(MeshGlueError::LengthMismatch {
                what: "unpacked node count",
                expected: conn.nb_nodes,
                found: raw.nb_nodes,
            });
        }
        if conn.npa != raw.npa {
            return Err(MeshGlueError::DimensionMismatch {
                what: "parametric dimension",
                patch: 0,
                expected: conn.npa,
                found: raw.npa,
            });
        }
        Ok(conn)
    }
}

/// Total number of unpacked nodes of `shape_by_patch`, checking that every
/// patch has the same parametric dimension.
fn count_nodes(shape_by_patch: &[Vec<usize>]) -> Result<(usize, usize), MeshGlueError> {
    let first = shape_by_patch.first().ok_or(MeshGlueError::EmptyPatchSet)?;
    let npa = first.len();
    let mut nb_nodes = 0;
    for (patch, shape) in shape_by_patch.iter().enumerate() {
        if shape.len() != npa {
            return Err(MeshGlueError::DimensionMismatch {
                what: "parametric dimension",
                patch,
                expected: npa,
                found: shape.len(),
            });
        }
        nb_nodes += shape.iter().product::<usize>();
    }
    Ok((nb_nodes, npa))
}

impl MultiPatchConnectivity {
    fn assemble(
        unique_nodes_inds: Vec<usize>,
        shape_by_patch: Vec<Vec<usize>>,
        nb_unique_nodes: usize,
    ) -> Result<Self, MeshGlueError> {
        let (nb_nodes, npa) = count_nodes(&shape_by_patch)?;
        if unique_nodes_inds.len() != nb_nodes {
            return Err(MeshGlueError::LengthMismatch {
                what: "unique node indices",
                expected: nb_nodes,
                found: unique_nodes_inds.len(),
            });
        }
        Ok(Self {
            unique_nodes_inds,
            shape_by_patch,
            nb_nodes,
            nb_unique_nodes,
            npa,
        })
    }

    /// Wrap an already canonical numbering.
    pub fn new(
        unique_nodes_inds: Vec<usize>,
        shape_by_patch: Vec<Vec<usize>>,
        nb_unique_nodes: usize,
    ) -> Result<Self, MeshGlueError> {
        let conn = Self::assemble(unique_nodes_inds, shape_by_patch, nb_unique_nodes)?;
        conn.validate_invariants()?;
        Ok(conn)
    }

    /// Wrap labels produced by [`canonicalize`]; the numbering is only
    /// re-checked when invariant checking is enabled.
    pub(crate) fn from_canonical(
        unique_nodes_inds: Vec<usize>,
        shape_by_patch: Vec<Vec<usize>>,
        nb_unique_nodes: usize,
    ) -> Result<Self, MeshGlueError> {
        let conn = Self::assemble(unique_nodes_inds, shape_by_patch, nb_unique_nodes)?;
        conn.debug_assert_invariants();
        Ok(conn)
    }

    /// Build the numbering from couples of unpacked nodes known to coincide.
    ///
    /// Couples are merged transitively. Unique indices are the ranks of the
    /// class roots in increasing root order, so identical input always yields
    /// the same numbering.
    pub fn from_coincidence_pairs(
        pairs: &[(usize, usize)],
        shape_by_patch: Vec<Vec<usize>>,
    ) -> Result<Self, MeshGlueError> {
        let (nb_nodes, _) = count_nodes(&shape_by_patch)?;
        if let Some(&index) = pairs
            .iter()
            .flat_map(|(a, b)| [a, b])
            .find(|&&i| i >= nb_nodes)
        {
            return Err(MeshGlueError::NodeIndexOutOfRange { index, nb_nodes });
        }
        let roots = build_roots(pairs, nb_nodes);
        let (unique_nodes_inds, distinct) = canonicalize(&roots);
        log::debug!(
            "connectivity from {} coincidence pairs: {} nodes -> {} unique",
            pairs.len(),
            nb_nodes,
            distinct.len()
        );
        Self::from_canonical(unique_nodes_inds, shape_by_patch, distinct.len())
    }

    pub fn unique_nodes_inds(&self) -> &[usize] {
        &self.unique_nodes_inds
    }

    pub fn shape_by_patch(&self) -> &[Vec<usize>] {
        &self.shape_by_patch
    }

    /// Number of unpacked nodes.
    pub fn nb_nodes(&self) -> usize {
        self.nb_nodes
    }

    pub fn nb_unique_nodes(&self) -> usize {
        self.nb_unique_nodes
    }

    pub fn nb_patches(&self) -> usize {
        self.shape_by_patch.len()
    }

    /// Parametric dimension shared by every patch.
    pub fn npa(&self) -> usize {
        self.npa
    }

    /// Start of each patch in the unpacked numbering, plus the final end.
    pub fn patch_offsets(&self) -> Vec<usize> {
        let mut offsets = Vec::with_capacity(self.nb_patches() + 1);
        let mut acc = 0;
        offsets.push(acc);
        for shape in &self.shape_by_patch {
            acc += shape.iter().product::<usize>();
            offsets.push(acc);
        }
        offsets
    }

    fn node_axis<T>(
        &self,
        field: &NdArray<T>,
        expected: usize,
        what: &'static str,
    ) -> Result<usize, MeshGlueError> {
        let found = field.shape().last().copied().unwrap_or(0);
        if field.ndim() == 0 || found != expected {
            return Err(MeshGlueError::LengthMismatch {
                what,
                expected,
                found,
            });
        }
        Ok(field.len() / expected.max(1))
    }

    fn with_node_axis(field_shape: &[usize], nodes: usize) -> Vec<usize> {
        field_shape.iter().copied().chain([nodes]).collect()
    }

    /// Broadcast a unique field `(..., nb_unique_nodes)` to the unpacked
    /// representation `(..., nb_nodes)`.
    pub fn unpack<T: Clone>(&self, unique_field: &NdArray<T>) -> Result<NdArray<T>, MeshGlueError> {
        let components = self.node_axis(unique_field, self.nb_unique_nodes, "unique field nodes")?;
        let src = unique_field.as_slice();
        let mut data = Vec::with_capacity(components * self.nb_nodes);
        for c in 0..components {
            let row = &src[c * self.nb_unique_nodes..(c + 1) * self.nb_unique_nodes];
            data.extend(self.unique_nodes_inds.iter().map(|&u| row[u].clone()));
        }
        let field_shape = &unique_field.shape()[..unique_field.ndim() - 1];
        NdArray::from_vec(Self::with_node_axis(field_shape, self.nb_nodes), data)
    }

    /// Reduce an unpacked field `(..., nb_nodes)` to the unique
    /// representation `(..., nb_unique_nodes)`.
    ///
    /// [`PackMethod::First`] keeps, for each unique node, the value of its
    /// first unpacked slot; [`PackMethod::Mean`] averages all its slots.
    pub fn pack<T>(
        &self,
        unpacked_field: &NdArray<T>,
        method: PackMethod,
    ) -> Result<NdArray<T>, MeshGlueError>
    where
        T: Copy + Num + NumCast,
    {
        let components = self.node_axis(unpacked_field, self.nb_nodes, "unpacked field nodes")?;
        let src = unpacked_field.as_slice();
        let n = self.nb_unique_nodes;
        let mut data = vec![T::zero(); components * n];
        match method {
            PackMethod::First => {
                for c in 0..components {
                    let row = &src[c * self.nb_nodes..(c + 1) * self.nb_nodes];
                    let out = &mut data[c * n..(c + 1) * n];
                    for (&u, &v) in self.unique_nodes_inds.iter().zip(row).rev() {
                        out[u] = v;
                    }
                }
            }
            PackMethod::Mean => {
                let mut counts = vec![0usize; n];
                for &u in &self.unique_nodes_inds {
                    counts[u] += 1;
                }
                for c in 0..components {
                    let row = &src[c * self.nb_nodes..(c + 1) * self.nb_nodes];
                    let out = &mut data[c * n..(c + 1) * n];
                    for (&u, &v) in self.unique_nodes_inds.iter().zip(row) {
                        out[u] = out[u] + v;
                    }
                    for (value, &count) in out.iter_mut().zip(&counts) {
                        let count = T::from(count).ok_or_else(|| {
                            MeshGlueError::UnsupportedMethod(format!(
                                "mean over {count} values is not representable"
                            ))
                        })?;
                        *value = *value / count;
                    }
                }
            }
        }
        let field_shape = &unpacked_field.shape()[..unpacked_field.ndim() - 1];
        NdArray::from_vec(Self::with_node_axis(field_shape, n), data)
    }

    /// Split an unpacked field `(..., nb_nodes)` into one
    /// `(..., *patch_shape)` array per patch.
    pub fn separate<T: Clone>(
        &self,
        unpacked_field: &NdArray<T>,
    ) -> Result<Vec<NdArray<T>>, MeshGlueError> {
        let components = self.node_axis(unpacked_field, self.nb_nodes, "unpacked field nodes")?;
        let src = unpacked_field.as_slice();
        let field_shape = &unpacked_field.shape()[..unpacked_field.ndim() - 1];
        let offsets = self.patch_offsets();
        self.shape_by_patch
            .iter()
            .zip(offsets.windows(2))
            .map(|(patch_shape, range)| {
                let mut data = Vec::with_capacity(components * (range[1] - range[0]));
                for c in 0..components {
                    let base = c * self.nb_nodes;
                    data.extend_from_slice(&src[base + range[0]..base + range[1]]);
                }
                let shape = field_shape.iter().chain(patch_shape).copied().collect();
                NdArray::from_vec(shape, data)
            })
            .collect()
    }

    /// Concatenate per-patch arrays `(..., *patch_shape)` into an unpacked
    /// field `(..., nb_nodes)`.
    pub fn agglomerate<T: Clone>(
        &self,
        separated_field: &[NdArray<T>],
    ) -> Result<NdArray<T>, MeshGlueError> {
        if separated_field.len() != self.nb_patches() {
            return Err(MeshGlueError::PatchCountMismatch {
                expected: self.nb_patches(),
                found: separated_field.len(),
            });
        }
        let first = &separated_field[0];
        if first.ndim() < self.npa {
            return Err(MeshGlueError::ShapeMismatch {
                patch: 0,
                expected: self.shape_by_patch[0].clone(),
                found: first.shape().to_vec(),
            });
        }
        let field_shape = &first.shape()[..first.ndim() - self.npa];
        let components: usize = field_shape.iter().product();
        let per_patch = separated_field.iter().zip(&self.shape_by_patch);
        for (patch, (field, patch_shape)) in per_patch.enumerate() {
            let expected: Vec<usize> = field_shape.iter().chain(patch_shape).copied().collect();
            if field.shape() != expected.as_slice() {
                return Err(MeshGlueError::ShapeMismatch {
                    patch,
                    expected,
                    found: field.shape().to_vec(),
                });
            }
        }
        let offsets = self.patch_offsets();
        let mut data = Vec::with_capacity(components * self.nb_nodes);
        for c in 0..components {
            for (field, range) in separated_field.iter().zip(offsets.windows(2)) {
                let size = range[1] - range[0];
                data.extend_from_slice(&field.as_slice()[c * size..(c + 1) * size]);
            }
        }
        NdArray::from_vec(Self::with_node_axis(field_shape, self.nb_nodes), data)
    }

    /// Indices of a field of shape `field_shape` stored unique-per-node,
    /// laid out in `representation`.
    ///
    /// Index `k * nb_unique_nodes + u` addresses component `k` (row-major over
    /// `field_shape`) of unique node `u`, which is how degree-of-freedom
    /// vectors of vector or tensor fields are numbered.
    pub fn unique_field_indices(
        &self,
        field_shape: &[usize],
        representation: Representation,
    ) -> Result<FieldIndices, MeshGlueError> {
        let count = field_shape.iter().product::<usize>() * self.nb_unique_nodes;
        let unique = NdArray::arange(count)
            .into_shape(Self::with_node_axis(field_shape, self.nb_unique_nodes))?;
        Ok(match representation {
            Representation::Unique => FieldIndices::Unique(unique),
            Representation::Unpacked => FieldIndices::Unpacked(self.unpack(&unique)?),
            Representation::Separated => {
                FieldIndices::Separated(self.separate(&self.unpack(&unique)?)?)
            }
        })
    }

    /// Unique node index of every grid slot, one array per patch.
    pub fn separated_unique_nodes_inds(&self) -> Result<Vec<NdArray<usize>>, MeshGlueError> {
        let unpacked = NdArray::from_vec(vec![self.nb_nodes], self.unique_nodes_inds.clone())?;
        self.separate(&unpacked)
    }

    /// Unpacked mask of nodes whose unique node is shared by two or more
    /// unpacked slots, i.e. nodes lying on an inter-patch seam.
    pub fn duplicate_mask(&self) -> NdArray<bool> {
        let mut counts = vec![0usize; self.nb_unique_nodes];
        for &u in &self.unique_nodes_inds {
            counts[u] += 1;
        }
        NdArray::from_shape_fn(vec![self.nb_nodes], |i| counts[self.unique_nodes_inds[i[0]]] > 1)
    }
}

impl DebugInvariants for MultiPatchConnectivity {
    fn debug_assert_invariants(&self) {
        crate::debug_invariants!(self.validate_invariants(), "MultiPatchConnectivity");
    }

    fn validate_invariants(&self) -> Result<(), MeshGlueError> {
        let (nb_nodes, npa) = count_nodes(&self.shape_by_patch)?;
        if nb_nodes != self.nb_nodes || npa != self.npa {
            return Err(MeshGlueError::LengthMismatch {
                what: "unpacked node count",
                expected: nb_nodes,
                found: self.nb_nodes,
            });
        }
        check_canonical_surjection(&self.unique_nodes_inds, self.nb_unique_nodes)
    }
}
