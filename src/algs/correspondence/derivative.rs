//! Basis derivatives on both sides of a glued face.
//!
//! Given points on the face of `patch1` (face coordinates, in face axis
//! order) and a derivative order per parametric axis of `patch1`, the basis
//! functions of `patch1` are differentiated at those points, and the basis
//! functions of `patch2` are differentiated at the matching points and
//! expressed with respect to `patch1`'s parametric coordinates. Values are
//! then directly comparable, e.g. to impose derivative continuity.

use std::collections::HashMap;
use std::collections::hash_map::Entry;

use itertools::Itertools;

use super::BorderCorrespondences;
use crate::mesh_error::MeshGlueError;
use crate::patch::BasisDerivatives;
use crate::topology::orientation::Side;

type BasisValues = Vec<Vec<f64>>;

fn side_bound((lo, hi): (f64, f64), side: Side) -> f64 {
    match side {
        Side::Start => lo,
        Side::End => hi,
    }
}

impl BorderCorrespondences {
    /// Derivatives of the basis functions of both patches of record `index`
    /// at the face points `xi_border`.
    ///
    /// Each entry of `xi_border` holds `npa - 1` coordinates in the face
    /// order of `patch1`; `orders[a]` is the derivative order along axis `a`
    /// of `patch1`. Both results have one row per point; the second holds
    /// `patch2`'s basis derivatives pulled back to `patch1`'s frame through
    /// the [`operator`](Self::operator) of the record.
    pub fn compute_boundary_derivative<S: BasisDerivatives>(
        &self,
        index: usize,
        descriptors: &[S],
        xi_border: &[Vec<f64>],
        orders: &[usize],
    ) -> Result<(BasisValues, BasisValues), MeshGlueError> {
        let npa = self.npa();
        let r = self.get(index)?;
        let patch = |p: usize| {
            descriptors.get(p).ok_or(MeshGlueError::InvalidPatchIndex {
                index: p,
                nb_patches: descriptors.len(),
            })
        };
        let (s1, s2) = (patch(r.patch1)?, patch(r.patch2)?);
        if orders.len() != npa {
            return Err(MeshGlueError::LengthMismatch {
                what: "derivative orders",
                expected: npa,
                found: orders.len(),
            });
        }
        if let Some(bad) = xi_border.iter().find(|xi| xi.len() + 1 != npa) {
            return Err(MeshGlueError::LengthMismatch {
                what: "face coordinates",
                expected: npa - 1,
                found: bad.len(),
            });
        }
        let (spans1, spans2) = (s1.spans(), s2.spans());
        let op = self.operator(&spans1, &spans2, index)?;

        let face1 = r.face_axes1(npa);
        let bound1 = side_bound(spans1[r.axis1], r.side1);
        let bound2 = side_bound(spans2[r.axis2], r.side2);
        let points1: Vec<Vec<f64>> = xi_border
            .iter()
            .map(|xb| {
                let mut xi = vec![bound1; npa];
                for (&a, &x) in face1.iter().zip(xb) {
                    xi[a] = x;
                }
                xi
            })
            .collect();
        let points2 = points1
            .iter()
            .map(|xi| {
                let mut mapped = op.apply(xi)?;
                // the face coordinate is exact, rescaling may round it off the span
                mapped[r.axis2] = bound2;
                Ok(mapped)
            })
            .collect::<Result<Vec<_>, MeshGlueError>>()?;

        let dn1 = s1.basis_derivatives(&points1, orders)?;
        // derivative axis sequence: axis a repeated orders[a] times
        let sequence: Vec<usize> = orders
            .iter()
            .enumerate()
            .flat_map(|(a, &k)| std::iter::repeat_n(a, k))
            .collect();
        if sequence.is_empty() {
            return Ok((dn1, s2.basis_derivatives(&points2, orders)?));
        }

        // d^k/dξ1_{i1..ik} = Σ_j Π_m a[j_m, i_m] d^k/dξ2_{j1..jk}
        let mut cache: HashMap<Vec<usize>, BasisValues> = HashMap::new();
        let mut dn2: Option<BasisValues> = None;
        for js in (0..sequence.len()).map(|_| 0..npa).multi_cartesian_product() {
            let weight: f64 = js.iter().zip(&sequence).map(|(&j, &i)| op.a[(j, i)]).product();
            if weight == 0.0 {
                continue;
            }
            let mut counts = vec![0; npa];
            for &j in &js {
                counts[j] += 1;
            }
            let values = match cache.entry(counts) {
                Entry::Occupied(e) => e.into_mut(),
                Entry::Vacant(e) => {
                    let values = s2.basis_derivatives(&points2, e.key())?;
                    e.insert(values)
                }
            };
            let acc = dn2
                .get_or_insert_with(|| values.iter().map(|row| vec![0.0; row.len()]).collect());
            for (acc_row, row) in acc.iter_mut().zip(values.iter()) {
                for (out, v) in acc_row.iter_mut().zip(row) {
                    *out += weight * v;
                }
            }
        }
        log::trace!(
            "boundary derivative of record {index}: {} patch2 evaluations for order {}",
            cache.len(),
            sequence.len()
        );
        let dn2 = match dn2 {
            Some(values) => values,
            None => s2
                .basis_derivatives(&points2, orders)?
                .into_iter()
                .map(|row| vec![0.0; row.len()])
                .collect(),
        };
        Ok((dn1, dn2))
    }
}
