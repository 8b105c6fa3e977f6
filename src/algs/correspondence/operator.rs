//! Affine map between the parametric frames of two glued patches.
//!
//! For a record gluing `patch1` to `patch2`, [`BorderCorrespondences::operator`]
//! builds `(A, b)` such that a parametric point `ξ1` of `patch1` near the
//! shared face maps to `ξ2 = A ξ1 + b` in `patch2`. The map is assembled in
//! unit coordinates, where the glued face axes are permuted and reflected
//! and the matched axis continues across the face, then rescaled to the
//! actual spans of both patches.

use nalgebra::{DMatrix, DVector};

use super::BorderCorrespondences;
use crate::data::nd_array::NdArray;
use crate::mesh_error::MeshGlueError;

/// `ξ2 = a ξ1 + b`.
#[derive(Debug, Clone, PartialEq)]
pub struct AffineOperator {
    pub a: DMatrix<f64>,
    pub b: DVector<f64>,
}

impl AffineOperator {
    pub fn dim(&self) -> usize {
        self.b.len()
    }

    /// Map a parametric point of `patch1` to `patch2`.
    pub fn apply(&self, xi: &[f64]) -> Result<Vec<f64>, MeshGlueError> {
        if xi.len() != self.dim() {
            return Err(MeshGlueError::LengthMismatch {
                what: "parametric point",
                expected: self.dim(),
                found: xi.len(),
            });
        }
        let mapped = &self.a * DVector::from_column_slice(xi) + &self.b;
        Ok(mapped.iter().copied().collect())
    }

    /// Express an order-`order` derivative tensor taken in `patch2`'s frame
    /// in `patch1`'s frame.
    ///
    /// The first `order` axes of `tensor` are derivative axes of extent
    /// `dim()`; trailing axes are carried along. Each derivative axis is
    /// contracted with `a`: `R[i..] = Σ_j a[j, i] T[j..]`.
    pub fn pull_back(
        &self,
        tensor: &NdArray<f64>,
        order: usize,
    ) -> Result<NdArray<f64>, MeshGlueError> {
        let n = self.dim();
        if tensor.ndim() < order || tensor.shape()[..order].iter().any(|&e| e != n) {
            return Err(MeshGlueError::LengthMismatch {
                what: "derivative tensor axes",
                expected: n,
                found: tensor.shape().first().copied().unwrap_or(0),
            });
        }
        let mut out = tensor.clone();
        for axis in 0..order {
            let current = out;
            out = NdArray::from_shape_fn(current.shape().to_vec(), |index| {
                let mut source = index.to_vec();
                (0..n)
                    .map(|j| {
                        source[axis] = j;
                        self.a[(j, index[axis])] * current[&source[..]]
                    })
                    .sum()
            });
        }
        Ok(out)
    }
}

impl BorderCorrespondences {
    /// Affine map from the parametric domain of `patch1` to that of `patch2`
    /// for record `index`; `spans1`/`spans2` are the per-axis spans of both
    /// patches.
    pub fn operator(
        &self,
        spans1: &[(f64, f64)],
        spans2: &[(f64, f64)],
        index: usize,
    ) -> Result<AffineOperator, MeshGlueError> {
        let npa = self.npa();
        for spans in [spans1, spans2] {
            if spans.len() != npa {
                return Err(MeshGlueError::LengthMismatch {
                    what: "parametric spans",
                    expected: npa,
                    found: spans.len(),
                });
            }
        }
        let r = self.get(index)?;

        // unit cube of patch1 -> unit cube of patch2
        let mut a = DMatrix::<f64>::zeros(npa, npa);
        let mut b = DVector::<f64>::zeros(npa);
        // the matched axis runs back into patch2 when both faces share a side
        let sign = if r.side1 == r.side2 { -1.0 } else { 1.0 };
        a[(r.axis2, r.axis1)] = sign;
        b[r.axis2] = r.side2.unit_coordinate() - sign * r.side1.unit_coordinate();
        let f1 = r.face_axes1(npa);
        let f2 = r.face_axes2(npa);
        for (i, (&t, &flip)) in r.alignment.transpose.iter().zip(&r.alignment.flip).enumerate() {
            let row = f2[t];
            a[(row, f1[i])] = if flip { -1.0 } else { 1.0 };
            b[row] = if flip { 1.0 } else { 0.0 };
        }

        let to_unit = DMatrix::from_diagonal(&DVector::from_iterator(
            npa,
            spans1.iter().map(|(lo, hi)| 1.0 / (hi - lo)),
        ));
        let unit_shift = DVector::from_iterator(npa, spans1.iter().map(|(lo, hi)| -lo / (hi - lo)));
        let from_unit = DMatrix::from_diagonal(&DVector::from_iterator(
            npa,
            spans2.iter().map(|(lo, hi)| hi - lo),
        ));
        let origin2 = DVector::from_iterator(npa, spans2.iter().map(|(lo, _)| *lo));

        let b = origin2 + &from_unit * b + &from_unit * &a * unit_shift;
        let a = &from_unit * a * to_unit;
        Ok(AffineOperator { a, b })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algs::correspondence::BorderCorrespondence;
    use crate::topology::orientation::{AxisAlignment, Side};

    /// Patch 0's last row glued, reversed, to patch 1's last column.
    fn glued() -> BorderCorrespondences {
        BorderCorrespondences::new(
            2,
            vec![BorderCorrespondence {
                patch1: 0,
                patch2: 1,
                axis1: 0,
                axis2: 1,
                side1: Side::End,
                side2: Side::End,
                alignment: AxisAlignment {
                    transpose: vec![0],
                    flip: vec![true],
                },
            }],
        )
        .unwrap()
    }

    #[test]
    fn unit_operator_maps_shared_face() {
        let op = glued().operator(&[(0.0, 1.0); 2], &[(0.0, 1.0); 2], 0).unwrap();
        assert_eq!(op.apply(&[1.0, 0.0]).unwrap(), vec![1.0, 1.0]);
        assert_eq!(op.apply(&[1.0, 1.0]).unwrap(), vec![0.0, 1.0]);
        // crossing the face from patch1 enters patch2 from its last column
        assert_eq!(op.apply(&[0.75, 0.0]).unwrap(), vec![1.0, 1.25]);
    }

    #[test]
    fn spans_rescale_both_ends() {
        let op = glued()
            .operator(&[(0.0, 2.0), (1.0, 3.0)], &[(-1.0, 1.0), (0.0, 4.0)], 0)
            .unwrap();
        let p = op.apply(&[2.0, 1.0]).unwrap();
        assert!((p[0] - 1.0).abs() < 1e-14 && (p[1] - 4.0).abs() < 1e-14);
        let q = op.apply(&[2.0, 3.0]).unwrap();
        assert!((q[0] + 1.0).abs() < 1e-14 && (q[1] - 4.0).abs() < 1e-14);
    }

    #[test]
    fn pull_back_contracts_each_derivative_axis() {
        let op = glued().operator(&[(0.0, 1.0); 2], &[(0.0, 2.0); 2], 0).unwrap();
        // a = [[0, -2], [-2, 0]]
        let hessian = NdArray::from_vec(vec![2, 2], vec![1.0, 2.0, 3.0, 4.0]).unwrap();
        let pulled = op.pull_back(&hessian, 2).unwrap();
        assert_eq!(pulled.as_slice(), &[16.0, 12.0, 8.0, 4.0]);
        assert!(op.pull_back(&hessian, 3).is_err());
    }
}
