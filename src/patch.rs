//! Patch descriptors: the narrow interface to per-patch spline objects.
//!
//! The connectivity layer never evaluates basis functions itself. It reads
//! degrees, knot vectors and parametric spans through [`PatchDescriptor`],
//! builds reduced border descriptors with [`PatchDescriptor::from_bases`], and
//! asks [`BasisDerivatives`] for derivative values only when transforming
//! derivatives across a matched boundary.
//!
//! [`BSpline`] is a plain-data descriptor implementing [`PatchDescriptor`];
//! spline libraries implement the traits on their own types.

use serde::{Deserialize, Serialize};

use crate::mesh_error::MeshGlueError;

/// Degree and knot vector of one parametric axis.
///
/// Deserialization goes through [`BSplineBasis::new`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawBasis")]
pub struct BSplineBasis {
    degree: usize,
    knots: Vec<f64>,
}

#[derive(Deserialize)]
struct RawBasis {
    degree: usize,
    knots: Vec<f64>,
}

impl TryFrom<RawBasis> for BSplineBasis {
    type Error = MeshGlueError;

    fn try_from(raw: RawBasis) -> Result<Self, Self::Error> {
        Self::new(raw.degree, raw.knots)
    }
}

impl BSplineBasis {
    /// Build a basis; the knot vector needs at least `2 * (degree + 1)` finite,
    /// non-decreasing entries spanning a non-empty domain.
    pub fn new(degree: usize, knots: Vec<f64>) -> Result<Self, MeshGlueError> {
        let expected = 2 * (degree + 1);
        if knots.len() < expected {
            return Err(MeshGlueError::LengthMismatch {
                what: "knot vector",
                expected,
                found: knots.len(),
            });
        }
        if knots.iter().any(|k| !k.is_finite()) || knots.windows(2).any(|w| w[1] < w[0]) {
            return Err(MeshGlueError::InvalidKnotVector(format!(
                "knots must be finite and non-decreasing, got {knots:?}"
            )));
        }
        if knots[degree] >= knots[knots.len() - degree - 1] {
            return Err(MeshGlueError::InvalidKnotVector(format!(
                "degree {degree} knots {knots:?} span an empty domain"
            )));
        }
        Ok(Self { degree, knots })
    }

    pub fn degree(&self) -> usize {
        self.degree
    }

    pub fn knots(&self) -> &[f64] {
        &self.knots
    }

    /// Number of basis functions, i.e. control nodes along this axis.
    pub fn nb_functions(&self) -> usize {
        self.knots.len() - self.degree - 1
    }

    /// Parametric domain `[knots[p], knots[m - p - 1]]`.
    pub fn span(&self) -> (f64, f64) {
        (self.knots[self.degree], self.knots[self.knots.len() - self.degree - 1])
    }

    /// Knot vector reflected about its domain, `lo + hi - reverse(knots)`.
    pub fn reflected_knots(&self) -> Vec<f64> {
        let (lo, hi) = self.span();
        self.knots.iter().rev().map(|k| lo + hi - k).collect()
    }

    /// The same basis parameterized in the opposite direction.
    pub fn reflected(&self) -> Self {
        Self {
            degree: self.degree,
            knots: self.reflected_knots(),
        }
    }
}

/// Read access to a patch's tensor-product spline space.
pub trait PatchDescriptor: Clone {
    /// Per-axis bases, in parametric axis order.
    fn bases(&self) -> &[BSplineBasis];

    /// Build a descriptor of the tensor product of `bases`.
    fn from_bases(bases: Vec<BSplineBasis>) -> Self;

    /// Parametric dimension.
    fn npa(&self) -> usize {
        self.bases().len()
    }

    fn degrees(&self) -> Vec<usize> {
        self.bases().iter().map(BSplineBasis::degree).collect()
    }

    fn knots(&self) -> Vec<&[f64]> {
        self.bases().iter().map(BSplineBasis::knots).collect()
    }

    fn spans(&self) -> Vec<(f64, f64)> {
        self.bases().iter().map(BSplineBasis::span).collect()
    }

    /// Control grid extent per axis.
    fn grid_shape(&self) -> Vec<usize> {
        self.bases().iter().map(BSplineBasis::nb_functions).collect()
    }
}

/// Basis-derivative evaluation supplied by a spline library.
pub trait BasisDerivatives: PatchDescriptor {
    /// Mixed partial derivative of every basis function at every point.
    ///
    /// `points` holds full parametric coordinates (`npa` values each) and
    /// `orders[a]` is the derivative order along axis `a`. The result has one
    /// row per point and one column per basis function, basis functions
    /// raveled row-major over the control grid.
    fn basis_derivatives(
        &self,
        points: &[Vec<f64>],
        orders: &[usize],
    ) -> Result<Vec<Vec<f64>>, MeshGlueError>;
}

/// Plain-data tensor-product B-spline descriptor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BSpline {
    bases: Vec<BSplineBasis>,
}

impl BSpline {
    /// Build from per-axis degrees and knot vectors.
    pub fn new(degrees: &[usize], knots: Vec<Vec<f64>>) -> Result<Self, MeshGlueError> {
        if degrees.len() != knots.len() {
            return Err(MeshGlueError::LengthMismatch {
                what: "knot vectors",
                expected: degrees.len(),
                found: knots.len(),
            });
        }
        let bases = degrees
            .iter()
            .zip(knots)
            .map(|(&p, k)| BSplineBasis::new(p, k))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { bases })
    }
}

impl PatchDescriptor for BSpline {
    fn bases(&self) -> &[BSplineBasis] {
        &self.bases
    }

    fn from_bases(bases: Vec<BSplineBasis>) -> Self {
        Self { bases }
    }
}
