#![cfg_attr(docsrs, feature(doc_cfg))]
//! # patch-glue
//!
//! patch-glue builds and manipulates the topological glue between the
//! patches of a multi-patch tensor-product spline mesh, as used in
//! isogeometric analysis. Each patch owns its own grid of control nodes and
//! adjacent patches store their shared boundary nodes redundantly.
//!
//! ## Features
//! - Union-find merging of coincident nodes into a canonical unique numbering
//!   ([`topology::union_find`])
//! - Three consistent views of the nodes (unique, unpacked, separated) and the
//!   conversions between them ([`MultiPatchConnectivity`])
//! - Geometric coincidence search ([`algs::coincidence`])
//! - Exterior/interior border and patch-subset extraction
//!   ([`algs::boundary`], [`algs::submesh`])
//! - Combinatorial discovery of glued faces, with the axis permutation and
//!   reflection aligning their frames, the affine map between the two
//!   parametric domains and derivative transport across it
//!   ([`algs::correspondence`])
//!
//! Spline evaluation stays outside the crate: patches are read through the
//! [`PatchDescriptor`] and [`BasisDerivatives`] traits.
//!
//! ## Usage
//!
//! ```toml
//! [dependencies]
//! patch-glue = "0.1"
//! # Optional features:
//! # features = ["rayon"]
//! ```
//!
//! ```
//! use patch_glue::prelude::*;
//!
//! // two 2x2 quads sharing their middle edge
//! let conn = MultiPatchConnectivity::from_coincidence_pairs(
//!     &[(2, 4), (3, 5)],
//!     vec![vec![2, 2], vec![2, 2]],
//! )?;
//! assert_eq!(conn.nb_unique_nodes(), 6);
//! # Ok::<(), patch_glue::mesh_error::MeshGlueError>(())
//! ```
//!
//! ## Determinism
//!
//! Every construction is deterministic: unique indices are assigned in
//! increasing root order and searches report matches in input order, with or
//! without the `rayon` feature.

pub mod algs;
pub mod data;
pub mod debug_invariants;
pub mod mesh_error;
pub mod patch;
pub mod topology;

pub use debug_invariants::DebugInvariants;
pub use patch::{BasisDerivatives, PatchDescriptor};
pub use topology::connectivity::MultiPatchConnectivity;

/// A convenient prelude to import the most-used traits & types:
pub mod prelude {
    pub use crate::algs::boundary::BorderKind;
    pub use crate::algs::coincidence::DEFAULT_COINCIDENCE_EPSILON;
    pub use crate::algs::correspondence::{
        AffineOperator, BorderCorrespondence, BorderCorrespondences, MatchConfig,
    };
    pub use crate::algs::submesh::SubmeshMaps;
    pub use crate::data::nd_array::NdArray;
    pub use crate::data::representation::{FieldIndices, PackMethod, Representation};
    pub use crate::debug_invariants::DebugInvariants;
    pub use crate::mesh_error::MeshGlueError;
    pub use crate::patch::{BSpline, BSplineBasis, BasisDerivatives, PatchDescriptor};
    pub use crate::topology::connectivity::MultiPatchConnectivity;
    pub use crate::topology::orientation::{AlignmentTable, AxisAlignment, Side};
}
