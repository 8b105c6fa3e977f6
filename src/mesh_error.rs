//! MeshGlueError: Unified error type for patch-glue public APIs
//!
//! Every fallible operation of the crate reports precondition violations
//! through this type. Errors are detected eagerly at the start of the
//! offending operation; nothing is retried or silently recovered.

use thiserror::Error;

/// Unified error type for multi-patch connectivity operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MeshGlueError {
    /// Patches disagree on their physical or parametric dimension.
    #[error("Dimension mismatch in {what}: expected {expected}, found {found} (patch {patch})")]
    DimensionMismatch {
        what: &'static str,
        patch: usize,
        expected: usize,
        found: usize,
    },
    /// Border extraction requested on a parametric space of dimension < 2.
    #[error("Parametric dimension {npa} too low: borders need at least 2 parametric axes")]
    DimensionTooLow { npa: usize },
    /// Field shapes are inconsistent across patches.
    #[error("Shape mismatch for patch {patch}: expected {expected:?}, found {found:?}")]
    ShapeMismatch {
        patch: usize,
        expected: Vec<usize>,
        found: Vec<usize>,
    },
    /// Unknown `pack` reduction method.
    #[error("Method `{0}` is not implemented: use `first` or `mean`")]
    UnsupportedMethod(String),
    /// Unknown representation tag.
    #[error("Representation `{0}` not recognised: use `unique`, `unpacked` or `separated`")]
    UnrecognizedRepresentation(String),
    /// No patch was provided where at least one is required.
    #[error("At least one patch is required")]
    EmptyPatchSet,
    /// Two per-patch lists disagree on the number of patches.
    #[error("Patch count mismatch: expected {expected}, found {found}")]
    PatchCountMismatch { expected: usize, found: usize },
    /// A flat buffer does not have the length its shape requires.
    #[error("Length mismatch in {what}: expected {expected}, found {found}")]
    LengthMismatch {
        what: &'static str,
        expected: usize,
        found: usize,
    },
    /// A coincidence pair references a node outside `0..nb_nodes`.
    #[error("Node index {index} out of range for {nb_nodes} nodes")]
    NodeIndexOutOfRange { index: usize, nb_nodes: usize },
    /// A patch index is outside `0..nb_patches`.
    #[error("Patch index {index} out of range for {nb_patches} patches")]
    InvalidPatchIndex { index: usize, nb_patches: usize },
    /// An axis index is outside the array's dimensions.
    #[error("Axis {axis} out of range for a {ndim}-dimensional array")]
    InvalidAxis { axis: usize, ndim: usize },
    /// A correspondence record index is outside the record list.
    #[error("Correspondence {index} out of range for {len} records")]
    InvalidCorrespondence { index: usize, len: usize },
    /// Unique indices are not a gap-free surjection onto `0..nb_unique_nodes`.
    #[error("Unique node indices are not canonical: {0}")]
    NonCanonicalIndices(String),
    /// A knot vector is not non-decreasing.
    #[error("Invalid knot vector: {0}")]
    InvalidKnotVector(String),
    /// The external basis evaluator reported a failure.
    #[error("Basis evaluation failed: {0}")]
    Evaluation(String),
}
