//! Invariant validation shared by the connectivity types.

use crate::mesh_error::MeshGlueError;

/// Trait for validating data structure invariants.
pub trait DebugInvariants {
    /// Assert invariants in debug builds or when invariant checking is enabled.
    fn debug_assert_invariants(&self);
    /// Validate invariants and return the first error encountered.
    fn validate_invariants(&self) -> Result<(), MeshGlueError>;
}

/// Run a fallible invariant check and panic on error when invariant
/// checking is enabled; compiles to nothing otherwise.
#[macro_export]
macro_rules! debug_invariants {
    ($expr:expr, $($ctx:tt)*) => {
        #[cfg(any(debug_assertions, feature = "strict-invariants", feature = "check-invariants"))]
        if let Err(e) = $expr {
            panic!(concat!("[invariants] ", $($ctx)*, ": {}"), e);
        }
    };
}

/// Check that the distinct values of `labels` are exactly `0..count`.
pub fn check_canonical_surjection(labels: &[usize], count: usize) -> Result<(), MeshGlueError> {
    let mut seen = vec![false; count];
    for &label in labels {
        match seen.get_mut(label) {
            Some(slot) => *slot = true,
            None => {
                return Err(MeshGlueError::NonCanonicalIndices(format!(
                    "label {label} is not below {count}"
                )));
            }
        }
    }
    if let Some(missing) = seen.iter().position(|&s| !s) {
        return Err(MeshGlueError::NonCanonicalIndices(format!(
            "label {missing} is never used"
        )));
    }
    Ok(())
}
