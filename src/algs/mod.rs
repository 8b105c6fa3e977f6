//! Re-export public algorithms.

pub mod boundary;
pub mod coincidence;
pub mod correspondence;
pub mod submesh;

pub use boundary::BorderKind;
pub use coincidence::{DEFAULT_COINCIDENCE_EPSILON, coincidence_pairs};
pub use correspondence::{BorderCorrespondence, BorderCorrespondences, MatchConfig};
pub use submesh::SubmeshMaps;
