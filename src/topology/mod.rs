//! Top-level module for multi-patch topology.
//!
//! It includes:
//! - the union-find merger turning coincidence pairs into equivalence classes
//! - boundary faces of tensor-product grids and their alignments
//! - the three-representation node connectivity
//!
//! Most users will interact with [`MultiPatchConnectivity`].

pub mod connectivity;
pub mod orientation;
pub mod union_find;

pub use connectivity::MultiPatchConnectivity;
pub use orientation::{AlignmentTable, AxisAlignment, Side};
