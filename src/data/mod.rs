//! Data module: n-dimensional field storage and representation tags

pub mod nd_array;
pub mod representation;

pub use nd_array::NdArray;
pub use representation::{FieldIndices, PackMethod, Representation};
