//! Representation tags and reduction methods for multi-patch fields.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::data::nd_array::NdArray;
use crate::mesh_error::MeshGlueError;

/// The three views of one multi-patch node set.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum Representation {
    /// One entry per physically distinct node.
    Unique,
    /// Every (patch, grid slot), patches concatenated.
    Unpacked,
    /// One grid per patch.
    Separated,
}

impl FromStr for Representation {
    type Err = MeshGlueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "unique" => Ok(Self::Unique),
            "unpacked" => Ok(Self::Unpacked),
            "separated" => Ok(Self::Separated),
            other => Err(MeshGlueError::UnrecognizedRepresentation(other.to_owned())),
        }
    }
}

impl fmt::Display for Representation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Unique => "unique",
            Self::Unpacked => "unpacked",
            Self::Separated => "separated",
        })
    }
}

/// How `pack` merges the unpacked values that share a unique node.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum PackMethod {
    /// Keep the value of the first unpacked slot of each unique node.
    First,
    /// Average every contributor.
    #[default]
    Mean,
}

impl FromStr for PackMethod {
    type Err = MeshGlueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "first" => Ok(Self::First),
            "mean" => Ok(Self::Mean),
            other => Err(MeshGlueError::UnsupportedMethod(other.to_owned())),
        }
    }
}

/// Unique-field indices laid out in one of the three representations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldIndices {
    /// Shape `(*field_shape, nb_unique_nodes)`.
    Unique(NdArray<usize>),
    /// Shape `(*field_shape, nb_nodes)`.
    Unpacked(NdArray<usize>),
    /// One array `(*field_shape, *patch_shape)` per patch.
    Separated(Vec<NdArray<usize>>),
}

impl FieldIndices {
    /// The separated arrays, if this is the separated layout.
    pub fn into_separated(self) -> Option<Vec<NdArray<usize>>> {
        match self {
            Self::Separated(v) => Some(v),
            _ => None,
        }
    }

    /// The flat array, if this is the unique or unpacked layout.
    pub fn into_flat(self) -> Option<NdArray<usize>> {
        match self {
            Self::Unique(a) | Self::Unpacked(a) => Some(a),
            Self::Separated(_) => None,
        }
    }
}
