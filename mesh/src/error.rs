//! Mesh error taxonomy.
//!
//! ERROR HANDLING
//! ==============
//! Geometry queries never fail; they return `None`/`false` for degenerate
//! input. Errors here are referential: an operation named an object or part
//! that is not present, or a snapshot referenced ids it does not define.
//! Callers applying remote edits log these and skip the offending item.

use crate::object::{PartId, PartKind};

/// Stable machine-readable code for an error.
pub trait ErrorCode: std::fmt::Display {
    fn error_code(&self) -> &'static str;
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MeshError {
    #[error("unknown object: {0}")]
    UnknownObject(String),

    #[error("unknown {kind:?} {id} in object {object}")]
    UnknownPart { object: String, kind: PartKind, id: PartId },

    #[error("{kind:?} {id} references missing {missing:?} {missing_id}")]
    DanglingReference { kind: PartKind, id: PartId, missing: PartKind, missing_id: PartId },

    #[error("invalid edge reference: {0}")]
    InvalidEdgeRef(i64),

    #[error("degenerate geometry: {0}")]
    Degenerate(&'static str),

    #[error("invalid snapshot: {0}")]
    Snapshot(String),

    #[error("unknown primitive: {0}")]
    UnknownPrimitive(String),
}

impl ErrorCode for MeshError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::UnknownObject(_) => "E_UNKNOWN_OBJECT",
            Self::UnknownPart { .. } => "E_UNKNOWN_PART",
            Self::DanglingReference { .. } => "E_DANGLING_REFERENCE",
            Self::InvalidEdgeRef(_) => "E_INVALID_EDGE_REF",
            Self::Degenerate(_) => "E_DEGENERATE",
            Self::Snapshot(_) => "E_SNAPSHOT",
            Self::UnknownPrimitive(_) => "E_UNKNOWN_PRIMITIVE",
        }
    }
}

impl From<serde_json::Error> for MeshError {
    fn from(e: serde_json::Error) -> Self {
        Self::Snapshot(e.to_string())
    }
}
