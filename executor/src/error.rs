//! Executor error taxonomy.
//!
//! ERROR HANDLING
//! ==============
//! Nothing here is fatal to a session. An inbound message that fails is
//! logged with its code and dropped; the local scene keeps whatever the
//! message managed to change before the failure, which for multi-target
//! edits means the targets that still existed.

use mesh::{ErrorCode, MeshError};
use protocol::ProtocolError;

#[derive(Debug, thiserror::Error)]
pub enum ExecutorError {
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error(transparent)]
    Mesh(#[from] MeshError),

    /// `objMode` disagrees with the shape of `ids`.
    #[error("{tool}: objMode {obj_mode} does not match the ids")]
    TargetMismatch { tool: &'static str, obj_mode: bool },

    #[error("{0}: non-finite or degenerate payload")]
    BadPayload(&'static str),
}

impl ErrorCode for ExecutorError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Protocol(e) => e.error_code(),
            Self::Mesh(e) => e.error_code(),
            Self::TargetMismatch { .. } => "E_TARGET_MISMATCH",
            Self::BadPayload(_) => "E_BAD_PAYLOAD",
        }
    }
}
