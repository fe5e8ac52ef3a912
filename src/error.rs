//! Error types for the session synchronizer.
//!
//! Every failure is local to one session. Gesture and command rejections never reach the
//! engine; engine failures leave the last consistent snapshot in place.

use crate::domain::{RejectReason, Square};
use crate::models::engine::EngineError;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SessionError {
    /// The dragged move is not in the legal move list
    #[error("no legal move from {from} to {to}")]
    GestureRejected { from: Square, to: Square },

    /// Malformed or out-of-bounds command line input
    #[error("command rejected: {0}")]
    CommandRejected(RejectReason),

    /// The engine call errored or timed out
    #[error("engine call failed: {0}")]
    EngineCallFailed(#[from] EngineError),

    /// Another request for this session is still in flight
    #[error("another request is still in flight")]
    Busy,

    /// Only a reset is accepted once the game is over
    #[error("game has ended: {0}")]
    GameEnded(String),

    #[error("session is not initialized")]
    NotInitialized,

    /// The move was picked from a legal move list that has since been replaced
    #[error("move was resolved against snapshot {resolved} but the session is at {current}")]
    StaleSnapshot { resolved: u64, current: u64 },

    #[error("session was torn down")]
    TornDown,
}

/// Result type alias for session operations
pub type SessionResult<T> = Result<T, SessionError>;
