//! View models for rendering the session.
//!
//! These types prepare session state for display. They live in the UI layer, not the
//! domain layer.

use serde::Serialize;

use crate::domain::RejectReason;
use crate::error::SessionError;

/// One numbered row of the move list
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct MovePairDisplay {
    pub move_num: usize,
    pub white: String,
    /// Missing while black has not replied yet
    pub black: Option<String>,
}

/// What the board area should draw, derived from the display preferences
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct BoardAppearance {
    pub show_board: bool,
    /// Pieces are only drawn on a visible board
    pub show_pieces: bool,
    pub width: f32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum NoticeKind {
    Info,
    Warning,
    Error,
}

/// A transient message shown next to the board
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
}

impl Notice {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Info,
            message: message.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Warning,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Error,
            message: message.into(),
        }
    }

    /// The message for a failed request. Rejected gestures are silent: the piece just
    /// snaps back.
    pub fn for_error(error: &SessionError) -> Option<Self> {
        let notice = match error {
            SessionError::GestureRejected { .. } | SessionError::TornDown => return None,
            SessionError::CommandRejected(RejectReason::DepthTooHigh { .. }) => {
                Notice::warning("Perft depth is too high.")
            }
            SessionError::CommandRejected(RejectReason::InvalidDepth) => {
                Notice::warning("Perft depth must be a number.")
            }
            SessionError::CommandRejected(RejectReason::UnknownCommand(name)) => {
                Notice::warning(format!("Unknown command: {name}"))
            }
            SessionError::EngineCallFailed(e) => Notice::error(format!("Request failed: {e}")),
            SessionError::Busy => Notice::warning("Still waiting for the previous request."),
            SessionError::GameEnded(_) => Notice::info("The game is over. Reset to play again."),
            SessionError::NotInitialized => Notice::error("The game is not ready yet."),
            SessionError::StaleSnapshot { .. } => {
                Notice::warning("The board changed before the move was sent.")
            }
        };
        Some(notice)
    }
}
