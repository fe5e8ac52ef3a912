//! Engine service boundary - the remote, authoritative side of a game.
//!
//! The session talks to the engine only through [`GameEngine`]. Implementations may sit
//! behind any transport; every method is a suspend point and the session guarantees that
//! at most one call per session is in flight.

use crate::domain::{Move, Square};

/// Errors reported by an engine implementation
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    /// The engine refused the request (illegal or stale move, unparsable move text, ...)
    #[error("engine rejected request: {0}")]
    Rejected(String),

    /// The engine does not support what was asked of it
    #[error("unsupported: {0}")]
    Unsupported(String),

    /// The call itself failed (transport, server fault, ...)
    #[error("engine unavailable: {0}")]
    Unavailable(String),

    /// The caller's deadline passed before the engine answered
    #[error("engine call timed out")]
    Timeout,
}

/// Operations offered by the remote game engine
#[allow(async_fn_in_trait)]
pub trait GameEngine {
    /// Start a game, optionally a training variant. Must precede every other call.
    async fn initialize_board(&self, variant: Option<&str>) -> Result<(), EngineError>;

    /// Position of the current game as FEN
    async fn get_current_position(&self) -> Result<String, EngineError>;

    /// Legal moves for the current position, in engine order
    async fn get_valid_moves_for_position(&self) -> Result<Vec<Move>, EngineError>;

    async fn play_move(&self, mv: Move) -> Result<(), EngineError>;

    /// Play a move written as free text; the engine owns the notation grammar
    async fn play_move_from_text(&self, text: &str) -> Result<(), EngineError>;

    async fn undo_move(&self) -> Result<(), EngineError>;

    async fn reset_game(&self) -> Result<(), EngineError>;

    /// Notation of every move played so far
    async fn get_move_history(&self) -> Result<Vec<String>, EngineError>;

    /// Origin of the last played move, if any
    async fn get_start_square(&self) -> Result<Option<Square>, EngineError>;

    /// Destination of the last played move, if any
    async fn get_target_square(&self) -> Result<Option<Square>, EngineError>;

    /// Why the game ended; empty while it is still running
    async fn check_if_game_ended(&self) -> Result<String, EngineError>;

    /// Count leaf positions to the given depth
    async fn play_perft_test(&self, depth: u32) -> Result<u64, EngineError>;
}
