pub mod chess;
pub mod commands;
pub mod resolver;

pub use chess::{
    Gesture, Move, ParseSquareError, Piece, PieceColor, PieceKind, Square, kind_to_role,
    role_to_kind, to_piece_color,
};
pub use commands::{
    Action, COMMAND_PREFIX, COMMANDS, Command, CommandTemplate, MAX_PERFT_DEPTH,
    NO_COMMANDS_FOUND, RejectReason, interpret, predict,
};
pub use resolver::resolve;
