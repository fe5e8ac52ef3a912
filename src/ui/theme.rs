//! Theme constants for the board and its text rendering.

// Layout constants
pub const BOARD_PADDING: f32 = 20.0;
pub const MIN_BOARD_WIDTH: f32 = 320.0;
pub const MAX_BOARD_WIDTH: f32 = 1200.0;

// Text board glyphs
pub const LIGHT_SQUARE: char = '.';
pub const DARK_SQUARE: char = ':';
pub const HIGHLIGHT_LEFT: char = '[';
pub const HIGHLIGHT_RIGHT: char = ']';

/// Get the glyph for an empty square based on its coordinates
pub fn square_glyph(x: u8, y: u8) -> char {
    // a1 is dark
    if (x + y) % 2 == 0 {
        DARK_SQUARE
    } else {
        LIGHT_SQUARE
    }
}
