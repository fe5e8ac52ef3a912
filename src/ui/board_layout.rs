//! Board layout calculations - handles sizing and coordinate transformations.

use serde::Serialize;

use crate::domain::Square;
use crate::ui::theme::{BOARD_PADDING, MAX_BOARD_WIDTH, MIN_BOARD_WIDTH};

/// Which side is drawn at the bottom of the board
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub enum Orientation {
    #[default]
    White,
    Black,
}

impl Orientation {
    pub fn flipped(self) -> Self {
        match self {
            Orientation::White => Orientation::Black,
            Orientation::Black => Orientation::White,
        }
    }
}

/// Handles all layout calculations for the chess board
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoardLayout {
    pub min_width: f32,
    pub max_width: f32,
    pub padding: f32,
    /// Board size preference, 0 to 100
    pub size_percent: f32,
    pub orientation: Orientation,
}

impl BoardLayout {
    pub fn new(min_width: f32, max_width: f32, padding: f32) -> Self {
        Self {
            min_width,
            max_width: max_width.max(min_width),
            padding,
            size_percent: 100.0,
            orientation: Orientation::White,
        }
    }

    pub fn with_size_percent(mut self, percent: f32) -> Self {
        self.size_percent = percent;
        self
    }

    pub fn with_orientation(mut self, orientation: Orientation) -> Self {
        self.orientation = orientation;
        self
    }

    /// Board width for the size preference, kept within the declared bounds
    pub fn width(&self) -> f32 {
        let percent = self.size_percent.clamp(0.0, 100.0);
        let width = self.min_width + percent / 100.0 * (self.max_width - self.min_width);
        width.clamp(self.min_width, self.max_width)
    }

    /// Calculate square size from the board width
    pub fn square_size(&self) -> f32 {
        ((self.width() - self.padding * 2.0) / 8.0).max(1.0)
    }

    /// Convert a position relative to the board panel to a square (if within board)
    pub fn pos_to_square(&self, x: f32, y: f32) -> Option<Square> {
        let board_x = x - self.padding;
        let board_y = y - self.padding;

        if board_x < 0.0 || board_y < 0.0 {
            return None;
        }

        let square_size = self.square_size();
        let col = (board_x / square_size) as u8;
        let row = (board_y / square_size) as u8;

        if row >= 8 || col >= 8 {
            return None;
        }
        match self.orientation {
            Orientation::White => Square::new(col, 7 - row),
            Orientation::Black => Square::new(7 - col, row),
        }
    }
}

impl Default for BoardLayout {
    fn default() -> Self {
        Self::new(MIN_BOARD_WIDTH, MAX_BOARD_WIDTH, BOARD_PADDING)
    }
}
