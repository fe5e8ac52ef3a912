//! Plain-text rendering of a position for the terminal front end.

use shakmaty::fen::{Fen, ParseFenError};

use crate::domain::Square;
use crate::ui::board_layout::Orientation;
use crate::ui::theme::{HIGHLIGHT_LEFT, HIGHLIGHT_RIGHT, square_glyph};

#[derive(Clone, Copy, Debug, Default)]
pub struct BoardTextOptions {
    pub orientation: Orientation,
    pub show_pieces: bool,
    /// Squares of the last move, drawn bracketed
    pub highlight: Option<(Square, Square)>,
}

/// Draw the board of a FEN position, one rank per line, with file and rank labels
pub fn render_board(fen: &str, options: &BoardTextOptions) -> Result<String, ParseFenError> {
    let fen: Fen = fen.parse()?;
    let board = fen.into_setup().board;

    let order = |i: u8| match options.orientation {
        Orientation::White => 7 - i,
        Orientation::Black => i,
    };
    let files = |i: u8| match options.orientation {
        Orientation::White => i,
        Orientation::Black => 7 - i,
    };
    let highlighted = |sq: Square| {
        options
            .highlight
            .is_some_and(|(from, to)| sq == from || sq == to)
    };

    let mut out = String::new();
    for row in 0..8 {
        let y = order(row);
        out.push_str(&format!("{} ", y + 1));
        for col in 0..8 {
            let x = files(col);
            let Some(square) = Square::new(x, y) else {
                continue;
            };
            let glyph = board
                .piece_at(square.into())
                .filter(|_| options.show_pieces)
                .map(|piece| piece.char())
                .unwrap_or_else(|| square_glyph(x, y));
            if highlighted(square) {
                out.push(HIGHLIGHT_LEFT);
                out.push(glyph);
                out.push(HIGHLIGHT_RIGHT);
            } else {
                out.push(' ');
                out.push(glyph);
                out.push(' ');
            }
        }
        out.push('\n');
    }
    out.push_str("  ");
    for col in 0..8 {
        out.push(' ');
        out.push((b'a' + files(col)) as char);
        out.push(' ');
    }
    out.push('\n');
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    const START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

    fn shown() -> BoardTextOptions {
        BoardTextOptions {
            show_pieces: true,
            ..Default::default()
        }
    }

    #[test]
    fn test_render_start_position() {
        let text = render_board(START_FEN, &shown()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 9);
        assert_eq!(lines[0], "8  r  n  b  q  k  b  n  r ");
        assert_eq!(lines[7], "1  R  N  B  Q  K  B  N  R ");
        assert_eq!(lines[8], "   a  b  c  d  e  f  g  h ");
    }

    #[test]
    fn test_render_flipped_and_hidden() {
        let options = BoardTextOptions {
            orientation: Orientation::Black,
            show_pieces: false,
            highlight: None,
        };
        let text = render_board(START_FEN, &options).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert!(lines[0].starts_with("1 "));
        assert!(!lines[0].contains('R'));
        assert_eq!(lines[8], "   h  g  f  e  d  c  b  a ");
    }

    #[test]
    fn test_render_highlight() {
        let options = BoardTextOptions {
            highlight: Some((
                Square::from_algebraic("e2").unwrap(),
                Square::from_algebraic("e4").unwrap(),
            )),
            ..shown()
        };
        let fen = "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq - 0 1";
        let text = render_board(fen, &options).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert!(lines[4].contains("[P]"));
        assert!(lines[6].contains("[:]") || lines[6].contains("[.]"));
    }

    #[test]
    fn test_render_bad_fen() {
        assert!(render_board("not a fen", &shown()).is_err());
    }
}
