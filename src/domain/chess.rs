//! Pure chess value types shared by the client and the engine boundary.
//! No engine or UI dependencies - this is the domain layer.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use shakmaty::{Color as SColor, File, Rank, Role};

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PieceKind {
    Pawn,
    Knight,
    Bishop,
    Rook,
    Queen,
    King,
}

impl PieceKind {
    /// Map a promotion hint letter to the piece it stands for.
    /// Anything other than r/b/n (including no hint) promotes to a queen.
    pub fn from_promotion_hint(hint: Option<char>) -> Self {
        match hint.map(|c| c.to_ascii_lowercase()) {
            Some('r') => PieceKind::Rook,
            Some('b') => PieceKind::Bishop,
            Some('n') => PieceKind::Knight,
            _ => PieceKind::Queen,
        }
    }

    /// Lowercase letter used in coordinate notation (e.g. the `q` in `e7e8q`)
    pub fn letter(self) -> char {
        match self {
            PieceKind::Pawn => 'p',
            PieceKind::Knight => 'n',
            PieceKind::Bishop => 'b',
            PieceKind::Rook => 'r',
            PieceKind::Queen => 'q',
            PieceKind::King => 'k',
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PieceColor {
    White,
    Black,
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct Piece {
    pub kind: PieceKind,
    pub color: PieceColor,
}

impl Piece {
    pub fn new(kind: PieceKind, color: PieceColor) -> Self {
        Self { kind, color }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid square: {0:?}")]
pub struct ParseSquareError(pub String);

/// A board coordinate. `x` is the file (0 = a), `y` the rank (0 = rank 1).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Square {
    x: u8,
    y: u8,
}

impl Square {
    pub fn new(x: u8, y: u8) -> Option<Self> {
        (x < 8 && y < 8).then_some(Self { x, y })
    }

    pub fn x(&self) -> u8 {
        self.x
    }

    pub fn y(&self) -> u8 {
        self.y
    }

    /// Parse algebraic notation such as `"e4"`
    pub fn from_algebraic(text: &str) -> Option<Self> {
        let bytes = text.as_bytes();
        if bytes.len() != 2 {
            return None;
        }
        let file = bytes[0].to_ascii_lowercase();
        let rank = bytes[1];
        if !(b'a'..=b'h').contains(&file) || !(b'1'..=b'8').contains(&rank) {
            return None;
        }
        Self::new(file - b'a', rank - b'1')
    }

    pub fn algebraic(&self) -> String {
        format!("{}{}", (b'a' + self.x) as char, (b'1' + self.y) as char)
    }

    /// Whether this square lies on the first or eighth rank
    pub fn is_back_rank(&self) -> bool {
        self.y == 0 || self.y == 7
    }
}

impl fmt::Display for Square {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.algebraic())
    }
}

impl FromStr for Square {
    type Err = ParseSquareError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Square::from_algebraic(s).ok_or_else(|| ParseSquareError(s.to_string()))
    }
}

impl TryFrom<String> for Square {
    type Error = ParseSquareError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Square> for String {
    fn from(square: Square) -> Self {
        square.algebraic()
    }
}

impl From<shakmaty::Square> for Square {
    fn from(sq: shakmaty::Square) -> Self {
        let x = sq.file().char() as u8 - b'a';
        let y = sq.rank().char() as u8 - b'1';
        Self { x, y }
    }
}

impl From<Square> for shakmaty::Square {
    fn from(sq: Square) -> Self {
        shakmaty::Square::from_coords(File::new(u32::from(sq.x)), Rank::new(u32::from(sq.y)))
    }
}

/// A move as listed by the engine for the current position
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct Move {
    pub from: Square,
    pub to: Square,
    pub moved_piece: Piece,
    pub promotion_piece: Option<PieceKind>,
}

impl Move {
    /// Whether playing this move requires a promotion piece
    pub fn is_promotion(&self) -> bool {
        self.moved_piece.kind == PieceKind::Pawn && self.to.is_back_rank()
    }

    /// Coordinate notation, e.g. `e2e4` or `e7e8q`
    pub fn coordinate_notation(&self) -> String {
        let mut text = format!("{}{}", self.from, self.to);
        if let Some(kind) = self.promotion_piece {
            text.push(kind.letter());
        }
        text
    }
}

/// A drag-and-drop interaction from the board view
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Gesture {
    pub from: Square,
    pub to: Square,
    pub promotion_hint: Option<char>,
}

impl Gesture {
    pub fn new(from: Square, to: Square) -> Self {
        Self {
            from,
            to,
            promotion_hint: None,
        }
    }

    pub fn with_promotion(mut self, hint: char) -> Self {
        self.promotion_hint = Some(hint);
        self
    }
}

/// Convert a shakmaty role to our domain piece kind
pub fn role_to_kind(role: Role) -> PieceKind {
    match role {
        Role::Pawn => PieceKind::Pawn,
        Role::Knight => PieceKind::Knight,
        Role::Bishop => PieceKind::Bishop,
        Role::Rook => PieceKind::Rook,
        Role::Queen => PieceKind::Queen,
        Role::King => PieceKind::King,
    }
}

pub fn kind_to_role(kind: PieceKind) -> Role {
    match kind {
        PieceKind::Pawn => Role::Pawn,
        PieceKind::Knight => Role::Knight,
        PieceKind::Bishop => Role::Bishop,
        PieceKind::Rook => Role::Rook,
        PieceKind::Queen => Role::Queen,
        PieceKind::King => Role::King,
    }
}

pub fn to_piece_color(color: SColor) -> PieceColor {
    match color {
        SColor::White => PieceColor::White,
        SColor::Black => PieceColor::Black,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_square_from_algebraic() {
        let sq = Square::from_algebraic("e4").unwrap();
        assert_eq!((sq.x(), sq.y()), (4, 3));
        assert_eq!(sq.algebraic(), "e4");
        assert_eq!(Square::from_algebraic("A1"), Square::new(0, 0));
    }

    #[test]
    fn test_square_rejects_out_of_range() {
        assert!(Square::from_algebraic("i1").is_none());
        assert!(Square::from_algebraic("a9").is_none());
        assert!(Square::from_algebraic("e").is_none());
        assert!(Square::from_algebraic("e44").is_none());
        assert!(Square::new(8, 0).is_none());
        assert!("z0".parse::<Square>().is_err());
    }

    #[test]
    fn test_square_shakmaty_conversion() {
        let sq = Square::from_algebraic("g7").unwrap();
        let shak: shakmaty::Square = sq.into();
        assert_eq!(shak, shakmaty::Square::G7);
        assert_eq!(Square::from(shakmaty::Square::H1), Square::new(7, 0).unwrap());
    }

    #[test]
    fn test_promotion_hint_mapping() {
        assert_eq!(PieceKind::from_promotion_hint(Some('q')), PieceKind::Queen);
        assert_eq!(PieceKind::from_promotion_hint(Some('r')), PieceKind::Rook);
        assert_eq!(PieceKind::from_promotion_hint(Some('B')), PieceKind::Bishop);
        assert_eq!(PieceKind::from_promotion_hint(Some('n')), PieceKind::Knight);
        assert_eq!(PieceKind::from_promotion_hint(Some('k')), PieceKind::Queen);
        assert_eq!(PieceKind::from_promotion_hint(None), PieceKind::Queen);
    }

    #[test]
    fn test_move_serializes_squares_as_notation() {
        let mv = Move {
            from: "e7".parse().unwrap(),
            to: "e8".parse().unwrap(),
            moved_piece: Piece::new(PieceKind::Pawn, PieceColor::White),
            promotion_piece: Some(PieceKind::Queen),
        };
        let json = serde_json::to_value(mv).unwrap();
        assert_eq!(json["from"], "e7");
        assert_eq!(json["moved_piece"]["kind"], "PAWN");
        assert_eq!(json["promotion_piece"], "QUEEN");
        assert!(mv.is_promotion());
        assert_eq!(mv.coordinate_notation(), "e7e8q");
    }
}
