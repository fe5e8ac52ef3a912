//! In-process engine backed by shakmaty.
//!
//! Plays the part of the remote engine for the terminal front end and for tests. It keeps
//! the authoritative position, move history and undo stack, and answers the same questions
//! a remote engine would. Training ids start a single piece drill instead of a game.

use std::cell::RefCell;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use shakmaty::fen::Fen;
use shakmaty::san::{San, SanPlus};
use shakmaty::{
    Bitboard, Board, Chess, Color, EnPassantMode, File, Move as SMove, Position, Rank, Role,
    Setup, Square as SSquare, attacks,
};
use tracing::{debug, info};

use crate::domain::{
    Move, Piece, PieceKind, Square, kind_to_role, role_to_kind, to_piece_color,
};
use crate::models::engine::{EngineError, GameEngine};

/// A move that has been played, kept so it can be undone
#[derive(Clone, Debug)]
struct PlayedMove {
    before: Chess,
    san: String,
    from: Square,
    to: Square,
}

#[derive(Clone, Debug, Default)]
struct LocalGame {
    position: Chess,
    played: Vec<PlayedMove>,
}

impl LocalGame {
    fn apply(&mut self, m: SMove) -> Result<(), EngineError> {
        let (from, to) = endpoints(&m)
            .ok_or_else(|| EngineError::Rejected("drop moves are not supported".to_string()))?;
        let san = San::from_move(&self.position, m.clone()).to_string();
        let before = self.position.clone();
        self.position = before
            .clone()
            .play(m)
            .map_err(|e| EngineError::Rejected(e.to_string()))?;
        debug!(%san, "local engine played move");
        self.played.push(PlayedMove {
            before,
            san,
            from: from.into(),
            to: to.into(),
        });
        Ok(())
    }
}

/// The squares a user drags between for this move
fn endpoints(m: &SMove) -> Option<(SSquare, SSquare)> {
    match m {
        SMove::Normal { from, to, .. } => Some((*from, *to)),
        SMove::EnPassant { from, to } => Some((*from, *to)),
        SMove::Castle { king, rook } => {
            // the king is dragged to g1/g8 or c1/c8
            let king_dest = if rook.file() == File::H {
                SSquare::from_coords(File::G, rook.rank())
            } else {
                SSquare::from_coords(File::C, rook.rank())
            };
            Some((*king, king_dest))
        }
        SMove::Put { .. } => None,
    }
}

/// Find the legal move between two squares with exactly the given promotion
fn find_legal(
    position: &Chess,
    from: SSquare,
    to: SSquare,
    promotion: Option<Role>,
) -> Option<SMove> {
    position
        .legal_moves()
        .iter()
        .find(|m| endpoints(m) == Some((from, to)) && m.promotion() == promotion)
        .cloned()
}

/// Parse coordinate notation such as `e2e4` or `e7e8q`
fn coordinate_move(position: &Chess, text: &str) -> Option<SMove> {
    if !text.is_ascii() || !(4..=5).contains(&text.len()) {
        return None;
    }
    let from = Square::from_algebraic(&text[0..2])?;
    let to = Square::from_algebraic(&text[2..4])?;
    let promotion = match text[4..].chars().next() {
        Some(c) => Some(kind_to_role(PieceKind::from_promotion_hint(Some(c)))),
        None => None,
    };
    find_legal(position, from.into(), to.into(), promotion).or_else(|| {
        // a pawn reaching the back rank without a letter becomes a queen
        promotion
            .is_none()
            .then(|| find_legal(position, from.into(), to.into(), Some(Role::Queen)))
            .flatten()
    })
}

/// Training piece for a drill id, `None` for ids that are not drills
fn drill_role(id: &str) -> Option<Role> {
    match id.to_ascii_lowercase().as_str() {
        "king" => Some(Role::King),
        "rook" => Some(Role::Rook),
        "knight" => Some(Role::Knight),
        "bishop" => Some(Role::Bishop),
        "queen" => Some(Role::Queen),
        _ => None,
    }
}

/// A target near `start`: within three files and ranks for a knight, five for the rest.
/// Bishops only get targets on their own square colour.
fn random_target(role: Role, start: SSquare, rng: &mut impl Rng) -> SSquare {
    let distance: i32 = if role == Role::Knight { 3 } else { 5 };
    loop {
        let file = start.file().to_u32() as i32 + rng.random_range(-distance..=distance);
        let rank = start.rank().to_u32() as i32 + rng.random_range(-distance..=distance);
        let target = SSquare::from_coords(
            File::new(file.clamp(0, 7) as u32),
            Rank::new(rank.clamp(0, 7) as u32),
        );
        let colour_ok = role != Role::Bishop || target.is_light() == start.is_light();
        if target != start && colour_ok {
            return target;
        }
    }
}

/// Move one white piece from its start square onto the target square
#[derive(Clone, Debug)]
struct Drill {
    role: Role,
    start: SSquare,
    target: SSquare,
    steps: Vec<(SSquare, SSquare)>,
}

impl Drill {
    fn new(role: Role, rng: &mut impl Rng) -> Self {
        let start = SSquare::new(rng.random_range(0..64));
        let target = random_target(role, start, rng);
        info!(?role, %start, %target, "new drill");
        Self {
            role,
            start,
            target,
            steps: Vec::new(),
        }
    }

    fn piece(&self) -> shakmaty::Piece {
        self.role.of(Color::White)
    }

    fn square(&self) -> SSquare {
        self.steps.last().map_or(self.start, |&(_, to)| to)
    }

    /// Squares the piece reaches on an otherwise empty board
    fn reachable(&self) -> Bitboard {
        attacks::attacks(self.square(), self.piece(), Bitboard::EMPTY)
    }

    fn fen(&self) -> String {
        let mut board = Board::empty();
        board.set_piece_at(self.square(), self.piece());
        let setup = Setup {
            board,
            ..Setup::empty()
        };
        Fen::try_from_setup(setup)
            .unwrap_or_else(|lossy| lossy.ignore())
            .to_string()
    }

    fn history(&self) -> Vec<String> {
        self.steps
            .iter()
            .map(|(_, to)| format!("{}{to}", self.role.upper_char()))
            .collect()
    }

    /// Destination square for `f5`, `Nf5`, `g3f5` or `Ng3f5`
    fn parse_text(&self, text: &str) -> Option<SSquare> {
        let text = text.strip_prefix(self.role.upper_char()).unwrap_or(text);
        if !text.is_ascii() {
            return None;
        }
        let to = match text.len() {
            2 => text,
            4 if Square::from_algebraic(&text[..2])? == Square::from(self.square()) => &text[2..],
            _ => return None,
        };
        Square::from_algebraic(to).map(SSquare::from)
    }

    fn step(&mut self, to: SSquare, rng: &mut impl Rng) -> Result<(), EngineError> {
        if !self.reachable().contains(to) {
            return Err(EngineError::Rejected(format!(
                "{}{} cannot reach {to}",
                self.role.upper_char(),
                self.square()
            )));
        }
        self.steps.push((self.square(), to));
        debug!(%to, "drill step");
        if to == self.target {
            *self = Drill::new(self.role, rng);
        }
        Ok(())
    }
}

#[derive(Clone, Debug)]
enum LocalBoard {
    Game(LocalGame),
    Drill(Drill),
}

/// Engine that keeps the whole game in memory
#[derive(Debug)]
pub struct LocalEngine {
    board: RefCell<Option<LocalBoard>>,
    rng: RefCell<StdRng>,
}

impl Default for LocalEngine {
    fn default() -> Self {
        Self::with_rng(StdRng::from_os_rng())
    }
}

impl LocalEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Engine whose drills come out the same on every run
    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(rng: StdRng) -> Self {
        Self {
            board: RefCell::new(None),
            rng: RefCell::new(rng),
        }
    }

    fn with_board<T>(
        &self,
        f: impl FnOnce(&mut LocalBoard) -> Result<T, EngineError>,
    ) -> Result<T, EngineError> {
        let mut board = self.board.borrow_mut();
        match board.as_mut() {
            Some(board) => f(board),
            None => Err(EngineError::Unavailable("board is not initialized".to_string())),
        }
    }

    fn with_game<T>(
        &self,
        f: impl FnOnce(&mut LocalGame) -> Result<T, EngineError>,
    ) -> Result<T, EngineError> {
        self.with_board(|board| match board {
            LocalBoard::Game(game) => f(game),
            LocalBoard::Drill(_) => Err(EngineError::Unsupported(
                "not available on a training board".to_string(),
            )),
        })
    }

    fn drill_step(
        &self,
        to: impl FnOnce(&Drill) -> Option<SSquare>,
        what: &str,
    ) -> Result<(), EngineError> {
        self.with_board(|board| match board {
            LocalBoard::Drill(drill) => {
                let to = to(drill)
                    .ok_or_else(|| EngineError::Rejected(format!("invalid move '{what}'")))?;
                drill.step(to, &mut *self.rng.borrow_mut())
            }
            LocalBoard::Game(_) => {
                Err(EngineError::Unsupported("not a training board".to_string()))
            }
        })
    }

    fn is_drill(&self) -> bool {
        matches!(self.board.borrow().as_ref(), Some(LocalBoard::Drill(_)))
    }
}

impl GameEngine for LocalEngine {
    async fn initialize_board(&self, variant: Option<&str>) -> Result<(), EngineError> {
        let board = match variant.filter(|v| !v.is_empty()) {
            None => LocalBoard::Game(LocalGame::default()),
            Some(id) => {
                let role = drill_role(id).ok_or_else(|| {
                    EngineError::Unsupported(format!("training variant '{id}'"))
                })?;
                LocalBoard::Drill(Drill::new(role, &mut *self.rng.borrow_mut()))
            }
        };
        *self.board.borrow_mut() = Some(board);
        Ok(())
    }

    async fn get_current_position(&self) -> Result<String, EngineError> {
        self.with_board(|board| {
            Ok(match board {
                LocalBoard::Game(game) => {
                    Fen::from_position(&game.position, EnPassantMode::Legal).to_string()
                }
                LocalBoard::Drill(drill) => drill.fen(),
            })
        })
    }

    async fn get_valid_moves_for_position(&self) -> Result<Vec<Move>, EngineError> {
        self.with_board(|board| {
            let game = match board {
                LocalBoard::Game(game) => game,
                LocalBoard::Drill(drill) => {
                    let moved_piece =
                        Piece::new(role_to_kind(drill.role), to_piece_color(Color::White));
                    let from = drill.square().into();
                    return Ok(drill
                        .reachable()
                        .into_iter()
                        .map(|to| Move {
                            from,
                            to: to.into(),
                            moved_piece,
                            promotion_piece: None,
                        })
                        .collect());
                }
            };
            let color = to_piece_color(game.position.turn());
            let moves = game
                .position
                .legal_moves()
                .iter()
                // each promotion is listed once; the client attaches the piece
                .filter(|m| matches!(m.promotion(), None | Some(Role::Queen)))
                .filter_map(|m| {
                    let (from, to) = endpoints(m)?;
                    Some(Move {
                        from: from.into(),
                        to: to.into(),
                        moved_piece: Piece::new(role_to_kind(m.role()), color),
                        promotion_piece: None,
                    })
                })
                .collect();
            Ok(moves)
        })
    }

    async fn play_move(&self, mv: Move) -> Result<(), EngineError> {
        if self.is_drill() {
            let what = mv.coordinate_notation();
            return self.drill_step(
                |drill| (SSquare::from(mv.from) == drill.square()).then(|| mv.to.into()),
                &what,
            );
        }
        self.with_game(|game| {
            if mv.is_promotion() && mv.promotion_piece.is_none() {
                return Err(EngineError::Rejected(format!(
                    "{} needs a promotion piece",
                    mv.coordinate_notation()
                )));
            }
            let wanted = mv.promotion_piece.map(kind_to_role);
            let found = find_legal(&game.position, mv.from.into(), mv.to.into(), wanted)
                .ok_or_else(|| {
                    EngineError::Rejected(format!("illegal move {}", mv.coordinate_notation()))
                })?;
            game.apply(found)
        })
    }

    async fn play_move_from_text(&self, text: &str) -> Result<(), EngineError> {
        let text = text.trim();
        if self.is_drill() {
            return self.drill_step(|drill| drill.parse_text(text), text);
        }
        self.with_game(|game| {
            let from_san = text
                .parse::<SanPlus>()
                .ok()
                .and_then(|san| san.san.to_move(&game.position).ok());
            let found = from_san
                .or_else(|| coordinate_move(&game.position, text))
                .ok_or_else(|| EngineError::Rejected(format!("invalid move '{text}'")))?;
            game.apply(found)
        })
    }

    async fn undo_move(&self) -> Result<(), EngineError> {
        self.with_board(|board| {
            match board {
                LocalBoard::Game(game) => {
                    if let Some(last) = game.played.pop() {
                        game.position = last.before;
                    }
                }
                LocalBoard::Drill(drill) => {
                    drill.steps.pop();
                }
            }
            Ok(())
        })
    }

    async fn reset_game(&self) -> Result<(), EngineError> {
        self.with_board(|board| {
            let fresh = match board {
                LocalBoard::Game(_) => LocalBoard::Game(LocalGame::default()),
                LocalBoard::Drill(drill) => {
                    LocalBoard::Drill(Drill::new(drill.role, &mut *self.rng.borrow_mut()))
                }
            };
            *board = fresh;
            Ok(())
        })
    }

    async fn get_move_history(&self) -> Result<Vec<String>, EngineError> {
        self.with_board(|board| {
            Ok(match board {
                LocalBoard::Game(game) => game.played.iter().map(|p| p.san.clone()).collect(),
                LocalBoard::Drill(drill) => drill.history(),
            })
        })
    }

    async fn get_start_square(&self) -> Result<Option<Square>, EngineError> {
        self.with_board(|board| {
            Ok(match board {
                LocalBoard::Game(game) => game.played.last().map(|p| p.from),
                LocalBoard::Drill(drill) => Some(drill.start.into()),
            })
        })
    }

    async fn get_target_square(&self) -> Result<Option<Square>, EngineError> {
        self.with_board(|board| {
            Ok(match board {
                LocalBoard::Game(game) => game.played.last().map(|p| p.to),
                LocalBoard::Drill(drill) => Some(drill.target.into()),
            })
        })
    }

    async fn check_if_game_ended(&self) -> Result<String, EngineError> {
        self.with_board(|board| {
            let LocalBoard::Game(game) = board else {
                // drills go on until the user resets
                return Ok(String::new());
            };
            let reason = if game.position.is_checkmate() {
                "Checkmate"
            } else if game.position.is_stalemate() {
                "Stalemate"
            } else {
                ""
            };
            Ok(reason.to_string())
        })
    }

    async fn play_perft_test(&self, depth: u32) -> Result<u64, EngineError> {
        self.with_game(|game| Ok(shakmaty::perft(&game.position, depth)))
    }
}
