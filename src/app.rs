//! Terminal front end: a line-oriented stand-in for the board view.
//!
//! Lines starting with `:` drive the view (drag gestures, display toggles). Everything else
//! goes through the command field, exactly as typed text would.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use anyhow::Context;
use chess_sync::domain::{Gesture, Square};
use chess_sync::models::preferences::StorageError;
use chess_sync::models::{
    FileStorage, GameEngine, LocalEngine, PreferenceKey, PreferenceStorage, PreferenceStore,
    PreferenceValue, Session, SessionObserver, SessionState, Variant,
};
use chess_sync::ui::display::{
    board_appearance, end_reason_label, last_move_label, move_history_pairs,
};
use chess_sync::ui::{BoardLayout, BoardTextOptions, CommandLine, Notice, NoticeKind, render_board};
use chess_sync::{ClientConfig, SessionError};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info, warn};

const HELP: &str = "\
Type a move (e4, Nf3, e2e4) or a command (/undo, /perft <depth>).
  :drop <from> <to> [q|r|b|n]  drag a piece
  :drag <x> <y> <x> <y> [q]    drag a piece by pixel position on the board
  :board on|off                show or hide the board
  :pieces on|off               show or hide the pieces
  :size <0-100>                board size
  :flip                        turn the board around
  :predict <text>              command suggestions for partial input
  :state                       current snapshot as JSON
  :prefs                       current display settings
  :reset                       start over
  :help                        this text
  :quit                        leave";

/// A line typed at the prompt
#[derive(Clone, Debug, PartialEq)]
enum ReplCommand {
    Quit,
    Help,
    Reset,
    Drop(Gesture),
    /// Press and release points in board pixels
    Drag {
        press: (f32, f32),
        release: (f32, f32),
        hint: Option<char>,
    },
    Board(bool),
    Pieces(bool),
    Size(f32),
    Flip,
    Predict(String),
    State,
    Prefs,
    /// Text for the command field
    Submit(String),
    Usage(&'static str),
}

fn parse_switch(arg: Option<&str>) -> Option<bool> {
    match arg? {
        "on" => Some(true),
        "off" => Some(false),
        _ => None,
    }
}

fn parse_line(line: &str) -> ReplCommand {
    let Some(rest) = line.trim().strip_prefix(':') else {
        return ReplCommand::Submit(line.to_string());
    };
    let mut parts = rest.split_whitespace();
    let name = parts.next().unwrap_or_default();
    let args: Vec<&str> = parts.collect();

    match name {
        "q" | "quit" => ReplCommand::Quit,
        "help" => ReplCommand::Help,
        "reset" => ReplCommand::Reset,
        "flip" => ReplCommand::Flip,
        "state" => ReplCommand::State,
        "prefs" => ReplCommand::Prefs,
        "drop" => {
            let from = args.first().and_then(|s| Square::from_algebraic(s));
            let to = args.get(1).and_then(|s| Square::from_algebraic(s));
            let hint = args.get(2).and_then(|s| s.chars().next());
            match (from, to) {
                (Some(from), Some(to)) => {
                    let gesture = Gesture::new(from, to);
                    ReplCommand::Drop(match hint {
                        Some(hint) => gesture.with_promotion(hint),
                        None => gesture,
                    })
                }
                _ => ReplCommand::Usage(":drop <from> <to> [q|r|b|n]"),
            }
        }
        "drag" => {
            let coords: Vec<f32> = args.iter().take(4).filter_map(|s| s.parse().ok()).collect();
            match coords[..] {
                [px, py, rx, ry] => ReplCommand::Drag {
                    press: (px, py),
                    release: (rx, ry),
                    hint: args.get(4).and_then(|s| s.chars().next()),
                },
                _ => ReplCommand::Usage(":drag <x> <y> <x> <y> [q|r|b|n]"),
            }
        }
        "board" => parse_switch(args.first().copied())
            .map_or(ReplCommand::Usage(":board on|off"), ReplCommand::Board),
        "pieces" => parse_switch(args.first().copied())
            .map_or(ReplCommand::Usage(":pieces on|off"), ReplCommand::Pieces),
        "size" => args
            .first()
            .and_then(|s| s.parse::<f32>().ok())
            .map_or(ReplCommand::Usage(":size <0-100>"), ReplCommand::Size),
        "predict" => ReplCommand::Predict(args.join(" ")),
        _ => ReplCommand::Usage(":help lists the available commands"),
    }
}

/// Prints the session to stdout as it changes
pub struct TerminalView {
    layout: Cell<BoardLayout>,
    show_board: Cell<bool>,
    show_pieces: Cell<bool>,
    last_state: RefCell<Option<SessionState>>,
}

impl TerminalView {
    pub fn new(layout: BoardLayout) -> Self {
        Self {
            layout: Cell::new(layout),
            show_board: Cell::new(true),
            show_pieces: Cell::new(true),
            last_state: RefCell::new(None),
        }
    }

    /// Take over the persisted settings without re-rendering
    fn load_preferences<S: PreferenceStorage>(&self, preferences: &PreferenceStore<S>) {
        self.show_board.set(preferences.board_visible());
        self.show_pieces.set(preferences.pieces_visible());
        let layout = self.layout.get();
        self.layout
            .set(layout.with_size_percent(preferences.board_size_percent()));
    }

    fn layout(&self) -> BoardLayout {
        self.layout.get()
    }

    /// Square under a point on the board, as drawn right now
    fn square_at(&self, (x, y): (f32, f32)) -> Option<Square> {
        self.layout.get().pos_to_square(x, y)
    }

    fn flip(&self) {
        let layout = self.layout.get();
        self.layout
            .set(layout.with_orientation(layout.orientation.flipped()));
        self.rerender();
    }

    fn rerender(&self) {
        if let Some(state) = self.last_state.borrow().as_ref() {
            self.render(state);
        }
    }

    fn render(&self, state: &SessionState) {
        if self.show_board.get() {
            let options = BoardTextOptions {
                orientation: self.layout.get().orientation,
                show_pieces: self.show_pieces.get(),
                highlight: state.last_move,
            };
            match render_board(&state.position_fen, &options) {
                Ok(board) => print!("{board}"),
                Err(e) => warn!(fen = %state.position_fen, error = %e, "cannot draw position"),
            }
        }
        if let Some(label) = last_move_label(state.last_move) {
            println!("Last move: {label}");
        }
        let pairs = move_history_pairs(&state.move_history);
        if !pairs.is_empty() {
            let line: Vec<String> = pairs
                .iter()
                .map(|pair| match &pair.black {
                    Some(black) => format!("{}. {} {}", pair.move_num, pair.white, black),
                    None => format!("{}. {}", pair.move_num, pair.white),
                })
                .collect();
            println!("{}", line.join("  "));
        }
        if let Some(label) = end_reason_label(state.game_end_reason.as_deref()) {
            println!("{label}");
        }
    }
}

impl SessionObserver for TerminalView {
    fn on_state_changed(&self, state: &SessionState) {
        *self.last_state.borrow_mut() = Some(state.clone());
        self.render(state);
    }

    fn on_preference_changed(&self, key: PreferenceKey, value: PreferenceValue) {
        match (key, value) {
            (PreferenceKey::BoardVisible, PreferenceValue::Flag(on)) => self.show_board.set(on),
            (PreferenceKey::PiecesVisible, PreferenceValue::Flag(on)) => self.show_pieces.set(on),
            (PreferenceKey::BoardSizePercent, PreferenceValue::Percent(p)) => {
                let layout = self.layout.get().with_size_percent(p);
                self.layout.set(layout);
                println!(
                    "Board width: {:.0}px ({:.0}px squares)",
                    layout.width(),
                    layout.square_size()
                );
                return;
            }
            _ => return,
        }
        self.rerender();
    }

    fn on_notice(&self, notice: &Notice) {
        let tag = match notice.kind {
            NoticeKind::Info => "info",
            NoticeKind::Warning => "warning",
            NoticeKind::Error => "error",
        };
        println!("[{tag}] {}", notice.message);
    }
}

struct App<E, S> {
    session: Session<E>,
    preferences: PreferenceStore<S>,
    view: Rc<TerminalView>,
    command_line: CommandLine,
}

impl<E: GameEngine, S: PreferenceStorage> App<E, S> {
    /// Handle one line; `false` once the user wants to leave
    async fn handle_line(&mut self, line: &str) -> bool {
        let result = match parse_line(line) {
            ReplCommand::Quit => return false,
            ReplCommand::Help => {
                println!("{HELP}");
                Ok(())
            }
            ReplCommand::Usage(usage) => {
                println!("usage: {usage}");
                Ok(())
            }
            ReplCommand::Reset => self.session.reset().await,
            ReplCommand::Drop(gesture) => self.drop_piece(gesture).await,
            ReplCommand::Drag {
                press,
                release,
                hint,
            } => match (self.view.square_at(press), self.view.square_at(release)) {
                (Some(from), Some(to)) => {
                    let gesture = Gesture::new(from, to);
                    let gesture = match hint {
                        Some(hint) => gesture.with_promotion(hint),
                        None => gesture,
                    };
                    self.drop_piece(gesture).await
                }
                // released off the board: the piece snaps back
                _ => Ok(()),
            },
            ReplCommand::Flip => {
                self.view.flip();
                Ok(())
            }
            ReplCommand::Predict(text) => {
                self.command_line.set_text(text);
                for prediction in self.command_line.predictions() {
                    println!("  {prediction}");
                }
                self.command_line.set_text("");
                Ok(())
            }
            ReplCommand::State => {
                match serde_json::to_string_pretty(&self.session.snapshot()) {
                    Ok(json) => println!("{json}"),
                    Err(e) => warn!(error = %e, "cannot encode snapshot"),
                }
                Ok(())
            }
            ReplCommand::Prefs => {
                let appearance = board_appearance(&self.preferences, self.view.layout());
                println!(
                    "board: {}, pieces: {}, width: {:.0}px",
                    on_off(appearance.show_board),
                    on_off(appearance.show_pieces),
                    appearance.width
                );
                for key in PreferenceKey::ALL {
                    println!("  {key} = {}", self.preferences.get(key));
                }
                Ok(())
            }
            ReplCommand::Board(on) => {
                self.store(|prefs| prefs.set_board_visible(on));
                Ok(())
            }
            ReplCommand::Pieces(on) => {
                if self.preferences.board_visible() {
                    self.store(|prefs| prefs.set_pieces_visible(on));
                } else {
                    println!("Show the board first.");
                }
                Ok(())
            }
            ReplCommand::Size(percent) => {
                self.store(|prefs| prefs.set_board_size_percent(percent));
                Ok(())
            }
            ReplCommand::Submit(text) => self.submit_text(text).await,
        };
        if let Err(e) = result {
            debug!(error = %e, "request failed");
        }
        true
    }

    async fn drop_piece(&self, gesture: Gesture) -> Result<(), SessionError> {
        match self.session.submit(gesture).await {
            Err(SessionError::GestureRejected { from, to }) => {
                println!("{from} → {to} is not a legal move");
                Ok(())
            }
            other => other,
        }
    }

    async fn submit_text(&mut self, text: String) -> Result<(), SessionError> {
        self.command_line.focus();
        self.command_line.set_text(text);
        let predictions = self
            .command_line
            .tooltip_visible()
            .then(|| self.command_line.predictions());
        let Some(text) = self.command_line.take_submission() else {
            return Ok(());
        };
        match self.session.submit_command(&text).await {
            Err(SessionError::CommandRejected(reason)) => {
                for prediction in predictions.unwrap_or_default() {
                    println!("  {prediction}");
                }
                Err(SessionError::CommandRejected(reason))
            }
            other => other.map(|_| ()),
        }
    }

    fn store(&mut self, set: impl FnOnce(&mut PreferenceStore<S>) -> Result<(), StorageError>) {
        if let Err(e) = set(&mut self.preferences) {
            warn!(error = %e, "could not save preference");
            println!("[warning] {e}");
        }
    }
}

fn on_off(on: bool) -> &'static str {
    if on { "on" } else { "off" }
}

/// Run the terminal client until stdin closes or the user quits
pub async fn run(config: ClientConfig, variant: Option<String>) -> anyhow::Result<()> {
    let layout = config.board_layout();
    let view = Rc::new(TerminalView::new(layout));

    let path = config
        .preferences_file
        .clone()
        .unwrap_or_else(FileStorage::default_path);
    let storage = FileStorage::open(path);
    info!(path = %storage.path().display(), "preferences file");
    let preferences = PreferenceStore::new(storage).with_observer(view.clone());
    view.load_preferences(&preferences);

    let session = Session::new(LocalEngine::new())
        .with_observer(view.clone())
        .with_request_timeout(config.request_timeout());

    let variant = variant.or(config.variant);
    if session.init(variant.as_deref()).await.is_err() {
        warn!(?variant, "falling back to a standard game");
        session
            .init(None)
            .await
            .context("failed to start a game")?;
    }

    let mut app = App {
        session,
        preferences,
        view,
        command_line: CommandLine::new(),
    };

    println!("{HELP}");
    if let Variant::Training(kind) = app.session.variant() {
        println!("Drill: move the {kind:?} from the first highlighted square to the second.");
    }
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("failed to read stdin")? {
        if !app.handle_line(&line).await {
            break;
        }
    }
    app.session.teardown();
    Ok(())
}
