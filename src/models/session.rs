//! Session model - the client-side state machine that keeps a view in sync with the engine.
//!
//! The engine is authoritative. The session holds the last consistent snapshot it received,
//! lets at most one engine request run at a time, and replaces the snapshot wholesale after
//! every successful mutation.

use std::cell::RefCell;
use std::future::Future;
use std::rc::Rc;
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::domain::{Action, Gesture, Move, PieceKind, Square, interpret, resolve};
use crate::error::{SessionError, SessionResult};
use crate::models::engine::{EngineError, GameEngine};
use crate::models::observer::SessionObserver;
use crate::ui::view_models::Notice;

/// Where the session is in its request lifecycle
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum Phase {
    Uninitialized,
    Ready,
    /// An engine request is in flight
    Pending,
    Ended,
}

/// The last consistent view of the game, as reported by the engine
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct SessionState {
    pub position_fen: String,
    /// Legal moves for `position_fen`, in engine order
    pub legal_moves: Vec<Move>,
    pub move_history: Vec<String>,
    /// Origin and destination of the last played move, for highlighting
    pub last_move: Option<(Square, Square)>,
    pub game_end_reason: Option<String>,
    /// Bumped on every successful refresh
    pub version: u64,
}

impl SessionState {
    pub fn is_ended(&self) -> bool {
        self.game_end_reason.is_some()
    }
}

/// Which game the engine should set up
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub enum Variant {
    #[default]
    Standard,
    /// A single-piece training board
    Training(PieceKind),
}

impl Variant {
    /// Parse a session identifier. Unknown ids fall back to a standard game.
    pub fn parse(id: Option<&str>) -> Self {
        let Some(id) = id.map(str::trim).filter(|id| !id.is_empty()) else {
            return Variant::Standard;
        };
        match id.to_ascii_lowercase().as_str() {
            "king" => Variant::Training(PieceKind::King),
            "rook" => Variant::Training(PieceKind::Rook),
            "knight" => Variant::Training(PieceKind::Knight),
            "bishop" => Variant::Training(PieceKind::Bishop),
            "queen" => Variant::Training(PieceKind::Queen),
            other => {
                warn!(id = other, "unknown training piece, starting a standard game");
                Variant::Standard
            }
        }
    }

    /// The identifier sent to the engine
    pub fn id(self) -> Option<&'static str> {
        let Variant::Training(kind) = self else {
            return None;
        };
        Some(match kind {
            PieceKind::Pawn => "pawn",
            PieceKind::Knight => "knight",
            PieceKind::Bishop => "bishop",
            PieceKind::Rook => "rook",
            PieceKind::Queen => "queen",
            PieceKind::King => "king",
        })
    }
}

/// A legal move picked from a specific snapshot
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SelectedMove {
    pub mv: Move,
    /// Version of the snapshot whose legal move list produced `mv`
    pub version: u64,
}

/// What a command line submission did
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CommandOutcome {
    /// Blank input
    Ignored,
    Played,
    Undone,
    Perft { depth: u32, count: u64 },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Request {
    Init(Variant),
    Move { version: u64 },
    TextMove,
    Undo,
    Reset,
    Perft,
}

struct Inner {
    phase: Phase,
    state: SessionState,
    variant: Variant,
    torn_down: bool,
}

/// One play sequence against an engine, from init to teardown
pub struct Session<E> {
    engine: E,
    inner: RefCell<Inner>,
    observer: Option<Rc<dyn SessionObserver>>,
    request_timeout: Option<Duration>,
}

impl<E: GameEngine> Session<E> {
    pub fn new(engine: E) -> Self {
        Self {
            engine,
            inner: RefCell::new(Inner {
                phase: Phase::Uninitialized,
                state: SessionState::default(),
                variant: Variant::Standard,
                torn_down: false,
            }),
            observer: None,
            request_timeout: None,
        }
    }

    pub fn with_observer(mut self, observer: Rc<dyn SessionObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Treat any single engine call that takes longer than `timeout` as failed
    pub fn with_request_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Copy of the current snapshot
    pub fn snapshot(&self) -> SessionState {
        self.inner.borrow().state.clone()
    }

    pub fn phase(&self) -> Phase {
        self.inner.borrow().phase
    }

    pub fn variant(&self) -> Variant {
        self.inner.borrow().variant
    }

    pub fn is_torn_down(&self) -> bool {
        self.inner.borrow().torn_down
    }

    /// Start the game and load the first snapshot
    pub async fn init(&self, variant: Option<&str>) -> SessionResult<()> {
        let variant = Variant::parse(variant);
        let result = self
            .mutate(Request::Init(variant), self.engine.initialize_board(variant.id()))
            .await;
        self.report(result)
    }

    /// Match a gesture against the current legal moves without touching the engine
    pub fn select(&self, gesture: &Gesture) -> SessionResult<SelectedMove> {
        let inner = self.inner.borrow();
        if inner.torn_down {
            return Err(SessionError::TornDown);
        }
        match inner.phase {
            Phase::Uninitialized => return Err(SessionError::NotInitialized),
            Phase::Pending => return Err(SessionError::Busy),
            Phase::Ended => return Err(ended(&inner.state)),
            Phase::Ready => {}
        }
        let mv = resolve(gesture, &inner.state.legal_moves).ok_or(
            SessionError::GestureRejected {
                from: gesture.from,
                to: gesture.to,
            },
        )?;
        Ok(SelectedMove {
            mv,
            version: inner.state.version,
        })
    }

    /// Send a previously selected move. Refused if the snapshot has moved on since.
    pub async fn play(&self, selected: SelectedMove) -> SessionResult<()> {
        let request = Request::Move {
            version: selected.version,
        };
        let result = self.mutate(request, self.engine.play_move(selected.mv)).await;
        self.report(result)
    }

    /// Resolve a drag-and-drop gesture and play it
    pub async fn submit(&self, gesture: Gesture) -> SessionResult<()> {
        let selected = match self.select(&gesture) {
            Ok(selected) => selected,
            Err(e) => return self.report(Err(e)),
        };
        self.play(selected).await
    }

    /// Handle a line from the command field
    pub async fn submit_command(&self, text: &str) -> SessionResult<CommandOutcome> {
        if text.trim().is_empty() {
            return Ok(CommandOutcome::Ignored);
        }
        let result = match interpret(text) {
            Action::PlayMoveText(text) => self
                .mutate(Request::TextMove, self.engine.play_move_from_text(&text))
                .await
                .map(|()| CommandOutcome::Played),
            Action::Undo => self
                .mutate(Request::Undo, self.engine.undo_move())
                .await
                .map(|()| CommandOutcome::Undone),
            Action::PerftTest(depth) => self
                .perft(depth)
                .await
                .map(|count| CommandOutcome::Perft { depth, count }),
            Action::Rejected(reason) => {
                debug!(%reason, text, "command rejected");
                Err(SessionError::CommandRejected(reason))
            }
        };
        if let Ok(CommandOutcome::Perft { count, .. }) = &result {
            self.notify(&Notice::info(format!("Perft result: {count}")));
        }
        self.report(result)
    }

    pub async fn undo(&self) -> SessionResult<()> {
        let result = self.mutate(Request::Undo, self.engine.undo_move()).await;
        self.report(result)
    }

    /// Back to the starting position. The only way out of an ended game.
    pub async fn reset(&self) -> SessionResult<()> {
        let result = self.mutate(Request::Reset, self.engine.reset_game()).await;
        self.report(result)
    }

    /// Detach from the view. Responses still in flight are dropped when they arrive.
    pub fn teardown(&self) {
        let mut inner = self.inner.borrow_mut();
        if !inner.torn_down {
            info!(phase = ?inner.phase, "session torn down");
            inner.torn_down = true;
        }
    }

    /// Claim the in-flight slot, returning the phase to fall back to on failure
    fn begin(&self, request: Request) -> SessionResult<Phase> {
        let mut inner = self.inner.borrow_mut();
        if inner.torn_down {
            return Err(SessionError::TornDown);
        }
        let prior = inner.phase;
        match (prior, request) {
            (Phase::Pending, _) => return Err(SessionError::Busy),
            (Phase::Uninitialized, Request::Init(_)) => {}
            (Phase::Uninitialized, _) => return Err(SessionError::NotInitialized),
            (Phase::Ended, Request::Reset | Request::Init(_)) => {}
            (Phase::Ended, _) => return Err(ended(&inner.state)),
            (Phase::Ready, _) => {}
        }
        if let Request::Move { version } = request {
            if version != inner.state.version {
                return Err(SessionError::StaleSnapshot {
                    resolved: version,
                    current: inner.state.version,
                });
            }
        }
        if let Request::Init(variant) = request {
            inner.variant = variant;
        }
        inner.phase = Phase::Pending;
        debug!(?request, ?prior, "request started");
        Ok(prior)
    }

    /// Run one mutating engine call followed by a full refresh
    async fn mutate(
        &self,
        request: Request,
        call: impl Future<Output = Result<(), EngineError>>,
    ) -> SessionResult<()> {
        let prior = self.begin(request)?;
        let outcome = match self.guard(call).await {
            Ok(()) => self.fetch_state().await,
            Err(e) => Err(e),
        };
        self.finish(request, prior, outcome)
    }

    async fn perft(&self, depth: u32) -> SessionResult<u64> {
        let prior = self.begin(Request::Perft)?;
        let result = self.guard(self.engine.play_perft_test(depth)).await;

        let mut inner = self.inner.borrow_mut();
        if inner.torn_down {
            warn!(depth, "discarding perft result that arrived after teardown");
            return Err(SessionError::TornDown);
        }
        inner.phase = prior;
        debug!(depth, ?result, "perft finished");
        Ok(result?)
    }

    /// Apply the request timeout, if any, to a single engine call
    async fn guard<T>(
        &self,
        call: impl Future<Output = Result<T, EngineError>>,
    ) -> Result<T, EngineError> {
        match self.request_timeout {
            Some(limit) => tokio::time::timeout(limit, call)
                .await
                .unwrap_or_else(|_| Err(EngineError::Timeout)),
            None => call.await,
        }
    }

    /// Query everything a snapshot needs. The highlight and end-of-game queries are
    /// best effort; the rest must succeed for the snapshot to be replaced.
    async fn fetch_state(&self) -> Result<SessionState, EngineError> {
        let position_fen = self.guard(self.engine.get_current_position()).await?;
        let legal_moves = self.guard(self.engine.get_valid_moves_for_position()).await?;
        let move_history = self.guard(self.engine.get_move_history()).await?;
        let last_move = self.fetch_last_move(&move_history).await;
        let game_end_reason = match self.guard(self.engine.check_if_game_ended()).await {
            Ok(reason) if reason.trim().is_empty() => None,
            Ok(reason) => Some(reason),
            Err(e) => {
                warn!(error = %e, "could not check whether the game ended, assuming it continues");
                None
            }
        };
        debug!(
            fen = %position_fen,
            moves = legal_moves.len(),
            history = move_history.len(),
            "fetched snapshot"
        );
        Ok(SessionState {
            position_fen,
            legal_moves,
            move_history,
            last_move,
            game_end_reason,
            version: 0,
        })
    }

    async fn fetch_last_move(&self, history: &[String]) -> Option<(Square, Square)> {
        let start = self.guard(self.engine.get_start_square()).await;
        let target = self.guard(self.engine.get_target_square()).await;
        match (start, target) {
            (Ok(Some(from)), Ok(Some(to))) => Some((from, to)),
            (Ok(None), Ok(None)) if history.is_empty() => None,
            (start, target) => {
                warn!(?start, ?target, "engine did not report the last move squares");
                None
            }
        }
    }

    /// Install the outcome of a request, or roll the phase back on failure
    fn finish(
        &self,
        request: Request,
        prior: Phase,
        outcome: Result<SessionState, EngineError>,
    ) -> SessionResult<()> {
        let mut inner = self.inner.borrow_mut();
        if inner.torn_down {
            warn!(?request, "discarding response that arrived after teardown");
            return Err(SessionError::TornDown);
        }

        let mut fresh = match outcome {
            Ok(fresh) => fresh,
            Err(e) => {
                inner.phase = prior;
                drop(inner);
                warn!(?request, error = %e, "engine call failed, keeping the last snapshot");
                return Err(e.into());
            }
        };

        fresh.version = inner.state.version + 1;
        inner.phase = if fresh.is_ended() {
            Phase::Ended
        } else {
            Phase::Ready
        };
        inner.state = fresh;
        let phase = inner.phase;
        let snapshot = inner.state.clone();
        drop(inner);

        info!(?request, ?phase, version = snapshot.version, "session refreshed");
        if let Some(observer) = &self.observer {
            observer.on_state_changed(&snapshot);
        }
        if let (Phase::Ended, Some(reason)) = (phase, &snapshot.game_end_reason) {
            if prior != Phase::Ended {
                self.notify(&Notice::info(format!("Game ended by {reason}")));
            }
        }
        Ok(())
    }

    fn notify(&self, notice: &Notice) {
        if let Some(observer) = &self.observer {
            observer.on_notice(notice);
        }
    }

    /// Surface a failed request as a notice, when it warrants one
    fn report<T>(&self, result: SessionResult<T>) -> SessionResult<T> {
        if let Err(e) = &result {
            if let Some(notice) = Notice::for_error(e) {
                self.notify(&notice);
            }
        }
        result
    }
}

fn ended(state: &SessionState) -> SessionError {
    SessionError::GameEnded(state.game_end_reason.clone().unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::local_engine::LocalEngine;
    use crate::ui::view_models::NoticeKind;
    use std::cell::Cell;

    fn sq(text: &str) -> Square {
        Square::from_algebraic(text).unwrap()
    }

    #[derive(Default)]
    struct Recorder {
        states: Cell<usize>,
        notices: RefCell<Vec<Notice>>,
    }

    impl SessionObserver for Recorder {
        fn on_state_changed(&self, _state: &SessionState) {
            self.states.set(self.states.get() + 1);
        }

        fn on_notice(&self, notice: &Notice) {
            self.notices.borrow_mut().push(notice.clone());
        }
    }

    async fn ready() -> Session<LocalEngine> {
        let session = Session::new(LocalEngine::new());
        session.init(None).await.unwrap();
        session
    }

    #[test]
    fn test_variant_parse() {
        assert_eq!(Variant::parse(None), Variant::Standard);
        assert_eq!(Variant::parse(Some("")), Variant::Standard);
        assert_eq!(
            Variant::parse(Some("Knight")),
            Variant::Training(PieceKind::Knight)
        );
        assert_eq!(Variant::parse(Some("dragon")), Variant::Standard);
        assert_eq!(Variant::Training(PieceKind::Rook).id(), Some("rook"));
        assert_eq!(Variant::Standard.id(), None);
    }

    #[tokio::test]
    async fn test_init() {
        let session = Session::new(LocalEngine::new());
        assert_eq!(session.phase(), Phase::Uninitialized);
        assert_eq!(
            session.submit(Gesture::new(sq("e2"), sq("e4"))).await,
            Err(SessionError::NotInitialized)
        );

        session.init(None).await.unwrap();
        let state = session.snapshot();
        assert_eq!(session.phase(), Phase::Ready);
        assert_eq!(state.legal_moves.len(), 20);
        assert!(state.move_history.is_empty());
        assert_eq!(state.last_move, None);
        assert_eq!(state.version, 1);
    }

    #[tokio::test]
    async fn test_submit_gesture() {
        let session = ready().await;
        session.submit(Gesture::new(sq("e2"), sq("e4"))).await.unwrap();

        let state = session.snapshot();
        assert_eq!(state.move_history, vec!["e4"]);
        assert_eq!(state.last_move, Some((sq("e2"), sq("e4"))));
        assert_eq!(state.version, 2);
        assert_eq!(session.phase(), Phase::Ready);
    }

    #[tokio::test]
    async fn test_rejected_gesture_leaves_state() {
        let session = ready().await;
        let before = session.snapshot();
        let result = session.submit(Gesture::new(sq("e2"), sq("e5"))).await;
        assert_eq!(
            result,
            Err(SessionError::GestureRejected {
                from: sq("e2"),
                to: sq("e5")
            })
        );
        assert_eq!(session.snapshot(), before);
        assert_eq!(session.phase(), Phase::Ready);
    }

    #[tokio::test]
    async fn test_stale_selection() {
        let session = ready().await;
        let stale = session.select(&Gesture::new(sq("g1"), sq("f3"))).unwrap();
        session.submit_command("e4").await.unwrap();

        assert_eq!(
            session.play(stale).await,
            Err(SessionError::StaleSnapshot {
                resolved: 1,
                current: 2
            })
        );
        assert_eq!(session.phase(), Phase::Ready);
        assert_eq!(session.snapshot().move_history, vec!["e4"]);
    }

    #[tokio::test]
    async fn test_commands() {
        let recorder = Rc::new(Recorder::default());
        let session = Session::new(LocalEngine::new()).with_observer(recorder.clone());
        session.init(None).await.unwrap();

        assert_eq!(
            session.submit_command("   ").await,
            Ok(CommandOutcome::Ignored)
        );
        assert_eq!(session.submit_command("e4").await, Ok(CommandOutcome::Played));
        assert_eq!(session.submit_command("/undo").await, Ok(CommandOutcome::Undone));
        assert!(session.snapshot().move_history.is_empty());
        assert_eq!(
            session.submit_command("/perft 2").await,
            Ok(CommandOutcome::Perft {
                depth: 2,
                count: 400
            })
        );
        assert_eq!(session.phase(), Phase::Ready);

        let version = session.snapshot().version;
        assert!(matches!(
            session.submit_command("/perft 9").await,
            Err(SessionError::CommandRejected(_))
        ));
        assert_eq!(session.snapshot().version, version);

        let notices = recorder.notices.borrow();
        let messages: Vec<&str> = notices.iter().map(|n| n.message.as_str()).collect();
        assert_eq!(messages, vec!["Perft result: 400", "Perft depth is too high."]);
        assert_eq!(notices[1].kind, NoticeKind::Warning);
        assert_eq!(recorder.states.get(), 3);
    }

    #[tokio::test]
    async fn test_game_end_and_reset() {
        let recorder = Rc::new(Recorder::default());
        let session = Session::new(LocalEngine::new()).with_observer(recorder.clone());
        session.init(None).await.unwrap();

        for text in ["f3", "e5", "g4", "Qh4#"] {
            session.submit_command(text).await.unwrap();
        }
        assert_eq!(session.phase(), Phase::Ended);
        assert_eq!(
            session.snapshot().game_end_reason.as_deref(),
            Some("Checkmate")
        );
        assert_eq!(
            session.submit_command("/undo").await,
            Err(SessionError::GameEnded("Checkmate".to_string()))
        );
        assert!(matches!(
            session.select(&Gesture::new(sq("a2"), sq("a3"))),
            Err(SessionError::GameEnded(_))
        ));

        session.reset().await.unwrap();
        assert_eq!(session.phase(), Phase::Ready);
        assert!(session.snapshot().move_history.is_empty());

        let notices = recorder.notices.borrow();
        let ended: Vec<_> = notices
            .iter()
            .filter(|n| n.message == "Game ended by Checkmate")
            .collect();
        assert_eq!(ended.len(), 1);
    }

    #[tokio::test]
    async fn test_teardown() {
        let session = ready().await;
        session.teardown();
        assert!(session.is_torn_down());
        assert_eq!(session.reset().await, Err(SessionError::TornDown));
        assert_eq!(
            session.select(&Gesture::new(sq("e2"), sq("e4"))),
            Err(SessionError::TornDown)
        );
    }

    #[tokio::test]
    async fn test_training_init() {
        let session = Session::new(LocalEngine::with_seed(1));
        session.init(Some("rook")).await.unwrap();
        assert_eq!(session.variant(), Variant::Training(PieceKind::Rook));

        let state = session.snapshot();
        let (start, target) = state.last_move.unwrap();
        assert_ne!(start, target);
        assert_eq!(state.legal_moves.len(), 14);
        assert!(state.move_history.is_empty());
        assert_eq!(session.phase(), Phase::Ready);
    }

    #[tokio::test]
    async fn test_refused_init_keeps_variant() {
        let session = ready().await;
        session.teardown();
        assert_eq!(session.init(Some("knight")).await, Err(SessionError::TornDown));
        assert_eq!(session.variant(), Variant::Standard);
    }
}
