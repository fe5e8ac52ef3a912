//! Test engine: the local engine with injectable failures and a suspend point per call.

use std::cell::RefCell;
use std::collections::HashSet;
use std::time::Duration;

use chess_sync::domain::{Move, Square};
use chess_sync::models::{EngineError, GameEngine, LocalEngine};

#[derive(Debug, Default)]
pub struct FlakyEngine {
    inner: LocalEngine,
    failing: RefCell<HashSet<&'static str>>,
    stalled: RefCell<HashSet<&'static str>>,
    calls: RefCell<Vec<&'static str>>,
}

impl FlakyEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Same drills on every run
    pub fn seeded(seed: u64) -> Self {
        Self {
            inner: LocalEngine::with_seed(seed),
            ..Self::default()
        }
    }

    /// Make every call to `method` fail until `heal` is called
    pub fn fail(&self, method: &'static str) {
        self.failing.borrow_mut().insert(method);
    }

    /// Make every call to `method` hang for an hour
    pub fn stall(&self, method: &'static str) {
        self.stalled.borrow_mut().insert(method);
    }

    pub fn heal(&self) {
        self.failing.borrow_mut().clear();
        self.stalled.borrow_mut().clear();
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.borrow().clone()
    }

    pub fn count(&self, method: &str) -> usize {
        self.calls.borrow().iter().filter(|c| **c == method).count()
    }

    async fn step(&self, method: &'static str) -> Result<(), EngineError> {
        self.calls.borrow_mut().push(method);
        tokio::task::yield_now().await;
        if self.stalled.borrow().contains(method) {
            tokio::time::sleep(Duration::from_secs(3600)).await;
        }
        if self.failing.borrow().contains(method) {
            return Err(EngineError::Unavailable(format!("{method} failed")));
        }
        Ok(())
    }
}

impl GameEngine for FlakyEngine {
    async fn initialize_board(&self, variant: Option<&str>) -> Result<(), EngineError> {
        self.step("initialize_board").await?;
        self.inner.initialize_board(variant).await
    }

    async fn get_current_position(&self) -> Result<String, EngineError> {
        self.step("get_current_position").await?;
        self.inner.get_current_position().await
    }

    async fn get_valid_moves_for_position(&self) -> Result<Vec<Move>, EngineError> {
        self.step("get_valid_moves_for_position").await?;
        self.inner.get_valid_moves_for_position().await
    }

    async fn play_move(&self, mv: Move) -> Result<(), EngineError> {
        self.step("play_move").await?;
        self.inner.play_move(mv).await
    }

    async fn play_move_from_text(&self, text: &str) -> Result<(), EngineError> {
        self.step("play_move_from_text").await?;
        self.inner.play_move_from_text(text).await
    }

    async fn undo_move(&self) -> Result<(), EngineError> {
        self.step("undo_move").await?;
        self.inner.undo_move().await
    }

    async fn reset_game(&self) -> Result<(), EngineError> {
        self.step("reset_game").await?;
        self.inner.reset_game().await
    }

    async fn get_move_history(&self) -> Result<Vec<String>, EngineError> {
        self.step("get_move_history").await?;
        self.inner.get_move_history().await
    }

    async fn get_start_square(&self) -> Result<Option<Square>, EngineError> {
        self.step("get_start_square").await?;
        self.inner.get_start_square().await
    }

    async fn get_target_square(&self) -> Result<Option<Square>, EngineError> {
        self.step("get_target_square").await?;
        self.inner.get_target_square().await
    }

    async fn check_if_game_ended(&self) -> Result<String, EngineError> {
        self.step("check_if_game_ended").await?;
        self.inner.check_if_game_ended().await
    }

    async fn play_perft_test(&self, depth: u32) -> Result<u64, EngineError> {
        self.step("play_perft_test").await?;
        self.inner.play_perft_test(depth).await
    }
}
