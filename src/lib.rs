//! Client-side session synchronizer for a chess game whose rules live in a remote engine.

pub mod config;
pub mod domain;
pub mod error;
pub mod models;
pub mod ui;

pub use config::ClientConfig;
pub use error::{SessionError, SessionResult};
pub use models::{GameEngine, LocalEngine, Session, SessionState};
