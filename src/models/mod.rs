pub mod engine;
pub mod local_engine;
pub mod observer;
pub mod preferences;
pub mod session;

pub use engine::{EngineError, GameEngine};
pub use local_engine::LocalEngine;
pub use observer::SessionObserver;
pub use preferences::{
    FileStorage, MemoryStorage, PreferenceKey, PreferenceStorage, PreferenceStore,
    PreferenceValue,
};
pub use session::{CommandOutcome, Phase, SelectedMove, Session, SessionState, Variant};
