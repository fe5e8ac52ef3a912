//! Callbacks from the synchronizer to its view.

use crate::models::preferences::{PreferenceKey, PreferenceValue};
use crate::models::session::SessionState;
use crate::ui::view_models::Notice;

/// What a view implements to follow the session and its preferences.
///
/// Every method has an empty default so a view only picks the events it renders.
pub trait SessionObserver {
    /// A new consistent snapshot is in place
    fn on_state_changed(&self, _state: &SessionState) {}

    fn on_preference_changed(&self, _key: PreferenceKey, _value: PreferenceValue) {}

    /// A transient message for the user (rejections, perft results, game over)
    fn on_notice(&self, _notice: &Notice) {}
}
