//! Display generation for the move list and the info panel.
//!
//! This module transforms session state into display-ready view models.
//! It lives in the UI layer and depends on domain + models, not vice versa.

use crate::domain::Square;
use crate::models::preferences::{PreferenceStore, PreferenceStorage};
use crate::ui::board_layout::BoardLayout;
use crate::ui::view_models::{BoardAppearance, MovePairDisplay};

/// Pair the flat move history into numbered white/black rows
pub fn move_history_pairs(history: &[String]) -> Vec<MovePairDisplay> {
    history
        .chunks(2)
        .enumerate()
        .map(|(i, pair)| MovePairDisplay {
            move_num: i + 1,
            white: pair[0].clone(),
            black: pair.get(1).cloned(),
        })
        .collect()
}

/// Label for the last move, e.g. `"e2 → e4"`
pub fn last_move_label(last_move: Option<(Square, Square)>) -> Option<String> {
    last_move.map(|(from, to)| format!("{from} → {to}"))
}

pub fn end_reason_label(reason: Option<&str>) -> Option<String> {
    reason.map(|reason| format!("Game ended by {reason}"))
}

/// Resolve the display preferences into what the board area draws
pub fn board_appearance<S: PreferenceStorage>(
    preferences: &PreferenceStore<S>,
    layout: BoardLayout,
) -> BoardAppearance {
    let show_board = preferences.board_visible();
    let layout = layout.with_size_percent(preferences.board_size_percent());
    BoardAppearance {
        show_board,
        show_pieces: show_board && preferences.pieces_visible(),
        width: layout.width(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::preferences::MemoryStorage;

    #[test]
    fn test_move_history_pairs() {
        let history: Vec<String> = ["e4", "e5", "Nf3"].iter().map(|s| s.to_string()).collect();
        let pairs = move_history_pairs(&history);
        assert_eq!(pairs.len(), 2);
        assert_eq!(pairs[0].move_num, 1);
        assert_eq!(pairs[0].black.as_deref(), Some("e5"));
        assert_eq!(pairs[1].white, "Nf3");
        assert_eq!(pairs[1].black, None);
        assert!(move_history_pairs(&[]).is_empty());
    }

    #[test]
    fn test_labels() {
        let from = Square::from_algebraic("e2").unwrap();
        let to = Square::from_algebraic("e4").unwrap();
        assert_eq!(last_move_label(Some((from, to))).as_deref(), Some("e2 → e4"));
        assert_eq!(last_move_label(None), None);
        assert_eq!(
            end_reason_label(Some("Stalemate")).as_deref(),
            Some("Game ended by Stalemate")
        );
    }

    #[test]
    fn test_board_appearance() {
        let mut preferences = PreferenceStore::new(MemoryStorage::default());
        let layout = BoardLayout::default();
        let shown = board_appearance(&preferences, layout);
        assert!(shown.show_board && shown.show_pieces);
        assert_eq!(shown.width, 1200.0);

        preferences.set_board_size_percent(0.0).unwrap();
        preferences.set_board_visible(false).unwrap();
        let hidden = board_appearance(&preferences, layout);
        assert!(!hidden.show_board);
        assert!(!hidden.show_pieces);
        assert_eq!(hidden.width, 320.0);
    }
}
