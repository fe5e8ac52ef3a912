//! Matching drag gestures against the engine's legal move list.

use crate::domain::chess::{Gesture, Move, PieceKind};

/// Find the legal move a gesture refers to.
///
/// The first entry whose from/to squares match wins. Pawn moves onto a back rank get the
/// promotion piece named by the gesture's hint attached to the returned copy (queen when
/// the hint is missing or unrecognized). Returns `None` if the gesture matches nothing,
/// in which case the view should put the piece back and send nothing to the engine.
pub fn resolve(gesture: &Gesture, legal_moves: &[Move]) -> Option<Move> {
    let found = legal_moves
        .iter()
        .find(|m| m.from == gesture.from && m.to == gesture.to)?;

    let mut resolved = *found;
    if resolved.is_promotion() {
        resolved.promotion_piece = Some(PieceKind::from_promotion_hint(gesture.promotion_hint));
    }
    Some(resolved)
}
