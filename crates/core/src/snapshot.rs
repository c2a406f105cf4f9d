//! Read-only state summaries for observers and drivers.
//!
//! A snapshot is a cheap copy of the decision-relevant numbers; it never
//! exposes mutable access, so harnesses and UIs can poll freely without
//! touching core state.

use arrayvec::ArrayVec;

use screw_sort_types::{GamePhase, ScrewColor, ScrewState, TrayId, TRAY_SLOT_COUNT};

use crate::state::PuzzleState;

/// Summary of one carousel slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TraySnapshot {
    pub tray: TrayId,
    pub color: ScrewColor,
    pub count: u8,
    pub capacity: u8,
    pub display_order: u8,
    pub is_animating: bool,
}

/// Summary of a whole session at one instant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PuzzleSnapshot {
    pub phase: GamePhase,
    pub episode: u32,
    pub total_screws: u32,
    pub removed_screws: u32,
    pub screws_in_board: u32,
    pub screws_in_flight: u32,
    pub buffer_len: u8,
    pub buffer_capacity: u8,
    pub trays: ArrayVec<TraySnapshot, TRAY_SLOT_COUNT>,
}

impl PuzzleSnapshot {
    pub fn capture(state: &PuzzleState) -> Self {
        let session = state.session();
        let in_flight = state
            .screws()
            .filter(|(_, s)| s.state == ScrewState::Animating)
            .count() as u32;

        let mut trays = ArrayVec::new();
        for (id, tray) in state.trays() {
            trays.push(TraySnapshot {
                tray: id,
                color: tray.color,
                count: tray.count,
                capacity: tray.capacity,
                display_order: tray.display_order,
                is_animating: tray.is_animating,
            });
        }

        Self {
            phase: session.phase,
            episode: session.episode,
            total_screws: session.total_screws,
            removed_screws: session.removed_screws,
            screws_in_board: state.screws_in_board() as u32,
            screws_in_flight: in_flight,
            buffer_len: state.buffer().len() as u8,
            buffer_capacity: state.buffer().capacity(),
            trays,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::level::demo_level;

    #[test]
    fn capture_reflects_fresh_state() {
        let state = PuzzleState::from_level(&demo_level()).unwrap();
        let snap = PuzzleSnapshot::capture(&state);

        assert_eq!(snap.phase, GamePhase::Playing);
        assert_eq!(snap.total_screws, 15);
        assert_eq!(snap.screws_in_board, 15);
        assert_eq!(snap.screws_in_flight, 0);
        assert_eq!(snap.removed_screws, 0);
        assert_eq!(snap.buffer_len, 0);
        assert_eq!(snap.trays.len(), TRAY_SLOT_COUNT);
    }
}
