//! Placement resolver - where may a tapped screw go right now
//!
//! The resolver is pure decision logic over [`PuzzleState`]. The decision
//! and the reservation are two halves of one synchronous step: callers
//! resolve a target and apply [`reserve`] in the same turn, before any
//! other tap can be observed. That single rule is what prevents two
//! concurrently tapped screws from claiming the same slot while their
//! animations overlap.
//!
//! Priority order is strict:
//!
//! 1. A visible colored tray of the matching color with free space, first
//!    match by ascending display order - but only while no tray is
//!    animating and the carousel is idle.
//! 2. The next free buffer slot. The FIFO already lists in-flight
//!    reservations, so fullness accounting needs no extra bookkeeping.
//! 3. `None`: the caller must leave the screw untouched. This is the
//!    soft-lock signal path.

use screw_sort_types::{PlacementTarget, ScrewColor, ScrewId, ScrewState};

use crate::state::PuzzleState;

/// Resolve the legal destination for a screw of `color`, or `None`.
///
/// `carousel_busy` is the visibility orchestrator's self-reported status
/// (mid-transition or queued work pending); while it is set, colored
/// trays are off limits and only the buffer can accept screws.
pub fn find_placement_target(
    state: &PuzzleState,
    carousel_busy: bool,
    color: ScrewColor,
) -> Option<PlacementTarget> {
    if !carousel_busy && !state.any_tray_animating() {
        for id in state.visible_trays_ordered() {
            let tray = match state.tray(id) {
                Some(t) => t,
                None => continue,
            };
            if tray.color == color && tray.has_space() {
                // Slot index is the pre-increment count.
                return Some(PlacementTarget::Tray {
                    tray: id,
                    slot: tray.count,
                });
            }
        }
    }

    if !state.buffer().is_full() {
        return Some(PlacementTarget::Buffer {
            slot: state.buffer().len() as u8,
        });
    }

    None
}

/// Claim the resolved destination for `screw`, synchronously.
///
/// Increments the tray count or appends to the buffer FIFO, and flips the
/// screw into its animating state. Must be called in the same turn as the
/// resolve - capacity observed by the next caller already includes this
/// claim.
pub fn reserve(state: &mut PuzzleState, screw: ScrewId, target: PlacementTarget) {
    match target {
        PlacementTarget::Tray { tray, .. } => {
            if let Some(t) = state.tray_mut(tray) {
                debug_assert!(t.count < t.capacity);
                t.count += 1;
            }
        }
        PlacementTarget::Buffer { .. } => {
            state.buffer_mut().push(screw);
        }
    }

    if let Some(s) = state.screw_mut(screw) {
        s.state = ScrewState::Animating;
        s.is_animating = true;
        s.target = Some(target);
    }
}

/// True iff at least one board-mounted, non-animating screw has somewhere
/// to go. Used by the win/stuck detector.
pub fn has_valid_moves(state: &PuzzleState, carousel_busy: bool) -> bool {
    state.screws().any(|(_, s)| {
        s.state == ScrewState::InBoard
            && !s.is_animating
            && find_placement_target(state, carousel_busy, s.color).is_some()
    })
}
