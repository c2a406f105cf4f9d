//! Terminal-condition detector: win and soft-lock.
//!
//! Runs last in the reactive dispatch phase, so it always sees the world
//! after the carousel and the auto-transfer coordinator have reacted to
//! the same event.
//!
//! Win requires both an empty board and an empty buffer - a screw parked
//! in the buffer blocks the win even when every board is bare. The stuck
//! verdict is deferred while serialized work is pending (a carousel
//! transition or a buffer transfer), because either can free a slot; it
//! is re-examined when that work completes. Both verdicts are terminal.

use screw_sort_core::{has_valid_moves, PuzzleState};
use screw_sort_types::{GamePhase, PuzzleEvent, WinCondition};

use crate::bus::Effects;

/// Serialized work still pending at evaluation time.
#[derive(Debug, Clone, Copy, Default)]
pub struct PendingWork {
    pub carousel_busy: bool,
    pub transfer_in_flight: bool,
}

impl PendingWork {
    pub fn any(&self) -> bool {
        self.carousel_busy || self.transfer_in_flight
    }
}

#[derive(Debug, Default)]
pub struct WinStuckDetector;

impl WinStuckDetector {
    /// Reactive phase: evaluate terminal conditions after a state-changing
    /// event. No-op once the session has left `Playing`.
    pub fn react(
        &self,
        state: &mut PuzzleState,
        event: &PuzzleEvent,
        pending: PendingWork,
        fx: &mut Effects,
    ) {
        if state.session().phase.is_terminal() {
            return;
        }

        match event {
            PuzzleEvent::RemovalComplete { .. } => {
                state.session_mut().removed_screws += 1;
                if self.check_win(state, pending, fx) {
                    return;
                }
                self.check_stuck(state, pending, fx);
            }
            PuzzleEvent::TransferComplete { .. } => {
                // A drain can finish the game when the last screw left its
                // board through the buffer.
                if self.check_win(state, pending, fx) {
                    return;
                }
                self.check_stuck(state, pending, fx);
            }
            PuzzleEvent::TrayRevealed { .. } => {
                self.check_stuck(state, pending, fx);
            }
            _ => {}
        }
    }

    fn check_win(&self, state: &mut PuzzleState, pending: PendingWork, fx: &mut Effects) -> bool {
        let met = match state.session().win_condition {
            WinCondition::AllScrewsRemoved => {
                state.screws_in_board() == 0
                    && state.buffer().is_empty()
                    && !pending.transfer_in_flight
            }
        };
        if met {
            state.session_mut().phase = GamePhase::Won;
            tracing::info!(
                removed = state.session().removed_screws,
                "win condition met"
            );
            fx.events.push(PuzzleEvent::GameWon);
        }
        met
    }

    fn check_stuck(&self, state: &mut PuzzleState, pending: PendingWork, fx: &mut Effects) {
        // Pending serialized work can still free a destination; the
        // verdict re-runs when it completes.
        if pending.any() {
            return;
        }
        if state.screws_in_board() == 0 {
            return;
        }
        if has_valid_moves(state, false) {
            return;
        }
        state.session_mut().phase = GamePhase::Stuck;
        tracing::info!(
            in_board = state.screws_in_board(),
            buffered = state.buffer().len(),
            "no legal move left, session stuck"
        );
        fx.events.push(PuzzleEvent::GameStuck);
    }
}
