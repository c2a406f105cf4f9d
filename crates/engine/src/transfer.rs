//! Buffer auto-transfer coordinator.
//!
//! Drains the buffer tray into colored trays one screw at a time,
//! FIFO-fair: the earliest-arrived buffered screw is always tried first.
//! The drain check runs in the reactive dispatch phase so that sibling
//! update handlers (the carousel flagging a tray full, the landing
//! bookkeeping) are guaranteed to have run first.
//!
//! Guards - all must be clear before a transfer starts:
//!
//! - no transfer already in flight (only one at a time, for determinism
//!   and so two drains can never claim the same slot),
//! - no colored tray animating,
//! - the carousel reports itself idle (not transitioning, nothing queued).

use screw_sort_core::PuzzleState;
use screw_sort_types::{
    AnimCommand, PlacementTarget, PuzzleEvent, ScrewId, ScrewState, Topic, TrayId,
};

use crate::bus::Effects;

#[derive(Debug, Default)]
pub struct AutoTransfer {
    in_flight: Option<ScrewId>,
}

impl AutoTransfer {
    pub fn in_flight(&self) -> Option<ScrewId> {
        self.in_flight
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Session reset: forget the in-flight transfer.
    pub fn reset(&mut self) {
        self.in_flight = None;
    }

    /// Update phase: clear the in-flight flag when our transfer lands.
    pub fn apply(&mut self, _state: &mut PuzzleState, event: &PuzzleEvent, _fx: &mut Effects) {
        if let PuzzleEvent::TransferComplete { screw, .. } = event {
            if self.in_flight == Some(*screw) {
                self.in_flight = None;
            }
        }
    }

    /// Reactive phase: re-run the drain check on the triggering topics.
    pub fn react(
        &mut self,
        state: &mut PuzzleState,
        event: &PuzzleEvent,
        carousel_busy: bool,
        fx: &mut Effects,
    ) {
        match event.topic() {
            Topic::RemovalComplete | Topic::TransferComplete | Topic::TrayRevealed => {}
            _ => return,
        }
        self.check(state, carousel_busy, fx);
    }

    /// Try to start exactly one buffer-to-tray transfer.
    pub fn check(&mut self, state: &mut PuzzleState, carousel_busy: bool, fx: &mut Effects) {
        if self.in_flight.is_some() || carousel_busy || state.any_tray_animating() {
            return;
        }

        let Some((screw, tray, slot)) = self.pick(state) else {
            return;
        };

        // Reservation happens here, synchronously with the pick.
        state.buffer_mut().remove(screw);
        if let Some(t) = state.tray_mut(tray) {
            debug_assert!(t.count < t.capacity);
            t.count += 1;
        }
        if let Some(s) = state.screw_mut(screw) {
            s.state = ScrewState::Animating;
            s.is_animating = true;
            s.target = Some(PlacementTarget::Tray { tray, slot });
        }
        self.in_flight = Some(screw);

        tracing::debug!(screw = %screw, tray = %tray, slot, "buffer transfer started");
        fx.events.push(PuzzleEvent::TransferStarted { screw, tray, slot });
        fx.commands.push(AnimCommand::TransferScrew { screw, tray, slot });
    }

    /// First buffered, landed screw whose color has a visible tray with
    /// space, scanning the FIFO from the front.
    fn pick(&self, state: &PuzzleState) -> Option<(ScrewId, TrayId, u8)> {
        for id in state.buffer().iter() {
            let Some(screw) = state.screw(id) else {
                continue;
            };
            if screw.is_animating {
                // Still flying into the buffer; skip, but keep its slot.
                continue;
            }
            let dest = state.visible_trays_ordered().into_iter().find_map(|tid| {
                let tray = state.tray(tid)?;
                (tray.color == screw.color && tray.has_space()).then_some((tid, tray.count))
            });
            if let Some((tray, slot)) = dest {
                return Some((id, tray, slot));
            }
        }
        None
    }
}
