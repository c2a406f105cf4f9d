//! Tray visibility orchestrator - the five-slot carousel.
//!
//! Trays cycle through visible (display orders 0-1) → retired (99), with
//! hidden trays (2-4) promoted into the freed slot. This module only
//! sequences: it emits hide/shift/reveal commands to the external
//! animation layer and advances on the completion reports it gets back.
//!
//! Exactly one transition is active at a time. A tray that fills while
//! another transition runs is queued (deduplicated, never dropped) and
//! processed as soon as the current transition finalizes.
//!
//! Transition protocol per retiring tray:
//!
//! 1. Mark the tray animating and enqueue it.
//! 2. When its turn comes, plan the promotion (lowest hidden tray,
//!    preferring a color not already visible) and the shift set (visible
//!    trays sitting behind the retiring one), then emit `HideTray`.
//! 3. After the hide completes, emit every `ShiftTray` and the
//!    `RevealTray` together - they run in parallel with each other but
//!    never overlap the hide of a different transition.
//! 4. Once every acknowledgement is in: retire the tray (order 99), tear
//!    down its landed screws, clear all animating flags, emit
//!    `TrayRevealed` (even when nothing was promoted), and immediately
//!    start the next queued transition.

use std::collections::VecDeque;

use screw_sort_core::PuzzleState;
use screw_sort_types::{
    AnimCommand, AnimationDone, PuzzleEvent, ScrewColor, TrayId, RETIRED_DISPLAY_ORDER,
    VISIBLE_TRAY_SLOTS,
};

use crate::bus::Effects;

/// Where a transition currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    /// Waiting for the retiring tray's hide animation.
    Hiding,
    /// Waiting for the shift/reveal batch.
    Settling,
}

/// Acknowledgement still expected from the animation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Ack {
    Shifted(TrayId),
    Revealed(TrayId),
}

#[derive(Debug)]
struct Transition {
    retiring: TrayId,
    promoted: Option<TrayId>,
    shifting: Vec<TrayId>,
    stage: Stage,
    pending: Vec<Ack>,
}

#[derive(Debug, Default)]
pub struct TrayCarousel {
    queue: VecDeque<TrayId>,
    current: Option<Transition>,
}

impl TrayCarousel {
    /// Busy means mid-transition or queued work pending - either blocks
    /// colored placements and buffer drains.
    pub fn is_busy(&self) -> bool {
        self.current.is_some() || !self.queue.is_empty()
    }

    pub fn is_transitioning(&self) -> bool {
        self.current.is_some()
    }

    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    /// Session reset: drop the queue and any transition in progress.
    pub fn reset(&mut self) {
        self.queue.clear();
        self.current = None;
    }

    /// Update phase: after any landing, see whether the destination tray
    /// is ready to retire.
    pub fn apply(&mut self, state: &mut PuzzleState, event: &PuzzleEvent, fx: &mut Effects) {
        let tray = match event {
            PuzzleEvent::RemovalComplete { dest, .. } => dest.tray(),
            PuzzleEvent::TransferComplete { tray, .. } => Some(*tray),
            _ => None,
        };
        if let Some(tray) = tray {
            self.consider_retirement(state, tray, fx);
        }
    }

    /// Queue `tray` for retirement once it is full and nothing is still
    /// flying toward it. A full-but-still-receiving tray must not retire
    /// before its last screw lands.
    fn consider_retirement(&mut self, state: &mut PuzzleState, tray: TrayId, fx: &mut Effects) {
        let Some(t) = state.tray(tray) else {
            return;
        };
        if t.is_retired() || !t.is_full() {
            return;
        }
        if state.in_flight_toward(tray) > 0 {
            return;
        }
        if self.queue.contains(&tray) {
            return;
        }
        if self.current.as_ref().map(|tr| tr.retiring) == Some(tray) {
            return;
        }

        if let Some(t) = state.tray_mut(tray) {
            t.is_animating = true;
        }
        self.queue.push_back(tray);
        tracing::debug!(tray = %tray, "tray full, retirement queued");
        self.pump(state, fx);
    }

    /// Start the next queued transition if none is running.
    fn pump(&mut self, state: &mut PuzzleState, fx: &mut Effects) {
        if self.current.is_some() {
            return;
        }
        let Some(retiring) = self.queue.pop_front() else {
            return;
        };
        let Some(tray) = state.tray(retiring) else {
            // Torn down while queued; move on.
            return self.pump(state, fx);
        };

        let retiring_order = tray.display_order;
        let shifting: Vec<TrayId> = state
            .trays()
            .filter(|(id, t)| {
                *id != retiring && t.is_visible() && t.display_order > retiring_order
            })
            .map(|(id, _)| id)
            .collect();
        let promoted = self.pick_promotion(state, retiring);

        if let Some(t) = state.tray_mut(retiring) {
            t.is_animating = true;
        }
        self.current = Some(Transition {
            retiring,
            promoted,
            shifting,
            stage: Stage::Hiding,
            pending: Vec::new(),
        });
        tracing::debug!(tray = %retiring, promoted = ?promoted, "carousel transition started");
        fx.commands.push(AnimCommand::HideTray { tray: retiring });
    }

    /// Lowest hidden tray, preferring a color that is not already on a
    /// remaining visible tray so the player never faces two identical
    /// visible trays.
    fn pick_promotion(&self, state: &PuzzleState, retiring: TrayId) -> Option<TrayId> {
        let visible_colors: Vec<ScrewColor> = state
            .trays()
            .filter(|(id, t)| *id != retiring && t.is_visible())
            .map(|(_, t)| t.color)
            .collect();

        let hidden = state.hidden_trays_ordered();
        hidden
            .iter()
            .copied()
            .find(|id| {
                state
                    .tray(*id)
                    .map(|t| !visible_colors.contains(&t.color))
                    .unwrap_or(false)
            })
            .or_else(|| hidden.first().copied())
    }

    /// Completion reports from the animation layer.
    pub fn on_animation(&mut self, state: &mut PuzzleState, done: AnimationDone, fx: &mut Effects) {
        match done {
            AnimationDone::TrayHidden { tray } => self.on_hidden(state, tray, fx),
            AnimationDone::TrayShifted { tray } => self.on_ack(state, Ack::Shifted(tray), fx),
            AnimationDone::TrayRevealed { tray } => self.on_ack(state, Ack::Revealed(tray), fx),
            _ => {}
        }
    }

    fn on_hidden(&mut self, state: &mut PuzzleState, tray: TrayId, fx: &mut Effects) {
        let (shifting, promoted) = match &self.current {
            Some(tr) if tr.stage == Stage::Hiding && tr.retiring == tray => {
                (tr.shifting.clone(), tr.promoted)
            }
            _ => {
                tracing::trace!(tray = %tray, "stale hide completion ignored");
                return;
            }
        };

        // Display orders move synchronously with the commands; the trays
        // stay flagged animating until the whole transition finalizes.
        let mut pending = Vec::new();
        for id in &shifting {
            if let Some(t) = state.tray_mut(*id) {
                t.is_animating = true;
                t.display_order = t.display_order.saturating_sub(1);
                fx.commands.push(AnimCommand::ShiftTray {
                    tray: *id,
                    to_order: t.display_order,
                });
                pending.push(Ack::Shifted(*id));
            }
        }
        if let Some(p) = promoted {
            if let Some(t) = state.tray_mut(p) {
                t.is_animating = true;
                t.display_order = VISIBLE_TRAY_SLOTS - 1;
                fx.commands.push(AnimCommand::RevealTray { tray: p });
                pending.push(Ack::Revealed(p));
            }
        }

        let mut settled = false;
        if let Some(tr) = self.current.as_mut() {
            tr.stage = Stage::Settling;
            tr.pending = pending;
            settled = tr.pending.is_empty();
        }
        if settled {
            self.finalize(state, fx);
        }
    }

    fn on_ack(&mut self, state: &mut PuzzleState, ack: Ack, fx: &mut Effects) {
        let mut settled = false;
        match self.current.as_mut() {
            Some(tr) if tr.stage == Stage::Settling => {
                let before = tr.pending.len();
                tr.pending.retain(|&a| a != ack);
                if tr.pending.len() == before {
                    tracing::trace!(?ack, "unexpected settle acknowledgement ignored");
                    return;
                }
                settled = tr.pending.is_empty();
            }
            _ => return,
        }
        if settled {
            self.finalize(state, fx);
        }
    }

    fn finalize(&mut self, state: &mut PuzzleState, fx: &mut Effects) {
        let Some(tr) = self.current.take() else {
            return;
        };

        if let Some(t) = state.tray_mut(tr.retiring) {
            t.display_order = RETIRED_DISPLAY_ORDER;
            t.is_animating = false;
        }
        let torn_down = state.teardown_tray_screws(tr.retiring);
        for id in &tr.shifting {
            if let Some(t) = state.tray_mut(*id) {
                t.is_animating = false;
            }
        }
        if let Some(p) = tr.promoted {
            if let Some(t) = state.tray_mut(p) {
                t.is_animating = false;
            }
        }

        tracing::debug!(
            retired = %tr.retiring,
            promoted = ?tr.promoted,
            torn_down,
            "carousel transition finished"
        );
        fx.events.push(PuzzleEvent::TrayRevealed {
            retired: tr.retiring,
            promoted: tr.promoted,
        });

        // The freed slot may immediately admit the next retirement.
        self.pump(state, fx);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use screw_sort_core::{demo_level, PuzzleState};
    use screw_sort_types::{PlacementTarget, ScrewId, ScrewState};

    fn state() -> PuzzleState {
        PuzzleState::from_level(&demo_level()).unwrap()
    }

    /// Fill `tray` with landed screws taken from the board.
    fn fill_tray(state: &mut PuzzleState, tray: TrayId) {
        let capacity = state.tray(tray).unwrap().capacity;
        let ids: Vec<ScrewId> = state
            .screws()
            .filter(|(_, s)| s.state == ScrewState::InBoard)
            .map(|(id, _)| id)
            .take(capacity as usize)
            .collect();
        for (slot, id) in ids.iter().enumerate() {
            let s = state.screw_mut(*id).unwrap();
            s.state = ScrewState::InTray;
            s.is_animating = false;
            s.target = Some(PlacementTarget::Tray {
                tray,
                slot: slot as u8,
            });
        }
        state.tray_mut(tray).unwrap().count = capacity;
    }

    fn landing(tray: TrayId) -> PuzzleEvent {
        PuzzleEvent::RemovalComplete {
            screw: ScrewId(0),
            dest: PlacementTarget::Tray { tray, slot: 0 },
        }
    }

    #[test]
    fn full_tray_starts_a_transition() {
        let mut s = state();
        let mut carousel = TrayCarousel::default();
        fill_tray(&mut s, TrayId(0));

        let mut fx = Effects::default();
        carousel.apply(&mut s, &landing(TrayId(0)), &mut fx);

        assert!(carousel.is_transitioning());
        assert!(carousel.is_busy());
        assert_eq!(fx.commands, vec![AnimCommand::HideTray { tray: TrayId(0) }]);
        assert!(s.tray(TrayId(0)).unwrap().is_animating);
    }

    #[test]
    fn tray_with_screws_in_flight_waits() {
        let mut s = state();
        let mut carousel = TrayCarousel::default();
        fill_tray(&mut s, TrayId(0));

        // One of the tray's screws has not landed yet.
        let flying = s
            .screws()
            .find(|(_, sc)| sc.state == ScrewState::InTray)
            .unwrap()
            .0;
        let sc = s.screw_mut(flying).unwrap();
        sc.state = ScrewState::Animating;
        sc.is_animating = true;

        let mut fx = Effects::default();
        carousel.apply(&mut s, &landing(TrayId(0)), &mut fx);
        assert!(!carousel.is_busy());
        assert!(fx.commands.is_empty());

        // The last landing triggers the retirement.
        let sc = s.screw_mut(flying).unwrap();
        sc.state = ScrewState::InTray;
        sc.is_animating = false;
        let mut fx = Effects::default();
        carousel.apply(&mut s, &landing(TrayId(0)), &mut fx);
        assert!(carousel.is_transitioning());
    }

    #[test]
    fn hide_then_shift_and_reveal_then_finalize() {
        let mut s = state();
        let mut carousel = TrayCarousel::default();
        fill_tray(&mut s, TrayId(0));

        let mut fx = Effects::default();
        carousel.apply(&mut s, &landing(TrayId(0)), &mut fx);
        assert_eq!(fx.commands, vec![AnimCommand::HideTray { tray: TrayId(0) }]);

        // Hide completes: tray 1 shifts 1 → 0, tray 2 (green) reveals at 1.
        let mut fx = Effects::default();
        carousel.on_animation(
            &mut s,
            AnimationDone::TrayHidden { tray: TrayId(0) },
            &mut fx,
        );
        assert_eq!(
            fx.commands,
            vec![
                AnimCommand::ShiftTray {
                    tray: TrayId(1),
                    to_order: 0,
                },
                AnimCommand::RevealTray { tray: TrayId(2) },
            ]
        );
        assert_eq!(s.tray(TrayId(1)).unwrap().display_order, 0);
        assert_eq!(s.tray(TrayId(2)).unwrap().display_order, 1);
        assert!(s.tray(TrayId(1)).unwrap().is_animating);
        assert!(s.tray(TrayId(2)).unwrap().is_animating);
        assert!(fx.events.is_empty());

        // Both acknowledgements land, in either order.
        let mut fx = Effects::default();
        carousel.on_animation(
            &mut s,
            AnimationDone::TrayRevealed { tray: TrayId(2) },
            &mut fx,
        );
        assert!(carousel.is_transitioning());
        carousel.on_animation(
            &mut s,
            AnimationDone::TrayShifted { tray: TrayId(1) },
            &mut fx,
        );

        assert!(!carousel.is_busy());
        assert_eq!(
            fx.events,
            vec![PuzzleEvent::TrayRevealed {
                retired: TrayId(0),
                promoted: Some(TrayId(2)),
            }]
        );
        let retired = s.tray(TrayId(0)).unwrap();
        assert!(retired.is_retired());
        assert!(!retired.is_animating);
        assert!(!s.tray(TrayId(1)).unwrap().is_animating);
        assert!(!s.tray(TrayId(2)).unwrap().is_animating);
        // The retired tray's screws are torn down.
        assert_eq!(s.screws().count(), 12);
    }

    #[test]
    fn second_full_tray_is_queued_not_dropped() {
        let mut s = state();
        let mut carousel = TrayCarousel::default();
        fill_tray(&mut s, TrayId(0));

        let mut fx = Effects::default();
        carousel.apply(&mut s, &landing(TrayId(0)), &mut fx);
        assert!(carousel.is_transitioning());

        fill_tray(&mut s, TrayId(1));
        let mut fx = Effects::default();
        carousel.apply(&mut s, &landing(TrayId(1)), &mut fx);
        assert_eq!(carousel.queued(), 1);
        // No second hide while the first transition runs.
        assert!(fx.commands.is_empty());

        // Duplicate landing events never queue the same tray twice.
        let mut fx = Effects::default();
        carousel.apply(&mut s, &landing(TrayId(1)), &mut fx);
        assert_eq!(carousel.queued(), 1);

        // Finish the first transition; the second starts immediately.
        let mut fx = Effects::default();
        carousel.on_animation(
            &mut s,
            AnimationDone::TrayHidden { tray: TrayId(0) },
            &mut fx,
        );
        for done in [
            AnimationDone::TrayShifted { tray: TrayId(1) },
            AnimationDone::TrayRevealed { tray: TrayId(2) },
        ] {
            carousel.on_animation(&mut s, done, &mut fx);
        }

        assert!(carousel.is_transitioning());
        assert_eq!(carousel.queued(), 0);
        assert!(fx
            .commands
            .contains(&AnimCommand::HideTray { tray: TrayId(1) }));
    }

    #[test]
    fn promotion_prefers_a_color_not_already_visible() {
        let mut s = state();
        let mut carousel = TrayCarousel::default();

        // Make the first hidden tray blue - the same color as the
        // remaining visible tray 1. Tray 3 (yellow) should be promoted
        // instead.
        s.tray_mut(TrayId(2)).unwrap().color = ScrewColor::Blue;

        fill_tray(&mut s, TrayId(0));
        let mut fx = Effects::default();
        carousel.apply(&mut s, &landing(TrayId(0)), &mut fx);
        carousel.on_animation(
            &mut s,
            AnimationDone::TrayHidden { tray: TrayId(0) },
            &mut fx,
        );

        assert!(fx
            .commands
            .contains(&AnimCommand::RevealTray { tray: TrayId(3) }));
        assert_eq!(s.tray(TrayId(3)).unwrap().display_order, 1);
        // The skipped duplicate stays queued at its old order.
        assert_eq!(s.tray(TrayId(2)).unwrap().display_order, 2);
    }

    #[test]
    fn no_hidden_tray_still_emits_revealed_event() {
        let mut s = state();
        let mut carousel = TrayCarousel::default();

        // Retire the hidden queue out of existence.
        for id in [2u8, 3, 4] {
            s.tray_mut(TrayId(id)).unwrap().display_order = RETIRED_DISPLAY_ORDER;
        }
        fill_tray(&mut s, TrayId(1));

        let mut fx = Effects::default();
        carousel.apply(&mut s, &landing(TrayId(1)), &mut fx);
        assert_eq!(fx.commands, vec![AnimCommand::HideTray { tray: TrayId(1) }]);

        // Retiring the back visible tray: nothing shifts, nothing reveals,
        // the transition finalizes straight from the hide.
        let mut fx = Effects::default();
        carousel.on_animation(
            &mut s,
            AnimationDone::TrayHidden { tray: TrayId(1) },
            &mut fx,
        );
        assert!(!carousel.is_busy());
        assert_eq!(
            fx.events,
            vec![PuzzleEvent::TrayRevealed {
                retired: TrayId(1),
                promoted: None,
            }]
        );
    }

    #[test]
    fn stale_completions_are_ignored() {
        let mut s = state();
        let mut carousel = TrayCarousel::default();

        let mut fx = Effects::default();
        carousel.on_animation(
            &mut s,
            AnimationDone::TrayHidden { tray: TrayId(0) },
            &mut fx,
        );
        assert!(fx.events.is_empty());
        assert!(fx.commands.is_empty());
        assert!(!carousel.is_busy());
    }

    #[test]
    fn reset_drops_queue_and_transition() {
        let mut s = state();
        let mut carousel = TrayCarousel::default();
        fill_tray(&mut s, TrayId(0));
        fill_tray(&mut s, TrayId(1));

        let mut fx = Effects::default();
        carousel.apply(&mut s, &landing(TrayId(0)), &mut fx);
        carousel.apply(&mut s, &landing(TrayId(1)), &mut fx);
        assert!(carousel.is_transitioning());
        assert_eq!(carousel.queued(), 1);

        carousel.reset();
        assert!(!carousel.is_busy());
        assert_eq!(carousel.queued(), 0);
    }
}
