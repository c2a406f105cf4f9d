//! The engine facade: one synchronous entry point per external surface.
//!
//! [`PuzzleEngine`] owns the session state, the event bus, and every
//! coordinator, and exposes exactly three ways in:
//!
//! - [`PuzzleEngine::tap_screw`] - the input layer requests a removal,
//! - [`PuzzleEngine::animation_done`] - the animation layer reports a
//!   completion,
//! - [`PuzzleEngine::reset`] / [`PuzzleEngine::load`] - the level loader
//!   rebuilds the session.
//!
//! Outbound animation work accumulates as [`AnimCommand`]s and is pulled
//! with [`PuzzleEngine::take_commands`]; the engine never calls out.
//!
//! Each inbound call runs to completion on the calling thread: the event
//! it produces is dispatched through the two-phase handler order (update
//! handlers first, reactive re-checks second), follow-up events queue
//! behind it, and the loop drains until quiescent. Nothing here blocks,
//! and no two dispatches ever interleave.

use screw_sort_core::{
    find_placement_target, reserve, LevelConfig, LevelError, PuzzleSnapshot, PuzzleState,
};
use screw_sort_types::{
    AnimCommand, AnimationDone, PlacementTarget, PuzzleEvent, ScrewId, ScrewState, Topic,
};

use crate::bus::{Effects, EventBus};
use crate::carousel::TrayCarousel;
use crate::detector::{PendingWork, WinStuckDetector};
use crate::release::PartRelease;
use crate::transfer::AutoTransfer;

/// Result of a tap request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TapOutcome {
    /// Destination reserved; a removal command was issued.
    Accepted(PlacementTarget),
    /// No legal destination right now; the screw was left untouched.
    NoTarget,
    /// The tap referenced a missing, busy, or already-removed screw, or
    /// the session is over.
    Ignored,
}

pub struct PuzzleEngine {
    config: LevelConfig,
    state: PuzzleState,
    bus: EventBus,
    release: PartRelease,
    transfer: AutoTransfer,
    carousel: TrayCarousel,
    detector: WinStuckDetector,
    commands: Vec<AnimCommand>,
}

impl PuzzleEngine {
    /// Build a session from a level configuration.
    pub fn new(config: LevelConfig) -> Result<Self, LevelError> {
        let state = PuzzleState::from_level(&config)?;
        Ok(Self {
            config,
            state,
            bus: EventBus::new(),
            release: PartRelease,
            transfer: AutoTransfer::default(),
            carousel: TrayCarousel::default(),
            detector: WinStuckDetector,
            commands: Vec::new(),
        })
    }

    pub fn state(&self) -> &PuzzleState {
        &self.state
    }

    #[cfg(test)]
    pub(crate) fn state_mut_for_tests(&mut self) -> &mut PuzzleState {
        &mut self.state
    }

    pub fn snapshot(&self) -> PuzzleSnapshot {
        PuzzleSnapshot::capture(&self.state)
    }

    pub fn carousel_busy(&self) -> bool {
        self.carousel.is_busy()
    }

    pub fn transfer_in_flight(&self) -> Option<ScrewId> {
        self.transfer.in_flight()
    }

    /// Register a read-only observer for every bus topic.
    pub fn subscribe<F>(&mut self, observer: F)
    where
        F: FnMut(&PuzzleEvent) + 'static,
    {
        self.bus.subscribe(observer);
    }

    /// Register a read-only observer for one bus topic.
    pub fn subscribe_topic<F>(&mut self, topic: Topic, observer: F)
    where
        F: FnMut(&PuzzleEvent) + 'static,
    {
        self.bus.subscribe_topic(topic, observer);
    }

    /// Hand accumulated animation commands to the animation layer.
    pub fn take_commands(&mut self) -> Vec<AnimCommand> {
        std::mem::take(&mut self.commands)
    }

    /// Input layer entry point: request removal of a tapped screw.
    ///
    /// Resolution and reservation happen in this one synchronous step;
    /// by the time this returns, the destination's capacity already
    /// accounts for the screw, so overlapping taps cannot double-book.
    pub fn tap_screw(&mut self, screw: ScrewId) -> TapOutcome {
        if self.state.session().phase.is_terminal() {
            return TapOutcome::Ignored;
        }
        let Some(s) = self.state.screw(screw) else {
            return TapOutcome::Ignored;
        };
        if s.state != ScrewState::InBoard || s.is_animating {
            return TapOutcome::Ignored;
        }
        let color = s.color;

        let Some(target) = find_placement_target(&self.state, self.carousel.is_busy(), color)
        else {
            tracing::debug!(screw = %screw, color = color.as_str(), "tap has no destination");
            return TapOutcome::NoTarget;
        };

        reserve(&mut self.state, screw, target);
        self.commands.push(AnimCommand::RemoveScrew {
            screw,
            dest: target,
        });
        tracing::debug!(screw = %screw, ?target, "removal reserved");
        TapOutcome::Accepted(target)
    }

    /// Animation layer entry point: exactly one report per command.
    ///
    /// Stale or duplicated reports (including leftovers from before a
    /// reset) degrade to no-ops.
    pub fn animation_done(&mut self, done: AnimationDone) {
        match done {
            AnimationDone::ScrewRemoved { screw } => self.complete_removal(screw),
            AnimationDone::ScrewTransferred { screw } => self.complete_transfer(screw),
            AnimationDone::TrayHidden { .. }
            | AnimationDone::TrayShifted { .. }
            | AnimationDone::TrayRevealed { .. } => {
                let mut fx = Effects::default();
                self.carousel.on_animation(&mut self.state, done, &mut fx);
                self.absorb(fx);
                self.drain();
            }
        }
    }

    /// Restart the current level: a full atomic reset of counters,
    /// queues, and flags before any new reservation can be observed.
    pub fn reset(&mut self) {
        let episode = self.state.session().episode.wrapping_add(1);
        match PuzzleState::from_level(&self.config) {
            Ok(mut fresh) => {
                fresh.session_mut().episode = episode;
                self.state = fresh;
            }
            Err(err) => {
                // The stored config validated at construction time.
                tracing::error!(%err, "reset failed to rebuild state");
                return;
            }
        }
        self.carousel.reset();
        self.transfer.reset();
        self.bus.clear_pending();
        self.commands.clear();
        tracing::info!(episode, "session reset");
    }

    /// Replace the session with a new level. Observers stay subscribed.
    pub fn load(&mut self, config: LevelConfig) -> Result<(), LevelError> {
        let state = PuzzleState::from_level(&config)?;
        self.config = config;
        self.state = state;
        self.carousel.reset();
        self.transfer.reset();
        self.bus.clear_pending();
        self.commands.clear();
        Ok(())
    }

    fn complete_removal(&mut self, screw: ScrewId) {
        // A transfer completion misreported as a removal must not land
        // through this path.
        if self.transfer.in_flight() == Some(screw) {
            tracing::trace!(screw = %screw, "removal report for in-flight transfer ignored");
            return;
        }
        let Some(s) = self.state.screw(screw) else {
            tracing::trace!(screw = %screw, "removal report for missing screw ignored");
            return;
        };
        if s.state != ScrewState::Animating || !s.is_animating {
            tracing::trace!(screw = %screw, "duplicate removal report ignored");
            return;
        }
        let Some(dest) = s.target else {
            return;
        };

        if let Some(s) = self.state.screw_mut(screw) {
            s.is_animating = false;
            s.state = match dest {
                PlacementTarget::Tray { .. } => ScrewState::InTray,
                PlacementTarget::Buffer { .. } => ScrewState::InBuffer,
            };
        }
        self.dispatch(PuzzleEvent::RemovalComplete { screw, dest });
    }

    fn complete_transfer(&mut self, screw: ScrewId) {
        if self.transfer.in_flight() != Some(screw) {
            tracing::trace!(screw = %screw, "stale transfer report ignored");
            return;
        }
        let Some(tray) = self
            .state
            .screw(screw)
            .and_then(|s| s.target)
            .and_then(|t| t.tray())
        else {
            return;
        };

        if let Some(s) = self.state.screw_mut(screw) {
            s.is_animating = false;
            s.state = ScrewState::InTray;
        }
        self.dispatch(PuzzleEvent::TransferComplete { screw, tray });
    }

    fn dispatch(&mut self, event: PuzzleEvent) {
        self.bus.publish(event);
        self.drain();
    }

    /// Process queued events until quiescent. For each event: update
    /// handlers in fixed order, then reactive handlers, then observers.
    fn drain(&mut self) {
        while let Some(event) = self.bus.take_next() {
            let mut fx = Effects::default();

            // Phase one: state updates.
            self.release.apply(&mut self.state, &event, &mut fx);
            self.transfer.apply(&mut self.state, &event, &mut fx);
            self.carousel.apply(&mut self.state, &event, &mut fx);

            // Phase two: reactive re-checks, after every update landed.
            self.transfer
                .react(&mut self.state, &event, self.carousel.is_busy(), &mut fx);
            let pending = PendingWork {
                carousel_busy: self.carousel.is_busy(),
                transfer_in_flight: self.transfer.is_in_flight(),
            };
            self.detector.react(&mut self.state, &event, pending, &mut fx);

            self.bus.notify(&event);
            self.absorb(fx);
        }
    }

    fn absorb(&mut self, fx: Effects) {
        self.commands.extend(fx.commands);
        for event in fx.events {
            self.bus.publish(event);
        }
    }
}
