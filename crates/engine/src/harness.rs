//! Observation and drive helpers for tests and headless runners.
//!
//! Nothing here is required for gameplay: [`EventLog`] is a read-only bus
//! tap, and [`ScriptedAnimator`] stands in for the external animation
//! layer by acknowledging commands on demand. Tests use the latter to
//! interleave completions precisely (for instance holding a screw in
//! flight while a tray fills).

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use screw_sort_types::{AnimCommand, AnimationDone, PuzzleEvent, Topic};

use crate::engine::PuzzleEngine;

/// The completion report the animation layer owes for a command.
pub fn completion_for(command: &AnimCommand) -> AnimationDone {
    match *command {
        AnimCommand::RemoveScrew { screw, .. } => AnimationDone::ScrewRemoved { screw },
        AnimCommand::TransferScrew { screw, .. } => AnimationDone::ScrewTransferred { screw },
        AnimCommand::HideTray { tray } => AnimationDone::TrayHidden { tray },
        AnimCommand::ShiftTray { tray, .. } => AnimationDone::TrayShifted { tray },
        AnimCommand::RevealTray { tray } => AnimationDone::TrayRevealed { tray },
    }
}

/// Read-only recording of every event the bus fans out.
#[derive(Clone)]
pub struct EventLog {
    events: Rc<RefCell<Vec<PuzzleEvent>>>,
}

impl EventLog {
    /// Subscribe a fresh log to the engine's bus.
    pub fn attach(engine: &mut PuzzleEngine) -> Self {
        let events = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&events);
        engine.subscribe(move |event| sink.borrow_mut().push(*event));
        Self { events }
    }

    pub fn events(&self) -> Vec<PuzzleEvent> {
        self.events.borrow().clone()
    }

    pub fn count(&self, topic: Topic) -> usize {
        self.events
            .borrow()
            .iter()
            .filter(|e| e.topic() == topic)
            .count()
    }

    pub fn clear(&self) {
        self.events.borrow_mut().clear();
    }
}

/// Scripted stand-in for the animation layer.
///
/// Collected commands queue in arrival order; each is acknowledged with
/// exactly one completion report when asked.
#[derive(Debug, Default)]
pub struct ScriptedAnimator {
    pending: VecDeque<AnimCommand>,
}

impl ScriptedAnimator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pull newly issued commands from the engine. Returns how many.
    pub fn collect(&mut self, engine: &mut PuzzleEngine) -> usize {
        let commands = engine.take_commands();
        let n = commands.len();
        self.pending.extend(commands);
        n
    }

    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Outstanding commands, oldest first.
    pub fn pending_commands(&self) -> Vec<AnimCommand> {
        self.pending.iter().copied().collect()
    }

    /// Acknowledge the oldest outstanding command.
    pub fn complete_next(&mut self, engine: &mut PuzzleEngine) -> Option<AnimCommand> {
        let command = self.pending.pop_front()?;
        engine.animation_done(completion_for(&command));
        Some(command)
    }

    /// Acknowledge the oldest command matching `predicate`, out of order.
    pub fn complete_matching<F>(
        &mut self,
        engine: &mut PuzzleEngine,
        predicate: F,
    ) -> Option<AnimCommand>
    where
        F: Fn(&AnimCommand) -> bool,
    {
        let idx = self.pending.iter().position(|c| predicate(c))?;
        let command = self.pending.remove(idx)?;
        engine.animation_done(completion_for(&command));
        Some(command)
    }

    /// Drive every animation to completion, including ones issued as a
    /// consequence of earlier completions. Returns the total count.
    pub fn settle(&mut self, engine: &mut PuzzleEngine) -> usize {
        let mut completed = 0;
        loop {
            self.collect(engine);
            match self.complete_next(engine) {
                Some(_) => completed += 1,
                None => break,
            }
        }
        completed
    }

    /// Drop outstanding commands (session reset mid-animation).
    pub fn clear(&mut self) {
        self.pending.clear();
    }
}
