//! In-process event bus with read-only observer fan-out.
//!
//! The bus carries [`PuzzleEvent`]s between the engine's dispatch turns
//! and fans each one out to registered observers. Observers are strictly
//! read-only taps (logging, replay, test inspection); the core routing
//! between coordinators happens in the engine's two-phase dispatch, not
//! here. Delivery is at-most-once per observer per emission, in
//! registration order.

use std::collections::VecDeque;

use screw_sort_types::{PuzzleEvent, Topic};

/// Outbox of a single dispatch turn: animation commands to hand to the
/// external animation layer plus follow-up events to queue on the bus.
#[derive(Debug, Default)]
pub struct Effects {
    pub commands: Vec<screw_sort_types::AnimCommand>,
    pub events: Vec<PuzzleEvent>,
}

type Observer = Box<dyn FnMut(&PuzzleEvent)>;

struct Subscription {
    topic: Option<Topic>,
    observer: Observer,
}

/// Publish/subscribe channel for puzzle events.
#[derive(Default)]
pub struct EventBus {
    queue: VecDeque<PuzzleEvent>,
    subscriptions: Vec<Subscription>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an observer for every topic.
    pub fn subscribe<F>(&mut self, observer: F)
    where
        F: FnMut(&PuzzleEvent) + 'static,
    {
        self.subscriptions.push(Subscription {
            topic: None,
            observer: Box::new(observer),
        });
    }

    /// Register an observer for a single topic.
    pub fn subscribe_topic<F>(&mut self, topic: Topic, observer: F)
    where
        F: FnMut(&PuzzleEvent) + 'static,
    {
        self.subscriptions.push(Subscription {
            topic: Some(topic),
            observer: Box::new(observer),
        });
    }

    /// Queue an event for dispatch.
    pub fn publish(&mut self, event: PuzzleEvent) {
        self.queue.push_back(event);
    }

    /// Pull the next queued event, FIFO.
    pub fn take_next(&mut self) -> Option<PuzzleEvent> {
        self.queue.pop_front()
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Fan an event out to observers: once per matching subscription, in
    /// registration order.
    pub fn notify(&mut self, event: &PuzzleEvent) {
        let topic = event.topic();
        for sub in &mut self.subscriptions {
            if sub.topic.is_none() || sub.topic == Some(topic) {
                (sub.observer)(event);
            }
        }
    }

    /// Drop queued events without touching subscriptions (session reset).
    pub fn clear_pending(&mut self) {
        self.queue.clear();
    }
}
