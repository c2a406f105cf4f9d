//! Part release coordinator.
//!
//! Watches removal completions, keeps per-part screw counts honest, and
//! flags a board freed exactly once when its last screw comes out. The
//! freed transition is the handoff point to the external physics layer;
//! this coordinator never touches physics state.

use screw_sort_core::PuzzleState;
use screw_sort_types::{PartState, PuzzleEvent};

use crate::bus::Effects;

#[derive(Debug, Default)]
pub struct PartRelease;

impl PartRelease {
    /// Update phase: decrement the owning part's count on a landed
    /// removal. Floored at zero and freed-only-once, so duplicate or
    /// stale deliveries degrade to no-ops.
    pub fn apply(&mut self, state: &mut PuzzleState, event: &PuzzleEvent, fx: &mut Effects) {
        let PuzzleEvent::RemovalComplete { screw, .. } = event else {
            return;
        };

        // Taking the part reference makes a duplicate delivery for the
        // same screw a no-op.
        let Some(part_id) = state.screw_mut(*screw).and_then(|s| s.part.take()) else {
            return;
        };
        let Some(part) = state.part_mut(part_id) else {
            tracing::trace!(part = %part_id, "removal for torn-down part ignored");
            return;
        };

        part.screws_remaining = part.screws_remaining.saturating_sub(1);
        if part.state != PartState::Free && part.screws_remaining == 0 {
            part.state = PartState::Free;
            tracing::debug!(part = %part_id, "part freed");
            fx.events.push(PuzzleEvent::PartFreed { part: part_id });
        }
    }
}
