//! Orchestration engine - queued, event-driven transitions that never race
//!
//! This crate ties the pure rules of `screw-sort-core` to the asynchronous
//! outside world. It owns the event bus, the buffer auto-transfer
//! coordinator, the tray carousel orchestrator, the part release
//! coordinator, and the win/stuck detector, and it sequences all of them
//! behind a single synchronous facade, [`PuzzleEngine`].
//!
//! # Dispatch Model
//!
//! Everything runs on one logical thread. For every event the engine runs
//! two dispatch phases in a fixed order:
//!
//! 1. **Update** - handlers that change state in direct response to the
//!    event (part counts, transfer bookkeeping, full-tray detection).
//! 2. **React** - handlers that re-examine the world after all updates
//!    landed (the buffer drain check, terminal-condition detection).
//!
//! The two-phase split makes the ordering contract between sibling
//! handlers structural: the drain check can never observe a full tray
//! before the carousel has had the chance to flag it busy.
//!
//! # Serialized Resources
//!
//! At most one carousel transition and one buffer-to-tray transfer are
//! active at any instant; everything else may overlap freely in animation
//! time. "Waiting" is bookkeeping plus a later completion report - no
//! call in this crate ever blocks.

pub mod bus;
pub mod carousel;
pub mod detector;
pub mod engine;
pub mod harness;
pub mod release;
pub mod transfer;

pub use bus::{Effects, EventBus};
pub use carousel::TrayCarousel;
pub use detector::{PendingWork, WinStuckDetector};
pub use engine::{PuzzleEngine, TapOutcome};
pub use harness::{completion_for, EventLog, ScriptedAnimator};
pub use release::PartRelease;
pub use transfer::AutoTransfer;
