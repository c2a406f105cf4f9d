//! Core puzzle rules - pure, deterministic, and testable
//!
//! This crate contains the puzzle state model and the placement rules.
//! It has **zero dependencies** on animation, physics, or I/O, making it:
//!
//! - **Deterministic**: the same tap sequence always produces the same state
//! - **Testable**: every rule is exercised without an engine or a renderer
//! - **Portable**: usable from the orchestration engine, headless drivers,
//!   and test harnesses alike
//!
//! # Module Structure
//!
//! - [`state`]: screws, parts, trays, the buffer, and the session record
//! - [`placement`]: the placement resolver and synchronous reservation
//! - [`level`]: validated level configuration supplied by the level loader
//! - [`snapshot`]: cheap read-only state summaries for observers
//!
//! # Reservation Rule
//!
//! Every capacity counter is claimed synchronously, at decision time, never
//! at animation-completion time. A tray's `count` and the buffer's FIFO
//! length therefore already include screws that are still in flight, which
//! is what makes concurrent taps race-free on a single thread.

pub mod level;
pub mod placement;
pub mod snapshot;
pub mod state;

pub use level::{demo_level, LevelConfig, LevelError, PartSpec, TraySpec};
pub use placement::{find_placement_target, has_valid_moves, reserve};
pub use snapshot::{PuzzleSnapshot, TraySnapshot};
pub use state::{BufferTray, Part, PuzzleState, Screw, Session, Tray};
