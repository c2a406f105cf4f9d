//! Shared types for the screw-sort puzzle engine
//!
//! This crate defines the fundamental vocabulary used by every other crate:
//! entity identifiers, the screw color palette, lifecycle states, carousel
//! constants, and the closed event/command unions exchanged with the
//! external animation layer. All types are pure data with no external
//! dependencies, making them usable in any context (core rules, engine
//! orchestration, test harnesses).
//!
//! # Carousel Layout
//!
//! Five tray slots rotate through the carousel:
//!
//! | Display order | Meaning                 |
//! |---------------|-------------------------|
//! | 0-1           | Visible, accepts screws |
//! | 2-4           | Hidden queue            |
//! | 99            | Retired (torn down)     |

pub mod event;

pub use event::{AnimCommand, AnimationDone, PuzzleEvent, Topic};

/// Number of tray slots in the carousel (visible + hidden queue).
pub const TRAY_SLOT_COUNT: usize = 5;

/// Display orders below this value are visible and accept screws.
pub const VISIBLE_TRAY_SLOTS: u8 = 2;

/// Sentinel display order for a retired tray.
pub const RETIRED_DISPLAY_ORDER: u8 = 99;

/// Default per-tray screw capacity.
pub const DEFAULT_TRAY_CAPACITY: u8 = 3;

/// Default buffer tray capacity.
pub const DEFAULT_BUFFER_CAPACITY: u8 = 5;

/// Upper bound on configurable buffer capacity (fixed backing storage).
pub const MAX_BUFFER_SLOTS: usize = 16;

/// Identifier of a screw within a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ScrewId(pub u32);

/// Identifier of a part (board) within a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PartId(pub u32);

/// Identifier of a colored tray slot within a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TrayId(pub u8);

impl std::fmt::Display for ScrewId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "screw#{}", self.0)
    }
}

impl std::fmt::Display for PartId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "part#{}", self.0)
    }
}

impl std::fmt::Display for TrayId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "tray#{}", self.0)
    }
}

/// Screw color palette (fixed and finite).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScrewColor {
    Red,
    Blue,
    Green,
    Yellow,
    Purple,
    Orange,
}

impl ScrewColor {
    /// All palette colors, in canonical order.
    pub const ALL: [ScrewColor; 6] = [
        ScrewColor::Red,
        ScrewColor::Blue,
        ScrewColor::Green,
        ScrewColor::Yellow,
        ScrewColor::Purple,
        ScrewColor::Orange,
    ];

    /// Parse a color from its name (case-insensitive).
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "red" => Some(ScrewColor::Red),
            "blue" => Some(ScrewColor::Blue),
            "green" => Some(ScrewColor::Green),
            "yellow" => Some(ScrewColor::Yellow),
            "purple" => Some(ScrewColor::Purple),
            "orange" => Some(ScrewColor::Orange),
            _ => None,
        }
    }

    /// Convert to lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            ScrewColor::Red => "red",
            ScrewColor::Blue => "blue",
            ScrewColor::Green => "green",
            ScrewColor::Yellow => "yellow",
            ScrewColor::Purple => "purple",
            ScrewColor::Orange => "orange",
        }
    }
}

/// Screw lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScrewState {
    /// Mounted on its part, available for a tap.
    InBoard,
    /// Reserved and moving toward its destination.
    Animating,
    /// Landed in a colored tray slot.
    InTray,
    /// Landed in the buffer tray.
    InBuffer,
}

/// Part (board) lifecycle states.
///
/// `Loosened` and `Pivoting` are driven by the external physics layer;
/// the engine only performs the irreversible transition to `Free`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PartState {
    Static,
    Loosened,
    Pivoting,
    Free,
}

/// Session phase. Monotonic: once `Won` or `Stuck`, never changes again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GamePhase {
    Playing,
    Won,
    Stuck,
}

impl GamePhase {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, GamePhase::Playing)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            GamePhase::Playing => "playing",
            GamePhase::Won => "won",
            GamePhase::Stuck => "stuck",
        }
    }
}

/// Win condition for a session. Currently a single rule, kept as an enum
/// so levels can add new rules without touching the detector's call sites.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WinCondition {
    /// Every screw has left its board and the buffer has drained.
    AllScrewsRemoved,
}

/// Destination of a reserved screw.
///
/// Slot indices are assigned at reservation time from the destination's
/// pre-increment occupancy, so two reservations can never claim the same
/// slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlacementTarget {
    /// A slot in a visible colored tray.
    Tray { tray: TrayId, slot: u8 },
    /// A slot in the buffer tray.
    Buffer { slot: u8 },
}

impl PlacementTarget {
    /// The colored tray this target points at, if any.
    pub fn tray(&self) -> Option<TrayId> {
        match self {
            PlacementTarget::Tray { tray, .. } => Some(*tray),
            PlacementTarget::Buffer { .. } => None,
        }
    }
}
