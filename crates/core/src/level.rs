//! Level configuration - the contract with the external level loader
//!
//! A [`LevelConfig`] carries everything a session needs at creation time:
//! the five tray slots with their colors, tray and buffer capacities, and
//! the per-part screw layout. Configurations arrive either from code (test
//! fixtures) or from JSON level files, and are validated before a session
//! is built so that an unwinnable-by-construction level is rejected up
//! front instead of surfacing as a mystery soft-lock mid-game.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use screw_sort_types::{
    ScrewColor, WinCondition, DEFAULT_BUFFER_CAPACITY, DEFAULT_TRAY_CAPACITY, MAX_BUFFER_SLOTS,
    TRAY_SLOT_COUNT,
};

/// Wire spelling of [`ScrewColor`] for level files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
enum ColorName {
    Red,
    Blue,
    Green,
    Yellow,
    Purple,
    Orange,
}

impl From<ColorName> for ScrewColor {
    fn from(value: ColorName) -> Self {
        match value {
            ColorName::Red => ScrewColor::Red,
            ColorName::Blue => ScrewColor::Blue,
            ColorName::Green => ScrewColor::Green,
            ColorName::Yellow => ScrewColor::Yellow,
            ColorName::Purple => ScrewColor::Purple,
            ColorName::Orange => ScrewColor::Orange,
        }
    }
}

impl From<ScrewColor> for ColorName {
    fn from(value: ScrewColor) -> Self {
        match value {
            ScrewColor::Red => ColorName::Red,
            ScrewColor::Blue => ColorName::Blue,
            ScrewColor::Green => ColorName::Green,
            ScrewColor::Yellow => ColorName::Yellow,
            ScrewColor::Purple => ColorName::Purple,
            ScrewColor::Orange => ColorName::Orange,
        }
    }
}

mod color_field {
    use super::*;
    use serde::{Deserializer, Serializer};

    pub fn serialize<S: Serializer>(color: &ScrewColor, s: S) -> Result<S::Ok, S::Error> {
        ColorName::from(*color).serialize(s)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<ScrewColor, D::Error> {
        ColorName::deserialize(d).map(ScrewColor::from)
    }
}

mod color_list {
    use super::*;
    use serde::{Deserializer, Serializer};

    pub fn serialize<S: Serializer>(colors: &[ScrewColor], s: S) -> Result<S::Ok, S::Error> {
        let names: Vec<ColorName> = colors.iter().copied().map(ColorName::from).collect();
        names.serialize(s)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<ScrewColor>, D::Error> {
        let names = Vec::<ColorName>::deserialize(d)?;
        Ok(names.into_iter().map(ScrewColor::from).collect())
    }
}

/// One carousel slot: the tray color parked there at load time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraySpec {
    #[serde(with = "color_field")]
    pub color: ScrewColor,
}

impl TraySpec {
    pub fn new(color: ScrewColor) -> Self {
        Self { color }
    }
}

/// One part (board) and the screws mounted on it, in mount order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartSpec {
    /// Z-layer handed through to the physics/render layers.
    #[serde(default)]
    pub layer: i32,
    #[serde(with = "color_list")]
    pub screws: Vec<ScrewColor>,
}

fn default_tray_capacity() -> u8 {
    DEFAULT_TRAY_CAPACITY
}

fn default_buffer_capacity() -> u8 {
    DEFAULT_BUFFER_CAPACITY
}

/// Everything the level loader supplies at session creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelConfig {
    #[serde(default = "default_tray_capacity")]
    pub tray_capacity: u8,
    #[serde(default = "default_buffer_capacity")]
    pub buffer_capacity: u8,
    /// Exactly [`TRAY_SLOT_COUNT`] entries; the first two start visible.
    pub trays: Vec<TraySpec>,
    pub parts: Vec<PartSpec>,
    #[serde(skip, default = "LevelConfig::default_win_condition")]
    pub win_condition: WinCondition,
}

impl LevelConfig {
    fn default_win_condition() -> WinCondition {
        WinCondition::AllScrewsRemoved
    }

    pub fn total_screws(&self) -> usize {
        self.parts.iter().map(|p| p.screws.len()).sum()
    }

    /// Reject configurations that could not produce a playable session.
    pub fn validate(&self) -> Result<(), LevelError> {
        if self.trays.len() != TRAY_SLOT_COUNT {
            return Err(LevelError::TraySlotCount {
                expected: TRAY_SLOT_COUNT,
                found: self.trays.len(),
            });
        }
        if self.tray_capacity == 0 {
            return Err(LevelError::ZeroTrayCapacity);
        }
        if self.buffer_capacity as usize > MAX_BUFFER_SLOTS {
            return Err(LevelError::BufferTooLarge {
                requested: self.buffer_capacity,
                max: MAX_BUFFER_SLOTS,
            });
        }
        if self.total_screws() == 0 {
            return Err(LevelError::NoScrews);
        }

        for color in ScrewColor::ALL {
            let screws = self
                .parts
                .iter()
                .flat_map(|p| p.screws.iter())
                .filter(|&&c| c == color)
                .count();
            if screws == 0 {
                continue;
            }
            let slots = self
                .trays
                .iter()
                .filter(|t| t.color == color)
                .count()
                * self.tray_capacity as usize;
            if slots == 0 {
                return Err(LevelError::UnsortableColor { color });
            }
            if screws > slots {
                return Err(LevelError::OverSubscribed { color });
            }
        }

        Ok(())
    }
}

/// Level validation failures.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LevelError {
    #[error("level must define exactly {expected} tray slots, found {found}")]
    TraySlotCount { expected: usize, found: usize },

    #[error("tray capacity must be nonzero")]
    ZeroTrayCapacity,

    #[error("buffer capacity {requested} exceeds the maximum of {max}")]
    BufferTooLarge { requested: u8, max: usize },

    #[error("level contains no screws")]
    NoScrews,

    #[error("screw color `{}` has no matching tray", .color.as_str())]
    UnsortableColor { color: ScrewColor },

    #[error("more `{}` screws than `{}` tray slots across the level", .color.as_str(), .color.as_str())]
    OverSubscribed { color: ScrewColor },
}

/// Built-in level used by the demo binary and the test suite: five colors,
/// fifteen screws across four boards, defaults for both capacities.
pub fn demo_level() -> LevelConfig {
    use ScrewColor::*;
    LevelConfig {
        tray_capacity: DEFAULT_TRAY_CAPACITY,
        buffer_capacity: DEFAULT_BUFFER_CAPACITY,
        trays: vec![
            TraySpec::new(Red),
            TraySpec::new(Blue),
            TraySpec::new(Green),
            TraySpec::new(Yellow),
            TraySpec::new(Purple),
        ],
        parts: vec![
            PartSpec {
                layer: 0,
                screws: vec![Red, Red, Blue],
            },
            PartSpec {
                layer: 1,
                screws: vec![Blue, Green, Green],
            },
            PartSpec {
                layer: 2,
                screws: vec![Red, Blue, Green, Yellow],
            },
            PartSpec {
                layer: 3,
                screws: vec![Yellow, Yellow, Purple, Purple, Purple],
            },
        ],
        win_condition: WinCondition::AllScrewsRemoved,
    }
}
