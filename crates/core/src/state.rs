//! Puzzle state model - every entity a session owns
//!
//! The state is the single owner of all entities (screws, parts, trays,
//! the buffer tray, and the session record). Orchestration code queries it
//! and mutates it through accessors; nothing outside this struct holds
//! entity data, only ids.
//!
//! Coordinates of truth worth knowing:
//!
//! - A tray's `count` includes screws still in flight toward it, because
//!   counts are claimed at reservation time.
//! - The buffer FIFO likewise lists reserved screws that have not landed.
//! - "In flight toward tray T" is a derived predicate over screw fields,
//!   not a separate counter, so it can never drift out of sync.

use arrayvec::ArrayVec;

use screw_sort_types::{
    GamePhase, PartId, PartState, PlacementTarget, ScrewColor, ScrewId, ScrewState, TrayId,
    WinCondition, MAX_BUFFER_SLOTS, RETIRED_DISPLAY_ORDER, TRAY_SLOT_COUNT, VISIBLE_TRAY_SLOTS,
};

use crate::level::{LevelConfig, LevelError};

/// Removable puzzle unit with a color, mounted on a part.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Screw {
    pub color: ScrewColor,
    /// Owning part; cleared once the removal lands.
    pub part: Option<PartId>,
    /// Mount slot index on the owning part.
    pub mount: u32,
    pub state: ScrewState,
    /// Reserved destination, set atomically with the reservation.
    pub target: Option<PlacementTarget>,
    pub is_animating: bool,
}

/// A puzzle piece holding zero or more screws.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Part {
    /// Z-layer, consumed by the external physics/render layers.
    pub layer: i32,
    pub screws_remaining: u32,
    pub state: PartState,
}

impl Part {
    pub fn is_free(&self) -> bool {
        self.state == PartState::Free
    }
}

/// Fixed-capacity, color-matched destination tray.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tray {
    pub color: ScrewColor,
    pub capacity: u8,
    /// Occupied slots, including reservations still in flight.
    pub count: u8,
    pub display_order: u8,
    pub is_animating: bool,
}

impl Tray {
    /// Visible trays sit in display orders 0..VISIBLE_TRAY_SLOTS.
    pub fn is_visible(&self) -> bool {
        self.display_order < VISIBLE_TRAY_SLOTS
    }

    pub fn is_hidden(&self) -> bool {
        !self.is_visible() && !self.is_retired()
    }

    pub fn is_retired(&self) -> bool {
        self.display_order == RETIRED_DISPLAY_ORDER
    }

    pub fn is_full(&self) -> bool {
        self.count >= self.capacity
    }

    /// Room for another reservation right now.
    pub fn has_space(&self) -> bool {
        self.count < self.capacity
    }
}

/// Color-agnostic overflow tray with strict FIFO drain order.
///
/// Backing storage is fixed; `capacity` caps the usable prefix so levels
/// can configure smaller buffers.
#[derive(Debug, Clone, Default)]
pub struct BufferTray {
    capacity: u8,
    fifo: ArrayVec<ScrewId, MAX_BUFFER_SLOTS>,
}

impl BufferTray {
    pub fn new(capacity: u8) -> Self {
        debug_assert!(capacity as usize <= MAX_BUFFER_SLOTS);
        Self {
            capacity,
            fifo: ArrayVec::new(),
        }
    }

    pub fn capacity(&self) -> u8 {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.fifo.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fifo.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.fifo.len() >= self.capacity as usize
    }

    /// Append a reservation at the back of the FIFO.
    /// Returns false (and changes nothing) when the buffer is full.
    pub fn push(&mut self, screw: ScrewId) -> bool {
        if self.is_full() {
            return false;
        }
        self.fifo.push(screw);
        true
    }

    /// Remove one screw wherever it sits, preserving the order of the rest.
    pub fn remove(&mut self, screw: ScrewId) -> bool {
        match self.fifo.iter().position(|&id| id == screw) {
            Some(idx) => {
                self.fifo.remove(idx);
                true
            }
            None => false,
        }
    }

    pub fn contains(&self, screw: ScrewId) -> bool {
        self.fifo.iter().any(|&id| id == screw)
    }

    /// Arrival-ordered iteration, earliest first.
    pub fn iter(&self) -> impl Iterator<Item = ScrewId> + '_ {
        self.fifo.iter().copied()
    }

    pub fn clear(&mut self) {
        self.fifo.clear();
    }
}

/// Per-level session record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Session {
    pub phase: GamePhase,
    pub win_condition: WinCondition,
    /// Fixed at load time.
    pub total_screws: u32,
    /// Monotonic, incremented once per landed removal.
    pub removed_screws: u32,
    /// Monotonic episode counter (increments on restart).
    pub episode: u32,
}

impl Session {
    pub fn new(total_screws: u32, win_condition: WinCondition) -> Self {
        Self {
            phase: GamePhase::Playing,
            win_condition,
            total_screws,
            removed_screws: 0,
            episode: 0,
        }
    }
}

/// Complete puzzle state for one session. Exclusive owner of all entities.
#[derive(Debug, Clone)]
pub struct PuzzleState {
    /// Slot store; a `None` slot is a destroyed screw (tray teardown).
    screws: Vec<Option<Screw>>,
    parts: Vec<Part>,
    trays: ArrayVec<Tray, TRAY_SLOT_COUNT>,
    buffer: BufferTray,
    session: Session,
}

impl PuzzleState {
    /// Build a fresh state from a validated level configuration.
    pub fn from_level(config: &LevelConfig) -> Result<Self, LevelError> {
        config.validate()?;

        let mut screws = Vec::new();
        let mut parts = Vec::new();
        for spec in &config.parts {
            let part_id = PartId(parts.len() as u32);
            parts.push(Part {
                layer: spec.layer,
                screws_remaining: spec.screws.len() as u32,
                state: PartState::Static,
            });
            for (mount, &color) in spec.screws.iter().enumerate() {
                screws.push(Some(Screw {
                    color,
                    part: Some(part_id),
                    mount: mount as u32,
                    state: ScrewState::InBoard,
                    target: None,
                    is_animating: false,
                }));
            }
        }

        let mut trays = ArrayVec::new();
        for (order, spec) in config.trays.iter().enumerate() {
            trays.push(Tray {
                color: spec.color,
                capacity: config.tray_capacity,
                count: 0,
                display_order: order as u8,
                is_animating: false,
            });
        }

        let total = screws.len() as u32;
        Ok(Self {
            screws,
            parts,
            trays,
            buffer: BufferTray::new(config.buffer_capacity),
            session: Session::new(total, config.win_condition),
        })
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut Session {
        &mut self.session
    }

    pub fn buffer(&self) -> &BufferTray {
        &self.buffer
    }

    pub fn buffer_mut(&mut self) -> &mut BufferTray {
        &mut self.buffer
    }

    pub fn screw(&self, id: ScrewId) -> Option<&Screw> {
        self.screws.get(id.0 as usize)?.as_ref()
    }

    pub fn screw_mut(&mut self, id: ScrewId) -> Option<&mut Screw> {
        self.screws.get_mut(id.0 as usize)?.as_mut()
    }

    /// Live screws in id order.
    pub fn screws(&self) -> impl Iterator<Item = (ScrewId, &Screw)> {
        self.screws
            .iter()
            .enumerate()
            .filter_map(|(idx, slot)| slot.as_ref().map(|s| (ScrewId(idx as u32), s)))
    }

    /// Destroy a screw (tray teardown). Safe to call twice.
    pub fn remove_screw(&mut self, id: ScrewId) -> Option<Screw> {
        self.screws.get_mut(id.0 as usize)?.take()
    }

    pub fn part(&self, id: PartId) -> Option<&Part> {
        self.parts.get(id.0 as usize)
    }

    pub fn part_mut(&mut self, id: PartId) -> Option<&mut Part> {
        self.parts.get_mut(id.0 as usize)
    }

    pub fn parts(&self) -> impl Iterator<Item = (PartId, &Part)> {
        self.parts
            .iter()
            .enumerate()
            .map(|(idx, p)| (PartId(idx as u32), p))
    }

    pub fn tray(&self, id: TrayId) -> Option<&Tray> {
        self.trays.get(id.0 as usize)
    }

    pub fn tray_mut(&mut self, id: TrayId) -> Option<&mut Tray> {
        self.trays.get_mut(id.0 as usize)
    }

    pub fn trays(&self) -> impl Iterator<Item = (TrayId, &Tray)> {
        self.trays
            .iter()
            .enumerate()
            .map(|(idx, t)| (TrayId(idx as u8), t))
    }

    /// Ids of visible trays, ascending by display order. Deterministic
    /// scan order for first-match placement.
    pub fn visible_trays_ordered(&self) -> ArrayVec<TrayId, TRAY_SLOT_COUNT> {
        let mut ids: ArrayVec<TrayId, TRAY_SLOT_COUNT> = self
            .trays()
            .filter(|(_, t)| t.is_visible())
            .map(|(id, _)| id)
            .collect();
        ids.sort_unstable_by_key(|id| self.trays[id.0 as usize].display_order);
        ids
    }

    /// Ids of hidden (queued, not retired) trays, ascending by display order.
    pub fn hidden_trays_ordered(&self) -> ArrayVec<TrayId, TRAY_SLOT_COUNT> {
        let mut ids: ArrayVec<TrayId, TRAY_SLOT_COUNT> = self
            .trays()
            .filter(|(_, t)| t.is_hidden())
            .map(|(id, _)| id)
            .collect();
        ids.sort_unstable_by_key(|id| self.trays[id.0 as usize].display_order);
        ids
    }

    pub fn any_tray_animating(&self) -> bool {
        self.trays.iter().any(|t| t.is_animating)
    }

    /// Screws still mounted on their boards.
    pub fn screws_in_board(&self) -> usize {
        self.screws()
            .filter(|(_, s)| s.state == ScrewState::InBoard)
            .count()
    }

    /// Screws reserved for `tray` that have not landed yet.
    pub fn in_flight_toward(&self, tray: TrayId) -> usize {
        self.screws()
            .filter(|(_, s)| {
                s.state == ScrewState::Animating
                    && s.is_animating
                    && s.target.and_then(|t| t.tray()) == Some(tray)
            })
            .count()
    }

    /// Destroy every screw that landed in `tray`. Returns how many went.
    pub fn teardown_tray_screws(&mut self, tray: TrayId) -> usize {
        let doomed: Vec<ScrewId> = self
            .screws()
            .filter(|(_, s)| {
                s.state == ScrewState::InTray && s.target.and_then(|t| t.tray()) == Some(tray)
            })
            .map(|(id, _)| id)
            .collect();
        for id in &doomed {
            self.remove_screw(*id);
        }
        doomed.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::level::demo_level;
    use screw_sort_types::PlacementTarget;

    fn state() -> PuzzleState {
        PuzzleState::from_level(&demo_level()).unwrap()
    }

    #[test]
    fn from_level_builds_entities() {
        let s = state();
        assert_eq!(s.trays().count(), TRAY_SLOT_COUNT);
        assert_eq!(s.session().total_screws as usize, s.screws().count());
        assert_eq!(s.screws_in_board(), s.screws().count());
        assert_eq!(s.session().phase, GamePhase::Playing);
        assert!(s.buffer().is_empty());

        // Display orders are assigned 0..N in tray spec order.
        for (id, tray) in s.trays() {
            assert_eq!(tray.display_order, id.0);
            assert_eq!(tray.count, 0);
            assert!(!tray.is_animating);
        }
    }

    #[test]
    fn visible_and_hidden_partitions() {
        let s = state();
        let visible = s.visible_trays_ordered();
        let hidden = s.hidden_trays_ordered();
        assert_eq!(visible.len(), VISIBLE_TRAY_SLOTS as usize);
        assert_eq!(visible.len() + hidden.len(), TRAY_SLOT_COUNT);
        assert_eq!(visible[0], TrayId(0));
        assert_eq!(visible[1], TrayId(1));
        assert_eq!(hidden[0], TrayId(2));
    }

    #[test]
    fn retired_tray_is_neither_visible_nor_hidden() {
        let mut s = state();
        s.tray_mut(TrayId(0)).unwrap().display_order = RETIRED_DISPLAY_ORDER;
        assert!(!s.tray(TrayId(0)).unwrap().is_visible());
        assert!(!s.tray(TrayId(0)).unwrap().is_hidden());
        assert!(s.tray(TrayId(0)).unwrap().is_retired());
        assert_eq!(s.visible_trays_ordered().len(), 1);
    }

    #[test]
    fn buffer_fifo_preserves_order_on_middle_removal() {
        let mut buf = BufferTray::new(3);
        assert!(buf.push(ScrewId(10)));
        assert!(buf.push(ScrewId(11)));
        assert!(buf.push(ScrewId(12)));
        assert!(buf.is_full());
        assert!(!buf.push(ScrewId(13)));

        assert!(buf.remove(ScrewId(11)));
        assert!(!buf.remove(ScrewId(11)));
        let order: Vec<ScrewId> = buf.iter().collect();
        assert_eq!(order, vec![ScrewId(10), ScrewId(12)]);
    }

    #[test]
    fn in_flight_toward_counts_reserved_unlanded_screws() {
        let mut s = state();
        let tray = TrayId(0);
        let screw = s.screws().next().unwrap().0;

        assert_eq!(s.in_flight_toward(tray), 0);

        let sc = s.screw_mut(screw).unwrap();
        sc.state = ScrewState::Animating;
        sc.is_animating = true;
        sc.target = Some(PlacementTarget::Tray { tray, slot: 0 });
        assert_eq!(s.in_flight_toward(tray), 1);

        // Landing clears the predicate without touching any counter.
        let sc = s.screw_mut(screw).unwrap();
        sc.state = ScrewState::InTray;
        sc.is_animating = false;
        assert_eq!(s.in_flight_toward(tray), 0);
    }

    #[test]
    fn teardown_removes_only_landed_screws_of_that_tray() {
        let mut s = state();
        let tray = TrayId(0);
        let ids: Vec<ScrewId> = s.screws().map(|(id, _)| id).take(3).collect();

        for (slot, id) in ids.iter().enumerate() {
            let sc = s.screw_mut(*id).unwrap();
            sc.target = Some(PlacementTarget::Tray {
                tray,
                slot: slot as u8,
            });
            sc.state = ScrewState::InTray;
        }
        // The last one is still flying; it must survive teardown.
        let sc = s.screw_mut(ids[2]).unwrap();
        sc.state = ScrewState::Animating;
        sc.is_animating = true;

        let before = s.screws().count();
        assert_eq!(s.teardown_tray_screws(tray), 2);
        assert_eq!(s.screws().count(), before - 2);
        assert!(s.screw(ids[2]).is_some());
        assert!(s.screw(ids[0]).is_none());
    }
}
