//! Per-contact state table.

use postcard::experimental::max_size::MaxSize;
use serde::{Deserialize, Serialize};

use crate::MAX_CONTACTS;
use crate::event::{DecodedEvent, EventKind};

/// Whether a contact is on the panel
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default, MaxSize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Presence {
    #[default]
    Absent,
    PresentAccurate,
}

/// 12-bit panel coordinates
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default, MaxSize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ContactPosition {
    pub x: u16,
    pub y: u16,
}

impl ContactPosition {
    pub const fn new(x: u16, y: u16) -> Self {
        Self { x, y }
    }
}

/// State of one contact slot.
///
/// `position` is the last reported position. It's stale when `presence` is [`Presence::Absent`].
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default, MaxSize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ContactState {
    pub presence: Presence,
    pub position: ContactPosition,
}

impl ContactState {
    pub fn is_present(&self) -> bool {
        self.presence == Presence::PresentAccurate
    }

    /// Position, only for present contacts
    pub fn active_position(&self) -> Option<ContactPosition> {
        self.is_present().then_some(self.position)
    }
}

/// A contact id that has been checked against the table size
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ContactId(u8);

impl ContactId {
    pub fn get(self) -> u8 {
        self.0
    }
}

/// Contact id outside the table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct InvalidContactId(pub u8);

/// Copy of the full contact table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TouchSnapshot<const N: usize = MAX_CONTACTS> {
    pub contacts: [ContactState; N],
}

impl<const N: usize> TouchSnapshot<N> {
    pub fn get(&self, id: usize) -> Option<&ContactState> {
        self.contacts.get(id)
    }

    /// Present contacts with their slot ids
    pub fn active(&self) -> impl Iterator<Item = (u8, ContactPosition)> + '_ {
        self.contacts
            .iter()
            .enumerate()
            .filter_map(|(id, c)| c.active_position().map(|p| (id as u8, p)))
    }

    pub fn active_count(&self) -> usize {
        self.contacts.iter().filter(|c| c.is_present()).count()
    }
}

#[cfg(feature = "defmt")]
impl<const N: usize> defmt::Format for TouchSnapshot<N> {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "TouchSnapshot {=[?]}", &self.contacts[..])
    }
}

/// Fixed-size table of contacts, indexed by contact id
#[derive(Debug, Clone)]
pub struct TouchStateTable<const N: usize = MAX_CONTACTS> {
    contacts: [ContactState; N],
}

impl<const N: usize> Default for TouchStateTable<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> TouchStateTable<N> {
    pub const fn new() -> Self {
        Self {
            contacts: [ContactState {
                presence: Presence::Absent,
                position: ContactPosition { x: 0, y: 0 },
            }; N],
        }
    }

    /// Number of slots
    pub const fn capacity(&self) -> usize {
        N
    }

    /// Validate a raw contact id
    pub fn contact_id(raw: u8) -> Result<ContactId, InvalidContactId> {
        if (raw as usize) < N {
            Ok(ContactId(raw))
        } else {
            Err(InvalidContactId(raw))
        }
    }

    pub fn get(&self, id: ContactId) -> &ContactState {
        &self.contacts[id.0 as usize]
    }

    /// Overwrite slot `id`
    pub fn apply(&mut self, id: ContactId, presence: Presence, position: ContactPosition) {
        self.contacts[id.0 as usize] = ContactState { presence, position };
    }

    /// Apply a decoded event.
    ///
    /// Returns whether the table was touched. Unknown events are ignored, ids outside the table are
    /// rejected without touching anything.
    pub fn apply_event(&mut self, event: &DecodedEvent) -> Result<bool, InvalidContactId> {
        let presence = match event.kind {
            EventKind::Enter | EventKind::Motion => Presence::PresentAccurate,
            // Keep the position for diagnostics, presence hides it
            EventKind::Leave => Presence::Absent,
            EventKind::Unknown(_) => return Ok(false),
        };
        let id = Self::contact_id(event.contact_id)?;
        self.apply(id, presence, ContactPosition::new(event.x, event.y));
        Ok(true)
    }

    /// Mark every contact absent, positions are reset too
    pub fn clear(&mut self) {
        self.contacts = [ContactState::default(); N];
    }

    pub fn snapshot(&self) -> TouchSnapshot<N> {
        TouchSnapshot {
            contacts: self.contacts,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(kind: EventKind, contact_id: u8, x: u16, y: u16) -> DecodedEvent {
        DecodedEvent { kind, contact_id, x, y }
    }

    #[test]
    fn test_enter_and_motion_set_present() {
        let mut table: TouchStateTable = TouchStateTable::new();
        for id in 0..MAX_CONTACTS as u8 {
            assert_eq!(table.apply_event(&event(EventKind::Enter, id, 100 + id as u16, 200)), Ok(true));
            let slot = table.get(TouchStateTable::<MAX_CONTACTS>::contact_id(id).unwrap());
            assert_eq!(slot.presence, Presence::PresentAccurate);
            assert_eq!(slot.position, ContactPosition::new(100 + id as u16, 200));

            assert_eq!(table.apply_event(&event(EventKind::Motion, id, 4095, 0)), Ok(true));
            let slot = table.get(TouchStateTable::<MAX_CONTACTS>::contact_id(id).unwrap());
            assert_eq!(slot.presence, Presence::PresentAccurate);
            assert_eq!(slot.position, ContactPosition::new(4095, 0));
        }
        assert_eq!(table.snapshot().active_count(), MAX_CONTACTS);
    }

    #[test]
    fn test_leave_is_idempotent() {
        let mut table: TouchStateTable = TouchStateTable::new();
        table.apply_event(&event(EventKind::Enter, 3, 10, 20)).unwrap();

        table.apply_event(&event(EventKind::Leave, 3, 11, 21)).unwrap();
        let after_first = table.snapshot();
        assert_eq!(after_first.contacts[3].presence, Presence::Absent);
        assert_eq!(after_first.contacts[3].position, ContactPosition::new(11, 21));
        assert_eq!(after_first.contacts[3].active_position(), None);

        table.apply_event(&event(EventKind::Leave, 3, 11, 21)).unwrap();
        assert_eq!(table.snapshot(), after_first);

        // Leaving a contact that never entered
        table.apply_event(&event(EventKind::Leave, 7, 1, 2)).unwrap();
        assert_eq!(table.snapshot().contacts[7].presence, Presence::Absent);
    }

    #[test]
    fn test_contact_id_boundary() {
        let mut table: TouchStateTable<10> = TouchStateTable::new();
        let before = table.snapshot();

        assert_eq!(
            table.apply_event(&event(EventKind::Enter, 10, 1, 1)),
            Err(InvalidContactId(10))
        );
        assert_eq!(
            table.apply_event(&event(EventKind::Enter, 15, 1, 1)),
            Err(InvalidContactId(15))
        );
        assert_eq!(table.snapshot(), before);

        assert_eq!(table.apply_event(&event(EventKind::Enter, 9, 1, 1)), Ok(true));
        assert!(table.snapshot().contacts[9].is_present());
    }

    #[test]
    fn test_unknown_event_is_noop() {
        let mut table: TouchStateTable = TouchStateTable::new();
        let before = table.snapshot();
        assert_eq!(table.apply_event(&event(EventKind::Unknown(0x10), 2, 5, 5)), Ok(false));
        // Unknown events aren't range checked
        assert_eq!(table.apply_event(&event(EventKind::Unknown(0x10), 15, 5, 5)), Ok(false));
        assert_eq!(table.snapshot(), before);
    }

    #[test]
    fn test_snapshot_is_a_copy() {
        let mut table: TouchStateTable = TouchStateTable::new();
        table.apply_event(&event(EventKind::Enter, 0, 1, 2)).unwrap();
        let snapshot = table.snapshot();
        table.apply_event(&event(EventKind::Leave, 0, 1, 2)).unwrap();

        assert!(snapshot.contacts[0].is_present());
        assert_eq!(snapshot.active().collect::<std::vec::Vec<_>>(), [(0, ContactPosition::new(1, 2))]);
        assert!(!table.snapshot().contacts[0].is_present());
    }

    #[test]
    fn test_clear() {
        let mut table: TouchStateTable = TouchStateTable::new();
        table.apply_event(&event(EventKind::Enter, 1, 1, 2)).unwrap();
        table.apply_event(&event(EventKind::Enter, 2, 3, 4)).unwrap();
        table.clear();
        assert_eq!(table.snapshot().active_count(), 0);
    }

    #[test]
    fn test_contact_state_wire_size() {
        let state = ContactState {
            presence: Presence::PresentAccurate,
            position: ContactPosition::new(4095, 4095),
        };
        let mut buf = [0u8; ContactState::POSTCARD_MAX_SIZE];
        let used = postcard::to_slice(&state, &mut buf).unwrap();
        assert!(used.len() <= ContactState::POSTCARD_MAX_SIZE);
        let decoded: ContactState = postcard::from_bytes(used).unwrap();
        assert_eq!(decoded, state);
    }
}
