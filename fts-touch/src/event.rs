//! FIFO event records and their decoding.
//!
//! Every record popped from the event FIFO is 8 bytes:
//!
//! | byte | content                                                      |
//! |------|--------------------------------------------------------------|
//! | 0    | event id                                                     |
//! | 1    | object type / status                                         |
//! | 2    | bits 3:0 contact id                                          |
//! | 3    | X bits 11:4                                                  |
//! | 4    | Y bits 11:4                                                  |
//! | 5    | bits 7:4 X bits 3:0, bits 3:0 Y bits 3:0                     |
//! | 6    | -                                                            |
//! | 7    | bits 4:0 number of records still queued after this one      |

use crate::RECORD_SIZE;

pub const EVENT_ID_NO_EVENT: u8 = 0x00;
pub const EVENT_ID_ENTER_POINTER: u8 = 0x03;
pub const EVENT_ID_LEAVE_POINTER: u8 = 0x04;
pub const EVENT_ID_MOTION_POINTER: u8 = 0x05;
pub const EVENT_ID_CONTROLLER_READY: u8 = 0x10;

const OFFSET_EVENT_ID: usize = 0;
const OFFSET_STATUS: usize = 1;
const OFFSET_CONTACT_ID: usize = 2;
const OFFSET_X_MSB: usize = 3;
const OFFSET_Y_MSB: usize = 4;
const OFFSET_XY_LSB: usize = 5;
const OFFSET_LEFT_EVENTS: usize = 7;

const CONTACT_ID_MASK: u8 = 0x0F;
const X_LSB_MASK: u8 = 0xF0;
const Y_LSB_MASK: u8 = 0x0F;
const LEFT_EVENTS_MASK: u8 = 0x1F;

/// Kind of a touch event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EventKind {
    /// A contact touched down
    Enter,
    /// A contact moved
    Motion,
    /// A contact lifted
    Leave,
    /// Any other event id, including status events of the controller
    Unknown(u8),
}

impl From<u8> for EventKind {
    fn from(id: u8) -> Self {
        match id {
            EVENT_ID_ENTER_POINTER => EventKind::Enter,
            EVENT_ID_MOTION_POINTER => EventKind::Motion,
            EVENT_ID_LEAVE_POINTER => EventKind::Leave,
            other => EventKind::Unknown(other),
        }
    }
}

/// A decoded event record.
///
/// `contact_id` is the raw 4-bit id from the record, it is not range checked here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DecodedEvent {
    pub kind: EventKind,
    pub contact_id: u8,
    pub x: u16,
    pub y: u16,
}

/// One raw record of the event FIFO
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct EventRecord(pub [u8; RECORD_SIZE]);

impl EventRecord {
    pub const fn new(raw: [u8; RECORD_SIZE]) -> Self {
        Self(raw)
    }

    /// Copy a record out of a raw FIFO buffer, `None` if `raw` is shorter than one record
    pub fn from_slice(raw: &[u8]) -> Option<Self> {
        let bytes: [u8; RECORD_SIZE] = raw.get(..RECORD_SIZE)?.try_into().ok()?;
        Some(Self(bytes))
    }

    pub fn as_bytes(&self) -> &[u8; RECORD_SIZE] {
        &self.0
    }

    pub fn event_id(&self) -> u8 {
        self.0[OFFSET_EVENT_ID]
    }

    pub fn kind(&self) -> EventKind {
        EventKind::from(self.event_id())
    }

    /// Object type / status byte
    pub fn status(&self) -> u8 {
        self.0[OFFSET_STATUS]
    }

    pub fn contact_id(&self) -> u8 {
        self.0[OFFSET_CONTACT_ID] & CONTACT_ID_MASK
    }

    /// 12-bit X: byte 3 holds bits 11:4, the high nibble of byte 5 holds bits 3:0
    pub fn x(&self) -> u16 {
        let msb = self.0[OFFSET_X_MSB] as u16;
        let lsb = ((self.0[OFFSET_XY_LSB] & X_LSB_MASK) >> 4) as u16;
        (msb << 4) | lsb
    }

    /// 12-bit Y: byte 4 holds bits 11:4, the low nibble of byte 5 holds bits 3:0
    pub fn y(&self) -> u16 {
        let msb = self.0[OFFSET_Y_MSB] as u16;
        let lsb = (self.0[OFFSET_XY_LSB] & Y_LSB_MASK) as u16;
        (msb << 4) | lsb
    }

    /// Number of records that were still queued when this one was popped
    pub fn pending(&self) -> u8 {
        self.0[OFFSET_LEFT_EVENTS] & LEFT_EVENTS_MASK
    }

    /// Mark this record as the last one of the batch, the upper status bits are kept
    pub fn clear_pending(&mut self) {
        self.0[OFFSET_LEFT_EVENTS] &= !LEFT_EVENTS_MASK;
    }

    pub fn decode(&self) -> DecodedEvent {
        DecodedEvent {
            kind: self.kind(),
            contact_id: self.contact_id(),
            x: self.x(),
            y: self.y(),
        }
    }
}

impl From<[u8; RECORD_SIZE]> for EventRecord {
    fn from(raw: [u8; RECORD_SIZE]) -> Self {
        Self(raw)
    }
}

/// Decode one record
pub fn decode(record: &EventRecord) -> DecodedEvent {
    record.decode()
}
