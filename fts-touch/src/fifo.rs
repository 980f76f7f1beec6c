//! Draining of the hardware event FIFO.
//!
//! The chip only tells how many records are queued once the first one has been popped, so a drain
//! is done in two steps: pop one record, read its "left events" field, then pop the rest in a single
//! bulk read.

use heapless::Vec;

use crate::config::FifoCommands;
use crate::event::EventRecord;
use crate::transport::FtsTransport;
use crate::{MAX_FIFO_DEPTH, RECORD_SIZE};

/// Errors of draining the FIFO
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ReadError {
    /// The first record couldn't be read
    TransportFailure,
    /// The buffer can't hold all queued records
    BufferTooSmall,
}

/// Records popped in one servicing pass, in FIFO order.
///
/// Always holds at least one record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventBuffer<const CAP: usize = MAX_FIFO_DEPTH> {
    records: Vec<EventRecord, CAP>,
}

impl<const CAP: usize> EventBuffer<CAP> {
    pub fn records(&self) -> &[EventRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> core::slice::Iter<'_, EventRecord> {
        self.records.iter()
    }
}

impl<'a, const CAP: usize> IntoIterator for &'a EventBuffer<CAP> {
    type Item = &'a EventRecord;
    type IntoIter = core::slice::Iter<'a, EventRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

/// Reader of the event FIFO
#[derive(Debug, Clone, Copy)]
pub struct EventFifo {
    commands: FifoCommands,
    depth: usize,
}

impl EventFifo {
    pub fn new(commands: FifoCommands, depth: usize) -> Self {
        Self { commands, depth }
    }

    /// FIFO depth, in records
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Pop every queued record.
    ///
    /// A failing bulk read isn't fatal: the first record is kept, marked as the last one of the batch,
    /// and returned alone.
    pub async fn drain<T: FtsTransport, const CAP: usize>(
        &self,
        transport: &mut T,
    ) -> Result<EventBuffer<CAP>, ReadError> {
        let mut raw = [0u8; RECORD_SIZE];
        if let Err(e) = transport.read(self.commands.read_one, &mut raw).await {
            error!("Error reading one event from the chip: {:?}", e);
            return Err(ReadError::TransportFailure);
        }

        let mut first = EventRecord::new(raw);
        let left_events = first.pending() as usize;
        debug!("{} events detected", left_events + 1);

        let mut records: Vec<EventRecord, CAP> = Vec::new();

        if left_events == 0 || left_events >= self.depth {
            if left_events != 0 {
                warn!("Ignoring out of range left event count {}", left_events);
            }
            records.push(first).map_err(|_| ReadError::BufferTooSmall)?;
            return Ok(EventBuffer { records });
        }

        if left_events + 1 > CAP {
            error!("Not enough space in the buffer for all events: {}", left_events);
            return Err(ReadError::BufferTooSmall);
        }

        let mut bulk = [0u8; MAX_FIFO_DEPTH * RECORD_SIZE];
        let bulk = &mut bulk[..left_events * RECORD_SIZE];
        match transport.read(self.commands.read_all, bulk).await {
            Ok(()) => {
                records.push(first).map_err(|_| ReadError::BufferTooSmall)?;
                for chunk in bulk.chunks_exact(RECORD_SIZE) {
                    let mut raw = [0u8; RECORD_SIZE];
                    raw.copy_from_slice(chunk);
                    records.push(EventRecord::new(raw)).map_err(|_| ReadError::BufferTooSmall)?;
                }
            }
            Err(e) => {
                // Process the one that was fine instead
                warn!("Error reading remaining {} events: {:?}", left_events, e);
                first.clear_pending();
                records.push(first).map_err(|_| ReadError::BufferTooSmall)?;
            }
        }

        Ok(EventBuffer { records })
    }
}
