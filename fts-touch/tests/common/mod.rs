use std::collections::VecDeque;

use embedded_hal::i2c::ErrorKind;
use embedded_hal_async::delay::DelayNs;
use fts_touch::reporter::{ReportError, TouchReporter};
use fts_touch::state::TouchSnapshot;
use fts_touch::transport::{BusError, FtsTransport};

// Init logger for tests
#[ctor::ctor]
pub fn init_log() {
    let _ = env_logger::builder()
        .filter_level(log::LevelFilter::Debug)
        .is_test(true)
        .try_init();
}

pub const EVT_ENTER: u8 = 0x03;
pub const EVT_LEAVE: u8 = 0x04;
pub const EVT_MOTION: u8 = 0x05;
pub const EVT_CONTROLLER_READY: u8 = 0x10;

pub const READ_ONE: u8 = 0x85;
pub const READ_ALL: u8 = 0x86;
pub const HW_REG_W: u8 = 0xB6;
pub const SENSE_ON: u8 = 0x93;

pub const FTM4_IER_FRAME: [u8; 3] = [0x00, 0x2C, 0x41];
pub const FTM3_IER_FRAME: [u8; 3] = [0x00, 0x1C, 0x41];

/// Build a raw 8-byte event record
pub fn record(event_id: u8, contact_id: u8, x: u16, y: u16, pending: u8) -> [u8; 8] {
    [
        event_id,
        0x00,
        // Upper nibble isn't part of the id
        0xA0 | (contact_id & 0x0F),
        (x >> 4) as u8,
        (y >> 4) as u8,
        (((x & 0x0F) << 4) | (y & 0x0F)) as u8,
        0x00,
        // Upper bits of the count byte carry other status
        0x60 | (pending & 0x1F),
    ]
}

/// Concatenate records into one bulk read answer
pub fn records(records: &[[u8; 8]]) -> Vec<u8> {
    records.iter().flatten().copied().collect()
}

/// One bus transaction seen by [`FakeTransport`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Op {
    Read { opcode: u8, len: usize },
    Write { opcode: u8, data: Vec<u8> },
}

impl Op {
    pub fn read(opcode: u8, len: usize) -> Self {
        Op::Read { opcode, len }
    }

    pub fn write(opcode: u8, data: &[u8]) -> Self {
        Op::Write {
            opcode,
            data: data.to_vec(),
        }
    }
}

/// Scripted transport.
///
/// Reads pop answers from `reads` in order, an exhausted script answers with zeroes. Writes pop
/// results from `writes`, an exhausted script succeeds. Every transaction is logged.
#[derive(Debug, Default)]
pub struct FakeTransport {
    pub reads: VecDeque<Result<Vec<u8>, BusError>>,
    pub writes: VecDeque<Result<(), BusError>>,
    pub log: Vec<Op>,
    in_flight: bool,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn answer(mut self, data: Vec<u8>) -> Self {
        self.reads.push_back(Ok(data));
        self
    }

    pub fn answer_record(self, record: [u8; 8]) -> Self {
        self.answer(record.to_vec())
    }

    pub fn fail_read(mut self) -> Self {
        self.reads.push_back(Err(BusError::I2c(ErrorKind::Other)));
        self
    }

    pub fn write_ok(mut self) -> Self {
        self.writes.push_back(Ok(()));
        self
    }

    pub fn fail_write(mut self) -> Self {
        self.writes.push_back(Err(BusError::I2c(ErrorKind::Other)));
        self
    }

    fn enter(&mut self) {
        assert!(!self.in_flight, "overlapping bus transactions");
        self.in_flight = true;
    }

    fn leave(&mut self) {
        self.in_flight = false;
    }
}

impl FtsTransport for FakeTransport {
    async fn read(&mut self, opcode: u8, buf: &mut [u8]) -> Result<(), BusError> {
        self.enter();
        self.log.push(Op::read(opcode, buf.len()));
        // Give other tasks a chance to run in the middle of a transaction
        embassy_futures::yield_now().await;
        let result = match self.reads.pop_front() {
            Some(Ok(data)) => {
                buf.fill(0);
                let len = data.len().min(buf.len());
                buf[..len].copy_from_slice(&data[..len]);
                Ok(())
            }
            Some(Err(e)) => Err(e),
            None => {
                buf.fill(0);
                Ok(())
            }
        };
        self.leave();
        result
    }

    async fn write(&mut self, opcode: u8, data: &[u8]) -> Result<(), BusError> {
        self.enter();
        self.log.push(Op::write(opcode, data));
        embassy_futures::yield_now().await;
        let result = self.writes.pop_front().unwrap_or(Ok(()));
        self.leave();
        result
    }
}

/// Delay that returns at once and adds up what was asked for
#[derive(Debug, Default)]
pub struct NoDelay {
    pub total_ns: u64,
}

impl DelayNs for NoDelay {
    async fn delay_ns(&mut self, ns: u32) {
        self.total_ns += ns as u64;
    }
}

/// Reporter keeping every snapshot
#[derive(Debug, Default)]
pub struct CollectingReporter<const N: usize> {
    pub snapshots: Vec<TouchSnapshot<N>>,
}

impl<const N: usize> TouchReporter<N> for CollectingReporter<N> {
    async fn report(&mut self, snapshot: TouchSnapshot<N>) -> Result<(), ReportError> {
        self.snapshots.push(snapshot);
        Ok(())
    }
}

/// Bus transactions of a successful start on a FTM4
pub fn ftm4_start_ops() -> Vec<Op> {
    vec![
        Op::write(HW_REG_W, &[0x00, 0x28, 0x80]),
        Op::read(READ_ONE, 8),
        Op::read(READ_ONE, 8),
        Op::write(HW_REG_W, &FTM4_IER_FRAME),
        Op::write(SENSE_ON, &[0x00, 0x00, 0x00]),
        Op::read(READ_ALL, 64 * 8),
    ]
}

/// Script the answers of a successful start
pub fn start_script(transport: FakeTransport) -> FakeTransport {
    transport
        .answer_record(record(EVT_CONTROLLER_READY, 0, 0, 0, 0))
        .answer_record(record(EVT_CONTROLLER_READY, 0, 0, 0, 0))
        .answer(Vec::new())
}
