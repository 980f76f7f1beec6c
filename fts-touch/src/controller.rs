//! Interrupt servicing for FTS controllers.
//!
//! [`FtsController`] owns the transport and the contact table behind one mutex. Interrupt servicing,
//! startup, shutdown and power transitions all go through that mutex, so they never overlap on the
//! bus or on the table.

use core::sync::atomic::{AtomicU8, Ordering};

use embassy_sync::mutex::Mutex;
use embedded_hal_async::delay::DelayNs;

use crate::config::FtsConfig;
use crate::event::EventKind;
use crate::fifo::{EventFifo, ReadError};
use crate::reporter::{ReportError, TouchReporter};
use crate::state::{InvalidContactId, TouchSnapshot, TouchStateTable};
use crate::transport::{BusError, FtsTransport};
use crate::{MAX_CONTACTS, MAX_FIFO_DEPTH, RECORD_SIZE, RawMutex};

// ============================================================================
// Commands
// ============================================================================
const FTS_CMD_HW_REG_W: u8 = 0xB6;
const FTS_CMD_MS_MT_SENSE_ON: u8 = 0x93;

const SYSTEM_RESET_FRAME: [u8; 3] = [0x00, 0x28, 0x80];
const SENSE_ON_FRAME: [u8; 3] = [0x00, 0x00, 0x00];

// Timing constants
const RESET_DELAY_MS: u32 = 200;

/// Errors of servicing one interrupt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ServiceError {
    /// No event could be read, wait for the next interrupt
    NoData,
    /// The drain buffer can't hold all queued records
    BufferTooSmall,
    /// The interrupt couldn't be re-enabled, the chip may stay silent until it is
    RearmFailed,
    /// The snapshot couldn't be delivered, the table is up to date regardless
    Report(ReportError),
}

impl From<ReadError> for ServiceError {
    fn from(err: ReadError) -> Self {
        match err {
            ReadError::TransportFailure => ServiceError::NoData,
            ReadError::BufferTooSmall => ServiceError::BufferTooSmall,
        }
    }
}

impl From<ReportError> for ServiceError {
    fn from(err: ReportError) -> Self {
        ServiceError::Report(err)
    }
}

/// Errors of the startup sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StartError {
    /// System reset command failed
    Reset(BusError),
    /// Reading the FIFO after reset failed
    Drain(BusError),
    /// Interrupt enable failed
    EnableInterrupt(BusError),
    /// Sense on command failed
    SenseOn(BusError),
}

/// Power state of the controller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PowerState {
    /// Not started, or stopped
    #[default]
    Off,
    /// Scanning and reporting
    Active,
    /// Suspended by the host
    Sleep,
}

struct Inner<T: FtsTransport, const N: usize> {
    transport: T,
    table: TouchStateTable<N>,
    power: PowerState,
}

/// FTS touch controller.
///
/// `N` is the number of contact slots, contact ids reported by the chip must be below it.
pub struct FtsController<T: FtsTransport, const N: usize = MAX_CONTACTS> {
    inner: Mutex<RawMutex, Inner<T, N>>,
    /// Contacts the device is configured for, 0 until [`FtsController::start`] succeeds
    max_contacts: AtomicU8,
    fifo: EventFifo,
    config: FtsConfig,
}

impl<T: FtsTransport, const N: usize> FtsController<T, N> {
    pub fn new(transport: T, config: FtsConfig) -> Self {
        Self {
            inner: Mutex::new(Inner {
                transport,
                table: TouchStateTable::new(),
                power: PowerState::Off,
            }),
            max_contacts: AtomicU8::new(0),
            fifo: EventFifo::new(config.fifo, config.chip.fifo_depth()),
            config,
        }
    }

    pub fn config(&self) -> &FtsConfig {
        &self.config
    }

    /// Contacts the device is configured for, 0 means not configured
    pub fn max_contacts(&self) -> u8 {
        self.max_contacts.load(Ordering::Acquire)
    }

    /// Override the configured contact count. Clamped to the table size.
    pub async fn set_max_contacts(&self, max_contacts: u8) {
        let _inner = self.inner.lock().await;
        self.max_contacts.store(Self::clamp_contacts(max_contacts), Ordering::Release);
    }

    pub async fn power_state(&self) -> PowerState {
        self.inner.lock().await.power
    }

    /// Copy of the current contact table
    pub async fn snapshot(&self) -> TouchSnapshot<N> {
        self.inner.lock().await.table.snapshot()
    }

    /// Give the transport back
    pub fn release(self) -> T {
        self.inner.into_inner().transport
    }

    fn clamp_contacts(max_contacts: u8) -> u8 {
        (max_contacts as usize).min(N).min(u8::MAX as usize) as u8
    }

    /// Reset the chip and bring it to scanning with interrupts enabled.
    ///
    /// The device is left unconfigured if any step fails.
    pub async fn start<D: DelayNs>(&self, delay: &mut D) -> Result<(), StartError> {
        let mut inner = self.inner.lock().await;
        let inner = &mut *inner;
        self.max_contacts.store(0, Ordering::Release);
        info!("FTS: starting {:?}", self.config.chip);

        inner
            .transport
            .write(FTS_CMD_HW_REG_W, &SYSTEM_RESET_FRAME)
            .await
            .map_err(|e| {
                error!("FTS: error resetting controller: {:?}", e);
                StartError::Reset(e)
            })?;

        // The chip answers with a controller ready event after each reset phase
        let mut record = [0u8; RECORD_SIZE];
        for _ in 0..2 {
            delay.delay_ms(RESET_DELAY_MS).await;
            inner
                .transport
                .read(self.config.fifo.read_one, &mut record)
                .await
                .map_err(|e| {
                    error!("FTS: error reading event buffer: {:?}", e);
                    StartError::Drain(e)
                })?;
            debug!("FTS: startup event {:#04x}", record[0]);
        }

        inner
            .transport
            .write(FTS_CMD_HW_REG_W, &self.config.interrupt_enable_frame())
            .await
            .map_err(|e| {
                error!("FTS: error enabling interrupts: {:?}", e);
                StartError::EnableInterrupt(e)
            })?;

        inner
            .transport
            .write(FTS_CMD_MS_MT_SENSE_ON, &SENSE_ON_FRAME)
            .await
            .map_err(|e| {
                error!("FTS: error enabling sense: {:?}", e);
                StartError::SenseOn(e)
            })?;

        let mut fifo = [0u8; MAX_FIFO_DEPTH * RECORD_SIZE];
        let depth = self.fifo.depth().min(MAX_FIFO_DEPTH);
        inner
            .transport
            .read(self.config.fifo.read_all, &mut fifo[..depth * RECORD_SIZE])
            .await
            .map_err(|e| {
                error!("FTS: error draining event buffer: {:?}", e);
                StartError::Drain(e)
            })?;

        inner.table.clear();
        inner.power = PowerState::Active;
        let max_contacts = Self::clamp_contacts(self.config.max_contacts);
        self.max_contacts.store(max_contacts, Ordering::Release);
        info!("FTS: started, {} contacts", max_contacts);
        Ok(())
    }

    /// Stop servicing, every contact is dropped
    pub async fn stop(&self) {
        let mut inner = self.inner.lock().await;
        self.max_contacts.store(0, Ordering::Release);
        inner.table.clear();
        inner.power = PowerState::Off;
        info!("FTS: stopped");
    }

    /// Power transition.
    ///
    /// Going to sleep drops every contact. Waking up re-enables the interrupt.
    pub async fn set_power_state(&self, state: PowerState) -> Result<(), BusError> {
        let mut inner = self.inner.lock().await;
        let inner = &mut *inner;
        if inner.power == state {
            return Ok(());
        }
        info!("FTS: power {:?} -> {:?}", inner.power, state);

        match state {
            PowerState::Active => {
                inner
                    .transport
                    .write(FTS_CMD_HW_REG_W, &self.config.interrupt_enable_frame())
                    .await?;
            }
            PowerState::Sleep | PowerState::Off => inner.table.clear(),
        }
        inner.power = state;
        Ok(())
    }

    /// Service one interrupt: drain the FIFO, apply every event, re-arm the interrupt and report the
    /// contact table.
    pub async fn service_interrupt<R: TouchReporter<N>>(&self, reporter: &mut R) -> Result<(), ServiceError> {
        if self.max_contacts() == 0 {
            return Ok(());
        }

        // Serializes interrupt servicing and power transitions, released on every return below
        let mut inner = self.inner.lock().await;
        let inner = &mut *inner;

        // Stopped while waiting for the lock
        if self.max_contacts() == 0 {
            debug!("FTS: stopped, interrupt dropped");
            return Ok(());
        }

        let events = match self.fifo.drain::<_, MAX_FIFO_DEPTH>(&mut inner.transport).await {
            Ok(events) => events,
            Err(e) => {
                debug!("FTS: no object data to report: {:?}", e);
                return Err(e.into());
            }
        };

        for record in &events {
            let event = record.decode();
            match inner.table.apply_event(&event) {
                Ok(true) => trace!(
                    "FTS: {:?} contact {} at ({}, {})",
                    event.kind,
                    event.contact_id,
                    event.x,
                    event.y
                ),
                Ok(false) => {
                    if let EventKind::Unknown(id) = event.kind {
                        debug!("FTS: unknown event id {:#04x}", id);
                    }
                }
                Err(InvalidContactId(id)) => warn!("FTS: invalid touch id {}", id),
            }
        }

        if let Err(e) = inner
            .transport
            .write(FTS_CMD_HW_REG_W, &self.config.interrupt_enable_frame())
            .await
        {
            error!("FTS: error enabling interrupts: {:?}", e);
            return Err(ServiceError::RearmFailed);
        }

        let snapshot = inner.table.snapshot();
        for (id, position) in snapshot.active() {
            trace!("FTS: finger {} at ({}, {})", id, position.x, position.y);
        }

        reporter.report(snapshot).await.map_err(|e| {
            warn!("FTS: error while reporting objects: {:?}", e);
            ServiceError::from(e)
        })
    }
}
