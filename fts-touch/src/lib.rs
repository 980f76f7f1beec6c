//! Event pipeline for ST FingerTip (FTS) multi-touch controllers.
//!
//! The controller signals touch activity by pulling its interrupt line low. On every interrupt the
//! [`controller::FtsController`] drains the chip's event FIFO ([`fifo`]), decodes each 8-byte record
//! ([`event`]), applies it to a fixed table of contacts ([`state`]), re-arms the interrupt and hands
//! a copy of the table to a [`reporter::TouchReporter`].
//!
//! ```ignore
//! let controller: FtsController<_, 10> = FtsController::new(I2cTransport::new(i2c, 0x49), FtsConfig::default());
//! let mut device = FtsDevice::new(&controller, int_pin, TOUCH_SNAPSHOT_CHANNEL.sender());
//! device.run().await;
//! ```
#![doc = document_features::document_features!()]
#![cfg_attr(not(test), no_std)]
#![allow(async_fn_in_trait)]

// This mod MUST go first, so that the others see its macros.
pub(crate) mod fmt;

pub mod channel;
pub mod config;
pub mod controller;
pub mod device;
pub mod event;
pub mod fifo;
pub mod reporter;
pub mod state;
pub mod transport;

pub use config::{FifoCommands, FtsChip, FtsConfig};
pub use controller::{FtsController, PowerState, ServiceError, StartError};
pub use device::FtsDevice;
pub use event::{DecodedEvent, EventKind, EventRecord};
pub use fifo::{EventBuffer, EventFifo, ReadError};
pub use reporter::{ReportError, TouchReporter};
pub use state::{ContactId, ContactPosition, ContactState, InvalidContactId, Presence, TouchSnapshot, TouchStateTable};
pub use transport::{BusError, FtsTransport, I2cTransport};

/// Raw mutex used by the controller lock and the snapshot channel.
pub type RawMutex = embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;

/// Number of contact slots tracked by default.
pub const MAX_CONTACTS: usize = 10;
/// Size of one event record in the FIFO.
pub const RECORD_SIZE: usize = 8;
/// Deepest event FIFO of the supported chip revisions, in records.
pub const MAX_FIFO_DEPTH: usize = 64;
/// Capacity of [`channel::TOUCH_SNAPSHOT_CHANNEL`].
pub const SNAPSHOT_CHANNEL_SIZE: usize = 4;
