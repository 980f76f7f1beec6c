//! Bus transport of the FTS controller.
//!
//! FTS chips are driven through one-byte command opcodes: reads send the opcode and clock the
//! answer back, writes send the opcode followed by its payload.

use embedded_hal::i2c::{Error as _, ErrorKind};
use embedded_hal_async::i2c::I2c;
use heapless::Vec;

use crate::config::FtsConfig;

/// Longest payload accepted by [`I2cTransport::write`]
pub const MAX_WRITE_PAYLOAD: usize = 16;

/// Bus errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BusError {
    /// I2C transaction failed
    I2c(ErrorKind),
    /// Write payload exceeds [`MAX_WRITE_PAYLOAD`]
    FrameTooLong,
}

/// Opcode-addressed access to the controller
pub trait FtsTransport {
    /// Issue `opcode` and fill `buf` with the answer
    async fn read(&mut self, opcode: u8, buf: &mut [u8]) -> Result<(), BusError>;

    /// Issue `opcode` followed by `data`
    async fn write(&mut self, opcode: u8, data: &[u8]) -> Result<(), BusError>;
}

impl<T: FtsTransport> FtsTransport for &mut T {
    async fn read(&mut self, opcode: u8, buf: &mut [u8]) -> Result<(), BusError> {
        T::read(self, opcode, buf).await
    }

    async fn write(&mut self, opcode: u8, data: &[u8]) -> Result<(), BusError> {
        T::write(self, opcode, data).await
    }
}

/// I2C transport
pub struct I2cTransport<I2C: I2c> {
    i2c: I2C,
    address: u8,
}

impl<I2C: I2c> I2cTransport<I2C> {
    pub fn new(i2c: I2C, address: u8) -> Self {
        Self { i2c, address }
    }

    pub fn from_config(i2c: I2C, config: &FtsConfig) -> Self {
        Self::new(i2c, config.address)
    }

    /// Give the bus back
    pub fn release(self) -> I2C {
        self.i2c
    }
}

impl<I2C: I2c> FtsTransport for I2cTransport<I2C> {
    async fn read(&mut self, opcode: u8, buf: &mut [u8]) -> Result<(), BusError> {
        self.i2c
            .write_read(self.address, &[opcode], buf)
            .await
            .map_err(|e| BusError::I2c(e.kind()))
    }

    async fn write(&mut self, opcode: u8, data: &[u8]) -> Result<(), BusError> {
        let mut frame: Vec<u8, { MAX_WRITE_PAYLOAD + 1 }> = Vec::new();
        frame.push(opcode).map_err(|_| BusError::FrameTooLong)?;
        frame.extend_from_slice(data).map_err(|_| BusError::FrameTooLong)?;

        self.i2c
            .write(self.address, &frame)
            .await
            .map_err(|e| BusError::I2c(e.kind()))
    }
}
