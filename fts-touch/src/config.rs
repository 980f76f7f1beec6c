//! Static configuration of an FTS controller instance.

/// Default 7-bit I2C address of FTS controllers.
pub const DEFAULT_I2C_ADDRESS: u8 = 0x49;

/// Contact limit programmed at start, the chip family reports at most 8 fingers.
pub const DEFAULT_MAX_CONTACTS: u8 = 8;

/// FTS silicon revision.
///
/// The revisions share the event record format but differ in FIFO depth and in where the
/// interrupt-enable register lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FtsChip {
    Ftm3,
    #[default]
    Ftm4,
}

impl FtsChip {
    /// Depth of the hardware event FIFO, in records
    pub const fn fifo_depth(self) -> usize {
        match self {
            FtsChip::Ftm3 => 32,
            FtsChip::Ftm4 => 64,
        }
    }

    /// Address of the interrupt-enable register, high byte first
    pub const fn ier_address(self) -> [u8; 2] {
        match self {
            FtsChip::Ftm3 => [0x00, 0x1C],
            FtsChip::Ftm4 => [0x00, 0x2C],
        }
    }
}

/// Opcodes used to pop records from the event FIFO.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FifoCommands {
    /// Pops exactly one record
    pub read_one: u8,
    /// Pops the given number of records in one transaction
    pub read_all: u8,
}

impl Default for FifoCommands {
    fn default() -> Self {
        Self {
            read_one: 0x85,
            read_all: 0x86,
        }
    }
}

/// Configuration of an FTS controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FtsConfig {
    /// I2C address, used by [`crate::transport::I2cTransport::from_config`]
    pub address: u8,
    /// Silicon revision
    pub chip: FtsChip,
    /// FIFO opcodes
    pub fifo: FifoCommands,
    /// Number of contacts to track once the device is started. Clamped to the table size.
    pub max_contacts: u8,
}

impl Default for FtsConfig {
    fn default() -> Self {
        Self {
            address: DEFAULT_I2C_ADDRESS,
            chip: FtsChip::default(),
            fifo: FifoCommands::default(),
            max_contacts: DEFAULT_MAX_CONTACTS,
        }
    }
}

impl FtsConfig {
    pub fn with_chip(mut self, chip: FtsChip) -> Self {
        self.chip = chip;
        self
    }

    pub fn with_address(mut self, address: u8) -> Self {
        self.address = address;
        self
    }

    pub fn with_max_contacts(mut self, max_contacts: u8) -> Self {
        self.max_contacts = max_contacts;
        self
    }

    pub fn with_fifo_commands(mut self, fifo: FifoCommands) -> Self {
        self.fifo = fifo;
        self
    }

    /// Payload of the interrupt-enable register write.
    pub(crate) fn interrupt_enable_frame(&self) -> [u8; 3] {
        let [hi, lo] = self.chip.ier_address();
        [hi, lo, IER_ENABLE]
    }
}

/// Value written to the interrupt-enable register to unmask touch events
pub(crate) const IER_ENABLE: u8 = 0x41;
