use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::channel::Sender;

use crate::state::TouchSnapshot;

/// Errors of reporting a snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ReportError {
    /// The consumer didn't keep up
    ChannelFull,
    /// Reporter specific failure
    Other,
}

/// Receiver of contact table snapshots.
///
/// The reporter translates the snapshot into whatever the consumer needs (HID touch reports,
/// evdev slots, ...). It gets a complete copy of the table on every serviced interrupt.
pub trait TouchReporter<const N: usize> {
    async fn report(&mut self, snapshot: TouchSnapshot<N>) -> Result<(), ReportError>;
}

impl<R: TouchReporter<N>, const N: usize> TouchReporter<N> for &mut R {
    async fn report(&mut self, snapshot: TouchSnapshot<N>) -> Result<(), ReportError> {
        R::report(self, snapshot).await
    }
}

/// Forward snapshots to an embassy channel.
///
/// Sending never waits, a full channel is reported as [`ReportError::ChannelFull`].
impl<M: RawMutex, const N: usize, const SIZE: usize> TouchReporter<N> for Sender<'_, M, TouchSnapshot<N>, SIZE> {
    async fn report(&mut self, snapshot: TouchSnapshot<N>) -> Result<(), ReportError> {
        self.try_send(snapshot).map_err(|_| ReportError::ChannelFull)
    }
}
