//! Interrupt driven task for an FTS controller.

use embassy_time::Delay;
use embedded_hal::digital::InputPin;
use embedded_hal_async::delay::DelayNs;
use embedded_hal_async::digital::Wait;

use crate::controller::{FtsController, ServiceError};
use crate::reporter::TouchReporter;
use crate::transport::FtsTransport;

/// Initialization state for the device
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum InitState {
    Pending,
    Initializing(u8),
    Ready,
    Failed,
}

/// Couples a controller with its interrupt line and a reporter.
///
/// The interrupt line of FTS chips is active low and stays low until the event FIFO has been read.
pub struct FtsDevice<'a, T: FtsTransport, INT: InputPin + Wait, R: TouchReporter<N>, D: DelayNs, const N: usize> {
    controller: &'a FtsController<T, N>,
    int_pin: INT,
    reporter: R,
    delay: D,
    init_state: InitState,
}

impl<'a, T, INT, R, const N: usize> FtsDevice<'a, T, INT, R, Delay, N>
where
    T: FtsTransport,
    INT: InputPin + Wait,
    R: TouchReporter<N>,
{
    pub fn new(controller: &'a FtsController<T, N>, int_pin: INT, reporter: R) -> Self {
        Self::with_delay(controller, int_pin, reporter, Delay)
    }
}

impl<'a, T, INT, R, D, const N: usize> FtsDevice<'a, T, INT, R, D, N>
where
    T: FtsTransport,
    INT: InputPin + Wait,
    R: TouchReporter<N>,
    D: DelayNs,
{
    const MAX_INIT_RETRIES: u8 = 3;
    const INIT_RETRY_DELAY_MS: u32 = 100;
    const ERROR_BACKOFF_MS: u32 = 1;

    /// Use `delay` for the reset sequence and the retry back-off
    pub fn with_delay(controller: &'a FtsController<T, N>, int_pin: INT, reporter: R, delay: D) -> Self {
        Self {
            controller,
            int_pin,
            reporter,
            delay,
            init_state: InitState::Pending,
        }
    }

    pub fn init_state(&self) -> InitState {
        self.init_state
    }

    async fn try_init(&mut self) -> bool {
        match self.init_state {
            InitState::Ready => return true,
            InitState::Failed => return false,
            InitState::Pending => {
                self.init_state = InitState::Initializing(0);
            }
            InitState::Initializing(_) => {}
        }

        if let InitState::Initializing(retry_count) = self.init_state {
            info!("FtsDevice: initializing controller (attempt {})", retry_count + 1);

            match self.controller.start(&mut self.delay).await {
                Ok(()) => {
                    self.init_state = InitState::Ready;
                    return true;
                }
                Err(e) => {
                    error!("FtsDevice: init failed: {:?}", e);
                    if retry_count + 1 >= Self::MAX_INIT_RETRIES {
                        error!("FtsDevice: max retries reached, giving up");
                        self.init_state = InitState::Failed;
                        return false;
                    }
                    self.init_state = InitState::Initializing(retry_count + 1);
                    self.delay.delay_ms(Self::INIT_RETRY_DELAY_MS).await;
                    return false;
                }
            }
        }

        false
    }

    /// Wait for the interrupt line and service it once
    pub async fn service_once(&mut self) -> Result<(), ServiceError> {
        if self.int_pin.wait_for_low().await.is_err() {
            warn!("FtsDevice: failed to wait for the interrupt line");
        }
        self.controller.service_interrupt(&mut self.reporter).await
    }

    /// Start the controller and service its interrupts forever.
    ///
    /// If the controller can't be started the task parks.
    pub async fn run(&mut self) -> ! {
        while !self.try_init().await {
            if self.init_state == InitState::Failed {
                core::future::pending::<()>().await;
            }
        }

        loop {
            if let Err(e) = self.service_once().await {
                match e {
                    ServiceError::NoData => debug!("FtsDevice: no data"),
                    ServiceError::RearmFailed => error!("FtsDevice: interrupt re-arm failed"),
                    e => warn!("FtsDevice: service error: {:?}", e),
                }
                self.delay.delay_ms(Self::ERROR_BACKOFF_MS).await;
            }
        }
    }
}
