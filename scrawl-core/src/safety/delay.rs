//! Interruptible delay
//!
//! Every blocking wait in the motion code goes through [`InterruptibleDelay`].
//! It sleeps in short slices and checks the stop flag between slices, so a
//! stop request is honoured within one slice no matter how long the
//! requested wait is. On interruption it stops the drive and drops the
//! enable line before returning.

use embedded_hal::delay::DelayNs;

use super::stop::StopFlag;
use crate::traits::{Clock, DriveActuator};

/// Default sleep slice between stop checks
pub const DEFAULT_SLICE_MS: u32 = 2;

/// A wait was cut short by a stop request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Interrupted;

/// Slice-and-recheck busy wait bound to a stop flag
pub struct InterruptibleDelay<'a, C, D> {
    clock: C,
    delay: D,
    stop: &'a StopFlag,
    slice_ms: u32,
}

impl<'a, C: Clock, D: DelayNs> InterruptibleDelay<'a, C, D> {
    /// Create a delay with the default slice
    pub fn new(clock: C, delay: D, stop: &'a StopFlag) -> Self {
        Self {
            clock,
            delay,
            stop,
            slice_ms: DEFAULT_SLICE_MS,
        }
    }

    /// Override the sleep slice (minimum 1ms)
    pub fn with_slice_ms(mut self, slice_ms: u32) -> Self {
        self.slice_ms = slice_ms.max(1);
        self
    }

    /// Wait for `ms`, aborting as soon as a stop is requested
    ///
    /// The stop flag is checked before the first slice and after every
    /// slice. On interruption the drive is stopped and disabled.
    pub fn wait_ms<A: DriveActuator>(&mut self, ms: u32, drive: &mut A) -> Result<(), Interrupted> {
        self.wait_ms_with(ms, drive, || {})
    }

    /// Like [`wait_ms`](Self::wait_ms), calling `on_slice` after every slice
    pub fn wait_ms_with<A, F>(&mut self, ms: u32, drive: &mut A, mut on_slice: F) -> Result<(), Interrupted>
    where
        A: DriveActuator,
        F: FnMut(),
    {
        let start = self.clock.now_ms();

        loop {
            if self.stop.is_engaged() {
                drive.stop();
                drive.set_enabled(false);
                return Err(Interrupted);
            }

            let elapsed = self.clock.elapsed_ms(start);
            if elapsed >= ms {
                return Ok(());
            }

            let slice = (ms - elapsed).min(self.slice_ms);
            self.delay.delay_ms(slice);
            on_slice();
        }
    }

    /// Check the stop flag without waiting
    pub fn stop_requested(&self) -> bool {
        self.stop.is_engaged()
    }

    /// Acknowledge a stop request
    pub fn clear_stop(&self) {
        self.stop.clear();
    }

    /// Current time from the underlying clock
    pub fn now_ms(&self) -> u32 {
        self.clock.now_ms()
    }

    /// Configured slice length
    pub fn slice_ms(&self) -> u32 {
        self.slice_ms
    }
}
