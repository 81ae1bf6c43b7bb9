//! Differential drive
//!
//! Two wheels and a shared standby line (TB6612FNG `STBY`, active high).
//! Whole-robot motions map onto wheel directions:
//!
//! | motion    | left    | right   |
//! |-----------|---------|---------|
//! | Forward   | forward | forward |
//! | Backward  | reverse | reverse |
//! | SpinLeft  | reverse | forward |
//! | SpinRight | forward | reverse |

use embedded_hal::digital::OutputPin;
use scrawl_core::traits::{DriveActuator, Motion};

use super::dc::{Wheel, WheelDirection};

/// Two-wheel drive with a standby gate
pub struct DifferentialDrive<L, R, S> {
    left: L,
    right: R,
    standby: S,
    enabled: bool,
}

impl<L: Wheel, R: Wheel, S: OutputPin> DifferentialDrive<L, R, S> {
    /// Create a stopped drive with the bridge in standby
    pub fn new(left: L, right: R, standby: S) -> Self {
        let mut drive = Self {
            left,
            right,
            standby,
            enabled: true,
        };
        drive.stop();
        drive.set_enabled(false);
        drive
    }

    pub fn left(&self) -> &L {
        &self.left
    }

    pub fn right(&self) -> &R {
        &self.right
    }
}

fn wheel_directions(motion: Motion) -> (WheelDirection, WheelDirection) {
    use WheelDirection::{Forward, Reverse};

    match motion {
        Motion::Forward => (Forward, Forward),
        Motion::Backward => (Reverse, Reverse),
        Motion::SpinLeft => (Reverse, Forward),
        Motion::SpinRight => (Forward, Reverse),
    }
}

impl<L: Wheel, R: Wheel, S: OutputPin> DriveActuator for DifferentialDrive<L, R, S> {
    fn command(&mut self, motion: Motion, duty: u8) {
        if !self.enabled {
            return;
        }
        let (left, right) = wheel_directions(motion);
        self.left.run(left, duty);
        self.right.run(right, duty);
    }

    fn stop(&mut self) {
        self.left.stop();
        self.right.stop();
    }

    fn set_enabled(&mut self, enabled: bool) {
        if !enabled {
            self.stop();
        }
        let _ = self.standby.set_state(enabled.into());
        self.enabled = enabled;

        #[cfg(feature = "defmt")]
        defmt::trace!("drive: standby {}", if enabled { "off" } else { "on" });
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }
}
