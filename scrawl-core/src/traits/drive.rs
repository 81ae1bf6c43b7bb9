//! Drive and marker actuator traits
//!
//! The motion logic never touches pins directly. It talks to a drive
//! actuator that understands whole-robot motions (forward, backward, spin)
//! at a duty level, plus an enable gate that cuts power to the bridge.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Whole-robot motion commanded to the drive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Motion {
    /// Both wheels forward
    Forward,
    /// Both wheels backward
    Backward,
    /// Spin in place counter-clockwise (heading increases)
    SpinLeft,
    /// Spin in place clockwise (heading decreases)
    SpinRight,
}

impl Motion {
    /// The motion that undoes this one
    pub const fn opposite(self) -> Self {
        match self {
            Motion::Forward => Motion::Backward,
            Motion::Backward => Motion::Forward,
            Motion::SpinLeft => Motion::SpinRight,
            Motion::SpinRight => Motion::SpinLeft,
        }
    }

    /// Check if this motion rotates the robot in place
    pub const fn is_spin(self) -> bool {
        matches!(self, Motion::SpinLeft | Motion::SpinRight)
    }
}

/// Trait for the drive train
///
/// Duty is a percentage (0-100). Implementations map it onto the PWM range
/// of the underlying bridge, including any minimum duty below which the
/// wheels do not turn.
pub trait DriveActuator {
    /// Drive with the given motion at the given duty percentage
    fn command(&mut self, motion: Motion, duty: u8);

    /// Stop all wheels (enable gate untouched)
    fn stop(&mut self);

    /// Enable or disable the driver (standby line)
    ///
    /// When disabled the wheels coast and commands are ignored until the
    /// driver is enabled again.
    fn set_enabled(&mut self, enabled: bool);

    /// Check if the driver is enabled
    fn is_enabled(&self) -> bool;
}

/// Trait for the drawing marker (pen or paint nozzle)
pub trait MarkerActuator {
    /// Lower (`true`) or raise (`false`) the marker
    fn set_marker(&mut self, down: bool);

    /// Check if the marker is currently down
    fn is_marking(&self) -> bool;
}
