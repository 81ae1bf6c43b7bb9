//! Pen / paint marker on a single output
//!
//! Drives a pen solenoid or a paint pump enable. Some boards switch the
//! load through a low-side transistor on an inverted line, hence
//! `active_low`.

use embedded_hal::digital::OutputPin;
use scrawl_core::traits::MarkerActuator;

/// Marker on one GPIO
pub struct PenMarker<P> {
    pin: P,
    active_low: bool,
    down: bool,
}

impl<P: OutputPin> PenMarker<P> {
    /// Create a marker, raised
    pub fn new(pin: P, active_low: bool) -> Self {
        let mut marker = Self {
            pin,
            active_low,
            down: true,
        };
        marker.set_marker(false);
        marker
    }
}

impl<P: OutputPin> MarkerActuator for PenMarker<P> {
    fn set_marker(&mut self, down: bool) {
        let level = down != self.active_low;
        let _ = self.pin.set_state(level.into());
        self.down = down;
    }

    fn is_marking(&self) -> bool {
        self.down
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockPin;

    #[test]
    fn test_starts_raised() {
        let marker = PenMarker::new(MockPin::default(), false);
        assert!(!marker.is_marking());
        assert!(!marker.pin.high);
    }

    #[test]
    fn test_active_high() {
        let mut marker = PenMarker::new(MockPin::default(), false);
        marker.set_marker(true);
        assert!(marker.is_marking());
        assert!(marker.pin.high);
    }

    #[test]
    fn test_active_low() {
        let mut marker = PenMarker::new(MockPin::default(), true);
        assert!(marker.pin.high);

        marker.set_marker(true);
        assert!(marker.is_marking());
        assert!(!marker.pin.high);
    }
}
