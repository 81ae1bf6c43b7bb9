//! Debounced push button
//!
//! Sampled once per main-loop cycle. A counter rises while the raw input
//! reads pressed and falls while it reads released; the debounced state
//! flips to pressed when the counter reaches the threshold and back to
//! released when it drains to zero. Each debounced press latches one
//! rising edge, consumed by [`StartTrigger::take_rising_edge`].

use embedded_hal::digital::InputPin;
use scrawl_core::traits::StartTrigger;

/// Button configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ButtonConfig {
    /// Pressed reads low (pull-up wiring)
    pub active_low: bool,
    /// Consecutive pressed samples before a press is accepted
    pub samples: u8,
}

impl Default for ButtonConfig {
    fn default() -> Self {
        Self {
            active_low: true,
            samples: 4,
        }
    }
}

/// Push button with counter debounce and edge latch
pub struct DebouncedButton<P> {
    pin: P,
    config: ButtonConfig,
    counter: u8,
    pressed: bool,
    edge: bool,
}

impl<P: InputPin> DebouncedButton<P> {
    pub fn new(pin: P, config: ButtonConfig) -> Self {
        Self {
            pin,
            config,
            counter: 0,
            pressed: false,
            edge: false,
        }
    }

    /// Take one raw sample and update the debounced state
    ///
    /// A read error counts as released.
    pub fn sample(&mut self) -> bool {
        let raw = match self.pin.is_high() {
            Ok(high) => high != self.config.active_low,
            Err(_) => false,
        };
        let threshold = self.config.samples.max(1);

        if raw {
            self.counter = self.counter.saturating_add(1).min(threshold);
            if self.counter >= threshold && !self.pressed {
                self.pressed = true;
                self.edge = true;
            }
        } else {
            self.counter = self.counter.saturating_sub(1);
            if self.counter == 0 {
                self.pressed = false;
            }
        }

        self.pressed
    }

    /// Debounced state as of the last sample
    pub fn is_pressed(&self) -> bool {
        self.pressed
    }

    pub fn pin_mut(&mut self) -> &mut P {
        &mut self.pin
    }
}

impl<P: InputPin> StartTrigger for DebouncedButton<P> {
    fn take_rising_edge(&mut self) -> bool {
        self.sample();
        core::mem::take(&mut self.edge)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockPin;

    fn button() -> DebouncedButton<MockPin> {
        DebouncedButton::new(MockPin { high: true }, ButtonConfig::default())
    }

    #[test]
    fn test_press_needs_consecutive_samples() {
        let mut b = button();
        b.pin_mut().high = false;

        assert!(!b.take_rising_edge());
        assert!(!b.take_rising_edge());
        assert!(!b.take_rising_edge());
        assert!(b.take_rising_edge());
        assert!(b.is_pressed());
    }

    #[test]
    fn test_edge_consumed_once() {
        let mut b = button();
        b.pin_mut().high = false;
        for _ in 0..4 {
            b.sample();
        }

        assert!(b.take_rising_edge());
        // Still held: no new edge
        for _ in 0..10 {
            assert!(!b.take_rising_edge());
        }
    }

    #[test]
    fn test_bounce_rejected() {
        let mut b = button();
        for i in 0..20 {
            b.pin_mut().high = i % 2 == 0;
            assert!(!b.take_rising_edge());
        }
    }

    #[test]
    fn test_release_then_press_again() {
        let mut b = button();
        b.pin_mut().high = false;
        for _ in 0..4 {
            b.sample();
        }
        assert!(b.take_rising_edge());

        b.pin_mut().high = true;
        for _ in 0..4 {
            b.sample();
        }
        assert!(!b.is_pressed());

        b.pin_mut().high = false;
        for _ in 0..4 {
            b.sample();
        }
        assert!(b.take_rising_edge());
    }
}
