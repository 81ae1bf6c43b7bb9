//! DC motor on one H-bridge channel
//!
//! Drives one wheel motor through a TB6612FNG-style channel: two direction
//! inputs plus a PWM input.
//!
//! | IN1 | IN2 | PWM  | result       |
//! |-----|-----|------|--------------|
//! | H   | L   | duty | forward      |
//! | L   | H   | duty | reverse      |
//! | L   | L   | -    | stop (coast) |
//!
//! Duty requests are percentages. Below some minimum duty the motor stalls
//! instead of turning, so non-zero requests are mapped onto
//! `min_duty..=100` and 0% always means off.

use embedded_hal::digital::OutputPin;
use embedded_hal::pwm::SetDutyCycle;

/// Wheel rotation direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum WheelDirection {
    Forward,
    Reverse,
}

/// One wheel of a differential drive
pub trait Wheel {
    /// Turn at `percent` duty (0 stops the wheel)
    fn run(&mut self, direction: WheelDirection, percent: u8);

    /// Stop the wheel
    fn stop(&mut self);
}

/// DC motor channel configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DcMotorConfig {
    /// Minimum duty cycle percentage (below this the motor won't start)
    pub min_duty: u8,
    /// Swap forward and reverse (motor wired or mounted backwards)
    pub reversed: bool,
}

impl Default for DcMotorConfig {
    fn default() -> Self {
        Self {
            min_duty: 20,
            reversed: false,
        }
    }
}

/// DC motor behind one H-bridge channel
pub struct DcMotor<A, B, P> {
    in1: A,
    in2: B,
    pwm: P,
    config: DcMotorConfig,
    /// Requested speed (0-100%)
    speed: u8,
    direction: WheelDirection,
}

impl<A, B, P> DcMotor<A, B, P>
where
    A: OutputPin,
    B: OutputPin,
    P: SetDutyCycle,
{
    /// Create a stopped motor
    pub fn new(in1: A, in2: B, pwm: P, config: DcMotorConfig) -> Self {
        let mut motor = Self {
            in1,
            in2,
            pwm,
            config,
            speed: 0,
            direction: WheelDirection::Forward,
        };
        Wheel::stop(&mut motor);
        motor
    }

    /// Get the configuration
    pub fn config(&self) -> &DcMotorConfig {
        &self.config
    }

    /// Requested speed (0-100%)
    pub fn speed(&self) -> u8 {
        self.speed
    }

    pub fn direction(&self) -> WheelDirection {
        self.direction
    }

    /// Scale the speed percentage to actual duty cycle
    ///
    /// Maps 1-100% to min_duty-100%; 0% stays off.
    fn scale_duty(&self, speed: u8) -> u8 {
        if speed == 0 {
            0
        } else {
            let min = self.config.min_duty.min(100) as u32;
            let range = 100 - min;
            let scaled = min + (speed.min(100) as u32 * range / 100);
            scaled.min(100) as u8
        }
    }

    fn set_inputs(&mut self, direction: Option<WheelDirection>) {
        let forward = match direction {
            None => {
                let _ = self.in1.set_low();
                let _ = self.in2.set_low();
                return;
            }
            Some(dir) => (dir == WheelDirection::Forward) != self.config.reversed,
        };

        // Break before make, so both inputs are never high together
        if forward {
            let _ = self.in2.set_low();
            let _ = self.in1.set_high();
        } else {
            let _ = self.in1.set_low();
            let _ = self.in2.set_high();
        }
    }
}

impl<A, B, P> Wheel for DcMotor<A, B, P>
where
    A: OutputPin,
    B: OutputPin,
    P: SetDutyCycle,
{
    fn run(&mut self, direction: WheelDirection, percent: u8) {
        let percent = percent.min(100);
        if percent == 0 {
            Wheel::stop(self);
            return;
        }

        self.speed = percent;
        self.direction = direction;
        self.set_inputs(Some(direction));
        let duty = self.scale_duty(percent);
        let _ = self.pwm.set_duty_cycle_percent(duty);
    }

    fn stop(&mut self) {
        self.speed = 0;
        let _ = self.pwm.set_duty_cycle_fully_off();
        self.set_inputs(None);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{MockPin, MockPwm};

    fn motor(config: DcMotorConfig) -> DcMotor<MockPin, MockPin, MockPwm> {
        DcMotor::new(
            MockPin::default(),
            MockPin::default(),
            MockPwm::default(),
            config,
        )
    }

    #[test]
    fn test_initial_state_is_off() {
        let m = motor(DcMotorConfig::default());
        assert_eq!(m.speed(), 0);
        assert!(!m.in1.high && !m.in2.high);
        assert_eq!(m.pwm.duty, 0);
    }

    #[test]
    fn test_duty_scaling() {
        let mut m = motor(DcMotorConfig {
            min_duty: 20,
            reversed: false,
        });

        m.run(WheelDirection::Forward, 100);
        assert_eq!(m.pwm.duty, 1000);

        // 20 + (50% of 80) = 60%
        m.run(WheelDirection::Forward, 50);
        assert_eq!(m.pwm.duty, 600);

        m.run(WheelDirection::Forward, 1);
        assert_eq!(m.pwm.duty, 200);
    }

    #[test]
    fn test_zero_percent_stops() {
        let mut m = motor(DcMotorConfig::default());
        m.run(WheelDirection::Forward, 80);
        m.run(WheelDirection::Forward, 0);
        assert_eq!(m.pwm.duty, 0);
        assert!(!m.in1.high && !m.in2.high);
    }

    #[test]
    fn test_direction_inputs() {
        let mut m = motor(DcMotorConfig::default());

        m.run(WheelDirection::Forward, 50);
        assert!(m.in1.high && !m.in2.high);

        m.run(WheelDirection::Reverse, 50);
        assert!(!m.in1.high && m.in2.high);
        assert_eq!(m.direction(), WheelDirection::Reverse);
    }

    #[test]
    fn test_reversed_motor() {
        let mut m = motor(DcMotorConfig {
            min_duty: 0,
            reversed: true,
        });
        m.run(WheelDirection::Forward, 50);
        assert!(!m.in1.high && m.in2.high);
        assert_eq!(m.pwm.duty, 500);
    }
}
