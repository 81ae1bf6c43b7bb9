//! Closed-loop rotation controller
//!
//! Turns the robot in place until the gyro heading matches a target.
//! The drive has a large deadband and the heading is noisy, so the loop
//! uses a zoned control law instead of a proportional one:
//!
//! - **Far**: sustained high-duty slices
//! - **Mid**: sustained medium-duty slices
//! - **Near**: one kick/hold pulse followed by a settle
//! - **Micro**: a short burst of tiny pulses, re-sampling after each one
//!
//! Crossing the target by more than the overshoot threshold latches the
//! overshoot flag. From then on the correction direction is pinned to the
//! opposite of the initial command direction for the rest of the turn.
//!
//! Convergence requires several consecutive in-tolerance samples. Every
//! wait goes through the robot's stop-aware delay, and actuation is stopped
//! on every exit.

use super::angle::{angle_diff_x10, sign_of, wrap180_x10};
use crate::config::RotationConfig;
use crate::robot::Robot;
use crate::safety::Interrupted;
use crate::traits::Motion;

/// Why a rotation did not converge
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RotateError {
    /// Timeout ceiling reached; carries the last measured error
    Timeout { error_x10: i32 },
    /// A stop request cut a wait short
    Interrupted,
}

impl From<Interrupted> for RotateError {
    fn from(_: Interrupted) -> Self {
        RotateError::Interrupted
    }
}

/// Control zone for an absolute error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Zone {
    Far,
    Mid,
    Near,
    Micro,
}

impl Zone {
    /// Classify an absolute error against the configured thresholds
    pub fn classify(abs_error_x10: i32, config: &RotationConfig) -> Self {
        if abs_error_x10 >= config.far_x10 {
            Zone::Far
        } else if abs_error_x10 >= config.mid_x10 {
            Zone::Mid
        } else if abs_error_x10 >= config.near_x10 {
            Zone::Near
        } else {
            Zone::Micro
        }
    }
}

/// Summary of a converged rotation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RotationReport {
    /// Target heading
    pub target_x10: i32,
    /// Error at the last sample
    pub final_error_x10: i32,
    /// Control loop iterations
    pub iterations: u32,
    /// Time from start to convergence
    pub elapsed_ms: u32,
    /// Whether the overshoot latch fired
    pub overshot: bool,
}

/// State of one turn invocation
struct Session {
    target_x10: i32,
    started_ms: u32,
    initial_sign: i32,
    initial_motion: Motion,
    overshot: bool,
    stable: u8,
    iterations: u32,
    last_error_x10: i32,
}

impl Session {
    fn error_x10<R: Robot>(&mut self, robot: &mut R) -> i32 {
        let error = angle_diff_x10(self.target_x10, robot.heading_x10());
        self.last_error_x10 = error;
        error
    }

    /// Latch the overshoot flag when the error is on the wrong side by enough
    fn check_overshoot(&mut self, error_x10: i32, config: &RotationConfig) -> bool {
        if sign_of(error_x10) != self.initial_sign && error_x10.abs() > config.overshoot_x10 {
            if !self.overshot {
                #[cfg(feature = "defmt")]
                defmt::debug!("rotate: overshoot latched at err={}", error_x10);
            }
            self.overshot = true;
            return true;
        }
        false
    }

    /// Direction of the next correction
    fn correction(&self, error_x10: i32) -> Motion {
        if self.overshot {
            self.initial_motion.opposite()
        } else {
            motion_toward(error_x10)
        }
    }
}

/// Spin that reduces an error of this sign
///
/// A positive error means the heading must increase (counter-clockwise).
fn motion_toward(error_x10: i32) -> Motion {
    if sign_of(error_x10) > 0 {
        Motion::SpinLeft
    } else {
        Motion::SpinRight
    }
}

/// Zoned heading controller
#[derive(Debug, Clone, Copy)]
pub struct RotationController {
    config: RotationConfig,
}

impl RotationController {
    /// Create a controller with the given tuning
    pub fn new(config: RotationConfig) -> Self {
        Self { config }
    }

    /// Get the tuning
    pub fn config(&self) -> &RotationConfig {
        &self.config
    }

    /// Target heading for turning `angle_x10` from `start_x10`
    ///
    /// Positive angles are clockwise, so the heading decreases. The
    /// commanded angle is scaled by the direction-dependent gain.
    pub fn target_for(&self, start_x10: i32, angle_x10: i32) -> i32 {
        let gain = if angle_x10 >= 0 {
            self.config.gain_cw_x1000
        } else {
            self.config.gain_ccw_x1000
        };
        let scaled = (angle_x10 as i64 * gain as i64 / 1000) as i32;
        wrap180_x10(start_x10.wrapping_sub(scaled))
    }

    /// Turn by `angle_x10` (positive is clockwise)
    pub fn rotate<R: Robot>(&self, robot: &mut R, angle_x10: i32) -> Result<RotationReport, RotateError> {
        let start = robot.heading_x10();
        let target = self.target_for(start, angle_x10);
        let result = self.run(robot, target, start);
        self.finish(robot, result)
    }

    /// Turn until the heading matches `target_x10`
    pub fn rotate_to<R: Robot>(&self, robot: &mut R, target_x10: i32) -> Result<RotationReport, RotateError> {
        let current = robot.heading_x10();
        let result = self.run(robot, wrap180_x10(target_x10), current);
        self.finish(robot, result)
    }

    fn finish<R: Robot>(
        &self,
        robot: &mut R,
        result: Result<RotationReport, RotateError>,
    ) -> Result<RotationReport, RotateError> {
        robot.halt();

        #[cfg(feature = "defmt")]
        match &result {
            Ok(report) => defmt::info!(
                "rotate: done err={} iters={} in {}ms",
                report.final_error_x10,
                report.iterations,
                report.elapsed_ms
            ),
            Err(RotateError::Timeout { error_x10 }) => {
                defmt::warn!("rotate: timeout, err={}", error_x10)
            }
            Err(RotateError::Interrupted) => defmt::warn!("rotate: interrupted by stop"),
        }

        result
    }

    fn run<R: Robot>(
        &self,
        robot: &mut R,
        target_x10: i32,
        heading_x10: i32,
    ) -> Result<RotationReport, RotateError> {
        let cfg = &self.config;
        let started_ms = robot.now_ms();
        let initial_error = angle_diff_x10(target_x10, heading_x10);
        let initial_motion = motion_toward(initial_error);

        let mut session = Session {
            target_x10,
            started_ms,
            initial_sign: sign_of(initial_error),
            initial_motion,
            overshot: false,
            stable: 0,
            iterations: 0,
            last_error_x10: initial_error,
        };

        // Static friction kick, skipped when already on target
        if initial_error.abs() > cfg.tolerance_x10 {
            robot.drive(initial_motion, cfg.kick_duty);
            robot.wait_ms(cfg.kick_ms)?;
            robot.halt();
            robot.wait_ms(cfg.settle_ms)?;
        }

        let mut last_zone: Option<Zone> = None;

        loop {
            if robot.elapsed_ms(started_ms) >= cfg.timeout_ms {
                return Err(RotateError::Timeout {
                    error_x10: session.last_error_x10,
                });
            }

            session.iterations += 1;
            let error = session.error_x10(robot);
            let abs_error = error.abs();

            if abs_error <= cfg.tolerance_x10 {
                robot.halt();
                session.stable = session.stable.saturating_add(1);
                if session.stable >= cfg.stable_samples {
                    return Ok(RotationReport {
                        target_x10,
                        final_error_x10: error,
                        iterations: session.iterations,
                        elapsed_ms: robot.elapsed_ms(session.started_ms),
                        overshot: session.overshot,
                    });
                }
                robot.wait_ms(cfg.sample_ms)?;
                continue;
            }
            session.stable = 0;

            session.check_overshoot(error, cfg);
            let motion = session.correction(error);
            let zone = Zone::classify(abs_error, cfg);

            if last_zone != Some(zone) {
                #[cfg(feature = "defmt")]
                defmt::debug!("rotate: {} zone, err={}", zone, error);
                last_zone = Some(zone);
            }

            match zone {
                Zone::Far => {
                    robot.drive(motion, cfg.far_duty);
                    robot.wait_ms(cfg.far_slice_ms)?;
                }
                Zone::Mid => {
                    robot.drive(motion, cfg.mid_duty);
                    robot.wait_ms(cfg.mid_slice_ms)?;
                }
                Zone::Near => {
                    self.pulse(robot, motion, cfg.near_kick_ms, cfg.near_hold_ms)?;
                    robot.wait_ms(cfg.near_settle_ms)?;
                }
                Zone::Micro => self.micro_burst(robot, &mut session, error)?,
            }
        }
    }

    /// Kick at pulse duty, hold at fine duty, then stop
    fn pulse<R: Robot>(&self, robot: &mut R, motion: Motion, kick_ms: u32, hold_ms: u32) -> Result<(), Interrupted> {
        robot.drive(motion, self.config.pulse_duty);
        robot.wait_ms(kick_ms)?;
        robot.drive(motion, self.config.fine_duty);
        robot.wait_ms(hold_ms)?;
        robot.halt();
        Ok(())
    }

    /// Up to `micro_pulses` tiny pulses, re-sampling after each one
    ///
    /// The burst ends early once the error is within tolerance, the
    /// heading has crossed the target or the turn has run out of time.
    fn micro_burst<R: Robot>(&self, robot: &mut R, session: &mut Session, error_x10: i32) -> Result<(), Interrupted> {
        let cfg = &self.config;
        let burst_sign = sign_of(error_x10);
        let mut motion = session.correction(error_x10);

        for _ in 0..cfg.micro_pulses {
            if robot.elapsed_ms(session.started_ms) >= cfg.timeout_ms {
                break;
            }
            self.pulse(robot, motion, cfg.micro_kick_ms, cfg.micro_hold_ms)?;
            robot.wait_ms(cfg.micro_settle_ms)?;

            let error = session.error_x10(robot);
            if error.abs() <= cfg.tolerance_x10 {
                break;
            }
            if session.check_overshoot(error, cfg) || sign_of(error) != burst_sign {
                break;
            }
            motion = session.correction(error);
        }

        Ok(())
    }
}
