//! Motion primitives
//!
//! A primitive is one in-progress action with an explicit lifecycle:
//!
//! ```text
//! Idle --start()--> Active --poll()...--> Finished
//!   \                                       ^
//!    `--start() (marker, closed-loop turn)--'
//! ```
//!
//! Timed primitives (drive, fixed turn, pause) issue their actuator command
//! in `start()` and finish from `poll()` once their duration has elapsed.
//! `poll()` never blocks. Marker primitives and closed-loop turns finish
//! inside `start()`.
//!
//! A timed primitive can be held: `hold()` stops the drive and freezes its
//! elapsed time, `resume()` re-issues the command for the remaining time.

use super::instruction::{Instruction, Turn};
use super::rotation::{RotateError, RotationController};
use crate::config::MotionConfig;
use crate::robot::Robot;
use crate::traits::Motion;

/// What a primitive does
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PrimitiveKind {
    /// Straight drive for a duration
    DriveTimed { motion: Motion, duration_ms: u32 },
    /// Open-loop turn of the calibrated duration
    TurnFixed(Turn),
    /// Closed-loop turn by an angle (positive is clockwise)
    TurnToHeading { angle_x10: i32 },
    /// All actuation stopped for a duration
    Pause { duration_ms: u32 },
    /// Marker down or up
    MarkerSet { down: bool },
}

/// Lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PrimitiveState {
    Idle,
    Active,
    Finished,
}

/// How a finished primitive ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Outcome {
    Completed,
    /// Cut short by a stop request
    Interrupted,
    /// Closed-loop turn hit its timeout
    TimedOut { error_x10: i32 },
}

/// One pollable motion action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Primitive {
    kind: PrimitiveKind,
    state: PrimitiveState,
    duty: u8,
    duration_ms: u32,
    started_ms: u32,
    /// Elapsed time frozen by `hold()`
    held_elapsed_ms: Option<u32>,
    outcome: Option<Outcome>,
}

impl Primitive {
    /// Create an idle primitive
    pub fn new(kind: PrimitiveKind, config: &MotionConfig) -> Self {
        let (duty, duration_ms) = match kind {
            PrimitiveKind::DriveTimed { duration_ms, .. } => (config.drive_duty, duration_ms),
            PrimitiveKind::TurnFixed(_) => (config.turn_duty, config.turn_fixed_ms),
            PrimitiveKind::Pause { duration_ms } => (0, duration_ms),
            PrimitiveKind::TurnToHeading { .. } | PrimitiveKind::MarkerSet { .. } => (0, 0),
        };

        Self {
            kind,
            state: PrimitiveState::Idle,
            duty,
            duration_ms,
            started_ms: 0,
            held_elapsed_ms: None,
            outcome: None,
        }
    }

    /// Create the primitive an instruction dispatches to
    pub fn from_instruction(instruction: Instruction, config: &MotionConfig) -> Self {
        let kind = match instruction {
            Instruction::Drive { motion, duration_ms } => PrimitiveKind::DriveTimed { motion, duration_ms },
            Instruction::TurnFixed(turn) => PrimitiveKind::TurnFixed(turn),
            Instruction::Rotate { angle_x10 } => PrimitiveKind::TurnToHeading { angle_x10 },
            Instruction::Pause { duration_ms } => PrimitiveKind::Pause { duration_ms },
            Instruction::Marker { down } => PrimitiveKind::MarkerSet { down },
        };
        Self::new(kind, config)
    }

    /// Issue the initial command
    ///
    /// Only acts on an idle primitive. A closed-loop turn runs to
    /// completion here, so this call blocks for the duration of the turn
    /// (the turn itself stays stop-aware).
    pub fn start<R: Robot>(&mut self, robot: &mut R, rotation: &RotationController) {
        if self.state != PrimitiveState::Idle {
            return;
        }

        self.started_ms = robot.now_ms();
        self.state = PrimitiveState::Active;

        match self.kind {
            PrimitiveKind::DriveTimed { .. } | PrimitiveKind::TurnFixed(_) | PrimitiveKind::Pause { .. } => {
                self.command(robot)
            }
            PrimitiveKind::MarkerSet { down } => {
                robot.set_marker(down);
                self.finish(Outcome::Completed);
            }
            PrimitiveKind::TurnToHeading { angle_x10 } => {
                let outcome = match rotation.rotate(robot, angle_x10) {
                    Ok(_) => Outcome::Completed,
                    Err(RotateError::Timeout { error_x10 }) => Outcome::TimedOut { error_x10 },
                    Err(RotateError::Interrupted) => Outcome::Interrupted,
                };
                self.finish(outcome);
            }
        }
    }

    /// Actuator command of a timed primitive
    fn command<R: Robot>(&self, robot: &mut R) {
        match self.kind {
            PrimitiveKind::DriveTimed { motion, .. } => robot.drive(motion, self.duty),
            PrimitiveKind::TurnFixed(turn) => robot.drive(turn.motion(), self.duty),
            _ => robot.halt(),
        }
    }

    /// Stop the drive and freeze the elapsed time of an active primitive
    pub fn hold<R: Robot>(&mut self, robot: &mut R) {
        if self.state != PrimitiveState::Active || self.held_elapsed_ms.is_some() {
            return;
        }
        self.held_elapsed_ms = Some(robot.elapsed_ms(self.started_ms));
        robot.halt();
    }

    /// Re-issue the command of a held primitive for its remaining time
    pub fn resume<R: Robot>(&mut self, robot: &mut R) {
        let Some(elapsed) = self.held_elapsed_ms.take() else {
            return;
        };
        if self.state != PrimitiveState::Active {
            return;
        }
        self.started_ms = robot.now_ms().wrapping_sub(elapsed);
        self.command(robot);
    }

    pub fn is_held(&self) -> bool {
        self.held_elapsed_ms.is_some()
    }

    /// Advance an active timed primitive
    ///
    /// O(1): checks the stop flag and the elapsed time. On expiry the drive
    /// is stopped and the primitive finishes. A held primitive only reacts
    /// to stop requests.
    pub fn poll<R: Robot>(&mut self, robot: &mut R) -> PrimitiveState {
        if self.state != PrimitiveState::Active {
            return self.state;
        }

        if robot.stop_requested() {
            robot.emergency_stop();
            self.held_elapsed_ms = None;
            self.finish(Outcome::Interrupted);
        } else if self.held_elapsed_ms.is_some() {
            return self.state;
        } else if robot.elapsed_ms(self.started_ms) >= self.duration_ms {
            robot.halt();
            self.finish(Outcome::Completed);
        }

        self.state
    }

    fn finish(&mut self, outcome: Outcome) {
        self.state = PrimitiveState::Finished;
        self.outcome = Some(outcome);
    }

    pub fn kind(&self) -> PrimitiveKind {
        self.kind
    }

    pub fn state(&self) -> PrimitiveState {
        self.state
    }

    pub fn is_finished(&self) -> bool {
        self.state == PrimitiveState::Finished
    }

    /// How the primitive ended (None until finished)
    pub fn outcome(&self) -> Option<Outcome> {
        self.outcome
    }

    /// Duration of a timed primitive (0 otherwise)
    pub fn duration_ms(&self) -> u32 {
        self.duration_ms
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RotationConfig;
    use crate::testing::{SimCommand, SimRobot};

    fn rotation() -> RotationController {
        RotationController::new(RotationConfig::default())
    }

    fn primitive(line: &str) -> Primitive {
        Primitive::from_instruction(Instruction::parse(line).unwrap(), &MotionConfig::default())
    }

    #[test]
    fn test_drive_lifecycle() {
        let mut robot = SimRobot::new();
        let mut p = primitive("F 100");
        assert_eq!(p.state(), PrimitiveState::Idle);

        p.start(&mut robot, &rotation());
        assert_eq!(p.state(), PrimitiveState::Active);
        assert_eq!(robot.commands(), &[SimCommand::Drive(Motion::Forward, 70)]);

        robot.advance(99);
        assert_eq!(p.poll(&mut robot), PrimitiveState::Active);
        assert!(!p.is_finished());

        robot.advance(1);
        assert_eq!(p.poll(&mut robot), PrimitiveState::Finished);
        assert_eq!(p.outcome(), Some(Outcome::Completed));
        assert_eq!(robot.commands().last(), Some(&SimCommand::Halt));
    }

    #[test]
    fn test_poll_does_not_advance_time() {
        let mut robot = SimRobot::new();
        let mut p = primitive("B 50");
        p.start(&mut robot, &rotation());
        for _ in 0..100 {
            p.poll(&mut robot);
        }
        assert_eq!(robot.now(), 0);
        assert!(!p.is_finished());
    }

    #[test]
    fn test_fixed_turn_uses_calibrated_duration() {
        let config = MotionConfig::default();
        let mut robot = SimRobot::new();
        let mut p = primitive("TR");
        assert_eq!(p.duration_ms(), config.turn_fixed_ms);

        p.start(&mut robot, &rotation());
        assert_eq!(robot.current_motion(), Some(Motion::SpinRight));

        robot.advance(config.turn_fixed_ms);
        assert_eq!(p.poll(&mut robot), PrimitiveState::Finished);
    }

    #[test]
    fn test_pause_stops_actuation() {
        let mut robot = SimRobot::new();
        robot.drive(Motion::Forward, 70);

        let mut p = primitive("P 20");
        p.start(&mut robot, &rotation());
        assert!(!robot.is_moving());

        robot.advance(20);
        assert!(p.poll(&mut robot) == PrimitiveState::Finished);
    }

    #[test]
    fn test_marker_finishes_in_start() {
        let mut robot = SimRobot::new();
        let mut p = primitive("paintON");
        p.start(&mut robot, &rotation());

        assert!(p.is_finished());
        assert!(robot.is_marking());
        assert_eq!(robot.now(), 0);
    }

    #[test]
    fn test_zero_duration_finishes_on_first_poll() {
        let mut robot = SimRobot::new();
        let mut p = primitive("F 0");
        p.start(&mut robot, &rotation());
        assert_eq!(p.poll(&mut robot), PrimitiveState::Finished);
    }

    #[test]
    fn test_turn_to_heading_runs_in_start() {
        let mut robot = SimRobot::new();
        let mut p = primitive("R 90");
        p.start(&mut robot, &rotation());

        assert!(p.is_finished());
        assert_eq!(p.outcome(), Some(Outcome::Completed));
        assert!(robot.now() > 0);
        assert!(!robot.is_moving());
    }

    #[test]
    fn test_turn_to_heading_timeout_outcome() {
        let mut robot = SimRobot::with_headings(&[0]);
        let mut p = primitive("R -90");
        p.start(&mut robot, &rotation());
        assert_eq!(p.outcome(), Some(Outcome::TimedOut { error_x10: 900 }));
    }

    #[test]
    fn test_stop_interrupts_timed_primitive() {
        let mut robot = SimRobot::new();
        let mut p = primitive("F 1000");
        p.start(&mut robot, &rotation());

        robot.advance(10);
        robot.press_stop();
        assert_eq!(p.poll(&mut robot), PrimitiveState::Finished);
        assert_eq!(p.outcome(), Some(Outcome::Interrupted));
        assert!(!robot.is_enabled());
        assert_eq!(robot.commands().last(), Some(&SimCommand::EmergencyStop));
    }

    #[test]
    fn test_start_is_one_shot() {
        let mut robot = SimRobot::new();
        let mut p = primitive("F 10");
        p.start(&mut robot, &rotation());
        p.start(&mut robot, &rotation());
        assert_eq!(robot.drive_count(Motion::Forward), 1);
    }

    #[test]
    fn test_hold_freezes_remaining_time() {
        let mut robot = SimRobot::new();
        let mut p = primitive("F 100");
        p.start(&mut robot, &rotation());

        robot.advance(40);
        p.hold(&mut robot);
        assert!(p.is_held());
        assert!(!robot.is_moving());

        // Time spent held does not count
        robot.advance(500);
        assert_eq!(p.poll(&mut robot), PrimitiveState::Active);

        p.resume(&mut robot);
        assert!(!p.is_held());
        assert_eq!(robot.current_motion(), Some(Motion::Forward));
        assert_eq!(robot.drive_count(Motion::Forward), 2);

        robot.advance(59);
        assert_eq!(p.poll(&mut robot), PrimitiveState::Active);
        robot.advance(1);
        assert_eq!(p.poll(&mut robot), PrimitiveState::Finished);
        assert_eq!(p.outcome(), Some(Outcome::Completed));
    }

    #[test]
    fn test_stop_while_held_interrupts() {
        let mut robot = SimRobot::new();
        let mut p = primitive("TL");
        p.start(&mut robot, &rotation());
        p.hold(&mut robot);

        robot.press_stop();
        assert_eq!(p.poll(&mut robot), PrimitiveState::Finished);
        assert_eq!(p.outcome(), Some(Outcome::Interrupted));
    }

    #[test]
    fn test_hold_ignored_when_not_active() {
        let mut robot = SimRobot::new();
        let mut p = primitive("paintON");
        p.start(&mut robot, &rotation());
        p.hold(&mut robot);
        assert!(!p.is_held());
    }
}
