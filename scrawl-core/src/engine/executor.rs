//! Command execution engine
//!
//! Reads a program one line at a time and runs each instruction as a
//! [`Primitive`], polling it to completion before reading the next line.
//! Each call to [`Engine::poll`] does a bounded amount of work and returns,
//! so the main loop keeps cycling while a program runs.

use crate::config::MotionConfig;
use crate::motion::{Instruction, InstructionError, Outcome, Primitive, RotationController};
use crate::robot::Robot;
use crate::status::{Status, StatusSink};
use crate::traits::ProgramSource;

/// Engine run state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RunState {
    /// No program loaded
    Idle,
    /// Program loaded and executing
    Running,
    /// Program ran past its last line
    FinishedAll,
}

/// Non-blocking program executor
///
/// Holds at most one active primitive at a time.
pub struct Engine<S> {
    motion: MotionConfig,
    rotation: RotationController,
    source: Option<S>,
    active: Option<Primitive>,
    state: RunState,
    line: u16,
    dispatched: u32,
}

impl<S: ProgramSource> Engine<S> {
    /// Create an idle engine
    pub fn new(motion: MotionConfig, rotation: RotationController) -> Self {
        Self {
            motion,
            rotation,
            source: None,
            active: None,
            state: RunState::Idle,
            line: 0,
            dispatched: 0,
        }
    }

    /// Load a program and start running it from its first line
    ///
    /// Any in-flight primitive is cancelled first.
    pub fn begin<R: Robot>(&mut self, mut source: S, robot: &mut R) {
        self.cancel(robot);
        source.rewind();
        self.source = Some(source);
        self.state = RunState::Running;
        self.line = 0;
        self.dispatched = 0;
    }

    /// Stop the drive and drop the program
    ///
    /// On an idle engine this only re-affirms the drive stop.
    pub fn cancel<R: Robot>(&mut self, robot: &mut R) {
        robot.halt();
        self.active = None;
        self.source = None;
        self.state = RunState::Idle;
    }

    /// Stop the drive and freeze the active primitive's remaining time
    pub fn hold<R: Robot>(&mut self, robot: &mut R) {
        robot.halt();
        if let Some(active) = self.active.as_mut() {
            active.hold(robot);
        }
    }

    /// Resume a held primitive where it left off
    pub fn resume<R: Robot>(&mut self, robot: &mut R) {
        if let Some(active) = self.active.as_mut() {
            active.resume(robot);
        }
    }

    /// Advance execution by one cycle
    pub fn poll<R: Robot, K: StatusSink>(&mut self, robot: &mut R, sink: &mut K) -> RunState {
        if self.state != RunState::Running {
            return self.state;
        }

        if let Some(active) = self.active.as_mut() {
            active.poll(robot);
            if !active.is_finished() {
                return self.state;
            }
            let outcome = active.outcome();
            self.active = None;
            if !self.settle(outcome, robot, sink) {
                return self.state;
            }
            // Finished this cycle: fall through and read the next line
        }

        let Some(source) = self.source.as_mut() else {
            self.state = RunState::Idle;
            return self.state;
        };

        if !source.has_next() {
            self.finish_all(robot);
            return self.state;
        }

        let Some(parsed) = source.next_line().map(Instruction::parse) else {
            self.finish_all(robot);
            return self.state;
        };
        self.line = self.line.saturating_add(1);

        match parsed {
            Ok(instruction) => self.dispatch(instruction, robot, sink),
            Err(InstructionError::Empty) => {}
            Err(error) => {
                #[cfg(feature = "defmt")]
                defmt::warn!("engine: line {} skipped: {}", self.line, error);
                sink.report(Status::InstructionSkipped {
                    line: self.line,
                    error,
                });
            }
        }

        self.state
    }

    fn dispatch<R: Robot, K: StatusSink>(&mut self, instruction: Instruction, robot: &mut R, sink: &mut K) {
        let mut primitive = Primitive::from_instruction(instruction, &self.motion);
        primitive.start(robot, &self.rotation);
        self.dispatched += 1;

        #[cfg(feature = "defmt")]
        defmt::debug!("engine: line {} -> {}", self.line, primitive.kind());

        if primitive.is_finished() {
            self.settle(primitive.outcome(), robot, sink);
        } else {
            self.active = Some(primitive);
        }
    }

    /// Handle a finished primitive; returns `false` if the program was cancelled
    fn settle<R: Robot, K: StatusSink>(&mut self, outcome: Option<Outcome>, robot: &mut R, sink: &mut K) -> bool {
        match outcome {
            Some(Outcome::Interrupted) => {
                sink.report(Status::PrimitiveInterrupted);
                self.cancel(robot);
                false
            }
            Some(Outcome::TimedOut { error_x10 }) => {
                sink.report(Status::RotationTimeout { error_x10 });
                true
            }
            Some(Outcome::Completed) | None => true,
        }
    }

    fn finish_all<R: Robot>(&mut self, robot: &mut R) {
        robot.halt();
        self.source = None;
        self.state = RunState::FinishedAll;
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == RunState::Running
    }

    /// Check if a primitive is in flight
    pub fn has_active_primitive(&self) -> bool {
        self.active.is_some()
    }

    /// Active primitive, if any
    pub fn active(&self) -> Option<&Primitive> {
        self.active.as_ref()
    }

    /// Number of lines read from the current program
    pub fn line(&self) -> u16 {
        self.line
    }

    /// Number of primitives started for the current program
    pub fn dispatched(&self) -> u32 {
        self.dispatched
    }
}
