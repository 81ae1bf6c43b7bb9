//! Status reporting
//!
//! Lifecycle events emitted by the supervisor and engine. Status output is
//! telemetry only: nothing in the control path reads it back.

use heapless::{String, Vec};

use crate::config::MAX_NAME_LEN;
use crate::motion::InstructionError;

/// Program name as carried in status events
pub type ProgramName = String<MAX_NAME_LEN>;

/// One status event
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Status {
    /// A start edge was seen (always precedes the outcome below)
    StartAcknowledged,
    /// Start refused: run control is disabled
    RunBlocked,
    /// Start refused: a program is already running
    AlreadyRunning,
    /// Start refused: the selected program does not exist
    ProgramNotFound(ProgramName),
    /// Program loaded and running
    ProgramStarted(ProgramName),
    /// Program ran to its last line
    ProgramFinished,
    /// A closed-loop turn gave up; the program continues
    RotationTimeout { error_x10: i32 },
    /// A primitive was cut short by a stop request; the program is cancelled
    PrimitiveInterrupted,
    /// Stop request handled: actuators stopped and disabled
    StopEngaged,
    /// A program line was skipped
    InstructionSkipped { line: u16, error: InstructionError },
}

impl Status {
    /// Check if this event signals a problem
    pub fn is_warning(&self) -> bool {
        matches!(
            self,
            Status::RunBlocked
                | Status::ProgramNotFound(_)
                | Status::RotationTimeout { .. }
                | Status::PrimitiveInterrupted
                | Status::StopEngaged
                | Status::InstructionSkipped { .. }
        )
    }
}

/// Convert a program name, truncating at a character boundary if needed
pub fn program_name(name: &str) -> ProgramName {
    let mut out = ProgramName::new();
    for c in name.chars() {
        if out.push(c).is_err() {
            break;
        }
    }
    out
}

/// Receiver of status events
pub trait StatusSink {
    fn report(&mut self, status: Status);
}

/// Discards every event
impl StatusSink for () {
    fn report(&mut self, _status: Status) {}
}

/// Collects events until full, then drops new ones
impl<const N: usize> StatusSink for Vec<Status, N> {
    fn report(&mut self, status: Status) {
        let _ = self.push(status);
    }
}

impl<S: StatusSink + ?Sized> StatusSink for &mut S {
    fn report(&mut self, status: Status) {
        (**self).report(status);
    }
}
