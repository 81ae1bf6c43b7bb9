//! Status lines over defmt

use defmt::*;

use scrawl_core::status::{Status, StatusSink};

/// Writes each status event as one log line
pub struct LogSink;

impl StatusSink for LogSink {
    fn report(&mut self, status: Status) {
        match status {
            Status::StartAcknowledged => info!("start acknowledged"),
            Status::RunBlocked => warn!("run blocked"),
            Status::AlreadyRunning => info!("already running"),
            Status::ProgramNotFound(name) => warn!("program not found: {}", name.as_str()),
            Status::ProgramStarted(name) => info!("program started {}", name.as_str()),
            Status::ProgramFinished => info!("program finished"),
            Status::RotationTimeout { error_x10 } => {
                warn!("rotation timeout, error {} x0.1 deg", error_x10)
            }
            Status::PrimitiveInterrupted => warn!("primitive interrupted"),
            Status::StopEngaged => warn!("stop engaged"),
            Status::InstructionSkipped { line, error } => {
                warn!("line {} skipped: {}", line, error)
            }
        }
    }
}
