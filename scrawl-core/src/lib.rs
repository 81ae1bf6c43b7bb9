//! Board-agnostic core logic for the Scrawl drawing robot
//!
//! This crate contains all application logic that does not depend on
//! specific hardware implementations:
//!
//! - Collaborator traits (drive, marker, heading sensor, clock, programs)
//! - Instruction parsing and motion primitives
//! - Non-blocking command execution engine and program supervisor
//! - Closed-loop rotation controller
//! - Emergency stop flag and interruptible delay
//! - Configuration types and the `robot.toml` parser

#![no_std]
#![deny(unsafe_code)]

pub mod config;
pub mod engine;
pub mod motion;
pub mod program;
pub mod robot;
pub mod safety;
pub mod status;
pub mod traits;

#[cfg(test)]
mod testing;

pub use robot::{Rig, Robot};
