//! Program execution
//!
//! The engine runs one program a primitive at a time; the supervisor
//! decides when a program may start and forwards one engine poll per cycle.

pub mod executor;
pub mod supervisor;

pub use executor::{Engine, RunState};
pub use supervisor::{RunControl, Supervisor};
