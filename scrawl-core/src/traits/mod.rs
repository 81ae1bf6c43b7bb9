//! Hardware and collaborator abstraction traits
//!
//! These traits define the interface between the motion logic and the
//! hardware- or storage-specific implementations.

pub mod drive;
pub mod input;
pub mod program;
pub mod sensor;
pub mod time;

pub use drive::{DriveActuator, MarkerActuator, Motion};
pub use input::{ProgramSelector, StartTrigger};
pub use program::{CatalogError, ProgramCatalog, ProgramSource};
pub use sensor::HeadingSensor;
pub use time::Clock;

pub use crate::status::StatusSink;
