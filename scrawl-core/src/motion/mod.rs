//! Motion
//!
//! Instruction parsing, motion primitives and the closed-loop rotation
//! controller, all expressed in fixed-point tenths of a degree.

pub mod angle;
pub mod instruction;
pub mod primitive;
pub mod rotation;

pub use angle::{angle_diff_x10, wrap180_x10, FULL_TURN_X10, HALF_TURN_X10};
pub use instruction::{Instruction, InstructionError, Turn, MAX_ANGLE_X10, MAX_DURATION_MS};
pub use primitive::{Outcome, Primitive, PrimitiveKind, PrimitiveState};
pub use rotation::{RotateError, RotationController, RotationReport, Zone};
