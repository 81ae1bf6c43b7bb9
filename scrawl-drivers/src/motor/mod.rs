//! Motor driver implementations
//!
//! - DC motors: one H-bridge channel each, with minimum-duty scaling
//! - Differential drive: two DC motors plus the bridge standby line

pub mod dc;
pub mod differential;

pub use dc::{DcMotor, DcMotorConfig, Wheel, WheelDirection};
pub use differential::DifferentialDrive;
