//! Embassy async tasks
//!
//! The stop button runs on a high-priority interrupt executor so it can
//! preempt the control loop, which busy-waits inside closed-loop turns.

pub mod control;
pub mod stop_button;

pub use control::{control_task, ControlInputs};
pub use stop_button::stop_button_task;
