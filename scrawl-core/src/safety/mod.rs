//! Emergency stop handling
//!
//! The stop flag written from interrupt context and the interruptible
//! delay every blocking wait is routed through.

pub mod delay;
pub mod stop;

pub use delay::{Interrupted, InterruptibleDelay, DEFAULT_SLICE_MS};
pub use stop::{StopFlag, DEFAULT_STOP_DEBOUNCE_MS};
