//! Operator inputs

pub mod button;

pub use button::{ButtonConfig, DebouncedButton};
