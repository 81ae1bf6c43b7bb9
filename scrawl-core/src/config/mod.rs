//! Configuration types
//!
//! Board-agnostic tuning and program storage, parsed from a small TOML
//! subset so the firmware can embed `robot.toml` without an allocator.

pub mod parse;
pub mod types;

pub use parse::{parse_config, ParseError};
pub use types::*;
