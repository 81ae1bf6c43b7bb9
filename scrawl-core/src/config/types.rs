//! Configuration type definitions
//!
//! These types carry the platform tuning (duties, timings, calibration
//! gains, zone thresholds) and the stored programs. Defaults encode the
//! tuning of the reference robot; every physical platform is expected to
//! override them from `robot.toml`.

use heapless::{String, Vec};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::safety::{DEFAULT_SLICE_MS, DEFAULT_STOP_DEBOUNCE_MS};

/// Maximum program name length
pub const MAX_NAME_LEN: usize = 16;

/// Maximum instruction line length
pub const MAX_LINE_LEN: usize = 24;

/// Maximum lines per program
pub const MAX_PROGRAM_LINES: usize = 128;

/// Maximum programs per config
pub const MAX_PROGRAMS: usize = 8;

/// Open-loop motion tuning
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MotionConfig {
    /// Duty for straight drives (%)
    pub drive_duty: u8,
    /// Duty for fixed-duration turns (%)
    pub turn_duty: u8,
    /// Empirically calibrated duration of a fixed 90° turn (ms)
    pub turn_fixed_ms: u32,
    /// Main control cycle period (ms)
    pub cycle_ms: u32,
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            drive_duty: 70,
            turn_duty: 60,
            turn_fixed_ms: 420,
            cycle_ms: 5,
        }
    }
}

/// Closed-loop rotation tuning
///
/// Angles are tenths of a degree, duties are percent, times are ms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RotationConfig {
    /// Gain for clockwise (positive) commands (value × 1000)
    pub gain_cw_x1000: i32,
    /// Gain for counter-clockwise (negative) commands (value × 1000)
    pub gain_ccw_x1000: i32,
    /// Convergence tolerance
    pub tolerance_x10: i32,
    /// Consecutive in-tolerance samples required
    pub stable_samples: u8,
    /// Wrong-side error that latches the overshoot flag
    pub overshoot_x10: i32,
    /// Errors at or above this use the far zone
    pub far_x10: i32,
    /// Errors at or above this (and below far) use the mid zone
    pub mid_x10: i32,
    /// Errors at or above this (and below mid) use the near zone
    pub near_x10: i32,
    /// Static-friction kick before the loop starts
    pub kick_duty: u8,
    pub kick_ms: u32,
    /// Pause after the kick and between samples in tolerance
    pub settle_ms: u32,
    pub sample_ms: u32,
    /// Far zone sustained drive
    pub far_duty: u8,
    pub far_slice_ms: u32,
    /// Mid zone sustained drive
    pub mid_duty: u8,
    pub mid_slice_ms: u32,
    /// Kick level for near and micro pulses
    pub pulse_duty: u8,
    /// Hold level for near and micro pulses
    pub fine_duty: u8,
    /// Near zone pulse timing
    pub near_kick_ms: u32,
    pub near_hold_ms: u32,
    pub near_settle_ms: u32,
    /// Micro zone pulse count and timing
    pub micro_pulses: u8,
    pub micro_kick_ms: u32,
    pub micro_hold_ms: u32,
    pub micro_settle_ms: u32,
    /// Ceiling for one rotation
    pub timeout_ms: u32,
}

impl Default for RotationConfig {
    fn default() -> Self {
        Self {
            gain_cw_x1000: 1000,
            gain_ccw_x1000: 1000,
            tolerance_x10: 15,
            stable_samples: 3,
            overshoot_x10: 20,
            far_x10: 250,
            mid_x10: 100,
            near_x10: 60,
            kick_duty: 90,
            kick_ms: 40,
            settle_ms: 80,
            sample_ms: 20,
            far_duty: 75,
            far_slice_ms: 30,
            mid_duty: 55,
            mid_slice_ms: 20,
            pulse_duty: 70,
            fine_duty: 40,
            near_kick_ms: 25,
            near_hold_ms: 30,
            near_settle_ms: 60,
            micro_pulses: 3,
            micro_kick_ms: 12,
            micro_hold_ms: 8,
            micro_settle_ms: 40,
            timeout_ms: 9000,
        }
    }
}

/// Stop button tuning
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct StopConfig {
    /// Minimum interval between accepted stop edges (ms)
    pub debounce_ms: u32,
    /// Sleep slice of the interruptible delay (ms)
    pub slice_ms: u32,
}

impl Default for StopConfig {
    fn default() -> Self {
        Self {
            debounce_ms: DEFAULT_STOP_DEBOUNCE_MS,
            slice_ms: DEFAULT_SLICE_MS,
        }
    }
}

/// A named program of instruction lines
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ProgramConfig {
    /// Program name
    pub name: String<MAX_NAME_LEN>,
    /// Instruction lines, in order
    pub lines: Vec<String<MAX_LINE_LEN>, MAX_PROGRAM_LINES>,
}

impl ProgramConfig {
    /// Build a program from string slices
    ///
    /// Returns `None` if the name, a line, or the line count exceeds capacity.
    pub fn from_lines(name: &str, lines: &[&str]) -> Option<Self> {
        let mut program = Self {
            name: String::try_from(name).ok()?,
            lines: Vec::new(),
        };
        for line in lines {
            if !program.push_line(line) {
                return None;
            }
        }
        Some(program)
    }

    /// Append one instruction line
    ///
    /// Returns `false` if the line is too long or the program is full.
    pub fn push_line(&mut self, line: &str) -> bool {
        match String::try_from(line) {
            Ok(line) => self.lines.push(line).is_ok(),
            Err(_) => false,
        }
    }

    /// Number of lines
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Check if the program has no lines
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// Complete robot configuration
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RobotConfig {
    /// Open-loop motion tuning
    pub motion: MotionConfig,
    /// Closed-loop rotation tuning
    pub rotation: RotationConfig,
    /// Stop button tuning
    pub stop: StopConfig,
    /// Stored programs
    pub programs: Vec<ProgramConfig, MAX_PROGRAMS>,
}

impl RobotConfig {
    /// Create a configuration with default tuning and no programs
    pub fn new() -> Self {
        Self::default()
    }

    /// Find a program by name
    pub fn find_program(&self, name: &str) -> Option<&ProgramConfig> {
        self.programs.iter().find(|p| p.name.as_str() == name)
    }
}
