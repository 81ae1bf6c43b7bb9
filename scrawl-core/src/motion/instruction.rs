//! Instruction line parsing
//!
//! One program line holds one instruction: a case-sensitive token followed
//! by an optional numeric argument and an optional `#` comment.
//!
//! | line              | instruction                      |
//! |-------------------|----------------------------------|
//! | `F <ms>`          | drive forward                    |
//! | `B <ms>`          | drive backward                   |
//! | `L`, `TL`, `TR`   | fixed-duration turn              |
//! | `R <deg>`         | closed-loop turn, + is clockwise |
//! | `P <ms>`, `W <ms>`| pause                            |
//! | `paintON`/`penDown`, `paintOFF`/`penUp` | marker     |

use core::str::FromStr;

use crate::traits::Motion;

/// Longest accepted timed instruction (ms)
pub const MAX_DURATION_MS: u32 = 60_000;

/// Largest accepted rotation magnitude (tenths of a degree)
pub const MAX_ANGLE_X10: i32 = 3600;

/// Direction of a fixed-duration turn
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Turn {
    Left,
    Right,
}

impl Turn {
    /// Spin motion that performs this turn
    pub fn motion(self) -> Motion {
        match self {
            Turn::Left => Motion::SpinLeft,
            Turn::Right => Motion::SpinRight,
        }
    }
}

/// A parsed program instruction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Instruction {
    /// Drive straight (Forward or Backward) for a duration
    Drive { motion: Motion, duration_ms: u32 },
    /// Open-loop turn of the calibrated fixed duration
    TurnFixed(Turn),
    /// Closed-loop turn by an angle; positive is clockwise
    Rotate { angle_x10: i32 },
    /// Stop all actuation for a duration
    Pause { duration_ms: u32 },
    /// Lower (`true`) or raise the marker
    Marker { down: bool },
}

/// Why a line did not produce an instruction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum InstructionError {
    /// Blank line or comment only
    Empty,
    /// First token is not a known instruction
    UnknownToken,
    /// Token needs an argument that is absent
    MissingArgument,
    /// Argument is not a number or out of range
    InvalidArgument,
    /// Extra tokens after a complete instruction
    TrailingInput,
}

impl Instruction {
    /// Parse one program line
    pub fn parse(line: &str) -> Result<Self, InstructionError> {
        let line = match line.find('#') {
            Some(pos) => &line[..pos],
            None => line,
        };

        let mut tokens = line.split_whitespace();
        let token = tokens.next().ok_or(InstructionError::Empty)?;
        let arg = tokens.next();

        let instruction = match token {
            "F" => Instruction::Drive {
                motion: Motion::Forward,
                duration_ms: parse_duration(arg)?,
            },
            "B" => Instruction::Drive {
                motion: Motion::Backward,
                duration_ms: parse_duration(arg)?,
            },
            "P" | "W" => Instruction::Pause {
                duration_ms: parse_duration(arg)?,
            },
            "R" => Instruction::Rotate {
                angle_x10: parse_angle_x10(arg.ok_or(InstructionError::MissingArgument)?)?,
            },
            "L" | "TL" => no_argument(arg, Instruction::TurnFixed(Turn::Left))?,
            "TR" => no_argument(arg, Instruction::TurnFixed(Turn::Right))?,
            "paintON" | "penDown" => no_argument(arg, Instruction::Marker { down: true })?,
            "paintOFF" | "penUp" => no_argument(arg, Instruction::Marker { down: false })?,
            _ => return Err(InstructionError::UnknownToken),
        };

        if tokens.next().is_some() {
            return Err(InstructionError::TrailingInput);
        }

        Ok(instruction)
    }
}

impl FromStr for Instruction {
    type Err = InstructionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

fn no_argument(arg: Option<&str>, instruction: Instruction) -> Result<Instruction, InstructionError> {
    match arg {
        Some(_) => Err(InstructionError::TrailingInput),
        None => Ok(instruction),
    }
}

fn parse_duration(arg: Option<&str>) -> Result<u32, InstructionError> {
    let arg = arg.ok_or(InstructionError::MissingArgument)?;
    if !arg.bytes().all(|b| b.is_ascii_digit()) {
        return Err(InstructionError::InvalidArgument);
    }
    let ms: u32 = arg.parse().map_err(|_| InstructionError::InvalidArgument)?;
    if ms > MAX_DURATION_MS {
        return Err(InstructionError::InvalidArgument);
    }
    Ok(ms)
}

/// Parse degrees with at most one decimal into tenths
///
/// `"90"` → 900, `"-12.5"` → -125.
fn parse_angle_x10(arg: &str) -> Result<i32, InstructionError> {
    let (negative, digits) = match arg.as_bytes().first() {
        Some(b'-') => (true, &arg[1..]),
        Some(b'+') => (false, &arg[1..]),
        _ => (false, arg),
    };

    let (whole, tenths) = match digits.split_once('.') {
        Some((whole, frac)) if frac.len() == 1 => (whole, frac),
        Some(_) => return Err(InstructionError::InvalidArgument),
        None => (digits, "0"),
    };

    if whole.is_empty()
        || whole.len() > 4
        || !whole.bytes().all(|b| b.is_ascii_digit())
        || !tenths.bytes().all(|b| b.is_ascii_digit())
    {
        return Err(InstructionError::InvalidArgument);
    }

    let whole: i32 = whole.parse().map_err(|_| InstructionError::InvalidArgument)?;
    let tenths: i32 = tenths.parse().map_err(|_| InstructionError::InvalidArgument)?;
    let magnitude = whole * 10 + tenths;

    if magnitude > MAX_ANGLE_X10 {
        return Err(InstructionError::InvalidArgument);
    }

    Ok(if negative { -magnitude } else { magnitude })
}
