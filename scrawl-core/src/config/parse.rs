//! `robot.toml` reader
//!
//! Line-oriented reader for the TOML subset `robot.toml` uses. It needs no
//! allocator: everything lands in heapless storage.
//!
//! Supported features:
//! - Key = integer pairs (`_` separators allowed)
//! - `[section]` headers and `[program.name]` / `[program name]` headers
//! - String arrays, on one line or spread over several lines
//! - Comments (# ...)
//!
//! NOT supported:
//! - Escapes inside strings
//! - Floats, datetimes, inline tables
//! - Dotted keys outside section headers

use heapless::String;

use super::types::{
    MotionConfig, ProgramConfig, RobotConfig, RotationConfig, StopConfig, MAX_NAME_LEN,
};

/// Parse error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ParseError {
    /// Invalid or unknown section header
    InvalidSection,
    /// Invalid value type or out of range
    InvalidValue,
    /// Key not valid in this section
    UnknownKey,
    /// Too many items (exceeded heapless capacity)
    TooManyItems,
    /// Array opened but never closed
    UnterminatedArray,
    /// Two programs with the same name
    DuplicateProgram,
}

/// Current parsing context
#[derive(Debug, Clone, PartialEq, Eq)]
enum Section {
    Root,
    Motion,
    Rotation,
    Stop,
    Program(String<MAX_NAME_LEN>),
}

/// Parse TOML configuration into RobotConfig
pub fn parse_config(input: &str) -> Result<RobotConfig, ParseError> {
    let mut config = RobotConfig::new();
    let mut section = Section::Root;
    let mut current_program: Option<ProgramConfig> = None;
    // Inside a multi-line `lines = [` array
    let mut in_array = false;

    for line in input.lines() {
        let line = line.trim();

        if in_array {
            let program = current_program.as_mut().ok_or(ParseError::InvalidValue)?;
            in_array = !push_array_items(line, program)?;
            continue;
        }

        // Skip empty lines and comments
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        // Check for section header
        if line.starts_with('[') && line.ends_with(']') {
            save_program(&mut config, &mut current_program)?;

            section = parse_section_header(&line[1..line.len() - 1])?;

            if let Section::Program(name) = &section {
                if config.find_program(name).is_some() {
                    return Err(ParseError::DuplicateProgram);
                }
                current_program = Some(ProgramConfig {
                    name: name.clone(),
                    ..Default::default()
                });
            }
            continue;
        }

        // Parse key = value
        let (key, value) = parse_key_value(line).ok_or(ParseError::InvalidValue)?;
        match &section {
            Section::Root => return Err(ParseError::UnknownKey),
            Section::Motion => apply_motion(&mut config.motion, key, value)?,
            Section::Rotation => apply_rotation(&mut config.rotation, key, value)?,
            Section::Stop => apply_stop(&mut config.stop, key, value)?,
            Section::Program(_) => {
                if key != "lines" {
                    return Err(ParseError::UnknownKey);
                }
                let program = current_program.as_mut().ok_or(ParseError::InvalidSection)?;
                let rest = value.strip_prefix('[').ok_or(ParseError::InvalidValue)?;
                in_array = !push_array_items(rest, program)?;
            }
        }
    }

    if in_array {
        return Err(ParseError::UnterminatedArray);
    }

    save_program(&mut config, &mut current_program)?;

    Ok(config)
}

/// Parse section header like "rotation", "program.square" or "program square"
fn parse_section_header(header: &str) -> Result<Section, ParseError> {
    let header = header.trim();

    let (section_type, name) = match header.split_once('.') {
        Some((kind, name)) => (kind.trim(), Some(name.trim())),
        None => {
            let mut parts = header.split_whitespace();
            let kind = parts.next().ok_or(ParseError::InvalidSection)?;
            (kind, parts.next())
        }
    };

    match (section_type, name) {
        ("motion", None) => Ok(Section::Motion),
        ("rotation", None) => Ok(Section::Rotation),
        ("stop", None) => Ok(Section::Stop),
        ("program", Some(name)) if !name.is_empty() && !name.contains('.') => {
            let name = String::try_from(name).map_err(|_| ParseError::InvalidSection)?;
            Ok(Section::Program(name))
        }
        _ => Err(ParseError::InvalidSection),
    }
}

/// Parse "key = value" line
fn parse_key_value(line: &str) -> Option<(&str, &str)> {
    let eq_pos = line.find('=')?;
    let key = line[..eq_pos].trim();
    let value = line[eq_pos + 1..].trim();

    // Remove inline comments
    let value = if let Some(hash_pos) = value.find('#') {
        // Make sure # is not inside a string
        let quote_count = value[..hash_pos].matches('"').count();
        if quote_count % 2 == 0 {
            value[..hash_pos].trim()
        } else {
            value
        }
    } else {
        value
    };

    if key.is_empty() || value.is_empty() {
        return None;
    }

    Some((key, value))
}

/// Collect quoted items from (part of) a string array
///
/// Returns `true` once the closing bracket has been consumed.
fn push_array_items(chunk: &str, program: &mut ProgramConfig) -> Result<bool, ParseError> {
    let mut item_start: Option<usize> = None;

    for (i, c) in chunk.char_indices() {
        match (item_start, c) {
            (None, '"') => item_start = Some(i + 1),
            (Some(start), '"') => {
                if !program.push_line(&chunk[start..i]) {
                    return Err(ParseError::TooManyItems);
                }
                item_start = None;
            }
            (Some(_), _) => {}
            (None, ']') => {
                // Only a comment may follow the closing bracket
                let rest = chunk[i + 1..].trim();
                if rest.is_empty() || rest.starts_with('#') {
                    return Ok(true);
                }
                return Err(ParseError::InvalidValue);
            }
            (None, '#') => return Ok(false),
            (None, ',') => {}
            (None, c) if c.is_whitespace() => {}
            (None, _) => return Err(ParseError::InvalidValue),
        }
    }

    if item_start.is_some() {
        // Strings may not span lines
        return Err(ParseError::InvalidValue);
    }

    Ok(false)
}

/// Parse an integer value, allowing `_` separators (`9_000`)
fn parse_int<T: core::str::FromStr>(value: &str) -> Result<T, ParseError> {
    let mut digits: String<16> = String::new();
    for c in value.chars().filter(|c| *c != '_') {
        digits.push(c).map_err(|_| ParseError::InvalidValue)?;
    }
    digits.parse().map_err(|_| ParseError::InvalidValue)
}

/// Parse a duty percentage (0-100)
fn parse_duty(value: &str) -> Result<u8, ParseError> {
    let duty: u8 = parse_int(value)?;
    if duty > 100 {
        return Err(ParseError::InvalidValue);
    }
    Ok(duty)
}

fn apply_motion(motion: &mut MotionConfig, key: &str, value: &str) -> Result<(), ParseError> {
    match key {
        "drive_duty" => motion.drive_duty = parse_duty(value)?,
        "turn_duty" => motion.turn_duty = parse_duty(value)?,
        "turn_fixed_ms" => motion.turn_fixed_ms = parse_int(value)?,
        "cycle_ms" => motion.cycle_ms = parse_int(value)?,
        _ => return Err(ParseError::UnknownKey),
    }
    Ok(())
}

fn apply_rotation(rotation: &mut RotationConfig, key: &str, value: &str) -> Result<(), ParseError> {
    match key {
        "gain_cw_x1000" => rotation.gain_cw_x1000 = parse_int(value)?,
        "gain_ccw_x1000" => rotation.gain_ccw_x1000 = parse_int(value)?,
        "tolerance_x10" => rotation.tolerance_x10 = parse_int(value)?,
        "stable_samples" => rotation.stable_samples = parse_int(value)?,
        "overshoot_x10" => rotation.overshoot_x10 = parse_int(value)?,
        "far_x10" => rotation.far_x10 = parse_int(value)?,
        "mid_x10" => rotation.mid_x10 = parse_int(value)?,
        "near_x10" => rotation.near_x10 = parse_int(value)?,
        "kick_duty" => rotation.kick_duty = parse_duty(value)?,
        "kick_ms" => rotation.kick_ms = parse_int(value)?,
        "settle_ms" => rotation.settle_ms = parse_int(value)?,
        "sample_ms" => rotation.sample_ms = parse_int(value)?,
        "far_duty" => rotation.far_duty = parse_duty(value)?,
        "far_slice_ms" => rotation.far_slice_ms = parse_int(value)?,
        "mid_duty" => rotation.mid_duty = parse_duty(value)?,
        "mid_slice_ms" => rotation.mid_slice_ms = parse_int(value)?,
        "pulse_duty" => rotation.pulse_duty = parse_duty(value)?,
        "fine_duty" => rotation.fine_duty = parse_duty(value)?,
        "near_kick_ms" => rotation.near_kick_ms = parse_int(value)?,
        "near_hold_ms" => rotation.near_hold_ms = parse_int(value)?,
        "near_settle_ms" => rotation.near_settle_ms = parse_int(value)?,
        "micro_pulses" => rotation.micro_pulses = parse_int(value)?,
        "micro_kick_ms" => rotation.micro_kick_ms = parse_int(value)?,
        "micro_hold_ms" => rotation.micro_hold_ms = parse_int(value)?,
        "micro_settle_ms" => rotation.micro_settle_ms = parse_int(value)?,
        "timeout_ms" => rotation.timeout_ms = parse_int(value)?,
        _ => return Err(ParseError::UnknownKey),
    }
    Ok(())
}

fn apply_stop(stop: &mut StopConfig, key: &str, value: &str) -> Result<(), ParseError> {
    match key {
        "debounce_ms" => stop.debounce_ms = parse_int(value)?,
        "slice_ms" => {
            let slice: u32 = parse_int(value)?;
            if slice == 0 {
                return Err(ParseError::InvalidValue);
            }
            stop.slice_ms = slice;
        }
        _ => return Err(ParseError::UnknownKey),
    }
    Ok(())
}

/// Move a finished program section into the config
fn save_program(
    config: &mut RobotConfig,
    current: &mut Option<ProgramConfig>,
) -> Result<(), ParseError> {
    if let Some(program) = current.take() {
        config
            .programs
            .push(program)
            .map_err(|_| ParseError::TooManyItems)?;
    }
    Ok(())
}
