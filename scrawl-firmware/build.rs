//! Build script for scrawl-firmware
//!
//! - Sets up linker search paths for memory.x
//! - Validates robot.toml at compile time

use std::env;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Limits of the firmware's fixed-capacity config storage
const MAX_PROGRAMS: usize = 8;
const MAX_PROGRAM_LINES: usize = 128;
const MAX_NAME_LEN: usize = 16;
const MAX_LINE_LEN: usize = 24;

/// Longest timed instruction (ms)
const MAX_DURATION_MS: i64 = 60_000;

fn main() {
    setup_linker();
    validate_config();
}

/// Set up linker search paths for memory.x
fn setup_linker() {
    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());

    // Copy memory.x to the output directory
    let memory_x = include_bytes!("memory.x");
    let mut f = File::create(out_dir.join("memory.x")).unwrap();
    f.write_all(memory_x).unwrap();

    // Tell rustc where to find memory.x
    println!("cargo:rustc-link-search={}", out_dir.display());

    println!("cargo:rerun-if-changed=memory.x");
    println!("cargo:rerun-if-changed=build.rs");
}

/// Validate robot.toml configuration at compile time
fn validate_config() {
    println!("cargo:rerun-if-changed=robot.toml");

    let config_path = Path::new("robot.toml");

    if !config_path.exists() {
        panic!(
            "\n\
            ╔══════════════════════════════════════════════════════════════════╗\n\
            ║  ERROR: robot.toml not found!                                    ║\n\
            ║                                                                  ║\n\
            ║  The firmware embeds robot.toml (tuning and programs).           ║\n\
            ║  Please create one in the scrawl-firmware directory.             ║\n\
            ╚══════════════════════════════════════════════════════════════════╝\n"
        );
    }

    let config_content = match fs::read_to_string(config_path) {
        Ok(content) => content,
        Err(e) => {
            panic!(
                "\n\
                ╔══════════════════════════════════════════════════════════════════╗\n\
                ║  ERROR: Failed to read robot.toml                                ║\n\
                ║                                                                  ║\n\
                ║  Error: {:<56} ║\n\
                ╚══════════════════════════════════════════════════════════════════╝\n",
                e
            );
        }
    };

    let config: toml::Value = match toml::from_str(&config_content) {
        Ok(value) => value,
        Err(e) => {
            let error_msg = e.to_string();
            panic!(
                "\n\
                ╔══════════════════════════════════════════════════════════════════╗\n\
                ║  ERROR: Invalid TOML syntax in robot.toml                        ║\n\
                ╠══════════════════════════════════════════════════════════════════╣\n\
                ║                                                                  ║\n\
                {}\n\
                ║                                                                  ║\n\
                ╚══════════════════════════════════════════════════════════════════╝\n",
                format_error_lines(&error_msg)
            );
        }
    };

    let mut errors = Vec::new();
    validate_sections(&config, &mut errors);
    validate_tuning(&config, &mut errors);
    validate_programs(&config, &mut errors);
    report("Invalid robot configuration", &errors);

    println!("cargo:warning=robot.toml validated successfully");
}

/// Format error message lines with box drawing
fn format_error_lines(msg: &str) -> String {
    msg.lines()
        .map(|line| {
            let truncated = if line.len() > 64 {
                format!("{}...", &line[..61])
            } else {
                line.to_string()
            };
            format!("║  {:<64} ║", truncated)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn report(title: &str, errors: &[String]) {
    if errors.is_empty() {
        return;
    }
    panic!(
        "\n\
        ╔══════════════════════════════════════════════════════════════════╗\n\
        ║  ERROR: {:<56} ║\n\
        ╠══════════════════════════════════════════════════════════════════╣\n\
        {}\n\
        ╚══════════════════════════════════════════════════════════════════╝\n",
        title,
        errors
            .iter()
            .map(|e| format!("║  • {:<62} ║", e))
            .collect::<Vec<_>>()
            .join("\n")
    );
}

/// Only the sections the firmware parser understands may appear
fn validate_sections(config: &toml::Value, errors: &mut Vec<String>) {
    let Some(root) = config.as_table() else {
        return;
    };

    for (name, value) in root {
        match name.as_str() {
            "motion" | "rotation" | "stop" | "program" => {
                if !value.is_table() {
                    errors.push(format!("[{}] must be a table", name));
                }
            }
            _ => errors.push(format!("unknown section or key '{}'", name)),
        }
    }

    if config.get("program").is_none() {
        errors.push("Missing [program.*] section - at least one program is required".into());
    }
}

/// Keys that hold duty percentages
const DUTY_KEYS: &[&str] = &[
    "drive_duty",
    "turn_duty",
    "kick_duty",
    "far_duty",
    "mid_duty",
    "pulse_duty",
    "fine_duty",
];

const MOTION_KEYS: &[&str] = &["drive_duty", "turn_duty", "turn_fixed_ms", "cycle_ms"];

const ROTATION_KEYS: &[&str] = &[
    "gain_cw_x1000",
    "gain_ccw_x1000",
    "tolerance_x10",
    "stable_samples",
    "overshoot_x10",
    "far_x10",
    "mid_x10",
    "near_x10",
    "kick_duty",
    "kick_ms",
    "settle_ms",
    "sample_ms",
    "far_duty",
    "far_slice_ms",
    "mid_duty",
    "mid_slice_ms",
    "pulse_duty",
    "fine_duty",
    "near_kick_ms",
    "near_hold_ms",
    "near_settle_ms",
    "micro_pulses",
    "micro_kick_ms",
    "micro_hold_ms",
    "micro_settle_ms",
    "timeout_ms",
];

const STOP_KEYS: &[&str] = &["debounce_ms", "slice_ms"];

/// Check [motion], [rotation] and [stop] keys and ranges
fn validate_tuning(config: &toml::Value, errors: &mut Vec<String>) {
    for (section, keys) in [
        ("motion", MOTION_KEYS),
        ("rotation", ROTATION_KEYS),
        ("stop", STOP_KEYS),
    ] {
        let Some(table) = config.get(section).and_then(|s| s.as_table()) else {
            continue;
        };

        for (key, value) in table {
            if !keys.contains(&key.as_str()) {
                errors.push(format!("[{}] unknown key '{}'", section, key));
                continue;
            }

            let Some(n) = value.as_integer() else {
                errors.push(format!("[{}] {} must be an integer", section, key));
                continue;
            };

            if DUTY_KEYS.contains(&key.as_str()) && !(0..=100).contains(&n) {
                errors.push(format!("[{}] {} must be 0-100", section, key));
            } else if n < 0 && !key.starts_with("gain") {
                errors.push(format!("[{}] {} must not be negative", section, key));
            }
        }
    }

    if let Some(rotation) = config.get("rotation").and_then(|r| r.as_table()) {
        let get = |key: &str| rotation.get(key).and_then(|v| v.as_integer());
        if let (Some(far), Some(mid), Some(near)) = (get("far_x10"), get("mid_x10"), get("near_x10")) {
            if !(far > mid && mid > near) {
                errors.push("[rotation] zones must satisfy far_x10 > mid_x10 > near_x10".into());
            }
        }
        if get("stable_samples") == Some(0) {
            errors.push("[rotation] stable_samples must be at least 1".into());
        }
    }

    if let Some(stop) = config.get("stop").and_then(|s| s.as_table()) {
        if stop.get("slice_ms").and_then(|v| v.as_integer()) == Some(0) {
            errors.push("[stop] slice_ms must be at least 1".into());
        }
    }
}

/// Check program names, sizes and every instruction line
fn validate_programs(config: &toml::Value, errors: &mut Vec<String>) {
    let Some(programs) = config.get("program").and_then(|p| p.as_table()) else {
        return;
    };

    if programs.len() > MAX_PROGRAMS {
        errors.push(format!("at most {} programs are supported", MAX_PROGRAMS));
    }

    for (name, program) in programs {
        if name.len() > MAX_NAME_LEN {
            errors.push(format!("[program.{}] name longer than {}", name, MAX_NAME_LEN));
        }

        let Some(program) = program.as_table() else {
            errors.push(format!("[program.{}] must be a table", name));
            continue;
        };

        for key in program.keys().filter(|k| k.as_str() != "lines") {
            errors.push(format!("[program.{}] unknown key '{}'", name, key));
        }

        let lines = match program.get("lines") {
            Some(toml::Value::Array(lines)) => lines,
            Some(_) => {
                errors.push(format!("[program.{}] lines must be an array", name));
                continue;
            }
            None => {
                errors.push(format!("[program.{}] missing 'lines'", name));
                continue;
            }
        };

        if lines.len() > MAX_PROGRAM_LINES {
            errors.push(format!(
                "[program.{}] more than {} lines",
                name, MAX_PROGRAM_LINES
            ));
        }

        for (i, line) in lines.iter().enumerate() {
            let Some(line) = line.as_str() else {
                errors.push(format!("[program.{}] line {} must be a string", name, i + 1));
                continue;
            };
            if line.len() > MAX_LINE_LEN {
                errors.push(format!(
                    "[program.{}] line {} longer than {}",
                    name,
                    i + 1,
                    MAX_LINE_LEN
                ));
            }
            if let Err(e) = check_instruction(line) {
                errors.push(format!("[program.{}] line {}: {}", name, i + 1, e));
            }
        }
    }
}

/// Mirror of the runtime instruction grammar
///
/// The runtime skips bad lines with a warning; here they fail the build.
fn check_instruction(line: &str) -> Result<(), String> {
    let code = line.split('#').next().unwrap_or("");
    let mut tokens = code.split_whitespace();

    let Some(op) = tokens.next() else {
        return Ok(());
    };

    match op {
        "F" | "B" | "P" | "W" => {
            let arg = tokens.next().ok_or(format!("'{}' needs a duration", op))?;
            if !arg.bytes().all(|b| b.is_ascii_digit()) {
                return Err(format!("invalid duration '{}'", arg));
            }
            let ms: i64 = arg
                .parse()
                .map_err(|_| format!("invalid duration '{}'", arg))?;
            if ms > MAX_DURATION_MS {
                return Err(format!("duration must be 0-{}", MAX_DURATION_MS));
            }
        }
        "R" => {
            let arg = tokens.next().ok_or("'R' needs an angle")?;
            let digits = arg.trim_start_matches(['-', '+']);
            let (whole, tenths) = digits.split_once('.').unwrap_or((digits, "0"));
            let well_formed = !whole.is_empty()
                && whole.len() <= 4
                && tenths.len() == 1
                && whole.bytes().chain(tenths.bytes()).all(|b| b.is_ascii_digit())
                && digits.len() + 1 >= arg.len();
            if !well_formed {
                return Err(format!("invalid angle '{}'", arg));
            }
            let whole: i64 = whole.parse().unwrap_or(i64::MAX);
            if whole * 10 + i64::from(tenths.as_bytes()[0] - b'0') > 3600 {
                return Err("angle must be within ±360".into());
            }
        }
        "L" | "TL" | "TR" | "paintON" | "paintOFF" | "penDown" | "penUp" => {}
        _ => return Err(format!("unknown instruction '{}'", op)),
    }

    match tokens.next() {
        Some(extra) => Err(format!("unexpected '{}'", extra)),
        None => Ok(()),
    }
}
