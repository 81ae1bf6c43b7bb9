//! Scrawl - Drawing Robot Firmware
//!
//! Main firmware binary for the RP2040-based drawing robot. Replays the
//! motion programs stored in `robot.toml` (drive, turn, pause, pen up/down)
//! with gyro-closed turns, and stays interruptible by the stop button.

#![no_std]
#![no_main]

use defmt::*;
use embassy_executor::{InterruptExecutor, Spawner};
use embassy_rp::gpio::{Input, Level, Output, Pull};
use embassy_rp::i2c::{self, I2c};
use embassy_rp::interrupt;
use embassy_rp::interrupt::{InterruptExt, Priority};
use embassy_rp::pwm::{Config as PwmConfig, Pwm};
use embassy_time::{Delay, Timer};
use static_cell::StaticCell;
use {defmt_rtt as _, panic_probe as _};

use scrawl_core::config::{parse_config, ProgramConfig, RobotConfig};
use scrawl_core::safety::StopFlag;
use scrawl_core::Rig;
use scrawl_drivers::input::{ButtonConfig, DebouncedButton};
use scrawl_drivers::marker::PenMarker;
use scrawl_drivers::motor::{DcMotor, DifferentialDrive};
use scrawl_drivers::sensor::{Mpu6050Config, Mpu6050Heading};

use crate::board::EmbassyClock;

/// Embedded configuration (compiled into firmware)
/// Edit robot.toml and rebuild to customize
const EMBEDDED_CONFIG: &str = include_str!("../robot.toml");

mod board;
mod tasks;
mod telemetry;

// Configuration and stop flag must live forever for task references
static CONFIG: StaticCell<RobotConfig> = StaticCell::new();
static STOP: StaticCell<StopFlag> = StaticCell::new();

/// Preempts the thread executor, which blocks during closed-loop turns
static EXECUTOR_STOP: InterruptExecutor = InterruptExecutor::new();

#[interrupt]
unsafe fn SWI_IRQ_1() {
    EXECUTOR_STOP.on_interrupt()
}

/// Main entry point
#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("Scrawl firmware starting...");

    let p = embassy_rp::init(Default::default());
    info!("Peripherals initialized");

    let config: &'static RobotConfig = CONFIG.init_with(load_config);
    info!(
        "Configuration loaded: {} programs, cycle {} ms",
        config.programs.len(),
        config.motion.cycle_ms
    );

    let stop: &'static StopFlag = STOP.init(StopFlag::new(config.stop.debounce_ms));

    // Stop button first, so it is live before anything can move
    let stop_pin = Input::new(p.PIN_15, Pull::Up);
    interrupt::SWI_IRQ_1.set_priority(Priority::P2);
    let stop_spawner = EXECUTOR_STOP.start(interrupt::SWI_IRQ_1);
    stop_spawner
        .spawn(tasks::stop_button_task(stop_pin, stop))
        .unwrap();

    // TB6612FNG: PWMA on GP4 and PWMB on GP5 share PWM slice 2
    let mut pwm_config = PwmConfig::default();
    pwm_config.top = board::PWM_TOP;
    pwm_config.compare_a = 0;
    pwm_config.compare_b = 0;
    let pwm = Pwm::new_output_ab(p.PWM_SLICE2, p.PIN_4, p.PIN_5, pwm_config);
    let (Some(pwm_left), Some(pwm_right)) = pwm.split() else {
        defmt::panic!("PWM slice 2 outputs unavailable");
    };

    let left = DcMotor::new(
        Output::new(p.PIN_2, Level::Low),
        Output::new(p.PIN_3, Level::Low),
        pwm_left,
        board::LEFT_MOTOR,
    );
    let right = DcMotor::new(
        Output::new(p.PIN_6, Level::Low),
        Output::new(p.PIN_7, Level::Low),
        pwm_right,
        board::RIGHT_MOTOR,
    );
    let drive = DifferentialDrive::new(left, right, Output::new(p.PIN_8, Level::Low));
    let pen = PenMarker::new(Output::new(p.PIN_9, Level::Low), board::PEN_ACTIVE_LOW);
    info!("Drive and pen initialized");

    // Gyro: the robot must stand still while the bias is estimated
    let mut i2c_config = i2c::Config::default();
    i2c_config.frequency = board::I2C_FREQUENCY;
    let i2c = I2c::new_blocking(p.I2C0, p.PIN_17, p.PIN_16, i2c_config);
    let mut gyro = Mpu6050Heading::new(i2c, EmbassyClock, Mpu6050Config::default());
    if let Err(e) = gyro.init() {
        defmt::panic!("Gyro init failed: {}", e);
    }
    match gyro.calibrate(&mut Delay) {
        Ok(bias) => info!("Gyro calibrated, bias {}", bias),
        Err(e) => defmt::panic!("Gyro calibration failed: {}", e),
    }

    let robot = Rig::new(
        drive,
        pen,
        gyro,
        EmbassyClock,
        Delay,
        stop,
        config.stop.slice_ms,
    );

    let inputs = tasks::ControlInputs {
        start: DebouncedButton::new(Input::new(p.PIN_14, Pull::Up), ButtonConfig::default()),
        select: DebouncedButton::new(Input::new(p.PIN_13, Pull::Up), ButtonConfig::default()),
        run_switch: Input::new(p.PIN_12, Pull::Up),
    };

    spawner
        .spawn(tasks::control_task(config, robot, inputs))
        .unwrap();

    info!("All tasks spawned, firmware running");

    loop {
        Timer::after_secs(60).await;
        trace!("Main loop heartbeat");
    }
}

/// Parse the embedded robot.toml
///
/// build.rs validates the file, so the fallback only matters when the
/// validator and the firmware parser disagree.
fn load_config() -> RobotConfig {
    match parse_config(EMBEDDED_CONFIG) {
        Ok(config) => {
            info!("Parsed embedded configuration successfully");
            config
        }
        Err(e) => {
            error!("Failed to parse embedded config: {}", e);
            error!("Using minimal fallback configuration");
            create_minimal_fallback_config()
        }
    }
}

/// Default tuning and a single square program
fn create_minimal_fallback_config() -> RobotConfig {
    let mut config = RobotConfig::new();

    let square = [
        "paintON", "F 1000", "R 90", "F 1000", "R 90", "F 1000", "R 90", "F 1000", "R 90",
        "paintOFF",
    ];
    if let Some(program) = ProgramConfig::from_lines("square", &square) {
        let _ = config.programs.push(program);
    }

    config
}
