//! Board wiring
//!
//! RP2040 (Pico) with a TB6612FNG dual H-bridge, a servo-less pen on a
//! logic output, an MPU-6050 on I2C0 and three push buttons.
//!
//! | function        | pin   |
//! |-----------------|-------|
//! | left AIN1/AIN2  | GP2/3 |
//! | left PWMA       | GP4   |
//! | right PWMB      | GP5   |
//! | right BIN1/BIN2 | GP6/7 |
//! | bridge STBY     | GP8   |
//! | pen             | GP9   |
//! | run switch      | GP12  |
//! | select button   | GP13  |
//! | start button    | GP14  |
//! | stop button     | GP15  |
//! | I2C0 SDA/SCL    | GP16/17 |

use embassy_rp::gpio::{Input, Output};
use embassy_rp::i2c::{Blocking, I2c};
use embassy_rp::peripherals::I2C0;
use embassy_rp::pwm::PwmOutput;
use embassy_time::{Delay, Instant};

use scrawl_core::traits::Clock;
use scrawl_core::Rig;
use scrawl_drivers::input::DebouncedButton;
use scrawl_drivers::marker::PenMarker;
use scrawl_drivers::motor::{DcMotor, DcMotorConfig, DifferentialDrive};
use scrawl_drivers::sensor::Mpu6050Heading;

/// PWM counter top: 125 MHz / (6249 + 1) = 20 kHz, above hearing
pub const PWM_TOP: u16 = 6_249;

/// I2C0 bus speed
pub const I2C_FREQUENCY: u32 = 400_000;

/// The right motor is mounted mirrored
pub const LEFT_MOTOR: DcMotorConfig = DcMotorConfig {
    min_duty: 20,
    reversed: false,
};
pub const RIGHT_MOTOR: DcMotorConfig = DcMotorConfig {
    min_duty: 20,
    reversed: true,
};

/// Pen output is active high
pub const PEN_ACTIVE_LOW: bool = false;

pub type Motor = DcMotor<Output<'static>, Output<'static>, PwmOutput<'static>>;
pub type Drive = DifferentialDrive<Motor, Motor, Output<'static>>;
pub type Pen = PenMarker<Output<'static>>;
pub type Gyro = Mpu6050Heading<I2c<'static, I2C0, Blocking>, EmbassyClock>;
pub type Button = DebouncedButton<Input<'static>>;
pub type BoardRig = Rig<'static, Drive, Pen, Gyro, EmbassyClock, Delay>;

/// Millisecond clock from the embassy time driver
#[derive(Debug, Clone, Copy, Default)]
pub struct EmbassyClock;

impl Clock for EmbassyClock {
    fn now_ms(&self) -> u32 {
        Instant::now().as_millis() as u32
    }
}
