//! MPU-6050 yaw integrator
//!
//! Reads the gyro Z rate over I2C and integrates it into a heading.
//! Only the gyro is used; there is no magnetometer, so the heading is
//! relative to the orientation at the last reset and drifts slowly.
//!
//! At the ±250 °/s range one LSB is 1/131 °/s, so a raw rate held for
//! `dt` ms moves the heading by `raw * dt / 13_100` tenths of a degree.
//! The integral is kept in raw·ms to avoid rounding on every sample.
//!
//! Positive Z rate (counter-clockwise seen from above, sensor face up)
//! increases the heading.

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::I2c;
use scrawl_core::motion::{wrap180_x10, FULL_TURN_X10};
use scrawl_core::traits::{Clock, HeadingSensor};

/// MPU-6050 register addresses
pub mod reg {
    /// Sample rate divider
    pub const SMPLRT_DIV: u8 = 0x19;
    /// Digital low-pass filter
    pub const CONFIG: u8 = 0x1A;
    /// Gyro full-scale range
    pub const GYRO_CONFIG: u8 = 0x1B;
    /// Gyro Z rate, high byte (low byte follows)
    pub const GYRO_ZOUT_H: u8 = 0x47;
    /// Power management / clock source
    pub const PWR_MGMT_1: u8 = 0x6B;
    /// Device identity
    pub const WHO_AM_I: u8 = 0x75;
}

/// Default I2C address (AD0 low)
pub const DEFAULT_ADDRESS: u8 = 0x68;

/// Identity reported by the MPU-6050
const WHO_AM_I_MPU6050: u8 = 0x68;

/// PLL with X gyro reference, sleep off
const CLOCK_PLL_XGYRO: u8 = 0x01;

/// DLPF at ~44 Hz gyro bandwidth
const DLPF_44HZ: u8 = 0x03;

/// ±250 °/s full scale
const GYRO_FS_250: u8 = 0x00;

/// raw·ms per tenth of a degree at ±250 °/s
const UNITS_PER_X10: i64 = 13_100;

const UNITS_PER_TURN: i64 = UNITS_PER_X10 * FULL_TURN_X10 as i64;

/// Sensor errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SensorError {
    /// I2C transfer failed
    Bus,
    /// WHO_AM_I did not match
    UnknownDevice { who_am_i: u8 },
}

/// Gyro configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Mpu6050Config {
    /// I2C address
    pub address: u8,
    /// Sensor mounted upside down
    pub inverted: bool,
    /// Samples averaged for the bias estimate
    pub calibration_samples: u16,
    /// Delay between calibration samples (ms)
    pub calibration_interval_ms: u32,
    /// Bias-corrected rates with magnitude at or below this count as zero
    pub rate_deadband: i16,
}

impl Default for Mpu6050Config {
    fn default() -> Self {
        Self {
            address: DEFAULT_ADDRESS,
            inverted: false,
            calibration_samples: 500,
            calibration_interval_ms: 2,
            rate_deadband: 3,
        }
    }
}

/// Heading from integrated gyro Z rate
pub struct Mpu6050Heading<I, C> {
    i2c: I,
    clock: C,
    config: Mpu6050Config,
    /// Raw zero-rate offset
    bias: i32,
    /// Integrated rate (raw·ms), kept within one turn
    integral: i64,
    last_ms: u32,
    /// Failed reads since startup
    errors: u32,
}

impl<I: I2c, C: Clock> Mpu6050Heading<I, C> {
    pub fn new(i2c: I, clock: C, config: Mpu6050Config) -> Self {
        let last_ms = clock.now_ms();
        Self {
            i2c,
            clock,
            config,
            bias: 0,
            integral: 0,
            last_ms,
            errors: 0,
        }
    }

    /// Check the device identity and configure the gyro
    pub fn init(&mut self) -> Result<(), SensorError> {
        let who_am_i = self.read_reg(reg::WHO_AM_I)?;
        if who_am_i != WHO_AM_I_MPU6050 {
            return Err(SensorError::UnknownDevice { who_am_i });
        }

        self.write_reg(reg::PWR_MGMT_1, CLOCK_PLL_XGYRO)?;
        self.write_reg(reg::CONFIG, DLPF_44HZ)?;
        self.write_reg(reg::GYRO_CONFIG, GYRO_FS_250)?;
        self.write_reg(reg::SMPLRT_DIV, 0)?;

        #[cfg(feature = "defmt")]
        defmt::info!("mpu6050: ready at {=u8:#x}", self.config.address);

        Ok(())
    }

    /// Estimate the zero-rate bias; the robot must be still
    ///
    /// Also resets the heading to zero.
    pub fn calibrate<D: DelayNs>(&mut self, delay: &mut D) -> Result<i32, SensorError> {
        let samples = self.config.calibration_samples.max(1);
        let mut sum: i64 = 0;

        for _ in 0..samples {
            sum += self.read_rate_raw()? as i64;
            delay.delay_ms(self.config.calibration_interval_ms);
        }

        self.bias = (sum / samples as i64) as i32;
        self.reset_heading();

        #[cfg(feature = "defmt")]
        defmt::info!("mpu6050: gyro Z bias {}", self.bias);

        Ok(self.bias)
    }

    /// Zero the heading at the current orientation
    pub fn reset_heading(&mut self) {
        self.integral = 0;
        self.last_ms = self.clock.now_ms();
    }

    /// Read the raw Z rate
    pub fn read_rate_raw(&mut self) -> Result<i16, SensorError> {
        let mut buf = [0u8; 2];
        self.i2c
            .write_read(self.config.address, &[reg::GYRO_ZOUT_H], &mut buf)
            .map_err(|_| SensorError::Bus)?;
        Ok(i16::from_be_bytes(buf))
    }

    /// Sample the gyro and integrate since the last update
    ///
    /// A failed read drops the interval since the previous update.
    pub fn update(&mut self) -> Result<i32, SensorError> {
        let now = self.clock.now_ms();
        let raw = match self.read_rate_raw() {
            Ok(raw) => raw,
            Err(e) => {
                self.last_ms = now;
                return Err(e);
            }
        };
        let dt = now.wrapping_sub(self.last_ms);
        self.last_ms = now;

        let mut rate = raw as i32 - self.bias;
        if rate.abs() <= self.config.rate_deadband as i32 {
            rate = 0;
        }
        if self.config.inverted {
            rate = -rate;
        }

        self.integral = (self.integral + rate as i64 * dt as i64).rem_euclid(UNITS_PER_TURN);
        Ok(self.heading())
    }

    /// Heading as of the last update, tenths of a degree
    pub fn heading(&self) -> i32 {
        wrap180_x10((self.integral / UNITS_PER_X10) as i32)
    }

    pub fn bias(&self) -> i32 {
        self.bias
    }

    /// Failed reads since startup
    pub fn errors(&self) -> u32 {
        self.errors
    }

    fn count_error(&mut self) {
        self.errors = self.errors.saturating_add(1);
        #[cfg(feature = "defmt")]
        defmt::warn!("mpu6050: read failed ({} total)", self.errors);
    }

    fn read_reg(&mut self, reg: u8) -> Result<u8, SensorError> {
        let mut buf = [0u8; 1];
        self.i2c
            .write_read(self.config.address, &[reg], &mut buf)
            .map_err(|_| SensorError::Bus)?;
        Ok(buf[0])
    }

    fn write_reg(&mut self, reg: u8, value: u8) -> Result<(), SensorError> {
        self.i2c
            .write(self.config.address, &[reg, value])
            .map_err(|_| SensorError::Bus)
    }
}

impl<I: I2c, C: Clock> HeadingSensor for Mpu6050Heading<I, C> {
    /// Integrates a fresh sample; on a bus error the last heading is
    /// returned and the error counted.
    fn heading_x10(&mut self) -> i32 {
        match self.update() {
            Ok(heading) => heading,
            Err(_) => {
                self.count_error();
                self.heading()
            }
        }
    }

    fn refresh(&mut self) {
        if self.update().is_err() {
            self.count_error();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{MockClock, MockI2c, NoDelay};

    fn device() -> MockI2c {
        let mut i2c = MockI2c::new(DEFAULT_ADDRESS);
        i2c.regs[reg::WHO_AM_I as usize] = WHO_AM_I_MPU6050;
        i2c
    }

    #[test]
    fn test_init_configures_gyro() {
        let clock = MockClock::default();
        let mut gyro = Mpu6050Heading::new(device(), &clock, Mpu6050Config::default());

        gyro.init().unwrap();
        assert_eq!(gyro.i2c.regs[reg::PWR_MGMT_1 as usize], CLOCK_PLL_XGYRO);
        assert_eq!(gyro.i2c.regs[reg::CONFIG as usize], DLPF_44HZ);
        assert_eq!(gyro.i2c.regs[reg::GYRO_CONFIG as usize], GYRO_FS_250);
    }

    #[test]
    fn test_init_rejects_unknown_device() {
        let clock = MockClock::default();
        let mut i2c = device();
        i2c.regs[reg::WHO_AM_I as usize] = 0x12;
        let mut gyro = Mpu6050Heading::new(i2c, &clock, Mpu6050Config::default());

        assert_eq!(gyro.init(), Err(SensorError::UnknownDevice { who_am_i: 0x12 }));
    }

    #[test]
    fn test_init_bus_error() {
        let clock = MockClock::default();
        let mut i2c = device();
        i2c.nack = true;
        let mut gyro = Mpu6050Heading::new(i2c, &clock, Mpu6050Config::default());

        assert_eq!(gyro.init(), Err(SensorError::Bus));
    }

    #[test]
    fn test_bias_removed() {
        let clock = MockClock::default();
        let mut i2c = device();
        i2c.set_i16(reg::GYRO_ZOUT_H, -40);
        let mut gyro = Mpu6050Heading::new(i2c, &clock, Mpu6050Config::default());

        assert_eq!(gyro.calibrate(&mut NoDelay), Ok(-40));

        clock.advance(5000);
        assert_eq!(gyro.heading_x10(), 0);
    }

    #[test]
    fn test_integrates_rate() {
        let clock = MockClock::default();
        let mut gyro = Mpu6050Heading::new(device(), &clock, Mpu6050Config::default());

        // 1 °/s for one second
        gyro.i2c.set_i16(reg::GYRO_ZOUT_H, 131);
        clock.advance(1000);
        assert_eq!(gyro.heading_x10(), 10);

        // -10 °/s for two seconds
        gyro.i2c.set_i16(reg::GYRO_ZOUT_H, -1310);
        clock.advance(2000);
        assert_eq!(gyro.heading_x10(), -190);
    }

    #[test]
    fn test_heading_wraps() {
        let clock = MockClock::default();
        let mut gyro = Mpu6050Heading::new(device(), &clock, Mpu6050Config::default());

        // 100 °/s for two seconds = 200°, i.e. -160°
        gyro.i2c.set_i16(reg::GYRO_ZOUT_H, 13_100);
        clock.advance(2000);
        assert_eq!(gyro.heading_x10(), -1600);
    }

    #[test]
    fn test_inverted_mount() {
        let clock = MockClock::default();
        let config = Mpu6050Config {
            inverted: true,
            ..Default::default()
        };
        let mut gyro = Mpu6050Heading::new(device(), &clock, config);

        gyro.i2c.set_i16(reg::GYRO_ZOUT_H, 131);
        clock.advance(1000);
        assert_eq!(gyro.heading_x10(), -10);
    }

    #[test]
    fn test_read_error_keeps_last_heading() {
        let clock = MockClock::default();
        let mut gyro = Mpu6050Heading::new(device(), &clock, Mpu6050Config::default());

        gyro.i2c.set_i16(reg::GYRO_ZOUT_H, 131);
        clock.advance(1000);
        assert_eq!(gyro.heading_x10(), 10);

        gyro.i2c.nack = true;
        clock.advance(1000);
        assert_eq!(gyro.heading_x10(), 10);
        assert_eq!(gyro.errors(), 1);
    }

    #[test]
    fn test_read_error_interval_not_integrated() {
        let clock = MockClock::default();
        let mut gyro = Mpu6050Heading::new(device(), &clock, Mpu6050Config::default());

        gyro.i2c.set_i16(reg::GYRO_ZOUT_H, 131);
        clock.advance(1000);
        assert_eq!(gyro.heading_x10(), 10);

        gyro.i2c.nack = true;
        clock.advance(1000);
        gyro.refresh();
        assert_eq!(gyro.errors(), 1);

        // Only the second after the bus recovered counts
        gyro.i2c.nack = false;
        clock.advance(1000);
        assert_eq!(gyro.heading_x10(), 20);
    }

    #[test]
    fn test_refresh_integrates_between_reads() {
        let clock = MockClock::default();
        let mut gyro = Mpu6050Heading::new(device(), &clock, Mpu6050Config::default());

        // 100 °/s in 5 ms steps for 55 ms
        gyro.i2c.set_i16(reg::GYRO_ZOUT_H, 13_100);
        for _ in 0..11 {
            clock.advance(5);
            gyro.refresh();
        }

        // Stopped well before the next read
        gyro.i2c.set_i16(reg::GYRO_ZOUT_H, 0);
        clock.advance(60);
        assert_eq!(gyro.heading_x10(), 55);
        assert_eq!(gyro.errors(), 0);
    }
}
