//! Sensor implementations

pub mod mpu6050;

pub use mpu6050::{Mpu6050Config, Mpu6050Heading, SensorError};
