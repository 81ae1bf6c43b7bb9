//! Hardware driver implementations
//!
//! This crate provides concrete implementations of the traits defined
//! in scrawl-core on top of `embedded-hal` 1.0:
//!
//! - Motor drivers (DC motor on an H-bridge channel, differential drive)
//! - Marker output (pen solenoid or paint pump)
//! - Debounced buttons (start / program select)
//! - Heading sensor (MPU-6050 gyro integration)

#![no_std]
#![deny(unsafe_code)]

pub mod input;
pub mod marker;
pub mod motor;
pub mod sensor;

#[cfg(test)]
mod mock;
