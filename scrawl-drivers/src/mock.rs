//! Hand-written `embedded-hal` doubles for driver tests

use core::cell::Cell;
use core::convert::Infallible;

use embedded_hal::digital::{self, InputPin, OutputPin};
use embedded_hal::i2c::{self, ErrorKind, I2c, Operation, SevenBitAddress};
use embedded_hal::pwm::{self, SetDutyCycle};
use scrawl_core::traits::Clock;

#[derive(Debug, Default)]
pub struct MockPin {
    pub high: bool,
}

impl digital::ErrorType for MockPin {
    type Error = Infallible;
}

impl OutputPin for MockPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.high = false;
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.high = true;
        Ok(())
    }
}

impl InputPin for MockPin {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        Ok(self.high)
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        Ok(!self.high)
    }
}

#[derive(Debug, Default)]
pub struct MockPwm {
    pub duty: u16,
}

impl pwm::ErrorType for MockPwm {
    type Error = Infallible;
}

impl SetDutyCycle for MockPwm {
    fn max_duty_cycle(&self) -> u16 {
        1000
    }

    fn set_duty_cycle(&mut self, duty: u16) -> Result<(), Self::Error> {
        self.duty = duty;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Nack;

impl i2c::Error for Nack {
    fn kind(&self) -> ErrorKind {
        ErrorKind::NoAcknowledge(i2c::NoAcknowledgeSource::Address)
    }
}

/// Register-file I2C device
///
/// A write sets the register pointer from its first byte and stores the
/// rest; reads return registers from the pointer on.
#[derive(Debug)]
pub struct MockI2c {
    pub address: u8,
    pub regs: [u8; 128],
    pub nack: bool,
    pointer: usize,
}

impl MockI2c {
    pub fn new(address: u8) -> Self {
        Self {
            address,
            regs: [0; 128],
            nack: false,
            pointer: 0,
        }
    }

    /// Store a big-endian 16-bit value
    pub fn set_i16(&mut self, reg: u8, value: i16) {
        let bytes = value.to_be_bytes();
        self.regs[reg as usize] = bytes[0];
        self.regs[reg as usize + 1] = bytes[1];
    }
}

impl i2c::ErrorType for MockI2c {
    type Error = Nack;
}

impl I2c<SevenBitAddress> for MockI2c {
    fn transaction(&mut self, address: u8, operations: &mut [Operation<'_>]) -> Result<(), Self::Error> {
        if self.nack || address != self.address {
            return Err(Nack);
        }
        for op in operations {
            match op {
                Operation::Write(bytes) => {
                    if let Some((reg, data)) = bytes.split_first() {
                        self.pointer = *reg as usize;
                        for b in data {
                            self.regs[self.pointer % 128] = *b;
                            self.pointer += 1;
                        }
                    }
                }
                Operation::Read(buf) => {
                    for b in buf.iter_mut() {
                        *b = self.regs[self.pointer % 128];
                        self.pointer += 1;
                    }
                }
            }
        }
        Ok(())
    }
}

/// Clock the test moves by hand
#[derive(Debug, Default)]
pub struct MockClock {
    pub now: Cell<u32>,
}

impl MockClock {
    pub fn advance(&self, ms: u32) {
        self.now.set(self.now.get().wrapping_add(ms));
    }
}

impl Clock for MockClock {
    fn now_ms(&self) -> u32 {
        self.now.get()
    }
}

/// Delay that does nothing
pub struct NoDelay;

impl embedded_hal::delay::DelayNs for NoDelay {
    fn delay_ns(&mut self, _ns: u32) {}
}
