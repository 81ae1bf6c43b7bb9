//! Simulated robot for host tests
//!
//! `SimRobot` keeps a virtual millisecond clock that only moves inside
//! waits (or [`SimRobot::advance`]), a log of every actuator command, and
//! one of two heading sources:
//!
//! - a spin model: while a spin is commanded, the heading moves by
//!   `(duty - deadband)` units per millisecond, 20 units per tenth of a
//!   degree, so duties at or below the deadband do not move the robot
//! - a script of heading samples, returned one per read (the last one
//!   repeats once the script runs out)

use core::cell::Cell;

use heapless::Vec;

use crate::motion::wrap180_x10;
use crate::robot::Robot;
use crate::safety::{Interrupted, StopFlag, DEFAULT_SLICE_MS};
use crate::traits::{Motion, ProgramSelector, StartTrigger};

/// Duty at or below which the simulated wheels do not turn
pub const SIM_DEADBAND: u8 = 30;

/// Model units per tenth of a degree
const SPIN_SCALE: i32 = 20;

/// Commands captured by the simulated robot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimCommand {
    Drive(Motion, u8),
    Halt,
    EmergencyStop,
    Marker(bool),
}

pub struct SimRobot {
    now_ms: u32,
    spin_units: i32,
    script: Vec<i32, 64>,
    script_pos: usize,
    motion: Option<(Motion, u8)>,
    enabled: bool,
    marking: bool,
    commands: Vec<SimCommand, 1024>,
    stop: StopFlag,
    stop_at_ms: Option<u32>,
    stop_fired: Cell<bool>,
    heading_reads: u32,
}

impl Default for SimRobot {
    fn default() -> Self {
        Self::new()
    }
}

impl SimRobot {
    /// Robot on the spin model, heading 0
    pub fn new() -> Self {
        Self {
            now_ms: 0,
            spin_units: 0,
            script: Vec::new(),
            script_pos: 0,
            motion: None,
            enabled: true,
            marking: false,
            commands: Vec::new(),
            stop: StopFlag::new(0),
            stop_at_ms: None,
            stop_fired: Cell::new(false),
            heading_reads: 0,
        }
    }

    /// Robot returning scripted heading samples
    pub fn with_headings(samples: &[i32]) -> Self {
        let mut robot = Self::new();
        for sample in samples {
            robot.script.push(*sample).unwrap();
        }
        robot
    }

    /// Assert the stop flag once the clock reaches `ms`
    pub fn stop_at(mut self, ms: u32) -> Self {
        self.stop_at_ms = Some(ms);
        self
    }

    /// Assert the stop flag now, as the interrupt handler would
    pub fn press_stop(&self) {
        self.stop.signal(self.now_ms);
    }

    /// Let virtual time pass, integrating any commanded spin
    pub fn advance(&mut self, ms: u32) {
        if let (true, Some((motion, duty))) = (self.enabled, self.motion) {
            let rate = duty.saturating_sub(SIM_DEADBAND) as i32 * ms as i32;
            match motion {
                Motion::SpinLeft => self.spin_units += rate,
                Motion::SpinRight => self.spin_units -= rate,
                Motion::Forward | Motion::Backward => {}
            }
        }
        self.now_ms = self.now_ms.wrapping_add(ms);
    }

    pub fn now(&self) -> u32 {
        self.now_ms
    }

    /// Modelled heading (ignores the script)
    pub fn heading(&self) -> i32 {
        wrap180_x10(self.spin_units / SPIN_SCALE)
    }

    pub fn commands(&self) -> &[SimCommand] {
        &self.commands
    }

    pub fn clear_commands(&mut self) {
        self.commands.clear();
    }

    /// Number of drive commands with the given motion
    pub fn drive_count(&self, motion: Motion) -> usize {
        self.commands
            .iter()
            .filter(|c| matches!(c, SimCommand::Drive(m, _) if *m == motion))
            .count()
    }

    pub fn current_motion(&self) -> Option<Motion> {
        self.motion.map(|(m, _)| m)
    }

    pub fn is_moving(&self) -> bool {
        self.enabled && self.motion.is_some()
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn is_marking(&self) -> bool {
        self.marking
    }

    pub fn heading_reads(&self) -> u32 {
        self.heading_reads
    }

    fn log(&mut self, command: SimCommand) {
        if self.commands.is_full() {
            self.commands.remove(0);
        }
        let _ = self.commands.push(command);
    }

    fn sync_stop(&self) {
        if let Some(at) = self.stop_at_ms {
            if !self.stop_fired.get() && self.now_ms >= at {
                self.stop_fired.set(true);
                self.stop.signal(self.now_ms);
            }
        }
    }
}

impl Robot for SimRobot {
    fn drive(&mut self, motion: Motion, duty: u8) {
        self.enabled = true;
        self.motion = Some((motion, duty));
        self.log(SimCommand::Drive(motion, duty));
    }

    fn halt(&mut self) {
        self.motion = None;
        self.log(SimCommand::Halt);
    }

    fn emergency_stop(&mut self) {
        self.motion = None;
        self.enabled = false;
        self.log(SimCommand::EmergencyStop);
    }

    fn set_marker(&mut self, down: bool) {
        self.marking = down;
        self.log(SimCommand::Marker(down));
    }

    fn heading_x10(&mut self) -> i32 {
        self.heading_reads += 1;
        if self.script.is_empty() {
            return self.heading();
        }
        let sample = self.script[self.script_pos.min(self.script.len() - 1)];
        self.script_pos += 1;
        sample
    }

    fn now_ms(&self) -> u32 {
        self.now_ms
    }

    fn wait_ms(&mut self, ms: u32) -> Result<(), Interrupted> {
        let start = self.now_ms;
        loop {
            if self.stop_requested() {
                self.emergency_stop();
                return Err(Interrupted);
            }
            let elapsed = self.now_ms.wrapping_sub(start);
            if elapsed >= ms {
                return Ok(());
            }
            self.advance((ms - elapsed).min(DEFAULT_SLICE_MS));
        }
    }

    fn stop_requested(&self) -> bool {
        self.sync_stop();
        self.stop.is_engaged()
    }

    fn clear_stop(&mut self) {
        self.stop.clear();
    }
}

/// Start trigger with queued rising edges
#[derive(Default)]
pub struct SimTrigger {
    pending: u32,
}

impl SimTrigger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue one rising edge for the next call
    pub fn press(&mut self) {
        self.pending += 1;
    }
}

impl StartTrigger for SimTrigger {
    fn take_rising_edge(&mut self) -> bool {
        if self.pending == 0 {
            return false;
        }
        self.pending -= 1;
        true
    }
}

/// Selector that always names the same program
pub struct FixedSelector(pub Option<&'static str>);

impl ProgramSelector for FixedSelector {
    fn selected(&self) -> Option<&str> {
        self.0
    }
}
