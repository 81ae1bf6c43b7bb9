//! Program supervisor
//!
//! Owns the run-control flag, the start trigger, the program selector and
//! the engine, and combines them once per main-loop cycle:
//!
//! 1. A pending stop request cancels the program, stops and disables the
//!    drive, and is acknowledged.
//! 2. A start edge is accepted only when run control is enabled and no
//!    program is running. The selected program is opened from the catalog
//!    and handed to the engine.
//! 3. While enabled, the engine is polled once.

use super::executor::{Engine, RunState};
use crate::config::MotionConfig;
use crate::motion::RotationController;
use crate::robot::Robot;
use crate::status::{program_name, Status, StatusSink};
use crate::traits::{ProgramCatalog, ProgramSelector, StartTrigger};

/// Run control flag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RunControl {
    Enabled,
    Disabled,
}

/// Arbitrates start requests and drives the engine
pub struct Supervisor<C: ProgramCatalog, T, P> {
    catalog: C,
    trigger: T,
    selector: P,
    engine: Engine<C::Source>,
    run_control: RunControl,
    /// Drive halted because run control dropped mid-program
    held: bool,
}

impl<C, T, P> Supervisor<C, T, P>
where
    C: ProgramCatalog,
    T: StartTrigger,
    P: ProgramSelector,
{
    /// Create a supervisor with run control enabled
    pub fn new(
        catalog: C,
        trigger: T,
        selector: P,
        motion: MotionConfig,
        rotation: RotationController,
    ) -> Self {
        Self {
            catalog,
            trigger,
            selector,
            engine: Engine::new(motion, rotation),
            run_control: RunControl::Enabled,
            held: false,
        }
    }

    /// Set run control
    ///
    /// While disabled, start edges are refused and a running program is
    /// held: its drive is stopped and the engine is not polled.
    pub fn set_run_control(&mut self, run_control: RunControl) {
        self.run_control = run_control;
    }

    pub fn run_control(&self) -> RunControl {
        self.run_control
    }

    pub fn engine(&self) -> &Engine<C::Source> {
        &self.engine
    }

    pub fn trigger_mut(&mut self) -> &mut T {
        &mut self.trigger
    }

    pub fn selector(&self) -> &P {
        &self.selector
    }

    pub fn selector_mut(&mut self) -> &mut P {
        &mut self.selector
    }

    /// Run one supervisor cycle
    pub fn update<R: Robot, K: StatusSink>(&mut self, robot: &mut R, sink: &mut K) -> RunState {
        if robot.stop_requested() {
            self.engine.cancel(robot);
            robot.emergency_stop();
            robot.clear_stop();
            self.held = false;
            #[cfg(feature = "defmt")]
            defmt::warn!("supervisor: stop engaged");
            sink.report(Status::StopEngaged);
            return self.engine.state();
        }

        if self.trigger.take_rising_edge() {
            sink.report(Status::StartAcknowledged);
            self.handle_start(robot, sink);
        }

        match self.run_control {
            RunControl::Enabled => {
                if self.held {
                    self.engine.resume(robot);
                    self.held = false;
                }
                let was_running = self.engine.is_running();
                let state = self.engine.poll(robot, sink);
                if was_running && state == RunState::FinishedAll {
                    #[cfg(feature = "defmt")]
                    defmt::info!("supervisor: program finished");
                    sink.report(Status::ProgramFinished);
                }
                state
            }
            RunControl::Disabled => {
                if self.engine.is_running() && !self.held {
                    self.engine.hold(robot);
                    self.held = true;
                }
                self.engine.state()
            }
        }
    }

    fn handle_start<R: Robot, K: StatusSink>(&mut self, robot: &mut R, sink: &mut K) {
        if self.run_control == RunControl::Disabled {
            sink.report(Status::RunBlocked);
            return;
        }

        if self.engine.is_running() {
            sink.report(Status::AlreadyRunning);
            return;
        }

        let Some(name) = self.selector.selected() else {
            sink.report(Status::ProgramNotFound(program_name("")));
            return;
        };

        match self.catalog.open(name) {
            Ok(source) => {
                #[cfg(feature = "defmt")]
                defmt::info!("supervisor: starting {=str}", name);
                self.engine.begin(source, robot);
                sink.report(Status::ProgramStarted(program_name(name)));
            }
            Err(_) => {
                #[cfg(feature = "defmt")]
                defmt::warn!("supervisor: program {=str} not found", name);
                sink.report(Status::ProgramNotFound(program_name(name)));
            }
        }
    }
}
