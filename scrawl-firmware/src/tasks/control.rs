//! Control task
//!
//! Runs the supervisor once per cycle. The select button picks the
//! program (only while idle) and the run switch gates execution.

use defmt::*;
use embassy_rp::gpio::Input;
use embassy_time::Timer;

use scrawl_core::config::RobotConfig;
use scrawl_core::engine::{RunControl, Supervisor};
use scrawl_core::motion::RotationController;
use scrawl_core::program::{CycleSelector, ProgramLibrary};
use scrawl_core::traits::{ProgramSelector, StartTrigger};

use crate::board::{BoardRig, Button};
use crate::telemetry::LogSink;

/// Operator inputs owned by the control loop
pub struct ControlInputs {
    pub start: Button,
    pub select: Button,
    /// Closed (low) = run enabled
    pub run_switch: Input<'static>,
}

#[embassy_executor::task]
pub async fn control_task(config: &'static RobotConfig, mut robot: BoardRig, inputs: ControlInputs) {
    info!("Control task started");

    let ControlInputs {
        start,
        mut select,
        run_switch,
    } = inputs;

    let library = ProgramLibrary::new(&config.programs);
    let selector = CycleSelector::new(&config.programs);
    let rotation = RotationController::new(config.rotation);
    let mut supervisor = Supervisor::new(library, start, selector, config.motion, rotation);
    let mut sink = LogSink;

    if let Some(name) = supervisor.selector().selected() {
        info!("Selected program: {}", name);
    }

    let cycle_ms = config.motion.cycle_ms.max(1) as u64;
    let mut run_control = supervisor.run_control();

    loop {
        let wanted = if run_switch.is_low() {
            RunControl::Enabled
        } else {
            RunControl::Disabled
        };
        if wanted != run_control {
            info!("Run control: {}", wanted);
            run_control = wanted;
            supervisor.set_run_control(wanted);
        }

        if select.take_rising_edge() && !supervisor.engine().is_running() {
            if let Some(name) = supervisor.selector_mut().advance() {
                info!("Selected program: {}", name);
            }
        }

        supervisor.update(&mut robot, &mut sink);

        Timer::after_millis(cycle_ms).await;
    }
}
