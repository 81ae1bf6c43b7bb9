//! Robot context passed through the motion stack
//!
//! Primitives, the engine and the rotation controller are generic over
//! [`Robot`], which bundles every collaborator they need for one cycle.
//! [`Rig`] is the production implementation built from the individual
//! hardware traits; tests substitute a simulated robot.

use embedded_hal::delay::DelayNs;

use crate::safety::{Interrupted, InterruptibleDelay, StopFlag};
use crate::traits::{Clock, DriveActuator, HeadingSensor, MarkerActuator, Motion};

/// Everything the motion logic may touch during a cycle
pub trait Robot {
    /// Drive with a motion at a duty percentage (re-enables the driver if needed)
    fn drive(&mut self, motion: Motion, duty: u8);

    /// Stop the wheels, leaving the driver enabled
    fn halt(&mut self);

    /// Stop the wheels and disable the driver
    fn emergency_stop(&mut self);

    /// Lower or raise the marker
    fn set_marker(&mut self, down: bool);

    /// Fresh heading sample in tenths of a degree
    fn heading_x10(&mut self) -> i32;

    /// Current time in milliseconds
    fn now_ms(&self) -> u32;

    /// Stop-aware blocking wait
    fn wait_ms(&mut self, ms: u32) -> Result<(), Interrupted>;

    /// Check if a stop has been requested
    fn stop_requested(&self) -> bool;

    /// Acknowledge a stop request after a full stop
    fn clear_stop(&mut self);

    /// Milliseconds elapsed since `since`
    fn elapsed_ms(&self, since: u32) -> u32 {
        self.now_ms().wrapping_sub(since)
    }
}

/// Production robot assembled from hardware drivers
pub struct Rig<'a, A, M, H, C, D> {
    drive: A,
    marker: M,
    heading: H,
    delay: InterruptibleDelay<'a, C, D>,
}

impl<'a, A, M, H, C, D> Rig<'a, A, M, H, C, D>
where
    A: DriveActuator,
    M: MarkerActuator,
    H: HeadingSensor,
    C: Clock,
    D: DelayNs,
{
    /// Assemble a rig
    ///
    /// `slice_ms` is the sleep slice of the interruptible delay.
    pub fn new(
        drive: A,
        marker: M,
        heading: H,
        clock: C,
        delay: D,
        stop: &'a StopFlag,
        slice_ms: u32,
    ) -> Self {
        Self {
            drive,
            marker,
            heading,
            delay: InterruptibleDelay::new(clock, delay, stop).with_slice_ms(slice_ms),
        }
    }

    /// Access the drive
    pub fn drive_actuator(&self) -> &A {
        &self.drive
    }

    /// Access the marker
    pub fn marker(&self) -> &M {
        &self.marker
    }

    /// Access the heading sensor
    pub fn heading_sensor(&self) -> &H {
        &self.heading
    }
}

impl<A, M, H, C, D> Robot for Rig<'_, A, M, H, C, D>
where
    A: DriveActuator,
    M: MarkerActuator,
    H: HeadingSensor,
    C: Clock,
    D: DelayNs,
{
    fn drive(&mut self, motion: Motion, duty: u8) {
        if !self.drive.is_enabled() {
            self.drive.set_enabled(true);
        }
        self.drive.command(motion, duty);
    }

    fn halt(&mut self) {
        self.drive.stop();
    }

    fn emergency_stop(&mut self) {
        self.drive.stop();
        self.drive.set_enabled(false);
    }

    fn set_marker(&mut self, down: bool) {
        self.marker.set_marker(down);
    }

    fn heading_x10(&mut self) -> i32 {
        self.heading.heading_x10()
    }

    fn now_ms(&self) -> u32 {
        self.delay.now_ms()
    }

    fn wait_ms(&mut self, ms: u32) -> Result<(), Interrupted> {
        let heading = &mut self.heading;
        self.delay.wait_ms_with(ms, &mut self.drive, || heading.refresh())
    }

    fn stop_requested(&self) -> bool {
        self.delay.stop_requested()
    }

    fn clear_stop(&mut self) {
        self.delay.clear_stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::cell::Cell;

    struct StepClock<'a>(&'a Cell<u32>);

    impl Clock for StepClock<'_> {
        fn now_ms(&self) -> u32 {
            self.0.get()
        }
    }

    struct StepDelay<'a>(&'a Cell<u32>);

    impl DelayNs for StepDelay<'_> {
        fn delay_ns(&mut self, ns: u32) {
            self.0.set(self.0.get() + ns / 1_000_000);
        }
    }

    #[derive(Default)]
    struct Drive {
        enabled: bool,
        last: Option<(Motion, u8)>,
    }

    impl DriveActuator for Drive {
        fn command(&mut self, motion: Motion, duty: u8) {
            if self.enabled {
                self.last = Some((motion, duty));
            }
        }
        fn stop(&mut self) {
            self.last = None;
        }
        fn set_enabled(&mut self, enabled: bool) {
            self.enabled = enabled;
        }
        fn is_enabled(&self) -> bool {
            self.enabled
        }
    }

    #[derive(Default)]
    struct Pen(bool);

    impl MarkerActuator for Pen {
        fn set_marker(&mut self, down: bool) {
            self.0 = down;
        }
        fn is_marking(&self) -> bool {
            self.0
        }
    }

    struct Gyro(i32);

    impl HeadingSensor for Gyro {
        fn heading_x10(&mut self) -> i32 {
            self.0
        }
    }

    /// Counts refreshes and their timestamps
    struct CountingGyro<'a> {
        time: &'a Cell<u32>,
        refreshed_at: heapless::Vec<u32, 16>,
    }

    impl HeadingSensor for CountingGyro<'_> {
        fn heading_x10(&mut self) -> i32 {
            0
        }
        fn refresh(&mut self) {
            let _ = self.refreshed_at.push(self.time.get());
        }
    }

    #[test]
    fn test_drive_reenables_after_emergency_stop() {
        let time = Cell::new(0);
        let stop = StopFlag::default();
        let mut rig = Rig::new(
            Drive::default(),
            Pen::default(),
            Gyro(450),
            StepClock(&time),
            StepDelay(&time),
            &stop,
            2,
        );

        rig.drive(Motion::Forward, 60);
        assert_eq!(rig.drive_actuator().last, Some((Motion::Forward, 60)));

        rig.emergency_stop();
        assert!(!rig.drive_actuator().is_enabled());
        assert_eq!(rig.drive_actuator().last, None);

        rig.drive(Motion::SpinLeft, 40);
        assert!(rig.drive_actuator().is_enabled());
        assert_eq!(rig.drive_actuator().last, Some((Motion::SpinLeft, 40)));
    }

    #[test]
    fn test_wait_advances_clock_and_honours_stop() {
        let time = Cell::new(0);
        let stop = StopFlag::default();
        let mut rig = Rig::new(
            Drive::default(),
            Pen::default(),
            Gyro(0),
            StepClock(&time),
            StepDelay(&time),
            &stop,
            2,
        );

        assert_eq!(rig.wait_ms(20), Ok(()));
        assert_eq!(rig.now_ms(), 20);

        stop.signal(rig.now_ms());
        assert!(rig.stop_requested());
        assert_eq!(rig.wait_ms(20), Err(Interrupted));

        rig.clear_stop();
        assert!(!rig.stop_requested());
    }

    #[test]
    fn test_marker_and_heading_passthrough() {
        let time = Cell::new(0);
        let stop = StopFlag::default();
        let mut rig = Rig::new(
            Drive::default(),
            Pen::default(),
            Gyro(-1234),
            StepClock(&time),
            StepDelay(&time),
            &stop,
            2,
        );

        rig.set_marker(true);
        assert!(rig.marker().is_marking());
        assert_eq!(rig.heading_x10(), -1234);
    }

    #[test]
    fn test_wait_refreshes_heading_every_slice() {
        let time = Cell::new(0);
        let stop = StopFlag::default();
        let gyro = CountingGyro {
            time: &time,
            refreshed_at: heapless::Vec::new(),
        };
        let mut rig = Rig::new(
            Drive::default(),
            Pen::default(),
            gyro,
            StepClock(&time),
            StepDelay(&time),
            &stop,
            2,
        );

        assert_eq!(rig.wait_ms(10), Ok(()));
        assert_eq!(rig.heading_sensor().refreshed_at.as_slice(), &[2, 4, 6, 8, 10]);
    }
}
