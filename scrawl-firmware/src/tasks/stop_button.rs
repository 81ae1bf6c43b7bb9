//! Stop button task
//!
//! Waits for falling edges on the stop input and raises the shared stop
//! flag. The flag debounces re-triggers itself; this task touches no
//! actuator.

use defmt::*;
use embassy_rp::gpio::Input;
use embassy_time::Instant;

use scrawl_core::safety::StopFlag;

#[embassy_executor::task]
pub async fn stop_button_task(mut pin: Input<'static>, stop: &'static StopFlag) {
    info!("Stop button task started");

    loop {
        pin.wait_for_falling_edge().await;

        let now_ms = Instant::now().as_millis() as u32;
        if stop.signal(now_ms) {
            warn!("Stop requested at {} ms", now_ms);
        } else {
            trace!("Stop edge ignored (bounce)");
        }
    }
}
