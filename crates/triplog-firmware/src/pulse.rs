//! Pulse-edge capture.
//!
//! Each falling edge of the sensor input is timestamped into the shared
//! capture cell and nothing else happens here: bounce rejection is a single
//! compare inside the cell, and all rate arithmetic stays in the core
//! sampler.

use embassy_time::Instant;
use esp_hal::gpio::Input;
use triplog_core::rpm::EdgeCapture;

/// Edge timestamps shared with the control cycle.
pub static PULSE_EDGES: EdgeCapture = EdgeCapture::new();

#[embassy_executor::task]
pub async fn pulse_task(mut pin: Input<'static>) {
    loop {
        pin.wait_for_falling_edge().await;
        PULSE_EDGES.on_edge(Instant::now().as_millis());
    }
}
