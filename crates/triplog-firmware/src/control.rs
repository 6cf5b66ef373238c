//! The control-cycle task.
//!
//! Owns the engine and the SD medium, drives one ordered tick per period,
//! and publishes the presentation snapshot for whatever renders it.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::watch::Watch;
use embassy_time::{Duration, Instant, Ticker};
use esp_hal::gpio::Input;
use log::info;
use triplog_core::gps::GpsSample;
use triplog_core::session::TripLogger;
use triplog_core::status::LoggerView;

use crate::config::CONTROL_PERIOD_MS;
use crate::gps::GPS_SAMPLE;
use crate::pulse::PULSE_EDGES;
use crate::sd::SdMedium;

/// Presentation snapshot for an external display routine.
pub static LOGGER_VIEW: Watch<CriticalSectionRawMutex, LoggerView, 2> = Watch::new();

#[embassy_executor::task]
pub async fn control_task(mut medium: SdMedium, button: Input<'static>) {
    let mut logger = TripLogger::new();
    let mut gps_rx = GPS_SAMPLE.receiver().unwrap();
    let view_tx = LOGGER_VIEW.sender();
    let mut ticker = Ticker::every(Duration::from_millis(CONTROL_PERIOD_MS));
    let mut latest = GpsSample::new();

    info!("control cycle running");
    loop {
        ticker.next().await;
        if let Some(sample) = gps_rx.try_changed() {
            latest = sample;
        }
        let now_ms = Instant::now().as_millis();
        // The operator button is active-low.
        logger.tick(
            &mut medium,
            button.is_low(),
            &latest,
            PULSE_EDGES.snapshot(),
            now_ms,
        );
        view_tx.send(logger.view(now_ms));
    }
}
