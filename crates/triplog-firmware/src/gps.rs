//! GPS UART reader.
//!
//! Assembles raw receiver bytes into sentences, feeds them to the external
//! NMEA decoder, and publishes validity-flagged [`GpsSample`] snapshots for
//! the control cycle. No parsing happens here; the decoder's validated
//! output fields are mapped one-to-one onto the sample.

use chrono::{Datelike, Timelike};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::watch::Watch;
use embassy_time::Instant;
use embedded_io_async::Read;
use esp_hal::uart::UartRx;
use esp_hal::Async;
use heapless::Vec;
use log::info;
use nmea::Nmea;
use triplog_core::gps::GpsSample;

use crate::config::{GPS_LINE_MAX, GPS_LINK_TIMEOUT_MS};

const MPH_PER_KNOT: f32 = 1.150_779;

/// Latest receiver snapshot: written here, read by the control cycle.
pub static GPS_SAMPLE: Watch<CriticalSectionRawMutex, GpsSample, 2> = Watch::new();

#[embassy_executor::task]
pub async fn gps_task(mut rx: UartRx<'static, Async>) {
    let mut decoder = Nmea::default();
    let mut line: Vec<u8, GPS_LINE_MAX> = Vec::new();
    let mut buf = [0u8; 64];
    let mut last_byte_ms: u64 = 0;
    let mut last_fix_ms: Option<u64> = None;
    let sender = GPS_SAMPLE.sender();

    info!("gps reader running");
    loop {
        match rx.read(&mut buf).await {
            Ok(0) => {}
            Ok(count) => {
                let now_ms = Instant::now().as_millis();
                last_byte_ms = now_ms;
                for &byte in &buf[..count] {
                    if byte == b'\n' {
                        if let Ok(sentence) = core::str::from_utf8(&line) {
                            if decoder.parse(sentence.trim_end()).is_ok()
                                && decoder.latitude.is_some()
                            {
                                last_fix_ms = Some(now_ms);
                            }
                        }
                        line.clear();
                    } else if line.push(byte).is_err() {
                        // Longer than any sentence; resync on the next line.
                        line.clear();
                    }
                }
                sender.send(build_sample(&decoder, now_ms, last_byte_ms, last_fix_ms));
            }
            Err(_) => {
                // Receiver hiccup; the link indicator ages out on its own.
            }
        }
    }
}

fn build_sample(
    decoder: &Nmea,
    now_ms: u64,
    last_byte_ms: u64,
    last_fix_ms: Option<u64>,
) -> GpsSample {
    let mut sample = GpsSample::new();
    sample.link_ok = now_ms.saturating_sub(last_byte_ms) < GPS_LINK_TIMEOUT_MS;
    sample.fix_age_ms = match last_fix_ms {
        Some(at_ms) => now_ms.saturating_sub(at_ms).min(u32::MAX as u64) as u32,
        None => u32::MAX,
    };
    if let (Some(lat), Some(lon)) = (decoder.latitude, decoder.longitude) {
        sample.location_valid = true;
        sample.lat_microdeg = (lat * 1_000_000.0) as i32;
        sample.lon_microdeg = (lon * 1_000_000.0) as i32;
    }
    if let Some(knots) = decoder.speed_over_ground {
        sample.speed_valid = true;
        sample.speed_mph = (knots * MPH_PER_KNOT + 0.5) as i16;
    }
    if let Some(date) = decoder.fix_date {
        sample.date_valid = true;
        sample.year = date.year().clamp(0, 9_999) as u16;
        sample.month = date.month() as u8;
        sample.day = date.day() as u8;
    }
    if let Some(time) = decoder.fix_time {
        sample.time_valid = true;
        sample.hour = time.hour() as u8;
        sample.minute = time.minute() as u8;
        sample.second = time.second() as u8;
    }
    if let Some(count) = decoder.num_of_fix_satellites {
        sample.sats_valid = true;
        sample.satellites = count.min(99) as u8;
    }
    sample
}
