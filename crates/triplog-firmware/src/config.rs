//! Firmware configuration.
//!
//! Pin roles are assigned in `bin/main.rs` where the peripherals are
//! claimed; everything here is timing and bus tuning.

/// GPS receiver baud rate.
pub const GPS_BAUD: u32 = 9_600;

/// Longest NMEA sentence the line assembler will hold before resyncing.
pub const GPS_LINE_MAX: usize = 128;

/// Receiver counts as connected while bytes arrive within this window.
pub const GPS_LINK_TIMEOUT_MS: u64 = 3_000;

/// Control cycle period; every polled component is paced internally on top
/// of this.
pub const CONTROL_PERIOD_MS: u64 = 10;

/// SD bus clock. Kept at the discovery-safe rate: the record trickle is a
/// few hundred bytes per flush, far below what even this rate sustains.
pub const SD_FREQ_KHZ: u32 = 400;
