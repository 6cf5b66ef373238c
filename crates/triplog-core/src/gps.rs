//! Snapshot of the positioning collaborator.
//!
//! The receiver decoder lives outside this crate; the engine only ever sees
//! an immutable, validity-flagged sample taken at the moment a record is
//! built. A field whose validity flag is false is logged as zero (or -1 for
//! speed).

use crate::config::SPEED_MAX_MPH;

/// One poll of the positioning receiver.
///
/// Coordinates are fixed-point microdegrees so that the six-decimal record
/// format maps onto them exactly, with no float rounding in the log path.
#[derive(Clone, Copy, Debug, Default)]
pub struct GpsSample {
    pub location_valid: bool,
    pub lat_microdeg: i32,
    pub lon_microdeg: i32,
    pub speed_valid: bool,
    pub speed_mph: i16,
    pub date_valid: bool,
    pub year: u16,
    pub month: u8,
    pub day: u8,
    pub time_valid: bool,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
    pub sats_valid: bool,
    pub satellites: u8,
    /// Age of the current fix in milliseconds.
    pub fix_age_ms: u32,
    /// Bytes have arrived from the receiver recently. Presentation only.
    pub link_ok: bool,
}

impl GpsSample {
    pub const fn new() -> Self {
        Self {
            location_valid: false,
            lat_microdeg: 0,
            lon_microdeg: 0,
            speed_valid: false,
            speed_mph: 0,
            date_valid: false,
            year: 0,
            month: 0,
            day: 0,
            time_valid: false,
            hour: 0,
            minute: 0,
            second: 0,
            sats_valid: false,
            satellites: 0,
            fix_age_ms: 0,
            link_ok: false,
        }
    }

    /// Packed second-of-day, the sampling edge for once-per-second logging.
    pub fn second_of_day(&self) -> Option<u32> {
        self.time_valid
            .then(|| self.hour as u32 * 3600 + self.minute as u32 * 60 + self.second as u32)
    }

    /// Whether the fix is good enough to build a record from.
    pub fn loggable(&self, min_satellites: u8) -> bool {
        self.location_valid
            && self.time_valid
            && self.sats_valid
            && self.satellites >= min_satellites
    }

    /// Speed field for the record: clamped mph, or the -1 unknown sentinel.
    pub fn speed_for_log(&self) -> i16 {
        if self.speed_valid {
            self.speed_mph.clamp(0, SPEED_MAX_MPH)
        } else {
            -1
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_of_day_needs_valid_time() {
        let mut sample = GpsSample::new();
        assert_eq!(sample.second_of_day(), None);

        sample.time_valid = true;
        sample.hour = 12;
        sample.minute = 34;
        sample.second = 56;
        assert_eq!(sample.second_of_day(), Some(12 * 3600 + 34 * 60 + 56));
    }

    #[test]
    fn speed_sentinel_when_unknown() {
        let mut sample = GpsSample::new();
        assert_eq!(sample.speed_for_log(), -1);

        sample.speed_valid = true;
        sample.speed_mph = 65;
        assert_eq!(sample.speed_for_log(), 65);

        sample.speed_mph = 12_000;
        assert_eq!(sample.speed_for_log(), SPEED_MAX_MPH);
    }

    #[test]
    fn loggable_requires_fix_and_satellites() {
        let mut sample = GpsSample::new();
        sample.location_valid = true;
        sample.time_valid = true;
        sample.sats_valid = true;
        sample.satellites = 3;
        assert!(!sample.loggable(4));

        sample.satellites = 4;
        assert!(sample.loggable(4));

        sample.location_valid = false;
        assert!(!sample.loggable(4));
    }
}
