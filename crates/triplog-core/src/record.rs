//! Fixed-width record formatting and the bounded in-memory buffer.
//!
//! Every record occupies exactly [`RECORD_WIDTH`] bytes regardless of field
//! magnitude: fields are clamped, the tail is space padding, and the final
//! byte is always the newline. Fixed sizing keeps memory use predictable
//! and makes a flush a single contiguous write of `count * RECORD_WIDTH`
//! bytes.

use core::fmt::{self, Write};

use crate::config::{RECORD_BUFFER_CAPACITY, RECORD_WIDTH, RPM_DISPLAY_MAX};
use crate::gps::GpsSample;

/// Header line written once at the top of every log file.
pub const RECORD_HEADER: &[u8] = b"lat,lon,speed_mph,UTC_datetime,RPM\n";

/// One space-padded, newline-terminated log line.
#[derive(Clone, Copy)]
pub struct Record {
    bytes: [u8; RECORD_WIDTH],
}

impl Record {
    /// Format a record from a positioning sample and the period RPM average.
    pub fn format(gps: &GpsSample, rpm: u32) -> Self {
        let mut bytes = [b' '; RECORD_WIDTH];
        bytes[RECORD_WIDTH - 1] = b'\n';
        let mut writer = SliceWriter {
            buf: &mut bytes[..RECORD_WIDTH - 1],
            pos: 0,
        };
        // Cannot fail: worst-case field widths sum well below the slot.
        let _ = write_fields(&mut writer, gps, rpm.min(RPM_DISPLAY_MAX));
        Self { bytes }
    }

    pub fn as_bytes(&self) -> &[u8; RECORD_WIDTH] {
        &self.bytes
    }
}

fn write_fields<W: Write>(writer: &mut W, gps: &GpsSample, rpm: u32) -> fmt::Result {
    write_microdegrees(writer, if gps.location_valid { gps.lat_microdeg } else { 0 })?;
    writer.write_char(',')?;
    write_microdegrees(writer, if gps.location_valid { gps.lon_microdeg } else { 0 })?;
    write!(writer, ",{},", gps.speed_for_log())?;
    if gps.date_valid {
        write!(
            writer,
            "{:04}-{:02}-{:02}",
            gps.year.min(9_999),
            gps.month,
            gps.day
        )?;
    } else {
        writer.write_str("0000-00-00")?;
    }
    writer.write_char(' ')?;
    if gps.time_valid {
        write!(writer, "{:02}:{:02}:{:02}", gps.hour, gps.minute, gps.second)?;
    } else {
        writer.write_str("00:00:00")?;
    }
    write!(writer, ",{rpm}")
}

/// Six-decimal degrees from fixed-point microdegrees.
fn write_microdegrees<W: Write>(writer: &mut W, microdeg: i32) -> fmt::Result {
    if microdeg < 0 {
        writer.write_char('-')?;
    }
    let abs = microdeg.unsigned_abs();
    write!(writer, "{}.{:06}", abs / 1_000_000, abs % 1_000_000)
}

/// Formatter over a fixed byte slice; overflow is an explicit error rather
/// than a reallocation.
struct SliceWriter<'a> {
    buf: &'a mut [u8],
    pos: usize,
}

impl Write for SliceWriter<'_> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        let bytes = s.as_bytes();
        if self.buf.len() - self.pos < bytes.len() {
            return Err(fmt::Error);
        }
        self.buf[self.pos..self.pos + bytes.len()].copy_from_slice(bytes);
        self.pos += bytes.len();
        Ok(())
    }
}

/// Bounded buffer of pending records, stored contiguously and indexed by
/// count so a flush is one write of the active prefix.
pub struct RecordBuffer {
    buf: [u8; RECORD_BUFFER_CAPACITY * RECORD_WIDTH],
    count: usize,
}

/// The buffer is at capacity; the caller must flush before appending.
#[derive(Debug, PartialEq, Eq)]
pub struct BufferFull;

impl RecordBuffer {
    pub const fn new() -> Self {
        Self {
            buf: [0; RECORD_BUFFER_CAPACITY * RECORD_WIDTH],
            count: 0,
        }
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub const fn capacity(&self) -> usize {
        RECORD_BUFFER_CAPACITY
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn is_full(&self) -> bool {
        self.count == RECORD_BUFFER_CAPACITY
    }

    pub fn push(&mut self, record: &Record) -> Result<(), BufferFull> {
        if self.is_full() {
            return Err(BufferFull);
        }
        let offset = self.count * RECORD_WIDTH;
        self.buf[offset..offset + RECORD_WIDTH].copy_from_slice(record.as_bytes());
        self.count += 1;
        Ok(())
    }

    /// All pending records as one contiguous slice.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf[..self.count * RECORD_WIDTH]
    }

    pub fn clear(&mut self) {
        self.count = 0;
    }
}

impl Default for RecordBuffer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_sample() -> GpsSample {
        let mut sample = GpsSample::new();
        sample.location_valid = true;
        sample.lat_microdeg = 37_774_929;
        sample.lon_microdeg = -122_419_416;
        sample.speed_valid = true;
        sample.speed_mph = 65;
        sample.date_valid = true;
        sample.year = 2025;
        sample.month = 1;
        sample.day = 1;
        sample.time_valid = true;
        sample.hour = 12;
        sample.minute = 34;
        sample.second = 56;
        sample.sats_valid = true;
        sample.satellites = 8;
        sample
    }

    fn line(record: &Record) -> &str {
        core::str::from_utf8(record.as_bytes()).unwrap()
    }

    #[test]
    fn record_is_exactly_one_slot_wide() {
        let record = Record::format(&full_sample(), 3_000);
        assert_eq!(record.as_bytes().len(), RECORD_WIDTH);
        assert_eq!(record.as_bytes()[RECORD_WIDTH - 1], b'\n');
    }

    #[test]
    fn record_fields_are_formatted() {
        let record = Record::format(&full_sample(), 3_000);
        assert!(line(&record).starts_with("37.774929,-122.419416,65,2025-01-01 12:34:56,3000"));
    }

    #[test]
    fn invalid_fields_log_as_zero_or_sentinel() {
        let record = Record::format(&GpsSample::new(), 0);
        assert!(line(&record).starts_with("0.000000,0.000000,-1,0000-00-00 00:00:00,0"));
    }

    #[test]
    fn extreme_values_never_overflow_the_slot() {
        let mut sample = full_sample();
        sample.lat_microdeg = i32::MIN;
        sample.lon_microdeg = i32::MIN;
        sample.speed_mph = i16::MAX;
        sample.year = u16::MAX;
        let record = Record::format(&sample, u32::MAX);
        assert_eq!(record.as_bytes().len(), RECORD_WIDTH);
        assert_eq!(record.as_bytes()[RECORD_WIDTH - 1], b'\n');
        assert!(line(&record).contains(",999,"));
        assert!(line(&record).trim_end().ends_with("99999"));
    }

    #[test]
    fn buffer_count_tracks_pushes_up_to_capacity() {
        let mut buffer = RecordBuffer::new();
        let record = Record::format(&full_sample(), 0);

        for expected in 1..=RECORD_BUFFER_CAPACITY {
            assert!(buffer.push(&record).is_ok());
            assert_eq!(buffer.count(), expected);
        }
        assert!(buffer.is_full());
        assert_eq!(buffer.push(&record), Err(BufferFull));
        assert_eq!(buffer.count(), RECORD_BUFFER_CAPACITY);

        assert_eq!(buffer.as_bytes().len(), RECORD_BUFFER_CAPACITY * RECORD_WIDTH);
        buffer.clear();
        assert!(buffer.is_empty());
        assert!(buffer.as_bytes().is_empty());
    }
}
