//! Deterministic per-session log file names.
//!
//! Names are 8.3 short names: `L<YY><M><DD><NN>.CSV`, where `<M>` is the
//! month packed to a single base-36 digit so the date and a two-digit
//! sequence number fit the 8-character limit of the FAT short-name layer.
//! Sequential probing (never random suffixes) makes allocation idempotent:
//! re-deriving the name for a date lands on the same slot until a file is
//! actually created there.

use core::fmt::Write;

use heapless::String;

use crate::gps::GpsSample;

use super::StorageMedium;

/// `L` + 7 date/sequence characters + `.CSV`.
pub const LOG_NAME_LEN: usize = 12;

pub type LogName = String<LOG_NAME_LEN>;

/// Highest two-digit sequence number, also the overwrite-prone fallback
/// when the whole space for a date is taken.
const MAX_SEQUENCE: u8 = 99;

/// Calendar date a session name is derived from. Zero-defaulted when the
/// receiver has no validated date.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LogDate {
    pub year: u16,
    pub month: u8,
    pub day: u8,
}

impl LogDate {
    pub fn from_sample(gps: &GpsSample) -> Self {
        if gps.date_valid {
            Self {
                year: gps.year,
                month: gps.month,
                day: gps.day,
            }
        } else {
            Self::default()
        }
    }
}

/// Render the name for a date and sequence number.
pub fn log_name(date: LogDate, sequence: u8) -> LogName {
    let mut name = LogName::new();
    // Cannot fail: the rendered form is exactly LOG_NAME_LEN bytes.
    let _ = write!(
        name,
        "L{:02}{}{:02}{:02}.CSV",
        date.year % 100,
        month_digit(date.month),
        date.day.min(99),
        sequence.min(MAX_SEQUENCE)
    );
    name
}

fn month_digit(month: u8) -> char {
    match month.min(12) {
        m @ 0..=9 => (b'0' + m) as char,
        m => (b'A' + (m - 10)) as char,
    }
}

/// First unused name for the date, probing sequence 00..99 in order.
///
/// Returns the name and whether the sequence space was exhausted; in that
/// case the sequence-99 name is reused deterministically and the existing
/// file will be overwritten.
pub fn allocate_log_name<M: StorageMedium>(
    medium: &mut M,
    date: LogDate,
) -> Result<(LogName, bool), M::Error> {
    for sequence in 0..=MAX_SEQUENCE {
        let name = log_name(date, sequence);
        if !medium.exists(name.as_str())? {
            return Ok((name, false));
        }
    }
    Ok((log_name(date, MAX_SEQUENCE), true))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::mock::MockMedium;

    use alloc::string::String as StdString;
    use alloc::vec::Vec;

    const DATE: LogDate = LogDate {
        year: 2025,
        month: 1,
        day: 1,
    };

    #[test]
    fn name_encodes_date_and_sequence() {
        assert_eq!(log_name(DATE, 0).as_str(), "L2510100.CSV");
        let december = LogDate {
            year: 2025,
            month: 12,
            day: 31,
        };
        assert_eq!(log_name(december, 7).as_str(), "L25C3107.CSV");
    }

    #[test]
    fn zero_defaulted_date_still_names_a_file() {
        assert_eq!(log_name(LogDate::default(), 0).as_str(), "L0000000.CSV");
    }

    #[test]
    fn allocation_is_idempotent_without_file_creation() {
        let mut medium = MockMedium::with_card();
        let (first, exhausted) = allocate_log_name(&mut medium, DATE).unwrap();
        assert_eq!(first.as_str(), "L2510100.CSV");
        assert!(!exhausted);

        let (second, _) = allocate_log_name(&mut medium, DATE).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn allocation_skips_existing_sequences() {
        let mut medium = MockMedium::with_card();
        medium
            .files
            .insert(StdString::from("L2510100.CSV"), Vec::new());

        let (name, exhausted) = allocate_log_name(&mut medium, DATE).unwrap();
        assert_eq!(name.as_str(), "L2510101.CSV");
        assert!(!exhausted);
    }

    #[test]
    fn exhausted_space_falls_back_to_final_sequence() {
        let mut medium = MockMedium::with_card();
        for sequence in 0..=99u8 {
            medium
                .files
                .insert(StdString::from(log_name(DATE, sequence).as_str()), Vec::new());
        }

        let (name, exhausted) = allocate_log_name(&mut medium, DATE).unwrap();
        assert_eq!(name.as_str(), "L2510199.CSV");
        assert!(exhausted);
    }

    #[test]
    fn probe_error_propagates() {
        let mut medium = MockMedium::default(); // no card inserted
        assert!(allocate_log_name(&mut medium, DATE).is_err());
    }
}
