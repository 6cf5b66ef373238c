//! The session state machine and flush engine.
//!
//! [`TripLogger`] owns every main-cycle component and drives them in a fixed
//! order once per control cycle, so later steps observe state changes made
//! by earlier steps within the same cycle (a forced shutdown from presence
//! loss is visible to toggle processing immediately). The storage medium is
//! passed in by reference each cycle rather than owned, which keeps the
//! engine generic and testable against an in-memory medium.

use core::fmt::Write;

use log::{error, info, warn};

use crate::button::{ButtonDebouncer, ButtonEvent};
use crate::config::{FIX_AGE_MAX_MS, FLUSH_INTERVAL_MS, MIN_SATELLITES, TOGGLE_COOLDOWN_MS};
use crate::gps::GpsSample;
use crate::record::{Record, RecordBuffer, RECORD_HEADER};
use crate::rpm::{EdgeSnapshot, RateEstimator};
use crate::status::{LogFault, LoggerView, StatusLine, STATUS_MAX_LEN};
use crate::storage::filename::{allocate_log_name, LogDate, LogName};
use crate::storage::presence::{PresenceChange, PresenceMonitor};
use crate::storage::StorageMedium;

/// Metadata for the one active session. The physical handle lives inside
/// the medium; this exists only while the controller keeps a file open.
struct LogSession {
    name: LogName,
    records_written: u32,
}

/// A flush attempt that did not land the whole buffer.
#[derive(Debug)]
enum FlushError<E> {
    Medium(E),
    Short { written: usize, expected: usize },
}

/// The logging engine: session state machine, record buffer, and flush
/// engine, driven once per control cycle by [`TripLogger::tick`].
pub struct TripLogger {
    button: ButtonDebouncer,
    presence: PresenceMonitor,
    rate: RateEstimator,
    buffer: RecordBuffer,
    session: Option<LogSession>,
    status: StatusLine,
    last_toggle_ms: Option<u64>,
    last_flush_ms: u64,
    last_logged_second: Option<u32>,
    last_sample: GpsSample,
}

impl TripLogger {
    pub const fn new() -> Self {
        Self {
            button: ButtonDebouncer::new(),
            presence: PresenceMonitor::new(),
            rate: RateEstimator::new(),
            buffer: RecordBuffer::new(),
            session: None,
            status: StatusLine::new(),
            last_toggle_ms: None,
            last_flush_ms: 0,
            last_logged_second: None,
            last_sample: GpsSample::new(),
        }
    }

    /// Run one control cycle.
    pub fn tick<M: StorageMedium>(
        &mut self,
        medium: &mut M,
        button_pressed: bool,
        gps: &GpsSample,
        edges: EdgeSnapshot,
        now_ms: u64,
    ) {
        self.last_sample = *gps;

        // 1. Button debouncing.
        self.button.update(button_pressed, now_ms);

        // 2. Storage presence; removal forces an orderly shutdown.
        match self.presence.poll(medium, now_ms) {
            Some(PresenceChange::Inserted) => {
                info!("storage inserted");
                self.status.set("CARD IN", now_ms);
            }
            Some(PresenceChange::Removed) => {
                warn!("storage removed");
                if self.session.is_some() {
                    self.force_stop(medium);
                }
                self.status.set("CARD OUT", now_ms);
            }
            None => {}
        }

        // 3. Operator toggle.
        if let Some(event) = self.button.take_event() {
            self.handle_button(medium, event, gps, now_ms);
        }

        // 4. Rate sampling (internally paced).
        self.rate.poll(edges, now_ms);

        // 5. Record sampling: once per distinct receiver second.
        self.sample_record(medium, gps, now_ms);

        // 6. Interval flush, so nothing sits in memory past the bound.
        if self.session.is_some() && now_ms.wrapping_sub(self.last_flush_ms) >= FLUSH_INTERVAL_MS {
            self.flush(medium, now_ms);
        }
    }

    /// Presentation snapshot for the display routine.
    pub fn view(&self, now_ms: u64) -> LoggerView {
        LoggerView {
            logging: self.session.is_some(),
            filename: self.session.as_ref().map(|s| s.name.clone()),
            rpm: self.rate.display_rpm(),
            status: self.status.current(now_ms).map(|text| {
                let mut message = heapless::String::<STATUS_MAX_LEN>::new();
                let _ = message.push_str(text);
                message
            }),
            link_ok: self.last_sample.link_ok,
            has_fix: self.last_sample.location_valid
                && self.last_sample.fix_age_ms < FIX_AGE_MAX_MS,
            satellites: self.last_sample.sats_valid.then_some(self.last_sample.satellites),
            speed_mph: self.last_sample.speed_valid.then_some(self.last_sample.speed_mph),
            time: self.last_sample.time_valid.then_some((
                self.last_sample.hour,
                self.last_sample.minute,
                self.last_sample.second,
            )),
        }
    }

    pub fn is_logging(&self) -> bool {
        self.session.is_some()
    }

    pub fn buffered_records(&self) -> usize {
        self.buffer.count()
    }

    pub fn current_file(&self) -> Option<&str> {
        self.session.as_ref().map(|s| s.name.as_str())
    }

    fn handle_button<M: StorageMedium>(
        &mut self,
        medium: &mut M,
        event: ButtonEvent,
        gps: &GpsSample,
        now_ms: u64,
    ) {
        match event {
            ButtonEvent::ShortClick => {
                if let Some(last) = self.last_toggle_ms {
                    if now_ms.wrapping_sub(last) < TOGGLE_COOLDOWN_MS {
                        // Flapping press inside the cooldown window.
                        return;
                    }
                }
                if self.session.is_some() {
                    self.last_toggle_ms = Some(now_ms);
                    self.stop(medium, now_ms);
                } else if self.start(medium, gps, now_ms) {
                    self.last_toggle_ms = Some(now_ms);
                }
            }
            ButtonEvent::LongPress => {
                // Distinct, non-destructive gesture: report state only.
                let mut message = heapless::String::<STATUS_MAX_LEN>::new();
                match &self.session {
                    Some(session) => {
                        let _ = write!(message, "LOG {}", session.name);
                    }
                    None => {
                        let _ = message.push_str("LOG OFF");
                    }
                }
                self.status.set(&message, now_ms);
            }
        }
    }

    /// Open a new session: allocate a name, create the file, write the
    /// header, and reset the per-session counters. Returns false (with a
    /// surfaced fault) if the session could not be opened.
    fn start<M: StorageMedium>(&mut self, medium: &mut M, gps: &GpsSample, now_ms: u64) -> bool {
        if !self.presence.inserted() {
            self.status.set("NO CARD", now_ms);
            return false;
        }

        let date = LogDate::from_sample(gps);
        let (name, exhausted) = match allocate_log_name(medium, date) {
            Ok(allocated) => allocated,
            Err(e) => {
                error!("log name allocation failed: {:?}", e);
                self.fault(LogFault::OpenFailed, now_ms);
                return false;
            }
        };
        if exhausted {
            warn!("sequence space exhausted, overwriting {}", name);
            self.fault(LogFault::NamesExhausted, now_ms);
        }

        let opened = if exhausted {
            medium.open_truncate(name.as_str())
        } else {
            medium.open_append(name.as_str())
        };
        let created = opened
            .and_then(|()| medium.write(RECORD_HEADER).map(|_| ()))
            .and_then(|()| medium.sync());
        if let Err(e) = created {
            error!("opening {} failed: {:?}", name, e);
            medium.close();
            self.fault(LogFault::OpenFailed, now_ms);
            return false;
        }

        info!("logging to {}", name);
        self.buffer.clear();
        self.rate.reset_average();
        self.last_logged_second = None;
        self.last_flush_ms = now_ms;

        let mut message = heapless::String::<STATUS_MAX_LEN>::new();
        let _ = write!(message, "REC {}", name);
        self.status.set(&message, now_ms);

        self.session = Some(LogSession {
            name,
            records_written: 0,
        });
        true
    }

    /// Operator stop: final flush, close, report the completed filename.
    fn stop<M: StorageMedium>(&mut self, medium: &mut M, now_ms: u64) {
        self.flush(medium, now_ms);
        medium.close();
        if let Some(session) = self.session.take() {
            info!("closed {} after {} records", session.name, session.records_written);
            let mut message = heapless::String::<STATUS_MAX_LEN>::new();
            let _ = write!(message, "SAVED {}", session.name);
            self.status.set(&message, now_ms);
        }
        self.last_logged_second = None;
    }

    /// Shutdown on storage removal: best-effort flush, close, clear the
    /// active flag. No retry — the medium may genuinely be gone.
    fn force_stop<M: StorageMedium>(&mut self, medium: &mut M) {
        if !self.buffer.is_empty() {
            match medium.write(self.buffer.as_bytes()) {
                Ok(_) => {
                    let _ = medium.sync();
                }
                Err(e) => {
                    warn!(
                        "final flush of {} records failed: {:?}",
                        self.buffer.count(),
                        e
                    );
                }
            }
            self.buffer.clear();
        }
        medium.close();
        if let Some(session) = self.session.take() {
            warn!("session {} cut short by storage removal", session.name);
        }
        self.last_logged_second = None;
    }

    /// Build and buffer one record when the receiver clock has advanced to
    /// a new second and the fix is good enough.
    fn sample_record<M: StorageMedium>(&mut self, medium: &mut M, gps: &GpsSample, now_ms: u64) {
        if self.session.is_none() || !gps.loggable(MIN_SATELLITES) {
            return;
        }
        let Some(second) = gps.second_of_day() else {
            return;
        };
        if self.last_logged_second == Some(second) {
            return;
        }
        self.last_logged_second = Some(second);

        let record = Record::format(gps, self.rate.take_average());
        self.buffer_record(medium, record, now_ms);
    }

    /// Append a record, flushing first when the buffer is at capacity.
    ///
    /// This is the one place data loss is possible: if the flush cannot
    /// complete, the new record is dropped and the loss surfaced.
    fn buffer_record<M: StorageMedium>(&mut self, medium: &mut M, record: Record, now_ms: u64) {
        if self.buffer.is_full() {
            self.flush(medium, now_ms);
            if self.session.is_none() {
                // Flush escalation shut the session down.
                warn!("record dropped: flush failed with the buffer at capacity");
                self.fault(LogFault::RecordDropped, now_ms);
                return;
            }
        }
        if self.buffer.push(&record).is_err() {
            warn!("record dropped: buffer still full after flush");
            self.fault(LogFault::RecordDropped, now_ms);
            return;
        }
        if let Some(session) = self.session.as_mut() {
            session.records_written += 1;
        }
    }

    /// Write the whole buffer as one contiguous append, verifying the byte
    /// count and forcing the data down to the medium. A short write or
    /// error closes the handle and retries once on a fresh handle; a second
    /// failure disables logging with a hard fault.
    fn flush<M: StorageMedium>(&mut self, medium: &mut M, now_ms: u64) {
        self.last_flush_ms = now_ms;
        if self.buffer.is_empty() {
            return;
        }
        let Some(name) = self.session.as_ref().map(|s| s.name.clone()) else {
            return;
        };

        match Self::write_all(medium, self.buffer.as_bytes()) {
            Ok(()) => {
                self.buffer.clear();
                self.status.set("WRITING", now_ms);
                return;
            }
            Err(e) => {
                warn!("flush to {} failed: {:?}, retrying on a fresh handle", name, e);
            }
        }

        medium.close();
        let retried = match medium.open_append(name.as_str()) {
            Ok(()) => Self::write_all(medium, self.buffer.as_bytes()),
            Err(e) => Err(FlushError::Medium(e)),
        };
        match retried {
            Ok(()) => {
                self.buffer.clear();
                self.status.set("WRITING", now_ms);
            }
            Err(e) => {
                error!("flush retry to {} failed: {:?}, disabling logging", name, e);
                self.buffer.clear();
                medium.close();
                self.session = None;
                self.fault(LogFault::WriteFailed, now_ms);
            }
        }
    }

    fn write_all<M: StorageMedium>(
        medium: &mut M,
        data: &[u8],
    ) -> Result<(), FlushError<M::Error>> {
        let expected = data.len();
        match medium.write(data) {
            Ok(written) if written == expected => medium.sync().map_err(FlushError::Medium),
            Ok(written) => Err(FlushError::Short { written, expected }),
            Err(e) => Err(FlushError::Medium(e)),
        }
    }

    fn fault(&mut self, fault: LogFault, now_ms: u64) {
        self.status.set(fault.status_text(), now_ms);
    }
}

impl Default for TripLogger {
    fn default() -> Self {
        Self::new()
    }
}
