//! Compile-time configuration for the logging engine.
//!
//! The device has no runtime configuration surface: everything that tunes
//! the engine is a build-time constant. Pin assignments and bus speeds live
//! in the firmware crate.

/// Width of one log record in bytes, newline included.
pub const RECORD_WIDTH: usize = 64;

/// Milliseconds between forced flushes of the record buffer. Data is never
/// held in memory longer than this, even under a weak fix.
pub const FLUSH_INTERVAL_MS: u64 = 10_000;

/// Target interval between buffered records (one per receiver second).
pub const LOG_INTERVAL_MS: u64 = 1_000;

/// Record buffer capacity: one flush interval worth of records.
pub const RECORD_BUFFER_CAPACITY: usize = (FLUSH_INTERVAL_MS / LOG_INTERVAL_MS) as usize;

/// A raw button level must hold this long before it becomes the stable state.
pub const DEBOUNCE_MS: u64 = 50;

/// Press duration at or above which a release classifies as a long press.
pub const LONG_PRESS_MS: u64 = 1_000;

/// Minimum spacing between operator start/stop toggles.
pub const TOGGLE_COOLDOWN_MS: u64 = 5_000;

/// Minimum spacing between storage presence probes; a probe can cost a
/// blocking bus transaction.
pub const PRESENCE_POLL_MS: u64 = 2_000;

/// Cadence of the pulse-rate sampler within the control cycle.
pub const RPM_SAMPLE_MS: u64 = 33;

/// Edges closer together than this are rejected as contact bounce.
pub const PULSE_MIN_GAP_MS: u64 = 10;

/// With no accepted edge for this long, the displayed rate clears to zero.
pub const RPM_TIMEOUT_MS: u64 = 2_000;

/// Maximum change of the displayed rate per sampler tick (slew limit).
pub const RPM_MAX_STEP: u32 = 150;

/// Pulses produced by the sensor per revolution.
pub const PULSES_PER_REV: u32 = 2;

/// Minimum satellite count for a record-worthy fix.
pub const MIN_SATELLITES: u8 = 4;

/// How long a transient status message stays visible.
pub const STATUS_DURATION_MS: u64 = 3_000;

/// A fix older than this no longer counts as current for presentation.
pub const FIX_AGE_MAX_MS: u32 = 3_000;

/// Largest rate value the record format will print.
pub const RPM_DISPLAY_MAX: u32 = 99_999;

/// Largest speed the record format will print (mph).
pub const SPEED_MAX_MPH: i16 = 999;
