//! Application configuration constants
//!
//! Central location for configuration constants and format strings
//! used throughout the application.

// ===== Storage =====

/// Default directory for the application database
pub const DEFAULT_DATA_DIR: &str = "data";

/// Database file name inside the data directory
pub const DB_FILE_NAME: &str = "notekeep.sqlite3";

/// Settings key under which the password hash is stored
pub const PASSWORD_SETTING_KEY: &str = "password";

// ===== Timestamps =====

/// Format for stored date-times. Zero-padded so that string comparison
/// and lexicographic ordering agree with chronological ordering.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Format for calendar-day values used by the date filter
pub const DATE_FORMAT: &str = "%Y-%m-%d";

// ===== Reminder Scheduler =====

/// Seconds between due-reminder polls
pub const REMINDER_POLL_INTERVAL_SECS: u64 = 60;

/// Capacity of the alert channel between the scheduler and the
/// presentation layer. An undrained channel blocks delivery, which
/// leaves reminders unsent and retried on a later tick.
pub const ALERT_CHANNEL_CAPACITY: usize = 16;
