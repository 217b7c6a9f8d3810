//! Services module
//!
//! Business logic services that coordinate between callers and the
//! repository.

pub mod notes;
pub mod reminders;

pub use notes::NotesService;
pub use reminders::{ReminderAlert, ReminderScheduler};
