//! Database models
//!
//! Typed records returned by the repository. Positional row access is
//! never exposed; every query maps into one of these structs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A titled, timestamped text note
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Note {
    pub id: i64,
    pub title: String,
    pub content: String,
    /// Assigned by the store at insert time, immutable thereafter.
    /// Stored as `YYYY-MM-DD HH:MM:SS`.
    pub created: String,
}

/// Note row without content, as produced by list/search queries
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct NoteSummary {
    pub id: i64,
    pub title: String,
    pub created: String,
}

/// A unique label attachable to notes through the link table
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Tag {
    pub id: i64,
    pub name: String,
}

/// A one-time scheduled notification bound to a note
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Reminder {
    pub id: i64,
    pub note_id: i64,
    pub remind_at: String,
    /// One-way flag: flips to true when the notification has been
    /// delivered, never back.
    #[sqlx(rename = "mail_sent")]
    pub sent: bool,
}

/// A due reminder joined with its note's title for notification text
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DueReminder {
    pub id: i64,
    pub note_id: i64,
    pub remind_at: String,
    pub note_title: String,
}

/// Application setting
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Setting {
    pub key: String,
    pub value: String,
}
