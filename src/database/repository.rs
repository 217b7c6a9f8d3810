//! Repository layer for database operations
//!
//! Sole owner of persistent state: every mutation goes through here so
//! the data invariants hold. Operations that touch more than one table
//! run inside an explicit transaction.

use super::models::*;
use crate::config::{DATE_FORMAT, PASSWORD_SETTING_KEY, TIMESTAMP_FORMAT};
use crate::error::{AppError, Result};
use crate::search::SearchQuery;
use chrono::{Local, NaiveDate, NaiveDateTime};
use sqlx::{Executor, Sqlite, SqlitePool};

/// Repository for database operations
#[derive(Clone)]
pub struct Repository {
    pool: SqlitePool,
}

/// Current local wall clock, formatted like every stored timestamp
fn now_stamp() -> String {
    Local::now().format(TIMESTAMP_FORMAT).to_string()
}

/// Reject date-time strings that would not compare lexicographically
pub(crate) fn validate_timestamp(value: &str) -> Result<()> {
    NaiveDateTime::parse_from_str(value, TIMESTAMP_FORMAT)
        .map(|_| ())
        .map_err(|_| {
            AppError::Validation(format!(
                "Invalid date-time '{}', expected YYYY-MM-DD HH:MM:SS",
                value
            ))
        })
}

/// Insert-or-lookup for a tag name, usable inside a transaction.
/// The ON CONFLICT arm makes the statement race-safe: two concurrent
/// calls both get the same id, neither sees a uniqueness failure.
async fn upsert_tag_on<'e, E>(executor: E, name: &str) -> Result<i64>
where
    E: Executor<'e, Database = Sqlite>,
{
    let id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO tags (name) VALUES (?)
        ON CONFLICT(name) DO UPDATE SET name = excluded.name
        RETURNING id
        "#,
    )
    .bind(name)
    .fetch_one(executor)
    .await?;

    Ok(id)
}

impl Repository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    // ===== Notes =====

    /// Create a new note. The creation timestamp is assigned here,
    /// never by the caller.
    pub async fn create_note(&self, title: &str, content: &str) -> Result<Note> {
        let note = sqlx::query_as::<_, Note>(
            r#"
            INSERT INTO notes (title, content, created)
            VALUES (?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(title)
        .bind(content)
        .bind(now_stamp())
        .fetch_one(&self.pool)
        .await?;

        tracing::debug!("Created note: {}", note.id);
        Ok(note)
    }

    /// Get a note by id, or None if it no longer exists
    pub async fn get_note(&self, id: i64) -> Result<Option<Note>> {
        let note = sqlx::query_as::<_, Note>("SELECT * FROM notes WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(note)
    }

    /// Update a note's title and content. `created` is immutable.
    pub async fn update_note(&self, id: i64, title: &str, content: &str) -> Result<Note> {
        let rows = sqlx::query("UPDATE notes SET title = ?, content = ? WHERE id = ?")
            .bind(title)
            .bind(content)
            .bind(id)
            .execute(&self.pool)
            .await?
            .rows_affected();

        if rows == 0 {
            return Err(AppError::NoteNotFound(id));
        }

        tracing::debug!("Updated note: {}", id);

        let note = self.get_note(id).await?.ok_or(AppError::NoteNotFound(id))?;
        Ok(note)
    }

    /// Delete a note together with its tag links and reminders.
    ///
    /// The schema has no cascade constraints, so all three deletes run
    /// in one transaction: either the note and everything hanging off
    /// it disappear, or nothing does.
    pub async fn delete_note(&self, id: i64) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        let rows = sqlx::query("DELETE FROM notes WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        if rows == 0 {
            return Err(AppError::NoteNotFound(id));
        }

        sqlx::query("DELETE FROM note_tags WHERE note_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM reminders WHERE note_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        tracing::debug!("Deleted note {} with its links and reminders", id);
        Ok(())
    }

    /// Exact-title lookup on a calendar day
    pub async fn find_note_by_title_on(
        &self,
        title: &str,
        date: NaiveDate,
    ) -> Result<Option<NoteSummary>> {
        let note = sqlx::query_as::<_, NoteSummary>(
            r#"
            SELECT id, title, created FROM notes
            WHERE title = ? AND DATE(created) = ?
            LIMIT 1
            "#,
        )
        .bind(title)
        .bind(date.format(DATE_FORMAT).to_string())
        .fetch_optional(&self.pool)
        .await?;

        Ok(note)
    }

    /// Execute a constructed search query
    pub async fn search_notes(&self, query: &SearchQuery) -> Result<Vec<NoteSummary>> {
        let (sql, params) = query.build();

        let mut q = sqlx::query_as::<_, NoteSummary>(&sql);
        for param in &params {
            q = q.bind(param);
        }

        let notes = q.fetch_all(&self.pool).await?;
        Ok(notes)
    }

    // ===== Tags =====

    /// Insert a tag name or return the id it already has.
    ///
    /// The name is trimmed first; an empty result is a validation
    /// error. A uniqueness conflict is absorbed internally and never
    /// surfaces to the caller.
    pub async fn upsert_tag(&self, name: &str) -> Result<i64> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AppError::Validation("Tag name is empty".to_string()));
        }

        upsert_tag_on(&self.pool, name).await
    }

    /// Replace a note's tag set.
    ///
    /// Stale links are removed before the new set is linked, so this is
    /// a set-replace, not a merge. Empty names are skipped; duplicate
    /// names within one call collapse to a single link.
    pub async fn replace_note_tags(&self, note_id: i64, names: &[String]) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM note_tags WHERE note_id = ?")
            .bind(note_id)
            .execute(&mut *tx)
            .await?;

        for name in names {
            let name = name.trim();
            if name.is_empty() {
                continue;
            }

            let tag_id = upsert_tag_on(&mut *tx, name).await?;

            sqlx::query("INSERT OR IGNORE INTO note_tags (note_id, tag_id) VALUES (?, ?)")
                .bind(note_id)
                .bind(tag_id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;

        tracing::debug!("Replaced tags for note: {}", note_id);
        Ok(())
    }

    /// List a note's tag names
    pub async fn list_tags(&self, note_id: i64) -> Result<Vec<String>> {
        let names: Vec<String> = sqlx::query_scalar(
            r#"
            SELECT t.name FROM tags t
            JOIN note_tags nt ON t.id = nt.tag_id
            WHERE nt.note_id = ?
            "#,
        )
        .bind(note_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(names)
    }

    // ===== Reminders =====

    /// Create a reminder for a note
    pub async fn add_reminder(&self, note_id: i64, remind_at: &str) -> Result<Reminder> {
        validate_timestamp(remind_at)?;

        let reminder = sqlx::query_as::<_, Reminder>(
            r#"
            INSERT INTO reminders (note_id, remind_at, mail_sent)
            VALUES (?, ?, 0)
            RETURNING *
            "#,
        )
        .bind(note_id)
        .bind(remind_at)
        .fetch_one(&self.pool)
        .await?;

        tracing::debug!("Created reminder {} for note {}", reminder.id, note_id);
        Ok(reminder)
    }

    /// Move a reminder to a new time and reset its sent flag so it
    /// fires again
    pub async fn reschedule_reminder(&self, id: i64, remind_at: &str) -> Result<()> {
        validate_timestamp(remind_at)?;

        let rows = sqlx::query("UPDATE reminders SET remind_at = ?, mail_sent = 0 WHERE id = ?")
            .bind(remind_at)
            .bind(id)
            .execute(&self.pool)
            .await?
            .rows_affected();

        if rows == 0 {
            return Err(AppError::ReminderNotFound(id));
        }

        tracing::debug!("Rescheduled reminder {} to {}", id, remind_at);
        Ok(())
    }

    /// Delete a reminder
    pub async fn remove_reminder(&self, id: i64) -> Result<()> {
        let rows = sqlx::query("DELETE FROM reminders WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?
            .rows_affected();

        if rows == 0 {
            return Err(AppError::ReminderNotFound(id));
        }

        tracing::debug!("Removed reminder: {}", id);
        Ok(())
    }

    /// List a note's reminders, soonest first
    pub async fn list_reminders(&self, note_id: i64) -> Result<Vec<Reminder>> {
        let reminders = sqlx::query_as::<_, Reminder>(
            r#"
            SELECT * FROM reminders
            WHERE note_id = ?
            ORDER BY remind_at ASC
            "#,
        )
        .bind(note_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(reminders)
    }

    /// Unsent reminders whose target time is at or before `now`,
    /// joined with their note titles, soonest first
    pub async fn due_reminders(&self, now: &str) -> Result<Vec<DueReminder>> {
        let due = sqlx::query_as::<_, DueReminder>(
            r#"
            SELECT r.id, r.note_id, r.remind_at, n.title AS note_title
            FROM reminders r
            JOIN notes n ON n.id = r.note_id
            WHERE r.mail_sent = 0 AND r.remind_at <= ?
            ORDER BY r.remind_at ASC
            "#,
        )
        .bind(now)
        .fetch_all(&self.pool)
        .await?;

        Ok(due)
    }

    /// Idempotent flip of a reminder's sent flag to true
    pub async fn mark_reminder_sent(&self, id: i64) -> Result<()> {
        sqlx::query("UPDATE reminders SET mail_sent = 1 WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        tracing::debug!("Marked reminder as sent: {}", id);
        Ok(())
    }

    // ===== Settings =====

    pub async fn get_setting(&self, key: &str) -> Result<Option<String>> {
        let value: Option<String> = sqlx::query_scalar("SELECT value FROM app_settings WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;

        Ok(value)
    }

    pub async fn set_setting(&self, key: &str, value: &str) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO app_settings (key, value) VALUES (?, ?)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value
            "#,
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await?;

        tracing::debug!("Set setting: {}", key);
        Ok(())
    }

    /// Hash and store the application password, overwriting any prior
    /// value. The plaintext is never persisted.
    pub async fn set_password(&self, plaintext: &str) -> Result<()> {
        if plaintext.trim().is_empty() {
            return Err(AppError::Validation("Password is empty".to_string()));
        }

        let hash = crate::crypto::hash_password(plaintext)?;
        self.set_setting(PASSWORD_SETTING_KEY, &hash).await
    }

    /// Check a plaintext candidate against the stored hash. False when
    /// no password has ever been set.
    pub async fn verify_password(&self, plaintext: &str) -> Result<bool> {
        match self.get_setting(PASSWORD_SETTING_KEY).await? {
            Some(hash) => crate::crypto::verify_password(&hash, plaintext),
            None => Ok(false),
        }
    }

    /// Whether a password has been set
    pub async fn has_password(&self) -> Result<bool> {
        Ok(self.get_setting(PASSWORD_SETTING_KEY).await?.is_some())
    }
}
