//! Notes service
//!
//! High-level note lifecycle: validation, create-or-update, tag
//! set-replacement and reminder bookkeeping in one save call.

use crate::database::{Note, NoteSummary, Repository};
use crate::error::{AppError, Result};
use crate::search::SearchQuery;
use chrono::NaiveDate;

/// Split a raw comma-separated tag string into clean names.
/// Pieces are trimmed and empty pieces dropped; duplicates are left in
/// place because the link insert collapses them.
pub fn split_tags(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|piece| !piece.is_empty())
        .map(str::to_string)
        .collect()
}

/// Service for managing notes
#[derive(Clone)]
pub struct NotesService {
    repo: Repository,
}

impl NotesService {
    pub fn new(repo: Repository) -> Self {
        Self { repo }
    }

    /// Create a new note
    pub async fn create_note(&self, title: &str, content: &str) -> Result<Note> {
        tracing::info!("Creating new note: {}", title);
        self.repo.create_note(title, content).await
    }

    /// Get a note by id, or None if it no longer exists
    pub async fn get_note(&self, id: i64) -> Result<Option<Note>> {
        self.repo.get_note(id).await
    }

    /// Update a note
    pub async fn update_note(&self, id: i64, title: &str, content: &str) -> Result<Note> {
        tracing::debug!("Updating note: {}", id);
        self.repo.update_note(id, title, content).await
    }

    /// Delete a note with its tag links and reminders
    pub async fn delete_note(&self, id: i64) -> Result<()> {
        tracing::info!("Deleting note: {}", id);
        self.repo.delete_note(id).await
    }

    /// Search notes with a constructed query
    pub async fn search_notes(&self, query: &SearchQuery) -> Result<Vec<NoteSummary>> {
        self.repo.search_notes(query).await
    }

    /// Exact-title lookup on a calendar day, for the presentation
    /// layer's "already exists, replace?" flow
    pub async fn find_duplicate(&self, title: &str, date: NaiveDate) -> Result<Option<NoteSummary>> {
        self.repo.find_note_by_title_on(title, date).await
    }

    /// Save a note the way the editor does: create or update, replace
    /// the tag set from the raw comma string, and reconcile the
    /// reminder.
    ///
    /// `remind_at = Some(..)` reschedules the note's existing reminder
    /// (resetting its sent flag) or adds one; `None` removes every
    /// reminder the note has. Validation happens before any write.
    pub async fn save_note(
        &self,
        id: Option<i64>,
        title: &str,
        content: &str,
        tags_raw: &str,
        remind_at: Option<&str>,
    ) -> Result<Note> {
        let title = title.trim();
        if title.is_empty() {
            return Err(AppError::Validation("Note title is empty".to_string()));
        }
        if let Some(at) = remind_at {
            crate::database::repository::validate_timestamp(at)?;
        }

        let note = match id {
            Some(id) => self.repo.update_note(id, title, content).await?,
            None => self.repo.create_note(title, content).await?,
        };

        self.repo
            .replace_note_tags(note.id, &split_tags(tags_raw))
            .await?;

        match remind_at {
            Some(at) => {
                let existing = self.repo.list_reminders(note.id).await?;
                match existing.first() {
                    Some(reminder) => self.repo.reschedule_reminder(reminder.id, at).await?,
                    None => {
                        self.repo.add_reminder(note.id, at).await?;
                    }
                }
            }
            None => {
                for reminder in self.repo.list_reminders(note.id).await? {
                    self.repo.remove_reminder(reminder.id).await?;
                }
            }
        }

        tracing::info!("Saved note: {}", note.id);
        Ok(note)
    }
}
