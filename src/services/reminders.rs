//! Reminder scheduler
//!
//! Independent background task that polls for due reminders on a fixed
//! interval and hands them to the presentation layer over a channel.
//! A reminder is marked sent only after its alert was actually
//! delivered; anything undelivered stays pending for the next tick.

use crate::config::{REMINDER_POLL_INTERVAL_SECS, TIMESTAMP_FORMAT};
use crate::database::Repository;
use crate::error::Result;
use chrono::Local;
use serde::Serialize;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// A due reminder on its way to the presentation layer
#[derive(Debug, Clone, Serialize)]
pub struct ReminderAlert {
    pub reminder_id: i64,
    pub note_id: i64,
    pub note_title: String,
    pub remind_at: String,
}

/// Reminder scheduler with a background polling loop
pub struct ReminderScheduler {
    repo: Repository,
    alerts: mpsc::Sender<ReminderAlert>,
}

impl ReminderScheduler {
    pub fn new(repo: Repository, alerts: mpsc::Sender<ReminderAlert>) -> Self {
        Self { repo, alerts }
    }

    /// Start the polling loop. The interval's first tick fires
    /// immediately, which covers the poll shortly after start-up.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(async move {
            tracing::info!(
                "Starting reminder scheduler, polling every {}s",
                REMINDER_POLL_INTERVAL_SECS
            );

            let mut interval = tokio::time::interval(std::time::Duration::from_secs(
                REMINDER_POLL_INTERVAL_SECS,
            ));

            loop {
                interval.tick().await;

                let now = Local::now().format(TIMESTAMP_FORMAT).to_string();
                match self.poll_once(&now).await {
                    Ok(0) => {}
                    Ok(delivered) => tracing::info!("Delivered {} reminder(s)", delivered),
                    // a failed poll is retried on the next tick, never fatal
                    Err(e) => tracing::error!("Reminder poll failed: {}", e),
                }
            }
        })
    }

    /// Run a single poll at the given wall-clock time.
    ///
    /// Due reminders are delivered in ascending remind_at order and
    /// each is marked sent only after its send succeeded. If the
    /// channel is closed the remaining reminders stay pending.
    pub async fn poll_once(&self, now: &str) -> Result<usize> {
        let due = self.repo.due_reminders(now).await?;
        let mut delivered = 0;

        for reminder in due {
            let alert = ReminderAlert {
                reminder_id: reminder.id,
                note_id: reminder.note_id,
                note_title: reminder.note_title.clone(),
                remind_at: reminder.remind_at.clone(),
            };

            if self.alerts.send(alert).await.is_err() {
                tracing::warn!(
                    "Alert channel closed, reminder {} left pending",
                    reminder.id
                );
                break;
            }

            self.repo.mark_reminder_sent(reminder.id).await?;
            delivered += 1;
        }

        Ok(delivered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::{initialize_database, Repository};
    use sqlx::sqlite::SqlitePoolOptions;

    async fn create_test_repo() -> Repository {
        let pool = SqlitePoolOptions::new()
            .connect("sqlite::memory:")
            .await
            .unwrap();

        initialize_database(&pool).await.unwrap();

        Repository::new(pool)
    }

    #[tokio::test]
    async fn test_poll_delivers_and_marks_sent() {
        let repo = create_test_repo().await;
        let note = repo.create_note("Dentist", "").await.unwrap();
        repo.add_reminder(note.id, "2025-01-01 10:00:00").await.unwrap();

        let (tx, mut rx) = mpsc::channel(8);
        let scheduler = ReminderScheduler::new(repo.clone(), tx);

        let delivered = scheduler.poll_once("2025-01-01 10:00:00").await.unwrap();
        assert_eq!(delivered, 1);

        let alert = rx.recv().await.unwrap();
        assert_eq!(alert.note_id, note.id);
        assert_eq!(alert.note_title, "Dentist");
        assert_eq!(alert.remind_at, "2025-01-01 10:00:00");

        // delivered exactly once
        let again = scheduler.poll_once("2025-01-01 10:05:00").await.unwrap();
        assert_eq!(again, 0);
    }

    #[tokio::test]
    async fn test_poll_delivers_in_remind_at_order() {
        let repo = create_test_repo().await;
        let note = repo.create_note("Two alarms", "").await.unwrap();
        repo.add_reminder(note.id, "2025-01-01 10:30:00").await.unwrap();
        repo.add_reminder(note.id, "2025-01-01 09:15:00").await.unwrap();

        let (tx, mut rx) = mpsc::channel(8);
        let scheduler = ReminderScheduler::new(repo, tx);

        let delivered = scheduler.poll_once("2025-01-01 11:00:00").await.unwrap();
        assert_eq!(delivered, 2);

        assert_eq!(rx.recv().await.unwrap().remind_at, "2025-01-01 09:15:00");
        assert_eq!(rx.recv().await.unwrap().remind_at, "2025-01-01 10:30:00");
    }

    #[tokio::test]
    async fn test_poll_ignores_future_reminders() {
        let repo = create_test_repo().await;
        let note = repo.create_note("Later", "").await.unwrap();
        repo.add_reminder(note.id, "2025-06-01 00:00:00").await.unwrap();

        let (tx, _rx) = mpsc::channel(8);
        let scheduler = ReminderScheduler::new(repo, tx);

        let delivered = scheduler.poll_once("2025-05-31 23:59:59").await.unwrap();
        assert_eq!(delivered, 0);
    }

    #[tokio::test]
    async fn test_failed_delivery_leaves_reminder_pending() {
        let repo = create_test_repo().await;
        let note = repo.create_note("Unheard", "").await.unwrap();
        repo.add_reminder(note.id, "2025-01-01 10:00:00").await.unwrap();

        let (tx, rx) = mpsc::channel(8);
        drop(rx);
        let scheduler = ReminderScheduler::new(repo.clone(), tx);

        let delivered = scheduler.poll_once("2025-01-01 10:00:00").await.unwrap();
        assert_eq!(delivered, 0);

        // still due: nothing was marked sent
        let due = repo.due_reminders("2025-01-01 10:00:00").await.unwrap();
        assert_eq!(due.len(), 1);
    }

    #[tokio::test]
    async fn test_poll_handles_many_reminders_per_note() {
        let repo = create_test_repo().await;
        let note = repo.create_note("Nagging", "").await.unwrap();
        for at in ["2025-01-01 08:00:00", "2025-01-01 09:00:00", "2025-01-01 10:00:00"] {
            repo.add_reminder(note.id, at).await.unwrap();
        }

        let (tx, mut rx) = mpsc::channel(8);
        let scheduler = ReminderScheduler::new(repo, tx);

        let delivered = scheduler.poll_once("2025-01-01 10:00:00").await.unwrap();
        assert_eq!(delivered, 3);

        for _ in 0..3 {
            assert_eq!(rx.recv().await.unwrap().note_id, note.id);
        }
    }
}
