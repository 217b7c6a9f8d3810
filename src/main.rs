// notekeep - personal knowledge-management core
// Headless entry point: opens the store, runs the reminder scheduler
// and logs delivered alerts in place of the UI layer.

use notekeep::config::{ALERT_CHANNEL_CAPACITY, DB_FILE_NAME, DEFAULT_DATA_DIR};
use notekeep::database::{create_pool, Repository};
use notekeep::services::ReminderScheduler;
use std::path::PathBuf;
use tokio::sync::mpsc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "notekeep=debug,info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting notekeep core");

    let data_dir = std::env::var("NOTEKEEP_DATA_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_DATA_DIR));

    let pool = create_pool(&data_dir.join(DB_FILE_NAME)).await?;
    let repo = Repository::new(pool);

    let (tx, mut rx) = mpsc::channel(ALERT_CHANNEL_CAPACITY);
    ReminderScheduler::new(repo, tx).spawn();

    while let Some(alert) = rx.recv().await {
        tracing::info!(
            note = alert.note_id,
            title = %alert.note_title,
            at = %alert.remind_at,
            "Reminder due"
        );
    }

    Ok(())
}
