//! Scheduled cleanup of expired revocation records.

use crate::db::Database;
use std::time::Duration;
use tracing::{error, info};

/// Interval between cleanup runs.
const CLEANUP_INTERVAL: Duration = Duration::from_secs(60 * 60); // 1 hour

/// Run all cleanup tasks once.
pub async fn run_cleanup(db: &Database) {
    match db.revoked_tokens().delete_expired().await {
        Ok(count) if count > 0 => info!("Cleaned up {} expired revoked tokens", count),
        Ok(_) => {}
        Err(e) => error!("Failed to clean up revoked tokens: {}", e),
    }
}

/// Spawn a background task that runs cleanup periodically.
/// Returns a handle that can be used to abort the task.
pub fn spawn_cleanup_scheduler(db: Database) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(CLEANUP_INTERVAL);

        loop {
            interval.tick().await;
            run_cleanup(&db).await;
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jwt::now_secs;

    #[tokio::test]
    async fn test_run_cleanup_prunes_expired() {
        let db = Database::open(":memory:").await.unwrap();
        let now = now_secs().unwrap();
        db.revoked_tokens().revoke("old", now - 1).await.unwrap();
        db.revoked_tokens().revoke("live", now + 600).await.unwrap();

        run_cleanup(&db).await;

        assert!(!db.revoked_tokens().is_revoked("old").await.unwrap());
        assert!(db.revoked_tokens().is_revoked("live").await.unwrap());
    }
}
