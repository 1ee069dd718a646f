//! Optional retention sweep over the upload and output directories.
//!
//! Disabled unless `storage.retention_hours` is set. Files are otherwise kept
//! forever.

use std::path::Path;
use std::time::{Duration, SystemTime};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::config::StorageConfig;

/// Delete regular files directly under `dir` last modified before `now - max_age`.
pub fn sweep_dir(dir: &Path, max_age: Duration, now: SystemTime) -> usize {
    let Some(cutoff) = now.checked_sub(max_age) else {
        return 0;
    };

    let mut removed = 0;
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Skipping unreadable entry in {}: {}", dir.display(), e);
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }

        let modified = entry.metadata().ok().and_then(|m| m.modified().ok());
        if modified.is_some_and(|time| time < cutoff) {
            match std::fs::remove_file(entry.path()) {
                Ok(()) => {
                    debug!("Removed expired file {}", entry.path().display());
                    removed += 1;
                }
                Err(e) => warn!("Failed to remove {}: {}", entry.path().display(), e),
            }
        }
    }
    removed
}

/// Start the periodic sweep, or return `None` when retention is disabled.
pub fn spawn(config: &StorageConfig) -> Option<JoinHandle<()>> {
    let max_age = config.retention()?;
    let dirs = [config.upload_dir.clone(), config.output_dir.clone()];
    let interval = Duration::from_secs(config.sweep_interval_secs.max(1));

    info!(
        "Retention janitor enabled - max age {}h, every {}s",
        config.retention_hours,
        interval.as_secs()
    );

    Some(tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;
            let dirs = dirs.clone();
            let removed = tokio::task::spawn_blocking(move || {
                let now = SystemTime::now();
                dirs.iter().map(|dir| sweep_dir(dir, max_age, now)).sum::<usize>()
            })
            .await
            .unwrap_or_else(|e| {
                warn!("Janitor sweep panicked: {}", e);
                0
            });
            if removed > 0 {
                info!("Janitor removed {} expired files", removed);
            }
        }
    }))
}
