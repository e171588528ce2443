//! Sweep of orphaned records
//!
//! A record whose check never reached `end` (crash, operator abort) stays in
//! the local record directory and is never seen by the collector. Records
//! older than a configured age are removed here; the collector does not
//! garbage-collect them.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sn1ff_core::fail_open::fail_open;
use sn1ff_core::{Result, Sn1ffError};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tracing::{debug, info};

/// File extension of records opened by the collector
pub const RECORD_EXTENSION: &str = "snff";

/// Outcome of one sweep
#[derive(Debug, Clone, Serialize)]
pub struct SweepReport {
    pub dir: PathBuf,
    pub swept_at: DateTime<Utc>,
    /// Record files inspected
    pub scanned: usize,
    pub removed: Vec<PathBuf>,
    /// Expired records that could not be removed
    pub failed: usize,
}

impl SweepReport {
    fn empty(dir: &Path) -> Self {
        Self {
            dir: dir.to_path_buf(),
            swept_at: Utc::now(),
            scanned: 0,
            removed: Vec::new(),
            failed: 0,
        }
    }
}

fn is_record(path: &Path) -> bool {
    path.extension().and_then(|e| e.to_str()) == Some(RECORD_EXTENSION)
}

/// What happened to one record during a sweep
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RecordOutcome {
    /// Not a regular file, or gone before it could be inspected
    Skipped,
    Kept,
    Removed,
    Failed,
}

/// Inspect one record and remove it when it is at least `max_age` old
///
/// A record that disappears mid-sweep (its check ended concurrently) is
/// skipped. Any other failure is logged and reported as `Failed`.
async fn sweep_record(path: &Path, now: SystemTime, max_age: Duration) -> RecordOutcome {
    let age = fail_open("sweep::stat", || async {
        match tokio::fs::symlink_metadata(path).await {
            Ok(metadata) if metadata.is_file() => metadata
                .modified()
                .map(|modified| Some(now.duration_since(modified).unwrap_or(Duration::ZERO)))
                .map_err(Sn1ffError::from),
            Ok(_) => Ok(None),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("Record {} vanished before inspection", path.display());
                Ok(None)
            }
            Err(e) => Err(Sn1ffError::from(e)),
        }
    })
    .await;

    let age = match age {
        Some(Some(age)) => age,
        Some(None) => return RecordOutcome::Skipped,
        None => return RecordOutcome::Failed,
    };
    if age < max_age {
        return RecordOutcome::Kept;
    }

    debug!("Removing orphaned record {} (age {:?})", path.display(), age);
    let removed = fail_open("sweep::remove", || async {
        match tokio::fs::remove_file(path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(Sn1ffError::from(e)),
        }
    })
    .await;

    match removed {
        Some(true) => RecordOutcome::Removed,
        Some(false) => RecordOutcome::Skipped,
        None => RecordOutcome::Failed,
    }
}

/// Remove records in `dir` last modified at least `max_age` ago
///
/// Only regular `.snff` files are considered. A missing directory yields an
/// empty report. Records that vanish while the sweep runs are ignored; a
/// record that cannot be inspected or removed is logged and counted.
pub async fn sweep_orphans(dir: &Path, max_age: Duration) -> Result<SweepReport> {
    let mut report = SweepReport::empty(dir);

    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!("Record directory {} does not exist", dir.display());
            return Ok(report);
        }
        Err(e) => return Err(e.into()),
    };

    let now = SystemTime::now();
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if !is_record(&path) {
            continue;
        }

        match sweep_record(&path, now, max_age).await {
            RecordOutcome::Skipped => continue,
            RecordOutcome::Kept => {}
            RecordOutcome::Removed => report.removed.push(path),
            RecordOutcome::Failed => report.failed += 1,
        }
        report.scanned += 1;
    }

    info!(
        "Swept {}: {} scanned, {} removed, {} failed",
        dir.display(),
        report.scanned,
        report.removed.len(),
        report.failed
    );
    Ok(report)
}
