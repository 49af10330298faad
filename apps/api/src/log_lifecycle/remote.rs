//! Remote tier: archive upload, retention sweep and statistics in object storage.

use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

use super::archive::is_expired;
use super::local::list_archives;
use super::{CleanupReport, FileFailure, LifecycleError};
use crate::storage::{ObjectInfo, ObjectStore};

const LOG_CONTENT_TYPE: &str = "text/plain; charset=utf-8";

#[derive(Debug, Clone, Default, Serialize)]
pub struct UploadReport {
    pub uploaded: Vec<String>,
    pub skipped_existing: usize,
    pub bytes_uploaded: u64,
    pub failed: Vec<FileFailure>,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct DateBucket {
    pub count: usize,
    pub size_bytes: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct RemoteStats {
    pub bucket: String,
    pub prefix: String,
    pub total_files: usize,
    pub total_size_bytes: u64,
    pub by_date: BTreeMap<String, DateBucket>,
}

fn listing_prefix(prefix: &str) -> String {
    format!("{}/", prefix.trim_end_matches('/'))
}

/// Puts every local archive under its date-prefixed key. Archives already
/// present remotely with the same size are skipped, so re-running after a
/// partial failure only sends what is missing.
pub async fn upload_archives(
    dir: PathBuf,
    store: &dyn ObjectStore,
    prefix: &str,
) -> Result<UploadReport, LifecycleError> {
    let archives = tokio::task::spawn_blocking(move || list_archives(&dir)).await??;
    let mut report = UploadReport::default();
    if archives.is_empty() {
        info!("No local log archives to upload");
        return Ok(report);
    }

    let existing: HashMap<String, u64> = match store.list(&listing_prefix(prefix)).await {
        Ok(objects) => objects.into_iter().map(|o| (o.key, o.size)).collect(),
        Err(e) => {
            warn!("Could not list existing log objects, uploading everything: {e}");
            HashMap::new()
        }
    };

    for archive in archives {
        let key = archive.name.remote_key(prefix);
        if existing.get(&key) == Some(&archive.size_bytes) {
            report.skipped_existing += 1;
            continue;
        }

        let body = match tokio::fs::read(&archive.path).await {
            Ok(body) => body,
            Err(e) => {
                warn!("Error reading {}: {e}", archive.path.display());
                report.failed.push(FileFailure {
                    file: archive.name.file_name(),
                    error: e.to_string(),
                });
                continue;
            }
        };

        let size = body.len() as u64;
        match store.put(&key, body, LOG_CONTENT_TYPE).await {
            Ok(()) => {
                report.bytes_uploaded += size;
                report.uploaded.push(key);
            }
            Err(e) => {
                warn!("Error uploading {} to object storage: {e}", archive.path.display());
                report.failed.push(FileFailure {
                    file: archive.name.file_name(),
                    error: e.to_string(),
                });
            }
        }
    }

    info!(
        uploaded = report.uploaded.len(),
        skipped = report.skipped_existing,
        failed = report.failed.len(),
        "Log archive upload finished"
    );
    Ok(report)
}

/// Deletes objects under `prefix` whose `last_modified` is strictly older
/// than `retention_days`.
pub async fn cleanup_remote(
    store: &dyn ObjectStore,
    prefix: &str,
    retention_days: u32,
    now: DateTime<Utc>,
    dry_run: bool,
) -> Result<CleanupReport, LifecycleError> {
    let mut report = CleanupReport::new(retention_days, dry_run);

    for object in store.list(&listing_prefix(prefix)).await? {
        if !is_expired(object.last_modified, now, retention_days) {
            report.retained += 1;
            continue;
        }
        if dry_run {
            report.record_deleted(object.key, object.size);
            continue;
        }
        match store.delete(&object.key).await {
            Ok(()) => report.record_deleted(object.key, object.size),
            Err(e) => {
                warn!("Error deleting {}: {e}", object.key);
                report.failed.push(FileFailure {
                    file: object.key,
                    error: e.to_string(),
                });
            }
        }
    }

    info!(
        dry_run,
        retention_days,
        deleted = report.deleted.len(),
        bytes_freed = report.bytes_freed,
        "Remote log cleanup finished"
    );
    Ok(report)
}

pub async fn remote_stats(
    store: &dyn ObjectStore,
    prefix: &str,
) -> Result<RemoteStats, LifecycleError> {
    let objects = store.list(&listing_prefix(prefix)).await?;

    let mut by_date: BTreeMap<String, DateBucket> = BTreeMap::new();
    for object in &objects {
        let bucket = by_date
            .entry(object.last_modified.format("%Y-%m-%d").to_string())
            .or_default();
        bucket.count += 1;
        bucket.size_bytes += object.size;
    }

    Ok(RemoteStats {
        bucket: store.bucket().to_string(),
        prefix: prefix.to_string(),
        total_files: objects.len(),
        total_size_bytes: objects.iter().map(|o| o.size).sum(),
        by_date,
    })
}

/// Most recently modified objects first.
pub async fn list_remote(
    store: &dyn ObjectStore,
    prefix: &str,
    limit: usize,
) -> Result<Vec<ObjectInfo>, LifecycleError> {
    let mut objects = store.list(&listing_prefix(prefix)).await?;
    objects.sort_by(|a, b| b.last_modified.cmp(&a.last_modified));
    objects.truncate(limit);
    Ok(objects)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::log_lifecycle::archive::ArchiveName;
    use crate::storage::memory::MemoryStore;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 30, 3, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn test_upload_uses_date_prefixed_keys() {
        let tmp = tempfile::tempdir().unwrap();
        let archive = ArchiveName::new("app", now() - Duration::days(2));
        std::fs::write(tmp.path().join(archive.file_name()), "hello").unwrap();
        std::fs::write(tmp.path().join("app.log"), "active content").unwrap();
        let store = MemoryStore::new();

        let report = upload_archives(tmp.path().to_path_buf(), &store, "logs")
            .await
            .unwrap();

        assert_eq!(report.uploaded, vec!["logs/2025/06/28/app.20250628_030000.log"]);
        assert_eq!(report.bytes_uploaded, 5);
        assert_eq!(store.keys(), vec!["logs/2025/06/28/app.20250628_030000.log"]);
        assert_eq!(
            store
                .content_type_of("logs/2025/06/28/app.20250628_030000.log")
                .as_deref(),
            Some(LOG_CONTENT_TYPE)
        );
    }

    #[tokio::test]
    async fn test_upload_is_idempotent() {
        let tmp = tempfile::tempdir().unwrap();
        let archive = ArchiveName::new("app", now());
        std::fs::write(tmp.path().join(archive.file_name()), "hello").unwrap();
        let store = MemoryStore::new();

        upload_archives(tmp.path().to_path_buf(), &store, "logs")
            .await
            .unwrap();
        let second = upload_archives(tmp.path().to_path_buf(), &store, "logs")
            .await
            .unwrap();

        assert!(second.uploaded.is_empty());
        assert_eq!(second.skipped_existing, 1);
    }

    #[tokio::test]
    async fn test_upload_failure_does_not_stop_batch() {
        let tmp = tempfile::tempdir().unwrap();
        let bad = ArchiveName::new("app", now() - Duration::days(1));
        let good = ArchiveName::new("errors", now());
        std::fs::write(tmp.path().join(bad.file_name()), "a").unwrap();
        std::fs::write(tmp.path().join(good.file_name()), "b").unwrap();
        let store = MemoryStore::new();
        store.fail_on(&bad.remote_key("logs"));

        let report = upload_archives(tmp.path().to_path_buf(), &store, "logs")
            .await
            .unwrap();

        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].file, bad.file_name());
        assert_eq!(report.uploaded, vec![good.remote_key("logs")]);
    }

    #[tokio::test]
    async fn test_remote_cleanup_respects_retention() {
        let store = MemoryStore::new();
        store.insert_with_modified("logs/2024/01/01/app.20240101_000000.log", b"old", now() - Duration::days(181));
        store.insert_with_modified("logs/2025/01/01/app.20250101_000000.log", b"edge", now() - Duration::days(180));
        store.insert_with_modified("logs/2025/06/29/app.20250629_000000.log", b"new", now() - Duration::days(1));
        store.insert_with_modified("resumes/x/cv.pdf", b"pdf", now() - Duration::days(900));

        let report = cleanup_remote(&store, "logs", 180, now(), false).await.unwrap();

        assert_eq!(report.deleted, vec!["logs/2024/01/01/app.20240101_000000.log"]);
        assert_eq!(report.bytes_freed, 3);
        assert_eq!(report.retained, 2);
        assert_eq!(store.keys().len(), 3);
        assert!(store.keys().contains(&"resumes/x/cv.pdf".to_string()));
    }

    #[tokio::test]
    async fn test_remote_cleanup_dry_run_deletes_nothing() {
        let store = MemoryStore::new();
        store.insert_with_modified("logs/old.log", b"old", now() - Duration::days(400));

        let report = cleanup_remote(&store, "logs", 180, now(), true).await.unwrap();

        assert_eq!(report.deleted.len(), 1);
        assert_eq!(store.keys(), vec!["logs/old.log"]);
    }

    #[tokio::test]
    async fn test_remote_cleanup_records_failed_delete() {
        let store = MemoryStore::new();
        store.insert_with_modified("logs/a.log", b"a", now() - Duration::days(400));
        store.insert_with_modified("logs/b.log", b"b", now() - Duration::days(400));
        store.fail_on("logs/a.log");

        let report = cleanup_remote(&store, "logs", 180, now(), false).await.unwrap();

        assert_eq!(report.deleted, vec!["logs/b.log"]);
        assert_eq!(report.failed.len(), 1);
    }

    #[tokio::test]
    async fn test_remote_stats_grouped_by_date() {
        let store = MemoryStore::new();
        let day = Utc.with_ymd_and_hms(2025, 6, 1, 10, 0, 0).unwrap();
        store.insert_with_modified("logs/a.log", b"12", day);
        store.insert_with_modified("logs/b.log", b"345", day + Duration::hours(5));
        store.insert_with_modified("logs/c.log", b"6", day + Duration::days(1));

        let stats = remote_stats(&store, "logs").await.unwrap();

        assert_eq!(stats.total_files, 3);
        assert_eq!(stats.total_size_bytes, 6);
        assert_eq!(
            stats.by_date.get("2025-06-01"),
            Some(&DateBucket {
                count: 2,
                size_bytes: 5
            })
        );
        assert_eq!(stats.by_date.get("2025-06-02").map(|b| b.count), Some(1));
    }

    #[tokio::test]
    async fn test_list_remote_newest_first_with_limit() {
        let store = MemoryStore::new();
        store.insert_with_modified("logs/a.log", b"a", now() - Duration::days(3));
        store.insert_with_modified("logs/b.log", b"b", now() - Duration::days(1));
        store.insert_with_modified("logs/c.log", b"c", now() - Duration::days(2));

        let listed = list_remote(&store, "logs", 2).await.unwrap();
        let keys: Vec<_> = listed.iter().map(|o| o.key.as_str()).collect();
        assert_eq!(keys, vec!["logs/b.log", "logs/c.log"]);
    }
}
