//! Local tier: rotation, retention sweep and statistics over the log directory.
//!
//! Everything here is blocking filesystem work; async callers go through
//! `tokio::task::spawn_blocking`.

use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use super::archive::{age_days, classify, is_expired, ArchiveName, LogFileKind};
use super::{CleanupReport, FileFailure, LifecycleError};

#[derive(Debug, Clone, Serialize)]
pub struct RotatedFile {
    pub active: String,
    pub archive: String,
    pub size_bytes: u64,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct RotationReport {
    pub rotated: Vec<RotatedFile>,
    pub skipped_empty: usize,
    pub failed: Vec<FileFailure>,
}

#[derive(Debug, Clone)]
pub struct LocalArchive {
    pub path: PathBuf,
    pub name: ArchiveName,
    pub size_bytes: u64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FileKind {
    Active,
    Archive,
}

#[derive(Debug, Clone, Serialize)]
pub struct LocalFileStat {
    pub file_name: String,
    pub kind: FileKind,
    pub size_bytes: u64,
    pub modified: Option<DateTime<Utc>>,
    pub age_days: Option<i64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LocalStats {
    pub dir: String,
    pub exists: bool,
    pub total_files: usize,
    pub total_size_bytes: u64,
    pub files: Vec<LocalFileStat>,
}

struct DirEntryInfo {
    path: PathBuf,
    file_name: String,
    kind: LogFileKind,
    metadata: fs::Metadata,
}

/// Log files in `dir`, sorted by name. A missing directory yields nothing.
fn scan(dir: &Path) -> Result<Vec<DirEntryInfo>, LifecycleError> {
    if !dir.exists() {
        return Ok(Vec::new());
    }
    let read = fs::read_dir(dir).map_err(|e| LifecycleError::io(dir, e))?;

    let mut entries = Vec::new();
    for entry in read {
        let entry = entry.map_err(|e| LifecycleError::io(dir, e))?;
        let path = entry.path();
        let Some(file_name) = path.file_name().and_then(|n| n.to_str()).map(String::from) else {
            continue;
        };
        let Some(kind) = classify(&file_name) else {
            continue;
        };
        let metadata = match entry.metadata() {
            Ok(m) if m.is_file() => m,
            Ok(_) => continue,
            Err(e) => {
                warn!("Skipping {}: {e}", path.display());
                continue;
            }
        };
        entries.push(DirEntryInfo {
            path,
            file_name,
            kind,
            metadata,
        });
    }
    entries.sort_by(|a, b| a.file_name.cmp(&b.file_name));
    Ok(entries)
}

/// Moves every non-empty active log file to its dated archive name and
/// recreates an empty active file in its place.
pub fn rotate(dir: &Path, now: DateTime<Utc>) -> Result<RotationReport, LifecycleError> {
    let mut report = RotationReport::default();

    for entry in scan(dir)? {
        let LogFileKind::Active { stem } = &entry.kind else {
            continue;
        };
        let size_bytes = entry.metadata.len();
        if size_bytes == 0 {
            report.skipped_empty += 1;
            continue;
        }

        let archive = ArchiveName::new(stem, now).file_name();
        let target = dir.join(&archive);
        if target.exists() {
            report.failed.push(FileFailure {
                file: entry.file_name.clone(),
                error: format!("archive {archive} already exists"),
            });
            continue;
        }

        if let Err(e) = fs::rename(&entry.path, &target) {
            warn!("Failed to rotate {}: {e}", entry.file_name);
            report.failed.push(FileFailure {
                file: entry.file_name.clone(),
                error: e.to_string(),
            });
            continue;
        }

        if let Err(e) = OpenOptions::new().create(true).append(true).open(&entry.path) {
            warn!("Rotated {} but could not recreate it: {e}", entry.file_name);
        }

        debug!("Rotated {} -> {archive}", entry.file_name);
        report.rotated.push(RotatedFile {
            active: entry.file_name,
            archive,
            size_bytes,
        });
    }

    if report.rotated.is_empty() {
        info!("No log files needed rotation in {}", dir.display());
    } else {
        info!("Log rotation completed: {} files rotated", report.rotated.len());
    }
    Ok(report)
}

/// Archives currently on disk, oldest first.
pub fn list_archives(dir: &Path) -> Result<Vec<LocalArchive>, LifecycleError> {
    let mut archives: Vec<LocalArchive> = scan(dir)?
        .into_iter()
        .filter_map(|entry| match entry.kind {
            LogFileKind::Archive(name) => Some(LocalArchive {
                path: entry.path,
                name,
                size_bytes: entry.metadata.len(),
            }),
            LogFileKind::Active { .. } => None,
        })
        .collect();
    archives.sort_by_key(|a| a.name.rotated_at);
    Ok(archives)
}

/// Deletes archives strictly older than `retention_days`. Active files are
/// never touched. Per-file failures are recorded and the sweep continues.
pub fn cleanup_local(
    dir: &Path,
    retention_days: u32,
    now: DateTime<Utc>,
    dry_run: bool,
) -> Result<CleanupReport, LifecycleError> {
    let mut report = CleanupReport::new(retention_days, dry_run);

    for archive in list_archives(dir)? {
        let file_name = archive.name.file_name();
        if !is_expired(archive.name.rotated_at, now, retention_days) {
            report.retained += 1;
            continue;
        }
        if dry_run {
            report.record_deleted(file_name, archive.size_bytes);
            continue;
        }
        match fs::remove_file(&archive.path) {
            Ok(()) => report.record_deleted(file_name, archive.size_bytes),
            Err(e) => {
                warn!("Error deleting {}: {e}", archive.path.display());
                report.failed.push(FileFailure {
                    file: file_name,
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
        "Local log cleanup finished"
    );
    Ok(report)
}

pub fn local_stats(dir: &Path, now: DateTime<Utc>) -> Result<LocalStats, LifecycleError> {
    let exists = dir.exists();
    let mut files = Vec::new();
    let mut total_size_bytes = 0;

    for entry in scan(dir)? {
        let size_bytes = entry.metadata.len();
        total_size_bytes += size_bytes;
        let modified = entry.metadata.modified().ok().map(DateTime::<Utc>::from);
        let (kind, dated) = match &entry.kind {
            LogFileKind::Active { .. } => (FileKind::Active, modified),
            LogFileKind::Archive(name) => (FileKind::Archive, Some(name.rotated_at)),
        };
        files.push(LocalFileStat {
            file_name: entry.file_name,
            kind,
            size_bytes,
            modified,
            age_days: dated.map(|d| age_days(d, now)),
        });
    }

    Ok(LocalStats {
        dir: dir.display().to_string(),
        exists,
        total_files: files.len(),
        total_size_bytes,
        files,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 30, 3, 0, 0).unwrap()
    }

    fn write(dir: &Path, name: &str, content: &str) {
        fs::write(dir.join(name), content).unwrap();
    }

    fn archive_named(stem: &str, days_ago: i64) -> String {
        ArchiveName::new(stem, now() - Duration::days(days_ago)).file_name()
    }

    #[test]
    fn test_rotate_moves_non_empty_and_recreates_active() {
        let tmp = tempfile::tempdir().unwrap();
        write(tmp.path(), "app.log", "line one\nline two\n");
        write(tmp.path(), "access.log", "");
        write(tmp.path(), "README.txt", "not a log");

        let report = rotate(tmp.path(), now()).unwrap();

        assert_eq!(report.rotated.len(), 1);
        assert_eq!(report.rotated[0].active, "app.log");
        assert_eq!(report.rotated[0].archive, "app.20250630_030000.log");
        assert_eq!(report.skipped_empty, 1);
        assert!(report.failed.is_empty());

        let archived = fs::read_to_string(tmp.path().join("app.20250630_030000.log")).unwrap();
        assert_eq!(archived, "line one\nline two\n");
        assert_eq!(fs::metadata(tmp.path().join("app.log")).unwrap().len(), 0);
        assert!(tmp.path().join("README.txt").exists());
    }

    #[test]
    fn test_rotate_covers_every_component_file() {
        use tracing_subscriber::layer::SubscriberExt;

        let tmp = tempfile::tempdir().unwrap();
        let subscriber =
            tracing_subscriber::registry().with(crate::telemetry::file_layers(tmp.path()));
        tracing::subscriber::with_default(subscriber, || {
            tracing::info!(target: concat!(env!("CARGO_CRATE_NAME"), "::llm_client"), "called model");
            tracing::warn!(target: concat!(env!("CARGO_CRATE_NAME"), "::storage"), "slow put");
        });

        let report = rotate(tmp.path(), now()).unwrap();

        let mut rotated: Vec<_> = report.rotated.iter().map(|r| r.active.as_str()).collect();
        rotated.sort_unstable();
        assert_eq!(rotated, vec!["app.log", "llm.log", "s3.log"]);
        assert!(report.failed.is_empty());
        assert!(fs::read_to_string(tmp.path().join("s3.20250630_030000.log"))
            .unwrap()
            .contains("slow put"));
        assert_eq!(fs::metadata(tmp.path().join("llm.log")).unwrap().len(), 0);
    }

    #[test]
    fn test_rotate_never_rotates_archives() {
        let tmp = tempfile::tempdir().unwrap();
        write(tmp.path(), &archive_named("app", 2), "old");

        let report = rotate(tmp.path(), now()).unwrap();
        assert!(report.rotated.is_empty());
        assert_eq!(report.skipped_empty, 0);
    }

    #[test]
    fn test_rotate_collision_is_reported_not_overwritten() {
        let tmp = tempfile::tempdir().unwrap();
        write(tmp.path(), "app.log", "new content");
        write(tmp.path(), "app.20250630_030000.log", "earlier rotation");

        let report = rotate(tmp.path(), now()).unwrap();
        assert!(report.rotated.is_empty());
        assert_eq!(report.failed.len(), 1);
        assert_eq!(
            fs::read_to_string(tmp.path().join("app.20250630_030000.log")).unwrap(),
            "earlier rotation"
        );
    }

    #[test]
    fn test_rotate_missing_dir_is_empty_report() {
        let tmp = tempfile::tempdir().unwrap();
        let report = rotate(&tmp.path().join("absent"), now()).unwrap();
        assert!(report.rotated.is_empty());
    }

    #[test]
    fn test_cleanup_deletes_only_archives_past_retention() {
        let tmp = tempfile::tempdir().unwrap();
        let expired = archive_named("app", 31);
        let boundary = archive_named("app", 30);
        let fresh = archive_named("app", 1);
        write(tmp.path(), &expired, "0123456789");
        write(tmp.path(), &boundary, "x");
        write(tmp.path(), &fresh, "y");
        write(tmp.path(), "app.log", "active");

        let report = cleanup_local(tmp.path(), 30, now(), false).unwrap();

        assert_eq!(report.deleted, vec![expired.clone()]);
        assert_eq!(report.bytes_freed, 10);
        assert_eq!(report.retained, 2);
        assert!(!tmp.path().join(&expired).exists());
        assert!(tmp.path().join(&boundary).exists());
        assert!(tmp.path().join(&fresh).exists());
        assert!(tmp.path().join("app.log").exists());
    }

    #[test]
    fn test_cleanup_dry_run_keeps_files() {
        let tmp = tempfile::tempdir().unwrap();
        let expired = archive_named("errors", 200);
        write(tmp.path(), &expired, "stale");

        let report = cleanup_local(tmp.path(), 180, now(), true).unwrap();

        assert!(report.dry_run);
        assert_eq!(report.deleted, vec![expired.clone()]);
        assert!(tmp.path().join(&expired).exists());
    }

    #[test]
    fn test_list_archives_oldest_first() {
        let tmp = tempfile::tempdir().unwrap();
        write(tmp.path(), &archive_named("b", 1), "1");
        write(tmp.path(), &archive_named("a", 5), "5");
        write(tmp.path(), "app.log", "active");

        let archives = list_archives(tmp.path()).unwrap();
        let stems: Vec<_> = archives.iter().map(|a| a.name.stem.as_str()).collect();
        assert_eq!(stems, vec!["a", "b"]);
    }

    #[test]
    fn test_local_stats_counts_every_log_file() {
        let tmp = tempfile::tempdir().unwrap();
        write(tmp.path(), "app.log", "abc");
        write(tmp.path(), &archive_named("app", 3), "defg");

        let stats = local_stats(tmp.path(), now()).unwrap();
        assert!(stats.exists);
        assert_eq!(stats.total_files, 2);
        assert_eq!(stats.total_size_bytes, 7);
        let archive = stats
            .files
            .iter()
            .find(|f| matches!(f.kind, FileKind::Archive))
            .unwrap();
        assert_eq!(archive.age_days, Some(3));
    }
}
