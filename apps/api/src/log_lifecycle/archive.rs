use chrono::{DateTime, NaiveDateTime, Utc};

const LOG_EXTENSION: &str = ".log";
const STAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// A rotated log file: `{stem}.{YYYYmmdd_HHMMSS}.log`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveName {
    pub stem: String,
    pub rotated_at: DateTime<Utc>,
}

impl ArchiveName {
    pub fn new(stem: &str, rotated_at: DateTime<Utc>) -> Self {
        // Sub-second precision is not representable in the file name.
        let rotated_at = DateTime::<Utc>::from_timestamp(rotated_at.timestamp(), 0)
            .unwrap_or(rotated_at);
        Self {
            stem: stem.to_string(),
            rotated_at,
        }
    }

    pub fn parse(file_name: &str) -> Option<Self> {
        let base = file_name.strip_suffix(LOG_EXTENSION)?;
        let (stem, stamp) = base.rsplit_once('.')?;
        if stem.is_empty() {
            return None;
        }
        let naive = NaiveDateTime::parse_from_str(stamp, STAMP_FORMAT).ok()?;
        Some(Self {
            stem: stem.to_string(),
            rotated_at: naive.and_utc(),
        })
    }

    pub fn file_name(&self) -> String {
        format!(
            "{}.{}{}",
            self.stem,
            self.rotated_at.format(STAMP_FORMAT),
            LOG_EXTENSION
        )
    }

    /// Date-prefixed object key: `{prefix}/{YYYY}/{MM}/{DD}/{file name}`.
    pub fn remote_key(&self, prefix: &str) -> String {
        format!(
            "{}/{}/{}",
            prefix.trim_end_matches('/'),
            self.rotated_at.format("%Y/%m/%d"),
            self.file_name()
        )
    }
}

/// Classification of a file inside the log directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogFileKind {
    /// Currently written to, e.g. `app.log`.
    Active { stem: String },
    Archive(ArchiveName),
}

pub fn classify(file_name: &str) -> Option<LogFileKind> {
    if let Some(archive) = ArchiveName::parse(file_name) {
        return Some(LogFileKind::Archive(archive));
    }
    let stem = file_name.strip_suffix(LOG_EXTENSION)?;
    if stem.is_empty() {
        return None;
    }
    Some(LogFileKind::Active {
        stem: stem.to_string(),
    })
}

/// Whole days elapsed between `then` and `now`, floored; never negative.
pub fn age_days(then: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    (now - then).num_days().max(0)
}

/// An artifact is eligible for deletion once it is strictly older than the
/// retention window; an artifact exactly `retention_days` old is kept.
pub fn is_expired(then: DateTime<Utc>, now: DateTime<Utc>, retention_days: u32) -> bool {
    age_days(then, now) > i64::from(retention_days)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, s).unwrap()
    }

    #[test]
    fn test_archive_file_name_and_parse() {
        let archive = ArchiveName::new("app", at(2025, 3, 7, 14, 5, 9));
        assert_eq!(archive.file_name(), "app.20250307_140509.log");
        assert_eq!(ArchiveName::parse("app.20250307_140509.log"), Some(archive));
    }

    #[test]
    fn test_remote_key_is_date_prefixed() {
        let archive = ArchiveName::new("access", at(2025, 12, 1, 0, 0, 0));
        assert_eq!(
            archive.remote_key("logs/"),
            "logs/2025/12/01/access.20251201_000000.log"
        );
    }

    #[test]
    fn test_dotted_stem_survives() {
        let archive = ArchiveName::parse("resume.worker.20250101_010203.log").unwrap();
        assert_eq!(archive.stem, "resume.worker");
    }

    #[test]
    fn test_classify_active_and_other_files() {
        assert_eq!(
            classify("app.log"),
            Some(LogFileKind::Active {
                stem: "app".to_string()
            })
        );
        assert_eq!(
            classify("my.service.log"),
            Some(LogFileKind::Active {
                stem: "my.service".to_string()
            })
        );
        assert!(matches!(
            classify("app.20250101_000000.log"),
            Some(LogFileKind::Archive(_))
        ));
        assert_eq!(classify("notes.txt"), None);
        assert_eq!(classify(".log"), None);
    }

    #[test]
    fn test_retention_boundary() {
        let now = at(2025, 6, 30, 12, 0, 0);
        assert!(!is_expired(now - Duration::days(30), now, 30));
        assert!(!is_expired(now - Duration::days(30) - Duration::hours(23), now, 30));
        assert!(is_expired(now - Duration::days(31), now, 30));
    }

    #[test]
    fn test_future_timestamp_has_zero_age() {
        let now = at(2025, 1, 1, 0, 0, 0);
        assert_eq!(age_days(now + Duration::days(3), now), 0);
    }
}
