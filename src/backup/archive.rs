// mongobackup/src/backup/archive.rs
use chrono::{DateTime, NaiveDate, Utc};
#[cfg(test)]
use std::path::Path;
use tempfile::TempPath;

const KEY_PREFIX: &str = "mongodb-backup-";
const KEY_SUFFIX: &str = ".gzip";

/// Object key for the archive of a given calendar day.
///
/// One key per UTC day; keys sort lexicographically in date order.
pub fn archive_key(date: NaiveDate) -> String {
    format!("{}{}{}", KEY_PREFIX, date.format("%Y-%m-%d"), KEY_SUFFIX)
}

/// A point-in-time snapshot identified by its day slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupArchive {
    pub key: String,
    pub created_at: DateTime<Utc>,
}

impl BackupArchive {
    pub fn for_instant(now: DateTime<Utc>) -> Self {
        BackupArchive {
            key: archive_key(now.date_naive()),
            created_at: now,
        }
    }
}

/// Bytes of an archive, either in a transient local file or in memory.
///
/// A file payload owns its path: dropping the payload deletes the file, so a
/// backup abandoned halfway never leaves an archive behind.
#[derive(Debug)]
pub enum ArchivePayload {
    File(TempPath),
    Memory(Vec<u8>),
}

impl ArchivePayload {
    #[cfg(test)]
    pub fn path(&self) -> Option<&Path> {
        match self {
            ArchivePayload::File(path) => Some(&**path),
            ArchivePayload::Memory(_) => None,
        }
    }

    /// Size in bytes of the payload.
    pub async fn len(&self) -> std::io::Result<u64> {
        match self {
            ArchivePayload::File(path) => Ok(tokio::fs::metadata(path).await?.len()),
            ArchivePayload::Memory(bytes) => Ok(bytes.len() as u64),
        }
    }

    pub async fn read_all(&self) -> std::io::Result<Vec<u8>> {
        match self {
            ArchivePayload::File(path) => tokio::fs::read(path).await,
            ArchivePayload::Memory(bytes) => Ok(bytes.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_key_format() {
        assert_eq!(archive_key(day(2024, 3, 10)), "mongodb-backup-2024-03-10.gzip");
    }

    #[test]
    fn test_key_is_deterministic_and_distinct_per_day() {
        assert_eq!(archive_key(day(2024, 3, 10)), archive_key(day(2024, 3, 10)));
        assert_ne!(archive_key(day(2024, 3, 10)), archive_key(day(2024, 3, 11)));
        assert_ne!(archive_key(day(2024, 3, 10)), archive_key(day(2025, 3, 10)));
    }

    #[test]
    fn test_keys_sort_by_date() {
        let mut keys = vec![
            archive_key(day(2024, 12, 1)),
            archive_key(day(2023, 1, 31)),
            archive_key(day(2024, 2, 9)),
        ];
        keys.sort();
        assert_eq!(
            keys,
            vec![
                "mongodb-backup-2023-01-31.gzip",
                "mongodb-backup-2024-02-09.gzip",
                "mongodb-backup-2024-12-01.gzip",
            ]
        );
    }

    #[test]
    fn test_archive_uses_utc_day() {
        let late = Utc.with_ymd_and_hms(2024, 3, 10, 23, 59, 59).unwrap();
        let early = Utc.with_ymd_and_hms(2024, 3, 10, 0, 0, 0).unwrap();
        assert_eq!(BackupArchive::for_instant(late).key, BackupArchive::for_instant(early).key);

        let next = Utc.with_ymd_and_hms(2024, 3, 11, 0, 0, 0).unwrap();
        assert_eq!(BackupArchive::for_instant(next).key, "mongodb-backup-2024-03-11.gzip");
    }

    #[tokio::test]
    async fn test_payload_len_and_read() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let temp = tempfile::NamedTempFile::new_in(dir.path())?.into_temp_path();
        let path = temp.to_path_buf();
        tokio::fs::write(&path, b"abcdef").await?;

        let file = ArchivePayload::File(temp);
        assert_eq!(file.len().await?, 6);
        assert_eq!(file.read_all().await?, b"abcdef".to_vec());
        assert_eq!(file.path(), Some(path.as_path()));

        drop(file);
        assert!(!path.exists());

        let mem = ArchivePayload::Memory(vec![1, 2, 3]);
        assert_eq!(mem.len().await?, 3);
        assert!(mem.path().is_none());
        Ok(())
    }
}
