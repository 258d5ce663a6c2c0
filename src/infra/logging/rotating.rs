//! Size-rotating log file on top of `file-rotate`.
//!
//! Backups are named `<filename>.<YYYYMMDDTHHMMSS>`, with a `.N` counter when
//! several rotations land in the same second and `.gz` when compressed. The
//! active file and its directory are created on the first write.

use std::fmt;
use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;

use chrono::Duration;
use file_rotate::compression::Compression;
use file_rotate::suffix::{AppendTimestamp, FileLimit};
use file_rotate::{ContentLimit, FileRotate};

use crate::config::{LoggerConfig, BYTES_PER_MEGABYTE, DEFAULT_LOG_MAX_FILE_SIZE_MB};

/// When to rotate and what to keep.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RotationPolicy {
    /// Rotate once the file has grown past this many bytes
    pub max_bytes: usize,
    /// Backups to keep, newest first; 0 keeps all
    pub max_backups: usize,
    /// Age limit for backups when no count limit is set; 0 disables it
    pub max_age_days: u32,
    /// Gzip backups on rotation
    pub compress: bool,
}

impl From<&LoggerConfig> for RotationPolicy {
    fn from(config: &LoggerConfig) -> Self {
        let megabytes = match config.max_file_size_mb {
            0 => DEFAULT_LOG_MAX_FILE_SIZE_MB,
            mb => mb,
        };

        Self {
            max_bytes: usize::try_from(megabytes.saturating_mul(BYTES_PER_MEGABYTE))
                .unwrap_or(usize::MAX),
            max_backups: config.max_backups,
            max_age_days: config.max_age_days,
            compress: config.compress,
        }
    }
}

impl RotationPolicy {
    fn content_limit(&self) -> ContentLimit {
        // Whole records only; a record is never split across two files.
        ContentLimit::BytesSurpassed(self.max_bytes.max(1))
    }

    fn file_limit(&self) -> FileLimit {
        if self.max_backups > 0 {
            FileLimit::MaxFiles(self.max_backups)
        } else if self.max_age_days > 0 {
            FileLimit::Age(Duration::days(i64::from(self.max_age_days)))
        } else {
            FileLimit::Unlimited
        }
    }

    fn compression(&self) -> Compression {
        if self.compress {
            Compression::OnRotate(0)
        } else {
            Compression::None
        }
    }
}

/// Rotating log file, opened on the first write.
pub struct RotatingLog {
    path: PathBuf,
    policy: RotationPolicy,
    file: Option<FileRotate<AppendTimestamp>>,
}

impl fmt::Debug for RotatingLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RotatingLog")
            .field("path", &self.path)
            .field("policy", &self.policy)
            .field("open", &self.file.is_some())
            .finish()
    }
}

impl RotatingLog {
    pub fn new(path: impl Into<PathBuf>, policy: RotationPolicy) -> Self {
        Self {
            path: path.into(),
            policy,
            file: None,
        }
    }

    fn open(&mut self) -> io::Result<&mut FileRotate<AppendTimestamp>> {
        let file = match self.file.take() {
            Some(file) => file,
            None => {
                if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
                    fs::create_dir_all(dir)?;
                }
                FileRotate::new(
                    &self.path,
                    AppendTimestamp::default(self.policy.file_limit()),
                    self.policy.content_limit(),
                    self.policy.compression(),
                    #[cfg(unix)]
                    None,
                )
            }
        };
        Ok(self.file.insert(file))
    }
}

impl Write for RotatingLog {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.open()?.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        match self.file.as_mut() {
            Some(file) => file.flush(),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use tempfile::TempDir;

    use super::*;

    fn policy(max_bytes: usize, max_backups: usize, compress: bool) -> RotationPolicy {
        RotationPolicy {
            max_bytes,
            max_backups,
            max_age_days: 0,
            compress,
        }
    }

    fn logger_config(max_file_size_mb: u64) -> LoggerConfig {
        LoggerConfig {
            filename: PathBuf::from("app.log"),
            max_file_size_mb,
            max_backups: 3,
            max_age_days: 7,
            compress: true,
            local_time: false,
        }
    }

    fn log_files(dir: &Path) -> Vec<PathBuf> {
        let mut files: Vec<PathBuf> = fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().path())
            .filter(|p| {
                p.file_name()
                    .is_some_and(|n| n.to_string_lossy().starts_with("app.log"))
            })
            .collect();
        files.sort();
        files
    }

    fn backups(dir: &Path) -> Vec<PathBuf> {
        log_files(dir)
            .into_iter()
            .filter(|p| p.file_name().is_some_and(|n| n.to_string_lossy() != "app.log"))
            .collect()
    }

    #[test]
    fn test_policy_converts_megabytes() {
        let policy = RotationPolicy::from(&logger_config(16));

        assert_eq!(policy.max_bytes, 16 * 1024 * 1024);
        assert_eq!(policy.max_backups, 3);
        assert_eq!(policy.max_age_days, 7);
        assert!(policy.compress);
    }

    #[test]
    fn test_zero_size_limit_falls_back_to_default() {
        let policy = RotationPolicy::from(&logger_config(0));

        assert_eq!(
            policy.max_bytes as u64,
            DEFAULT_LOG_MAX_FILE_SIZE_MB * BYTES_PER_MEGABYTE
        );
    }

    #[test]
    fn test_file_and_directory_are_created_on_first_write() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("app.log");
        let mut log = RotatingLog::new(&path, policy(1024, 0, false));

        log.flush().unwrap();
        assert!(!path.exists());

        log.write_all(b"hello\n").unwrap();
        log.flush().unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "hello\n");
    }

    #[test]
    fn test_fast_rotations_keep_every_line() {
        let dir = TempDir::new().unwrap();
        let mut log = RotatingLog::new(dir.path().join("app.log"), policy(4, 0, false));

        for i in 0..200 {
            log.write_all(format!("{i:03}\n").as_bytes()).unwrap();
        }
        log.flush().unwrap();

        let mut lines: Vec<String> = log_files(dir.path())
            .iter()
            .flat_map(|p| {
                fs::read_to_string(p)
                    .unwrap()
                    .lines()
                    .map(str::to_string)
                    .collect::<Vec<_>>()
            })
            .collect();
        lines.sort();

        let expected: Vec<String> = (0..200).map(|i| format!("{i:03}")).collect();
        assert_eq!(lines, expected);
    }

    #[test]
    fn test_old_backups_are_pruned_by_count() {
        let dir = TempDir::new().unwrap();
        let mut log = RotatingLog::new(dir.path().join("app.log"), policy(4, 2, false));

        for i in 0..20 {
            log.write_all(format!("l{i:02}\n").as_bytes()).unwrap();
        }
        log.flush().unwrap();

        let kept = backups(dir.path());
        assert!(!kept.is_empty() && kept.len() <= 2, "kept {kept:?}");

        let contents: String = log_files(dir.path())
            .iter()
            .map(|p| fs::read_to_string(p).unwrap())
            .collect();
        assert!(!contents.contains("l00"));
        assert!(contents.contains("l19"));
    }

    #[test]
    fn test_backups_are_gzipped_when_enabled() {
        let dir = TempDir::new().unwrap();
        let mut log = RotatingLog::new(dir.path().join("app.log"), policy(4, 0, true));

        for i in 0..6 {
            log.write_all(format!("c{i:02}\n").as_bytes()).unwrap();
        }
        log.flush().unwrap();

        let compressed = backups(dir.path());
        assert!(!compressed.is_empty());
        for backup in compressed {
            assert!(backup.to_string_lossy().ends_with(".gz"), "{backup:?}");
            let bytes = fs::read(&backup).unwrap();
            assert_eq!(&bytes[..2], &[0x1f, 0x8b]);
        }
    }
}
