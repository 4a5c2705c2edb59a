//! Rotated file naming and retention sweeps
//!
//! Rotated files live next to the active file and are named
//! `<base>.<YYYY-MM-DD>` (with a trailing `.<n>` when a date is reused).
//! [`RetentionPolicy::sweep`] deletes the ones whose modification time is
//! older than the retention window. Both the rotating writer and the
//! retention scheduler go through it.

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use chrono::NaiveDate;
use tracing::{debug, info, warn};

use crate::domain::models::RetentionConfig;

/// strftime pattern of the date stamp in rotated file names
pub const ROTATION_DATE_FORMAT: &str = "%Y-%m-%d";

const SECONDS_PER_DAY: u64 = 86_400;

/// Name of the file a period starting on `date` is rotated to.
pub fn rotated_file_name(base_filename: &str, date: NaiveDate) -> String {
    format!("{base_filename}.{}", date.format(ROTATION_DATE_FORMAT))
}

/// Whether `candidate` is a rotated sibling of `base_filename`.
pub fn is_rotated_file_name(base_filename: &str, candidate: &str) -> bool {
    let Some(suffix) = candidate
        .strip_prefix(base_filename)
        .and_then(|rest| rest.strip_prefix('.'))
    else {
        return false;
    };

    let Some((stamp, rest)) = suffix.split_at_checked(10) else {
        return false;
    };

    if NaiveDate::parse_from_str(stamp, ROTATION_DATE_FORMAT).is_err() {
        return false;
    }

    rest.is_empty()
        || rest
            .strip_prefix('.')
            .is_some_and(|n| !n.is_empty() && n.bytes().all(|b| b.is_ascii_digit()))
}

/// Removes files on behalf of a sweep.
pub trait FileRemover: Send + Sync {
    fn remove(&self, path: &Path) -> io::Result<()>;
}

/// Deletes through `std::fs`.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsRemover;

impl FileRemover for FsRemover {
    fn remove(&self, path: &Path) -> io::Result<()> {
        fs::remove_file(path)
    }
}

/// Outcome of one sweep.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Files removed from disk
    pub deleted: Vec<PathBuf>,
    /// Candidates that could not be inspected or removed, with the reason
    pub failed: Vec<(PathBuf, String)>,
}

impl SweepReport {
    pub fn deleted_count(&self) -> usize {
        self.deleted.len()
    }
}

/// Deletes expired rotated files of one log file.
#[derive(Clone)]
pub struct RetentionPolicy {
    directory: PathBuf,
    base_filename: String,
    retention_days: i64,
    remover: Arc<dyn FileRemover>,
}

impl fmt::Debug for RetentionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetentionPolicy")
            .field("directory", &self.directory)
            .field("base_filename", &self.base_filename)
            .field("retention_days", &self.retention_days)
            .finish_non_exhaustive()
    }
}

impl RetentionPolicy {
    /// Create a policy for `<directory>/<base_filename>`
    ///
    /// # Arguments
    /// * `retention_days` - Age in days after which rotated files are deleted;
    ///   zero or negative disables deletion
    pub fn new(directory: impl Into<PathBuf>, base_filename: impl Into<String>, retention_days: i64) -> Self {
        Self {
            directory: directory.into(),
            base_filename: base_filename.into(),
            retention_days,
            remover: Arc::new(FsRemover),
        }
    }

    pub fn from_config(config: &RetentionConfig) -> Self {
        Self::new(&config.directory, &config.base_filename, config.retention_days)
    }

    /// Replace the file remover (used to simulate undeletable files).
    #[must_use]
    pub fn with_remover(mut self, remover: Arc<dyn FileRemover>) -> Self {
        self.remover = remover;
        self
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn base_filename(&self) -> &str {
        &self.base_filename
    }

    pub const fn retention_days(&self) -> i64 {
        self.retention_days
    }

    /// Path of the file currently being written to.
    pub fn active_file(&self) -> PathBuf {
        self.directory.join(&self.base_filename)
    }

    /// Delete expired rotated files, never touching `active_file`.
    ///
    /// # Returns
    /// Number of files deleted
    pub fn sweep(&self, active_file: &Path) -> usize {
        self.sweep_report(active_file).deleted_count()
    }

    /// Like [`sweep`](Self::sweep), reporting per-file failures.
    pub fn sweep_report(&self, active_file: &Path) -> SweepReport {
        self.sweep_at(SystemTime::now(), active_file)
    }

    /// Sweep using `now` as the current time.
    pub fn sweep_at(&self, now: SystemTime, active_file: &Path) -> SweepReport {
        let mut report = SweepReport::default();

        let Ok(days) = u64::try_from(self.retention_days) else {
            return report;
        };
        if days == 0 {
            return report;
        }

        let window = Duration::from_secs(days.saturating_mul(SECONDS_PER_DAY));
        // A window reaching before the epoch cannot expire anything.
        let Some(cutoff) = now.checked_sub(window) else {
            return report;
        };

        let entries = match fs::read_dir(&self.directory) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                warn!(path = %self.directory.display(), "log directory does not exist");
                return report;
            }
            Err(e) => {
                warn!(path = %self.directory.display(), error = %e, "failed to read log directory");
                return report;
            }
        };

        let active = absolute(active_file);

        for entry in entries {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!(path = %self.directory.display(), error = %e, "failed to read directory entry");
                    continue;
                }
            };

            let path = entry.path();
            let is_candidate = path
                .file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| is_rotated_file_name(&self.base_filename, name));
            if !is_candidate || absolute(&path) == active {
                continue;
            }

            let modified = match fs::metadata(&path) {
                Ok(metadata) if metadata.is_file() => metadata.modified(),
                Ok(_) => continue,
                Err(e) => Err(e),
            };

            let modified = match modified {
                Ok(modified) => modified,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "failed to stat rotated log file");
                    report.failed.push((path, e.to_string()));
                    continue;
                }
            };

            if modified >= cutoff {
                debug!(path = %path.display(), "rotated log file within retention window");
                continue;
            }

            match self.remover.remove(&path) {
                Ok(()) => {
                    info!(file = %entry.file_name().to_string_lossy(), "deleted old log file");
                    report.deleted.push(path);
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "error deleting log file");
                    report.failed.push((path, e.to_string()));
                }
            }
        }

        if !report.deleted.is_empty() {
            info!(
                count = report.deleted.len(),
                retention_days = self.retention_days,
                "cleaned up old log files"
            );
        }

        report
    }
}

/// Delete rotated siblings of `base_filename` in `directory` older than
/// `retention_days`, sparing `active_file`.
///
/// # Returns
/// Number of files deleted
pub fn sweep(directory: &Path, base_filename: &str, retention_days: i64, active_file: &Path) -> usize {
    RetentionPolicy::new(directory, base_filename, retention_days).sweep(active_file)
}

fn absolute(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}
