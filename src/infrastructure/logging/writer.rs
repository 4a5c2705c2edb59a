//! Daily rotating file sink
//!
//! Writes to a fixed `<directory>/<base>` path and rolls over at UTC
//! midnight: the active file is renamed to `<base>.<YYYY-MM-DD>` and a fresh
//! one is opened. A post-rollover hook (normally the retention sweep) runs
//! right after each rollover.

use std::fmt;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, Utc};
use tracing::warn;

use super::rotation::{rotated_file_name, RetentionPolicy};

type Clock = Box<dyn Fn() -> DateTime<Utc> + Send>;
type RolloverHook = Box<dyn FnMut(&Path) + Send>;

/// File writer with time-based rotation at UTC midnight
pub struct TimedRotatingWriter {
    directory: PathBuf,
    base_filename: String,
    path: PathBuf,
    file: File,
    /// UTC date covered by the current file
    period: NaiveDate,
    clock: Clock,
    on_rollover: Option<RolloverHook>,
}

impl fmt::Debug for TimedRotatingWriter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimedRotatingWriter")
            .field("path", &self.path)
            .field("period", &self.period)
            .finish_non_exhaustive()
    }
}

impl TimedRotatingWriter {
    /// Open (or create) `<directory>/<base_filename>` for appending
    ///
    /// Creates the directory if needed. When the file already exists its
    /// modification date decides the current period, so a file left over
    /// from a previous day is rotated on the first write.
    pub fn new(directory: impl Into<PathBuf>, base_filename: impl Into<String>) -> io::Result<Self> {
        Self::with_clock(directory, base_filename, Box::new(Utc::now))
    }

    fn with_clock(
        directory: impl Into<PathBuf>,
        base_filename: impl Into<String>,
        clock: Clock,
    ) -> io::Result<Self> {
        let directory = directory.into();
        let base_filename = base_filename.into();
        fs::create_dir_all(&directory)?;

        let path = directory.join(&base_filename);
        let period = match fs::metadata(&path).and_then(|m| m.modified()) {
            Ok(modified) => DateTime::<Utc>::from(modified).date_naive(),
            Err(_) => clock().date_naive(),
        };
        let file = open_append(&path)?;

        Ok(Self {
            directory,
            base_filename,
            path,
            file,
            period,
            clock,
            on_rollover: None,
        })
    }

    /// Run `hook` with the active file path after every rollover.
    #[must_use]
    pub fn with_rollover_hook(mut self, hook: impl FnMut(&Path) + Send + 'static) -> Self {
        self.on_rollover = Some(Box::new(hook));
        self
    }

    /// Sweep expired rotated files with `policy` after every rollover.
    #[must_use]
    pub fn with_retention(self, policy: RetentionPolicy) -> Self {
        self.with_rollover_hook(move |active| {
            policy.sweep(active);
        })
    }

    /// Path of the active file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn rollover_due(&self, now: DateTime<Utc>) -> bool {
        now.date_naive() > self.period
    }

    /// First free rotated name for the closed period.
    fn rotation_target(&self) -> PathBuf {
        let name = rotated_file_name(&self.base_filename, self.period);
        let mut target = self.directory.join(&name);
        let mut n = 1;
        while target.exists() {
            target = self.directory.join(format!("{name}.{n}"));
            n += 1;
        }
        target
    }

    fn rollover(&mut self, now: DateTime<Utc>) -> io::Result<()> {
        self.file.flush()?;

        let target = self.rotation_target();
        if let Err(e) = fs::rename(&self.path, &target) {
            // keep appending to the current file rather than dropping lines
            warn!(path = %self.path.display(), error = %e, "failed to rotate log file");
        }

        self.file = open_append(&self.path)?;
        self.period = now.date_naive();

        if let Some(hook) = self.on_rollover.as_mut() {
            hook(&self.path);
        }

        Ok(())
    }
}

impl Write for TimedRotatingWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let now = (self.clock)();
        if self.rollover_due(now) {
            self.rollover(now)?;
        }
        self.file.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file.flush()
    }
}

fn open_append(path: &Path) -> io::Result<File> {
    OpenOptions::new().create(true).append(true).open(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::sync::{Arc, Mutex};
    use tempfile::TempDir;

    fn fixed_clock(start: DateTime<Utc>) -> (Arc<Mutex<DateTime<Utc>>>, Clock) {
        let now = Arc::new(Mutex::new(start));
        let shared = Arc::clone(&now);
        (now, Box::new(move || *shared.lock().unwrap()))
    }

    fn file_names(dir: &Path) -> Vec<String> {
        let mut names: Vec<_> = std::fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn test_writes_to_active_file() {
        let temp_dir = TempDir::new().unwrap();
        let mut writer = TimedRotatingWriter::new(temp_dir.path(), "app.log").unwrap();

        writer.write_all(b"hello\n").unwrap();
        writer.flush().unwrap();

        assert_eq!(writer.path(), temp_dir.path().join("app.log"));
        assert_eq!(std::fs::read_to_string(writer.path()).unwrap(), "hello\n");
    }

    #[test]
    fn test_creates_missing_directory() {
        let temp_dir = TempDir::new().unwrap();
        let nested = temp_dir.path().join("a").join("b");

        let writer = TimedRotatingWriter::new(&nested, "app.log").unwrap();
        assert!(writer.path().exists());
    }

    #[test]
    fn test_rolls_over_at_midnight() {
        let temp_dir = TempDir::new().unwrap();
        let start = Utc.with_ymd_and_hms(2024, 5, 1, 23, 59, 0).unwrap();
        let (now, clock) = fixed_clock(start);

        let mut writer = TimedRotatingWriter::with_clock(temp_dir.path(), "app.log", clock).unwrap();
        // a freshly created file carries today's real mtime; pin the period
        writer.period = start.date_naive();

        writer.write_all(b"day one\n").unwrap();
        *now.lock().unwrap() = Utc.with_ymd_and_hms(2024, 5, 2, 0, 0, 1).unwrap();
        writer.write_all(b"day two\n").unwrap();
        writer.flush().unwrap();

        assert_eq!(file_names(temp_dir.path()), vec!["app.log", "app.log.2024-05-01"]);
        assert_eq!(
            std::fs::read_to_string(temp_dir.path().join("app.log.2024-05-01")).unwrap(),
            "day one\n"
        );
        assert_eq!(
            std::fs::read_to_string(temp_dir.path().join("app.log")).unwrap(),
            "day two\n"
        );
    }

    #[test]
    fn test_rollover_avoids_overwriting_existing_rotation() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(temp_dir.path().join("app.log.2024-05-01"), b"earlier\n").unwrap();

        let start = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let (now, clock) = fixed_clock(start);
        let mut writer = TimedRotatingWriter::with_clock(temp_dir.path(), "app.log", clock).unwrap();
        writer.period = start.date_naive();

        writer.write_all(b"later\n").unwrap();
        *now.lock().unwrap() = Utc.with_ymd_and_hms(2024, 5, 2, 8, 0, 0).unwrap();
        writer.write_all(b"next\n").unwrap();

        assert_eq!(
            file_names(temp_dir.path()),
            vec!["app.log", "app.log.2024-05-01", "app.log.2024-05-01.1"]
        );
        assert_eq!(
            std::fs::read_to_string(temp_dir.path().join("app.log.2024-05-01")).unwrap(),
            "earlier\n"
        );
    }

    #[test]
    fn test_rollover_runs_hook_with_active_path() {
        let temp_dir = TempDir::new().unwrap();
        let start = Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap();
        let (now, clock) = fixed_clock(start);

        let seen = Arc::new(Mutex::new(Vec::new()));
        let recorder = Arc::clone(&seen);
        let mut writer = TimedRotatingWriter::with_clock(temp_dir.path(), "app.log", clock)
            .unwrap()
            .with_rollover_hook(move |active| recorder.lock().unwrap().push(active.to_path_buf()));
        writer.period = start.date_naive();

        writer.write_all(b"a\n").unwrap();
        assert!(seen.lock().unwrap().is_empty());

        *now.lock().unwrap() = Utc.with_ymd_and_hms(2024, 5, 3, 0, 0, 0).unwrap();
        writer.write_all(b"b\n").unwrap();

        assert_eq!(*seen.lock().unwrap(), vec![temp_dir.path().join("app.log")]);
    }

    #[test]
    fn test_rollover_sweeps_expired_files() {
        let temp_dir = TempDir::new().unwrap();
        let expired = temp_dir.path().join("app.log.2020-01-01");
        std::fs::write(&expired, b"old\n").unwrap();
        let mtime = std::time::SystemTime::now() - std::time::Duration::from_secs(10 * 86_400);
        filetime::set_file_mtime(&expired, filetime::FileTime::from_system_time(mtime)).unwrap();

        let start = Utc::now();
        let (now, clock) = fixed_clock(start);
        let mut writer = TimedRotatingWriter::with_clock(temp_dir.path(), "app.log", clock)
            .unwrap()
            .with_retention(RetentionPolicy::new(temp_dir.path(), "app.log", 7));
        writer.period = start.date_naive();

        writer.write_all(b"today\n").unwrap();
        assert!(expired.exists());

        *now.lock().unwrap() = start + chrono::Duration::days(1);
        writer.write_all(b"tomorrow\n").unwrap();

        assert!(!expired.exists());
        assert!(writer.path().exists());
        // the file rotated a moment ago is fresh and survives the sweep
        assert!(temp_dir
            .path()
            .join(rotated_file_name("app.log", start.date_naive()))
            .exists());
    }

    #[test]
    fn test_stale_file_rotates_on_first_write() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("app.log");
        std::fs::write(&path, b"from yesterday\n").unwrap();
        let yesterday = std::time::SystemTime::now() - std::time::Duration::from_secs(86_400);
        filetime::set_file_mtime(&path, filetime::FileTime::from_system_time(yesterday)).unwrap();

        let mut writer = TimedRotatingWriter::new(temp_dir.path(), "app.log").unwrap();
        writer.write_all(b"fresh\n").unwrap();
        writer.flush().unwrap();

        let stale_date = DateTime::<Utc>::from(yesterday).date_naive();
        let rotated = temp_dir.path().join(rotated_file_name("app.log", stale_date));
        assert_eq!(std::fs::read_to_string(rotated).unwrap(), "from yesterday\n");
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "fresh\n");
    }
}
