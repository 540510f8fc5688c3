use crate::logger::LogError;
use chrono::format::{Item, Parsed, StrftimeItems, parse};
use chrono::{DateTime, NaiveDateTime, NaiveTime, TimeDelta, Utc};
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Time-rotated log file.
///
/// The active file is `<path><suffix>`, where `suffix` is a strftime pattern
/// evaluated in UTC at the start of the current rotation period. `path` itself
/// is kept as a symlink to the active file. Only the newest `keep` generations
/// survive a rotation; `keep == 0` disables the purge.
pub struct RollingFile {
    path: PathBuf,
    dir: PathBuf,
    file_name: String,
    suffix: String,
    period: TimeDelta,
    keep: usize,
    active: Option<Active>,
}

struct Active {
    period_start: i64,
    path: PathBuf,
    file: File,
}

impl RollingFile {
    pub fn new(
        path: impl Into<PathBuf>,
        suffix: &str,
        period: TimeDelta,
        keep: usize,
    ) -> Result<Self, LogError> {
        Self::open_at(path, suffix, period, keep, Utc::now())
    }

    pub(crate) fn open_at(
        path: impl Into<PathBuf>,
        suffix: &str,
        period: TimeDelta,
        keep: usize,
        now: DateTime<Utc>,
    ) -> Result<Self, LogError> {
        if period.num_seconds() <= 0 {
            return Err(LogError::InvalidRotation);
        }
        if suffix.is_empty() || StrftimeItems::new(suffix).any(|item| matches!(item, Item::Error)) {
            return Err(LogError::InvalidSuffix(suffix.to_owned()));
        }

        let path = path.into();
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .ok_or_else(|| {
                LogError::io(
                    &path,
                    io::Error::new(io::ErrorKind::InvalidInput, "log path has no file name"),
                )
            })?;
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir).map_err(|e| LogError::io(&dir, e))?;

        let mut rolling = Self {
            path,
            dir,
            file_name,
            suffix: suffix.to_owned(),
            period,
            keep,
            active: None,
        };

        // The suffix has to name distinct, parseable generations or the purge
        // would never find anything.
        let probe = rolling.generation_name(rolling.period_start(now));
        if rolling.generation_key(&probe).is_none() {
            return Err(LogError::InvalidSuffix(rolling.suffix));
        }

        rolling
            .roll(now)
            .map_err(|e| LogError::io(&rolling.path, e))?;
        debug!(
            path = ?rolling.path,
            active = ?rolling.active_path(),
            keep = rolling.keep,
            "opened rolling log file"
        );
        Ok(rolling)
    }

    pub fn link_path(&self) -> &Path {
        &self.path
    }

    pub fn active_path(&self) -> Option<&Path> {
        self.active.as_ref().map(|active| active.path.as_path())
    }

    /// Lists rotated generations, oldest first.
    pub fn generations(&self) -> io::Result<Vec<PathBuf>> {
        let mut found: Vec<(NaiveDateTime, PathBuf)> = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let entry = entry?;
            let name = entry.file_name();
            let Some(key) = self.generation_key(&name.to_string_lossy()) else {
                continue;
            };
            if !entry.file_type()?.is_file() {
                continue;
            }
            found.push((key, entry.path()));
        }
        found.sort();
        Ok(found.into_iter().map(|(_, path)| path).collect())
    }

    pub(crate) fn write_at(&mut self, now: DateTime<Utc>, buf: &[u8]) -> io::Result<usize> {
        let start = self.period_start(now);
        if self.active.as_ref().map(|active| active.period_start) != Some(start) {
            self.roll(now)?;
        }
        let active = self
            .active
            .as_mut()
            .ok_or_else(|| io::Error::other("no active log file"))?;
        active.file.write(buf)
    }

    fn period_start(&self, now: DateTime<Utc>) -> i64 {
        let secs = self.period.num_seconds();
        now.timestamp().div_euclid(secs) * secs
    }

    fn generation_name(&self, period_start: i64) -> String {
        let at = DateTime::<Utc>::from_timestamp(period_start, 0).unwrap_or_default();
        format!("{}{}", self.file_name, at.format(&self.suffix))
    }

    fn generation_key(&self, name: &str) -> Option<NaiveDateTime> {
        let rest = name.strip_prefix(&self.file_name)?;
        if rest.is_empty() {
            return None;
        }
        let mut parsed = Parsed::new();
        parse(&mut parsed, rest, StrftimeItems::new(&self.suffix)).ok()?;
        let date = parsed.to_naive_date().ok()?;
        let time = parsed.to_naive_time().unwrap_or(NaiveTime::MIN);
        Some(date.and_time(time))
    }

    fn roll(&mut self, now: DateTime<Utc>) -> io::Result<()> {
        let period_start = self.period_start(now);
        let path = self.dir.join(self.generation_name(period_start));

        if let Some(active) = self.active.as_mut() {
            active.file.flush()?;
        }
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        self.link(&path)?;
        self.active = Some(Active {
            period_start,
            path,
            file,
        });

        // Purge failures leave extra files behind but never block writes.
        let _ = self.purge();
        Ok(())
    }

    #[cfg(unix)]
    fn link(&self, target: &Path) -> io::Result<()> {
        let Some(target_name) = target.file_name() else {
            return Ok(());
        };
        let tmp = self.dir.join(format!("{}_symlink", self.file_name));
        match fs::remove_file(&tmp) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(e),
        }
        std::os::unix::fs::symlink(target_name, &tmp)?;
        fs::rename(&tmp, &self.path)
    }

    #[cfg(not(unix))]
    fn link(&self, _target: &Path) -> io::Result<()> {
        Ok(())
    }

    fn purge(&self) -> io::Result<usize> {
        if self.keep == 0 {
            return Ok(0);
        }
        // The active file always counts toward `keep`, even when an earlier
        // clock step made it older than the rest.
        let active = self.active_path();
        let stale: Vec<PathBuf> = self
            .generations()?
            .into_iter()
            .filter(|path| Some(path.as_path()) != active)
            .collect();
        let excess = stale.len().saturating_sub(self.keep - 1);
        for path in &stale[..excess] {
            fs::remove_file(path)?;
        }
        Ok(excess)
    }
}

impl Write for RollingFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.write_at(Utc::now(), buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        match self.active.as_mut() {
            Some(active) => active.file.flush(),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn day(d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2020, 1, d, 12, 0, 0).unwrap()
    }

    fn names(paths: &[PathBuf]) -> Vec<String> {
        paths
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn opens_dated_file_and_creates_directory() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("runtime").join("app.log");

        let rolling = RollingFile::open_at(&path, ".%Y%m%d", TimeDelta::hours(24), 3, day(1)).unwrap();

        let active = rolling.active_path().unwrap();
        assert_eq!(active, dir.path().join("runtime").join("app.log.20200101"));
        assert!(active.is_file());
    }

    #[cfg(unix)]
    #[test]
    fn link_follows_active_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("app.log");
        let mut rolling = RollingFile::open_at(&path, ".%Y%m%d", TimeDelta::hours(24), 3, day(1)).unwrap();

        rolling.write_at(day(1), b"first\n").unwrap();
        rolling.write_at(day(2), b"second\n").unwrap();
        rolling.flush().unwrap();

        assert_eq!(rolling.link_path(), path.as_path());
        let target = fs::read_link(&path).unwrap();
        assert_eq!(target, PathBuf::from("app.log.20200102"));
        assert_eq!(fs::read_to_string(&path).unwrap(), "second\n");
        assert_eq!(
            fs::read_to_string(dir.path().join("app.log.20200101")).unwrap(),
            "first\n"
        );
    }

    #[test]
    fn keeps_newest_generations_only() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("app.log");
        let mut rolling = RollingFile::open_at(&path, ".%Y%m%d", TimeDelta::hours(24), 3, day(1)).unwrap();

        for d in 1..=5 {
            rolling.write_at(day(d), format!("day {d}\n").as_bytes()).unwrap();
        }

        let kept = rolling.generations().unwrap();
        assert_eq!(
            names(&kept),
            vec!["app.log.20200103", "app.log.20200104", "app.log.20200105"]
        );
    }

    #[test]
    fn clock_step_back_still_keeps_limit() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("app.log");
        let mut rolling = RollingFile::open_at(&path, ".%Y%m%d", TimeDelta::hours(24), 3, day(3)).unwrap();
        rolling.write_at(day(4), b"x\n").unwrap();
        rolling.write_at(day(5), b"x\n").unwrap();

        rolling.write_at(day(1), b"back\n").unwrap();

        assert_eq!(
            rolling.active_path().unwrap(),
            dir.path().join("app.log.20200101")
        );
        assert_eq!(
            names(&rolling.generations().unwrap()),
            vec!["app.log.20200101", "app.log.20200104", "app.log.20200105"]
        );
    }

    #[test]
    fn keep_one_leaves_only_active_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("app.log");
        let mut rolling = RollingFile::open_at(&path, ".%Y%m%d", TimeDelta::hours(24), 1, day(2)).unwrap();

        rolling.write_at(day(1), b"x\n").unwrap();

        assert_eq!(names(&rolling.generations().unwrap()), vec!["app.log.20200101"]);
    }

    #[test]
    fn zero_keep_disables_purge() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("app.log");
        let mut rolling = RollingFile::open_at(&path, ".%Y%m%d", TimeDelta::hours(24), 0, day(1)).unwrap();

        for d in 1..=5 {
            rolling.write_at(day(d), b"x\n").unwrap();
        }

        assert_eq!(rolling.generations().unwrap().len(), 5);
    }

    #[test]
    fn same_period_appends_to_one_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("app.log");
        let mut rolling = RollingFile::open_at(&path, ".%Y%m%d", TimeDelta::hours(24), 3, day(1)).unwrap();

        let morning = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 1).unwrap();
        let night = Utc.with_ymd_and_hms(2020, 1, 1, 23, 59, 59).unwrap();
        rolling.write_at(morning, b"a\n").unwrap();
        rolling.write_at(night, b"b\n").unwrap();
        rolling.flush().unwrap();

        let generations = rolling.generations().unwrap();
        assert_eq!(names(&generations), vec!["app.log.20200101"]);
        assert_eq!(fs::read_to_string(&generations[0]).unwrap(), "a\nb\n");
    }

    #[test]
    fn ignores_unrelated_files() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("app.log.old"), "keep").unwrap();
        fs::write(dir.path().join("other.log.20190101"), "keep").unwrap();
        fs::write(dir.path().join("app.log.20190101.gz"), "keep").unwrap();

        let path = dir.path().join("app.log");
        let mut rolling = RollingFile::open_at(&path, ".%Y%m%d", TimeDelta::hours(24), 1, day(1)).unwrap();
        rolling.write_at(day(2), b"x\n").unwrap();

        assert!(dir.path().join("app.log.old").exists());
        assert!(dir.path().join("other.log.20190101").exists());
        assert!(dir.path().join("app.log.20190101.gz").exists());
        assert_eq!(names(&rolling.generations().unwrap()), vec!["app.log.20200102"]);
    }

    #[test]
    fn hourly_suffix_rotates_each_hour() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("app.log");
        let start = Utc.with_ymd_and_hms(2020, 1, 1, 10, 30, 0).unwrap();
        let mut rolling = RollingFile::open_at(&path, ".%Y%m%d%H%M", TimeDelta::hours(1), 2, start).unwrap();

        rolling.write_at(start + TimeDelta::hours(1), b"x\n").unwrap();
        rolling.write_at(start + TimeDelta::hours(2), b"y\n").unwrap();

        assert_eq!(
            names(&rolling.generations().unwrap()),
            vec!["app.log.202001011100", "app.log.202001011200"]
        );
    }

    #[test]
    fn rejects_zero_period() {
        let dir = TempDir::new().unwrap();
        let result = RollingFile::new(dir.path().join("app.log"), ".%Y%m%d", TimeDelta::zero(), 3);
        assert!(matches!(result, Err(LogError::InvalidRotation)));
    }

    #[test]
    fn rejects_suffix_without_date() {
        let dir = TempDir::new().unwrap();
        for suffix in ["", ".log", ".%Q"] {
            let result = RollingFile::new(dir.path().join("app.log"), suffix, TimeDelta::hours(24), 3);
            assert!(
                matches!(result, Err(LogError::InvalidSuffix(_))),
                "suffix: {suffix:?}"
            );
        }
    }

    #[cfg(unix)]
    #[test]
    fn surfaces_unwritable_directory() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, "not a directory").unwrap();

        let result = RollingFile::new(blocker.join("app.log"), ".%Y%m%d", TimeDelta::hours(24), 3);
        assert!(matches!(result, Err(LogError::Io { .. })));
    }
}
