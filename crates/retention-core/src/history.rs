use crate::build::BuildRecord;
use crate::error::{Result, RetentionError};
use crate::io::atomic_write;
use crate::paths;
use crate::types::{BuildNumber, BuildResult};
use serde::{Deserialize, Serialize};
use std::path::Path;

// ---------------------------------------------------------------------------
// BuildHistory
// ---------------------------------------------------------------------------

/// Source of a job's completed builds, walked newest to oldest.
///
/// `previous_completed` must describe a finite chain with no cycles. It is
/// queried after the actions for a build have run, so it has to keep working
/// for a build that an action just discarded.
pub trait BuildHistory {
    type Build;

    fn last_completed(&self) -> Option<BuildNumber>;

    fn previous_completed(&self, number: BuildNumber) -> Option<BuildNumber>;

    fn build(&self, number: BuildNumber) -> Option<&Self::Build>;

    fn build_mut(&mut self, number: BuildNumber) -> Option<&mut Self::Build>;
}

// ---------------------------------------------------------------------------
// HistoryCursor
// ---------------------------------------------------------------------------

/// Lazy newest-to-oldest position in a [`BuildHistory`].
///
/// The cursor holds only a build number, so the history stays free to be
/// borrowed mutably between steps. A finished cursor cannot be restarted;
/// open a new one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistoryCursor {
    current: Option<BuildNumber>,
}

impl HistoryCursor {
    pub fn open<H: BuildHistory + ?Sized>(history: &H) -> Self {
        Self {
            current: history.last_completed(),
        }
    }

    pub fn current(&self) -> Option<BuildNumber> {
        self.current
    }

    /// Step to the build before the current one.
    pub fn advance<H: BuildHistory + ?Sized>(&mut self, history: &H) -> Option<BuildNumber> {
        self.current = self.current.and_then(|n| history.previous_completed(n));
        self.current
    }
}

// ---------------------------------------------------------------------------
// JobHistory
// ---------------------------------------------------------------------------

/// File-backed history of one job, stored at
/// `.retention/jobs/<job>/builds.yaml` with builds in ascending number order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobHistory {
    pub job: String,
    #[serde(default)]
    pub next_number: BuildNumber,
    #[serde(default)]
    pub builds: Vec<BuildRecord>,
}

impl JobHistory {
    pub fn new(job: impl Into<String>) -> Self {
        Self {
            job: job.into(),
            next_number: 1,
            builds: Vec::new(),
        }
    }

    pub fn load(root: &Path, job: &str) -> Result<Self> {
        paths::validate_job_name(job)?;
        let path = paths::builds_path(root, job);
        if !path.exists() {
            return Err(RetentionError::JobNotFound(job.to_string()));
        }
        let data = std::fs::read_to_string(&path)?;
        let mut history: JobHistory = serde_yaml::from_str(&data)?;
        history.builds.sort_by_key(|b| b.number);
        Ok(history)
    }

    /// Load a job's history, or start an empty one if it has never been
    /// recorded.
    pub fn load_or_new(root: &Path, job: &str) -> Result<Self> {
        match Self::load(root, job) {
            Ok(h) => Ok(h),
            Err(RetentionError::JobNotFound(_)) => Ok(Self::new(job)),
            Err(e) => Err(e),
        }
    }

    /// Write the history back, dropping builds that were discarded.
    pub fn save(&mut self, root: &Path) -> Result<()> {
        paths::validate_job_name(&self.job)?;
        self.builds.retain(|b| !b.discarded);
        let data = serde_yaml::to_string(self)?;
        atomic_write(&paths::builds_path(root, &self.job), data.as_bytes())
    }

    /// Names of every job with a history file, sorted.
    pub fn list(root: &Path) -> Result<Vec<String>> {
        let dir = paths::jobs_dir(root);
        if !dir.exists() {
            return Ok(Vec::new());
        }
        let mut jobs = Vec::new();
        for entry in std::fs::read_dir(&dir)? {
            let entry = entry?;
            if entry.path().join(paths::BUILDS_FILE).exists() {
                if let Some(name) = entry.file_name().to_str() {
                    jobs.push(name.to_string());
                }
            }
        }
        jobs.sort();
        Ok(jobs)
    }

    /// Append a completed build with the next free number.
    pub fn record(&mut self, result: BuildResult) -> &mut BuildRecord {
        let number = self
            .next_number
            .max(self.builds.last().map(|b| b.number + 1).unwrap_or(1));
        self.next_number = number + 1;
        self.builds.push(BuildRecord::new(self.job.clone(), number, result));
        let idx = self.builds.len() - 1;
        &mut self.builds[idx]
    }

    /// Insert an already-built record, keeping number order.
    pub fn push(&mut self, build: BuildRecord) {
        self.next_number = self.next_number.max(build.number + 1);
        let idx = self.builds.partition_point(|b| b.number < build.number);
        self.builds.insert(idx, build);
    }

    pub fn discarded(&self) -> impl DoubleEndedIterator<Item = &BuildRecord> {
        self.builds.iter().filter(|b| b.discarded)
    }
}

impl BuildHistory for JobHistory {
    type Build = BuildRecord;

    fn last_completed(&self) -> Option<BuildNumber> {
        self.builds.last().map(|b| b.number)
    }

    fn previous_completed(&self, number: BuildNumber) -> Option<BuildNumber> {
        self.builds
            .iter()
            .rev()
            .map(|b| b.number)
            .find(|n| *n < number)
    }

    fn build(&self, number: BuildNumber) -> Option<&BuildRecord> {
        self.builds.iter().find(|b| b.number == number)
    }

    fn build_mut(&mut self, number: BuildNumber) -> Option<&mut BuildRecord> {
        self.builds.iter_mut().find(|b| b.number == number)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn history_of(n: usize) -> JobHistory {
        let mut h = JobHistory::new("api");
        for _ in 0..n {
            h.record(BuildResult::Success);
        }
        h
    }

    #[test]
    fn record_assigns_sequential_numbers() {
        let h = history_of(3);
        let numbers: Vec<_> = h.builds.iter().map(|b| b.number).collect();
        assert_eq!(numbers, vec![1, 2, 3]);
        assert_eq!(h.next_number, 4);
    }

    #[test]
    fn cursor_walks_newest_to_oldest() {
        let h = history_of(4);
        let mut cursor = HistoryCursor::open(&h);
        let mut seen = Vec::new();
        while let Some(n) = cursor.current() {
            seen.push(n);
            cursor.advance(&h);
        }
        assert_eq!(seen, vec![4, 3, 2, 1]);
        assert_eq!(cursor.advance(&h), None);
    }

    #[test]
    fn empty_history_has_no_cursor_position() {
        let h = JobHistory::new("api");
        assert_eq!(HistoryCursor::open(&h).current(), None);
    }

    #[test]
    fn previous_skips_gaps() {
        let mut h = JobHistory::new("api");
        h.push(BuildRecord::new("api", 10, BuildResult::Success));
        h.push(BuildRecord::new("api", 3, BuildResult::Failure));
        h.push(BuildRecord::new("api", 7, BuildResult::Success));
        assert_eq!(h.last_completed(), Some(10));
        assert_eq!(h.previous_completed(10), Some(7));
        assert_eq!(h.previous_completed(7), Some(3));
        assert_eq!(h.previous_completed(3), None);
    }

    #[test]
    fn build_lookup_by_number() {
        let mut h = JobHistory::new("api");
        h.push(BuildRecord::new("api", 4, BuildResult::Failure));
        h.push(BuildRecord::new("api", 9, BuildResult::Success));
        assert_eq!(h.build(4).map(|b| b.result), Some(BuildResult::Failure));
        assert_eq!(h.build(9).map(|b| b.number), Some(9));
        assert!(h.build(5).is_none());
    }

    #[test]
    fn save_drops_discarded_and_load_round_trips() {
        let dir = TempDir::new().unwrap();
        let mut h = history_of(3);
        h.build_mut(2).unwrap().discarded = true;
        h.save(dir.path()).unwrap();

        let loaded = JobHistory::load(dir.path(), "api").unwrap();
        let numbers: Vec<_> = loaded.builds.iter().map(|b| b.number).collect();
        assert_eq!(numbers, vec![1, 3]);
        assert_eq!(loaded.next_number, 4);
    }

    #[test]
    fn numbers_are_not_reused_after_deleting_newest() {
        let dir = TempDir::new().unwrap();
        let mut h = history_of(2);
        h.build_mut(2).unwrap().discarded = true;
        h.save(dir.path()).unwrap();

        let mut loaded = JobHistory::load(dir.path(), "api").unwrap();
        assert_eq!(loaded.record(BuildResult::Success).number, 3);
    }

    #[test]
    fn load_missing_job_is_not_found() {
        let dir = TempDir::new().unwrap();
        let err = JobHistory::load(dir.path(), "ghost").unwrap_err();
        assert!(matches!(err, RetentionError::JobNotFound(_)));
        assert!(JobHistory::load_or_new(dir.path(), "ghost").unwrap().builds.is_empty());
    }

    #[test]
    fn list_returns_sorted_jobs() {
        let dir = TempDir::new().unwrap();
        JobHistory::new("web").save(dir.path()).unwrap();
        JobHistory::new("api").save(dir.path()).unwrap();
        assert_eq!(JobHistory::list(dir.path()).unwrap(), vec!["api", "web"]);
    }
}
