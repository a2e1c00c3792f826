use crate::error::{Result, RetentionError};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

// ---------------------------------------------------------------------------
// Directory constants
// ---------------------------------------------------------------------------

pub const RETENTION_DIR: &str = ".retention";
pub const JOBS_DIR: &str = ".retention/jobs";
pub const RULES_FILE: &str = ".retention/rules.yaml";
pub const BUILDS_FILE: &str = "builds.yaml";

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

pub fn retention_dir(root: &Path) -> PathBuf {
    root.join(RETENTION_DIR)
}

pub fn rules_path(root: &Path) -> PathBuf {
    root.join(RULES_FILE)
}

pub fn jobs_dir(root: &Path) -> PathBuf {
    root.join(JOBS_DIR)
}

pub fn job_dir(root: &Path, job: &str) -> PathBuf {
    jobs_dir(root).join(job)
}

pub fn builds_path(root: &Path, job: &str) -> PathBuf {
    job_dir(root, job).join(BUILDS_FILE)
}

// ---------------------------------------------------------------------------
// Job name validation
// ---------------------------------------------------------------------------

fn job_name_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[a-z0-9][a-z0-9-]*[a-z0-9]$|^[a-z0-9]$").unwrap())
}

pub fn validate_job_name(job: &str) -> Result<()> {
    if job.is_empty() || job.len() > 64 || !job_name_regex().is_match(job) {
        return Err(RetentionError::InvalidJobName(job.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_job_names() {
        assert!(validate_job_name("nightly").is_ok());
        assert!(validate_job_name("api-build-2").is_ok());
        assert!(validate_job_name("a").is_ok());
    }

    #[test]
    fn invalid_job_names() {
        assert!(validate_job_name("").is_err());
        assert!(validate_job_name("-api").is_err());
        assert!(validate_job_name("Api").is_err());
        assert!(validate_job_name("../etc").is_err());
    }

    #[test]
    fn builds_path_is_under_jobs_dir() {
        let root = Path::new("/tmp/proj");
        assert_eq!(
            builds_path(root, "api"),
            PathBuf::from("/tmp/proj/.retention/jobs/api/builds.yaml")
        );
        assert!(jobs_dir(root).starts_with(retention_dir(root)));
    }
}
