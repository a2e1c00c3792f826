use crate::types::{BuildNumber, BuildResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Build
// ---------------------------------------------------------------------------

/// What the engine needs from a build: a stable label for diagnostics.
///
/// Everything else a build carries is the business of the conditions and
/// actions written against the concrete type.
pub trait Build {
    fn display_name(&self) -> String;
}

// ---------------------------------------------------------------------------
// BuildRecord
// ---------------------------------------------------------------------------

/// One completed build as kept in a job's history file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildRecord {
    pub job: String,
    pub number: BuildNumber,
    pub result: BuildResult,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub duration_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub causes: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub artifacts: Vec<String>,
    #[serde(default = "default_has_log")]
    pub has_log: bool,
    #[serde(default)]
    pub keep_forever: bool,
    /// Set by the delete action. The history store drops discarded builds
    /// when it is saved.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub discarded: bool,
}

fn default_has_log() -> bool {
    true
}

impl BuildRecord {
    pub fn new(job: impl Into<String>, number: BuildNumber, result: BuildResult) -> Self {
        Self {
            job: job.into(),
            number,
            result,
            timestamp: Utc::now(),
            duration_ms: 0,
            description: None,
            causes: Vec::new(),
            artifacts: Vec::new(),
            has_log: true,
            keep_forever: false,
            discarded: false,
        }
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_artifacts<I, S>(mut self, artifacts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.artifacts = artifacts.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_causes<I, S>(mut self, causes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.causes = causes.into_iter().map(Into::into).collect();
        self
    }
}

impl Build for BuildRecord {
    fn display_name(&self) -> String {
        format!("{} #{}", self.job, self.number)
    }
}
