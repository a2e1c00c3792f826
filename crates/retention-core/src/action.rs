//! Action capability and the built-in actions over [`BuildRecord`].

use crate::build::{Build, BuildRecord};
use crate::condition::compile;
use crate::error::{Result, RetentionError};
use regex::Regex;

// ---------------------------------------------------------------------------
// Action
// ---------------------------------------------------------------------------

/// An effect applied to a build once every condition of its rule matched.
///
/// Called at most once per build per pass. Retrying is up to the
/// implementation; an `Err` aborts the rest of the rule and the pass.
pub trait Action<B> {
    /// Human-readable label used in diagnostics.
    fn label(&self) -> String;

    fn perform(&self, build: &mut B) -> Result<()>;
}

// ---------------------------------------------------------------------------
// Built-in actions
// ---------------------------------------------------------------------------

/// Discards the build. Builds marked keep-forever are refused.
#[derive(Debug, Clone, Default)]
pub struct DeleteBuild;

impl Action<BuildRecord> for DeleteBuild {
    fn label(&self) -> String {
        "delete build".to_string()
    }

    fn perform(&self, build: &mut BuildRecord) -> Result<()> {
        if build.keep_forever {
            return Err(RetentionError::Action {
                action: self.label(),
                build: build.display_name(),
                reason: "build is marked keep forever".to_string(),
            });
        }
        build.discarded = true;
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct DeleteArtifacts;

impl Action<BuildRecord> for DeleteArtifacts {
    fn label(&self) -> String {
        "delete artifacts".to_string()
    }

    fn perform(&self, build: &mut BuildRecord) -> Result<()> {
        build.artifacts.clear();
        Ok(())
    }
}

/// Removes artifacts whose path matches `include` and does not match
/// `exclude`.
#[derive(Debug, Clone)]
pub struct DeleteArtifactsMatching {
    include: Regex,
    exclude: Option<Regex>,
}

impl DeleteArtifactsMatching {
    pub fn new(include: &str, exclude: Option<&str>) -> Result<Self> {
        Ok(Self {
            include: compile(include)?,
            exclude: exclude.map(compile).transpose()?,
        })
    }

    fn selects(&self, artifact: &str) -> bool {
        self.include.is_match(artifact)
            && !self
                .exclude
                .as_ref()
                .map(|e| e.is_match(artifact))
                .unwrap_or(false)
    }
}

impl Action<BuildRecord> for DeleteArtifactsMatching {
    fn label(&self) -> String {
        match &self.exclude {
            Some(e) => format!(
                "delete artifacts matching /{}/ except /{}/",
                self.include.as_str(),
                e.as_str()
            ),
            None => format!("delete artifacts matching /{}/", self.include.as_str()),
        }
    }

    fn perform(&self, build: &mut BuildRecord) -> Result<()> {
        build.artifacts.retain(|a| !self.selects(a));
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct DeleteLogFile;

impl Action<BuildRecord> for DeleteLogFile {
    fn label(&self) -> String {
        "delete log file".to_string()
    }

    fn perform(&self, build: &mut BuildRecord) -> Result<()> {
        build.has_log = false;
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct ChangeBuildDescription {
    description: String,
}

impl ChangeBuildDescription {
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
        }
    }
}

impl Action<BuildRecord> for ChangeBuildDescription {
    fn label(&self) -> String {
        format!("change description to '{}'", self.description)
    }

    fn perform(&self, build: &mut BuildRecord) -> Result<()> {
        build.description = Some(self.description.clone());
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct KeepBuildForever;

impl Action<BuildRecord> for KeepBuildForever {
    fn label(&self) -> String {
        "keep build forever".to_string()
    }

    fn perform(&self, build: &mut BuildRecord) -> Result<()> {
        build.keep_forever = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::BuildResult;

    fn build() -> BuildRecord {
        BuildRecord::new("api", 7, BuildResult::Success)
            .with_artifacts(["app.jar", "app-sources.jar", "report.html"])
    }

    #[test]
    fn delete_build_marks_discarded() {
        let mut b = build();
        DeleteBuild.perform(&mut b).unwrap();
        assert!(b.discarded);
    }

    #[test]
    fn delete_build_refuses_kept_builds() {
        let mut b = build();
        KeepBuildForever.perform(&mut b).unwrap();
        let err = DeleteBuild.perform(&mut b).unwrap_err();
        assert!(matches!(err, RetentionError::Action { .. }));
        assert!(!b.discarded);
    }

    #[test]
    fn delete_artifacts_matching_honours_exclude() {
        let mut b = build();
        let action = DeleteArtifactsMatching::new(r"\.jar$", Some("sources")).unwrap();
        action.perform(&mut b).unwrap();
        assert_eq!(b.artifacts, vec!["app-sources.jar", "report.html"]);
    }

    #[test]
    fn delete_artifacts_clears_everything() {
        let mut b = build();
        DeleteArtifacts.perform(&mut b).unwrap();
        assert!(b.artifacts.is_empty());
    }

    #[test]
    fn change_description_and_delete_log() {
        let mut b = build();
        ChangeBuildDescription::new("pruned").perform(&mut b).unwrap();
        DeleteLogFile.perform(&mut b).unwrap();
        assert_eq!(b.description.as_deref(), Some("pruned"));
        assert!(!b.has_log);
    }
}
