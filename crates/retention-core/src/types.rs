use serde::{Deserialize, Serialize};
use std::fmt;

/// Sequential, job-scoped build identifier. Higher numbers are newer.
pub type BuildNumber = u64;

// ---------------------------------------------------------------------------
// BuildResult
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuildResult {
    Success,
    Unstable,
    Failure,
    NotBuilt,
    Aborted,
}

impl BuildResult {
    pub fn all() -> &'static [BuildResult] {
        &[
            BuildResult::Success,
            BuildResult::Unstable,
            BuildResult::Failure,
            BuildResult::NotBuilt,
            BuildResult::Aborted,
        ]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            BuildResult::Success => "success",
            BuildResult::Unstable => "unstable",
            BuildResult::Failure => "failure",
            BuildResult::NotBuilt => "not_built",
            BuildResult::Aborted => "aborted",
        }
    }
}

impl fmt::Display for BuildResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for BuildResult {
    type Err = crate::error::RetentionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "success" => Ok(BuildResult::Success),
            "unstable" => Ok(BuildResult::Unstable),
            "failure" => Ok(BuildResult::Failure),
            "not_built" => Ok(BuildResult::NotBuilt),
            "aborted" => Ok(BuildResult::Aborted),
            _ => Err(crate::error::RetentionError::InvalidBuildResult(
                s.to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!("FAILURE".parse::<BuildResult>().unwrap(), BuildResult::Failure);
        assert_eq!("not_built".parse::<BuildResult>().unwrap(), BuildResult::NotBuilt);
    }

    #[test]
    fn parse_rejects_unknown() {
        assert!("flaky".parse::<BuildResult>().is_err());
    }

    #[test]
    fn display_matches_serde_name() {
        for r in BuildResult::all() {
            let yaml = serde_yaml::to_string(r).unwrap();
            assert_eq!(yaml.trim(), r.to_string());
        }
    }
}
