//! Condition capability and the built-in conditions over [`BuildRecord`].

use crate::build::{Build, BuildRecord};
use crate::error::{Result, RetentionError};
use crate::rule::RuleConfiguration;
use crate::types::{BuildNumber, BuildResult};
use chrono::{DateTime, Utc};
use regex::Regex;

// ---------------------------------------------------------------------------
// Condition
// ---------------------------------------------------------------------------

/// A predicate deciding whether a rule applies to a build.
///
/// Implementations may read the owning rule's configuration but get no way to
/// change it or the rule's counters. An `Err` aborts the whole pass.
pub trait Condition<B> {
    /// Human-readable label used in diagnostics.
    fn label(&self) -> String;

    fn matches(&self, build: &B, configuration: &RuleConfiguration) -> Result<bool>;
}

// ---------------------------------------------------------------------------
// Built-in conditions
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct MatchEveryBuild;

impl Condition<BuildRecord> for MatchEveryBuild {
    fn label(&self) -> String {
        "match every build".to_string()
    }

    fn matches(&self, _build: &BuildRecord, _configuration: &RuleConfiguration) -> Result<bool> {
        Ok(true)
    }
}

#[derive(Debug, Clone)]
pub struct BuildResultCondition {
    results: Vec<BuildResult>,
}

impl BuildResultCondition {
    pub fn new(results: Vec<BuildResult>) -> Self {
        Self { results }
    }
}

impl Condition<BuildRecord> for BuildResultCondition {
    fn label(&self) -> String {
        let names: Vec<&str> = self.results.iter().map(|r| r.as_str()).collect();
        format!("build result in [{}]", names.join(", "))
    }

    fn matches(&self, build: &BuildRecord, _configuration: &RuleConfiguration) -> Result<bool> {
        Ok(self.results.contains(&build.result))
    }
}

/// Inclusive range over build numbers.
#[derive(Debug, Clone)]
pub struct BuildNumberRange {
    min: BuildNumber,
    max: BuildNumber,
}

impl BuildNumberRange {
    pub fn new(min: BuildNumber, max: BuildNumber) -> Self {
        Self { min, max }
    }
}

impl Condition<BuildRecord> for BuildNumberRange {
    fn label(&self) -> String {
        format!("build number in [{}, {}]", self.min, self.max)
    }

    fn matches(&self, build: &BuildRecord, _configuration: &RuleConfiguration) -> Result<bool> {
        Ok(self.min <= build.number && build.number <= self.max)
    }
}

/// Build age in whole days, measured against a fixed instant.
///
/// Matches when `older_than_days <= age < younger_than_days`. Either bound
/// may be omitted.
#[derive(Debug, Clone)]
pub struct BuildAgeRange {
    older_than_days: Option<u32>,
    younger_than_days: Option<u32>,
    now: DateTime<Utc>,
}

impl BuildAgeRange {
    pub fn new(
        older_than_days: Option<u32>,
        younger_than_days: Option<u32>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            older_than_days,
            younger_than_days,
            now,
        }
    }
}

impl Condition<BuildRecord> for BuildAgeRange {
    fn label(&self) -> String {
        match (self.older_than_days, self.younger_than_days) {
            (Some(o), Some(y)) => format!("build age between {o} and {y} days"),
            (Some(o), None) => format!("build older than {o} days"),
            (None, Some(y)) => format!("build younger than {y} days"),
            (None, None) => "build of any age".to_string(),
        }
    }

    fn matches(&self, build: &BuildRecord, _configuration: &RuleConfiguration) -> Result<bool> {
        let age_days = (self.now - build.timestamp).num_days();
        if age_days < 0 {
            return Err(RetentionError::Condition {
                condition: self.label(),
                build: build.display_name(),
                reason: format!("build timestamp {} is in the future", build.timestamp),
            });
        }
        let older_ok = self
            .older_than_days
            .map(|o| age_days >= i64::from(o))
            .unwrap_or(true);
        let younger_ok = self
            .younger_than_days
            .map(|y| age_days < i64::from(y))
            .unwrap_or(true);
        Ok(older_ok && younger_ok)
    }
}

/// Build description matches a regular expression. Builds with no
/// description never match.
#[derive(Debug, Clone)]
pub struct BuildDescription {
    pattern: Regex,
}

impl BuildDescription {
    pub fn new(pattern: &str) -> Result<Self> {
        Ok(Self {
            pattern: compile(pattern)?,
        })
    }
}

impl Condition<BuildRecord> for BuildDescription {
    fn label(&self) -> String {
        format!("description matches /{}/", self.pattern.as_str())
    }

    fn matches(&self, build: &BuildRecord, _configuration: &RuleConfiguration) -> Result<bool> {
        Ok(build
            .description
            .as_deref()
            .map(|d| self.pattern.is_match(d))
            .unwrap_or(false))
    }
}

/// Any recorded cause contains the given text.
#[derive(Debug, Clone)]
pub struct CauseCondition {
    contains: String,
}

impl CauseCondition {
    pub fn new(contains: impl Into<String>) -> Self {
        Self {
            contains: contains.into(),
        }
    }
}

impl Condition<BuildRecord> for CauseCondition {
    fn label(&self) -> String {
        format!("cause contains '{}'", self.contains)
    }

    fn matches(&self, build: &BuildRecord, _configuration: &RuleConfiguration) -> Result<bool> {
        Ok(build.causes.iter().any(|c| c.contains(&self.contains)))
    }
}

pub(crate) fn compile(pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|e| RetentionError::InvalidPattern {
        pattern: pattern.to_string(),
        reason: e.to_string(),
    })
}
