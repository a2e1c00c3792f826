use crate::action::{
    Action, ChangeBuildDescription, DeleteArtifacts, DeleteArtifactsMatching, DeleteBuild,
    DeleteLogFile, KeepBuildForever,
};
use crate::build::BuildRecord;
use crate::condition::{
    compile, BuildAgeRange, BuildDescription, BuildNumberRange, BuildResultCondition,
    CauseCondition, Condition, MatchEveryBuild,
};
use crate::error::{Result, RetentionError};
use crate::io::atomic_write;
use crate::manager::HistoryManager;
use crate::paths;
use crate::rule::{MatchLimit, Rule, RuleConfiguration};
use crate::types::{BuildNumber, BuildResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

// ---------------------------------------------------------------------------
// ConfigWarning / WarnLevel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigWarning {
    pub level: WarnLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarnLevel {
    Warning,
    Error,
}

// ---------------------------------------------------------------------------
// ConditionSpec
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", deny_unknown_fields)]
pub enum ConditionSpec {
    MatchEveryBuild,
    BuildResult {
        results: Vec<BuildResult>,
    },
    BuildNumberRange {
        #[serde(default)]
        min: BuildNumber,
        #[serde(default = "default_max_number")]
        max: BuildNumber,
    },
    BuildAgeRange {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        older_than_days: Option<u32>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        younger_than_days: Option<u32>,
    },
    BuildDescription {
        pattern: String,
    },
    Cause {
        contains: String,
    },
}

fn default_max_number() -> BuildNumber {
    BuildNumber::MAX
}

impl ConditionSpec {
    /// Instantiate the condition. `now` anchors age-based conditions so that
    /// every build in a pass is measured against the same instant.
    pub fn build(&self, now: DateTime<Utc>) -> Result<Box<dyn Condition<BuildRecord>>> {
        let condition: Box<dyn Condition<BuildRecord>> = match self {
            ConditionSpec::MatchEveryBuild => Box::new(MatchEveryBuild),
            ConditionSpec::BuildResult { results } => {
                Box::new(BuildResultCondition::new(results.clone()))
            }
            ConditionSpec::BuildNumberRange { min, max } => {
                Box::new(BuildNumberRange::new(*min, *max))
            }
            ConditionSpec::BuildAgeRange {
                older_than_days,
                younger_than_days,
            } => Box::new(BuildAgeRange::new(
                *older_than_days,
                *younger_than_days,
                now,
            )),
            ConditionSpec::BuildDescription { pattern } => {
                Box::new(BuildDescription::new(pattern)?)
            }
            ConditionSpec::Cause { contains } => Box::new(CauseCondition::new(contains.clone())),
        };
        Ok(condition)
    }
}

// ---------------------------------------------------------------------------
// ActionSpec
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", deny_unknown_fields)]
pub enum ActionSpec {
    DeleteBuild,
    DeleteArtifacts,
    DeleteArtifactsMatchingPatterns {
        include: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        exclude: Option<String>,
    },
    DeleteLogFile,
    ChangeBuildDescription {
        description: String,
    },
    KeepBuildForever,
}

impl ActionSpec {
    pub fn build(&self) -> Result<Box<dyn Action<BuildRecord>>> {
        let action: Box<dyn Action<BuildRecord>> = match self {
            ActionSpec::DeleteBuild => Box::new(DeleteBuild),
            ActionSpec::DeleteArtifacts => Box::new(DeleteArtifacts),
            ActionSpec::DeleteArtifactsMatchingPatterns { include, exclude } => Box::new(
                DeleteArtifactsMatching::new(include, exclude.as_deref())?,
            ),
            ActionSpec::DeleteLogFile => Box::new(DeleteLogFile),
            ActionSpec::ChangeBuildDescription { description } => {
                Box::new(ChangeBuildDescription::new(description.clone()))
            }
            ActionSpec::KeepBuildForever => Box::new(KeepBuildForever),
        };
        Ok(action)
    }
}

// ---------------------------------------------------------------------------
// RuleSpec
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RuleSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub match_at_most: MatchLimit,
    #[serde(default)]
    pub continue_after_match: bool,
    #[serde(default)]
    pub conditions: Vec<ConditionSpec>,
    #[serde(default)]
    pub actions: Vec<ActionSpec>,
}

impl RuleSpec {
    pub fn build(&self, now: DateTime<Utc>) -> Result<Rule<BuildRecord>> {
        let conditions = self
            .conditions
            .iter()
            .map(|c| c.build(now))
            .collect::<Result<Vec<_>>>()?;
        let actions = self
            .actions
            .iter()
            .map(ActionSpec::build)
            .collect::<Result<Vec<_>>>()?;
        let rule = Rule::new(conditions, actions, self.configuration());
        Ok(match &self.name {
            Some(name) => rule.with_name(name.clone()),
            None => rule,
        })
    }

    pub fn configuration(&self) -> RuleConfiguration {
        RuleConfiguration {
            match_at_most: self.match_at_most,
            continue_after_match: self.continue_after_match,
        }
    }

    fn display(&self, index: usize) -> String {
        match &self.name {
            Some(name) => format!("rule {} ('{name}')", index + 1),
            None => format!("rule {}", index + 1),
        }
    }
}

// ---------------------------------------------------------------------------
// RulesConfig
// ---------------------------------------------------------------------------

/// The ordered rule list kept in `.retention/rules.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RulesConfig {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub rules: Vec<RuleSpec>,
}

fn default_version() -> u32 {
    1
}

impl RulesConfig {
    pub fn load(root: &Path) -> Result<Self> {
        let path = paths::rules_path(root);
        if !path.exists() {
            return Err(RetentionError::NotInitialized);
        }
        let data = std::fs::read_to_string(&path)?;
        let config: RulesConfig = serde_yaml::from_str(&data)?;
        Ok(config)
    }

    pub fn save(&self, root: &Path) -> Result<()> {
        let data = serde_yaml::to_string(self)?;
        atomic_write(&paths::rules_path(root), data.as_bytes())
    }

    /// Turn the declarative rules into live rules, in declaration order.
    pub fn materialize(&self, now: DateTime<Utc>) -> Result<Vec<Rule<BuildRecord>>> {
        self.rules
            .iter()
            .enumerate()
            .map(|(i, spec)| {
                spec.build(now).map_err(|e| {
                    RetentionError::InvalidConfig(format!("{}: {e}", spec.display(i)))
                })
            })
            .collect()
    }

    pub fn manager(&self, now: DateTime<Utc>) -> Result<HistoryManager<BuildRecord>> {
        Ok(HistoryManager::new(self.materialize(now)?))
    }

    /// Check the rule list for mistakes that load fine but misbehave.
    pub fn validate(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();
        let mut error = |message: String| {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message,
            })
        };

        for (i, rule) in self.rules.iter().enumerate() {
            let name = rule.display(i);
            for condition in &rule.conditions {
                match condition {
                    ConditionSpec::BuildDescription { pattern } => {
                        if let Err(e) = compile(pattern) {
                            error(format!("{name}: {e}"));
                        }
                    }
                    ConditionSpec::BuildNumberRange { min, max } if min > max => {
                        error(format!("{name}: build number range {min}..{max} is empty"));
                    }
                    ConditionSpec::BuildAgeRange {
                        older_than_days: Some(o),
                        younger_than_days: Some(y),
                    } if o >= y => {
                        error(format!("{name}: build age range {o}..{y} days is empty"));
                    }
                    ConditionSpec::BuildResult { results } if results.is_empty() => {
                        error(format!("{name}: build_result lists no results"));
                    }
                    _ => {}
                }
            }
            for action in &rule.actions {
                if let ActionSpec::DeleteArtifactsMatchingPatterns { include, exclude } = action {
                    for p in std::iter::once(include).chain(exclude.iter()) {
                        if let Err(e) = compile(p) {
                            error(format!("{name}: {e}"));
                        }
                    }
                }
            }
        }

        for (i, rule) in self.rules.iter().enumerate() {
            let name = rule.display(i);
            let cap = rule.match_at_most;
            if rule.actions.is_empty() && rule.continue_after_match {
                warnings.push(ConfigWarning {
                    level: WarnLevel::Warning,
                    message: format!(
                        "{name}: has no actions and continues after a match, so it does nothing"
                    ),
                });
            } else if rule.actions.is_empty() && cap == MatchLimit::Unbounded {
                warnings.push(ConfigWarning {
                    level: WarnLevel::Warning,
                    message: format!("{name}: has no actions and no match cap, so it only hides builds from later rules"),
                });
            }
            if cap == MatchLimit::AtMost(0) {
                warnings.push(ConfigWarning {
                    level: WarnLevel::Warning,
                    message: format!("{name}: match_at_most is 0, the rule never matches"),
                });
            }
        }

        if let Some(i) = self.rules.iter().position(|r| r.catches_everything()) {
            if i + 1 < self.rules.len() {
                warnings.push(ConfigWarning {
                    level: WarnLevel::Warning,
                    message: format!(
                        "{} matches every build and stops; rules after it are never evaluated",
                        self.rules[i].display(i)
                    ),
                });
            }
        }

        warnings
    }
}

impl RuleSpec {
    fn catches_everything(&self) -> bool {
        self.match_at_most == MatchLimit::Unbounded
            && !self.continue_after_match
            && self
                .conditions
                .iter()
                .all(|c| matches!(c, ConditionSpec::MatchEveryBuild))
    }
}

/// Rules file written by `retention init`.
pub const STARTER_RULES: &str = "\
# Rules are evaluated in order for every completed build, newest first.
# match_at_most: -1 (or omitted) means no cap.
version: 1
rules:
  - name: keep-recent
    match_at_most: 10
    continue_after_match: false
    conditions:
      - type: build_result
        results: [success]
  - name: prune-old-artifacts
    continue_after_match: true
    conditions:
      - type: build_age_range
        older_than_days: 30
    actions:
      - type: delete_artifacts
  - name: drop-failures
    match_at_most: -1
    conditions:
      - type: build_result
        results: [failure, aborted]
    actions:
      - type: delete_build
";

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::JobHistory;
    use tempfile::TempDir;

    fn parse(yaml: &str) -> RulesConfig {
        serde_yaml::from_str(yaml).unwrap()
    }

    #[test]
    fn starter_rules_parse_and_validate_clean() {
        let config = parse(STARTER_RULES);
        assert_eq!(config.rules.len(), 3);
        assert_eq!(config.rules[0].match_at_most, MatchLimit::AtMost(10));
        assert_eq!(config.rules[2].match_at_most, MatchLimit::Unbounded);
        assert!(config.rules[1].continue_after_match);
        assert!(config.validate().is_empty(), "{:?}", config.validate());
        assert_eq!(config.materialize(Utc::now()).unwrap().len(), 3);
    }

    #[test]
    fn rule_defaults() {
        let config = parse("rules:\n  - actions:\n      - type: delete_build\n");
        let rule = &config.rules[0];
        assert_eq!(rule.configuration(), RuleConfiguration::default());
        assert!(rule.conditions.is_empty());
        assert_eq!(config.version, 1);
    }

    #[test]
    fn unknown_condition_type_is_rejected() {
        let yaml = "rules:\n  - conditions:\n      - type: phase_of_moon\n";
        assert!(serde_yaml::from_str::<RulesConfig>(yaml).is_err());
    }

    #[test]
    fn yaml_round_trip_keeps_order() {
        let config = parse(STARTER_RULES);
        let yaml = serde_yaml::to_string(&config).unwrap();
        assert!(yaml.contains("type: build_age_range"));
        assert_eq!(parse(&yaml), config);
    }

    #[test]
    fn validate_reports_bad_regex_as_error() {
        let config = parse(
            "rules:\n  - conditions:\n      - type: build_description\n        pattern: '(oops'\n    actions:\n      - type: delete_build\n",
        );
        let warnings = config.validate();
        assert!(warnings.iter().any(|w| w.level == WarnLevel::Error));
        let err = config.materialize(Utc::now()).unwrap_err();
        assert!(err.to_string().contains("rule 1"));
    }

    #[test]
    fn validate_flags_empty_ranges() {
        let config = parse(
            "rules:\n  - conditions:\n      - type: build_number_range\n        min: 9\n        max: 3\n      - type: build_age_range\n        older_than_days: 10\n        younger_than_days: 5\n    actions:\n      - type: delete_build\n",
        );
        let errors: Vec<_> = config
            .validate()
            .into_iter()
            .filter(|w| w.level == WarnLevel::Error)
            .collect();
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn validate_flags_unreachable_rules() {
        let config = parse(
            "rules:\n  - name: everything\n    actions:\n      - type: keep_build_forever\n  - name: never\n    actions:\n      - type: delete_build\n",
        );
        let warnings = config.validate();
        assert!(warnings
            .iter()
            .any(|w| w.message.contains("never evaluated")));
    }

    #[test]
    fn validate_separates_hiding_rules_from_no_op_rules() {
        let config = parse(
            "rules:\n  - name: hides\n    conditions:\n      - type: build_result\n        results: [failure]\n  - name: idle\n    continue_after_match: true\n    conditions:\n      - type: build_result\n        results: [success]\n",
        );
        let warnings = config.validate();
        let hides: Vec<_> = warnings
            .iter()
            .filter(|w| w.message.starts_with("rule 1"))
            .collect();
        let idle: Vec<_> = warnings
            .iter()
            .filter(|w| w.message.starts_with("rule 2"))
            .collect();
        assert_eq!(hides.len(), 1);
        assert!(hides[0].message.contains("only hides builds"));
        assert_eq!(idle.len(), 1);
        assert!(idle[0].message.contains("does nothing"));
    }

    #[test]
    fn oversized_match_cap_is_rejected() {
        let err = serde_yaml::from_str::<RulesConfig>(
            "rules:\n  - match_at_most: 99999999999\n    actions:\n      - type: delete_build\n",
        )
        .unwrap_err();
        assert!(err.to_string().contains("match_at_most"), "{err}");
    }

    #[test]
    fn load_without_init_is_not_initialized() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            RulesConfig::load(dir.path()),
            Err(RetentionError::NotInitialized)
        ));
    }

    #[test]
    fn save_then_load() {
        let dir = TempDir::new().unwrap();
        let config = parse(STARTER_RULES);
        config.save(dir.path()).unwrap();
        assert_eq!(RulesConfig::load(dir.path()).unwrap(), config);
    }

    #[test]
    fn configured_manager_protects_recent_successes() {
        let config = parse(
            "rules:\n  - match_at_most: 2\n    conditions:\n      - type: build_result\n        results: [success]\n  - actions:\n      - type: delete_build\n",
        );
        let mut history = JobHistory::new("api");
        for _ in 0..5 {
            history.record(BuildResult::Success);
        }
        config
            .manager(Utc::now())
            .unwrap()
            .perform(&mut history)
            .unwrap();
        let kept: Vec<_> = history
            .builds
            .iter()
            .filter(|b| !b.discarded)
            .map(|b| b.number)
            .collect();
        assert_eq!(kept, vec![4, 5]);
    }
}
