use crate::action::Action;
use crate::build::Build;
use crate::condition::Condition;
use crate::error::Result;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use tracing::{debug, info};

// ---------------------------------------------------------------------------
// MatchLimit
// ---------------------------------------------------------------------------

/// How many builds a rule may match within one pass.
///
/// Serialized as an integer: any negative value (conventionally `-1`) is
/// `Unbounded`. `AtMost(0)` means the rule never matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatchLimit {
    #[default]
    Unbounded,
    AtMost(u32),
}

impl MatchLimit {
    /// `None` when `raw` is above `u32::MAX`.
    pub fn from_raw(raw: i64) -> Option<Self> {
        if raw < 0 {
            Some(MatchLimit::Unbounded)
        } else {
            u32::try_from(raw).ok().map(MatchLimit::AtMost)
        }
    }

    pub fn as_raw(self) -> i64 {
        match self {
            MatchLimit::Unbounded => -1,
            MatchLimit::AtMost(n) => i64::from(n),
        }
    }

    pub fn is_reached(self, matched: u32) -> bool {
        match self {
            MatchLimit::Unbounded => false,
            MatchLimit::AtMost(n) => matched >= n,
        }
    }
}

impl fmt::Display for MatchLimit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchLimit::Unbounded => f.write_str("unbounded"),
            MatchLimit::AtMost(n) => write!(f, "{n}"),
        }
    }
}

impl Serialize for MatchLimit {
    fn serialize<S: Serializer>(&self, s: S) -> std::result::Result<S::Ok, S::Error> {
        s.serialize_i64(self.as_raw())
    }
}

impl<'de> Deserialize<'de> for MatchLimit {
    fn deserialize<D: Deserializer<'de>>(d: D) -> std::result::Result<Self, D::Error> {
        match Option::<i64>::deserialize(d)? {
            None => Ok(MatchLimit::Unbounded),
            Some(raw) => MatchLimit::from_raw(raw).ok_or_else(|| {
                de::Error::custom(format!(
                    "match_at_most {raw} is larger than {}",
                    u32::MAX
                ))
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// RuleConfiguration
// ---------------------------------------------------------------------------

/// Control parameters of a rule, handed read-only to each of its conditions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RuleConfiguration {
    #[serde(default)]
    pub match_at_most: MatchLimit,
    #[serde(default)]
    pub continue_after_match: bool,
}

// ---------------------------------------------------------------------------
// Rule
// ---------------------------------------------------------------------------

/// Conditions (AND-combined) paired with actions, plus a per-pass match
/// counter.
///
/// The counter belongs to one traversal pass: call [`Rule::initialize`] before
/// the first build of every pass. Construction alone does not reset it for
/// a reused rule.
pub struct Rule<B> {
    name: Option<String>,
    conditions: Vec<Box<dyn Condition<B>>>,
    actions: Vec<Box<dyn Action<B>>>,
    configuration: RuleConfiguration,
    matched_times: u32,
}

impl<B: Build> Rule<B> {
    pub fn new(
        conditions: Vec<Box<dyn Condition<B>>>,
        actions: Vec<Box<dyn Action<B>>>,
        configuration: RuleConfiguration,
    ) -> Self {
        Self {
            name: None,
            conditions,
            actions,
            configuration,
            matched_times: 0,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn matched_times(&self) -> u32 {
        self.matched_times
    }

    pub fn is_exhausted(&self) -> bool {
        self.configuration.match_at_most.is_reached(self.matched_times)
    }

    pub fn should_continue_after_match(&self) -> bool {
        self.configuration.continue_after_match
    }

    /// Reset the per-pass counter.
    pub fn initialize(&mut self) {
        self.matched_times = 0;
    }

    /// Returns `Ok(true)` when every condition matches `build`, consuming one
    /// unit of the match cap. An exhausted rule returns `Ok(false)` without
    /// consulting any condition; evaluation stops at the first condition that
    /// does not match.
    pub fn evaluate_conditions(&mut self, build: &B) -> Result<bool> {
        let label = build.display_name();
        debug!(
            matched = self.matched_times,
            cap = %self.configuration.match_at_most,
            build = %label,
            "validating match cap"
        );

        if self.is_exhausted() {
            debug!(matched = self.matched_times, build = %label, "rule exhausted, skipping");
            return Ok(false);
        }

        for condition in &self.conditions {
            debug!(condition = %condition.label(), build = %label, "processing condition");
            if !condition.matches(build, &self.configuration)? {
                debug!(
                    condition = %condition.label(),
                    matched = self.matched_times,
                    build = %label,
                    "condition did not match"
                );
                return Ok(false);
            }
        }

        self.matched_times += 1;
        info!(
            matched = self.matched_times,
            cap = %self.configuration.match_at_most,
            build = %label,
            "all conditions matched"
        );
        Ok(true)
    }

    /// Run every action in declaration order. The first failure stops the
    /// sequence.
    pub fn apply_actions(&self, build: &mut B) -> Result<()> {
        for action in &self.actions {
            debug!(action = %action.label(), build = %build.display_name(), "processing action");
            action.perform(build)?;
        }
        Ok(())
    }
}

impl<B> fmt::Debug for Rule<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rule")
            .field("name", &self.name)
            .field("conditions", &self.conditions.len())
            .field("actions", &self.actions.len())
            .field("configuration", &self.configuration)
            .field("matched_times", &self.matched_times)
            .finish()
    }
}
