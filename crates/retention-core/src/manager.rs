use crate::build::Build;
use crate::error::{Result, RetentionError};
use crate::history::{BuildHistory, HistoryCursor};
use crate::rule::Rule;
use tracing::{debug, info};

// ---------------------------------------------------------------------------
// HistoryManager
// ---------------------------------------------------------------------------

/// Applies an ordered rule list to a job's build history.
///
/// Rules are consulted in declaration order for every build, newest build
/// first, so match caps are consumed from the most recent builds down.
pub struct HistoryManager<B> {
    rules: Vec<Rule<B>>,
}

impl<B: Build> HistoryManager<B> {
    pub fn new(rules: Vec<Rule<B>>) -> Self {
        Self { rules }
    }

    /// Run one traversal pass over `history`.
    ///
    /// Every rule is reset first. For each build, a matching rule's actions
    /// run immediately; a match on a rule without `continue_after_match` ends
    /// rule evaluation for that build. The first condition or action error
    /// aborts the pass; effects already applied stay applied.
    pub fn perform<H>(&mut self, history: &mut H) -> Result<()>
    where
        H: BuildHistory<Build = B> + ?Sized,
    {
        for rule in &mut self.rules {
            rule.initialize();
        }

        let mut cursor = HistoryCursor::open(&*history);
        let Some(triggering) = cursor.current() else {
            debug!("no completed builds, nothing to do");
            return Ok(());
        };
        info!(triggering, rules = self.rules.len(), "starting retention pass");

        let mut visited = 0usize;
        while let Some(number) = cursor.current() {
            visited += 1;
            let build = history
                .build_mut(number)
                .ok_or(RetentionError::BuildNotFound(number))?;
            let label = build.display_name();
            debug!(build = %label, count = visited, triggering, "processing rules");

            for (i, rule) in self.rules.iter_mut().enumerate() {
                debug!(rule = i + 1, name = rule.name(), build = %label, "evaluating rule");
                if !rule.evaluate_conditions(build)? {
                    continue;
                }

                info!(rule = i + 1, name = rule.name(), build = %label, "applying actions");
                rule.apply_actions(build)?;

                if !rule.should_continue_after_match() {
                    debug!(build = %label, "not continuing with remaining rules");
                    break;
                }
                debug!(build = %label, "continuing with remaining rules");
            }

            cursor.advance(&*history);
        }

        info!(triggering, visited, "retention pass finished");
        Ok(())
    }
}
