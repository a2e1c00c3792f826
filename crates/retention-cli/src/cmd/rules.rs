use crate::output::{print_json, print_table};
use anyhow::Context;
use clap::Subcommand;
use retention_core::config::{RulesConfig, WarnLevel};
use std::path::Path;

#[derive(Subcommand)]
pub enum RulesSubcommand {
    /// Show the configured rules in evaluation order
    Show,
    /// Validate the rules file for common mistakes
    Validate,
}

pub fn run(root: &Path, subcmd: RulesSubcommand, json: bool) -> anyhow::Result<()> {
    match subcmd {
        RulesSubcommand::Show => show(root, json),
        RulesSubcommand::Validate => validate(root, json),
    }
}

fn show(root: &Path, json: bool) -> anyhow::Result<()> {
    let config = RulesConfig::load(root).context("failed to load rules")?;

    if json {
        print_json(&config.rules)?;
        return Ok(());
    }

    if config.rules.is_empty() {
        println!("No rules configured.");
        return Ok(());
    }

    let rows: Vec<Vec<String>> = config
        .rules
        .iter()
        .enumerate()
        .map(|(i, r)| {
            vec![
                (i + 1).to_string(),
                r.name.clone().unwrap_or_default(),
                r.match_at_most.to_string(),
                if r.continue_after_match { "yes" } else { "no" }.to_string(),
                r.conditions.len().to_string(),
                r.actions.len().to_string(),
            ]
        })
        .collect();
    print_table(
        &["#", "NAME", "MATCH AT MOST", "CONTINUE", "CONDITIONS", "ACTIONS"],
        rows,
    );
    Ok(())
}

fn validate(root: &Path, json: bool) -> anyhow::Result<()> {
    let config = RulesConfig::load(root).context("failed to load rules")?;
    let warnings = config.validate();

    if json {
        let value = serde_json::json!({
            "warnings": warnings,
        });
        print_json(&value)?;
    } else if warnings.is_empty() {
        println!("Rules are valid. No warnings.");
    } else {
        for w in &warnings {
            let prefix = match w.level {
                WarnLevel::Warning => "warning",
                WarnLevel::Error => "error",
            };
            println!("[{prefix}] {}", w.message);
        }
    }

    if warnings.iter().any(|w| w.level == WarnLevel::Error) {
        anyhow::bail!("rules validation found errors");
    }
    Ok(())
}
