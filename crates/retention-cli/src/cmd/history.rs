use crate::output::{print_json, print_table};
use anyhow::Context;
use retention_core::JobHistory;
use std::path::Path;

pub fn run(root: &Path, job: &str, json: bool) -> anyhow::Result<()> {
    let history = JobHistory::load(root, job)
        .with_context(|| format!("failed to load history for '{job}'"))?;

    if json {
        let newest_first: Vec<_> = history.builds.iter().rev().collect();
        print_json(&newest_first)?;
        return Ok(());
    }

    if history.builds.is_empty() {
        println!("No builds recorded for '{job}'.");
        return Ok(());
    }

    let rows: Vec<Vec<String>> = history
        .builds
        .iter()
        .rev()
        .map(|b| {
            let mut flags = Vec::new();
            if b.keep_forever {
                flags.push("keep");
            }
            if !b.has_log {
                flags.push("no-log");
            }
            vec![
                format!("#{}", b.number),
                b.result.to_string(),
                b.timestamp.format("%Y-%m-%d %H:%M").to_string(),
                b.artifacts.len().to_string(),
                flags.join(","),
                b.description.clone().unwrap_or_default(),
            ]
        })
        .collect();
    print_table(
        &["BUILD", "RESULT", "FINISHED", "ARTIFACTS", "FLAGS", "DESCRIPTION"],
        rows,
    );
    Ok(())
}
