use crate::output::{print_json, print_table};
use anyhow::Context;
use chrono::Utc;
use retention_core::{config::RulesConfig, BuildRecord, JobHistory};
use serde::Serialize;
use std::path::Path;

#[derive(Serialize)]
struct RunReport {
    job: String,
    dry_run: bool,
    examined: usize,
    discarded: Vec<u64>,
    changed: Vec<u64>,
    remaining: usize,
}

pub fn run(root: &Path, job: &str, dry_run: bool, json: bool) -> anyhow::Result<()> {
    let config = RulesConfig::load(root).context("failed to load rules")?;
    let mut history = JobHistory::load(root, job)
        .with_context(|| format!("failed to load history for '{job}'"))?;
    let before: Vec<BuildRecord> = history.builds.clone();

    let mut manager = config
        .manager(Utc::now())
        .context("failed to build rules")?;
    manager
        .perform(&mut history)
        .with_context(|| format!("retention pass for '{job}' failed"))?;

    let discarded: Vec<u64> = history.discarded().map(|b| b.number).rev().collect();
    let changed: Vec<u64> = history
        .builds
        .iter()
        .rev()
        .filter(|b| !b.discarded)
        .filter(|b| before.iter().any(|o| o.number == b.number && o != *b))
        .map(|b| b.number)
        .collect();
    let report = RunReport {
        job: job.to_string(),
        dry_run,
        examined: before.len(),
        discarded,
        changed,
        remaining: before.len() - history.discarded().count(),
    };

    if !dry_run {
        history
            .save(root)
            .with_context(|| format!("failed to save history for '{job}'"))?;
    }

    if json {
        print_json(&report)?;
        return Ok(());
    }

    let verb = if dry_run { "Would discard" } else { "Discarded" };
    if report.discarded.is_empty() && report.changed.is_empty() {
        println!("{job}: nothing to do ({} builds examined)", report.examined);
        return Ok(());
    }

    let mut rows: Vec<Vec<String>> = report
        .discarded
        .iter()
        .map(|n| vec![format!("#{n}"), "discarded".to_string()])
        .collect();
    rows.extend(
        report
            .changed
            .iter()
            .map(|n| vec![format!("#{n}"), "modified".to_string()]),
    );
    print_table(&["BUILD", "OUTCOME"], rows);
    println!(
        "\n{job}: {verb} {} of {} builds, {} modified, {} kept",
        report.discarded.len(),
        report.examined,
        report.changed.len(),
        report.remaining
    );
    Ok(())
}
