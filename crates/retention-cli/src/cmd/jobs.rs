use crate::output::{print_json, print_table};
use anyhow::Context;
use retention_core::JobHistory;
use std::path::Path;

pub fn run(root: &Path, json: bool) -> anyhow::Result<()> {
    let names = JobHistory::list(root).context("failed to list jobs")?;
    let jobs = names
        .iter()
        .map(|name| {
            JobHistory::load(root, name).with_context(|| format!("failed to load job '{name}'"))
        })
        .collect::<anyhow::Result<Vec<_>>>()?;

    if json {
        let summaries: Vec<_> = jobs
            .iter()
            .map(|h| {
                serde_json::json!({
                    "job": h.job,
                    "builds": h.builds.len(),
                    "latest": h.builds.last().map(|b| b.number),
                })
            })
            .collect();
        print_json(&summaries)?;
        return Ok(());
    }

    if jobs.is_empty() {
        println!("No jobs yet. Run: retention record <job> --result success");
        return Ok(());
    }

    let rows: Vec<Vec<String>> = jobs
        .iter()
        .map(|h| {
            vec![
                h.job.clone(),
                h.builds.len().to_string(),
                h.builds
                    .last()
                    .map(|b| format!("#{} {}", b.number, b.result))
                    .unwrap_or_default(),
            ]
        })
        .collect();
    print_table(&["JOB", "BUILDS", "LATEST"], rows);
    Ok(())
}
