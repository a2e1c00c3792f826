use crate::output::print_json;
use anyhow::Context;
use chrono::{Duration, Utc};
use retention_core::{paths, types::BuildResult, JobHistory};
use std::path::Path;

pub struct RecordArgs<'a> {
    pub job: &'a str,
    pub result: &'a str,
    pub description: Option<String>,
    pub artifacts: Vec<String>,
    pub causes: Vec<String>,
    pub days_ago: u32,
}

pub fn run(root: &Path, args: RecordArgs<'_>, json: bool) -> anyhow::Result<()> {
    paths::validate_job_name(args.job)?;
    let result: BuildResult = args.result.parse()?;

    let mut history = JobHistory::load_or_new(root, args.job)
        .with_context(|| format!("failed to load history for '{}'", args.job))?;

    let build = history.record(result);
    build.timestamp = Utc::now() - Duration::days(i64::from(args.days_ago));
    build.description = args.description;
    build.artifacts = args.artifacts;
    build.causes = args.causes;
    let build = build.clone();

    history
        .save(root)
        .with_context(|| format!("failed to save history for '{}'", args.job))?;

    if json {
        print_json(&build)?;
    } else {
        println!("Recorded {} #{} ({})", build.job, build.number, build.result);
    }
    Ok(())
}
