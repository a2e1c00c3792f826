use anyhow::Context;
use retention_core::{config::STARTER_RULES, io, paths};
use std::path::Path;

pub fn run(root: &Path) -> anyhow::Result<()> {
    println!("Initializing build retention in: {}", root.display());

    for dir in [paths::retention_dir(root), paths::jobs_dir(root)] {
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("failed to create {}", dir.display()))?;
    }

    let rules = paths::rules_path(root);
    if io::write_if_missing(&rules, STARTER_RULES.as_bytes())
        .context("failed to write rules.yaml")?
    {
        println!("  created: {}", paths::RULES_FILE);
    } else {
        println!("  exists:  {}", paths::RULES_FILE);
    }

    println!("\nNext: retention record <job> --result success");
    Ok(())
}
