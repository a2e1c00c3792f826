mod cmd;
mod output;
mod root;

use clap::{Parser, Subcommand};
use cmd::rules::RulesSubcommand;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "retention",
    about = "Rule-driven build history retention: decide which builds to keep and what to prune",
    version,
    propagate_version = true
)]
struct Cli {
    /// Project root (default: auto-detect from .retention/ or .git/)
    #[arg(long, global = true, env = "RETENTION_ROOT")]
    root: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    /// Log rule evaluation at info level
    #[arg(long, global = true, short = 'v')]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create .retention/ with a starter rules file
    Init,

    /// Record a completed build for a job
    Record {
        job: String,
        /// Build result: success, unstable, failure, not_built, aborted
        #[arg(long)]
        result: String,
        #[arg(long)]
        description: Option<String>,
        /// Artifact path (repeatable)
        #[arg(long = "artifact")]
        artifacts: Vec<String>,
        /// Cause text (repeatable)
        #[arg(long = "cause")]
        causes: Vec<String>,
        /// Age the build by this many days (for backfilling history)
        #[arg(long, default_value = "0")]
        days_ago: u32,
    },

    /// List jobs with recorded history
    Jobs,

    /// List a job's builds, newest first
    History { job: String },

    /// Inspect and validate the rules file
    Rules {
        #[command(subcommand)]
        subcommand: RulesSubcommand,
    },

    /// Apply the rules to a job's history
    Run {
        job: String,
        /// Evaluate and report without saving the result
        #[arg(long)]
        dry_run: bool,
    },
}

fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose {
        tracing::Level::INFO
    } else {
        tracing::Level::WARN
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(default_level.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let root = root::resolve_root(cli.root.as_deref());

    let result = match cli.command {
        Commands::Init => cmd::init::run(&root),
        Commands::Record {
            job,
            result,
            description,
            artifacts,
            causes,
            days_ago,
        } => cmd::record::run(
            &root,
            cmd::record::RecordArgs {
                job: &job,
                result: &result,
                description,
                artifacts,
                causes,
                days_ago,
            },
            cli.json,
        ),
        Commands::Jobs => cmd::jobs::run(&root, cli.json),
        Commands::History { job } => cmd::history::run(&root, &job, cli.json),
        Commands::Rules { subcommand } => cmd::rules::run(&root, subcommand, cli.json),
        Commands::Run { job, dry_run } => cmd::run::run(&root, &job, dry_run, cli.json),
    };

    if let Err(e) = result {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
