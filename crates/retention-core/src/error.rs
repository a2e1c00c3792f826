use thiserror::Error;

#[derive(Debug, Error)]
pub enum RetentionError {
    #[error("not initialized: run 'retention init'")]
    NotInitialized,

    #[error("job not found: {0}")]
    JobNotFound(String),

    #[error("invalid job name '{0}': must be lowercase alphanumeric with hyphens")]
    InvalidJobName(String),

    #[error("build #{0} not found")]
    BuildNotFound(u64),

    #[error("invalid build result: {0}")]
    InvalidBuildResult(String),

    #[error("invalid pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("condition '{condition}' failed on {build}: {reason}")]
    Condition {
        condition: String,
        build: String,
        reason: String,
    },

    #[error("action '{action}' failed on {build}: {reason}")]
    Action {
        action: String,
        build: String,
        reason: String,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),
}

pub type Result<T> = std::result::Result<T, RetentionError>;
