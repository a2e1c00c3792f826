pub mod action;
pub mod build;
pub mod condition;
pub mod config;
pub mod error;
pub mod history;
pub mod io;
pub mod manager;
pub mod paths;
pub mod rule;
pub mod types;

pub use build::{Build, BuildRecord};
pub use error::{Result, RetentionError};
pub use history::{BuildHistory, HistoryCursor, JobHistory};
pub use manager::HistoryManager;
pub use rule::{MatchLimit, Rule, RuleConfiguration};
