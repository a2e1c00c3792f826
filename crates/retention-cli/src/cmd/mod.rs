pub mod history;
pub mod init;
pub mod jobs;
pub mod record;
pub mod rules;
pub mod run;
