use std::env;
use std::path::PathBuf;

use clap::Parser;

const DEFAULT_URL: &str = "http://localhost:5000";
const STATE_FILE: &str = "session.json";

#[derive(Clone, Debug, Parser)]
#[command(name = "tasks", version, about = "Terminal client for the task tracker API")]
pub struct CliConfig {
    /// Server base URL, without the /api suffix.
    #[arg(long = "base", env = "TASK_TRACKER_URL", default_value = DEFAULT_URL)]
    pub base_url: String,

    /// File holding the saved credential and theme.
    #[arg(long = "state", env = "TASK_TRACKER_STATE")]
    pub state_file: Option<PathBuf>,

    /// Log requests to stderr.
    #[arg(short, long)]
    pub verbose: bool,
}

impl CliConfig {
    pub fn state_path(&self) -> PathBuf {
        if let Some(path) = &self.state_file {
            return path.clone();
        }
        match env::var_os("HOME") {
            Some(home) => PathBuf::from(home).join(".task-tracker").join(STATE_FILE),
            None => PathBuf::from(".task-tracker").join(STATE_FILE),
        }
    }

    pub fn log_filter(&self) -> &'static str {
        if self.verbose {
            "debug"
        } else {
            "warn"
        }
    }
}
