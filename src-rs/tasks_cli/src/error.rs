use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    /// The server answered with a non-success status.
    #[error("http {status}: {message}")]
    Http { status: u16, message: String },

    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("{0}")]
    Validation(String),

    #[error("session file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("could not read password: {0}")]
    Prompt(#[source] io::Error),

    #[error("session file is not valid JSON: {0}")]
    Encoding(#[from] serde_json::Error),
}

impl CliError {
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, CliError::Http { status: 401, .. })
    }
}
