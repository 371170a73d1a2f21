use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

use crate::error::CliError;

/// On-disk shape. Key names match what the browser client keeps in
/// local storage.
#[derive(Debug, Default, Serialize, Deserialize)]
struct StoredSession {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    token: Option<String>,
    #[serde(rename = "darkMode", default)]
    dark_mode: bool,
}

/// Where the user asked to go.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Route {
    Login,
    Signup,
    Dashboard,
    Other,
}

/// What actually gets shown.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum View {
    Login,
    Signup,
    Dashboard,
}

/// Credential plus display preference, written back on every change.
#[derive(Debug)]
pub struct Session {
    path: PathBuf,
    token: Option<String>,
    dark_mode: bool,
}

impl Session {
    /// A missing or corrupt file starts a logged-out session.
    pub fn load(path: PathBuf) -> Result<Self, CliError> {
        let stored = match fs::read_to_string(&path) {
            Ok(data) => serde_json::from_str::<StoredSession>(&data).unwrap_or_else(|err| {
                tracing::warn!(path = %path.display(), error = %err, "ignoring corrupt session file");
                StoredSession::default()
            }),
            Err(err) if err.kind() == io::ErrorKind::NotFound => StoredSession::default(),
            Err(source) => return Err(CliError::Io { path, source }),
        };
        Ok(Self {
            path,
            token: stored.token.filter(|token| !token.is_empty()),
            dark_mode: stored.dark_mode,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn dark_mode(&self) -> bool {
        self.dark_mode
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    pub fn set_token(&mut self, token: String) -> Result<(), CliError> {
        self.token = Some(token);
        self.save()
    }

    pub fn logout(&mut self) -> Result<(), CliError> {
        self.token = None;
        self.save()
    }

    pub fn toggle_dark_mode(&mut self) -> Result<bool, CliError> {
        self.dark_mode = !self.dark_mode;
        self.save()?;
        Ok(self.dark_mode)
    }

    pub fn resolve(&self, route: Route) -> View {
        match (self.is_authenticated(), route) {
            (true, _) => View::Dashboard,
            (false, Route::Signup) => View::Signup,
            (false, _) => View::Login,
        }
    }

    /// Writes through a temp file in the same directory, so a crash leaves
    /// either the old file or the new one.
    fn save(&self) -> Result<(), CliError> {
        let stored = StoredSession {
            token: self.token.clone(),
            dark_mode: self.dark_mode,
        };
        let data = serde_json::to_vec_pretty(&stored)?;
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let io_err = |source| CliError::Io {
            path: self.path.clone(),
            source,
        };
        fs::create_dir_all(&dir).map_err(io_err)?;
        let mut tmp = NamedTempFile::new_in(&dir).map_err(io_err)?;
        tmp.write_all(&data).map_err(io_err)?;
        tmp.as_file().sync_all().map_err(io_err)?;
        tmp.persist(&self.path).map_err(|err| io_err(err.error))?;
        Ok(())
    }
}
