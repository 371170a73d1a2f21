use std::env;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;

#[derive(Clone, Debug)]
pub struct ServerConfig {
    /// Loopback unless `HOST` says otherwise.
    pub host: IpAddr,
    pub port: u16,
    /// Where `tasks.json` and `users.json` live. `None` keeps everything in memory.
    pub data_dir: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: 5000,
            data_dir: None,
        }
    }
}

impl ServerConfig {
    /// Reads `HOST`, `PORT` and `TASK_TRACKER_DATA_DIR`; unset or unparsable
    /// values fall back to the defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            host: env_parse("HOST").unwrap_or(defaults.host),
            port: env_parse("PORT").unwrap_or(defaults.port),
            data_dir: env_opt("TASK_TRACKER_DATA_DIR").map(PathBuf::from),
        }
    }

    pub fn addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    pub fn tasks_path(&self) -> Option<PathBuf> {
        self.data_dir.as_ref().map(|dir| dir.join("tasks.json"))
    }

    pub fn users_path(&self) -> Option<PathBuf> {
        self.data_dir.as_ref().map(|dir| dir.join("users.json"))
    }
}

fn env_opt(key: &str) -> Option<String> {
    match env::var(key) {
        Ok(value) if !value.trim().is_empty() => Some(value),
        _ => None,
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    env_opt(key).and_then(|raw| raw.trim().parse::<T>().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_files_live_under_data_dir() {
        let cfg = ServerConfig {
            data_dir: Some(PathBuf::from("/var/lib/tasks")),
            ..ServerConfig::default()
        };
        assert_eq!(cfg.tasks_path(), Some(PathBuf::from("/var/lib/tasks/tasks.json")));
        assert_eq!(cfg.users_path(), Some(PathBuf::from("/var/lib/tasks/users.json")));
        assert_eq!(cfg.addr().port(), 5000);
    }

    #[test]
    fn binds_loopback_by_default() {
        let addr = ServerConfig::default().addr();
        assert!(addr.ip().is_loopback());
        assert_eq!(addr.to_string(), "127.0.0.1:5000");
    }

    #[test]
    fn in_memory_by_default() {
        assert!(ServerConfig::default().tasks_path().is_none());
    }
}
