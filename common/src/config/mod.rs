use std::fs::File;
use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::err::client_error::ClientError;
use crate::err::CResult;

/// Top level configuration file shape for a client process: connection
/// endpoint, default session settings, and the log-writer follower's
/// on-disk layout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    pub connection: ConnectionConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub log_writer: LogWriterConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub database: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// `RR|RC|RU|SERIALIZABLE`, see §6.
    pub isolation: String,
    /// Negative = infinite, zero = no-wait.
    pub lock_wait_seconds: i32,
    pub async_workspace: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            isolation: "RC".to_string(),
            lock_wait_seconds: -1,
            async_workspace: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogWriterConfig {
    pub db_name: String,
    pub log_dir: String,
    pub max_archive_size: u64,
}

impl Default for LogWriterConfig {
    fn default() -> Self {
        Self {
            db_name: "".to_string(),
            log_dir: "/tmp/dbclient/logwriter".to_string(),
            max_archive_size: 10 * 1024 * 1024,
        }
    }
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 33000,
            username: "public".to_string(),
            password: "".to_string(),
            database: None,
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            connection: ConnectionConfig::default(),
            session: SessionConfig::default(),
            log_writer: LogWriterConfig::default(),
        }
    }
}

/// Reads a TOML configuration file from `path`.
pub fn read_config<P: AsRef<Path>>(path: P) -> CResult<ClientConfig> {
    let mut file = File::open(path.as_ref())?;
    let mut s = String::new();
    file.read_to_string(&mut s)?;
    toml::from_str(&s).map_err(|e| ClientError::ConfigFileParseErr(e.to_string()))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn default_session_config_is_lock_wait_infinite_rc() {
        let cfg = ClientConfig::default();
        assert_eq!(cfg.session.isolation, "RC");
        assert_eq!(cfg.session.lock_wait_seconds, -1);
    }
}
