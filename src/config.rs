use std::{fmt, path::PathBuf, str::FromStr};

use clap::Parser;
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("expected \"<host> <port>\" or \"<host>:<port>\", got {0:?}")]
    InvalidPrimaryAddress(String),
    #[error("invalid port {0:?}")]
    InvalidPort(String),
}

/// Address of the primary a replica follows.
#[derive(Debug, Clone, PartialEq)]
pub struct PrimaryAddress {
    pub host: String,
    pub port: u16,
}

impl FromStr for PrimaryAddress {
    type Err = ConfigError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let trimmed = input.trim();

        let (host, port) = match trimmed.split_once(' ') {
            Some((host, port)) => (host, port.trim()),
            None => trimmed
                .rsplit_once(':')
                .ok_or_else(|| ConfigError::InvalidPrimaryAddress(input.to_string()))?,
        };

        if host.is_empty() {
            return Err(ConfigError::InvalidPrimaryAddress(input.to_string()));
        }

        let port = port
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort(port.to_string()))?;

        Ok(PrimaryAddress {
            host: host.to_string(),
            port,
        })
    }
}

impl fmt::Display for PrimaryAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// Command-line configuration of a server process.
#[derive(Parser, Debug, Clone, PartialEq)]
#[command(author, version, about = "Redis-compatible key-value server with replication")]
pub struct ServerConfig {
    /// Port to listen on
    #[arg(long, default_value_t = 6379)]
    pub port: u16,

    /// Follow a primary, given as "<host> <port>" or "<host>:<port>"
    #[arg(long)]
    pub replicaof: Option<PrimaryAddress>,

    /// Directory holding the snapshot file
    #[arg(long)]
    pub dir: Option<PathBuf>,

    /// Snapshot file name inside --dir
    #[arg(long)]
    pub dbfilename: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 6379,
            replicaof: None,
            dir: None,
            dbfilename: None,
        }
    }
}

impl ServerConfig {
    /// Path of the snapshot file when both `dir` and `dbfilename` are set.
    pub fn snapshot_path(&self) -> Option<PathBuf> {
        match (&self.dir, &self.dbfilename) {
            (Some(dir), Some(dbfilename)) => Some(dir.join(dbfilename)),
            _ => None,
        }
    }

    /// Value reported by `CONFIG GET` for a lower-cased parameter name.
    pub fn get_parameter(&self, name: &str) -> String {
        match name {
            "dir" => self
                .dir
                .as_ref()
                .map(|dir| dir.display().to_string())
                .unwrap_or_default(),
            "dbfilename" => self.dbfilename.clone().unwrap_or_default(),
            _ => String::new(),
        }
    }
}
