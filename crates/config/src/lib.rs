//! # Config - Saltbridge Settings
//!
//! Explicit configuration values handed to every component at construction.
//! Nothing in the workspace reads process-wide state on its own: the binary
//! builds a [`Settings`] once and passes the relevant half down.
//!
//! ## Sources (later wins)
//!
//! ```text
//! defaults  ->  SALTBRIDGE_* environment variables  ->  set(key, value)
//! ```
//!
//! ## Recognized keys
//!
//! ```text
//! key                              env var                         default
//! store.coordinator.hosts          SALTBRIDGE_COORDINATOR_HOSTS    localhost
//! store.coordinator.client-port    SALTBRIDGE_CLIENT_PORT          2181
//! store.data-dir                   SALTBRIDGE_DATA_DIR             data/store
//! store.journal-sync               SALTBRIDGE_JOURNAL_SYNC         true
//! job.entry-point                  SALTBRIDGE_ENTRY_POINT          saltbridge-migrate
//! job.reduce-tasks                 SALTBRIDGE_REDUCE_TASKS         4
//! job.max-task-attempts            SALTBRIDGE_MAX_TASK_ATTEMPTS    4
//! job.split-lines                  SALTBRIDGE_SPLIT_LINES          10000
//! ```
//!
//! Coordinator hosts are a comma-separated list. Each entry may carry its own
//! port (`node-a:2181,node-b`); entries without one use the client port.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Default coordinator client port.
pub const DEFAULT_CLIENT_PORT: u16 = 2181;
/// Default distributed-execution entry point name.
pub const DEFAULT_ENTRY_POINT: &str = "saltbridge-migrate";
/// Default root directory of the local store backend.
pub const DEFAULT_DATA_DIR: &str = "data/store";
/// Default number of reduce partitions per job.
pub const DEFAULT_REDUCE_TASKS: usize = 4;
/// Default attempts per map or reduce task before the job fails.
pub const DEFAULT_MAX_TASK_ATTEMPTS: u32 = 4;
/// Default number of input lines per file split.
pub const DEFAULT_SPLIT_LINES: usize = 10_000;

/// Configuration key names.
pub mod keys {
    pub const COORDINATOR_HOSTS: &str = "store.coordinator.hosts";
    pub const CLIENT_PORT: &str = "store.coordinator.client-port";
    pub const DATA_DIR: &str = "store.data-dir";
    pub const JOURNAL_SYNC: &str = "store.journal-sync";
    pub const ENTRY_POINT: &str = "job.entry-point";
    pub const REDUCE_TASKS: &str = "job.reduce-tasks";
    pub const MAX_TASK_ATTEMPTS: &str = "job.max-task-attempts";
    pub const SPLIT_LINES: &str = "job.split-lines";
}

/// Key -> environment variable mapping, in load order.
const ENV_KEYS: &[(&str, &str)] = &[
    (keys::COORDINATOR_HOSTS, "SALTBRIDGE_COORDINATOR_HOSTS"),
    (keys::CLIENT_PORT, "SALTBRIDGE_CLIENT_PORT"),
    (keys::DATA_DIR, "SALTBRIDGE_DATA_DIR"),
    (keys::JOURNAL_SYNC, "SALTBRIDGE_JOURNAL_SYNC"),
    (keys::ENTRY_POINT, "SALTBRIDGE_ENTRY_POINT"),
    (keys::REDUCE_TASKS, "SALTBRIDGE_REDUCE_TASKS"),
    (keys::MAX_TASK_ATTEMPTS, "SALTBRIDGE_MAX_TASK_ATTEMPTS"),
    (keys::SPLIT_LINES, "SALTBRIDGE_SPLIT_LINES"),
];

/// Errors produced while building a [`Settings`] value.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// The key is not one of [`keys`].
    #[error("unknown configuration key: {0}")]
    UnknownKey(String),

    /// The value could not be parsed for the given key.
    #[error("invalid value {value:?} for {key}: {reason}")]
    InvalidValue {
        key: String,
        value: String,
        reason: String,
    },
}

/// One coordinator node to contact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoordinatorAddr {
    pub host: String,
    /// Per-host port override. `None` means "use the client port".
    pub port: Option<u16>,
}

impl CoordinatorAddr {
    /// Parses `host` or `host:port`.
    pub fn parse(s: &str) -> Result<Self, ConfigError> {
        let invalid = |reason: &str| ConfigError::InvalidValue {
            key: keys::COORDINATOR_HOSTS.to_string(),
            value: s.to_string(),
            reason: reason.to_string(),
        };

        let s = s.trim();
        let (host, port) = match s.rsplit_once(':') {
            Some((host, port)) => {
                let port: u16 = port.parse().map_err(|_| invalid("port is not a number"))?;
                (host, Some(port))
            }
            None => (s, None),
        };
        if host.is_empty() {
            return Err(invalid("host must not be empty"));
        }
        Ok(Self {
            host: host.to_string(),
            port,
        })
    }

    /// Returns the effective port given the configured client port.
    #[must_use]
    pub fn port_or(&self, client_port: u16) -> u16 {
        self.port.unwrap_or(client_port)
    }
}

impl fmt::Display for CoordinatorAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.port {
            Some(p) => write!(f, "{}:{}", self.host, p),
            None => write!(f, "{}", self.host),
        }
    }
}

/// Connection settings for the column-family store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    pub coordinators: Vec<CoordinatorAddr>,
    pub client_port: u16,
    pub data_dir: PathBuf,
    /// If `true`, every journal append is followed by `fsync`.
    pub journal_sync: bool,
}

impl StoreConfig {
    /// Returns `host:port` for every coordinator, applying the client port
    /// where no per-host port was given.
    #[must_use]
    pub fn endpoints(&self) -> Vec<String> {
        self.coordinators
            .iter()
            .map(|c| format!("{}:{}", c.host, c.port_or(self.client_port)))
            .collect()
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            coordinators: vec![CoordinatorAddr {
                host: "localhost".to_string(),
                port: None,
            }],
            client_port: DEFAULT_CLIENT_PORT,
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            journal_sync: true,
        }
    }
}

/// Batch job settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobConfig {
    /// Name under which jobs are submitted to the execution substrate.
    pub entry_point: String,
    pub reduce_tasks: usize,
    pub max_task_attempts: u32,
    pub split_lines: usize,
}

impl Default for JobConfig {
    fn default() -> Self {
        Self {
            entry_point: DEFAULT_ENTRY_POINT.to_string(),
            reduce_tasks: DEFAULT_REDUCE_TASKS,
            max_task_attempts: DEFAULT_MAX_TASK_ATTEMPTS,
            split_lines: DEFAULT_SPLIT_LINES,
        }
    }
}

/// The full configuration: store connection plus job settings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Settings {
    pub store: StoreConfig,
    pub job: JobConfig,
}

impl Settings {
    /// Defaults overlaid with any `SALTBRIDGE_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Defaults overlaid with whatever `lookup` returns for each environment
    /// variable name. Lets tests supply variables without touching the process
    /// environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut settings = Self::default();
        for (key, env) in ENV_KEYS {
            if let Some(value) = lookup(env) {
                settings.set(key, &value)?;
            }
        }
        Ok(settings)
    }

    /// Sets a single key. Values are parsed and validated immediately.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        match key {
            keys::COORDINATOR_HOSTS => {
                self.store.coordinators = value
                    .split(',')
                    .map(str::trim)
                    .filter(|h| !h.is_empty())
                    .map(CoordinatorAddr::parse)
                    .collect::<Result<_, _>>()?;
            }
            keys::CLIENT_PORT => self.store.client_port = parse(key, value)?,
            keys::DATA_DIR => self.store.data_dir = PathBuf::from(value),
            keys::JOURNAL_SYNC => self.store.journal_sync = parse(key, value)?,
            keys::ENTRY_POINT => {
                if value.trim().is_empty() {
                    return Err(invalid(key, value, "must not be empty"));
                }
                self.job.entry_point = value.trim().to_string();
            }
            keys::REDUCE_TASKS => self.job.reduce_tasks = parse_positive(key, value)?,
            keys::MAX_TASK_ATTEMPTS => {
                self.job.max_task_attempts = parse_positive::<u32>(key, value)?
            }
            keys::SPLIT_LINES => self.job.split_lines = parse_positive(key, value)?,
            other => return Err(ConfigError::UnknownKey(other.to_string())),
        }
        Ok(())
    }
}

fn invalid(key: &str, value: &str, reason: &str) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

fn parse<T>(key: &str, value: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e: T::Err| invalid(key, value, &e.to_string()))
}

fn parse_positive<T>(key: &str, value: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr + Default + PartialEq,
    T::Err: fmt::Display,
{
    let v: T = parse(key, value)?;
    if v == T::default() {
        return Err(invalid(key, value, "must be greater than zero"));
    }
    Ok(v)
}
