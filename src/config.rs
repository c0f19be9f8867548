//! Traversal configuration
//!
//! Controlled by environment variables:
//! - `SYMGRAD_SCHEDULE=pending|topological`: how operators are ordered
//!   during the backward pass (default `pending`)

use std::fmt;
use std::str::FromStr;

use crate::error::ConfigError;

/// Environment variable selecting the [`Schedule`].
pub const SCHEDULE_ENV: &str = "SYMGRAD_SCHEDULE";

/// How the backward scheduler orders operators.
///
/// Both strategies visit each reachable operator once, after every
/// contribution to its outputs has arrived, and produce the same gradients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub enum Schedule {
    /// Worklist driven by a per-operator count of unfinished consumers.
    #[default]
    Pending,
    /// One reverse topological order of the reachable subgraph, computed up front.
    Topological,
}

impl FromStr for Schedule {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" | "worklist" => Ok(Schedule::Pending),
            "topological" | "topo" => Ok(Schedule::Topological),
            _ => Err(ConfigError::InvalidValue {
                key: SCHEDULE_ENV,
                value: s.to_string(),
                expected: "pending, topological",
            }),
        }
    }
}

impl fmt::Display for Schedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Schedule::Pending => write!(f, "pending"),
            Schedule::Topological => write!(f, "topological"),
        }
    }
}

/// Settings for one backward traversal.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GradConfig {
    pub schedule: Schedule,
}

impl GradConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_schedule(mut self, schedule: Schedule) -> Self {
        self.schedule = schedule;
        self
    }

    /// Reads the configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| {
            std::env::var_os(key).map(|value| value.to_string_lossy().into_owned())
        })
    }

    /// Reads the configuration through `lookup`, which maps a variable name
    /// to its value. Unset variables keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(value) = lookup(SCHEDULE_ENV) {
            config.schedule = value.parse()?;
        }
        Ok(config)
    }

    /// Environment configuration, or the defaults if it is malformed.
    pub(crate) fn from_env_or_default() -> Self {
        Self::from_env().unwrap_or_else(|err| {
            log::warn!("{}; using default configuration", err);
            Self::default()
        })
    }
}
