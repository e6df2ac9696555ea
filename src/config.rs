//! Process configuration

use crate::error::{Error, Result};
use crate::manager::FailurePolicy;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Default number of most-recent messages fetched per account.
pub const DEFAULT_MAX_FETCH: usize = 6;

/// Default location of the accounts file.
pub const DEFAULT_ACCOUNTS_PATH: &str = "accounts.conf";

/// Connect and per-command timeouts for IMAP sessions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    /// TCP connect, TLS handshake and LOGIN together.
    pub connect: Duration,
    /// Any single IMAP round-trip after login.
    pub io: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            connect: Duration::from_secs(30),
            io: Duration::from_secs(60),
        }
    }
}

/// Client configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub accounts_path: PathBuf,
    pub max_fetch: usize,
    pub failure_policy: FailurePolicy,
    pub parallel: bool,
    pub timeouts: Timeouts,
    /// PEM bundle of extra trust anchors, for self-signed servers.
    pub ca_file: Option<PathBuf>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            accounts_path: PathBuf::from(DEFAULT_ACCOUNTS_PATH),
            max_fetch: DEFAULT_MAX_FETCH,
            failure_policy: FailurePolicy::default(),
            parallel: false,
            timeouts: Timeouts::default(),
            ca_file: None,
        }
    }
}

impl ClientConfig {
    /// Load configuration from environment variables
    ///
    /// Reads from `.env` file if present. All variables are optional:
    /// - `MMCLIENT_ACCOUNTS` (default: `accounts.conf`)
    /// - `MMCLIENT_MAX_FETCH` (default: `6`)
    /// - `MMCLIENT_FAILURE_POLICY` (`fail-fast` or `best-effort`, default: `fail-fast`)
    /// - `MMCLIENT_PARALLEL` (default: `false`)
    /// - `MMCLIENT_CONNECT_TIMEOUT_SECS` (default: `30`)
    /// - `MMCLIENT_IO_TIMEOUT_SECS` (default: `60`)
    /// - `MMCLIENT_CA_FILE` (no default)
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if a variable is set but malformed.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if a value is present but malformed.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Self::default();

        let accounts_path = lookup("MMCLIENT_ACCOUNTS").map_or(defaults.accounts_path, PathBuf::from);

        let max_fetch = match lookup("MMCLIENT_MAX_FETCH") {
            Some(v) => v
                .trim()
                .parse()
                .map_err(|e| Error::Config(format!("Invalid MMCLIENT_MAX_FETCH: {e}")))?,
            None => defaults.max_fetch,
        };

        let failure_policy = match lookup("MMCLIENT_FAILURE_POLICY") {
            Some(v) => v.parse()?,
            None => defaults.failure_policy,
        };

        let parallel = match lookup("MMCLIENT_PARALLEL") {
            Some(v) => v
                .trim()
                .parse()
                .map_err(|e| Error::Config(format!("Invalid MMCLIENT_PARALLEL: {e}")))?,
            None => defaults.parallel,
        };

        let timeouts = Timeouts {
            connect: seconds(&lookup, "MMCLIENT_CONNECT_TIMEOUT_SECS")?
                .unwrap_or(defaults.timeouts.connect),
            io: seconds(&lookup, "MMCLIENT_IO_TIMEOUT_SECS")?.unwrap_or(defaults.timeouts.io),
        };

        Ok(Self {
            accounts_path,
            max_fetch,
            failure_policy,
            parallel,
            timeouts,
            ca_file: lookup("MMCLIENT_CA_FILE").map(PathBuf::from),
        })
    }
}

fn seconds(lookup: impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<Duration>> {
    let Some(raw) = lookup(key) else {
        return Ok(None);
    };
    let secs: u64 = raw
        .trim()
        .parse()
        .map_err(|e| Error::Config(format!("Invalid {key}: {e}")))?;
    if secs == 0 {
        return Err(Error::Config(format!("Invalid {key}: must be positive")));
    }
    Ok(Some(Duration::from_secs(secs)))
}
