//! Fan-out over every configured account
//!
//! [`ConnectionManager`] owns one [`AccountConnection`] per registered
//! account, in registry order. A reload asks each of them for its
//! newest messages and aggregates the results keyed by account;
//! shutdown closes them all.

use crate::account::{Account, AccountRegistry};
use crate::account_connection::AccountConnection;
use crate::error::{Error, Result};
use crate::session::{Connector, FetchedMessage};
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{info, warn};

/// What a reload does when one account fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FailurePolicy {
    /// Abort the reload and return the first failure; nothing fetched
    /// so far is returned.
    #[default]
    FailFast,
    /// Skip failing accounts and report them next to the results.
    BestEffort,
}

impl FailurePolicy {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::FailFast => "fail-fast",
            Self::BestEffort => "best-effort",
        }
    }
}

impl fmt::Display for FailurePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FailurePolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fail-fast" => Ok(Self::FailFast),
            "best-effort" => Ok(Self::BestEffort),
            other => Err(Error::Config(format!(
                "Unknown failure policy '{other}' (expected fail-fast or best-effort)"
            ))),
        }
    }
}

/// How [`ConnectionManager::fetch_all`] schedules and aggregates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ManagerOptions {
    pub failure_policy: FailurePolicy,
    /// Fetch all accounts concurrently instead of one after another.
    pub parallel: bool,
}

/// Messages fetched from one account, newest first.
#[derive(Debug, Clone)]
pub struct AccountMessages {
    pub account: Account,
    pub messages: Vec<FetchedMessage>,
}

/// An account skipped by a best-effort reload.
#[derive(Debug)]
pub struct AccountFailure {
    pub account: Account,
    pub error: Error,
}

/// Result of one reload, in registry order.
#[derive(Debug, Default)]
pub struct FetchOutcome {
    pub inboxes: Vec<AccountMessages>,
    /// Always empty under [`FailurePolicy::FailFast`].
    pub failures: Vec<AccountFailure>,
}

impl FetchOutcome {
    /// Messages for `account`, if it was fetched successfully.
    #[must_use]
    pub fn messages_for(&self, account: &Account) -> Option<&[FetchedMessage]> {
        self.inboxes
            .iter()
            .find(|inbox| &inbox.account == account)
            .map(|inbox| inbox.messages.as_slice())
    }

    #[must_use]
    pub const fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Owns one connection per configured account.
pub struct ConnectionManager<C: Connector> {
    connections: Vec<AccountConnection<C>>,
    options: ManagerOptions,
}

impl<C: Connector> ConnectionManager<C> {
    /// Build one unconnected [`AccountConnection`] per account, keeping
    /// registry order. Performs no network I/O.
    #[must_use]
    pub fn new(connector: C, registry: AccountRegistry, options: ManagerOptions) -> Self {
        let connector = Arc::new(connector);
        let connections = registry
            .into_iter()
            .map(|account| AccountConnection::new(account, Arc::clone(&connector)))
            .collect();

        Self {
            connections,
            options,
        }
    }

    #[must_use]
    pub fn connections(&self) -> &[AccountConnection<C>] {
        &self.connections
    }

    pub fn accounts(&self) -> impl Iterator<Item = &Account> {
        self.connections.iter().map(AccountConnection::account)
    }

    #[must_use]
    pub const fn account_count(&self) -> usize {
        self.connections.len()
    }

    #[must_use]
    pub const fn options(&self) -> ManagerOptions {
        self.options
    }

    /// Fetch the newest `max_count` messages from every account.
    ///
    /// The result lists accounts in registry order whether or not the
    /// fetches ran concurrently.
    ///
    /// # Errors
    ///
    /// Under [`FailurePolicy::FailFast`], returns the first failure in
    /// registry order. Under [`FailurePolicy::BestEffort`] this never
    /// fails; failures are listed in [`FetchOutcome::failures`].
    pub async fn fetch_all(&mut self, max_count: usize) -> Result<FetchOutcome> {
        let policy = self.options.failure_policy;

        let results = if self.options.parallel {
            join_all(
                self.connections
                    .iter_mut()
                    .map(|connection| connection.fetch_latest(max_count)),
            )
            .await
        } else {
            let mut results = Vec::with_capacity(self.connections.len());
            for connection in &mut self.connections {
                let result = connection.fetch_latest(max_count).await;
                let failed = result.is_err();
                results.push(result);
                if failed && policy == FailurePolicy::FailFast {
                    break;
                }
            }
            results
        };

        let mut outcome = FetchOutcome::default();
        for (connection, result) in self.connections.iter().zip(results) {
            let account = connection.account().clone();
            match result {
                Ok(messages) => outcome.inboxes.push(AccountMessages { account, messages }),
                Err(error) => match policy {
                    FailurePolicy::FailFast => return Err(error),
                    FailurePolicy::BestEffort => {
                        warn!("Skipping {}: {}", account.label(), error);
                        outcome.failures.push(AccountFailure { account, error });
                    }
                },
            }
        }

        Ok(outcome)
    }

    /// Close every connection in registry order.
    ///
    /// Keeps going after a failure so every connection gets released.
    ///
    /// # Errors
    ///
    /// Returns the first failure encountered.
    pub async fn close_all(&mut self) -> Result<()> {
        info!("Closing {} account connection(s)", self.connections.len());

        let mut first_error = None;
        for connection in &mut self.connections {
            if let Err(e) = connection.close().await {
                warn!("{}", e);
                first_error.get_or_insert(e);
            }
        }

        first_error.map_or(Ok(()), Err)
    }
}
