//! Account descriptors and the ordered account registry
//!
//! The registry is read once from a JSON accounts file. A missing file
//! is first materialized with a two-entry placeholder template so the
//! user has something to edit.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;
use tracing::{debug, info};

/// Template written when the accounts file does not exist yet.
pub const ACCOUNTS_TEMPLATE: &str = r#"{
   "accounts":[
      {
         "index":1,
         "host":"foo",
         "port":993,
         "user":"foo",
         "password":"foo",
         "inboxName":"INBOX"
      },
      {
         "index":2,
         "host":"foo",
         "port":993,
         "user":"foo",
         "password":"foo",
         "inboxName":"INBOX"
      }
   ]
}
"#;

/// One configured remote mailbox.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    /// Display ordinal. Not required to be unique.
    pub index: i64,
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub inbox_name: String,
}

impl Account {
    /// Short human-readable identifier used in logs and errors.
    #[must_use]
    pub fn label(&self) -> String {
        format!("#{} {}@{}", self.index, self.user, self.host)
    }

    fn validate(&self, position: usize) -> Result<()> {
        let missing = if self.host.trim().is_empty() {
            Some("host")
        } else if self.user.is_empty() {
            Some("user")
        } else if self.inbox_name.is_empty() {
            Some("inboxName")
        } else if self.port == 0 {
            Some("port")
        } else {
            None
        };

        match missing {
            Some(field) => Err(Error::Config(format!(
                "account entry {} (index {}): invalid or empty `{field}`",
                position + 1,
                self.index
            ))),
            None => Ok(()),
        }
    }
}

// Hand-written so the password never ends up in logs.
impl fmt::Debug for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Account")
            .field("index", &self.index)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("inbox_name", &self.inbox_name)
            .finish()
    }
}

#[derive(Deserialize)]
struct AccountsFile {
    accounts: Vec<Account>,
}

/// The static, ordered list of configured accounts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccountRegistry {
    accounts: Vec<Account>,
}

impl AccountRegistry {
    /// Build a registry from already-constructed accounts, keeping
    /// their order.
    #[must_use]
    pub const fn new(accounts: Vec<Account>) -> Self {
        Self { accounts }
    }

    /// Load the registry from `path`, writing [`ACCOUNTS_TEMPLATE`]
    /// there first if the file does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the template cannot be written, the
    /// file cannot be read or parsed, or an entry is invalid.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            info!("Writing account template to {}", path.display());
            fs::write(path, ACCOUNTS_TEMPLATE).map_err(|e| {
                Error::Config(format!("Cannot create {}: {e}", path.display()))
            })?;
        }

        let text = fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Cannot read {}: {e}", path.display())))?;
        let registry = Self::parse(&text).map_err(|e| match e {
            Error::Config(msg) => Error::Config(format!("{}: {msg}", path.display())),
            other => other,
        })?;

        debug!(
            "Loaded {} account(s) from {}",
            registry.len(),
            path.display()
        );
        Ok(registry)
    }

    /// Parse and validate the JSON accounts document.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] on malformed JSON or an invalid entry.
    pub fn parse(text: &str) -> Result<Self> {
        let file: AccountsFile = serde_json::from_str(text)
            .map_err(|e| Error::Config(format!("Malformed accounts file: {e}")))?;

        for (position, account) in file.accounts.iter().enumerate() {
            account.validate(position)?;
        }

        Ok(Self::new(file.accounts))
    }

    #[must_use]
    pub fn accounts(&self) -> &[Account] {
        &self.accounts
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.accounts.len()
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    /// First account carrying the given display index.
    #[must_use]
    pub fn by_index(&self, index: i64) -> Option<&Account> {
        self.accounts.iter().find(|a| a.index == index)
    }
}

impl IntoIterator for AccountRegistry {
    type Item = Account;
    type IntoIter = std::vec::IntoIter<Account>;

    fn into_iter(self) -> Self::IntoIter {
        self.accounts.into_iter()
    }
}
