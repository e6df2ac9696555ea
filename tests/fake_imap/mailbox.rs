//! Test data model for the fake IMAP server
//!
//! ```ignore
//! let mailbox = MailboxBuilder::new()
//!     .credentials("alice", "hunter2")
//!     .folder("INBOX")
//!         .message(raw_rfc5322_bytes)
//!         .message(raw_rfc5322_bytes)
//!     .folder("Archive")
//!     .build();
//! ```
//!
//! Messages are addressed by their 1-based position in the folder,
//! which is what IMAP calls the sequence number.

pub const DEFAULT_USER: &str = "user";
pub const DEFAULT_PASSWORD: &str = "secret";

/// One account's folders plus the credentials LOGIN accepts.
#[derive(Debug, Clone)]
pub struct Mailbox {
    pub user: String,
    pub password: String,
    pub folders: Vec<Folder>,
}

impl Mailbox {
    /// Look up a folder by name (case-sensitive, matching real IMAP).
    pub fn get_folder(&self, name: &str) -> Option<&Folder> {
        self.folders.iter().find(|f| f.name == name)
    }

    pub fn get_folder_mut(&mut self, name: &str) -> Option<&mut Folder> {
        self.folders.iter_mut().find(|f| f.name == name)
    }

    pub fn accepts(&self, user: &str, password: &str) -> bool {
        self.user == user && self.password == password
    }
}

/// A single IMAP folder. `messages[0]` has sequence number 1.
#[derive(Debug, Clone)]
pub struct Folder {
    pub name: String,
    pub messages: Vec<Vec<u8>>,
}

impl Folder {
    /// The message at 1-based `seq`, if any.
    pub fn message(&self, seq: u32) -> Option<&[u8]> {
        let index = usize::try_from(seq).ok()?.checked_sub(1)?;
        self.messages.get(index).map(Vec::as_slice)
    }
}

/// Builder for constructing a `Mailbox` step by step.
pub struct MailboxBuilder {
    user: String,
    password: String,
    folders: Vec<Folder>,
}

impl MailboxBuilder {
    pub fn new() -> Self {
        Self {
            user: DEFAULT_USER.to_string(),
            password: DEFAULT_PASSWORD.to_string(),
            folders: Vec::new(),
        }
    }

    pub fn credentials(mut self, user: &str, password: &str) -> Self {
        self.user = user.to_string();
        self.password = password.to_string();
        self
    }

    /// Add a new folder. Subsequent `.message()` calls add to it.
    pub fn folder(mut self, name: &str) -> Self {
        self.folders.push(Folder {
            name: name.to_string(),
            messages: Vec::new(),
        });
        self
    }

    /// Append a message to the most recently added folder.
    ///
    /// # Panics
    ///
    /// Panics if called before any `.folder()` call.
    pub fn message(mut self, raw: &[u8]) -> Self {
        self.folders
            .last_mut()
            .expect("call .folder() before .message()")
            .messages
            .push(raw.to_vec());
        self
    }

    pub fn build(self) -> Mailbox {
        Mailbox {
            user: self.user,
            password: self.password,
            folders: self.folders,
        }
    }
}
