//! Display-name identity.

use std::fmt;

/// The name a user chats under.
///
/// # Invariants
///
/// - The username is non-empty and has no leading or trailing whitespace.
///   [`Identity::new`] is the only constructor and enforces both.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Identity {
    username: String,
}

impl Identity {
    /// Build an identity from user input. `None` if the input is blank.
    pub fn new(raw: &str) -> Option<Self> {
        normalize(raw).map(|username| Self { username })
    }

    /// Trimmed username.
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Whether `user` names this identity.
    pub fn is(&self, user: &str) -> bool {
        self.username == user
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.username)
    }
}

/// Trim user input, rejecting blank values.
///
/// Applied to usernames, room names and recipients alike.
pub fn normalize(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() { None } else { Some(trimmed.to_string()) }
}
