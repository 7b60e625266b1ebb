//! Ordered message log.
//!
//! The log only changes in two ways: [`MessageLog::hydrate`] replaces it
//! wholesale with a history snapshot, and [`MessageLog::append`] adds one live
//! message at the end. Entries are never reordered, edited, deduplicated or
//! truncated; insertion order is the only order.
//!
//! History entries are structured (`{user, message}`) while live messages
//! arrive as a single preformatted string. Both are normalized to [`Message`]
//! here; live messages keep an empty sender because the wire does not carry
//! one.

use std::borrow::Cow;

use parley_proto::HistoryEntry;

use crate::Identity;

/// Prefix for the local user's own messages in history.
const OWN_PREFIX: &str = "You";

/// A display-ready chat message. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    sender: String,
    text: String,
    is_own: bool,
}

impl Message {
    /// Message from a history snapshot.
    ///
    /// `is_own` is set when the author matches the current identity.
    pub fn from_history(entry: HistoryEntry, me: Option<&Identity>) -> Self {
        let is_own = me.is_some_and(|identity| identity.is(&entry.user));
        Self { sender: entry.user, text: entry.message, is_own }
    }

    /// Live message. The text is already formatted by the server.
    pub fn live(text: impl Into<String>) -> Self {
        Self { sender: String::new(), text: text.into(), is_own: false }
    }

    /// Author's username. Empty for live messages.
    pub fn sender(&self) -> &str {
        &self.sender
    }

    /// Message body (for live messages, the full server-formatted line).
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Whether the local user wrote this message.
    pub fn is_own(&self) -> bool {
        self.is_own
    }

    /// Text shown to the user.
    ///
    /// - own history entry: `"You: {text}"`
    /// - other history entry: `"{sender}: {text}"`
    /// - live message: the text verbatim
    pub fn display_text(&self) -> Cow<'_, str> {
        if self.is_own {
            Cow::Owned(format!("{OWN_PREFIX}: {}", self.text))
        } else if self.sender.is_empty() {
            Cow::Borrowed(&self.text)
        } else {
            Cow::Owned(format!("{}: {}", self.sender, self.text))
        }
    }
}

/// Append-only message log for the current session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessageLog {
    entries: Vec<Message>,
}

impl MessageLog {
    /// Create an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole log with a history snapshot.
    pub fn hydrate(&mut self, history: Vec<HistoryEntry>, me: Option<&Identity>) {
        self.entries = history.into_iter().map(|entry| Message::from_history(entry, me)).collect();
    }

    /// Append one live message and return it.
    pub fn append(&mut self, text: impl Into<String>) -> &Message {
        self.entries.push(Message::live(text));
        // INVARIANT: just pushed, so the log is non-empty.
        &self.entries[self.entries.len() - 1]
    }

    /// Entries in arrival order.
    pub fn entries(&self) -> &[Message] {
        &self.entries
    }

    /// Display strings in arrival order.
    pub fn display_lines(&self) -> Vec<String> {
        self.entries.iter().map(|m| m.display_text().into_owned()).collect()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the log is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Empty the log. Only used when the session ends.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hydrate_marks_own_messages() {
        let me = Identity::new("alice").unwrap();
        let mut log = MessageLog::new();

        log.hydrate(
            vec![HistoryEntry::new("alice", "hi"), HistoryEntry::new("bob", "yo")],
            Some(&me),
        );

        assert_eq!(log.display_lines(), vec!["You: hi", "bob: yo"]);
        assert!(log.entries()[0].is_own());
        assert_eq!(log.entries()[1].sender(), "bob");
    }

    #[test]
    fn hydrate_replaces_previous_entries() {
        let mut log = MessageLog::new();
        log.append("carol: old");
        log.hydrate(vec![HistoryEntry::new("bob", "new")], None);

        assert_eq!(log.display_lines(), vec!["bob: new"]);
    }

    #[test]
    fn live_messages_are_verbatim_with_empty_sender() {
        let mut log = MessageLog::new();
        let message = log.append("bob: hello there");

        assert_eq!(message.sender(), "");
        assert!(!message.is_own());
        assert_eq!(message.display_text(), "bob: hello there");
    }

    #[test]
    fn clear_empties_log() {
        let mut log = MessageLog::new();
        log.append("x");
        log.clear();
        assert!(log.is_empty());
    }
}
