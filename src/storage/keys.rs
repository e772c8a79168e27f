//! Storage key construction
//!
//! Every persisted entry is addressed by a string key of the form
//! `<prefix>[_<user_id>][_<entity_id>]`.

use std::fmt;

/// Kinds of persisted entries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Namespace {
    /// Thread list (most recently active first)
    Chats,
    /// Message list of a single thread
    Messages,
    /// Pointer to the currently open thread
    CurrentChat,
    /// Number of summaries generated so far
    SummaryCount,
    /// Bearer token of the signed-in user
    Token,
    /// Cached user object of the signed-in user
    User,
}

impl Namespace {
    /// Key prefix for this namespace
    pub fn prefix(self) -> &'static str {
        match self {
            Namespace::Chats => "kabaddi_chats",
            Namespace::Messages => "kabaddi_messages",
            Namespace::CurrentChat => "kabaddi_current_chat_id",
            Namespace::SummaryCount => "kabaddi_summary_count",
            Namespace::Token => "token",
            Namespace::User => "user",
        }
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.prefix())
    }
}

/// Build a storage key
///
/// Empty ids are treated like missing ones so a blank user id never
/// produces a dangling `_` suffix.
///
/// # Examples
///
/// ```
/// use kabaddiguru::storage::{build_key, Namespace};
///
/// assert_eq!(build_key(Namespace::Chats, None, None), "kabaddi_chats");
/// assert_eq!(build_key(Namespace::Chats, Some("42"), None), "kabaddi_chats_42");
/// assert_eq!(
///     build_key(Namespace::Messages, None, Some("1700000000000")),
///     "kabaddi_messages_1700000000000"
/// );
/// ```
pub fn build_key(namespace: Namespace, user_id: Option<&str>, entity_id: Option<&str>) -> String {
    let mut key = namespace.prefix().to_string();
    for part in [user_id, entity_id].into_iter().flatten() {
        if !part.is_empty() {
            key.push('_');
            key.push_str(part);
        }
    }
    key
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shared_keys() {
        assert_eq!(build_key(Namespace::Chats, None, None), "kabaddi_chats");
        assert_eq!(
            build_key(Namespace::CurrentChat, None, None),
            "kabaddi_current_chat_id"
        );
        assert_eq!(build_key(Namespace::Token, None, None), "token");
        assert_eq!(build_key(Namespace::User, None, None), "user");
    }

    #[test]
    fn test_user_scoped_keys() {
        assert_eq!(
            build_key(Namespace::Chats, Some("u1"), None),
            "kabaddi_chats_u1"
        );
        assert_eq!(
            build_key(Namespace::SummaryCount, Some("u1"), None),
            "kabaddi_summary_count_u1"
        );
    }

    #[test]
    fn test_entity_and_user_scoped_key() {
        assert_eq!(
            build_key(Namespace::Messages, Some("u1"), Some("c9")),
            "kabaddi_messages_u1_c9"
        );
    }

    #[test]
    fn test_empty_ids_are_ignored() {
        assert_eq!(build_key(Namespace::Chats, Some(""), None), "kabaddi_chats");
        assert_eq!(
            build_key(Namespace::Messages, Some(""), Some("c9")),
            "kabaddi_messages_c9"
        );
    }

    #[test]
    fn test_namespace_display() {
        assert_eq!(Namespace::Messages.to_string(), "kabaddi_messages");
    }
}
