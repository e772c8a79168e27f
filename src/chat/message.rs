//! Chat messages and thread records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opening assistant message of every thread
pub const GREETING: &str = "Hello! I'm your KabaddiGuru assistant. I can help you analyze player performance, match statistics, team strategies, and much more. What would you like to know about your Kabaddi data?";

/// Text of the transient placeholder shown while the backend works
pub const LOADING_TEXT: &str =
    "Processing your request... This may take a few moments for complex queries.";

/// Assistant reply when the backend refuses a chat for quota reasons
pub const QUOTA_ERROR_TEXT: &str =
    "You've reached your free trial limit. Please upgrade to premium to continue chatting.";

/// Assistant reply for any other failed chat
pub const GENERIC_ERROR_TEXT: &str =
    "Sorry, I encountered an error processing your request. Please try again.";

/// Assistant reply when a conversation summary fails
pub const SUMMARY_ERROR_TEXT: &str = "Failed to generate conversation summary. Please try again.";

/// Id of the greeting message
const GREETING_ID: &str = "1";

/// Author of a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
        }
    }
}

/// One entry of a conversation
///
/// Messages are immutable once created. The only structural change a
/// thread sees is removal of the loading placeholder.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Message {
    pub id: String,
    pub content: String,
    pub role: Role,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sql_query: Option<String>,
    /// Seconds the backend spent answering
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_time: Option<f64>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_loading: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_error: bool,
    /// Question an assistant answer responds to, kept for feedback
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_question: Option<String>,
}

impl Message {
    fn new(role: Role, content: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            content: content.into(),
            role,
            timestamp,
            sql_query: None,
            response_time: None,
            is_loading: false,
            is_error: false,
            user_question: None,
        }
    }

    /// The standard opening message
    pub fn greeting(timestamp: DateTime<Utc>) -> Self {
        Self {
            id: GREETING_ID.to_string(),
            ..Self::new(Role::Assistant, GREETING, timestamp)
        }
    }

    /// A message typed by the user
    pub fn user(content: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self::new(Role::User, content, timestamp)
    }

    /// A successful assistant answer
    pub fn assistant(
        content: impl Into<String>,
        timestamp: DateTime<Utc>,
        sql_query: Option<String>,
        response_time: Option<f64>,
        user_question: impl Into<String>,
    ) -> Self {
        Self {
            sql_query,
            response_time,
            user_question: Some(user_question.into()),
            ..Self::new(Role::Assistant, content, timestamp)
        }
    }

    /// The transient "working on it" placeholder
    pub fn loading(timestamp: DateTime<Utc>) -> Self {
        Self {
            is_loading: true,
            ..Self::new(Role::Assistant, LOADING_TEXT, timestamp)
        }
    }

    /// An assistant-role error notice
    pub fn error(content: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            is_error: true,
            ..Self::new(Role::Assistant, content, timestamp)
        }
    }

    /// Whether feedback may be left on this message
    pub fn accepts_feedback(&self) -> bool {
        self.role == Role::Assistant && !self.is_loading && !self.is_error && self.id != GREETING_ID
    }
}

/// Sidebar entry for a conversation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatThread {
    pub id: String,
    pub title: String,
    #[serde(alias = "lastMessage")]
    pub last_message_at: DateTime<Utc>,
}

/// Sort threads most recently active first
pub fn sort_threads(threads: &mut [ChatThread]) {
    threads.sort_by(|a, b| b.last_message_at.cmp(&a.last_message_at));
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_greeting_has_fixed_id() {
        let g = Message::greeting(t0());
        assert_eq!(g.id, "1");
        assert_eq!(g.role, Role::Assistant);
        assert_eq!(g.content, GREETING);
        assert!(!g.accepts_feedback());
    }

    #[test]
    fn test_message_ids_are_unique() {
        let a = Message::user("a", t0());
        let b = Message::user("a", t0());
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_flags_skipped_when_false() {
        let json = serde_json::to_value(Message::user("hi", t0())).unwrap();
        assert!(json.get("is_loading").is_none());
        assert!(json.get("sql_query").is_none());
        assert_eq!(json["role"], "user");

        let json = serde_json::to_value(Message::loading(t0())).unwrap();
        assert_eq!(json["is_loading"], true);
    }

    #[test]
    fn test_feedback_only_on_answers() {
        let answer = Message::assistant("42", t0(), None, Some(1.5), "how many?");
        assert!(answer.accepts_feedback());
        assert!(!Message::loading(t0()).accepts_feedback());
        assert!(!Message::error("boom", t0()).accepts_feedback());
        assert!(!Message::user("q", t0()).accepts_feedback());
    }

    #[test]
    fn test_thread_accepts_legacy_field_name() {
        let thread: ChatThread = serde_json::from_str(
            r#"{"id":"1","title":"Top raiders","lastMessage":"2025-03-01T12:00:00Z"}"#,
        )
        .unwrap();
        assert_eq!(thread.last_message_at, t0());
    }

    #[test]
    fn test_sort_threads_most_recent_first() {
        let mut threads = vec![
            ChatThread {
                id: "old".into(),
                title: "a".into(),
                last_message_at: t0(),
            },
            ChatThread {
                id: "new".into(),
                title: "b".into(),
                last_message_at: t0() + Duration::minutes(5),
            },
        ];
        sort_threads(&mut threads);
        assert_eq!(threads[0].id, "new");
    }
}
