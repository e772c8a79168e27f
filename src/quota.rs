//! Chat quota tracking
//!
//! The backend owns each user's free-tier chat allowance. [`QuotaTracker`]
//! mirrors it locally, refreshing from `GET /auth/chat-limit` after login
//! and after every successful chat, and derives the "limit reached"
//! signal on read. Every mutation is published to subscribers and to the
//! [`GateCoordinator`].
//!
//! A failed quota check fails open: the user keeps chatting on a
//! permissive default rather than being locked out by a backend hiccup.

use crate::api::ApiClient;
use crate::gate::GateCoordinator;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::watch;

/// Quota state as reported by the backend
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QuotaInfo {
    /// Whether the backend will accept another chat
    #[serde(default = "default_can_chat")]
    pub can_chat: bool,

    /// Chats left; `None` when the backend reports no finite number
    #[serde(default, deserialize_with = "finite_count")]
    pub remaining_chats: Option<i64>,

    /// Plan maximum; `None` when unlimited or unknown
    #[serde(default, deserialize_with = "finite_count")]
    pub max_chats: Option<i64>,

    /// Plan name (`guest`, `free`, `premium`, ...)
    #[serde(default)]
    pub subscription_type: String,

    /// Admins bypass every limit
    #[serde(default)]
    pub is_admin: bool,
}

fn default_can_chat() -> bool {
    true
}

fn finite_count<'de, D>(deserializer: D) -> std::result::Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| match v {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f as i64)),
        _ => None,
    }))
}

impl QuotaInfo {
    /// Placeholder reported when no one is signed in
    pub fn guest() -> Self {
        Self {
            can_chat: false,
            remaining_chats: Some(0),
            max_chats: Some(0),
            subscription_type: "guest".to_string(),
            is_admin: false,
        }
    }

    /// Permissive default used when the quota check fails
    pub fn fail_open() -> Self {
        Self {
            can_chat: true,
            remaining_chats: Some(10),
            max_chats: Some(10),
            subscription_type: "free".to_string(),
            is_admin: false,
        }
    }
}

/// Whether the user has run out of chats
///
/// `(!can_chat || remaining <= 0) && !is_admin`. Missing information is
/// never treated as reached.
pub fn is_limit_reached(info: Option<&QuotaInfo>) -> bool {
    match info {
        Some(info) => {
            let exhausted = info.remaining_chats.map(|r| r <= 0).unwrap_or(false);
            (!info.can_chat || exhausted) && !info.is_admin
        }
        None => false,
    }
}

/// Result of a quota check
#[derive(Debug, Clone, PartialEq)]
pub enum QuotaCheck {
    /// No token: a guest placeholder that was not stored
    Guest(QuotaInfo),
    /// The backend answered; the value was stored verbatim
    Fetched(QuotaInfo),
    /// The check failed; the permissive default was stored
    Fallback(QuotaInfo),
}

impl QuotaCheck {
    /// The quota values carried by this outcome
    pub fn info(&self) -> &QuotaInfo {
        match self {
            QuotaCheck::Guest(info) | QuotaCheck::Fetched(info) | QuotaCheck::Fallback(info) => {
                info
            }
        }
    }

    /// Whether this is the unsaved guest placeholder
    pub fn is_guest(&self) -> bool {
        matches!(self, QuotaCheck::Guest(_))
    }
}

/// Local mirror of the backend quota
pub struct QuotaTracker {
    api: ApiClient,
    gate: Arc<GateCoordinator>,
    info: watch::Sender<Option<QuotaInfo>>,
}

impl QuotaTracker {
    /// Create a tracker with no quota information
    pub fn new(api: ApiClient, gate: Arc<GateCoordinator>) -> Self {
        let (info, _) = watch::channel(None);
        Self { api, gate, info }
    }

    /// Subscribe to quota changes
    pub fn subscribe(&self) -> watch::Receiver<Option<QuotaInfo>> {
        self.info.subscribe()
    }

    /// Current quota information
    pub fn info(&self) -> Option<QuotaInfo> {
        self.info.borrow().clone()
    }

    /// Replace the quota information and notify observers
    pub fn set_info(&self, info: Option<QuotaInfo>) {
        self.gate.on_quota_changed(info.as_ref());
        self.info.send_replace(info);
    }

    /// Forget quota information (used on logout)
    pub fn clear(&self) {
        self.set_info(None);
    }

    /// Derived limit flag, computed from the current information
    pub fn is_limit_reached(&self) -> bool {
        is_limit_reached(self.info.borrow().as_ref())
    }

    /// Whether the backend flagged the user as an admin
    pub fn is_admin(&self) -> bool {
        self.info.borrow().as_ref().map(|i| i.is_admin).unwrap_or(false)
    }

    /// `can_chat` as last reported; `true` while unknown
    pub fn can_chat(&self) -> bool {
        self.info.borrow().as_ref().map(|i| i.can_chat).unwrap_or(true)
    }

    /// Fetch the quota for `token`
    ///
    /// Without a token the stored information is cleared and a guest
    /// placeholder returned. A failed request stores and returns
    /// [`QuotaInfo::fail_open`].
    pub async fn check_chat_limit(&self, token: Option<&str>) -> QuotaCheck {
        let Some(token) = token else {
            self.set_info(None);
            return QuotaCheck::Guest(QuotaInfo::guest());
        };

        match self.api.chat_limit(token).await {
            Ok(info) => {
                tracing::debug!(
                    remaining = ?info.remaining_chats,
                    max = ?info.max_chats,
                    is_admin = info.is_admin,
                    "Chat limit refreshed"
                );
                self.set_info(Some(info.clone()));
                QuotaCheck::Fetched(info)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Error checking chat limit, allowing chat");
                let fallback = QuotaInfo::fail_open();
                self.set_info(Some(fallback.clone()));
                QuotaCheck::Fallback(fallback)
            }
        }
    }

    /// Re-run [`check_chat_limit`](Self::check_chat_limit)
    pub async fn refresh_chat_limit(&self, token: Option<&str>) -> QuotaCheck {
        self.check_chat_limit(token).await
    }
}
