//! Chat thread management
//!
//! [`ChatThreadManager`] owns the visible conversation, the sidebar list of
//! threads and their persisted message bodies. It decides when a message
//! starts a new thread, guards against overlapping sends, consults the
//! quota before contacting the backend, and converts every backend
//! failure into a single assistant-role message.
//!
//! # Persistence layout
//!
//! - thread list: `kabaddi_chats[_<user>]`
//! - messages of a thread: `kabaddi_messages_<thread>`
//! - current thread pointer: `kabaddi_current_chat_id[_<user>]`
//! - summary counter: `kabaddi_summary_count[_<user>]`
//!
//! Loading placeholders are never written to storage.

use super::message::{
    sort_threads, ChatThread, Message, Role, GENERIC_ERROR_TEXT, QUOTA_ERROR_TEXT,
    SUMMARY_ERROR_TEXT,
};
use super::title::generate_title;
use crate::api::{ApiClient, ConversationSummary, FeedbackRequest, FeedbackType};
use crate::clock::Clock;
use crate::error;
use crate::gate::GateCoordinator;
use crate::quota::QuotaTracker;
use crate::session::SessionStore;
use crate::storage::{build_key, read_json, write_json, KeyValueStore, Namespace};
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;

/// Decide whether a message starts a new thread
///
/// A new thread starts when no thread is active and only the greeting is
/// showing, or when the active thread's last message is older than
/// `window`.
///
/// # Examples
///
/// ```
/// use chrono::{Duration, TimeZone, Utc};
/// use kabaddiguru::chat::needs_new_thread;
///
/// let t = Utc.with_ymd_and_hms(2025, 1, 1, 10, 0, 0).unwrap();
/// let window = Duration::minutes(20);
/// assert!(needs_new_thread(false, 1, Some(t), t, window));
/// assert!(!needs_new_thread(true, 3, Some(t), t + Duration::minutes(19), window));
/// assert!(needs_new_thread(true, 3, Some(t), t + Duration::minutes(21), window));
/// ```
pub fn needs_new_thread(
    has_thread: bool,
    message_count: usize,
    last_message_at: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
    window: Duration,
) -> bool {
    let first_message = !has_thread && message_count == 1;
    let inactive = has_thread
        && last_message_at
            .map(|last| now - last > window)
            .unwrap_or(false);
    first_message || inactive
}

/// Why a send failed
#[derive(Debug, Clone, PartialEq)]
pub enum SendFailure {
    /// The backend refused the chat because the free quota is used up
    QuotaExceeded,
    /// The backend could not be reached
    Network(String),
    /// Any other failure, with a human-readable description
    Other(String),
}

/// Result of [`ChatThreadManager::send_user_message`]
#[derive(Debug, Clone, PartialEq)]
pub enum SendOutcome {
    /// Empty input; nothing happened
    Ignored,
    /// Another send is in flight; nothing happened
    Busy,
    /// The user is out of chats; the upgrade modal was opened instead
    Gated,
    /// The backend answered
    Answered {
        thread_id: Option<String>,
        started_new_thread: bool,
        reply: Message,
    },
    /// The send failed; `reply` is the error message appended to the thread
    Failed {
        thread_id: Option<String>,
        started_new_thread: bool,
        reply: Message,
        reason: SendFailure,
    },
}

/// Result of [`ChatThreadManager::generate_summary`]
#[derive(Debug, Clone, PartialEq)]
pub enum SummaryOutcome {
    /// No thread is active
    NoThread,
    /// A summary is already being generated
    Busy,
    /// The summary allowance is used up; the upgrade modal was opened
    LimitReached,
    /// The backend produced a summary
    Generated(ConversationSummary),
    /// The request failed; an error message was appended to the thread
    Failed(String),
}

/// Result of [`ChatThreadManager::submit_feedback`]
#[derive(Debug, Clone, PartialEq)]
pub enum FeedbackOutcome {
    Submitted,
    /// Feedback for this message was already sent
    AlreadySubmitted(FeedbackType),
    /// No answer with this id is showing
    UnknownMessage,
    Failed(String),
}

#[derive(Default)]
struct ThreadState {
    threads: Vec<ChatThread>,
    current_id: Option<String>,
    messages: Vec<Message>,
    feedback: HashMap<String, FeedbackType>,
    summary: Option<ConversationSummary>,
}

/// Resets a busy flag when dropped
struct BusyGuard<'a>(&'a AtomicBool);

impl<'a> BusyGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Collaborators a [`ChatThreadManager`] works with
#[derive(Clone)]
pub struct ThreadDeps {
    pub api: ApiClient,
    pub store: Arc<dyn KeyValueStore>,
    pub session: Arc<SessionStore>,
    pub quota: Arc<QuotaTracker>,
    pub gate: Arc<GateCoordinator>,
    pub clock: Arc<dyn Clock>,
}

/// Owner of conversation threads
pub struct ChatThreadManager {
    deps: ThreadDeps,
    inactivity_window: Duration,
    max_summaries: u32,
    state: Mutex<ThreadState>,
    sending: AtomicBool,
    summarizing: AtomicBool,
}

impl ChatThreadManager {
    /// Create a manager showing only the greeting
    ///
    /// Call [`reload_for_user`](Self::reload_for_user) once the session is
    /// known to load the thread list.
    pub fn new(deps: ThreadDeps, inactivity_window: Duration, max_summaries: u32) -> Self {
        let greeting = Message::greeting(deps.clock.now());
        Self {
            deps,
            inactivity_window,
            max_summaries,
            state: Mutex::new(ThreadState {
                messages: vec![greeting],
                ..ThreadState::default()
            }),
            sending: AtomicBool::new(false),
            summarizing: AtomicBool::new(false),
        }
    }

    fn lock(&self) -> MutexGuard<'_, ThreadState> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn user_key(&self, namespace: Namespace) -> String {
        let user_id = self.deps.session.user_id();
        build_key(namespace, user_id.as_deref(), None)
    }

    fn persist_messages(&self, thread_id: &str, messages: &[Message]) {
        let durable: Vec<&Message> = messages.iter().filter(|m| !m.is_loading).collect();
        if let Err(e) = write_json(self.deps.store.as_ref(), &messages_key(thread_id), &durable)
        {
            tracing::warn!(thread = %thread_id, error = %e, "Failed to persist messages");
        }
    }

    fn persist_threads(&self, threads: &[ChatThread]) {
        if let Err(e) = write_json(self.deps.store.as_ref(), &self.user_key(Namespace::Chats), &threads) {
            tracing::warn!(error = %e, "Failed to persist thread list");
        }
    }

    fn persist_current(&self, thread_id: Option<&str>) {
        let key = self.user_key(Namespace::CurrentChat);
        let result = match thread_id {
            Some(id) => self.deps.store.set(&key, id),
            None => self.deps.store.remove(&key),
        };
        if let Err(e) = result {
            tracing::warn!(error = %e, "Failed to persist current thread pointer");
        }
    }

    fn load_messages(&self, thread_id: &str) -> Option<Vec<Message>> {
        read_json::<Vec<Message>>(self.deps.store.as_ref(), &messages_key(thread_id))
            .map(|messages| messages.into_iter().filter(|m| !m.is_loading).collect())
    }

    /// Messages currently showing
    pub fn messages(&self) -> Vec<Message> {
        self.lock().messages.clone()
    }

    /// Thread list, most recently active first
    pub fn threads(&self) -> Vec<ChatThread> {
        self.lock().threads.clone()
    }

    /// Id of the active thread
    pub fn current_thread_id(&self) -> Option<String> {
        self.lock().current_id.clone()
    }

    /// Whether a send is in flight
    pub fn is_sending(&self) -> bool {
        self.sending.load(Ordering::SeqCst)
    }

    /// Last summary generated for the active thread
    pub fn last_summary(&self) -> Option<ConversationSummary> {
        self.lock().summary.clone()
    }

    /// Feedback already sent for a message
    pub fn feedback_for(&self, message_id: &str) -> Option<FeedbackType> {
        self.lock().feedback.get(message_id).copied()
    }

    /// Messages persisted for any thread, without switching to it
    pub fn stored_messages(&self, thread_id: &str) -> Option<Vec<Message>> {
        self.load_messages(thread_id)
    }

    /// Send a user message
    ///
    /// Never returns an error: every failure becomes an assistant-role
    /// message and a [`SendOutcome::Failed`].
    pub async fn send_user_message(&self, text: &str) -> SendOutcome {
        let text = text.trim();
        if text.is_empty() {
            return SendOutcome::Ignored;
        }

        let Some(_busy) = BusyGuard::acquire(&self.sending) else {
            tracing::debug!("Send rejected, another message is in flight");
            return SendOutcome::Busy;
        };

        if self.deps.quota.is_limit_reached() {
            tracing::info!("Chat limit reached, send blocked");
            self.deps.gate.open_upgrade_modal();
            return SendOutcome::Gated;
        }

        let now = self.deps.clock.now();
        let (thread_id, started_new_thread) = self.begin_send(text, now);

        let token = self.deps.session.token();
        let started = Instant::now();
        let result = self
            .deps
            .api
            .chat(text, thread_id.as_deref(), token.as_deref())
            .await;
        let replied_at = self.deps.clock.now();

        match result {
            Ok(response) => {
                let response_time = response
                    .response_time
                    .or_else(|| Some(started.elapsed().as_secs_f64()));
                let reply = Message::assistant(
                    response.response,
                    replied_at,
                    response.sql_query,
                    response_time,
                    text,
                );
                self.finish_send(thread_id.as_deref(), reply.clone(), Some(now));
                tracing::info!(thread = ?thread_id, "Chat answered");

                self.deps.quota.refresh_chat_limit(token.as_deref()).await;

                SendOutcome::Answered {
                    thread_id,
                    started_new_thread,
                    reply,
                }
            }
            Err(e) => {
                let reason = if error::is_quota_exceeded(&e) {
                    SendFailure::QuotaExceeded
                } else if error::is_network(&e) {
                    SendFailure::Network(error::user_message(&e))
                } else {
                    SendFailure::Other(error::user_message(&e))
                };
                tracing::warn!(thread = ?thread_id, error = %e, "Chat failed");

                let text = match reason {
                    SendFailure::QuotaExceeded => QUOTA_ERROR_TEXT,
                    _ => GENERIC_ERROR_TEXT,
                };
                let reply = Message::error(text, replied_at);
                self.finish_send(thread_id.as_deref(), reply.clone(), None);

                if reason == SendFailure::QuotaExceeded {
                    self.deps.gate.open_upgrade_modal();
                    self.deps.quota.refresh_chat_limit(token.as_deref()).await;
                }

                SendOutcome::Failed {
                    thread_id,
                    started_new_thread,
                    reply,
                    reason,
                }
            }
        }
    }

    /// Append the user message (starting a thread if needed) and the
    /// loading placeholder. Returns the thread the send belongs to.
    fn begin_send(&self, text: &str, now: DateTime<Utc>) -> (Option<String>, bool) {
        let mut state = self.lock();
        let user_message = Message::user(text, now);

        let start_new = needs_new_thread(
            state.current_id.is_some(),
            state.messages.len(),
            state.messages.last().map(|m| m.timestamp),
            now,
            self.inactivity_window,
        );

        if start_new {
            let id = ulid::Ulid::new().to_string();
            let title = generate_title(text);
            tracing::info!(thread = %id, title = %title, "Starting new thread");

            state.threads.insert(
                0,
                ChatThread {
                    id: id.clone(),
                    title,
                    last_message_at: now,
                },
            );
            sort_threads(&mut state.threads);
            state.current_id = Some(id.clone());
            state.messages = vec![Message::greeting(now), user_message];
            state.feedback.clear();
            state.summary = None;

            self.persist_messages(&id, &state.messages);
            self.persist_threads(&state.threads);
            self.persist_current(Some(&id));
        } else {
            state.messages.push(user_message);
            if let Some(id) = state.current_id.clone() {
                self.persist_messages(&id, &state.messages);
            }
        }

        state.messages.push(Message::loading(now));
        (state.current_id.clone(), start_new)
    }

    /// Replace the loading placeholder with `reply`
    ///
    /// When the user has moved to another thread in the meantime the reply
    /// is written to the originating thread's stored messages instead.
    fn finish_send(&self, thread_id: Option<&str>, reply: Message, touched_at: Option<DateTime<Utc>>) {
        let mut state = self.lock();

        if state.current_id.as_deref() == thread_id {
            state.messages.retain(|m| !m.is_loading);
            state.messages.push(reply);
            if let Some(id) = thread_id {
                self.persist_messages(id, &state.messages);
            }
        } else if let Some(id) = thread_id {
            tracing::debug!(thread = %id, "Reply arrived for a background thread");
            let mut stored = self.load_messages(id).unwrap_or_default();
            stored.push(reply);
            self.persist_messages(id, &stored);
        }

        if let (Some(id), Some(at)) = (thread_id, touched_at) {
            if let Some(thread) = state.threads.iter_mut().find(|t| t.id == id) {
                thread.last_message_at = at;
            }
            sort_threads(&mut state.threads);
            self.persist_threads(&state.threads);
        }
    }

    /// Switch to a stored thread
    ///
    /// Returns `None` and leaves the view untouched when the id is not in
    /// the thread list. Unreadable or missing messages fall back to the
    /// greeting alone.
    pub fn load_thread(&self, thread_id: &str) -> Option<Vec<Message>> {
        if !self.lock().threads.iter().any(|t| t.id == thread_id) {
            tracing::warn!(thread = %thread_id, "Unknown thread id");
            return None;
        }

        let messages = self
            .load_messages(thread_id)
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| vec![Message::greeting(self.deps.clock.now())]);

        let mut state = self.lock();
        state.current_id = Some(thread_id.to_string());
        state.messages = messages.clone();
        state.feedback.clear();
        state.summary = None;
        self.persist_current(Some(thread_id));
        tracing::debug!(thread = %thread_id, count = messages.len(), "Loaded thread");
        Some(messages)
    }

    /// Show a fresh greeting without an active thread
    ///
    /// Stored threads are kept.
    pub fn start_new_chat(&self) {
        let mut state = self.lock();
        state.messages = vec![Message::greeting(self.deps.clock.now())];
        state.current_id = None;
        state.feedback.clear();
        state.summary = None;
        self.persist_current(None);
    }

    /// Reload the thread list for the signed-in user (or guest)
    ///
    /// The user-scoped list is preferred; otherwise the shared list is used
    /// and copied to the user's key. The view always restarts at the
    /// greeting and stored thread pointers are dropped.
    pub fn reload_for_user(&self) {
        let store = self.deps.store.as_ref();
        let user_id = self.deps.session.user_id();
        let user_key = build_key(Namespace::Chats, user_id.as_deref(), None);
        let base_key = build_key(Namespace::Chats, None, None);

        let mut threads = match read_json::<Vec<ChatThread>>(store, &user_key) {
            Some(threads) => threads,
            None if user_key != base_key => match read_json::<Vec<ChatThread>>(store, &base_key) {
                Some(threads) => {
                    tracing::info!(user = ?user_id, "Migrating shared thread list to user scope");
                    if let Err(e) = write_json(store, &user_key, &threads) {
                        tracing::warn!(error = %e, "Failed to migrate thread list");
                    }
                    threads
                }
                None => Vec::new(),
            },
            None => Vec::new(),
        };
        sort_threads(&mut threads);

        for key in [
            build_key(Namespace::CurrentChat, user_id.as_deref(), None),
            build_key(Namespace::CurrentChat, None, None),
        ] {
            if let Err(e) = store.remove(&key) {
                tracing::warn!(error = %e, "Failed to clear current thread pointer");
            }
        }

        let mut state = self.lock();
        state.threads = threads;
        state.current_id = None;
        state.messages = vec![Message::greeting(self.deps.clock.now())];
        state.feedback.clear();
        state.summary = None;
    }

    /// Summaries generated so far by the current user
    pub fn summary_count(&self) -> u32 {
        self.deps
            .store
            .get(&self.user_key(Namespace::SummaryCount))
            .ok()
            .flatten()
            .and_then(|raw| raw.trim().parse().ok())
            .unwrap_or(0)
    }

    /// Ask the backend to summarise the active thread
    ///
    /// Non-admin users get a limited number of summaries; past the limit
    /// the upgrade modal opens instead.
    pub async fn generate_summary(&self) -> SummaryOutcome {
        let Some(thread_id) = self.current_thread_id() else {
            return SummaryOutcome::NoThread;
        };
        let Some(_busy) = BusyGuard::acquire(&self.summarizing) else {
            return SummaryOutcome::Busy;
        };

        let is_admin = self.deps.quota.is_admin();
        let count = self.summary_count();
        if !is_admin && count >= self.max_summaries {
            tracing::info!(count, "Summary limit reached");
            self.deps.gate.open_upgrade_modal();
            return SummaryOutcome::LimitReached;
        }

        match self.deps.api.summary(&thread_id).await {
            Ok(summary) => {
                if !is_admin {
                    let key = self.user_key(Namespace::SummaryCount);
                    if let Err(e) = self.deps.store.set(&key, &(count + 1).to_string()) {
                        tracing::warn!(error = %e, "Failed to persist summary count");
                    }
                }
                let mut state = self.lock();
                if state.current_id.as_deref() == Some(thread_id.as_str()) {
                    state.summary = Some(summary.clone());
                }
                SummaryOutcome::Generated(summary)
            }
            Err(e) => {
                tracing::warn!(thread = %thread_id, error = %e, "Summary failed");
                let notice = Message::error(SUMMARY_ERROR_TEXT, self.deps.clock.now());
                let mut state = self.lock();
                if state.current_id.as_deref() == Some(thread_id.as_str()) {
                    state.messages.push(notice);
                    self.persist_messages(&thread_id, &state.messages);
                }
                SummaryOutcome::Failed(error::user_message(&e))
            }
        }
    }

    /// Send feedback on an assistant answer
    ///
    /// Each answer accepts one submission; repeats are refused locally.
    pub async fn submit_feedback(
        &self,
        message_id: &str,
        feedback_type: FeedbackType,
        text: &str,
    ) -> FeedbackOutcome {
        let request = {
            let mut state = self.lock();
            if let Some(previous) = state.feedback.get(message_id) {
                return FeedbackOutcome::AlreadySubmitted(*previous);
            }
            let Some(message) = state
                .messages
                .iter()
                .find(|m| m.id == message_id && m.accepts_feedback())
            else {
                return FeedbackOutcome::UnknownMessage;
            };

            let request = FeedbackRequest {
                user_question: message.user_question.clone().unwrap_or_default(),
                ai_response: message.content.clone(),
                sql_query: message.sql_query.clone().unwrap_or_default(),
                feedback_type,
                feedback_text: text.to_string(),
                response_time: message.response_time.unwrap_or(0.0),
                tokens_used: 0,
                chat_id: state.current_id.clone(),
            };
            // Reserve the slot so a concurrent submission is refused
            state.feedback.insert(message_id.to_string(), feedback_type);
            request
        };

        match self.deps.api.feedback(&request).await {
            Ok(()) => {
                tracing::info!(message = %message_id, kind = %feedback_type, "Feedback submitted");
                FeedbackOutcome::Submitted
            }
            Err(e) => {
                tracing::warn!(message = %message_id, error = %e, "Feedback failed");
                self.lock().feedback.remove(message_id);
                FeedbackOutcome::Failed(error::user_message(&e))
            }
        }
    }

    /// Last user question in the visible thread
    pub fn last_question(&self) -> Option<String> {
        self.lock()
            .messages
            .iter()
            .rev()
            .find(|m| m.role == Role::User)
            .map(|m| m.content.clone())
    }

    /// Most recent answer that accepts feedback
    pub fn last_answer(&self) -> Option<Message> {
        self.lock()
            .messages
            .iter()
            .rev()
            .find(|m| m.accepts_feedback())
            .cloned()
    }
}

/// Storage key of a thread's messages
pub fn messages_key(thread_id: &str) -> String {
    build_key(Namespace::Messages, None, Some(thread_id))
}
