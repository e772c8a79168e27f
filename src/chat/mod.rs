//! Conversations with the KabaddiGuru assistant

pub mod message;
pub mod thread;
pub mod title;

pub use message::{ChatThread, Message, Role, GREETING};
pub use thread::{
    messages_key, needs_new_thread, ChatThreadManager, FeedbackOutcome, SendFailure, SendOutcome,
    SummaryOutcome, ThreadDeps,
};
pub use title::generate_title;
