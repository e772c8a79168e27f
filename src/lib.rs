//! KabaddiGuru - Kabaddi analytics assistant client library
//!
//! This library provides the client side of the KabaddiGuru assistant:
//! session handling, chat threads with inactivity rollover, the free-tier
//! chat quota and upgrade gate, and a deduplicating, caching API client.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//!
//! - `api`: HTTP client for the KabaddiGuru backend (GET dedup and caching)
//! - `session`: Signed-in user and token, persisted across restarts
//! - `quota`: Chat allowance tracking (fails open)
//! - `gate`: Upgrade modal and limit banner
//! - `chat`: Threads, messages and titles
//! - `contact`: Contact form validation, email delivery and local relay
//! - `storage`: Key-value persistence (sled on disk, in-memory for tests)
//! - `state`: Wiring of the above for one client process
//! - `config`: Configuration management and validation
//! - `error`: Error types and result aliases
//! - `cli`: Command-line interface definition
//!
//! # Example
//!
//! ```no_run
//! use kabaddiguru::{AppState, Config};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("config.yaml", &Default::default())?;
//!     config.validate()?;
//!
//!     let state = AppState::open(config)?;
//!     state.start().await;
//!     let outcome = state.threads.send_user_message("Top raiders of season 7").await;
//!     println!("{:?}", outcome);
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod chat;
pub mod cli;
pub mod clock;
pub mod commands;
pub mod config;
pub mod contact;
pub mod error;
pub mod gate;
pub mod quota;
pub mod session;
pub mod state;
pub mod storage;

// Re-export commonly used types
pub use api::ApiClient;
pub use chat::{ChatThreadManager, Message, SendOutcome};
pub use config::Config;
pub use error::{GuruError, Result};
pub use gate::GateCoordinator;
pub use quota::{QuotaInfo, QuotaTracker};
pub use session::{SessionStore, User};
pub use state::AppState;

#[cfg(test)]
pub mod test_utils;
