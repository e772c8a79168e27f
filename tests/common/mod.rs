use kabaddiguru::clock::ManualClock;
use kabaddiguru::config::Config;
use kabaddiguru::session::User;
use kabaddiguru::state::AppState;
use kabaddiguru::storage::MemoryStore;
use serde_json::{json, Value};
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;

#[allow(dead_code)]
pub fn test_config(base_url: &str) -> Config {
    let mut config = Config::default();
    config.api.base_url = base_url.to_string();
    config.contact.url = format!("{}/api/contact", base_url);
    config
}

#[allow(dead_code)]
pub fn state_with_config(config: Config) -> (AppState, Arc<ManualClock>, Arc<MemoryStore>) {
    let clock = Arc::new(ManualClock::new(chrono::Utc::now()));
    let store = Arc::new(MemoryStore::new());
    let state =
        AppState::new(config, store.clone(), clock.clone()).expect("failed to build app state");
    (state, clock, store)
}

#[allow(dead_code)]
pub fn test_state(base_url: &str) -> (AppState, Arc<ManualClock>, Arc<MemoryStore>) {
    state_with_config(test_config(base_url))
}

#[allow(dead_code)]
pub fn test_user() -> User {
    User {
        user_id: Some("42".to_string()),
        email: "raider@kabaddi.test".to_string(),
        full_name: Some("Pardeep Narwal".to_string()),
        subscription_type: Some("free".to_string()),
        ..User::default()
    }
}

#[allow(dead_code)]
pub fn chat_limit_body(remaining: i64, max: i64) -> Value {
    json!({
        "can_chat": remaining > 0,
        "remaining_chats": remaining,
        "max_chats": max,
        "subscription_type": "free",
        "is_admin": false
    })
}

#[allow(dead_code)]
pub fn chat_reply(text: &str) -> Value {
    json!({
        "response": text,
        "sql_query": "SELECT 1",
        "response_time": 0.42
    })
}

#[allow(dead_code)]
pub fn temp_config_file(contents: &str) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().expect("failed to create tempdir");
    let config_path = temp_dir.path().join("config.yaml");
    fs::write(&config_path, contents).expect("failed to write config file");
    (temp_dir, config_path)
}
