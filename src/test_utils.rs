//! Test utilities for KabaddiGuru
//!
//! This module provides common test utilities: temporary directories,
//! error assertions and an [`AppState`] wired to in-memory storage and a
//! manual clock.

use crate::clock::ManualClock;
use crate::config::Config;
use crate::error::Result;
use crate::state::AppState;
use crate::storage::MemoryStore;
use std::sync::Arc;
use tempfile::TempDir;

/// Create a temporary directory for testing
///
/// # Returns
///
/// Returns a TempDir that will be cleaned up when dropped
pub fn temp_dir() -> TempDir {
    TempDir::new().expect("Failed to create temporary directory")
}

/// Assert that an error contains the expected message
///
/// # Panics
///
/// Panics if the result is Ok or if the error doesn't contain the expected message
pub fn assert_error_contains<T>(result: Result<T>, expected: &str) {
    match result {
        Ok(_) => panic!("Expected error containing '{}' but got Ok", expected),
        Err(e) => {
            let error_msg = e.to_string();
            assert!(
                error_msg.contains(expected),
                "Error message '{}' does not contain '{}'",
                error_msg,
                expected
            );
        }
    }
}

/// Create a test configuration pointing at `base_url`
pub fn test_config(base_url: &str) -> Config {
    let mut config = Config::default();
    config.api.base_url = base_url.to_string();
    config.contact.url = format!("{}/api/contact", base_url);
    config
}

/// Build application state over in-memory storage and a manual clock
///
/// Returns the state together with the clock and store so tests can move
/// time forward and inspect persisted keys.
pub fn test_state(base_url: &str) -> (AppState, Arc<ManualClock>, Arc<MemoryStore>) {
    let clock = Arc::new(ManualClock::new(chrono::Utc::now()));
    let store = Arc::new(MemoryStore::new());
    let state = AppState::new(test_config(base_url), store.clone(), clock.clone())
        .expect("Failed to build test state");
    (state, clock, store)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GuruError;

    #[test]
    fn test_temp_dir_creation() {
        let dir = temp_dir();
        assert!(dir.path().exists());
    }

    #[test]
    fn test_assert_error_contains_success() {
        let result: Result<()> = Err(GuruError::Config("test error message".to_string()).into());
        assert_error_contains(result, "test error");
    }

    #[test]
    #[should_panic(expected = "Expected error containing")]
    fn test_assert_error_contains_ok() {
        let result: Result<()> = Ok(());
        assert_error_contains(result, "error");
    }

    #[test]
    #[should_panic(expected = "does not contain")]
    fn test_assert_error_contains_wrong_message() {
        let result: Result<()> = Err(GuruError::Config("different error".to_string()).into());
        assert_error_contains(result, "not present");
    }

    #[test]
    fn test_test_config_is_valid() {
        let config = test_config("http://127.0.0.1:9");
        assert_eq!(config.api.base_url, "http://127.0.0.1:9");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_test_state_starts_signed_out() {
        let (state, _clock, store) = test_state("http://127.0.0.1:9");
        assert!(!state.session.is_authenticated());
        assert!(store.is_empty());
    }
}
