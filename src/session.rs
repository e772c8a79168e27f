//! Session and authentication state
//!
//! [`SessionStore`] owns the signed-in user and bearer token, mirrors them
//! into the local store, and restores them when the process starts.
//! The store is created in a *loading* state; callers must not branch on
//! authentication until [`SessionStore::restore_on_startup`] has run.

use crate::error::{GuruError, Result};
use crate::storage::{build_key, KeyValueStore, Namespace};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::sync::{Arc, RwLock};

/// A KabaddiGuru account as returned by signin/signup
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct User {
    /// Backend user id (numeric ids are normalised to strings)
    #[serde(default, deserialize_with = "optional_id")]
    pub user_id: Option<String>,

    /// Account email
    #[serde(default)]
    pub email: String,

    /// Display name
    #[serde(default)]
    pub full_name: Option<String>,

    /// Plan name (`free`, `premium`, ...)
    #[serde(default)]
    pub subscription_type: Option<String>,

    /// Any other fields the backend sends, kept verbatim
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl User {
    /// Name to greet the user with
    pub fn display_name(&self) -> &str {
        self.full_name
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or(&self.email)
    }
}

fn optional_id<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s),
        Some(other) => Some(other.to_string()),
    })
}

/// Snapshot of the authentication state
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Session {
    /// Signed-in user
    pub user: Option<User>,
    /// Bearer token
    pub token: Option<String>,
}

impl Session {
    /// Authenticated iff both a user and a token are present
    pub fn is_authenticated(&self) -> bool {
        self.user.is_some() && self.token.is_some()
    }

    /// Id of the signed-in user, if the backend supplied one
    pub fn user_id(&self) -> Option<&str> {
        self.user.as_ref().and_then(|u| u.user_id.as_deref())
    }
}

struct SessionState {
    session: Session,
    loading: bool,
}

/// Owner of the session lifecycle
pub struct SessionStore {
    store: Arc<dyn KeyValueStore>,
    state: RwLock<SessionState>,
}

impl SessionStore {
    /// Create a store in the loading state
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            state: RwLock::new(SessionState {
                session: Session::default(),
                loading: true,
            }),
        }
    }

    fn token_key() -> String {
        build_key(Namespace::Token, None, None)
    }

    fn user_key() -> String {
        build_key(Namespace::User, None, None)
    }

    fn write_state(&self) -> Result<std::sync::RwLockWriteGuard<'_, SessionState>> {
        self.state
            .write()
            .map_err(|_| GuruError::Storage("Session state lock poisoned".into()).into())
    }

    fn clear_persisted(&self) {
        for key in [Self::token_key(), Self::user_key()] {
            if let Err(e) = self.store.remove(&key) {
                tracing::warn!(key = %key, error = %e, "Failed to clear persisted session entry");
            }
        }
    }

    /// Restore a persisted session
    ///
    /// When the token or user is missing, or the stored user no longer
    /// parses, the session stays unauthenticated and leftover entries are
    /// removed. Always ends the loading state.
    pub fn restore_on_startup(&self) -> Session {
        let token = self.store.get(&Self::token_key()).ok().flatten();
        let raw_user = self.store.get(&Self::user_key()).ok().flatten();

        let restored = match (token, raw_user) {
            (Some(token), Some(raw_user)) if !token.is_empty() => {
                match serde_json::from_str::<User>(&raw_user) {
                    Ok(user) => Some(Session {
                        user: Some(user),
                        token: Some(token),
                    }),
                    Err(e) => {
                        tracing::warn!(error = %e, "Error parsing stored user data");
                        self.clear_persisted();
                        None
                    }
                }
            }
            (None, None) => None,
            _ => {
                tracing::debug!("Incomplete stored session, clearing");
                self.clear_persisted();
                None
            }
        };

        let mut state = match self.state.write() {
            Ok(state) => state,
            Err(poisoned) => poisoned.into_inner(),
        };
        state.session = restored.unwrap_or_default();
        state.loading = false;

        if state.session.is_authenticated() {
            tracing::info!(user = ?state.session.user_id(), "Restored session");
        }
        state.session.clone()
    }

    /// Whether startup restoration is still pending
    pub fn is_loading(&self) -> bool {
        self.state.read().map(|s| s.loading).unwrap_or(false)
    }

    /// Install a freshly authenticated session and persist it
    pub fn login(&self, user: User, token: String) -> Result<()> {
        let user_json = serde_json::to_string(&user).map_err(GuruError::from)?;
        self.store.set(&Self::token_key(), &token)?;
        self.store.set(&Self::user_key(), &user_json)?;

        let mut state = self.write_state()?;
        tracing::info!(user = ?user.user_id, "Signed in");
        state.session = Session {
            user: Some(user),
            token: Some(token),
        };
        state.loading = false;
        Ok(())
    }

    /// Clear the session and its persisted entries
    pub fn logout(&self) -> Result<()> {
        self.clear_persisted();
        let mut state = self.write_state()?;
        state.session = Session::default();
        tracing::info!("Signed out");
        Ok(())
    }

    /// Replace the cached user object (token unchanged)
    pub fn update_user(&self, user: User) -> Result<()> {
        let user_json = serde_json::to_string(&user).map_err(GuruError::from)?;
        self.store.set(&Self::user_key(), &user_json)?;
        let mut state = self.write_state()?;
        state.session.user = Some(user);
        Ok(())
    }

    /// Current session snapshot
    pub fn snapshot(&self) -> Session {
        self.state
            .read()
            .map(|s| s.session.clone())
            .unwrap_or_default()
    }

    /// Current bearer token
    pub fn token(&self) -> Option<String> {
        self.snapshot().token
    }

    /// Current user id
    pub fn user_id(&self) -> Option<String> {
        self.snapshot().user_id().map(str::to_string)
    }

    /// Whether a user and token are both present
    pub fn is_authenticated(&self) -> bool {
        self.snapshot().is_authenticated()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use serde_json::json;

    fn sample_user(id: &str) -> User {
        User {
            user_id: Some(id.to_string()),
            email: format!("{}@kabaddi.test", id),
            full_name: Some("Pawan Sehrawat".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_user_numeric_id_and_extra_fields() {
        let user: User = serde_json::from_value(json!({
            "user_id": 42,
            "email": "raider@kabaddi.test",
            "full_name": "Raider",
            "created_at": "2025-01-01"
        }))
        .unwrap();
        assert_eq!(user.user_id.as_deref(), Some("42"));
        assert_eq!(user.extra.get("created_at"), Some(&json!("2025-01-01")));
        assert_eq!(user.display_name(), "Raider");
    }

    #[test]
    fn test_new_store_is_loading_and_unauthenticated() {
        let sessions = SessionStore::new(Arc::new(MemoryStore::new()));
        assert!(sessions.is_loading());
        assert!(!sessions.is_authenticated());
        sessions.restore_on_startup();
        assert!(!sessions.is_loading());
    }

    #[test]
    fn test_login_logout_sequences_keep_invariant() {
        let store = Arc::new(MemoryStore::new());
        let sessions = SessionStore::new(store.clone());
        sessions.restore_on_startup();

        for round in 0..3 {
            sessions
                .login(sample_user(&round.to_string()), format!("tok-{}", round))
                .unwrap();
            let s = sessions.snapshot();
            assert_eq!(s.is_authenticated(), s.user.is_some() && s.token.is_some());
            assert!(s.is_authenticated());
            assert_eq!(store.get("token").unwrap(), Some(format!("tok-{}", round)));

            sessions.logout().unwrap();
            let s = sessions.snapshot();
            assert!(!s.is_authenticated());
            assert!(s.user.is_none() && s.token.is_none());
            assert_eq!(store.get("token").unwrap(), None);
            assert_eq!(store.get("user").unwrap(), None);
        }
    }

    #[test]
    fn test_restore_valid_session() {
        let store = Arc::new(MemoryStore::new());
        {
            let sessions = SessionStore::new(store.clone());
            sessions.login(sample_user("7"), "abc".to_string()).unwrap();
        }
        let sessions = SessionStore::new(store);
        let restored = sessions.restore_on_startup();
        assert!(restored.is_authenticated());
        assert_eq!(restored.user_id(), Some("7"));
        assert_eq!(sessions.token().as_deref(), Some("abc"));
    }

    #[test]
    fn test_restore_corrupted_user_clears_entries() {
        let store = Arc::new(MemoryStore::new());
        store.set("token", "abc").unwrap();
        store.set("user", "{not-json").unwrap();

        let sessions = SessionStore::new(store.clone());
        let restored = sessions.restore_on_startup();
        assert!(!restored.is_authenticated());
        assert_eq!(store.get("token").unwrap(), None);
        assert_eq!(store.get("user").unwrap(), None);
    }

    #[test]
    fn test_restore_token_without_user_is_unauthenticated() {
        let store = Arc::new(MemoryStore::new());
        store.set("token", "abc").unwrap();

        let sessions = SessionStore::new(store.clone());
        assert!(!sessions.restore_on_startup().is_authenticated());
        assert_eq!(store.get("token").unwrap(), None);
    }

    #[test]
    fn test_update_user_persists() {
        let store = Arc::new(MemoryStore::new());
        let sessions = SessionStore::new(store.clone());
        sessions.login(sample_user("1"), "t".to_string()).unwrap();

        let mut updated = sample_user("1");
        updated.subscription_type = Some("premium".to_string());
        sessions.update_user(updated).unwrap();

        let raw = store.get("user").unwrap().unwrap();
        assert!(raw.contains("premium"));
        assert_eq!(sessions.token().as_deref(), Some("t"));
    }
}
