//! Application state
//!
//! [`AppState`] is built once at startup and handed to every command. It
//! ties the session, quota tracker, upgrade gate and thread manager
//! together and owns the transitions that touch several of them at once:
//! startup, sign-in and sign-out.

use crate::api::ApiClient;
use crate::chat::{ChatThreadManager, ThreadDeps};
use crate::clock::{Clock, SystemClock};
use crate::config::Config;
use crate::error::{GuruError, Result};
use crate::gate::{GateCoordinator, LimitBanner};
use crate::quota::{QuotaCheck, QuotaInfo, QuotaTracker};
use crate::session::{Session, SessionStore, User};
use crate::storage::{KeyValueStore, SledStore};
use std::sync::Arc;

/// Shared state of one client process
pub struct AppState {
    pub config: Config,
    pub api: ApiClient,
    pub store: Arc<dyn KeyValueStore>,
    pub session: Arc<SessionStore>,
    pub quota: Arc<QuotaTracker>,
    pub gate: Arc<GateCoordinator>,
    pub threads: ChatThreadManager,
    pub clock: Arc<dyn Clock>,
}

impl AppState {
    /// Build state over an explicit store and clock
    pub fn new(config: Config, store: Arc<dyn KeyValueStore>, clock: Arc<dyn Clock>) -> Result<Self> {
        let api = ApiClient::from_config(&config)?;
        let gate = Arc::new(GateCoordinator::new());
        let session = Arc::new(SessionStore::new(store.clone()));
        let quota = Arc::new(QuotaTracker::new(api.clone(), gate.clone()));

        let threads = ChatThreadManager::new(
            ThreadDeps {
                api: api.clone(),
                store: store.clone(),
                session: session.clone(),
                quota: quota.clone(),
                gate: gate.clone(),
                clock: clock.clone(),
            },
            config.chat.inactivity_window()?,
            config.chat.max_summaries,
        );

        Ok(Self {
            config,
            api,
            store,
            session,
            quota,
            gate,
            threads,
            clock,
        })
    }

    /// Build state over the configured on-disk store and the system clock
    pub fn open(config: Config) -> Result<Self> {
        let store: Arc<dyn KeyValueStore> = match &config.storage.path {
            Some(path) => Arc::new(SledStore::new(path)?),
            None => Arc::new(SledStore::open_default()?),
        };
        Self::new(config, store, Arc::new(SystemClock))
    }

    /// Restore the persisted session and load the user's threads
    ///
    /// The quota is only fetched once restoration has finished, and only
    /// when a token was restored.
    pub async fn start(&self) -> Session {
        let session = self.session.restore_on_startup();
        self.threads.reload_for_user();
        if let Some(token) = session.token.as_deref() {
            self.quota.check_chat_limit(Some(token)).await;
        }
        session
    }

    /// Install a new session, refresh the quota and reload threads
    pub async fn login(&self, user: User, token: String) -> Result<QuotaCheck> {
        self.session.login(user, token.clone())?;
        self.threads.reload_for_user();
        Ok(self.quota.check_chat_limit(Some(&token)).await)
    }

    /// Clear the session, quota, upgrade modal and response cache
    pub fn logout(&self) -> Result<()> {
        self.session.logout()?;
        self.quota.clear();
        self.gate.reset();
        self.api.clear_cache();
        self.threads.reload_for_user();
        Ok(())
    }

    /// Sign in with email and password
    ///
    /// # Errors
    ///
    /// [`GuruError::Validation`] for blank fields (no request is made),
    /// [`GuruError::Authentication`] when the backend refuses.
    pub async fn signin(&self, email: &str, password: &str) -> Result<User> {
        if email.trim().is_empty() || password.is_empty() {
            return Err(GuruError::Validation("Please fill in all fields".to_string()).into());
        }
        let auth = self.api.signin(email.trim(), password).await?;
        let user = auth.user.clone();
        self.login(auth.user, auth.token).await?;
        Ok(user)
    }

    /// Create an account and sign in
    pub async fn signup(&self, full_name: &str, email: &str, password: &str) -> Result<User> {
        if full_name.trim().is_empty() || email.trim().is_empty() || password.is_empty() {
            return Err(GuruError::Validation("Please fill in all fields".to_string()).into());
        }
        let auth = self
            .api
            .signup(full_name.trim(), email.trim(), password)
            .await?;
        let user = auth.user.clone();
        self.login(auth.user, auth.token).await?;
        Ok(user)
    }

    /// Request a password reset; returns the reset token when the backend
    /// hands one back directly
    pub async fn forgot_password(&self, email: &str) -> Result<Option<String>> {
        if email.trim().is_empty() {
            return Err(GuruError::Validation("Please enter your email.".to_string()).into());
        }
        let response = self.api.forgot_password(email.trim()).await?;
        Ok(response.reset_token)
    }

    /// Complete a password reset
    pub async fn reset_password(&self, email: &str, reset_token: &str, new_password: &str) -> Result<()> {
        if email.trim().is_empty() || reset_token.trim().is_empty() || new_password.is_empty() {
            return Err(GuruError::Validation(
                "Email, token and new password are required.".to_string(),
            )
            .into());
        }
        self.api
            .reset_password(email.trim(), reset_token.trim(), new_password)
            .await?;
        Ok(())
    }

    /// Re-fetch the quota for the current session
    pub async fn refresh_quota(&self) -> QuotaCheck {
        let token = self.session.token();
        self.quota.refresh_chat_limit(token.as_deref()).await
    }

    /// Current quota information
    pub fn quota_info(&self) -> Option<QuotaInfo> {
        self.quota.info()
    }

    /// Whether the upgrade overlay blocks interaction
    pub fn overlay_active(&self) -> bool {
        self.gate.overlay_active(self.quota.info().as_ref())
    }

    /// Limit banner for the current quota, if one should show
    pub fn limit_banner(&self) -> Option<LimitBanner> {
        self.gate.banner(self.quota.info().as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::storage::MemoryStore;
    use crate::test_utils::{assert_error_contains, test_config, test_state};

    fn state() -> AppState {
        test_state("http://127.0.0.1:9").0
    }

    #[test]
    fn test_out_of_range_window_is_config_error() {
        let mut config = test_config("http://127.0.0.1:9");
        config.chat.inactivity_window_minutes = u64::MAX;
        let result = AppState::new(
            config,
            Arc::new(MemoryStore::new()),
            Arc::new(ManualClock::new(chrono::Utc::now())),
        );
        assert_error_contains(result, "inactivity_window_minutes out of range");
    }

    #[tokio::test]
    async fn test_start_without_session_skips_quota() {
        let state = state();
        let session = state.start().await;
        assert!(!session.is_authenticated());
        assert!(!state.session.is_loading());
        assert!(state.quota_info().is_none());
        assert!(!state.overlay_active());
    }

    #[tokio::test]
    async fn test_blank_signin_is_rejected_locally() {
        let state = state();
        let err = state.signin("", "pw").await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<GuruError>(),
            Some(GuruError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_blank_reset_is_rejected_locally() {
        let state = state();
        assert_error_contains(
            state.reset_password("a@b.co", " ", "pw").await,
            "Email, token and new password are required.",
        );
    }

    #[tokio::test]
    async fn test_login_with_unreachable_backend_fails_open() {
        let state = state();
        let check = state
            .login(User::default(), "tok".to_string())
            .await
            .unwrap();
        assert!(matches!(check, QuotaCheck::Fallback(_)));
        assert!(state.session.is_authenticated());
        assert!(!state.overlay_active());
    }

    #[tokio::test]
    async fn test_logout_resets_everything() {
        let state = state();
        let mut info = QuotaInfo::fail_open();
        info.remaining_chats = Some(0);
        state
            .session
            .login(User::default(), "tok".to_string())
            .unwrap();
        state.quota.set_info(Some(info));
        assert!(state.gate.is_modal_visible());
        assert!(state.overlay_active());

        state.logout().unwrap();
        assert!(!state.session.is_authenticated());
        assert!(state.quota_info().is_none());
        assert!(!state.gate.is_modal_visible());
        assert!(!state.overlay_active());
    }
}
