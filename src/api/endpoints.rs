//! Typed wrappers for the backend endpoints

use super::{ApiClient, CachePolicy};
use crate::api::types::*;
use crate::contact::ContactForm;
use crate::error::{GuruError, Result};
use crate::quota::QuotaInfo;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Search terms shorter than this never reach the backend
pub const MIN_PLAYER_SEARCH_LEN: usize = 2;

fn decode<T: DeserializeOwned>(value: Value, what: &str) -> Result<T> {
    serde_json::from_value(value).map_err(|e| {
        GuruError::InvalidResponse(format!("Unexpected {} response: {}", what, e)).into()
    })
}

/// Turn an HTTP failure of an auth endpoint into an authentication error
///
/// Connectivity failures are left untouched so callers can still tell
/// "server unreachable" apart from "wrong password".
fn auth_error(err: anyhow::Error, fallback: &str) -> anyhow::Error {
    match err.downcast_ref::<GuruError>() {
        Some(GuruError::Http { detail, .. }) => GuruError::Authentication(
            detail.clone().unwrap_or_else(|| fallback.to_string()),
        )
        .into(),
        _ => err,
    }
}

fn summary_result(response: AnalyticsSummaryResponse, fallback: &str) -> Result<Value> {
    match (response.success, response.summary) {
        (true, Some(summary)) => Ok(summary),
        _ => Err(GuruError::Backend(
            response.error.unwrap_or_else(|| fallback.to_string()),
        )
        .into()),
    }
}

impl ApiClient {
    /// `GET /analytics/teams`
    pub async fn teams(&self) -> Result<Vec<String>> {
        let url = self.url(&["analytics", "teams"], &[])?;
        let response: TeamsResponse =
            decode(self.get_json(&url, None, CachePolicy::Default).await?, "teams")?;
        if !response.success {
            return Err(GuruError::Backend(
                response
                    .error
                    .unwrap_or_else(|| "Failed to load teams".to_string()),
            )
            .into());
        }
        Ok(response.teams)
    }

    /// `GET /analytics/matches/{team1}/{team2}`
    pub async fn matches(&self, team1: &str, team2: &str) -> Result<Vec<MatchInfo>> {
        let url = self.url(&["analytics", "matches", team1, team2], &[])?;
        let response: MatchesResponse =
            decode(self.get_json(&url, None, CachePolicy::Default).await?, "matches")?;
        if !response.success {
            return Err(GuruError::Backend(
                response
                    .error
                    .unwrap_or_else(|| "Failed to load matches".to_string()),
            )
            .into());
        }
        Ok(response.matches)
    }

    /// `GET /analytics/players/search?search_term=`
    ///
    /// Terms shorter than [`MIN_PLAYER_SEARCH_LEN`] characters return an
    /// empty list without a request.
    pub async fn search_players(&self, term: &str) -> Result<Vec<String>> {
        let term = term.trim();
        if term.chars().count() < MIN_PLAYER_SEARCH_LEN {
            return Ok(Vec::new());
        }
        let url = self.url(&["analytics", "players", "search"], &[("search_term", term)])?;
        let response: PlayersResponse =
            decode(self.get_json(&url, None, CachePolicy::Default).await?, "players")?;
        Ok(if response.success {
            response.players
        } else {
            Vec::new()
        })
    }

    /// `POST /analytics/match-summary`
    pub async fn match_summary(&self, team1: &str, team2: &str, match_number: i64) -> Result<Value> {
        let url = self.url(&["analytics", "match-summary"], &[])?;
        let body = MatchSummaryRequest {
            team1,
            team2,
            match_number,
        };
        let response: AnalyticsSummaryResponse =
            decode(self.post_json(&url, &body, None).await?, "match summary")?;
        summary_result(response, "Failed to generate match summary")
    }

    /// `POST /analytics/player-summary`
    pub async fn player_summary(&self, player_name: &str, match_filter: &str) -> Result<Value> {
        let url = self.url(&["analytics", "player-summary"], &[])?;
        let body = PlayerSummaryRequest {
            player_name,
            match_filter,
        };
        let response: AnalyticsSummaryResponse =
            decode(self.post_json(&url, &body, None).await?, "player summary")?;
        summary_result(response, "Failed to generate player summary")
    }

    /// `POST /chat`
    ///
    /// A quota refusal surfaces as [`GuruError::Http`] whose detail
    /// contains the quota marker; see [`GuruError::is_quota_exceeded`].
    pub async fn chat(
        &self,
        message: &str,
        chat_id: Option<&str>,
        token: Option<&str>,
    ) -> Result<ChatResponse> {
        let url = self.url(&["chat"], &[])?;
        let body = ChatRequest { message, chat_id };
        decode(self.post_json(&url, &body, token).await?, "chat")
    }

    /// `POST /summary`
    pub async fn summary(&self, chat_id: &str) -> Result<ConversationSummary> {
        let url = self.url(&["summary"], &[])?;
        decode(
            self.post_json(&url, &SummaryRequest { chat_id }, None).await?,
            "summary",
        )
    }

    /// `POST /feedback`
    pub async fn feedback(&self, feedback: &FeedbackRequest) -> Result<()> {
        let url = self.url(&["feedback"], &[])?;
        self.post_json(&url, feedback, None).await?;
        Ok(())
    }

    /// `GET /suggestions[?team=]`, cached for the suggestions lifetime
    pub async fn suggestions(&self, team: Option<&str>) -> Result<Vec<String>> {
        let query: Vec<(&str, &str)> = team
            .filter(|t| !t.trim().is_empty())
            .map(|t| vec![("team", t)])
            .unwrap_or_default();
        let url = self.url(&["suggestions"], &query)?;
        let response: SuggestionsResponse = decode(
            self.get_json(&url, None, CachePolicy::Ttl(self.suggestions_ttl))
                .await?,
            "suggestions",
        )?;
        Ok(response.suggestions)
    }

    /// `GET /auth/chat-limit`, never cached
    pub async fn chat_limit(&self, token: &str) -> Result<QuotaInfo> {
        let url = self.url(&["auth", "chat-limit"], &[])?;
        decode(
            self.get_json(&url, Some(token), CachePolicy::NoStore).await?,
            "chat limit",
        )
    }

    /// `POST /auth/signin`
    pub async fn signin(&self, email: &str, password: &str) -> Result<AuthResponse> {
        let url = self.url(&["auth", "signin"], &[])?;
        let body = Credentials {
            email,
            password,
            full_name: None,
        };
        let value = self
            .post_json(&url, &body, None)
            .await
            .map_err(|e| auth_error(e, "Failed to signin"))?;
        decode(value, "signin")
    }

    /// `POST /auth/signup`
    pub async fn signup(&self, full_name: &str, email: &str, password: &str) -> Result<AuthResponse> {
        let url = self.url(&["auth", "signup"], &[])?;
        let body = Credentials {
            email,
            password,
            full_name: Some(full_name),
        };
        let value = self
            .post_json(&url, &body, None)
            .await
            .map_err(|e| auth_error(e, "Failed to signup"))?;
        decode(value, "signup")
    }

    /// `POST /auth/password/forgot`
    pub async fn forgot_password(&self, email: &str) -> Result<ForgotPasswordResponse> {
        let url = self.url(&["auth", "password", "forgot"], &[])?;
        let value = self
            .post_json(&url, &ForgotPasswordRequest { email }, None)
            .await
            .map_err(|e| auth_error(e, "Failed to request reset."))?;
        Ok(serde_json::from_value(value).unwrap_or_default())
    }

    /// `POST /auth/password/reset`
    pub async fn reset_password(
        &self,
        email: &str,
        reset_token: &str,
        new_password: &str,
    ) -> Result<MessageResponse> {
        let url = self.url(&["auth", "password", "reset"], &[])?;
        let body = ResetPasswordRequest {
            email,
            reset_token,
            new_password,
        };
        let value = self
            .post_json(&url, &body, None)
            .await
            .map_err(|e| auth_error(e, "Failed to reset password."))?;
        Ok(serde_json::from_value(value).unwrap_or_default())
    }

    /// Post a contact form to the contact relay
    ///
    /// The form is validated first; an invalid form never reaches the
    /// network.
    pub async fn submit_contact(&self, form: &ContactForm) -> Result<MessageResponse> {
        form.validate()?;
        tracing::info!(category = %form.category, "Submitting contact form");
        let value = self
            .post_json(&self.contact_url, form, None)
            .await
            .map_err(|e| match e.downcast_ref::<GuruError>() {
                Some(GuruError::Http { body, .. }) => {
                    let message = serde_json::from_str::<Value>(body)
                        .ok()
                        .and_then(|v| v.get("error").and_then(Value::as_str).map(str::to_string))
                        .unwrap_or_else(|| "Failed to send message. Please try again later.".to_string());
                    GuruError::Backend(message).into()
                }
                _ => e,
            })?;
        Ok(serde_json::from_value(value).unwrap_or_default())
    }
}
