//! Wire types for the KabaddiGuru backend

use crate::session::User;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;

/// Response of `GET /analytics/teams`
#[derive(Debug, Clone, Deserialize)]
pub struct TeamsResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub teams: Vec<String>,
    #[serde(default)]
    pub error: Option<String>,
}

/// One head-to-head match between two teams
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MatchInfo {
    #[serde(rename = "Match_Number")]
    pub match_number: i64,
    #[serde(rename = "Season", default, deserialize_with = "string_or_number")]
    pub season: String,
    #[serde(rename = "Venue", default)]
    pub venue: String,
}

/// Response of `GET /analytics/matches/{team1}/{team2}`
#[derive(Debug, Clone, Deserialize)]
pub struct MatchesResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub matches: Vec<MatchInfo>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Response of `GET /analytics/players/search`
#[derive(Debug, Clone, Deserialize)]
pub struct PlayersResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub players: Vec<String>,
}

/// Body of `POST /analytics/match-summary`
#[derive(Debug, Clone, Serialize)]
pub struct MatchSummaryRequest<'a> {
    pub team1: &'a str,
    pub team2: &'a str,
    pub match_number: i64,
}

/// Body of `POST /analytics/player-summary`
#[derive(Debug, Clone, Serialize)]
pub struct PlayerSummaryRequest<'a> {
    pub player_name: &'a str,
    pub match_filter: &'a str,
}

/// Response of the analytics summary endpoints
#[derive(Debug, Clone, Deserialize)]
pub struct AnalyticsSummaryResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub summary: Option<Value>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Body of `POST /chat`
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest<'a> {
    pub message: &'a str,
    pub chat_id: Option<&'a str>,
}

/// Response of `POST /chat`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatResponse {
    pub response: String,
    #[serde(default)]
    pub sql_query: Option<String>,
    #[serde(default)]
    pub response_time: Option<f64>,
}

/// Body of `POST /summary`
#[derive(Debug, Clone, Serialize)]
pub struct SummaryRequest<'a> {
    pub chat_id: &'a str,
}

/// Statistics block of a conversation summary
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SessionStats {
    #[serde(default)]
    pub total_questions: u64,
    #[serde(default)]
    pub total_tokens: u64,
    #[serde(default)]
    pub avg_tokens_per_question: Option<f64>,
    /// Seconds
    #[serde(default)]
    pub session_duration: Option<f64>,
}

/// Response of `POST /summary`
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ConversationSummary {
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub session_stats: SessionStats,
    #[serde(default)]
    pub conversation_highlights: Vec<Value>,
}

/// Kinds of feedback a user can leave on an assistant answer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedbackType {
    ThumbsUp,
    ThumbsDown,
    Suggestion,
}

impl FeedbackType {
    /// Parse the wire form or a short alias (`up`, `down`)
    pub fn parse_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "thumbs_up" | "up" | "+" => Some(FeedbackType::ThumbsUp),
            "thumbs_down" | "down" | "-" => Some(FeedbackType::ThumbsDown),
            "suggestion" | "suggest" => Some(FeedbackType::Suggestion),
            _ => None,
        }
    }
}

impl fmt::Display for FeedbackType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FeedbackType::ThumbsUp => "thumbs_up",
            FeedbackType::ThumbsDown => "thumbs_down",
            FeedbackType::Suggestion => "suggestion",
        };
        f.write_str(s)
    }
}

/// Body of `POST /feedback`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FeedbackRequest {
    pub user_question: String,
    pub ai_response: String,
    pub sql_query: String,
    pub feedback_type: FeedbackType,
    pub feedback_text: String,
    pub response_time: f64,
    pub tokens_used: u64,
    pub chat_id: Option<String>,
}

/// Response of `GET /suggestions`
#[derive(Debug, Clone, Deserialize)]
pub struct SuggestionsResponse {
    #[serde(default)]
    pub suggestions: Vec<String>,
}

/// Body of `POST /auth/signin` and `POST /auth/signup`
#[derive(Debug, Clone, Serialize)]
pub struct Credentials<'a> {
    pub email: &'a str,
    pub password: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<&'a str>,
}

/// Body of `POST /auth/password/forgot`
#[derive(Debug, Clone, Serialize)]
pub struct ForgotPasswordRequest<'a> {
    pub email: &'a str,
}

/// Body of `POST /auth/password/reset`
#[derive(Debug, Clone, Serialize)]
pub struct ResetPasswordRequest<'a> {
    pub email: &'a str,
    pub reset_token: &'a str,
    pub new_password: &'a str,
}

/// Response of `POST /auth/signin` and `POST /auth/signup`
///
/// The backend returns the user object itself with the token inlined.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthResponse {
    pub token: String,
    #[serde(flatten)]
    pub user: User,
}

/// Response of `POST /auth/password/forgot`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ForgotPasswordResponse {
    #[serde(default)]
    pub message: Option<String>,
    /// Returned directly by development backends that do not send email
    #[serde(default)]
    pub reset_token: Option<String>,
}

/// Generic `{ message }` acknowledgement
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MessageResponse {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub success: Option<bool>,
}

fn string_or_number<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    })
}
