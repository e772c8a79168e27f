//! Remote call layer for the KabaddiGuru backend
//!
//! All backend traffic goes through [`ApiClient`]. GET requests are
//! deduplicated while in flight (identical method + URL + body share one
//! network call) and their responses are cached for a short time. POST
//! requests are always sent as-is.
//!
//! Failures are classified into [`GuruError::Http`] (the server answered
//! with a non-2xx status, body attached) and [`GuruError::Network`] (the
//! server could not be reached at all).

use crate::config::Config;
use crate::error::{GuruError, Result};
use futures::future::{BoxFuture, FutureExt, Shared};
use reqwest::{Client, Method};
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

pub mod endpoints;
pub mod types;

pub use types::*;

/// How a GET response may be served from and written to the cache
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CachePolicy {
    /// Use the client's default lifetime
    Default,
    /// Accept cached responses younger than this
    Ttl(Duration),
    /// Always hit the network and do not store the result
    NoStore,
}

/// Clonable failure shared between deduplicated callers
#[derive(Debug, Clone)]
enum RequestFailure {
    Status {
        status: u16,
        body: String,
        detail: Option<String>,
    },
    Network(String),
    Decode(String),
}

impl RequestFailure {
    fn into_error(self, base_url: &str) -> GuruError {
        match self {
            RequestFailure::Status {
                status,
                body,
                detail,
            } => GuruError::Http {
                status,
                body,
                detail,
            },
            RequestFailure::Network(message) => GuruError::Network {
                base_url: base_url.to_string(),
                message,
            },
            RequestFailure::Decode(message) => GuruError::InvalidResponse(message),
        }
    }
}

type RequestOutcome = std::result::Result<Value, RequestFailure>;
type SharedRequest = Shared<BoxFuture<'static, RequestOutcome>>;

struct CachedResponse {
    data: Value,
    stored_at: Instant,
}

/// HTTP client for the KabaddiGuru backend
///
/// Cloning is cheap; clones share the response cache and the in-flight
/// request map.
///
/// # Examples
///
/// ```no_run
/// use kabaddiguru::api::ApiClient;
/// use std::time::Duration;
///
/// # async fn example() -> kabaddiguru::error::Result<()> {
/// let api = ApiClient::new("http://localhost:8000", Duration::from_secs(60))?;
/// let teams = api.teams().await?;
/// println!("{} teams", teams.len());
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    default_ttl: Duration,
    suggestions_ttl: Duration,
    contact_url: String,
    cache: Arc<Mutex<HashMap<String, CachedResponse>>>,
    pending: Arc<Mutex<HashMap<String, SharedRequest>>>,
}

impl ApiClient {
    /// Create a client for the backend at `base_url`
    ///
    /// No client-side timeout is configured: analysis requests may run
    /// for a long time.
    pub fn new(base_url: impl Into<String>, default_ttl: Duration) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("kabaddiguru/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| GuruError::Config(format!("Failed to create HTTP client: {}", e)))?;

        let base_url = base_url.into().trim_end_matches('/').to_string();
        Ok(Self {
            client,
            contact_url: format!("{}/api/contact", base_url),
            base_url,
            default_ttl,
            suggestions_ttl: Duration::from_secs(300),
            cache: Arc::new(Mutex::new(HashMap::new())),
            pending: Arc::new(Mutex::new(HashMap::new())),
        })
    }

    /// Create a client from configuration
    pub fn from_config(config: &Config) -> Result<Self> {
        let mut api = Self::new(config.api.base_url.clone(), config.cache.ttl())?;
        api.suggestions_ttl = config.cache.suggestions_ttl();
        api.contact_url = config.contact.url.clone();
        Ok(api)
    }

    /// Override where contact forms are posted
    pub fn with_contact_url(mut self, url: impl Into<String>) -> Self {
        self.contact_url = url.into();
        self
    }

    /// Backend base URL (without trailing slash)
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Build an absolute URL from path segments and query pairs
    ///
    /// Segments are percent-encoded individually, so team names with
    /// spaces or slashes stay a single segment.
    pub fn url(&self, segments: &[&str], query: &[(&str, &str)]) -> Result<String> {
        let mut url = url::Url::parse(&self.base_url).map_err(|e| {
            GuruError::Config(format!("Invalid base URL '{}': {}", self.base_url, e))
        })?;
        url.path_segments_mut()
            .map_err(|_| {
                GuruError::Config(format!("Base URL cannot have paths: {}", self.base_url))
            })?
            .pop_if_empty()
            .extend(segments);
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }
        Ok(url.to_string())
    }

    fn cache_key(method: &Method, url: &str, body: Option<&Value>) -> String {
        let body = body.map(|b| b.to_string()).unwrap_or_default();
        format!("{}:{}:{}", method, url, body)
    }

    /// Drop every cached response
    pub fn clear_cache(&self) {
        if let Ok(mut cache) = self.cache.lock() {
            cache.clear();
        }
    }

    fn cached(&self, key: &str, ttl: Duration) -> Option<Value> {
        let cache = self.cache.lock().ok()?;
        cache
            .get(key)
            .filter(|entry| entry.stored_at.elapsed() < ttl)
            .map(|entry| entry.data.clone())
    }

    /// Issue a GET request and decode the JSON body
    ///
    /// Concurrent identical GETs collapse into one network call. Fresh
    /// cached responses are returned without touching the network unless
    /// `policy` is [`CachePolicy::NoStore`].
    pub async fn get_json(
        &self,
        url: &str,
        token: Option<&str>,
        policy: CachePolicy,
    ) -> Result<Value> {
        let key = Self::cache_key(&Method::GET, url, None);

        let ttl = match policy {
            CachePolicy::Default => Some(self.default_ttl),
            CachePolicy::Ttl(ttl) => Some(ttl),
            CachePolicy::NoStore => None,
        };

        if let Some(ttl) = ttl {
            if let Some(data) = self.cached(&key, ttl) {
                tracing::debug!(url = %url, "Using cached response");
                return Ok(data);
            }
        }

        let shared = {
            let mut pending = self
                .pending
                .lock()
                .map_err(|_| GuruError::Storage("Pending request map poisoned".into()))?;
            match pending.get(&key) {
                Some(existing) => {
                    tracing::debug!(url = %url, "Joining in-flight request");
                    existing.clone()
                }
                None => {
                    let fut = self.spawn_get(key.clone(), url.to_string(), token, ttl.is_some());
                    pending.insert(key.clone(), fut.clone());
                    fut
                }
            }
        };

        shared
            .await
            .map_err(|failure| failure.into_error(&self.base_url).into())
    }

    fn spawn_get(
        &self,
        key: String,
        url: String,
        token: Option<&str>,
        store: bool,
    ) -> SharedRequest {
        let client = self.client.clone();
        let cache = Arc::clone(&self.cache);
        let pending = Arc::clone(&self.pending);
        let token = token.map(str::to_string);

        async move {
            let outcome = execute(&client, Method::GET, &url, None, token.as_deref()).await;

            if store {
                if let Ok(data) = &outcome {
                    if let Ok(mut cache) = cache.lock() {
                        cache.insert(
                            key.clone(),
                            CachedResponse {
                                data: data.clone(),
                                stored_at: Instant::now(),
                            },
                        );
                    }
                }
            }

            if let Ok(mut pending) = pending.lock() {
                pending.remove(&key);
            }

            outcome
        }
        .boxed()
        .shared()
    }

    /// Issue a POST request with a JSON body and decode the JSON response
    ///
    /// POSTs are never cached or deduplicated.
    pub async fn post_json<B: Serialize + ?Sized>(
        &self,
        url: &str,
        body: &B,
        token: Option<&str>,
    ) -> Result<Value> {
        let body = serde_json::to_value(body).map_err(GuruError::from)?;
        execute(&self.client, Method::POST, url, Some(&body), token)
            .await
            .map_err(|failure| failure.into_error(&self.base_url).into())
    }
}

async fn execute(
    client: &Client,
    method: Method,
    url: &str,
    body: Option<&Value>,
    token: Option<&str>,
) -> RequestOutcome {
    tracing::debug!(method = %method, url = %url, "API request");

    let mut request = client
        .request(method.clone(), url)
        .header(reqwest::header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        request = request.bearer_auth(token);
    }
    if let Some(body) = body {
        request = request.json(body);
    }

    let response = request.send().await.map_err(|e| {
        tracing::warn!(url = %url, error = %e, "Network error while calling backend");
        RequestFailure::Network(e.to_string())
    })?;

    let status = response.status();
    if !status.is_success() {
        let is_json = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|ct| ct.contains("application/json"))
            .unwrap_or(false);
        let text = response.text().await.unwrap_or_default();
        let (body, detail) = if is_json {
            match serde_json::from_str::<Value>(&text) {
                Ok(json) => {
                    let detail = json.get("detail").map(|d| match d {
                        Value::String(s) => s.clone(),
                        other => other.to_string(),
                    });
                    (json.to_string(), detail)
                }
                Err(_) => (text, None),
            }
        } else {
            (text, None)
        };
        let body = if body.is_empty() {
            "No response body".to_string()
        } else {
            body
        };

        tracing::warn!(status = status.as_u16(), url = %url, "Backend returned error status");
        return Err(RequestFailure::Status {
            status: status.as_u16(),
            body,
            detail,
        });
    }

    let text = response
        .text()
        .await
        .map_err(|e| RequestFailure::Network(e.to_string()))?;
    serde_json::from_str(&text).map_err(|e| {
        RequestFailure::Decode(format!("Failed to parse response from {}: {}", url, e))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> ApiClient {
        ApiClient::new("http://localhost:8000/", Duration::from_secs(60)).unwrap()
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        assert_eq!(client().base_url(), "http://localhost:8000");
    }

    #[test]
    fn test_url_encodes_segments() {
        let url = client()
            .url(&["analytics", "matches", "Bengal Warriors", "U Mumba"], &[])
            .unwrap();
        assert_eq!(
            url,
            "http://localhost:8000/analytics/matches/Bengal%20Warriors/U%20Mumba"
        );
    }

    #[test]
    fn test_url_with_query() {
        let url = client()
            .url(&["analytics", "players", "search"], &[("search_term", "Pardeep N")])
            .unwrap();
        assert_eq!(
            url,
            "http://localhost:8000/analytics/players/search?search_term=Pardeep+N"
        );
    }

    #[test]
    fn test_url_keeps_base_path_prefix() {
        let api = ApiClient::new("http://host/backend", Duration::from_secs(1)).unwrap();
        assert_eq!(api.url(&["chat"], &[]).unwrap(), "http://host/backend/chat");
    }

    #[test]
    fn test_cache_key_includes_method_url_and_body() {
        let body = serde_json::json!({"chat_id": "1"});
        let a = ApiClient::cache_key(&Method::GET, "http://x/a", None);
        let b = ApiClient::cache_key(&Method::POST, "http://x/a", Some(&body));
        assert_eq!(a, "GET:http://x/a:");
        assert_eq!(b, "POST:http://x/a:{\"chat_id\":\"1\"}");
    }

    #[test]
    fn test_request_failure_conversion() {
        let err = RequestFailure::Network("refused".into()).into_error("http://b");
        assert!(err.is_network());

        let err = RequestFailure::Status {
            status: 404,
            body: "nope".into(),
            detail: None,
        }
        .into_error("http://b");
        assert!(matches!(err, GuruError::Http { status: 404, .. }));
    }
}
