//! Reddit OAuth client scoped to a set of subreddits.
//!
//! `RedditClient` authenticates as a script app (password grant), caches the
//! bearer token until shortly before it expires, and scopes listing effects to
//! the configured subreddits. The `PlatformEffect` enum doesn't carry the
//! subreddit, so the scope lives here.

use std::sync::Arc;
use std::time::{Duration, Instant};

use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use tokio::sync::RwLock;
use tracing::debug;

use crate::effects::PlatformError;
use crate::retry::{RetryConfig, RetryPolicy};

use super::error::{from_api_errors, from_reqwest, from_status};
use super::listing::{ApiJson, ApiResponse, TokenResponse};

/// Production token endpoint host.
pub const AUTH_BASE: &str = "https://www.reddit.com";

/// Production API host for bearer-authenticated requests.
pub const API_BASE: &str = "https://oauth.reddit.com";

/// Refresh this long before the token's stated expiry.
const TOKEN_EXPIRY_MARGIN: Duration = Duration::from_secs(60);

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Script-app credentials.
#[derive(Clone)]
pub struct Credentials {
    pub client_id: String,
    pub client_secret: String,
    pub username: String,
    pub password: String,
    pub user_agent: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("client_id", &self.client_id)
            .field("username", &self.username)
            .field("user_agent", &self.user_agent)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone)]
struct CachedToken {
    access_token: String,
    refresh_at: Instant,
}

/// A Reddit API client.
#[derive(Clone)]
pub struct RedditClient {
    http: Client,
    credentials: Arc<Credentials>,
    auth_base: String,
    api_base: String,

    /// Subreddits joined with `+`, e.g. `tipofmytongue+notifierbottest`.
    subreddits: String,

    token: Arc<RwLock<Option<CachedToken>>>,
    pub(super) retry_config: RetryConfig,
    pub(super) retry_policy: RetryPolicy,
}

impl RedditClient {
    /// Creates a client against the production endpoints.
    pub fn new(credentials: Credentials, subreddits: impl Into<String>) -> Result<Self, PlatformError> {
        let http = Client::builder()
            .user_agent(credentials.user_agent.clone())
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| PlatformError::permanent("failed to build HTTP client").with_source(e))?;

        Ok(Self {
            http,
            credentials: Arc::new(credentials),
            auth_base: AUTH_BASE.to_string(),
            api_base: API_BASE.to_string(),
            subreddits: subreddits.into(),
            token: Arc::new(RwLock::new(None)),
            retry_config: RetryConfig::DEFAULT,
            retry_policy: RetryPolicy::RetryTransient,
        })
    }

    /// Points the client at different hosts (used by tests).
    pub fn with_base_urls(mut self, auth_base: impl Into<String>, api_base: impl Into<String>) -> Self {
        self.auth_base = auth_base.into();
        self.api_base = api_base.into();
        self
    }

    pub fn with_retry(mut self, config: RetryConfig, policy: RetryPolicy) -> Self {
        self.retry_config = config;
        self.retry_policy = policy;
        self
    }

    pub fn subreddits(&self) -> &str {
        &self.subreddits
    }

    /// The account the bot acts as.
    pub fn username(&self) -> &str {
        &self.credentials.username
    }

    /// Returns a valid bearer token, fetching a new one if needed.
    async fn access_token(&self) -> Result<String, PlatformError> {
        {
            let cached = self.token.read().await;
            if let Some(token) = cached.as_ref()
                && Instant::now() < token.refresh_at
            {
                return Ok(token.access_token.clone());
            }
        }

        let mut slot = self.token.write().await;
        // Another task may have refreshed while we waited for the lock.
        if let Some(token) = slot.as_ref()
            && Instant::now() < token.refresh_at
        {
            return Ok(token.access_token.clone());
        }

        let fresh = self.fetch_token().await?;
        let access_token = fresh.access_token.clone();
        *slot = Some(fresh);
        Ok(access_token)
    }

    async fn fetch_token(&self) -> Result<CachedToken, PlatformError> {
        let url = format!("{}/api/v1/access_token", self.auth_base);
        let form = [
            ("grant_type", "password"),
            ("username", self.credentials.username.as_str()),
            ("password", self.credentials.password.as_str()),
        ];

        let response = self
            .http
            .post(&url)
            .basic_auth(&self.credentials.client_id, Some(&self.credentials.client_secret))
            .form(&form)
            .send()
            .await
            .map_err(from_reqwest)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(from_status(status, &body));
        }

        let parsed: TokenResponse = response.json().await.map_err(from_reqwest)?;
        if let Some(error) = parsed.error {
            return Err(PlatformError::permanent(format!("token request rejected: {}", error)));
        }
        let access_token = parsed
            .access_token
            .ok_or_else(|| PlatformError::permanent("token response has no access_token"))?;
        let lifetime = Duration::from_secs(parsed.expires_in.unwrap_or(3600));

        debug!(expires_in_secs = lifetime.as_secs(), "Fetched Reddit access token");
        Ok(CachedToken {
            access_token,
            refresh_at: Instant::now() + lifetime.saturating_sub(TOKEN_EXPIRY_MARGIN),
        })
    }

    async fn invalidate_token(&self) {
        *self.token.write().await = None;
    }

    /// Sends an authenticated request and fails on non-success statuses.
    async fn send(&self, request: RequestBuilder) -> Result<Response, PlatformError> {
        let token = self.access_token().await?;
        let response = request.bearer_auth(token).send().await.map_err(from_reqwest)?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        if status == reqwest::StatusCode::UNAUTHORIZED {
            self.invalidate_token().await;
        }
        let body = response.text().await.unwrap_or_default();
        Err(from_status(status, &body))
    }

    /// GET `path` with `raw_json=1` and decode the body.
    pub(super) async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, PlatformError> {
        let url = format!("{}{}", self.api_base, path);
        let request = self.http.get(&url).query(&[("raw_json", "1")]).query(query);
        let response = self.send(request).await?;
        response.json().await.map_err(from_reqwest)
    }

    /// POST a form to an endpoint that answers with an empty object.
    pub(super) async fn post_form(&self, path: &str, form: &[(&str, &str)]) -> Result<(), PlatformError> {
        let url = format!("{}{}", self.api_base, path);
        self.send(self.http.post(&url).form(form)).await?;
        Ok(())
    }

    /// POST a form with `api_type=json` and surface `json.errors` as failures.
    pub(super) async fn post_api(&self, path: &str, form: &[(&str, &str)]) -> Result<ApiJson, PlatformError> {
        let url = format!("{}{}", self.api_base, path);
        let mut fields: Vec<(&str, &str)> = Vec::with_capacity(form.len() + 1);
        fields.push(("api_type", "json"));
        fields.extend_from_slice(form);

        let response = self.send(self.http.post(&url).form(&fields)).await?;
        let parsed: ApiResponse = response.json().await.map_err(from_reqwest)?;
        match from_api_errors(&parsed.json.errors) {
            Some(error) => Err(error),
            None => Ok(parsed.json),
        }
    }
}

impl std::fmt::Debug for RedditClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedditClient")
            .field("api_base", &self.api_base)
            .field("subreddits", &self.subreddits)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn credentials() -> Credentials {
        Credentials {
            client_id: "id".to_string(),
            client_secret: "secret".to_string(),
            username: "solved_notifier".to_string(),
            password: "hunter2".to_string(),
            user_agent: "solved-notifier/test".to_string(),
        }
    }

    #[test]
    fn debug_output_hides_secrets() {
        let rendered = format!("{:?}", credentials());
        assert!(!rendered.contains("hunter2"));
        assert!(!rendered.contains("secret"));
        assert!(rendered.contains("solved_notifier"));
    }

    #[test]
    fn client_reports_scope() {
        let client = RedditClient::new(credentials(), "tipofmytongue+notifierbottest").unwrap();
        assert_eq!(client.subreddits(), "tipofmytongue+notifierbottest");
        assert_eq!(client.username(), "solved_notifier");
        assert_eq!(client.retry_config, RetryConfig::DEFAULT);
    }
}
