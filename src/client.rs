use std::fmt;
use std::future::Future;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::{debug, info, warn};

use crate::config::{Config, BACKOFF_BASE};
use crate::error::{AppError, Result};
use crate::types::LoginResponse;

pub const TOO_MANY_REQUESTS: u16 = 429;

// ---------------------------------------------------------------------------
// Wire
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    pub query: Vec<(String, String)>,
    pub bearer: Option<String>,
    pub body: Option<serde_json::Value>,
}

impl HttpRequest {
    pub fn query_value(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct HttpReply {
    pub status: u16,
    pub body: String,
}

impl HttpReply {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn json<D: DeserializeOwned>(&self) -> Result<D> {
        Ok(serde_json::from_str(&self.body)?)
    }
}

/// Sends one request and hands back status + body. Retry and auth policy live
/// in [`ApiClient`], not here.
pub trait Transport {
    fn execute(&self, request: HttpRequest) -> impl Future<Output = Result<HttpReply>> + Send;
}

pub struct ReqwestTransport {
    http: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { http })
    }
}

impl Transport for ReqwestTransport {
    async fn execute(&self, request: HttpRequest) -> Result<HttpReply> {
        let mut builder = match request.method {
            Method::Get => self.http.get(&request.url),
            Method::Post => self.http.post(&request.url),
        };
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(token) = &request.bearer {
            builder = builder.bearer_auth(token);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let resp = builder.send().await?;
        let status = resp.status().as_u16();
        let body = resp.text().await?;
        Ok(HttpReply { status, body })
    }
}

// ---------------------------------------------------------------------------
// Retry policy
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            base: BACKOFF_BASE,
        }
    }

    /// Sleep after a 429 on zero-based `attempt`: 1s, 2s, 4s, ...
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base.saturating_mul(2u32.saturating_pow(attempt))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_MAX_RETRIES)
    }
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Bearer token for the current run. Lives in memory only.
#[derive(Clone, PartialEq, Eq)]
pub struct Session {
    token: String,
}

impl Session {
    pub fn new(token: impl Into<String>) -> Self {
        Self { token: token.into() }
    }

    pub fn token(&self) -> &str {
        &self.token
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session").field("token", &"<redacted>").finish()
    }
}

pub struct ApiClient<T = ReqwestTransport> {
    base_url: String,
    transport: T,
    retry: RetryPolicy,
    session: Option<Session>,
}

impl ApiClient<ReqwestTransport> {
    pub fn from_config(cfg: &Config) -> Result<Self> {
        let transport = ReqwestTransport::new(cfg.request_timeout)?;
        Ok(Self::new(&cfg.base_url, transport, RetryPolicy::new(cfg.max_retries)))
    }
}

impl<T: Transport> ApiClient<T> {
    pub fn new(base_url: &str, transport: T, retry: RetryPolicy) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            transport,
            retry,
            session: None,
        }
    }

    pub fn set_session(&mut self, session: Session) {
        self.session = Some(session);
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// `POST /login`. Any failure is logged and reported as `None`; deciding
    /// whether that is fatal belongs to the caller.
    pub async fn login(&self, username: &str, password: &str) -> Option<Session> {
        let request = HttpRequest {
            method: Method::Post,
            url: format!("{}/login", self.base_url),
            query: Vec::new(),
            bearer: None,
            body: Some(json!({ "username": username, "password": password })),
        };

        let reply = match self.transport.execute(request).await {
            Ok(r) => r,
            Err(e) => {
                warn!("Login request failed: {e}");
                return None;
            }
        };
        if !reply.is_success() {
            warn!(status = reply.status, "Login rejected with HTTP {}", reply.status);
            return None;
        }

        match reply.json::<LoginResponse>() {
            Ok(LoginResponse { access_token: Some(token) }) if !token.is_empty() => {
                info!("Access token obtained");
                Some(Session::new(token))
            }
            Ok(_) => {
                warn!("Login response carried no access_token");
                None
            }
            Err(e) => {
                warn!("Login response could not be decoded: {e}");
                None
            }
        }
    }

    /// One authenticated GET, no retry.
    pub async fn send_once(&self, path: &str, query: &[(&str, String)]) -> Result<HttpReply> {
        let request = HttpRequest {
            method: Method::Get,
            url: format!("{}{}", self.base_url, path),
            query: query
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect(),
            bearer: self.session.as_ref().map(|s| s.token.clone()),
            body: None,
        };
        debug!(path, "GET");
        self.transport.execute(request).await
    }

    /// Authenticated GET with the 429 backoff policy. Any other non-2xx status
    /// fails immediately; `context` names the page or id in logs and errors.
    pub async fn get_json<D: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
        context: &str,
    ) -> Result<D> {
        for attempt in 0..self.retry.max_attempts {
            let reply = self.send_once(path, query).await?;

            if reply.status == TOO_MANY_REQUESTS {
                let wait = self.retry.delay_for(attempt);
                warn!(
                    context,
                    attempt = attempt + 1,
                    "Rate limited on {context}, waiting {}s",
                    wait.as_secs_f64()
                );
                tokio::time::sleep(wait).await;
                continue;
            }

            if !reply.is_success() {
                return Err(AppError::Status {
                    context: context.to_string(),
                    status: reply.status,
                });
            }

            return reply.json();
        }

        Err(AppError::RateLimited {
            context: context.to_string(),
            attempts: self.retry.max_attempts,
        })
    }
}

// ---------------------------------------------------------------------------
// Scripted transport for tests
// ---------------------------------------------------------------------------


#[cfg(test)]
mod tests {
    use super::testing::*;
    use super::*;

    #[test]
    fn backoff_doubles_from_one_second() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_for(0), Duration::from_secs(1));
        assert_eq!(policy.delay_for(1), Duration::from_secs(2));
        assert_eq!(policy.delay_for(2), Duration::from_secs(4));
    }

    #[tokio::test(start_paused = true)]
    async fn retries_429_twice_then_returns_payload() {
        let transport =
            ScriptedTransport::sequence(vec![(429, ""), (429, ""), (200, r#"{"total": 3}"#)]);
        let client = client(transport);

        let value: serde_json::Value = client.get_json("/combats", &[], "combats page 1").await.unwrap();
        assert_eq!(value["total"], 3);

        let times = client.transport().instants();
        assert_eq!(times.len(), 3);
        let first_gap = times[1] - times[0];
        let second_gap = times[2] - times[1];
        assert!(first_gap >= Duration::from_secs(1) && first_gap < Duration::from_millis(1100));
        assert!(second_gap >= Duration::from_secs(2) && second_gap < Duration::from_millis(2100));
    }

    #[tokio::test(start_paused = true)]
    async fn exhausted_retries_report_rate_limited() {
        let client = client(ScriptedTransport::sequence(vec![(429, ""), (429, ""), (429, "")]));
        let err = client
            .get_json::<serde_json::Value>("/pokemon/4", &[], "pokemon 4")
            .await
            .unwrap_err();
        assert!(err.is_rate_limited());
        assert_eq!(client.transport().requests().len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn other_statuses_fail_without_retry() {
        let client = client(ScriptedTransport::sequence(vec![(503, ""), (200, "{}")]));
        let err = client
            .get_json::<serde_json::Value>("/combats", &[], "combats page 2")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Status { status: 503, .. }));
        assert_eq!(client.transport().requests().len(), 1);
    }

    #[tokio::test]
    async fn requests_carry_bearer_token_and_query() {
        let client = client(ScriptedTransport::sequence(vec![(200, "{}")]));
        let _: serde_json::Value = client
            .get_json("/pokemon", &[("page", "2".to_string())], "pokemon page 2")
            .await
            .unwrap();
        let reqs = client.transport().requests();
        assert_eq!(reqs[0].url, "http://api.test/pokemon");
        assert_eq!(reqs[0].bearer.as_deref(), Some("tok"));
        assert_eq!(reqs[0].query_value("page"), Some("2"));
    }

    #[tokio::test]
    async fn login_returns_session_on_token() {
        let transport = ScriptedTransport::routed(|req, _| {
            assert_eq!(req.method, Method::Post);
            assert_eq!(req.body.as_ref().unwrap()["username"], "ash");
            ok(r#"{"access_token": "jwt-abc"}"#)
        });
        let client = ApiClient::new("http://api.test/", transport, RetryPolicy::default());
        let session = client.login("ash", "pikachu").await.unwrap();
        assert_eq!(session.token(), "jwt-abc");
        assert_eq!(client.transport().requests()[0].url, "http://api.test/login");
    }

    #[tokio::test]
    async fn login_failures_yield_none() {
        let rejected = ApiClient::new(
            "http://api.test",
            ScriptedTransport::routed(|_, _| status(401)),
            RetryPolicy::default(),
        );
        assert!(rejected.login("ash", "wrong").await.is_none());

        let no_token = ApiClient::new(
            "http://api.test",
            ScriptedTransport::routed(|_, _| ok("{}")),
            RetryPolicy::default(),
        );
        assert!(no_token.login("ash", "pikachu").await.is_none());

        let unreachable = ApiClient::new(
            "http://api.test",
            ScriptedTransport::routed(|_, _| Err(AppError::Transport("connection refused".into()))),
            RetryPolicy::default(),
        );
        assert!(unreachable.login("ash", "pikachu").await.is_none());
    }

    #[test]
    fn session_debug_hides_token() {
        let s = Session::new("secret-token");
        assert!(!format!("{s:?}").contains("secret-token"));
    }
}
