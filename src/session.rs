//! Podio API session.
//!
//! The session is the single chokepoint for outbound requests: it owns the
//! credentials, acquires and replaces the bearer token, and runs every
//! response through one error check. Entity operations are built on top of
//! [`Session::call`].

use std::borrow::Cow;
use std::env;
use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::multipart::Form;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::{Mutex, RwLock};
use url::Url;

use crate::auth::{Credentials, TokenResponse, TOKEN_ENDPOINT};
use crate::error::{PodioError, Result};

const DEFAULT_API_URL: &str = "https://api.podio.com";
const USER_AGENT: &str = concat!("podioapi/", env!("CARGO_PKG_VERSION"));
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

/// Observable lifecycle of a [`Session`]'s connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No access token has been acquired yet.
    Unauthenticated,
    /// A pool carrying the bearer token is installed.
    Authenticated,
    /// A response failed the error check; the pool and token were dropped
    /// and the next call authenticates again.
    Reset,
    /// The caller closed the session.
    Closed,
}

enum Connection {
    Unauthenticated,
    Authenticated(Client),
    Reset,
    Closed,
}

impl Connection {
    fn state(&self) -> SessionState {
        match self {
            Self::Unauthenticated => SessionState::Unauthenticated,
            Self::Authenticated(_) => SessionState::Authenticated,
            Self::Reset => SessionState::Reset,
            Self::Closed => SessionState::Closed,
        }
    }
}

struct Inner {
    base_url: Url,
    /// `base_url` without the trailing slash, for joining endpoint paths.
    base: String,
    timeout: Duration,
    user_agent: String,
    /// Pool used for `/oauth/token`; never carries a bearer header.
    token_http: Client,
    /// Also serializes authentication: at most one grant is in flight.
    credentials: Mutex<Credentials>,
    connection: RwLock<Connection>,
}

/// Authenticated connection to the Podio API.
///
/// This struct is cheaply cloneable; clones share the same credentials,
/// bearer token and connection pool. Closing any clone closes them all.
///
/// # Example
///
/// ```no_run
/// use podioapi::{Credentials, Session};
///
/// # async fn example() -> podioapi::Result<()> {
/// let credentials = Credentials::new("client-id", "client-secret")
///     .with_password("me@example.com", "password");
/// let session = Session::new(credentials)?;
///
/// // Authentication happens lazily on the first call, or explicitly:
/// session.authenticate().await?;
///
/// session.close().await;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Session {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self
            .inner
            .connection
            .try_read()
            .map(|c| c.state())
            .ok();
        f.debug_struct("Session")
            .field("base_url", &self.inner.base_url.as_str())
            .field("state", &state)
            .finish_non_exhaustive()
    }
}

/// Builder for a [`Session`] with non-default transport settings.
#[derive(Debug)]
pub struct SessionBuilder {
    credentials: Credentials,
    base_url: String,
    timeout: Duration,
    user_agent: String,
}

impl SessionBuilder {
    /// Override the API base URL (defaults to `https://api.podio.com`).
    #[must_use]
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Override the per-request timeout (defaults to 300 seconds).
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Override the `User-Agent` header.
    #[must_use]
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Build the session. No request is made.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is invalid or the HTTP client
    /// cannot be constructed.
    pub fn build(self) -> Result<Session> {
        let base_url = Url::parse(&self.base_url)?;
        let base = base_url.as_str().trim_end_matches('/').to_string();
        let token_http = build_client(&self.user_agent, self.timeout, HeaderMap::new())?;

        Ok(Session {
            inner: Arc::new(Inner {
                base_url,
                base,
                timeout: self.timeout,
                user_agent: self.user_agent,
                token_http,
                credentials: Mutex::new(self.credentials),
                connection: RwLock::new(Connection::Unauthenticated),
            }),
        })
    }
}

impl Session {
    /// Create a session against the public Podio API.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(credentials: Credentials) -> Result<Self> {
        Self::builder(credentials).build()
    }

    /// Start building a session with custom transport settings.
    pub fn builder(credentials: Credentials) -> SessionBuilder {
        SessionBuilder {
            credentials,
            base_url: DEFAULT_API_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            user_agent: USER_AGENT.to_string(),
        }
    }

    /// Create a session from environment variables.
    ///
    /// Credentials come from [`Credentials::from_env`]; `PODIO_API_URL`
    /// optionally overrides the base URL.
    ///
    /// # Errors
    ///
    /// Returns an error if a required variable is unset.
    pub fn from_env() -> Result<Self> {
        let credentials = Credentials::from_env()?;
        let base_url = env::var("PODIO_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string());
        Self::builder(credentials).base_url(base_url).build()
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    /// Current connection state.
    pub async fn state(&self) -> SessionState {
        self.inner.connection.read().await.state()
    }

    /// Whether a bearer token is currently installed.
    pub async fn is_authenticated(&self) -> bool {
        self.state().await == SessionState::Authenticated
    }

    /// The refresh token, once a grant has produced one or one was supplied.
    pub async fn refresh_token(&self) -> Option<String> {
        self.inner
            .credentials
            .lock()
            .await
            .refresh_token()
            .map(str::to_string)
    }

    /// Acquire a new access token and install it on a fresh pool.
    ///
    /// Uses the refresh-token grant when a refresh token is known and the
    /// password grant otherwise. The previous pool, if any, is replaced.
    ///
    /// # Errors
    ///
    /// - [`PodioError::Credentials`] if neither grant is possible (no request
    ///   is sent).
    /// - [`PodioError::Authentication`] if the token endpoint rejects the grant.
    /// - [`PodioError::SessionClosed`] after [`Session::close`].
    #[tracing::instrument(skip(self))]
    pub async fn authenticate(&self) -> Result<()> {
        let mut credentials = self.inner.credentials.lock().await;
        self.authenticate_locked(&mut credentials).await?;
        Ok(())
    }

    /// Send a request to `endpoint` (relative to the base URL).
    ///
    /// Authenticates first when no token is installed. The response is
    /// returned unread once it passed the error check.
    ///
    /// # Errors
    ///
    /// Returns [`PodioError::Api`] for non-2xx responses, which also drops
    /// the pool, or any authentication error from the implicit login.
    #[tracing::instrument(skip(self, options))]
    pub async fn call(
        &self,
        endpoint: &str,
        method: Method,
        options: RequestOptions,
    ) -> Result<Response> {
        let http = self.authorized_http().await?;
        self.send(http, endpoint, method, options, false).await
    }

    /// Send a request to an authentication endpoint.
    ///
    /// Skips the implicit login and never attaches the bearer token.
    /// Failures are reported as [`PodioError::Authentication`].
    #[tracing::instrument(skip(self, options))]
    pub async fn auth_call(
        &self,
        endpoint: &str,
        method: Method,
        options: RequestOptions,
    ) -> Result<Response> {
        self.ensure_open().await?;
        let http = self.inner.token_http.clone();
        self.send(http, endpoint, method, options, true).await
    }

    /// Make a GET request.
    pub async fn get(&self, path: &str) -> Result<Response> {
        self.call(path, Method::GET, RequestOptions::new()).await
    }

    /// Make a GET request with query parameters.
    pub async fn get_with_query<Q>(&self, path: &str, query: Q) -> Result<Response>
    where
        Q: Serialize + Send + 'static,
    {
        self.call(path, Method::GET, RequestOptions::new().query(query))
            .await
    }

    /// Make a POST request with JSON body.
    pub async fn post<B>(&self, path: &str, body: B) -> Result<Response>
    where
        B: Serialize + Send + 'static,
    {
        self.call(path, Method::POST, RequestOptions::new().json(body))
            .await
    }

    /// Make a POST request without a body.
    pub async fn post_empty(&self, path: &str) -> Result<Response> {
        self.call(path, Method::POST, RequestOptions::new()).await
    }

    /// Make a DELETE request.
    pub async fn delete(&self, path: &str) -> Result<Response> {
        self.call(path, Method::DELETE, RequestOptions::new()).await
    }

    /// GET `path` and deserialize the body.
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        Self::read_json(self.get(path).await?).await
    }

    /// POST a JSON body to `path` and deserialize the response.
    pub async fn post_json<B, T>(&self, path: &str, body: B) -> Result<T>
    where
        B: Serialize + Send + 'static,
        T: DeserializeOwned,
    {
        Self::read_json(self.post(path, body).await?).await
    }

    /// Deserialize a checked response body.
    pub async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T> {
        let body = response.bytes().await.map_err(PodioError::transport)?;
        Ok(serde_json::from_slice(&body)?)
    }

    /// Release the connection pool.
    ///
    /// Idempotent: closing an already closed session does nothing. Every
    /// later [`Session::call`] or [`Session::authenticate`] fails with
    /// [`PodioError::SessionClosed`].
    #[tracing::instrument(skip(self))]
    pub async fn close(&self) {
        let mut connection = self.inner.connection.write().await;
        if matches!(*connection, Connection::Closed) {
            tracing::debug!("session already closed");
            return;
        }
        *connection = Connection::Closed;
    }

    async fn ensure_open(&self) -> Result<()> {
        match self.state().await {
            SessionState::Closed => Err(PodioError::SessionClosed),
            _ => Ok(()),
        }
    }

    /// The bearer-carrying pool, authenticating once if none is installed.
    async fn authorized_http(&self) -> Result<Client> {
        if let Some(http) = self.current_client().await? {
            return Ok(http);
        }

        self.ensure_authenticated().await
    }

    async fn current_client(&self) -> Result<Option<Client>> {
        match &*self.inner.connection.read().await {
            Connection::Authenticated(http) => Ok(Some(http.clone())),
            Connection::Closed => Err(PodioError::SessionClosed),
            Connection::Unauthenticated | Connection::Reset => Ok(None),
        }
    }

    /// Lazy login, returning the pool the grant installed. A caller that
    /// waited on another task's login finds the token installed and skips
    /// its own grant.
    async fn ensure_authenticated(&self) -> Result<Client> {
        let mut credentials = self.inner.credentials.lock().await;

        if let Some(http) = self.current_client().await? {
            return Ok(http);
        }
        tracing::debug!("no access token installed, authenticating");
        self.authenticate_locked(&mut credentials).await
    }

    async fn authenticate_locked(&self, credentials: &mut Credentials) -> Result<Client> {
        self.ensure_open().await?;

        let grant = credentials.grant()?;
        tracing::debug!(grant_type = grant.grant_type(), "requesting access token");

        let options = RequestOptions::new().form(credentials.token_form(&grant));
        let http = self.inner.token_http.clone();
        let response = self
            .send(http, TOKEN_ENDPOINT, Method::POST, options, true)
            .await?;
        let token: TokenResponse = Self::read_json(response).await?;

        credentials.absorb(&grant, &token)?;
        let http = self.authorized_client(&token.access_token)?;

        let mut connection = self.inner.connection.write().await;
        if matches!(*connection, Connection::Closed) {
            return Err(PodioError::SessionClosed);
        }
        *connection = Connection::Authenticated(http.clone());

        tracing::debug!(expires_in = ?token.expires_in, "access token installed");
        Ok(http)
    }

    fn authorized_client(&self, access_token: &str) -> Result<Client> {
        let mut value = HeaderValue::from_str(&format!("OAuth2 {access_token}")).map_err(|_| {
            PodioError::Authentication {
                message: "access token is not a valid header value".to_string(),
                status_code: None,
            }
        })?;
        value.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, value);

        build_client(&self.inner.user_agent, self.inner.timeout, headers)
    }

    async fn send(
        &self,
        http: Client,
        endpoint: &str,
        method: Method,
        options: RequestOptions,
        is_auth_call: bool,
    ) -> Result<Response> {
        let url = self.endpoint_url(endpoint)?;
        tracing::debug!(%url, "dispatching request");

        let response = options
            .apply(http.request(method, url))
            .send()
            .await
            .map_err(PodioError::transport)?;

        self.check_response(response, is_auth_call).await
    }

    fn endpoint_url(&self, endpoint: &str) -> Result<Url> {
        let path = if endpoint.starts_with('/') {
            Cow::Borrowed(endpoint)
        } else {
            Cow::Owned(format!("/{endpoint}"))
        };
        Ok(Url::parse(&format!("{}{}", self.inner.base, path))?)
    }

    /// Check response status and convert errors.
    ///
    /// A failed response drops the current pool and token.
    async fn check_response(&self, response: Response, is_auth_call: bool) -> Result<Response> {
        let status = response.status();

        if status.is_success() {
            return Ok(response);
        }

        let message = extract_error_description(response, status).await;
        tracing::error!(status = status.as_u16(), %message, "Podio request failed");

        self.reset().await;

        if is_auth_call {
            Err(PodioError::Authentication {
                message,
                status_code: Some(status.as_u16()),
            })
        } else {
            Err(PodioError::Api {
                status_code: status.as_u16(),
                message,
            })
        }
    }

    async fn reset(&self) {
        let mut connection = self.inner.connection.write().await;
        if !matches!(*connection, Connection::Closed) {
            *connection = Connection::Reset;
        }
    }
}

type Transform = Box<dyn FnOnce(RequestBuilder) -> RequestBuilder + Send>;

/// Pass-through options for a single request: query parameters and at
/// most one body.
///
/// ```
/// use podioapi::RequestOptions;
///
/// let options = RequestOptions::new()
///     .query([("limit", "20")])
///     .json(serde_json::json!({"space_id": 42}));
/// ```
#[derive(Default)]
pub struct RequestOptions {
    transforms: Vec<Transform>,
}

impl std::fmt::Debug for RequestOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestOptions")
            .field("options", &self.transforms.len())
            .finish()
    }
}

impl RequestOptions {
    /// Empty options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add query parameters.
    #[must_use]
    pub fn query<Q: Serialize + Send + 'static>(self, query: Q) -> Self {
        self.with(move |rb| rb.query(&query))
    }

    /// Send a JSON body.
    #[must_use]
    pub fn json<B: Serialize + Send + 'static>(self, body: B) -> Self {
        self.with(move |rb| rb.json(&body))
    }

    /// Send a URL-encoded form body.
    #[must_use]
    pub fn form<F: Serialize + Send + 'static>(self, form: F) -> Self {
        self.with(move |rb| rb.form(&form))
    }

    /// Send a multipart form body.
    #[must_use]
    pub fn multipart(self, form: Form) -> Self {
        self.with(move |rb| rb.multipart(form))
    }

    fn with(mut self, f: impl FnOnce(RequestBuilder) -> RequestBuilder + Send + 'static) -> Self {
        self.transforms.push(Box::new(f));
        self
    }

    fn apply(self, builder: RequestBuilder) -> RequestBuilder {
        self.transforms.into_iter().fold(builder, |rb, f| f(rb))
    }
}

fn build_client(user_agent: &str, timeout: Duration, headers: HeaderMap) -> Result<Client> {
    Client::builder()
        .user_agent(user_agent)
        .default_headers(headers)
        .brotli(true)
        .gzip(true)
        .deflate(true)
        .timeout(timeout)
        .build()
        .map_err(PodioError::Http)
}

/// Extract the human-readable description from a failed response.
async fn extract_error_description(response: Response, status: StatusCode) -> String {
    let body = match response.text().await {
        Ok(b) => b,
        Err(_) => return format!("HTTP {status}"),
    };

    description_from_body(&body).unwrap_or_else(|| {
        if body.trim().is_empty() {
            format!("HTTP {status}")
        } else {
            body
        }
    })
}

fn description_from_body(body: &str) -> Option<String> {
    let json = serde_json::from_str::<serde_json::Value>(body).ok()?;
    ["error_description", "error", "message"]
        .iter()
        .find_map(|key| json.get(*key).and_then(|v| v.as_str()))
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(base_url: &str) -> Session {
        Session::builder(Credentials::new("id", "secret").with_password("me", "pw"))
            .base_url(base_url)
            .build()
            .unwrap()
    }

    #[test]
    fn test_session_debug() {
        let session = session("https://api.podio.com");
        let debug = format!("{:?}", session);
        assert!(debug.contains("Session"));
        assert!(debug.contains("base_url"));
        assert!(!debug.contains("secret"));
        assert!(!debug.contains("pw"));
    }

    #[test]
    fn test_endpoint_url_joins_paths() {
        let s1 = session("https://api.podio.com");
        let s2 = session("https://api.podio.com/");
        assert_eq!(
            s1.endpoint_url("/space/42").unwrap(),
            s2.endpoint_url("space/42").unwrap()
        );

        let nested = session("http://localhost:8080/podio");
        assert_eq!(
            nested.endpoint_url("/app/space/7").unwrap().as_str(),
            "http://localhost:8080/podio/app/space/7"
        );
    }

    #[test]
    fn test_invalid_base_url() {
        let result = Session::builder(Credentials::new("id", "secret"))
            .base_url("not a url")
            .build();
        assert!(matches!(result, Err(PodioError::Url(_))));
    }

    #[test]
    fn test_description_from_body() {
        assert_eq!(
            description_from_body(r#"{"error": "not_found", "error_description": "Object not found"}"#),
            Some("Object not found".to_string())
        );
        assert_eq!(
            description_from_body(r#"{"error": "forbidden"}"#),
            Some("forbidden".to_string())
        );
        assert_eq!(description_from_body("<html>oops</html>"), None);
    }

    #[tokio::test]
    async fn test_new_session_is_unauthenticated() {
        let session = session("https://api.podio.com");
        assert_eq!(session.state().await, SessionState::Unauthenticated);
        assert!(!session.is_authenticated().await);
        assert_eq!(session.refresh_token().await, None);
    }

    #[tokio::test]
    async fn test_close_is_idempotent_and_blocks_calls() {
        // Port 9 (discard) is never contacted: the closed check comes first.
        let session = session("http://127.0.0.1:9");
        session.close().await;
        session.close().await;
        assert_eq!(session.state().await, SessionState::Closed);

        let err = session.get("/space/1").await.unwrap_err();
        assert!(matches!(err, PodioError::SessionClosed));

        let err = session.authenticate().await.unwrap_err();
        assert!(matches!(err, PodioError::SessionClosed));
    }

    #[tokio::test]
    async fn test_lazy_login_keeps_its_pool_after_concurrent_reset() {
        use wiremock::matchers::{header, method, path};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/oauth/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "at-1",
                "refresh_token": "rt-1",
                "expires_in": 28800
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/space/1"))
            .and(header("authorization", "OAuth2 at-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"space_id": 1})))
            .expect(1)
            .mount(&server)
            .await;

        let session = session(&server.uri());
        let http = session.ensure_authenticated().await.unwrap();

        // Another call failing right after the grant drops the shared pool.
        session.reset().await;
        assert_eq!(session.state().await, SessionState::Reset);

        let response = session
            .send(http, "/space/1", Method::GET, RequestOptions::new(), false)
            .await
            .unwrap();
        assert!(response.status().is_success());
    }

    #[tokio::test]
    async fn test_authenticate_without_credentials_fails_locally() {
        let session = Session::builder(Credentials::new("id", "secret"))
            .base_url("http://127.0.0.1:9")
            .build()
            .unwrap();

        let err = session.authenticate().await.unwrap_err();
        assert!(matches!(err, PodioError::Credentials(_)));
        assert_eq!(session.state().await, SessionState::Unauthenticated);
    }
}
