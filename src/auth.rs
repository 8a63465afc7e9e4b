//! OAuth2 credentials and grant selection.
//!
//! Podio issues bearer tokens through `/oauth/token` using either the
//! password grant (first login) or the refresh-token grant (every login
//! after the first). [`Credentials`] decides which one applies.

use std::env;

use serde::Deserialize;

use crate::error::{PodioError, Result};

/// Path of the token endpoint, relative to the API base URL.
pub(crate) const TOKEN_ENDPOINT: &str = "/oauth/token";

/// Client credentials plus whatever user credential is known.
///
/// Authentication succeeds only when a refresh token or a complete
/// username/password pair is present.
///
/// # Example
///
/// ```
/// use podioapi::Credentials;
///
/// let creds = Credentials::new("my-client", "my-secret")
///     .with_password("me@example.com", "hunter2");
/// assert!(creds.refresh_token().is_none());
/// ```
#[derive(Clone)]
pub struct Credentials {
    client_id: String,
    client_secret: String,
    refresh_token: Option<String>,
    username: Option<String>,
    password: Option<String>,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("client_id", &self.client_id)
            .field("username", &self.username)
            .field("has_refresh_token", &self.refresh_token.is_some())
            .finish_non_exhaustive()
    }
}

impl Credentials {
    /// Create credentials holding only the OAuth client id and secret.
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            refresh_token: None,
            username: None,
            password: None,
        }
    }

    /// Attach a refresh token obtained from an earlier login.
    #[must_use]
    pub fn with_refresh_token(mut self, refresh_token: impl Into<String>) -> Self {
        self.refresh_token = non_empty(refresh_token.into());
        self
    }

    /// Attach a username and password for the password grant.
    #[must_use]
    pub fn with_password(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.username = non_empty(username.into());
        self.password = non_empty(password.into());
        self
    }

    /// Read credentials from environment variables.
    ///
    /// `PODIO_CLIENT_ID` and `PODIO_CLIENT_SECRET` are required.
    /// `PODIO_REFRESH_TOKEN`, `PODIO_USERNAME` and `PODIO_PASSWORD` are
    /// picked up when set.
    ///
    /// # Errors
    ///
    /// Returns [`PodioError::ConfigMissing`] if a required variable is unset.
    pub fn from_env() -> Result<Self> {
        let client_id = required_var("PODIO_CLIENT_ID")?;
        let client_secret = required_var("PODIO_CLIENT_SECRET")?;

        let mut creds = Self::new(client_id, client_secret);
        creds.refresh_token = optional_var("PODIO_REFRESH_TOKEN");
        creds.username = optional_var("PODIO_USERNAME");
        creds.password = optional_var("PODIO_PASSWORD");
        Ok(creds)
    }

    /// The OAuth client id.
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// The refresh token, once known.
    pub fn refresh_token(&self) -> Option<&str> {
        self.refresh_token.as_deref()
    }

    /// Pick the grant to use for the next token request.
    pub(crate) fn grant(&self) -> Result<Grant> {
        if let Some(token) = &self.refresh_token {
            return Ok(Grant::RefreshToken(token.clone()));
        }

        match (&self.username, &self.password) {
            (Some(username), Some(password)) => Ok(Grant::Password {
                username: username.clone(),
                password: password.clone(),
            }),
            _ => Err(PodioError::Credentials(
                "provide a refresh token or a username and password".to_string(),
            )),
        }
    }

    /// Form fields for a token request using `grant`.
    pub(crate) fn token_form(&self, grant: &Grant) -> Vec<(&'static str, String)> {
        let mut form = vec![
            ("client_id", self.client_id.clone()),
            ("client_secret", self.client_secret.clone()),
            ("grant_type", grant.grant_type().to_string()),
        ];

        match grant {
            Grant::Password { username, password } => {
                form.push(("username", username.clone()));
                form.push(("password", password.clone()));
            }
            Grant::RefreshToken(token) => form.push(("refresh_token", token.clone())),
        }

        form
    }

    /// Keep the refresh token handed out by a successful grant.
    pub(crate) fn absorb(&mut self, grant: &Grant, token: &TokenResponse) -> Result<()> {
        match (&token.refresh_token, grant) {
            (Some(refresh), _) => {
                self.refresh_token = Some(refresh.clone());
                Ok(())
            }
            (None, Grant::RefreshToken(_)) => Ok(()),
            (None, Grant::Password { .. }) => Err(PodioError::Authentication {
                message: "token response for password grant has no refresh_token".to_string(),
                status_code: None,
            }),
        }
    }
}

/// The OAuth2 grant used for one token request.
#[derive(Clone, PartialEq, Eq)]
pub(crate) enum Grant {
    Password { username: String, password: String },
    RefreshToken(String),
}

impl Grant {
    pub(crate) fn grant_type(&self) -> &'static str {
        match self {
            Self::Password { .. } => "password",
            Self::RefreshToken(_) => "refresh_token",
        }
    }
}

/// Successful response of the token endpoint.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expires_in: Option<u64>,
}

fn non_empty(value: String) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}

fn required_var(name: &str) -> Result<String> {
    optional_var(name)
        .ok_or_else(|| PodioError::ConfigMissing(format!("{name} environment variable not set")))
}

fn optional_var(name: &str) -> Option<String> {
    env::var(name).ok().and_then(non_empty)
}
