//! Session and token handling against the hosted identity provider.
//!
//! The [`Session`] is an explicit context object: it is created once, signed in with a
//! [`TokenSet`], and handed to whatever needs a bearer token. Nothing here is global.

use chrono::{DateTime, Duration, Utc};
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;

use crate::config::AppConfig;

/// Scopes requested from the hosted UI.
const SCOPES: &str = "openid email profile fdp/read fdp/write";

/// Tokens issued by the identity provider.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TokenSet {
    pub access_token: String,
    pub id_token: Option<String>,
    pub refresh_token: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl TokenSet {
    /// Build a token set, reading the expiry from the access token when not given.
    pub fn new(access_token: impl Into<String>, refresh_token: Option<String>) -> Self {
        let access_token = access_token.into();
        let expires_at = peek_claims(&access_token)
            .and_then(|c| c.exp)
            .and_then(|exp| DateTime::from_timestamp(exp, 0));
        Self {
            access_token,
            id_token: None,
            refresh_token,
            expires_at,
        }
    }

    /// True when the access token expires within `leeway` of `now`.
    pub fn expires_within(&self, leeway: Duration, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|at| at - leeway <= now)
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    id_token: Option<String>,
    refresh_token: Option<String>,
    expires_in: Option<i64>,
}

impl TokenResponse {
    fn into_token_set(self, previous_refresh: Option<String>) -> TokenSet {
        let mut tokens = TokenSet::new(self.access_token, self.refresh_token.or(previous_refresh));
        tokens.id_token = self.id_token;
        if let Some(secs) = self.expires_in {
            tokens.expires_at = Some(Utc::now() + Duration::seconds(secs));
        }
        tokens
    }
}

#[derive(Debug, Default, Deserialize)]
struct Claims {
    exp: Option<i64>,
    username: Option<String>,
    #[serde(rename = "cognito:username")]
    cognito_username: Option<String>,
    email: Option<String>,
}

/// Read JWT claims without verifying the signature. The backend verifies tokens; the
/// client only needs the expiry and the display name.
fn peek_claims(token: &str) -> Option<Claims> {
    jsonwebtoken::dangerous::insecure_decode::<Claims>(token)
        .ok()
        .map(|data| data.claims)
}

/// Client for the hosted identity provider (authorization-code flow).
#[derive(Clone)]
pub struct IdentityProvider {
    http: Client,
    auth_url: String,
    client_id: String,
    redirect_signin: String,
    redirect_signout: String,
}

impl IdentityProvider {
    pub fn new(
        auth_url: &str,
        client_id: &str,
        redirect_signin: &str,
        redirect_signout: &str,
    ) -> Self {
        Self {
            http: Client::new(),
            auth_url: auth_url.trim_end_matches('/').to_string(),
            client_id: client_id.to_string(),
            redirect_signin: redirect_signin.to_string(),
            redirect_signout: redirect_signout.to_string(),
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            &config.auth_url,
            &config.user_client_id,
            &config.redirect_signin,
            config.signout_redirect(),
        )
    }

    fn hosted_ui_url(&self, page: &str) -> Result<Url, AuthError> {
        Url::parse_with_params(
            &format!("{}/{}", self.auth_url, page),
            &[
                ("client_id", self.client_id.as_str()),
                ("response_type", "code"),
                ("scope", SCOPES),
                ("redirect_uri", self.redirect_signin.as_str()),
            ],
        )
        .map_err(|e| AuthError::InvalidUrl(e.to_string()))
    }

    pub fn login_url(&self) -> Result<Url, AuthError> {
        self.hosted_ui_url("login")
    }

    pub fn signup_url(&self) -> Result<Url, AuthError> {
        self.hosted_ui_url("signup")
    }

    pub fn forgot_password_url(&self) -> Result<Url, AuthError> {
        self.hosted_ui_url("forgotpassword")
    }

    pub fn logout_url(&self) -> Result<Url, AuthError> {
        Url::parse_with_params(
            &format!("{}/logout", self.auth_url),
            &[
                ("client_id", self.client_id.as_str()),
                ("logout_uri", self.redirect_signout.as_str()),
            ],
        )
        .map_err(|e| AuthError::InvalidUrl(e.to_string()))
    }

    /// Exchange the code returned to the sign-in redirect for tokens.
    pub async fn exchange_code(&self, code: &str) -> Result<TokenSet, AuthError> {
        let form = [
            ("grant_type", "authorization_code"),
            ("client_id", self.client_id.as_str()),
            ("code", code),
            ("redirect_uri", self.redirect_signin.as_str()),
        ];
        let response = self.token_request(&form).await?;
        Ok(response.into_token_set(None))
    }

    /// Obtain a fresh access token using a refresh token.
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenSet, AuthError> {
        let form = [
            ("grant_type", "refresh_token"),
            ("client_id", self.client_id.as_str()),
            ("refresh_token", refresh_token),
        ];
        let response = self.token_request(&form).await?;
        Ok(response.into_token_set(Some(refresh_token.to_string())))
    }

    async fn token_request(&self, form: &[(&str, &str)]) -> Result<TokenResponse, AuthError> {
        let url = format!("{}/oauth2/token", self.auth_url);
        tracing::debug!(url = %url, grant_type = form[0].1, "Requesting tokens");

        let response = self.http.post(&url).form(form).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %body, "Token request rejected");
            return Err(AuthError::Rejected {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response.json().await?)
    }
}

/// Persists the signed-in token set between CLI invocations.
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn load(&self) -> Result<Option<TokenSet>, AuthError> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AuthError::Store(e)),
        }
    }

    pub async fn save(&self, tokens: &TokenSet) -> Result<(), AuthError> {
        let bytes = serde_json::to_vec_pretty(tokens)?;
        tokio::fs::write(&self.path, bytes).await?;
        Ok(())
    }

    pub async fn clear(&self) -> Result<(), AuthError> {
        match tokio::fs::remove_file(&self.path).await {
            Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(AuthError::Store(e)),
            _ => Ok(()),
        }
    }
}

/// The caller's authentication state. Sign-in and sign-out are the only writers; every
/// other consumer only reads the access token.
pub struct Session {
    idp: IdentityProvider,
    store: Option<SessionStore>,
    tokens: RwLock<Option<TokenSet>>,
    leeway: Duration,
}

impl Session {
    pub fn new(idp: IdentityProvider, leeway: Duration) -> Self {
        Self {
            idp,
            store: None,
            tokens: RwLock::new(None),
            leeway,
        }
    }

    pub fn with_store(mut self, store: SessionStore) -> Self {
        self.store = Some(store);
        self
    }

    pub fn identity_provider(&self) -> &IdentityProvider {
        &self.idp
    }

    /// Load persisted tokens, if a store is attached and holds any.
    pub async fn restore(&self) -> Result<bool, AuthError> {
        let Some(store) = &self.store else {
            return Ok(false);
        };
        let loaded = store.load().await?;
        let restored = loaded.is_some();
        *self.tokens.write().await = loaded;
        Ok(restored)
    }

    pub async fn sign_in(&self, tokens: TokenSet) -> Result<(), AuthError> {
        if let Some(store) = &self.store {
            store.save(&tokens).await?;
        }
        *self.tokens.write().await = Some(tokens);
        tracing::info!("Signed in");
        Ok(())
    }

    /// Complete the sign-in redirect by exchanging its authorization code.
    pub async fn complete_sign_in(&self, code: &str) -> Result<(), AuthError> {
        let tokens = self.idp.exchange_code(code).await?;
        self.sign_in(tokens).await
    }

    /// Drop all tokens and return the identity provider's logout URL.
    pub async fn sign_out(&self) -> Result<Url, AuthError> {
        *self.tokens.write().await = None;
        if let Some(store) = &self.store {
            store.clear().await?;
        }
        tracing::info!("Signed out");
        self.idp.logout_url()
    }

    /// Signed in with a token that is valid or can be refreshed.
    pub async fn is_authenticated(&self) -> bool {
        match &*self.tokens.read().await {
            Some(tokens) => {
                tokens.refresh_token.is_some() || !tokens.expires_within(Duration::zero(), Utc::now())
            }
            None => false,
        }
    }

    /// Display name from the ID token, falling back to the access token.
    pub async fn username(&self) -> Option<String> {
        let guard = self.tokens.read().await;
        let tokens = guard.as_ref()?;
        let name = [tokens.id_token.as_deref(), Some(tokens.access_token.as_str())]
            .into_iter()
            .flatten()
            .filter_map(peek_claims)
            .find_map(|c| c.cognito_username.or(c.username).or(c.email));
        name
    }

    /// The current access token, refreshed first when it is about to expire.
    pub async fn access_token(&self) -> Result<String, AuthError> {
        let mut guard = self.tokens.write().await;
        let tokens = guard.as_ref().ok_or(AuthError::NotSignedIn)?;

        if !tokens.expires_within(self.leeway, Utc::now()) {
            return Ok(tokens.access_token.clone());
        }

        let Some(refresh_token) = tokens.refresh_token.clone() else {
            return Err(AuthError::Expired);
        };

        tracing::debug!("Access token expiring, refreshing");
        let refreshed = self.idp.refresh(&refresh_token).await?;
        if let Some(store) = &self.store {
            store.save(&refreshed).await?;
        }
        let access_token = refreshed.access_token.clone();
        *guard = Some(refreshed);
        Ok(access_token)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Not signed in")]
    NotSignedIn,

    #[error("Session expired, please sign in again")]
    Expired,

    #[error("Identity provider request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Identity provider rejected the request with status {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("Invalid identity provider URL: {0}")]
    InvalidUrl(String),

    #[error("Session file error: {0}")]
    Store(#[from] std::io::Error),

    #[error("Session file is corrupt: {0}")]
    Parse(#[from] serde_json::Error),
}
