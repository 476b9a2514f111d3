use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, Method, StatusCode};
use serde_json::Value;
use std::sync::Arc;

use crate::services::auth::{AuthError, Session};

/// Extra request settings passed alongside a path.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    pub headers: Vec<(String, String)>,
    pub body: Option<Value>,
}

impl RequestOptions {
    pub fn json(body: Value) -> Self {
        Self {
            headers: Vec::new(),
            body: Some(body),
        }
    }
}

/// Authenticated access to the fraud-detection REST backend.
///
/// Every call is a single attempt: no retries, no timeout beyond the transport's, no backoff.
/// When `token` is `None` or empty the implementation obtains one itself.
#[async_trait]
pub trait Backend: Send + Sync {
    async fn get(&self, path: &str, token: Option<&str>, options: RequestOptions) -> Result<Value, ApiError>;

    async fn post(&self, path: &str, token: Option<&str>, options: RequestOptions) -> Result<Value, ApiError>;

    async fn put(&self, path: &str, token: Option<&str>, options: RequestOptions) -> Result<Value, ApiError>;

    /// Tolerates an empty or non-JSON success body, returning `{}`.
    async fn delete(&self, path: &str, token: Option<&str>, options: RequestOptions) -> Result<Value, ApiError>;
}

/// `reqwest` implementation of [`Backend`].
pub struct ApiClient {
    http: Client,
    base_url: String,
    session: Option<Arc<Session>>,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            session: None,
        }
    }

    /// Attach the session used when a call is made without a token.
    pub fn with_session(mut self, session: Arc<Session>) -> Self {
        self.session = Some(session);
        self
    }

    async fn resolve_token(&self, token: Option<&str>) -> Result<String, ApiError> {
        match token.filter(|t| !t.is_empty()) {
            Some(t) => Ok(t.to_string()),
            None => match &self.session {
                Some(session) => Ok(session.access_token().await?),
                None => Err(ApiError::MissingToken),
            },
        }
    }

    fn headers(token: &str, extra: &[(String, String)]) -> Result<HeaderMap, ApiError> {
        let mut headers = HeaderMap::new();
        for (name, value) in extra {
            let name = HeaderName::try_from(name.as_str())
                .map_err(|_| ApiError::InvalidHeader(name.clone()))?;
            let value =
                HeaderValue::try_from(value.as_str()).map_err(|_| ApiError::InvalidHeader(name.to_string()))?;
            headers.insert(name, value);
        }
        let bearer = HeaderValue::try_from(format!("Bearer {token}"))
            .map_err(|_| ApiError::InvalidHeader(AUTHORIZATION.to_string()))?;
        headers.insert(AUTHORIZATION, bearer);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Ok(headers)
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        token: Option<&str>,
        options: RequestOptions,
    ) -> Result<Value, ApiError> {
        let token = self.resolve_token(token).await?;
        let url = format!("{}{}", self.base_url, path);
        tracing::debug!(method = %method, path = %path, "Sending backend request");

        let mut request = self
            .http
            .request(method.clone(), &url)
            .headers(Self::headers(&token, &options.headers)?);
        if method == Method::POST || method == Method::PUT {
            request = request.json(&options.body.unwrap_or_else(|| serde_json::json!({})));
        }

        let response = request.send().await.inspect_err(|e| {
            tracing::error!(method = %method, path = %path, error = %e, "Backend request failed");
        })?;

        let status = response.status();
        let bytes = response.bytes().await?;

        if !status.is_success() {
            tracing::error!(method = %method, path = %path, status = %status, "Backend returned an error");
            return Err(ApiError::Status {
                status,
                body: serde_json::from_slice(&bytes).ok(),
            });
        }

        match serde_json::from_slice(&bytes) {
            Ok(value) => Ok(value),
            Err(_) if method == Method::DELETE => {
                tracing::debug!(path = %path, "DELETE response is not JSON, returning empty object");
                Ok(serde_json::json!({}))
            }
            Err(e) => Err(ApiError::Parse(e)),
        }
    }
}

#[async_trait]
impl Backend for ApiClient {
    async fn get(&self, path: &str, token: Option<&str>, options: RequestOptions) -> Result<Value, ApiError> {
        self.send(Method::GET, path, token, options).await
    }

    async fn post(&self, path: &str, token: Option<&str>, options: RequestOptions) -> Result<Value, ApiError> {
        self.send(Method::POST, path, token, options).await
    }

    async fn put(&self, path: &str, token: Option<&str>, options: RequestOptions) -> Result<Value, ApiError> {
        self.send(Method::PUT, path, token, options).await
    }

    async fn delete(&self, path: &str, token: Option<&str>, options: RequestOptions) -> Result<Value, ApiError> {
        self.send(Method::DELETE, path, token, options).await
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("No access token available")]
    MissingToken,

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("HTTP error! status: {status}")]
    Status { status: StatusCode, body: Option<Value> },

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Failed to parse response body: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid request header: {0}")]
    InvalidHeader(String),
}

impl ApiError {
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Missing or rejected credentials; the user has to sign in again.
    pub fn is_auth(&self) -> bool {
        match self {
            ApiError::MissingToken | ApiError::Auth(_) => true,
            ApiError::Status { status, .. } => *status == StatusCode::UNAUTHORIZED,
            _ => false,
        }
    }

    /// Text for the error banner: the body's `message`, then `error`, then the status code.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Status { status, body } => body
                .as_ref()
                .and_then(|b| {
                    ["message", "error"]
                        .iter()
                        .find_map(|key| b.get(*key).and_then(Value::as_str))
                })
                .map(str::to_string)
                .unwrap_or_else(|| format!("Error: {}", status.as_u16())),
            other => other.to_string(),
        }
    }
}
