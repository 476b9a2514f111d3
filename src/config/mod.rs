use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Backend base URL (e.g., "https://api.example.com/prod"). Paths are appended verbatim.
    pub api_url: String,

    /// Hosted identity-provider domain serving login, signup and the token endpoint
    pub auth_url: String,

    /// OAuth client ID registered with the identity provider
    pub user_client_id: String,

    /// Redirect target after sign-in
    pub redirect_signin: String,

    /// Redirect target after sign-out. Falls back to `redirect_signin`.
    #[serde(default)]
    pub redirect_signout: Option<String>,

    /// Verification status poll period in milliseconds
    #[serde(default = "default_poll_interval_ms")]
    pub verify_poll_interval_ms: u64,

    /// File the CLI persists the signed-in token set to
    #[serde(default = "default_session_file")]
    pub session_file: PathBuf,

    /// Refresh the access token this many seconds before it expires
    #[serde(default = "default_refresh_leeway")]
    pub token_refresh_leeway_secs: i64,
}

fn default_poll_interval_ms() -> u64 {
    3000
}

fn default_session_file() -> PathBuf {
    PathBuf::from(".fraud-console-session.json")
}

fn default_refresh_leeway() -> i64 {
    30
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        let config: Self = envy::from_env()?;
        if config.verify_poll_interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "VERIFY_POLL_INTERVAL_MS must be greater than zero".to_string(),
            ));
        }
        Ok(config)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.verify_poll_interval_ms)
    }

    pub fn signout_redirect(&self) -> &str {
        self.redirect_signout
            .as_deref()
            .unwrap_or(&self.redirect_signin)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read configuration from environment: {0}")]
    Env(#[from] envy::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(extra: &[(&str, &str)]) -> Vec<(String, String)> {
        let mut vars = vec![
            ("API_URL".to_string(), "http://api.local".to_string()),
            ("AUTH_URL".to_string(), "http://auth.local".to_string()),
            ("USER_CLIENT_ID".to_string(), "client-1".to_string()),
            ("REDIRECT_SIGNIN".to_string(), "http://localhost:3000/".to_string()),
        ];
        vars.extend(extra.iter().map(|(k, v)| (k.to_string(), v.to_string())));
        vars
    }

    #[test]
    fn test_defaults_applied() {
        let config: AppConfig = envy::from_iter(vars(&[])).unwrap();
        assert_eq!(config.poll_interval(), Duration::from_secs(3));
        assert_eq!(config.session_file, PathBuf::from(".fraud-console-session.json"));
        assert_eq!(config.token_refresh_leeway_secs, 30);
        assert_eq!(config.signout_redirect(), "http://localhost:3000/");
    }

    #[test]
    fn test_overrides() {
        let config: AppConfig = envy::from_iter(vars(&[
            ("VERIFY_POLL_INTERVAL_MS", "500"),
            ("REDIRECT_SIGNOUT", "http://localhost:3000/bye"),
        ]))
        .unwrap();
        assert_eq!(config.poll_interval(), Duration::from_millis(500));
        assert_eq!(config.signout_redirect(), "http://localhost:3000/bye");
    }

    #[test]
    fn test_missing_required_field() {
        let result: Result<AppConfig, _> =
            envy::from_iter(vec![("API_URL".to_string(), "http://api.local".to_string())]);
        assert!(result.is_err());
    }
}
