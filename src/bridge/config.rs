//! Bridge configuration.

use anyhow::{anyhow, Result};
use axum::http::HeaderValue;

const DEFAULT_MARKER: &str = "login-bridge";
const DEFAULT_NAMESPACE: &str = "login_bridge_";
const DEFAULT_LOGIN_URL: &str = "/login";
const DEFAULT_LANDING_URL: &str = "/admin/";
const DEFAULT_TOKEN_TTL_SECONDS: i64 = 5 * 60;
const DEFAULT_SESSION_TTL_SECONDS: i64 = 14 * 24 * 60 * 60;
const DEFAULT_SWEEP_INTERVAL_SECONDS: u64 = 5 * 60;

#[derive(Clone, Debug)]
pub struct BridgeConfig {
    public_url: String,
    marker: String,
    namespace: String,
    login_url: String,
    landing_url: String,
    token_ttl_seconds: i64,
    session_ttl_seconds: i64,
    sweep_interval_seconds: u64,
}

impl BridgeConfig {
    /// `public_url` is the externally visible origin used to build login links.
    #[must_use]
    pub fn new(public_url: String) -> Self {
        Self {
            public_url: public_url.trim_end_matches('/').to_string(),
            marker: DEFAULT_MARKER.to_string(),
            namespace: DEFAULT_NAMESPACE.to_string(),
            login_url: DEFAULT_LOGIN_URL.to_string(),
            landing_url: DEFAULT_LANDING_URL.to_string(),
            token_ttl_seconds: DEFAULT_TOKEN_TTL_SECONDS,
            session_ttl_seconds: DEFAULT_SESSION_TTL_SECONDS,
            sweep_interval_seconds: DEFAULT_SWEEP_INTERVAL_SECONDS,
        }
    }

    #[must_use]
    pub fn with_marker(mut self, marker: String) -> Self {
        self.marker = marker.trim_matches('/').to_string();
        self
    }

    #[must_use]
    pub fn with_namespace(mut self, namespace: String) -> Self {
        self.namespace = namespace;
        self
    }

    #[must_use]
    pub fn with_login_url(mut self, url: String) -> Self {
        self.login_url = url;
        self
    }

    #[must_use]
    pub fn with_landing_url(mut self, url: String) -> Self {
        self.landing_url = url;
        self
    }

    #[must_use]
    pub fn with_token_ttl_seconds(mut self, seconds: i64) -> Self {
        self.token_ttl_seconds = seconds;
        self
    }

    #[must_use]
    pub fn with_session_ttl_seconds(mut self, seconds: i64) -> Self {
        self.session_ttl_seconds = seconds;
        self
    }

    #[must_use]
    pub fn with_sweep_interval_seconds(mut self, seconds: u64) -> Self {
        self.sweep_interval_seconds = seconds;
        self
    }

    #[must_use]
    pub fn public_url(&self) -> &str {
        &self.public_url
    }

    #[must_use]
    pub fn marker(&self) -> &str {
        &self.marker
    }

    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    #[must_use]
    pub fn login_url(&self) -> &str {
        &self.login_url
    }

    #[must_use]
    pub fn landing_url(&self) -> &str {
        &self.landing_url
    }

    #[must_use]
    pub fn token_ttl_seconds(&self) -> i64 {
        self.token_ttl_seconds
    }

    #[must_use]
    pub fn session_ttl_seconds(&self) -> i64 {
        self.session_ttl_seconds
    }

    #[must_use]
    pub fn sweep_interval_seconds(&self) -> u64 {
        self.sweep_interval_seconds
    }

    /// Only mark cookies secure when the bridge is served over HTTPS.
    #[must_use]
    pub fn session_cookie_secure(&self) -> bool {
        self.public_url.starts_with("https://")
    }

    /// Reject settings that would only fail once a request arrives.
    ///
    /// # Errors
    /// Returns an error naming the first invalid setting.
    pub fn validate(&self) -> Result<()> {
        if self.marker.is_empty() || self.marker.contains('/') {
            return Err(anyhow!("marker must be a single non-empty path segment"));
        }
        if self.namespace.is_empty() {
            return Err(anyhow!("namespace must not be empty"));
        }
        for (name, url) in [("login-url", &self.login_url), ("landing-url", &self.landing_url)] {
            if url.is_empty() || HeaderValue::from_str(url).is_err() {
                return Err(anyhow!("{name} is not a valid redirect target: {url:?}"));
            }
        }
        if self.token_ttl_seconds <= 0 {
            return Err(anyhow!("token-ttl-seconds must be positive"));
        }
        if self.session_ttl_seconds <= 0 {
            return Err(anyhow!("session-ttl-seconds must be positive"));
        }
        Ok(())
    }

    /// Shareable link for a stored token.
    #[must_use]
    pub fn bridge_url(&self, endpoint: &str, key: &str) -> String {
        format!("{}/{}/{endpoint}/{key}", self.public_url, self.marker)
    }
}
