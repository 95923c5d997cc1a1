//! Client configuration.
//!
//! Replaces implicit process-wide session state: a `ClientConfig` is built
//! once, handed to the client, and supplies the base URL and credentials for
//! every request the client builds.

use std::fmt;
use std::time::Duration;

use crate::error::ApiError;

pub const DEFAULT_BASE_URL: &str = "https://api.hubapi.com";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

const ENV_ACCESS_TOKEN: &str = "HUBSPOT_ACCESS_TOKEN";
const ENV_BASE_URL: &str = "HUBSPOT_BASE_URL";
const ENV_TIMEOUT_SECS: &str = "HUBSPOT_TIMEOUT_SECS";

#[derive(Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub base_url: String,
    pub access_token: String,
    /// Budget for a single round trip. Enforced by the transport.
    pub timeout: Duration,
}

impl ClientConfig {
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            access_token: access_token.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Build a config from `HUBSPOT_ACCESS_TOKEN`, `HUBSPOT_BASE_URL` and
    /// `HUBSPOT_TIMEOUT_SECS`.
    pub fn from_env() -> Result<Self, ApiError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ApiError> {
        let token = lookup(ENV_ACCESS_TOKEN)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ApiError::Config(format!("{ENV_ACCESS_TOKEN} is not set")))?;
        let mut config = Self::new(token);
        if let Some(url) = lookup(ENV_BASE_URL) {
            config = config.base_url(&url);
        }
        if let Some(secs) = lookup(ENV_TIMEOUT_SECS) {
            let secs: u64 = secs
                .parse()
                .map_err(|_| ApiError::Config(format!("{ENV_TIMEOUT_SECS} is not a number: {secs:?}")))?;
            config = config.timeout(Duration::from_secs(secs));
        }
        Ok(config)
    }

    /// Root of the CRM endpoints.
    pub(crate) fn crm_base(&self) -> String {
        format!("{}/crm", self.base_url)
    }

    /// Headers every request carries.
    pub(crate) fn auth_headers(&self) -> Vec<(String, String)> {
        vec![(
            "authorization".to_string(),
            format!("Bearer {}", self.access_token),
        )]
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("base_url", &self.base_url)
            .field("access_token", &"<redacted>")
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn trailing_slash_is_stripped() {
        let config = ClientConfig::new("t").base_url("http://localhost:3000/");
        assert_eq!(config.base_url, "http://localhost:3000");
        assert_eq!(config.crm_base(), "http://localhost:3000/crm");
    }

    #[test]
    fn defaults() {
        let config = ClientConfig::new("t");
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.timeout, DEFAULT_TIMEOUT);
        assert_eq!(
            config.auth_headers(),
            vec![("authorization".to_string(), "Bearer t".to_string())]
        );
    }

    #[test]
    fn from_env_reads_all_keys() {
        let config = ClientConfig::from_lookup(lookup(&[
            (ENV_ACCESS_TOKEN, "pat-na1-123"),
            (ENV_BASE_URL, "http://127.0.0.1:9000/"),
            (ENV_TIMEOUT_SECS, "5"),
        ]))
        .unwrap();
        assert_eq!(config.access_token, "pat-na1-123");
        assert_eq!(config.base_url, "http://127.0.0.1:9000");
        assert_eq!(config.timeout, Duration::from_secs(5));
    }

    #[test]
    fn from_env_requires_token() {
        let err = ClientConfig::from_lookup(lookup(&[])).unwrap_err();
        assert!(matches!(err, ApiError::Config(_)));
    }

    #[test]
    fn from_env_rejects_bad_timeout() {
        let err = ClientConfig::from_lookup(lookup(&[
            (ENV_ACCESS_TOKEN, "t"),
            (ENV_TIMEOUT_SECS, "soon"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ApiError::Config(_)));
    }

    #[test]
    fn debug_redacts_token() {
        let rendered = format!("{:?}", ClientConfig::new("secret-token"));
        assert!(!rendered.contains("secret-token"));
    }
}
