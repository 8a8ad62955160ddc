use std::time::Duration;

use crate::url::DEFAULT_MAIL_API_BASE_URL;

/// Default `User-Agent` sent with every request.
pub const DEFAULT_USER_AGENT: &str = concat!("mail_api/", env!("CARGO_PKG_VERSION"));

/// Transport configuration for mail API requests.
#[derive(Debug, Clone)]
pub struct MailApiConfig {
    /// Base URL of the backend, without endpoint paths.
    pub base_url: String,
    /// Optional `User-Agent` override.
    pub user_agent: Option<String>,
    /// Optional whole-request timeout.
    pub timeout: Option<Duration>,
}

impl Default for MailApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_MAIL_API_BASE_URL.to_string(),
            user_agent: None,
            timeout: None,
        }
    }
}

impl MailApiConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Effective `User-Agent`, ignoring blank overrides.
    pub fn resolved_user_agent(&self) -> &str {
        self.user_agent
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .unwrap_or(DEFAULT_USER_AGENT)
    }
}
