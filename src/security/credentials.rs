//! Credential handling with secure memory.
//!
//! Uses the `secrecy` crate to prevent accidental logging of sensitive values.

use secrecy::{ExposeSecret, SecretBox};
use std::fmt;

/// A secret string that won't be logged or displayed.
///
/// Uses `secrecy::SecretBox` to ensure application passwords and API
/// keys are never accidentally exposed in logs, debug output, or error
/// messages.
pub struct SecretString(SecretBox<str>);

impl SecretString {
    /// Create a new secret string.
    pub fn new(value: impl Into<String>) -> Self {
        Self(SecretBox::new(Box::from(value.into().as_str())))
    }

    /// Expose the secret value for use.
    ///
    /// Only call this when actually using the secret (e.g., in an API request).
    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }
}

impl Clone for SecretString {
    fn clone(&self) -> Self {
        Self::new(self.expose().to_string())
    }
}

impl fmt::Debug for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl fmt::Display for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl From<String> for SecretString {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&str> for SecretString {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Credentials for a WordPress site's REST API.
///
/// `app_password` is a WordPress application password, sent via HTTP
/// basic auth. Requests carrying these credentials go directly to the
/// site, never through a public relay.
#[derive(Clone)]
pub struct WordPressCredentials {
    /// Site root, e.g. `https://example.com`
    pub site_url: String,

    /// WordPress account username
    pub username: String,

    /// Application password (secret)
    pub app_password: SecretString,
}

impl WordPressCredentials {
    /// Create new WordPress credentials.
    pub fn new(
        site_url: impl Into<String>,
        username: impl Into<String>,
        app_password: impl Into<String>,
    ) -> Self {
        Self {
            site_url: site_url.into().trim_end_matches('/').to_string(),
            username: username.into(),
            app_password: SecretString::new(app_password),
        }
    }
}

impl fmt::Debug for WordPressCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WordPressCredentials")
            .field("site_url", &self.site_url)
            .field("username", &self.username)
            .field("app_password", &"[REDACTED]")
            .finish()
    }
}

/// Configuration for an AI service with secure credential handling.
#[derive(Clone)]
pub struct AiCredentials {
    /// API key (secret)
    pub api_key: SecretString,

    /// Model identifier
    pub model: String,

    /// API base URL (optional)
    pub base_url: Option<String>,
}

impl AiCredentials {
    /// Create new AI credentials.
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            api_key: SecretString::new(api_key),
            model: model.into(),
            base_url: None,
        }
    }

    /// Set the base URL.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }
}

impl fmt::Debug for AiCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AiCredentials")
            .field("api_key", &"[REDACTED]")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secret_not_in_debug() {
        let secret = SecretString::new("wp-app-password-value");
        let debug = format!("{:?}", secret);
        assert!(!debug.contains("wp-app"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn test_expose_works() {
        let secret = SecretString::new("wp-app-password-value");
        assert_eq!(secret.expose(), "wp-app-password-value");
    }

    #[test]
    fn test_ai_credentials_redact_key() {
        let creds = AiCredentials::new("sk-super-secret-key", "gpt-4o")
            .with_base_url("https://api.example.com");

        let debug = format!("{:?}", creds);
        assert!(debug.contains("gpt-4o"));
        assert!(debug.contains("https://api.example.com"));
        assert!(!debug.contains("sk-super"));
    }

    #[test]
    fn test_wordpress_credentials_redact_password() {
        let creds = WordPressCredentials::new("https://example.com/", "admin", "hunter2");
        assert_eq!(creds.site_url, "https://example.com");

        let debug = format!("{:?}", creds);
        assert!(debug.contains("admin"));
        assert!(!debug.contains("hunter2"));
    }
}
