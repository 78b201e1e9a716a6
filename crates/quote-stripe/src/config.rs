//! # Stripe Configuration
//!
//! Configuration management for Stripe integration.
//! All secrets are loaded from environment variables.

use quote_core::CheckoutError;
use std::env;
use std::time::Duration;

pub const DEFAULT_API_BASE_URL: &str = "https://api.stripe.com";
pub const DEFAULT_API_VERSION: &str = "2024-12-18.acacia";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

/// Stripe API configuration
#[derive(Clone)]
pub struct StripeConfig {
    /// Secret API key (sk_test_... or sk_live_...)
    pub secret_key: String,

    /// Publishable key (pk_test_... or pk_live_...), handed to the front end
    pub publishable_key: String,

    /// API base URL (for testing/mocking)
    pub api_base_url: String,

    /// API version
    pub api_version: String,

    /// Upper bound on one session-creation call
    pub timeout: Duration,
}

impl std::fmt::Debug for StripeConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StripeConfig")
            .field("secret_key", &"[redacted]")
            .field("publishable_key", &self.publishable_key)
            .field("api_base_url", &self.api_base_url)
            .field("api_version", &self.api_version)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl StripeConfig {
    /// Load configuration from environment variables.
    ///
    /// Required env vars:
    /// - `STRIPE_SECRET_KEY`
    /// - `STRIPE_PUBLISHABLE_KEY` (or `VITE_STRIPE_PUBLISHABLE_KEY`)
    pub fn from_env() -> Result<Self, CheckoutError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let secret_key = env::var("STRIPE_SECRET_KEY").map_err(|_| {
            CheckoutError::Configuration("STRIPE_SECRET_KEY not set".to_string())
        })?;

        let publishable_key = env::var("STRIPE_PUBLISHABLE_KEY")
            .or_else(|_| env::var("VITE_STRIPE_PUBLISHABLE_KEY"))
            .map_err(|_| {
                CheckoutError::Configuration("STRIPE_PUBLISHABLE_KEY not set".to_string())
            })?;

        let config = Self::new(secret_key, publishable_key);
        config.validate()?;
        Ok(config)
    }

    /// Create config with explicit values (for testing)
    pub fn new(secret_key: impl Into<String>, publishable_key: impl Into<String>) -> Self {
        Self {
            secret_key: secret_key.into(),
            publishable_key: publishable_key.into(),
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            api_version: DEFAULT_API_VERSION.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Validate key formats
    pub fn validate(&self) -> Result<(), CheckoutError> {
        if !self.secret_key.starts_with("sk_test_") && !self.secret_key.starts_with("sk_live_") {
            return Err(CheckoutError::Configuration(
                "STRIPE_SECRET_KEY must start with sk_test_ or sk_live_".to_string(),
            ));
        }

        if !self.publishable_key.starts_with("pk_test_")
            && !self.publishable_key.starts_with("pk_live_")
        {
            return Err(CheckoutError::Configuration(
                "STRIPE_PUBLISHABLE_KEY must start with pk_test_ or pk_live_".to_string(),
            ));
        }

        if self.is_test_mode() != self.publishable_key.starts_with("pk_test_") {
            return Err(CheckoutError::Configuration(
                "Stripe secret and publishable keys are from different modes".to_string(),
            ));
        }

        Ok(())
    }

    /// Check if using test keys
    pub fn is_test_mode(&self) -> bool {
        self.secret_key.starts_with("sk_test_")
    }

    /// Check if using live keys
    pub fn is_live_mode(&self) -> bool {
        self.secret_key.starts_with("sk_live_")
    }

    /// Get authorization header value
    pub fn auth_header(&self) -> String {
        format!("Bearer {}", self.secret_key)
    }

    /// Builder: set custom API base URL (for testing)
    pub fn with_api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into();
        self
    }

    /// Builder: set request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_validation() {
        let config = StripeConfig::new("sk_test_abc123", "pk_test_xyz789");
        assert!(config.validate().is_ok());
        assert!(config.is_test_mode());
        assert!(!config.is_live_mode());

        let config = StripeConfig::new("sk_live_abc123", "pk_live_xyz789");
        assert!(config.validate().is_ok());
        assert!(config.is_live_mode());

        assert!(StripeConfig::new("rk_test_abc", "pk_test_xyz").validate().is_err());
        assert!(StripeConfig::new("sk_test_abc", "xyz").validate().is_err());
        assert!(StripeConfig::new("sk_live_abc", "pk_test_xyz").validate().is_err());
    }

    #[test]
    fn test_auth_header() {
        let config = StripeConfig::new("sk_test_abc123", "pk_test_xyz789");
        assert_eq!(config.auth_header(), "Bearer sk_test_abc123");
    }

    #[test]
    fn test_debug_redacts_secret() {
        let config = StripeConfig::new("sk_test_supersecret", "pk_test_xyz789");
        let printed = format!("{:?}", config);
        assert!(!printed.contains("supersecret"));
        assert!(printed.contains("pk_test_xyz789"));
    }

    #[test]
    fn test_defaults() {
        let config = StripeConfig::new("sk_test_abc123", "pk_test_xyz789")
            .with_api_base_url("http://127.0.0.1:12111")
            .with_timeout(Duration::from_secs(2));
        assert_eq!(config.api_base_url, "http://127.0.0.1:12111");
        assert_eq!(config.api_version, DEFAULT_API_VERSION);
        assert_eq!(config.timeout, Duration::from_secs(2));
    }
}
