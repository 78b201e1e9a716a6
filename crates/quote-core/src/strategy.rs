//! # Checkout Strategy Trait
//!
//! Seam between the quote flow and whichever hosted-checkout provider backs
//! it. The HTTP layer holds one `BoxedCheckoutStrategy` and never knows
//! which provider is behind it.
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │          CheckoutStrategy (trait)           │
//! │  ├── create_checkout()                      │
//! │  └── provider_name()                        │
//! └─────────────────────────────────────────────┘
//!                      ▲
//!          ┌───────────┴───────────┐
//!  ┌───────┴───────┐       ┌───────┴───────┐
//!  │StripeCheckout │       │ MockCheckout  │
//!  │   Strategy    │       │   Strategy    │
//!  └───────────────┘       └───────────────┘
//! ```

use crate::error::CheckoutResult;
use crate::quote::{CheckoutQuote, CheckoutSession};
use async_trait::async_trait;
use std::sync::Arc;

/// Core trait for hosted-checkout providers.
///
/// One call makes exactly one attempt. Implementations must not retry.
#[async_trait]
pub trait CheckoutStrategy: Send + Sync {
    /// Create a checkout session for the quote's deposit.
    ///
    /// # Arguments
    /// * `quote` - The confirmed quote
    /// * `success_url` - URL to redirect after successful payment
    /// * `cancel_url` - URL to redirect if the buyer cancels
    async fn create_checkout(
        &self,
        quote: &CheckoutQuote,
        success_url: &str,
        cancel_url: &str,
    ) -> CheckoutResult<CheckoutSession>;

    /// Get the provider name (for logging and responses).
    fn provider_name(&self) -> &'static str;
}

/// Type alias for a boxed checkout strategy (dynamic dispatch)
pub type BoxedCheckoutStrategy = Arc<dyn CheckoutStrategy>;

/// Redirect targets handed to the provider
#[derive(Debug, Clone)]
pub struct CheckoutUrls {
    /// Base URL of the site (e.g., "https://studio.example")
    pub base_url: String,
    /// Success page path (e.g., "/success")
    pub success_path: String,
    /// Cancel page path (e.g., "/cancel")
    pub cancel_path: String,
}

impl CheckoutUrls {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            success_path: "/success".to_string(),
            cancel_path: "/cancel".to_string(),
        }
    }

    /// Builder: override the success path
    pub fn with_success_path(mut self, path: impl Into<String>) -> Self {
        self.success_path = path.into();
        self
    }

    /// Builder: override the cancel path
    pub fn with_cancel_path(mut self, path: impl Into<String>) -> Self {
        self.cancel_path = path.into();
        self
    }

    pub fn success_url(&self) -> String {
        format!("{}{}", self.base_url, self.success_path)
    }

    pub fn cancel_url(&self) -> String {
        format!("{}{}", self.base_url, self.cancel_path)
    }

    /// Success URL with Stripe's session id placeholder appended
    pub fn success_url_with_session(&self) -> String {
        let url = self.success_url();
        if url.contains('?') {
            format!("{}&session_id={{CHECKOUT_SESSION_ID}}", url)
        } else {
            format!("{}?session_id={{CHECKOUT_SESSION_ID}}", url)
        }
    }
}

impl Default for CheckoutUrls {
    fn default() -> Self {
        Self::new("http://localhost:3000")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checkout_urls() {
        let urls = CheckoutUrls::new("https://studio.example/");

        assert_eq!(urls.success_url(), "https://studio.example/success");
        assert_eq!(urls.cancel_url(), "https://studio.example/cancel");
        assert_eq!(
            urls.success_url_with_session(),
            "https://studio.example/success?session_id={CHECKOUT_SESSION_ID}"
        );
    }

    #[test]
    fn test_custom_paths() {
        let urls = CheckoutUrls::new("https://studio.example")
            .with_success_path("/thanks?ref=quote")
            .with_cancel_path("/#services");

        assert_eq!(urls.cancel_url(), "https://studio.example/#services");
        assert_eq!(
            urls.success_url_with_session(),
            "https://studio.example/thanks?ref=quote&session_id={CHECKOUT_SESSION_ID}"
        );
    }
}
