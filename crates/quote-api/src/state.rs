//! # Application State
//!
//! Shared state for the Axum application.
//! Contains the checkout strategy, pricing configuration, and promo counter.

use anyhow::Context;
use quote_core::{
    BoxedCheckoutStrategy, BoxedRedemptionCounter, CheckoutUrls, InMemoryRedemptionCounter,
    PricingConfig, ServiceCatalog,
};
use quote_stripe::{MockCheckoutStrategy, StripeCheckoutStrategy};
use std::sync::Arc;

/// Application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Host to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// Public URL of the site, used for redirect targets
    pub base_url: String,
    /// Environment (development, staging, production)
    pub environment: String,
    /// Path of the payment success page
    pub success_path: String,
    /// Path of the payment cancel page
    pub cancel_path: String,
    /// Fake checkout sessions instead of calling Stripe
    pub mock_mode: bool,
    /// Pricing TOML to load instead of the built-in price list
    pub pricing_config: Option<String>,
}

impl AppConfig {
    /// Load from environment variables
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let var = |name: &str| std::env::var(name).ok().filter(|v| !v.trim().is_empty());

        Self {
            host: var("HOST").unwrap_or_else(|| "127.0.0.1".to_string()),
            port: var("PORT").and_then(|p| p.parse().ok()).unwrap_or(8080),
            base_url: var("APP_URL")
                .or_else(|| var("VITE_APP_URL"))
                .unwrap_or_else(|| "http://localhost:8080".to_string()),
            environment: var("ENVIRONMENT").unwrap_or_else(|| "development".to_string()),
            success_path: var("SUCCESS_PATH").unwrap_or_else(|| "/success".to_string()),
            cancel_path: var("CANCEL_PATH").unwrap_or_else(|| "/cancel".to_string()),
            mock_mode: var("CHECKOUT_MOCK_MODE").map(|v| parse_flag(&v)).unwrap_or(false),
            pricing_config: var("PRICING_CONFIG"),
        }
    }

    /// Get the socket address to bind to
    pub fn socket_addr(&self) -> anyhow::Result<std::net::SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("Invalid socket address {}:{}", self.host, self.port))
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    /// Redirect targets built from `base_url`
    pub fn checkout_urls(&self) -> CheckoutUrls {
        CheckoutUrls::new(&self.base_url)
            .with_success_path(&self.success_path)
            .with_cancel_path(&self.cancel_path)
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            base_url: "http://localhost:8080".to_string(),
            environment: "development".to_string(),
            success_path: "/success".to_string(),
            cancel_path: "/cancel".to_string(),
            mock_mode: true,
            pricing_config: None,
        }
    }
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Checkout provider
    pub strategy: BoxedCheckoutStrategy,
    /// Discount policy and promo codes
    pub pricing: Arc<PricingConfig>,
    /// Services the agency sells
    pub catalog: Arc<ServiceCatalog>,
    /// Redemptions of capacity-limited promo codes
    pub redemptions: BoxedRedemptionCounter,
    /// Checkout URLs
    pub urls: CheckoutUrls,
    /// Publishable key for the front end, if Stripe is configured
    pub publishable_key: Option<String>,
    /// Application config
    pub config: AppConfig,
}

impl AppState {
    /// Create a new AppState from the environment.
    ///
    /// Fails fast on missing or malformed Stripe credentials unless mock mode
    /// is on.
    pub fn new() -> anyhow::Result<Self> {
        let config = AppConfig::from_env();
        let pricing = load_pricing_config(config.pricing_config.as_deref())?;

        if config.mock_mode {
            if config.is_production() {
                anyhow::bail!("CHECKOUT_MOCK_MODE cannot be enabled in production");
            }
            tracing::warn!("Mock checkout mode enabled, no payments will be taken");
            return Ok(Self::with_strategy(
                config,
                pricing,
                Arc::new(MockCheckoutStrategy::new()),
                None,
            ));
        }

        let stripe = StripeCheckoutStrategy::from_env()
            .map_err(|e| anyhow::anyhow!("Failed to initialize Stripe: {}", e))?;
        if config.is_production() && stripe.config().is_test_mode() {
            tracing::warn!("Running in production with Stripe test keys");
        }
        let publishable_key = Some(stripe.config().publishable_key.clone());

        Ok(Self::with_strategy(
            config,
            pricing,
            Arc::new(stripe),
            publishable_key,
        ))
    }

    /// Assemble state around an explicit strategy (tests, embedding)
    pub fn with_strategy(
        config: AppConfig,
        pricing: PricingConfig,
        strategy: BoxedCheckoutStrategy,
        publishable_key: Option<String>,
    ) -> Self {
        let redemptions: BoxedRedemptionCounter =
            Arc::new(InMemoryRedemptionCounter::from_table(&pricing.promo_codes));
        Self {
            strategy,
            catalog: Arc::new(pricing.catalog()),
            pricing: Arc::new(pricing),
            redemptions,
            urls: config.checkout_urls(),
            publishable_key,
            config,
        }
    }

    /// Builder: replace the redemption counter
    pub fn with_redemptions(mut self, redemptions: BoxedRedemptionCounter) -> Self {
        self.redemptions = redemptions;
        self
    }

    /// Get success URL with session ID placeholder
    pub fn success_url(&self) -> String {
        self.urls.success_url_with_session()
    }

    /// Get cancel URL
    pub fn cancel_url(&self) -> String {
        self.urls.cancel_url()
    }
}

/// Load pricing config from an explicit path, the default location, or the
/// built-in price list.
fn load_pricing_config(explicit: Option<&str>) -> anyhow::Result<PricingConfig> {
    if let Some(path) = explicit {
        let config = PricingConfig::from_file(path)
            .with_context(|| format!("Failed to load pricing config {}", path))?;
        tracing::info!("Loaded pricing config from {}", path);
        return Ok(config);
    }

    let config_paths = [
        "config/pricing.toml",
        "../config/pricing.toml",
        "../../config/pricing.toml",
    ];

    for path in config_paths {
        if std::path::Path::new(path).exists() {
            let config = PricingConfig::from_file(path)
                .with_context(|| format!("Failed to load pricing config {}", path))?;
            tracing::info!(
                "Loaded {} services and {} promo codes from {}",
                config.services.len(),
                config.promo_codes.len(),
                path
            );
            return Ok(config);
        }
    }

    tracing::warn!("No pricing config found, using built-in price list");
    Ok(PricingConfig::default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_config_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 8080);
        assert!(config.mock_mode);
        assert!(!config.is_production());
    }

    #[test]
    fn test_socket_addr() {
        let config = AppConfig {
            host: "0.0.0.0".to_string(),
            port: 3000,
            ..AppConfig::default()
        };
        assert_eq!(config.socket_addr().unwrap().to_string(), "0.0.0.0:3000");

        let bad = AppConfig {
            host: "not a host".to_string(),
            ..AppConfig::default()
        };
        assert!(bad.socket_addr().is_err());
    }

    #[test]
    fn test_checkout_urls_from_config() {
        let config = AppConfig {
            base_url: "https://studio.example".to_string(),
            cancel_path: "/#services".to_string(),
            ..AppConfig::default()
        };
        let state = AppState::with_strategy(
            config,
            PricingConfig::default(),
            Arc::new(MockCheckoutStrategy::new()),
            None,
        );

        assert_eq!(
            state.success_url(),
            "https://studio.example/success?session_id={CHECKOUT_SESSION_ID}"
        );
        assert_eq!(state.cancel_url(), "https://studio.example/#services");
        assert_eq!(state.catalog.services.len(), 6);
    }

    #[test]
    fn test_parse_flag() {
        assert!(parse_flag("true"));
        assert!(parse_flag(" TRUE "));
        assert!(parse_flag("1"));
        assert!(!parse_flag("false"));
        assert!(!parse_flag("nope"));
    }

    #[test]
    fn test_missing_explicit_pricing_config_fails() {
        assert!(load_pricing_config(Some("/nonexistent/pricing.toml")).is_err());
    }
}
