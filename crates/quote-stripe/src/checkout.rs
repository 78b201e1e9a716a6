//! # Stripe Checkout Sessions
//!
//! Turns a confirmed quote into a hosted Stripe Checkout Session charging the
//! project deposit. One request per call; failures come back typed and are
//! never retried here.

use crate::config::StripeConfig;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use quote_core::money::CURRENCY;
use quote_core::{
    CheckoutError, CheckoutMode, CheckoutQuote, CheckoutResult, CheckoutSession, CheckoutStatus,
    CheckoutStrategy,
};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::{debug, error, info, instrument};

const PROVIDER: &str = "stripe";

/// Stripe Checkout Session strategy
///
/// Uses Stripe's hosted checkout page, so card data never touches our server.
pub struct StripeCheckoutStrategy {
    config: StripeConfig,
    client: Client,
}

impl StripeCheckoutStrategy {
    /// Create a new Stripe checkout strategy
    pub fn new(config: StripeConfig) -> CheckoutResult<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| {
                CheckoutError::Configuration(format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(Self { config, client })
    }

    /// Create from environment variables
    pub fn from_env() -> CheckoutResult<Self> {
        let config = StripeConfig::from_env()?;
        Self::new(config)
    }

    pub fn config(&self) -> &StripeConfig {
        &self.config
    }

    /// Build the form-encoded body for `POST /v1/checkout/sessions`.
    ///
    /// The whole deposit is one line item; the individual services are named
    /// in its description and in metadata.
    fn build_form_params(
        quote: &CheckoutQuote,
        success_url: &str,
        cancel_url: &str,
    ) -> CheckoutResult<Vec<(String, String)>> {
        let unit_amount = quote.deposit_cents()?;

        let mut form_params: Vec<(String, String)> = vec![
            ("mode".to_string(), CheckoutMode::Payment.as_str().to_string()),
            ("payment_method_types[0]".to_string(), "card".to_string()),
            ("success_url".to_string(), success_url.to_string()),
            ("cancel_url".to_string(), cancel_url.to_string()),
            (
                "line_items[0][price_data][currency]".to_string(),
                CURRENCY.to_string(),
            ),
            (
                "line_items[0][price_data][unit_amount]".to_string(),
                unit_amount.to_string(),
            ),
            (
                "line_items[0][price_data][product_data][name]".to_string(),
                quote.deposit_label(),
            ),
        ];

        let summary = quote.service_summary();
        if !summary.is_empty() {
            form_params.push((
                "line_items[0][price_data][product_data][description]".to_string(),
                summary,
            ));
        }
        form_params.push(("line_items[0][quantity]".to_string(), "1".to_string()));

        let email = quote.form_data.contact_email.trim();
        if !email.is_empty() {
            form_params.push(("customer_email".to_string(), email.to_string()));
        }

        for (key, value) in quote.metadata() {
            form_params.push((format!("metadata[{}]", key), value));
        }

        Ok(form_params)
    }

    fn transport_error(&self, err: reqwest::Error) -> CheckoutError {
        if err.is_timeout() {
            CheckoutError::Timeout(self.config.timeout.as_secs())
        } else {
            CheckoutError::NetworkError(err.to_string())
        }
    }
}

#[async_trait]
impl CheckoutStrategy for StripeCheckoutStrategy {
    #[instrument(skip(self, quote, success_url, cancel_url), fields(idempotency_key = %quote.idempotency_key))]
    async fn create_checkout(
        &self,
        quote: &CheckoutQuote,
        success_url: &str,
        cancel_url: &str,
    ) -> CheckoutResult<CheckoutSession> {
        quote.validate()?;
        let form_params = Self::build_form_params(quote, success_url, cancel_url)?;
        let amount_cents = quote.deposit_cents()?;

        debug!(
            "Creating Stripe checkout session: {} services, deposit={} cents",
            quote.services.len(),
            amount_cents
        );

        let url = format!("{}/v1/checkout/sessions", self.config.api_base_url);

        let response = self
            .client
            .post(&url)
            .header("Authorization", self.config.auth_header())
            .header("Stripe-Version", &self.config.api_version)
            .header("Idempotency-Key", &quote.idempotency_key)
            .form(&form_params)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| self.transport_error(e))?;

        if !status.is_success() {
            error!("Stripe API error: status={}, body={}", status, body);

            let message = serde_json::from_str::<StripeErrorResponse>(&body)
                .map(|e| e.error.message)
                .unwrap_or_else(|_| format!("HTTP {}: {}", status, body));

            if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
                return Err(CheckoutError::ProviderAuthentication {
                    provider: PROVIDER.to_string(),
                    message,
                });
            }

            return Err(CheckoutError::ProviderError {
                provider: PROVIDER.to_string(),
                status: status.as_u16(),
                message,
            });
        }

        let session_response: StripeCheckoutSessionResponse =
            serde_json::from_str(&body).map_err(|e| {
                CheckoutError::Serialization(format!("Failed to parse Stripe response: {}", e))
            })?;

        let checkout_url = session_response.url.ok_or_else(|| {
            CheckoutError::Serialization(format!(
                "Stripe session {} has no checkout URL",
                session_response.id
            ))
        })?;

        info!(
            "Created Stripe checkout session: id={}, url={}",
            session_response.id, checkout_url
        );

        Ok(CheckoutSession {
            session_id: session_response.id,
            provider: PROVIDER.to_string(),
            checkout_url,
            amount_cents: session_response.amount_total.unwrap_or(amount_cents),
            status: CheckoutStatus::Open,
            expires_at: session_response
                .expires_at
                .and_then(|ts| DateTime::from_timestamp(ts, 0)),
            idempotency_key: quote.idempotency_key.clone(),
            created_at: Utc::now(),
        })
    }

    fn provider_name(&self) -> &'static str {
        PROVIDER
    }
}

// =============================================================================
// Stripe API Types
// =============================================================================

#[derive(Debug, Deserialize)]
struct StripeCheckoutSessionResponse {
    id: String,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    amount_total: Option<i64>,
    #[serde(default)]
    expires_at: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct StripeErrorResponse {
    error: StripeError,
}

#[derive(Debug, Deserialize)]
struct StripeError {
    message: String,
}
