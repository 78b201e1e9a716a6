//! # Request Handlers
//!
//! Axum request handlers for the quote and checkout API.

use crate::state::AppState;
use axum::{
    extract::{rejection::JsonRejection, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse},
    Json,
};
use quote_core::{
    calculate_pricing, format_usd, normalize_code, resolve_with_capacity, validate_selections,
    BuyerContext, CheckoutError, CheckoutQuote, PricingBreakdown, PromoValidation,
    ServiceSelection,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, error, info, instrument, warn};

// =============================================================================
// Request/Response Types
// =============================================================================

/// Create checkout response
#[derive(Debug, Serialize, Deserialize)]
pub struct CreateCheckoutResponse {
    /// Session ID
    pub id: String,
    /// Checkout URL (redirect the buyer here)
    pub url: String,
}

/// Error response
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub message: String,
    pub code: u16,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>, code: u16) -> Self {
        Self {
            message: message.into(),
            code,
        }
    }
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn checkout_error_to_response(err: CheckoutError) -> ApiError {
    let code = err.status_code();
    let response = ErrorResponse::new(err.public_message(), code);
    (
        StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
        Json(response),
    )
}

fn rejection_to_response(rejection: JsonRejection) -> ApiError {
    warn!("Rejected request body: {}", rejection.body_text());
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse::new(
            format!("Invalid request body: {}", rejection.body_text()),
            400,
        )),
    )
}

/// Pricing request: either full selections or catalog ids
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PricingRequest {
    #[serde(default)]
    pub services: Vec<ServiceSelection>,
    #[serde(default)]
    pub service_ids: Vec<String>,
    #[serde(default)]
    pub form_data: BuyerContext,
}

/// Amounts pre-formatted for display
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PricingDisplay {
    pub subtotal: String,
    pub discounts: String,
    pub total: String,
    pub deposit: String,
    pub remaining: String,
}

impl From<&PricingBreakdown> for PricingDisplay {
    fn from(p: &PricingBreakdown) -> Self {
        Self {
            subtotal: format_usd(p.subtotal),
            discounts: format_usd(p.discounts.total),
            total: format_usd(p.total),
            deposit: format_usd(p.deposit),
            remaining: format_usd(p.remaining),
        }
    }
}

/// Pricing response
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PricingResponse {
    pub services: Vec<ServiceSelection>,
    pub pricing: PricingBreakdown,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub promo: Option<PromoValidation>,
    pub display: PricingDisplay,
}

/// Promo validation request
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromoRequest {
    pub code: String,
    #[serde(default)]
    pub new_business: bool,
}

// =============================================================================
// Handlers
// =============================================================================

/// Health check endpoint
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "studio-checkout",
        "version": env!("CARGO_PKG_VERSION"),
        "provider": state.strategy.provider_name(),
    }))
}

/// Create a checkout session for the deposit on a confirmed quote
#[instrument(skip(state, payload))]
pub async fn create_checkout(
    State(state): State<AppState>,
    payload: Result<Json<CheckoutQuote>, JsonRejection>,
) -> Result<Json<CreateCheckoutResponse>, ApiError> {
    let Json(quote) = payload.map_err(rejection_to_response)?;

    quote.form_data.validate().map_err(|e| {
        debug!("Intake form rejected: {}", e);
        checkout_error_to_response(e)
    })?;

    quote.validate().map_err(checkout_error_to_response)?;

    // An unusable code is logged but does not block the deposit; the buyer was
    // shown this pricing. A limited code that was applied claims its slot now.
    let mut claimed: Option<String> = None;
    if let Some(code) = quote.promo_code() {
        let validation = state
            .pricing
            .promo_codes
            .resolve(code, &quote.form_data.context);
        let limited = state
            .pricing
            .promo_codes
            .get(code)
            .map(|p| p.limited_quantity.is_some())
            .unwrap_or(false);

        if !validation.valid {
            warn!("Checkout with unusable promo code {}: {}", code, validation.message);
        } else if limited && !quote.pricing.discounts.new_sba.is_zero() {
            state.redemptions.record_redemption(code).await.map_err(|e| {
                warn!("Could not claim promo slot for {}: {}", code, e);
                checkout_error_to_response(e)
            })?;
            claimed = validation.code;
        }
    }

    let success_url = state.success_url();
    let cancel_url = state.cancel_url();

    info!(
        "Creating checkout: {} services, total={}, deposit={}, provider={}",
        quote.services.len(),
        format_usd(quote.pricing.total),
        format_usd(quote.pricing.deposit),
        state.strategy.provider_name()
    );

    let session = match state
        .strategy
        .create_checkout(&quote, &success_url, &cancel_url)
        .await
    {
        Ok(session) => session,
        Err(e) => {
            error!("Failed to create checkout: {}", e);
            if let Some(code) = &claimed {
                if let Err(release_err) = state.redemptions.release_redemption(code).await {
                    error!("Failed to release promo slot for {}: {}", code, release_err);
                }
            }
            return Err(checkout_error_to_response(e));
        }
    };

    info!("Created checkout session: {}", session.session_id);

    Ok(Json(CreateCheckoutResponse {
        id: session.session_id,
        url: session.checkout_url,
    }))
}

/// Price a selection server-side with the same engine the browser runs
#[instrument(skip(state, payload))]
pub async fn calculate_price(
    State(state): State<AppState>,
    payload: Result<Json<PricingRequest>, JsonRejection>,
) -> Result<Json<PricingResponse>, ApiError> {
    let Json(request) = payload.map_err(rejection_to_response)?;

    let services = if request.service_ids.is_empty() {
        validate_selections(&request.services).map_err(checkout_error_to_response)?;
        request.services
    } else {
        state
            .catalog
            .select(&request.service_ids)
            .map_err(checkout_error_to_response)?
    };

    let context = request.form_data;
    let promo = match context.promo_code.as_deref().map(str::trim) {
        Some(code) if !code.is_empty() => Some(
            resolve_with_capacity(
                &state.pricing.promo_codes,
                state.redemptions.as_ref(),
                code,
                &context,
            )
            .await
            .map_err(checkout_error_to_response)?,
        ),
        _ => None,
    };
    if let Some(p) = promo.as_ref().filter(|p| !p.valid) {
        debug!("Promo code rejected: {}", p.message);
    }

    let pricing = calculate_pricing(
        &services,
        &context,
        promo.as_ref().and_then(PromoValidation::factor),
        &state.pricing.policy,
    )
    .rounded();

    Ok(Json(PricingResponse {
        display: PricingDisplay::from(&pricing),
        services,
        pricing,
        promo,
    }))
}

/// Check a promo code, including remaining capacity
#[instrument(skip(state, payload))]
pub async fn validate_promo(
    State(state): State<AppState>,
    payload: Result<Json<PromoRequest>, JsonRejection>,
) -> Result<Json<PromoValidation>, ApiError> {
    let Json(request) = payload.map_err(rejection_to_response)?;
    let context = BuyerContext::new().with_new_business(request.new_business);

    let validation = resolve_with_capacity(
        &state.pricing.promo_codes,
        state.redemptions.as_ref(),
        &request.code,
        &context,
    )
    .await
    .map_err(checkout_error_to_response)?;

    if !validation.valid {
        debug!(
            "Promo code {} rejected: {}",
            normalize_code(&request.code),
            validation.message
        );
    }

    Ok(Json(validation))
}

/// Service catalog, grouped by category
pub async fn list_services(State(state): State<AppState>) -> impl IntoResponse {
    let services: Vec<_> = state.catalog.active_services().collect();
    Json(serde_json::json!({
        "categories": state.catalog.by_category(),
        "services": services,
        "count": services.len()
    }))
}

/// Values the front end needs before it can start checkout
pub async fn public_config(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "publishableKey": state.publishable_key,
        "mockMode": state.config.mock_mode,
        "provider": state.strategy.provider_name(),
        "depositFraction": state.pricing.policy.deposit_fraction,
    }))
}

/// Checkout success page
pub async fn checkout_success(Query(params): Query<HashMap<String, String>>) -> impl IntoResponse {
    let session_id = params
        .get("session_id")
        .map(|s| escape_html(s))
        .unwrap_or_else(|| "unknown".to_string());
    Html(format!(
        r#"
<!DOCTYPE html>
<html>
<head><title>Deposit Received</title></head>
<body style="font-family: system-ui; display: flex; justify-content: center; align-items: center; height: 100vh; margin: 0; background: #f4f1ea;">
    <div style="background: white; padding: 60px; border-radius: 16px; text-align: center;">
        <h1>Deposit received</h1>
        <p>Reference: <code>{}</code></p>
        <p style="color: #666;">We'll be in touch within one business day to kick off your project.</p>
    </div>
</body>
</html>
"#,
        session_id
    ))
}

/// Checkout cancel page
pub async fn checkout_cancel() -> impl IntoResponse {
    Html(
        r#"
<!DOCTYPE html>
<html>
<head><title>Checkout Cancelled</title></head>
<body style="font-family: system-ui; display: flex; justify-content: center; align-items: center; height: 100vh; margin: 0; background: #f4f1ea;">
    <div style="background: white; padding: 60px; border-radius: 16px; text-align: center;">
        <h1>Checkout cancelled</h1>
        <p style="color: #666;">No charges were made. Your quote is still waiting for you.</p>
    </div>
</body>
</html>
"#,
    )
}

fn escape_html(raw: &str) -> String {
    raw.chars()
        .map(|c| match c {
            '<' => "&lt;".to_string(),
            '>' => "&gt;".to_string(),
            '&' => "&amp;".to_string(),
            '"' => "&quot;".to_string(),
            '\'' => "&#39;".to_string(),
            c => c.to_string(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use quote_core::Decimal;

    #[test]
    fn test_error_response() {
        let err = ErrorResponse::new("Test error", 400);
        assert_eq!(err.message, "Test error");
        assert_eq!(err.code, 400);
    }

    #[test]
    fn test_checkout_error_conversion() {
        let (status, Json(body)) =
            checkout_error_to_response(CheckoutError::validation("contactEmail", "is required"));
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.code, 400);

        let (status, Json(body)) = checkout_error_to_response(CheckoutError::ProviderError {
            provider: "stripe".to_string(),
            status: 500,
            message: "sk_test_leak".to_string(),
        });
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert!(!body.message.contains("sk_test_leak"));
    }

    #[test]
    fn test_pricing_display() {
        let pricing = PricingBreakdown {
            subtotal: Decimal::new(1800, 0),
            total: Decimal::new(1215, 0),
            deposit: Decimal::new(6075, 1),
            remaining: Decimal::new(6075, 1),
            ..PricingBreakdown::default()
        };
        let display = PricingDisplay::from(&pricing);
        assert_eq!(display.total, "$1215.00");
        assert_eq!(display.deposit, "$607.50");
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html("cs_<b>\"x\""), "cs_&lt;b&gt;&quot;x&quot;");
    }
}
