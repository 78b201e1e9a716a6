//! # Mock Checkout
//!
//! Stand-in provider for local development (`CHECKOUT_MOCK_MODE=true`).
//! Sessions are never sent anywhere; the redirect goes straight to the
//! success page with a synthetic session id.

use async_trait::async_trait;
use quote_core::{CheckoutQuote, CheckoutResult, CheckoutSession, CheckoutStrategy};
use tracing::{info, instrument};
use uuid::Uuid;

/// Checkout strategy that fakes a successful session
#[derive(Debug, Default, Clone)]
pub struct MockCheckoutStrategy;

impl MockCheckoutStrategy {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl CheckoutStrategy for MockCheckoutStrategy {
    #[instrument(skip(self, quote, success_url, _cancel_url), fields(idempotency_key = %quote.idempotency_key))]
    async fn create_checkout(
        &self,
        quote: &CheckoutQuote,
        success_url: &str,
        _cancel_url: &str,
    ) -> CheckoutResult<CheckoutSession> {
        quote.validate()?;
        let amount_cents = quote.deposit_cents()?;

        let session_id = format!("cs_mock_{}", Uuid::new_v4().simple());
        let checkout_url = success_url.replace("{CHECKOUT_SESSION_ID}", &session_id);

        info!(
            "Created mock checkout session: id={}, deposit={} cents",
            session_id, amount_cents
        );

        Ok(CheckoutSession::new(
            session_id,
            self.provider_name(),
            checkout_url,
            amount_cents,
            quote.idempotency_key.clone(),
        ))
    }

    fn provider_name(&self) -> &'static str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quote_core::{
        calculate_pricing, BuyerContext, CheckoutError, Decimal, DiscountPolicy, IntakeForm,
        ServiceSelection,
    };

    fn quote() -> CheckoutQuote {
        let services = vec![ServiceSelection::new(
            "web:landing",
            "Landing Page",
            Decimal::new(1200, 0),
            "web",
        )];
        let form = IntakeForm {
            business_name: "Juniper Bakery".to_string(),
            contact_email: "owner@juniper.example".to_string(),
            contact_phone: "5055550142".to_string(),
            ..IntakeForm::default()
        };
        let pricing = calculate_pricing(
            &services,
            &BuyerContext::new(),
            None,
            &DiscountPolicy::default(),
        );
        CheckoutQuote::new(services, form, pricing)
    }

    #[tokio::test]
    async fn test_mock_session_redirects_to_success() {
        let session = MockCheckoutStrategy::new()
            .create_checkout(
                &quote(),
                "http://localhost:8080/success?session_id={CHECKOUT_SESSION_ID}",
                "http://localhost:8080/cancel",
            )
            .await
            .unwrap();

        assert!(session.session_id.starts_with("cs_mock_"));
        assert_eq!(
            session.checkout_url,
            format!("http://localhost:8080/success?session_id={}", session.session_id)
        );
        assert_eq!(session.amount_cents, 60000);
        assert_eq!(session.provider, "mock");
    }

    #[tokio::test]
    async fn test_mock_still_validates() {
        let mut quote = quote();
        quote.services.clear();

        let err = MockCheckoutStrategy::new()
            .create_checkout(&quote, "s", "c")
            .await
            .unwrap_err();
        assert!(matches!(err, CheckoutError::Validation { .. }));
    }
}
