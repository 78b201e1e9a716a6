//! # quote-wasm
//!
//! WebAssembly bindings for the studio-checkout pricing engine.
//!
//! The quote form prices selections in the browser with the exact engine the
//! server uses, so the figures on screen are the figures sent to checkout.
//!
//! ## Usage (JavaScript)
//!
//! ```javascript
//! import init, { calculate_pricing, validate_promo_code, format_usd } from 'quote-wasm';
//!
//! await init();
//!
//! const promo = validate_promo_code('newbuddy', true);
//! const pricing = calculate_pricing(
//!   { services: [{ id: 'web:landing', name: 'Landing Page', basePrice: 1200, category: 'web' }],
//!     formData: { newBusiness: true, readyToSign: true, promoCode: 'newbuddy' } });
//!
//! console.log('Deposit:', format_usd(pricing.deposit));
//! ```
//!
//! ## Building
//!
//! ```bash
//! wasm-pack build --target web
//! ```

use quote_core::{
    BuyerContext, DiscountPolicy, PricingBreakdown, PromoTable, PromoValidation, ServiceSelection,
};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use wasm_bindgen::prelude::*;

/// Pricing input as the quote form holds it
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PricingInput {
    #[serde(default)]
    pub services: Vec<ServiceSelection>,
    #[serde(default)]
    pub form_data: BuyerContext,
}

/// Rounded breakdown plus how the promo code resolved
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PricingOutput {
    #[serde(flatten)]
    pub pricing: PricingBreakdown,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub promo: Option<PromoValidation>,
}

/// Price a selection against the built-in policy and promo codes.
///
/// Redemption capacity is only known to the server; a code the server later
/// reports as exhausted simply stops discounting there.
pub fn price_selection(input: &PricingInput) -> PricingOutput {
    let context = &input.form_data;
    let promo = context
        .promo_code
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(|code| PromoTable::builtin().resolve(code, context));

    let pricing = quote_core::calculate_pricing(
        &input.services,
        context,
        promo.as_ref().and_then(PromoValidation::factor),
        &DiscountPolicy::default(),
    )
    .rounded();

    PricingOutput { pricing, promo }
}

/// Resolve a code for a buyer with the given new-business flag
pub fn check_promo(code: &str, new_business: bool) -> PromoValidation {
    let context = BuyerContext::new().with_new_business(new_business);
    PromoTable::builtin().resolve(code, &context)
}

/// Format a JS number as dollars, `None` for NaN or infinities
pub fn format_amount(amount: f64) -> Option<String> {
    Decimal::from_f64(amount).map(quote_core::format_usd)
}

/// Calculate the price breakdown for `{services, formData}`
#[wasm_bindgen]
pub fn calculate_pricing(input: JsValue) -> Result<JsValue, JsError> {
    let input: PricingInput = serde_wasm_bindgen::from_value(input)
        .map_err(|e| JsError::new(&format!("Invalid pricing input: {}", e)))?;
    let output = price_selection(&input);
    output
        .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
        .map_err(|e| JsError::new(&format!("Failed to serialize pricing: {}", e)))
}

/// Check a promo code: `{valid, code?, discountFactor?, message}`
#[wasm_bindgen]
pub fn validate_promo_code(code: &str, new_business: bool) -> Result<JsValue, JsError> {
    check_promo(code, new_business)
        .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
        .map_err(|e| JsError::new(&format!("Failed to serialize promo result: {}", e)))
}

/// Format an amount for display, e.g. `$1215.00`
#[wasm_bindgen]
pub fn format_usd(amount: f64) -> Result<String, JsError> {
    format_amount(amount).ok_or_else(|| JsError::new("Amount must be a finite number"))
}

/// Get library version
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(json: serde_json::Value) -> PricingInput {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn test_price_selection_matches_server_engine() {
        let output = price_selection(&input(serde_json::json!({
            "services": [
                {"id": "web:landing", "name": "Landing Page", "basePrice": 1200, "category": "web"},
                {"id": "brand:logo", "name": "Logo Design", "basePrice": 600, "category": "brand"}
            ],
            "formData": {"readyToSign": true, "localMarketHigh": false}
        })));

        assert_eq!(output.pricing.total, Decimal::new(1215, 0));
        assert_eq!(output.pricing.deposit, Decimal::new(6075, 1));
        assert!(output.promo.is_none());
    }

    #[test]
    fn test_price_selection_with_promo() {
        let output = price_selection(&input(serde_json::json!({
            "services": [
                {"id": "web:landing", "name": "Landing Page", "basePrice": 1200, "category": "web"},
                {"id": "brand:logo", "name": "Logo Design", "basePrice": 600, "category": "brand"}
            ],
            "formData": {"newBusiness": true, "readyToSign": true, "promoCode": "NewBuddy"}
        })));

        assert!(output.promo.as_ref().unwrap().valid);
        assert_eq!(output.pricing.total, Decimal::new(972, 0));
    }

    #[test]
    fn test_output_is_flat() {
        let output = price_selection(&PricingInput::default());
        let json = serde_json::to_value(&output).unwrap();
        assert_eq!(json["total"], serde_json::json!(0.0));
        assert!(json.get("promo").is_none());
    }

    #[test]
    fn test_check_promo() {
        assert!(check_promo("santafe25", true).valid);
        let rejected = check_promo("newbuddy", false);
        assert!(!rejected.valid);
        assert_eq!(
            rejected.message,
            "This promo code is only for new businesses (<1 year)"
        );
        assert_eq!(check_promo("nope", true).message, "Invalid promo code");
    }

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(1215.0).as_deref(), Some("$1215.00"));
        assert_eq!(format_amount(455.625).as_deref(), Some("$455.63"));
        assert_eq!(format_amount(f64::NAN), None);
    }

    #[test]
    fn test_version() {
        assert_eq!(version(), env!("CARGO_PKG_VERSION"));
    }
}
