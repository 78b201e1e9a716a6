//! # Promo Codes
//!
//! Config-defined promo codes and their resolution into a discount factor.
//! Resolution never touches pricing state; it only yields the factor that
//! [`crate::pricing::calculate_pricing`] consumes.

use crate::error::{CheckoutError, CheckoutResult};
use crate::pricing::BuyerContext;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const INVALID_CODE_MESSAGE: &str = "Invalid promo code";
pub const NEW_BUSINESS_ONLY_MESSAGE: &str = "This promo code is only for new businesses (<1 year)";
pub const FULLY_REDEEMED_MESSAGE: &str = "This promo code has been fully redeemed";

/// A promo code definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromoCode {
    /// Fraction of the price kept, in (0, 1]
    pub factor: Decimal,

    /// Shown to the buyer when the code is accepted
    pub description: String,

    /// Only businesses under a year old may use it
    #[serde(default)]
    pub requires_new_business: bool,

    /// Total number of redemptions allowed, tracked by a `RedemptionCounter`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limited_quantity: Option<u32>,
}

impl PromoCode {
    pub fn new(factor: Decimal, description: impl Into<String>) -> Self {
        Self {
            factor,
            description: description.into(),
            requires_new_business: false,
            limited_quantity: None,
        }
    }

    /// Builder: restrict to new businesses
    pub fn new_business_only(mut self) -> Self {
        self.requires_new_business = true;
        self
    }

    /// Builder: cap the number of redemptions
    pub fn with_limited_quantity(mut self, quantity: u32) -> Self {
        self.limited_quantity = Some(quantity);
        self
    }
}

/// Outcome of looking up a promo code
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromoValidation {
    pub valid: bool,

    /// Normalized code, when one was recognized
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discount_factor: Option<Decimal>,

    pub message: String,
}

impl PromoValidation {
    pub fn accepted(code: impl Into<String>, promo: &PromoCode) -> Self {
        Self {
            valid: true,
            code: Some(code.into()),
            discount_factor: Some(promo.factor),
            message: promo.description.clone(),
        }
    }

    pub fn rejected(code: Option<String>, message: impl Into<String>) -> Self {
        Self {
            valid: false,
            code,
            discount_factor: None,
            message: message.into(),
        }
    }

    /// The factor to hand to the pricing engine, if the code is usable
    pub fn factor(&self) -> Option<Decimal> {
        if self.valid {
            self.discount_factor
        } else {
            None
        }
    }

    /// Convert a rejection into a typed error
    pub fn into_result(self, raw_code: &str) -> CheckoutResult<Decimal> {
        match self.factor() {
            Some(factor) => Ok(factor),
            None => Err(CheckoutError::InvalidPromoCode {
                code: raw_code.to_string(),
                message: self.message,
            }),
        }
    }
}

/// Trim and lowercase a code as typed by the buyer
pub fn normalize_code(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// Promo codes keyed by normalized code
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PromoTable {
    codes: BTreeMap<String, PromoCode>,
}

impl PromoTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self {
            codes: BTreeMap::new(),
        }
    }

    /// The codes currently running
    pub fn builtin() -> Self {
        Self::new()
            .with_code(
                "newbuddy",
                PromoCode::new(Decimal::new(8, 1), "20% off for new businesses").new_business_only(),
            )
            .with_code(
                "santafe25",
                PromoCode::new(Decimal::new(75, 2), "25% off - Santa Fe Club founding member")
                    .with_limited_quantity(25),
            )
    }

    /// Add a code; the key is normalized first
    pub fn insert(&mut self, code: &str, promo: PromoCode) {
        self.codes.insert(normalize_code(code), promo);
    }

    /// Builder: add a code
    pub fn with_code(mut self, code: &str, promo: PromoCode) -> Self {
        self.insert(code, promo);
        self
    }

    /// Re-key every entry by its normalized code.
    ///
    /// Tables deserialized from config keep the keys as written.
    pub fn normalized(self) -> Self {
        let mut table = Self::new();
        for (code, promo) in self.codes {
            table.insert(&code, promo);
        }
        table
    }

    /// Look up a code as typed by the buyer
    pub fn get(&self, raw: &str) -> Option<&PromoCode> {
        self.codes.get(&normalize_code(raw))
    }

    /// Iterate over normalized codes and their definitions
    pub fn iter(&self) -> impl Iterator<Item = (&String, &PromoCode)> {
        self.codes.iter()
    }

    /// Resolve a code against the buyer's context.
    ///
    /// Capacity is not checked here; see
    /// [`crate::redemption::resolve_with_capacity`].
    pub fn resolve(&self, raw: &str, context: &BuyerContext) -> PromoValidation {
        let code = normalize_code(raw);
        let Some(promo) = self.codes.get(&code) else {
            return PromoValidation::rejected(None, INVALID_CODE_MESSAGE);
        };

        if promo.requires_new_business && !context.new_business {
            return PromoValidation::rejected(Some(code), NEW_BUSINESS_ONLY_MESSAGE);
        }

        PromoValidation::accepted(code, promo)
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_code() {
        let table = PromoTable::builtin();
        let result = table.resolve("BOGUS", &BuyerContext::new());

        assert!(!result.valid);
        assert_eq!(result.message, "Invalid promo code");
        assert_eq!(result.factor(), None);
    }

    #[test]
    fn test_code_is_trimmed_and_case_insensitive() {
        let table = PromoTable::builtin();
        let context = BuyerContext::new().with_new_business(true);
        let result = table.resolve("  NewBuddy ", &context);

        assert!(result.valid);
        assert_eq!(result.code.as_deref(), Some("newbuddy"));
        assert_eq!(result.factor(), Some(Decimal::new(8, 1)));
        assert_eq!(result.message, "20% off for new businesses");
    }

    #[test]
    fn test_new_business_gate() {
        let table = PromoTable::builtin();
        let result = table.resolve("newbuddy", &BuyerContext::new());

        assert!(!result.valid);
        assert_eq!(result.message, NEW_BUSINESS_ONLY_MESSAGE);
        assert_eq!(result.factor(), None);
    }

    #[test]
    fn test_limited_code_resolves_without_counter() {
        let table = PromoTable::builtin();
        let result = table.resolve("SANTAFE25", &BuyerContext::new());

        assert!(result.valid);
        assert_eq!(result.factor(), Some(Decimal::new(75, 2)));
        assert_eq!(table.get("santafe25").unwrap().limited_quantity, Some(25));
    }

    #[test]
    fn test_into_result() {
        let table = PromoTable::builtin();
        let err = table
            .resolve("nope", &BuyerContext::new())
            .into_result("nope")
            .unwrap_err();
        assert!(matches!(err, CheckoutError::InvalidPromoCode { .. }));
    }

    #[test]
    fn test_table_from_toml() {
        let toml_str = r#"
            [WELCOME10]
            factor = 0.9
            description = "10% off"

            [startup]
            factor = 0.5
            description = "Half off"
            requires_new_business = true
            limited_quantity = 3
        "#;
        let table = toml::from_str::<PromoTable>(toml_str).unwrap().normalized();

        assert_eq!(table.len(), 2);
        assert!(table.resolve("welcome10", &BuyerContext::new()).valid);
        assert_eq!(table.get("startup").unwrap().limited_quantity, Some(3));
    }
}
