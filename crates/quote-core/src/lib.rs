//! # quote-core
//!
//! Core types and pricing engine for studio-checkout.
//!
//! This crate provides:
//! - `calculate_pricing` and `DiscountPolicy` for the quote calculator
//! - `PromoTable` and `RedemptionCounter` for promo code resolution
//! - `ServiceCatalog` and `ServiceSelection` for the agency's price list
//! - `CheckoutQuote` and `CheckoutSession` for the checkout handoff
//! - `CheckoutStrategy` trait for hosted-checkout providers
//! - `CheckoutError` for typed error handling
//!
//! ## Example
//!
//! ```rust,ignore
//! use quote_core::{calculate_pricing, BuyerContext, PricingConfig};
//!
//! let config = PricingConfig::default();
//! let services = config.catalog().select(&["web:landing", "brand:logo"])?;
//! let context = BuyerContext::new().with_ready_to_sign(true);
//!
//! let pricing = calculate_pricing(&services, &context, None, &config.policy).rounded();
//! assert_eq!(pricing.total.to_string(), "1215.00");
//!
//! // Hand the confirmed quote to a strategy and redirect to session.checkout_url
//! let quote = CheckoutQuote::new(services, form, pricing);
//! let session = strategy.create_checkout(&quote, &urls.success_url_with_session(), &urls.cancel_url()).await?;
//! ```

pub mod config;
pub mod error;
pub mod money;
pub mod pricing;
pub mod promo;
pub mod quote;
pub mod redemption;
pub mod service;
pub mod strategy;

// Re-exports for convenience
pub use config::{ConfigError, PricingConfig};
pub use error::{CheckoutError, CheckoutResult, ErrorKind};
pub use money::{format_usd, round_currency, to_minor_units};
pub use pricing::{calculate_pricing, BuyerContext, DiscountBreakdown, DiscountPolicy, PricingBreakdown};
pub use promo::{normalize_code, PromoCode, PromoTable, PromoValidation};
pub use quote::{CheckoutMode, CheckoutQuote, CheckoutSession, CheckoutStatus, IntakeForm};
pub use redemption::{
    resolve_with_capacity, BoxedRedemptionCounter, InMemoryRedemptionCounter, RedemptionCounter,
};
pub use service::{
    validate_selections, ServiceCatalog, ServiceOffering, ServiceSelection, MAX_BASE_PRICE,
};
pub use strategy::{BoxedCheckoutStrategy, CheckoutStrategy, CheckoutUrls};

// Downstream crates name amounts without depending on rust_decimal directly.
pub use rust_decimal::Decimal;
