//! # quote-stripe
//!
//! Stripe checkout adapter for studio-checkout.
//!
//! This crate provides two `CheckoutStrategy` implementations:
//!
//! 1. **StripeCheckoutStrategy** - Stripe Checkout Sessions API
//!    - One deposit line item per quote
//!    - Customer email prefill
//!    - Quote details as string metadata
//!    - Idempotency key on every request
//!
//! 2. **MockCheckoutStrategy** - local development
//!    - No credentials, no network
//!    - Redirects straight to the success page
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use quote_stripe::StripeCheckoutStrategy;
//! use quote_core::CheckoutStrategy;
//!
//! // Create strategy from environment
//! let strategy = StripeCheckoutStrategy::from_env()?;
//!
//! // Create checkout session for the confirmed quote
//! let session = strategy.create_checkout(
//!     &quote,
//!     "https://studio.example/success?session_id={CHECKOUT_SESSION_ID}",
//!     "https://studio.example/cancel",
//! ).await?;
//!
//! // Redirect the buyer to session.checkout_url
//! ```

pub mod checkout;
pub mod config;
pub mod mock;

// Re-exports
pub use checkout::StripeCheckoutStrategy;
pub use config::StripeConfig;
pub use mock::MockCheckoutStrategy;
