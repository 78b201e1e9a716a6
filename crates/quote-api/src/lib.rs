//! # quote-api
//!
//! HTTP API layer for studio-checkout.
//!
//! This crate provides:
//! - Axum-based HTTP server
//! - Deposit checkout for a confirmed quote
//! - Server-side pricing and promo code checks
//!
//! ## Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | GET | `/health` | Health check |
//! | POST | `/api/stripe/create-checkout-session` | Create checkout session |
//! | POST | `/api/v1/checkout` | Create checkout session |
//! | GET | `/api/v1/services` | Service catalog |
//! | POST | `/api/v1/pricing` | Price a selection |
//! | POST | `/api/v1/promo/validate` | Validate a promo code |
//! | GET | `/api/v1/config/public` | Front-end configuration |

pub mod handlers;
pub mod routes;
pub mod state;

pub use routes::create_router;
pub use state::{AppConfig, AppState};
