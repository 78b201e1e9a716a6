//! # Routes
//!
//! Axum router configuration for the quote and checkout API.

use crate::handlers;
use crate::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

/// Create the main application router
///
/// Routes:
/// - Checkout:
///   - POST /api/stripe/create-checkout-session - Create deposit checkout
///   - POST /api/v1/checkout - Same, versioned path
///
/// - Quote:
///   - GET  /api/v1/services - Service catalog
///   - POST /api/v1/pricing - Price a selection
///   - POST /api/v1/promo/validate - Check a promo code
///   - GET  /api/v1/config/public - Publishable key and mode
///
/// - Static pages:
///   - GET /success - Success page
///   - GET /cancel - Cancel page
pub fn create_router(state: AppState) -> Router {
    // TODO: restrict to APP_URL once the front end is served from a fixed origin
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_routes = Router::new()
        .route("/checkout", post(handlers::create_checkout))
        .route("/services", get(handlers::list_services))
        .route("/pricing", post(handlers::calculate_price))
        .route("/promo/validate", post(handlers::validate_promo))
        .route("/config/public", get(handlers::public_config));

    Router::new()
        .route("/health", get(handlers::health))
        .route("/", get(handlers::health))
        .route(
            "/api/stripe/create-checkout-session",
            post(handlers::create_checkout),
        )
        .route("/success", get(handlers::checkout_success))
        .route("/cancel", get(handlers::checkout_cancel))
        .nest("/api/v1", api_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
