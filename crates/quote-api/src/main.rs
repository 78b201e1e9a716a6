//! # Studio Checkout
//!
//! Quote pricing and deposit checkout service.
//!
//! ## Usage
//!
//! ```bash
//! # Set environment variables
//! export STRIPE_SECRET_KEY=sk_test_...
//! export STRIPE_PUBLISHABLE_KEY=pk_test_...
//! export APP_URL=http://localhost:8080
//!
//! # Or run without Stripe
//! export CHECKOUT_MOCK_MODE=true
//!
//! # Run the server
//! studio-checkout
//! ```

use quote_api::{routes, state::AppState};
use tracing::{info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    info!("Studio Checkout v{}", env!("CARGO_PKG_VERSION"));

    let state = AppState::new()?;

    let addr = state.config.socket_addr()?;
    let is_prod = state.config.is_production();

    info!("Environment: {}", state.config.environment);
    info!("Services loaded: {}", state.catalog.services.len());
    info!("Promo codes loaded: {}", state.pricing.promo_codes.len());
    info!("Checkout provider: {}", state.strategy.provider_name());

    let app = routes::create_router(state);

    info!("Listening on http://{}", addr);

    if !is_prod {
        info!("Health: http://{}/health", addr);
        info!("Checkout: POST http://{}/api/stripe/create-checkout-session", addr);
        info!("Pricing: POST http://{}/api/v1/pricing", addr);
    }

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// `LOG_FORMAT=json` switches to structured output
fn init_tracing() {
    let filter = EnvFilter::builder()
        .with_default_directive(Level::INFO.into())
        .from_env_lossy();

    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(fmt::layer())
            .with(filter)
            .init();
    }
}
