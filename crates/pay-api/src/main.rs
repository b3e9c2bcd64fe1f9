//! # PayPal Express
//!
//! HTTP front for PayPal Express Checkout.
//!
//! ## Usage
//!
//! ```bash
//! # Set environment variables
//! export PAYPAL_ACCOUNT=merchant@shop.cz
//! export PAYPAL_USERNAME=...
//! export PAYPAL_PASSWORD=...
//! export PAYPAL_SIGNATURE=...
//! export BASE_URL=https://shop.cz
//!
//! # Run the server
//! paypal-express
//! ```

use pay_api::{routes, state::AppState};
use tracing::{info, warn, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(Level::INFO.into())
                .from_env_lossy(),
        )
        .init();

    print_banner();

    let state = AppState::new()?;

    let addr = state.config.socket_addr()?;
    let is_prod = state.config.is_production();
    let sandbox = state.checkout.context().is_sandbox_host();

    info!("Environment: {}", state.config.environment);
    info!(
        "PayPal: host={}, currency={}",
        state.checkout.context().api_host(),
        state.checkout.context().currency()
    );
    if is_prod && sandbox {
        warn!("Running in production against the PayPal sandbox (set PAYPAL_SANDBOX=false)");
    }

    let app = routes::create_router(state);

    info!("PayPal Express starting on http://{}", addr);

    if !is_prod {
        info!("Health: http://{}/health", addr);
        info!("Checkout: POST http://{}/api/v1/checkout", addr);
        info!("Return: GET http://{}/checkout/return?token=...", addr);
    }

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn print_banner() {
    println!(
        r#"
  PayPal Express
  ━━━━━━━━━━━━━━━━━━━━━━━
  Express Checkout over NVP
  Version: {}

"#,
        env!("CARGO_PKG_VERSION")
    );
}
