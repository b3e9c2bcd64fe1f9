//! # pay-api
//!
//! HTTP API layer for paypal-express-rs.
//!
//! This crate provides:
//! - Axum-based HTTP server
//! - REST endpoints to start and inspect an Express Checkout
//! - The return/cancel callbacks PayPal redirects the buyer to
//!
//! ## Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | GET | `/health` | Health check |
//! | POST | `/api/v1/checkout` | Start checkout, returns the PayPal redirect |
//! | GET | `/api/v1/checkout/{token}` | Checkout details |
//! | GET | `/checkout/return` | Buyer return, completes the payment |
//! | GET | `/checkout/cancel` | Buyer cancelled |

pub mod handlers;
pub mod routes;
pub mod state;

pub use routes::create_router;
pub use state::{AppConfig, AppState};
