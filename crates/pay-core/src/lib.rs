//! # pay-core
//!
//! Core types and traits for the PayPal Express Checkout client.
//!
//! This crate provides:
//! - `nvp`: the Name-Value-Pair codec (`encode`, `decode`, `NvpFields`, `NvpResponse`)
//! - `Cart` and `LineItemCart` for serializing payment requests
//! - `RedirectTarget`, `CheckoutDetails`, `PaymentResponse` for each checkout step
//! - `Transport` and `ReturnQuery` seams the engine depends on
//! - `CheckoutObserver` hooks for instrumentation
//! - `CheckoutError` for typed error handling
//!
//! ## Example
//!
//! ```rust,ignore
//! use pay_core::{Cart, LineItem, LineItemCart};
//!
//! let cart = LineItemCart::new()
//!     .with_item(LineItem::new("Rang Play RS", 2999, 1))
//!     .with_shipping(true);
//!
//! let fields = cart.serialize("merchant@shop.cz", "CZK", "0");
//! assert_eq!(fields.get("PAYMENTREQUEST_0_AMT"), Some("29.99"));
//! ```

pub mod cart;
pub mod error;
pub mod nvp;
pub mod observer;
pub mod response;
pub mod transport;

// Re-exports for convenience
pub use cart::{format_amount, parse_amount, Cart, LineItem, LineItemCart};
pub use error::{CheckoutError, CheckoutResult, TransportError};
pub use nvp::{NvpApiError, NvpFields, NvpResponse};
pub use observer::{CheckoutObserver, LoggingObserver, SharedObserver};
pub use response::{CheckoutDetails, PaymentOutcome, PaymentResponse, RedirectTarget};
pub use transport::{
    ReturnQuery, SharedTransport, Transport, TransportInfo, TransportRequest, TransportResponse,
};
