//! # Checkout Observers
//!
//! Hooks fired around every NVP call, for external instrumentation.
//! Observers are notified but never change the outcome of a call.

use crate::error::TransportError;
use crate::nvp::{NvpFields, NvpResponse};
use crate::transport::TransportInfo;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Observer of NVP traffic.
///
/// Implement the hooks you need; all default to no-ops.
#[allow(unused_variables)]
pub trait CheckoutObserver: Send + Sync {
    /// Called before sending, with the operation fields (no credentials)
    fn on_request(&self, fields: &NvpFields) {}

    /// Called after a response body was received and decoded
    fn on_success(&self, response: &NvpResponse, info: &TransportInfo) {}

    /// Called after a transport failure, before it is raised
    fn on_error(&self, error: &TransportError) {}
}

/// Type alias for a shared observer
pub type SharedObserver = Arc<dyn CheckoutObserver>;

/// Observer that writes every hook to the tracing log
pub struct LoggingObserver;

impl CheckoutObserver for LoggingObserver {
    fn on_request(&self, fields: &NvpFields) {
        debug!(
            "NVP request: method={}, fields={}",
            fields.get("METHOD").unwrap_or("?"),
            fields.len()
        );
    }

    fn on_success(&self, response: &NvpResponse, info: &TransportInfo) {
        info!(
            "NVP response: ack={}, correlation_id={}, status={:?}, elapsed={:?}",
            response.ack().unwrap_or("?"),
            response.correlation_id().unwrap_or("-"),
            info.status,
            info.elapsed
        );
    }

    fn on_error(&self, error: &TransportError) {
        warn!("NVP transport error: {}", error);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_default_hooks_are_noops() {
        struct Silent;
        impl CheckoutObserver for Silent {}

        let observer: SharedObserver = Arc::new(Silent);
        observer.on_request(&NvpFields::new());
        observer.on_error(&TransportError::Timeout {
            url: "https://api-3t.paypal.com/nvp".into(),
        });
    }

    #[test]
    fn test_custom_observer() {
        struct Counting {
            requests: AtomicUsize,
        }

        impl CheckoutObserver for Counting {
            fn on_request(&self, _fields: &NvpFields) {
                self.requests.fetch_add(1, Ordering::SeqCst);
            }
        }

        let observer = Counting {
            requests: AtomicUsize::new(0),
        };
        observer.on_request(&NvpFields::new().with("METHOD", "GetExpressCheckoutDetails"));
        LoggingObserver.on_request(&NvpFields::new());

        assert_eq!(observer.requests.load(Ordering::SeqCst), 1);
    }
}
