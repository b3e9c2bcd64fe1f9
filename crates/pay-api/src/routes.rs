//! # Routes
//!
//! Axum router configuration for the Express Checkout API.

use crate::handlers;
use crate::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

/// Create the main application router
///
/// Routes:
/// - GET  /health - Health check
/// - POST /api/v1/checkout - Start a checkout, returns the PayPal redirect
/// - GET  /api/v1/checkout/{token} - Checkout details
/// - GET  /checkout/return - PayPal return URL, completes the payment
/// - GET  /checkout/cancel - PayPal cancel URL
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Buyer-facing callbacks PayPal redirects to
    let checkout_routes = Router::new()
        .route("/return", get(handlers::checkout_return))
        .route("/cancel", get(handlers::checkout_cancel));

    let api_routes = Router::new()
        .route("/checkout", post(handlers::create_checkout))
        .route("/checkout/{token}", get(handlers::get_checkout));

    Router::new()
        .route("/health", get(handlers::health))
        .route("/", get(handlers::health))
        .nest("/checkout", checkout_routes)
        .nest("/api/v1", api_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::AppConfig;
    use async_trait::async_trait;
    use axum::http::StatusCode;
    use axum_test::TestServer;
    use pay_core::{
        nvp, NvpResponse, Transport, TransportError, TransportInfo, TransportRequest,
        TransportResponse,
    };
    use pay_paypal::{CredentialContext, ExpressCheckout, PayPalCredentials};
    use serde_json::{json, Value};
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    /// Answers each NVP call by its METHOD and keeps what was sent
    #[derive(Default)]
    struct ScriptedTransport {
        replies: HashMap<&'static str, &'static str>,
        methods: Mutex<Vec<String>>,
        sent: Mutex<Vec<NvpResponse>>,
    }

    impl ScriptedTransport {
        fn reply(mut self, method: &'static str, body: &'static str) -> Self {
            self.replies.insert(method, body);
            self
        }

        fn sent_for(&self, method: &str) -> NvpResponse {
            self.sent
                .lock()
                .unwrap()
                .iter()
                .find(|fields| fields.get("METHOD") == Some(method))
                .cloned()
                .unwrap_or_default()
        }
    }

    #[async_trait]
    impl Transport for ScriptedTransport {
        async fn send(
            &self,
            request: &TransportRequest,
        ) -> Result<TransportResponse, TransportError> {
            let fields = nvp::decode(&request.body);
            let method = fields.get("METHOD").unwrap_or_default().to_string();
            self.methods.lock().unwrap().push(method.clone());
            self.sent.lock().unwrap().push(fields);

            match self.replies.get(method.as_str()) {
                Some(body) => Ok(TransportResponse {
                    body: body.to_string(),
                    info: TransportInfo {
                        url: request.url.clone(),
                        status: Some(200),
                        elapsed: Duration::from_millis(1),
                    },
                }),
                None => Err(TransportError::Connect {
                    url: request.url.clone(),
                    message: "connection refused".to_string(),
                }),
            }
        }
    }

    fn server(transport: ScriptedTransport) -> (TestServer, Arc<ScriptedTransport>) {
        let transport = Arc::new(transport);
        let context = CredentialContext::new(PayPalCredentials::new(
            "merchant@shop.cz",
            "api_user",
            "api_pass",
            "api_sig",
        ))
        .unwrap();
        let checkout = ExpressCheckout::new(context, transport.clone());

        let config = AppConfig {
            host: "127.0.0.1".to_string(),
            port: 8080,
            base_url: "https://shop.cz".to_string(),
            environment: "test".to_string(),
        };

        let state = AppState::from_parts(config, checkout);
        (TestServer::new(create_router(state)).unwrap(), transport)
    }

    #[tokio::test]
    async fn test_health() {
        let (server, _) = server(ScriptedTransport::default());

        let response = server.get("/health").await;

        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["sandbox"], true);
    }

    #[tokio::test]
    async fn test_create_checkout() {
        let (server, _) = server(
            ScriptedTransport::default().reply("SetExpressCheckout", "ACK=Success&TOKEN=EC-123"),
        );

        let response = server
            .post("/api/v1/checkout")
            .json(&json!({
                "items": [{ "name": "Book", "unit_amount": 1000, "quantity": 2 }],
                "requires_shipping": true
            }))
            .await;

        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["token"], "EC-123");
        assert_eq!(
            body["approval_url"],
            "https://www.sandbox.paypal.com/cgi-bin/webscr?&cmd=_express-checkout&token=EC-123"
        );
    }

    #[tokio::test]
    async fn test_create_checkout_rejected_by_paypal() {
        let (server, _) = server(ScriptedTransport::default().reply(
            "SetExpressCheckout",
            "ACK=Failure&L_ERRORCODE0=10001&L_LONGMESSAGE0=Internal+Error",
        ));

        let response = server
            .post("/api/v1/checkout")
            .json(&json!({ "items": [{ "name": "Book", "unit_amount": 1000 }] }))
            .await;

        response.assert_status(StatusCode::PAYMENT_REQUIRED);
        let body: Value = response.json();
        assert_eq!(body["code"], 402);
        assert_eq!(body["details"]["errors"][0]["code"], "10001");
        assert!(!response.text().contains("api_pass"));
    }

    #[tokio::test]
    async fn test_create_checkout_without_items() {
        let (server, transport) = server(ScriptedTransport::default());

        let response = server.post("/api/v1/checkout").json(&json!({ "items": [] })).await;

        response.assert_status(StatusCode::BAD_REQUEST);
        assert!(transport.methods.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_checkout_details() {
        let (server, _) = server(ScriptedTransport::default().reply(
            "GetExpressCheckoutDetails",
            "ACK=Success&TOKEN=EC-1&PAYERID=PAYER1&CHECKOUTSTATUS=PaymentActionNotInitiated",
        ));

        let response = server.get("/api/v1/checkout/EC-1").await;

        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["ack"], "Success");
        assert_eq!(body["payer_id"], "PAYER1");
        assert_eq!(body["payment_completed"], false);
        assert_eq!(body["fields"]["TOKEN"], "EC-1");
    }

    #[tokio::test]
    async fn test_return_completes_payment() {
        let (server, transport) = server(
            ScriptedTransport::default()
                .reply(
                    "GetExpressCheckoutDetails",
                    "ACK=Success&TOKEN=EC-1&PAYERID=PAYER1&PAYMENTREQUEST_0_AMT=20.00\
                     &PAYMENTREQUEST_0_ITEMAMT=18.00&PAYMENTREQUEST_0_HANDLINGAMT=2.00",
                )
                .reply(
                    "DoExpressCheckoutPayment",
                    "ACK=Success&TOKEN=EC-1&PAYMENTINFO_0_TRANSACTIONID=TX-1",
                ),
        );

        let response = server
            .get("/checkout/return")
            .add_query_param("token", "EC-1")
            .add_query_param("PayerID", "PAYER1")
            .await;

        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["status"], "completed");
        assert_eq!(body["token"], "EC-1");
        assert_eq!(body["transaction_id"], "TX-1");
        assert_eq!(
            *transport.methods.lock().unwrap(),
            ["GetExpressCheckoutDetails", "DoExpressCheckoutPayment"]
        );

        let payment = transport.sent_for("DoExpressCheckoutPayment");
        assert_eq!(payment.get("TOKEN"), Some("EC-1"));
        assert_eq!(payment.get("PAYERID"), Some("PAYER1"));
        assert_eq!(payment.get("PAYMENTREQUEST_0_AMT"), Some("20.00"));
        assert_eq!(payment.get("PAYMENTREQUEST_0_ITEMAMT"), Some("18.00"));
        assert_eq!(payment.get("PAYMENTREQUEST_0_HANDLINGAMT"), Some("2.00"));
        assert_eq!(
            payment.get("PAYMENTREQUEST_0_SELLERPAYPALACCOUNTID"),
            Some("merchant@shop.cz")
        );
    }

    #[tokio::test]
    async fn test_return_without_token() {
        let (server, _) = server(ScriptedTransport::default());

        let response = server.get("/checkout/return").await;

        response.assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_return_when_paypal_unreachable() {
        let (server, _) = server(ScriptedTransport::default());

        let response = server
            .get("/checkout/return")
            .add_query_param("token", "EC-1")
            .await;

        response.assert_status(StatusCode::BAD_GATEWAY);
    }

    #[tokio::test]
    async fn test_cancel() {
        let (server, _) = server(ScriptedTransport::default());

        let response = server
            .get("/checkout/cancel")
            .add_query_param("token", "EC-1")
            .await;

        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["status"], "cancelled");
    }
}
