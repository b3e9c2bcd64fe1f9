//! # Request Handlers
//!
//! Axum request handlers for the Express Checkout API.

use crate::state::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use pay_core::{CheckoutError, LineItem, LineItemCart, PaymentOutcome};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{error, info, instrument, warn};

// =============================================================================
// Request/Response Types
// =============================================================================

/// Create checkout request
#[derive(Debug, Deserialize)]
pub struct CreateCheckoutRequest {
    /// Items to purchase
    #[serde(default)]
    pub items: Vec<CheckoutItem>,
    /// Shipping in minor units
    #[serde(default)]
    pub shipping_amount: Option<i64>,
    /// Tax in minor units
    #[serde(default)]
    pub tax_amount: Option<i64>,
    /// Ask PayPal for a shipping address
    #[serde(default)]
    pub requires_shipping: Option<bool>,
}

/// Item in checkout request
#[derive(Debug, Deserialize)]
pub struct CheckoutItem {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Price per unit in minor units
    pub unit_amount: i64,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
}

fn default_quantity() -> u32 {
    1
}

/// Create checkout response
#[derive(Debug, Serialize)]
pub struct CreateCheckoutResponse {
    /// Express Checkout token
    pub token: String,
    /// Redirect the buyer here
    pub approval_url: String,
}

/// Checkout details response
#[derive(Debug, Serialize)]
pub struct CheckoutDetailsResponse {
    pub ack: Option<String>,
    pub payer_id: Option<String>,
    pub checkout_status: Option<String>,
    pub payment_completed: bool,
    /// Every decoded response field
    pub fields: serde_json::Map<String, serde_json::Value>,
}

/// Buyer return response
#[derive(Debug, Serialize)]
pub struct PaymentReturnResponse {
    /// `completed` or `already_completed`
    pub status: &'static str,
    pub token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<String>,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, code: u16) -> Self {
        Self {
            error: error.into(),
            code,
            details: None,
        }
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn bad_request(message: impl Into<String>) -> ApiError {
    (StatusCode::BAD_REQUEST, Json(ErrorResponse::new(message, 400)))
}

/// API rejections expose PayPal's error entries; the request map never leaves the server
fn checkout_error_to_response(err: CheckoutError) -> ApiError {
    let code = err.status_code();
    let mut response = ErrorResponse::new(err.to_string(), code);

    if let Some(api_response) = err.response() {
        let errors = api_response.errors();
        if !errors.is_empty() {
            response = response.with_details(serde_json::json!({ "errors": errors }));
        }
    }

    (
        StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
        Json(response),
    )
}

fn build_cart(request: CreateCheckoutRequest) -> Result<LineItemCart, ApiError> {
    if request.items.is_empty() {
        return Err(bad_request("No items in checkout request"));
    }

    let shipping_amount = request.shipping_amount.unwrap_or(0);
    let tax_amount = request.tax_amount.unwrap_or(0);
    if shipping_amount < 0 || tax_amount < 0 {
        return Err(bad_request("Shipping and tax amounts must not be negative"));
    }

    let mut cart = LineItemCart::new()
        .with_shipping_amount(shipping_amount)
        .with_tax_amount(tax_amount)
        .with_shipping(request.requires_shipping.unwrap_or(false));

    for item in request.items {
        if item.name.trim().is_empty() {
            return Err(bad_request("Item name must not be empty"));
        }
        if item.unit_amount < 0 || item.quantity == 0 {
            return Err(bad_request(format!(
                "Invalid amount or quantity for item: {}",
                item.name
            )));
        }

        let mut line = LineItem::new(item.name, item.unit_amount, item.quantity);
        if let Some(description) = item.description {
            line = line.with_description(description);
        }
        cart.add_item(line);
    }

    if cart.total().is_none() {
        return Err(bad_request("Cart total is out of range"));
    }

    Ok(cart)
}

// =============================================================================
// Handlers
// =============================================================================

/// Health check endpoint
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "paypal-express",
        "version": env!("CARGO_PKG_VERSION"),
        "sandbox": state.checkout.context().is_sandbox_host(),
    }))
}

/// Start an Express Checkout and hand back the buyer redirect
#[instrument(skip(state, request), fields(items = request.items.len()))]
pub async fn create_checkout(
    State(state): State<AppState>,
    Json(request): Json<CreateCheckoutRequest>,
) -> Result<Json<CreateCheckoutResponse>, ApiError> {
    let cart = build_cart(request)?;

    info!(
        "Creating checkout: {} items, total={}, invoice={}",
        cart.item_count(),
        cart.total().map(pay_core::format_amount).unwrap_or_default(),
        cart.invoice_id
    );

    let target = state
        .checkout
        .initiate_checkout(&cart)
        .await
        .map_err(|e| {
            error!("Failed to initiate checkout: {}", e);
            checkout_error_to_response(e)
        })?;

    Ok(Json(CreateCheckoutResponse {
        token: target.token,
        approval_url: target.approval_url,
    }))
}

/// Look up what the buyer approved
#[instrument(skip(state))]
pub async fn get_checkout(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> Result<Json<CheckoutDetailsResponse>, ApiError> {
    let details = state
        .checkout
        .fetch_checkout_details(&token)
        .await
        .map_err(|e| {
            error!("Failed to fetch checkout details: {}", e);
            checkout_error_to_response(e)
        })?;

    let fields = details
        .response()
        .fields()
        .map(|(k, v)| (k.to_string(), serde_json::Value::from(v)))
        .collect();

    Ok(Json(CheckoutDetailsResponse {
        ack: details.response().ack().map(str::to_string),
        payer_id: details.payer_id().map(str::to_string),
        checkout_status: details.checkout_status().map(str::to_string),
        payment_completed: details.is_payment_completed(),
        fields,
    }))
}

/// Buyer came back from PayPal: finish the payment
#[instrument(skip(state, params))]
pub async fn checkout_return(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<PaymentReturnResponse>, ApiError> {
    let outcome = state
        .checkout
        .complete_payment(&params)
        .await
        .map_err(|e| {
            error!("Failed to complete payment: {}", e);
            checkout_error_to_response(e)
        })?;

    let status = match outcome {
        PaymentOutcome::Completed(_) => "completed",
        PaymentOutcome::AlreadyCompleted(_) => "already_completed",
    };

    Ok(Json(PaymentReturnResponse {
        status,
        token: outcome
            .details()
            .token()
            .map(str::to_string)
            .or_else(|| params.get("token").cloned()),
        transaction_id: outcome.transaction_id().map(str::to_string),
    }))
}

/// Buyer cancelled on PayPal
pub async fn checkout_cancel(Query(params): Query<HashMap<String, String>>) -> impl IntoResponse {
    warn!("Checkout cancelled by buyer: token={:?}", params.get("token"));
    Json(serde_json::json!({ "status": "cancelled" }))
}
