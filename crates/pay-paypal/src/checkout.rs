//! # Express Checkout
//!
//! The three-call NVP flow:
//!
//! 1. `SetExpressCheckout` -> redirect the buyer to PayPal
//! 2. `GetExpressCheckoutDetails` -> what the buyer approved
//! 3. `DoExpressCheckoutPayment` -> take the money
//!
//! The engine keeps no state between calls; the caller sequences them.

use crate::config::{CredentialContext, PayPalConfig};
use crate::transport::ReqwestTransport;
use pay_core::{
    nvp, Cart, CheckoutDetails, CheckoutError, CheckoutResult, NvpFields, NvpResponse,
    PaymentOutcome, PaymentResponse, RedirectTarget, ReturnQuery, SharedObserver,
    SharedTransport, TransportRequest,
};
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};

/// Query parameter PayPal appends to the return URL
pub const RETURN_TOKEN_PARAM: &str = "token";

/// Index every cart is serialized at
const CART_INDEX: &str = "0";

/// A request and the response it produced
struct NvpExchange {
    request: NvpFields,
    response: NvpResponse,
}

/// PayPal Express Checkout client
pub struct ExpressCheckout {
    context: CredentialContext,
    transport: SharedTransport,
    observers: Vec<SharedObserver>,
    return_url: String,
    cancel_url: String,
    need_address: bool,
    confirm_shipping: bool,
}

impl ExpressCheckout {
    /// Create a client over an explicit transport
    pub fn new(context: CredentialContext, transport: SharedTransport) -> Self {
        Self {
            context,
            transport,
            observers: Vec::new(),
            return_url: String::new(),
            cancel_url: String::new(),
            need_address: false,
            confirm_shipping: false,
        }
    }

    /// Create a client with the reqwest transport from a loaded config
    pub fn from_config(config: &PayPalConfig) -> CheckoutResult<Self> {
        let context = config.credential_context()?;
        let transport = ReqwestTransport::new(config.timeout())?;

        let mut client = Self::new(context, Arc::new(transport));
        client.need_address = config.need_address;
        client.confirm_shipping = config.confirm_shipping;
        if let Some(ref return_url) = config.return_url {
            client.set_return_address(return_url.clone(), config.cancel_url.clone());
        }

        info!(
            "PayPal Express Checkout ready: host={}, currency={}",
            client.context.api_host(),
            client.context.currency()
        );

        Ok(client)
    }

    /// Create from environment variables
    pub fn from_env() -> CheckoutResult<Self> {
        let config = PayPalConfig::from_env()?;
        Self::from_config(&config)
    }

    /// Register an observer
    pub fn add_observer(&mut self, observer: SharedObserver) {
        self.observers.push(observer);
    }

    /// Builder: register an observer
    pub fn with_observer(mut self, observer: SharedObserver) -> Self {
        self.add_observer(observer);
        self
    }

    /// Return and cancel URLs; cancel defaults to the return URL
    pub fn set_return_address(&mut self, return_url: impl Into<String>, cancel_url: Option<String>) {
        self.return_url = return_url.into();
        self.cancel_url = cancel_url.unwrap_or_else(|| self.return_url.clone());
    }

    /// Builder: set return and cancel URLs
    pub fn with_return_address(
        mut self,
        return_url: impl Into<String>,
        cancel_url: Option<String>,
    ) -> Self {
        self.set_return_address(return_url, cancel_url);
        self
    }

    /// Always ask PayPal for the buyer's address, even for carts without shipping
    pub fn set_need_address(&mut self, need_address: bool) {
        self.need_address = need_address;
    }

    /// Require the buyer's address to be confirmed
    pub fn set_confirm_shipping(&mut self, confirm_shipping: bool) {
        self.confirm_shipping = confirm_shipping;
    }

    /// 3-letter currency code passed through to PayPal
    pub fn set_currency(&mut self, currency: impl Into<String>) {
        self.context.set_currency(currency);
    }

    /// Switch to the live endpoints. Irreversible.
    pub fn disable_sandbox(&mut self) {
        self.context.disable_sandbox();
    }

    pub fn context(&self) -> &CredentialContext {
        &self.context
    }

    pub fn gate_url(&self) -> &str {
        self.context.gate_url()
    }

    pub fn return_url(&self) -> &str {
        &self.return_url
    }

    pub fn cancel_url(&self) -> &str {
        &self.cancel_url
    }

    /// Start a checkout for `cart` and get the buyer-approval redirect.
    #[instrument(skip(self, cart))]
    pub async fn initiate_checkout(&self, cart: &dyn Cart) -> CheckoutResult<RedirectTarget> {
        let wants_address = cart.requires_shipping() || self.need_address;

        let mut fields = NvpFields::new()
            .with("METHOD", "SetExpressCheckout")
            .with("RETURNURL", self.return_url.as_str())
            .with("CANCELURL", self.cancel_url.as_str())
            .with("REQCONFIRMSHIPPING", flag(self.confirm_shipping))
            .with("NOSHIPPING", flag(!wants_address))
            .with("ALLOWNOTE", "1");
        fields.merge_missing(cart.serialize(
            self.context.account(),
            self.context.currency(),
            CART_INDEX,
        ));

        let exchange = self.process(fields).await?;

        if exchange.response.is_success() {
            let target = RedirectTarget::new(&exchange.response, self.context.gate_url());
            info!("Checkout initiated: token={}", target.token);
            return Ok(target);
        }

        warn!(
            "SetExpressCheckout rejected: ack={:?}, errors={:?}",
            exchange.response.ack(),
            exchange.response.errors()
        );
        Err(CheckoutError::CheckoutInitiation {
            response: exchange.response,
            request: exchange.request,
        })
    }

    /// Read what the buyer approved. Never fails on a non-success ACK;
    /// inspect the returned details instead.
    #[instrument(skip(self))]
    pub async fn fetch_checkout_details(&self, token: &str) -> CheckoutResult<CheckoutDetails> {
        let fields = NvpFields::new()
            .with("TOKEN", token)
            .with("METHOD", "GetExpressCheckoutDetails");

        let exchange = self.process(fields).await?;
        Ok(CheckoutDetails::new(exchange.response))
    }

    /// Finish the payment the buyer was returned with.
    ///
    /// Reads the checkout token from the return request, fetches the
    /// details and, unless PayPal already reports the payment as done,
    /// issues `DoExpressCheckoutPayment`. Not safe to blindly retry.
    #[instrument(skip(self, query))]
    pub async fn complete_payment<Q>(&self, query: &Q) -> CheckoutResult<PaymentOutcome>
    where
        Q: ReturnQuery + Sync + ?Sized,
    {
        let token = query
            .query_param(RETURN_TOKEN_PARAM)
            .ok_or(CheckoutError::MissingToken)?;

        let details = self.fetch_checkout_details(&token).await?;

        if details.is_payment_completed() {
            info!("Payment already completed: token={}", token);
            return Ok(PaymentOutcome::AlreadyCompleted(details));
        }

        let mut fields = NvpFields::new()
            .with("METHOD", "DoExpressCheckoutPayment")
            .with("PAYERID", details.payer_id().unwrap_or_default())
            .with("TOKEN", token.as_str());

        // Every cart goes in at the same index; the first one wins on overlap.
        for cart in details.carts() {
            fields.merge_missing(cart.serialize(
                self.context.account(),
                self.context.currency(),
                CART_INDEX,
            ));
        }

        let exchange = self.process(fields).await?;

        if exchange.response.is_success() {
            let payment = PaymentResponse::new(exchange.response, details);
            info!(
                "Payment completed: token={}, transaction={:?}",
                token,
                payment.transaction_id()
            );
            return Ok(PaymentOutcome::Completed(payment));
        }

        warn!(
            "DoExpressCheckoutPayment rejected: ack={:?}, errors={:?}",
            exchange.response.ack(),
            exchange.response.errors()
        );
        Err(CheckoutError::PaymentCompletion {
            response: exchange.response,
            request: exchange.request,
        })
    }

    /// Credentials first, operation fields after and winning on collision
    fn sign(&self, fields: &NvpFields) -> NvpFields {
        let mut signed = self.context.credential_fields();
        for (key, value) in fields.iter() {
            signed.insert(key, value);
        }
        signed
    }

    async fn process(&self, fields: NvpFields) -> CheckoutResult<NvpExchange> {
        for observer in &self.observers {
            observer.on_request(&fields);
        }

        let request = self.sign(&fields);
        let endpoints = self.context.resolve_endpoints();
        let transport_request = TransportRequest {
            url: endpoints.api_host,
            body: nvp::encode(&request),
            accept_invalid_certs: endpoints.is_sandbox_host,
        };

        debug!(
            "NVP call: method={}, url={}",
            fields.get("METHOD").unwrap_or("?"),
            transport_request.url
        );

        match self.transport.send(&transport_request).await {
            Ok(raw) => {
                let response = nvp::decode(&raw.body);
                for observer in &self.observers {
                    observer.on_success(&response, &raw.info);
                }
                Ok(NvpExchange { request, response })
            }
            Err(source) => {
                error!("PayPal communication failed: {}", source);
                for observer in &self.observers {
                    observer.on_error(&source);
                }
                Err(CheckoutError::Communication { source, request })
            }
        }
    }
}

fn flag(value: bool) -> &'static str {
    if value {
        "1"
    } else {
        "0"
    }
}
