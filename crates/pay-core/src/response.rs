//! # Checkout Responses
//!
//! Typed views over decoded NVP responses for each step of the flow.

use crate::cart::LineItemCart;
use crate::nvp::NvpResponse;
use serde::Serialize;

/// `CHECKOUTSTATUS` value once PayPal has captured the payment
pub const CHECKOUT_STATUS_COMPLETED: &str = "PaymentActionCompleted";

/// Where to send the buyer after a successful `SetExpressCheckout`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RedirectTarget {
    /// Full buyer-approval URL on the PayPal gate
    pub approval_url: String,
    /// Checkout token (EC-...)
    pub token: String,
}

impl RedirectTarget {
    /// Build from a `SetExpressCheckout` response and the configured gate.
    ///
    /// The gate already ends in `?`, so the command is appended with `&`.
    pub fn new(response: &NvpResponse, gate_url: &str) -> Self {
        let token = response.token().unwrap_or_default().to_string();
        let approval_url = format!(
            "{}&cmd=_express-checkout&token={}",
            gate_url,
            urlencoding::encode(&token)
        );
        Self {
            approval_url,
            token,
        }
    }
}

/// Result of `GetExpressCheckoutDetails`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckoutDetails {
    response: NvpResponse,
}

impl CheckoutDetails {
    pub fn new(response: NvpResponse) -> Self {
        Self { response }
    }

    pub fn response(&self) -> &NvpResponse {
        &self.response
    }

    /// Raw field access
    pub fn get(&self, key: &str) -> Option<&str> {
        self.response.get(key)
    }

    pub fn token(&self) -> Option<&str> {
        self.response.token()
    }

    pub fn payer_id(&self) -> Option<&str> {
        self.response.get("PAYERID")
    }

    pub fn checkout_status(&self) -> Option<&str> {
        self.response.get("CHECKOUTSTATUS")
    }

    pub fn payment_status(&self) -> Option<&str> {
        self.response
            .get("PAYMENTINFO_0_PAYMENTSTATUS")
            .or_else(|| self.response.get("PAYMENTREQUEST_0_PAYMENTSTATUS"))
    }

    /// True when PayPal reports the payment as already taken, e.g. when
    /// the buyer reloads the return page after a completed checkout.
    pub fn is_payment_completed(&self) -> bool {
        self.checkout_status() == Some(CHECKOUT_STATUS_COMPLETED)
            || self.payment_status() == Some("Completed")
    }

    /// Payment requests contained in the details, in index order
    pub fn carts(&self) -> Vec<LineItemCart> {
        (0..)
            .map_while(|index| LineItemCart::from_nvp(&self.response, index))
            .collect()
    }
}

/// Result of a successful `DoExpressCheckoutPayment`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaymentResponse {
    response: NvpResponse,
    details: CheckoutDetails,
}

impl PaymentResponse {
    pub fn new(response: NvpResponse, details: CheckoutDetails) -> Self {
        Self { response, details }
    }

    pub fn response(&self) -> &NvpResponse {
        &self.response
    }

    /// Details the payment was completed from
    pub fn details(&self) -> &CheckoutDetails {
        &self.details
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.response.get(key)
    }

    pub fn token(&self) -> Option<&str> {
        self.response.token().or_else(|| self.details.token())
    }

    pub fn transaction_id(&self) -> Option<&str> {
        self.response.get("PAYMENTINFO_0_TRANSACTIONID")
    }

    pub fn payment_status(&self) -> Option<&str> {
        self.response.get("PAYMENTINFO_0_PAYMENTSTATUS")
    }
}

/// Outcome of completing a payment
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PaymentOutcome {
    /// PayPal already reported the payment as done; nothing was sent
    AlreadyCompleted(CheckoutDetails),
    /// `DoExpressCheckoutPayment` succeeded
    Completed(PaymentResponse),
}

impl PaymentOutcome {
    pub fn details(&self) -> &CheckoutDetails {
        match self {
            PaymentOutcome::AlreadyCompleted(details) => details,
            PaymentOutcome::Completed(payment) => payment.details(),
        }
    }

    pub fn transaction_id(&self) -> Option<&str> {
        match self {
            PaymentOutcome::AlreadyCompleted(details) => {
                details.get("PAYMENTREQUEST_0_TRANSACTIONID")
            }
            PaymentOutcome::Completed(payment) => payment.transaction_id(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nvp::decode;

    #[test]
    fn test_redirect_target_uses_gate() {
        let response = decode("ACK=Success&TOKEN=EC-123");
        let target = RedirectTarget::new(
            &response,
            "https://www.sandbox.paypal.com/cgi-bin/webscr?",
        );

        assert_eq!(target.token, "EC-123");
        assert_eq!(
            target.approval_url,
            "https://www.sandbox.paypal.com/cgi-bin/webscr?&cmd=_express-checkout&token=EC-123"
        );
    }

    #[test]
    fn test_details_accessors() {
        let details = CheckoutDetails::new(decode(
            "ACK=Success&TOKEN=EC-1&PAYERID=PAYER1&CHECKOUTSTATUS=PaymentActionNotInitiated",
        ));

        assert_eq!(details.payer_id(), Some("PAYER1"));
        assert_eq!(details.token(), Some("EC-1"));
        assert!(!details.is_payment_completed());
        assert!(details.carts().is_empty());
    }

    #[test]
    fn test_details_completed() {
        let by_checkout_status =
            CheckoutDetails::new(decode("CHECKOUTSTATUS=PaymentActionCompleted"));
        assert!(by_checkout_status.is_payment_completed());

        let by_payment_status =
            CheckoutDetails::new(decode("PAYMENTINFO_0_PAYMENTSTATUS=Completed"));
        assert!(by_payment_status.is_payment_completed());

        let pending = CheckoutDetails::new(decode("PAYMENTINFO_0_PAYMENTSTATUS=Pending"));
        assert!(!pending.is_payment_completed());
    }

    #[test]
    fn test_details_carts() {
        let details = CheckoutDetails::new(decode(
            "PAYMENTREQUEST_0_AMT=10.00&L_PAYMENTREQUEST_0_NAME0=A&L_PAYMENTREQUEST_0_AMT0=10.00\
             &PAYMENTREQUEST_1_AMT=3.00&L_PAYMENTREQUEST_1_NAME0=B&L_PAYMENTREQUEST_1_AMT0=3.00\
             &PAYMENTREQUEST_3_AMT=1.00",
        ));

        let carts = details.carts();
        assert_eq!(carts.len(), 2);
        assert_eq!(carts[0].total(), Some(1000));
        assert_eq!(carts[1].items[0].name, "B");
    }

    #[test]
    fn test_payment_outcome() {
        let details = CheckoutDetails::new(decode("TOKEN=EC-1&PAYERID=P"));
        let payment = PaymentResponse::new(
            decode("ACK=Success&PAYMENTINFO_0_TRANSACTIONID=TX1&PAYMENTINFO_0_PAYMENTSTATUS=Completed"),
            details.clone(),
        );

        assert_eq!(payment.token(), Some("EC-1"));
        let outcome = PaymentOutcome::Completed(payment);
        assert_eq!(outcome.transaction_id(), Some("TX1"));
        assert_eq!(outcome.details(), &details);
    }
}
