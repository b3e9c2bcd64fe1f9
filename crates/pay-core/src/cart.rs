//! # Cart Types
//!
//! The serialization contract a cart must fulfil for Express Checkout,
//! plus a line-item cart producing the `PAYMENTREQUEST_<n>_*` field family.

use crate::nvp::{NvpFields, NvpResponse};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Anything the checkout engine can bill.
pub trait Cart: Send + Sync {
    /// NVP fields describing this cart as payment request `index`
    fn serialize(&self, account: &str, currency: &str, index: &str) -> NvpFields;

    /// Whether PayPal must collect a shipping address
    fn requires_shipping(&self) -> bool;
}

/// Format minor units as a two-decimal amount ("1099" -> "10.99")
pub fn format_amount(minor_units: i64) -> String {
    let sign = if minor_units < 0 { "-" } else { "" };
    let abs = minor_units.unsigned_abs();
    format!("{}{}.{:02}", sign, abs / 100, abs % 100)
}

/// Parse a PayPal amount ("10.99", "10.9", "10") into minor units
pub fn parse_amount(amount: &str) -> Option<i64> {
    let amount = amount.trim();
    let (negative, digits) = match amount.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, amount),
    };
    let (whole, fraction) = digits.split_once('.').unwrap_or((digits, ""));
    if whole.is_empty() || fraction.len() > 2 {
        return None;
    }
    let whole: i64 = whole.parse().ok()?;
    let fraction: i64 = match fraction.len() {
        0 => 0,
        1 => fraction.parse::<i64>().ok()? * 10,
        _ => fraction.parse().ok()?,
    };
    let value = whole.checked_mul(100)?.checked_add(fraction)?;
    Some(if negative { -value } else { value })
}

/// A line item in a cart
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    /// Display name
    pub name: String,

    /// Description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Unit price in minor units (cents, haléře)
    pub unit_amount: i64,

    /// Quantity
    #[serde(default = "default_quantity")]
    pub quantity: u32,
}

fn default_quantity() -> u32 {
    1
}

impl LineItem {
    pub fn new(name: impl Into<String>, unit_amount: i64, quantity: u32) -> Self {
        Self {
            name: name.into(),
            description: None,
            unit_amount,
            quantity,
        }
    }

    /// Builder: set description
    pub fn with_description(mut self, desc: impl Into<String>) -> Self {
        self.description = Some(desc.into());
        self
    }

    /// Unit amount times quantity; `None` on overflow
    pub fn total(&self) -> Option<i64> {
        self.unit_amount.checked_mul(i64::from(self.quantity))
    }
}

/// Payment request amounts passed through verbatim when a cart is
/// rebuilt from a details response
const CARRIED_AMOUNTS: [&str; 7] = [
    "AMT",
    "ITEMAMT",
    "SHIPPINGAMT",
    "TAXAMT",
    "HANDLINGAMT",
    "INSURANCEAMT",
    "SHIPDISCAMT",
];

/// A cart of line items billed as one payment request.
///
/// Not `serde::Serialize`: `cart.serialize(..)` is always [`Cart::serialize`].
#[derive(Debug, Clone)]
pub struct LineItemCart {
    /// Invoice number sent as `INVNUM` (generated)
    pub invoice_id: String,

    /// Line items
    pub items: Vec<LineItem>,

    /// Shipping in minor units
    pub shipping_amount: i64,

    /// Tax in minor units
    pub tax_amount: i64,

    /// Whether a shipping address is needed
    pub shipping: bool,

    /// Amount fields PayPal reported for this request, keyed by suffix
    /// (`AMT`, `HANDLINGAMT`, ...). They win over the computed totals.
    carried: NvpFields,
}

impl Default for LineItemCart {
    fn default() -> Self {
        Self::new()
    }
}

impl LineItemCart {
    /// Create an empty cart with a generated invoice id
    pub fn new() -> Self {
        Self {
            invoice_id: Uuid::new_v4().to_string(),
            items: Vec::new(),
            shipping_amount: 0,
            tax_amount: 0,
            shipping: false,
            carried: NvpFields::new(),
        }
    }

    /// Add a line item
    pub fn add_item(&mut self, item: LineItem) {
        self.items.push(item);
    }

    /// Builder: add a line item
    pub fn with_item(mut self, item: LineItem) -> Self {
        self.add_item(item);
        self
    }

    /// Builder: set shipping amount (minor units)
    pub fn with_shipping_amount(mut self, amount: i64) -> Self {
        self.shipping_amount = amount;
        self
    }

    /// Builder: set tax amount (minor units)
    pub fn with_tax_amount(mut self, amount: i64) -> Self {
        self.tax_amount = amount;
        self
    }

    /// Builder: require a shipping address
    pub fn with_shipping(mut self, shipping: bool) -> Self {
        self.shipping = shipping;
        self
    }

    /// Builder: set invoice id
    pub fn with_invoice_id(mut self, invoice_id: impl Into<String>) -> Self {
        self.invoice_id = invoice_id.into();
        self
    }

    /// Sum of all line items; `None` on overflow
    pub fn items_total(&self) -> Option<i64> {
        self.items
            .iter()
            .try_fold(0i64, |sum, item| sum.checked_add(item.total()?))
    }

    /// Items + shipping + tax; `None` on overflow.
    ///
    /// A cart whose total overflows serializes without `AMT`/`ITEMAMT`,
    /// which PayPal rejects. Check this before initiating a checkout.
    pub fn total(&self) -> Option<i64> {
        self.items_total()?
            .checked_add(self.shipping_amount)?
            .checked_add(self.tax_amount)
    }

    /// Amount PayPal reported for this request, if it was rebuilt from one
    pub fn carried_amount(&self, suffix: &str) -> Option<&str> {
        self.carried.get(suffix)
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn item_count(&self) -> u32 {
        self.items
            .iter()
            .fold(0u32, |count, item| count.saturating_add(item.quantity))
    }

    /// Rebuild payment request `index` from a `GetExpressCheckoutDetails`
    /// response. Returns `None` when the response has no such request.
    pub fn from_nvp(response: &NvpResponse, index: usize) -> Option<Self> {
        let prefix = format!("PAYMENTREQUEST_{}_", index);
        let field = |name: &str| response.get(&format!("{}{}", prefix, name));
        let amount = |name: &str| field(name).and_then(parse_amount).unwrap_or(0);

        field("AMT")?;

        let mut items = Vec::new();
        let item_prefix = format!("L_PAYMENTREQUEST_{}_", index);
        for m in 0.. {
            let Some(name) = response.get(&format!("{}NAME{}", item_prefix, m)) else {
                break;
            };
            let unit_amount = response
                .get(&format!("{}AMT{}", item_prefix, m))
                .and_then(parse_amount)
                .unwrap_or(0);
            let quantity = response
                .get(&format!("{}QTY{}", item_prefix, m))
                .and_then(|q| q.parse().ok())
                .unwrap_or(1);
            items.push(LineItem {
                name: name.to_string(),
                description: response
                    .get(&format!("{}DESC{}", item_prefix, m))
                    .map(String::from),
                unit_amount,
                quantity,
            });
        }

        let carried = CARRIED_AMOUNTS
            .iter()
            .copied()
            .filter_map(|suffix| field(suffix).map(|value| (suffix, value)))
            .collect();

        Some(Self {
            invoice_id: field("INVNUM").unwrap_or_default().to_string(),
            items,
            shipping_amount: amount("SHIPPINGAMT"),
            tax_amount: amount("TAXAMT"),
            shipping: response.contains_key(&format!("{}SHIPTOSTREET", prefix)),
            carried,
        })
    }
}

impl Cart for LineItemCart {
    fn serialize(&self, account: &str, currency: &str, index: &str) -> NvpFields {
        let request = format!("PAYMENTREQUEST_{}_", index);
        let item = format!("L_PAYMENTREQUEST_{}_", index);

        let mut fields = NvpFields::new();
        if let Some(total) = self.total() {
            fields.insert(format!("{}AMT", request), format_amount(total));
        }
        fields.insert(format!("{}CURRENCYCODE", request), currency);
        // Without lines an item total of 0.00 would contradict AMT
        if !self.items.is_empty() {
            if let Some(items_total) = self.items_total() {
                fields.insert(format!("{}ITEMAMT", request), format_amount(items_total));
            }
        }
        fields.insert(format!("{}SHIPPINGAMT", request), format_amount(self.shipping_amount));
        fields.insert(format!("{}TAXAMT", request), format_amount(self.tax_amount));
        fields.insert(format!("{}PAYMENTACTION", request), "Sale");
        fields.insert(format!("{}SELLERPAYPALACCOUNTID", request), account);

        for (suffix, value) in self.carried.iter() {
            fields.insert(format!("{}{}", request, suffix), value);
        }

        if !self.invoice_id.is_empty() {
            fields.insert(format!("{}INVNUM", request), self.invoice_id.as_str());
        }

        for (m, line) in self.items.iter().enumerate() {
            fields.insert(format!("{}NAME{}", item, m), line.name.as_str());
            if let Some(ref desc) = line.description {
                fields.insert(format!("{}DESC{}", item, m), desc.as_str());
            }
            fields.insert(format!("{}AMT{}", item, m), format_amount(line.unit_amount));
            fields.insert(format!("{}QTY{}", item, m), line.quantity.to_string());
        }

        fields
    }

    fn requires_shipping(&self) -> bool {
        self.shipping
    }
}
