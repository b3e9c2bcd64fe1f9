//! # PayPal Configuration
//!
//! API credentials, endpoint selection and client settings.
//! Secrets are loaded from environment variables or a TOML file.

use pay_core::{CheckoutError, CheckoutResult};
use serde::Deserialize;
use std::env;
use std::fmt;

/// NVP API version sent as `VERSION` on every call
pub const API_VERSION: &str = "95.0";

/// Live NVP endpoint
pub const LIVE_API_HOST: &str = "https://api-3t.paypal.com/nvp";
/// Live buyer-approval gate
pub const LIVE_GATE_URL: &str = "https://www.paypal.com/cgi-bin/webscr?";
/// Sandbox NVP endpoint
pub const SANDBOX_API_HOST: &str = "https://api-3t.sandbox.paypal.com/nvp";
/// Sandbox buyer-approval gate
pub const SANDBOX_GATE_URL: &str = "https://www.sandbox.paypal.com/cgi-bin/webscr?";

/// Substring of a host name that marks the sandbox environment
const SANDBOX_HOST_MARKER: &str = ".sandbox.";

/// Currency used until `set_currency` is called
pub const DEFAULT_CURRENCY: &str = "CZK";

/// Default transport timeout
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Raw API credentials, as found in config sources.
///
/// Every field is optional here; [`CredentialContext::new`] decides
/// what is missing.
#[derive(Clone, Default, Deserialize)]
pub struct PayPalCredentials {
    /// Merchant account (e-mail or payer id), sent as the seller account
    pub account: Option<String>,
    /// API username
    pub username: Option<String>,
    /// API password
    pub password: Option<String>,
    /// API signature
    pub signature: Option<String>,
}

impl PayPalCredentials {
    pub fn new(
        account: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
        signature: impl Into<String>,
    ) -> Self {
        Self {
            account: Some(account.into()),
            username: Some(username.into()),
            password: Some(password.into()),
            signature: Some(signature.into()),
        }
    }
}

impl fmt::Debug for PayPalCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PayPalCredentials")
            .field("account", &self.account)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("signature", &self.signature.as_ref().map(|_| "***"))
            .finish()
    }
}

/// Endpoints a request should use
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub api_host: String,
    pub gate_url: String,
    /// Certificate verification may be relaxed only when this is true
    pub is_sandbox_host: bool,
}

/// Credentials plus the endpoint pair they are used against.
///
/// Starts in sandbox mode. Currency and sandbox mode are meant to be set
/// once during setup; everything else is fixed at construction.
#[derive(Clone)]
pub struct CredentialContext {
    account: String,
    username: String,
    password: String,
    signature: String,
    api_version: String,
    currency: String,
    api_host: String,
    gate_url: String,
}

fn required(value: Option<String>, field: &str) -> CheckoutResult<String> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(CheckoutError::Configuration(format!(
            "PayPal credential '{}' is missing",
            field
        ))),
    }
}

impl CredentialContext {
    /// Validate credentials; fails before any network activity
    pub fn new(credentials: PayPalCredentials) -> CheckoutResult<Self> {
        Ok(Self {
            account: required(credentials.account, "account")?,
            username: required(credentials.username, "username")?,
            password: required(credentials.password, "password")?,
            signature: required(credentials.signature, "signature")?,
            api_version: API_VERSION.to_string(),
            currency: DEFAULT_CURRENCY.to_string(),
            api_host: SANDBOX_API_HOST.to_string(),
            gate_url: SANDBOX_GATE_URL.to_string(),
        })
    }

    /// 3-letter currency code (USD, GBP, CZK...). Not validated; PayPal
    /// rejects unknown codes itself.
    pub fn set_currency(&mut self, currency: impl Into<String>) {
        self.currency = currency.into();
    }

    /// Switch API host and gate to production. There is no way back.
    pub fn disable_sandbox(&mut self) {
        self.api_host = LIVE_API_HOST.to_string();
        self.gate_url = LIVE_GATE_URL.to_string();
    }

    /// Builder: point the API host somewhere else (for testing/mocking)
    pub fn with_api_host(mut self, url: impl Into<String>) -> Self {
        self.api_host = url.into();
        self
    }

    pub fn resolve_endpoints(&self) -> Endpoints {
        Endpoints {
            api_host: self.api_host.clone(),
            gate_url: self.gate_url.clone(),
            is_sandbox_host: self.is_sandbox_host(),
        }
    }

    /// True only when the host part of the API URL carries the sandbox marker
    pub fn is_sandbox_host(&self) -> bool {
        url::Url::parse(&self.api_host)
            .ok()
            .and_then(|url| url.host_str().map(|host| host.contains(SANDBOX_HOST_MARKER)))
            .unwrap_or(false)
    }

    pub fn account(&self) -> &str {
        &self.account
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn currency(&self) -> &str {
        &self.currency
    }

    pub fn api_version(&self) -> &str {
        &self.api_version
    }

    pub fn api_host(&self) -> &str {
        &self.api_host
    }

    pub fn gate_url(&self) -> &str {
        &self.gate_url
    }

    /// `USER`, `PWD`, `SIGNATURE`, `VERSION`, in that order
    pub fn credential_fields(&self) -> pay_core::NvpFields {
        pay_core::NvpFields::new()
            .with("USER", self.username.as_str())
            .with("PWD", self.password.as_str())
            .with("SIGNATURE", self.signature.as_str())
            .with("VERSION", self.api_version.as_str())
    }
}

impl fmt::Debug for CredentialContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialContext")
            .field("account", &self.account)
            .field("username", &self.username)
            .field("password", &"***")
            .field("signature", &"***")
            .field("api_version", &self.api_version)
            .field("currency", &self.currency)
            .field("api_host", &self.api_host)
            .field("gate_url", &self.gate_url)
            .finish()
    }
}

/// Full client configuration
#[derive(Debug, Clone, Deserialize)]
pub struct PayPalConfig {
    #[serde(flatten)]
    pub credentials: PayPalCredentials,

    /// Use the sandbox endpoints
    #[serde(default = "default_true")]
    pub sandbox: bool,

    #[serde(default = "default_currency")]
    pub currency: String,

    /// Where PayPal sends the buyer after approval
    #[serde(default)]
    pub return_url: Option<String>,

    /// Where PayPal sends the buyer after cancelling (defaults to `return_url`)
    #[serde(default)]
    pub cancel_url: Option<String>,

    /// Always ask PayPal for the buyer's address
    #[serde(default)]
    pub need_address: bool,

    /// Require a confirmed shipping address
    #[serde(default)]
    pub confirm_shipping: bool,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_true() -> bool {
    true
}

fn default_currency() -> String {
    DEFAULT_CURRENCY.to_string()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl PayPalConfig {
    /// Config with explicit credentials and defaults for everything else
    pub fn new(credentials: PayPalCredentials) -> Self {
        Self {
            credentials,
            sandbox: true,
            currency: default_currency(),
            return_url: None,
            cancel_url: None,
            need_address: false,
            confirm_shipping: false,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    /// Load configuration from environment variables.
    ///
    /// Required env vars:
    /// - `PAYPAL_ACCOUNT`
    /// - `PAYPAL_USERNAME`
    /// - `PAYPAL_PASSWORD`
    /// - `PAYPAL_SIGNATURE`
    ///
    /// Optional: `PAYPAL_SANDBOX`, `PAYPAL_CURRENCY`, `PAYPAL_RETURN_URL`,
    /// `PAYPAL_CANCEL_URL`, `PAYPAL_NEED_ADDRESS`, `PAYPAL_CONFIRM_SHIPPING`,
    /// `PAYPAL_TIMEOUT_SECS`.
    pub fn from_env() -> CheckoutResult<Self> {
        dotenvy::dotenv().ok(); // Load .env file if present
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> CheckoutResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let credentials = PayPalCredentials {
            account: lookup("PAYPAL_ACCOUNT"),
            username: lookup("PAYPAL_USERNAME"),
            password: lookup("PAYPAL_PASSWORD"),
            signature: lookup("PAYPAL_SIGNATURE"),
        };

        // Fail fast on missing credentials
        CredentialContext::new(credentials.clone())?;

        let flag = |key: &str, default: bool| -> CheckoutResult<bool> {
            match lookup(key) {
                Some(value) => parse_bool(&value).ok_or_else(|| {
                    CheckoutError::Configuration(format!(
                        "{} must be a boolean, got '{}'",
                        key, value
                    ))
                }),
                None => Ok(default),
            }
        };

        let timeout_secs = match lookup("PAYPAL_TIMEOUT_SECS") {
            Some(value) => value.trim().parse().map_err(|_| {
                CheckoutError::Configuration(format!(
                    "PAYPAL_TIMEOUT_SECS must be a number of seconds, got '{}'",
                    value
                ))
            })?,
            None => DEFAULT_TIMEOUT_SECS,
        };

        Ok(Self {
            credentials,
            sandbox: flag("PAYPAL_SANDBOX", true)?,
            currency: lookup("PAYPAL_CURRENCY").unwrap_or_else(default_currency),
            return_url: lookup("PAYPAL_RETURN_URL"),
            cancel_url: lookup("PAYPAL_CANCEL_URL"),
            need_address: flag("PAYPAL_NEED_ADDRESS", false)?,
            confirm_shipping: flag("PAYPAL_CONFIRM_SHIPPING", false)?,
            timeout_secs,
        })
    }

    /// Load configuration from a TOML document
    pub fn from_toml(toml_str: &str) -> CheckoutResult<Self> {
        toml::from_str(toml_str)
            .map_err(|e| CheckoutError::Configuration(format!("Invalid PayPal config: {}", e)))
    }

    /// Build the credential context: currency applied, sandbox disabled
    /// when configured off
    pub fn credential_context(&self) -> CheckoutResult<CredentialContext> {
        let mut context = CredentialContext::new(self.credentials.clone())?;
        context.set_currency(self.currency.clone());
        if !self.sandbox {
            context.disable_sandbox();
        }
        Ok(context)
    }

    pub fn timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.timeout_secs)
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn credentials() -> PayPalCredentials {
        PayPalCredentials::new("merchant@shop.cz", "api_user", "api_pass", "api_sig")
    }

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| vars.get(key).cloned()
    }

    const REQUIRED: [(&str, &str); 4] = [
        ("PAYPAL_ACCOUNT", "merchant@shop.cz"),
        ("PAYPAL_USERNAME", "api_user"),
        ("PAYPAL_PASSWORD", "api_pass"),
        ("PAYPAL_SIGNATURE", "api_sig"),
    ];

    #[test]
    fn test_missing_credential_fails() {
        let mut creds = credentials();
        creds.signature = None;

        let err = CredentialContext::new(creds).unwrap_err();
        assert!(matches!(err, CheckoutError::Configuration(ref msg) if msg.contains("signature")));

        let mut creds = credentials();
        creds.username = Some("  ".into());
        assert!(CredentialContext::new(creds).is_err());
    }

    #[test]
    fn test_sandbox_by_default() {
        let context = CredentialContext::new(credentials()).unwrap();
        let endpoints = context.resolve_endpoints();

        assert_eq!(endpoints.api_host, SANDBOX_API_HOST);
        assert_eq!(endpoints.gate_url, SANDBOX_GATE_URL);
        assert!(endpoints.is_sandbox_host);
        assert_eq!(context.currency(), "CZK");
        assert_eq!(context.api_version(), "95.0");
    }

    #[test]
    fn test_disable_sandbox_selects_live_pair() {
        let mut context = CredentialContext::new(credentials()).unwrap();
        context.disable_sandbox();
        context.disable_sandbox();

        let endpoints = context.resolve_endpoints();
        assert_eq!(endpoints.api_host, LIVE_API_HOST);
        assert_eq!(endpoints.gate_url, LIVE_GATE_URL);
        assert!(!endpoints.is_sandbox_host);
    }

    #[test]
    fn test_sandbox_marker_checked_on_host_only() {
        let context = CredentialContext::new(credentials())
            .unwrap()
            .with_api_host("https://api.example.com/.sandbox./nvp");
        assert!(!context.is_sandbox_host());

        let context = context.with_api_host("not a url");
        assert!(!context.is_sandbox_host());
    }

    #[test]
    fn test_credential_fields_order() {
        let context = CredentialContext::new(credentials()).unwrap();
        let keys: Vec<_> = context.credential_fields().keys().map(String::from).collect();
        assert_eq!(keys, ["USER", "PWD", "SIGNATURE", "VERSION"]);
    }

    #[test]
    fn test_debug_hides_secrets() {
        let context = CredentialContext::new(credentials()).unwrap();
        let debug = format!("{:?}", context);
        assert!(!debug.contains("api_pass"));
        assert!(!debug.contains("api_sig"));
        assert!(!format!("{:?}", credentials()).contains("api_pass"));
    }

    #[test]
    fn test_from_lookup_defaults() {
        let config = PayPalConfig::from_lookup(lookup(&REQUIRED)).unwrap();

        assert!(config.sandbox);
        assert_eq!(config.currency, "CZK");
        assert!(!config.need_address);
        assert_eq!(config.timeout_secs, 30);
        assert!(config.credential_context().unwrap().is_sandbox_host());
    }

    #[test]
    fn test_from_lookup_live() {
        let mut vars = REQUIRED.to_vec();
        vars.push(("PAYPAL_SANDBOX", "false"));
        vars.push(("PAYPAL_CURRENCY", "EUR"));
        vars.push(("PAYPAL_NEED_ADDRESS", "yes"));

        let config = PayPalConfig::from_lookup(lookup(&vars)).unwrap();
        let context = config.credential_context().unwrap();

        assert!(config.need_address);
        assert_eq!(context.currency(), "EUR");
        assert_eq!(context.api_host(), LIVE_API_HOST);
    }

    #[test]
    fn test_from_lookup_errors() {
        let err = PayPalConfig::from_lookup(lookup(&REQUIRED[..3])).unwrap_err();
        assert!(matches!(err, CheckoutError::Configuration(_)));

        let mut vars = REQUIRED.to_vec();
        vars.push(("PAYPAL_SANDBOX", "maybe"));
        assert!(PayPalConfig::from_lookup(lookup(&vars)).is_err());
    }

    #[test]
    fn test_from_toml() {
        let config = PayPalConfig::from_toml(
            r#"
            account = "merchant@shop.cz"
            username = "api_user"
            password = "api_pass"
            signature = "api_sig"
            sandbox = false
            return_url = "https://shop.cz/paypal/return"
            "#,
        )
        .unwrap();

        assert!(!config.sandbox);
        assert_eq!(config.currency, "CZK");
        assert_eq!(config.return_url.as_deref(), Some("https://shop.cz/paypal/return"));
        assert!(config.cancel_url.is_none());
    }
}
