//! # NVP Codec
//!
//! PayPal's legacy Name-Value-Pair format. Requests go out as ordinary
//! `application/x-www-form-urlencoded` bodies; responses come back as
//! `&`-joined `KEY=value` pairs with percent-encoded values.

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::Serialize;
use url::form_urlencoded;

/// Field names masked by [`NvpFields::redacted`]
pub const SECRET_FIELDS: &[&str] = &["PWD", "SIGNATURE"];

const REDACTED: &str = "********";

/// Ordered request fields.
///
/// Insertion order is kept verbatim on the wire. `insert` is
/// last-write-wins and keeps the key at its first position.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct NvpFields {
    fields: IndexMap<String, String>,
}

impl NvpFields {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite a field
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.fields.insert(key.into(), value.into());
    }

    /// Builder: insert a field
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    /// Append every field of `other` whose key is not present yet.
    /// Existing values always win.
    pub fn merge_missing(&mut self, other: NvpFields) {
        for (key, value) in other.fields {
            self.fields.entry(key).or_insert(value);
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    /// Copy with credential secrets masked, for logs and support tickets
    pub fn redacted(&self) -> Self {
        let fields = self
            .fields
            .iter()
            .map(|(k, v)| {
                if SECRET_FIELDS.contains(&k.as_str()) {
                    (k.clone(), REDACTED.to_string())
                } else {
                    (k.clone(), v.clone())
                }
            })
            .collect();
        Self { fields }
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for NvpFields {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut fields = NvpFields::new();
        for (k, v) in iter {
            fields.insert(k, v);
        }
        fields
    }
}

impl IntoIterator for NvpFields {
    type Item = (String, String);
    type IntoIter = indexmap::map::IntoIter<String, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.into_iter()
    }
}

/// Encode fields as a form-urlencoded request body
pub fn encode(fields: &NvpFields) -> String {
    form_urlencoded::Serializer::new(String::new())
        .extend_pairs(fields.iter())
        .finish()
}

/// Decode an NVP response body.
///
/// Never fails: tokens without a usable `=` go to
/// [`NvpResponse::unparsed`] instead of the field map, trimmed and in
/// input order. Empty tokens (`""`, a trailing `&`) are kept there too.
pub fn decode(body: &str) -> NvpResponse {
    let mut response = NvpResponse::default();

    for token in body.split('&') {
        match token.find('=') {
            Some(pos) if pos > 0 => {
                let key = token[..pos].trim();
                if key.is_empty() {
                    continue;
                }
                let value = url_decode(token[pos + 1..].trim());
                response.fields.insert(key.to_string(), value);
            }
            _ => response.unparsed.push(token.trim().to_string()),
        }
    }

    response
}

fn url_decode(value: &str) -> String {
    let plus_decoded = value.replace('+', " ");
    let bytes = urlencoding::decode_binary(plus_decoded.as_bytes());
    String::from_utf8_lossy(&bytes).into_owned()
}

/// One `L_ERRORCODEn` group of an NVP response
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NvpApiError {
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub short_message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub long_message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub severity: Option<String>,
}

/// Decoded NVP response
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NvpResponse {
    fields: IndexMap<String, String>,
    /// Tokens that carried no key
    unparsed: Vec<String>,
}

impl NvpResponse {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.unparsed.is_empty()
    }

    pub fn unparsed(&self) -> &[String] {
        &self.unparsed
    }

    pub fn ack(&self) -> Option<&str> {
        self.get("ACK")
    }

    /// Only an exact `Success` counts; `SuccessWithWarning` does not.
    pub fn is_success(&self) -> bool {
        self.ack() == Some("Success")
    }

    pub fn token(&self) -> Option<&str> {
        self.get("TOKEN")
    }

    pub fn correlation_id(&self) -> Option<&str> {
        self.get("CORRELATIONID")
    }

    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        self.get("TIMESTAMP")
            .and_then(|ts| DateTime::parse_from_rfc3339(ts).ok())
            .map(|ts| ts.with_timezone(&Utc))
    }

    /// API errors in index order, stopping at the first missing index
    pub fn errors(&self) -> Vec<NvpApiError> {
        let mut errors = Vec::new();
        for i in 0.. {
            let Some(code) = self.get(&format!("L_ERRORCODE{}", i)) else {
                break;
            };
            errors.push(NvpApiError {
                code: code.to_string(),
                short_message: self.get(&format!("L_SHORTMESSAGE{}", i)).map(String::from),
                long_message: self.get(&format!("L_LONGMESSAGE{}", i)).map(String::from),
                severity: self.get(&format!("L_SEVERITYCODE{}", i)).map(String::from),
            });
        }
        errors
    }

    /// Builder used by tests and transports that already hold decoded data
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }
}
