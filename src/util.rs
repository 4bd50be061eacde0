use std::collections::{BTreeMap, HashMap};

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::Serialize;
use tracing_subscriber::EnvFilter;
use url::Url;

/// True when `u` parses as an absolute URI.
pub fn valid_target(u: &str) -> bool {
    !u.is_empty() && Url::parse(u).is_ok()
}

/// Case-insensitive header lookup. An exact-case match wins over other spellings.
pub fn header<'a>(headers: &'a HashMap<String, String>, name: &str) -> Option<&'a str> {
    if let Some(v) = headers.get(name) {
        return Some(v.as_str());
    }
    headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(name))
        .map(|(_, v)| v.as_str())
}

pub fn b64_to_string(s: &str) -> Option<String> {
    STANDARD
        .decode(s)
        .ok()
        .and_then(|b| String::from_utf8(b).ok())
}

/// API Gateway proxy response.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct GatewayResponse {
    #[serde(rename = "statusCode")]
    pub status_code: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub headers: Option<BTreeMap<String, String>>,
    pub body: String,
}

impl GatewayResponse {
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers
            .get_or_insert_with(BTreeMap::new)
            .insert(name.to_string(), value.into());
        self
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.as_ref()?.get(name).map(String::as_str)
    }

    pub fn json(&self) -> serde_json::Value {
        serde_json::from_str(&self.body).unwrap_or(serde_json::Value::Null)
    }
}

pub fn resp_json(status: u16, v: serde_json::Value) -> GatewayResponse {
    GatewayResponse {
        status_code: status,
        headers: None,
        body: v.to_string(),
    }
}

pub fn json_msg(status: u16, message: impl Into<String>) -> GatewayResponse {
    resp_json(status, serde_json::json!({ "message": message.into() }))
}

/// Log setup shared by both Lambdas. CloudWatch stamps lines itself.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .without_time()
        .init();
}
