//! Inbound shapes for the links Lambda, decided once at the edge.
//!
//! API Gateway proxy events carry `requestContext`; direct `Invoke` payloads
//! do not. Everything downstream works on `Operation`.

use std::collections::HashMap;

use serde::Deserialize;
use serde_json::Value as JsonValue;

use crate::id::CODE_LEN;
use crate::util::{b64_to_string, header};

pub const CREATE_PATH: &str = "/urlApi/get-url-shortener";
pub const SHORT_PREFIX: &str = "/urlApi/short/";

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpEvent {
    pub http_method: String,
    pub path: String,
    #[serde(default)]
    pub headers: Option<HashMap<String, String>>,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub is_base64_encoded: bool,
    #[serde(default)]
    pub path_parameters: Option<HashMap<String, String>>,
    pub request_context: RequestContext,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RequestContext {
    #[serde(default)]
    pub stage: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectInvocation {
    pub method_type: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub short_id: Option<String>,
}

#[derive(Debug, Clone)]
pub enum InboundEvent {
    Http(HttpEvent),
    Direct(DirectInvocation),
}

impl InboundEvent {
    pub fn from_value(v: JsonValue) -> Result<Self, serde_json::Error> {
        if v.get("requestContext").is_some() {
            serde_json::from_value(v).map(InboundEvent::Http)
        } else {
            serde_json::from_value(v).map(InboundEvent::Direct)
        }
    }
}

/// The canonical request the core understands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    Create { target_url: String, base_url: String },
    Resolve { code: String },
    Reject(&'static str),
}

pub const INVALID_HTTP: &str = "Invalid HTTP request";
pub const INVALID_EVENT: &str = "Invalid event type";
pub const INVALID_BODY: &str = "Invalid request body";

impl InboundEvent {
    /// `public_base_url` is used for direct calls and for HTTP events without a Host.
    pub fn into_operation(self, public_base_url: &str) -> Operation {
        match self {
            InboundEvent::Http(evt) => http_operation(evt, public_base_url),
            InboundEvent::Direct(d) => direct_operation(d, public_base_url),
        }
    }
}

fn http_operation(evt: HttpEvent, public_base_url: &str) -> Operation {
    match evt.http_method.as_str() {
        "POST" if evt.path == CREATE_PATH && evt.body.as_deref().is_some_and(|b| !b.is_empty()) => {
            let base_url = short_base(&evt, public_base_url);
            let raw = evt.body.unwrap_or_default();
            let body = if evt.is_base64_encoded {
                match b64_to_string(&raw) {
                    Some(b) => b,
                    None => return Operation::Reject(INVALID_BODY),
                }
            } else {
                raw
            };
            let Ok(payload) = serde_json::from_str::<JsonValue>(&body) else {
                return Operation::Reject(INVALID_BODY);
            };
            // a non-string url reads as missing
            let target_url = payload
                .get("url")
                .and_then(|u| u.as_str())
                .unwrap_or_default()
                .to_string();
            Operation::Create { target_url, base_url }
        }
        "GET" if is_short_path(&evt.path) => {
            let code = evt
                .path_parameters
                .as_ref()
                .and_then(|p| p.get("shortId"))
                .cloned()
                .unwrap_or_default();
            Operation::Resolve { code }
        }
        _ => Operation::Reject(INVALID_HTTP),
    }
}

fn direct_operation(d: DirectInvocation, public_base_url: &str) -> Operation {
    let url = d.url.unwrap_or_default();
    let short_id = d.short_id.unwrap_or_default();
    match d.method_type.as_str() {
        "POST" | "CREATE" if !url.is_empty() => Operation::Create {
            target_url: url,
            base_url: public_base_url.to_string(),
        },
        "GET" if !short_id.is_empty() => Operation::Resolve { code: short_id },
        _ => Operation::Reject(INVALID_EVENT),
    }
}

/// `/urlApi/short/` followed by exactly seven of `[A-Za-z0-9+/=]`.
fn is_short_path(path: &str) -> bool {
    path.strip_prefix(SHORT_PREFIX).is_some_and(|rest| {
        rest.len() == CODE_LEN
            && rest
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '/' | '='))
    })
}

/// Short links created over HTTP point back through the same stage.
fn short_base(evt: &HttpEvent, public_base_url: &str) -> String {
    let empty = HashMap::new();
    let headers = evt.headers.as_ref().unwrap_or(&empty);
    let Some(host) = header(headers, "Host").filter(|h| !h.is_empty()) else {
        return public_base_url.to_string();
    };
    let proto = header(headers, "X-Forwarded-Proto")
        .filter(|p| !p.is_empty())
        .unwrap_or("https");
    match evt.request_context.stage.as_deref().filter(|s| !s.is_empty()) {
        Some(stage) => format!("{proto}://{host}/{stage}{SHORT_PREFIX}"),
        None => format!("{proto}://{host}{SHORT_PREFIX}"),
    }
}
