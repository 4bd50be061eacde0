//! API Gateway custom authorizer: event decoding and IAM policy responses.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value as JsonValue};

use crate::auth::{AccessDecisionEngine, AccessRequest, AuthorizationDecision, Effect};

pub const PRINCIPAL: &str = "user";
pub const INVALIDATE_ACTION: &str = "invalidate-signing-secret";

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawAuthorizerEvent {
    #[serde(default)]
    method_arn: Option<String>,
    #[serde(default)]
    http_method: Option<String>,
    #[serde(default)]
    headers: Option<HashMap<String, String>>,
    /// TOKEN authorizers send the header value here instead of `headers`.
    #[serde(default)]
    authorization_token: Option<String>,
    #[serde(default)]
    action: Option<String>,
}

#[derive(Debug)]
pub enum AuthorizerEvent {
    Request(AccessRequest),
    InvalidateSecret,
}

impl AuthorizerEvent {
    pub fn from_value(v: JsonValue) -> Result<Self, serde_json::Error> {
        let raw: RawAuthorizerEvent = serde_json::from_value(v)?;
        if raw.action.as_deref() == Some(INVALIDATE_ACTION) {
            return Ok(AuthorizerEvent::InvalidateSecret);
        }

        let resource = raw.method_arn.unwrap_or_default();
        let mut headers = raw.headers.unwrap_or_default();
        if let Some(tok) = raw.authorization_token {
            headers.entry("Authorization".to_string()).or_insert(tok);
        }
        let method = raw
            .http_method
            .filter(|m| !m.is_empty())
            .or_else(|| method_from_arn(&resource).map(str::to_string))
            .unwrap_or_default();

        Ok(AuthorizerEvent::Request(AccessRequest {
            headers,
            method,
            resource,
            principal: PRINCIPAL.to_string(),
        }))
    }
}

/// `arn:aws:execute-api:{region}:{account}:{api}/{stage}/{METHOD}/{path}`
fn method_from_arn(arn: &str) -> Option<&str> {
    let (_, tail) = arn.rsplit_once(':')?;
    tail.split('/').nth(2).filter(|m| !m.is_empty())
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct Statement {
    effect: Effect,
    action: &'static str,
    resource: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct PolicyDocument {
    version: &'static str,
    statement: Vec<Statement>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyResponse {
    principal_id: String,
    policy_document: PolicyDocument,
}

impl From<AuthorizationDecision> for PolicyResponse {
    fn from(d: AuthorizationDecision) -> Self {
        PolicyResponse {
            principal_id: d.principal,
            policy_document: PolicyDocument {
                version: "2012-10-17",
                statement: vec![Statement {
                    effect: d.effect,
                    action: "execute-api:Invoke",
                    resource: d.resource,
                }],
            },
        }
    }
}

/// Always answers: a policy for gateway events, an ack for the maintenance call.
pub async fn handle(engine: &AccessDecisionEngine, event: JsonValue) -> JsonValue {
    let resource_hint = event
        .get("methodArn")
        .and_then(|v| v.as_str())
        .unwrap_or_default()
        .to_string();

    match AuthorizerEvent::from_value(event) {
        Ok(AuthorizerEvent::InvalidateSecret) => {
            engine.secrets().invalidate().await;
            json!({ "invalidated": true })
        }
        Ok(AuthorizerEvent::Request(req)) => policy(engine.authorize(&req).await),
        Err(e) => {
            tracing::warn!(error = %e, "undecodable authorizer event, denying");
            policy(AuthorizationDecision {
                effect: Effect::Deny,
                principal: PRINCIPAL.to_string(),
                resource: resource_hint,
            })
        }
    }
}

fn policy(decision: AuthorizationDecision) -> JsonValue {
    serde_json::to_value(PolicyResponse::from(decision)).unwrap_or_else(|e| {
        tracing::error!(error = %e, "policy serialization failed");
        json!({ "principalId": PRINCIPAL, "policyDocument": { "Version": "2012-10-17", "Statement": [] } })
    })
}
