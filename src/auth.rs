//! Bearer-token access decisions for the API Gateway authorizer.
//!
//! `AccessDecisionEngine::evaluate` is the fallible pipeline:
//! extract token -> resolve secret -> verify claims -> read role.
//! `AccessDecisionEngine::authorize` is total: any `Err` becomes `Effect::Deny`.

use std::collections::HashMap;
use std::sync::Arc;

use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::secret::{SecretCache, SecretError, SigningSecret};
use crate::util::header;

#[derive(Debug, Clone, Deserialize)]
pub struct Claims {
    #[serde(default)]
    pub sub: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Admin,
    User,
}

impl Role {
    /// Roles compare case-insensitively: `Admin`, `ADMIN` and `admin` are the same role.
    pub fn from_claim(raw: Option<&str>) -> Result<Role, DenyReason> {
        let role = raw.map(|r| r.to_ascii_lowercase()).unwrap_or_default();
        match role.as_str() {
            "admin" => Ok(Role::Admin),
            "user" => Ok(Role::User),
            "" => Err(DenyReason::MissingRole),
            other => Err(DenyReason::UnknownRole(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Effect {
    Allow,
    Deny,
}

/// Decision table: admins may do anything, users may only read.
pub fn decide(role: Role, method: &str) -> Effect {
    match role {
        Role::Admin => Effect::Allow,
        Role::User if method == "GET" => Effect::Allow,
        Role::User => Effect::Deny,
    }
}

#[derive(Debug, Error)]
pub enum DenyReason {
    #[error("no bearer token")]
    MissingToken,
    #[error(transparent)]
    Secret(#[from] SecretError),
    #[error("token rejected: {0}")]
    Verification(#[from] jsonwebtoken::errors::Error),
    #[error("token has no role")]
    MissingRole,
    #[error("unknown role {0:?}")]
    UnknownRole(String),
}

/// One inbound request to authorize.
#[derive(Debug, Clone, Default)]
pub struct AccessRequest {
    pub headers: HashMap<String, String>,
    pub method: String,
    pub resource: String,
    pub principal: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationDecision {
    pub effect: Effect,
    pub principal: String,
    pub resource: String,
}

pub trait TokenVerifier: Send + Sync {
    fn verify(&self, token: &str, secret: &SigningSecret) -> Result<Claims, jsonwebtoken::errors::Error>;
}

/// HMAC signature check (HS256/384/512) plus `exp`/`nbf` when the token carries them.
/// `aud` is not checked.
pub struct HmacVerifier {
    validation: Validation,
}

impl HmacVerifier {
    pub fn new(leeway_secs: u64) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = leeway_secs;
        validation.validate_nbf = true;
        validation.validate_aud = false;
        validation.algorithms = vec![Algorithm::HS256, Algorithm::HS384, Algorithm::HS512];
        // exp is checked when present but not demanded
        validation.required_spec_claims.clear();
        Self { validation }
    }
}

impl TokenVerifier for HmacVerifier {
    fn verify(&self, token: &str, secret: &SigningSecret) -> Result<Claims, jsonwebtoken::errors::Error> {
        let key = DecodingKey::from_secret(secret.as_bytes());
        decode::<Claims>(token, &key, &self.validation).map(|d| d.claims)
    }
}

/// Pulls the token out of `Authorization`, with or without a `Bearer` prefix.
pub fn bearer_token(headers: &HashMap<String, String>) -> Option<&str> {
    let raw = header(headers, "Authorization")?.trim();
    let token = match raw.get(..6) {
        Some(p) if p.eq_ignore_ascii_case("bearer") => {
            let rest = &raw[6..];
            if rest.is_empty() || rest.starts_with(char::is_whitespace) {
                rest.trim()
            } else {
                raw
            }
        }
        _ => raw,
    };
    (!token.is_empty()).then_some(token)
}

pub struct AccessDecisionEngine {
    secrets: Arc<SecretCache>,
    verifier: Box<dyn TokenVerifier>,
}

impl AccessDecisionEngine {
    pub fn new(secrets: Arc<SecretCache>, verifier: Box<dyn TokenVerifier>) -> Self {
        Self { secrets, verifier }
    }

    pub fn secrets(&self) -> &Arc<SecretCache> {
        &self.secrets
    }

    pub async fn evaluate(&self, headers: &HashMap<String, String>) -> Result<Role, DenyReason> {
        let token = bearer_token(headers).ok_or(DenyReason::MissingToken)?;
        let secret = self.secrets.get().await?;
        let claims = self.verifier.verify(token, &secret)?;
        Role::from_claim(claims.role.as_deref())
    }

    pub async fn authorize(&self, req: &AccessRequest) -> AuthorizationDecision {
        let effect = match self.evaluate(&req.headers).await {
            Ok(role) => {
                let effect = decide(role, &req.method);
                tracing::info!(?role, method = %req.method, resource = %req.resource, ?effect, "access decided");
                effect
            }
            Err(reason) => {
                tracing::warn!(%reason, method = %req.method, resource = %req.resource, "access denied");
                Effect::Deny
            }
        };
        AuthorizationDecision {
            effect,
            principal: req.principal.clone(),
            resource: req.resource.clone(),
        }
    }
}
