//! Where the token signing secret comes from, and the per-process cache in front of it.

use std::sync::Arc;

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_kms as kms;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use kms::primitives::Blob;
use thiserror::Error;
use tokio::sync::RwLock;

use crate::config::SecretConfig;

#[derive(Debug, Error)]
pub enum SecretError {
    #[error("signing secret is empty")]
    Empty,
    #[error("signing secret ciphertext is not valid base64")]
    Decode,
    #[error("signing secret unavailable: {0}")]
    Unavailable(String),
}

/// HMAC key bytes. Never printed.
#[derive(Clone)]
pub struct SigningSecret(Arc<str>);

impl SigningSecret {
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl std::fmt::Debug for SigningSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SigningSecret(<redacted>)")
    }
}

#[async_trait]
pub trait SecretSource: Send + Sync {
    async fn fetch(&self) -> Result<String, SecretError>;
}

pub struct StaticSecret(String);

impl StaticSecret {
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }
}

#[async_trait]
impl SecretSource for StaticSecret {
    async fn fetch(&self) -> Result<String, SecretError> {
        Ok(self.0.clone())
    }
}

/// Secret kept as KMS ciphertext in the function environment.
pub struct KmsSecret {
    kms: kms::Client,
    ciphertext_b64: String,
    /// Lambda encrypts env vars with this as encryption context.
    function_name: Option<String>,
}

impl KmsSecret {
    pub fn new(kms: kms::Client, ciphertext_b64: String, function_name: Option<String>) -> Self {
        Self {
            kms,
            ciphertext_b64,
            function_name,
        }
    }
}

#[async_trait]
impl SecretSource for KmsSecret {
    async fn fetch(&self) -> Result<String, SecretError> {
        let blob = STANDARD
            .decode(self.ciphertext_b64.trim())
            .map_err(|_| SecretError::Decode)?;

        let mut req = self.kms.decrypt().ciphertext_blob(Blob::new(blob));
        if let Some(name) = &self.function_name {
            req = req.encryption_context("LambdaFunctionName", name);
        }
        let out = req
            .send()
            .await
            .map_err(|e| SecretError::Unavailable(format!("kms decrypt: {e}")))?;

        let plain = out
            .plaintext()
            .map(|b| b.as_ref().to_vec())
            .unwrap_or_default();
        String::from_utf8(plain).map_err(|_| SecretError::Unavailable("kms plaintext is not utf-8".into()))
    }
}

pub async fn source_from_config(cfg: &SecretConfig) -> Box<dyn SecretSource> {
    match cfg {
        SecretConfig::Static(s) => Box::new(StaticSecret::new(s.clone())),
        SecretConfig::KmsEncrypted(ct) => {
            let aws = aws_config::load_defaults(BehaviorVersion::latest()).await;
            Box::new(KmsSecret::new(
                kms::Client::new(&aws),
                ct.clone(),
                std::env::var("AWS_LAMBDA_FUNCTION_NAME").ok(),
            ))
        }
    }
}

/// Holds the signing secret for the life of the process once a fetch succeeds.
///
/// Failed or empty fetches are not remembered, so the next request tries again.
/// Concurrent cold-start callers may each fetch; they all get the same value.
pub struct SecretCache {
    source: Box<dyn SecretSource>,
    cached: RwLock<Option<SigningSecret>>,
}

impl SecretCache {
    pub fn new(source: Box<dyn SecretSource>) -> Self {
        Self {
            source,
            cached: RwLock::new(None),
        }
    }

    pub async fn get(&self) -> Result<SigningSecret, SecretError> {
        if let Some(s) = self.cached.read().await.as_ref() {
            return Ok(s.clone());
        }

        let raw = self.source.fetch().await?;
        if raw.is_empty() {
            return Err(SecretError::Empty);
        }
        let secret = SigningSecret(Arc::from(raw));
        *self.cached.write().await = Some(secret.clone());
        tracing::info!("signing secret loaded");
        Ok(secret)
    }

    /// Drops the cached secret; the next `get` fetches from the source again.
    pub async fn invalidate(&self) {
        let had = self.cached.write().await.take().is_some();
        tracing::info!(had_secret = had, "signing secret invalidated");
    }
}
