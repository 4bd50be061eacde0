//! Test doubles shared by the unit tests.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde_json::Value as JsonValue;

use crate::auth::{Claims, HmacVerifier, TokenVerifier};
use crate::error::StoreError;
use crate::model::ShortLink;
use crate::secret::{SecretError, SecretSource, SigningSecret};
use crate::store::{InsertOutcome, LinkStore};

pub const SECRET: &str = "test-signing-secret";

pub fn now_secs() -> u64 {
    chrono::Utc::now().timestamp() as u64
}

pub fn mint(claims: JsonValue, secret: &str) -> String {
    mint_with(Algorithm::HS256, claims, secret)
}

pub fn mint_with(alg: Algorithm, claims: JsonValue, secret: &str) -> String {
    encode(
        &Header::new(alg),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .unwrap()
}

pub fn token_with_role(role: &str) -> String {
    mint(
        serde_json::json!({ "role": role, "sub": "u-1", "exp": now_secs() + 3600 }),
        SECRET,
    )
}

/// In-process key space with the same insert-if-absent contract as DynamoDB.
#[derive(Default)]
pub struct MemoryLinkStore {
    links: tokio::sync::Mutex<HashMap<String, ShortLink>>,
}

impl MemoryLinkStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.links.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.links.lock().await.is_empty()
    }
}

#[async_trait]
impl LinkStore for MemoryLinkStore {
    async fn insert_if_absent(&self, link: &ShortLink) -> Result<InsertOutcome, StoreError> {
        let mut links = self.links.lock().await;
        if links.contains_key(&link.code) {
            return Ok(InsertOutcome::AlreadyExists);
        }
        links.insert(link.code.clone(), link.clone());
        Ok(InsertOutcome::Inserted)
    }

    async fn get(&self, code: &str) -> Result<Option<ShortLink>, StoreError> {
        Ok(self.links.lock().await.get(code).cloned())
    }
}

/// Store that replays scripted insert outcomes before delegating to memory,
/// and records every call.
#[derive(Default)]
pub struct ScriptedStore {
    inner: MemoryLinkStore,
    insert_script: Mutex<VecDeque<Result<InsertOutcome, StoreError>>>,
    get_error: Mutex<Option<StoreError>>,
    pub attempted_codes: Mutex<Vec<String>>,
    pub inserts: AtomicUsize,
    pub gets: AtomicUsize,
}

impl ScriptedStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn script_inserts(
        outcomes: impl IntoIterator<Item = Result<InsertOutcome, StoreError>>,
    ) -> Arc<Self> {
        let s = Self::default();
        *s.insert_script.lock().unwrap() = outcomes.into_iter().collect();
        Arc::new(s)
    }

    pub fn failing_gets(err: StoreError) -> Arc<Self> {
        let s = Self::default();
        *s.get_error.lock().unwrap() = Some(err);
        Arc::new(s)
    }

    pub async fn seed(&self, code: &str, target: &str) {
        self.inner
            .insert_if_absent(&ShortLink::new(code.to_string(), target))
            .await
            .unwrap();
    }

    pub fn insert_calls(&self) -> usize {
        self.inserts.load(Ordering::SeqCst)
    }

    pub fn get_calls(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
    }

    pub async fn stored(&self, code: &str) -> Option<ShortLink> {
        self.inner.get(code).await.unwrap()
    }
}

#[async_trait]
impl LinkStore for ScriptedStore {
    async fn insert_if_absent(&self, link: &ShortLink) -> Result<InsertOutcome, StoreError> {
        self.inserts.fetch_add(1, Ordering::SeqCst);
        self.attempted_codes.lock().unwrap().push(link.code.clone());
        let scripted = self.insert_script.lock().unwrap().pop_front();
        match scripted {
            Some(outcome) => outcome,
            None => self.inner.insert_if_absent(link).await,
        }
    }

    async fn get(&self, code: &str) -> Result<Option<ShortLink>, StoreError> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        let err = self.get_error.lock().unwrap().clone();
        match err {
            Some(e) => Err(e),
            None => self.inner.get(code).await,
        }
    }
}

/// Secret source that counts fetches and can be switched between values.
pub struct CountingSecretSource {
    pub value: Mutex<Option<String>>,
    pub fetches: AtomicUsize,
}

impl CountingSecretSource {
    pub fn new(value: Option<&str>) -> Arc<Self> {
        Arc::new(Self {
            value: Mutex::new(value.map(str::to_string)),
            fetches: AtomicUsize::new(0),
        })
    }

    pub fn set(&self, value: Option<&str>) {
        *self.value.lock().unwrap() = value.map(str::to_string);
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SecretSource for Arc<CountingSecretSource> {
    async fn fetch(&self) -> Result<String, SecretError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        let v = self.value.lock().unwrap().clone();
        v.ok_or_else(|| SecretError::Unavailable("no secret configured".into()))
    }
}

/// Real HMAC verification wrapped with a call counter.
pub struct CountingVerifier {
    inner: HmacVerifier,
    pub calls: AtomicUsize,
}

impl CountingVerifier {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            inner: HmacVerifier::new(0),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl TokenVerifier for Arc<CountingVerifier> {
    fn verify(&self, token: &str, secret: &SigningSecret) -> Result<Claims, jsonwebtoken::errors::Error> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.verify(token, secret)
    }
}
