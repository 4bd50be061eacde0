use std::sync::Arc;

use crate::error::{LinkError, URL_INVALID, URL_REQUIRED};
use crate::id::new_code;
use crate::model::ShortLink;
use crate::store::{InsertOutcome, LinkStore};
use crate::util::valid_target;

/// Persists new short links, drawing a fresh random code for every attempt.
///
/// Uniqueness rests entirely on the store's insert-if-absent; nothing is read
/// before writing. A taken code means another draw, up to `max_attempts`.
#[derive(Clone)]
pub struct ShortCodeAllocator {
    store: Arc<dyn LinkStore>,
    max_attempts: u32,
}

impl ShortCodeAllocator {
    pub fn new(store: Arc<dyn LinkStore>, max_attempts: u32) -> Self {
        Self {
            store,
            max_attempts: max_attempts.max(1),
        }
    }

    /// Returns `base_url + code` once a mapping to `target_url` is stored.
    pub async fn allocate(&self, target_url: &str, base_url: &str) -> Result<String, LinkError> {
        if target_url.is_empty() {
            return Err(LinkError::InvalidInput(URL_REQUIRED));
        }
        if !valid_target(target_url) {
            return Err(LinkError::InvalidInput(URL_INVALID));
        }

        for attempt in 1..=self.max_attempts {
            let link = ShortLink::new(new_code(&mut rand::thread_rng()), target_url);
            match self.store.insert_if_absent(&link).await? {
                InsertOutcome::Inserted => {
                    tracing::info!(code = %link.code, attempt, "short link created");
                    return Ok(format!("{base_url}{}", link.code));
                }
                InsertOutcome::AlreadyExists => {
                    tracing::debug!(code = %link.code, attempt, "short code taken, drawing again");
                }
            }
        }

        tracing::error!(attempts = self.max_attempts, "no free short code found");
        Err(LinkError::Exhausted {
            attempts: self.max_attempts,
        })
    }
}
