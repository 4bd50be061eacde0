use std::sync::Arc;

use crate::error::{LinkError, CODE_REQUIRED};
use crate::model::Resolution;
use crate::store::LinkStore;

/// Point lookups of short codes. Every call reads the store; nothing is cached.
#[derive(Clone)]
pub struct RedirectResolver {
    store: Arc<dyn LinkStore>,
}

impl RedirectResolver {
    pub fn new(store: Arc<dyn LinkStore>) -> Self {
        Self { store }
    }

    pub async fn resolve(&self, code: &str) -> Result<Resolution, LinkError> {
        if code.is_empty() {
            return Err(LinkError::InvalidInput(CODE_REQUIRED));
        }
        match self.store.get(code).await? {
            Some(link) => Ok(Resolution::Found(link.target_url)),
            None => {
                tracing::debug!(code, "short code not found");
                Ok(Resolution::NotFound)
            }
        }
    }
}
