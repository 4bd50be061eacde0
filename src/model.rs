use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One code -> target mapping as persisted in the key space.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ShortLink {
    pub code: String,
    pub target_url: String,
    pub created_at: DateTime<Utc>,
}

impl ShortLink {
    pub fn new(code: String, target_url: &str) -> Self {
        Self {
            code,
            target_url: target_url.to_string(),
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CreateResp {
    pub message: String,
    #[serde(rename = "shortUrl")]
    pub short_url: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ResolveResp {
    #[serde(rename = "parentUrl")]
    pub parent_url: String,
}

/// Outcome of a lookup; a missing code is a normal result, not an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Found(String),
    NotFound,
}
