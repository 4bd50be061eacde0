//! The key space behind short codes: an insert-if-absent write and a point read.

use std::collections::HashMap;

use async_trait::async_trait;
use aws_sdk_dynamodb as ddb;
use aws_sdk_dynamodb::config::http::HttpResponse;
use aws_sdk_dynamodb::error::{ProvideErrorMetadata, SdkError}; // for .code()
use chrono::{DateTime, Utc};
use ddb::types::AttributeValue as Av;

use crate::error::StoreError;
use crate::model::ShortLink;

// Attribute names match the existing url-shortener-skr table.
const ATTR_CODE: &str = "shortId";
const ATTR_TARGET: &str = "parentUrl";
const ATTR_CREATED: &str = "createdAt";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    AlreadyExists,
}

#[async_trait]
pub trait LinkStore: Send + Sync {
    /// Atomically writes `link` unless its code is already taken.
    async fn insert_if_absent(&self, link: &ShortLink) -> Result<InsertOutcome, StoreError>;

    async fn get(&self, code: &str) -> Result<Option<ShortLink>, StoreError>;
}

#[derive(Clone)]
pub struct DynamoLinkStore {
    ddb: ddb::Client,
    table: String,
}

impl DynamoLinkStore {
    pub fn new(ddb: ddb::Client, table: impl Into<String>) -> Self {
        Self {
            ddb,
            table: table.into(),
        }
    }
}

fn map_ddb_err<E>(op: &str, e: SdkError<E, HttpResponse>) -> StoreError
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
{
    let status = e.raw_response().map(|r| r.status().as_u16());
    let message = e
        .message()
        .map(str::to_string)
        .unwrap_or_else(|| e.to_string());
    tracing::error!(op, ?status, code = ?e.code(), %message, "ddb request failed");
    StoreError::new(status, format!("ddb {op}: {message}"))
}

fn link_from_item(code: &str, item: &HashMap<String, Av>) -> Option<ShortLink> {
    let target = item.get(ATTR_TARGET).and_then(|v| v.as_s().ok())?;
    if target.is_empty() {
        return None;
    }
    let created_at = item
        .get(ATTR_CREATED)
        .and_then(|v| v.as_s().ok())
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|t| t.with_timezone(&Utc));
    if created_at.is_none() {
        tracing::warn!(code, "stored link has no readable createdAt");
    }
    Some(ShortLink {
        code: code.to_string(),
        target_url: target.clone(),
        created_at: created_at.unwrap_or_default(),
    })
}

#[async_trait]
impl LinkStore for DynamoLinkStore {
    async fn insert_if_absent(&self, link: &ShortLink) -> Result<InsertOutcome, StoreError> {
        let mut item = HashMap::new();
        item.insert(ATTR_CODE.into(), Av::S(link.code.clone()));
        item.insert(ATTR_TARGET.into(), Av::S(link.target_url.clone()));
        item.insert(ATTR_CREATED.into(), Av::S(link.created_at.to_rfc3339()));

        let r = self
            .ddb
            .put_item()
            .table_name(&self.table)
            .set_item(Some(item))
            .condition_expression("attribute_not_exists(#c)")
            .expression_attribute_names("#c", ATTR_CODE)
            .send()
            .await;

        match r {
            Ok(_) => Ok(InsertOutcome::Inserted),
            Err(e) => {
                if e.code() == Some("ConditionalCheckFailedException") {
                    return Ok(InsertOutcome::AlreadyExists);
                }
                Err(map_ddb_err("put", e))
            }
        }
    }

    async fn get(&self, code: &str) -> Result<Option<ShortLink>, StoreError> {
        let r = self
            .ddb
            .get_item()
            .table_name(&self.table)
            .key(ATTR_CODE, Av::S(code.to_string()))
            .consistent_read(true)
            .send()
            .await
            .map_err(|e| map_ddb_err("get", e))?;

        Ok(r.item.as_ref().and_then(|item| link_from_item(code, item)))
    }
}
