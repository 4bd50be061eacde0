use std::sync::Arc;

use aws_config::BehaviorVersion;
use aws_sdk_dynamodb as ddb;
use serde_json::Value as JsonValue;

use crate::{
    allocator::ShortCodeAllocator,
    config::LinksConfig,
    error::LinkError,
    event::{InboundEvent, Operation, INVALID_EVENT},
    model::{CreateResp, ResolveResp, Resolution},
    resolver::RedirectResolver,
    store::{DynamoLinkStore, LinkStore},
    util::{json_msg, resp_json, GatewayResponse},
};

#[derive(Clone)]
pub struct Ctx {
    pub allocator: ShortCodeAllocator,
    pub resolver: RedirectResolver,
    pub public_base_url: String,
}

impl Ctx {
    pub async fn new(cfg: &LinksConfig) -> Self {
        let config = aws_config::load_defaults(BehaviorVersion::latest()).await;
        let store = DynamoLinkStore::new(ddb::Client::new(&config), cfg.table_name.clone());
        Self::with_store(Arc::new(store), cfg)
    }

    pub fn with_store(store: Arc<dyn LinkStore>, cfg: &LinksConfig) -> Self {
        Self {
            allocator: ShortCodeAllocator::new(store.clone(), cfg.max_attempts),
            resolver: RedirectResolver::new(store),
            public_base_url: cfg.public_base_url.clone(),
        }
    }
}

pub async fn router(event: JsonValue, ctx: &Ctx) -> GatewayResponse {
    let op = match InboundEvent::from_value(event) {
        Ok(evt) => evt.into_operation(&ctx.public_base_url),
        Err(e) => {
            tracing::warn!(error = %e, "unrecognised event");
            Operation::Reject(INVALID_EVENT)
        }
    };

    match op {
        Operation::Create {
            target_url,
            base_url,
        } => create_link(&target_url, &base_url, ctx).await,
        Operation::Resolve { code } => resolve_link(&code, ctx).await,
        Operation::Reject(message) => json_msg(400, message),
    }
}

async fn create_link(target_url: &str, base_url: &str, ctx: &Ctx) -> GatewayResponse {
    match ctx.allocator.allocate(target_url, base_url).await {
        Ok(short_url) => {
            let out = CreateResp {
                message: "Short URL created successfully".to_string(),
                short_url,
            };
            resp_json(201, serde_json::json!(out))
        }
        Err(e) => error_response(e),
    }
}

async fn resolve_link(code: &str, ctx: &Ctx) -> GatewayResponse {
    match ctx.resolver.resolve(code).await {
        Ok(Resolution::Found(target)) => {
            let body = ResolveResp {
                parent_url: target.clone(),
            };
            resp_json(301, serde_json::json!(body)).with_header("Location", target)
        }
        Ok(Resolution::NotFound) => json_msg(404, "Short URL not found"),
        Err(e) => error_response(e),
    }
}

fn error_response(e: LinkError) -> GatewayResponse {
    let status = e.status();
    if status >= 500 {
        tracing::error!(error = %e, status, "request failed");
    }
    json_msg(status, e.to_string())
}
