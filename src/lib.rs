//! skrt: short links on DynamoDB behind a fail-closed JWT authorizer.
//!
//! Two Lambdas share this library:
//! - `skrt` creates and resolves short links (`handler::router`).
//! - `skrt_authorizer` answers API Gateway authorizer calls (`authorizer::handle`).

pub mod allocator;
pub mod auth;
pub mod authorizer;
pub mod config;
pub mod error;
pub mod event;
pub mod handler;
pub mod id;
pub mod model;
pub mod resolver;
pub mod secret;
pub mod store;
pub mod util;

#[cfg(test)]
mod testing;
