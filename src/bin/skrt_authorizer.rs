use std::sync::Arc;

use lambda_runtime::{service_fn, Error as LambdaError, LambdaEvent};
use serde_json::Value as JsonValue;

use skrt::auth::{AccessDecisionEngine, HmacVerifier};
use skrt::authorizer;
use skrt::config::AuthorizerConfig;
use skrt::secret::{source_from_config, SecretCache};
use skrt::util::init_tracing;

#[tokio::main]
async fn main() -> Result<(), LambdaError> {
    init_tracing();

    let cfg = AuthorizerConfig::from_env()?;
    let secrets = Arc::new(SecretCache::new(source_from_config(&cfg.secret).await));
    // one engine per process, so the secret cache outlives individual invocations
    let engine = Arc::new(AccessDecisionEngine::new(
        secrets,
        Box::new(HmacVerifier::new(cfg.leeway_secs)),
    ));

    lambda_runtime::run(service_fn(move |event: LambdaEvent<JsonValue>| {
        let engine = engine.clone();
        async move { Ok::<_, LambdaError>(authorizer::handle(&engine, event.payload).await) }
    }))
    .await
}
