use lambda_runtime::{run, service_fn, Error, LambdaEvent};
use serde_json::Value as JsonValue;

use skrt::config::LinksConfig;
use skrt::handler::{self, Ctx};
use skrt::util::init_tracing;

#[tokio::main]
async fn main() -> Result<(), Error> {
    init_tracing();

    let cfg = LinksConfig::from_env()?;
    tracing::info!(table = %cfg.table_name, max_attempts = cfg.max_attempts, "starting links function");
    let ctx = Ctx::new(&cfg).await;

    // Clone once for the service closure; cheap (Arcs and a Client inside)
    let ctx_for_service = ctx.clone();

    run(service_fn(move |event: LambdaEvent<JsonValue>| {
        let ctx = ctx_for_service.clone();
        async move { Ok::<_, Error>(handler::router(event.payload, &ctx).await) }
    }))
    .await
}
