use std::sync::Arc;

use lambda_http::{service_fn, Error as LambdaError};
use sim_feed_api::{
    config::{Config, SecretResolver},
    controller::{lambda::entrypoint, Context},
    model::PgExecutor,
};

#[tokio::main]
async fn main() -> Result<(), LambdaError> {
    let _ = env_logger::try_init();

    let config = Config::from_env()?;
    let secrets = SecretResolver::from_config(&config).await;
    let executor = PgExecutor::new(&secrets.database_url().await?);
    let ctx = Arc::new(Context::new(Arc::new(executor), secrets, config));

    lambda_http::run(service_fn(move |req| entrypoint(req, ctx.clone()))).await?;
    Ok(())
}
