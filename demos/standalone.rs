use std::{net::SocketAddr, sync::Arc};

use sim_feed_api::{
    config::{Config, SecretResolver},
    controller::{standalone, Context},
    error::Error,
    model::PgExecutor,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let _ = dotenvy::dotenv();
    let _ = env_logger::try_init();

    let config = Config::from_env()?;
    let addr: SocketAddr = config
        .listen_address()
        .parse()
        .map_err(|_| Error::ConfigMissing("LISTEN".into()))?;
    let secrets = SecretResolver::from_config(&config).await;
    let executor = PgExecutor::new(&secrets.database_url().await?);
    let ctx = Arc::new(Context::new(Arc::new(executor), secrets, config));

    standalone::serve(addr, ctx).await?;
    Ok(())
}
