use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use redis_replica::{config::ServerConfig, server::RedisServer};

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let config = ServerConfig::parse();
    let server = RedisServer::new(config).await?;

    server.run().await
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}
