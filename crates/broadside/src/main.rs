use broadside::{BroadsideError, BroadsideServer, DEFAULT_BIND};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), BroadsideError> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let addr = std::env::var("BROADSIDE_BIND").unwrap_or_else(|_| DEFAULT_BIND.to_string());
    let server = BroadsideServer::builder().bind(&addr).build().await?;
    if let Ok(local) = server.local_addr() {
        tracing::info!(%local, "listening");
    }
    server.run().await
}
