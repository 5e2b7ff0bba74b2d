use storefront::{
    config::AppConfig,
    store::{PgStore, Store},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let config = AppConfig::from_env()?;
    // Connecting creates missing tables and seeds an empty catalogue.
    let store = PgStore::connect(&config.database_dsn).await?;
    store.shutdown().await;
    println!("Schema ensured");
    Ok(())
}
