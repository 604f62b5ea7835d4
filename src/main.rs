//! Demo binary: serves the account API over in-memory stores.

use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::info;

use portcullis::account::{self, AppState};
use portcullis::blobs::InMemoryImageStore;
use portcullis::config::AppConfig;
use portcullis::directory::InMemoryDirectory;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .json()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let config = Arc::new(AppConfig::from_env().context("configuration")?);

    let directory = Arc::new(InMemoryDirectory::new(config.user_table.clone()));
    let images = Arc::new(InMemoryImageStore::new(
        config.profile_images_bucket.clone(),
    ));

    let app = account::router(AppState::new(config, directory, images));

    let listener = tokio::net::TcpListener::bind("0.0.0.0:3000")
        .await
        .context("bind 0.0.0.0:3000")?;
    info!(addr = "0.0.0.0:3000", "listening");
    axum::serve(listener, app).await.context("serve")?;

    Ok(())
}
