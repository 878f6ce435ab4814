use std::sync::Arc;

use dotenvy::dotenv;
use snafu::ResultExt;

use byteshorts::api::{self, App};
use byteshorts::config::Config;
use byteshorts::error::{ApplicationError, BindAddressSnafu, OpenStoreSnafu, SeedStoreSnafu, WebServerSnafu};
use byteshorts::logging;
use byteshorts::model::NewVideo;
use byteshorts::store::VideoStore;

#[tokio::main]
async fn main() -> Result<(), ApplicationError> {
    dotenv().ok();

    let config = Config::from_env()?;

    let _guard = logging::init(&config)?;

    let store = Arc::new(
        VideoStore::open(&config.data_dir)
            .await
            .context(OpenStoreSnafu)?,
    );

    let app = api::create_app(store.clone(), config.layout_params());

    if config.seed && store.is_empty() {
        seed(&app).await?;
    }

    let listener = tokio::net::TcpListener::bind(config.host)
        .await
        .context(BindAddressSnafu {
            address: config.host,
        })?;

    tracing::info!(host = %config.host, "byteshorts is listening");

    axum::serve(listener, api::create_router(app))
        .await
        .context(WebServerSnafu)
}

/// First boot gets the same welcome video the original database shipped with.
async fn seed(app: &App) -> Result<(), ApplicationError> {
    let welcome = NewVideo::new(
        "欢迎来到 ByteShorts".to_string(),
        "生活".to_string(),
        "https://commondatastorage.googleapis.com/gtv-videos-bucket/sample/BigBuckBunny.mp4"
            .to_string(),
        "u1".to_string(),
        "Admin".to_string(),
    );

    let record = app.publish(welcome).await.context(SeedStoreSnafu)?;
    tracing::info!(video = %record.id, "seeded the welcome video");

    Ok(())
}
