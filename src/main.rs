use std::sync::Arc;
use sqlx::sqlite::SqlitePoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use noticeboard::{
    api,
    config::Settings,
    service::ServiceContext,
    storage::LocalObjectStorage,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "noticeboard=debug,tower_http=debug,axum=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let settings = Settings::new().unwrap_or_else(|e| {
        tracing::warn!("Failed to load config: {}. Using defaults.", e);
        Settings::default()
    });

    tracing::info!("Starting notice board on {}:{}", settings.server.host, settings.server.port);

    // Initialize database
    let db_pool = SqlitePoolOptions::new()
        .max_connections(settings.database.max_connections)
        .connect(&settings.database.url)
        .await?;

    // Run migrations
    sqlx::migrate!("./migrations")
        .run(&db_pool)
        .await?;

    let storage = Arc::new(LocalObjectStorage::new(
        &settings.storage.root,
        &settings.storage.public_base_url,
        settings.storage.max_file_size_bytes,
    ));
    tracing::info!("Storing uploads under {}", storage.root().display());

    tracing::info!(
        "Role lookup failures: {:?}; failed uploads: {:?}",
        settings.policy.role_lookup_failure,
        settings.policy.attachment_upload_failure
    );

    let service_context = Arc::new(ServiceContext::new(db_pool.clone(), storage, &settings));

    let purged = service_context.auth_service.cleanup_expired_sessions().await?;
    if purged > 0 {
        tracing::info!("Removed {} expired session(s)", purged);
    }

    let app = api::create_app(service_context, Arc::new(settings.clone()));

    let listener = tokio::net::TcpListener::bind(
        format!("{}:{}", settings.server.host, settings.server.port)
    ).await?;

    tracing::info!("Server listening on {}", settings.server.base_url);

    axum::serve(listener, app).await?;

    Ok(())
}
