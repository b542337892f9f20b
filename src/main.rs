use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use mathmaster_api::{
    config::Config,
    create_router,
    services::AppState,
    storage::{MemStorage, MongoStorage, Storage},
};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mathmaster_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Math Master API");

    let config = Config::load().expect("Failed to load configuration");
    tracing::info!(
        "Configuration loaded for environment: {:?}",
        std::env::var("APP_ENV").unwrap_or_else(|_| "dev".to_string())
    );

    let storage: Arc<dyn Storage> = match &config.mongo_uri {
        Some(uri) => {
            let mongo_client = mongodb::Client::with_uri_str(uri)
                .await
                .expect("Failed to connect to MongoDB");
            tracing::info!("MongoDB connected, database: {}", config.mongo_database);
            Arc::new(MongoStorage::new(
                mongo_client.database(&config.mongo_database),
            ))
        }
        None => {
            tracing::warn!("No MongoDB URI configured, using in-memory storage");
            Arc::new(MemStorage::new())
        }
    };

    let bind_address = config.bind_address.clone();
    let app_state = Arc::new(AppState::new(config, storage));
    let app = create_router(app_state);

    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .expect("Failed to bind listener");

    tracing::info!("Server listening on {}", listener.local_addr().unwrap());

    axum::serve(listener, app).await.unwrap();
}
