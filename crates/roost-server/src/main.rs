use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use roost_api::geocode::{Geocoder, HttpGeocoder};
use roost_api::storage::{GatewayStorage, ObjectStorage};
use roost_api::tokens::TokenManager;
use roost_api::{AppState, AppStateInner, router};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "roost=debug,tower_http=debug".into()),
        )
        .init();

    // Config
    let host = env_or("ROOST_HOST", "0.0.0.0");
    let port: u16 = env_or("ROOST_PORT", "3000").parse()?;
    let db_path = env_or("ROOST_DB_PATH", "roost.db");
    let upload_dir = env_or("ROOST_UPLOAD_DIR", "uploads");

    let access_secret = env_or("ROOST_ACCESS_SECRET", "dev-access-secret-change-me");
    let refresh_secret = env_or("ROOST_REFRESH_SECRET", "dev-refresh-secret-change-me");
    let access_ttl_minutes: i64 = env_or("ROOST_ACCESS_TTL_MINUTES", "15").parse()?;
    let refresh_ttl_days: i64 = env_or("ROOST_REFRESH_TTL_DAYS", "10").parse()?;

    let storage_url = env_or("ROOST_STORAGE_URL", "http://localhost:9000");
    let storage_key = env_or("ROOST_STORAGE_KEY", "dev-storage-key");
    let geocoder_url = env_or("ROOST_GEOCODER_URL", "http://localhost:9001");
    let geocoder_token = env_or("ROOST_GEOCODER_TOKEN", "dev-map-token");

    // Init database
    let db = roost_db::Database::open(&PathBuf::from(&db_path))?;

    // External collaborators are built here and injected; nothing below the
    // router reaches for globals.
    let storage: Arc<dyn ObjectStorage> = Arc::new(GatewayStorage::new(storage_url, storage_key));
    let geocoder: Arc<dyn Geocoder> = Arc::new(HttpGeocoder::new(geocoder_url, geocoder_token));
    let tokens = TokenManager::new(
        &access_secret,
        &refresh_secret,
        access_ttl_minutes,
        refresh_ttl_days,
    );

    let state: AppState = Arc::new(AppStateInner {
        db,
        tokens,
        storage,
        geocoder,
        upload_dir: PathBuf::from(upload_dir),
    });

    let app = router::router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    info!("Roost server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.into())
}
