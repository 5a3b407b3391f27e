pub mod error;
pub mod extract;
pub mod geocode;
pub mod listings;
pub mod response;
pub mod reviews;
pub mod router;
pub mod storage;
pub mod tokens;
pub mod users;

use std::path::PathBuf;
use std::sync::Arc;

use roost_db::Database;

use crate::geocode::Geocoder;
use crate::storage::ObjectStorage;
use crate::tokens::TokenManager;

pub type AppState = Arc<AppStateInner>;

/// Shared application state. The storage and geocoder collaborators are
/// trait objects constructed at startup so tests can swap in doubles.
pub struct AppStateInner {
    pub db: Database,
    pub tokens: TokenManager,
    pub storage: Arc<dyn ObjectStorage>,
    pub geocoder: Arc<dyn Geocoder>,
    pub upload_dir: PathBuf,
}

/// Parse a SQLite timestamp into UTC.
pub fn parse_timestamp(raw: &str) -> chrono::DateTime<chrono::Utc> {
    raw.parse::<chrono::DateTime<chrono::Utc>>()
        .or_else(|_| {
            // SQLite stores timestamps as "YYYY-MM-DD HH:MM:SS" without timezone.
            // Parse as naive UTC and convert.
            chrono::NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc())
        })
        .unwrap_or_else(|e| {
            tracing::warn!("Corrupt timestamp '{}': {}", raw, e);
            chrono::DateTime::default()
        })
}
