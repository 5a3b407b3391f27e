use anyhow::{Result, anyhow};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use roost_types::models::Geometry;

/// External forward-geocoding collaborator: free-text location to a point
/// geometry. Injected via app state, like `ObjectStorage`.
#[async_trait]
pub trait Geocoder: Send + Sync {
    async fn forward(&self, query: &str) -> Result<Geometry>;
}

/// HTTP client for a mapbox-style forward-geocoding endpoint; takes the
/// first returned feature.
pub struct HttpGeocoder {
    client: reqwest::Client,
    base_url: String,
    token: String,
}

#[derive(Deserialize)]
struct GeocodeResponse {
    features: Vec<GeocodeFeature>,
}

#[derive(Deserialize)]
struct GeocodeFeature {
    geometry: Geometry,
}

impl HttpGeocoder {
    pub fn new(base_url: String, token: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url,
            token,
        }
    }
}

#[async_trait]
impl Geocoder for HttpGeocoder {
    async fn forward(&self, query: &str) -> Result<Geometry> {
        let resp: GeocodeResponse = self
            .client
            .get(format!("{}/geocode", self.base_url))
            .query(&[("q", query), ("limit", "1"), ("access_token", &self.token)])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let feature = resp
            .features
            .into_iter()
            .next()
            .ok_or_else(|| anyhow!("no geocoding result for '{}'", query))?;
        debug!("Geocoded '{}' to {:?}", query, feature.geometry);
        Ok(feature.geometry)
    }
}
