use serde::{Deserialize, Serialize};

/// GeoJSON-style location attached to a listing. The tag restricts the
/// `type` field to the single literal value `"Point"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Geometry {
    Point { coordinates: [f64; 2] },
}

impl Geometry {
    pub fn point(lon: f64, lat: f64) -> Self {
        Geometry::Point {
            coordinates: [lon, lat],
        }
    }

    /// (lon, lat) pair, in GeoJSON coordinate order.
    pub fn coordinates(&self) -> (f64, f64) {
        match self {
            Geometry::Point { coordinates } => (coordinates[0], coordinates[1]),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn geometry_serializes_as_geojson_point() {
        let g = Geometry::point(77.59, 12.97);
        let json = serde_json::to_value(&g).unwrap();
        assert_eq!(json["type"], "Point");
        assert_eq!(json["coordinates"][0], 77.59);
        assert_eq!(json["coordinates"][1], 12.97);
    }

    #[test]
    fn geometry_rejects_non_point_type() {
        let err = serde_json::from_str::<Geometry>(
            r#"{"type":"Polygon","coordinates":[1.0,2.0]}"#,
        );
        assert!(err.is_err());
    }
}
