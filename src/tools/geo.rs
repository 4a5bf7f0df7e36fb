use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use super::{f64_arg, str_arg, Tool, ToolArgs};
use crate::geocoder::Geocoder;
use crate::error::ProximityError;
use crate::proximity::{compute_bounding_box, Coordinate, DEFAULT_RADIUS_MILES};

/// `geocode_address`: address string → `{"latitude", "longitude"}`.
pub struct GeocodeTool {
    geocoder: Arc<dyn Geocoder>,
}

impl GeocodeTool {
    pub fn new(geocoder: Arc<dyn Geocoder>) -> Self {
        Self { geocoder }
    }
}

#[async_trait]
impl Tool for GeocodeTool {
    fn name(&self) -> &str {
        "geocode_address"
    }

    fn description(&self) -> &str {
        "Converts a street address into latitude/longitude coordinates. Use this whenever a \
         question is about the vicinity of an address rather than the address itself; never \
         guess coordinates. Include the city and state, e.g. '1601 W CHICAGO AVE, CHICAGO, \
         ILLINOIS'. The geocoding service is free and rate limited: at most one request per second."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "address": {
                    "type": "string",
                    "description": "Upper-cased street address with city and state, e.g. '1601 W CHICAGO AVE, CHICAGO, ILLINOIS'"
                }
            },
            "required": ["address"]
        })
    }

    async fn invoke(&self, args: &ToolArgs) -> Result<String, String> {
        let address = str_arg(args, "address").ok_or("address is required")?;
        let coordinate = self.geocoder.geocode(address).await.map_err(|e| e.to_string())?;
        serde_json::to_string(&coordinate).map_err(|e| e.to_string())
    }
}

/// `get_proximity_to_coords`: coordinate + radius → bounding box.
pub struct ProximityTool;

impl ProximityTool {
    fn center(args: &ToolArgs) -> Option<Coordinate> {
        if let (Some(lat), Some(lon)) = (f64_arg(args, "latitude"), f64_arg(args, "longitude")) {
            return Some(Coordinate::new(lat, lon));
        }
        // `coordinates` as a [lat, lon] pair or a geocode_address result object
        match args.get("coordinates")? {
            Value::Array(pair) if pair.len() == 2 => {
                Some(Coordinate::new(pair[0].as_f64()?, pair[1].as_f64()?))
            }
            object @ Value::Object(_) => serde_json::from_value(object.clone()).ok(),
            _ => None,
        }
    }

    /// Absent or null means the default; anything else must be a number.
    fn radius(args: &ToolArgs) -> Result<f64, String> {
        let key = ["radius_miles", "dist_in_miles"]
            .into_iter()
            .find(|k| !matches!(args.get(*k), None | Some(Value::Null)));
        match key {
            None => Ok(DEFAULT_RADIUS_MILES),
            Some(key) => f64_arg(args, key).ok_or_else(|| {
                format!("{} ({} must be a number of miles, got {})",
                    ProximityError::InvalidRadius(f64::NAN), key, args[key])
            }),
        }
    }
}

#[async_trait]
impl Tool for ProximityTool {
    fn name(&self) -> &str {
        "get_proximity_to_coords"
    }

    fn description(&self) -> &str {
        "Takes the coordinates of a location and a radius in miles and returns the north, south, \
         east and west bounds of the area. This does not accept an address: geocode the address \
         first. Pass the result as coordinate_boundaries to the search tools."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "latitude":     { "type": "number", "description": "Latitude in decimal degrees" },
                "longitude":    { "type": "number", "description": "Longitude in decimal degrees" },
                "radius_miles": { "type": "number", "description": "Search radius in miles (default 0.5)" }
            },
            "required": ["latitude", "longitude"]
        })
    }

    async fn invoke(&self, args: &ToolArgs) -> Result<String, String> {
        let center = Self::center(args).ok_or("latitude and longitude are required")?;
        let radius = Self::radius(args)?;

        let bbox = compute_bounding_box(center, radius).map_err(|e| e.to_string())?;
        tracing::debug!(%center, radius, %bbox, "computed bounding box");
        serde_json::to_string(&bbox).map_err(|e| e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GeocodingError;
    use crate::geocoder::MockGeocoder;
    use crate::proximity::BoundingBox;

    fn args(value: Value) -> ToolArgs {
        serde_json::from_value(value).unwrap()
    }

    #[tokio::test]
    async fn test_geocode_returns_coordinate_json() {
        let mut geocoder = MockGeocoder::new();
        geocoder.expect_geocode()
            .withf(|address| address.starts_with("1601 W CHICAGO AVE"))
            .times(1)
            .returning(|_| Ok(Coordinate::new(41.8958, -87.6688)));

        let tool = GeocodeTool::new(Arc::new(geocoder));
        let out = tool.invoke(&args(json!({ "address": "1601 W CHICAGO AVE, CHICAGO, ILLINOIS" }))).await.unwrap();
        let coordinate: Coordinate = serde_json::from_str(&out).unwrap();
        assert_eq!(coordinate, Coordinate::new(41.8958, -87.6688));
    }

    #[tokio::test]
    async fn test_geocode_failure_becomes_message() {
        let mut geocoder = MockGeocoder::new();
        geocoder.expect_geocode()
            .returning(|a| Err(GeocodingError::NotFound(a.to_string())));

        let tool = GeocodeTool::new(Arc::new(geocoder));
        let err = tool.invoke(&args(json!({ "address": "NOWHERE" }))).await.unwrap_err();
        assert_eq!(err, "No location found for address 'NOWHERE'");

        let err = tool.invoke(&ToolArgs::new()).await.unwrap_err();
        assert_eq!(err, "address is required");
    }

    #[tokio::test]
    async fn test_proximity_defaults_to_half_mile() {
        let out = ProximityTool
            .invoke(&args(json!({ "latitude": 41.98365, "longitude": -87.983745 })))
            .await
            .unwrap();
        let bbox: BoundingBox = serde_json::from_str(&out).unwrap();
        assert!((bbox.north - 41.990886508476436).abs() < 1e-9);
        assert!((bbox.west - -87.99348018168794).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_proximity_accepts_coordinate_pair_and_object() {
        let pair = ProximityTool
            .invoke(&args(json!({ "coordinates": [41.8958, -87.6688], "radius_miles": "0.1" })))
            .await
            .unwrap();
        let object = ProximityTool
            .invoke(&args(json!({
                "coordinates": { "latitude": 41.8958, "longitude": -87.6688 },
                "radius_miles": 0.1
            })))
            .await
            .unwrap();
        assert_eq!(pair, object);
    }

    #[tokio::test]
    async fn test_proximity_reports_invalid_radius() {
        let err = ProximityTool
            .invoke(&args(json!({ "latitude": 41.9, "longitude": -87.6, "radius_miles": -1 })))
            .await
            .unwrap_err();
        assert!(err.starts_with("Invalid radius"), "{err}");
    }

    #[tokio::test]
    async fn test_unparseable_radius_is_not_replaced_by_default() {
        for radius in [json!("a quarter mile"), json!(true), json!([0.25])] {
            let err = ProximityTool
                .invoke(&args(json!({ "latitude": 41.8958, "longitude": -87.6688, "radius_miles": radius })))
                .await
                .unwrap_err();
            assert!(err.starts_with("Invalid radius"), "{err}");
            assert!(err.contains("radius_miles must be a number"), "{err}");
        }

        let err = ProximityTool
            .invoke(&args(json!({ "latitude": 41.8958, "longitude": -87.6688, "dist_in_miles": "far" })))
            .await
            .unwrap_err();
        assert!(err.contains("dist_in_miles must be a number"), "{err}");
    }

    #[tokio::test]
    async fn test_null_radius_uses_default() {
        let explicit = ProximityTool
            .invoke(&args(json!({ "latitude": 41.98365, "longitude": -87.983745, "radius_miles": 0.5 })))
            .await
            .unwrap();
        let null = ProximityTool
            .invoke(&args(json!({ "latitude": 41.98365, "longitude": -87.983745, "radius_miles": null })))
            .await
            .unwrap();
        assert_eq!(explicit, null);
    }
}
