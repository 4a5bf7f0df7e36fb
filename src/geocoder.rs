use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use crate::config::Settings;
use crate::error::GeocodingError;
use crate::proximity::Coordinate;

/// Resolves a human-readable address to a coordinate.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Geocoder: Send + Sync {
    async fn geocode(&self, address: &str) -> Result<Coordinate, GeocodingError>;
}

#[derive(Deserialize, Debug)]
struct NominatimPlace {
    lat: String,
    lon: String,
}

/// Geocoder backed by an OpenStreetMap Nominatim instance.
///
/// The public instance asks clients to stay under one request per second and
/// to identify themselves with a User-Agent. Callers are responsible for
/// pacing; this type only retries transient failures.
pub struct NominatimGeocoder {
    client:       reqwest::Client,
    base_url:     String,
    max_attempts: u32,
    retry_delay:  Duration,
}

impl NominatimGeocoder {
    pub fn new(settings: &Settings) -> Result<Self, GeocodingError> {
        let client = reqwest::Client::builder()
            .user_agent(settings.geocoder_user_agent.clone())
            .timeout(settings.request_timeout())
            .build()
            .map_err(|e| GeocodingError::Malformed(format!("client setup failed: {}", e)))?;
        Ok(Self {
            client,
            base_url:     settings.geocoder_base_url.trim_end_matches('/').to_string(),
            max_attempts: settings.geocoder_max_attempts.max(1),
            retry_delay:  settings.geocoder_retry_delay(),
        })
    }

    async fn attempt(&self, address: &str) -> Result<Coordinate, Attempt> {
        let response = self.client
            .get(format!("{}/search", self.base_url))
            .query(&[("q", address), ("format", "jsonv2"), ("limit", "1")])
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() || e.is_connect() || e.is_request() {
                    Attempt::Transient(format!("Network error: {}", e))
                } else {
                    Attempt::Fatal(GeocodingError::Malformed(e.to_string()))
                }
            })?;

        let status = response.status();
        if status.as_u16() == 429 || status.is_server_error() {
            return Err(Attempt::Transient(format!("HTTP {}", status)));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Attempt::Fatal(GeocodingError::Status { status: status.as_u16(), body }));
        }

        let places: Vec<NominatimPlace> = response.json()
            .await
            .map_err(|e| Attempt::Fatal(GeocodingError::Malformed(e.to_string())))?;

        let place = places.into_iter().next()
            .ok_or_else(|| Attempt::Fatal(GeocodingError::NotFound(address.to_string())))?;

        let parse = |raw: &str| raw.parse::<f64>()
            .map_err(|_| Attempt::Fatal(GeocodingError::Malformed(format!("bad coordinate '{}'", raw))));
        Ok(Coordinate::new(parse(&place.lat)?, parse(&place.lon)?))
    }
}

enum Attempt {
    Transient(String),
    Fatal(GeocodingError),
}

#[async_trait]
impl Geocoder for NominatimGeocoder {
    async fn geocode(&self, address: &str) -> Result<Coordinate, GeocodingError> {
        let mut delay = self.retry_delay;
        let mut last_err = String::new();

        for attempt in 1..=self.max_attempts {
            tracing::info!(address, attempt, "geocoding address");
            match self.attempt(address).await {
                Ok(coordinate) => return Ok(coordinate),
                Err(Attempt::Fatal(e)) => {
                    tracing::error!(address, error = %e, "geocoding failed, not retrying");
                    return Err(e);
                }
                Err(Attempt::Transient(e)) => {
                    last_err = e;
                    if attempt < self.max_attempts {
                        tracing::warn!(
                            attempt,
                            max    = self.max_attempts,
                            wait_ms = delay.as_millis() as u64,
                            error  = %last_err,
                            "geocoder transient error, retrying"
                        );
                        tokio::time::sleep(delay).await;
                        delay = std::cmp::min(delay * 2, Duration::from_secs(60));
                    }
                }
            }
        }

        Err(GeocodingError::Unavailable { attempts: self.max_attempts, last: last_err })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    fn settings_for(server: &mockito::Server) -> Settings {
        Settings {
            geocoder_base_url:       server.url(),
            geocoder_retry_delay_ms: 1,
            ..Settings::default()
        }
    }

    #[tokio::test]
    async fn test_geocode_parses_first_match() {
        let mut server = mockito::Server::new_async().await;
        let mock = server.mock("GET", "/search")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("q".into(), "1601 W CHICAGO AVE, CHICAGO, ILLINOIS".into()),
                Matcher::UrlEncoded("format".into(), "jsonv2".into()),
            ]))
            .match_header("user-agent", "chicago_location_investigator")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"[{"lat": "41.8958", "lon": "-87.6688", "display_name": "1601"}]"#)
            .create_async()
            .await;

        let geocoder = NominatimGeocoder::new(&settings_for(&server)).unwrap();
        let c = geocoder.geocode("1601 W CHICAGO AVE, CHICAGO, ILLINOIS").await.unwrap();

        assert_eq!(c, Coordinate::new(41.8958, -87.6688));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_empty_result_is_not_found() {
        let mut server = mockito::Server::new_async().await;
        let mock = server.mock("GET", "/search")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body("[]")
            .expect(1)
            .create_async()
            .await;

        let geocoder = NominatimGeocoder::new(&settings_for(&server)).unwrap();
        let err = geocoder.geocode("NOWHERE").await.unwrap_err();

        assert!(matches!(err, GeocodingError::NotFound(a) if a == "NOWHERE"));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_unavailable_is_retried_then_surfaced() {
        let mut server = mockito::Server::new_async().await;
        let mock = server.mock("GET", "/search")
            .match_query(Matcher::Any)
            .with_status(503)
            .expect(3)
            .create_async()
            .await;

        let geocoder = NominatimGeocoder::new(&settings_for(&server)).unwrap();
        let err = geocoder.geocode("1601 W CHICAGO AVE").await.unwrap_err();

        assert!(matches!(err, GeocodingError::Unavailable { attempts: 3, .. }), "{err:?}");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_client_error_is_not_retried() {
        let mut server = mockito::Server::new_async().await;
        let mock = server.mock("GET", "/search")
            .match_query(Matcher::Any)
            .with_status(403)
            .with_body("blocked")
            .expect(1)
            .create_async()
            .await;

        let geocoder = NominatimGeocoder::new(&settings_for(&server)).unwrap();
        let err = geocoder.geocode("1601 W CHICAGO AVE").await.unwrap_err();

        assert!(matches!(err, GeocodingError::Status { status: 403, .. }));
        mock.assert_async().await;
    }
}
