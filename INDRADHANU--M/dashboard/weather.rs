use std::time::Duration;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::warn;

/// Default OpenWeatherMap base URL.
pub const DEFAULT_WEATHER_ENDPOINT: &str = "http://api.openweathermap.org";

/// Grid centre used when geocoding is impossible.
pub const DEFAULT_CENTER: (f64, f64) = (19.0760, 72.8777);

/// Largest grid edge served; larger requests are clamped.
pub const MAX_GRID_SIZE: usize = 11;

const KM_PER_DEGREE: f64 = 111.0;
const KELVIN_OFFSET: f64 = 273.15;
const SYNTHETIC_KELVIN: f64 = 298.15;

/// Connection settings for the weather upstream.
#[derive(Debug, Clone)]
pub struct WeatherSettings {
    /// Base URL, without trailing slash.
    pub endpoint: String,
    /// API key; `None` serves synthetic data only.
    pub api_key: Option<String>,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl WeatherSettings {
    /// Settings against the public endpoint with a 5 s timeout.
    #[must_use]
    pub fn new(api_key: Option<String>) -> Self {
        Self {
            endpoint: DEFAULT_WEATHER_ENDPOINT.to_string(),
            api_key: api_key.filter(|key| !key.trim().is_empty()),
            timeout: Duration::from_secs(5),
        }
    }
}

/// Where a grid point's temperature came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GridSource {
    /// Generated locally.
    Synthetic,
    /// Fetched upstream.
    OpenWeatherMap,
    /// Upstream failed for this point.
    Fallback,
}

/// One cell of a temperature grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridPoint {
    /// Latitude.
    pub lat: f64,
    /// Longitude.
    pub lng: f64,
    /// Temperature in °C, null when unknown.
    pub temp_c: Option<f64>,
    /// Provenance.
    pub source: GridSource,
}

/// Temperature grid around a city.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemperatureGrid {
    /// City requested.
    pub city: String,
    /// Row-major points, south-west first.
    pub points: Vec<GridPoint>,
    /// Set when the upstream failed as a whole.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TemperatureGrid {
    /// Synthetic grid around [`DEFAULT_CENTER`]. `jitter` staggers alternate
    /// rows and columns by half a step.
    #[must_use]
    pub fn synthetic(city: &str, grid_size: usize, jitter: bool) -> Self {
        let (center_lat, center_lon) = DEFAULT_CENTER;
        let points = offsets(grid_size)
            .map(|(i, j)| {
                let (lat_skew, lon_skew) = if jitter {
                    (0.005 * f64::from(j.rem_euclid(2)), 0.005 * f64::from(i.rem_euclid(2)))
                } else {
                    (0.0, 0.0)
                };
                GridPoint {
                    lat: center_lat + f64::from(i) * 0.01 + lat_skew,
                    lng: center_lon + f64::from(j) * 0.01 + lon_skew,
                    temp_c: Some(round2(28.0 + f64::from(i) * 0.8 + f64::from(j) * 0.5)),
                    source: GridSource::Synthetic,
                }
            })
            .collect();
        Self {
            city: city.to_string(),
            points,
            error: None,
        }
    }
}

/// OpenWeatherMap client with synthetic fallbacks; never returns an error to
/// callers of its lookups.
#[derive(Debug, Clone)]
pub struct WeatherClient {
    http: reqwest::Client,
    settings: WeatherSettings,
}

impl WeatherClient {
    /// Builds the HTTP client.
    pub fn new(settings: WeatherSettings) -> Result<Self> {
        if settings.timeout.is_zero() {
            bail!("weather timeout must be positive");
        }
        let http = reqwest::Client::builder()
            .timeout(settings.timeout)
            .build()
            .context("building weather http client")?;
        Ok(Self { http, settings })
    }

    /// True when an API key is configured.
    #[must_use]
    pub const fn has_key(&self) -> bool {
        self.settings.api_key.is_some()
    }

    /// Current conditions for `city`, tagged with a `source` field.
    pub async fn current(&self, city: &str) -> Value {
        let Some(key) = &self.settings.api_key else {
            return json!({
                "city": city,
                "temperature": SYNTHETIC_KELVIN,
                "weather": "Clear",
                "source": "synthetic"
            });
        };
        match self.get_json("data/2.5/weather", &[("q", city), ("appid", key)]).await {
            Ok(mut data) => {
                if let Some(object) = data.as_object_mut() {
                    object.insert("source".into(), json!("openweathermap"));
                }
                data
            }
            Err(err) => {
                warn!(city, error = %err, "weather lookup failed");
                json!({ "city": city, "error": format!("{err:#}"), "source": "fallback" })
            }
        }
    }

    /// Odd-sized temperature grid (`grid_size` is bumped to odd and clamped
    /// to [`MAX_GRID_SIZE`]) spaced `spacing_km` apart around `city`.
    pub async fn temperature_grid(
        &self,
        city: &str,
        grid_size: usize,
        spacing_km: f64,
    ) -> TemperatureGrid {
        let grid_size = odd_size(grid_size);
        let Some(key) = &self.settings.api_key else {
            return TemperatureGrid::synthetic(city, grid_size, true);
        };
        match self.geocode(city, key).await {
            Ok((center_lat, center_lon)) => {
                let delta_lat = spacing_km / KM_PER_DEGREE;
                let delta_lon =
                    spacing_km / (KM_PER_DEGREE * center_lat.to_radians().cos().max(0.0001));
                let mut points = Vec::with_capacity(grid_size * grid_size);
                for (i, j) in offsets(grid_size) {
                    let lat = center_lat + f64::from(i) * delta_lat;
                    let lng = center_lon + f64::from(j) * delta_lon;
                    points.push(self.grid_point(lat, lng, key).await);
                }
                TemperatureGrid {
                    city: city.to_string(),
                    points,
                    error: None,
                }
            }
            Err(err) => {
                warn!(city, error = %err, "geocoding failed; serving synthetic grid");
                TemperatureGrid {
                    error: Some(format!("{err:#}")),
                    ..TemperatureGrid::synthetic(city, grid_size, false)
                }
            }
        }
    }

    async fn geocode(&self, city: &str, key: &str) -> Result<(f64, f64)> {
        let data = self
            .get_json("geo/1.0/direct", &[("q", city), ("limit", "1"), ("appid", key)])
            .await?;
        let Some(first) = data.as_array().and_then(|hits| hits.first()) else {
            return Ok(DEFAULT_CENTER);
        };
        Ok((
            first["lat"].as_f64().unwrap_or(DEFAULT_CENTER.0),
            first["lon"].as_f64().unwrap_or(DEFAULT_CENTER.1),
        ))
    }

    async fn grid_point(&self, lat: f64, lng: f64, key: &str) -> GridPoint {
        let (lat_param, lon_param) = (lat.to_string(), lng.to_string());
        let query = [
            ("lat", lat_param.as_str()),
            ("lon", lon_param.as_str()),
            ("appid", key),
        ];
        match self.get_json("data/2.5/weather", &query).await {
            Ok(data) => GridPoint {
                lat,
                lng,
                temp_c: data["main"]["temp"]
                    .as_f64()
                    .map(|kelvin| round2(kelvin - KELVIN_OFFSET)),
                source: GridSource::OpenWeatherMap,
            },
            Err(err) => {
                warn!(lat, lng, error = %err, "grid point lookup failed");
                GridPoint {
                    lat,
                    lng,
                    temp_c: None,
                    source: GridSource::Fallback,
                }
            }
        }
    }

    async fn get_json(&self, path: &str, query: &[(&str, &str)]) -> Result<Value> {
        let url = format!("{}/{path}", self.settings.endpoint.trim_end_matches('/'));
        let response = self
            .http
            .get(&url)
            .query(query)
            .send()
            .await
            .with_context(|| format!("requesting {path}"))?
            .error_for_status()?;
        Ok(response.json().await?)
    }
}

fn odd_size(grid_size: usize) -> usize {
    let size = grid_size.min(MAX_GRID_SIZE);
    if size % 2 == 0 {
        size + 1
    } else {
        size
    }
}

fn offsets(grid_size: usize) -> impl Iterator<Item = (i32, i32)> {
    let half = i32::try_from(grid_size / 2).unwrap_or(0);
    (-half..=half).flat_map(move |i| (-half..=half).map(move |j| (i, j)))
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{extract::Query, http::StatusCode, routing::get, Json, Router};
    use std::collections::HashMap;
    use tokio::net::TcpListener;

    async fn serve(router: Router) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}")
    }

    fn client(endpoint: String, key: Option<&str>) -> WeatherClient {
        WeatherClient::new(WeatherSettings {
            endpoint,
            api_key: key.map(str::to_string),
            timeout: Duration::from_secs(2),
        })
        .unwrap()
    }

    fn offline() -> WeatherClient {
        WeatherClient::new(WeatherSettings::new(None)).unwrap()
    }

    #[test]
    fn synthetic_grid_matches_layout() {
        let grid = TemperatureGrid::synthetic("Mumbai", 3, true);
        assert_eq!(grid.points.len(), 9);
        // i = -1, j = -1: both offsets odd under euclidean modulo
        let corner = &grid.points[0];
        assert!((corner.lat - (19.0760 - 0.01 + 0.005)).abs() < 1e-9);
        assert!((corner.lng - (72.8777 - 0.01 + 0.005)).abs() < 1e-9);
        assert_eq!(corner.temp_c, Some(26.7));
        let center = &grid.points[4];
        assert!((center.lat - 19.0760).abs() < 1e-9);
        assert_eq!(center.temp_c, Some(28.0));
    }

    #[test]
    fn grid_size_is_odd_and_bounded() {
        assert_eq!(odd_size(0), 1);
        assert_eq!(odd_size(4), 5);
        assert_eq!(odd_size(7), 7);
        assert_eq!(odd_size(500), MAX_GRID_SIZE);
        assert_eq!(offsets(5).count(), 25);
    }

    #[test]
    fn blank_key_means_offline() {
        assert!(!offline().has_key());
        assert!(!WeatherClient::new(WeatherSettings::new(Some("  ".into())))
            .unwrap()
            .has_key());
        let mut settings = WeatherSettings::new(None);
        settings.timeout = Duration::ZERO;
        assert!(WeatherClient::new(settings).is_err());
    }

    #[tokio::test]
    async fn offline_lookups_are_synthetic() {
        let client = offline();
        let weather = client.current("Pune").await;
        assert_eq!(weather["source"], "synthetic");
        assert_eq!(weather["temperature"], 298.15);
        let grid = client.temperature_grid("Pune", 2, 5.0).await;
        assert_eq!(grid.points.len(), 9);
        assert!(grid.error.is_none());
    }

    #[tokio::test]
    async fn keyed_lookup_tags_upstream_data() {
        let router = Router::new().route(
            "/data/2.5/weather",
            get(|Query(q): Query<HashMap<String, String>>| async move {
                Json(json!({ "name": q["q"], "main": { "temp": 300.0 } }))
            }),
        );
        let client = client(serve(router).await, Some("k"));
        let weather = client.current("Chennai").await;
        assert_eq!(weather["source"], "openweathermap");
        assert_eq!(weather["name"], "Chennai");
    }

    #[tokio::test]
    async fn upstream_failure_falls_back() {
        let router = Router::new().route(
            "/data/2.5/weather",
            get(|| async { (StatusCode::UNAUTHORIZED, "bad key") }),
        );
        let client = client(serve(router).await, Some("k"));
        let weather = client.current("Chennai").await;
        assert_eq!(weather["source"], "fallback");
        assert_eq!(weather["city"], "Chennai");
        assert!(weather["error"].as_str().unwrap().contains("401"));

        // Geocoding route missing: whole grid falls back without jitter.
        let grid = client.temperature_grid("Chennai", 3, 5.0).await;
        assert!(grid.error.is_some());
        assert!((grid.points[0].lat - (19.0760 - 0.01)).abs() < 1e-9);
        assert!(grid.points.iter().all(|p| p.source == GridSource::Synthetic));
    }

    #[tokio::test]
    async fn keyed_grid_converts_kelvin_per_point() {
        let router = Router::new()
            .route(
                "/geo/1.0/direct",
                get(|| async { Json(json!([{ "lat": 10.0, "lon": 20.0 }])) }),
            )
            .route(
                "/data/2.5/weather",
                get(|Query(q): Query<HashMap<String, String>>| async move {
                    let lat: f64 = q["lat"].parse().unwrap();
                    if lat > 10.0 {
                        (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({})))
                    } else {
                        (StatusCode::OK, Json(json!({ "main": { "temp": 300.0 } })))
                    }
                }),
            );
        let client = client(serve(router).await, Some("k"));
        let grid = client.temperature_grid("Anywhere", 3, 111.0).await;
        assert!(grid.error.is_none());
        assert_eq!(grid.points.len(), 9);
        let center = &grid.points[4];
        assert!((center.lat - 10.0).abs() < 1e-9);
        assert_eq!(center.temp_c, Some(26.85));
        assert_eq!(center.source, GridSource::OpenWeatherMap);
        // Top row (i = 1) sits one degree north and fails upstream.
        assert!(grid.points[6..]
            .iter()
            .all(|p| p.source == GridSource::Fallback && p.temp_c.is_none()));
    }
}
