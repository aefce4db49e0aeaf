use axum::{
    http::HeaderValue,
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::warn;

use crate::{handlers, state::AppState};

/// Routes every endpoint, wrapped in CORS and request tracing.
pub fn build_router(state: AppState, allow_origins: &[String]) -> Router {
    Router::new()
        .route("/simulation", post(handlers::simulation))
        .route("/report", post(handlers::report))
        .route("/uhi-heatmap", get(handlers::uhi_heatmap))
        .route("/coastal-shield", get(handlers::coastal_shield))
        .route("/energy-stats", get(handlers::energy_stats))
        .route("/sensor-health", get(handlers::sensor_health))
        .route("/alerts", get(handlers::alerts))
        .route("/analytics", get(handlers::analytics))
        .route("/contact", post(handlers::contact))
        .route("/weather", get(handlers::weather))
        .route("/temperature-grid", get(handlers::temperature_grid))
        .route("/floodalert", get(handlers::flood_alert))
        .route("/energyforecast", get(handlers::energy_forecast))
        .route("/hotspots", get(handlers::hotspots))
        .route("/green-simulate", post(handlers::green_simulate))
        .route("/cooling-control", post(handlers::cooling_control))
        .route("/satellite", get(handlers::satellite))
        .layer(cors_layer(allow_origins))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(allow_origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if allow_origins.iter().any(|origin| origin == "*") {
        return layer.allow_origin(Any);
    }
    let origins: Vec<HeaderValue> = allow_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(err) => {
                warn!(%origin, error = %err, "ignoring unparseable CORS origin");
                None
            }
        })
        .collect();
    layer.allow_origin(AllowOrigin::list(origins))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServerConfig;
    use indradhanu_dashboard::{WeatherClient, WeatherSettings};
    use indradhanu_simulationengine::{
        ScriptedModel, SimulationEngine, FORECAST_HOURS,
    };
    use serde_json::{json, Value};
    use std::sync::Arc;
    use tokio::net::TcpListener;

    async fn spawn(state: AppState, origins: &[String]) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app = build_router(state, origins);
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    async fn offline_server() -> String {
        let state = AppState::from_config(&ServerConfig::default(), |_| None).unwrap();
        spawn(state, &["*".to_string()]).await
    }

    fn heatwave() -> Value {
        json!({
            "scenario": "heatwave",
            "treeCover": 10,
            "albedo": 0.2,
            "populationDensity": 5000,
            "rainfall": 0,
            "windSpeed": 5,
            "humidity": 40,
            "aqi": 150
        })
    }

    fn series_max(value: &Value) -> f64 {
        value
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v.as_f64().unwrap())
            .fold(f64::NEG_INFINITY, f64::max)
    }

    #[tokio::test]
    async fn offline_simulation_returns_consistent_fallback() {
        let base = offline_server().await;
        let body: Value = reqwest::Client::new()
            .post(format!("{base}/simulation"))
            .json(&heatwave())
            .send()
            .await
            .unwrap()
            .error_for_status()
            .unwrap()
            .json()
            .await
            .unwrap();
        for (series, max) in [
            ("temperatureDelta", "maxTemperature"),
            ("inundationArea", "maxInundation"),
            ("aqiData", "maxAQI"),
            ("humidityData", "maxHumidity"),
        ] {
            assert_eq!(body[series].as_array().unwrap().len(), FORECAST_HOURS);
            assert_eq!(body[max].as_f64().unwrap(), series_max(&body[series]));
        }
        let risk = body["waterloggingRisk"].as_str().unwrap();
        assert!(["low", "medium", "high"].contains(&risk));
    }

    #[tokio::test]
    async fn model_reply_is_served_verbatim() {
        let reply = json!({
            "temperatureDelta": vec![2; 24],
            "inundationArea": vec![3; 24],
            "aqiData": vec![90; 24],
            "humidityData": vec![60; 24],
            "maxTemperature": 7,
            "maxInundation": 3,
            "maxAQI": 90,
            "maxHumidity": 60,
            "waterloggingRisk": "low"
        });
        let engine = SimulationEngine::builder()
            .model(Arc::new(ScriptedModel::texts([reply.to_string()])))
            .build()
            .unwrap();
        let weather = WeatherClient::new(WeatherSettings::new(None)).unwrap();
        let base = spawn(AppState::new(engine, weather), &["*".to_string()]).await;
        let body: Value = reqwest::Client::new()
            .post(format!("{base}/simulation"))
            .json(&heatwave())
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(body["maxTemperature"], 7.0);
        assert_eq!(body["waterloggingRisk"], "low");
    }

    #[tokio::test]
    async fn dashboard_feeds_respond() {
        let base = offline_server().await;
        let client = reqwest::Client::new();
        let get = |path: &str| {
            let request = client.get(format!("{base}{path}"));
            async move { request.send().await.unwrap().json::<Value>().await.unwrap() }
        };

        assert_eq!(get("/uhi-heatmap").await.as_array().unwrap().len(), 100);
        assert!(get("/coastal-shield").await.get("barrierState").is_some());
        assert_eq!(get("/energy-stats").await.as_array().unwrap().len(), 24);
        assert_eq!(get("/alerts?limit=3").await.as_array().unwrap().len(), 3);
        assert_eq!(get("/alerts").await.as_array().unwrap().len(), 10);

        let page = get("/sensor-health?page=2").await;
        assert_eq!(page["totalPages"], 5);
        assert_eq!(page["devices"][0]["id"], "sensor-10");

        let analytics = get("/analytics?metrics=temp&metrics=aqi").await;
        let first = &analytics.as_array().unwrap()[0];
        assert!(first.get("temp").is_some() && first.get("aqi").is_some());
        assert!(first.get("humidity").is_none());
    }

    #[tokio::test]
    async fn rule_model_and_weather_routes() {
        let base = offline_server().await;
        let client = reqwest::Client::new();

        let flood: Value = client
            .get(format!("{base}/floodalert"))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(flood["zone"], "Mumbai Coastal");

        let green: Value = client
            .post(format!(
                "{base}/green-simulate?trees=0&reflective_paint=false&green_roofs=true"
            ))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(green.as_array().unwrap().len(), 3);
        assert_eq!(green[0]["co2_reduction"], 0.0);

        let missing_zone = client
            .post(format!("{base}/cooling-control"))
            .send()
            .await
            .unwrap();
        assert!(missing_zone.status().is_client_error());

        let weather: Value = client
            .get(format!("{base}/weather?city=Delhi"))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(weather["source"], "synthetic");

        let grid: Value = client
            .get(format!("{base}/temperature-grid?grid_size=4"))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(grid["points"].as_array().unwrap().len(), 25);
        assert!(grid.get("error").is_none());
    }

    #[tokio::test]
    async fn forms_and_report() {
        let base = offline_server().await;
        let client = reqwest::Client::new();
        let ack: Value = client
            .post(format!("{base}/contact"))
            .json(&json!({ "name": "A", "email": "a@b.c", "message": "hi" }))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(ack["status"], "success");

        let report = client
            .post(format!("{base}/report"))
            .json(&heatwave())
            .send()
            .await
            .unwrap();
        assert_eq!(report.status(), reqwest::StatusCode::OK);
        let body: Value = report.json().await.unwrap();
        assert_eq!(body["error"], "pdf_disabled");
    }

    #[tokio::test]
    async fn cors_echoes_allowed_origin() {
        let state = AppState::from_config(&ServerConfig::default(), |_| None).unwrap();
        let base = spawn(state, &["http://localhost:3000".to_string()]).await;
        let response = reqwest::Client::new()
            .get(format!("{base}/hotspots"))
            .header("Origin", "http://localhost:3000")
            .send()
            .await
            .unwrap();
        assert_eq!(
            response
                .headers()
                .get("access-control-allow-origin")
                .unwrap(),
            "http://localhost:3000"
        );
    }
}
