//! Request handlers. Each one adapts query or body input to a library call
//! and returns JSON; none of them can fail once the input has been extracted.

use axum::{
    extract::{Query, State},
    Json,
};
use chrono::Utc;
use indradhanu_dashboard::{
    feeds,
    rule_models::{
        self, CoolingStatus, EnergyForecast, FloodAlert, GreenOutcome, Hotspot, Interventions,
    },
    Alert, AnalyticsEntry, CoastalShieldStatus, ContactAck, ContactForm, EnergyStats,
    HeatmapPoint, ReportUnavailable, SensorPage, TemperatureGrid,
};
use indradhanu_simulationengine::{SimulationParams, SimulationResults};
use serde::Deserialize;
use serde_json::Value;
use tracing::info;

use crate::state::AppState;

const DEFAULT_CITY: &str = "Mumbai";

fn default_city() -> String {
    DEFAULT_CITY.to_string()
}

const fn default_true() -> bool {
    true
}

/// `POST /simulation`
pub async fn simulation(
    State(state): State<AppState>,
    Json(params): Json<SimulationParams>,
) -> Json<SimulationResults> {
    Json(state.engine.generate(&params).await)
}

/// `POST /report`
pub async fn report(Json(params): Json<SimulationParams>) -> Json<ReportUnavailable> {
    info!(scenario = %params.scenario, "report requested while pdf export is disabled");
    Json(ReportUnavailable::pdf_disabled())
}

/// `GET /uhi-heatmap`
pub async fn uhi_heatmap() -> Json<Vec<HeatmapPoint>> {
    Json(feeds::uhi_heatmap(&mut rand::thread_rng()))
}

/// `GET /coastal-shield`
pub async fn coastal_shield() -> Json<CoastalShieldStatus> {
    Json(feeds::coastal_shield(&mut rand::thread_rng()))
}

/// `GET /energy-stats`
pub async fn energy_stats() -> Json<Vec<EnergyStats>> {
    Json(feeds::energy_stats(&mut rand::thread_rng(), Utc::now()))
}

/// Query for `GET /sensor-health`.
#[derive(Debug, Deserialize)]
pub struct SensorQuery {
    /// 1-based page.
    #[serde(default = "first_page")]
    pub page: usize,
    /// Substring filter.
    #[serde(default)]
    pub search: String,
}

const fn first_page() -> usize {
    1
}

/// `GET /sensor-health`
pub async fn sensor_health(Query(query): Query<SensorQuery>) -> Json<SensorPage> {
    Json(feeds::sensor_health(
        &mut rand::thread_rng(),
        Utc::now(),
        query.page,
        &query.search,
    ))
}

/// Query for `GET /alerts`.
#[derive(Debug, Deserialize)]
pub struct AlertsQuery {
    /// Number of alerts.
    #[serde(default = "default_alert_limit")]
    pub limit: usize,
}

const fn default_alert_limit() -> usize {
    10
}

/// `GET /alerts`
pub async fn alerts(Query(query): Query<AlertsQuery>) -> Json<Vec<Alert>> {
    Json(feeds::alerts(&mut rand::thread_rng(), Utc::now(), query.limit))
}

/// `GET /analytics?metrics=a&metrics=b`
pub async fn analytics(Query(pairs): Query<Vec<(String, String)>>) -> Json<Vec<AnalyticsEntry>> {
    let metrics: Vec<_> = pairs
        .into_iter()
        .filter(|(key, _)| key == "metrics")
        .map(|(_, value)| value)
        .collect();
    Json(feeds::analytics(&mut rand::thread_rng(), Utc::now(), &metrics[..]))
}

/// `POST /contact`
pub async fn contact(Json(form): Json<ContactForm>) -> Json<ContactAck> {
    info!(
        name = %form.name,
        email = %form.email,
        organization = form.organization.as_deref().unwrap_or("-"),
        "contact form received"
    );
    Json(ContactAck::received())
}

/// `?city=` with a Mumbai default.
#[derive(Debug, Deserialize)]
pub struct CityQuery {
    /// City name.
    #[serde(default = "default_city")]
    pub city: String,
}

/// `GET /weather`
pub async fn weather(State(state): State<AppState>, Query(query): Query<CityQuery>) -> Json<Value> {
    Json(state.weather.current(&query.city).await)
}

/// Query for `GET /temperature-grid`.
#[derive(Debug, Deserialize)]
pub struct GridQuery {
    /// City name.
    #[serde(default = "default_city")]
    pub city: String,
    /// Points per edge.
    #[serde(default = "default_grid_size")]
    pub grid_size: usize,
    /// Spacing between points in km.
    #[serde(default = "default_spacing_km")]
    pub spacing_km: f64,
}

const fn default_grid_size() -> usize {
    3
}

const fn default_spacing_km() -> f64 {
    5.0
}

/// `GET /temperature-grid`
pub async fn temperature_grid(
    State(state): State<AppState>,
    Query(query): Query<GridQuery>,
) -> Json<TemperatureGrid> {
    Json(
        state
            .weather
            .temperature_grid(&query.city, query.grid_size, query.spacing_km)
            .await,
    )
}

/// Query for `GET /floodalert`.
#[derive(Debug, Deserialize)]
pub struct ZoneQuery {
    /// Zone name.
    #[serde(default = "default_flood_zone")]
    pub zone: String,
}

fn default_flood_zone() -> String {
    "Mumbai Coastal".into()
}

/// `GET /floodalert`
pub async fn flood_alert(Query(query): Query<ZoneQuery>) -> Json<FloodAlert> {
    Json(rule_models::flood_alert(&query.zone))
}

/// `GET /energyforecast`
pub async fn energy_forecast(Query(query): Query<CityQuery>) -> Json<EnergyForecast> {
    Json(rule_models::energy_forecast(&query.city, Utc::now()))
}

/// `GET /hotspots`
pub async fn hotspots(Query(query): Query<CityQuery>) -> Json<Vec<Hotspot>> {
    Json(rule_models::hotspots(&query.city))
}

/// Query for `POST /green-simulate`.
#[derive(Debug, Deserialize)]
pub struct GreenQuery {
    /// City name.
    #[serde(default = "default_city")]
    pub city: String,
    /// Trees planted.
    #[serde(default = "default_trees")]
    pub trees: u32,
    /// Reflective paint applied.
    #[serde(default = "default_true")]
    pub reflective_paint: bool,
    /// Green roofs installed.
    #[serde(default = "default_true")]
    pub green_roofs: bool,
}

const fn default_trees() -> u32 {
    100
}

/// `POST /green-simulate`
pub async fn green_simulate(Query(query): Query<GreenQuery>) -> Json<Vec<GreenOutcome>> {
    let plan = Interventions {
        trees: query.trees,
        reflective_paint: query.reflective_paint,
        green_roofs: query.green_roofs,
    };
    Json(rule_models::simulate_green(&query.city, plan))
}

/// Query for `POST /cooling-control`.
#[derive(Debug, Deserialize)]
pub struct CoolingQuery {
    /// Zone addressed; required.
    pub zone: String,
    /// Requested state.
    #[serde(default = "default_true")]
    pub activate: bool,
}

/// `POST /cooling-control`
pub async fn cooling_control(Query(query): Query<CoolingQuery>) -> Json<CoolingStatus> {
    info!(zone = %query.zone, activate = query.activate, "cooling command");
    Json(rule_models::cooling_control(&query.zone, query.activate))
}

/// Query for `GET /satellite`.
#[derive(Debug, Deserialize)]
pub struct AreaQuery {
    /// Area name.
    #[serde(default = "default_city")]
    pub area: String,
}

/// `GET /satellite`
pub async fn satellite(Query(query): Query<AreaQuery>) -> Json<Value> {
    Json(rule_models::satellite_scene(&query.area, Utc::now()))
}
