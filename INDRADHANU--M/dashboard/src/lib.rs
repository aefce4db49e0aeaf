#![deny(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    rust_2018_idioms,
    missing_docs
)]

//! Dashboard data for the Indradhanu backend: randomised mock feeds, fixed
//! rule-based city models, and weather lookups with synthetic fallbacks.

/// Randomised mock feeds for dashboard widgets.
#[path = "../feeds.rs"]
pub mod feeds;

/// Contact and report form payloads.
#[path = "../forms.rs"]
pub mod forms;

/// Fixed or trivially parameterised city models.
#[path = "../rule_models.rs"]
pub mod rule_models;

/// Weather ingestion with synthetic fallbacks.
#[path = "../weather.rs"]
pub mod weather;

pub use feeds::{
    alerts, analytics, coastal_shield, energy_stats, sensor_health, uhi_heatmap, Alert,
    AnalyticsEntry, AnalyticsMetric, CoastalShieldStatus, EnergyStats, HeatmapPoint, SensorDevice,
    SensorPage,
};
pub use forms::{ContactAck, ContactForm, ReportUnavailable};
pub use weather::{GridPoint, TemperatureGrid, WeatherClient, WeatherSettings};
