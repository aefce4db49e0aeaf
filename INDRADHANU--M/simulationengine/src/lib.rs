#![deny(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    rust_2018_idioms,
    missing_docs
)]

//! Indradhanu simulation engine: asks a generative model for a 24-hour climate
//! projection, validates it, and falls back to bounded synthetic data.

/// Telemetry and RNG helpers.
#[path = "../helper.rs"]
pub mod helper;

/// Input covariates and projected results.
#[path = "../scenario.rs"]
pub mod scenario;

/// Prompt construction.
#[path = "../prompt.rs"]
pub mod prompt;

/// Generative model clients.
#[path = "../model.rs"]
pub mod model;

/// Validation of model output.
#[path = "../reviewer.rs"]
pub mod reviewer;

/// Bounded-random fallback forecasts.
#[path = "../synthetic.rs"]
pub mod synthetic;

/// Engine entry point.
#[path = "../main.rs"]
pub mod runtime;

pub use helper::{SimulationTelemetry, SimulationTelemetryBuilder};
pub use model::{
    ForecastModel, GeminiModel, GeminiSettings, OfflineModel, ScriptedModel, ScriptedReply,
    UpstreamError,
};
pub use reviewer::{review_forecast, ForecastRejection, SeriesDefect};
pub use runtime::{FallbackReason, SimulationEngine, SimulationEngineBuilder, SimulationOutcome};
pub use scenario::{
    HourlySeries, SimulationParams, SimulationResults, WaterloggingRisk, FORECAST_HOURS,
};
pub use synthetic::{MetricRange, SyntheticForecaster};
