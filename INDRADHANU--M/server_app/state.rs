use std::sync::Arc;

use anyhow::{Context, Result};
use indradhanu_dashboard::WeatherClient;
use indradhanu_simulationengine::{
    ForecastModel, GeminiModel, SimulationEngine, SimulationTelemetry,
};
use shared_event_bus::{EventPublisher, FileEventPublisher};
use tracing::{info, warn};

use crate::config::ServerConfig;

/// Shared handles cloned into every request.
#[derive(Clone)]
pub struct AppState {
    /// Simulation pipeline.
    pub engine: Arc<SimulationEngine>,
    /// Weather lookups.
    pub weather: WeatherClient,
}

impl AppState {
    /// Wraps prepared components.
    #[must_use]
    pub fn new(engine: SimulationEngine, weather: WeatherClient) -> Self {
        Self {
            engine: Arc::new(engine),
            weather,
        }
    }

    /// Builds every component from configuration, reading secrets through
    /// `lookup`.
    pub fn from_config<F>(config: &ServerConfig, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut engine = SimulationEngine::builder()
            .max_attempts(config.model.max_attempts)
            .telemetry_opt(build_telemetry(config)?);
        match config.gemini_settings(&lookup) {
            Some(settings) => {
                let model: Arc<dyn ForecastModel> = Arc::new(GeminiModel::new(settings)?);
                info!(model = %config.model.model, "generative model configured");
                engine = engine.model(model);
            }
            None => warn!(
                env = %config.model.api_key_env,
                "no model API key; every simulation will use synthetic data"
            ),
        }
        let weather = WeatherClient::new(config.weather_settings(&lookup))?;
        if !weather.has_key() {
            info!(env = %config.weather.api_key_env, "no weather API key; serving synthetic weather");
        }
        Ok(Self::new(engine.build()?, weather))
    }
}

fn build_telemetry(config: &ServerConfig) -> Result<Option<SimulationTelemetry>> {
    let section = &config.telemetry;
    if section.log_path.is_none() && section.event_log.is_none() {
        return Ok(None);
    }
    let mut builder = SimulationTelemetry::builder("simulation");
    if let Some(path) = &section.log_path {
        builder = builder.log_path(path);
    }
    if let Some(path) = &section.event_log {
        let publisher: Arc<dyn EventPublisher> = Arc::new(
            FileEventPublisher::new(path)
                .with_context(|| format!("opening event log {}", path.display()))?,
        );
        builder = builder.event_publisher(publisher);
    }
    builder.build().map(Some)
}
