use std::{fmt, path::PathBuf, sync::Arc};

use anyhow::Result;
use rand::{rngs::SmallRng, Rng, SeedableRng};
use serde_json::Value;
use shared_event_bus::{EventPublisher, EventRecord};
use shared_logging::{JsonLogger, LogLevel, LogRecord};

/// Telemetry builder for the simulation engine.
pub struct SimulationTelemetryBuilder {
    module: String,
    log_path: Option<PathBuf>,
    event_publisher: Option<Arc<dyn EventPublisher>>,
}

impl SimulationTelemetryBuilder {
    /// Creates a new builder scoped to a module label.
    #[must_use]
    pub fn new(module: impl Into<String>) -> Self {
        Self {
            module: module.into(),
            log_path: None,
            event_publisher: None,
        }
    }

    /// Writes JSON-lines records to this path.
    #[must_use]
    pub fn log_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.log_path = Some(path.into());
        self
    }

    /// Publishes domain events here.
    #[must_use]
    pub fn event_publisher(mut self, publisher: Arc<dyn EventPublisher>) -> Self {
        self.event_publisher = Some(publisher);
        self
    }

    /// Builds telemetry, opening the log file if one was set.
    pub fn build(self) -> Result<SimulationTelemetry> {
        let logger = self.log_path.map(JsonLogger::new).transpose()?;
        Ok(SimulationTelemetry {
            inner: Arc::new(TelemetryInner {
                module: self.module,
                logger,
                publisher: self.event_publisher,
            }),
        })
    }
}

/// Cheap-to-clone telemetry handle shared across simulation components.
#[derive(Clone)]
pub struct SimulationTelemetry {
    inner: Arc<TelemetryInner>,
}

impl fmt::Debug for SimulationTelemetry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SimulationTelemetry")
            .field("module", &self.inner.module)
            .field("logger", &self.inner.logger.as_ref().map(JsonLogger::path))
            .field("events", &self.inner.publisher.is_some())
            .finish()
    }
}

struct TelemetryInner {
    module: String,
    logger: Option<JsonLogger>,
    publisher: Option<Arc<dyn EventPublisher>>,
}

impl SimulationTelemetry {
    /// Returns a builder.
    #[must_use]
    pub fn builder(module: impl Into<String>) -> SimulationTelemetryBuilder {
        SimulationTelemetryBuilder::new(module)
    }

    /// Module label stamped on records.
    #[must_use]
    pub fn module(&self) -> &str {
        &self.inner.module
    }

    /// Writes a structured record if a log file is configured.
    pub fn log(&self, level: LogLevel, message: &str, metadata: Value) -> Result<()> {
        if let Some(logger) = &self.inner.logger {
            let record = LogRecord::new(&self.inner.module, level, message).with_metadata(metadata);
            logger.log(&record)?;
        }
        Ok(())
    }

    /// Publishes a domain event if a publisher is configured.
    pub async fn event(&self, event_type: &str, payload: Value) -> Result<()> {
        if let Some(publisher) = &self.inner.publisher {
            publisher
                .publish(EventRecord::new(&self.inner.module, event_type, payload))
                .await?;
        }
        Ok(())
    }
}

/// Generates a random seed.
#[must_use]
pub fn random_seed() -> u64 {
    rand::thread_rng().gen()
}

/// Returns a reproducible RNG.
#[must_use]
pub fn seeded_rng(seed: u64) -> SmallRng {
    SmallRng::seed_from_u64(seed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use shared_event_bus::MemoryEventBus;
    use tempfile::tempdir;

    #[tokio::test]
    async fn telemetry_writes_log_and_event() {
        let tmp = tempdir().unwrap();
        let bus = Arc::new(MemoryEventBus::new(4));
        let log_path = tmp.path().join("sim.log");
        let telemetry = SimulationTelemetry::builder("simulation")
            .log_path(&log_path)
            .event_publisher(bus.clone())
            .build()
            .unwrap();
        telemetry
            .log(LogLevel::Info, "simulation.start", json!({ "seed": 1 }))
            .unwrap();
        telemetry
            .event("simulation.forecast.served", json!({ "source": "model" }))
            .await
            .unwrap();
        let records = shared_logging::read_records(&log_path).unwrap();
        assert_eq!(records[0].message, "simulation.start");
        assert_eq!(records[0].module, "simulation");
        assert_eq!(bus.snapshot().len(), 1);
    }

    #[tokio::test]
    async fn telemetry_without_sinks_is_silent() {
        let telemetry = SimulationTelemetry::builder("quiet").build().unwrap();
        telemetry.log(LogLevel::Warn, "noop", Value::Null).unwrap();
        telemetry.event("noop", Value::Null).await.unwrap();
        assert_eq!(telemetry.module(), "quiet");
    }

    #[test]
    fn seeded_rng_is_reproducible() {
        let a: u64 = seeded_rng(9).gen();
        let b: u64 = seeded_rng(9).gen();
        assert_eq!(a, b);
    }
}
