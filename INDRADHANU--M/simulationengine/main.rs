use std::sync::Arc;

use anyhow::{bail, Result};
use serde_json::json;
use shared_logging::LogLevel;
use tracing::{debug, error, info, warn};

use crate::{
    helper::{random_seed, SimulationTelemetry},
    model::{ForecastModel, OfflineModel, UpstreamError},
    prompt::build_forecast_prompt,
    reviewer::{review_forecast, ForecastRejection},
    scenario::{SimulationParams, SimulationResults},
    synthetic::SyntheticForecaster,
};

const SERVED_EVENT: &str = "simulation.forecast.served";

/// Why a request was served from synthetic data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FallbackReason {
    /// The final attempt failed at the transport or API level.
    Upstream(UpstreamError),
    /// A reply arrived but was empty or unusable.
    Rejected(ForecastRejection),
}

impl FallbackReason {
    /// Short machine-readable label.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Upstream(_) => "upstream_error",
            Self::Rejected(ForecastRejection::EmptyResponse) => "empty_response",
            Self::Rejected(ForecastRejection::MalformedJson(_)) => "malformed_json",
            Self::Rejected(_) => "invalid_schema",
        }
    }
}

impl std::fmt::Display for FallbackReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Upstream(err) => std::fmt::Display::fmt(err, f),
            Self::Rejected(rejection) => std::fmt::Display::fmt(rejection, f),
        }
    }
}

/// Which path produced a result. Callers of [`SimulationEngine::generate`] never see this.
#[derive(Debug, Clone, PartialEq)]
pub enum SimulationOutcome {
    /// Validated model output.
    Model {
        /// Parsed results, maxima as reported by the model.
        results: SimulationResults,
        /// Attempts used, starting at one.
        attempts: usize,
    },
    /// Bounded-random fallback.
    Synthetic {
        /// Generated results.
        results: SimulationResults,
        /// What triggered the fallback.
        reason: FallbackReason,
    },
}

impl SimulationOutcome {
    /// `model` or `synthetic`.
    #[must_use]
    pub const fn source(&self) -> &'static str {
        match self {
            Self::Model { .. } => "model",
            Self::Synthetic { .. } => "synthetic",
        }
    }

    /// Borrows the results.
    #[must_use]
    pub const fn results(&self) -> &SimulationResults {
        match self {
            Self::Model { results, .. } | Self::Synthetic { results, .. } => results,
        }
    }

    /// Drops the provenance.
    #[must_use]
    pub fn into_results(self) -> SimulationResults {
        match self {
            Self::Model { results, .. } | Self::Synthetic { results, .. } => results,
        }
    }
}

enum ModelReply {
    Text { text: String, attempts: usize },
    Blank,
    Failed(UpstreamError),
}

/// Turns scenario parameters into a forecast; never fails.
pub struct SimulationEngine {
    model: Arc<dyn ForecastModel>,
    synthetic: SyntheticForecaster,
    telemetry: Option<SimulationTelemetry>,
    max_attempts: usize,
}

impl SimulationEngine {
    /// Returns a builder.
    #[must_use]
    pub fn builder() -> SimulationEngineBuilder {
        SimulationEngineBuilder::default()
    }

    /// Produces results for `params`, falling back to synthetic data on any model problem.
    pub async fn generate(&self, params: &SimulationParams) -> SimulationResults {
        self.run(params).await.into_results()
    }

    /// Like [`Self::generate`] but keeps track of which path served the request.
    pub async fn run(&self, params: &SimulationParams) -> SimulationOutcome {
        let prompt = build_forecast_prompt(params);
        let outcome = match self.request_forecast(&prompt).await {
            ModelReply::Text { text, attempts } => match review_forecast(&text) {
                Ok(results) => SimulationOutcome::Model { results, attempts },
                Err(rejection) => self.fall_back(FallbackReason::Rejected(rejection)),
            },
            ModelReply::Blank => {
                self.fall_back(FallbackReason::Rejected(ForecastRejection::EmptyResponse))
            }
            ModelReply::Failed(err) => self.fall_back(FallbackReason::Upstream(err)),
        };
        self.report(params, &outcome).await;
        outcome
    }

    /// Model backing the primary path.
    #[must_use]
    pub fn model_name(&self) -> &str {
        self.model.name()
    }

    /// Returns telemetry handle.
    #[must_use]
    pub const fn telemetry(&self) -> Option<&SimulationTelemetry> {
        self.telemetry.as_ref()
    }

    async fn request_forecast(&self, prompt: &str) -> ModelReply {
        let mut last_error = None;
        for attempt in 1..=self.max_attempts {
            match self.model.generate(prompt).await {
                Ok(text) if !text.trim().is_empty() => {
                    return ModelReply::Text {
                        text,
                        attempts: attempt,
                    };
                }
                Ok(_) => {
                    debug!(attempt, model = self.model.name(), "blank model reply");
                    last_error = None;
                }
                Err(err) => {
                    warn!(attempt, model = self.model.name(), error = %err, "model call failed");
                    last_error = Some(err);
                }
            }
        }
        last_error.map_or(ModelReply::Blank, ModelReply::Failed)
    }

    fn fall_back(&self, reason: FallbackReason) -> SimulationOutcome {
        match &reason {
            FallbackReason::Rejected(rejection) if rejection.is_schema_violation() => {
                warn!(%rejection, "model output invalid, using synthetic forecast");
            }
            other => error!(reason = %other, "simulation model error, using synthetic forecast"),
        }
        SimulationOutcome::Synthetic {
            results: self.synthetic.forecast(),
            reason,
        }
    }

    async fn report(&self, params: &SimulationParams, outcome: &SimulationOutcome) {
        let mut payload = json!({
            "scenario": params.scenario,
            "source": outcome.source(),
            "model": self.model.name(),
            "risk": outcome.results().waterlogging_risk.label(),
        });
        let level = match outcome {
            SimulationOutcome::Model { results, attempts } => {
                payload["attempts"] = json!(attempts);
                payload["maximaConsistent"] = json!(results.maxima_consistent());
                LogLevel::Info
            }
            SimulationOutcome::Synthetic { reason, .. } => {
                payload["reason"] = json!(reason.label());
                payload["detail"] = json!(reason.to_string());
                LogLevel::Warn
            }
        };
        info!(
            scenario = %params.scenario,
            source = outcome.source(),
            "simulation forecast served"
        );
        if let Some(tel) = &self.telemetry {
            if let Err(err) = tel.log(level, SERVED_EVENT, payload.clone()) {
                warn!(error = %err, "simulation log write failed");
            }
            if let Err(err) = tel.event(SERVED_EVENT, payload).await {
                warn!(error = %err, "simulation event publish failed");
            }
        }
    }
}

/// Builder for `SimulationEngine`.
pub struct SimulationEngineBuilder {
    model: Option<Arc<dyn ForecastModel>>,
    telemetry: Option<SimulationTelemetry>,
    max_attempts: usize,
    fallback_seed: Option<u64>,
}

impl Default for SimulationEngineBuilder {
    fn default() -> Self {
        Self {
            model: None,
            telemetry: None,
            max_attempts: 2,
            fallback_seed: None,
        }
    }
}

impl SimulationEngineBuilder {
    /// Sets the generative model; without one every request falls back.
    #[must_use]
    pub fn model(mut self, model: Arc<dyn ForecastModel>) -> Self {
        self.model = Some(model);
        self
    }

    /// Sets telemetry.
    #[must_use]
    pub fn telemetry(mut self, telemetry: SimulationTelemetry) -> Self {
        self.telemetry = Some(telemetry);
        self
    }

    /// Sets telemetry optionally.
    #[must_use]
    pub fn telemetry_opt(mut self, telemetry: Option<SimulationTelemetry>) -> Self {
        self.telemetry = telemetry;
        self
    }

    /// Number of model calls per request (default 2).
    #[must_use]
    pub fn max_attempts(mut self, attempts: usize) -> Self {
        self.max_attempts = attempts;
        self
    }

    /// Seeds the synthetic forecaster.
    #[must_use]
    pub fn fallback_seed(mut self, seed: u64) -> Self {
        self.fallback_seed = Some(seed);
        self
    }

    /// Builds the engine.
    pub fn build(self) -> Result<SimulationEngine> {
        if self.max_attempts == 0 {
            bail!("max_attempts must be at least 1");
        }
        let model = self
            .model
            .unwrap_or_else(|| Arc::new(OfflineModel::default()));
        Ok(SimulationEngine {
            model,
            synthetic: SyntheticForecaster::new(self.fallback_seed.unwrap_or_else(random_seed)),
            telemetry: self.telemetry,
            max_attempts: self.max_attempts,
        })
    }
}
