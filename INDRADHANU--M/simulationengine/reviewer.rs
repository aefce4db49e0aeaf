use std::fmt;

use serde_json::{Map, Value};

use crate::{
    prompt::{MAXIMUM_KEYS, RISK_KEY, SERIES_KEYS},
    scenario::{HourlySeries, SimulationResults, WaterloggingRisk, FORECAST_HOURS},
};

/// Why a model reply was not accepted.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ForecastRejection {
    /// Reply was empty or whitespace.
    #[error("empty response from generative model")]
    EmptyResponse,
    /// Reply did not parse as JSON.
    #[error("model output is not valid JSON: {0}")]
    MalformedJson(String),
    /// Reply parsed but is not a JSON object.
    #[error("model output is not a JSON object")]
    NotAnObject,
    /// One of the hourly series is unusable.
    #[error("series '{field}' invalid: {defect}")]
    InvalidSeries {
        /// Offending key.
        field: &'static str,
        /// What was wrong with it.
        defect: SeriesDefect,
    },
    /// A maximum is missing or not a number.
    #[error("scalar '{field}' missing or not numeric")]
    InvalidScalar {
        /// Offending key.
        field: &'static str,
    },
    /// Risk label missing or not one of low/medium/high.
    #[error("waterlogging risk missing or unrecognised: {0:?}")]
    InvalidRisk(Option<String>),
}

impl ForecastRejection {
    /// True for shape problems, false for empty or unparseable replies.
    #[must_use]
    pub const fn is_schema_violation(&self) -> bool {
        matches!(
            self,
            Self::NotAnObject
                | Self::InvalidSeries { .. }
                | Self::InvalidScalar { .. }
                | Self::InvalidRisk(_)
        )
    }
}

/// Defect found in an hourly series.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeriesDefect {
    /// Key absent or null.
    Missing,
    /// Present but not an array.
    NotArray,
    /// Array with the wrong number of entries.
    Length(usize),
    /// Entry at this index is not a number.
    NonNumeric(usize),
}

impl fmt::Display for SeriesDefect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Missing => f.write_str("missing"),
            Self::NotArray => f.write_str("not an array"),
            Self::Length(len) => write!(f, "expected {FORECAST_HOURS} entries, got {len}"),
            Self::NonNumeric(idx) => write!(f, "entry {idx} is not numeric"),
        }
    }
}

/// Parses and validates a raw model reply.
///
/// The reported maxima are taken as-is; they are not cross-checked against
/// the series.
pub fn review_forecast(text: &str) -> Result<SimulationResults, ForecastRejection> {
    if text.trim().is_empty() {
        return Err(ForecastRejection::EmptyResponse);
    }
    let value: Value = serde_json::from_str(text)
        .map_err(|err| ForecastRejection::MalformedJson(err.to_string()))?;
    let object = value.as_object().ok_or(ForecastRejection::NotAnObject)?;

    let [temperature_delta, inundation_area, aqi_data, humidity_data] = {
        let mut validated = [[0.0; FORECAST_HOURS]; 4];
        for (slot, field) in validated.iter_mut().zip(SERIES_KEYS) {
            *slot = hourly_series(object, field)?;
        }
        validated
    };
    let [max_temperature, max_inundation, max_aqi, max_humidity] = {
        let mut maxima = [0.0; 4];
        for (slot, field) in maxima.iter_mut().zip(MAXIMUM_KEYS) {
            *slot = scalar(object, field)?;
        }
        maxima
    };

    Ok(SimulationResults {
        temperature_delta,
        inundation_area,
        aqi_data,
        humidity_data,
        max_temperature,
        max_inundation,
        max_aqi,
        max_humidity,
        waterlogging_risk: risk(object)?,
    })
}

fn hourly_series(
    object: &Map<String, Value>,
    field: &'static str,
) -> Result<HourlySeries, ForecastRejection> {
    let reject = |defect| ForecastRejection::InvalidSeries { field, defect };
    let entries = match object.get(field) {
        None | Some(Value::Null) => return Err(reject(SeriesDefect::Missing)),
        Some(value) => value
            .as_array()
            .ok_or_else(|| reject(SeriesDefect::NotArray))?,
    };
    if entries.len() != FORECAST_HOURS {
        return Err(reject(SeriesDefect::Length(entries.len())));
    }
    let mut series = [0.0; FORECAST_HOURS];
    for (idx, (slot, entry)) in series.iter_mut().zip(entries).enumerate() {
        // Booleans are not numbers here.
        *slot = entry
            .as_f64()
            .ok_or_else(|| reject(SeriesDefect::NonNumeric(idx)))?;
    }
    Ok(series)
}

fn scalar(object: &Map<String, Value>, field: &'static str) -> Result<f64, ForecastRejection> {
    object
        .get(field)
        .and_then(Value::as_f64)
        .ok_or(ForecastRejection::InvalidScalar { field })
}

fn risk(object: &Map<String, Value>) -> Result<WaterloggingRisk, ForecastRejection> {
    match object.get(RISK_KEY) {
        Some(Value::String(raw)) => WaterloggingRisk::parse_label(raw)
            .ok_or_else(|| ForecastRejection::InvalidRisk(Some(raw.clone()))),
        Some(other) => Err(ForecastRejection::InvalidRisk(Some(other.to_string()))),
        None => Err(ForecastRejection::InvalidRisk(None)),
    }
}
