use std::fmt;

use serde::{Deserialize, Serialize};

/// Number of hourly steps in every projected series.
pub const FORECAST_HOURS: usize = 24;

/// One value per hour over a single day.
pub type HourlySeries = [f64; FORECAST_HOURS];

/// Environmental covariates describing a scenario to simulate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationParams {
    /// Free-text scenario label, e.g. `heatwave`.
    pub scenario: String,
    /// Tree canopy cover in percent.
    pub tree_cover: f64,
    /// Surface albedo.
    pub albedo: f64,
    /// People per square kilometre.
    pub population_density: f64,
    /// Rainfall in mm/hr.
    pub rainfall: f64,
    /// Wind speed in km/h.
    pub wind_speed: f64,
    /// Relative humidity in percent.
    pub humidity: f64,
    /// Air-quality index.
    pub aqi: f64,
}

/// Categorical waterlogging risk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WaterloggingRisk {
    /// Low risk.
    Low,
    /// Medium risk.
    Medium,
    /// High risk.
    High,
}

impl WaterloggingRisk {
    /// Every label, in ascending severity.
    pub const ALL: [Self; 3] = [Self::Low, Self::Medium, Self::High];

    /// Lower-case wire label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }

    /// Parses a label case-insensitively, ignoring surrounding whitespace.
    #[must_use]
    pub fn parse_label(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        Self::ALL
            .into_iter()
            .find(|risk| risk.label().eq_ignore_ascii_case(raw))
    }
}

impl fmt::Display for WaterloggingRisk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Hourly projections plus summary scalars for one scenario.
///
/// Built fresh per request and never mutated afterwards. The series lengths
/// are fixed by the type; the maxima are whatever the producer reported.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationResults {
    /// Temperature delta per hour.
    pub temperature_delta: HourlySeries,
    /// Inundated area per hour.
    pub inundation_area: HourlySeries,
    /// Air-quality index per hour.
    pub aqi_data: HourlySeries,
    /// Relative humidity per hour.
    pub humidity_data: HourlySeries,
    /// Peak temperature delta.
    pub max_temperature: f64,
    /// Peak inundated area.
    pub max_inundation: f64,
    /// Peak air-quality index.
    #[serde(rename = "maxAQI")]
    pub max_aqi: f64,
    /// Peak humidity.
    pub max_humidity: f64,
    /// Waterlogging risk label.
    pub waterlogging_risk: WaterloggingRisk,
}

impl SimulationResults {
    /// Builds results whose maxima are taken from the series themselves.
    #[must_use]
    pub fn with_derived_maxima(
        temperature_delta: HourlySeries,
        inundation_area: HourlySeries,
        aqi_data: HourlySeries,
        humidity_data: HourlySeries,
        waterlogging_risk: WaterloggingRisk,
    ) -> Self {
        Self {
            max_temperature: series_max(&temperature_delta),
            max_inundation: series_max(&inundation_area),
            max_aqi: series_max(&aqi_data),
            max_humidity: series_max(&humidity_data),
            temperature_delta,
            inundation_area,
            aqi_data,
            humidity_data,
            waterlogging_risk,
        }
    }

    /// True when each reported maximum equals the maximum of its series.
    #[must_use]
    #[allow(clippy::float_cmp)]
    pub fn maxima_consistent(&self) -> bool {
        series_max(&self.temperature_delta) == self.max_temperature
            && series_max(&self.inundation_area) == self.max_inundation
            && series_max(&self.aqi_data) == self.max_aqi
            && series_max(&self.humidity_data) == self.max_humidity
    }
}

/// Largest value of a series.
#[must_use]
pub fn series_max(series: &HourlySeries) -> f64 {
    series.iter().copied().fold(f64::NEG_INFINITY, f64::max)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ramp(offset: f64) -> HourlySeries {
        std::array::from_fn(|hour| offset + hour as f64)
    }

    #[test]
    fn params_use_camel_case_keys() {
        let params: SimulationParams = serde_json::from_value(json!({
            "scenario": "heatwave",
            "treeCover": 10,
            "albedo": 0.2,
            "populationDensity": 5000,
            "rainfall": 0,
            "windSpeed": 5,
            "humidity": 40,
            "aqi": 150
        }))
        .unwrap();
        assert_eq!(params.scenario, "heatwave");
        assert!((params.population_density - 5000.0).abs() < f64::EPSILON);
        assert!((params.wind_speed - 5.0).abs() < f64::EPSILON);
    }

    #[test]
    fn results_serialize_with_wire_names() {
        let results = SimulationResults::with_derived_maxima(
            ramp(20.0),
            ramp(0.0),
            ramp(50.0),
            ramp(30.0),
            WaterloggingRisk::Medium,
        );
        let value = serde_json::to_value(&results).unwrap();
        assert_eq!(value["temperatureDelta"].as_array().unwrap().len(), FORECAST_HOURS);
        assert_eq!(value["maxAQI"], json!(73.0));
        assert_eq!(value["maxTemperature"], json!(43.0));
        assert_eq!(value["waterloggingRisk"], json!("medium"));
        assert!(results.maxima_consistent());
    }

    #[test]
    fn risk_labels_parse_loosely() {
        assert_eq!(WaterloggingRisk::parse_label(" High "), Some(WaterloggingRisk::High));
        assert_eq!(WaterloggingRisk::parse_label("LOW"), Some(WaterloggingRisk::Low));
        assert_eq!(WaterloggingRisk::parse_label("severe"), None);
        assert_eq!(WaterloggingRisk::Medium.to_string(), "medium");
    }

    #[test]
    fn inconsistent_maxima_are_detected() {
        let mut results = SimulationResults::with_derived_maxima(
            ramp(1.0),
            ramp(1.0),
            ramp(1.0),
            ramp(1.0),
            WaterloggingRisk::Low,
        );
        results.max_humidity = 999.0;
        assert!(!results.maxima_consistent());
    }
}
