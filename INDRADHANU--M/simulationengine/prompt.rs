use crate::scenario::{SimulationParams, FORECAST_HOURS};

/// Keys of the hourly series the model must return.
pub const SERIES_KEYS: [&str; 4] = [
    "temperatureDelta",
    "inundationArea",
    "aqiData",
    "humidityData",
];

/// Keys of the scalar maxima the model must return.
pub const MAXIMUM_KEYS: [&str; 4] = ["maxTemperature", "maxInundation", "maxAQI", "maxHumidity"];

/// Key of the risk label.
pub const RISK_KEY: &str = "waterloggingRisk";

/// Builds the instruction sent to the generative model for one scenario.
#[must_use]
pub fn build_forecast_prompt(params: &SimulationParams) -> String {
    let mut prompt = format!(
        "Simulate urban climate impact for scenario '{}' with:\n\
         Tree Cover: {}%, Albedo: {}, Population Density: {}, Rainfall: {} mm/hr, \
         Wind Speed: {} km/h, Humidity: {}%, AQI: {}\n\n\
         Return ONLY a valid JSON object with these exact keys and values:\n",
        params.scenario,
        params.tree_cover,
        params.albedo,
        params.population_density,
        params.rainfall,
        params.wind_speed,
        params.humidity,
        params.aqi,
    );
    for key in SERIES_KEYS {
        prompt.push_str(&format!(
            "- {key}: array of {FORECAST_HOURS} float numbers (hourly values)\n"
        ));
    }
    for key in MAXIMUM_KEYS {
        prompt.push_str(&format!("- {key}: float\n"));
    }
    prompt.push_str(&format!("- {RISK_KEY}: string (low, medium, or high)\n\n"));
    prompt.push_str(&format!(
        "Do NOT include any explanation, markdown, or extra text. Only output the JSON object. \
         All arrays must have exactly {FORECAST_HOURS} float values."
    ));
    prompt
}
