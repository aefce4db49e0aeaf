use chrono::{DateTime, Duration, NaiveTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Cooling from planting trees, in °C.
pub const TREE_COOLING: f64 = 1.5;
/// CO₂ absorbed per tree per year, in kg.
pub const TREE_CO2_KG: f64 = 22.0;
/// Cooling from reflective paint, in °C.
pub const PAINT_COOLING: f64 = 0.8;
/// Cooling from green roofs, in °C.
pub const ROOF_COOLING: f64 = 1.2;

const PEAK_HOUR: u32 = 14;

/// Flood risk for a zone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FloodAlert {
    /// Zone queried.
    pub zone: String,
    /// Risk band.
    pub risk: String,
    /// Inputs and outlook.
    pub details: FloodDetails,
}

/// Observations behind a [`FloodAlert`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FloodDetails {
    /// Rainfall in mm.
    pub rainfall: f64,
    /// Tide in metres.
    pub tide: f64,
    /// Outlook text.
    pub prediction: String,
}

/// Fixed flood assessment echoing the requested zone.
#[must_use]
pub fn flood_alert(zone: &str) -> FloodAlert {
    FloodAlert {
        zone: zone.to_string(),
        risk: "Medium".into(),
        details: FloodDetails {
            rainfall: 120.0,
            tide: 1.1,
            prediction: "Possible surge in next 24h".into(),
        },
    }
}

/// Energy demand outlook.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnergyForecast {
    /// City queried.
    pub city: String,
    /// Outlook.
    pub forecast: DemandOutlook,
}

/// Body of an [`EnergyForecast`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DemandOutlook {
    /// Peak demand in MW.
    pub peak_demand: f64,
    /// Day-over-day trend.
    pub trend: String,
    /// Next daily peak, RFC 3339.
    pub next_peak: String,
}

/// Fixed demand outlook; the next peak is the next 14:00 UTC after `now`.
#[must_use]
pub fn energy_forecast(city: &str, now: DateTime<Utc>) -> EnergyForecast {
    EnergyForecast {
        city: city.to_string(),
        forecast: DemandOutlook {
            peak_demand: 2.4,
            trend: "+12% from yesterday".into(),
            next_peak: next_peak(now).to_rfc3339_opts(SecondsFormat::Secs, true),
        },
    }
}

fn next_peak(now: DateTime<Utc>) -> DateTime<Utc> {
    let peak_time = NaiveTime::from_hms_opt(PEAK_HOUR, 0, 0).unwrap_or_default();
    let today = now.date_naive().and_time(peak_time).and_utc();
    if today > now {
        today
    } else {
        today + Duration::days(1)
    }
}

/// Urban heat pocket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hotspot {
    /// Neighbourhood.
    pub zone: String,
    /// Surface temperature in °C.
    pub temp: f64,
    /// Cause.
    #[serde(rename = "type")]
    pub kind: String,
}

/// The three known hotspots. `city` is accepted but not yet used.
#[must_use]
pub fn hotspots(_city: &str) -> Vec<Hotspot> {
    [
        ("Andheri Industrial Belt", 41.2, "industrial"),
        ("Bandra Traffic Hub", 39.8, "traffic"),
        ("Lower Parel Concrete Zone", 40.5, "dense_concrete"),
    ]
    .into_iter()
    .map(|(zone, temp, kind)| Hotspot {
        zone: zone.into(),
        temp,
        kind: kind.into(),
    })
    .collect()
}

/// What-if intervention plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interventions {
    /// Trees planted.
    pub trees: u32,
    /// Reflective paint applied.
    pub reflective_paint: bool,
    /// Green roofs installed.
    pub green_roofs: bool,
}

impl Default for Interventions {
    fn default() -> Self {
        Self {
            trees: 100,
            reflective_paint: true,
            green_roofs: true,
        }
    }
}

impl Interventions {
    /// Total cooling in °C.
    #[must_use]
    pub fn cooling(&self) -> f64 {
        let mut cooling = 0.0;
        if self.trees > 0 {
            cooling += TREE_COOLING;
        }
        if self.reflective_paint {
            cooling += PAINT_COOLING;
        }
        if self.green_roofs {
            cooling += ROOF_COOLING;
        }
        cooling
    }

    /// Yearly CO₂ reduction in kg.
    #[must_use]
    pub fn co2_reduction(&self) -> f64 {
        f64::from(self.trees) * TREE_CO2_KG
    }
}

/// Outcome of [`Interventions`] on one hotspot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GreenOutcome {
    /// Hotspot zone.
    pub zone: String,
    /// Temperature before.
    pub original_temp: f64,
    /// Temperature after.
    pub simulated_temp: f64,
    /// Yearly CO₂ reduction in kg.
    pub co2_reduction: f64,
    /// Plan applied.
    pub interventions: Interventions,
}

/// Applies `plan` to every hotspot of `city`.
#[must_use]
pub fn simulate_green(city: &str, plan: Interventions) -> Vec<GreenOutcome> {
    let cooling = plan.cooling();
    hotspots(city)
        .into_iter()
        .map(|spot| GreenOutcome {
            simulated_temp: spot.temp - cooling,
            original_temp: spot.temp,
            zone: spot.zone,
            co2_reduction: plan.co2_reduction(),
            interventions: plan,
        })
        .collect()
}

/// Cooling-system command acknowledgement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoolingStatus {
    /// Zone addressed.
    pub zone: String,
    /// System kind.
    pub system: String,
    /// Requested state.
    pub activated: bool,
}

/// Echoes a cooling command.
#[must_use]
pub fn cooling_control(zone: &str, activate: bool) -> CoolingStatus {
    CoolingStatus {
        zone: zone.to_string(),
        system: "misting/fogging".into(),
        activated: activate,
    }
}

/// Synthetic satellite scene metadata as a GeoJSON feature collection.
#[must_use]
pub fn satellite_scene(area: &str, now: DateTime<Utc>) -> Value {
    let timestamp = now.to_rfc3339_opts(SecondsFormat::Micros, true);
    json!({
        "type": "FeatureCollection",
        "features": [{
            "type": "Feature",
            "properties": {
                "satellite": "Sentinel-2",
                "timestamp": timestamp,
                "source": "synthetic"
            },
            "geometry": { "type": "Point", "coordinates": [73.8567, 18.5204] }
        }],
        "metadata": { "area": area, "generated_at": timestamp }
    })
}
