use chrono::{DateTime, Duration, Utc};
use indexmap::IndexMap;
use rand::{seq::SliceRandom, Rng};
use serde::{Deserialize, Serialize};

/// Centre of the mock heat map.
pub const HEATMAP_CENTER: (f64, f64) = (40.7128, -74.0060);

/// Devices per sensor-health page.
pub const SENSOR_PAGE_SIZE: usize = 10;

const SENSOR_COUNT: usize = 50;
const ANALYTICS_DAYS: i64 = 30;

/// Upper bound on alerts returned in one call.
pub const MAX_ALERTS: usize = 1_000;

/// Urban heat island sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeatmapPoint {
    /// Latitude.
    pub lat: f64,
    /// Longitude.
    pub lng: f64,
    /// Surface temperature in °C.
    pub intensity: f64,
}

/// 100 points scattered ±0.05° around [`HEATMAP_CENTER`].
pub fn uhi_heatmap<R: Rng + ?Sized>(rng: &mut R) -> Vec<HeatmapPoint> {
    let (lat, lng) = HEATMAP_CENTER;
    (0..100)
        .map(|_| HeatmapPoint {
            lat: lat + (rng.gen::<f64>() - 0.5) * 0.1,
            lng: lng + (rng.gen::<f64>() - 0.5) * 0.1,
            intensity: rng.gen_range(20.0..=30.0),
        })
        .collect()
}

/// Tidal barrier position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BarrierState {
    /// Barrier up.
    Raised,
    /// Barrier down.
    Lowered,
}

/// Coastal defence snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoastalShieldStatus {
    /// Wave height in metres.
    pub wave_height: f64,
    /// Tide level in metres.
    pub tide_level: f64,
    /// Barrier position.
    pub barrier_state: BarrierState,
}

/// Random coastal snapshot.
pub fn coastal_shield<R: Rng + ?Sized>(rng: &mut R) -> CoastalShieldStatus {
    CoastalShieldStatus {
        wave_height: rng.gen_range(0.0..=5.0),
        tide_level: rng.gen_range(0.0..=3.0),
        barrier_state: if rng.gen_bool(0.5) {
            BarrierState::Raised
        } else {
            BarrierState::Lowered
        },
    }
}

/// Hourly generation mix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnergyStats {
    /// Hour the sample covers.
    pub timestamp: DateTime<Utc>,
    /// Solar output.
    pub solar: f64,
    /// Wind output.
    pub wind: f64,
    /// Thermal output.
    pub thermal: f64,
}

/// 24 hourly samples, oldest first, the last stamped `now`.
pub fn energy_stats<R: Rng + ?Sized>(rng: &mut R, now: DateTime<Utc>) -> Vec<EnergyStats> {
    (0..24)
        .map(|i| EnergyStats {
            timestamp: now - Duration::hours(23 - i),
            solar: rng.gen_range(0.0..=100.0),
            wind: rng.gen_range(0.0..=80.0),
            thermal: rng.gen_range(0.0..=60.0),
        })
        .collect()
}

/// What a sensor measures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SensorKind {
    /// Air temperature.
    Temperature,
    /// Relative humidity.
    Humidity,
    /// Water level.
    WaterLevel,
    /// Air quality.
    AirQuality,
}

impl SensorKind {
    const ALL: [Self; 4] = [
        Self::Temperature,
        Self::Humidity,
        Self::WaterLevel,
        Self::AirQuality,
    ];

    /// Wire label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Temperature => "temperature",
            Self::Humidity => "humidity",
            Self::WaterLevel => "water_level",
            Self::AirQuality => "air_quality",
        }
    }
}

/// City zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Zone {
    /// North.
    North,
    /// South.
    South,
    /// East.
    East,
    /// West.
    West,
    /// Central.
    Central,
}

impl Zone {
    const ALL: [Self; 5] = [
        Self::North,
        Self::South,
        Self::East,
        Self::West,
        Self::Central,
    ];

    /// Wire label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::North => "North",
            Self::South => "South",
            Self::East => "East",
            Self::West => "West",
            Self::Central => "Central",
        }
    }
}

/// Connectivity state of a sensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SensorStatus {
    /// Reporting.
    Online,
    /// Silent.
    Offline,
    /// Degraded.
    Warning,
}

/// Field sensor record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SensorDevice {
    /// `sensor-{n}`.
    pub id: String,
    /// Measured quantity.
    #[serde(rename = "type")]
    pub kind: SensorKind,
    /// Deployment zone.
    pub zone: Zone,
    /// Connectivity.
    pub status: SensorStatus,
    /// Last heartbeat.
    pub last_seen: DateTime<Utc>,
    /// Battery charge in percent.
    pub battery_level: f64,
}

impl SensorDevice {
    fn matches(&self, needle: &str) -> bool {
        self.id.to_lowercase().contains(needle)
            || self.kind.label().contains(needle)
            || self.zone.label().to_lowercase().contains(needle)
    }
}

/// One page of sensors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SensorPage {
    /// Devices on this page.
    pub devices: Vec<SensorDevice>,
    /// Pages available after filtering.
    pub total_pages: usize,
}

/// Generates the fleet, filters by `search` (case-insensitive substring of
/// id, type or zone) and returns page `page` (1-based; 0 is read as 1).
pub fn sensor_health<R: Rng + ?Sized>(
    rng: &mut R,
    now: DateTime<Utc>,
    page: usize,
    search: &str,
) -> SensorPage {
    let statuses = [
        SensorStatus::Online,
        SensorStatus::Offline,
        SensorStatus::Warning,
    ];
    let needle = search.trim().to_lowercase();
    let devices: Vec<_> = (0..SENSOR_COUNT)
        .map(|i| SensorDevice {
            id: format!("sensor-{i}"),
            kind: pick(rng, &SensorKind::ALL),
            zone: pick(rng, &Zone::ALL),
            status: pick(rng, &statuses),
            last_seen: now - Duration::hours(rng.gen_range(0..=24)),
            battery_level: rng.gen_range(0.0..=100.0),
        })
        .filter(|device| needle.is_empty() || device.matches(&needle))
        .collect();
    let total_pages = devices.len().div_ceil(SENSOR_PAGE_SIZE);
    let start = (page.max(1) - 1).saturating_mul(SENSOR_PAGE_SIZE);
    SensorPage {
        devices: devices
            .into_iter()
            .skip(start)
            .take(SENSOR_PAGE_SIZE)
            .collect(),
        total_pages,
    }
}

/// Alert severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Low.
    Low,
    /// Medium.
    Medium,
    /// High.
    High,
    /// Critical.
    Critical,
}

impl Severity {
    const ALL: [Self; 4] = [Self::Low, Self::Medium, Self::High, Self::Critical];

    const fn label(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }
}

/// Operator alert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    /// `alert-{n}`.
    pub id: String,
    /// Headline.
    pub title: String,
    /// Body text.
    pub message: String,
    /// Severity.
    pub severity: Severity,
    /// Raised at.
    pub timestamp: DateTime<Utc>,
}

const ALERT_TITLES: [&str; 5] = [
    "Temperature spike detected",
    "Water level rising",
    "Sensor offline",
    "Energy output low",
    "Barrier activation required",
];

/// Up to `limit` (capped at [`MAX_ALERTS`]) alerts, newest first.
pub fn alerts<R: Rng + ?Sized>(rng: &mut R, now: DateTime<Utc>, limit: usize) -> Vec<Alert> {
    let mut alerts: Vec<_> = (0..limit.min(MAX_ALERTS))
        .map(|i| {
            let severity = pick(rng, &Severity::ALL);
            Alert {
                id: format!("alert-{i}"),
                title: pick(rng, &ALERT_TITLES).to_string(),
                message: format!(
                    "Alert situation requires attention. Severity: {}",
                    severity.label()
                ),
                severity,
                timestamp: now - Duration::hours(rng.gen_range(0..=24)),
            }
        })
        .collect();
    alerts.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    alerts
}

/// Metric available on the analytics chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalyticsMetric {
    /// Temperature, 20–35.
    Temp,
    /// Air-quality index, 0–200.
    Aqi,
    /// Humidity, 0–100.
    Humidity,
    /// Rainfall, 0–50.
    Rainfall,
    /// Wave height, 0–5.
    WaveHeight,
    /// Energy output, 0–1000.
    EnergyOutput,
}

impl AnalyticsMetric {
    /// Parses a query name; unknown names yield `None`.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "temp" => Self::Temp,
            "aqi" => Self::Aqi,
            "humidity" => Self::Humidity,
            "rainfall" => Self::Rainfall,
            "waveHeight" => Self::WaveHeight,
            "energyOutput" => Self::EnergyOutput,
            _ => return None,
        })
    }

    /// Query and JSON key.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Temp => "temp",
            Self::Aqi => "aqi",
            Self::Humidity => "humidity",
            Self::Rainfall => "rainfall",
            Self::WaveHeight => "waveHeight",
            Self::EnergyOutput => "energyOutput",
        }
    }

    fn sample<R: Rng + ?Sized>(self, rng: &mut R) -> f64 {
        match self {
            Self::Temp => 20.0 + rng.gen_range(0.0..=15.0),
            Self::Aqi => rng.gen_range(0.0..=200.0),
            Self::Humidity => rng.gen_range(0.0..=100.0),
            Self::Rainfall => rng.gen_range(0.0..=50.0),
            Self::WaveHeight => rng.gen_range(0.0..=5.0),
            Self::EnergyOutput => rng.gen_range(0.0..=1000.0),
        }
    }
}

/// One day of analytics values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsEntry {
    /// Day sampled.
    pub timestamp: DateTime<Utc>,
    /// Requested metrics by name.
    #[serde(flatten)]
    pub values: IndexMap<String, f64>,
}

/// 30 daily entries ending `now`, one value per recognised metric name.
pub fn analytics<R, S>(rng: &mut R, now: DateTime<Utc>, names: &[S]) -> Vec<AnalyticsEntry>
where
    R: Rng + ?Sized,
    S: AsRef<str>,
{
    let metrics: Vec<_> = names
        .iter()
        .filter_map(|name| AnalyticsMetric::from_name(name.as_ref()))
        .collect();
    (0..ANALYTICS_DAYS)
        .map(|i| AnalyticsEntry {
            timestamp: now - Duration::days(ANALYTICS_DAYS - 1 - i),
            values: metrics
                .iter()
                .map(|metric| (metric.name().to_string(), metric.sample(rng)))
                .collect(),
        })
        .collect()
}

fn pick<R: Rng + ?Sized, T: Copy>(rng: &mut R, choices: &[T]) -> T {
    // Callers only pass non-empty constant tables.
    *choices.choose(rng).unwrap_or(&choices[0])
}
