use parking_lot::Mutex;
use rand::{rngs::SmallRng, Rng};

use crate::{
    helper::{random_seed, seeded_rng},
    scenario::{HourlySeries, SimulationResults, WaterloggingRisk},
};

/// Closed interval a synthetic metric is drawn from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MetricRange {
    /// Lower bound (inclusive).
    pub min: f64,
    /// Upper bound (inclusive).
    pub max: f64,
}

impl MetricRange {
    /// Temperature delta bounds.
    pub const TEMPERATURE_DELTA: Self = Self::new(20.0, 40.0);
    /// Inundated area bounds.
    pub const INUNDATION_AREA: Self = Self::new(0.0, 500.0);
    /// Air-quality index bounds.
    pub const AQI: Self = Self::new(50.0, 200.0);
    /// Humidity bounds.
    pub const HUMIDITY: Self = Self::new(30.0, 90.0);

    /// Creates a range; `min` must not exceed `max`.
    #[must_use]
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// True when `value` lies inside the range.
    #[must_use]
    pub fn contains(&self, value: f64) -> bool {
        (self.min..=self.max).contains(&value)
    }

    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        rng.gen_range(self.min..=self.max)
    }

    fn series<R: Rng + ?Sized>(&self, rng: &mut R) -> HourlySeries {
        std::array::from_fn(|_| self.sample(rng))
    }
}

/// Produces bounded-random forecasts when the model cannot be used.
///
/// Unlike model replies, synthetic maxima always match their series.
pub struct SyntheticForecaster {
    rng: Mutex<SmallRng>,
}

impl SyntheticForecaster {
    /// Creates a forecaster with a fixed seed.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(seeded_rng(seed)),
        }
    }

    /// Draws a fresh forecast.
    #[must_use]
    pub fn forecast(&self) -> SimulationResults {
        let mut rng = self.rng.lock();
        let temperature_delta = MetricRange::TEMPERATURE_DELTA.series(&mut *rng);
        let inundation_area = MetricRange::INUNDATION_AREA.series(&mut *rng);
        let aqi_data = MetricRange::AQI.series(&mut *rng);
        let humidity_data = MetricRange::HUMIDITY.series(&mut *rng);
        let risk = WaterloggingRisk::ALL[rng.gen_range(0..WaterloggingRisk::ALL.len())];
        SimulationResults::with_derived_maxima(
            temperature_delta,
            inundation_area,
            aqi_data,
            humidity_data,
            risk,
        )
    }
}

impl Default for SyntheticForecaster {
    fn default() -> Self {
        Self::new(random_seed())
    }
}
