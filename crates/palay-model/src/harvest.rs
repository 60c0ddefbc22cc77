//! Yield model
//!
//! Maps a cycle's dominant weather regime plus management settings to a
//! final yield, decomposed into a deterministic component and gaussian
//! noise so the statistics layer can attribute variance between the two.

use rand::Rng;
use rand_distr::StandardNormal;

use crate::types::{EnsoPhase, Irrigation, TyphoonSeverity, WeatherKind};

/// Base yield (t/ha) per dominant weather, in [`WeatherKind::ALL`] order.
const BASE_YIELD: [f64; 4] = [2.0, 3.0, 3.3, 1.2];

/// Severity-specific base yields for typhoon-dominated cycles.
const MODERATE_TYPHOON_YIELD: f64 = 1.4;
const SEVERE_TYPHOON_YIELD: f64 = 0.8;

/// Standard deviation of the noise component.
const NOISE_SD: f64 = 0.2;

fn irrigation_adjustment(irrigation: Irrigation) -> f64 {
    match irrigation {
        Irrigation::Irrigated => 0.3,
        Irrigation::Rainfed => 0.0,
    }
}

fn enso_adjustment(enso: EnsoPhase) -> f64 {
    match enso {
        EnsoPhase::ElNino => -0.4,
        EnsoPhase::Neutral => 0.0,
        EnsoPhase::LaNina => 0.3,
    }
}

/// Yield decomposition for one completed cycle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct YieldSample {
    /// Realized yield, floored at zero.
    pub value: f64,
    /// Weather and management component, before noise.
    pub deterministic: f64,
    /// Gaussian noise component.
    pub noise: f64,
    /// Base yield for the dominant weather regime alone.
    pub base: f64,
}

/// Compute one cycle's yield.
///
/// A typhoon-dominated cycle with a known dominant severity uses the
/// severity-specific base; otherwise the per-weather base applies. A
/// negative deterministic+noise sum silently floors to zero, it is not an
/// error.
pub fn compute_yield<R: Rng + ?Sized>(
    rng: &mut R,
    weather: WeatherKind,
    severity: Option<TyphoonSeverity>,
    irrigation: Irrigation,
    enso: EnsoPhase,
) -> YieldSample {
    let base = match (weather, severity) {
        (WeatherKind::Typhoon, Some(TyphoonSeverity::Moderate)) => MODERATE_TYPHOON_YIELD,
        (WeatherKind::Typhoon, Some(TyphoonSeverity::Severe)) => SEVERE_TYPHOON_YIELD,
        _ => BASE_YIELD[weather.index()],
    };

    let deterministic = base + irrigation_adjustment(irrigation) + enso_adjustment(enso);
    let z: f64 = rng.sample(StandardNormal);
    let noise = NOISE_SD * z;
    let value = (deterministic + noise).max(0.0);

    YieldSample {
        value,
        deterministic,
        noise,
        base,
    }
}
