//! Season blending and daily weather sampling
//!
//! A calendar month maps to a fractional mixture of dry- and wet-season
//! probability tables; daily weather is drawn by cumulative-weight
//! selection over the blended, renormalized table. Blending gives smooth
//! month-to-month transitions instead of a hard seasonal cutoff.

use rand::Rng;

use crate::types::{Season, TyphoonSeverity, WeatherKind};

/// Wet season spans June through October inclusive.
const WET_START: u32 = 6;
const WET_END: u32 = 10;

/// Multiplier applied to the configured typhoon probability inside the
/// wet-season table. The resulting weight is clamped to [0, 0.6].
const TYPHOON_MULTIPLIER: f64 = 1.2;
const MAX_TYPHOON_WEIGHT: f64 = 0.6;

/// Probability that a typhoon day is severe rather than moderate.
const SEVERE_PROBABILITY: f64 = 0.4;

/// Dry-season weights in [`WeatherKind::ALL`] order.
const DRY_TABLE: [f64; 4] = [0.5, 0.4, 0.1, 0.05];

/// Fractional dry/wet mixture for one calendar month.
///
/// Invariant: `dry_weight + wet_weight == 1` for every month.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeasonBlend {
    pub dry_weight: f64,
    pub wet_weight: f64,
    pub label: Season,
}

fn wrap_month(month: i32) -> u32 {
    if month < 1 {
        (month + 12) as u32
    } else if month > 12 {
        (month - 12) as u32
    } else {
        month as u32
    }
}

/// Season mixture for `month` (1-12).
///
/// Inside the wet window the wet weight is 1; in the two months on either
/// side it decays through 0.5 and 0.25; everywhere else it is 0. The
/// transition label applies when the wet weight sits in [0.4, 0.6].
pub fn season_blend(month: u32) -> SeasonBlend {
    let wet_weight = if (WET_START..=WET_END).contains(&month) {
        1.0
    } else if month == wrap_month(WET_START as i32 - 1) || month == wrap_month(WET_END as i32 + 1) {
        0.5
    } else if month == wrap_month(WET_START as i32 - 2) || month == wrap_month(WET_END as i32 + 2) {
        0.25
    } else {
        0.0
    };

    let label = if wet_weight >= 0.6 {
        Season::Wet
    } else if wet_weight <= 0.4 {
        Season::Dry
    } else {
        Season::Transition
    };

    SeasonBlend {
        dry_weight: 1.0 - wet_weight,
        wet_weight,
        label,
    }
}

/// Season classification of a month, ignoring the mixture weights.
pub fn season_label(month: u32) -> Season {
    season_blend(month).label
}

/// Blended weather weights for `month`, renormalized to sum to 1.
///
/// `typhoon_prob` is a fraction in [0, 1], not a percentage.
pub fn weather_weights(month: u32, typhoon_prob: f64) -> [f64; 4] {
    let blend = season_blend(month);
    let typhoon_weight = (typhoon_prob * TYPHOON_MULTIPLIER).clamp(0.0, MAX_TYPHOON_WEIGHT);
    let wet_table = [0.1, 0.4, 0.35, typhoon_weight];

    let mut weights = [0.0; 4];
    for (i, weight) in weights.iter_mut().enumerate() {
        *weight = DRY_TABLE[i] * blend.dry_weight + wet_table[i] * blend.wet_weight;
    }

    let total: f64 = weights.iter().sum();
    for weight in &mut weights {
        *weight /= total;
    }
    weights
}

/// Draw one day's weather by cumulative-weight selection over
/// [`WeatherKind::ALL`]: the first kind whose cumulative weight exceeds a
/// single uniform draw is selected.
pub fn sample_weather<R: Rng + ?Sized>(rng: &mut R, month: u32, typhoon_prob: f64) -> WeatherKind {
    let weights = weather_weights(month, typhoon_prob);
    let draw: f64 = rng.gen();

    let mut cumulative = 0.0;
    for (kind, weight) in WeatherKind::ALL.iter().zip(weights) {
        cumulative += weight;
        if draw < cumulative {
            return *kind;
        }
    }
    WeatherKind::Typhoon
}

/// Independent binary severity draw for a typhoon day.
pub fn sample_typhoon_severity<R: Rng + ?Sized>(rng: &mut R) -> TyphoonSeverity {
    if rng.gen::<f64>() < SEVERE_PROBABILITY {
        TyphoonSeverity::Severe
    } else {
        TyphoonSeverity::Moderate
    }
}

/// One sampled day: the weather kind, plus a severity when a typhoon struck.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DayWeather {
    pub kind: WeatherKind,
    pub severity: Option<TyphoonSeverity>,
}

/// Unified per-day generator.
///
/// Both pacing modes draw days through this function, so live day-by-day
/// runs and pre-generated instant sweeps share one generative model.
pub fn sample_day<R: Rng + ?Sized>(rng: &mut R, month: u32, typhoon_prob: f64) -> DayWeather {
    let kind = sample_weather(rng, month, typhoon_prob);
    let severity = if kind == WeatherKind::Typhoon {
        Some(sample_typhoon_severity(rng))
    } else {
        None
    };
    DayWeather { kind, severity }
}
