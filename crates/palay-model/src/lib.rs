//! Palay Model
//!
//! Pure stochastic models for the rice-yield simulation: monthly season
//! blending, daily weather sampling, and per-cycle yield computation.
//! Everything here is stateless apart from the caller-supplied RNG.

pub mod harvest;
pub mod types;
pub mod weather;

pub use harvest::{compute_yield, YieldSample};
pub use types::{EnsoPhase, Irrigation, Season, TyphoonSeverity, WeatherKind};
pub use weather::{
    sample_day, sample_typhoon_severity, sample_weather, season_blend, season_label,
    weather_weights, DayWeather, SeasonBlend,
};
