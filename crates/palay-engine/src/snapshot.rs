//! Snapshot wire types
//!
//! Fully copied, read-only views of the engine published to subscribers.
//! Consumers never hold references into engine-internal mutable state;
//! every field is an owned copy.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use palay_model::{EnsoPhase, Irrigation, Season, TyphoonSeverity, WeatherKind};

use crate::params::{ParamPatch, SimParams};
use crate::stats::{BandPoint, HistogramBin, SeriesPoint, Summary};
use crate::tally::{SeverityCounts, WeatherCounts};

/// Run-state of the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineStatus {
    Idle,
    Running,
    Paused,
    Finished,
}

/// Playback strategy, chosen at start and fixed for the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunMode {
    /// One simulated day per fixed time quantum.
    Day,
    /// Whole pre-generated cycles played back over a compressed duration.
    Cycle,
}

/// Immutable fact about one completed cycle.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CycleRecord {
    /// 1-based display index.
    pub cycle_index: u32,
    pub yield_tons: f64,
    /// Same yield in discrete 50-kg sack units (20 sacks per ton).
    pub yield_sacks: f64,
    pub season: Season,
    pub weather: WeatherKind,
    pub dominant_typhoon_severity: Option<TyphoonSeverity>,
    pub typhoon_days: u32,
    pub severe_typhoon_days: u32,
    pub enso_state: EnsoPhase,
    pub irrigation_type: Irrigation,
    pub planting_month: u32,
    pub typhoon_probability: f64,
}

/// Deep-copied view of the engine for subscribers and pollers.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub status: EngineStatus,
    pub mode: RunMode,
    pub speed_multiplier: f64,
    pub params: SimParams,
    pub pending_params: ParamPatch,
    /// 0-based index of the cycle in progress.
    pub current_cycle_index: u32,
    pub current_day: u32,
    /// Fraction of the current cycle completed; zero when days-per-cycle
    /// is zero rather than NaN.
    pub day_progress: f64,
    /// Fraction of the run completed; zero when the cycle target is zero.
    pub run_progress: f64,
    pub current_weather: Option<WeatherKind>,
    pub current_yield: Option<f64>,
    pub current_cycle_weather_timeline: Vec<WeatherKind>,
    pub current_cycle_typhoon_severity_timeline: Vec<Option<TyphoonSeverity>>,
    pub cycle_start_date: NaiveDate,
    pub first_cycle_start_date: NaiveDate,
    pub last_completed_cycle_start_date: Option<NaiveDate>,
    pub running_mean: f64,
    pub running_sd: f64,
    pub low_yield_prob: f64,
    pub yield_history_over_time: Vec<f64>,
    pub recent_yields: Vec<f64>,
    pub yield_series: Vec<SeriesPoint>,
    pub yield_band_series: Vec<BandPoint>,
    pub cycle_records: Vec<CycleRecord>,
    /// Dominant weather per completed cycle.
    pub weather_counts: WeatherCounts,
    /// Every simulated day across the run.
    pub daily_weather_counts: WeatherCounts,
    pub daily_typhoon_severity_counts: SeverityCounts,
    pub histogram_bins: Vec<HistogramBin>,
    pub summary: Option<Summary>,
}
