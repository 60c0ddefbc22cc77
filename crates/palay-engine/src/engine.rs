//! Simulation engine
//!
//! Owns all mutable simulation state and advances it under a fixed-step
//! time accumulator. The host feeds elapsed real time through
//! [`Engine::advance`] at display-refresh cadence; the engine converts it
//! into whole simulated days (day mode) or whole cycles (cycle mode),
//! catching up when real time jumps ahead. Completed cycles flow into the
//! statistics accumulator and are published as copy-on-read snapshots.

use std::time::Duration;

use chrono::{Datelike, NaiveDate};
use indexmap::IndexMap;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, info, trace};

use palay_model::{compute_yield, sample_day, season_label, DayWeather, TyphoonSeverity, WeatherKind};

use crate::calendar;
use crate::params::{ParamPatch, SimParams, MAX_TYPHOON_PROBABILITY};
use crate::snapshot::{CycleRecord, EngineStatus, RunMode, Snapshot};
use crate::stats::{Summary, YieldStats};
use crate::tally::{SeverityCounts, WeatherCounts};

/// Day-mode quantum at speed 1.0.
const BASE_SECONDS_PER_DAY: f64 = 1.0;

/// Cycle-mode visual duration at speed 1.0 and its clamp bounds. The
/// playback duration is independent of days-per-cycle.
const BASE_CYCLE_SECONDS: f64 = 0.3;
const MIN_CYCLE_SECONDS: f64 = 0.2;
const MAX_CYCLE_SECONDS: f64 = 0.5;

/// Speed control bounds.
const MIN_SPEED: f64 = 0.5;
const MAX_SPEED: f64 = 20.0;

/// Minimum interval between throttled snapshot emissions (~20 Hz).
/// Control operations always emit immediately regardless.
const EMIT_INTERVAL: Duration = Duration::from_millis(50);

/// Sacks of milled rice per ton of yield.
const SACKS_PER_TON: f64 = 20.0;

/// Subscription handle returned by [`Engine::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriberId(u64);

type SnapshotFn = Box<dyn FnMut(&Snapshot) + Send>;

/// The simulation engine.
///
/// Explicitly constructed and owned; independent engines never share
/// state. Single-threaded and cooperative: the engine is the sole
/// mutator, and every external read receives an independent copy.
pub struct Engine {
    status: EngineStatus,
    mode: RunMode,
    speed_multiplier: f64,
    params: SimParams,
    pending: ParamPatch,
    rng: StdRng,

    current_cycle_index: u32,
    current_day: u32,
    current_weather: Option<WeatherKind>,
    current_yield: Option<f64>,
    timeline: Vec<WeatherKind>,
    severity_timeline: Vec<Option<TyphoonSeverity>>,
    /// Pre-generated day sequence for the cycle in progress (cycle mode).
    prepared_days: Vec<DayWeather>,

    cycle_tally: WeatherCounts,
    cycle_severity: SeverityCounts,
    weather_counts: WeatherCounts,
    daily_weather_counts: WeatherCounts,
    daily_severity_counts: SeverityCounts,

    stats: YieldStats,
    summary: Option<Summary>,
    records: Vec<CycleRecord>,

    cycle_start: NaiveDate,
    first_cycle_start: NaiveDate,
    last_completed_start: Option<NaiveDate>,

    day_accumulator: Duration,
    cycle_accumulator: Duration,
    since_emit: Duration,

    subscribers: IndexMap<SubscriberId, SnapshotFn>,
    next_subscriber: u64,
}

impl Engine {
    /// Create an engine seeded from OS entropy.
    pub fn new(params: SimParams) -> Self {
        Self::with_rng(params, StdRng::from_entropy())
    }

    /// Create an engine with a fixed seed for reproducible runs.
    pub fn with_seed(params: SimParams, seed: u64) -> Self {
        Self::with_rng(params, StdRng::seed_from_u64(seed))
    }

    fn with_rng(params: SimParams, rng: StdRng) -> Self {
        let cycle_start = calendar::planting_start(params.planting_month);
        info!(?params, "engine created");
        Self {
            status: EngineStatus::Idle,
            mode: RunMode::Day,
            speed_multiplier: 1.0,
            params,
            pending: ParamPatch::default(),
            rng,
            current_cycle_index: 0,
            current_day: 0,
            current_weather: None,
            current_yield: None,
            timeline: Vec::new(),
            severity_timeline: Vec::new(),
            prepared_days: Vec::new(),
            cycle_tally: WeatherCounts::default(),
            cycle_severity: SeverityCounts::default(),
            weather_counts: WeatherCounts::default(),
            daily_weather_counts: WeatherCounts::default(),
            daily_severity_counts: SeverityCounts::default(),
            stats: YieldStats::default(),
            summary: None,
            records: Vec::new(),
            cycle_start,
            first_cycle_start: cycle_start,
            last_completed_start: None,
            day_accumulator: Duration::ZERO,
            cycle_accumulator: Duration::ZERO,
            since_emit: Duration::ZERO,
            subscribers: IndexMap::new(),
            next_subscriber: 0,
        }
    }

    // ------------------------------------------------------------------
    // Control surface. Fire-and-forget: no return value, no error
    // channel; callers observe effect only via snapshots. Every control
    // operation forces an immediate, unthrottled emission.

    /// Begin a day-mode run from a clean slate.
    pub fn start(&mut self) {
        self.mode = RunMode::Day;
        self.reset_run_state();
        self.status = EngineStatus::Running;
        info!(mode = "day", "run started");
        self.emit_now();
    }

    /// Begin a cycle-mode (instant sweep) run from a clean slate.
    pub fn start_instant(&mut self) {
        self.mode = RunMode::Cycle;
        self.reset_run_state();
        self.status = EngineStatus::Running;
        self.prepare_cycle();
        info!(mode = "cycle", "run started");
        self.emit_now();
    }

    /// Suspend a running simulation. No-op unless running.
    ///
    /// Fractional leftover time in the accumulators is discarded, so
    /// resuming restarts timing fresh instead of bursting catch-up steps.
    pub fn pause(&mut self) {
        if self.status == EngineStatus::Running {
            self.status = EngineStatus::Paused;
            self.day_accumulator = Duration::ZERO;
            self.cycle_accumulator = Duration::ZERO;
            info!("run paused");
            self.emit_now();
        }
    }

    /// Resume a paused simulation. No-op unless paused.
    pub fn resume(&mut self) {
        if self.status == EngineStatus::Paused {
            self.status = EngineStatus::Running;
            info!("run resumed");
            self.emit_now();
        }
    }

    /// Cancel everything and return to idle with zeroed state.
    ///
    /// A still-pending parameter overlay is folded into the base set
    /// first, so a change requested during the run survives the reset.
    pub fn reset(&mut self) {
        self.status = EngineStatus::Idle;
        self.reset_run_state();
        info!("engine reset");
        self.emit_now();
    }

    /// Set the playback speed multiplier, clamped to [0.5, 20].
    pub fn set_speed(&mut self, multiplier: f64) {
        self.speed_multiplier = multiplier.clamp(MIN_SPEED, MAX_SPEED);
        debug!(speed = self.speed_multiplier, "speed changed");
        self.emit_now();
    }

    /// Apply a parameter patch.
    ///
    /// `typhoon_probability` is live: it applies immediately in any state
    /// and affects the very next weather sample. All other fields apply
    /// immediately when idle, but during an active run they are staged
    /// and committed together at the next cycle-finalization boundary,
    /// so no cycle is computed under a mixed parameter set.
    pub fn update_params(&mut self, mut patch: ParamPatch) {
        if let Some(probability) = patch.typhoon_probability.take() {
            self.params.typhoon_probability = probability.clamp(0.0, MAX_TYPHOON_PROBABILITY);
        }

        let active = matches!(self.status, EngineStatus::Running | EngineStatus::Paused);
        if !active {
            let realign = patch.planting_month.is_some();
            patch.apply_to(&mut self.params);
            self.pending = ParamPatch::default();
            if realign {
                self.align_calendar();
            }
        } else if !patch.is_empty() {
            debug!(?patch, "parameter change staged");
            self.pending.merge(patch);
        }
        self.emit_now();
    }

    // ------------------------------------------------------------------
    // Time progression.

    /// Feed elapsed host time into the fixed-step accumulator.
    ///
    /// The host calls this roughly once per display refresh; any number
    /// of whole simulated steps may complete within one call if real time
    /// has advanced far enough. No step is ever skipped. Ignored unless
    /// running.
    pub fn advance(&mut self, elapsed: Duration) {
        if self.status != EngineStatus::Running {
            return;
        }
        if self.current_cycle_index >= self.params.cycles_target {
            self.finish();
            return;
        }
        self.since_emit += elapsed;

        let stepped = match self.mode {
            RunMode::Day => self.advance_days(elapsed),
            RunMode::Cycle => self.advance_cycles(elapsed),
        };

        if stepped && self.status == EngineStatus::Running && self.since_emit >= EMIT_INTERVAL {
            self.emit_now();
        }
    }

    fn advance_days(&mut self, elapsed: Duration) -> bool {
        let quantum = Duration::from_secs_f64(BASE_SECONDS_PER_DAY / self.speed_multiplier);
        self.day_accumulator += elapsed;

        let mut stepped = false;
        while self.day_accumulator >= quantum && self.status == EngineStatus::Running {
            self.day_accumulator -= quantum;
            self.step_day();
            stepped = true;
        }
        stepped
    }

    /// Sample and record one live day; finalize the cycle when the day
    /// tally reaches the cycle length.
    fn step_day(&mut self) {
        let month = calendar::month_for_day(self.cycle_start, self.current_day);
        let day = sample_day(&mut self.rng, month, self.params.typhoon_fraction());

        if let Some(severity) = day.severity {
            self.cycle_severity.bump(severity);
            self.daily_severity_counts.bump(severity);
        }

        self.current_day += 1;
        self.current_weather = Some(day.kind);
        self.cycle_tally.bump(day.kind);
        self.daily_weather_counts.bump(day.kind);

        self.timeline.push(day.kind);
        self.severity_timeline.push(day.severity);
        let cap = self.params.days_per_cycle as usize;
        while self.timeline.len() > cap {
            self.timeline.remove(0);
        }
        while self.severity_timeline.len() > cap {
            self.severity_timeline.remove(0);
        }

        trace!(day = self.current_day, weather = %day.kind, "day sampled");

        if self.current_day >= self.params.days_per_cycle {
            self.finalize_cycle();
        }
    }

    fn advance_cycles(&mut self, elapsed: Duration) -> bool {
        if self.prepared_days.is_empty() && self.params.days_per_cycle > 0 {
            self.prepare_cycle();
        }

        let duration = self.cycle_duration();
        self.cycle_accumulator += elapsed;

        let mut stepped = false;
        while self.cycle_accumulator >= duration && self.status == EngineStatus::Running {
            self.cycle_accumulator -= duration;
            self.complete_prepared_cycle();
            stepped = true;
            if self.status == EngineStatus::Running {
                self.prepare_cycle();
            }
        }

        if self.status == EngineStatus::Running {
            self.scrub_prepared(duration);
        }
        stepped
    }

    /// Compressed visual duration of one cycle-mode sweep, independent of
    /// days-per-cycle.
    fn cycle_duration(&self) -> Duration {
        let seconds =
            (BASE_CYCLE_SECONDS / self.speed_multiplier).clamp(MIN_CYCLE_SECONDS, MAX_CYCLE_SECONDS);
        Duration::from_secs_f64(seconds)
    }

    /// Pre-generate the whole day sequence for one cycle using the same
    /// per-day sampler as day mode, so the two modes stay statistically
    /// equivalent.
    fn prepare_cycle(&mut self) {
        self.prepared_days.clear();
        self.cycle_tally = WeatherCounts::default();
        self.cycle_severity = SeverityCounts::default();

        let typhoon = self.params.typhoon_fraction();
        for day_index in 0..self.params.days_per_cycle {
            let month = calendar::month_for_day(self.cycle_start, day_index);
            let day = sample_day(&mut self.rng, month, typhoon);
            self.cycle_tally.bump(day.kind);
            if let Some(severity) = day.severity {
                self.cycle_severity.bump(severity);
            }
            self.prepared_days.push(day);
        }

        self.current_day = 0;
        self.current_weather = self.prepared_days.first().map(|d| d.kind);
        self.timeline.clear();
        self.severity_timeline.clear();
        debug!(days = self.prepared_days.len(), "cycle pre-generated");
    }

    /// Play the prepared cycle out to its end and finalize it.
    fn complete_prepared_cycle(&mut self) {
        self.current_day = self.params.days_per_cycle;
        self.timeline = self.prepared_days.iter().map(|d| d.kind).collect();
        self.severity_timeline = self.prepared_days.iter().map(|d| d.severity).collect();
        self.finalize_cycle();
    }

    /// Advance the smooth "current day" indicator through the prepared
    /// sequence according to the fraction of the visual duration elapsed.
    fn scrub_prepared(&mut self, duration: Duration) {
        let progress = (self.cycle_accumulator.as_secs_f64() / duration.as_secs_f64()).min(1.0);
        let day_index =
            ((progress * self.params.days_per_cycle as f64) as u32).min(self.params.days_per_cycle);

        if day_index != self.current_day {
            self.current_day = day_index;
            let weather_index = (day_index.saturating_sub(1)) as usize;
            if weather_index < self.prepared_days.len() {
                self.current_weather = Some(self.prepared_days[weather_index].kind);
            }
            self.timeline = self.prepared_days[..day_index as usize]
                .iter()
                .map(|d| d.kind)
                .collect();
            self.severity_timeline = self.prepared_days[..day_index as usize]
                .iter()
                .map(|d| d.severity)
                .collect();
        }
    }

    /// Close out the cycle in progress: derive dominants, compute yield,
    /// feed the accumulator, append the immutable record, and commit any
    /// pending parameter overlay, all at this single boundary.
    fn finalize_cycle(&mut self) {
        let dominant = self.cycle_tally.dominant();
        let dominant_severity = self.cycle_severity.dominant();
        let season = season_label(self.cycle_start.month());

        let sample = compute_yield(
            &mut self.rng,
            dominant,
            dominant_severity,
            self.params.irrigation_type,
            self.params.enso_state,
        );
        self.current_yield = Some(sample.value);
        self.last_completed_start = Some(self.cycle_start);

        self.weather_counts.bump(dominant);
        if self.mode == RunMode::Cycle {
            // Day mode tallies these live, per sampled day.
            self.daily_weather_counts.add(&self.cycle_tally);
            self.daily_severity_counts.add(&self.cycle_severity);
        }

        let display_index = self.current_cycle_index + 1;
        self.stats.record(display_index, &sample);
        self.summary = self.stats.summary();
        if let Some(summary) = self.summary {
            self.stats.push_band(display_index, &summary);
        }

        self.records.push(CycleRecord {
            cycle_index: display_index,
            yield_tons: sample.value,
            yield_sacks: sample.value * SACKS_PER_TON,
            season,
            weather: dominant,
            dominant_typhoon_severity: dominant_severity,
            typhoon_days: self.cycle_severity.total(),
            severe_typhoon_days: self.cycle_severity.severe,
            enso_state: self.params.enso_state,
            irrigation_type: self.params.irrigation_type,
            planting_month: self.cycle_start.month(),
            typhoon_probability: self.params.typhoon_probability,
        });

        debug!(
            cycle = display_index,
            value = sample.value,
            weather = %dominant,
            "cycle finalized"
        );

        // Commit the staged overlay atomically at this boundary.
        let prev_cycle_days = self.params.days_per_cycle;
        let pending = std::mem::take(&mut self.pending);
        let new_month = pending
            .planting_month
            .filter(|month| *month != self.params.planting_month);
        pending.apply_to(&mut self.params);
        self.cycle_start = calendar::advance_cycle_start(self.cycle_start, prev_cycle_days, new_month);

        self.current_cycle_index += 1;
        self.current_day = 0;
        self.cycle_tally = WeatherCounts::default();
        self.cycle_severity = SeverityCounts::default();
        self.timeline.clear();
        self.severity_timeline.clear();
        self.prepared_days.clear();

        if self.current_cycle_index >= self.params.cycles_target {
            self.finish();
        }
    }

    fn finish(&mut self) {
        if self.status == EngineStatus::Finished {
            return;
        }
        self.status = EngineStatus::Finished;
        self.summary = self.stats.summary();
        info!(cycles = self.current_cycle_index, "run finished");
        self.emit_now();
    }

    /// Zero all runtime and statistics state, folding any still-pending
    /// parameter overlay into the base set first.
    fn reset_run_state(&mut self) {
        self.current_cycle_index = 0;
        self.current_day = 0;
        self.current_weather = None;
        self.current_yield = None;
        self.timeline.clear();
        self.severity_timeline.clear();
        self.prepared_days.clear();

        self.cycle_tally = WeatherCounts::default();
        self.cycle_severity = SeverityCounts::default();
        self.weather_counts = WeatherCounts::default();
        self.daily_weather_counts = WeatherCounts::default();
        self.daily_severity_counts = SeverityCounts::default();

        self.stats = YieldStats::default();
        self.summary = None;
        self.records.clear();

        self.day_accumulator = Duration::ZERO;
        self.cycle_accumulator = Duration::ZERO;
        self.since_emit = Duration::ZERO;

        let pending = std::mem::take(&mut self.pending);
        pending.apply_to(&mut self.params);
        self.align_calendar();
    }

    fn align_calendar(&mut self) {
        self.cycle_start = calendar::planting_start(self.params.planting_month);
        self.first_cycle_start = self.cycle_start;
        self.last_completed_start = None;
    }

    // ------------------------------------------------------------------
    // Observation.

    /// Register a subscriber. The callback fires immediately with the
    /// current snapshot, then on every throttled or forced emission.
    pub fn subscribe<F>(&mut self, mut callback: F) -> SubscriberId
    where
        F: FnMut(&Snapshot) + Send + 'static,
    {
        let id = SubscriberId(self.next_subscriber);
        self.next_subscriber += 1;

        let snapshot = self.snapshot();
        callback(&snapshot);
        self.subscribers.insert(id, Box::new(callback));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriberId) {
        self.subscribers.shift_remove(&id);
    }

    /// Synchronous snapshot pull.
    pub fn snapshot(&self) -> Snapshot {
        let days = self.params.days_per_cycle;
        let day_progress = if days > 0 {
            self.current_day as f64 / days as f64
        } else {
            0.0
        };
        let run_progress = if self.params.cycles_target > 0 {
            self.current_cycle_index as f64 / self.params.cycles_target as f64
        } else {
            0.0
        };

        Snapshot {
            status: self.status,
            mode: self.mode,
            speed_multiplier: self.speed_multiplier,
            params: self.params,
            pending_params: self.pending,
            current_cycle_index: self.current_cycle_index,
            current_day: self.current_day,
            day_progress,
            run_progress,
            current_weather: self.current_weather,
            current_yield: self.current_yield,
            current_cycle_weather_timeline: self.timeline.clone(),
            current_cycle_typhoon_severity_timeline: self.severity_timeline.clone(),
            cycle_start_date: self.cycle_start,
            first_cycle_start_date: self.first_cycle_start,
            last_completed_cycle_start_date: self.last_completed_start,
            running_mean: self.stats.mean(),
            running_sd: self.stats.sd(),
            low_yield_prob: self.stats.low_yield_probability(),
            yield_history_over_time: self.stats.mean_trend(),
            recent_yields: self.stats.recent_yields(),
            yield_series: self.stats.yield_series(),
            yield_band_series: self.stats.band_series(),
            cycle_records: self.records.clone(),
            weather_counts: self.weather_counts,
            daily_weather_counts: self.daily_weather_counts,
            daily_typhoon_severity_counts: self.daily_severity_counts,
            histogram_bins: self.stats.histogram_bins(),
            summary: self.summary,
        }
    }

    /// Publish an unthrottled snapshot to every subscriber and restart
    /// the throttle window.
    fn emit_now(&mut self) {
        self.since_emit = Duration::ZERO;
        if self.subscribers.is_empty() {
            return;
        }
        let snapshot = self.snapshot();
        for callback in self.subscribers.values_mut() {
            callback(&snapshot);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine() -> Engine {
        Engine::with_seed(SimParams::default(), 1)
    }

    #[test]
    fn test_start_reaches_running() {
        let mut engine = engine();
        assert_eq!(engine.snapshot().status, EngineStatus::Idle);
        engine.start();
        assert_eq!(engine.snapshot().status, EngineStatus::Running);
        assert_eq!(engine.snapshot().mode, RunMode::Day);
    }

    #[test]
    fn test_pause_resume_round_trip() {
        let mut engine = engine();
        engine.start();
        engine.pause();
        assert_eq!(engine.snapshot().status, EngineStatus::Paused);
        engine.resume();
        assert_eq!(engine.snapshot().status, EngineStatus::Running);
    }

    #[test]
    fn test_invalid_transitions_are_no_ops() {
        let mut engine = engine();
        engine.pause();
        assert_eq!(engine.snapshot().status, EngineStatus::Idle);
        engine.resume();
        assert_eq!(engine.snapshot().status, EngineStatus::Idle);

        engine.start();
        engine.resume(); // running, not paused
        assert_eq!(engine.snapshot().status, EngineStatus::Running);
    }

    #[test]
    fn test_reset_returns_to_idle_with_zeroed_counters() {
        let mut engine = engine();
        engine.start();
        engine.advance(Duration::from_secs(5));
        engine.reset();

        let snapshot = engine.snapshot();
        assert_eq!(snapshot.status, EngineStatus::Idle);
        assert_eq!(snapshot.current_day, 0);
        assert_eq!(snapshot.current_cycle_index, 0);
        assert_eq!(snapshot.cycle_records.len(), 0);
        assert_eq!(snapshot.daily_weather_counts.total(), 0);
        assert_eq!(snapshot.running_mean, 0.0);
    }

    #[test]
    fn test_repeated_reset_is_idempotent() {
        let mut engine = engine();
        engine.start();
        engine.advance(Duration::from_secs(3));
        engine.reset();
        let first = engine.snapshot();
        engine.reset();
        let second = engine.snapshot();
        assert_eq!(first, second);
    }

    #[test]
    fn test_set_speed_clamps() {
        let mut engine = engine();
        engine.set_speed(0.1);
        assert_eq!(engine.snapshot().speed_multiplier, 0.5);
        engine.set_speed(100.0);
        assert_eq!(engine.snapshot().speed_multiplier, 20.0);
    }

    #[test]
    fn test_typhoon_probability_is_live_mid_run() {
        let mut engine = engine();
        engine.start();
        engine.update_params(ParamPatch {
            typhoon_probability: Some(33.0),
            ..ParamPatch::default()
        });
        let snapshot = engine.snapshot();
        assert_eq!(snapshot.params.typhoon_probability, 33.0);
        assert!(snapshot.pending_params.is_empty());
    }

    #[test]
    fn test_non_live_params_staged_while_running() {
        let mut engine = engine();
        engine.start();
        engine.update_params(ParamPatch {
            cycles_target: Some(10),
            ..ParamPatch::default()
        });
        let snapshot = engine.snapshot();
        assert_eq!(snapshot.params.cycles_target, 100);
        assert_eq!(snapshot.pending_params.cycles_target, Some(10));
    }

    #[test]
    fn test_pending_params_survive_reset() {
        let mut engine = engine();
        engine.start();
        engine.update_params(ParamPatch {
            cycles_target: Some(10),
            ..ParamPatch::default()
        });
        engine.reset();
        let snapshot = engine.snapshot();
        assert_eq!(snapshot.params.cycles_target, 10);
        assert!(snapshot.pending_params.is_empty());
    }

    #[test]
    fn test_advance_while_idle_is_ignored() {
        let mut engine = engine();
        engine.advance(Duration::from_secs(60));
        let snapshot = engine.snapshot();
        assert_eq!(snapshot.status, EngineStatus::Idle);
        assert_eq!(snapshot.current_day, 0);
    }

    #[test]
    fn test_zero_days_per_cycle_yields_zero_progress() {
        let params = SimParams {
            days_per_cycle: 0,
            ..SimParams::default()
        };
        let engine = Engine::with_seed(params, 1);
        assert_eq!(engine.snapshot().day_progress, 0.0);
    }
}
