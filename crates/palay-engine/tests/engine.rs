//! End-to-end engine tests driven by a virtual clock.
//!
//! Real time never passes here: every test feeds synthetic elapsed
//! durations through `Engine::advance`, exercising the fixed-step
//! accumulator, both pacing modes, cycle finalization, and the
//! parameter-staging contract exactly as a display-refresh host would.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use palay_engine::{Engine, EngineStatus, ParamPatch, SimParams};
use palay_model::EnsoPhase;

const FRAME: Duration = Duration::from_millis(16);

fn test_params() -> SimParams {
    SimParams {
        planting_month: 6,
        typhoon_probability: 15.0,
        cycles_target: 10,
        days_per_cycle: 5,
        ..SimParams::default()
    }
}

/// Drive the engine with display-refresh-sized frames until it finishes.
fn run_to_finish(engine: &mut Engine) {
    for _ in 0..1_000_000 {
        if engine.snapshot().status == EngineStatus::Finished {
            return;
        }
        engine.advance(FRAME);
    }
    panic!("engine did not finish within the iteration limit");
}

#[test]
fn test_instant_sweep_scenario_runs_to_completion() {
    let mut engine = Engine::with_seed(test_params(), 42);
    engine.start_instant();
    run_to_finish(&mut engine);

    let snapshot = engine.snapshot();
    assert_eq!(snapshot.status, EngineStatus::Finished);
    assert_eq!(snapshot.cycle_records.len(), 10);
    assert_eq!(snapshot.current_cycle_index, 10);
    assert_eq!(snapshot.run_progress, 1.0);

    let histogram_total: u32 = snapshot.histogram_bins.iter().map(|b| b.count).sum();
    assert_eq!(histogram_total, 10);

    // Records are 1-based and carry the season of their start month.
    assert_eq!(snapshot.cycle_records[0].cycle_index, 1);
    assert!(snapshot.summary.is_some());
}

#[test]
fn test_day_mode_catches_up_after_a_long_gap() {
    let mut engine = Engine::with_seed(test_params(), 7);
    engine.start();
    engine.set_speed(20.0);

    // 10 cycles x 5 days x 50ms per day = 2.5s of simulated pacing.
    // A single oversized elapsed delta must complete every step without
    // skipping any.
    engine.advance(Duration::from_secs(10));

    let snapshot = engine.snapshot();
    assert_eq!(snapshot.status, EngineStatus::Finished);
    assert_eq!(snapshot.cycle_records.len(), 10);
    // Every simulated day was sampled and tallied.
    assert_eq!(snapshot.daily_weather_counts.total(), 50);
}

#[test]
fn test_day_mode_steps_only_on_full_quanta() {
    let mut engine = Engine::with_seed(test_params(), 3);
    engine.start(); // speed 1.0 -> one day per second

    engine.advance(Duration::from_millis(900));
    assert_eq!(engine.snapshot().current_day, 0);

    engine.advance(Duration::from_millis(100));
    assert_eq!(engine.snapshot().current_day, 1);
}

#[test]
fn test_pause_discards_fractional_accumulator() {
    let mut engine = Engine::with_seed(test_params(), 5);
    engine.start();

    engine.advance(Duration::from_millis(900));
    engine.pause();
    engine.resume();

    // The 900ms of partial progress was dropped on pause; another 900ms
    // is not enough for a step, and timing restarts fresh.
    engine.advance(Duration::from_millis(900));
    assert_eq!(engine.snapshot().current_day, 0);
    engine.advance(Duration::from_millis(100));
    assert_eq!(engine.snapshot().current_day, 1);
}

#[test]
fn test_paused_engine_ignores_time() {
    let mut engine = Engine::with_seed(test_params(), 5);
    engine.start();
    engine.pause();
    engine.advance(Duration::from_secs(3600));
    assert_eq!(engine.snapshot().current_day, 0);
    assert_eq!(engine.snapshot().status, EngineStatus::Paused);
}

#[test]
fn test_mid_run_param_change_applies_at_next_boundary() {
    let mut engine = Engine::with_seed(test_params(), 11);
    engine.start();
    engine.set_speed(20.0); // 50ms per day

    // Partway into the first cycle, change the ENSO state.
    engine.advance(Duration::from_millis(100)); // 2 days
    engine.update_params(ParamPatch {
        enso_state: Some(EnsoPhase::LaNina),
        ..ParamPatch::default()
    });

    let snapshot = engine.snapshot();
    assert_eq!(snapshot.params.enso_state, EnsoPhase::Neutral);
    assert_eq!(snapshot.pending_params.enso_state, Some(EnsoPhase::LaNina));

    run_to_finish(&mut engine);
    let snapshot = engine.snapshot();

    // The cycle already in progress finished under the old setting; the
    // very next record reflects the staged change, and the overlay is
    // gone.
    assert_eq!(snapshot.cycle_records[0].enso_state, EnsoPhase::Neutral);
    assert_eq!(snapshot.cycle_records[1].enso_state, EnsoPhase::LaNina);
    assert!(snapshot.pending_params.is_empty());
    assert_eq!(snapshot.params.enso_state, EnsoPhase::LaNina);
}

#[test]
fn test_records_capture_params_in_effect() {
    let mut engine = Engine::with_seed(test_params(), 13);
    engine.start_instant();
    run_to_finish(&mut engine);

    for record in engine.snapshot().cycle_records {
        assert_eq!(record.irrigation_type, test_params().irrigation_type);
        assert_eq!(record.typhoon_probability, 15.0);
        assert!((record.yield_sacks - record.yield_tons * 20.0).abs() < 1e-9);
    }
}

#[test]
fn test_day_and_cycle_modes_are_statistically_equivalent() {
    let params = SimParams {
        cycles_target: 100,
        days_per_cycle: 30,
        ..SimParams::default()
    };

    let mut day_engine = Engine::with_seed(params, 101);
    day_engine.start();
    day_engine.set_speed(20.0);
    run_to_finish(&mut day_engine);

    let mut cycle_engine = Engine::with_seed(params, 202);
    cycle_engine.start_instant();
    run_to_finish(&mut cycle_engine);

    let day = day_engine.snapshot();
    let cycle = cycle_engine.snapshot();
    assert_eq!(day.cycle_records.len(), 100);
    assert_eq!(cycle.cycle_records.len(), 100);

    // Same generative model, different pacing: means land within a few
    // standard errors of each other.
    assert!(
        (day.running_mean - cycle.running_mean).abs() < 0.4,
        "day mean {} vs cycle mean {}",
        day.running_mean,
        cycle.running_mean
    );
    assert!((day.running_sd - cycle.running_sd).abs() < 0.4);
}

#[test]
fn test_subscribers_receive_immediate_and_forced_emissions() {
    let mut engine = Engine::with_seed(test_params(), 17);
    let seen: Arc<Mutex<Vec<EngineStatus>>> = Arc::new(Mutex::new(Vec::new()));

    let sink = Arc::clone(&seen);
    let id = engine.subscribe(move |snapshot| {
        sink.lock().unwrap().push(snapshot.status);
    });

    // Immediate emission on subscribe.
    assert_eq!(seen.lock().unwrap().as_slice(), &[EngineStatus::Idle]);

    // Control operations force unthrottled emissions.
    engine.start();
    engine.pause();
    engine.resume();
    engine.reset();
    assert_eq!(
        seen.lock().unwrap().as_slice(),
        &[
            EngineStatus::Idle,
            EngineStatus::Running,
            EngineStatus::Paused,
            EngineStatus::Running,
            EngineStatus::Idle,
        ]
    );

    engine.unsubscribe(id);
    engine.start();
    assert_eq!(seen.lock().unwrap().len(), 5);
}

#[test]
fn test_emissions_are_throttled_during_fast_sweeps() {
    let mut engine = Engine::with_seed(test_params(), 19);
    let count = Arc::new(Mutex::new(0u32));

    let sink = Arc::clone(&count);
    engine.subscribe(move |_| {
        *sink.lock().unwrap() += 1;
    });

    engine.start();
    engine.set_speed(20.0);
    // 3 control emissions so far (subscribe, start, set_speed).
    let before = *count.lock().unwrap();

    // 500ms of simulated time in 10ms frames: 10 days complete, but at
    // ~20 Hz no more than ~10 throttled emissions can fire, plus the
    // finalization-free steps in between stay silent.
    for _ in 0..50 {
        engine.advance(Duration::from_millis(10));
    }
    let emitted = *count.lock().unwrap() - before;
    assert!(emitted <= 12, "expected throttled emissions, got {emitted}");
    assert!(emitted >= 5, "expected some emissions, got {emitted}");
}

#[test]
fn test_snapshot_is_a_detached_copy() {
    let mut engine = Engine::with_seed(test_params(), 23);
    engine.start_instant();
    engine.advance(Duration::from_millis(300));

    let before = engine.snapshot();
    let completed_then = before.cycle_records.len();
    run_to_finish(&mut engine);

    // Advancing the engine does not reach back into the earlier copy.
    assert_eq!(before.cycle_records.len(), completed_then);
    assert_eq!(engine.snapshot().cycle_records.len(), 10);
    assert!(completed_then < 10);
}

#[test]
fn test_finished_engine_stays_finished_under_further_time() {
    let mut engine = Engine::with_seed(test_params(), 29);
    engine.start_instant();
    run_to_finish(&mut engine);

    let records_before = engine.snapshot().cycle_records.len();
    engine.advance(Duration::from_secs(30));
    let snapshot = engine.snapshot();
    assert_eq!(snapshot.status, EngineStatus::Finished);
    assert_eq!(snapshot.cycle_records.len(), records_before);
}

#[test]
fn test_restart_after_finish_runs_again() {
    let mut engine = Engine::with_seed(test_params(), 31);
    engine.start_instant();
    run_to_finish(&mut engine);

    engine.start();
    let snapshot = engine.snapshot();
    assert_eq!(snapshot.status, EngineStatus::Running);
    assert_eq!(snapshot.cycle_records.len(), 0);
    assert_eq!(snapshot.current_cycle_index, 0);
}
