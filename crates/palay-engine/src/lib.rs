//! Palay Engine
//!
//! Drives the stochastic rice-yield models through repeated crop cycles:
//! a pausable run-state machine, two fixed-step pacing modes, streaming
//! statistics over completed cycles, and throttled copy-on-read snapshots
//! for subscribers.

pub mod calendar;
pub mod engine;
pub mod params;
pub mod snapshot;
pub mod stats;
pub mod tally;

pub use engine::{Engine, SubscriberId};
pub use params::{ParamError, ParamPatch, SimParams, MAX_CYCLES};
pub use snapshot::{CycleRecord, EngineStatus, RunMode, Snapshot};
pub use stats::{BandPoint, HistogramBin, SeriesPoint, Summary, Welford, YieldStats};
pub use tally::{SeverityCounts, WeatherCounts};
