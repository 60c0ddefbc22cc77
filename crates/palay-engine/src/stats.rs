//! Streaming statistics over completed-cycle yields
//!
//! Per-cycle ingestion is O(1): Welford channels, min/max, a low-yield
//! counter, a fixed histogram, and capped FIFO trend series. The full
//! yield list is retained separately so percentiles can be computed on
//! demand; the O(n log n) summary is recomputed once per completed cycle,
//! which stays cheap because runs are bounded by the cycle ceiling.

use std::collections::VecDeque;

use serde::Serialize;

use palay_model::YieldSample;

/// Yields below this threshold count as low-yield cycles.
pub const LOW_YIELD_THRESHOLD: f64 = 2.0;

/// Caps for the display-facing trend series.
const MEAN_TREND_CAP: usize = 400;
const SERIES_CAP: usize = 400;
const RECENT_CAP: usize = 60;

/// Fixed histogram: 11 bins covering [0, 5.5) in 0.5-wide steps; the last
/// bin also absorbs anything at or above 5.5.
const HISTOGRAM_BINS: usize = 11;
const HISTOGRAM_STEP: f64 = 0.5;

/// z-score for the 95% confidence interval (normal approximation).
const CI_Z: f64 = 1.96;

/// Welford online mean/variance accumulator.
///
/// Numerically stable single-pass computation; no sample history is
/// retained.
#[derive(Debug, Clone, Copy, Default)]
pub struct Welford {
    n: u64,
    mean: f64,
    m2: f64,
}

impl Welford {
    pub fn push(&mut self, x: f64) {
        self.n += 1;
        let delta = x - self.mean;
        self.mean += delta / self.n as f64;
        self.m2 += delta * (x - self.mean);
    }

    pub fn count(&self) -> u64 {
        self.n
    }

    pub fn mean(&self) -> f64 {
        self.mean
    }

    /// Population variance; zero below two samples.
    pub fn variance(&self) -> f64 {
        if self.n < 2 {
            0.0
        } else {
            self.m2 / self.n as f64
        }
    }

    pub fn sd(&self) -> f64 {
        self.variance().sqrt()
    }
}

/// Running min/max over observed yields.
#[derive(Debug, Clone, Copy)]
struct MinMax {
    min: f64,
    max: f64,
}

impl Default for MinMax {
    fn default() -> Self {
        Self {
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
        }
    }
}

impl MinMax {
    fn observe(&mut self, x: f64) {
        self.min = self.min.min(x);
        self.max = self.max.max(x);
    }

    /// Observed minimum, or zero before any sample.
    fn min_or_zero(&self) -> f64 {
        if self.min.is_finite() {
            self.min
        } else {
            0.0
        }
    }

    fn max_or_zero(&self) -> f64 {
        if self.max.is_finite() {
            self.max
        } else {
            0.0
        }
    }
}

/// FIFO series with a fixed cap; the oldest entry drops first.
#[derive(Debug, Clone)]
struct BoundedSeries<T> {
    cap: usize,
    items: VecDeque<T>,
}

impl<T: Clone> BoundedSeries<T> {
    fn new(cap: usize) -> Self {
        Self {
            cap,
            items: VecDeque::with_capacity(cap),
        }
    }

    fn push(&mut self, item: T) {
        if self.items.len() == self.cap {
            self.items.pop_front();
        }
        self.items.push_back(item);
    }

    fn to_vec(&self) -> Vec<T> {
        self.items.iter().cloned().collect()
    }
}

/// One histogram bin: label plus a monotonically increasing count.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistogramBin {
    pub label: String,
    pub count: u32,
}

/// One raw-yield point of the per-cycle series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesPoint {
    pub cycle: u32,
    #[serde(rename = "yield")]
    pub value: f64,
}

/// One (mean, p5, p95) point of the confidence-band series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BandPoint {
    pub cycle: u32,
    pub mean: f64,
    pub p5: f64,
    pub p95: f64,
}

/// On-demand distribution summary.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub mean: f64,
    pub std: f64,
    pub min: f64,
    pub max: f64,
    pub percentile5: f64,
    pub percentile95: f64,
    pub ci_low: f64,
    pub ci_high: f64,
    pub ci_width: f64,
    pub deterministic_sd: f64,
    pub noise_sd: f64,
}

/// Accumulator fed one [`YieldSample`] per completed cycle.
#[derive(Debug, Clone)]
pub struct YieldStats {
    yields: Welford,
    deterministic: Welford,
    noise: Welford,
    range: MinMax,
    low_yield_count: u64,
    histogram: [u32; HISTOGRAM_BINS],
    /// Full per-cycle yield list, kept for percentile computation.
    all_yields: Vec<f64>,
    mean_trend: BoundedSeries<f64>,
    series: BoundedSeries<SeriesPoint>,
    band_series: BoundedSeries<BandPoint>,
    recent: BoundedSeries<f64>,
}

impl Default for YieldStats {
    fn default() -> Self {
        Self {
            yields: Welford::default(),
            deterministic: Welford::default(),
            noise: Welford::default(),
            range: MinMax::default(),
            low_yield_count: 0,
            histogram: [0; HISTOGRAM_BINS],
            all_yields: Vec::new(),
            mean_trend: BoundedSeries::new(MEAN_TREND_CAP),
            series: BoundedSeries::new(SERIES_CAP),
            band_series: BoundedSeries::new(SERIES_CAP),
            recent: BoundedSeries::new(RECENT_CAP),
        }
    }
}

impl YieldStats {
    /// Ingest one completed cycle. O(1) amortized.
    pub fn record(&mut self, cycle: u32, sample: &YieldSample) {
        self.yields.push(sample.value);
        self.deterministic.push(sample.deterministic);
        self.noise.push(sample.noise);
        self.range.observe(sample.value);

        if sample.value < LOW_YIELD_THRESHOLD {
            self.low_yield_count += 1;
        }

        let bin = ((sample.value / HISTOGRAM_STEP) as usize).min(HISTOGRAM_BINS - 1);
        self.histogram[bin] += 1;

        self.all_yields.push(sample.value);
        self.mean_trend.push(self.yields.mean());
        self.series.push(SeriesPoint {
            cycle,
            value: sample.value,
        });
        self.recent.push(sample.value);
    }

    /// Append a band point derived from a freshly computed summary.
    pub fn push_band(&mut self, cycle: u32, summary: &Summary) {
        self.band_series.push(BandPoint {
            cycle,
            mean: summary.mean,
            p5: summary.percentile5,
            p95: summary.percentile95,
        });
    }

    pub fn count(&self) -> u64 {
        self.yields.count()
    }

    pub fn mean(&self) -> f64 {
        self.yields.mean()
    }

    pub fn sd(&self) -> f64 {
        self.yields.sd()
    }

    /// Empirical fraction of completed cycles below the low-yield
    /// threshold; zero before any cycle completes.
    pub fn low_yield_probability(&self) -> f64 {
        if self.yields.count() == 0 {
            0.0
        } else {
            self.low_yield_count as f64 / self.yields.count() as f64
        }
    }

    /// Histogram with display labels. Bin counts always sum to the total
    /// number of completed cycles.
    pub fn histogram_bins(&self) -> Vec<HistogramBin> {
        self.histogram
            .iter()
            .enumerate()
            .map(|(i, count)| HistogramBin {
                label: format!("{:.1}", i as f64 * HISTOGRAM_STEP),
                count: *count,
            })
            .collect()
    }

    pub fn mean_trend(&self) -> Vec<f64> {
        self.mean_trend.to_vec()
    }

    pub fn yield_series(&self) -> Vec<SeriesPoint> {
        self.series.to_vec()
    }

    pub fn band_series(&self) -> Vec<BandPoint> {
        self.band_series.to_vec()
    }

    pub fn recent_yields(&self) -> Vec<f64> {
        self.recent.to_vec()
    }

    /// Full distribution summary: nearest-rank percentiles over a sorted
    /// copy of the yield list plus a normal-approximation 95% CI.
    /// `None` when zero cycles have completed.
    pub fn summary(&self) -> Option<Summary> {
        if self.all_yields.is_empty() {
            return None;
        }

        let mut sorted = self.all_yields.clone();
        sorted.sort_by(|a, b| a.total_cmp(b));
        let n = sorted.len();

        let mean = self.yields.mean();
        let sd = self.yields.sd();
        let se = sd / (n as f64).sqrt();
        let ci_low = mean - CI_Z * se;
        let ci_high = mean + CI_Z * se;

        Some(Summary {
            mean,
            std: sd,
            min: self.range.min_or_zero(),
            max: self.range.max_or_zero(),
            percentile5: sorted[(n as f64 * 0.05) as usize],
            percentile95: sorted[(n as f64 * 0.95) as usize],
            ci_low,
            ci_high,
            ci_width: ci_high - ci_low,
            deterministic_sd: self.deterministic.sd(),
            noise_sd: self.noise.sd(),
        })
    }
}
