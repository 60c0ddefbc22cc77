//! Weather and severity day tallies
//!
//! Small fixed-key counters used both as per-cycle accumulators and as
//! whole-run aggregates. Serialized with the original label keys.

use serde::Serialize;

use palay_model::{TyphoonSeverity, WeatherKind};

/// Day count per weather kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct WeatherCounts {
    pub dry: u32,
    pub normal: u32,
    pub wet: u32,
    pub typhoon: u32,
}

impl WeatherCounts {
    pub fn bump(&mut self, kind: WeatherKind) {
        match kind {
            WeatherKind::Dry => self.dry += 1,
            WeatherKind::Normal => self.normal += 1,
            WeatherKind::Wet => self.wet += 1,
            WeatherKind::Typhoon => self.typhoon += 1,
        }
    }

    pub fn get(&self, kind: WeatherKind) -> u32 {
        match kind {
            WeatherKind::Dry => self.dry,
            WeatherKind::Normal => self.normal,
            WeatherKind::Wet => self.wet,
            WeatherKind::Typhoon => self.typhoon,
        }
    }

    pub fn add(&mut self, other: &WeatherCounts) {
        self.dry += other.dry;
        self.normal += other.normal;
        self.wet += other.wet;
        self.typhoon += other.typhoon;
    }

    pub fn total(&self) -> u32 {
        self.dry + self.normal + self.wet + self.typhoon
    }

    /// Most frequent kind; ties break toward the earlier entry in
    /// [`WeatherKind::ALL`].
    pub fn dominant(&self) -> WeatherKind {
        let mut best = WeatherKind::ALL[0];
        for kind in WeatherKind::ALL {
            if self.get(kind) > self.get(best) {
                best = kind;
            }
        }
        best
    }
}

/// Day count per typhoon severity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct SeverityCounts {
    pub moderate: u32,
    pub severe: u32,
}

impl SeverityCounts {
    pub fn bump(&mut self, severity: TyphoonSeverity) {
        match severity {
            TyphoonSeverity::Moderate => self.moderate += 1,
            TyphoonSeverity::Severe => self.severe += 1,
        }
    }

    pub fn add(&mut self, other: &SeverityCounts) {
        self.moderate += other.moderate;
        self.severe += other.severe;
    }

    pub fn total(&self) -> u32 {
        self.moderate + self.severe
    }

    /// Dominant severity across the tallied typhoon days; `None` when no
    /// typhoon day occurred. Severe wins ties.
    pub fn dominant(&self) -> Option<TyphoonSeverity> {
        if self.total() == 0 {
            None
        } else if self.severe >= self.moderate {
            Some(TyphoonSeverity::Severe)
        } else {
            Some(TyphoonSeverity::Moderate)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dominant_tie_breaks_toward_earlier_kind() {
        let mut counts = WeatherCounts::default();
        counts.bump(WeatherKind::Wet);
        counts.bump(WeatherKind::Normal);
        assert_eq!(counts.dominant(), WeatherKind::Normal);
    }

    #[test]
    fn test_dominant_of_empty_tally_is_first_kind() {
        assert_eq!(WeatherCounts::default().dominant(), WeatherKind::Dry);
    }

    #[test]
    fn test_severity_ties_favor_severe() {
        let mut counts = SeverityCounts::default();
        counts.bump(TyphoonSeverity::Moderate);
        counts.bump(TyphoonSeverity::Severe);
        assert_eq!(counts.dominant(), Some(TyphoonSeverity::Severe));
    }

    #[test]
    fn test_no_typhoon_days_has_no_dominant_severity() {
        assert_eq!(SeverityCounts::default().dominant(), None);
    }

    #[test]
    fn test_serde_uses_label_keys() {
        let mut counts = WeatherCounts::default();
        counts.bump(WeatherKind::Typhoon);
        let json = serde_json::to_value(counts).unwrap();
        assert_eq!(json["Typhoon"], 1);
        assert_eq!(json["Dry"], 0);
    }
}
