//! Core domain enums
//!
//! Shared vocabulary for the weather and yield models. Serde labels match
//! the wire format consumed by the display layer.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Daily weather classification.
///
/// The enumeration order is load-bearing: cumulative-weight sampling walks
/// [`WeatherKind::ALL`] in this order, and dominant-weather ties break
/// toward the earlier entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WeatherKind {
    Dry,
    Normal,
    Wet,
    Typhoon,
}

impl WeatherKind {
    /// All kinds in canonical sampling order.
    pub const ALL: [WeatherKind; 4] = [
        WeatherKind::Dry,
        WeatherKind::Normal,
        WeatherKind::Wet,
        WeatherKind::Typhoon,
    ];

    /// Index into tables ordered like [`Self::ALL`].
    pub const fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for WeatherKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            WeatherKind::Dry => "Dry",
            WeatherKind::Normal => "Normal",
            WeatherKind::Wet => "Wet",
            WeatherKind::Typhoon => "Typhoon",
        };
        write!(f, "{label}")
    }
}

/// Severity of a typhoon day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TyphoonSeverity {
    Moderate,
    Severe,
}

impl fmt::Display for TyphoonSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            TyphoonSeverity::Moderate => "Moderate",
            TyphoonSeverity::Severe => "Severe",
        };
        write!(f, "{label}")
    }
}

/// Season classification of a calendar month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Season {
    #[serde(rename = "Dry Season")]
    Dry,
    #[serde(rename = "Wet Season")]
    Wet,
    #[serde(rename = "Transition Season")]
    Transition,
}

impl fmt::Display for Season {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Season::Dry => "Dry Season",
            Season::Wet => "Wet Season",
            Season::Transition => "Transition Season",
        };
        write!(f, "{label}")
    }
}

/// Water management regime for a paddy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Irrigation {
    Irrigated,
    Rainfed,
}

impl fmt::Display for Irrigation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Irrigation::Irrigated => "Irrigated",
            Irrigation::Rainfed => "Rainfed",
        };
        write!(f, "{label}")
    }
}

/// El Niño-Southern Oscillation phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EnsoPhase {
    #[serde(rename = "El Niño")]
    ElNino,
    Neutral,
    #[serde(rename = "La Niña")]
    LaNina,
}

impl fmt::Display for EnsoPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            EnsoPhase::ElNino => "El Niño",
            EnsoPhase::Neutral => "Neutral",
            EnsoPhase::LaNina => "La Niña",
        };
        write!(f, "{label}")
    }
}
