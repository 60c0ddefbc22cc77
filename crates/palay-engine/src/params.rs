//! Engine parameters and the staged change-set
//!
//! A running simulation never observes a mixed parameter set: non-live
//! fields changed mid-run are staged in a [`ParamPatch`] and merged
//! atomically at the next cycle-finalization boundary.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use palay_model::{EnsoPhase, Irrigation};

/// Hard ceiling on `cycles_target`.
///
/// Downstream display series assume a bounded run length; the bound lives
/// here as an enforced invariant instead of being implied by series caps.
pub const MAX_CYCLES: u32 = 500;

/// Valid range for the typhoon probability control, in percent.
pub const MAX_TYPHOON_PROBABILITY: f64 = 40.0;

/// Parameter validation errors.
pub type ParamResult = Result<(), ParamError>;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParamError {
    #[error("planting month {0} out of range 1-12")]
    PlantingMonth(u32),

    #[error("typhoon probability {0} out of range 0-{MAX_TYPHOON_PROBABILITY}")]
    TyphoonProbability(f64),

    #[error("cycles target {0} out of range 1-{MAX_CYCLES}")]
    CyclesTarget(u32),

    #[error("days per cycle must be positive, got {0}")]
    DaysPerCycle(u32),
}

/// Complete parameter set for a simulation run.
///
/// Always fully specified and in range once applied; the engine never
/// holds a partial set.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimParams {
    /// Calendar month (1-12) the first cycle is planted in.
    pub planting_month: u32,
    pub irrigation_type: Irrigation,
    pub enso_state: EnsoPhase,
    /// Percent chance feeding the wet-season typhoon weight, 0-40.
    pub typhoon_probability: f64,
    pub cycles_target: u32,
    pub days_per_cycle: u32,
}

impl Default for SimParams {
    fn default() -> Self {
        Self {
            planting_month: 6,
            irrigation_type: Irrigation::Irrigated,
            enso_state: EnsoPhase::Neutral,
            typhoon_probability: 15.0,
            cycles_target: 100,
            days_per_cycle: 120,
        }
    }
}

impl SimParams {
    pub fn validate(&self) -> ParamResult {
        if !(1..=12).contains(&self.planting_month) {
            return Err(ParamError::PlantingMonth(self.planting_month));
        }
        if !(0.0..=MAX_TYPHOON_PROBABILITY).contains(&self.typhoon_probability) {
            return Err(ParamError::TyphoonProbability(self.typhoon_probability));
        }
        if !(1..=MAX_CYCLES).contains(&self.cycles_target) {
            return Err(ParamError::CyclesTarget(self.cycles_target));
        }
        if self.days_per_cycle == 0 {
            return Err(ParamError::DaysPerCycle(self.days_per_cycle));
        }
        Ok(())
    }

    /// Typhoon probability as a fraction for the weather model.
    pub fn typhoon_fraction(&self) -> f64 {
        self.typhoon_probability / 100.0
    }
}

/// Partial overlay of [`SimParams`].
///
/// Non-empty only while a run is active and a non-live field has changed.
/// Cleared atomically exactly at a cycle-finalization boundary, never
/// partially applied.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ParamPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub planting_month: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub irrigation_type: Option<Irrigation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enso_state: Option<EnsoPhase>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub typhoon_probability: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cycles_target: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub days_per_cycle: Option<u32>,
}

impl ParamPatch {
    pub fn is_empty(&self) -> bool {
        *self == ParamPatch::default()
    }

    /// Merge `other` over `self`; later fields win.
    pub fn merge(&mut self, other: ParamPatch) {
        if other.planting_month.is_some() {
            self.planting_month = other.planting_month;
        }
        if other.irrigation_type.is_some() {
            self.irrigation_type = other.irrigation_type;
        }
        if other.enso_state.is_some() {
            self.enso_state = other.enso_state;
        }
        if other.typhoon_probability.is_some() {
            self.typhoon_probability = other.typhoon_probability;
        }
        if other.cycles_target.is_some() {
            self.cycles_target = other.cycles_target;
        }
        if other.days_per_cycle.is_some() {
            self.days_per_cycle = other.days_per_cycle;
        }
    }

    /// Apply every present field to `params`.
    ///
    /// Out-of-range months and cycle targets are clamped silently rather
    /// than rejected; callers wanting errors use [`ParamPatch::validate`]
    /// first.
    pub fn apply_to(&self, params: &mut SimParams) {
        if let Some(month) = self.planting_month {
            params.planting_month = month.clamp(1, 12);
        }
        if let Some(irrigation) = self.irrigation_type {
            params.irrigation_type = irrigation;
        }
        if let Some(enso) = self.enso_state {
            params.enso_state = enso;
        }
        if let Some(probability) = self.typhoon_probability {
            params.typhoon_probability = probability.clamp(0.0, MAX_TYPHOON_PROBABILITY);
        }
        if let Some(cycles) = self.cycles_target {
            params.cycles_target = cycles.clamp(1, MAX_CYCLES);
        }
        if let Some(days) = self.days_per_cycle {
            params.days_per_cycle = days;
        }
    }

    pub fn validate(&self) -> ParamResult {
        if let Some(month) = self.planting_month {
            if !(1..=12).contains(&month) {
                return Err(ParamError::PlantingMonth(month));
            }
        }
        if let Some(probability) = self.typhoon_probability {
            if !(0.0..=MAX_TYPHOON_PROBABILITY).contains(&probability) {
                return Err(ParamError::TyphoonProbability(probability));
            }
        }
        if let Some(cycles) = self.cycles_target {
            if !(1..=MAX_CYCLES).contains(&cycles) {
                return Err(ParamError::CyclesTarget(cycles));
            }
        }
        if let Some(days) = self.days_per_cycle {
            if days == 0 {
                return Err(ParamError::DaysPerCycle(days));
            }
        }
        Ok(())
    }
}
