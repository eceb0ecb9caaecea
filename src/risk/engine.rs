use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{IngestError, IngestResult};
use crate::models::{RiskAssessment, RiskFactor, RiskLevel};
use crate::resolution::bucket::round2;

use super::scoring::{index_floor, score_field_bz, score_index, score_radio_scale, score_speed, FactorScore};

const WEIGHT_TOLERANCE: f64 = 1e-6;

/// A reading and when it was observed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimedValue {
    pub value: f64,
    pub observed_at: DateTime<Utc>,
}

impl TimedValue {
    pub fn new(value: f64, observed_at: DateTime<Utc>) -> Self {
        Self { value, observed_at }
    }
}

/// Latest committed readings. A missing input scores 0.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RiskInputs {
    pub index: Option<TimedValue>,
    pub field_bz: Option<TimedValue>,
    pub speed: Option<TimedValue>,
    pub radio_scale: Option<TimedValue>,
}

impl RiskInputs {
    fn latest_observation(&self) -> Option<DateTime<Utc>> {
        [self.index, self.field_bz, self.speed, self.radio_scale]
            .iter()
            .flatten()
            .map(|t| t.observed_at)
            .max()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskWeights {
    pub index: f64,
    pub field_bz: f64,
    pub speed: f64,
    pub radio_scale: f64,
}

impl Default for RiskWeights {
    fn default() -> Self {
        Self {
            index: 0.40,
            field_bz: 0.25,
            speed: 0.20,
            radio_scale: 0.15,
        }
    }
}

impl RiskWeights {
    /// Weights must be non-negative and sum to 1.0.
    pub fn new(index: f64, field_bz: f64, speed: f64, radio_scale: f64) -> IngestResult<Self> {
        let weights = Self {
            index,
            field_bz,
            speed,
            radio_scale,
        };
        let all = [index, field_bz, speed, radio_scale];
        if all.iter().any(|w| !w.is_finite() || *w < 0.0) {
            return Err(IngestError::Config(format!("risk weights must be non-negative: {:?}", all)));
        }
        let sum: f64 = all.iter().sum();
        if (sum - 1.0).abs() > WEIGHT_TOLERANCE {
            return Err(IngestError::Config(format!("risk weights sum to {:.4}, expected 1.0", sum)));
        }
        Ok(weights)
    }
}

pub fn level_for(score: u8) -> RiskLevel {
    match score {
        80..=u8::MAX => RiskLevel::Extreme,
        60..=79 => RiskLevel::Severe,
        40..=59 => RiskLevel::High,
        20..=39 => RiskLevel::Moderate,
        _ => RiskLevel::Low,
    }
}

pub fn advisory(level: RiskLevel) -> &'static str {
    match level {
        RiskLevel::Extreme => "GNSS operations strongly discouraged. Expect significant positioning errors and potential loss of lock on multiple satellites. Postpone all precision survey and drone operations. Static GNSS users should expect degraded solutions.",
        RiskLevel::Severe => "GNSS accuracy severely degraded. Increased multipath-like errors and cycle slips expected. Avoid RTK operations. PPP convergence times significantly extended. Consider postponing precision work.",
        RiskLevel::High => "GNSS performance degraded. RTK fix rates will decrease, especially at higher latitudes. Allow extra convergence time for PPP. Monitor solution quality continuously. Consider shorter observation sessions.",
        RiskLevel::Moderate => "Minor GNSS degradation possible. RTK users may experience occasional fix drops. PPP solutions may need extended convergence. Standard survey operations can proceed with monitoring.",
        RiskLevel::Low => "Nominal GNSS conditions. Normal precision operations may proceed. Standard monitoring recommended.",
    }
}

pub fn assess_risk(inputs: &RiskInputs, now: DateTime<Utc>) -> RiskAssessment {
    assess_risk_with(inputs, &RiskWeights::default(), now)
}

/// Weighted composite of the four factors, lifted to the index floor.
pub fn assess_risk_with(inputs: &RiskInputs, weights: &RiskWeights, now: DateTime<Utc>) -> RiskAssessment {
    let index = inputs.index.map(|t| t.value);
    let field_bz = inputs.field_bz.map(|t| t.value);
    let speed = inputs.speed.map(|t| t.value);
    let radio_scale = inputs.radio_scale.map(|t| t.value);

    let factors = vec![
        factor("Kp Index", index, weights.index, score_index(index)),
        factor("Bz Component", field_bz, weights.field_bz, score_field_bz(field_bz)),
        factor("Solar Wind Speed", speed, weights.speed, score_speed(speed)),
        factor("R-Scale", radio_scale, weights.radio_scale, score_radio_scale(radio_scale)),
    ];

    let weighted: f64 = factors.iter().map(|f| f.score as f64 * f.weight).sum();
    let composite = weighted.round().clamp(0.0, 100.0) as u8;
    let score = composite.max(index_floor(index));
    let level = level_for(score);

    RiskAssessment {
        score,
        level,
        factors,
        advisory: advisory(level).to_string(),
        updated_at: inputs.latest_observation().unwrap_or(now),
    }
}

fn factor(name: &str, raw_value: Option<f64>, weight: f64, scored: FactorScore) -> RiskFactor {
    RiskFactor {
        name: name.to_string(),
        raw_value,
        weight,
        score: scored.score,
        contribution: round2(scored.score as f64 * weight),
        detail: scored.detail,
    }
}
