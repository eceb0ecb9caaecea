//! Composite GNSS interference risk.

pub mod engine;
pub mod scoring;

pub use engine::{assess_risk, assess_risk_with, advisory, level_for, RiskInputs, RiskWeights, TimedValue};
pub use scoring::{index_floor, FactorScore};
