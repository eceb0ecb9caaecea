//! Unit tests for the GNSS risk engine

use chrono::{DateTime, Duration, TimeZone, Utc};
use kpwatch::models::RiskLevel;
use kpwatch::risk::{assess_risk, assess_risk_with, index_floor, level_for, RiskInputs, RiskWeights, TimedValue};

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 10, 12, 0, 0).unwrap()
}

fn inputs(index: f64, bz: f64, speed: f64, radio: f64) -> RiskInputs {
    RiskInputs {
        index: Some(TimedValue::new(index, now() - Duration::minutes(10))),
        field_bz: Some(TimedValue::new(bz, now() - Duration::minutes(5))),
        speed: Some(TimedValue::new(speed, now() - Duration::minutes(5))),
        radio_scale: Some(TimedValue::new(radio, now() - Duration::hours(1))),
    }
}

#[test]
fn composite_matches_weighted_tables() {
    let assessment = assess_risk(&inputs(6.2, -12.0, 650.0, 2.0), now());

    // 75*0.40 + 80*0.25 + 70*0.20 + 35*0.15 = 69.25
    assert_eq!(assessment.score, 69);
    assert_eq!(assessment.level, RiskLevel::Severe);

    let contributions: Vec<f64> = assessment.factors.iter().map(|f| f.contribution).collect();
    assert_eq!(contributions, vec![30.0, 20.0, 14.0, 5.25]);
    let scores: Vec<u8> = assessment.factors.iter().map(|f| f.score).collect();
    assert_eq!(scores, vec![75, 80, 70, 35]);
}

#[test]
fn index_floor_dominates_calm_secondary_factors() {
    let assessment = assess_risk(&inputs(8.0, 5.0, 300.0, 0.0), now());

    assert_eq!(assessment.score, 80);
    assert_eq!(assessment.level, RiskLevel::Extreme);
}

#[test]
fn floor_table() {
    assert_eq!(index_floor(None), 0);
    assert_eq!(index_floor(Some(3.9)), 0);
    assert_eq!(index_floor(Some(4.0)), 25);
    assert_eq!(index_floor(Some(5.5)), 40);
    assert_eq!(index_floor(Some(6.0)), 50);
    assert_eq!(index_floor(Some(7.3)), 60);
    assert_eq!(index_floor(Some(9.0)), 80);
}

#[test]
fn level_bands() {
    assert_eq!(level_for(0), RiskLevel::Low);
    assert_eq!(level_for(19), RiskLevel::Low);
    assert_eq!(level_for(20), RiskLevel::Moderate);
    assert_eq!(level_for(40), RiskLevel::High);
    assert_eq!(level_for(60), RiskLevel::Severe);
    assert_eq!(level_for(79), RiskLevel::Severe);
    assert_eq!(level_for(80), RiskLevel::Extreme);
    assert_eq!(level_for(100), RiskLevel::Extreme);
}

#[test]
fn maximum_inputs_score_one_hundred() {
    let assessment = assess_risk(&inputs(9.0, -25.0, 900.0, 5.0), now());
    assert_eq!(assessment.score, 100);
    assert_eq!(assessment.level, RiskLevel::Extreme);
}

#[test]
fn assessment_is_deterministic() {
    let a = assess_risk(&inputs(4.7, -3.0, 480.0, 1.0), now());
    let b = assess_risk(&inputs(4.7, -3.0, 480.0, 1.0), now());
    assert_eq!(a, b);
}

#[test]
fn missing_inputs_score_zero_and_time_falls_back_to_now() {
    let assessment = assess_risk(&RiskInputs::default(), now());

    assert_eq!(assessment.score, 0);
    assert_eq!(assessment.level, RiskLevel::Low);
    assert_eq!(assessment.updated_at, now());
    assert!(assessment.factors.iter().all(|f| f.score == 0 && f.detail == "no data"));
}

#[test]
fn updated_at_is_most_recent_input() {
    let assessment = assess_risk(&inputs(2.0, 1.0, 350.0, 0.0), now());
    assert_eq!(assessment.updated_at, now() - Duration::minutes(5));
}

#[test]
fn factor_details_explain_scores() {
    let assessment = assess_risk(&inputs(6.2, -12.0, 650.0, 2.0), now());
    let details: Vec<&str> = assessment.factors.iter().map(|f| f.detail.as_str()).collect();

    assert_eq!(details[0], "Kp 6.2: Strong storm conditions");
    assert_eq!(details[1], "Bz -12.0 nT: Strongly southward IMF");
    assert_eq!(details[2], "650 km/s: High-speed stream");
    assert_eq!(details[3], "R2: Moderate radio blackout");
}

#[test]
fn weights_must_sum_to_one() {
    assert!(RiskWeights::new(0.25, 0.25, 0.25, 0.25).is_ok());
    assert!(RiskWeights::new(0.5, 0.5, 0.5, 0.0).is_err());
    assert!(RiskWeights::new(1.2, -0.2, 0.0, 0.0).is_err());
}

#[test]
fn custom_weights_change_composite() {
    let weights = RiskWeights::new(1.0, 0.0, 0.0, 0.0).unwrap();
    let assessment = assess_risk_with(&inputs(3.0, -25.0, 900.0, 5.0), &weights, now());
    assert_eq!(assessment.score, 20);
    assert_eq!(assessment.level, RiskLevel::Moderate);
}
