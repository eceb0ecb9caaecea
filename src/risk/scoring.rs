//! Step-function scores for each risk factor, 0-100 before weighting.

/// An unweighted factor score and the sentence that explains it.
#[derive(Debug, Clone, PartialEq)]
pub struct FactorScore {
    pub score: u8,
    pub detail: String,
}

impl FactorScore {
    fn new(score: u8, detail: String) -> Self {
        Self { score, detail }
    }

    pub fn missing() -> Self {
        Self::new(0, "no data".to_string())
    }
}

pub fn score_index(value: Option<f64>) -> FactorScore {
    let Some(kp) = value else {
        return FactorScore::missing();
    };
    let (score, text) = if kp >= 9.0 {
        (100, "Extreme geomagnetic storm")
    } else if kp >= 8.0 {
        (95, "Extreme geomagnetic activity")
    } else if kp >= 7.0 {
        (85, "Severe geomagnetic storm")
    } else if kp >= 6.0 {
        (75, "Strong storm conditions")
    } else if kp >= 5.0 {
        (65, "Geomagnetic storm")
    } else if kp >= 4.0 {
        (40, "Active conditions")
    } else if kp >= 3.0 {
        (20, "Slightly unsettled")
    } else {
        (5, "Quiet conditions")
    };
    FactorScore::new(score, format!("Kp {:.1}: {}", kp, text))
}

/// Southward (negative) Bz couples the solar wind into the magnetosphere.
pub fn score_field_bz(value: Option<f64>) -> FactorScore {
    let Some(bz) = value else {
        return FactorScore::missing();
    };
    let (score, text) = if bz <= -20.0 {
        (100, "Extreme southward IMF")
    } else if bz <= -10.0 {
        (80, "Strongly southward IMF")
    } else if bz <= -5.0 {
        (55, "Moderately southward")
    } else if bz < 0.0 {
        (30, "Slightly southward")
    } else {
        (5, "Northward (favorable)")
    };
    FactorScore::new(score, format!("Bz {:.1} nT: {}", bz, text))
}

pub fn score_speed(value: Option<f64>) -> FactorScore {
    let Some(speed) = value else {
        return FactorScore::missing();
    };
    let (score, text) = if speed > 800.0 {
        (100, "Extreme solar wind")
    } else if speed > 600.0 {
        (70, "High-speed stream")
    } else if speed > 500.0 {
        (45, "Elevated speed")
    } else if speed > 400.0 {
        (25, "Slightly elevated")
    } else {
        (5, "Nominal conditions")
    };
    FactorScore::new(score, format!("{:.0} km/s: {}", speed, text))
}

pub fn score_radio_scale(value: Option<f64>) -> FactorScore {
    let Some(level) = value else {
        return FactorScore::missing();
    };
    let (score, text) = if level >= 5.0 {
        (100, "Extreme radio blackout")
    } else if level >= 4.0 {
        (80, "Severe radio blackout")
    } else if level >= 3.0 {
        (60, "Strong radio blackout")
    } else if level >= 2.0 {
        (35, "Moderate radio blackout")
    } else if level >= 1.0 {
        (15, "Minor radio blackout")
    } else {
        (0, "No radio blackout")
    };
    FactorScore::new(score, format!("R{:.0}: {}", level.max(0.0).floor(), text))
}

/// Minimum composite score implied by the index alone.
pub fn index_floor(value: Option<f64>) -> u8 {
    match value {
        Some(kp) if kp >= 8.0 => 80,
        Some(kp) if kp >= 7.0 => 60,
        Some(kp) if kp >= 6.0 => 50,
        Some(kp) if kp >= 5.0 => 40,
        Some(kp) if kp >= 4.0 => 25,
        _ => 0,
    }
}
