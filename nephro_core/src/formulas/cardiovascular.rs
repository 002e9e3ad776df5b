//! # Cardiovascular Risk
//!
//! 10-year atherosclerotic cardiovascular disease risk from the Pooled
//! Cohort Equations (Goff DC et al., Circulation 2014;129:S49-73).
//!
//! ```text
//! Σ    = Σ coefficient × term
//! risk = 1 - S10 ^ e^(Σ - mean)
//! ```
//!
//! Four coefficient sets exist (white / African American × female / male).
//! Patients of other races use the white equations.

use serde::{Deserialize, Serialize};

use super::{ln_positive, Sex};

/// Race grouping used to select a coefficient set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PceRace {
    White,
    AfricanAmerican,
    Other,
}

impl PceRace {
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "white" => Some(PceRace::White),
            "african_american" => Some(PceRace::AfricanAmerican),
            "other" => Some(PceRace::Other),
            _ => None,
        }
    }
}

/// One race × sex coefficient set.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PceCoefficients {
    pub ln_age: f64,
    pub ln_age_sq: f64,
    pub ln_tc: f64,
    pub ln_age_ln_tc: f64,
    pub ln_hdl: f64,
    pub ln_age_ln_hdl: f64,
    pub ln_treated_sbp: f64,
    pub ln_age_ln_treated_sbp: f64,
    pub ln_untreated_sbp: f64,
    pub ln_age_ln_untreated_sbp: f64,
    pub smoker: f64,
    pub ln_age_smoker: f64,
    pub diabetes: f64,
    /// Population mean of Σ
    pub mean: f64,
    /// 10-year baseline survival
    pub baseline_survival: f64,
}

pub const WHITE_FEMALE: PceCoefficients = PceCoefficients {
    ln_age: -29.799,
    ln_age_sq: 4.884,
    ln_tc: 13.540,
    ln_age_ln_tc: -3.114,
    ln_hdl: -13.578,
    ln_age_ln_hdl: 3.149,
    ln_treated_sbp: 2.019,
    ln_age_ln_treated_sbp: 0.0,
    ln_untreated_sbp: 1.957,
    ln_age_ln_untreated_sbp: 0.0,
    smoker: 7.574,
    ln_age_smoker: -1.665,
    diabetes: 0.661,
    mean: -29.18,
    baseline_survival: 0.9665,
};

pub const AFRICAN_AMERICAN_FEMALE: PceCoefficients = PceCoefficients {
    ln_age: 17.114,
    ln_age_sq: 0.0,
    ln_tc: 0.940,
    ln_age_ln_tc: 0.0,
    ln_hdl: -18.920,
    ln_age_ln_hdl: 4.475,
    ln_treated_sbp: 29.291,
    ln_age_ln_treated_sbp: -6.432,
    ln_untreated_sbp: 27.820,
    ln_age_ln_untreated_sbp: -6.087,
    smoker: 0.691,
    ln_age_smoker: 0.0,
    diabetes: 0.874,
    mean: 86.61,
    baseline_survival: 0.9533,
};

pub const WHITE_MALE: PceCoefficients = PceCoefficients {
    ln_age: 12.344,
    ln_age_sq: 0.0,
    ln_tc: 11.853,
    ln_age_ln_tc: -2.664,
    ln_hdl: -7.990,
    ln_age_ln_hdl: 1.769,
    ln_treated_sbp: 1.797,
    ln_age_ln_treated_sbp: 0.0,
    ln_untreated_sbp: 1.764,
    ln_age_ln_untreated_sbp: 0.0,
    smoker: 7.837,
    ln_age_smoker: -1.795,
    diabetes: 0.658,
    mean: 61.18,
    baseline_survival: 0.9144,
};

pub const AFRICAN_AMERICAN_MALE: PceCoefficients = PceCoefficients {
    ln_age: 2.469,
    ln_age_sq: 0.0,
    ln_tc: 0.302,
    ln_age_ln_tc: 0.0,
    ln_hdl: -0.307,
    ln_age_ln_hdl: 0.0,
    ln_treated_sbp: 1.916,
    ln_age_ln_treated_sbp: 0.0,
    ln_untreated_sbp: 1.809,
    ln_age_ln_untreated_sbp: 0.0,
    smoker: 0.549,
    ln_age_smoker: 0.0,
    diabetes: 0.645,
    mean: 19.54,
    baseline_survival: 0.8954,
};

impl PceCoefficients {
    pub fn for_patient(sex: Sex, race: PceRace) -> &'static PceCoefficients {
        match (sex, race) {
            (Sex::Female, PceRace::AfricanAmerican) => &AFRICAN_AMERICAN_FEMALE,
            (Sex::Female, _) => &WHITE_FEMALE,
            (Sex::Male, PceRace::AfricanAmerican) => &AFRICAN_AMERICAN_MALE,
            (Sex::Male, _) => &WHITE_MALE,
        }
    }
}

/// Pooled Cohort Equations inputs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PcePatient {
    pub age: f64,
    pub sex: Sex,
    pub race: PceRace,
    /// Total cholesterol (mg/dL)
    pub total_cholesterol: f64,
    /// HDL cholesterol (mg/dL)
    pub hdl: f64,
    pub systolic_bp: f64,
    pub treated_hypertension: bool,
    pub smoker: bool,
    pub diabetes: bool,
}

/// 10-year ASCVD risk (%).
///
/// `None` when any logged quantity is not positive.
pub fn ascvd_pce(patient: &PcePatient) -> Option<f64> {
    let c = PceCoefficients::for_patient(patient.sex, patient.race);
    let ln_age = ln_positive(patient.age)?;
    let ln_tc = ln_positive(patient.total_cholesterol)?;
    let ln_hdl = ln_positive(patient.hdl)?;
    let ln_sbp = ln_positive(patient.systolic_bp)?;
    let smoker = if patient.smoker { 1.0 } else { 0.0 };
    let diabetes = if patient.diabetes { 1.0 } else { 0.0 };

    let sbp_terms = if patient.treated_hypertension {
        c.ln_treated_sbp * ln_sbp + c.ln_age_ln_treated_sbp * ln_age * ln_sbp
    } else {
        c.ln_untreated_sbp * ln_sbp + c.ln_age_ln_untreated_sbp * ln_age * ln_sbp
    };

    let sum = c.ln_age * ln_age
        + c.ln_age_sq * ln_age * ln_age
        + c.ln_tc * ln_tc
        + c.ln_age_ln_tc * ln_age * ln_tc
        + c.ln_hdl * ln_hdl
        + c.ln_age_ln_hdl * ln_age * ln_hdl
        + sbp_terms
        + c.smoker * smoker
        + c.ln_age_smoker * ln_age * smoker
        + c.diabetes * diabetes;

    let risk = 1.0 - c.baseline_survival.powf((sum - c.mean).exp());
    Some(risk * 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn goff_example(sex: Sex, race: PceRace) -> PcePatient {
        // Worked example from the 2013 guideline appendix
        PcePatient {
            age: 55.0,
            sex,
            race,
            total_cholesterol: 213.0,
            hdl: 50.0,
            systolic_bp: 120.0,
            treated_hypertension: false,
            smoker: false,
            diabetes: false,
        }
    }

    #[test]
    fn test_guideline_examples() {
        let cases = [
            (Sex::Female, PceRace::White, 2.1),
            (Sex::Female, PceRace::AfricanAmerican, 3.0),
            (Sex::Male, PceRace::White, 5.3),
            (Sex::Male, PceRace::AfricanAmerican, 6.1),
        ];
        for (sex, race, expected) in cases {
            let risk = ascvd_pce(&goff_example(sex, race)).unwrap();
            assert!((risk - expected).abs() < 0.1, "{:?} {:?}: {}", sex, race, risk);
        }
    }

    #[test]
    fn test_other_race_uses_white_equations() {
        let white = ascvd_pce(&goff_example(Sex::Male, PceRace::White)).unwrap();
        let other = ascvd_pce(&goff_example(Sex::Male, PceRace::Other)).unwrap();
        assert_eq!(white, other);
    }

    #[test]
    fn test_high_risk_male() {
        let patient = PcePatient {
            age: 60.0,
            total_cholesterol: 200.0,
            hdl: 45.0,
            systolic_bp: 140.0,
            treated_hypertension: true,
            smoker: true,
            diabetes: true,
            ..goff_example(Sex::Male, PceRace::White)
        };
        let risk = ascvd_pce(&patient).unwrap();
        assert!((risk - 34.48).abs() < 0.05, "got {}", risk);
    }

    #[test]
    fn test_non_positive_inputs() {
        let patient = PcePatient {
            hdl: 0.0,
            ..goff_example(Sex::Female, PceRace::White)
        };
        assert_eq!(ascvd_pce(&patient), None);
    }
}
