//! Cardiovascular risk.

use super::common::{mmhg, scalar, sex};
use super::{Calculator, CalculatorCategory, CalculatorInput, LiteratureReference, SelectOption};
use crate::errors::{CalcError, CalcResult};
use crate::formulas::cardiovascular::{self, PcePatient, PceRace};
use crate::inputs::NormalizedInputs;
use crate::interpretation::BandTable;
use crate::outputs::Output;
use crate::units::CHOLESTEROL;

const ASCVD_BANDS: BandTable = BandTable::descending(
    &[
        (20.0, "High risk"),
        (7.5, "Intermediate risk"),
        (5.0, "Borderline risk"),
    ],
    "Low risk",
);

const RACE_OPTIONS: &[SelectOption] = &[
    SelectOption::new("white", "White"),
    SelectOption::new("african_american", "African American"),
    SelectOption::new("other", "Other (uses white equations)"),
];

fn compute_ascvd(i: &NormalizedInputs) -> CalcResult<Output> {
    let code = i.choice("race")?;
    let race = PceRace::from_code(code).ok_or_else(|| CalcError::invalid_input("race", code, "Unknown race group"))?;
    let patient = PcePatient {
        age: i.number("age")?,
        sex: i.sex("sex")?,
        race,
        total_cholesterol: i.number("total_cholesterol")?,
        hdl: i.number("hdl")?,
        systolic_bp: i.number("systolic_bp")?,
        treated_hypertension: i.flag("treated_hypertension")?,
        smoker: i.flag("smoker")?,
        diabetes: i.flag("diabetes")?,
    };
    scalar(
        cardiovascular::ascvd_pce(&patient),
        "age, cholesterol, HDL and blood pressure must be positive",
    )
}

pub(super) fn calculators() -> Vec<Calculator> {
    vec![Calculator::new(
        "ascvd_pce",
        "10-year ASCVD risk (Pooled Cohort Equations)",
        CalculatorCategory::CardiovascularRisk,
        compute_ascvd,
    )
    .description("First hard ASCVD event within 10 years, ages 40-79 without prior ASCVD")
    .formula("1 - S10^exp(Σβx - mean), race × sex coefficient sets")
    .inputs([
        CalculatorInput::number("age", "Age").fixed("years").range(40.0, 79.0),
        sex(),
        CalculatorInput::select("race", "Race", RACE_OPTIONS).default_value("white"),
        CalculatorInput::number("total_cholesterol", "Total cholesterol")
            .unit(&CHOLESTEROL)
            .range(130.0, 320.0),
        CalculatorInput::number("hdl", "HDL cholesterol").unit(&CHOLESTEROL).range(20.0, 100.0),
        mmhg("systolic_bp", "Systolic blood pressure", 90.0, 200.0),
        CalculatorInput::boolean("treated_hypertension", "On blood pressure treatment"),
        CalculatorInput::boolean("smoker", "Current smoker"),
        CalculatorInput::boolean("diabetes", "Diabetes"),
    ])
    .result("%", 1)
    .bands(ASCVD_BANDS)
    .reference(LiteratureReference::new(
        "Goff DC Jr et al.",
        "2013 ACC/AHA guideline on the assessment of cardiovascular risk",
        "Circulation",
        2014,
    ))]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn patient(race: &str) -> NormalizedInputs {
        NormalizedInputs::new()
            .with("age", 55.0)
            .with("sex", "female")
            .with("race", race)
            .with("total_cholesterol", 213.0)
            .with("hdl", 50.0)
            .with("systolic_bp", 120.0)
    }

    #[test]
    fn test_other_race_uses_white_equations() {
        let white = compute_ascvd(&patient("white")).unwrap();
        let other = compute_ascvd(&patient("other")).unwrap();
        assert_eq!(white, other);
        let risk = white.primary_scalar().unwrap();
        assert!((risk - 2.1).abs() < 0.1, "got {}", risk);
        assert_eq!(ASCVD_BANDS.classify(risk), "Low risk");
    }

    #[test]
    fn test_unknown_race_is_invalid() {
        assert!(matches!(compute_ascvd(&patient("martian")), Err(CalcError::InvalidInput { .. })));
    }
}
