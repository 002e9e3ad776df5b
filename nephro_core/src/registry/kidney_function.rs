//! Kidney function calculators: eGFR equations, clearance, KFRE, albuminuria.

use super::common::{age, creatinine, height, range, scalar, sex, weight};
use super::{Calculator, CalculatorCategory, CalculatorInput, LiteratureReference};
use crate::errors::CalcResult;
use crate::formulas::{body, kidney_function as kf};
use crate::inputs::NormalizedInputs;
use crate::interpretation::{BandTable, EGFR_STAGES};
use crate::outputs::{Output, ResultRecord};
use crate::units::{ALBUMIN_CREATININE_RATIO, CREATININE};

const EGFR_UNIT: &str = "mL/min/1.73m²";
const NON_POSITIVE: &str = "creatinine and age must be positive";

/// Absolute clearance (mL/min), graded like the GFR stages
const CLEARANCE_BANDS: BandTable = BandTable::descending(
    &[
        (90.0, "Normal"),
        (60.0, "Mild impairment"),
        (30.0, "Moderate impairment"),
        (15.0, "Severe impairment"),
    ],
    "Kidney failure",
);

/// KFRE 5-year risk (%)
const KFRE_BANDS: BandTable = BandTable::descending(
    &[(15.0, "High risk (prepare for kidney replacement therapy)"), (5.0, "Intermediate risk (nephrology referral)")],
    "Low risk",
);

/// Urine protein-to-creatinine ratio (g/g)
const UPCR_BANDS: BandTable = BandTable::descending(
    &[
        (3.5, "Nephrotic-range proteinuria"),
        (0.5, "Severely increased"),
        (0.15, "Moderately increased"),
    ],
    "Normal to mildly increased",
);

const INKER_2021: LiteratureReference = LiteratureReference::new(
    "Inker LA et al.",
    "New creatinine- and cystatin C-based equations to estimate GFR without race",
    "N Engl J Med",
    2021,
);

const KDIGO_2012: LiteratureReference = LiteratureReference::new(
    "KDIGO CKD Work Group",
    "KDIGO 2012 clinical practice guideline for the evaluation and management of chronic kidney disease",
    "Kidney Int Suppl",
    2013,
);

fn cystatin_c() -> CalculatorInput {
    CalculatorInput::number("cystatin_c", "Serum cystatin C")
        .fixed("mg/L")
        .range(0.2, 10.0)
}

fn urine_creatinine() -> CalculatorInput {
    CalculatorInput::number("urine_creatinine", "Urine creatinine")
        .unit(&CREATININE)
        .range(5.0, 500.0)
}

fn egfr_input() -> CalculatorInput {
    CalculatorInput::number("egfr", "eGFR").fixed(EGFR_UNIT).range(1.0, 150.0)
}

/// A1 < 30, A2 30-300 (both ends inclusive), A3 > 300
fn albuminuria_stage(acr: f64) -> &'static str {
    if acr < 30.0 {
        "A1 normal to mildly increased"
    } else if acr <= 300.0 {
        "A2 moderately increased"
    } else {
        "A3 severely increased"
    }
}

fn compute_ckd_epi_2021(i: &NormalizedInputs) -> CalcResult<Output> {
    scalar(kf::ckd_epi_2021(i.number("creatinine")?, i.number("age")?, i.sex("sex")?), NON_POSITIVE)
}

fn compute_ckd_epi_cr_cys(i: &NormalizedInputs) -> CalcResult<Output> {
    scalar(
        kf::ckd_epi_cr_cys_2021(i.number("creatinine")?, i.number("cystatin_c")?, i.number("age")?, i.sex("sex")?),
        "creatinine and cystatin C must be positive",
    )
}

fn compute_ckd_epi_cys(i: &NormalizedInputs) -> CalcResult<Output> {
    scalar(
        kf::ckd_epi_cys_2012(i.number("cystatin_c")?, i.number("age")?, i.sex("sex")?),
        "cystatin C must be positive",
    )
}

fn compute_mdrd(i: &NormalizedInputs) -> CalcResult<Output> {
    scalar(
        kf::mdrd(i.number("creatinine")?, i.number("age")?, i.sex("sex")?, i.flag("black")?),
        NON_POSITIVE,
    )
}

fn compute_cockcroft_gault(i: &NormalizedInputs) -> CalcResult<Output> {
    scalar(
        kf::cockcroft_gault(i.number("creatinine")?, i.number("age")?, i.number("weight")?, i.sex("sex")?),
        "creatinine must be positive",
    )
}

fn compute_schwartz(i: &NormalizedInputs) -> CalcResult<Output> {
    scalar(
        kf::schwartz_bedside(i.number("creatinine")?, i.number("height")?),
        "creatinine must be positive",
    )
}

fn compute_lund_malmo(i: &NormalizedInputs) -> CalcResult<Output> {
    scalar(kf::lund_malmo_revised(i.number("creatinine")?, i.number("age")?, i.sex("sex")?), NON_POSITIVE)
}

fn compute_bis1(i: &NormalizedInputs) -> CalcResult<Output> {
    scalar(kf::bis1(i.number("creatinine")?, i.number("age")?, i.sex("sex")?), NON_POSITIVE)
}

fn compute_fas(i: &NormalizedInputs) -> CalcResult<Output> {
    scalar(kf::fas(i.number("creatinine")?, i.number("age")?, i.sex("sex")?), "creatinine must be positive")
}

fn compute_timed_clearance(i: &NormalizedInputs) -> CalcResult<Output> {
    scalar(
        kf::creatinine_clearance_timed(
            i.number("urine_creatinine")?,
            i.number("urine_volume")?,
            i.number("creatinine")?,
            i.number("collection_minutes")?,
        ),
        "creatinine and collection time must be positive",
    )
}

fn compute_deindexed(i: &NormalizedInputs) -> CalcResult<Output> {
    let bsa = body::bsa_mosteller(i.number("weight")?, i.number("height")?);
    let egfr = i.number("egfr")?;
    scalar(bsa.map(|bsa| kf::deindexed_egfr(egfr, bsa)), "weight and height must not be negative")
}

fn compute_kfre(i: &NormalizedInputs) -> CalcResult<Output> {
    let risk = kf::kfre_4var(i.number("age")?, i.sex("sex")?, i.number("egfr")?, i.number("acr")?);
    Ok(match risk {
        Some(r) => Output::Record(
            ResultRecord::new("five_year")
                .field("two_year", "2-year risk", Some(r.two_year), "%")
                .field("five_year", "5-year risk", Some(r.five_year), "%"),
        ),
        None => Output::undefined("albumin-to-creatinine ratio must be positive"),
    })
}

fn compute_uacr(i: &NormalizedInputs) -> CalcResult<Output> {
    scalar(
        kf::uacr(i.number("urine_albumin")?, i.number("urine_creatinine")?),
        "urine creatinine must be non-zero",
    )
}

fn compute_upcr(i: &NormalizedInputs) -> CalcResult<Output> {
    scalar(
        kf::upcr(i.number("urine_protein")?, i.number("urine_creatinine")?),
        "urine creatinine must be non-zero",
    )
}

pub(super) fn calculators() -> Vec<Calculator> {
    use CalculatorCategory::KidneyFunction;

    vec![
        Calculator::new("ckd_epi_2021", "CKD-EPI 2021 (creatinine)", KidneyFunction, compute_ckd_epi_2021)
            .description("Race-free eGFR from serum creatinine; KDIGO recommended adult equation")
            .formula("142 × min(Scr/κ,1)^α × max(Scr/κ,1)^-1.200 × 0.9938^age × 1.012 [F]")
            .inputs([creatinine(), age(), sex()])
            .result(EGFR_UNIT, 0)
            .bands(EGFR_STAGES)
            .reference(INKER_2021),
        Calculator::new("ckd_epi_cr_cys_2021", "CKD-EPI 2021 (creatinine-cystatin C)", KidneyFunction, compute_ckd_epi_cr_cys)
            .description("Race-free eGFR combining creatinine and cystatin C")
            .formula("135 × min(Scr/κ,1)^α × max(Scr/κ,1)^-0.544 × min(Scys/0.8,1)^-0.323 × max(Scys/0.8,1)^-0.778 × 0.9961^age × 0.963 [F]")
            .inputs([creatinine(), cystatin_c(), age(), sex()])
            .result(EGFR_UNIT, 0)
            .bands(EGFR_STAGES)
            .reference(INKER_2021),
        Calculator::new("ckd_epi_cys_2012", "CKD-EPI 2012 (cystatin C)", KidneyFunction, compute_ckd_epi_cys)
            .description("eGFR from cystatin C alone")
            .formula("133 × min(Scys/0.8,1)^-0.499 × max(Scys/0.8,1)^-1.328 × 0.996^age × 0.932 [F]")
            .inputs([cystatin_c(), age(), sex()])
            .result(EGFR_UNIT, 0)
            .bands(EGFR_STAGES)
            .reference(LiteratureReference::new(
                "Inker LA et al.",
                "Estimating glomerular filtration rate from serum creatinine and cystatin C",
                "N Engl J Med",
                2012,
            )),
        Calculator::new("mdrd", "MDRD Study (IDMS-traceable)", KidneyFunction, compute_mdrd)
            .description("Four-variable MDRD equation")
            .formula("175 × Scr^-1.154 × age^-0.203 × 0.742 [F] × 1.212 [Black]")
            .inputs([
                creatinine(),
                age(),
                sex(),
                CalculatorInput::boolean("black", "Black race"),
            ])
            .result(EGFR_UNIT, 0)
            .bands(EGFR_STAGES)
            .reference(LiteratureReference::new(
                "Levey AS et al.",
                "Using standardized serum creatinine values in the Modification of Diet in Renal Disease study equation",
                "Ann Intern Med",
                2006,
            )),
        Calculator::new("cockcroft_gault", "Cockcroft-Gault creatinine clearance", KidneyFunction, compute_cockcroft_gault)
            .description("Estimated creatinine clearance, used for drug dosing")
            .formula("(140 - age) × weight / (72 × Scr) × 0.85 [F]")
            .inputs([creatinine(), age(), weight(), sex()])
            .result("mL/min", 0)
            .bands(CLEARANCE_BANDS)
            .reference(LiteratureReference::new(
                "Cockcroft DW, Gault MH",
                "Prediction of creatinine clearance from serum creatinine",
                "Nephron",
                1976,
            )),
        Calculator::new("schwartz_bedside", "Bedside Schwartz (pediatric)", KidneyFunction, compute_schwartz)
            .description("Pediatric eGFR from height and creatinine")
            .formula("0.413 × height / Scr")
            .inputs([creatinine(), height().range(40.0, 200.0)])
            .result(EGFR_UNIT, 0)
            .bands(EGFR_STAGES)
            .reference(LiteratureReference::new(
                "Schwartz GJ et al.",
                "New equations to estimate GFR in children with CKD",
                "J Am Soc Nephrol",
                2009,
            )),
        Calculator::new("lund_malmo_revised", "Revised Lund-Malmö", KidneyFunction, compute_lund_malmo)
            .description("Creatinine-based eGFR derived in a Swedish cohort")
            .formula("e^(X - 0.0158 × age + 0.438 × ln(age)), X piecewise in pCr (µmol/L)")
            .inputs([creatinine(), age(), sex()])
            .result(EGFR_UNIT, 0)
            .bands(EGFR_STAGES)
            .reference(LiteratureReference::new(
                "Björk J et al.",
                "Revised equations for estimating glomerular filtration rate based on the Lund-Malmö Study cohort",
                "Scand J Clin Lab Invest",
                2011,
            )),
        Calculator::new("bis1", "BIS1 (age 70 and over)", KidneyFunction, compute_bis1)
            .description("Berlin Initiative Study creatinine equation for older adults")
            .formula("3736 × Scr^-0.87 × age^-0.95 × 0.82 [F]")
            .inputs([creatinine(), age().range(70.0, 110.0), sex()])
            .result(EGFR_UNIT, 0)
            .bands(EGFR_STAGES)
            .reference(LiteratureReference::new(
                "Schaeffner ES et al.",
                "Two novel equations to estimate kidney function in persons aged 70 years or older",
                "Ann Intern Med",
                2012,
            )),
        Calculator::new("fas", "Full Age Spectrum (FAS)", KidneyFunction, compute_fas)
            .description("Creatinine eGFR valid across the age spectrum")
            .formula("107.3 / (Scr / Q) × 0.988^(age - 40) [age > 40]; Q = 0.7 (F) / 0.9 (M)")
            .inputs([creatinine(), age(), sex()])
            .result(EGFR_UNIT, 0)
            .bands(EGFR_STAGES)
            .reference(LiteratureReference::new(
                "Pottel H et al.",
                "An estimated glomerular filtration rate equation for the full age spectrum",
                "Nephrol Dial Transplant",
                2016,
            )),
        Calculator::new("creatinine_clearance_24h", "Measured creatinine clearance", KidneyFunction, compute_timed_clearance)
            .description("Creatinine clearance from a timed urine collection")
            .formula("(Ucr × V) / (Scr × minutes)")
            .inputs([
                urine_creatinine(),
                CalculatorInput::number("urine_volume", "Urine volume").fixed("mL").range(100.0, 6000.0),
                creatinine(),
                CalculatorInput::number("collection_minutes", "Collection time")
                    .fixed("min")
                    .range(60.0, 2880.0)
                    .default_value(1440.0),
            ])
            .result("mL/min", 0)
            .bands(CLEARANCE_BANDS)
            .reference(KDIGO_2012),
        Calculator::new("deindexed_egfr", "De-indexed eGFR", KidneyFunction, compute_deindexed)
            .description("Converts an eGFR normalized to 1.73 m² into absolute mL/min using Mosteller BSA")
            .formula("eGFR × BSA / 1.73")
            .inputs([egfr_input(), weight(), height()])
            .result("mL/min", 0)
            .bands(CLEARANCE_BANDS)
            .reference(LiteratureReference::new(
                "Mosteller RD",
                "Simplified calculation of body-surface area",
                "N Engl J Med",
                1987,
            )),
        Calculator::new("kfre_4var", "Kidney Failure Risk Equation (4-variable)", KidneyFunction, compute_kfre)
            .description("2- and 5-year risk of kidney failure in CKD G3-G5 (North American calibration)")
            .formula("1 - 0.9240^exp(-0.2201(age/10 - 7.036) + 0.2467(male - 0.5642) - 0.5567(eGFR/5 - 7.222) + 0.4510(ln ACR - 5.137))")
            .inputs([
                age(),
                sex(),
                egfr_input().range(10.0, 60.0),
                CalculatorInput::number("acr", "Urine albumin-to-creatinine ratio")
                    .unit(&ALBUMIN_CREATININE_RATIO)
                    .range(1.0, 5000.0),
            ])
            .result("%", 1)
            .primary("five_year")
            .bands(KFRE_BANDS)
            .reference(LiteratureReference::new(
                "Tangri N et al.",
                "Multinational assessment of accuracy of equations for predicting risk of kidney failure",
                "JAMA",
                2016,
            )),
        Calculator::new("uacr", "Urine albumin-to-creatinine ratio", KidneyFunction, compute_uacr)
            .description("Spot albuminuria, KDIGO A stages")
            .formula("urine albumin (mg/dL) × 1000 / urine creatinine (mg/dL)")
            .inputs([
                CalculatorInput::number("urine_albumin", "Urine albumin").fixed("mg/dL").range(0.0, 1000.0),
                urine_creatinine(),
            ])
            .result("mg/g", 0)
            .custom(
                albuminuria_stage,
                vec![
                    range("A1 normal to mildly increased", None, Some(30.0), "mg/g"),
                    range("A2 moderately increased", Some(30.0), Some(300.0), "mg/g"),
                    range("A3 severely increased", Some(300.0), None, "mg/g"),
                ],
            )
            .reference(KDIGO_2012),
        Calculator::new("upcr", "Urine protein-to-creatinine ratio", KidneyFunction, compute_upcr)
            .description("Spot proteinuria estimate of daily protein excretion")
            .formula("urine protein (mg/dL) / urine creatinine (mg/dL)")
            .inputs([
                CalculatorInput::number("urine_protein", "Urine protein").fixed("mg/dL").range(0.0, 3000.0),
                urine_creatinine(),
            ])
            .result("g/g", 2)
            .bands(UPCR_BANDS)
            .reference(KDIGO_2012),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_albuminuria_boundaries() {
        assert_eq!(albuminuria_stage(29.0), "A1 normal to mildly increased");
        assert_eq!(albuminuria_stage(30.0), "A2 moderately increased");
        assert_eq!(albuminuria_stage(300.0), "A2 moderately increased");
        assert_eq!(albuminuria_stage(301.0), "A3 severely increased");
    }

    #[test]
    fn test_kfre_record() {
        let inputs = NormalizedInputs::new()
            .with("age", 60.0)
            .with("sex", "male")
            .with("egfr", 30.0)
            .with("acr", 300.0);
        let output = compute_kfre(&inputs).unwrap();
        let five = output.primary_scalar().unwrap();
        assert!((five - 24.56).abs() < 0.05, "got {}", five);
        let two = match &output {
            Output::Record(record) => record.get("two_year").unwrap(),
            other => panic!("expected record, got {:?}", other),
        };
        assert!((two - 8.63).abs() < 0.05, "got {}", two);
    }

    #[test]
    fn test_deindexed_uses_bsa() {
        let inputs = NormalizedInputs::new()
            .with("egfr", 60.0)
            .with("weight", 70.0)
            .with("height", 175.0);
        let value = compute_deindexed(&inputs).unwrap().primary_scalar().unwrap();
        // 60 × 1.8447 / 1.73
        assert!((value - 63.98).abs() < 0.01, "got {}", value);
    }
}
