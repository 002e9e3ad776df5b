//! Acid-base calculators.

use super::common::{range, sodium};
use super::{Calculator, CalculatorCategory, CalculatorInput, LiteratureReference};
use crate::errors::CalcResult;
use crate::formulas::acid_base;
use crate::inputs::NormalizedInputs;
use crate::interpretation::BandTable;
use crate::outputs::{Output, ResultRecord};
use crate::units::{ALBUMIN, GLUCOSE, UREA_NITROGEN};

const ANION_GAP_BANDS: BandTable =
    BandTable::ascending(&[(12.0, "Normal"), (20.0, "Elevated")], "Markedly elevated");

const OSMOLALITY_BANDS: BandTable = BandTable::descending(&[(296.0, "High"), (275.0, "Normal")], "Low");

const OSMOLAL_GAP_BANDS: BandTable =
    BandTable::ascending(&[(10.0, "Normal")], "Elevated (consider toxic alcohol ingestion)");

const EMMETT_1977: LiteratureReference = LiteratureReference::new(
    "Emmett M, Narins RG",
    "Clinical use of the anion gap",
    "Medicine (Baltimore)",
    1977,
);

fn chloride() -> CalculatorInput {
    CalculatorInput::number("chloride", "Chloride").fixed("mEq/L").range(70.0, 140.0)
}

fn bicarbonate() -> CalculatorInput {
    CalculatorInput::number("bicarbonate", "Bicarbonate").fixed("mEq/L").range(2.0, 50.0)
}

fn glucose() -> CalculatorInput {
    CalculatorInput::number("glucose", "Glucose").unit(&GLUCOSE).range(20.0, 2000.0)
}

fn bun() -> CalculatorInput {
    CalculatorInput::number("bun", "Blood urea nitrogen")
        .unit(&UREA_NITROGEN)
        .range(2.0, 200.0)
}

fn electrolytes() -> [CalculatorInput; 3] {
    [sodium("sodium", "Sodium"), chloride(), bicarbonate()]
}

fn delta_ratio_category(ratio: f64) -> &'static str {
    if ratio < 0.4 {
        "Hyperchloremic normal anion gap acidosis"
    } else if ratio < 1.0 {
        "Combined high and normal anion gap acidosis"
    } else if ratio <= 2.0 {
        "Pure high anion gap metabolic acidosis"
    } else {
        "High anion gap acidosis with concurrent metabolic alkalosis"
    }
}

fn winters_category(_expected: f64) -> &'static str {
    "Measured pCO2 above the range suggests respiratory acidosis, below it respiratory alkalosis"
}

fn compute_anion_gap(i: &NormalizedInputs) -> CalcResult<Output> {
    Ok(Output::Scalar(acid_base::anion_gap(
        i.number("sodium")?,
        i.number("chloride")?,
        i.number("bicarbonate")?,
    )))
}

fn compute_corrected_anion_gap(i: &NormalizedInputs) -> CalcResult<Output> {
    Ok(Output::Scalar(acid_base::albumin_corrected_anion_gap(
        i.number("sodium")?,
        i.number("chloride")?,
        i.number("bicarbonate")?,
        i.number("albumin")?,
    )))
}

fn compute_delta_gap(i: &NormalizedInputs) -> CalcResult<Output> {
    let gap = acid_base::delta_gap(i.number("sodium")?, i.number("chloride")?, i.number("bicarbonate")?);
    let record = ResultRecord::new("ratio")
        .field("delta_gap", "Delta gap (AG - 12)", Some(gap.delta_gap), "mEq/L")
        .field("delta_hco3", "Delta HCO3 (24 - HCO3)", Some(gap.delta_hco3), "mEq/L")
        .field("ratio", "Delta ratio", gap.ratio, "");
    Ok(Output::Record(record))
}

fn compute_osmolality(i: &NormalizedInputs) -> CalcResult<Output> {
    Ok(Output::Scalar(acid_base::serum_osmolality(
        i.number("sodium")?,
        i.number("glucose")?,
        i.number("bun")?,
    )))
}

fn compute_osmolal_gap(i: &NormalizedInputs) -> CalcResult<Output> {
    Ok(Output::Scalar(acid_base::osmolal_gap(
        i.number("measured_osmolality")?,
        i.number("sodium")?,
        i.number("glucose")?,
        i.number("bun")?,
        i.optional_number("ethanol")?,
    )))
}

fn compute_winters(i: &NormalizedInputs) -> CalcResult<Output> {
    let window = acid_base::winters_formula(i.number("bicarbonate")?);
    Ok(Output::Record(
        ResultRecord::new("expected_pco2")
            .field("expected_pco2", "Expected pCO2", Some(window.expected), "mmHg")
            .field("low", "Lower limit", Some(window.low), "mmHg")
            .field("high", "Upper limit", Some(window.high), "mmHg"),
    ))
}

pub(super) fn calculators() -> Vec<Calculator> {
    use CalculatorCategory::AcidBase;

    vec![
        Calculator::new("anion_gap", "Anion gap", AcidBase, compute_anion_gap)
            .description("Serum anion gap for metabolic acidosis workup")
            .formula("Na - (Cl + HCO3)")
            .inputs(electrolytes())
            .result("mEq/L", 0)
            .bands(ANION_GAP_BANDS)
            .reference(EMMETT_1977),
        Calculator::new("albumin_corrected_anion_gap", "Albumin-corrected anion gap", AcidBase, compute_corrected_anion_gap)
            .description("Anion gap adjusted for hypoalbuminemia")
            .formula("AG + 2.5 × (4.0 - albumin)")
            .inputs(electrolytes())
            .input(CalculatorInput::number("albumin", "Albumin").unit(&ALBUMIN).range(1.0, 6.0))
            .result("mEq/L", 0)
            .bands(ANION_GAP_BANDS)
            .reference(LiteratureReference::new(
                "Figge J et al.",
                "Anion gap and hypoalbuminemia",
                "Crit Care Med",
                1998,
            )),
        Calculator::new("delta_gap", "Delta gap / delta ratio", AcidBase, compute_delta_gap)
            .description("Detects mixed disorders in high anion gap metabolic acidosis")
            .formula("Δgap = AG - 12; ΔHCO3 = 24 - HCO3; ratio = Δgap / ΔHCO3")
            .inputs(electrolytes())
            .result("", 2)
            .primary("ratio")
            .custom(
                delta_ratio_category,
                vec![
                    range("Hyperchloremic normal anion gap acidosis", None, Some(0.4), ""),
                    range("Combined high and normal anion gap acidosis", Some(0.4), Some(1.0), ""),
                    range("Pure high anion gap metabolic acidosis", Some(1.0), Some(2.0), ""),
                    range("High anion gap acidosis with concurrent metabolic alkalosis", Some(2.0), None, ""),
                ],
            )
            .reference(LiteratureReference::new(
                "Wrenn K",
                "The delta (Δ) gap: an approach to mixed acid-base disorders",
                "Ann Emerg Med",
                1990,
            )),
        Calculator::new("serum_osmolality", "Calculated serum osmolality", AcidBase, compute_osmolality)
            .description("Estimated plasma osmolality from sodium, glucose and BUN")
            .formula("2 × Na + glucose / 18 + BUN / 2.8")
            .inputs([sodium("sodium", "Sodium"), glucose(), bun()])
            .result("mOsm/kg", 0)
            .bands(OSMOLALITY_BANDS)
            .reference(LiteratureReference::new(
                "Rasouli M",
                "Basic concepts and practical equations on osmolality: biochemical approach",
                "Clin Biochem",
                2016,
            )),
        Calculator::new("osmolal_gap", "Osmolal gap", AcidBase, compute_osmolal_gap)
            .description("Measured minus calculated osmolality; screens for unmeasured osmoles")
            .formula("measured - (2 × Na + glucose / 18 + BUN / 2.8 + ethanol / 3.7)")
            .inputs([
                CalculatorInput::number("measured_osmolality", "Measured osmolality")
                    .fixed("mOsm/kg")
                    .range(200.0, 450.0),
                sodium("sodium", "Sodium"),
                glucose(),
                bun(),
                CalculatorInput::number("ethanol", "Blood ethanol")
                    .fixed("mg/dL")
                    .range(0.0, 800.0)
                    .optional()
                    .help("Leave blank when no ethanol level is available"),
            ])
            .result("mOsm/kg", 0)
            .bands(OSMOLAL_GAP_BANDS)
            .reference(LiteratureReference::new(
                "Kraut JA, Kurtz I",
                "Toxic alcohol ingestions: clinical features, diagnosis, and management",
                "Clin J Am Soc Nephrol",
                2008,
            )),
        Calculator::new("winters_formula", "Winter's formula", AcidBase, compute_winters)
            .description("Expected respiratory compensation for metabolic acidosis")
            .formula("pCO2 = 1.5 × HCO3 + 8 ± 2")
            .input(bicarbonate())
            .result("mmHg", 1)
            .primary("expected_pco2")
            .custom(
                winters_category,
                vec![range("Expected pCO2 ± 2 mmHg", None, None, "mmHg")],
            )
            .reference(LiteratureReference::new(
                "Albert MS, Dell RB, Winters RW",
                "Quantitative displacement of acid-base equilibrium in metabolic acidosis",
                "Ann Intern Med",
                1967,
            )),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn panel(na: f64, cl: f64, hco3: f64) -> NormalizedInputs {
        NormalizedInputs::new()
            .with("sodium", na)
            .with("chloride", cl)
            .with("bicarbonate", hco3)
    }

    #[test]
    fn test_anion_gap_reference_value() {
        assert_eq!(compute_anion_gap(&panel(140.0, 100.0, 24.0)).unwrap(), Output::Scalar(16.0));
    }

    #[test]
    fn test_delta_ratio_categories() {
        assert_eq!(delta_ratio_category(0.3), "Hyperchloremic normal anion gap acidosis");
        assert_eq!(delta_ratio_category(0.4), "Combined high and normal anion gap acidosis");
        assert_eq!(delta_ratio_category(1.0), "Pure high anion gap metabolic acidosis");
        assert_eq!(delta_ratio_category(2.0), "Pure high anion gap metabolic acidosis");
        assert_eq!(delta_ratio_category(2.01), "High anion gap acidosis with concurrent metabolic alkalosis");
    }

    #[test]
    fn test_delta_gap_record() {
        // AG 26, delta gap 14, delta HCO3 14
        let output = compute_delta_gap(&panel(140.0, 104.0, 10.0)).unwrap();
        assert_eq!(output.primary_scalar(), Some(1.0));
        match output {
            Output::Record(record) => {
                assert_eq!(record.get("delta_gap"), Some(14.0));
                assert_eq!(record.get("delta_hco3"), Some(14.0));
            }
            other => panic!("expected record, got {:?}", other),
        }
    }

    #[test]
    fn test_delta_gap_keeps_fields_at_normal_bicarbonate() {
        // AG 16, delta gap 4, delta HCO3 0
        let output = compute_delta_gap(&panel(140.0, 100.0, 24.0)).unwrap();
        assert!(output.is_undefined());
        match output {
            Output::Record(record) => {
                assert_eq!(record.get("ratio"), None);
                assert_eq!(record.get("delta_gap"), Some(4.0));
                assert_eq!(record.get("delta_hco3"), Some(0.0));
            }
            other => panic!("expected record, got {:?}", other),
        }
    }

    #[test]
    fn test_osmolal_gap_ethanol_optional() {
        let base = NormalizedInputs::new()
            .with("measured_osmolality", 320.0)
            .with("sodium", 140.0)
            .with("glucose", 90.0)
            .with("bun", 14.0);
        let without = compute_osmolal_gap(&base).unwrap().primary_scalar().unwrap();
        // 320 - (280 + 5 + 5)
        assert!((without - 30.0).abs() < 1e-9);

        let with = compute_osmolal_gap(&base.clone().with("ethanol", 37.0)).unwrap().primary_scalar().unwrap();
        assert!((with - 20.0).abs() < 1e-9);
    }
}
