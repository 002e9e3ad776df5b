//! Sodium, water, calcium and potassium calculators, plus QTc.
//!
//! Total body water for the sodium formulas comes from weight, sex and age
//! (see [`crate::formulas::electrolytes::tbw_fraction`]).

use super::common::{age, scalar, sex, sodium, weight};
use super::{Calculator, CalculatorCategory, CalculatorInput, LiteratureReference};
use crate::errors::CalcResult;
use crate::formulas::electrolytes as el;
use crate::inputs::NormalizedInputs;
use crate::interpretation::BandTable;
use crate::outputs::Output;
use crate::units::{ALBUMIN, CALCIUM, GLUCOSE, PHOSPHATE};

const WATER_DEFICIT_BANDS: BandTable =
    BandTable::ascending(&[(0.0, "No free water deficit")], "Free water deficit present");

/// Serum sodium after correction (mEq/L); values shown to one decimal
const SODIUM_BANDS: BandTable =
    BandTable::descending(&[(145.1, "Hypernatremia"), (135.0, "Normal")], "Hyponatremia");

const SODIUM_DEFICIT_BANDS: BandTable =
    BandTable::ascending(&[(0.0, "No sodium deficit")], "Sodium deficit present");

const INFUSATE_EFFECT_BANDS: BandTable = BandTable::descending(
    &[(0.1, "Raises serum sodium"), (0.0, "Negligible change")],
    "Lowers serum sodium",
);

const FREE_WATER_CLEARANCE_BANDS: BandTable = BandTable::ascending(
    &[(0.0, "Negative: free water retained (serum sodium tends to fall)")],
    "Positive: free water excreted (serum sodium tends to rise)",
);

const CALCIUM_BANDS: BandTable =
    BandTable::descending(&[(10.6, "Hypercalcemia"), (8.5, "Normal")], "Hypocalcemia");

const CA_PHOS_BANDS: BandTable = BandTable::descending(
    &[(55.0, "Above target (calcification risk)")],
    "Within target",
);

const TTKG_BANDS: BandTable = BandTable::descending(
    &[(7.0, "High (aldosterone effect present)"), (3.0, "Intermediate")],
    "Low (minimal aldosterone effect)",
);

const QTC_BANDS: BandTable = BandTable::descending(
    &[(500.0, "Markedly prolonged"), (451.0, "Prolonged")],
    "Normal",
);

const ADROGUE_2000: LiteratureReference =
    LiteratureReference::new("Adrogué HJ, Madias NE", "Hyponatremia", "N Engl J Med", 2000);

fn glucose() -> CalculatorInput {
    CalculatorInput::number("glucose", "Glucose").unit(&GLUCOSE).range(20.0, 2000.0)
}

fn urine_electrolyte(id: &'static str, label: &'static str) -> CalculatorInput {
    CalculatorInput::number(id, label).fixed("mEq/L").range(1.0, 300.0)
}

fn compute_free_water_deficit(i: &NormalizedInputs) -> CalcResult<Output> {
    Ok(Output::Scalar(el::free_water_deficit(
        i.number("sodium")?,
        i.number("weight")?,
        i.sex("sex")?,
        i.number("age")?,
    )))
}

fn compute_katz(i: &NormalizedInputs) -> CalcResult<Output> {
    Ok(Output::Scalar(el::corrected_sodium_katz(i.number("sodium")?, i.number("glucose")?)))
}

fn compute_hillier(i: &NormalizedInputs) -> CalcResult<Output> {
    Ok(Output::Scalar(el::corrected_sodium_hillier(i.number("sodium")?, i.number("glucose")?)))
}

fn compute_sodium_deficit(i: &NormalizedInputs) -> CalcResult<Output> {
    Ok(Output::Scalar(el::sodium_deficit(
        i.number("sodium")?,
        i.number("target_sodium")?,
        i.number("weight")?,
        i.sex("sex")?,
        i.number("age")?,
    )))
}

fn compute_adrogue_madias(i: &NormalizedInputs) -> CalcResult<Output> {
    Ok(Output::Scalar(el::adrogue_madias(
        i.number("sodium")?,
        i.number("infusate_sodium")?,
        i.number("infusate_potassium")?,
        i.number("weight")?,
        i.sex("sex")?,
        i.number("age")?,
    )))
}

fn compute_efwc(i: &NormalizedInputs) -> CalcResult<Output> {
    scalar(
        el::electrolyte_free_water_clearance(
            i.number("urine_volume")?,
            i.number("urine_sodium")?,
            i.number("urine_potassium")?,
            i.number("sodium")?,
        ),
        "plasma sodium must be non-zero",
    )
}

fn compute_corrected_calcium(i: &NormalizedInputs) -> CalcResult<Output> {
    Ok(Output::Scalar(el::corrected_calcium(i.number("calcium")?, i.number("albumin")?)))
}

fn compute_ca_phos(i: &NormalizedInputs) -> CalcResult<Output> {
    Ok(Output::Scalar(el::calcium_phosphate_product(i.number("calcium")?, i.number("phosphate")?)))
}

fn compute_ttkg(i: &NormalizedInputs) -> CalcResult<Output> {
    scalar(
        el::ttkg(
            i.number("urine_potassium")?,
            i.number("plasma_potassium")?,
            i.number("urine_osmolality")?,
            i.number("plasma_osmolality")?,
        ),
        "plasma potassium and osmolalities must be non-zero",
    )
}

fn compute_qtc(i: &NormalizedInputs) -> CalcResult<Output> {
    scalar(
        el::qtc_bazett(i.number("qt_interval")?, i.number("heart_rate")?),
        "heart rate must be positive",
    )
}

pub(super) fn calculators() -> Vec<Calculator> {
    use CalculatorCategory::Electrolytes;

    let calcium = || CalculatorInput::number("calcium", "Total calcium").unit(&CALCIUM).range(4.0, 16.0);

    vec![
        Calculator::new("free_water_deficit", "Free water deficit", Electrolytes, compute_free_water_deficit)
            .description("Water needed to correct hypernatremia to 140 mEq/L")
            .formula("TBW × (Na / 140 - 1)")
            .inputs([sodium("sodium", "Serum sodium"), weight(), sex(), age()])
            .result("L", 1)
            .bands(WATER_DEFICIT_BANDS)
            .reference(LiteratureReference::new(
                "Adrogué HJ, Madias NE",
                "Hypernatremia",
                "N Engl J Med",
                2000,
            )),
        Calculator::new("corrected_sodium_katz", "Corrected sodium (Katz)", Electrolytes, compute_katz)
            .description("Serum sodium corrected for hyperglycemia, 1.6 mEq/L per 100 mg/dL")
            .formula("Na + 1.6 × (glucose - 100) / 100")
            .inputs([sodium("sodium", "Serum sodium"), glucose()])
            .result("mEq/L", 1)
            .bands(SODIUM_BANDS)
            .reference(LiteratureReference::new(
                "Katz MA",
                "Hyperglycemia-induced hyponatremia: calculation of expected serum sodium depression",
                "N Engl J Med",
                1973,
            )),
        Calculator::new("corrected_sodium_hillier", "Corrected sodium (Hillier)", Electrolytes, compute_hillier)
            .description("Serum sodium corrected for hyperglycemia, 2.4 mEq/L per 100 mg/dL")
            .formula("Na + 2.4 × (glucose - 100) / 100")
            .inputs([sodium("sodium", "Serum sodium"), glucose()])
            .result("mEq/L", 1)
            .bands(SODIUM_BANDS)
            .reference(LiteratureReference::new(
                "Hillier TA, Abbott RD, Barrett EJ",
                "Hyponatremia: evaluating the correction factor for hyperglycemia",
                "Am J Med",
                1999,
            )),
        Calculator::new("sodium_deficit", "Sodium deficit", Electrolytes, compute_sodium_deficit)
            .description("Total sodium needed to raise serum sodium to a target")
            .formula("TBW × (target Na - current Na)")
            .inputs([
                sodium("sodium", "Serum sodium"),
                sodium("target_sodium", "Target sodium").default_value(135.0),
                weight(),
                sex(),
                age(),
            ])
            .result("mEq", 0)
            .bands(SODIUM_DEFICIT_BANDS)
            .reference(ADROGUE_2000),
        Calculator::new("adrogue_madias", "Adrogué-Madias infusate effect", Electrolytes, compute_adrogue_madias)
            .description("Expected change in serum sodium after one litre of infusate")
            .formula("(infusate Na + infusate K - serum Na) / (TBW + 1)")
            .inputs([
                sodium("sodium", "Serum sodium"),
                CalculatorInput::number("infusate_sodium", "Infusate sodium")
                    .fixed("mEq/L")
                    .range(0.0, 1000.0)
                    .default_value(154.0)
                    .help("0.9% saline 154, 3% saline 513, lactated Ringer's 130"),
                CalculatorInput::number("infusate_potassium", "Infusate potassium")
                    .fixed("mEq/L")
                    .range(0.0, 80.0)
                    .default_value(0.0),
                weight(),
                sex(),
                age(),
            ])
            .result("mEq/L per L", 2)
            .bands(INFUSATE_EFFECT_BANDS)
            .reference(ADROGUE_2000),
        Calculator::new(
            "electrolyte_free_water_clearance",
            "Electrolyte-free water clearance",
            Electrolytes,
            compute_efwc,
        )
        .description("Urine water excreted free of sodium and potassium")
        .formula("V × (1 - (UNa + UK) / PNa)")
        .inputs([
            CalculatorInput::number("urine_volume", "Urine volume").fixed("L/day").range(0.1, 15.0),
            urine_electrolyte("urine_sodium", "Urine sodium"),
            urine_electrolyte("urine_potassium", "Urine potassium"),
            sodium("sodium", "Plasma sodium"),
        ])
        .result("L/day", 2)
        .bands(FREE_WATER_CLEARANCE_BANDS)
        .reference(LiteratureReference::new(
            "Rose BD",
            "New approach to disturbances in the plasma sodium concentration",
            "Am J Med",
            1986,
        )),
        Calculator::new("corrected_calcium", "Albumin-corrected calcium", Electrolytes, compute_corrected_calcium)
            .description("Total calcium adjusted for hypoalbuminemia")
            .formula("Ca + 0.8 × (4.0 - albumin)")
            .inputs([
                calcium(),
                CalculatorInput::number("albumin", "Albumin").unit(&ALBUMIN).range(1.0, 6.0),
            ])
            .result("mg/dL", 1)
            .bands(CALCIUM_BANDS)
            .reference(LiteratureReference::new(
                "Payne RB et al.",
                "Interpretation of serum calcium in patients with abnormal serum proteins",
                "Br Med J",
                1973,
            )),
        Calculator::new("calcium_phosphate_product", "Calcium × phosphate product", Electrolytes, compute_ca_phos)
            .description("Marker of vascular calcification risk in CKD")
            .formula("Ca × P")
            .inputs([
                calcium(),
                CalculatorInput::number("phosphate", "Phosphate").unit(&PHOSPHATE).range(1.0, 15.0),
            ])
            .result("mg²/dL²", 0)
            .bands(CA_PHOS_BANDS)
            .reference(LiteratureReference::new(
                "National Kidney Foundation",
                "K/DOQI clinical practice guidelines for bone metabolism and disease in chronic kidney disease",
                "Am J Kidney Dis",
                2003,
            )),
        Calculator::new("ttkg", "Transtubular potassium gradient", Electrolytes, compute_ttkg)
            .description("Estimates potassium secretion in the cortical collecting duct")
            .formula("(UK / PK) / (Uosm / Posm)")
            .inputs([
                urine_electrolyte("urine_potassium", "Urine potassium"),
                CalculatorInput::number("plasma_potassium", "Plasma potassium").fixed("mEq/L").range(1.5, 9.0),
                CalculatorInput::number("urine_osmolality", "Urine osmolality")
                    .fixed("mOsm/kg")
                    .range(50.0, 1400.0)
                    .help("Only valid when urine osmolality exceeds plasma osmolality"),
                CalculatorInput::number("plasma_osmolality", "Plasma osmolality")
                    .fixed("mOsm/kg")
                    .range(240.0, 350.0),
            ])
            .result("", 1)
            .bands(TTKG_BANDS)
            .reference(LiteratureReference::new(
                "Ethier JH et al.",
                "The transtubular potassium concentration in patients with hypokalemia and hyperkalemia",
                "Am J Kidney Dis",
                1990,
            )),
        Calculator::new("qtc_bazett", "QTc (Bazett)", Electrolytes, compute_qtc)
            .description("Heart-rate corrected QT interval")
            .formula("QT / √(60 / HR)")
            .inputs([
                CalculatorInput::number("qt_interval", "QT interval").fixed("ms").range(200.0, 700.0),
                CalculatorInput::number("heart_rate", "Heart rate").fixed("bpm").range(20.0, 250.0),
            ])
            .result("ms", 0)
            .bands(QTC_BANDS)
            .reference(LiteratureReference::new(
                "Bazett HC",
                "An analysis of the time-relations of electrocardiograms",
                "Heart",
                1920,
            )),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_katz_reference_value() {
        let inputs = NormalizedInputs::new().with("sodium", 130.0).with("glucose", 500.0);
        let value = compute_katz(&inputs).unwrap().primary_scalar().unwrap();
        assert!((value - 136.4).abs() < 1e-9);
        assert_eq!(SODIUM_BANDS.classify(136.4), "Normal");
    }

    #[test]
    fn test_sodium_band_edges() {
        assert_eq!(SODIUM_BANDS.classify(145.0), "Normal");
        assert_eq!(SODIUM_BANDS.classify(145.1), "Hypernatremia");
        assert_eq!(SODIUM_BANDS.classify(134.9), "Hyponatremia");
    }

    #[test]
    fn test_adrogue_madias_with_defaults() {
        // 70 kg male, 40 y: TBW 42 L; (154 - 120) / 43
        let inputs = NormalizedInputs::new()
            .with("sodium", 120.0)
            .with("infusate_sodium", 154.0)
            .with("infusate_potassium", 0.0)
            .with("weight", 70.0)
            .with("sex", "male")
            .with("age", 40.0);
        let value = compute_adrogue_madias(&inputs).unwrap().primary_scalar().unwrap();
        assert!((value - 34.0 / 43.0).abs() < 1e-9);
        assert_eq!(INFUSATE_EFFECT_BANDS.classify(0.79), "Raises serum sodium");
    }

    #[test]
    fn test_qtc_zero_heart_rate_is_undefined() {
        let inputs = NormalizedInputs::new().with("qt_interval", 400.0).with("heart_rate", 0.0);
        assert!(compute_qtc(&inputs).unwrap().is_undefined());
    }
}
