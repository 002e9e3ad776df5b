//! Acute kidney injury workup.
//!
//! Urine and plasma creatinine are separate inputs with separate unit
//! bindings, so a caller may enter one in mg/dL and the other in µmol/L.

use super::common::{creatinine, scalar, sodium};
use super::{Calculator, CalculatorCategory, CalculatorInput, LiteratureReference};
use crate::errors::CalcResult;
use crate::formulas::aki;
use crate::inputs::NormalizedInputs;
use crate::interpretation::BandTable;
use crate::outputs::Output;
use crate::units::{CREATININE, UREA_NITROGEN};

const FENA_BANDS: BandTable = BandTable::descending(
    &[(2.0, "Intrinsic renal (ATN)"), (1.0, "Indeterminate")],
    "Prerenal",
);

const FEUREA_BANDS: BandTable = BandTable::descending(
    &[(50.0, "Intrinsic renal (ATN)"), (35.0, "Indeterminate")],
    "Prerenal",
);

const BUN_CR_BANDS: BandTable = BandTable::descending(
    &[(20.0, "Suggests prerenal azotemia or GI bleeding"), (10.0, "Normal")],
    "Low (intrinsic renal injury, liver disease or low protein intake)",
);

const URINE_ANION_GAP_BANDS: BandTable = BandTable::ascending(
    &[(0.0, "Negative or zero: appropriate ammonium excretion (GI bicarbonate loss)")],
    "Positive: impaired ammonium excretion (renal tubular acidosis)",
);

fn urine_sodium() -> CalculatorInput {
    CalculatorInput::number("urine_sodium", "Urine sodium").fixed("mEq/L").range(1.0, 300.0)
}

fn urine_creatinine() -> CalculatorInput {
    CalculatorInput::number("urine_creatinine", "Urine creatinine")
        .unit(&CREATININE)
        .range(5.0, 500.0)
}

fn bun() -> CalculatorInput {
    CalculatorInput::number("bun", "Blood urea nitrogen")
        .unit(&UREA_NITROGEN)
        .range(2.0, 200.0)
}

fn compute_fena(i: &NormalizedInputs) -> CalcResult<Output> {
    scalar(
        aki::fena(
            i.number("urine_sodium")?,
            i.number("plasma_sodium")?,
            i.number("urine_creatinine")?,
            i.number("creatinine")?,
        ),
        "plasma sodium and urine creatinine must be non-zero",
    )
}

fn compute_feurea(i: &NormalizedInputs) -> CalcResult<Output> {
    scalar(
        aki::feurea(
            i.number("urine_urea_nitrogen")?,
            i.number("bun")?,
            i.number("urine_creatinine")?,
            i.number("creatinine")?,
        ),
        "BUN and urine creatinine must be non-zero",
    )
}

fn compute_bun_cr(i: &NormalizedInputs) -> CalcResult<Output> {
    scalar(
        aki::bun_creatinine_ratio(i.number("bun")?, i.number("creatinine")?),
        "creatinine must be non-zero",
    )
}

fn compute_urine_anion_gap(i: &NormalizedInputs) -> CalcResult<Output> {
    Ok(Output::Scalar(aki::urine_anion_gap(
        i.number("urine_sodium")?,
        i.number("urine_potassium")?,
        i.number("urine_chloride")?,
    )))
}

pub(super) fn calculators() -> Vec<Calculator> {
    use CalculatorCategory::AcuteKidneyInjury;

    vec![
        Calculator::new("fena", "Fractional excretion of sodium", AcuteKidneyInjury, compute_fena)
            .description("Separates prerenal from intrinsic AKI in oliguric patients not on diuretics")
            .formula("(UNa × PCr) / (PNa × UCr) × 100")
            .inputs([
                urine_sodium(),
                sodium("plasma_sodium", "Plasma sodium"),
                urine_creatinine(),
                creatinine(),
            ])
            .result("%", 2)
            .bands(FENA_BANDS)
            .reference(LiteratureReference::new(
                "Espinel CH",
                "The FENa test: use in the differential diagnosis of acute renal failure",
                "JAMA",
                1976,
            )),
        Calculator::new("feurea", "Fractional excretion of urea", AcuteKidneyInjury, compute_feurea)
            .description("Prerenal vs intrinsic AKI, usable during diuretic therapy")
            .formula("(UUN × PCr) / (BUN × UCr) × 100")
            .inputs([
                CalculatorInput::number("urine_urea_nitrogen", "Urine urea nitrogen")
                    .unit(&UREA_NITROGEN)
                    .range(10.0, 2000.0),
                bun(),
                urine_creatinine(),
                creatinine(),
            ])
            .result("%", 1)
            .bands(FEUREA_BANDS)
            .reference(LiteratureReference::new(
                "Carvounis CP et al.",
                "Significance of the fractional excretion of urea in the differential diagnosis of acute renal failure",
                "Kidney Int",
                2002,
            )),
        Calculator::new("bun_creatinine_ratio", "BUN : creatinine ratio", AcuteKidneyInjury, compute_bun_cr)
            .description("Ratio of blood urea nitrogen to serum creatinine")
            .formula("BUN / Scr")
            .inputs([bun(), creatinine()])
            .result("", 0)
            .bands(BUN_CR_BANDS)
            .reference(LiteratureReference::new(
                "Baum N et al.",
                "Blood urea nitrogen and serum creatinine: physiology and interpretations",
                "Urology",
                1975,
            )),
        Calculator::new("urine_anion_gap", "Urine anion gap", AcuteKidneyInjury, compute_urine_anion_gap)
            .description("Surrogate for urinary ammonium in normal anion gap metabolic acidosis")
            .formula("UNa + UK - UCl")
            .inputs([
                urine_sodium(),
                CalculatorInput::number("urine_potassium", "Urine potassium").fixed("mEq/L").range(1.0, 200.0),
                CalculatorInput::number("urine_chloride", "Urine chloride").fixed("mEq/L").range(1.0, 300.0),
            ])
            .result("mEq/L", 0)
            .bands(URINE_ANION_GAP_BANDS)
            .reference(LiteratureReference::new(
                "Batlle DC et al.",
                "The use of the urinary anion gap in the diagnosis of hyperchloremic metabolic acidosis",
                "N Engl J Med",
                1988,
            )),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fena_bands() {
        assert_eq!(FENA_BANDS.classify(0.5), "Prerenal");
        assert_eq!(FENA_BANDS.classify(1.0), "Indeterminate");
        assert_eq!(FENA_BANDS.classify(2.0), "Intrinsic renal (ATN)");
    }

    #[test]
    fn test_fena_zero_urine_creatinine_is_undefined() {
        let inputs = NormalizedInputs::new()
            .with("urine_sodium", 20.0)
            .with("plasma_sodium", 140.0)
            .with("urine_creatinine", 0.0)
            .with("creatinine", 2.0);
        assert!(compute_fena(&inputs).unwrap().is_undefined());
    }

    #[test]
    fn test_urine_anion_gap_sign() {
        let inputs = NormalizedInputs::new()
            .with("urine_sodium", 40.0)
            .with("urine_potassium", 30.0)
            .with("urine_chloride", 90.0);
        assert_eq!(compute_urine_anion_gap(&inputs).unwrap(), Output::Scalar(-20.0));
        assert!(URINE_ANION_GAP_BANDS.classify(-20.0).starts_with("Negative"));
    }
}
