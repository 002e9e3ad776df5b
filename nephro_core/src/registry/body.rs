//! Body composition and anemia calculators.

use super::common::{height, scalar, sex, weight};
use super::{Calculator, CalculatorCategory, CalculatorInput, LiteratureReference};
use crate::errors::CalcResult;
use crate::formulas::body::{self, GANZONI_DEFAULT_STORES_MG};
use crate::inputs::NormalizedInputs;
use crate::interpretation::BandTable;
use crate::outputs::Output;
use crate::units::{HEMOGLOBIN, IRON};

const BMI_BANDS: BandTable = BandTable::descending(
    &[
        (40.0, "Obesity class III"),
        (35.0, "Obesity class II"),
        (30.0, "Obesity class I"),
        (25.0, "Overweight"),
        (18.5, "Normal weight"),
    ],
    "Underweight",
);

const BSA_BANDS: BandTable = BandTable::descending(&[], "Body surface area");

const IBW_BANDS: BandTable = BandTable::descending(&[], "Ideal body weight");

const IRON_DEFICIT_BANDS: BandTable =
    BandTable::ascending(&[(0.0, "No iron deficit")], "Iron deficit present");

const TSAT_BANDS: BandTable = BandTable::descending(
    &[(46.0, "Elevated (possible iron overload)"), (20.0, "Normal")],
    "Low (iron deficiency)",
);

const MOSTELLER_1987: LiteratureReference = LiteratureReference::new(
    "Mosteller RD",
    "Simplified calculation of body-surface area",
    "N Engl J Med",
    1987,
);

fn compute_bmi(i: &NormalizedInputs) -> CalcResult<Output> {
    scalar(body::bmi(i.number("weight")?, i.number("height")?), "height must be non-zero")
}

fn compute_mosteller(i: &NormalizedInputs) -> CalcResult<Output> {
    scalar(
        body::bsa_mosteller(i.number("weight")?, i.number("height")?),
        "weight and height must not be negative",
    )
}

fn compute_dubois(i: &NormalizedInputs) -> CalcResult<Output> {
    scalar(
        body::bsa_dubois(i.number("weight")?, i.number("height")?),
        "weight and height must be positive",
    )
}

fn compute_ibw(i: &NormalizedInputs) -> CalcResult<Output> {
    Ok(Output::Scalar(body::ideal_body_weight(i.number("height")?, i.sex("sex")?)))
}

fn compute_ganzoni(i: &NormalizedInputs) -> CalcResult<Output> {
    Ok(Output::Scalar(body::iron_deficit_ganzoni(
        i.number("weight")?,
        i.number("hemoglobin")?,
        i.number("target_hemoglobin")?,
        i.number("iron_stores")?,
    )))
}

fn compute_tsat(i: &NormalizedInputs) -> CalcResult<Output> {
    scalar(
        body::transferrin_saturation(i.number("iron")?, i.number("tibc")?),
        "TIBC must be non-zero",
    )
}

pub(super) fn calculators() -> Vec<Calculator> {
    use CalculatorCategory::{Anemia, BodyComposition};

    vec![
        Calculator::new("bmi", "Body mass index", BodyComposition, compute_bmi)
            .description("Weight relative to height squared, WHO categories")
            .formula("weight / height(m)²")
            .inputs([weight(), height()])
            .result("kg/m²", 1)
            .bands(BMI_BANDS)
            .reference(LiteratureReference::new(
                "World Health Organization",
                "Obesity: preventing and managing the global epidemic",
                "WHO Technical Report Series 894",
                2000,
            )),
        Calculator::new("bsa_mosteller", "Body surface area (Mosteller)", BodyComposition, compute_mosteller)
            .description("Square-root body surface area formula")
            .formula("√(height × weight / 3600)")
            .inputs([weight(), height()])
            .result("m²", 2)
            .bands(BSA_BANDS)
            .reference(MOSTELLER_1987),
        Calculator::new("bsa_dubois", "Body surface area (Du Bois)", BodyComposition, compute_dubois)
            .description("Classic power-law body surface area formula")
            .formula("0.007184 × weight^0.425 × height^0.725")
            .inputs([weight(), height()])
            .result("m²", 2)
            .bands(BSA_BANDS)
            .reference(LiteratureReference::new(
                "Du Bois D, Du Bois EF",
                "A formula to estimate the approximate surface area if height and weight be known",
                "Arch Intern Med",
                1916,
            )),
        Calculator::new("ideal_body_weight", "Ideal body weight (Devine)", BodyComposition, compute_ibw)
            .description("Drug dosing weight from height and sex")
            .formula("50 (M) / 45.5 (F) + 2.3 × (height in inches - 60)")
            .inputs([height().range(152.0, 230.0), sex()])
            .result("kg", 1)
            .bands(IBW_BANDS)
            .reference(LiteratureReference::new(
                "Devine BJ",
                "Gentamicin therapy",
                "Drug Intell Clin Pharm",
                1974,
            )),
        Calculator::new("iron_deficit_ganzoni", "Iron deficit (Ganzoni)", Anemia, compute_ganzoni)
            .description("Total parenteral iron needed to reach a target hemoglobin and refill stores")
            .formula("weight × (target Hb - Hb) × 2.4 + iron stores")
            .inputs([
                weight(),
                CalculatorInput::number("hemoglobin", "Hemoglobin").unit(&HEMOGLOBIN).range(3.0, 20.0),
                CalculatorInput::number("target_hemoglobin", "Target hemoglobin")
                    .unit(&HEMOGLOBIN)
                    .range(10.0, 16.0)
                    .default_value(15.0),
                CalculatorInput::number("iron_stores", "Iron stores")
                    .fixed("mg")
                    .range(0.0, 1000.0)
                    .default_value(GANZONI_DEFAULT_STORES_MG),
            ])
            .result("mg", 0)
            .bands(IRON_DEFICIT_BANDS)
            .reference(LiteratureReference::new(
                "Ganzoni AM",
                "Intravenous iron-dextran: therapeutic and experimental possibilities",
                "Schweiz Med Wochenschr",
                1970,
            )),
        Calculator::new("transferrin_saturation", "Transferrin saturation", Anemia, compute_tsat)
            .description("Serum iron as a percentage of total iron-binding capacity")
            .formula("iron / TIBC × 100")
            .inputs([
                CalculatorInput::number("iron", "Serum iron").unit(&IRON).range(10.0, 300.0),
                CalculatorInput::number("tibc", "Total iron-binding capacity").unit(&IRON).range(100.0, 600.0),
            ])
            .result("%", 0)
            .bands(TSAT_BANDS)
            .reference(LiteratureReference::new(
                "KDIGO Anemia Work Group",
                "KDIGO clinical practice guideline for anemia in chronic kidney disease",
                "Kidney Int Suppl",
                2012,
            )),
    ]
}
