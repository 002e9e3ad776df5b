//! Dialysis adequacy calculators.

use super::common::{age, height, scalar, sex, weight};
use super::{Calculator, CalculatorCategory, CalculatorInput, LiteratureReference};
use crate::errors::CalcResult;
use crate::formulas::dialysis::{self, ResidualUrine};
use crate::inputs::NormalizedInputs;
use crate::interpretation::BandTable;
use crate::outputs::Output;
use crate::units::UREA_NITROGEN;

const SP_KTV_BANDS: BandTable =
    BandTable::descending(&[(1.4, "Above target"), (1.2, "Adequate")], "Inadequate");

const URR_BANDS: BandTable =
    BandTable::descending(&[(70.0, "Above target"), (65.0, "Adequate")], "Inadequate");

const EKTV_BANDS: BandTable =
    BandTable::descending(&[(1.2, "Adequate"), (1.05, "Minimally adequate")], "Inadequate");

const STD_KTV_BANDS: BandTable =
    BandTable::descending(&[(2.3, "Adequate"), (2.1, "Minimally adequate")], "Inadequate");

const PD_KTV_BANDS: BandTable = BandTable::descending(&[(1.7, "Adequate")], "Below target");

const TBW_BANDS: BandTable = BandTable::descending(&[], "Urea distribution volume");

const NPCR_BANDS: BandTable = BandTable::descending(
    &[(1.2, "Adequate protein intake"), (1.0, "Borderline")],
    "Low protein intake",
);

const UF_RATE_BANDS: BandTable = BandTable::ascending(
    &[(10.0, "Within recommended limit"), (13.0, "Elevated")],
    "Excessive (associated with higher mortality)",
);

const KDOQI_HD_2015: LiteratureReference = LiteratureReference::new(
    "National Kidney Foundation",
    "KDOQI clinical practice guideline for hemodialysis adequacy: 2015 update",
    "Am J Kidney Dis",
    2015,
);

fn bun(id: &'static str, label: &'static str) -> CalculatorInput {
    CalculatorInput::number(id, label).unit(&UREA_NITROGEN).range(2.0, 250.0)
}

fn session_minutes() -> CalculatorInput {
    CalculatorInput::number("session_minutes", "Session length")
        .fixed("min")
        .range(60.0, 600.0)
        .default_value(240.0)
}

fn sp_ktv() -> CalculatorInput {
    CalculatorInput::number("sp_ktv", "Single-pool Kt/V").range(0.1, 4.0)
}

fn compute_ktv(i: &NormalizedInputs) -> CalcResult<Output> {
    scalar(
        dialysis::ktv_daugirdas(
            i.number("pre_bun")?,
            i.number("post_bun")?,
            i.number("session_minutes")?,
            i.number("ultrafiltration")?,
            i.number("post_weight")?,
        ),
        "post/pre BUN ratio too low for the session length (R - 0.008 × t ≤ 0)",
    )
}

fn compute_urr(i: &NormalizedInputs) -> CalcResult<Output> {
    scalar(dialysis::urr(i.number("pre_bun")?, i.number("post_bun")?), "pre-dialysis BUN must be non-zero")
}

fn compute_ektv(i: &NormalizedInputs) -> CalcResult<Output> {
    scalar(dialysis::ektv(i.number("sp_ktv")?, i.number("session_minutes")?), "session length must be positive")
}

fn compute_std_ktv(i: &NormalizedInputs) -> CalcResult<Output> {
    scalar(
        dialysis::std_ktv(i.number("ektv")?, i.number("session_minutes")?, i.number("sessions_per_week")?),
        "eKt/V, session length and frequency must be positive",
    )
}

fn compute_pd_ktv(i: &NormalizedInputs) -> CalcResult<Output> {
    let residual = match (i.optional_number("urine_urea")?, i.optional_number("urine_volume")?) {
        (Some(urea), Some(volume_l)) => Some(ResidualUrine { urea, volume_l }),
        _ => None,
    };
    let tbw = dialysis::watson_tbw(i.number("age")?, i.number("height")?, i.number("weight")?, i.sex("sex")?);
    scalar(
        dialysis::pd_weekly_ktv(
            i.number("dialysate_urea")?,
            i.number("plasma_urea")?,
            i.number("drain_volume")?,
            residual,
            tbw,
        ),
        "plasma urea and body water must be positive",
    )
}

fn compute_watson(i: &NormalizedInputs) -> CalcResult<Output> {
    Ok(Output::Scalar(dialysis::watson_tbw(
        i.number("age")?,
        i.number("height")?,
        i.number("weight")?,
        i.sex("sex")?,
    )))
}

fn compute_npcr(i: &NormalizedInputs) -> CalcResult<Output> {
    scalar(dialysis::npcr(i.number("pre_bun")?, i.number("sp_ktv")?), "Kt/V must be positive")
}

fn compute_uf_rate(i: &NormalizedInputs) -> CalcResult<Output> {
    scalar(
        dialysis::ultrafiltration_rate(i.number("uf_volume")?, i.number("weight")?, i.number("session_minutes")?),
        "weight and session length must be positive",
    )
}

pub(super) fn calculators() -> Vec<Calculator> {
    use CalculatorCategory::Dialysis;

    vec![
        Calculator::new("ktv_daugirdas", "Kt/V (Daugirdas II)", Dialysis, compute_ktv)
            .description("Single-pool hemodialysis dose from pre and post BUN")
            .formula("-ln(R - 0.008 × t) + (4 - 3.5 × R) × UF / W")
            .inputs([
                bun("pre_bun", "Pre-dialysis BUN"),
                bun("post_bun", "Post-dialysis BUN"),
                session_minutes(),
                CalculatorInput::number("ultrafiltration", "Ultrafiltration volume").fixed("L").range(0.0, 10.0),
                CalculatorInput::number("post_weight", "Post-dialysis weight").fixed("kg").range(20.0, 300.0),
            ])
            .result("", 2)
            .bands(SP_KTV_BANDS)
            .reference(LiteratureReference::new(
                "Daugirdas JT",
                "Second generation logarithmic estimates of single-pool variable volume Kt/V",
                "J Am Soc Nephrol",
                1993,
            ))
            .reference(KDOQI_HD_2015),
        Calculator::new("urr", "Urea reduction ratio", Dialysis, compute_urr)
            .description("Fractional fall in BUN over one hemodialysis session")
            .formula("(pre - post) / pre × 100")
            .inputs([bun("pre_bun", "Pre-dialysis BUN"), bun("post_bun", "Post-dialysis BUN")])
            .result("%", 0)
            .bands(URR_BANDS)
            .reference(LiteratureReference::new(
                "Owen WF Jr et al.",
                "The urea reduction ratio and serum albumin concentration as predictors of mortality in patients undergoing hemodialysis",
                "N Engl J Med",
                1993,
            )),
        Calculator::new("ektv", "Equilibrated Kt/V", Dialysis, compute_ektv)
            .description("Corrects single-pool Kt/V for urea rebound (arterial access)")
            .formula("spKt/V - 0.6 × spKt/V / t + 0.03")
            .inputs([sp_ktv(), session_minutes()])
            .result("", 2)
            .bands(EKTV_BANDS)
            .reference(LiteratureReference::new(
                "Daugirdas JT, Schneditz D",
                "Overestimation of hemodialysis dose depends on dialysis efficiency by regional blood flow but not by conventional two pool urea kinetic analysis",
                "ASAIO J",
                1995,
            )),
        Calculator::new("std_ktv", "Standard Kt/V (weekly)", Dialysis, compute_std_ktv)
            .description("Weekly dose normalized across schedules of different frequency")
            .formula("10080 × (1 - e^-eKt/V) / t ÷ ((1 - e^-eKt/V) / eKt/V + 10080 / (N × t) - 1)")
            .inputs([
                CalculatorInput::number("ektv", "Equilibrated Kt/V").range(0.1, 4.0),
                session_minutes(),
                CalculatorInput::number("sessions_per_week", "Sessions per week")
                    .fixed("per week")
                    .range(1.0, 7.0)
                    .default_value(3.0),
            ])
            .result("", 2)
            .bands(STD_KTV_BANDS)
            .reference(LiteratureReference::new(
                "Leypoldt JK et al.",
                "Predicting treatment dose for novel therapies using urea standard Kt/V",
                "Semin Dial",
                2004,
            ))
            .reference(KDOQI_HD_2015),
        Calculator::new("pd_weekly_ktv", "Peritoneal dialysis weekly Kt/V", Dialysis, compute_pd_ktv)
            .description("Weekly urea clearance for PD, with optional residual kidney function")
            .formula("7 × (D/P urea × drain volume + U/P urea × urine volume) / V (Watson)")
            .inputs([
                bun("dialysate_urea", "Dialysate urea nitrogen"),
                bun("plasma_urea", "Plasma urea nitrogen"),
                CalculatorInput::number("drain_volume", "Daily drained volume").fixed("L/day").range(0.5, 30.0),
                bun("urine_urea", "Urine urea nitrogen").range(10.0, 2000.0).optional(),
                CalculatorInput::number("urine_volume", "Daily urine volume")
                    .fixed("L/day")
                    .range(0.0, 5.0)
                    .optional()
                    .help("Residual clearance counts only when urine urea and volume are both given"),
                age(),
                height(),
                weight(),
                sex(),
            ])
            .result("", 2)
            .bands(PD_KTV_BANDS)
            .reference(LiteratureReference::new(
                "Lo WK et al.",
                "ISPD guidelines/recommendations: adequacy of peritoneal dialysis",
                "Perit Dial Int",
                2006,
            )),
        Calculator::new("watson_tbw", "Total body water (Watson)", Dialysis, compute_watson)
            .description("Anthropometric estimate of total body water, used as urea volume V")
            .formula("M: 2.447 - 0.09516 × age + 0.1074 × H + 0.3362 × W; F: -2.097 + 0.1069 × H + 0.2466 × W")
            .inputs([age(), height(), weight(), sex()])
            .result("L", 1)
            .bands(TBW_BANDS)
            .reference(LiteratureReference::new(
                "Watson PE, Watson ID, Batt RD",
                "Total body water volumes for adult males and females estimated from simple anthropometric measurements",
                "Am J Clin Nutr",
                1980,
            )),
        Calculator::new("npcr", "Normalized protein catabolic rate", Dialysis, compute_npcr)
            .description("Dietary protein intake estimate from urea kinetics (midweek session)")
            .formula("C0 / (36.3 + 5.48 × Kt/V + 53.5 / Kt/V) + 0.168")
            .inputs([bun("pre_bun", "Pre-dialysis BUN"), sp_ktv()])
            .result("g/kg/day", 2)
            .bands(NPCR_BANDS)
            .reference(LiteratureReference::new(
                "Depner TA, Daugirdas JT",
                "Equations for normalized protein catabolic rate based on two-point modeling of hemodialysis urea kinetics",
                "J Am Soc Nephrol",
                1996,
            )),
        Calculator::new("ultrafiltration_rate", "Ultrafiltration rate", Dialysis, compute_uf_rate)
            .description("Fluid removal per kilogram per hour of treatment")
            .formula("UF (mL) / (weight × hours)")
            .inputs([
                CalculatorInput::number("uf_volume", "Ultrafiltration volume").fixed("mL").range(0.0, 8000.0),
                weight(),
                session_minutes(),
            ])
            .result("mL/kg/h", 1)
            .bands(UF_RATE_BANDS)
            .reference(LiteratureReference::new(
                "Flythe JE, Kimmel SE, Brunelli SM",
                "Rapid fluid removal during dialysis is associated with cardiovascular morbidity and mortality",
                "Kidney Int",
                2011,
            )),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ktv_inputs(pre: f64, post: f64, minutes: f64) -> NormalizedInputs {
        NormalizedInputs::new()
            .with("pre_bun", pre)
            .with("post_bun", post)
            .with("session_minutes", minutes)
            .with("ultrafiltration", 3.0)
            .with("post_weight", 70.0)
    }

    #[test]
    fn test_ktv_reference_value() {
        let ktv = compute_ktv(&ktv_inputs(80.0, 25.0, 240.0)).unwrap().primary_scalar().unwrap();
        assert!((ktv - 1.35).abs() <= 0.15, "got {}", ktv);
    }

    #[test]
    fn test_ktv_domain_guard_is_undefined() {
        // R = 0.99, t = 125 h
        let output = compute_ktv(&ktv_inputs(100.0, 99.0, 7500.0)).unwrap();
        assert!(output.is_undefined());
    }

    #[test]
    fn test_pd_residual_needs_both_values() {
        let base = NormalizedInputs::new()
            .with("dialysate_urea", 50.0)
            .with("plasma_urea", 60.0)
            .with("drain_volume", 10.0)
            .with("age", 50.0)
            .with("height", 175.0)
            .with("weight", 70.0)
            .with("sex", "male");
        let anuric = compute_pd_ktv(&base).unwrap().primary_scalar().unwrap();
        let partial = compute_pd_ktv(&base.clone().with("urine_volume", 1.0)).unwrap().primary_scalar().unwrap();
        assert_eq!(anuric, partial);

        let residual = compute_pd_ktv(&base.with("urine_volume", 1.0).with("urine_urea", 300.0))
            .unwrap()
            .primary_scalar()
            .unwrap();
        assert!(residual > anuric);
    }
}
