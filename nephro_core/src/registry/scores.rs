//! Point-based scores: critical care, lupus and frailty.

use super::common::{age, creatinine, mmhg, range};
use super::{Calculator, CalculatorCategory, CalculatorInput, LiteratureReference, SelectOption};
use crate::errors::{CalcError, CalcResult};
use crate::formulas::scores::{
    self, ChecklistItem, Curb65, Frail, News2, Prisma7, Qsofa, Sofa, Vasopressors, WellsDvt, WellsPe,
    SLEDAI_ITEMS, SLICC_CLINICAL, SLICC_IMMUNOLOGIC,
};
use crate::inputs::NormalizedInputs;
use crate::interpretation::BandTable;
use crate::outputs::{Output, ResultRecord};
use crate::units::{BILIRUBIN, UREA_NITROGEN};

const CURB65_BANDS: BandTable = BandTable::ascending(
    &[(1.0, "Low risk (consider outpatient care)"), (2.0, "Moderate risk (consider admission)")],
    "High risk (assess for ICU care)",
);

const QSOFA_BANDS: BandTable =
    BandTable::ascending(&[(1.0, "Low risk")], "High risk of poor outcome");

const SOFA_BANDS: BandTable = BandTable::ascending(
    &[
        (6.0, "Mortality < 10%"),
        (9.0, "Mortality 15-20%"),
        (12.0, "Mortality 40-50%"),
        (14.0, "Mortality 50-60%"),
    ],
    "Mortality > 80%",
);

const NEWS2_BANDS: BandTable = BandTable::ascending(
    &[(4.0, "Low clinical risk"), (6.0, "Medium clinical risk (urgent review)")],
    "High clinical risk (emergency response)",
);

const WELLS_PE_BANDS: BandTable = BandTable::ascending(&[(4.0, "PE unlikely")], "PE likely");

const WELLS_DVT_BANDS: BandTable = BandTable::ascending(
    &[(0.0, "Low probability"), (2.0, "Moderate probability")],
    "High probability",
);

const SLEDAI_BANDS: BandTable = BandTable::ascending(
    &[
        (0.0, "No activity"),
        (5.0, "Mild activity"),
        (10.0, "Moderate activity"),
        (19.0, "High activity"),
    ],
    "Very high activity",
);

const FRAIL_BANDS: BandTable = BandTable::ascending(&[(0.0, "Robust"), (2.0, "Pre-frail")], "Frail");

const PRISMA7_BANDS: BandTable =
    BandTable::ascending(&[(2.0, "Frailty unlikely")], "Increased risk of frailty");

const VASOPRESSOR_OPTIONS: &[SelectOption] = &[
    SelectOption::new("none", "None"),
    SelectOption::new("low", "Dopamine ≤ 5 or any dobutamine"),
    SelectOption::new("moderate", "Dopamine > 5 or (nor)epinephrine ≤ 0.1"),
    SelectOption::new("high", "Dopamine > 15 or (nor)epinephrine > 0.1"),
];

fn respiratory_rate() -> CalculatorInput {
    CalculatorInput::number("respiratory_rate", "Respiratory rate").fixed("/min").range(4.0, 60.0)
}

fn heart_rate() -> CalculatorInput {
    CalculatorInput::number("heart_rate", "Heart rate").fixed("bpm").range(20.0, 250.0)
}

fn checklist_inputs(items: &'static [ChecklistItem]) -> impl Iterator<Item = CalculatorInput> {
    items.iter().map(|&(id, label, _)| CalculatorInput::boolean(id, label))
}

/// Ids of the ticked checklist items
fn ticked(i: &NormalizedInputs, items: &'static [ChecklistItem]) -> CalcResult<Vec<&'static str>> {
    let mut present = Vec::new();
    for &(id, _, _) in items {
        if i.flag(id)? {
            present.push(id);
        }
    }
    Ok(present)
}

fn slicc_category(classified: f64) -> &'static str {
    if classified >= 1.0 {
        "Classified as SLE"
    } else {
        "Classification criteria not met"
    }
}

fn compute_curb65(i: &NormalizedInputs) -> CalcResult<Output> {
    let findings = Curb65 {
        confusion: i.flag("confusion")?,
        bun: i.number("bun")?,
        respiratory_rate: i.number("respiratory_rate")?,
        systolic_bp: i.number("systolic_bp")?,
        diastolic_bp: i.number("diastolic_bp")?,
        age: i.number("age")?,
    };
    Ok(Output::Scalar(f64::from(findings.score())))
}

fn compute_qsofa(i: &NormalizedInputs) -> CalcResult<Output> {
    let findings = Qsofa {
        respiratory_rate: i.number("respiratory_rate")?,
        altered_mentation: i.flag("altered_mentation")?,
        systolic_bp: i.number("systolic_bp")?,
    };
    Ok(Output::Scalar(f64::from(findings.score())))
}

fn compute_sofa(i: &NormalizedInputs) -> CalcResult<Output> {
    let code = i.choice("vasopressors")?;
    let vasopressors = Vasopressors::from_code(code)
        .ok_or_else(|| CalcError::invalid_input("vasopressors", code, "Unknown vasopressor tier"))?;
    let findings = Sofa {
        pao2_fio2: i.number("pao2_fio2")?,
        mechanical_ventilation: i.flag("mechanical_ventilation")?,
        platelets: i.number("platelets")?,
        bilirubin: i.number("bilirubin")?,
        map: i.number("map")?,
        vasopressors,
        gcs: i.number("gcs")?,
        creatinine: i.number("creatinine")?,
        urine_output: i.optional_number("urine_output")?,
    };
    Ok(Output::Scalar(f64::from(findings.score())))
}

fn compute_news2(i: &NormalizedInputs) -> CalcResult<Output> {
    let observations = News2 {
        respiratory_rate: i.number("respiratory_rate")?,
        spo2: i.number("spo2")?,
        supplemental_oxygen: i.flag("supplemental_oxygen")?,
        temperature: i.number("temperature")?,
        systolic_bp: i.number("systolic_bp")?,
        heart_rate: i.number("heart_rate")?,
        not_alert: i.flag("not_alert")?,
    };
    Ok(Output::Scalar(f64::from(observations.score())))
}

fn compute_wells_pe(i: &NormalizedInputs) -> CalcResult<Output> {
    let criteria = WellsPe {
        dvt_signs: i.flag("dvt_signs")?,
        pe_most_likely: i.flag("pe_most_likely")?,
        heart_rate_over_100: i.flag("heart_rate_over_100")?,
        immobilization_or_surgery: i.flag("immobilization_or_surgery")?,
        previous_vte: i.flag("previous_vte")?,
        hemoptysis: i.flag("hemoptysis")?,
        malignancy: i.flag("malignancy")?,
    };
    Ok(Output::Scalar(criteria.score()))
}

fn compute_wells_dvt(i: &NormalizedInputs) -> CalcResult<Output> {
    let criteria = WellsDvt {
        active_cancer: i.flag("active_cancer")?,
        paralysis_or_cast: i.flag("paralysis_or_cast")?,
        bedridden_or_surgery: i.flag("bedridden_or_surgery")?,
        localized_tenderness: i.flag("localized_tenderness")?,
        entire_leg_swollen: i.flag("entire_leg_swollen")?,
        calf_swelling: i.flag("calf_swelling")?,
        pitting_edema: i.flag("pitting_edema")?,
        collateral_veins: i.flag("collateral_veins")?,
        previous_dvt: i.flag("previous_dvt")?,
        alternative_diagnosis_likely: i.flag("alternative_diagnosis_likely")?,
    };
    Ok(Output::Scalar(f64::from(criteria.score())))
}

fn compute_sledai(i: &NormalizedInputs) -> CalcResult<Output> {
    let present = ticked(i, SLEDAI_ITEMS)?;
    Ok(Output::Scalar(f64::from(scores::sledai_2k(present))))
}

fn compute_slicc(i: &NormalizedInputs) -> CalcResult<Output> {
    let clinical = ticked(i, SLICC_CLINICAL)?;
    let immunologic = ticked(i, SLICC_IMMUNOLOGIC)?;
    let result = scores::slicc_2012(&clinical, &immunologic, i.flag("biopsy_nephritis")?);
    Ok(Output::Record(
        ResultRecord::new("classified")
            .field("clinical", "Clinical criteria", Some(f64::from(result.clinical)), "")
            .field("immunologic", "Immunologic criteria", Some(f64::from(result.immunologic)), "")
            .field("total", "Total criteria", Some(f64::from(result.total)), "")
            .field("classified", "Classified as SLE", Some(if result.classified { 1.0 } else { 0.0 }), ""),
    ))
}

fn compute_frail(i: &NormalizedInputs) -> CalcResult<Output> {
    let answers = Frail {
        fatigue: i.flag("fatigue")?,
        resistance: i.flag("resistance")?,
        ambulation: i.flag("ambulation")?,
        illnesses: i.flag("illnesses")?,
        loss_of_weight: i.flag("loss_of_weight")?,
    };
    Ok(Output::Scalar(f64::from(answers.score())))
}

fn compute_prisma7(i: &NormalizedInputs) -> CalcResult<Output> {
    let answers = Prisma7 {
        older_than_85: i.flag("older_than_85")?,
        male: i.flag("male")?,
        health_limits_activities: i.flag("health_limits_activities")?,
        needs_regular_help: i.flag("needs_regular_help")?,
        health_keeps_at_home: i.flag("health_keeps_at_home")?,
        no_one_to_count_on: i.flag("no_one_to_count_on")?,
        uses_mobility_aid: i.flag("uses_mobility_aid")?,
    };
    Ok(Output::Scalar(f64::from(answers.score())))
}

pub(super) fn calculators() -> Vec<Calculator> {
    use CalculatorCategory::{CriticalCare, Geriatrics, Rheumatology};

    vec![
        Calculator::new("curb65", "CURB-65", CriticalCare, compute_curb65)
            .description("Community-acquired pneumonia severity")
            .formula("Confusion + BUN > 19 mg/dL + RR ≥ 30 + (SBP < 90 or DBP ≤ 60) + age ≥ 65")
            .inputs([
                CalculatorInput::boolean("confusion", "New confusion"),
                CalculatorInput::number("bun", "Blood urea nitrogen")
                    .unit(&UREA_NITROGEN)
                    .range(2.0, 200.0),
                respiratory_rate(),
                mmhg("systolic_bp", "Systolic blood pressure", 40.0, 260.0),
                mmhg("diastolic_bp", "Diastolic blood pressure", 20.0, 160.0),
                age(),
            ])
            .result("points", 0)
            .bands(CURB65_BANDS)
            .reference(LiteratureReference::new(
                "Lim WS et al.",
                "Defining community acquired pneumonia severity on presentation to hospital: an international derivation and validation study",
                "Thorax",
                2003,
            )),
        Calculator::new("qsofa", "qSOFA", CriticalCare, compute_qsofa)
            .description("Bedside screen for sepsis-related poor outcome outside the ICU")
            .formula("RR ≥ 22 + altered mentation + SBP ≤ 100")
            .inputs([
                respiratory_rate(),
                CalculatorInput::boolean("altered_mentation", "Altered mentation (GCS < 15)"),
                mmhg("systolic_bp", "Systolic blood pressure", 40.0, 260.0),
            ])
            .result("points", 0)
            .bands(QSOFA_BANDS)
            .reference(LiteratureReference::new(
                "Seymour CW et al.",
                "Assessment of clinical criteria for sepsis: for the Third International Consensus Definitions for Sepsis and Septic Shock (Sepsis-3)",
                "JAMA",
                2016,
            )),
        Calculator::new("sofa", "SOFA", CriticalCare, compute_sofa)
            .description("Sequential organ failure assessment across six organ systems")
            .formula("Sum of respiration, coagulation, liver, cardiovascular, CNS and renal subscores (0-4 each)")
            .inputs([
                mmhg("pao2_fio2", "PaO2 / FiO2", 20.0, 700.0),
                CalculatorInput::boolean("mechanical_ventilation", "Mechanically ventilated"),
                CalculatorInput::number("platelets", "Platelets").fixed("×10³/µL").range(1.0, 1000.0),
                CalculatorInput::number("bilirubin", "Bilirubin").unit(&BILIRUBIN).range(0.1, 50.0),
                mmhg("map", "Mean arterial pressure", 20.0, 200.0),
                CalculatorInput::select("vasopressors", "Vasopressors (µg/kg/min)", VASOPRESSOR_OPTIONS)
                    .default_value("none"),
                CalculatorInput::number("gcs", "Glasgow Coma Scale").range(3.0, 15.0),
                creatinine(),
                CalculatorInput::number("urine_output", "Urine output")
                    .fixed("mL/day")
                    .range(0.0, 10000.0)
                    .optional(),
            ])
            .result("points", 0)
            .bands(SOFA_BANDS)
            .reference(LiteratureReference::new(
                "Vincent JL et al.",
                "The SOFA (Sepsis-related Organ Failure Assessment) score to describe organ dysfunction/failure",
                "Intensive Care Med",
                1996,
            )),
        Calculator::new("news2", "NEWS2", CriticalCare, compute_news2)
            .description("National Early Warning Score 2 (SpO2 scale 1)")
            .formula("Sum of aggregate-weighted physiological parameters")
            .inputs([
                respiratory_rate(),
                CalculatorInput::number("spo2", "SpO2").fixed("%").range(50.0, 100.0),
                CalculatorInput::boolean("supplemental_oxygen", "On supplemental oxygen"),
                CalculatorInput::number("temperature", "Temperature").fixed("°C").range(30.0, 44.0),
                mmhg("systolic_bp", "Systolic blood pressure", 40.0, 260.0),
                heart_rate(),
                CalculatorInput::boolean("not_alert", "New confusion or not alert (CVPU)"),
            ])
            .result("points", 0)
            .bands(NEWS2_BANDS)
            .reference(LiteratureReference::new(
                "Royal College of Physicians",
                "National Early Warning Score (NEWS) 2: standardising the assessment of acute-illness severity in the NHS",
                "RCP London",
                2017,
            )),
        Calculator::new("wells_pe", "Wells score for PE", CriticalCare, compute_wells_pe)
            .description("Pretest probability of pulmonary embolism (two-tier)")
            .formula("DVT signs 3 + PE most likely 3 + HR > 100 1.5 + immobilization 1.5 + prior VTE 1.5 + hemoptysis 1 + malignancy 1")
            .inputs([
                CalculatorInput::boolean("dvt_signs", "Clinical signs of DVT"),
                CalculatorInput::boolean("pe_most_likely", "PE is the most likely diagnosis"),
                CalculatorInput::boolean("heart_rate_over_100", "Heart rate > 100"),
                CalculatorInput::boolean("immobilization_or_surgery", "Immobilization or surgery in past 4 weeks"),
                CalculatorInput::boolean("previous_vte", "Previous DVT or PE"),
                CalculatorInput::boolean("hemoptysis", "Hemoptysis"),
                CalculatorInput::boolean("malignancy", "Malignancy"),
            ])
            .result("points", 1)
            .bands(WELLS_PE_BANDS)
            .reference(LiteratureReference::new(
                "Wells PS et al.",
                "Derivation of a simple clinical model to categorize patients probability of pulmonary embolism",
                "Thromb Haemost",
                2000,
            )),
        Calculator::new("wells_dvt", "Wells score for DVT", CriticalCare, compute_wells_dvt)
            .description("Pretest probability of deep vein thrombosis (three-tier)")
            .formula("One point per criterion; -2 when an alternative diagnosis is at least as likely")
            .inputs([
                CalculatorInput::boolean("active_cancer", "Active cancer"),
                CalculatorInput::boolean("paralysis_or_cast", "Paralysis, paresis or recent cast"),
                CalculatorInput::boolean("bedridden_or_surgery", "Bedridden > 3 days or major surgery"),
                CalculatorInput::boolean("localized_tenderness", "Tenderness along deep veins"),
                CalculatorInput::boolean("entire_leg_swollen", "Entire leg swollen"),
                CalculatorInput::boolean("calf_swelling", "Calf swelling > 3 cm"),
                CalculatorInput::boolean("pitting_edema", "Pitting edema in symptomatic leg"),
                CalculatorInput::boolean("collateral_veins", "Collateral superficial veins"),
                CalculatorInput::boolean("previous_dvt", "Previously documented DVT"),
                CalculatorInput::boolean("alternative_diagnosis_likely", "Alternative diagnosis as likely"),
            ])
            .result("points", 0)
            .bands(WELLS_DVT_BANDS)
            .reference(LiteratureReference::new(
                "Wells PS et al.",
                "Value of assessment of pretest probability of deep-vein thrombosis in clinical management",
                "Lancet",
                1997,
            )),
        Calculator::new("sledai_2k", "SLEDAI-2K", Rheumatology, compute_sledai)
            .description("Lupus disease activity over the previous 10 days")
            .formula("Weighted sum of 24 descriptors (8, 4, 2 or 1 points each)")
            .inputs(checklist_inputs(SLEDAI_ITEMS))
            .result("points", 0)
            .bands(SLEDAI_BANDS)
            .reference(LiteratureReference::new(
                "Gladman DD, Ibañez D, Urowitz MB",
                "Systemic lupus erythematosus disease activity index 2000",
                "J Rheumatol",
                2002,
            )),
        Calculator::new("slicc_2012", "SLICC 2012 SLE classification", Rheumatology, compute_slicc)
            .description("≥ 4 criteria with ≥ 1 clinical and ≥ 1 immunologic, or biopsy-proven nephritis with ANA or anti-dsDNA")
            .formula("Count of 11 clinical and 6 immunologic criteria")
            .inputs(checklist_inputs(SLICC_CLINICAL))
            .inputs(checklist_inputs(SLICC_IMMUNOLOGIC))
            .input(CalculatorInput::boolean("biopsy_nephritis", "Biopsy-proven lupus nephritis"))
            .result("", 0)
            .primary("classified")
            .custom(
                slicc_category,
                vec![
                    range("Classification criteria not met", Some(0.0), Some(0.0), ""),
                    range("Classified as SLE", Some(1.0), Some(1.0), ""),
                ],
            )
            .reference(LiteratureReference::new(
                "Petri M et al.",
                "Derivation and validation of the Systemic Lupus International Collaborating Clinics classification criteria for systemic lupus erythematosus",
                "Arthritis Rheum",
                2012,
            )),
        Calculator::new("frail", "FRAIL scale", Geriatrics, compute_frail)
            .description("Five-question frailty screen")
            .formula("Fatigue + Resistance + Ambulation + Illnesses + Loss of weight")
            .inputs([
                CalculatorInput::boolean("fatigue", "Fatigue most or all of the time"),
                CalculatorInput::boolean("resistance", "Difficulty climbing one flight of stairs"),
                CalculatorInput::boolean("ambulation", "Difficulty walking one block"),
                CalculatorInput::boolean("illnesses", "Five or more illnesses"),
                CalculatorInput::boolean("loss_of_weight", "Weight loss > 5% in the past year"),
            ])
            .result("points", 0)
            .bands(FRAIL_BANDS)
            .reference(LiteratureReference::new(
                "Morley JE, Malmstrom TK, Miller DK",
                "A simple frailty questionnaire (FRAIL) predicts outcomes in middle aged African Americans",
                "J Nutr Health Aging",
                2012,
            )),
        Calculator::new("prisma7", "PRISMA-7", Geriatrics, compute_prisma7)
            .description("Seven-item screen for moderate to severe disability")
            .formula("One point per positive answer; ≥ 3 suggests frailty")
            .inputs([
                CalculatorInput::boolean("older_than_85", "Older than 85"),
                CalculatorInput::boolean("male", "Male"),
                CalculatorInput::boolean("health_limits_activities", "Health problems limit activities"),
                CalculatorInput::boolean("needs_regular_help", "Needs someone to help on a regular basis"),
                CalculatorInput::boolean("health_keeps_at_home", "Health problems require staying at home"),
                CalculatorInput::boolean("no_one_to_count_on", "No one close to count on when needed"),
                CalculatorInput::boolean("uses_mobility_aid", "Regularly uses a stick, walker or wheelchair"),
            ])
            .result("points", 0)
            .bands(PRISMA7_BANDS)
            .reference(LiteratureReference::new(
                "Raîche M, Hébert R, Dubois MF",
                "PRISMA-7: a case-finding tool to identify older adults with moderate to severe disabilities",
                "Arch Gerontol Geriatr",
                2008,
            )),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sledai_from_flags() {
        let inputs = NormalizedInputs::new()
            .with("seizure", true)
            .with("proteinuria", true)
            .with("fever", true)
            .with("rash", false);
        assert_eq!(compute_sledai(&inputs).unwrap(), Output::Scalar(13.0));
        assert_eq!(SLEDAI_BANDS.classify(13.0), "High activity");
    }

    #[test]
    fn test_slicc_record() {
        let inputs = NormalizedInputs::new()
            .with("biopsy_nephritis", true)
            .with("anti_dsdna", true);
        let output = compute_slicc(&inputs).unwrap();
        assert_eq!(output.primary_scalar(), Some(1.0));
        assert_eq!(slicc_category(1.0), "Classified as SLE");
        assert_eq!(slicc_category(0.0), "Classification criteria not met");
    }

    #[test]
    fn test_sofa_rejects_unknown_vasopressor_tier() {
        let inputs = NormalizedInputs::new()
            .with("pao2_fio2", 450.0)
            .with("platelets", 200.0)
            .with("bilirubin", 1.0)
            .with("map", 75.0)
            .with("vasopressors", "extreme")
            .with("gcs", 15.0)
            .with("creatinine", 1.0);
        assert!(matches!(compute_sofa(&inputs), Err(CalcError::InvalidInput { .. })));

        let ok = inputs.with("vasopressors", "none");
        assert_eq!(compute_sofa(&ok).unwrap(), Output::Scalar(0.0));
    }

    #[test]
    fn test_wells_dvt_can_be_negative() {
        let inputs = NormalizedInputs::new().with("alternative_diagnosis_likely", true);
        assert_eq!(compute_wells_dvt(&inputs).unwrap(), Output::Scalar(-2.0));
        assert_eq!(WELLS_DVT_BANDS.classify(-2.0), "Low probability");
    }

    #[test]
    fn test_curb65_bun_threshold() {
        let base = NormalizedInputs::new()
            .with("respiratory_rate", 18.0)
            .with("systolic_bp", 120.0)
            .with("diastolic_bp", 80.0)
            .with("age", 50.0);
        assert_eq!(compute_curb65(&base.clone().with("bun", 19.0)).unwrap(), Output::Scalar(0.0));
        assert_eq!(compute_curb65(&base.with("bun", 20.0)).unwrap(), Output::Scalar(1.0));
    }
}
