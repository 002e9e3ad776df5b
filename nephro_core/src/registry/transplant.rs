//! Transplant calculators: KDPI, EPTS and the Banff biopsy classifier.

use super::common::{height, range, weight};
use super::{Calculator, CalculatorCategory, CalculatorInput, LiteratureReference, SelectOption};
use crate::errors::CalcResult;
use crate::formulas::transplant::{self, BanffCategory, BanffScores, Candidate, Donor};
use crate::inputs::NormalizedInputs;
use crate::interpretation::BandTable;
use crate::optn::{self, OptnTables};
use crate::outputs::{Output, ResultRecord};
use crate::units::CREATININE;

const KDPI_BANDS: BandTable = BandTable::descending(
    &[(86.0, "High (KDPI > 85%)"), (21.0, "Intermediate (KDPI 21-85%)")],
    "Low (KDPI ≤ 20%)",
);

const EPTS_BANDS: BandTable = BandTable::ascending(
    &[(20.0, "Top 20% expected longevity (longevity matching priority)")],
    "EPTS above 20%",
);

const BANFF_GRADES: &[SelectOption] = &[
    SelectOption::new("0", "0"),
    SelectOption::new("1", "1"),
    SelectOption::new("2", "2"),
    SelectOption::new("3", "3"),
];

/// (input id, label) for every Banff lesion score
const BANFF_LESIONS: [(&str, &str); 10] = [
    ("i", "i - interstitial inflammation"),
    ("t", "t - tubulitis"),
    ("v", "v - intimal arteritis"),
    ("g", "g - glomerulitis"),
    ("ptc", "ptc - peritubular capillaritis"),
    ("ci", "ci - interstitial fibrosis"),
    ("ct", "ct - tubular atrophy"),
    ("cv", "cv - arterial fibrous intimal thickening"),
    ("cg", "cg - transplant glomerulopathy"),
    ("c4d", "c4d - peritubular capillary C4d"),
];

const OPTN_KDPI_GUIDE: LiteratureReference = LiteratureReference::new(
    "OPTN / SRTR",
    "A guide to calculating and interpreting the Kidney Donor Profile Index (KDPI)",
    "Organ Procurement and Transplantation Network",
    2024,
);

fn donor_flag(id: &'static str, label: &'static str) -> CalculatorInput {
    CalculatorInput::boolean(id, label)
}

fn banff_category(rank: f64) -> &'static str {
    let rank = rank.round();
    if !(0.0..=f64::from(u8::MAX)).contains(&rank) {
        return "Unclassified";
    }
    BanffCategory::from_rank(rank as u8)
        .map(BanffCategory::display_name)
        .unwrap_or("Unclassified")
}

fn table_year(year: Option<u16>) -> Option<f64> {
    year.map(f64::from)
}

fn compute_kdpi(i: &NormalizedInputs) -> CalcResult<Output> {
    let donor = Donor {
        age: i.number("age")?,
        height_cm: i.number("height")?,
        weight_kg: i.number("weight")?,
        african_american: i.flag("african_american")?,
        hypertension: i.flag("hypertension")?,
        diabetes: i.flag("diabetes")?,
        cva_death: i.flag("cva_death")?,
        creatinine: i.number("creatinine")?,
        hcv_positive: i.flag("hcv_positive")?,
        dcd: i.flag("dcd")?,
    };
    let tables = optn::current();
    Ok(kdpi_output(&donor, tables.as_deref()))
}

fn kdpi_output(donor: &Donor, tables: Option<&OptnTables>) -> Output {
    match transplant::kdpi(donor, tables) {
        Some(result) => Output::Record(
            ResultRecord::new("kdpi")
                .field("kdri_rao", "KDRI (Rao)", Some(result.kdri_rao), "")
                .field("kdri_median", "KDRI (median-scaled)", result.kdri_median, "")
                .field("kdpi", "KDPI", result.kdpi, "%")
                .field("table_year", "OPTN mapping table year", table_year(result.table_year), ""),
        ),
        None => Output::undefined("donor risk index is not a number"),
    }
}

fn compute_epts(i: &NormalizedInputs) -> CalcResult<Output> {
    let dialysis_years = if i.flag("on_dialysis")? {
        Some(i.number("dialysis_years")?)
    } else {
        None
    };
    let candidate = Candidate {
        age: i.number("age")?,
        diabetes: i.flag("diabetes")?,
        prior_transplant: i.flag("prior_transplant")?,
        dialysis_years,
    };
    let tables = optn::current();
    Ok(epts_output(&candidate, tables.as_deref()))
}

fn epts_output(candidate: &Candidate, tables: Option<&OptnTables>) -> Output {
    match transplant::epts(candidate, tables) {
        Some(result) => Output::Record(
            ResultRecord::new("epts")
                .field("raw_score", "Raw EPTS score", Some(result.raw_score), "")
                .field("epts", "EPTS", result.epts, "%")
                .field("table_year", "OPTN mapping table year", table_year(result.table_year), ""),
        ),
        None => Output::undefined("time on dialysis must not be negative"),
    }
}

fn compute_banff(i: &NormalizedInputs) -> CalcResult<Output> {
    let scores = BanffScores {
        i: i.ordinal("i")?,
        t: i.ordinal("t")?,
        v: i.ordinal("v")?,
        g: i.ordinal("g")?,
        ptc: i.ordinal("ptc")?,
        ci: i.ordinal("ci")?,
        ct: i.ordinal("ct")?,
        cv: i.ordinal("cv")?,
        cg: i.ordinal("cg")?,
        c4d: i.ordinal("c4d")?,
        dsa: i.flag("dsa")?,
    };
    Ok(Output::Banff(transplant::classify_banff(&scores)))
}

fn banff_inputs() -> Vec<CalculatorInput> {
    let mut inputs: Vec<CalculatorInput> = BANFF_LESIONS
        .iter()
        .map(|&(id, label)| CalculatorInput::select(id, label, BANFF_GRADES).default_value("0"))
        .collect();
    inputs.push(CalculatorInput::boolean("dsa", "Donor-specific antibodies present"));
    inputs
}

fn banff_ranges() -> Vec<crate::interpretation::ReferenceRange> {
    (0..=5u8)
        .rev()
        .filter_map(BanffCategory::from_rank)
        .map(|category| {
            let rank = f64::from(category.rank());
            range(category.display_name(), Some(rank), Some(rank), "rank")
        })
        .collect()
}

pub(super) fn calculators() -> Vec<Calculator> {
    use CalculatorCategory::Transplant;

    vec![
        Calculator::new("kdpi", "Kidney Donor Profile Index", Transplant, compute_kdpi)
            .description("Deceased donor kidney quality relative to last year's donors (higher is worse)")
            .formula("KDRI_rao = e^xβ (Rao 2009); KDRI_median = KDRI_rao / scaling factor; KDPI = percentile(KDRI_median) in the OPTN mapping table")
            .inputs([
                CalculatorInput::number("age", "Donor age").fixed("years").range(0.0, 90.0),
                height().range(50.0, 230.0),
                weight().range(5.0, 250.0),
                donor_flag("african_american", "African American donor"),
                donor_flag("hypertension", "History of hypertension"),
                donor_flag("diabetes", "History of diabetes"),
                donor_flag("cva_death", "Cause of death: cerebrovascular"),
                CalculatorInput::number("creatinine", "Terminal serum creatinine")
                    .unit(&CREATININE)
                    .range(0.1, 15.0)
                    .help("Values above 8 mg/dL are capped at 8"),
                donor_flag("hcv_positive", "HCV positive"),
                donor_flag("dcd", "Donation after circulatory death"),
            ])
            .result("", 2)
            .primary("kdpi")
            .bands(KDPI_BANDS)
            .reference(LiteratureReference::new(
                "Rao PS et al.",
                "A comprehensive risk quantification score for deceased donor kidneys: the kidney donor risk index",
                "Transplantation",
                2009,
            ))
            .reference(OPTN_KDPI_GUIDE),
        Calculator::new("epts", "Estimated Post-Transplant Survival", Transplant, compute_epts)
            .description("Expected longevity of an adult kidney transplant candidate (lower is better)")
            .formula("0.047 × max(age - 25, 0) - 0.015 × DM × max(age - 25, 0) + 0.398 × prior tx - 0.237 × DM × prior tx + 0.315 × ln(years + 1) - 0.099 × DM × ln(years + 1) + 0.130 × no dialysis - 0.348 × DM × no dialysis + 1.262 × DM")
            .inputs([
                CalculatorInput::number("age", "Candidate age").fixed("years").range(18.0, 100.0),
                CalculatorInput::boolean("diabetes", "Diabetes"),
                CalculatorInput::boolean("prior_transplant", "Prior solid organ transplant"),
                CalculatorInput::boolean("on_dialysis", "On dialysis"),
                CalculatorInput::number("dialysis_years", "Years on dialysis")
                    .fixed("years")
                    .range(0.0, 40.0)
                    .default_value(0.0)
                    .help("Ignored unless the candidate is on dialysis"),
            ])
            .result("", 2)
            .primary("epts")
            .bands(EPTS_BANDS)
            .reference(LiteratureReference::new(
                "OPTN / SRTR",
                "A guide to calculating and interpreting the Estimated Post-Transplant Survival (EPTS) score",
                "Organ Procurement and Transplantation Network",
                2024,
            )),
        Calculator::new("banff", "Banff classification", Transplant, compute_banff)
            .description("Kidney allograft biopsy diagnosis from Banff lesion scores")
            .formula("Ordered criteria: ABMR, TCMR, borderline, IF/TA, other, normal (first match wins)")
            .inputs(banff_inputs())
            .result("", 0)
            .custom(banff_category, banff_ranges())
            .reference(LiteratureReference::new(
                "Loupy A et al.",
                "The Banff 2019 Kidney Meeting Report (I): updates on and clarification of criteria for T cell- and antibody-mediated rejection",
                "Am J Transplant",
                2020,
            )),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optn::test_tables;

    fn reference_donor() -> Donor {
        Donor {
            age: 40.0,
            height_cm: 170.0,
            weight_kg: 80.0,
            african_american: false,
            hypertension: false,
            diabetes: false,
            cva_death: false,
            creatinine: 1.0,
            hcv_positive: false,
            dcd: false,
        }
    }

    #[test]
    fn test_kdpi_record_for_reference_donor() {
        let tables = test_tables();
        match kdpi_output(&reference_donor(), Some(&tables)) {
            Output::Record(record) => {
                assert_eq!(record.primary, "kdpi");
                assert_eq!(record.get("kdpi"), Some(20.0));
                assert_eq!(record.get("kdri_median"), Some(0.8));
                assert_eq!(record.get("table_year"), Some(2024.0));
                assert!((record.get("kdri_rao").unwrap() - 1.0).abs() < 1e-12);
            }
            other => panic!("expected record, got {:?}", other),
        }
    }

    #[test]
    fn test_kdpi_without_tables_reports_kdri_only() {
        let output = kdpi_output(&reference_donor(), None);
        assert!(output.is_undefined());
        match output {
            Output::Record(record) => {
                assert_eq!(record.get("kdpi"), None);
                assert_eq!(record.get("table_year"), None);
                assert!((record.get("kdri_rao").unwrap() - 1.0).abs() < 1e-12);
            }
            other => panic!("expected record, got {:?}", other),
        }
    }

    #[test]
    fn test_kdpi_reads_donor_inputs() {
        let inputs = NormalizedInputs::new()
            .with("age", 40.0)
            .with("height", 170.0)
            .with("weight", 80.0)
            .with("creatinine", 1.0);
        let output = compute_kdpi(&inputs).unwrap();
        match output {
            Output::Record(record) => assert!((record.get("kdri_rao").unwrap() - 1.0).abs() < 1e-12),
            other => panic!("expected record, got {:?}", other),
        }
    }

    #[test]
    fn test_epts_ignores_years_when_not_on_dialysis() {
        let raw_score = |output: Output| match output {
            Output::Record(record) => record.get("raw_score").unwrap(),
            other => panic!("expected record, got {:?}", other),
        };
        let base = NormalizedInputs::new().with("age", 25.0).with("dialysis_years", 10.0);
        assert!((raw_score(compute_epts(&base).unwrap()) - 0.13).abs() < 1e-12);
        assert!(raw_score(compute_epts(&base.with("on_dialysis", true)).unwrap()) > 0.13);
    }

    #[test]
    fn test_epts_percentile_from_tables() {
        let preemptive = Candidate {
            age: 25.0,
            diabetes: false,
            prior_transplant: false,
            dialysis_years: None,
        };
        let output = epts_output(&preemptive, Some(&test_tables()));
        // raw 0.13, 0.13 × 32 = 4.16
        assert_eq!(output.primary_scalar(), Some(5.0));

        let output = epts_output(&preemptive, None);
        assert!(output.is_undefined());
        assert!(matches!(output, Output::Record(_)));
    }

    #[test]
    fn test_banff_category_rejects_out_of_range_rank() {
        assert_eq!(banff_category(-1.0), "Unclassified");
        assert_eq!(banff_category(-0.4), "Normal");
        assert_eq!(banff_category(f64::NAN), "Unclassified");
        assert_eq!(banff_category(f64::INFINITY), "Unclassified");
        assert_eq!(banff_category(300.0), "Unclassified");
        assert_eq!(banff_category(4.6), "Antibody-mediated rejection");
    }

    #[test]
    fn test_banff_output_and_rank() {
        let inputs = NormalizedInputs::new()
            .with("i", "2")
            .with("t", "2")
            .with("v", "0")
            .with("g", "0")
            .with("ptc", "0")
            .with("ci", "0")
            .with("ct", "0")
            .with("cv", "0")
            .with("cg", "0")
            .with("c4d", "0");
        let output = compute_banff(&inputs).unwrap();
        match &output {
            Output::Banff(result) => assert_eq!(result.subtype, "Grade IA"),
            other => panic!("expected Banff output, got {:?}", other),
        }
        assert_eq!(output.primary_scalar(), Some(4.0));
        assert_eq!(banff_category(4.0), "T-cell-mediated rejection");
        assert_eq!(banff_category(0.0), "Normal");
        assert_eq!(banff_category(9.0), "Unclassified");
    }

    #[test]
    fn test_banff_ranges_cover_every_category() {
        let ranges = banff_ranges();
        assert_eq!(ranges.len(), 6);
        assert_eq!(ranges[0].label, "Antibody-mediated rejection");
        assert_eq!(ranges[0].describe(), "5");
    }
}
