//! # Clinical Scores
//!
//! Point-based scores and checklists: pneumonia severity (CURB-65), sepsis
//! (qSOFA, SOFA), early warning (NEWS2), venous thromboembolism (Wells PE
//! and DVT), lupus activity and classification (SLEDAI-2K, SLICC 2012) and
//! frailty screens (FRAIL, PRISMA-7).
//!
//! Every item carries a fixed point value. Totals are exact integers
//! (Wells PE uses half points), so no rounding is involved.

use serde::{Deserialize, Serialize};

#[inline]
fn points(present: bool, value: u32) -> u32 {
    if present {
        value
    } else {
        0
    }
}

// ============================================================================
// Critical care
// ============================================================================

/// CURB-65 findings.
///
/// The urea criterion uses BUN > 19 mg/dL (urea > 7 mmol/L).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Curb65 {
    pub confusion: bool,
    /// BUN (mg/dL)
    pub bun: f64,
    pub respiratory_rate: f64,
    pub systolic_bp: f64,
    pub diastolic_bp: f64,
    pub age: f64,
}

impl Curb65 {
    pub fn score(&self) -> u32 {
        points(self.confusion, 1)
            + points(self.bun > 19.0, 1)
            + points(self.respiratory_rate >= 30.0, 1)
            + points(self.systolic_bp < 90.0 || self.diastolic_bp <= 60.0, 1)
            + points(self.age >= 65.0, 1)
    }
}

/// Quick SOFA.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Qsofa {
    pub respiratory_rate: f64,
    pub altered_mentation: bool,
    pub systolic_bp: f64,
}

impl Qsofa {
    pub fn score(&self) -> u32 {
        points(self.respiratory_rate >= 22.0, 1) + points(self.altered_mentation, 1) + points(self.systolic_bp <= 100.0, 1)
    }
}

/// Vasoactive support tier for the SOFA cardiovascular component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Vasopressors {
    None,
    /// Dopamine ≤ 5 µg/kg/min or any dobutamine
    Low,
    /// Dopamine > 5, or epinephrine / norepinephrine ≤ 0.1 µg/kg/min
    Moderate,
    /// Dopamine > 15, or epinephrine / norepinephrine > 0.1 µg/kg/min
    High,
}

impl Vasopressors {
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "none" => Some(Vasopressors::None),
            "low" => Some(Vasopressors::Low),
            "moderate" => Some(Vasopressors::Moderate),
            "high" => Some(Vasopressors::High),
            _ => None,
        }
    }
}

/// Sequential Organ Failure Assessment inputs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sofa {
    /// PaO2 / FiO2 (mmHg)
    pub pao2_fio2: f64,
    pub mechanical_ventilation: bool,
    /// Platelets (×10³/µL)
    pub platelets: f64,
    /// Bilirubin (mg/dL)
    pub bilirubin: f64,
    /// Mean arterial pressure (mmHg)
    pub map: f64,
    pub vasopressors: Vasopressors,
    pub gcs: f64,
    /// Creatinine (mg/dL)
    pub creatinine: f64,
    /// Urine output (mL/day), when measured
    pub urine_output: Option<f64>,
}

impl Sofa {
    pub fn respiration(&self) -> u32 {
        let p = self.pao2_fio2;
        let unsupported = match p {
            p if p < 300.0 => 2,
            p if p < 400.0 => 1,
            _ => 0,
        };
        if !self.mechanical_ventilation {
            return unsupported;
        }
        match p {
            p if p < 100.0 => 4,
            p if p < 200.0 => 3,
            _ => unsupported,
        }
    }

    pub fn coagulation(&self) -> u32 {
        match self.platelets {
            p if p < 20.0 => 4,
            p if p < 50.0 => 3,
            p if p < 100.0 => 2,
            p if p < 150.0 => 1,
            _ => 0,
        }
    }

    pub fn liver(&self) -> u32 {
        match self.bilirubin {
            b if b >= 12.0 => 4,
            b if b >= 6.0 => 3,
            b if b >= 2.0 => 2,
            b if b >= 1.2 => 1,
            _ => 0,
        }
    }

    pub fn cardiovascular(&self) -> u32 {
        match self.vasopressors {
            Vasopressors::High => 4,
            Vasopressors::Moderate => 3,
            Vasopressors::Low => 2,
            Vasopressors::None if self.map < 70.0 => 1,
            Vasopressors::None => 0,
        }
    }

    pub fn cns(&self) -> u32 {
        match self.gcs {
            g if g < 6.0 => 4,
            g if g < 10.0 => 3,
            g if g < 13.0 => 2,
            g if g < 15.0 => 1,
            _ => 0,
        }
    }

    /// Worse of the creatinine and urine output criteria.
    pub fn renal(&self) -> u32 {
        let by_creatinine = match self.creatinine {
            c if c >= 5.0 => 4,
            c if c >= 3.5 => 3,
            c if c >= 2.0 => 2,
            c if c >= 1.2 => 1,
            _ => 0,
        };
        let by_urine = match self.urine_output {
            Some(uo) if uo < 200.0 => 4,
            Some(uo) if uo < 500.0 => 3,
            _ => 0,
        };
        by_creatinine.max(by_urine)
    }

    pub fn score(&self) -> u32 {
        self.respiration() + self.coagulation() + self.liver() + self.cardiovascular() + self.cns() + self.renal()
    }
}

/// NEWS2 observations (SpO2 scale 1).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct News2 {
    pub respiratory_rate: f64,
    pub spo2: f64,
    pub supplemental_oxygen: bool,
    /// Temperature (°C)
    pub temperature: f64,
    pub systolic_bp: f64,
    pub heart_rate: f64,
    /// New confusion, or responds only to voice / pain / unresponsive
    pub not_alert: bool,
}

impl News2 {
    pub fn score(&self) -> u32 {
        let rr = match self.respiratory_rate {
            r if r <= 8.0 => 3,
            r if r <= 11.0 => 1,
            r if r <= 20.0 => 0,
            r if r <= 24.0 => 2,
            _ => 3,
        };
        let spo2 = match self.spo2 {
            s if s <= 91.0 => 3,
            s if s <= 93.0 => 2,
            s if s <= 95.0 => 1,
            _ => 0,
        };
        let temperature = match self.temperature {
            t if t <= 35.0 => 3,
            t if t <= 36.0 => 1,
            t if t <= 38.0 => 0,
            t if t <= 39.0 => 1,
            _ => 2,
        };
        let sbp = match self.systolic_bp {
            s if s <= 90.0 => 3,
            s if s <= 100.0 => 2,
            s if s <= 110.0 => 1,
            s if s <= 219.0 => 0,
            _ => 3,
        };
        let hr = match self.heart_rate {
            h if h <= 40.0 => 3,
            h if h <= 50.0 => 1,
            h if h <= 90.0 => 0,
            h if h <= 110.0 => 1,
            h if h <= 130.0 => 2,
            _ => 3,
        };
        rr + spo2 + points(self.supplemental_oxygen, 2) + temperature + sbp + hr + points(self.not_alert, 3)
    }
}

// ============================================================================
// Venous thromboembolism
// ============================================================================

/// Wells criteria for pulmonary embolism.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WellsPe {
    pub dvt_signs: bool,
    pub pe_most_likely: bool,
    pub heart_rate_over_100: bool,
    pub immobilization_or_surgery: bool,
    pub previous_vte: bool,
    pub hemoptysis: bool,
    pub malignancy: bool,
}

impl WellsPe {
    pub fn score(&self) -> f64 {
        let mut score = 0.0;
        if self.dvt_signs {
            score += 3.0;
        }
        if self.pe_most_likely {
            score += 3.0;
        }
        if self.heart_rate_over_100 {
            score += 1.5;
        }
        if self.immobilization_or_surgery {
            score += 1.5;
        }
        if self.previous_vte {
            score += 1.5;
        }
        if self.hemoptysis {
            score += 1.0;
        }
        if self.malignancy {
            score += 1.0;
        }
        score
    }
}

/// Wells criteria for deep vein thrombosis.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WellsDvt {
    pub active_cancer: bool,
    pub paralysis_or_cast: bool,
    pub bedridden_or_surgery: bool,
    pub localized_tenderness: bool,
    pub entire_leg_swollen: bool,
    pub calf_swelling: bool,
    pub pitting_edema: bool,
    pub collateral_veins: bool,
    pub previous_dvt: bool,
    pub alternative_diagnosis_likely: bool,
}

impl WellsDvt {
    pub fn score(&self) -> i32 {
        let positives = [
            self.active_cancer,
            self.paralysis_or_cast,
            self.bedridden_or_surgery,
            self.localized_tenderness,
            self.entire_leg_swollen,
            self.calf_swelling,
            self.pitting_edema,
            self.collateral_veins,
            self.previous_dvt,
        ];
        let base = positives.iter().filter(|&&p| p).count() as i32;
        if self.alternative_diagnosis_likely {
            base - 2
        } else {
            base
        }
    }
}

// ============================================================================
// Lupus
// ============================================================================

/// A weighted checklist item: `(id, label, points)`.
pub type ChecklistItem = (&'static str, &'static str, u32);

/// SLEDAI-2K descriptors, scored when present in the last 10 days.
pub const SLEDAI_ITEMS: &[ChecklistItem] = &[
    ("seizure", "Seizure", 8),
    ("psychosis", "Psychosis", 8),
    ("organic_brain_syndrome", "Organic brain syndrome", 8),
    ("visual_disturbance", "Visual disturbance", 8),
    ("cranial_nerve", "Cranial nerve disorder", 8),
    ("lupus_headache", "Lupus headache", 8),
    ("cva", "Cerebrovascular accident", 8),
    ("vasculitis", "Vasculitis", 8),
    ("arthritis", "Arthritis", 4),
    ("myositis", "Myositis", 4),
    ("urinary_casts", "Urinary casts", 4),
    ("hematuria", "Hematuria", 4),
    ("proteinuria", "Proteinuria", 4),
    ("pyuria", "Pyuria", 4),
    ("rash", "Rash", 2),
    ("alopecia", "Alopecia", 2),
    ("mucosal_ulcers", "Mucosal ulcers", 2),
    ("pleurisy", "Pleurisy", 2),
    ("pericarditis", "Pericarditis", 2),
    ("low_complement", "Low complement", 2),
    ("increased_dna_binding", "Increased DNA binding", 2),
    ("fever", "Fever", 1),
    ("thrombocytopenia", "Thrombocytopenia", 1),
    ("leukopenia", "Leukopenia", 1),
];

/// Sum the SLEDAI-2K points for the descriptors present.
///
/// Unknown ids score nothing.
pub fn sledai_2k<'a>(present: impl IntoIterator<Item = &'a str>) -> u32 {
    present
        .into_iter()
        .filter_map(|id| SLEDAI_ITEMS.iter().find(|(item, _, _)| *item == id))
        .map(|(_, _, weight)| weight)
        .sum()
}

/// SLICC 2012 clinical criteria.
pub const SLICC_CLINICAL: &[ChecklistItem] = &[
    ("acute_cutaneous", "Acute cutaneous lupus", 1),
    ("chronic_cutaneous", "Chronic cutaneous lupus", 1),
    ("oral_ulcers", "Oral or nasal ulcers", 1),
    ("alopecia", "Nonscarring alopecia", 1),
    ("synovitis", "Synovitis", 1),
    ("serositis", "Serositis", 1),
    ("renal", "Renal (proteinuria ≥ 0.5 g/day or RBC casts)", 1),
    ("neurologic", "Neurologic", 1),
    ("hemolytic_anemia", "Hemolytic anemia", 1),
    ("leukopenia", "Leukopenia or lymphopenia", 1),
    ("thrombocytopenia", "Thrombocytopenia", 1),
];

/// SLICC 2012 immunologic criteria.
pub const SLICC_IMMUNOLOGIC: &[ChecklistItem] = &[
    ("ana", "ANA above reference range", 1),
    ("anti_dsdna", "Anti-dsDNA above reference range", 1),
    ("anti_sm", "Anti-Sm", 1),
    ("antiphospholipid", "Antiphospholipid antibody", 1),
    ("low_complement", "Low complement (C3, C4, CH50)", 1),
    ("direct_coombs", "Direct Coombs test (without hemolytic anemia)", 1),
];

/// SLICC 2012 criteria tally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SliccResult {
    pub clinical: u32,
    pub immunologic: u32,
    pub total: u32,
    pub classified: bool,
}

/// SLICC 2012 classification.
///
/// Classified as SLE with ≥ 4 criteria including ≥ 1 clinical and ≥ 1
/// immunologic, or with biopsy-proven lupus nephritis plus ANA or
/// anti-dsDNA. A positive direct Coombs test does not count in the
/// presence of hemolytic anemia.
pub fn slicc_2012(clinical: &[&str], immunologic: &[&str], biopsy_nephritis: bool) -> SliccResult {
    let has_clinical = |id: &str| clinical.contains(&id);
    let has_immunologic = |id: &str| immunologic.contains(&id);

    let clinical_count = SLICC_CLINICAL.iter().filter(|(id, _, _)| has_clinical(id)).count() as u32;
    let immunologic_count = SLICC_IMMUNOLOGIC
        .iter()
        .filter(|(id, _, _)| has_immunologic(id))
        .filter(|(id, _, _)| !(*id == "direct_coombs" && has_clinical("hemolytic_anemia")))
        .count() as u32;
    let total = clinical_count + immunologic_count;

    let by_count = total >= 4 && clinical_count >= 1 && immunologic_count >= 1;
    let by_nephritis = biopsy_nephritis && (has_immunologic("ana") || has_immunologic("anti_dsdna"));

    SliccResult {
        clinical: clinical_count,
        immunologic: immunologic_count,
        total,
        classified: by_count || by_nephritis,
    }
}

// ============================================================================
// Frailty
// ============================================================================

/// FRAIL scale (Morley 2012).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Frail {
    pub fatigue: bool,
    /// Difficulty climbing one flight of stairs
    pub resistance: bool,
    /// Difficulty walking one block
    pub ambulation: bool,
    /// Five or more illnesses
    pub illnesses: bool,
    /// More than 5 % weight loss in a year
    pub loss_of_weight: bool,
}

impl Frail {
    pub fn score(&self) -> u32 {
        [self.fatigue, self.resistance, self.ambulation, self.illnesses, self.loss_of_weight]
            .iter()
            .map(|&p| points(p, 1))
            .sum()
    }
}

/// PRISMA-7 questionnaire.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prisma7 {
    pub older_than_85: bool,
    pub male: bool,
    pub health_limits_activities: bool,
    pub needs_regular_help: bool,
    pub health_keeps_at_home: bool,
    /// No one to count on when help is needed
    pub no_one_to_count_on: bool,
    pub uses_mobility_aid: bool,
}

impl Prisma7 {
    pub fn score(&self) -> u32 {
        [
            self.older_than_85,
            self.male,
            self.health_limits_activities,
            self.needs_regular_help,
            self.health_keeps_at_home,
            self.no_one_to_count_on,
            self.uses_mobility_aid,
        ]
        .iter()
        .map(|&p| points(p, 1))
        .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_curb65() {
        let mild = Curb65 {
            confusion: false,
            bun: 15.0,
            respiratory_rate: 18.0,
            systolic_bp: 120.0,
            diastolic_bp: 80.0,
            age: 50.0,
        };
        assert_eq!(mild.score(), 0);

        // BUN exactly 19 does not score; 19.1 does
        assert_eq!(Curb65 { bun: 19.0, ..mild }.score(), 0);
        assert_eq!(Curb65 { bun: 19.1, ..mild }.score(), 1);
        assert_eq!(Curb65 { diastolic_bp: 60.0, ..mild }.score(), 1);

        let severe = Curb65 {
            confusion: true,
            bun: 30.0,
            respiratory_rate: 30.0,
            systolic_bp: 85.0,
            diastolic_bp: 50.0,
            age: 80.0,
        };
        assert_eq!(severe.score(), 5);
    }

    #[test]
    fn test_qsofa() {
        let q = Qsofa {
            respiratory_rate: 22.0,
            altered_mentation: false,
            systolic_bp: 100.0,
        };
        assert_eq!(q.score(), 2);
        assert_eq!(Qsofa { respiratory_rate: 21.0, systolic_bp: 101.0, ..q }.score(), 0);
    }

    fn healthy_sofa() -> Sofa {
        Sofa {
            pao2_fio2: 450.0,
            mechanical_ventilation: false,
            platelets: 200.0,
            bilirubin: 0.8,
            map: 85.0,
            vasopressors: Vasopressors::None,
            gcs: 15.0,
            creatinine: 0.9,
            urine_output: None,
        }
    }

    #[test]
    fn test_sofa_zero() {
        assert_eq!(healthy_sofa().score(), 0);
    }

    #[test]
    fn test_sofa_respiration_requires_support() {
        let s = Sofa { pao2_fio2: 90.0, ..healthy_sofa() };
        assert_eq!(s.respiration(), 2);
        let s = Sofa { mechanical_ventilation: true, ..s };
        assert_eq!(s.respiration(), 4);
        let s = Sofa { pao2_fio2: 150.0, ..s };
        assert_eq!(s.respiration(), 3);
    }

    #[test]
    fn test_sofa_renal_takes_worse_criterion() {
        let s = Sofa {
            creatinine: 1.5,
            urine_output: Some(150.0),
            ..healthy_sofa()
        };
        assert_eq!(s.renal(), 4);
        let s = Sofa { urine_output: Some(1500.0), ..s };
        assert_eq!(s.renal(), 1);
    }

    #[test]
    fn test_sofa_total() {
        let s = Sofa {
            pao2_fio2: 250.0,
            platelets: 80.0,
            bilirubin: 2.5,
            vasopressors: Vasopressors::Moderate,
            gcs: 12.0,
            creatinine: 3.6,
            ..healthy_sofa()
        };
        // 2 + 2 + 2 + 3 + 2 + 3
        assert_eq!(s.score(), 14);
    }

    #[test]
    fn test_news2() {
        let normal = News2 {
            respiratory_rate: 16.0,
            spo2: 98.0,
            supplemental_oxygen: false,
            temperature: 37.0,
            systolic_bp: 120.0,
            heart_rate: 75.0,
            not_alert: false,
        };
        assert_eq!(normal.score(), 0);

        let sick = News2 {
            respiratory_rate: 26.0,
            spo2: 92.0,
            supplemental_oxygen: true,
            temperature: 39.5,
            systolic_bp: 95.0,
            heart_rate: 120.0,
            not_alert: true,
        };
        // 3 + 2 + 2 + 2 + 2 + 2 + 3
        assert_eq!(sick.score(), 16);
    }

    #[test]
    fn test_wells() {
        let pe = WellsPe {
            dvt_signs: true,
            heart_rate_over_100: true,
            ..Default::default()
        };
        assert_eq!(pe.score(), 4.5);

        let dvt = WellsDvt {
            active_cancer: true,
            calf_swelling: true,
            alternative_diagnosis_likely: true,
            ..Default::default()
        };
        assert_eq!(dvt.score(), 0);
        assert_eq!(WellsDvt { alternative_diagnosis_likely: true, ..Default::default() }.score(), -2);
    }

    #[test]
    fn test_sledai() {
        assert_eq!(sledai_2k(Vec::<&str>::new()), 0);
        assert_eq!(sledai_2k(["seizure", "proteinuria", "low_complement", "fever"]), 15);
        assert_eq!(sledai_2k(["not_an_item"]), 0);
        let max: u32 = SLEDAI_ITEMS.iter().map(|(_, _, w)| w).sum();
        assert_eq!(max, 105);
    }

    #[test]
    fn test_slicc_count_rule() {
        let r = slicc_2012(&["acute_cutaneous", "synovitis", "renal"], &["ana"], false);
        assert_eq!(r.total, 4);
        assert!(r.classified);

        // Four clinical criteria with no immunologic criterion do not classify
        let r = slicc_2012(&["acute_cutaneous", "synovitis", "renal", "serositis"], &[], false);
        assert!(!r.classified);
    }

    #[test]
    fn test_slicc_nephritis_rule() {
        let r = slicc_2012(&[], &["anti_dsdna"], true);
        assert_eq!(r.total, 1);
        assert!(r.classified);
        assert!(!slicc_2012(&[], &["anti_sm"], true).classified);
    }

    #[test]
    fn test_slicc_coombs_with_hemolysis() {
        let r = slicc_2012(&["hemolytic_anemia"], &["direct_coombs"], false);
        assert_eq!(r.immunologic, 0);
        let r = slicc_2012(&["synovitis"], &["direct_coombs"], false);
        assert_eq!(r.immunologic, 1);
    }

    #[test]
    fn test_frailty_screens() {
        let frail = Frail {
            fatigue: true,
            resistance: true,
            ambulation: true,
            ..Default::default()
        };
        assert_eq!(frail.score(), 3);
        let prisma = Prisma7 {
            older_than_85: true,
            male: true,
            uses_mobility_aid: true,
            ..Default::default()
        };
        assert_eq!(prisma.score(), 3);
    }
}
