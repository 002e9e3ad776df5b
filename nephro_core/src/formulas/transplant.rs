//! # Transplant Scores
//!
//! Donor quality (KDRI / KDPI), recipient longevity (EPTS), and the Banff
//! classification of kidney allograft biopsies.
//!
//! ## Percentile lookup
//!
//! KDPI and EPTS map a continuous score onto a 0-100 percentile with a
//! sorted table of 100 breakpoints. A value maps to the index of the first
//! breakpoint it does not exceed (`value ≤ breakpoint`), so a value lying
//! exactly on a breakpoint takes that breakpoint's percentile. Values above
//! the last breakpoint map to 100.
//!
//! The breakpoints and the KDRI scaling factor belong to a given year's OPTN
//! mapping table and are supplied as [`OptnTables`]; the table year travels
//! with the result. Without a table only the raw scores are available.

use serde::{Deserialize, Serialize};

use super::ln_positive;
use crate::optn::OptnTables;

/// Creatinine above this value is capped before entering the KDRI.
const KDRI_CREATININE_CAP: f64 = 8.0;

/// Percentile (0-100) of `value` in a sorted breakpoint table.
///
/// Binary search for the first breakpoint `>= value`. NaN maps to `None`.
pub fn percentile(breakpoints: &[f64], value: f64) -> Option<u8> {
    if value.is_nan() {
        return None;
    }
    let index = breakpoints.partition_point(|&b| b < value);
    u8::try_from(index).ok()
}

// ============================================================================
// KDRI / KDPI
// ============================================================================

/// Deceased donor characteristics entering the Rao KDRI.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Donor {
    pub age: f64,
    pub height_cm: f64,
    pub weight_kg: f64,
    pub african_american: bool,
    pub hypertension: bool,
    pub diabetes: bool,
    /// Cause of death cerebrovascular accident
    pub cva_death: bool,
    /// Terminal serum creatinine (mg/dL)
    pub creatinine: f64,
    pub hcv_positive: bool,
    /// Donation after circulatory death
    pub dcd: bool,
}

impl Donor {
    /// Linear predictor of the Rao 2009 model.
    pub fn kdri_xbeta(&self) -> f64 {
        let age = self.age;
        let cr = self.creatinine.min(KDRI_CREATININE_CAP);
        let flag = |b: bool| if b { 1.0 } else { 0.0 };

        let mut x = 0.0128 * (age - 40.0);
        if age < 18.0 {
            x -= 0.0194 * (age - 18.0);
        }
        if age > 50.0 {
            x += 0.0107 * (age - 50.0);
        }
        x -= 0.0464 * (self.height_cm - 170.0) / 10.0;
        if self.weight_kg < 80.0 {
            x -= 0.0199 * (self.weight_kg - 80.0) / 5.0;
        }
        x += 0.179 * flag(self.african_american);
        x += 0.126 * flag(self.hypertension);
        x += 0.130 * flag(self.diabetes);
        x += 0.0881 * flag(self.cva_death);
        x += 0.220 * (cr - 1.0);
        if cr > 1.5 {
            x -= 0.209 * (cr - 1.5);
        }
        x += 0.240 * flag(self.hcv_positive);
        x += 0.133 * flag(self.dcd);
        x
    }
}

/// KDRI and its KDPI percentile.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KdpiResult {
    /// `e^xβ`, relative to the Rao reference donor
    pub kdri_rao: f64,
    /// `kdri_rao / scaling factor`, relative to the median donor
    pub kdri_median: Option<f64>,
    pub kdpi: Option<f64>,
    /// Year of the mapping table used
    pub table_year: Option<u16>,
}

/// Kidney Donor Profile Index (Rao 2009 KDRI, OPTN mapping).
///
/// `None` only when the KDRI itself is not a number. Without `tables` the
/// median-scaled KDRI and the percentile are left blank.
pub fn kdpi(donor: &Donor, tables: Option<&OptnTables>) -> Option<KdpiResult> {
    let kdri_rao = donor.kdri_xbeta().exp();
    if !kdri_rao.is_finite() {
        return None;
    }
    let Some(tables) = tables else {
        return Some(KdpiResult {
            kdri_rao,
            kdri_median: None,
            kdpi: None,
            table_year: None,
        });
    };
    let kdri_median = kdri_rao / tables.kdri_scaling_factor;
    Some(KdpiResult {
        kdri_rao,
        kdri_median: Some(kdri_median),
        kdpi: percentile(&tables.kdpi_breakpoints, kdri_median).map(f64::from),
        table_year: Some(tables.year),
    })
}

// ============================================================================
// EPTS
// ============================================================================

/// Adult transplant candidate characteristics entering EPTS.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub age: f64,
    pub diabetes: bool,
    pub prior_transplant: bool,
    /// Years on dialysis; `None` for a candidate never dialyzed
    pub dialysis_years: Option<f64>,
}

/// Raw EPTS score and its percentile.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EptsResult {
    pub raw_score: f64,
    pub epts: Option<f64>,
    /// Year of the mapping table used
    pub table_year: Option<u16>,
}

/// Raw EPTS score (OPTN).
///
/// ```text
/// raw = 0.047 × max(age - 25, 0)
///     - 0.015 × DM × max(age - 25, 0)
///     + 0.398 × prior_tx - 0.237 × DM × prior_tx
///     + 0.315 × ln(years + 1) - 0.099 × DM × ln(years + 1)
///     + 0.130 × no_dialysis - 0.348 × DM × no_dialysis
///     + 1.262 × DM
/// ```
pub fn epts_raw(candidate: &Candidate) -> Option<f64> {
    let flag = |b: bool| if b { 1.0 } else { 0.0 };
    let dm = flag(candidate.diabetes);
    let prior = flag(candidate.prior_transplant);
    let no_dialysis = flag(candidate.dialysis_years.is_none());
    let years = candidate.dialysis_years.unwrap_or(0.0);
    let log_years = ln_positive(years + 1.0)?;
    let age_term = (candidate.age - 25.0).max(0.0);

    Some(
        0.047 * age_term - 0.015 * dm * age_term + 0.398 * prior - 0.237 * dm * prior + 0.315 * log_years
            - 0.099 * dm * log_years
            + 0.130 * no_dialysis
            - 0.348 * dm * no_dialysis
            + 1.262 * dm,
    )
}

/// Estimated Post-Transplant Survival percentile; blank without `tables`.
pub fn epts(candidate: &Candidate, tables: Option<&OptnTables>) -> Option<EptsResult> {
    let raw_score = epts_raw(candidate)?;
    Some(EptsResult {
        raw_score,
        epts: tables
            .and_then(|t| percentile(&t.epts_breakpoints, raw_score))
            .map(f64::from),
        table_year: tables.map(|t| t.year),
    })
}

// ============================================================================
// Banff classification
// ============================================================================

/// Banff lesion scores (each 0-3) plus donor-specific antibody status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BanffScores {
    /// Interstitial inflammation
    pub i: u8,
    /// Tubulitis
    pub t: u8,
    /// Intimal arteritis
    pub v: u8,
    /// Glomerulitis
    pub g: u8,
    /// Peritubular capillaritis
    pub ptc: u8,
    /// Interstitial fibrosis
    pub ci: u8,
    /// Tubular atrophy
    pub ct: u8,
    /// Vascular fibrous intimal thickening
    pub cv: u8,
    /// Transplant glomerulopathy
    pub cg: u8,
    /// C4d staining of peritubular capillaries
    pub c4d: u8,
    /// Circulating donor-specific antibody detected
    pub dsa: bool,
}

impl BanffScores {
    /// Microvascular inflammation, `g + ptc`
    pub fn mvi(&self) -> u8 {
        self.g + self.ptc
    }

    fn any_lesion(&self) -> bool {
        [self.i, self.t, self.v, self.g, self.ptc, self.ci, self.ct, self.cv, self.cg, self.c4d]
            .iter()
            .any(|&score| score > 0)
    }
}

/// Diagnostic category, most to least severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BanffCategory {
    AntibodyMediatedRejection,
    TCellMediatedRejection,
    Borderline,
    IfTa,
    Other,
    Normal,
}

impl BanffCategory {
    /// Severity rank used as the primary scalar (5 = ABMR ... 0 = normal)
    pub fn rank(self) -> u8 {
        match self {
            BanffCategory::AntibodyMediatedRejection => 5,
            BanffCategory::TCellMediatedRejection => 4,
            BanffCategory::Borderline => 3,
            BanffCategory::IfTa => 2,
            BanffCategory::Other => 1,
            BanffCategory::Normal => 0,
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            BanffCategory::AntibodyMediatedRejection => "Antibody-mediated rejection",
            BanffCategory::TCellMediatedRejection => "T-cell-mediated rejection",
            BanffCategory::Borderline => "Borderline changes",
            BanffCategory::IfTa => "Interstitial fibrosis and tubular atrophy",
            BanffCategory::Other => "Other findings",
            BanffCategory::Normal => "Normal",
        }
    }

    /// Category for a severity rank, inverse of [`BanffCategory::rank`]
    pub fn from_rank(rank: u8) -> Option<Self> {
        match rank {
            5 => Some(BanffCategory::AntibodyMediatedRejection),
            4 => Some(BanffCategory::TCellMediatedRejection),
            3 => Some(BanffCategory::Borderline),
            2 => Some(BanffCategory::IfTa),
            1 => Some(BanffCategory::Other),
            0 => Some(BanffCategory::Normal),
            _ => None,
        }
    }
}

/// Outcome of [`classify_banff`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BanffClassification {
    pub category: BanffCategory,
    pub diagnosis: &'static str,
    pub subtype: &'static str,
    pub severity: &'static str,
    pub recommendations: &'static [&'static str],
}

const ABMR_RECOMMENDATIONS: &[&str] = &[
    "Plasmapheresis or immunoadsorption with IVIG",
    "Consider anti-CD20 or complement inhibition in refractory cases",
    "Monitor donor-specific antibody titers",
    "Optimize maintenance immunosuppression and adherence",
];

const CHRONIC_ABMR_RECOMMENDATIONS: &[&str] = &[
    "Optimize maintenance immunosuppression and adherence",
    "Monitor donor-specific antibody titers and proteinuria",
    "Control blood pressure with RAAS blockade",
];

const TCMR_RECOMMENDATIONS: &[&str] = &[
    "Pulse methylprednisolone",
    "Consider lymphocyte-depleting antibody for steroid resistance",
    "Repeat biopsy if no functional response",
];

const VASCULAR_TCMR_RECOMMENDATIONS: &[&str] = &[
    "Lymphocyte-depleting antibody therapy",
    "Pulse methylprednisolone",
    "Screen for concurrent antibody-mediated injury",
];

const BORDERLINE_RECOMMENDATIONS: &[&str] = &[
    "Consider pulse corticosteroids in the setting of graft dysfunction",
    "Close monitoring of graft function",
];

const IFTA_RECOMMENDATIONS: &[&str] = &[
    "Evaluate for calcineurin inhibitor toxicity",
    "Control blood pressure and proteinuria",
    "Screen for BK polyomavirus and recurrent disease",
];

const OTHER_RECOMMENDATIONS: &[&str] = &[
    "Correlate with clinical findings",
    "Consider repeat biopsy or additional studies",
];

const NORMAL_RECOMMENDATIONS: &[&str] = &["Continue current immunosuppression", "Routine graft surveillance"];

/// Classify a kidney allograft biopsy.
///
/// Guards are evaluated in fixed order and the first match wins:
/// ABMR, TCMR, borderline, IF/TA, other, normal. Criteria overlap, so the
/// order decides the category (MVI with chronic fibrosis is ABMR, not IF/TA).
pub fn classify_banff(s: &BanffScores) -> BanffClassification {
    let mvi = s.mvi();
    let acute_injury = mvi >= 1 || s.v >= 1;
    let antibody_interaction = s.c4d >= 2 || mvi >= 2;
    let serology = s.dsa || s.c4d >= 2;

    // 1. Antibody-mediated rejection
    if acute_injury && antibody_interaction && serology {
        let (subtype, severity, recommendations) = if s.cg >= 1 {
            ("Chronic active ABMR", "Chronic active", ABMR_RECOMMENDATIONS)
        } else {
            ("Active ABMR", "Active", ABMR_RECOMMENDATIONS)
        };
        return BanffClassification {
            category: BanffCategory::AntibodyMediatedRejection,
            diagnosis: BanffCategory::AntibodyMediatedRejection.display_name(),
            subtype,
            severity,
            recommendations,
        };
    }
    if s.cg >= 1 && serology && !acute_injury {
        return BanffClassification {
            category: BanffCategory::AntibodyMediatedRejection,
            diagnosis: BanffCategory::AntibodyMediatedRejection.display_name(),
            subtype: "Chronic (inactive) ABMR",
            severity: "Chronic inactive",
            recommendations: CHRONIC_ABMR_RECOMMENDATIONS,
        };
    }

    // 2. T-cell-mediated rejection
    let tcmr = match (s.v, s.i, s.t) {
        (3, _, _) => Some(("Grade III", "Severe", VASCULAR_TCMR_RECOMMENDATIONS)),
        (2, _, _) => Some(("Grade IIB", "Moderate to severe", VASCULAR_TCMR_RECOMMENDATIONS)),
        (1, _, _) => Some(("Grade IIA", "Moderate", VASCULAR_TCMR_RECOMMENDATIONS)),
        (_, i, t) if i >= 2 && t >= 3 => Some(("Grade IB", "Mild to moderate", TCMR_RECOMMENDATIONS)),
        (_, i, t) if i >= 2 && t == 2 => Some(("Grade IA", "Mild", TCMR_RECOMMENDATIONS)),
        _ => None,
    };
    if let Some((subtype, severity, recommendations)) = tcmr {
        return BanffClassification {
            category: BanffCategory::TCellMediatedRejection,
            diagnosis: BanffCategory::TCellMediatedRejection.display_name(),
            subtype,
            severity,
            recommendations,
        };
    }

    // 3. Borderline
    if s.t >= 1 && s.i >= 1 {
        return BanffClassification {
            category: BanffCategory::Borderline,
            diagnosis: BanffCategory::Borderline.display_name(),
            subtype: "Suspicious for acute TCMR",
            severity: "Borderline",
            recommendations: BORDERLINE_RECOMMENDATIONS,
        };
    }

    // 4. IF/TA
    let chronicity = s.ci.max(s.ct);
    if chronicity >= 1 {
        let (subtype, severity) = match chronicity {
            1 => ("Grade I", "Mild"),
            2 => ("Grade II", "Moderate"),
            _ => ("Grade III", "Severe"),
        };
        return BanffClassification {
            category: BanffCategory::IfTa,
            diagnosis: BanffCategory::IfTa.display_name(),
            subtype,
            severity,
            recommendations: IFTA_RECOMMENDATIONS,
        };
    }

    // 5. Other
    if s.any_lesion() {
        return BanffClassification {
            category: BanffCategory::Other,
            diagnosis: BanffCategory::Other.display_name(),
            subtype: "Nonspecific changes",
            severity: "Indeterminate",
            recommendations: OTHER_RECOMMENDATIONS,
        };
    }

    // 6. Normal
    BanffClassification {
        category: BanffCategory::Normal,
        diagnosis: BanffCategory::Normal.display_name(),
        subtype: "No evidence of rejection",
        severity: "None",
        recommendations: NORMAL_RECOMMENDATIONS,
    }
}
