//! # Kidney Function Equations
//!
//! GFR estimating equations, measured creatinine clearance, the Kidney
//! Failure Risk Equation and albuminuria / proteinuria ratios.
//!
//! ## Notation
//!
//! - `scr` = serum creatinine (mg/dL)
//! - `scys` = serum cystatin C (mg/L)
//! - `age` = years
//! - κ, α = sex-specific knot and exponent of the CKD-EPI splines
//!
//! The CKD-EPI equations split the creatinine (or cystatin) term at the
//! knot κ: `min(Scr/κ, 1)^α · max(Scr/κ, 1)^β`. Below the knot only the α
//! term varies, above it only the β term does. The two exponents are not
//! interchangeable and must not be merged into one continuous power.
//!
//! ## References
//!
//! - Inker LA et al. N Engl J Med 2021;385:1737-49 (CKD-EPI 2021)
//! - Inker LA et al. N Engl J Med 2012;367:20-29 (CKD-EPI cystatin C)
//! - Levey AS et al. Ann Intern Med 2006;145:247-54 (IDMS MDRD)
//! - Cockcroft DW, Gault MH. Nephron 1976;16:31-41
//! - Schwartz GJ et al. J Am Soc Nephrol 2009;20:629-37
//! - Björk J et al. Scand J Clin Lab Invest 2011;71:232-9 (Lund-Malmö revised)
//! - Schaeffner ES et al. Ann Intern Med 2012;157:471-81 (BIS1)
//! - Pottel H et al. Nephrol Dial Transplant 2016;31:798-806 (FAS)
//! - Tangri N et al. JAMA 2016;315:164-74 (KFRE multinational)

use serde::{Deserialize, Serialize};

use super::{ln_positive, ratio, Sex};
use crate::units::CREATININE;

// =============================================================================
// CKD-EPI
// =============================================================================

/// CKD-EPI creatinine knot κ (mg/dL)
#[inline]
fn creatinine_kappa(sex: Sex) -> f64 {
    match sex {
        Sex::Female => 0.7,
        Sex::Male => 0.9,
    }
}

/// `min(x, 1)^low · max(x, 1)^high`
#[inline]
fn spline(x: f64, low: f64, high: f64) -> f64 {
    x.min(1.0).powf(low) * x.max(1.0).powf(high)
}

/// CKD-EPI 2021 creatinine equation (race-free).
///
/// ```text
/// eGFR = 142 × min(Scr/κ, 1)^α × max(Scr/κ, 1)^-1.200 × 0.9938^age × 1.012 [female]
/// κ = 0.7 (F) / 0.9 (M), α = -0.241 (F) / -0.302 (M)
/// ```
pub fn ckd_epi_2021(scr: f64, age: f64, sex: Sex) -> Option<f64> {
    if scr <= 0.0 {
        return None;
    }
    let alpha = match sex {
        Sex::Female => -0.241,
        Sex::Male => -0.302,
    };
    let x = scr / creatinine_kappa(sex);
    let female = if sex.is_female() { 1.012 } else { 1.0 };
    Some(142.0 * spline(x, alpha, -1.200) * 0.9938f64.powf(age) * female)
}

/// CKD-EPI 2021 creatinine–cystatin C equation.
///
/// ```text
/// eGFR = 135 × min(Scr/κ,1)^α × max(Scr/κ,1)^-0.544
///            × min(Scys/0.8,1)^-0.323 × max(Scys/0.8,1)^-0.778
///            × 0.9961^age × 0.963 [female]
/// α = -0.219 (F) / -0.144 (M)
/// ```
pub fn ckd_epi_cr_cys_2021(scr: f64, scys: f64, age: f64, sex: Sex) -> Option<f64> {
    if scr <= 0.0 || scys <= 0.0 {
        return None;
    }
    let alpha = match sex {
        Sex::Female => -0.219,
        Sex::Male => -0.144,
    };
    let cr_term = spline(scr / creatinine_kappa(sex), alpha, -0.544);
    let cys_term = spline(scys / 0.8, -0.323, -0.778);
    let female = if sex.is_female() { 0.963 } else { 1.0 };
    Some(135.0 * cr_term * cys_term * 0.9961f64.powf(age) * female)
}

/// CKD-EPI 2012 cystatin C equation.
///
/// ```text
/// eGFR = 133 × min(Scys/0.8,1)^-0.499 × max(Scys/0.8,1)^-1.328 × 0.996^age × 0.932 [female]
/// ```
pub fn ckd_epi_cys_2012(scys: f64, age: f64, sex: Sex) -> Option<f64> {
    if scys <= 0.0 {
        return None;
    }
    let female = if sex.is_female() { 0.932 } else { 1.0 };
    Some(133.0 * spline(scys / 0.8, -0.499, -1.328) * 0.996f64.powf(age) * female)
}

// =============================================================================
// Older creatinine equations
// =============================================================================

/// IDMS-traceable 4-variable MDRD.
///
/// ```text
/// eGFR = 175 × Scr^-1.154 × age^-0.203 × 0.742 [female] × 1.212 [Black]
/// ```
pub fn mdrd(scr: f64, age: f64, sex: Sex, black: bool) -> Option<f64> {
    if scr <= 0.0 || age <= 0.0 {
        return None;
    }
    let female = if sex.is_female() { 0.742 } else { 1.0 };
    let race = if black { 1.212 } else { 1.0 };
    Some(175.0 * scr.powf(-1.154) * age.powf(-0.203) * female * race)
}

/// Cockcroft-Gault creatinine clearance (mL/min, not BSA-indexed).
///
/// ```text
/// CrCl = (140 - age) × weight / (72 × Scr) × 0.85 [female]
/// ```
pub fn cockcroft_gault(scr: f64, age: f64, weight_kg: f64, sex: Sex) -> Option<f64> {
    let crcl = ratio((140.0 - age) * weight_kg, 72.0 * scr)?;
    Some(if sex.is_female() { crcl * 0.85 } else { crcl })
}

/// Bedside Schwartz (pediatric): `eGFR = 0.413 × height(cm) / Scr`
pub fn schwartz_bedside(scr: f64, height_cm: f64) -> Option<f64> {
    ratio(0.413 * height_cm, scr)
}

/// Revised Lund-Malmö equation.
///
/// Works internally in µmol/L. The creatinine term switches from linear to
/// logarithmic at 150 µmol/L (female) / 180 µmol/L (male):
///
/// ```text
/// F, pCr < 150:  X = 2.50 + 0.0121 × (150 - pCr)
/// F, pCr ≥ 150:  X = 2.50 - 0.926 × ln(pCr / 150)
/// M, pCr < 180:  X = 2.56 + 0.00968 × (180 - pCr)
/// M, pCr ≥ 180:  X = 2.56 - 0.926 × ln(pCr / 180)
/// eGFR = e^(X - 0.0158 × age + 0.438 × ln(age))
/// ```
pub fn lund_malmo_revised(scr: f64, age: f64, sex: Sex) -> Option<f64> {
    if scr <= 0.0 {
        return None;
    }
    let ln_age = ln_positive(age)?;
    let pcr = CREATININE.to_si(scr);
    let x = match sex {
        Sex::Female if pcr < 150.0 => 2.50 + 0.0121 * (150.0 - pcr),
        Sex::Female => 2.50 - 0.926 * (pcr / 150.0).ln(),
        Sex::Male if pcr < 180.0 => 2.56 + 0.00968 * (180.0 - pcr),
        Sex::Male => 2.56 - 0.926 * (pcr / 180.0).ln(),
    };
    Some((x - 0.0158 * age + 0.438 * ln_age).exp())
}

/// Berlin Initiative Study equation 1 (age ≥ 70).
///
/// ```text
/// eGFR = 3736 × Scr^-0.87 × age^-0.95 × 0.82 [female]
/// ```
pub fn bis1(scr: f64, age: f64, sex: Sex) -> Option<f64> {
    if scr <= 0.0 || age <= 0.0 {
        return None;
    }
    let female = if sex.is_female() { 0.82 } else { 1.0 };
    Some(3736.0 * scr.powf(-0.87) * age.powf(-0.95) * female)
}

/// Full Age Spectrum equation (adults).
///
/// ```text
/// eGFR = 107.3 / (Scr / Q)                     age ≤ 40
/// eGFR = 107.3 / (Scr / Q) × 0.988^(age - 40)  age > 40
/// Q = 0.70 (F) / 0.90 (M)
/// ```
pub fn fas(scr: f64, age: f64, sex: Sex) -> Option<f64> {
    let q = match sex {
        Sex::Female => 0.70,
        Sex::Male => 0.90,
    };
    let base = ratio(107.3 * q, scr)?;
    Some(if age > 40.0 { base * 0.988f64.powf(age - 40.0) } else { base })
}

// =============================================================================
// Measured clearance and indexing
// =============================================================================

/// Timed-urine creatinine clearance (mL/min).
///
/// ```text
/// CrCl = (Ucr × V) / (Scr × t)
/// ```
///
/// `urine_volume_ml` is the total collected volume, `minutes` the
/// collection time (1440 for a 24-hour collection).
pub fn creatinine_clearance_timed(urine_cr: f64, urine_volume_ml: f64, scr: f64, minutes: f64) -> Option<f64> {
    ratio(urine_cr * urine_volume_ml, scr * minutes)
}

/// Convert a BSA-indexed eGFR (mL/min/1.73m²) to absolute mL/min.
#[inline]
pub fn deindexed_egfr(egfr: f64, bsa_m2: f64) -> f64 {
    egfr * bsa_m2 / 1.73
}

// =============================================================================
// Kidney Failure Risk Equation
// =============================================================================

/// 2- and 5-year risk of kidney failure, in percent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KfreRisk {
    pub two_year: f64,
    pub five_year: f64,
}

/// 4-variable KFRE, North American calibration (Tangri 2016).
///
/// ```text
/// x = -0.2201 × (age/10 - 7.036) + 0.2467 × (male - 0.5642)
///     - 0.5567 × (eGFR/5 - 7.222) + 0.4510 × (ln(ACR) - 5.137)
/// risk_2y = 1 - 0.9750^e^x
/// risk_5y = 1 - 0.9240^e^x
/// ```
///
/// `acr_mg_g` is the urine albumin-to-creatinine ratio in mg/g.
pub fn kfre_4var(age: f64, sex: Sex, egfr: f64, acr_mg_g: f64) -> Option<KfreRisk> {
    let ln_acr = ln_positive(acr_mg_g)?;
    let male = if sex == Sex::Male { 1.0 } else { 0.0 };
    let x = -0.2201 * (age / 10.0 - 7.036) + 0.2467 * (male - 0.5642) - 0.5567 * (egfr / 5.0 - 7.222)
        + 0.4510 * (ln_acr - 5.137);
    let hazard = x.exp();
    Some(KfreRisk {
        two_year: (1.0 - 0.9750f64.powf(hazard)) * 100.0,
        five_year: (1.0 - 0.9240f64.powf(hazard)) * 100.0,
    })
}

// =============================================================================
// Spot urine ratios
// =============================================================================

/// Urine albumin-to-creatinine ratio (mg/g) from spot concentrations in mg/dL.
pub fn uacr(urine_albumin_mg_dl: f64, urine_cr_mg_dl: f64) -> Option<f64> {
    ratio(urine_albumin_mg_dl * 1000.0, urine_cr_mg_dl)
}

/// Urine protein-to-creatinine ratio (g/g) from spot concentrations in mg/dL.
pub fn upcr(urine_protein_mg_dl: f64, urine_cr_mg_dl: f64) -> Option<f64> {
    ratio(urine_protein_mg_dl, urine_cr_mg_dl)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(actual: f64, expected: f64, tol: f64) -> bool {
        (actual - expected).abs() <= tol
    }

    #[test]
    fn test_ckd_epi_2021_reference() {
        // 1.2 mg/dL, 55 y, male -> 71
        let egfr = ckd_epi_2021(1.2, 55.0, Sex::Male).unwrap();
        assert!(close(egfr, 71.0, 1.0), "got {}", egfr);
    }

    #[test]
    fn test_ckd_epi_2021_knot_branches() {
        // Below the knot only α applies: Scr 0.7 female -> 142 × 0.9938^age × 1.012
        let at_knot = ckd_epi_2021(0.7, 40.0, Sex::Female).unwrap();
        let expected = 142.0 * 0.9938f64.powf(40.0) * 1.012;
        assert!(close(at_knot, expected, 1e-9));

        // Below the knot α = -0.241
        let below = ckd_epi_2021(0.5, 40.0, Sex::Female).unwrap();
        let expected = 142.0 * (0.5f64 / 0.7).powf(-0.241) * 0.9938f64.powf(40.0) * 1.012;
        assert!(close(below, expected, 1e-9));

        // Above the knot only the -1.200 exponent applies
        let above = ckd_epi_2021(1.4, 40.0, Sex::Female).unwrap();
        let expected = 142.0 * 2.0f64.powf(-1.2) * 0.9938f64.powf(40.0) * 1.012;
        assert!(close(above, expected, 1e-9));
    }

    #[test]
    fn test_ckd_epi_2021_female_higher_than_male_at_same_ratio() {
        let female = ckd_epi_2021(0.7 * 1.5, 50.0, Sex::Female).unwrap();
        let male = ckd_epi_2021(0.9 * 1.5, 50.0, Sex::Male).unwrap();
        assert!(close(female / male, 1.012, 1e-9));
    }

    #[test]
    fn test_ckd_epi_2021_domain() {
        assert_eq!(ckd_epi_2021(0.0, 50.0, Sex::Male), None);
        assert_eq!(ckd_epi_2021(-1.0, 50.0, Sex::Male), None);
    }

    #[test]
    fn test_ckd_epi_cr_cys() {
        let egfr = ckd_epi_cr_cys_2021(1.0, 1.0, 50.0, Sex::Male).unwrap();
        assert!(close(egfr, 88.1, 0.5), "got {}", egfr);
        assert_eq!(ckd_epi_cr_cys_2021(1.0, 0.0, 50.0, Sex::Male), None);
    }

    #[test]
    fn test_ckd_epi_cys() {
        let egfr = ckd_epi_cys_2012(1.0, 50.0, Sex::Male).unwrap();
        assert!(close(egfr, 80.9, 0.5), "got {}", egfr);
        let female = ckd_epi_cys_2012(1.0, 50.0, Sex::Female).unwrap();
        assert!(close(female / egfr, 0.932, 1e-9));
    }

    #[test]
    fn test_mdrd() {
        let egfr = mdrd(1.2, 55.0, Sex::Male, false).unwrap();
        assert!(close(egfr, 62.9, 0.5), "got {}", egfr);
        let black = mdrd(1.2, 55.0, Sex::Male, true).unwrap();
        assert!(close(black / egfr, 1.212, 1e-9));
    }

    #[test]
    fn test_cockcroft_gault_reference() {
        // 1.2 mg/dL, 55 y, 70 kg, male -> 69
        let crcl = cockcroft_gault(1.2, 55.0, 70.0, Sex::Male).unwrap();
        assert!(close(crcl, 69.0, 1.0), "got {}", crcl);
        let female = cockcroft_gault(1.2, 55.0, 70.0, Sex::Female).unwrap();
        assert!(close(female, crcl * 0.85, 1e-9));
        assert_eq!(cockcroft_gault(0.0, 55.0, 70.0, Sex::Male), None);
    }

    #[test]
    fn test_schwartz() {
        let egfr = schwartz_bedside(0.5, 120.0).unwrap();
        assert!(close(egfr, 99.12, 1e-9));
    }

    #[test]
    fn test_lund_malmo() {
        let egfr = lund_malmo_revised(1.2, 55.0, Sex::Male).unwrap();
        assert!(close(egfr, 64.2, 0.5), "got {}", egfr);
        // log branch above 180 µmol/L
        let high = lund_malmo_revised(3.0, 55.0, Sex::Male).unwrap();
        assert!(high < egfr);
        assert_eq!(lund_malmo_revised(1.0, 0.0, Sex::Male), None);
    }

    #[test]
    fn test_lund_malmo_continuous_at_split() {
        // Both female branches meet at 150 µmol/L
        let scr = 150.0 / 88.4;
        let at = lund_malmo_revised(scr, 60.0, Sex::Female).unwrap();
        let just_below = lund_malmo_revised(scr - 1e-6, 60.0, Sex::Female).unwrap();
        assert!(close(at, just_below, 1e-3));
    }

    #[test]
    fn test_bis1() {
        let egfr = bis1(1.0, 75.0, Sex::Female).unwrap();
        assert!(close(egfr, 50.7, 0.5), "got {}", egfr);
    }

    #[test]
    fn test_fas() {
        assert!(close(fas(1.0, 30.0, Sex::Male).unwrap(), 96.57, 0.01));
        assert!(close(fas(1.0, 60.0, Sex::Male).unwrap(), 75.86, 0.05));
    }

    #[test]
    fn test_timed_clearance() {
        let crcl = creatinine_clearance_timed(100.0, 1440.0, 1.0, 1440.0).unwrap();
        assert!(close(crcl, 100.0, 1e-9));
        assert_eq!(creatinine_clearance_timed(100.0, 1440.0, 0.0, 1440.0), None);
    }

    #[test]
    fn test_deindexed() {
        assert!(close(deindexed_egfr(60.0, 2.0), 69.36, 0.01));
    }

    #[test]
    fn test_kfre() {
        let risk = kfre_4var(60.0, Sex::Male, 30.0, 300.0).unwrap();
        // x = 1.2714, e^x = 3.566
        assert!(close(risk.five_year, 24.56, 0.05), "got {}", risk.five_year);
        assert!(close(risk.two_year, 8.63, 0.05), "got {}", risk.two_year);
        assert!(risk.two_year < risk.five_year);
        assert!(kfre_4var(60.0, Sex::Male, 30.0, 0.0).is_none());
    }

    #[test]
    fn test_urine_ratios() {
        assert!(close(uacr(3.0, 100.0).unwrap(), 30.0, 1e-9));
        assert!(close(upcr(50.0, 100.0).unwrap(), 0.5, 1e-9));
        assert_eq!(uacr(3.0, 0.0), None);
    }
}
