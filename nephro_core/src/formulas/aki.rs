//! # Acute Kidney Injury Workup
//!
//! Fractional excretions and urine indices used to separate prerenal from
//! intrinsic kidney injury.
//!
//! Plasma and urine creatinine each arrive through their own unit toggle
//! and are normalized independently, so by the time they reach these
//! functions both are in mg/dL even if the caller entered one in µmol/L.

use super::ratio;

/// Fractional excretion of sodium (%).
///
/// ```text
/// FENa = (UNa × PCr) / (PNa × UCr) × 100
/// ```
pub fn fena(urine_na: f64, plasma_na: f64, urine_cr: f64, plasma_cr: f64) -> Option<f64> {
    ratio(urine_na * plasma_cr, plasma_na * urine_cr).map(|r| r * 100.0)
}

/// Fractional excretion of urea (%).
///
/// ```text
/// FEUrea = (UUN × PCr) / (BUN × UCr) × 100
/// ```
pub fn feurea(urine_urea_n: f64, bun: f64, urine_cr: f64, plasma_cr: f64) -> Option<f64> {
    ratio(urine_urea_n * plasma_cr, bun * urine_cr).map(|r| r * 100.0)
}

/// BUN : creatinine ratio (both mg/dL)
pub fn bun_creatinine_ratio(bun: f64, scr: f64) -> Option<f64> {
    ratio(bun, scr)
}

/// Urine anion gap (mEq/L): `UNa + UK - UCl`
#[inline]
pub fn urine_anion_gap(urine_na: f64, urine_k: f64, urine_cl: f64) -> f64 {
    urine_na + urine_k - urine_cl
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::units::CREATININE;

    #[test]
    fn test_fena() {
        // UNa 20, PNa 140, UCr 100, PCr 2.0 -> 0.286 %
        let v = fena(20.0, 140.0, 100.0, 2.0).unwrap();
        assert!((v - 0.2857).abs() < 1e-3);
    }

    #[test]
    fn test_fena_independent_units() {
        // Plasma creatinine entered in µmol/L, urine creatinine in mg/dL:
        // once each is normalized the ratio is unchanged.
        let plasma_si = CREATININE.to_si(2.0);
        let normalized = CREATININE.to_conventional(plasma_si);
        let a = fena(40.0, 135.0, 80.0, 2.0).unwrap();
        let b = fena(40.0, 135.0, 80.0, normalized).unwrap();
        assert!((a - b).abs() < 1e-12);
    }

    #[test]
    fn test_fena_zero_denominator() {
        assert_eq!(fena(20.0, 140.0, 0.0, 2.0), None);
        assert_eq!(fena(20.0, 0.0, 100.0, 2.0), None);
    }

    #[test]
    fn test_feurea() {
        // UUN 300, BUN 40, UCr 100, PCr 2 -> 15 %
        let v = feurea(300.0, 40.0, 100.0, 2.0).unwrap();
        assert!((v - 15.0).abs() < 1e-9);
    }

    #[test]
    fn test_bun_cr_and_uag() {
        assert_eq!(bun_creatinine_ratio(40.0, 1.0), Some(40.0));
        assert_eq!(bun_creatinine_ratio(40.0, 0.0), None);
        assert_eq!(urine_anion_gap(40.0, 30.0, 90.0), -20.0);
    }
}
