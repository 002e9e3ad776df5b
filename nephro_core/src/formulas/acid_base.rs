//! # Acid–Base Formulas
//!
//! Serum anion gap and its albumin correction, the delta gap / delta ratio,
//! calculated osmolality and osmolal gap, and Winter's formula for expected
//! respiratory compensation.
//!
//! Normal reference values used by the delta calculations: anion gap 12
//! mEq/L, bicarbonate 24 mEq/L.

use serde::{Deserialize, Serialize};

use super::ratio;

/// Reference anion gap (mEq/L)
pub const NORMAL_ANION_GAP: f64 = 12.0;
/// Reference serum bicarbonate (mEq/L)
pub const NORMAL_BICARBONATE: f64 = 24.0;

/// Serum anion gap: `Na - (Cl + HCO3)`
#[inline]
pub fn anion_gap(na: f64, cl: f64, hco3: f64) -> f64 {
    na - (cl + hco3)
}

/// Albumin-corrected anion gap (Figge): `AG + 2.5 × (4.0 - albumin g/dL)`
#[inline]
pub fn albumin_corrected_anion_gap(na: f64, cl: f64, hco3: f64, albumin_g_dl: f64) -> f64 {
    anion_gap(na, cl, hco3) + 2.5 * (4.0 - albumin_g_dl)
}

/// Delta gap components.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DeltaGap {
    /// AG - 12
    pub delta_gap: f64,
    /// 24 - HCO3
    pub delta_hco3: f64,
    /// delta_gap / delta_hco3; `None` when bicarbonate is exactly 24
    pub ratio: Option<f64>,
}

/// Delta gap and delta ratio.
pub fn delta_gap(na: f64, cl: f64, hco3: f64) -> DeltaGap {
    let delta_gap = anion_gap(na, cl, hco3) - NORMAL_ANION_GAP;
    let delta_hco3 = NORMAL_BICARBONATE - hco3;
    DeltaGap {
        delta_gap,
        delta_hco3,
        ratio: ratio(delta_gap, delta_hco3),
    }
}

/// Calculated serum osmolality (mOsm/kg).
///
/// ```text
/// Osm = 2 × Na + glucose/18 + BUN/2.8
/// ```
#[inline]
pub fn serum_osmolality(na: f64, glucose_mg_dl: f64, bun_mg_dl: f64) -> f64 {
    2.0 * na + glucose_mg_dl / 18.0 + bun_mg_dl / 2.8
}

/// Osmolal gap: measured minus calculated osmolality.
///
/// When a blood ethanol level (mg/dL) is known its contribution
/// (`ethanol / 3.7`) is added to the calculated value.
pub fn osmolal_gap(measured: f64, na: f64, glucose_mg_dl: f64, bun_mg_dl: f64, ethanol_mg_dl: Option<f64>) -> f64 {
    let ethanol = ethanol_mg_dl.map_or(0.0, |e| e / 3.7);
    measured - (serum_osmolality(na, glucose_mg_dl, bun_mg_dl) + ethanol)
}

/// Expected pCO2 window in metabolic acidosis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WintersRange {
    pub expected: f64,
    pub low: f64,
    pub high: f64,
}

/// Winter's formula: `pCO2 = 1.5 × HCO3 + 8 ± 2` (mmHg)
pub fn winters_formula(hco3: f64) -> WintersRange {
    let expected = 1.5 * hco3 + 8.0;
    WintersRange {
        expected,
        low: expected - 2.0,
        high: expected + 2.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_anion_gap_reference() {
        assert_eq!(anion_gap(140.0, 100.0, 24.0), 16.0);
    }

    #[test]
    fn test_corrected_anion_gap() {
        // Albumin 2.0 adds 5 mEq/L
        assert_eq!(albumin_corrected_anion_gap(140.0, 104.0, 24.0, 2.0), 17.0);
        // Normal albumin leaves AG unchanged
        assert_eq!(albumin_corrected_anion_gap(140.0, 104.0, 24.0, 4.0), 12.0);
    }

    #[test]
    fn test_delta_gap() {
        let d = delta_gap(140.0, 100.0, 14.0);
        assert_eq!(d.delta_gap, 14.0);
        assert_eq!(d.delta_hco3, 10.0);
        assert!((d.ratio.unwrap() - 1.4).abs() < 1e-12);
    }

    #[test]
    fn test_delta_gap_undefined_ratio() {
        let d = delta_gap(140.0, 100.0, 24.0);
        assert_eq!(d.delta_gap, 4.0);
        assert_eq!(d.delta_hco3, 0.0);
        assert_eq!(d.ratio, None);
    }

    #[test]
    fn test_osmolality() {
        // 2×140 + 90/18 + 14/2.8 = 280 + 5 + 5
        assert!((serum_osmolality(140.0, 90.0, 14.0) - 290.0).abs() < 1e-9);
        assert!((osmolal_gap(310.0, 140.0, 90.0, 14.0, None) - 20.0).abs() < 1e-9);
        assert!((osmolal_gap(310.0, 140.0, 90.0, 14.0, Some(37.0)) - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_winters() {
        let w = winters_formula(12.0);
        assert_eq!(w.expected, 26.0);
        assert_eq!(w.low, 24.0);
        assert_eq!(w.high, 28.0);
    }
}
