//! # Electrolyte Formulas
//!
//! Water and sodium balance, glucose-corrected sodium, albumin-corrected
//! calcium, potassium handling (TTKG) and the rate-corrected QT interval.
//!
//! ## Total body water fractions
//!
//! | | < 65 y | ≥ 65 y |
//! |--------|-----|------|
//! | Male   | 0.6 | 0.5  |
//! | Female | 0.5 | 0.45 |

use super::{ratio, Sex};

/// Fraction of body weight that is water, by sex and age.
pub fn tbw_fraction(sex: Sex, age: f64) -> f64 {
    match (sex, age >= 65.0) {
        (Sex::Male, false) => 0.6,
        (Sex::Male, true) => 0.5,
        (Sex::Female, false) => 0.5,
        (Sex::Female, true) => 0.45,
    }
}

/// Estimated total body water (L)
#[inline]
pub fn total_body_water(weight_kg: f64, sex: Sex, age: f64) -> f64 {
    weight_kg * tbw_fraction(sex, age)
}

/// Free water deficit (L): `TBW × (Na / 140 - 1)`
pub fn free_water_deficit(na: f64, weight_kg: f64, sex: Sex, age: f64) -> f64 {
    total_body_water(weight_kg, sex, age) * (na / 140.0 - 1.0)
}

/// Glucose-corrected sodium, Katz 1973: `Na + 1.6 × (glucose - 100) / 100`
#[inline]
pub fn corrected_sodium_katz(na: f64, glucose_mg_dl: f64) -> f64 {
    na + 1.6 * (glucose_mg_dl - 100.0) / 100.0
}

/// Glucose-corrected sodium, Hillier 1999: `Na + 2.4 × (glucose - 100) / 100`
#[inline]
pub fn corrected_sodium_hillier(na: f64, glucose_mg_dl: f64) -> f64 {
    na + 2.4 * (glucose_mg_dl - 100.0) / 100.0
}

/// Sodium deficit (mEq): `TBW × (target Na - current Na)`
pub fn sodium_deficit(current_na: f64, target_na: f64, weight_kg: f64, sex: Sex, age: f64) -> f64 {
    total_body_water(weight_kg, sex, age) * (target_na - current_na)
}

/// Adrogué-Madias: expected change in serum Na (mEq/L) after 1 L of infusate.
///
/// ```text
/// ΔNa = (infusate Na + infusate K - serum Na) / (TBW + 1)
/// ```
pub fn adrogue_madias(serum_na: f64, infusate_na: f64, infusate_k: f64, weight_kg: f64, sex: Sex, age: f64) -> f64 {
    (infusate_na + infusate_k - serum_na) / (total_body_water(weight_kg, sex, age) + 1.0)
}

/// Electrolyte-free water clearance (same volume unit as `urine_volume`).
///
/// ```text
/// EFWC = V × (1 - (UNa + UK) / PNa)
/// ```
pub fn electrolyte_free_water_clearance(urine_volume: f64, urine_na: f64, urine_k: f64, plasma_na: f64) -> Option<f64> {
    ratio(urine_na + urine_k, plasma_na).map(|r| urine_volume * (1.0 - r))
}

/// Albumin-corrected calcium (mg/dL): `Ca + 0.8 × (4.0 - albumin g/dL)`
#[inline]
pub fn corrected_calcium(ca_mg_dl: f64, albumin_g_dl: f64) -> f64 {
    ca_mg_dl + 0.8 * (4.0 - albumin_g_dl)
}

/// Calcium × phosphate product (mg²/dL²)
#[inline]
pub fn calcium_phosphate_product(ca_mg_dl: f64, phosphate_mg_dl: f64) -> f64 {
    ca_mg_dl * phosphate_mg_dl
}

/// Transtubular potassium gradient: `(UK / PK) / (Uosm / Posm)`
pub fn ttkg(urine_k: f64, plasma_k: f64, urine_osm: f64, plasma_osm: f64) -> Option<f64> {
    ratio(ratio(urine_k, plasma_k)?, ratio(urine_osm, plasma_osm)?)
}

/// Bazett-corrected QT (ms).
///
/// ```text
/// RR = 60 / HR
/// QTc = QT / √RR
/// ```
///
/// Heart rate must be positive.
pub fn qtc_bazett(qt_ms: f64, heart_rate: f64) -> Option<f64> {
    if heart_rate <= 0.0 {
        return None;
    }
    let rr = 60.0 / heart_rate;
    ratio(qt_ms, rr.sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64, tol: f64) -> bool {
        (a - b).abs() <= tol
    }

    #[test]
    fn test_tbw_fraction_table() {
        assert_eq!(tbw_fraction(Sex::Male, 40.0), 0.6);
        assert_eq!(tbw_fraction(Sex::Male, 65.0), 0.5);
        assert_eq!(tbw_fraction(Sex::Female, 64.9), 0.5);
        assert_eq!(tbw_fraction(Sex::Female, 80.0), 0.45);
    }

    #[test]
    fn test_free_water_deficit() {
        let deficit = free_water_deficit(160.0, 70.0, Sex::Male, 40.0);
        assert!(close(deficit, 6.0, 1e-9));
    }

    #[test]
    fn test_corrected_sodium_reference() {
        // Na 130, glucose 500 -> 136.4 (Katz)
        assert!(close(corrected_sodium_katz(130.0, 500.0), 136.4, 1e-9));
        assert!(close(corrected_sodium_hillier(130.0, 500.0), 139.6, 1e-9));
    }

    #[test]
    fn test_sodium_deficit() {
        assert!(close(sodium_deficit(120.0, 130.0, 70.0, Sex::Female, 40.0), 350.0, 1e-9));
    }

    #[test]
    fn test_adrogue_madias() {
        let delta = adrogue_madias(110.0, 513.0, 0.0, 70.0, Sex::Male, 40.0);
        assert!(close(delta, 9.372, 0.001));
    }

    #[test]
    fn test_efwc() {
        let efwc = electrolyte_free_water_clearance(2.0, 50.0, 30.0, 140.0).unwrap();
        assert!(close(efwc, 0.857, 0.001));
        assert_eq!(electrolyte_free_water_clearance(2.0, 50.0, 30.0, 0.0), None);
    }

    #[test]
    fn test_calcium() {
        assert!(close(corrected_calcium(8.0, 2.0), 9.6, 1e-9));
        assert_eq!(calcium_phosphate_product(10.0, 5.0), 50.0);
    }

    #[test]
    fn test_ttkg() {
        assert!(close(ttkg(40.0, 4.0, 600.0, 300.0).unwrap(), 5.0, 1e-9));
        assert_eq!(ttkg(40.0, 0.0, 600.0, 300.0), None);
        assert_eq!(ttkg(40.0, 4.0, 0.0, 300.0), None);
    }

    #[test]
    fn test_qtc_bazett() {
        assert!(close(qtc_bazett(400.0, 60.0).unwrap(), 400.0, 1e-9));
        assert!(close(qtc_bazett(400.0, 90.0).unwrap(), 489.9, 0.1));
    }

    #[test]
    fn test_qtc_heart_rate_guard() {
        assert_eq!(qtc_bazett(400.0, 0.0), None);
        assert_eq!(qtc_bazett(400.0, -10.0), None);
    }
}
