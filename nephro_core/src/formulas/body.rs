//! # Body Composition and Iron
//!
//! Anthropometric helpers (BMI, body surface area, ideal body weight) and
//! the iron indices used in anemia workup.

use super::{ratio, Sex};

const CM_PER_INCH: f64 = 2.54;

/// Body mass index (kg/m²)
pub fn bmi(weight_kg: f64, height_cm: f64) -> Option<f64> {
    let height_m = height_cm / 100.0;
    ratio(weight_kg, height_m * height_m)
}

/// Mosteller BSA (m²): `√(height × weight / 3600)`
pub fn bsa_mosteller(weight_kg: f64, height_cm: f64) -> Option<f64> {
    let product = height_cm * weight_kg;
    (product >= 0.0).then(|| (product / 3600.0).sqrt())
}

/// Du Bois BSA (m²): `0.007184 × W^0.425 × H^0.725`
pub fn bsa_dubois(weight_kg: f64, height_cm: f64) -> Option<f64> {
    if weight_kg <= 0.0 || height_cm <= 0.0 {
        return None;
    }
    Some(0.007184 * weight_kg.powf(0.425) * height_cm.powf(0.725))
}

/// Devine ideal body weight (kg).
///
/// ```text
/// Male:   50.0 + 2.3 × (height in inches - 60)
/// Female: 45.5 + 2.3 × (height in inches - 60)
/// ```
pub fn ideal_body_weight(height_cm: f64, sex: Sex) -> f64 {
    let base = match sex {
        Sex::Male => 50.0,
        Sex::Female => 45.5,
    };
    base + 2.3 * (height_cm / CM_PER_INCH - 60.0)
}

/// Default iron stores replenished by the Ganzoni formula (mg)
pub const GANZONI_DEFAULT_STORES_MG: f64 = 500.0;

/// Ganzoni total iron deficit (mg).
///
/// ```text
/// deficit = weight × (target Hb - Hb) × 2.4 + iron stores
/// ```
///
/// Hemoglobin in g/dL.
pub fn iron_deficit_ganzoni(weight_kg: f64, hb: f64, target_hb: f64, stores_mg: f64) -> f64 {
    weight_kg * (target_hb - hb) * 2.4 + stores_mg
}

/// Transferrin saturation (%): `iron / TIBC × 100`
pub fn transferrin_saturation(iron: f64, tibc: f64) -> Option<f64> {
    ratio(iron, tibc).map(|r| r * 100.0)
}
