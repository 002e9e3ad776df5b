//! # Unit Conversions
//!
//! Laboratory values arrive either in conventional clinical units (mg/dL,
//! g/dL) or in SI units (µmol/L, mmol/L, g/L). Every formula in
//! [`crate::formulas`] is written against the **conventional** unit, so the
//! evaluator normalizes each unit-bound input right before compute.
//!
//! All supported conversions are multiplicative through the origin:
//!
//! ```text
//! SI = conventional × factor
//! conventional = SI / factor
//! ```
//!
//! A lab value that needs an additive offset cannot be expressed by
//! [`UnitConversion`]; the type has to grow an offset field first.
//!
//! ## Example
//!
//! ```rust
//! use nephro_core::units::{normalize, UnitSystem, CREATININE};
//!
//! // 88.4 µmol/L creatinine is 1.0 mg/dL
//! let mg_dl = normalize(88.4, Some(&CREATININE), UnitSystem::Si);
//! assert!((mg_dl - 1.0).abs() < 1e-12);
//!
//! // Unbound inputs pass through untouched
//! assert_eq!(normalize(140.0, None, UnitSystem::Si), 140.0);
//! ```

use serde::{Deserialize, Serialize};

/// Which unit system the caller entered a value in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitSystem {
    /// Conventional clinical units (mg/dL, g/dL, µg/dL)
    #[default]
    Conventional,
    /// International System units (µmol/L, mmol/L, g/L)
    Si,
}

impl UnitSystem {
    /// The other unit system
    pub fn toggled(self) -> Self {
        match self {
            UnitSystem::Conventional => UnitSystem::Si,
            UnitSystem::Si => UnitSystem::Conventional,
        }
    }

    /// Display name for unit toggles
    pub fn display_name(&self) -> &'static str {
        match self {
            UnitSystem::Conventional => "Conventional",
            UnitSystem::Si => "SI",
        }
    }
}

/// A conventional ↔ SI conversion for one analyte.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct UnitConversion {
    /// Stable identifier (e.g., "creatinine")
    pub id: &'static str,
    /// Conventional unit label (e.g., "mg/dL")
    pub conventional: &'static str,
    /// SI unit label (e.g., "µmol/L")
    pub si: &'static str,
    /// Multiplier from conventional to SI; always > 0
    pub factor: f64,
}

impl UnitConversion {
    pub const fn new(id: &'static str, conventional: &'static str, si: &'static str, factor: f64) -> Self {
        Self {
            id,
            conventional,
            si,
            factor,
        }
    }

    /// Convert a conventional value to SI
    #[inline]
    pub fn to_si(&self, conventional: f64) -> f64 {
        conventional * self.factor
    }

    /// Convert an SI value to conventional
    #[inline]
    pub fn to_conventional(&self, si: f64) -> f64 {
        si / self.factor
    }

    /// Unit label for the given system
    pub fn label(&self, system: UnitSystem) -> &'static str {
        match system {
            UnitSystem::Conventional => self.conventional,
            UnitSystem::Si => self.si,
        }
    }

    /// Re-express `value` (entered in `from`) in the `to` system.
    pub fn convert(&self, value: f64, from: UnitSystem, to: UnitSystem) -> f64 {
        match (from, to) {
            (UnitSystem::Conventional, UnitSystem::Si) => self.to_si(value),
            (UnitSystem::Si, UnitSystem::Conventional) => self.to_conventional(value),
            _ => value,
        }
    }
}

// ============================================================================
// Conversion Table
// ============================================================================

/// Serum / urine creatinine: mg/dL ↔ µmol/L
pub const CREATININE: UnitConversion = UnitConversion::new("creatinine", "mg/dL", "µmol/L", 88.4);

/// Blood urea nitrogen (mg/dL) ↔ urea (mmol/L)
pub const UREA_NITROGEN: UnitConversion = UnitConversion::new("urea_nitrogen", "mg/dL", "mmol/L", 0.357);

/// Glucose: mg/dL ↔ mmol/L
pub const GLUCOSE: UnitConversion = UnitConversion::new("glucose", "mg/dL", "mmol/L", 0.0555);

/// Total calcium: mg/dL ↔ mmol/L
pub const CALCIUM: UnitConversion = UnitConversion::new("calcium", "mg/dL", "mmol/L", 0.25);

/// Inorganic phosphate: mg/dL ↔ mmol/L
pub const PHOSPHATE: UnitConversion = UnitConversion::new("phosphate", "mg/dL", "mmol/L", 0.3229);

/// Serum albumin: g/dL ↔ g/L
pub const ALBUMIN: UnitConversion = UnitConversion::new("albumin", "g/dL", "g/L", 10.0);

/// Hemoglobin: g/dL ↔ g/L
pub const HEMOGLOBIN: UnitConversion = UnitConversion::new("hemoglobin", "g/dL", "g/L", 10.0);

/// Total bilirubin: mg/dL ↔ µmol/L
pub const BILIRUBIN: UnitConversion = UnitConversion::new("bilirubin", "mg/dL", "µmol/L", 17.1);

/// Total / HDL cholesterol: mg/dL ↔ mmol/L
pub const CHOLESTEROL: UnitConversion = UnitConversion::new("cholesterol", "mg/dL", "mmol/L", 0.02586);

/// Serum iron / TIBC: µg/dL ↔ µmol/L
pub const IRON: UnitConversion = UnitConversion::new("iron", "µg/dL", "µmol/L", 0.179);

/// Urine albumin-to-creatinine ratio: mg/g ↔ mg/mmol
pub const ALBUMIN_CREATININE_RATIO: UnitConversion =
    UnitConversion::new("albumin_creatinine_ratio", "mg/g", "mg/mmol", 0.113);

/// Every conversion known to the registry.
pub const ALL_CONVERSIONS: &[UnitConversion] = &[
    CREATININE,
    UREA_NITROGEN,
    GLUCOSE,
    CALCIUM,
    PHOSPHATE,
    ALBUMIN,
    HEMOGLOBIN,
    BILIRUBIN,
    CHOLESTEROL,
    IRON,
    ALBUMIN_CREATININE_RATIO,
];

/// Look up a conversion by id.
pub fn conversion(id: &str) -> Option<&'static UnitConversion> {
    ALL_CONVERSIONS.iter().find(|c| c.id == id)
}

/// Express `raw` in the conventional unit the formulas expect.
///
/// - no binding: `raw` unchanged
/// - binding and `Si` selected: `raw / factor`
/// - binding and `Conventional` selected: `raw` unchanged
#[inline]
pub fn normalize(raw: f64, binding: Option<&UnitConversion>, selected: UnitSystem) -> f64 {
    match (binding, selected) {
        (Some(conv), UnitSystem::Si) => conv.to_conventional(raw),
        _ => raw,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_factors_positive() {
        for conv in ALL_CONVERSIONS {
            assert!(conv.factor > 0.0, "{} has non-positive factor", conv.id);
        }
    }

    #[test]
    fn test_round_trip_all_conversions() {
        let samples = [1e-3, 0.1, 0.7, 1.0, 2.5, 13.0, 88.4, 140.0, 1234.5, 1e6];
        for conv in ALL_CONVERSIONS {
            for &x in &samples {
                let back = conv.to_conventional(conv.to_si(x));
                assert!(
                    ((back - x) / x).abs() < 1e-12,
                    "{}: {} -> {} -> {}",
                    conv.id,
                    x,
                    conv.to_si(x),
                    back
                );
            }
        }
    }

    #[test]
    fn test_creatinine_conversion() {
        assert!((CREATININE.to_si(1.0) - 88.4).abs() < 1e-12);
        assert!((CREATININE.to_conventional(176.8) - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize(1.2, Some(&CREATININE), UnitSystem::Conventional), 1.2);
        assert!((normalize(44.2, Some(&CREATININE), UnitSystem::Si) - 0.5).abs() < 1e-12);
        assert_eq!(normalize(140.0, None, UnitSystem::Si), 140.0);
    }

    #[test]
    fn test_convert_between_systems() {
        let si = ALBUMIN.convert(3.5, UnitSystem::Conventional, UnitSystem::Si);
        assert!((si - 35.0).abs() < 1e-12);
        assert_eq!(ALBUMIN.convert(3.5, UnitSystem::Si, UnitSystem::Si), 3.5);
        assert!((ALBUMIN.convert(si, UnitSystem::Si, UnitSystem::Conventional) - 3.5).abs() < 1e-12);
    }

    #[test]
    fn test_lookup_and_labels() {
        let conv = conversion("glucose").unwrap();
        assert_eq!(conv.label(UnitSystem::Conventional), "mg/dL");
        assert_eq!(conv.label(UnitSystem::Si), "mmol/L");
        assert!(conversion("unobtainium").is_none());
    }

    #[test]
    fn test_unit_system_serialization() {
        assert_eq!(serde_json::to_string(&UnitSystem::Si).unwrap(), "\"si\"");
        let parsed: UnitSystem = serde_json::from_str("\"conventional\"").unwrap();
        assert_eq!(parsed, UnitSystem::Conventional);
        assert_eq!(UnitSystem::Si.toggled(), UnitSystem::Conventional);
    }
}
