//! # Clinical Formulas
//!
//! Every published equation used by the calculators, as plain functions.
//! Keeping them in one place makes each one easy to check against its
//! literature source, and lets formulas compose (eKt/V reuses spKt/V,
//! PD Kt/V reuses Watson TBW).
//!
//! ## Conventions
//!
//! - Inputs are always in **conventional** units (mg/dL, g/dL, kg, cm,
//!   minutes where noted). SI inputs are normalized before they get here.
//! - Functions are pure: no state, same inputs → same output.
//! - A function that can leave its mathematical domain returns `Option`;
//!   `None` means "unable to calculate" and is never a panic.
//! - Results are **unrounded**; the registry rounds for display.
//!
//! ## Modules
//!
//! - [`kidney_function`] - eGFR equations, clearance, KFRE, albuminuria
//! - [`aki`] - fractional excretions and urine indices
//! - [`acid_base`] - anion gaps, osmolality, Winter's formula
//! - [`electrolytes`] - sodium, water, calcium, potassium, QTc
//! - [`dialysis`] - Kt/V family, URR, TBW, nPCR
//! - [`transplant`] - KDRI/KDPI, EPTS, Banff classification
//! - [`scores`] - point-based clinical scores and checklists
//! - [`cardiovascular`] - Pooled Cohort Equations
//! - [`body`] - anthropometrics and iron indices

pub mod acid_base;
pub mod aki;
pub mod body;
pub mod cardiovascular;
pub mod dialysis;
pub mod electrolytes;
pub mod kidney_function;
pub mod scores;
pub mod transplant;

use serde::{Deserialize, Serialize};

/// Biological sex, as used by sex-specific coefficients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sex {
    Male,
    Female,
}

impl Sex {
    /// Parse the select-input value ("male" / "female")
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "male" => Some(Sex::Male),
            "female" => Some(Sex::Female),
            _ => None,
        }
    }

    pub fn is_female(self) -> bool {
        self == Sex::Female
    }
}

/// `numerator / denominator`, or `None` when the denominator is zero or
/// the quotient is not finite.
#[inline]
pub(crate) fn ratio(numerator: f64, denominator: f64) -> Option<f64> {
    if denominator == 0.0 {
        return None;
    }
    let q = numerator / denominator;
    q.is_finite().then_some(q)
}

/// Natural log, or `None` for non-positive arguments.
#[inline]
pub(crate) fn ln_positive(x: f64) -> Option<f64> {
    (x > 0.0).then(|| x.ln())
}
