//! Inputs and adapters shared by several calculator groups.

use super::{CalculatorInput, SelectOption};
use crate::errors::CalcResult;
use crate::interpretation::{Inclusivity, ReferenceRange};
use crate::outputs::Output;
use crate::units::CREATININE;

pub const SEX_OPTIONS: &[SelectOption] = &[SelectOption::new("male", "Male"), SelectOption::new("female", "Female")];

pub fn age() -> CalculatorInput {
    CalculatorInput::number("age", "Age").fixed("years").range(18.0, 110.0)
}

pub fn sex() -> CalculatorInput {
    CalculatorInput::select("sex", "Sex", SEX_OPTIONS)
}

pub fn creatinine() -> CalculatorInput {
    CalculatorInput::number("creatinine", "Serum creatinine")
        .unit(&CREATININE)
        .range(0.1, 20.0)
}

pub fn weight() -> CalculatorInput {
    CalculatorInput::number("weight", "Weight").fixed("kg").range(20.0, 300.0)
}

pub fn height() -> CalculatorInput {
    CalculatorInput::number("height", "Height").fixed("cm").range(100.0, 230.0)
}

pub fn sodium(id: &'static str, label: &'static str) -> CalculatorInput {
    CalculatorInput::number(id, label).fixed("mEq/L").range(100.0, 180.0)
}

pub fn mmhg(id: &'static str, label: &'static str, min: f64, max: f64) -> CalculatorInput {
    CalculatorInput::number(id, label).fixed("mmHg").range(min, max)
}

/// Wrap a formula that reports out-of-domain input as `None`.
pub fn scalar(value: Option<f64>, reason: &str) -> CalcResult<Output> {
    Ok(Output::from_option(value, reason))
}

/// Reference range row for hand-written interpretation tables.
pub fn range(label: &'static str, min: Option<f64>, max: Option<f64>, unit: &'static str) -> ReferenceRange {
    ReferenceRange {
        label,
        min,
        max,
        unit,
        inclusive: Inclusivity::LowerInclusive,
    }
}
