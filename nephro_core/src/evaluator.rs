//! # Evaluator
//!
//! Runs a calculator end to end:
//!
//! ```text
//! RawInputs ─ normalize ─ validate ─ defaults ─ ready? ─ compute ─ sanitize ─ round ─ interpret
//! ```
//!
//! The same steps are exposed one by one ([`normalize`], [`compute`],
//! [`interpret`]) for callers that drive the two-call contract themselves.
//!
//! ## Example
//!
//! ```rust
//! use nephro_core::evaluator;
//! use nephro_core::inputs::RawInputs;
//! use nephro_core::units::UnitSystem;
//!
//! let raw = RawInputs::new()
//!     .with("creatinine", 106.1)
//!     .with_unit("creatinine", UnitSystem::Si)
//!     .with("age", 55.0)
//!     .with("sex", "male");
//!
//! let evaluation = evaluator::evaluate("ckd_epi_2021", &raw).unwrap();
//! assert_eq!(evaluation.category, Some("Mild decrease"));
//! ```

use serde::Serialize;
use tracing::{debug, error, warn};

use crate::errors::{CalcError, CalcResult};
use crate::inputs::{InputValue, NormalizedInputs, RawInputs};
use crate::outputs::Output;
use crate::registry::{self, Calculator, CalculatorInput, InputKind};
use crate::units::{self, UnitSystem};

/// Shown in place of a number when the inputs are outside a formula's domain.
pub const UNDEFINED_DISPLAY: &str = "Unable to calculate";

/// Outcome of one [`evaluate`] call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Evaluation {
    pub calculator_id: &'static str,
    /// Rounded to the calculator's precision
    pub output: Output,
    /// `None` when the output is undefined
    pub category: Option<&'static str>,
    /// Primary result formatted for display, with its unit
    pub display: String,
    /// Values outside their expected range (they do not block evaluation)
    pub warnings: Vec<String>,
}

impl Evaluation {
    pub fn is_undefined(&self) -> bool {
        self.output.is_undefined()
    }
}

fn lookup(calculator_id: &str) -> CalcResult<&'static Calculator> {
    registry::get(calculator_id).ok_or_else(|| {
        error!(calculator_id, "unknown calculator");
        CalcError::unknown_calculator(calculator_id)
    })
}

fn input_of<'a>(calc: &'a Calculator, input_id: &str) -> CalcResult<&'a CalculatorInput> {
    calc.input_by_id(input_id).ok_or_else(|| {
        error!(calculator_id = calc.id, input_id, "unknown input");
        CalcError::unknown_input(calc.id, input_id)
    })
}

/// Express one raw value in the conventional unit its formula expects.
pub fn normalize(calculator_id: &str, input_id: &str, raw: f64, unit: UnitSystem) -> CalcResult<f64> {
    let calc = lookup(calculator_id)?;
    let input = input_of(calc, input_id)?;
    Ok(units::normalize(raw, input.unit, unit))
}

/// Run a calculator on inputs that are already in conventional units.
///
/// Defaults fill absent inputs; a missing required input fails with
/// `NotReady` instead of reaching the formula. The output is sanitized and
/// rounded to the calculator's precision.
pub fn compute(calculator_id: &str, inputs: &NormalizedInputs) -> CalcResult<Output> {
    let calc = lookup(calculator_id)?;
    for (id, value) in inputs.iter() {
        validate_kind(input_of(calc, id)?, value)?;
    }
    let mut inputs = inputs.clone();
    complete(calc, &mut inputs)?;
    run(calc, &inputs)
}

/// Category label for a primary scalar (rounded to display precision by the caller).
pub fn interpret(calculator_id: &str, value: f64) -> CalcResult<&'static str> {
    Ok(lookup(calculator_id)?.interpret(value))
}

/// Normalize, validate, compute, round and interpret in one call.
pub fn evaluate(calculator_id: &str, raw: &RawInputs) -> CalcResult<Evaluation> {
    let calc = lookup(calculator_id)?;
    let (mut inputs, warnings) = prepare(calc, raw)?;
    complete(calc, &mut inputs)?;
    let output = run(calc, &inputs)?;

    let (category, display) = match output.primary_scalar() {
        Some(value) => (Some(calc.interpret(value)), display_value(calc, &output, value)),
        None => {
            match &output {
                Output::Undefined { reason } => {
                    warn!(calculator_id = calc.id, reason = reason.as_str(), "result undefined")
                }
                Output::Record(record) => {
                    warn!(calculator_id = calc.id, field = record.primary, "primary field undefined")
                }
                _ => {}
            }
            (None, UNDEFINED_DISPLAY.to_string())
        }
    };

    let display_str = display.as_str();
    debug!(
        calculator_id = calc.id,
        display = display_str,
        category = category.unwrap_or("-"),
        warnings = warnings.len(),
        "evaluated"
    );

    Ok(Evaluation {
        calculator_id: calc.id,
        output,
        category,
        display,
        warnings,
    })
}

fn run(calc: &Calculator, inputs: &NormalizedInputs) -> CalcResult<Output> {
    Ok((calc.compute)(inputs)?.sanitized().rounded(calc.precision))
}

/// Normalize every entered value and collect range warnings.
fn prepare(calc: &Calculator, raw: &RawInputs) -> CalcResult<(NormalizedInputs, Vec<String>)> {
    for id in raw.units.keys() {
        input_of(calc, id)?;
    }

    let mut inputs = NormalizedInputs::new();
    let mut warnings = Vec::new();

    for (id, value) in &raw.values {
        let input = input_of(calc, id)?;
        validate_kind(input, value)?;

        let value = match (input.kind, value) {
            (InputKind::Number, InputValue::Number(v)) => {
                let system = raw.unit(id);
                let normalized = units::normalize(*v, input.unit, system);
                if input.out_of_range(normalized) {
                    let warning = range_warning(input, *v, system);
                    warn!(calculator_id = calc.id, input_id = input.id, value = *v, "value outside expected range");
                    warnings.push(warning);
                }
                InputValue::Number(normalized)
            }
            _ => value.clone(),
        };
        inputs.insert(input.id, value);
    }

    Ok((inputs, warnings))
}

fn validate_kind(input: &CalculatorInput, value: &InputValue) -> CalcResult<()> {
    match (input.kind, value) {
        (InputKind::Number, InputValue::Number(v)) if v.is_finite() => Ok(()),
        (InputKind::Number, InputValue::Number(v)) => {
            Err(CalcError::invalid_input(input.id, v.to_string(), "Value must be a finite number"))
        }
        (InputKind::Select(_), InputValue::Choice(code)) => match input.option(code) {
            Some(_) => Ok(()),
            None => Err(CalcError::invalid_input(input.id, code.as_str(), "Not one of the allowed options")),
        },
        (InputKind::Boolean, InputValue::Flag(_)) => Ok(()),
        (kind, other) => Err(CalcError::invalid_input(
            input.id,
            other.to_string(),
            format!("Expected a {} input, got a {}", kind.name(), other.kind_name()),
        )),
    }
}

/// Fill defaults, then refuse to compute while a required input is absent.
fn complete(calc: &Calculator, inputs: &mut NormalizedInputs) -> CalcResult<()> {
    let mut missing = Vec::new();
    for input in &calc.inputs {
        if inputs.contains(input.id) {
            continue;
        }
        match &input.default {
            Some(default) => inputs.insert(input.id, default.clone()),
            None if input.required => missing.push(input.id.to_string()),
            None => {}
        }
    }

    if missing.is_empty() {
        Ok(())
    } else {
        Err(CalcError::not_ready(calc.id, missing))
    }
}

fn range_warning(input: &CalculatorInput, entered: f64, system: UnitSystem) -> String {
    let (min, max) = match input.unit {
        Some(conversion) if system == UnitSystem::Si => (
            input.min.map(|m| conversion.to_si(m)),
            input.max.map(|m| conversion.to_si(m)),
        ),
        _ => (input.min, input.max),
    };
    let unit = input.unit_label(system);
    let bounds = match (min, max) {
        (Some(min), Some(max)) => format!("{} – {}", trim(min), trim(max)),
        (Some(min), None) => format!("≥ {}", trim(min)),
        (None, Some(max)) => format!("≤ {}", trim(max)),
        (None, None) => "any".to_string(),
    };
    if unit.is_empty() {
        format!("{} {} is outside the expected range {}", input.label, trim(entered), bounds)
    } else {
        format!("{} {} {} is outside the expected range {} {}", input.label, trim(entered), unit, bounds, unit)
    }
}

/// Up to three decimals, trailing zeros dropped.
fn trim(value: f64) -> String {
    let text = format!("{:.3}", value);
    text.trim_end_matches('0').trim_end_matches('.').to_string()
}

fn display_value(calc: &Calculator, output: &Output, value: f64) -> String {
    if let Output::Banff(classification) = output {
        return format!("{} ({})", classification.diagnosis, classification.subtype);
    }
    let number = format!("{:.*}", usize::from(calc.precision), value);
    let unit = match output {
        Output::Record(record) => record
            .fields
            .iter()
            .find(|f| f.key == record.primary)
            .map(|f| f.unit)
            .unwrap_or(calc.result_unit),
        _ => calc.result_unit,
    };
    if unit.is_empty() {
        number
    } else {
        format!("{} {}", number, unit)
    }
}
