//! # Input Values
//!
//! What a caller hands to the evaluator ([`RawInputs`]: values as typed,
//! plus a unit selection per unit-bound input) and what a compute function
//! receives ([`NormalizedInputs`]: every value in conventional units).
//!
//! ## JSON Example
//!
//! ```json
//! {
//!   "values": { "creatinine": 88.4, "age": 55, "sex": "male" },
//!   "units": { "creatinine": "si" }
//! }
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::errors::{CalcError, CalcResult};
use crate::formulas::Sex;
use crate::units::UnitSystem;

/// A single entered value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum InputValue {
    Number(f64),
    Flag(bool),
    Choice(String),
}

impl InputValue {
    /// Kind name used in error messages
    pub fn kind_name(&self) -> &'static str {
        match self {
            InputValue::Number(_) => "number",
            InputValue::Flag(_) => "boolean",
            InputValue::Choice(_) => "choice",
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            InputValue::Number(v) => Some(*v),
            _ => None,
        }
    }
}

impl std::fmt::Display for InputValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InputValue::Number(v) => write!(f, "{}", v),
            InputValue::Flag(b) => write!(f, "{}", b),
            InputValue::Choice(s) => write!(f, "{}", s),
        }
    }
}

impl From<f64> for InputValue {
    fn from(v: f64) -> Self {
        InputValue::Number(v)
    }
}

impl From<bool> for InputValue {
    fn from(b: bool) -> Self {
        InputValue::Flag(b)
    }
}

impl From<&str> for InputValue {
    fn from(s: &str) -> Self {
        InputValue::Choice(s.to_string())
    }
}

impl From<String> for InputValue {
    fn from(s: String) -> Self {
        InputValue::Choice(s)
    }
}

/// Values as entered, with the unit system chosen for each bound input.
///
/// Inputs without a unit selection are taken as conventional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawInputs {
    #[serde(default)]
    pub values: BTreeMap<String, InputValue>,
    #[serde(default)]
    pub units: BTreeMap<String, UnitSystem>,
}

impl RawInputs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a value (builder style)
    pub fn with(mut self, id: &str, value: impl Into<InputValue>) -> Self {
        self.values.insert(id.to_string(), value.into());
        self
    }

    /// Select the unit system for one input (builder style)
    pub fn with_unit(mut self, id: &str, unit: UnitSystem) -> Self {
        self.units.insert(id.to_string(), unit);
        self
    }

    pub fn set(&mut self, id: &str, value: impl Into<InputValue>) {
        self.values.insert(id.to_string(), value.into());
    }

    pub fn clear(&mut self, id: &str) {
        self.values.remove(id);
    }

    pub fn get(&self, id: &str) -> Option<&InputValue> {
        self.values.get(id)
    }

    /// Unit system selected for `id` (conventional when never set)
    pub fn unit(&self, id: &str) -> UnitSystem {
        self.units.get(id).copied().unwrap_or_default()
    }
}

/// Input values after unit normalization, keyed by input id.
///
/// Every number is in conventional units. An absent boolean reads as
/// `false` (an unticked checklist item).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NormalizedInputs {
    values: BTreeMap<String, InputValue>,
}

impl NormalizedInputs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a value (builder style)
    pub fn with(mut self, id: &str, value: impl Into<InputValue>) -> Self {
        self.insert(id, value);
        self
    }

    pub fn insert(&mut self, id: &str, value: impl Into<InputValue>) {
        self.values.insert(id.to_string(), value.into());
    }

    pub fn contains(&self, id: &str) -> bool {
        self.values.contains_key(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &InputValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Required numeric value.
    pub fn number(&self, id: &str) -> CalcResult<f64> {
        self.optional_number(id)?.ok_or_else(|| CalcError::missing_field(id))
    }

    /// Numeric value that may be left blank.
    pub fn optional_number(&self, id: &str) -> CalcResult<Option<f64>> {
        match self.values.get(id) {
            None => Ok(None),
            Some(InputValue::Number(v)) => Ok(Some(*v)),
            Some(other) => Err(wrong_kind(id, other, "number")),
        }
    }

    /// Boolean value; absent means `false`.
    pub fn flag(&self, id: &str) -> CalcResult<bool> {
        match self.values.get(id) {
            None => Ok(false),
            Some(InputValue::Flag(b)) => Ok(*b),
            Some(other) => Err(wrong_kind(id, other, "boolean")),
        }
    }

    /// Selected option code.
    pub fn choice(&self, id: &str) -> CalcResult<&str> {
        match self.values.get(id) {
            None => Err(CalcError::missing_field(id)),
            Some(InputValue::Choice(s)) => Ok(s.as_str()),
            Some(other) => Err(wrong_kind(id, other, "choice")),
        }
    }

    /// Selected sex ("male" / "female").
    pub fn sex(&self, id: &str) -> CalcResult<Sex> {
        let code = self.choice(id)?;
        Sex::from_code(code).ok_or_else(|| CalcError::invalid_input(id, code, "Expected 'male' or 'female'"))
    }

    /// Ordinal score selected as a digit option ("0".."3").
    pub fn ordinal(&self, id: &str) -> CalcResult<u8> {
        let code = self.choice(id)?;
        code.parse::<u8>()
            .map_err(|_| CalcError::invalid_input(id, code, "Expected an ordinal score"))
    }
}

fn wrong_kind(id: &str, value: &InputValue, expected: &str) -> CalcError {
    CalcError::invalid_input(
        id,
        value.to_string(),
        format!("Expected a {}, got a {}", expected, value.kind_name()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_inputs_json_shape() {
        let raw = RawInputs::new()
            .with("creatinine", 88.4)
            .with("sex", "male")
            .with("black", false)
            .with_unit("creatinine", UnitSystem::Si);

        let json = serde_json::to_string(&raw).unwrap();
        assert_eq!(
            json,
            r#"{"values":{"black":false,"creatinine":88.4,"sex":"male"},"units":{"creatinine":"si"}}"#
        );

        let parsed: RawInputs = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, raw);
        assert_eq!(parsed.unit("creatinine"), UnitSystem::Si);
        assert_eq!(parsed.unit("age"), UnitSystem::Conventional);
    }

    #[test]
    fn test_units_block_optional() {
        let parsed: RawInputs = serde_json::from_str(r#"{"values":{"age":40}}"#).unwrap();
        assert_eq!(parsed.get("age"), Some(&InputValue::Number(40.0)));
        assert!(parsed.units.is_empty());
    }

    #[test]
    fn test_typed_getters() {
        let inputs = NormalizedInputs::new()
            .with("age", 55.0)
            .with("sex", "female")
            .with("dsa", true)
            .with("g", "2");

        assert_eq!(inputs.number("age").unwrap(), 55.0);
        assert_eq!(inputs.sex("sex").unwrap(), Sex::Female);
        assert!(inputs.flag("dsa").unwrap());
        assert!(!inputs.flag("smoker").unwrap());
        assert_eq!(inputs.ordinal("g").unwrap(), 2);
        assert_eq!(inputs.optional_number("ethanol").unwrap(), None);
    }

    #[test]
    fn test_getter_errors() {
        let inputs = NormalizedInputs::new().with("age", "old").with("sex", "unknown");

        assert!(matches!(inputs.number("weight"), Err(CalcError::MissingField { .. })));
        assert!(matches!(inputs.number("age"), Err(CalcError::InvalidInput { .. })));
        assert!(matches!(inputs.sex("sex"), Err(CalcError::InvalidInput { .. })));
        assert!(matches!(inputs.flag("age"), Err(CalcError::InvalidInput { .. })));
    }
}
