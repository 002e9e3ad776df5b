//! # Calculator Session State
//!
//! Transient state for the calculator currently on screen: the values typed
//! so far and the unit system chosen for each unit-bound input. Created when
//! a calculator is selected, discarded when another one is. Never persisted.
//!
//! Switching an input's unit converts its entered value, so the field keeps
//! denoting the same quantity (1.2 mg/dL becomes 106.08 µmol/L).
//!
//! ## Example
//!
//! ```rust
//! use nephro_core::session::CalculatorState;
//! use nephro_core::units::UnitSystem;
//!
//! let mut state = CalculatorState::new("ckd_epi_2021", UnitSystem::Conventional).unwrap();
//! state.set_value("creatinine", 1.2).unwrap();
//! state.set_value("age", 55.0).unwrap();
//! state.set_value("sex", "male").unwrap();
//! state.toggle_unit("creatinine").unwrap();
//! assert_eq!(state.unit("creatinine"), UnitSystem::Si);
//!
//! let evaluation = state.evaluate().unwrap();
//! assert_eq!(evaluation.category, Some("Mild decrease"));
//! ```

use tracing::debug;

use crate::errors::{CalcError, CalcResult};
use crate::evaluator::{self, Evaluation};
use crate::inputs::{InputValue, RawInputs};
use crate::registry::{self, Calculator, CalculatorInput};
use crate::units::UnitSystem;

/// Entered values and unit selections for one calculator.
#[derive(Debug, Clone)]
pub struct CalculatorState {
    calculator: &'static Calculator,
    default_units: UnitSystem,
    raw: RawInputs,
}

impl CalculatorState {
    /// Fresh state for a calculator, with `default_units` on every bound input.
    pub fn new(calculator_id: &str, default_units: UnitSystem) -> CalcResult<Self> {
        let calculator =
            registry::get(calculator_id).ok_or_else(|| CalcError::unknown_calculator(calculator_id))?;
        let mut state = Self {
            calculator,
            default_units,
            raw: RawInputs::new(),
        };
        state.reset();
        Ok(state)
    }

    pub fn calculator(&self) -> &'static Calculator {
        self.calculator
    }

    pub fn raw_inputs(&self) -> &RawInputs {
        &self.raw
    }

    /// Discard everything entered and restore default unit selections.
    pub fn reset(&mut self) {
        self.raw = RawInputs::new();
        for input in self.calculator.unit_bound_inputs() {
            self.raw.units.insert(input.id.to_string(), self.default_units);
        }
    }

    /// Switch to another calculator; all entered state is dropped.
    pub fn select(&mut self, calculator_id: &str) -> CalcResult<()> {
        let calculator =
            registry::get(calculator_id).ok_or_else(|| CalcError::unknown_calculator(calculator_id))?;
        debug!(from = self.calculator.id, to = calculator.id, "calculator selected");
        self.calculator = calculator;
        self.reset();
        Ok(())
    }

    fn input(&self, input_id: &str) -> CalcResult<&'static CalculatorInput> {
        self.calculator
            .input_by_id(input_id)
            .ok_or_else(|| CalcError::unknown_input(self.calculator.id, input_id))
    }

    pub fn set_value(&mut self, input_id: &str, value: impl Into<InputValue>) -> CalcResult<()> {
        let input = self.input(input_id)?;
        self.raw.set(input.id, value);
        Ok(())
    }

    pub fn clear_value(&mut self, input_id: &str) -> CalcResult<()> {
        let input = self.input(input_id)?;
        self.raw.clear(input.id);
        Ok(())
    }

    /// The value shown in a field: what was entered, else the default in
    /// the field's current unit.
    pub fn value(&self, input_id: &str) -> Option<InputValue> {
        let input = self.calculator.input_by_id(input_id)?;
        if let Some(value) = self.raw.get(input_id) {
            return Some(value.clone());
        }
        match (&input.default, input.unit) {
            (Some(InputValue::Number(v)), Some(conversion)) => Some(InputValue::Number(conversion.convert(
                *v,
                UnitSystem::Conventional,
                self.unit(input_id),
            ))),
            (default, _) => default.clone(),
        }
    }

    pub fn unit(&self, input_id: &str) -> UnitSystem {
        self.raw.unit(input_id)
    }

    /// Change an input's unit system, converting any entered number.
    ///
    /// Inputs without a conversion have nothing to switch and are rejected.
    pub fn set_unit(&mut self, input_id: &str, system: UnitSystem) -> CalcResult<()> {
        let input = self.input(input_id)?;
        let conversion = input.unit.ok_or_else(|| {
            CalcError::invalid_input(input.id, format!("{:?}", system), "Input has a fixed unit")
        })?;

        let current = self.unit(input.id);
        if current == system {
            return Ok(());
        }
        if let Some(InputValue::Number(v)) = self.raw.get(input.id) {
            let converted = conversion.convert(*v, current, system);
            self.raw.set(input.id, converted);
        }
        self.raw.units.insert(input.id.to_string(), system);
        Ok(())
    }

    /// Flip between conventional and SI.
    pub fn toggle_unit(&mut self, input_id: &str) -> CalcResult<UnitSystem> {
        let next = self.unit(input_id).toggled();
        self.set_unit(input_id, next)?;
        Ok(next)
    }

    /// Required inputs still empty (defaults count as filled).
    pub fn missing_inputs(&self) -> Vec<&'static str> {
        self.calculator
            .inputs
            .iter()
            .filter(|input| input.required && input.default.is_none() && self.raw.get(input.id).is_none())
            .map(|input| input.id)
            .collect()
    }

    pub fn is_ready(&self) -> bool {
        self.missing_inputs().is_empty()
    }

    pub fn evaluate(&self) -> CalcResult<Evaluation> {
        evaluator::evaluate(self.calculator.id, &self.raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_state_uses_default_units() {
        let state = CalculatorState::new("fena", UnitSystem::Si).unwrap();
        assert_eq!(state.unit("creatinine"), UnitSystem::Si);
        assert_eq!(state.unit("urine_creatinine"), UnitSystem::Si);
        assert_eq!(state.raw_inputs().units.len(), 2);
        assert!(state.raw_inputs().values.is_empty());
    }

    #[test]
    fn test_toggle_converts_value() {
        let mut state = CalculatorState::new("ckd_epi_2021", UnitSystem::Conventional).unwrap();
        state.set_value("creatinine", 1.2).unwrap();

        assert_eq!(state.toggle_unit("creatinine").unwrap(), UnitSystem::Si);
        let si = state.value("creatinine").and_then(|v| v.as_number()).unwrap();
        assert!((si - 106.08).abs() < 1e-9);

        assert_eq!(state.toggle_unit("creatinine").unwrap(), UnitSystem::Conventional);
        let back = state.value("creatinine").and_then(|v| v.as_number()).unwrap();
        assert!((back - 1.2).abs() < 1e-12);
    }

    #[test]
    fn test_evaluation_survives_unit_toggle() {
        let mut state = CalculatorState::new("ckd_epi_2021", UnitSystem::Conventional).unwrap();
        state.set_value("creatinine", 1.2).unwrap();
        state.set_value("age", 55.0).unwrap();
        state.set_value("sex", "female").unwrap();
        let before = state.evaluate().unwrap();

        state.toggle_unit("creatinine").unwrap();
        let after = state.evaluate().unwrap();
        assert_eq!(before.output, after.output);
    }

    #[test]
    fn test_sex_must_be_chosen() {
        let mut state = CalculatorState::new("ckd_epi_2021", UnitSystem::Conventional).unwrap();
        state.set_value("creatinine", 1.2).unwrap();
        state.set_value("age", 55.0).unwrap();
        assert_eq!(state.missing_inputs(), vec!["sex"]);
        assert_eq!(state.value("sex"), None);
        match state.evaluate() {
            Err(CalcError::NotReady { missing, .. }) => assert_eq!(missing, vec!["sex".to_string()]),
            other => panic!("expected NotReady, got {:?}", other),
        }

        state.set_value("sex", "male").unwrap();
        assert!(state.is_ready());
        assert!(state.evaluate().is_ok());
    }

    #[test]
    fn test_toggle_twice_restores_unit() {
        let mut state = CalculatorState::new("fena", UnitSystem::Si).unwrap();
        assert_eq!(state.toggle_unit("creatinine").unwrap(), UnitSystem::Conventional);
        assert_eq!(state.toggle_unit("creatinine").unwrap(), UnitSystem::Si);
        assert_eq!(state.unit("urine_creatinine"), UnitSystem::Si);
    }

    #[test]
    fn test_fixed_unit_cannot_toggle() {
        let mut state = CalculatorState::new("ckd_epi_2021", UnitSystem::Conventional).unwrap();
        assert!(matches!(state.toggle_unit("age"), Err(CalcError::InvalidInput { .. })));
        assert!(matches!(state.toggle_unit("nope"), Err(CalcError::UnknownInput { .. })));
    }

    #[test]
    fn test_default_shown_in_current_unit() {
        let mut state = CalculatorState::new("iron_deficit_ganzoni", UnitSystem::Conventional).unwrap();
        assert_eq!(state.value("target_hemoglobin"), Some(InputValue::Number(15.0)));

        state.set_unit("target_hemoglobin", UnitSystem::Si).unwrap();
        assert_eq!(state.value("target_hemoglobin"), Some(InputValue::Number(150.0)));
        assert!(state.raw_inputs().get("target_hemoglobin").is_none());
    }

    #[test]
    fn test_missing_inputs_and_select_resets() {
        let mut state = CalculatorState::new("anion_gap", UnitSystem::Conventional).unwrap();
        assert_eq!(state.missing_inputs(), vec!["sodium", "chloride", "bicarbonate"]);
        assert!(matches!(state.evaluate(), Err(CalcError::NotReady { .. })));

        state.set_value("sodium", 140.0).unwrap();
        state.set_value("chloride", 104.0).unwrap();
        state.set_value("bicarbonate", 24.0).unwrap();
        assert!(state.is_ready());
        assert_eq!(state.evaluate().unwrap().category, Some("Normal"));

        state.select("bmi").unwrap();
        assert_eq!(state.calculator().id, "bmi");
        assert!(state.raw_inputs().values.is_empty());
        assert!(state.select("frax").is_err());
        assert_eq!(state.calculator().id, "bmi");
    }

    #[test]
    fn test_set_value_rejects_unknown_input() {
        let mut state = CalculatorState::new("bmi", UnitSystem::Conventional).unwrap();
        assert!(matches!(state.set_value("shoe_size", 44.0), Err(CalcError::UnknownInput { .. })));
        state.set_value("weight", 70.0).unwrap();
        state.clear_value("weight").unwrap();
        assert_eq!(state.value("weight"), None);
    }
}
