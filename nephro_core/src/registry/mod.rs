//! # Calculator Registry
//!
//! Central registry of every calculator: its input schema, compute
//! function, display precision, interpretation table and literature
//! references. The registry is built once on first use and never mutated.
//!
//! ## Architecture
//!
//! - [`Calculator`] bundles metadata with two plain function pointers
//!   (compute and interpret); dispatch is by id, no trait objects
//! - [`CalculatorInput`] describes one input: kind, unit binding, range
//!   hints, default
//! - one submodule per clinical group builds that group's calculators on
//!   top of [`crate::formulas`]
//!
//! ## Usage
//!
//! ```rust
//! use nephro_core::registry::{self, CalculatorCategory};
//!
//! let calc = registry::get("ckd_epi_2021").unwrap();
//! assert_eq!(calc.category, CalculatorCategory::KidneyFunction);
//! assert_eq!(calc.interpret(92.0), "Normal");
//!
//! for calc in registry::by_category(CalculatorCategory::Dialysis) {
//!     println!("{} ({})", calc.name, calc.id);
//! }
//! ```

mod acid_base;
mod aki;
mod body;
mod cardiovascular;
mod common;
mod dialysis;
mod electrolytes;
mod kidney_function;
mod scores;
mod transplant;

use std::collections::HashMap;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::errors::CalcResult;
use crate::inputs::{InputValue, NormalizedInputs};
use crate::interpretation::{BandTable, ReferenceRange};
use crate::outputs::Output;
use crate::units::{UnitConversion, UnitSystem};

// ============================================================================
// Categories
// ============================================================================

/// Clinical grouping used for browsing and ordering calculators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CalculatorCategory {
    KidneyFunction,
    AcuteKidneyInjury,
    AcidBase,
    Electrolytes,
    Dialysis,
    Transplant,
    CardiovascularRisk,
    CriticalCare,
    Rheumatology,
    Geriatrics,
    BodyComposition,
    Anemia,
}

impl CalculatorCategory {
    /// Every category, in default display order
    pub const ALL: [CalculatorCategory; 12] = [
        CalculatorCategory::KidneyFunction,
        CalculatorCategory::AcuteKidneyInjury,
        CalculatorCategory::AcidBase,
        CalculatorCategory::Electrolytes,
        CalculatorCategory::Dialysis,
        CalculatorCategory::Transplant,
        CalculatorCategory::CardiovascularRisk,
        CalculatorCategory::CriticalCare,
        CalculatorCategory::Rheumatology,
        CalculatorCategory::Geriatrics,
        CalculatorCategory::BodyComposition,
        CalculatorCategory::Anemia,
    ];

    /// Display name for the category
    pub fn display_name(&self) -> &'static str {
        match self {
            CalculatorCategory::KidneyFunction => "Kidney Function",
            CalculatorCategory::AcuteKidneyInjury => "Acute Kidney Injury",
            CalculatorCategory::AcidBase => "Acid-Base",
            CalculatorCategory::Electrolytes => "Electrolytes",
            CalculatorCategory::Dialysis => "Dialysis",
            CalculatorCategory::Transplant => "Transplant",
            CalculatorCategory::CardiovascularRisk => "Cardiovascular Risk",
            CalculatorCategory::CriticalCare => "Critical Care",
            CalculatorCategory::Rheumatology => "Rheumatology",
            CalculatorCategory::Geriatrics => "Geriatrics",
            CalculatorCategory::BodyComposition => "Body Composition",
            CalculatorCategory::Anemia => "Anemia",
        }
    }

    /// Default sort order (lower = earlier)
    pub fn sort_order(&self) -> u8 {
        match self {
            CalculatorCategory::KidneyFunction => 1,
            CalculatorCategory::AcuteKidneyInjury => 2,
            CalculatorCategory::AcidBase => 3,
            CalculatorCategory::Electrolytes => 4,
            CalculatorCategory::Dialysis => 5,
            CalculatorCategory::Transplant => 6,
            CalculatorCategory::CardiovascularRisk => 7,
            CalculatorCategory::CriticalCare => 8,
            CalculatorCategory::Rheumatology => 9,
            CalculatorCategory::Geriatrics => 10,
            CalculatorCategory::BodyComposition => 11,
            CalculatorCategory::Anemia => 12,
        }
    }
}

// ============================================================================
// Literature References
// ============================================================================

/// Published source of a formula.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LiteratureReference {
    pub authors: &'static str,
    pub title: &'static str,
    pub journal: &'static str,
    pub year: u16,
}

impl LiteratureReference {
    pub const fn new(authors: &'static str, title: &'static str, journal: &'static str, year: u16) -> Self {
        Self {
            authors,
            title,
            journal,
            year,
        }
    }

    /// Format the reference for display
    pub fn citation(&self) -> String {
        format!("{}, {}. {}, {}", self.authors, self.title, self.journal, self.year)
    }
}

// ============================================================================
// Inputs
// ============================================================================

/// One option of a select input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SelectOption {
    /// Value submitted by the caller
    pub value: &'static str,
    pub label: &'static str,
}

impl SelectOption {
    pub const fn new(value: &'static str, label: &'static str) -> Self {
        Self { value, label }
    }
}

/// How an input is entered.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputKind {
    Number,
    Select(&'static [SelectOption]),
    Boolean,
}

impl InputKind {
    pub fn name(&self) -> &'static str {
        match self {
            InputKind::Number => "number",
            InputKind::Select(_) => "select",
            InputKind::Boolean => "boolean",
        }
    }
}

/// Schema of one calculator input.
#[derive(Debug, Clone, PartialEq)]
pub struct CalculatorInput {
    pub id: &'static str,
    pub label: &'static str,
    pub kind: InputKind,
    /// Conventional/SI conversion; `None` for unit-less or fixed-unit inputs
    pub unit: Option<&'static UnitConversion>,
    /// Display unit for inputs without a conversion (e.g. "kg", "years")
    pub fixed_unit: &'static str,
    pub required: bool,
    /// Expected range in conventional units (advisory only)
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub default: Option<InputValue>,
    pub help: Option<&'static str>,
}

impl CalculatorInput {
    fn with_kind(id: &'static str, label: &'static str, kind: InputKind) -> Self {
        Self {
            id,
            label,
            kind,
            unit: None,
            fixed_unit: "",
            required: true,
            min: None,
            max: None,
            default: None,
            help: None,
        }
    }

    pub fn number(id: &'static str, label: &'static str) -> Self {
        Self::with_kind(id, label, InputKind::Number)
    }

    pub fn select(id: &'static str, label: &'static str, options: &'static [SelectOption]) -> Self {
        Self::with_kind(id, label, InputKind::Select(options))
    }

    /// Checkbox; unticked by default
    pub fn boolean(id: &'static str, label: &'static str) -> Self {
        Self {
            default: Some(InputValue::Flag(false)),
            ..Self::with_kind(id, label, InputKind::Boolean)
        }
    }

    /// Bind a conventional/SI conversion
    pub fn unit(mut self, conversion: &'static UnitConversion) -> Self {
        self.unit = Some(conversion);
        self
    }

    /// Fixed display unit (no conversion)
    pub fn fixed(mut self, unit: &'static str) -> Self {
        self.fixed_unit = unit;
        self
    }

    pub fn range(mut self, min: f64, max: f64) -> Self {
        self.min = Some(min);
        self.max = Some(max);
        self
    }

    pub fn default_value(mut self, value: impl Into<InputValue>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    pub fn help(mut self, text: &'static str) -> Self {
        self.help = Some(text);
        self
    }

    /// Unit label shown next to the input for a given unit system
    pub fn unit_label(&self, system: UnitSystem) -> &'static str {
        match self.unit {
            Some(conversion) => conversion.label(system),
            None => self.fixed_unit,
        }
    }

    /// True when `value` (conventional units) lies outside the range hints
    pub fn out_of_range(&self, value: f64) -> bool {
        self.min.is_some_and(|min| value < min) || self.max.is_some_and(|max| value > max)
    }

    /// Option lookup for select inputs
    pub fn option(&self, value: &str) -> Option<&'static SelectOption> {
        match self.kind {
            InputKind::Select(options) => options.iter().find(|o| o.value == value),
            _ => None,
        }
    }
}

// ============================================================================
// Calculators
// ============================================================================

/// Compute function: normalized inputs to an unrounded output
pub type ComputeFn = fn(&NormalizedInputs) -> CalcResult<Output>;

/// How a primary scalar maps to a clinical category.
#[derive(Debug, Clone, Copy)]
pub enum Interpretation {
    Bands(BandTable),
    /// Mixed-inclusivity or non-numeric categories
    Custom(fn(f64) -> &'static str),
}

/// A registered calculator.
#[derive(Clone)]
pub struct Calculator {
    /// Unique identifier (e.g., "ckd_epi_2021")
    pub id: &'static str,
    pub name: &'static str,
    pub category: CalculatorCategory,
    pub description: &'static str,
    /// Formula in plain text, for the reference document
    pub formula: &'static str,
    pub inputs: Vec<CalculatorInput>,
    pub compute: ComputeFn,
    pub result_unit: &'static str,
    /// Decimal places shown (and used for interpretation)
    pub precision: u8,
    pub interpretation: Interpretation,
    pub reference_ranges: Vec<ReferenceRange>,
    pub references: Vec<LiteratureReference>,
    /// Key of the primary field for record outputs
    pub primary_field: Option<&'static str>,
}

impl Calculator {
    pub fn new(id: &'static str, name: &'static str, category: CalculatorCategory, compute: ComputeFn) -> Self {
        Self {
            id,
            name,
            category,
            description: "",
            formula: "",
            inputs: Vec::new(),
            compute,
            result_unit: "",
            precision: 0,
            interpretation: Interpretation::Bands(BandTable::descending(&[], "")),
            reference_ranges: Vec::new(),
            references: Vec::new(),
            primary_field: None,
        }
    }

    pub fn description(mut self, text: &'static str) -> Self {
        self.description = text;
        self
    }

    pub fn formula(mut self, text: &'static str) -> Self {
        self.formula = text;
        self
    }

    pub fn input(mut self, input: CalculatorInput) -> Self {
        self.inputs.push(input);
        self
    }

    pub fn inputs(mut self, inputs: impl IntoIterator<Item = CalculatorInput>) -> Self {
        self.inputs.extend(inputs);
        self
    }

    /// Result unit and display precision
    pub fn result(mut self, unit: &'static str, precision: u8) -> Self {
        self.result_unit = unit;
        self.precision = precision;
        self
    }

    /// Interpret with a band table; reference ranges follow from it
    pub fn bands(mut self, table: BandTable) -> Self {
        self.reference_ranges = table.reference_ranges(self.result_unit);
        self.interpretation = Interpretation::Bands(table);
        self
    }

    /// Interpret with an explicit function and hand-written ranges
    pub fn custom(mut self, classify: fn(f64) -> &'static str, ranges: Vec<ReferenceRange>) -> Self {
        self.interpretation = Interpretation::Custom(classify);
        self.reference_ranges = ranges;
        self
    }

    pub fn primary(mut self, field: &'static str) -> Self {
        self.primary_field = Some(field);
        self
    }

    pub fn reference(mut self, reference: LiteratureReference) -> Self {
        self.references.push(reference);
        self
    }

    /// Category label for a (rounded) primary scalar
    pub fn interpret(&self, value: f64) -> &'static str {
        match self.interpretation {
            Interpretation::Bands(table) => table.classify(value),
            Interpretation::Custom(classify) => classify(value),
        }
    }

    /// Input schema by id
    pub fn input_by_id(&self, id: &str) -> Option<&CalculatorInput> {
        self.inputs.iter().find(|input| input.id == id)
    }

    /// Inputs that take a unit selection
    pub fn unit_bound_inputs(&self) -> impl Iterator<Item = &CalculatorInput> {
        self.inputs.iter().filter(|input| input.unit.is_some())
    }
}

impl std::fmt::Debug for Calculator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Calculator")
            .field("id", &self.id)
            .field("category", &self.category)
            .field("inputs", &self.inputs.len())
            .field("precision", &self.precision)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Registry
// ============================================================================

struct Registry {
    calculators: Vec<Calculator>,
    index: HashMap<&'static str, usize>,
}

impl Registry {
    fn build() -> Self {
        let calculators: Vec<Calculator> = [
            kidney_function::calculators(),
            aki::calculators(),
            acid_base::calculators(),
            electrolytes::calculators(),
            dialysis::calculators(),
            transplant::calculators(),
            cardiovascular::calculators(),
            scores::calculators(),
            body::calculators(),
        ]
        .into_iter()
        .flatten()
        .collect();

        let index = calculators
            .iter()
            .enumerate()
            .map(|(i, calc)| (calc.id, i))
            .collect();

        Self { calculators, index }
    }
}

static REGISTRY: Lazy<Registry> = Lazy::new(Registry::build);

/// Calculator by id
pub fn get(id: &str) -> Option<&'static Calculator> {
    REGISTRY.index.get(id).map(|&i| &REGISTRY.calculators[i])
}

/// Every calculator, in registration order
pub fn all() -> &'static [Calculator] {
    &REGISTRY.calculators
}

/// Calculators in one category, in registration order
pub fn by_category(category: CalculatorCategory) -> Vec<&'static Calculator> {
    REGISTRY.calculators.iter().filter(|c| c.category == category).collect()
}

/// Categories that have at least one calculator, in default order
pub fn categories() -> Vec<CalculatorCategory> {
    let mut categories: Vec<_> = CalculatorCategory::ALL
        .into_iter()
        .filter(|category| REGISTRY.calculators.iter().any(|c| c.category == *category))
        .collect();
    categories.sort_by_key(|c| c.sort_order());
    categories
}

// ============================================================================
// Markdown Generation
// ============================================================================

/// Generate a markdown reference of every registered calculator.
///
/// Regenerate with: `cargo run --bin gen-calculators`
pub fn generate_calculators_markdown() -> String {
    let mut output = String::with_capacity(64_000);

    output.push_str(
        r#"# Nephrology Calculator Reference

> **Auto-generated from source code. Do not edit manually.**
>
> Regenerate with: `cargo run --bin gen-calculators`

Every calculator lists its formula, inputs (with conventional and SI units
where a conversion applies), display precision, interpretation bands and
literature source. Formulas are evaluated in conventional units; SI entries
are converted first.

## Unit Conversions

| Analyte | Conventional | SI | Factor (SI = conventional × factor) |
|---------|--------------|----|-------------------------------------|
"#,
    );
    for conversion in crate::units::ALL_CONVERSIONS {
        output.push_str(&format!(
            "| {} | {} | {} | {} |\n",
            conversion.id, conversion.conventional, conversion.si, conversion.factor
        ));
    }
    output.push_str("\n---\n\n");

    for category in categories() {
        output.push_str(&format!("## {}\n\n", category.display_name()));

        for calc in by_category(category) {
            output.push_str(&format!("### {}\n\n", calc.name));
            output.push_str(&format!("`{}`", calc.id));
            if !calc.description.is_empty() {
                output.push_str(&format!(" - {}", calc.description));
            }
            output.push_str("\n\n");

            if !calc.formula.is_empty() {
                output.push_str(&format!("**Formula:** `{}`\n\n", calc.formula));
            }

            output.push_str("**Inputs:**\n\n");
            output.push_str("| Input | Type | Units | Range | Default |\n");
            output.push_str("|-------|------|-------|-------|---------|\n");
            for input in &calc.inputs {
                let units = match input.unit {
                    Some(conversion) => format!("{} / {}", conversion.conventional, conversion.si),
                    None => input.fixed_unit.to_string(),
                };
                let range = match (input.min, input.max) {
                    (Some(min), Some(max)) => format!("{} – {}", min, max),
                    _ => String::new(),
                };
                let default = input.default.as_ref().map(|d| d.to_string()).unwrap_or_default();
                let label = if input.required {
                    input.label.to_string()
                } else {
                    format!("{} (optional)", input.label)
                };
                output.push_str(&format!(
                    "| {} | {} | {} | {} | {} |\n",
                    label,
                    input.kind.name(),
                    units,
                    range,
                    default
                ));
            }
            output.push('\n');

            let unit = if calc.result_unit.is_empty() {
                String::new()
            } else {
                format!(" {}", calc.result_unit)
            };
            output.push_str(&format!("**Result:**{} ({} decimal places)", unit, calc.precision));
            if let Some(primary) = calc.primary_field {
                output.push_str(&format!(", primary field `{}`", primary));
            }
            output.push_str("\n\n");

            if calc.reference_ranges.len() > 1 {
                output.push_str("| Interpretation | Range |\n");
                output.push_str("|----------------|-------|\n");
                for range in &calc.reference_ranges {
                    output.push_str(&format!("| {} | {} |\n", range.label, range.describe()));
                }
                output.push('\n');
            }

            for reference in &calc.references {
                output.push_str(&format!("**Reference:** {}\n\n", reference.citation()));
            }
        }

        output.push_str("---\n\n");
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_ids_unique() {
        let mut seen = HashSet::new();
        for calc in all() {
            assert!(seen.insert(calc.id), "duplicate calculator id {}", calc.id);
        }
        assert_eq!(REGISTRY.index.len(), all().len());
    }

    #[test]
    fn test_roster_size() {
        assert!(all().len() >= 55, "only {} calculators registered", all().len());
    }

    #[test]
    fn test_every_calculator_has_metadata() {
        for calc in all() {
            assert!(!calc.name.is_empty(), "{} has no name", calc.id);
            assert!(!calc.inputs.is_empty(), "{} has no inputs", calc.id);
            assert!(!calc.references.is_empty(), "{} has no reference", calc.id);
            assert!(!calc.reference_ranges.is_empty() || matches!(calc.interpretation, Interpretation::Custom(_)));
        }
    }

    #[test]
    fn test_input_ids_unique_per_calculator() {
        for calc in all() {
            let mut seen = HashSet::new();
            for input in &calc.inputs {
                assert!(seen.insert(input.id), "{} repeats input {}", calc.id, input.id);
            }
        }
    }

    #[test]
    fn test_band_tables_well_ordered() {
        for calc in all() {
            if let Interpretation::Bands(table) = calc.interpretation {
                assert!(table.is_well_ordered(), "{} has an unordered band table", calc.id);
                assert!(!table.fallback.is_empty(), "{} has no fallback label", calc.id);
            }
        }
    }

    #[test]
    fn test_band_boundaries_follow_inclusivity() {
        use crate::interpretation::Inclusivity;

        // A value exactly on each threshold lands in that band; one step
        // past it (at display precision) lands in the next band.
        for calc in all() {
            let Interpretation::Bands(table) = calc.interpretation else { continue };
            let step = 10f64.powi(-i32::from(calc.precision));
            for (i, &(threshold, label)) in table.bands.iter().enumerate() {
                assert_eq!(calc.interpret(threshold), label, "{} at {}", calc.id, threshold);
                let next = table.bands.get(i + 1).map(|b| b.1).unwrap_or(table.fallback);
                let beyond = match table.rule {
                    Inclusivity::LowerInclusive => threshold - step,
                    Inclusivity::UpperInclusive => threshold + step,
                };
                assert_eq!(calc.interpret(beyond), next, "{} at {}", calc.id, beyond);
            }
        }
    }

    #[test]
    fn test_select_defaults_are_options() {
        for calc in all() {
            for input in &calc.inputs {
                if let (InputKind::Select(_), Some(InputValue::Choice(value))) = (input.kind, &input.default) {
                    assert!(input.option(value).is_some(), "{}.{} default not an option", calc.id, input.id);
                }
            }
        }
    }

    #[test]
    fn test_primary_field_only_on_records() {
        let records = ["delta_gap", "kfre_4var", "winters_formula", "kdpi", "epts", "slicc_2012"];
        for id in records {
            assert!(get(id).and_then(|c| c.primary_field).is_some(), "{} lacks a primary field", id);
        }
        assert_eq!(get("kdpi").and_then(|c| c.primary_field), Some("kdpi"));
        assert_eq!(get("kfre_4var").and_then(|c| c.primary_field), Some("five_year"));
    }

    #[test]
    fn test_lookup() {
        assert!(get("ckd_epi_2021").is_some());
        assert!(get("frax").is_none());
        assert!(get("").is_none());

        let dialysis = by_category(CalculatorCategory::Dialysis);
        assert!(dialysis.iter().any(|c| c.id == "ktv_daugirdas"));
        assert!(dialysis.iter().all(|c| c.category == CalculatorCategory::Dialysis));
    }

    #[test]
    fn test_categories_sorted() {
        let cats = categories();
        assert_eq!(cats.first(), Some(&CalculatorCategory::KidneyFunction));
        assert!(cats.windows(2).all(|w| w[0].sort_order() < w[1].sort_order()));
        assert_eq!(cats.len(), CalculatorCategory::ALL.len());
    }

    #[test]
    fn test_citation() {
        let reference = LiteratureReference::new("Levey AS et al.", "A new equation to estimate GFR", "Ann Intern Med", 2009);
        assert_eq!(reference.citation(), "Levey AS et al., A new equation to estimate GFR. Ann Intern Med, 2009");
    }

    #[test]
    fn test_generate_markdown() {
        let md = generate_calculators_markdown();
        assert!(md.contains("# Nephrology Calculator Reference"));
        assert!(md.contains("## Kidney Function"));
        assert!(md.contains("`ckd_epi_2021`"));
        assert!(md.contains("mg/dL / µmol/L"));
        assert!(md.contains("| Normal | ≥ 90 |"));
        for calc in all() {
            assert!(md.contains(&format!("`{}`", calc.id)), "{} missing from markdown", calc.id);
        }
    }
}
