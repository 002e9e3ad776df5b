//! # nephro_core - Nephrology Calculator Engine
//!
//! `nephro_core` is a registry of clinical formulas used in nephrology
//! (eGFR equations, fractional excretions, acid-base gaps, dialysis
//! adequacy, transplant indices, bedside scores) together with the
//! unit-aware evaluation layer that runs them. All inputs and outputs are
//! JSON-serializable.
//!
//! ## Design Philosophy
//!
//! - **Stateless formulas**: pure functions over conventional units
//! - **Unit-aware edges**: SI values are normalized before compute, never inside it
//! - **No NaN on screen**: out-of-domain input yields an explicit undefined result
//! - **Rich Errors**: structured error types, not just strings
//!
//! ## Quick Start
//!
//! ```rust
//! use nephro_core::{evaluate, RawInputs, UnitSystem};
//!
//! let raw = RawInputs::new()
//!     .with("creatinine", 88.4)
//!     .with_unit("creatinine", UnitSystem::Si)
//!     .with("age", 40.0)
//!     .with("sex", "female");
//!
//! let evaluation = evaluate("ckd_epi_2021", &raw).unwrap();
//! println!("{} ({})", evaluation.display, evaluation.category.unwrap_or("-"));
//! ```
//!
//! ## Modules
//!
//! - [`registry`] - calculator metadata, input schemas, lookup by id and category
//! - [`evaluator`] - normalize, compute, round and interpret
//! - [`formulas`] - the published equations as plain functions
//! - [`units`] - conventional/SI conversion table
//! - [`inputs`] / [`outputs`] - values in and results out
//! - [`interpretation`] - threshold bands and reference ranges
//! - [`optn`] - yearly KDPI/EPTS mapping tables
//! - [`session`] - transient state for the calculator on screen
//! - [`preferences`] - favorites, recents and category order on disk
//! - [`errors`] - structured error types

pub mod errors;
pub mod evaluator;
pub mod formulas;
pub mod inputs;
pub mod interpretation;
pub mod optn;
pub mod outputs;
pub mod preferences;
pub mod registry;
pub mod session;
pub mod units;

// Re-export commonly used types at crate root for convenience
pub use errors::{CalcError, CalcResult};
pub use evaluator::{compute, evaluate, interpret, normalize, Evaluation};
pub use inputs::{InputValue, NormalizedInputs, RawInputs};
pub use outputs::Output;
pub use preferences::{PreferenceStore, Preferences};
pub use registry::{Calculator, CalculatorCategory};
pub use session::CalculatorState;
pub use units::UnitSystem;
