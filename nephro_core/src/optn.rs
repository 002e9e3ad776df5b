//! # OPTN Mapping Tables
//!
//! KDPI and EPTS percentiles come from the mapping tables the OPTN publishes
//! each year: the KDRI scaling factor (median Rao KDRI of the previous
//! year's recovered donors) and 100 percentile cut-offs for KDRI and for the
//! raw EPTS score. The numbers change with every release, so they are read
//! from the published file rather than compiled in.
//!
//! The tables are picked up from the JSON file named by `$NEPHRO_OPTN_TABLES`
//! on first use, or installed by the host with [`install`]. Until a table is
//! present, KDPI and EPTS report the raw scores and leave the percentile
//! undefined.
//!
//! ## File Format
//!
//! ```json
//! {
//!   "year": 2024,
//!   "source": "OPTN KDPI/EPTS mapping table, 2024 reference population",
//!   "kdri_scaling_factor": 1.0,
//!   "kdpi_breakpoints": [0.0, ...],
//!   "epts_breakpoints": [0.0, ...]
//! }
//! ```
//!
//! Each breakpoint list holds the upper bound of percentiles 0 through 99 in
//! non-decreasing order.

use std::ffi::OsString;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::sync::{Arc, RwLock};

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::errors::{CalcError, CalcResult};

/// Environment variable naming the mapping table file
pub const OPTN_TABLES_ENV: &str = "NEPHRO_OPTN_TABLES";

/// Breakpoints per table, one for each percentile 0..=99
pub const BREAKPOINT_COUNT: usize = 100;

/// One year's KDPI/EPTS mapping tables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptnTables {
    /// Release year of the reference population
    pub year: u16,
    /// Where the numbers were taken from
    #[serde(default)]
    pub source: String,
    /// Median Rao KDRI of the reference donors
    pub kdri_scaling_factor: f64,
    pub kdpi_breakpoints: Vec<f64>,
    pub epts_breakpoints: Vec<f64>,
}

impl OptnTables {
    /// Parse and validate a mapping table file's contents.
    pub fn from_json_str(json: &str) -> CalcResult<Self> {
        let tables: OptnTables = serde_json::from_str(json).map_err(|e| CalcError::SerializationError {
            reason: format!("Invalid OPTN mapping table: {}", e),
        })?;
        tables.validate()?;
        Ok(tables)
    }

    pub fn load(path: &Path) -> CalcResult<Self> {
        let mut file =
            File::open(path).map_err(|e| CalcError::file_error("open", path.display().to_string(), e.to_string()))?;
        let mut contents = String::new();
        file.read_to_string(&mut contents)
            .map_err(|e| CalcError::file_error("read", path.display().to_string(), e.to_string()))?;

        let tables = Self::from_json_str(&contents)?;
        info!(path = %path.display(), year = tables.year, "OPTN mapping tables loaded");
        Ok(tables)
    }

    pub fn validate(&self) -> CalcResult<()> {
        if !(self.kdri_scaling_factor.is_finite() && self.kdri_scaling_factor > 0.0) {
            return Err(CalcError::invalid_input(
                "kdri_scaling_factor",
                self.kdri_scaling_factor.to_string(),
                "Scaling factor must be a positive number",
            ));
        }
        check_breakpoints("kdpi_breakpoints", &self.kdpi_breakpoints)?;
        check_breakpoints("epts_breakpoints", &self.epts_breakpoints)
    }
}

fn check_breakpoints(field: &str, breakpoints: &[f64]) -> CalcResult<()> {
    if breakpoints.len() != BREAKPOINT_COUNT {
        return Err(CalcError::invalid_input(
            field,
            format!("{} entries", breakpoints.len()),
            format!("Expected {} breakpoints", BREAKPOINT_COUNT),
        ));
    }
    if let Some(bad) = breakpoints.iter().find(|b| !b.is_finite()) {
        return Err(CalcError::invalid_input(field, bad.to_string(), "Breakpoints must be finite"));
    }
    if let Some(index) = breakpoints.windows(2).position(|w| w[0] > w[1]) {
        return Err(CalcError::invalid_input(
            field,
            format!("index {}", index + 1),
            "Breakpoints must be in non-decreasing order",
        ));
    }
    Ok(())
}

// ============================================================================
// Installed tables
// ============================================================================

static INSTALLED: Lazy<RwLock<Option<Arc<OptnTables>>>> =
    Lazy::new(|| RwLock::new(from_env(std::env::var_os(OPTN_TABLES_ENV)).map(Arc::new)));

/// Tables read from the file `$NEPHRO_OPTN_TABLES` names; a missing or bad
/// file is logged and leaves percentiles unavailable.
fn from_env(path: Option<OsString>) -> Option<OptnTables> {
    let path = path.filter(|p| !p.is_empty())?;
    match OptnTables::load(Path::new(&path)) {
        Ok(tables) => Some(tables),
        Err(e) => {
            warn!(error = %e, "OPTN mapping tables unavailable, KDPI and EPTS percentiles disabled");
            None
        }
    }
}

/// Tables used by the KDPI and EPTS calculators, if any.
pub fn current() -> Option<Arc<OptnTables>> {
    match INSTALLED.read() {
        Ok(guard) => guard.clone(),
        Err(poisoned) => poisoned.into_inner().clone(),
    }
}

/// Replace the tables used by the KDPI and EPTS calculators.
pub fn install(tables: OptnTables) -> CalcResult<()> {
    tables.validate()?;
    info!(year = tables.year, "OPTN mapping tables installed");
    let tables = Some(Arc::new(tables));
    match INSTALLED.write() {
        Ok(mut guard) => *guard = tables,
        Err(poisoned) => *poisoned.into_inner() = tables,
    }
    Ok(())
}

/// Evenly spaced fixture for tests, not a published table. Steps are powers
/// of two so breakpoints are exact: KDPI `0.5 + p/64`, EPTS `p/32`.
#[cfg(test)]
pub(crate) fn test_tables() -> OptnTables {
    OptnTables {
        year: 2024,
        source: "test fixture".to_string(),
        kdri_scaling_factor: 1.25,
        kdpi_breakpoints: (0..100).map(|p| 0.5 + f64::from(p) / 64.0).collect(),
        epts_breakpoints: (0..100).map(|p| f64::from(p) / 32.0).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    fn fixture() -> OptnTables {
        test_tables()
    }

    #[test]
    fn test_json_roundtrip_validates() {
        let json = serde_json::to_string(&fixture()).unwrap();
        assert_eq!(OptnTables::from_json_str(&json).unwrap(), fixture());
    }

    #[test]
    fn test_rejects_short_or_unsorted_tables() {
        let mut short = fixture();
        short.kdpi_breakpoints.pop();
        assert!(matches!(short.validate(), Err(CalcError::InvalidInput { .. })));

        let mut unsorted = fixture();
        unsorted.epts_breakpoints.swap(10, 11);
        assert!(matches!(unsorted.validate(), Err(CalcError::InvalidInput { .. })));

        let mut not_finite = fixture();
        not_finite.kdpi_breakpoints[50] = f64::NAN;
        assert!(matches!(not_finite.validate(), Err(CalcError::InvalidInput { .. })));

        let zero_scale = OptnTables { kdri_scaling_factor: 0.0, ..fixture() };
        assert!(matches!(zero_scale.validate(), Err(CalcError::InvalidInput { .. })));

        // Repeated cut-offs are allowed
        let mut flat = fixture();
        flat.kdpi_breakpoints[1] = flat.kdpi_breakpoints[0];
        assert!(flat.validate().is_ok());
    }

    #[test]
    fn test_invalid_json_is_serialization_error() {
        assert!(matches!(
            OptnTables::from_json_str("{\"year\": 2024"),
            Err(CalcError::SerializationError { .. })
        ));
    }

    #[test]
    fn test_load_from_env_path() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("optn.json");
        let mut file = File::create(&path).unwrap();
        file.write_all(serde_json::to_string(&fixture()).unwrap().as_bytes())
            .unwrap();

        let loaded = from_env(Some(path.clone().into_os_string())).unwrap();
        assert_eq!(loaded.year, 2024);

        assert_eq!(from_env(None), None);
        assert_eq!(from_env(Some(OsString::new())), None);
        assert_eq!(from_env(Some(dir.path().join("missing.json").into_os_string())), None);
    }

    #[test]
    fn test_install() {
        let mut bad = fixture();
        bad.epts_breakpoints.clear();
        assert!(install(bad).is_err());

        install(fixture()).unwrap();
        assert_eq!(current().map(|t| t.year), Some(2024));
    }
}
