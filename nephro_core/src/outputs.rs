//! # Calculator Outputs
//!
//! A calculator produces one of:
//!
//! - a single number ([`Output::Scalar`])
//! - a small named-field record whose `primary` field drives interpretation
//!   ([`Output::Record`], e.g. delta gap, KDPI, KFRE); a blank primary makes
//!   the record undefined while its other fields stay displayable
//! - a Banff biopsy classification ([`Output::Banff`])
//! - the "unable to calculate" sentinel ([`Output::Undefined`]) when the
//!   inputs fall outside the formula's mathematical domain
//!
//! ## JSON Example
//!
//! ```json
//! { "kind": "record", "value": { "primary": "ratio", "fields": [
//!   { "key": "delta_gap", "label": "Delta gap", "value": 8.0, "unit": "mEq/L" },
//!   { "key": "delta_hco3", "label": "Delta HCO3", "value": 10.0, "unit": "mEq/L" },
//!   { "key": "ratio", "label": "Delta ratio", "value": 0.8, "unit": "" } ] } }
//! ```

use serde::Serialize;

use crate::formulas::transplant::BanffClassification;

/// Round `value` to `decimals` decimal places (half away from zero).
#[inline]
pub fn round_to(value: f64, decimals: u8) -> f64 {
    let scale = 10f64.powi(i32::from(decimals));
    (value * scale).round() / scale
}

/// One named field of a multi-value result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultField {
    pub key: &'static str,
    pub label: &'static str,
    /// `None` when this particular field is undefined (e.g. a ratio over zero)
    pub value: Option<f64>,
    pub unit: &'static str,
}

/// Multi-value result with a designated primary field.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultRecord {
    /// Key of the field used for interpretation
    pub primary: &'static str,
    pub fields: Vec<ResultField>,
}

impl ResultRecord {
    pub fn new(primary: &'static str) -> Self {
        Self {
            primary,
            fields: Vec::new(),
        }
    }

    /// Append a field (builder style)
    pub fn field(mut self, key: &'static str, label: &'static str, value: Option<f64>, unit: &'static str) -> Self {
        self.fields.push(ResultField { key, label, value, unit });
        self
    }

    /// Value of a field by key
    pub fn get(&self, key: &str) -> Option<f64> {
        self.fields.iter().find(|f| f.key == key).and_then(|f| f.value)
    }

    /// Value of the primary field
    pub fn primary_value(&self) -> Option<f64> {
        self.get(self.primary)
    }
}

/// Result of a compute function.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Output {
    Scalar(f64),
    Record(ResultRecord),
    Banff(BanffClassification),
    Undefined { reason: String },
}

impl Output {
    /// Build an output from a formula that signals out-of-domain input with `None`.
    pub fn from_option(value: Option<f64>, reason: &str) -> Self {
        match value {
            Some(v) => Output::Scalar(v),
            None => Output::undefined(reason),
        }
    }

    pub fn undefined(reason: impl Into<String>) -> Self {
        Output::Undefined { reason: reason.into() }
    }

    /// True when there is no primary number to interpret, including a
    /// record whose primary field is blank.
    pub fn is_undefined(&self) -> bool {
        self.primary_scalar().is_none()
    }

    /// The single number used for interpretation and color coding.
    ///
    /// Banff results report their category severity rank.
    pub fn primary_scalar(&self) -> Option<f64> {
        match self {
            Output::Scalar(v) => Some(*v),
            Output::Record(record) => record.primary_value(),
            Output::Banff(classification) => Some(f64::from(classification.category.rank())),
            Output::Undefined { .. } => None,
        }
    }

    /// Replace NaN/infinite values with the undefined sentinel.
    ///
    /// A non-finite scalar makes the whole output undefined. In a record only
    /// the offending fields are blanked, so the finite ones still display even
    /// when the primary cannot be calculated.
    pub fn sanitized(self) -> Self {
        match self {
            Output::Scalar(v) if !v.is_finite() => Output::undefined("result is not a finite number"),
            Output::Record(mut record) => {
                for field in &mut record.fields {
                    if field.value.is_some_and(|v| !v.is_finite()) {
                        field.value = None;
                    }
                }
                Output::Record(record)
            }
            other => other,
        }
    }

    /// Round every numeric value to `decimals` places.
    pub fn rounded(self, decimals: u8) -> Self {
        match self {
            Output::Scalar(v) => Output::Scalar(round_to(v, decimals)),
            Output::Record(mut record) => {
                for field in &mut record.fields {
                    field.value = field.value.map(|v| round_to(v, decimals));
                }
                Output::Record(record)
            }
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn delta_record(ratio: Option<f64>) -> ResultRecord {
        ResultRecord::new("ratio")
            .field("delta_gap", "Delta gap", Some(8.0), "mEq/L")
            .field("delta_hco3", "Delta HCO3", Some(10.0), "mEq/L")
            .field("ratio", "Delta ratio", ratio, "")
    }

    #[test]
    fn test_round_to() {
        assert_eq!(round_to(22.857142, 1), 22.9);
        assert_eq!(round_to(71.42, 0), 71.0);
        assert_eq!(round_to(1.3957, 2), 1.4);
        assert_eq!(round_to(-0.25, 1), -0.3);
    }

    #[test]
    fn test_primary_scalar() {
        assert_eq!(Output::Scalar(16.0).primary_scalar(), Some(16.0));
        assert_eq!(Output::Record(delta_record(Some(0.8))).primary_scalar(), Some(0.8));
        assert_eq!(Output::undefined("x").primary_scalar(), None);
    }

    #[test]
    fn test_sanitized_scalar() {
        assert!(Output::Scalar(f64::NAN).sanitized().is_undefined());
        assert!(Output::Scalar(f64::INFINITY).sanitized().is_undefined());
        assert_eq!(Output::Scalar(1.0).sanitized(), Output::Scalar(1.0));
    }

    #[test]
    fn test_sanitized_record() {
        let record = ResultRecord::new("ratio")
            .field("delta_gap", "Delta gap", Some(f64::NAN), "mEq/L")
            .field("ratio", "Delta ratio", Some(1.2), "");
        match Output::Record(record).sanitized() {
            Output::Record(r) => {
                assert_eq!(r.get("delta_gap"), None);
                assert_eq!(r.get("ratio"), Some(1.2));
            }
            other => panic!("expected record, got {:?}", other),
        }

    }

    #[test]
    fn test_blank_primary_keeps_record() {
        let output = Output::Record(delta_record(Some(f64::INFINITY))).sanitized();
        assert!(output.is_undefined());
        match output {
            Output::Record(r) => {
                assert_eq!(r.get("ratio"), None);
                assert_eq!(r.get("delta_gap"), Some(8.0));
                assert_eq!(r.get("delta_hco3"), Some(10.0));
            }
            other => panic!("expected record, got {:?}", other),
        }

        assert!(Output::Record(delta_record(None)).sanitized().is_undefined());
        assert!(!Output::Record(delta_record(Some(0.8))).is_undefined());
    }

    #[test]
    fn test_rounded_record() {
        let record = ResultRecord::new("ratio").field("ratio", "Delta ratio", Some(0.8333), "");
        let rounded = Output::Record(record).rounded(2);
        assert_eq!(rounded.primary_scalar(), Some(0.83));
    }

    #[test]
    fn test_serialization_shape() {
        let json = serde_json::to_string(&Output::Scalar(16.0)).unwrap();
        assert_eq!(json, r#"{"kind":"scalar","value":16.0}"#);

        let json = serde_json::to_string(&Output::undefined("log of non-positive number")).unwrap();
        assert!(json.contains("\"kind\":\"undefined\""));
    }
}
