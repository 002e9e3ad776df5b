//! # Result Interpretation
//!
//! Maps a numeric result to a clinical category with an ordered threshold
//! table. Literature sources disagree on which side of a boundary is
//! inclusive, so every table states its own rule:
//!
//! - [`BandTable::descending`]: lower bound inclusive. Bands are listed from
//!   the highest threshold down and the first with `value >= threshold`
//!   wins (eGFR ≥ 90 → "Normal").
//! - [`BandTable::ascending`]: upper bound inclusive. Bands are listed from
//!   the lowest threshold up and the first with `value <= threshold` wins
//!   (anion gap ≤ 12 → "Normal").
//!
//! A value past the last threshold gets the table's fallback label.

use serde::Serialize;

/// Which bound of each band is inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Inclusivity {
    /// `value >= threshold`, thresholds evaluated high to low
    LowerInclusive,
    /// `value <= threshold`, thresholds evaluated low to high
    UpperInclusive,
}

/// Ordered step function from a value to a label.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BandTable {
    pub rule: Inclusivity,
    /// (threshold, label) in evaluation order
    pub bands: &'static [(f64, &'static str)],
    /// Label when no band matches
    pub fallback: &'static str,
}

impl BandTable {
    /// Lower-inclusive table; `bands` must be sorted by threshold, highest first.
    pub const fn descending(bands: &'static [(f64, &'static str)], fallback: &'static str) -> Self {
        Self {
            rule: Inclusivity::LowerInclusive,
            bands,
            fallback,
        }
    }

    /// Upper-inclusive table; `bands` must be sorted by threshold, lowest first.
    pub const fn ascending(bands: &'static [(f64, &'static str)], fallback: &'static str) -> Self {
        Self {
            rule: Inclusivity::UpperInclusive,
            bands,
            fallback,
        }
    }

    /// Category label for `value`.
    pub fn classify(&self, value: f64) -> &'static str {
        let hit = match self.rule {
            Inclusivity::LowerInclusive => self.bands.iter().find(|(t, _)| value >= *t),
            Inclusivity::UpperInclusive => self.bands.iter().find(|(t, _)| value <= *t),
        };
        hit.map(|(_, label)| *label).unwrap_or(self.fallback)
    }

    /// True when thresholds are sorted in the order `classify` expects.
    pub fn is_well_ordered(&self) -> bool {
        self.bands.windows(2).all(|w| match self.rule {
            Inclusivity::LowerInclusive => w[0].0 > w[1].0,
            Inclusivity::UpperInclusive => w[0].0 < w[1].0,
        })
    }

    /// Express the table as reference ranges, in the table's own order.
    pub fn reference_ranges(&self, unit: &'static str) -> Vec<ReferenceRange> {
        let mut ranges = Vec::with_capacity(self.bands.len() + 1);
        let mut previous: Option<f64> = None;
        for &(threshold, label) in self.bands {
            let (min, max) = match self.rule {
                Inclusivity::LowerInclusive => (Some(threshold), previous),
                Inclusivity::UpperInclusive => (previous, Some(threshold)),
            };
            ranges.push(ReferenceRange {
                label,
                min,
                max,
                unit,
                inclusive: self.rule,
            });
            previous = Some(threshold);
        }
        let (min, max) = match self.rule {
            Inclusivity::LowerInclusive => (None, previous),
            Inclusivity::UpperInclusive => (previous, None),
        };
        ranges.push(ReferenceRange {
            label: self.fallback,
            min,
            max,
            unit,
            inclusive: self.rule,
        });
        ranges
    }
}

/// One row of a calculator's reference-range table.
///
/// With `LowerInclusive`, `min` is inclusive and `max` exclusive; with
/// `UpperInclusive` it is the other way round.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReferenceRange {
    pub label: &'static str,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub unit: &'static str,
    pub inclusive: Inclusivity,
}

impl ReferenceRange {
    /// Human-readable range (e.g., "60 – 90", "≥ 90", "≤ 12")
    pub fn describe(&self) -> String {
        match (self.min, self.max, self.inclusive) {
            (Some(min), Some(max), _) if min == max => format!("{}", min),
            (Some(min), Some(max), _) => format!("{} – {}", min, max),
            (Some(min), None, Inclusivity::LowerInclusive) => format!("≥ {}", min),
            (Some(min), None, Inclusivity::UpperInclusive) => format!("> {}", min),
            (None, Some(max), Inclusivity::LowerInclusive) => format!("< {}", max),
            (None, Some(max), Inclusivity::UpperInclusive) => format!("≤ {}", max),
            (None, None, _) => "any".to_string(),
        }
    }
}

// ============================================================================
// Shared Tables
// ============================================================================

/// KDIGO GFR categories (mL/min/1.73m²), shared by every eGFR equation.
pub const EGFR_STAGES: BandTable = BandTable::descending(
    &[
        (90.0, "Normal"),
        (60.0, "Mild decrease"),
        (45.0, "Mild to moderate decrease"),
        (30.0, "Moderate to severe decrease"),
        (15.0, "Severe decrease"),
    ],
    "Kidney failure",
);
