//! # User Preferences
//!
//! Favorites, recently used calculators, category display order and the
//! default unit system, persisted as a small JSON file.
//!
//! - **Atomic saves**: write to `.tmp`, sync, rename over the real file
//! - **Version validation**: major version must match; on 0.x a newer minor
//!   is rejected
//! - **Repair on load**: unknown calculator ids and categories are dropped,
//!   missing categories appended in default order
//!
//! Concurrent writers are not coordinated; the last save wins.
//!
//! ## File Format
//!
//! ```json
//! {
//!   "version": "0.1.0",
//!   "favorites": ["ckd_epi_2021", "fena"],
//!   "recents": ["anion_gap", "ckd_epi_2021"],
//!   "category_order": ["kidney_function", "acute_kidney_injury", "..."],
//!   "settings": { "default_units": "conventional" },
//!   "modified": "2025-01-01T00:00:00Z"
//! }
//! ```

use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use tracing::{debug, info};

use crate::errors::{CalcError, CalcResult};
use crate::registry::{self, CalculatorCategory};
use crate::units::UnitSystem;

/// Current preferences file schema version
pub const PREFERENCES_VERSION: &str = "0.1.0";

/// Recents list length; the oldest entry is evicted past this
pub const MAX_RECENTS: usize = 5;

/// Environment variable overriding the preferences file location
pub const PREFS_PATH_ENV: &str = "NEPHRO_PREFS_PATH";

/// Application settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Unit system pre-selected for unit-bound inputs in a new session
    #[serde(default)]
    pub default_units: UnitSystem,
}

/// Everything the user has customized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preferences {
    pub version: String,
    /// Calculator ids, in the order they were starred
    #[serde(default)]
    pub favorites: Vec<String>,
    /// Calculator ids, most recent first
    #[serde(default)]
    pub recents: Vec<String>,
    #[serde(default = "default_category_order", deserialize_with = "known_categories")]
    pub category_order: Vec<CalculatorCategory>,
    #[serde(default)]
    pub settings: Settings,
    pub modified: DateTime<Utc>,
}

fn default_category_order() -> Vec<CalculatorCategory> {
    CalculatorCategory::ALL.to_vec()
}

/// Categories this build knows about; anything else is skipped.
fn known_categories<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<CalculatorCategory>, D::Error> {
    let raw = Vec::<serde_json::Value>::deserialize(deserializer)?;
    Ok(raw.into_iter().filter_map(|v| serde_json::from_value(v).ok()).collect())
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            version: PREFERENCES_VERSION.to_string(),
            favorites: Vec::new(),
            recents: Vec::new(),
            category_order: default_category_order(),
            settings: Settings::default(),
            modified: Utc::now(),
        }
    }
}

fn require_calculator(calculator_id: &str) -> CalcResult<()> {
    match registry::get(calculator_id) {
        Some(_) => Ok(()),
        None => Err(CalcError::unknown_calculator(calculator_id)),
    }
}

impl Preferences {
    pub fn new() -> Self {
        Self::default()
    }

    /// Update the modified timestamp.
    pub fn touch(&mut self) {
        self.modified = Utc::now();
    }

    pub fn is_favorite(&self, calculator_id: &str) -> bool {
        self.favorites.iter().any(|id| id == calculator_id)
    }

    /// Star or unstar a calculator. Returns whether it is now a favorite.
    pub fn toggle_favorite(&mut self, calculator_id: &str) -> CalcResult<bool> {
        require_calculator(calculator_id)?;
        let now_favorite = match self.favorites.iter().position(|id| id == calculator_id) {
            Some(index) => {
                self.favorites.remove(index);
                false
            }
            None => {
                self.favorites.push(calculator_id.to_string());
                true
            }
        };
        self.touch();
        Ok(now_favorite)
    }

    /// Move a calculator to the front of the recents list.
    pub fn record_recent(&mut self, calculator_id: &str) -> CalcResult<()> {
        require_calculator(calculator_id)?;
        self.recents.retain(|id| id != calculator_id);
        self.recents.insert(0, calculator_id.to_string());
        self.recents.truncate(MAX_RECENTS);
        self.touch();
        Ok(())
    }

    pub fn clear_recents(&mut self) {
        self.recents.clear();
        self.touch();
    }

    /// Swap a category with its predecessor. Returns false at the top.
    pub fn move_category_up(&mut self, category: CalculatorCategory) -> bool {
        match self.category_order.iter().position(|c| *c == category) {
            Some(index) if index > 0 => {
                self.category_order.swap(index, index - 1);
                self.touch();
                true
            }
            _ => false,
        }
    }

    /// Swap a category with its successor. Returns false at the bottom.
    pub fn move_category_down(&mut self, category: CalculatorCategory) -> bool {
        match self.category_order.iter().position(|c| *c == category) {
            Some(index) if index + 1 < self.category_order.len() => {
                self.category_order.swap(index, index + 1);
                self.touch();
                true
            }
            _ => false,
        }
    }

    pub fn reset_category_order(&mut self) {
        self.category_order = default_category_order();
        self.touch();
    }

    /// Bring a loaded file back to a consistent state.
    ///
    /// Drops duplicate and unregistered calculator ids, caps recents, and
    /// makes `category_order` a full permutation of the known categories.
    pub fn repair(&mut self) {
        let before = (self.favorites.len(), self.recents.len());

        dedup_known(&mut self.favorites);
        dedup_known(&mut self.recents);
        self.recents.truncate(MAX_RECENTS);

        let mut order: Vec<CalculatorCategory> = Vec::with_capacity(CalculatorCategory::ALL.len());
        for category in self.category_order.iter().chain(CalculatorCategory::ALL.iter()) {
            if !order.contains(category) {
                order.push(*category);
            }
        }
        self.category_order = order;

        if before != (self.favorites.len(), self.recents.len()) {
            debug!(
                favorites = self.favorites.len(),
                recents = self.recents.len(),
                "dropped unknown or duplicate calculator ids"
            );
        }
    }
}

fn dedup_known(ids: &mut Vec<String>) {
    let mut seen: Vec<String> = Vec::with_capacity(ids.len());
    ids.retain(|id| {
        if registry::get(id).is_none() || seen.contains(id) {
            return false;
        }
        seen.push(id.clone());
        true
    });
}

// ============================================================================
// Store
// ============================================================================

/// Reads and writes [`Preferences`] at a fixed path.
#[derive(Debug, Clone)]
pub struct PreferenceStore {
    path: PathBuf,
}

impl PreferenceStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at [`default_path`](Self::default_path).
    pub fn open_default() -> Self {
        Self::new(Self::default_path())
    }

    /// `$NEPHRO_PREFS_PATH` when set, else `~/.nephrocalc/preferences.json`.
    pub fn default_path() -> PathBuf {
        resolve_path(std::env::var_os(PREFS_PATH_ENV), home_dir())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load preferences; a missing file yields defaults.
    pub fn load(&self) -> CalcResult<Preferences> {
        if !self.path.exists() {
            info!(path = %self.path.display(), "no preferences file, using defaults");
            return Ok(Preferences::default());
        }

        let mut file = File::open(&self.path)
            .map_err(|e| CalcError::file_error("open", self.path.display().to_string(), e.to_string()))?;
        let mut contents = String::new();
        file.read_to_string(&mut contents)
            .map_err(|e| CalcError::file_error("read", self.path.display().to_string(), e.to_string()))?;

        let mut prefs: Preferences = serde_json::from_str(&contents).map_err(|e| CalcError::SerializationError {
            reason: format!("Invalid JSON in {}: {}", self.path.display(), e),
        })?;

        validate_version(&prefs.version)?;
        prefs.repair();

        info!(
            path = %self.path.display(),
            favorites = prefs.favorites.len(),
            recents = prefs.recents.len(),
            "preferences loaded"
        );
        Ok(prefs)
    }

    /// Save with atomic write semantics: temp file, fsync, rename.
    pub fn save(&self, prefs: &Preferences) -> CalcResult<()> {
        let json = serde_json::to_string_pretty(prefs)?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .map_err(|e| CalcError::file_error("create directory", parent.display().to_string(), e.to_string()))?;
        }

        let tmp_path = self.path.with_extension("json.tmp");
        let mut tmp_file = File::create(&tmp_path)
            .map_err(|e| CalcError::file_error("create temp file", tmp_path.display().to_string(), e.to_string()))?;
        tmp_file
            .write_all(json.as_bytes())
            .map_err(|e| CalcError::file_error("write temp file", tmp_path.display().to_string(), e.to_string()))?;
        tmp_file
            .sync_all()
            .map_err(|e| CalcError::file_error("sync temp file", tmp_path.display().to_string(), e.to_string()))?;

        fs::rename(&tmp_path, &self.path).map_err(|e| {
            let _ = fs::remove_file(&tmp_path);
            CalcError::file_error("rename to final", self.path.display().to_string(), e.to_string())
        })?;

        info!(path = %self.path.display(), "preferences saved");
        Ok(())
    }
}

fn home_dir() -> Option<PathBuf> {
    #[cfg(windows)]
    {
        std::env::var_os("USERPROFILE").map(PathBuf::from)
    }
    #[cfg(not(windows))]
    {
        std::env::var_os("HOME").map(PathBuf::from)
    }
}

fn resolve_path(override_path: Option<OsString>, home: Option<PathBuf>) -> PathBuf {
    match override_path.filter(|p| !p.is_empty()) {
        Some(path) => PathBuf::from(path),
        None => home
            .unwrap_or_default()
            .join(".nephrocalc")
            .join("preferences.json"),
    }
}

/// Validate that a file version is compatible with the current schema.
fn validate_version(file_version: &str) -> CalcResult<()> {
    let mismatch = || CalcError::VersionMismatch {
        file_version: file_version.to_string(),
        expected_version: PREFERENCES_VERSION.to_string(),
    };

    let file_parts: Vec<u32> = file_version.split('.').filter_map(|p| p.parse().ok()).collect();
    let current_parts: Vec<u32> = PREFERENCES_VERSION.split('.').filter_map(|p| p.parse().ok()).collect();

    let (Some(&file_major), Some(&current_major)) = (file_parts.first(), current_parts.first()) else {
        return Err(mismatch());
    };

    // Major version must match
    if file_major != current_major {
        return Err(mismatch());
    }

    // 0.x: a newer minor may carry breaking changes
    if current_major == 0 {
        if let (Some(file_minor), Some(current_minor)) = (file_parts.get(1), current_parts.get(1)) {
            if file_minor > current_minor {
                return Err(mismatch());
            }
        }
    }

    Ok(())
}
