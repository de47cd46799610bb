//! Allocation settings.
//!
//! Settings are read from an optional TOML file; any key left out takes the
//! default below.
//!
//! ```toml
//! max_students_per_class = 20
//! min_students_per_class = 6
//! max_instructors_per_class = 2
//! prioritize_first_choice = true
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{Result, ScheduleError};

/// Thresholds for one allocation run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub max_students_per_class: usize,
    pub min_students_per_class: usize,
    pub max_instructors_per_class: usize,
    pub prioritize_first_choice: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            max_students_per_class: 20,
            min_students_per_class: 6,
            max_instructors_per_class: 2,
            prioritize_first_choice: true,
        }
    }
}

impl Settings {
    /// Loads and validates settings from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let settings = Self::from_toml(&content)?;
        info!("Loaded settings from {}", path.as_ref().display());
        Ok(settings)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let settings: Settings = toml::from_str(content)?;
        settings.validate()?;
        Ok(settings)
    }

    /// All limits must be positive. A minimum above the maximum is allowed:
    /// such a period still needs `min` candidates and is then cut to `max`.
    pub fn validate(&self) -> Result<()> {
        if self.max_students_per_class == 0 {
            return Err(ScheduleError::InvalidSettings(
                "max_students_per_class must be at least 1".to_string(),
            ));
        }
        if self.min_students_per_class == 0 {
            return Err(ScheduleError::InvalidSettings(
                "min_students_per_class must be at least 1".to_string(),
            ));
        }
        if self.max_instructors_per_class == 0 {
            return Err(ScheduleError::InvalidSettings(
                "max_instructors_per_class must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
