//! Error types for the scheduler

use thiserror::Error;

/// Result type for scheduler operations
pub type Result<T> = std::result::Result<T, ScheduleError>;

#[derive(Error, Debug)]
pub enum ScheduleError {
    /// Allocation was requested before both rosters were imported
    #[error("Precondition failed: {0}")]
    Precondition(String),

    /// Settings values that cannot produce a schedule
    #[error("Invalid settings: {0}")]
    InvalidSettings(String),

    /// Settings file could not be parsed
    #[error("Settings file error: {0}")]
    SettingsFile(#[from] toml::de::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
