//! Weekly class scheduling: places students and instructors into recurring
//! class periods from ranked preferences, in one deterministic greedy pass.

pub mod config;
pub mod display;
pub mod error;
pub mod parser;
pub mod period;
pub mod preference;
pub mod roster;
pub mod schedule;
pub mod web;

pub use config::Settings;
pub use error::{Result, ScheduleError};
pub use period::{canonicalize, ClassPeriod, PeriodCatalog, PeriodKey, PeriodParseWarning};
pub use preference::{classify, PreferenceTier};
pub use roster::{Instructor, PersonId, PersonRecord, RosterStore, SharedRoster, Student};
pub use schedule::{allocate, Assignment, AssignmentStatus, Schedule, INSTRUCTOR_LOAD_CAP};
