pub mod types;
pub mod allocation;
pub mod readiness;

pub use types::{Assignment, AssignmentStatus, Schedule};
pub use allocation::{allocate, select_students, INSTRUCTOR_LOAD_CAP};
pub use readiness::{period_readiness, PeriodReadiness, ReadinessStatus};
