use serde::{Deserialize, Serialize};

use crate::config::Settings;
use crate::period::{ClassPeriod, PeriodKey};
use crate::roster::{Instructor, Student};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReadinessStatus {
    Ready,
    NotReady,
}

/// Pre-allocation view of a period: who could attend or teach it, before any
/// cross-period exclusions or instructor load limits apply
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodReadiness {
    pub period: PeriodKey,
    pub label: String,
    pub student_candidates: usize,
    pub available_instructors: usize,
    pub status: ReadinessStatus,
}

/// Readiness of every period, in catalog order
pub fn period_readiness(
    periods: &[ClassPeriod],
    students: &[Student],
    instructors: &[Instructor],
    settings: &Settings,
) -> Vec<PeriodReadiness> {
    periods
        .iter()
        .map(|period| {
            let student_candidates = students
                .iter()
                .filter(|s| s.tier_for(&period.key).is_candidate())
                .count();
            let available_instructors = instructors
                .iter()
                .filter(|i| i.is_available(&period.key))
                .count();
            let status = if student_candidates >= settings.min_students_per_class
                && available_instructors > 0
            {
                ReadinessStatus::Ready
            } else {
                ReadinessStatus::NotReady
            };
            PeriodReadiness {
                period: period.key.clone(),
                label: period.label.clone(),
                student_candidates,
                available_instructors,
                status,
            }
        })
        .collect()
}
