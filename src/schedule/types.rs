use serde::{Deserialize, Serialize};

use crate::period::{PeriodKey, PeriodParseWarning};
use crate::roster::PersonId;

/// State of an emitted assignment. The allocation pass only produces
/// `Scheduled`; periods it cannot fill are left out of the schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AssignmentStatus {
    Scheduled,
}

impl AssignmentStatus {
    pub fn label(self) -> &'static str {
        match self {
            AssignmentStatus::Scheduled => "Scheduled",
        }
    }
}

/// Students and instructors placed into one class period
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    pub period: PeriodKey,
    pub label: String,
    /// In selection order, least loaded first
    pub instructors: Vec<PersonId>,
    /// In selection order, first choice students first; no id repeats
    pub students: Vec<PersonId>,
    pub status: AssignmentStatus,
}

/// Result of one allocation run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schedule {
    /// In allocation order (weekday, then start time)
    pub assignments: Vec<Assignment>,
    /// Period labels that could not be parsed; they were still scheduled
    /// under their raw label
    pub warnings: Vec<PeriodParseWarning>,
}

impl Schedule {
    pub fn len(&self) -> usize {
        self.assignments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }

    pub fn assignment_for(&self, period: &PeriodKey) -> Option<&Assignment> {
        self.assignments.iter().find(|a| &a.period == period)
    }

    /// Assignments that include the given student
    pub fn assignments_for_student<'a>(
        &'a self,
        id: &'a PersonId,
    ) -> impl Iterator<Item = &'a Assignment> {
        self.assignments.iter().filter(move |a| a.students.contains(id))
    }

    /// Assignments taught by the given instructor
    pub fn assignments_for_instructor<'a>(
        &'a self,
        id: &'a PersonId,
    ) -> impl Iterator<Item = &'a Assignment> {
        self.assignments.iter().filter(move |a| a.instructors.contains(id))
    }

    pub fn assigned_student_count(&self) -> usize {
        self.assignments.iter().map(|a| a.students.len()).sum()
    }
}
