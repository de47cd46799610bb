use std::collections::{HashMap, HashSet};

use tracing::{debug, info};

use crate::config::Settings;
use crate::error::{Result, ScheduleError};
use crate::period::ClassPeriod;
use crate::preference::PreferenceTier;
use crate::roster::{Instructor, PersonId, Student};
use super::types::{Assignment, AssignmentStatus, Schedule};

/// Most periods one instructor can teach in a single run. Fixed, and
/// independent of `max_instructors_per_class`.
pub const INSTRUCTOR_LOAD_CAP: usize = 2;

/// Exclusions accumulated while walking the sorted periods
#[derive(Debug, Default)]
struct AllocationState {
    assigned_students: HashSet<PersonId>,
    instructor_load: HashMap<PersonId, usize>,
}

impl AllocationState {
    fn load(&self, id: &PersonId) -> usize {
        self.instructor_load.get(id).copied().unwrap_or(0)
    }
}

/// Candidate pools for one period
struct Candidates {
    first_choice: Vec<PersonId>,
    fits: Vec<PersonId>,
    /// Every first choice or fits student in roster order
    pooled: Vec<PersonId>,
    instructors: Vec<PersonId>,
}

impl Candidates {
    fn student_count(&self) -> usize {
        self.first_choice.len() + self.fits.len()
    }
}

fn collect_candidates(
    period: &ClassPeriod,
    students: &[Student],
    instructors: &[Instructor],
    state: &AllocationState,
) -> Candidates {
    let mut first_choice = Vec::new();
    let mut fits = Vec::new();
    let mut pooled = Vec::new();
    let mut seen = HashSet::new();

    for student in students {
        if state.assigned_students.contains(&student.id) || seen.contains(&student.id) {
            continue;
        }
        let pool = match student.tier_for(&period.key) {
            PreferenceTier::FirstChoice => &mut first_choice,
            PreferenceTier::Fits => &mut fits,
            _ => continue,
        };
        seen.insert(student.id.clone());
        pool.push(student.id.clone());
        pooled.push(student.id.clone());
    }

    let mut seen_instructors = HashSet::new();
    let mut available: Vec<PersonId> = instructors
        .iter()
        .filter(|i| i.is_available(&period.key) && state.load(&i.id) < INSTRUCTOR_LOAD_CAP)
        .filter(|i| seen_instructors.insert(i.id.clone()))
        .map(|i| i.id.clone())
        .collect();
    // Stable: equal loads keep roster order
    available.sort_by_key(|id| state.load(id));

    Candidates {
        first_choice,
        fits,
        pooled,
        instructors: available,
    }
}

/// Picks the students for a viable period.
///
/// First choice students are taken before fits students, and the combined
/// list is cut at `max` keeping input order. There is no fairness
/// tie-break: a surplus of first choice students loses its tail, and fits
/// students only get the slots first choice students left over.
pub fn select_students(
    first_choice: Vec<PersonId>,
    fits: Vec<PersonId>,
    max: usize,
) -> Vec<PersonId> {
    let mut selected = first_choice;
    if selected.len() < max {
        let remaining = max - selected.len();
        selected.extend(fits.into_iter().take(remaining));
    }
    selected.truncate(max);
    selected
}

fn allocate_period(
    period: &ClassPeriod,
    students: &[Student],
    instructors: &[Instructor],
    settings: &Settings,
    state: &mut AllocationState,
) -> Option<Assignment> {
    let candidates = collect_candidates(period, students, instructors, state);

    if candidates.student_count() < settings.min_students_per_class
        || candidates.instructors.is_empty()
    {
        debug!(
            "Skipping {}: {} student candidates, {} instructors",
            period.label,
            candidates.student_count(),
            candidates.instructors.len()
        );
        return None;
    }

    let selected_instructors: Vec<PersonId> = candidates
        .instructors
        .into_iter()
        .take(settings.max_instructors_per_class)
        .collect();
    for id in &selected_instructors {
        *state.instructor_load.entry(id.clone()).or_insert(0) += 1;
    }

    let selected_students = if settings.prioritize_first_choice {
        select_students(candidates.first_choice, candidates.fits, settings.max_students_per_class)
    } else {
        let mut pooled = candidates.pooled;
        pooled.truncate(settings.max_students_per_class);
        pooled
    };
    state.assigned_students.extend(selected_students.iter().cloned());

    debug!(
        "Scheduled {} with {} students and {} instructors",
        period.label,
        selected_students.len(),
        selected_instructors.len()
    );

    Some(Assignment {
        period: period.key.clone(),
        label: period.label.clone(),
        instructors: selected_instructors,
        students: selected_students,
        status: AssignmentStatus::Scheduled,
    })
}

/// Fills class periods in one deterministic greedy pass.
///
/// Periods are visited by weekday then start time; labels with no parsable
/// time come before timed periods of the same day. A student placed in one
/// period is not considered for any later one, and an instructor teaches at
/// most [`INSTRUCTOR_LOAD_CAP`] periods. Periods that do not reach
/// `min_students_per_class` candidates or have no available instructor are
/// left out of the schedule.
pub fn allocate(
    periods: &[ClassPeriod],
    students: &[Student],
    instructors: &[Instructor],
    settings: &Settings,
) -> Result<Schedule> {
    if students.is_empty() {
        return Err(ScheduleError::Precondition(
            "no students have been imported".to_string(),
        ));
    }
    if instructors.is_empty() {
        return Err(ScheduleError::Precondition(
            "no instructors have been imported".to_string(),
        ));
    }
    settings.validate()?;

    let mut ordered: Vec<&ClassPeriod> = periods.iter().collect();
    ordered.sort_by_key(|p| p.key.sort_key());

    let mut state = AllocationState::default();
    let assignments: Vec<Assignment> = ordered
        .into_iter()
        .filter_map(|period| allocate_period(period, students, instructors, settings, &mut state))
        .collect();

    info!(
        "Schedule generated with {} of {} classes, {} students placed",
        assignments.len(),
        periods.len(),
        state.assigned_students.len()
    );

    Ok(Schedule {
        assignments,
        warnings: Vec::new(),
    })
}
