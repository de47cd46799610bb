use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::Settings;
use crate::error::Result;
use crate::period::{is_period_column, ClassPeriod, PeriodCatalog, PeriodKey, PeriodParseWarning};
use crate::preference::{classify, PreferenceTier};
use crate::schedule::{allocate, period_readiness, PeriodReadiness, Schedule};

const ID_COLUMN: &str = "ID";
const UNKNOWN_ID: &str = "Unknown";
const BUILDING_PREFIX: &str = "Building";
const TEACH_WITH_COLUMN: &str = "Would you like to teach with someone else?";
const DEFAULT_BUILDING: &str = "N/A";
const DEFAULT_TEACH_WITH: &str = "No Preference";

/// Identifier of a student or instructor, unique within its own roster
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PersonId(String);

impl PersonId {
    pub fn new(id: impl Into<String>) -> Self {
        PersonId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PersonId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PersonId {
    fn from(id: &str) -> Self {
        PersonId::new(id)
    }
}

/// One imported row: column name -> raw cell text, in sheet column order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PersonRecord {
    fields: Vec<(String, String)>,
}

impl PersonRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_field(mut self, column: impl Into<String>, value: impl Into<String>) -> Self {
        self.push(column, value);
        self
    }

    pub fn push(&mut self, column: impl Into<String>, value: impl Into<String>) {
        self.fields.push((column.into(), value.into()));
    }

    pub fn get(&self, column: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value.as_str())
    }

    /// The `ID` column, or `"Unknown"` when missing or blank
    pub fn id(&self) -> PersonId {
        match self.get(ID_COLUMN).map(str::trim) {
            Some(id) if !id.is_empty() => PersonId::new(id),
            _ => PersonId::new(UNKNOWN_ID),
        }
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Columns whose name starts with a day of the week. Every such column
    /// names a period, even when this row left it blank.
    fn period_columns(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields().filter(|(column, _)| is_period_column(column))
    }

    pub fn is_blank(&self) -> bool {
        self.fields.iter().all(|(_, value)| value.trim().is_empty())
    }
}

#[derive(Debug, Clone)]
pub struct Student {
    pub id: PersonId,
    pub preferences: HashMap<PeriodKey, PreferenceTier>,
    pub building: String,
}

impl Student {
    pub fn tier_for(&self, period: &PeriodKey) -> PreferenceTier {
        self.preferences
            .get(period)
            .copied()
            .unwrap_or(PreferenceTier::Unspecified)
    }
}

#[derive(Debug, Clone)]
pub struct Instructor {
    pub id: PersonId,
    pub preferences: HashMap<PeriodKey, PreferenceTier>,
    /// Carried for display; the allocation pass does not read it
    pub teach_with_preference: String,
}

impl Instructor {
    pub fn tier_for(&self, period: &PeriodKey) -> PreferenceTier {
        self.preferences
            .get(period)
            .copied()
            .unwrap_or(PreferenceTier::Unspecified)
    }

    pub fn is_available(&self, period: &PeriodKey) -> bool {
        self.tier_for(period).makes_available()
    }
}

/// Keeps the first position of each id; a later duplicate replaces the entry in place
fn upsert<T>(
    people: &mut Vec<T>,
    positions: &mut HashMap<PersonId, usize>,
    id: PersonId,
    person: T,
    role: &str,
) {
    match positions.get(&id) {
        Some(&i) => {
            warn!("Duplicate {} id {}, keeping the later row", role, id);
            people[i] = person;
        }
        None => {
            positions.insert(id, people.len());
            people.push(person);
        }
    }
}

/// Current students, instructors and the periods seen in their imports
#[derive(Debug, Clone, Default)]
pub struct RosterStore {
    students: Vec<Student>,
    instructors: Vec<Instructor>,
    catalog: PeriodCatalog,
}

impl RosterStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces every student with the given records
    pub fn replace_students(&mut self, records: &[PersonRecord]) {
        let mut students = Vec::with_capacity(records.len());
        let mut positions = HashMap::new();

        for record in records {
            let mut preferences = HashMap::new();
            for (column, value) in record.period_columns() {
                let key = self.catalog.register(column).key.clone();
                if !value.trim().is_empty() {
                    preferences.insert(key, classify(value));
                }
            }
            let building = record
                .fields()
                .find(|(column, _)| column.starts_with(BUILDING_PREFIX))
                .map(|(_, value)| value.trim())
                .filter(|value| !value.is_empty())
                .unwrap_or(DEFAULT_BUILDING)
                .to_string();

            let id = record.id();
            let student = Student {
                id: id.clone(),
                preferences,
                building,
            };
            upsert(&mut students, &mut positions, id, student, "student");
        }

        info!("Imported {} students ({} periods known)", students.len(), self.catalog.len());
        self.students = students;
    }

    /// Replaces every instructor with the given records
    pub fn replace_instructors(&mut self, records: &[PersonRecord]) {
        let mut instructors = Vec::with_capacity(records.len());
        let mut positions = HashMap::new();

        for record in records {
            let mut preferences = HashMap::new();
            for (column, value) in record.period_columns() {
                let key = self.catalog.register(column).key.clone();
                if !value.trim().is_empty() {
                    preferences.insert(key, PreferenceTier::from_instructor_response(value));
                }
            }
            let teach_with_preference = record
                .get(TEACH_WITH_COLUMN)
                .map(str::trim)
                .filter(|value| !value.is_empty())
                .unwrap_or(DEFAULT_TEACH_WITH)
                .to_string();

            let id = record.id();
            let instructor = Instructor {
                id: id.clone(),
                preferences,
                teach_with_preference,
            };
            upsert(&mut instructors, &mut positions, id, instructor, "instructor");
        }

        info!("Imported {} instructors ({} periods known)", instructors.len(), self.catalog.len());
        self.instructors = instructors;
    }

    pub fn all_students(&self) -> &[Student] {
        &self.students
    }

    pub fn all_instructors(&self) -> &[Instructor] {
        &self.instructors
    }

    /// Periods in first-seen order across both imports
    pub fn all_periods(&self) -> &[ClassPeriod] {
        self.catalog.periods()
    }

    pub fn warnings(&self) -> &[PeriodParseWarning] {
        self.catalog.warnings()
    }

    pub fn clear_students(&mut self) {
        self.students.clear();
    }

    pub fn clear_instructors(&mut self) {
        self.instructors.clear();
    }

    pub fn clear_periods(&mut self) {
        self.catalog.clear();
    }

    /// Runs one allocation pass over the current roster
    pub fn allocate(&self, settings: &Settings) -> Result<Schedule> {
        let mut schedule =
            allocate(self.all_periods(), &self.students, &self.instructors, settings)?;
        schedule.warnings = self.warnings().to_vec();
        Ok(schedule)
    }

    pub fn readiness(&self, settings: &Settings) -> Vec<PeriodReadiness> {
        period_readiness(self.all_periods(), &self.students, &self.instructors, settings)
    }
}

/// Roster plus the schedule last generated from it. They live under one
/// lock so a stored schedule always matches the roster it was built from.
#[derive(Debug, Default)]
struct SharedState {
    store: RosterStore,
    schedule: Option<Schedule>,
}

/// Roster shared between request handlers. Imports, resets and schedule
/// generation hold the write lock; reads share the read lock.
#[derive(Debug, Clone, Default)]
pub struct SharedRoster {
    inner: Arc<RwLock<SharedState>>,
}

impl SharedRoster {
    pub fn new(store: RosterStore) -> Self {
        SharedRoster {
            inner: Arc::new(RwLock::new(SharedState {
                store,
                schedule: None,
            })),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, SharedState> {
        // A panicked writer leaves the previous roster in place; reads stay valid
        self.inner.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, SharedState> {
        self.inner.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Applies a roster change and drops the schedule built from the old roster
    fn mutate(&self, f: impl FnOnce(&mut RosterStore)) {
        let mut state = self.write();
        f(&mut state.store);
        state.schedule = None;
    }

    pub fn replace_students(&self, records: &[PersonRecord]) {
        self.mutate(|store| store.replace_students(records));
    }

    pub fn replace_instructors(&self, records: &[PersonRecord]) {
        self.mutate(|store| store.replace_instructors(records));
    }

    pub fn clear_students(&self) {
        self.mutate(RosterStore::clear_students);
    }

    pub fn clear_instructors(&self) {
        self.mutate(RosterStore::clear_instructors);
    }

    pub fn clear_periods(&self) {
        self.mutate(RosterStore::clear_periods);
    }

    /// Consistent copy of the roster at this instant
    pub fn snapshot(&self) -> RosterStore {
        self.read().store.clone()
    }

    /// Allocates and stores the schedule in one critical section. A failed
    /// run leaves no schedule stored.
    pub fn generate(&self, settings: &Settings) -> Result<Schedule> {
        let mut state = self.write();
        let result = state.store.allocate(settings);
        state.schedule = result.as_ref().ok().cloned();
        result
    }

    /// Last generated schedule, if the roster has not changed since
    pub fn current_schedule(&self) -> Option<Schedule> {
        self.read().schedule.clone()
    }

    pub fn with<R>(&self, f: impl FnOnce(&RosterStore, Option<&Schedule>) -> R) -> R {
        let state = self.read();
        f(&state.store, state.schedule.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn student(id: &str, period: &str, response: &str) -> PersonRecord {
        PersonRecord::new()
            .with_field("ID", id)
            .with_field("Building", "North")
            .with_field(period, response)
    }

    #[test]
    fn test_record_id_defaults_to_unknown() {
        assert_eq!(PersonRecord::new().id(), PersonId::from("Unknown"));
        assert_eq!(
            PersonRecord::new().with_field("ID", "  ").id(),
            PersonId::from("Unknown")
        );
        assert_eq!(
            PersonRecord::new().with_field("ID", " s1 ").id(),
            PersonId::from("s1")
        );
    }

    #[test]
    fn test_replace_students_is_wholesale() {
        let mut roster = RosterStore::new();
        roster.replace_students(&[
            student("s1", "Monday 1:00pm-3:00pm", "First Choice"),
            student("s2", "Monday 1:00pm-3:00pm", "Fits"),
        ]);
        assert_eq!(roster.all_students().len(), 2);

        roster.replace_students(&[student("s3", "Tuesday 9:00am-10:00am", "Fits")]);
        let ids: Vec<&str> = roster.all_students().iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["s3"]);

        // Periods accumulate across imports
        assert_eq!(roster.all_periods().len(), 2);
    }

    #[test]
    fn test_student_fields() {
        let mut roster = RosterStore::new();
        roster.replace_students(&[
            student("s1", "Monday 1:00pm-3:00pm", "First Choice")
                .with_field("Tuesday 9am-10am", ""),
            PersonRecord::new().with_field("ID", "s2"),
        ]);
        let s1 = &roster.all_students()[0];
        let monday = &roster.all_periods()[0].key;
        let tuesday = &roster.all_periods()[1].key;

        assert_eq!(s1.building, "North");
        assert_eq!(s1.tier_for(monday), PreferenceTier::FirstChoice);
        assert!(!s1.preferences.contains_key(tuesday));
        assert_eq!(roster.all_students()[1].building, "N/A");
    }

    #[test]
    fn test_duplicate_ids_keep_first_position() {
        let mut roster = RosterStore::new();
        roster.replace_students(&[
            student("s1", "Monday 1:00pm-3:00pm", "Fits"),
            student("s2", "Monday 1:00pm-3:00pm", "Fits"),
            student("s1", "Monday 1:00pm-3:00pm", "First Choice"),
        ]);
        let students = roster.all_students();
        assert_eq!(students.len(), 2);
        assert_eq!(students[0].id.as_str(), "s1");
        let monday = &roster.all_periods()[0].key;
        assert_eq!(students[0].tier_for(monday), PreferenceTier::FirstChoice);
    }

    #[test]
    fn test_instructor_availability_and_teach_with() {
        let mut roster = RosterStore::new();
        roster.replace_instructors(&[
            PersonRecord::new()
                .with_field("ID", "t1")
                .with_field("Monday 1:00pm-3:00pm", "Fits")
                .with_field("Tuesday 9:00am-10:00am", "does not fit")
                .with_field("Would you like to teach with someone else?", "Yes"),
            PersonRecord::new()
                .with_field("ID", "t2")
                .with_field("Monday 1pm-3pm", ""),
        ]);
        let monday = roster.all_periods()[0].key.clone();
        let tuesday = roster.all_periods()[1].key.clone();
        let t1 = &roster.all_instructors()[0];
        let t2 = &roster.all_instructors()[1];

        assert_eq!(roster.all_periods().len(), 2);
        assert!(t1.is_available(&monday));
        assert!(!t1.is_available(&tuesday));
        assert_eq!(t1.teach_with_preference, "Yes");
        assert!(!t2.is_available(&monday));
        assert_eq!(t2.teach_with_preference, "No Preference");
    }

    #[test]
    fn test_shared_roster_snapshot_is_detached() {
        let shared = SharedRoster::default();
        shared.replace_students(&[student("s1", "Monday 1:00pm-3:00pm", "Fits")]);
        let snapshot = shared.snapshot();

        shared.clear_students();
        assert_eq!(snapshot.all_students().len(), 1);
        assert!(shared.with(|r, _| r.all_students().is_empty()));
    }

    fn shared_with_one_class() -> SharedRoster {
        let shared = SharedRoster::default();
        shared.replace_students(&[student("s1", "Monday 1:00pm-3:00pm", "Fits")]);
        shared.replace_instructors(&[student("t1", "Monday 1:00pm-3:00pm", "Fits")]);
        shared
    }

    #[test]
    fn test_generate_stores_schedule() {
        let shared = shared_with_one_class();
        let settings = Settings {
            min_students_per_class: 1,
            ..Settings::default()
        };
        assert!(shared.current_schedule().is_none());

        let schedule = shared.generate(&settings).unwrap();
        assert_eq!(schedule.len(), 1);
        assert_eq!(shared.current_schedule(), Some(schedule));
    }

    #[test]
    fn test_roster_change_drops_stored_schedule() {
        let settings = Settings {
            min_students_per_class: 1,
            ..Settings::default()
        };
        let shared = shared_with_one_class();
        shared.generate(&settings).unwrap();
        shared.replace_students(&[student("s2", "Monday 1:00pm-3:00pm", "Fits")]);
        assert!(shared.current_schedule().is_none());

        shared.generate(&settings).unwrap();
        shared.clear_periods();
        assert!(shared.current_schedule().is_none());
        assert!(shared.with(|_, schedule| schedule.is_none()));
    }

    #[test]
    fn test_failed_generate_clears_stored_schedule() {
        let settings = Settings {
            min_students_per_class: 1,
            ..Settings::default()
        };
        let shared = shared_with_one_class();
        shared.generate(&settings).unwrap();

        let invalid = Settings {
            max_instructors_per_class: 0,
            ..settings
        };
        assert!(shared.generate(&invalid).is_err());
        assert!(shared.current_schedule().is_none());
    }

    #[test]
    fn test_concurrent_generate_and_import_stay_consistent() {
        let settings = Settings {
            min_students_per_class: 1,
            ..Settings::default()
        };
        let shared = shared_with_one_class();
        let importer = {
            let shared = shared.clone();
            std::thread::spawn(move || {
                for i in 0..50 {
                    let id = format!("s{i}");
                    shared.replace_students(&[student(&id, "Monday 1:00pm-3:00pm", "Fits")]);
                }
            })
        };
        for _ in 0..50 {
            shared.generate(&settings).unwrap();
            // A stored schedule must name the student currently in the roster
            shared.with(|roster, schedule| {
                if let Some(schedule) = schedule {
                    let current = &roster.all_students()[0].id;
                    assert_eq!(&schedule.assignments[0].students[0], current);
                }
            });
        }
        importer.join().unwrap();
    }
}
