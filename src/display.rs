use std::fs::File;
use std::io::Write;
use std::path::Path;

use csv::Writer;
use serde::Serialize;

use crate::error::Result;
use crate::roster::{PersonId, RosterStore};
use crate::schedule::{PeriodReadiness, ReadinessStatus, Schedule};

const EXPORT_HEADERS: [&str; 5] = ["Class Time", "Instructors", "Students", "Room", "Status"];
const ROOM_PLACEHOLDER: &str = "TBD";

/// Joins ids as `a, b, c`
pub fn format_ids(ids: &[PersonId]) -> String {
    ids.iter().map(PersonId::as_str).collect::<Vec<_>>().join(", ")
}

/// Writes the schedule as CSV with one row per scheduled class
pub fn write_schedule_csv<W: Write>(schedule: &Schedule, writer: W) -> Result<()> {
    let mut wtr = Writer::from_writer(writer);
    wtr.write_record(EXPORT_HEADERS)?;

    for assignment in &schedule.assignments {
        let instructors = format_ids(&assignment.instructors);
        let students = format!("{} students", assignment.students.len());
        wtr.write_record([
            assignment.label.as_str(),
            instructors.as_str(),
            students.as_str(),
            ROOM_PLACEHOLDER,
            assignment.status.label(),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}

/// Exports the schedule to a CSV file, replacing any existing file
pub fn export_schedule<P: AsRef<Path>>(schedule: &Schedule, path: P) -> Result<()> {
    let file = File::create(path)?;
    write_schedule_csv(schedule, file)
}

/// Dashboard counts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RosterSummary {
    pub students: usize,
    pub instructors: usize,
    pub classes: usize,
    pub scheduled: usize,
}

impl RosterSummary {
    pub fn new(roster: &RosterStore, schedule: Option<&Schedule>) -> Self {
        RosterSummary {
            students: roster.all_students().len(),
            instructors: roster.all_instructors().len(),
            classes: roster.all_periods().len(),
            scheduled: schedule.map(Schedule::len).unwrap_or(0),
        }
    }
}

/// Prints the readiness of every class period
pub fn print_readiness(report: &[PeriodReadiness]) {
    println!("\n=== Classes ===");
    for entry in report {
        let status = match entry.status {
            ReadinessStatus::Ready => "Ready",
            ReadinessStatus::NotReady => "Not Ready",
        };
        println!(
            "  {} -> {} students, {} instructors [{}]",
            entry.label, entry.student_candidates, entry.available_instructors, status
        );
    }
}

/// Prints a schedule in a readable format
pub fn print_schedule(schedule: &Schedule) {
    println!("\n=== Schedule ===");
    println!("Total classes scheduled: {}", schedule.len());
    println!("Total students placed: {}", schedule.assigned_student_count());

    if !schedule.warnings.is_empty() {
        println!("⚠️  Unparsed class labels ({}):", schedule.warnings.len());
        for warning in &schedule.warnings {
            println!("  - {}", warning);
        }
    }

    for assignment in &schedule.assignments {
        println!(
            "  {} -> instructors: {} | {} students | {}",
            assignment.label,
            format_ids(&assignment.instructors),
            assignment.students.len(),
            assignment.status.label()
        );
        println!("      {}", format_ids(&assignment.students));
    }
}
