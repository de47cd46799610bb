//! Class period identity.
//!
//! Period columns in the import sheets are labelled like
//! `"Monday 1:00pm-3:00pm"`. Two labels that name the same day and the same
//! start/end clock times are the same period, whatever their spelling
//! (`1pm` and `1:00pm` are equal).

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use chrono::{NaiveTime, Weekday};
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::warn;

const DAY_NAMES: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

/// A whole day name at the very start of a column name or trimmed label
static DAY_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(monday|tuesday|wednesday|thursday|friday|saturday|sunday)\b")
        .expect("day pattern is valid")
});

static TIME_RANGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(\d{1,2})(?::(\d{2}))?\s*(am|pm)\s*-\s*(\d{1,2})(?::(\d{2}))?\s*(am|pm)")
        .expect("time range pattern is valid")
});

/// A wall clock time of day, displayed as `1:00pm`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ClockTime(NaiveTime);

impl ClockTime {
    /// Builds a time from 12-hour clock parts
    pub fn from_meridiem(hour: u32, minute: u32, pm: bool) -> Option<Self> {
        if !(1..=12).contains(&hour) {
            return None;
        }
        let hour24 = match (hour, pm) {
            (12, false) => 0,
            (12, true) => 12,
            (h, false) => h,
            (h, true) => h + 12,
        };
        NaiveTime::from_hms_opt(hour24, minute, 0).map(ClockTime)
    }
}

impl fmt::Display for ClockTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%-I:%M%P"))
    }
}

/// Canonical identity of a class period
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PeriodKey {
    Timed {
        day: Weekday,
        start: ClockTime,
        end: ClockTime,
    },
    /// Label that did not contain a recognizable time range. Identity is the
    /// day token plus the raw label so distinct labels never collapse.
    Untimed {
        day: Option<Weekday>,
        label: String,
    },
}

impl PeriodKey {
    pub fn day(&self) -> Option<Weekday> {
        match self {
            PeriodKey::Timed { day, .. } => Some(*day),
            PeriodKey::Untimed { day, .. } => *day,
        }
    }

    pub fn start(&self) -> Option<ClockTime> {
        match self {
            PeriodKey::Timed { start, .. } => Some(*start),
            PeriodKey::Untimed { .. } => None,
        }
    }

    /// Ordering used by the allocation pass: weekday (Monday first, labels
    /// without a day before all others), then start time with untimed
    /// periods first.
    pub fn sort_key(&self) -> (Option<u32>, Option<ClockTime>) {
        (self.day().map(|d| d.num_days_from_monday()), self.start())
    }
}

impl fmt::Display for PeriodKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PeriodKey::Timed { day, start, end } => {
                write!(f, "{} {}-{}", DAY_NAMES[day.num_days_from_monday() as usize], start, end)
            }
            PeriodKey::Untimed { label, .. } => write!(f, "{}", label),
        }
    }
}

/// Raised when a period label has no parsable time range. Never aborts a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodParseWarning {
    pub label: String,
    pub reason: String,
}

impl fmt::Display for PeriodParseWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "period label {:?}: {}", self.label, self.reason)
    }
}

/// Result of canonicalizing one label
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Canonical {
    pub key: PeriodKey,
    pub warning: Option<PeriodParseWarning>,
}

/// True when a column name starts with a day of the week
pub fn is_period_column(name: &str) -> bool {
    DAY_TOKEN.is_match(name)
}

fn parse_day(label: &str) -> Option<Weekday> {
    DAY_TOKEN
        .captures(label)
        .and_then(|caps| Weekday::from_str(&caps[1]).ok())
}

fn parse_clock(hour: &str, minute: Option<&str>, meridiem: &str) -> Option<ClockTime> {
    let hour: u32 = hour.parse().ok()?;
    let minute: u32 = match minute {
        Some(m) => m.parse().ok()?,
        None => 0,
    };
    ClockTime::from_meridiem(hour, minute, meridiem.eq_ignore_ascii_case("pm"))
}

/// Derives the canonical period identity from a free-text label
pub fn canonicalize(label: &str) -> Canonical {
    let trimmed = label.trim();
    let day = parse_day(trimmed);

    let untimed = |reason: &str| Canonical {
        key: PeriodKey::Untimed {
            day,
            label: trimmed.to_string(),
        },
        warning: Some(PeriodParseWarning {
            label: trimmed.to_string(),
            reason: reason.to_string(),
        }),
    };

    let Some(day_value) = day else {
        return untimed("no day-of-week token");
    };
    let Some(caps) = TIME_RANGE.captures(trimmed) else {
        return untimed("no time range like 1:00pm-3:00pm");
    };

    let start = parse_clock(&caps[1], caps.get(2).map(|m| m.as_str()), &caps[3]);
    let end = parse_clock(&caps[4], caps.get(5).map(|m| m.as_str()), &caps[6]);
    match (start, end) {
        (Some(start), Some(end)) => Canonical {
            key: PeriodKey::Timed {
                day: day_value,
                start,
                end,
            },
            warning: None,
        },
        _ => untimed("time out of range"),
    }
}

/// A recurring class slot. Membership is derived from the roster on demand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassPeriod {
    pub key: PeriodKey,
    /// First label this period was registered under
    pub label: String,
}

/// Deduplicated set of periods seen across student and instructor imports
#[derive(Debug, Clone, Default)]
pub struct PeriodCatalog {
    periods: Vec<ClassPeriod>,
    index: HashMap<PeriodKey, usize>,
    warnings: Vec<PeriodParseWarning>,
}

impl PeriodCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the period for `label`, creating it if its key is new
    pub fn register(&mut self, label: &str) -> &ClassPeriod {
        let Canonical { key, warning } = canonicalize(label);

        if let Some(warning) = warning {
            if !self.warnings.iter().any(|w| w.label == warning.label) {
                warn!("{}", warning);
                self.warnings.push(warning);
            }
        }

        let position = match self.index.get(&key) {
            Some(&position) => position,
            None => {
                let position = self.periods.len();
                self.periods.push(ClassPeriod {
                    key: key.clone(),
                    label: label.trim().to_string(),
                });
                self.index.insert(key, position);
                position
            }
        };
        &self.periods[position]
    }

    /// Periods in first-seen order
    pub fn periods(&self) -> &[ClassPeriod] {
        &self.periods
    }

    pub fn warnings(&self) -> &[PeriodParseWarning] {
        &self.warnings
    }

    pub fn len(&self) -> usize {
        self.periods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.periods.is_empty()
    }

    pub fn clear(&mut self) {
        self.periods.clear();
        self.index.clear();
        self.warnings.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn timed(label: &str) -> (Weekday, String, String) {
        match canonicalize(label).key {
            PeriodKey::Timed { day, start, end } => (day, start.to_string(), end.to_string()),
            other => panic!("expected timed key, got {:?}", other),
        }
    }

    #[test]
    fn test_canonicalize_full_label() {
        let (day, start, end) = timed("Monday 1:00pm-3:00pm");
        assert_eq!(day, Weekday::Mon);
        assert_eq!(start, "1:00pm");
        assert_eq!(end, "3:00pm");
    }

    #[test]
    fn test_short_and_long_times_match() {
        assert_eq!(
            canonicalize("Monday 1pm-3pm").key,
            canonicalize("Monday 1:00pm - 3:00PM").key
        );
    }

    #[test]
    fn test_noon_and_midnight() {
        let (_, start, end) = timed("Friday 12:00am-12:30pm");
        assert_eq!(start, "12:00am");
        assert_eq!(end, "12:30pm");
    }

    #[test]
    fn test_unparsable_label_keeps_raw_identity() {
        let a = canonicalize("Tuesday morning");
        let b = canonicalize("Tuesday evening");
        assert_ne!(a.key, b.key);
        assert_eq!(a.key.day(), Some(Weekday::Tue));
        assert!(a.warning.is_some());
    }

    #[test]
    fn test_out_of_range_hour_is_untimed() {
        let c = canonicalize("Monday 13:00pm-3:00pm");
        assert!(matches!(c.key, PeriodKey::Untimed { .. }));
        assert_eq!(c.warning.unwrap().reason, "time out of range");
    }

    #[test]
    fn test_missing_day_token() {
        let c = canonicalize("1:00pm-3:00pm");
        assert_eq!(c.key.day(), None);
        assert!(c.warning.is_some());
    }

    #[test]
    fn test_is_period_column() {
        assert!(is_period_column("Monday 1:00pm-3:00pm"));
        assert!(is_period_column("Sunday"));
        assert!(!is_period_column("ID"));
        assert!(!is_period_column("Building"));
        assert!(!is_period_column(" Monday 1pm-2pm"));
        assert!(!is_period_column("Mondays 1pm-2pm"));
        assert!(!is_period_column("Monday1pm-2pm"));
    }

    #[test]
    fn test_period_columns_always_carry_a_day() {
        for name in [
            "Monday 1:00pm-3:00pm",
            "tuesday 9am-10am",
            "FRIDAY lunch",
            "Sunday",
            "Wednesday-10am-11am",
        ] {
            assert!(is_period_column(name), "{name}");
            assert!(canonicalize(name).key.day().is_some(), "{name}");
        }
        for name in ["Mondays 1pm-2pm", "Fridayish", "ID"] {
            assert!(!is_period_column(name), "{name}");
        }
    }

    #[test]
    fn test_register_is_idempotent() {
        let mut catalog = PeriodCatalog::new();
        catalog.register("Monday 1:00pm-3:00pm");
        catalog.register("Tuesday 9:00am-10:00am");
        let again = catalog.register("Monday 1pm-3pm").clone();

        assert_eq!(catalog.len(), 2);
        assert_eq!(again.label, "Monday 1:00pm-3:00pm");
        assert_eq!(catalog.periods()[1].label, "Tuesday 9:00am-10:00am");
    }

    #[test]
    fn test_register_records_warning_once() {
        let mut catalog = PeriodCatalog::new();
        catalog.register("Wednesday TBD");
        catalog.register("Wednesday TBD");
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.warnings().len(), 1);

        catalog.clear();
        assert!(catalog.is_empty());
        assert!(catalog.warnings().is_empty());
    }

    #[test]
    fn test_sort_key_orders_weekdays() {
        let monday = canonicalize("Monday 9:00am-10:00am").key;
        let monday_late = canonicalize("Monday 1:00pm-2:00pm").key;
        let friday = canonicalize("Friday 8:00am-9:00am").key;
        assert!(monday.sort_key() < monday_late.sort_key());
        assert!(monday_late.sort_key() < friday.sort_key());
    }
}
