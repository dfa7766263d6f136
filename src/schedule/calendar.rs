/// Semester-relative week and lecture slot arithmetic
use super::{ClassCode, ScheduleRule};
use crate::store::{RecordSnapshot, SlotCoordinate};
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// What to do when a sequential-fill class has no open slot left in a week
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FullWeekPolicy {
    /// Answer slot 1 anyway; the occupancy check will then reject it.
    #[default]
    FallbackToFirst,
    /// Report that no slot is available.
    Reject,
}

/// Semester boundaries. Week 1 starts on `start`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SemesterCalendar {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl SemesterCalendar {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    pub fn week_of(&self, date: NaiveDate) -> i64 {
        week_number(date, self.start)
    }

    /// Week number containing the semester end date
    pub fn last_week(&self) -> i64 {
        week_number(self.end, self.start)
    }
}

/// `floor(days since start / 7) + 1`. Dates before the start give weeks < 1;
/// nothing is clamped here.
pub fn week_number(date: NaiveDate, semester_start: NaiveDate) -> i64 {
    let days = (date - semester_start).num_days();
    days.div_euclid(7) + 1
}

/// Lecture slot for a class in a given week.
///
/// Weekday rules map the ISO weekday (Monday = 1 .. Sunday = 7) to its
/// 1-based position in the rule's list, defaulting to slot 1 for days the
/// class does not meet. Sequential rules return the first slot of the week
/// that is not already resolved in `snapshot`. Returns `None` only when a
/// sequential week is full and `policy` is [`FullWeekPolicy::Reject`].
pub fn lecture_slot(
    date: NaiveDate,
    class_code: ClassCode,
    week: u32,
    rule: Option<&ScheduleRule>,
    snapshot: &RecordSnapshot,
    policy: FullWeekPolicy,
) -> Option<u32> {
    match rule {
        Some(ScheduleRule::Sequential { max_slots }) => {
            let open = (1..=*max_slots).find(|&lecture| {
                let coordinate = SlotCoordinate::new(class_code, week, lecture);
                !snapshot.is_resolved(&coordinate)
            });
            match (open, policy) {
                (Some(lecture), _) => Some(lecture),
                (None, FullWeekPolicy::FallbackToFirst) => Some(1),
                (None, FullWeekPolicy::Reject) => None,
            }
        }
        Some(ScheduleRule::Weekdays(days)) => {
            let weekday = date.weekday().number_from_monday();
            let position = days.iter().position(|&day| day == weekday);
            Some(position.map_or(1, |index| index as u32 + 1))
        }
        None => Some(1),
    }
}
