/// Accept/reject decisions for individual candidates
use crate::catalog::CandidateVideo;
use crate::schedule::{
    lecture_slot, title_mentions_class, FullWeekPolicy, ParsedTitle, ScheduleTable, SemesterCalendar,
};
use crate::store::{RecordSnapshot, SlotCoordinate, SlotValue};
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;

/// Why a candidate was skipped
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum RejectReason {
    /// The recording is already in the record, or was placed earlier this run
    Duplicate,
    /// No class or no date could be read from the title
    Unparseable,
    /// The title does not literally name the parsed class
    ClassMismatch,
    /// Week falls before the semester, or after it when the end is enforced
    WeekOutOfRange { week: i64 },
    /// Every sequential slot of the week is taken
    NoSlotAvailable,
    /// The record has no entry for the computed coordinate
    UnknownSlot,
    /// The computed slot already holds a recording
    SlotOccupied { existing: String },
}

impl RejectReason {
    /// Stable reason code for logs and reports
    pub fn code(&self) -> &'static str {
        match self {
            RejectReason::Duplicate => "duplicate",
            RejectReason::Unparseable => "unparseable",
            RejectReason::ClassMismatch => "class-mismatch",
            RejectReason::WeekOutOfRange { .. } => "week-out-of-range",
            RejectReason::NoSlotAvailable => "no-slot-available",
            RejectReason::UnknownSlot => "unknown-slot",
            RejectReason::SlotOccupied { .. } => "slot-occupied",
        }
    }
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectReason::WeekOutOfRange { week } => write!(f, "{} (week {})", self.code(), week),
            RejectReason::SlotOccupied { existing } => write!(f, "{} ({})", self.code(), existing),
            _ => f.write_str(self.code()),
        }
    }
}

/// Outcome of evaluating one candidate
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// Place the candidate at `coordinate`; `lecture_date` is the date read from its title
    Accept {
        coordinate: SlotCoordinate,
        lecture_date: NaiveDate,
    },
    Reject(RejectReason),
}

/// Ids already in the record plus ids placed during the current run
#[derive(Debug, Clone, Default)]
pub struct DuplicateIndex {
    existing: HashSet<String>,
    seen_this_run: HashSet<String>,
}

impl DuplicateIndex {
    /// Built once per run from the starting snapshot
    pub fn from_snapshot(snapshot: &RecordSnapshot) -> Self {
        Self {
            existing: snapshot.existing_external_ids(),
            seen_this_run: HashSet::new(),
        }
    }

    pub fn contains(&self, external_id: &str) -> bool {
        self.existing.contains(external_id) || self.seen_this_run.contains(external_id)
    }

    pub fn record(&mut self, external_id: &str) {
        self.seen_this_run.insert(external_id.to_string());
    }

    pub fn existing_count(&self) -> usize {
        self.existing.len()
    }
}

/// Placement rules shared by every candidate of a run
#[derive(Debug, Clone)]
pub struct Resolver {
    schedule: ScheduleTable,
    calendar: SemesterCalendar,
    full_week_policy: FullWeekPolicy,
    enforce_semester_end: bool,
}

impl Resolver {
    pub fn new(
        schedule: ScheduleTable,
        calendar: SemesterCalendar,
        full_week_policy: FullWeekPolicy,
        enforce_semester_end: bool,
    ) -> Self {
        Self {
            schedule,
            calendar,
            full_week_policy,
            enforce_semester_end,
        }
    }

    /// Checks run in order and stop at the first failure: duplicate id,
    /// parse result, class cross-check, then week/slot placement.
    pub fn evaluate(
        &self,
        candidate: &CandidateVideo,
        parsed: &ParsedTitle,
        snapshot: &RecordSnapshot,
        duplicates: &DuplicateIndex,
    ) -> Decision {
        if duplicates.contains(&candidate.external_id) {
            return Decision::Reject(RejectReason::Duplicate);
        }

        let (Some(class_code), Some(date)) = (parsed.class_code, parsed.date) else {
            return Decision::Reject(RejectReason::Unparseable);
        };

        if !title_mentions_class(&candidate.title, class_code) {
            return Decision::Reject(RejectReason::ClassMismatch);
        }

        let week = self.calendar.week_of(date);
        if week < 1 || (self.enforce_semester_end && week > self.calendar.last_week()) {
            return Decision::Reject(RejectReason::WeekOutOfRange { week });
        }
        let week = match u32::try_from(week) {
            Ok(week) => week,
            Err(_) => return Decision::Reject(RejectReason::WeekOutOfRange { week }),
        };

        let Some(lecture) = lecture_slot(
            date,
            class_code,
            week,
            self.schedule.rule_for(class_code),
            snapshot,
            self.full_week_policy,
        ) else {
            return Decision::Reject(RejectReason::NoSlotAvailable);
        };

        let coordinate = SlotCoordinate::new(class_code, week, lecture);
        match snapshot.get(&coordinate) {
            None => Decision::Reject(RejectReason::UnknownSlot),
            Some(SlotValue::Resolved(existing)) => Decision::Reject(RejectReason::SlotOccupied {
                existing: existing.clone(),
            }),
            Some(SlotValue::Placeholder(_)) => Decision::Accept {
                coordinate,
                lecture_date: date,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::{default_class_schedules, parse_title, ClassCode};
    use chrono::{NaiveDate, TimeZone, Utc};

    fn resolver(policy: FullWeekPolicy, enforce_end: bool) -> Resolver {
        Resolver::new(
            ScheduleTable::new(&default_class_schedules()),
            SemesterCalendar::new(
                NaiveDate::from_ymd_opt(2025, 8, 24).unwrap(),
                NaiveDate::from_ymd_opt(2025, 12, 15).unwrap(),
            ),
            policy,
            enforce_end,
        )
    }

    fn accept(code: ClassCode, week: u32, lecture: u32, (y, m, d): (i32, u32, u32)) -> Decision {
        Decision::Accept {
            coordinate: SlotCoordinate::new(code, week, lecture),
            lecture_date: NaiveDate::from_ymd_opt(y, m, d).unwrap(),
        }
    }

    fn candidate(id: &str, title: &str) -> CandidateVideo {
        CandidateVideo {
            external_id: id.to_string(),
            title: title.to_string(),
            published_at: Utc.with_ymd_and_hms(2025, 8, 25, 20, 0, 0).unwrap(),
        }
    }

    /// Weeks 1..=20 with two placeholder slots for every class
    fn empty_snapshot() -> RecordSnapshot {
        ClassCode::ALL
            .into_iter()
            .flat_map(|code| {
                (1..=20).flat_map(move |week| {
                    (1..=2).map(move |lecture| {
                        (
                            SlotCoordinate::new(code, week, lecture),
                            SlotValue::Placeholder("/not-found.html".to_string()),
                        )
                    })
                })
            })
            .collect()
    }

    fn evaluate(resolver: &Resolver, video: &CandidateVideo, snapshot: &RecordSnapshot) -> Decision {
        let duplicates = DuplicateIndex::from_snapshot(snapshot);
        resolver.evaluate(video, &parse_title(&video.title), snapshot, &duplicates)
    }

    #[test]
    fn test_accepts_weekday_slots() {
        let r = resolver(FullWeekPolicy::default(), false);
        let snapshot = empty_snapshot();

        let monday = candidate("m", "AVC185 8/25/2025");
        assert_eq!(
            evaluate(&r, &monday, &snapshot),
            accept(ClassCode::Avc185, 1, 1, (2025, 8, 25))
        );

        let wednesday = candidate("w", "AVC185 8/27/2025");
        assert_eq!(
            evaluate(&r, &wednesday, &snapshot),
            accept(ClassCode::Avc185, 1, 2, (2025, 8, 27))
        );
    }

    #[test]
    fn test_duplicate_is_checked_before_parsing() {
        let r = resolver(FullWeekPolicy::default(), false);
        let snapshot = empty_snapshot().set(
            SlotCoordinate::new(ClassCode::Avc240, 7, 2),
            SlotValue::Resolved("https://www.youtube.com/watch?v=dup1".to_string()),
        );

        let video = candidate("dup1", "untitled stream");
        assert_eq!(
            evaluate(&r, &video, &snapshot),
            Decision::Reject(RejectReason::Duplicate)
        );
    }

    #[test]
    fn test_seen_this_run_counts_as_duplicate() {
        let r = resolver(FullWeekPolicy::default(), false);
        let snapshot = empty_snapshot();
        let mut duplicates = DuplicateIndex::from_snapshot(&snapshot);
        duplicates.record("again");

        let video = candidate("again", "AVC200 8/25/2025");
        let decision = r.evaluate(&video, &parse_title(&video.title), &snapshot, &duplicates);
        assert_eq!(decision, Decision::Reject(RejectReason::Duplicate));
    }

    #[test]
    fn test_unparseable_titles() {
        let r = resolver(FullWeekPolicy::default(), false);
        let snapshot = empty_snapshot();
        for title in ["AVC185 lecture", "Guest talk 8/25/2025", ""] {
            assert_eq!(
                evaluate(&r, &candidate("x", title), &snapshot),
                Decision::Reject(RejectReason::Unparseable),
                "title {:?}",
                title
            );
        }
    }

    #[test]
    fn test_class_mismatch_when_parse_disagrees_with_title() {
        let r = resolver(FullWeekPolicy::default(), false);
        let snapshot = empty_snapshot();
        let video = candidate("mix", "AVC200 8/25/2025");
        let parsed = ParsedTitle {
            class_code: Some(ClassCode::Avc240),
            date: NaiveDate::from_ymd_opt(2025, 8, 25),
        };
        let decision = r.evaluate(&video, &parsed, &snapshot, &DuplicateIndex::default());
        assert_eq!(decision, Decision::Reject(RejectReason::ClassMismatch));
    }

    #[test]
    fn test_occupied_slot() {
        let r = resolver(FullWeekPolicy::default(), false);
        let snapshot = empty_snapshot().set(
            SlotCoordinate::new(ClassCode::Avc185, 1, 1),
            SlotValue::Resolved("https://www.youtube.com/watch?v=taken".to_string()),
        );
        let decision = evaluate(&r, &candidate("new", "AVC185 8/25/2025"), &snapshot);
        assert_eq!(decision.clone(), Decision::Reject(RejectReason::SlotOccupied {
            existing: "https://www.youtube.com/watch?v=taken".to_string(),
        }));
        if let Decision::Reject(reason) = decision {
            assert_eq!(reason.code(), "slot-occupied");
        }
    }

    #[test]
    fn test_week_bounds() {
        let lenient = resolver(FullWeekPolicy::default(), false);
        let strict = resolver(FullWeekPolicy::default(), true);
        let snapshot = empty_snapshot();

        let before = candidate("b", "AVC185 8/18/2025");
        assert_eq!(
            evaluate(&lenient, &before, &snapshot),
            Decision::Reject(RejectReason::WeekOutOfRange { week: 0 })
        );

        // 2025-12-29 is week 19, past the week-17 semester end
        let after = candidate("a", "AVC185 12/29/2025");
        assert_eq!(
            evaluate(&lenient, &after, &snapshot),
            accept(ClassCode::Avc185, 19, 1, (2025, 12, 29))
        );
        assert_eq!(
            evaluate(&strict, &after, &snapshot),
            Decision::Reject(RejectReason::WeekOutOfRange { week: 19 })
        );
    }

    #[test]
    fn test_unknown_slot() {
        let r = resolver(FullWeekPolicy::default(), false);
        let video = candidate("late", "AVC185 3/2/2026");
        assert_eq!(
            evaluate(&r, &video, &empty_snapshot()),
            Decision::Reject(RejectReason::UnknownSlot)
        );
    }

    #[test]
    fn test_full_sequential_week_policies() {
        let full = empty_snapshot()
            .set(
                SlotCoordinate::new(ClassCode::Avc285, 2, 1),
                SlotValue::Resolved("https://www.youtube.com/watch?v=s1".to_string()),
            )
            .set(
                SlotCoordinate::new(ClassCode::Avc285, 2, 2),
                SlotValue::Resolved("https://www.youtube.com/watch?v=s2".to_string()),
            );
        let video = candidate("s3", "AVC 285 9/4/2025");

        let fallback = evaluate(&resolver(FullWeekPolicy::FallbackToFirst, false), &video, &full);
        assert!(matches!(
            fallback,
            Decision::Reject(RejectReason::SlotOccupied { .. })
        ));

        let reject = evaluate(&resolver(FullWeekPolicy::Reject, false), &video, &full);
        assert_eq!(reject, Decision::Reject(RejectReason::NoSlotAvailable));
    }
}
