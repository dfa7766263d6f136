/// Assignment engine: places candidate recordings into lecture slots
///
/// The engine is pure. Given the same candidates, snapshot and rules it
/// always produces the same outcome; fetching and persisting happen in
/// [`crate::monitor`].

pub mod resolver;

pub use resolver::{Decision, DuplicateIndex, RejectReason, Resolver};

use crate::catalog::{watch_url, CandidateVideo};
use crate::config::Config;
use crate::schedule::{parse_title, ScheduleTable};
use crate::store::{RecordSnapshot, SlotCoordinate, SlotValue};
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use tracing::{debug, info};

/// One recording bound to one slot
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Assignment {
    pub external_id: String,
    pub title: String,
    pub coordinate: SlotCoordinate,
    pub video_url: String,
    pub lecture_date: NaiveDate,
    pub published_at: DateTime<Utc>,
}

/// A skipped candidate and the reason it was skipped
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Rejection {
    pub external_id: String,
    pub title: String,
    pub reason: RejectReason,
}

/// Result of one engine pass
#[derive(Debug, Clone)]
pub struct RunOutcome {
    /// Working snapshot after every accepted assignment
    pub snapshot: RecordSnapshot,
    /// Accepted assignments, in candidate order
    pub assignments: Vec<Assignment>,
    pub rejections: Vec<Rejection>,
}

impl RunOutcome {
    /// Persisting is only needed when something was assigned
    pub fn has_changes(&self) -> bool {
        !self.assignments.is_empty()
    }
}

/// Runs candidates through the resolver in the order given
#[derive(Debug, Clone)]
pub struct AssignmentEngine {
    resolver: Resolver,
}

impl AssignmentEngine {
    pub fn new(resolver: Resolver) -> Self {
        Self { resolver }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(Resolver::new(
            ScheduleTable::new(&config.schedule.classes),
            config.calendar(),
            config.schedule.full_week_policy,
            config.semester.enforce_end,
        ))
    }

    /// Evaluate every candidate against the cumulative state of the run.
    ///
    /// `snapshot` is never modified; the outcome carries the updated copy.
    pub fn run(&self, candidates: &[CandidateVideo], snapshot: &RecordSnapshot) -> RunOutcome {
        let mut working = snapshot.clone();
        let mut duplicates = DuplicateIndex::from_snapshot(&working);
        let mut assignments = Vec::new();
        let mut rejections = Vec::new();

        info!(
            "Processing {} candidates against {} slots ({} recordings already placed)",
            candidates.len(),
            working.len(),
            duplicates.existing_count()
        );

        for candidate in candidates {
            debug!("Processing: {} ({})", candidate.title, candidate.external_id);
            let parsed = parse_title(&candidate.title);

            match self.resolver.evaluate(candidate, &parsed, &working, &duplicates) {
                Decision::Accept {
                    coordinate,
                    lecture_date,
                } => {
                    let video_url = watch_url(&candidate.external_id);
                    working = working.set(coordinate, SlotValue::Resolved(video_url.clone()));
                    duplicates.record(&candidate.external_id);

                    info!("✅ {} → {}", candidate.title, coordinate);
                    assignments.push(Assignment {
                        external_id: candidate.external_id.clone(),
                        title: candidate.title.clone(),
                        coordinate,
                        video_url,
                        lecture_date,
                        published_at: candidate.published_at,
                    });
                }
                Decision::Reject(reason) => {
                    info!(
                        "🚫 Skipping {} \"{}\": {}",
                        candidate.external_id, candidate.title, reason
                    );
                    rejections.push(Rejection {
                        external_id: candidate.external_id.clone(),
                        title: candidate.title.clone(),
                        reason,
                    });
                }
            }
        }

        info!(
            "Engine finished: {} assigned, {} skipped",
            assignments.len(),
            rejections.len()
        );

        RunOutcome {
            snapshot: working,
            assignments,
            rejections,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::ClassCode;
    use chrono::TimeZone;

    fn candidate(id: &str, title: &str) -> CandidateVideo {
        CandidateVideo {
            external_id: id.to_string(),
            title: title.to_string(),
            published_at: Utc.with_ymd_and_hms(2025, 9, 1, 12, 0, 0).unwrap(),
        }
    }

    fn snapshot() -> RecordSnapshot {
        ClassCode::ALL
            .into_iter()
            .flat_map(|code| {
                (1..=3).flat_map(move |week| {
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

    #[test]
    fn test_same_id_twice_in_one_run_is_assigned_once() {
        let engine = AssignmentEngine::from_config(&Config::default());
        let candidates = vec![
            candidate("v1", "AVC185 8/25/2025"),
            candidate("v1", "AVC185 8/27/2025"),
        ];
        let outcome = engine.run(&candidates, &snapshot());

        assert_eq!(outcome.assignments.len(), 1);
        assert_eq!(outcome.rejections[0].reason, RejectReason::Duplicate);
    }

    #[test]
    fn test_input_snapshot_is_untouched() {
        let engine = AssignmentEngine::from_config(&Config::default());
        let before = snapshot();
        let outcome = engine.run(&[candidate("v1", "AVC200 8/25/2025")], &before);

        assert!(outcome.has_changes());
        assert_eq!(before, snapshot());
        assert_ne!(outcome.snapshot, before);
        assert_eq!(
            outcome.assignments[0].video_url,
            "https://www.youtube.com/watch?v=v1"
        );
    }

    #[test]
    fn test_no_candidates_means_no_changes() {
        let engine = AssignmentEngine::from_config(&Config::default());
        let outcome = engine.run(&[], &snapshot());
        assert!(!outcome.has_changes());
        assert_eq!(outcome.snapshot, snapshot());
    }

    #[test]
    fn test_assignment_carries_title_date() {
        let engine = AssignmentEngine::from_config(&Config::default());
        let outcome = engine.run(&[candidate("v1", "AVC240 Lecture 8/27/2025")], &snapshot());

        let assignment = &outcome.assignments[0];
        assert_eq!(assignment.lecture_date, NaiveDate::from_ymd_opt(2025, 8, 27).unwrap());
        assert_eq!(assignment.coordinate, SlotCoordinate::new(ClassCode::Avc240, 1, 2));
    }
}
