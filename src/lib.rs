/// Lecture Assigner
///
/// Places newly published lecture recordings into a semester schedule,
/// addressed by class, week and lecture slot, and writes the result back
/// into the lecture index with a minimal edit.

pub mod catalog;
pub mod config;
pub mod engine;
pub mod error;
pub mod monitor;
pub mod notify;
pub mod schedule;
pub mod store;

// Re-export main types for easy access
pub use crate::catalog::{CandidateVideo, FileCatalog, VideoCatalog, YouTubeCatalog};
pub use crate::config::{Config, ConfigBuilder};
pub use crate::engine::{Assignment, AssignmentEngine, Decision, RejectReason, RunOutcome};
pub use crate::error::{MonitorError, Result};
pub use crate::monitor::{Monitor, RunPhase, RunSummary};
pub use crate::notify::{LogNotifier, Notifier, Report};
pub use crate::schedule::{parse_title, week_number, ClassCode, ScheduleRule, SemesterCalendar};
pub use crate::store::{IndexDocument, IndexStore, RecordSnapshot, SlotCoordinate, SlotValue};
