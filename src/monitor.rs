//! End-to-end run: fetch candidates, assign them, persist once, report
//!
//! The engine itself never touches I/O. This module wraps it with the
//! catalog, the index file and the notifier, and is the only place a run
//! can fail.

use crate::catalog::VideoCatalog;
use crate::config::Config;
use crate::engine::{Assignment, AssignmentEngine, Rejection, RunOutcome};
use crate::error::{MonitorError, Result};
use crate::notify::{assignment_report, failure_report, should_send_assignment_report, Notifier};
use crate::store::IndexStore;
use chrono::{Local, Utc};
use serde::Serialize;
use std::path::Path;
use tracing::{error, info, warn};

/// Lifecycle of a single run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RunPhase {
    Idle,
    Processing,
    Committing,
    Done,
    Failed,
}

/// What a finished run did
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub candidates: usize,
    pub assignments: Vec<Assignment>,
    pub rejections: Vec<Rejection>,
    /// Whether the index was rewritten
    pub persisted: bool,
}

/// Orchestrates one assignment run
pub struct Monitor {
    config: Config,
    catalog: Box<dyn VideoCatalog>,
    notifier: Box<dyn Notifier>,
    store: IndexStore,
    engine: AssignmentEngine,
    dry_run: bool,
    phase: RunPhase,
}

impl Monitor {
    pub fn new(config: Config, catalog: Box<dyn VideoCatalog>, notifier: Box<dyn Notifier>) -> Self {
        let store = IndexStore::new(
            config.store.index_path.clone(),
            config.store.backup_suffix.clone(),
        );
        let engine = AssignmentEngine::from_config(&config);

        Self {
            config,
            catalog,
            notifier,
            store,
            engine,
            dry_run: false,
            phase: RunPhase::Idle,
        }
    }

    /// Compute assignments without writing the index or sending reports
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn phase(&self) -> RunPhase {
        self.phase
    }

    /// Run once. Any error leaves the index untouched, moves the run to
    /// [`RunPhase::Failed`] and triggers a failure report before returning.
    pub async fn run(&mut self) -> Result<RunSummary> {
        match self.run_inner().await {
            Ok(summary) => {
                self.phase = RunPhase::Done;
                info!("✅ Lecture assignment run completed successfully");
                Ok(summary)
            }
            Err(e) => {
                self.phase = RunPhase::Failed;
                error!("❌ Lecture assignment run failed: {}", e);
                if !self.dry_run {
                    notify_failure(self.notifier.as_ref(), &self.config, &e.to_string()).await;
                }
                Err(e)
            }
        }
    }

    async fn run_inner(&mut self) -> Result<RunSummary> {
        self.phase = RunPhase::Processing;
        info!("🤖 Starting lecture assignment run ({} catalog)", self.catalog.name());
        info!(
            "Semester: {} to {}",
            self.config.semester.start, self.config.semester.end
        );

        self.config
            .validate()
            .map_err(|e| MonitorError::Config(e.to_string()))?;

        let candidates = self.catalog.fetch_recent().await?;
        info!("Found {} recent streams", candidates.len());
        if candidates.is_empty() {
            info!("No recent streams found");
            return Ok(RunSummary {
                candidates: 0,
                assignments: Vec::new(),
                rejections: Vec::new(),
                persisted: false,
            });
        }

        let document = self.store.load(&self.config.store.placeholder_marker).await?;
        let outcome = self.engine.run(&candidates, &document.snapshot());
        let has_changes = outcome.has_changes();
        let RunOutcome {
            snapshot: updated,
            assignments,
            rejections,
        } = outcome;

        let mut summary = RunSummary {
            candidates: candidates.len(),
            assignments,
            rejections,
            persisted: false,
        };

        if !has_changes {
            info!("No new assignments made");
            return Ok(summary);
        }

        if self.dry_run {
            info!(
                "Dry run: {} assignments computed, index left unchanged",
                summary.assignments.len()
            );
            return Ok(summary);
        }

        self.phase = RunPhase::Committing;
        let rendered = document.render(&updated)?;
        self.store.write(&rendered).await?;
        summary.persisted = true;
        info!("✅ Updated {} lecture assignments", summary.assignments.len());

        let today = Local::now().date_naive();
        if should_send_assignment_report(&self.config.notifications, today) {
            let report = assignment_report(&self.config.notifications, &summary.assignments, today);
            if let Err(e) = self.notifier.send(&report).await {
                warn!("Failed to send assignment report: {}", e);
            }
        } else {
            info!("Skipping assignment report: {} is not a report day", today.format("%A"));
        }

        Ok(summary)
    }
}

/// Load configuration; a load failure is reported like any other failed run
pub async fn load_config(
    explicit_path: Option<&Path>,
    notifier: &dyn Notifier,
) -> anyhow::Result<Config> {
    match Config::load(explicit_path) {
        Ok(config) => Ok(config),
        Err(e) => {
            let fallback = Config::fallback(|key| std::env::var(key).ok());
            notify_failure(notifier, &fallback, &e.to_string()).await;
            Err(e)
        }
    }
}

/// Send a failure report; delivery problems are logged, never returned
pub async fn notify_failure(notifier: &dyn Notifier, config: &Config, error: &str) {
    let report = failure_report(&config.notifications, error, Utc::now());
    if let Err(e) = notifier.send(&report).await {
        error!("Failed to send failure notification: {}", e);
    }
}
