//! Human-readable run reports
//!
//! Reports are rendered here and handed to a [`Notifier`]. The bundled
//! [`LogNotifier`] writes them to the log; a mail transport can be plugged
//! in behind the same trait.

use crate::config::NotificationConfig;
use crate::engine::Assignment;
use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Datelike, NaiveDate, Utc};
use tracing::info;

/// A rendered message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub recipients: Vec<String>,
    pub subject: String,
    pub body: String,
}

/// Trait for report delivery
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, report: &Report) -> Result<()>;
}

/// Delivers reports to the log
#[derive(Debug, Default, Clone)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, report: &Report) -> Result<()> {
        info!(
            "📧 Notification for [{}]: {}\n{}",
            report.recipients.join(", "),
            report.subject,
            report.body
        );
        Ok(())
    }
}

/// Assignment reports only go out on configured weekdays
pub fn should_send_assignment_report(config: &NotificationConfig, today: NaiveDate) -> bool {
    config
        .report_weekdays
        .contains(&today.weekday().number_from_monday())
}

pub fn assignment_report(
    config: &NotificationConfig,
    assignments: &[Assignment],
    today: NaiveDate,
) -> Report {
    let lines: Vec<String> = assignments
        .iter()
        .map(|a| {
            format!(
                "✅ {} → Week {}, Lecture {}",
                a.title, a.coordinate.week, a.coordinate.lecture
            )
        })
        .collect();

    Report {
        recipients: config.recipients.clone(),
        subject: format!("YouTube Auto-Assignment Report - {}", today.format("%m/%d/%Y")),
        body: format!(
            "Today's Stream Assignments:\n{}\n\nAll assignments completed successfully.\nView updated lecture library: {}\n",
            lines.join("\n"),
            config.admin_url
        ),
    }
}

pub fn failure_report(config: &NotificationConfig, error: &str, at: DateTime<Utc>) -> Report {
    Report {
        recipients: config.recipients.clone(),
        subject: format!(
            "🚨 Lecture Assignment Action Failed - {}",
            at.date_naive().format("%m/%d/%Y")
        ),
        body: format!(
            "The YouTube lecture assignment automation failed:\n\nError: {}\n\nPlease check the run logs for details:\n{}\n\nAction Time: {}\n",
            error,
            config.actions_url,
            at.to_rfc3339()
        ),
    }
}
