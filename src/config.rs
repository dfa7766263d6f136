use anyhow::{anyhow, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::schedule::{default_class_schedules, ClassSchedule, FullWeekPolicy, SemesterCalendar};

/// Upper bound on attempts per YouTube request
pub const MAX_RETRIES_LIMIT: u32 = 10;

/// Upper bound on the recency window (one year)
pub const MAX_RECENCY_HOURS: i64 = 24 * 366;

/// Configuration for the lecture assigner
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Semester boundaries
    pub semester: SemesterConfig,

    /// Per-class scheduling rules
    pub schedule: ScheduleConfig,

    /// YouTube catalog settings
    pub youtube: YouTubeConfig,

    /// Lecture index location and format
    pub store: StoreConfig,

    /// Report delivery settings
    pub notifications: NotificationConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SemesterConfig {
    /// First day of week 1
    pub start: NaiveDate,

    /// Last day of the semester
    pub end: NaiveDate,

    /// Reject lectures dated after the week containing `end`
    pub enforce_end: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
    /// Behavior when a sequential-fill week has no open slot
    pub full_week_policy: FullWeekPolicy,

    /// Rule for each class
    pub classes: Vec<ClassSchedule>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct YouTubeConfig {
    /// API key for the YouTube Data API
    pub api_key: String,

    /// Channel whose uploads are monitored
    pub channel_id: String,

    /// Base URL of the Data API
    pub api_base: String,

    /// Only videos published within this many hours are considered
    pub recency_hours: i64,

    /// Page size for the search endpoint
    pub search_max_results: u32,

    /// Page size for the uploads playlist
    pub playlist_max_results: u32,

    /// Attempts per request before giving up
    pub max_retries: u32,

    /// Backoff unit; attempt N waits `backoff_base_ms * 2^N`
    pub backoff_base_ms: u64,

    /// Per-request timeout in seconds
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Path of the lecture index
    pub index_path: PathBuf,

    /// Substring identifying an unassigned slot
    pub placeholder_marker: String,

    /// Suffix appended to the index path for the pre-write backup
    pub backup_suffix: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationConfig {
    /// Report recipients
    pub recipients: Vec<String>,

    /// Weekdays (1 = Monday .. 7 = Sunday) on which assignment reports go out
    pub report_weekdays: Vec<u32>,

    /// Admin page linked from reports
    pub admin_url: String,

    /// Where to look when a run fails
    pub actions_url: String,
}

impl Default for SemesterConfig {
    fn default() -> Self {
        Self {
            start: NaiveDate::from_ymd_opt(2025, 8, 24).unwrap_or_default(),
            end: NaiveDate::from_ymd_opt(2025, 12, 15).unwrap_or_default(),
            enforce_end: false,
        }
    }
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            full_week_policy: FullWeekPolicy::FallbackToFirst,
            classes: default_class_schedules(),
        }
    }
}

impl Default for YouTubeConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            channel_id: String::new(),
            api_base: "https://www.googleapis.com/youtube/v3".to_string(),
            recency_hours: 48, // twice-daily runs
            search_max_results: 50,
            playlist_max_results: 20,
            max_retries: 3,
            backoff_base_ms: 1000,
            timeout_seconds: 30,
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            index_path: PathBuf::from("index.html"),
            placeholder_marker: "not-found.html".to_string(),
            backup_suffix: ".backup".to_string(),
        }
    }
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            recipients: Vec::new(),
            report_weekdays: vec![1, 3, 5],
            admin_url: "https://caseyfarina.github.io/lecture-redirects/admin.html".to_string(),
            actions_url: "https://github.com/caseyfarina/lecture-redirects/actions".to_string(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            semester: SemesterConfig::default(),
            schedule: ScheduleConfig::default(),
            youtube: YouTubeConfig::default(),
            store: StoreConfig::default(),
            notifications: NotificationConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from the first file found, then apply environment overrides
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        let mut config = match explicit_path {
            Some(path) => Self::from_file(path)?,
            None => Self::from_default_locations()?,
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    fn from_file(path: &Path) -> Result<Self> {
        let config_str = std::fs::read_to_string(path)
            .map_err(|e| anyhow!("Failed to read config file {}: {}", path.display(), e))?;
        let config = toml::from_str(&config_str)
            .map_err(|e| anyhow!("Failed to parse config file {}: {}", path.display(), e))?;
        tracing::info!("📄 Loaded configuration from: {}", path.display());
        Ok(config)
    }

    fn from_default_locations() -> Result<Self> {
        let config_paths = ["lecture-assigner.toml", "config/lecture-assigner.toml"];

        for path in config_paths.iter().map(Path::new) {
            if path.exists() {
                return Self::from_file(path);
            }
        }

        tracing::debug!("No configuration file found, using defaults");
        Ok(Self::default())
    }

    /// Override settings from environment-style variables
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let present = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        if let Some(start) = present("SEMESTER_START") {
            self.semester.start = parse_date("SEMESTER_START", &start)?;
        }
        if let Some(end) = present("SEMESTER_END") {
            self.semester.end = parse_date("SEMESTER_END", &end)?;
        }
        if let Some(api_key) = present("YOUTUBE_API_KEY") {
            self.youtube.api_key = api_key;
        }
        if let Some(channel_id) = present("YOUTUBE_CHANNEL_ID") {
            self.youtube.channel_id = channel_id;
        }
        if let Some(recipients) = present("RECIPIENT_EMAILS") {
            self.notifications.recipients = split_recipients(&recipients);
        }
        if let Some(index_path) = present("LECTURE_INDEX_PATH") {
            self.store.index_path = PathBuf::from(index_path);
        }

        Ok(())
    }

    /// Defaults plus any report recipients from the environment. Used to
    /// report a configuration that could not be loaded.
    pub fn fallback<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(recipients) = lookup("RECIPIENT_EMAILS") {
            config.notifications.recipients = split_recipients(&recipients);
        }
        config
    }

    /// Validate settings needed by every run
    pub fn validate(&self) -> Result<()> {
        if self.semester.start >= self.semester.end {
            return Err(anyhow!("Semester start date must be before end date"));
        }

        if self.schedule.classes.is_empty() {
            return Err(anyhow!("At least one class schedule is required"));
        }
        for class in &self.schedule.classes {
            class
                .rule
                .validate()
                .map_err(|e| anyhow!("Invalid schedule for {}: {}", class.code, e))?;
        }
        for (i, class) in self.schedule.classes.iter().enumerate() {
            if self.schedule.classes[..i].iter().any(|c| c.code == class.code) {
                return Err(anyhow!("Class {} is configured twice", class.code));
            }
        }

        if self.store.placeholder_marker.trim().is_empty() {
            return Err(anyhow!("placeholder_marker must not be empty"));
        }

        if let Some(day) = self
            .notifications
            .report_weekdays
            .iter()
            .find(|day| !(1..=7).contains(*day))
        {
            return Err(anyhow!("report weekday {} is outside 1..=7", day));
        }

        tracing::info!("✅ Configuration validated successfully");
        Ok(())
    }

    /// Validate settings needed to query YouTube
    pub fn validate_remote(&self) -> Result<()> {
        let missing: Vec<&str> = [
            ("YouTube API Key", &self.youtube.api_key),
            ("YouTube Channel ID", &self.youtube.channel_id),
        ]
        .iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| *name)
        .collect();

        if !missing.is_empty() {
            return Err(anyhow!("Missing required configuration: {}", missing.join(", ")));
        }
        if !(1..=MAX_RETRIES_LIMIT).contains(&self.youtube.max_retries) {
            return Err(anyhow!(
                "max_retries must be between 1 and {}",
                MAX_RETRIES_LIMIT
            ));
        }
        if !(1..=MAX_RECENCY_HOURS).contains(&self.youtube.recency_hours) {
            return Err(anyhow!(
                "recency_hours must be between 1 and {}",
                MAX_RECENCY_HOURS
            ));
        }
        Ok(())
    }

    pub fn calendar(&self) -> SemesterCalendar {
        SemesterCalendar::new(self.semester.start, self.semester.end)
    }

    /// Get runtime configuration summary
    pub fn summary(&self) -> String {
        format!(
            "Lecture Assigner Configuration:\n\
            - Semester: {} to {}\n\
            - Classes: {}\n\
            - Index: {}\n\
            - Recency window: {}h\n\
            - Full week policy: {:?}",
            self.semester.start,
            self.semester.end,
            self.schedule
                .classes
                .iter()
                .map(|c| c.code.as_str())
                .collect::<Vec<_>>()
                .join(", "),
            self.store.index_path.display(),
            self.youtube.recency_hours,
            self.schedule.full_week_policy,
        )
    }
}

fn split_recipients(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_date(key: &str, value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|_| anyhow!("Invalid {} '{}' - must be in YYYY-MM-DD format", key, value))
}

/// Configuration builder for programmatic config creation
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    pub fn with_semester(mut self, start: NaiveDate, end: NaiveDate) -> Self {
        self.config.semester.start = start;
        self.config.semester.end = end;
        self
    }

    pub fn enforce_semester_end(mut self, enforce: bool) -> Self {
        self.config.semester.enforce_end = enforce;
        self
    }

    pub fn with_full_week_policy(mut self, policy: FullWeekPolicy) -> Self {
        self.config.schedule.full_week_policy = policy;
        self
    }

    pub fn with_classes(mut self, classes: Vec<ClassSchedule>) -> Self {
        self.config.schedule.classes = classes;
        self
    }

    pub fn with_index_path(mut self, path: PathBuf) -> Self {
        self.config.store.index_path = path;
        self
    }

    pub fn with_credentials(mut self, api_key: String, channel_id: String) -> Self {
        self.config.youtube.api_key = api_key;
        self.config.youtube.channel_id = channel_id;
        self
    }

    pub fn with_report_weekdays(mut self, weekdays: Vec<u32>) -> Self {
        self.config.notifications.report_weekdays = weekdays;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::{ClassCode, ScheduleRule};
    use std::collections::HashMap;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.semester.start.to_string(), "2025-08-24");
        assert_eq!(config.store.placeholder_marker, "not-found.html");
        assert_eq!(config.youtube.recency_hours, 48);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_remote_validation_requires_credentials() {
        let config = Config::default();
        let err = config.validate_remote().unwrap_err().to_string();
        assert!(err.contains("YouTube API Key"));
        assert!(err.contains("YouTube Channel ID"));

        let config = ConfigBuilder::new()
            .with_credentials("key".to_string(), "UC1".to_string())
            .build();
        assert!(config.validate_remote().is_ok());
    }

    #[test]
    fn test_remote_validation_bounds_retry_and_window() {
        let mut config = ConfigBuilder::new()
            .with_credentials("key".to_string(), "UC1".to_string())
            .build();

        config.youtube.max_retries = 64;
        assert!(config.validate_remote().unwrap_err().to_string().contains("max_retries"));
        config.youtube.max_retries = 0;
        assert!(config.validate_remote().is_err());
        config.youtube.max_retries = MAX_RETRIES_LIMIT;
        assert!(config.validate_remote().is_ok());

        config.youtube.recency_hours = i64::MAX;
        assert!(config.validate_remote().unwrap_err().to_string().contains("recency_hours"));
        config.youtube.recency_hours = -1;
        assert!(config.validate_remote().is_err());
    }

    #[test]
    fn test_fallback_keeps_env_recipients() {
        let config = Config::fallback(|key| {
            (key == "RECIPIENT_EMAILS").then(|| "prof@example.com, ta@example.com".to_string())
        });
        assert_eq!(
            config.notifications.recipients,
            ["prof@example.com", "ta@example.com"]
        );
        assert_eq!(config.store.index_path, PathBuf::from("index.html"));

        assert!(Config::fallback(|_| None).notifications.recipients.is_empty());
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("SEMESTER_START", "2026-01-12"),
            ("SEMESTER_END", "2026-05-08"),
            ("YOUTUBE_API_KEY", "abc"),
            ("RECIPIENT_EMAILS", "a@example.com, b@example.com,"),
            ("YOUTUBE_CHANNEL_ID", "  "),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config
            .apply_env(|key| env.get(key).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.semester.start.to_string(), "2026-01-12");
        assert_eq!(config.youtube.api_key, "abc");
        assert_eq!(config.youtube.channel_id, "");
        assert_eq!(config.notifications.recipients, ["a@example.com", "b@example.com"]);
    }

    #[test]
    fn test_env_rejects_bad_date() {
        let mut config = Config::default();
        let result = config.apply_env(|key| {
            (key == "SEMESTER_START").then(|| "08/24/2025".to_string())
        });
        assert!(result.is_err());
    }

    #[test]
    fn test_validation_rejects_inverted_semester_and_bad_rules() {
        let start = NaiveDate::from_ymd_opt(2025, 12, 15).unwrap();
        let end = NaiveDate::from_ymd_opt(2025, 8, 24).unwrap();
        assert!(ConfigBuilder::new().with_semester(start, end).build().validate().is_err());

        let bad_rule = ConfigBuilder::new()
            .with_classes(vec![ClassSchedule {
                code: ClassCode::Avc185,
                rule: ScheduleRule::Weekdays(vec![8]),
            }])
            .build();
        assert!(bad_rule.validate().is_err());

        let twice = ConfigBuilder::new()
            .with_classes(vec![
                ClassSchedule {
                    code: ClassCode::Avc185,
                    rule: ScheduleRule::Weekdays(vec![1]),
                },
                ClassSchedule {
                    code: ClassCode::Avc185,
                    rule: ScheduleRule::Weekdays(vec![3]),
                },
            ])
            .build();
        assert!(twice.validate().is_err());
    }

    #[test]
    fn test_toml_round_trip_of_schedule() {
        let toml_str = r#"
            [semester]
            start = "2025-08-24"
            end = "2025-12-15"
            enforce_end = true

            [schedule]
            full_week_policy = "reject"

            [[schedule.classes]]
            code = "avc185"
            rule = { weekdays = [1, 3] }

            [[schedule.classes]]
            code = "avc285"
            rule = { sequential = { max_slots = 2 } }
        "#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert!(config.semester.enforce_end);
        assert_eq!(config.schedule.full_week_policy, FullWeekPolicy::Reject);
        assert_eq!(config.schedule.classes.len(), 2);
        assert_eq!(
            config.schedule.classes[1].rule,
            ScheduleRule::Sequential { max_slots: 2 }
        );
        assert_eq!(config.youtube.max_retries, 3);
    }
}
