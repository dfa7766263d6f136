/// Class codes, per-class scheduling rules and the semester calendar
///
/// This module owns everything needed to turn a lecture title into a
/// (class, week, lecture) coordinate: title parsing lives in [`title`],
/// week and slot arithmetic in [`calendar`].

pub mod calendar;
pub mod title;

pub use calendar::{lecture_slot, week_number, FullWeekPolicy, SemesterCalendar};
pub use title::{parse_title, title_mentions_class, ParsedTitle};

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Canonical identifier for one course offering
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClassCode {
    Avc185,
    Avc200,
    Avc240,
    Avc285,
}

impl ClassCode {
    /// All known classes, in title-matching priority order
    pub const ALL: [ClassCode; 4] = [
        ClassCode::Avc185,
        ClassCode::Avc200,
        ClassCode::Avc240,
        ClassCode::Avc285,
    ];

    /// Lowercase storage key, e.g. `avc185`
    pub fn as_str(&self) -> &'static str {
        match self {
            ClassCode::Avc185 => "avc185",
            ClassCode::Avc200 => "avc200",
            ClassCode::Avc240 => "avc240",
            ClassCode::Avc285 => "avc285",
        }
    }

    /// Title spellings that refer to this class, compact form first.
    /// Both are uppercase; callers compare against an uppercased title.
    pub fn title_tokens(&self) -> [&'static str; 2] {
        match self {
            ClassCode::Avc185 => ["AVC185", "AVC 185"],
            ClassCode::Avc200 => ["AVC200", "AVC 200"],
            ClassCode::Avc240 => ["AVC240", "AVC 240"],
            ClassCode::Avc285 => ["AVC285", "AVC 285"],
        }
    }
}

impl fmt::Display for ClassCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ClassCode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_uppercase();
        ClassCode::ALL
            .into_iter()
            .find(|code| {
                code.as_str().eq_ignore_ascii_case(&wanted)
                    || code.title_tokens().contains(&wanted.as_str())
            })
            .ok_or_else(|| format!("unknown class code: {}", s))
    }
}

/// How lecture slots are chosen for a class within a week
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScheduleRule {
    /// Ordered meeting weekdays (1 = Monday .. 7 = Sunday); the position of
    /// the lecture's weekday in this list is its slot.
    Weekdays(Vec<u32>),

    /// No fixed meeting days; arrivals fill the next open slot of the week.
    Sequential { max_slots: u32 },
}

impl ScheduleRule {
    /// Number of lecture slots per week for this rule
    pub fn max_slots(&self) -> u32 {
        match self {
            ScheduleRule::Weekdays(days) => days.len() as u32,
            ScheduleRule::Sequential { max_slots } => *max_slots,
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        match self {
            ScheduleRule::Weekdays(days) => {
                if days.is_empty() {
                    return Err("weekday list must not be empty".to_string());
                }
                for (i, day) in days.iter().enumerate() {
                    if !(1..=7).contains(day) {
                        return Err(format!("weekday {} is outside 1..=7", day));
                    }
                    if days[..i].contains(day) {
                        return Err(format!("weekday {} listed twice", day));
                    }
                }
                Ok(())
            }
            ScheduleRule::Sequential { max_slots } => {
                if *max_slots == 0 {
                    Err("sequential max_slots must be at least 1".to_string())
                } else {
                    Ok(())
                }
            }
        }
    }
}

/// Schedule rule for one class, as written in configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassSchedule {
    pub code: ClassCode,
    pub rule: ScheduleRule,
}

/// Lookup table of scheduling rules by class
#[derive(Debug, Clone, Default)]
pub struct ScheduleTable {
    rules: BTreeMap<ClassCode, ScheduleRule>,
}

impl ScheduleTable {
    pub fn new(classes: &[ClassSchedule]) -> Self {
        let rules = classes
            .iter()
            .map(|class| (class.code, class.rule.clone()))
            .collect();
        Self { rules }
    }

    pub fn rule_for(&self, code: ClassCode) -> Option<&ScheduleRule> {
        self.rules.get(&code)
    }
}

/// The schedule the lecture library was built around
pub fn default_class_schedules() -> Vec<ClassSchedule> {
    vec![
        ClassSchedule {
            code: ClassCode::Avc185,
            rule: ScheduleRule::Weekdays(vec![1, 3]),
        },
        ClassSchedule {
            code: ClassCode::Avc200,
            rule: ScheduleRule::Weekdays(vec![1, 3]),
        },
        ClassSchedule {
            code: ClassCode::Avc240,
            rule: ScheduleRule::Weekdays(vec![1, 3]),
        },
        ClassSchedule {
            code: ClassCode::Avc285,
            rule: ScheduleRule::Sequential { max_slots: 2 },
        },
    ]
}
