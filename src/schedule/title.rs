/// Extraction of class and lecture date from free-text video titles
use super::ClassCode;
use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static US_DATE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\d{1,2})/(\d{1,2})/(\d{4})").expect("US date pattern is valid")
});

/// Facts extracted from a title. Either field may be missing independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ParsedTitle {
    pub class_code: Option<ClassCode>,
    pub date: Option<NaiveDate>,
}

impl ParsedTitle {
    pub fn is_complete(&self) -> bool {
        self.class_code.is_some() && self.date.is_some()
    }
}

/// Parse a title such as `"AVC185 8/12/2025"` or `"AVC 185 Lecture 8/12/2025"`
pub fn parse_title(title: &str) -> ParsedTitle {
    ParsedTitle {
        class_code: parse_class_code(title),
        date: parse_lecture_date(title),
    }
}

/// First class whose token appears anywhere in the title, case-insensitively
fn parse_class_code(title: &str) -> Option<ClassCode> {
    let upper = title.to_uppercase();
    ClassCode::ALL
        .into_iter()
        .find(|code| code.title_tokens().iter().any(|token| upper.contains(token)))
}

/// First `M/D/YYYY` date in the title. Impossible dates count as no date.
fn parse_lecture_date(title: &str) -> Option<NaiveDate> {
    let caps = US_DATE.captures(title)?;
    let month: u32 = caps[1].parse().ok()?;
    let day: u32 = caps[2].parse().ok()?;
    let year: i32 = caps[3].parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Whether the title literally names `code` in either spelling
pub fn title_mentions_class(title: &str, code: ClassCode) -> bool {
    let upper = title.to_uppercase();
    code.title_tokens().iter().any(|token| upper.contains(token))
}
