/// Typed view of the lecture record store
///
/// The persisted record is a text document; [`index_file`] translates it to
/// and from a [`RecordSnapshot`] so that assignment logic only ever deals
/// with keyed slots.

pub mod file;
pub mod index_file;

pub use file::IndexStore;
pub use index_file::IndexDocument;

use crate::schedule::ClassCode;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt;

static SLOT_KEY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^week(\d+)-lecture(\d+)$").expect("slot key pattern is valid")
});

static WATCH_ID: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"youtube\.com/watch\?v=([a-zA-Z0-9_-]+)").expect("watch id pattern is valid")
});

/// Address of one lecture slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SlotCoordinate {
    pub class_code: ClassCode,
    pub week: u32,
    pub lecture: u32,
}

impl SlotCoordinate {
    pub fn new(class_code: ClassCode, week: u32, lecture: u32) -> Self {
        Self {
            class_code,
            week,
            lecture,
        }
    }

    /// Key used inside a class section, e.g. `week3-lecture2`
    pub fn slot_key(&self) -> String {
        format!("week{}-lecture{}", self.week, self.lecture)
    }

    /// Inverse of [`slot_key`](Self::slot_key) for a known class
    pub fn from_slot_key(class_code: ClassCode, key: &str) -> Option<Self> {
        let caps = SLOT_KEY.captures(key)?;
        let week = caps[1].parse().ok()?;
        let lecture = caps[2].parse().ok()?;
        Some(Self::new(class_code, week, lecture))
    }
}

impl fmt::Display for SlotCoordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.class_code, self.slot_key())
    }
}

/// Content of one slot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SlotValue {
    /// No recording assigned yet; holds the raw sentinel text
    Placeholder(String),
    /// Reference URL of the assigned recording
    Resolved(String),
}

impl SlotValue {
    /// Classify raw slot text: anything containing `placeholder_marker` is a placeholder
    pub fn classify(raw: &str, placeholder_marker: &str) -> Self {
        if raw.contains(placeholder_marker) {
            SlotValue::Placeholder(raw.to_string())
        } else {
            SlotValue::Resolved(raw.to_string())
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            SlotValue::Placeholder(raw) | SlotValue::Resolved(raw) => raw,
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, SlotValue::Resolved(_))
    }

    /// Video id embedded in a resolved watch URL
    pub fn external_id(&self) -> Option<&str> {
        match self {
            SlotValue::Resolved(url) => WATCH_ID
                .captures(url)
                .and_then(|caps| caps.get(1))
                .map(|m| m.as_str()),
            SlotValue::Placeholder(_) => None,
        }
    }
}

/// Every known slot of the record, keyed by class, week and lecture
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordSnapshot {
    slots: BTreeMap<SlotCoordinate, SlotValue>,
}

impl RecordSnapshot {
    pub fn get(&self, coordinate: &SlotCoordinate) -> Option<&SlotValue> {
        self.slots.get(coordinate)
    }

    pub fn is_resolved(&self, coordinate: &SlotCoordinate) -> bool {
        self.get(coordinate).map_or(false, SlotValue::is_resolved)
    }

    /// New snapshot with exactly `coordinate` replaced. The class is part of
    /// the key, so equal week/lecture numbers in other classes are untouched.
    #[must_use]
    pub fn set(mut self, coordinate: SlotCoordinate, value: SlotValue) -> Self {
        self.slots.insert(coordinate, value);
        self
    }

    /// Ids of every recording already resolved anywhere in the record
    pub fn existing_external_ids(&self) -> HashSet<String> {
        self.slots
            .values()
            .filter_map(SlotValue::external_id)
            .map(str::to_string)
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&SlotCoordinate, &SlotValue)> {
        self.slots.iter()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Filled and placeholder counts for one class
    pub fn class_stats(&self, class_code: ClassCode) -> ClassStats {
        let mut stats = ClassStats::default();
        for (_, value) in self.slots.iter().filter(|(c, _)| c.class_code == class_code) {
            stats.total_slots += 1;
            if value.is_resolved() {
                stats.filled_slots += 1;
            }
        }
        stats
    }
}

impl FromIterator<(SlotCoordinate, SlotValue)> for RecordSnapshot {
    fn from_iter<T: IntoIterator<Item = (SlotCoordinate, SlotValue)>>(iter: T) -> Self {
        Self {
            slots: iter.into_iter().collect(),
        }
    }
}

/// Slot counts for a single class
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ClassStats {
    pub total_slots: usize,
    pub filled_slots: usize,
}

impl ClassStats {
    pub fn open_slots(&self) -> usize {
        self.total_slots - self.filled_slots
    }
}
