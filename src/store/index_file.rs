//! Translation between the lecture index text and [`RecordSnapshot`]
//!
//! The index holds one keyed block per class:
//!
//! ```text
//! 'avc185': {
//!     'week1-lecture1': 'https://www.youtube.com/watch?v=...',
//!     'week1-lecture2': '/not-found.html',
//! },
//! ```
//!
//! Parsing remembers the byte range of every slot value so rendering can
//! splice changed values back in and leave every other byte alone.

use super::{RecordSnapshot, SlotCoordinate, SlotValue};
use crate::error::{MonitorError, Result};
use crate::schedule::ClassCode;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;
use std::ops::Range;
use tracing::debug;

static SECTION_START: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"'([A-Za-z0-9_]+)'\s*:\s*\{").expect("section pattern is valid")
});

static SLOT_ENTRY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"'(week\d+-lecture\d+)'\s*:\s*'([^'\n]*)'").expect("slot entry pattern is valid")
});

#[derive(Debug, Clone)]
struct SlotEntry {
    coordinate: SlotCoordinate,
    value_range: Range<usize>,
}

/// A parsed lecture index
#[derive(Debug, Clone)]
pub struct IndexDocument {
    content: String,
    entries: Vec<SlotEntry>,
    placeholder_marker: String,
}

impl IndexDocument {
    /// Locate every class section and its slot entries.
    ///
    /// Only the first section of a class that actually contains slot keys is
    /// used; later blocks with the same name are left as plain text.
    pub fn parse(content: String, placeholder_marker: &str) -> Result<Self> {
        let mut entries = Vec::new();
        let mut claimed: HashSet<ClassCode> = HashSet::new();

        for caps in SECTION_START.captures_iter(&content) {
            let Some(class_code) = class_for_key(&caps[1]) else {
                continue;
            };
            if claimed.contains(&class_code) {
                continue;
            }

            let Some(whole) = caps.get(0) else {
                continue;
            };
            let open = whole.end() - 1;
            let close = find_block_end(&content, open).ok_or_else(|| {
                MonitorError::StoreCorrupt(format!(
                    "section '{}' starting at byte {} is never closed",
                    class_code, open
                ))
            })?;

            let section = parse_section(&content, class_code, open + 1..close);
            if section.is_empty() {
                continue;
            }
            debug!("Found {} slots for {}", section.len(), class_code);
            claimed.insert(class_code);
            entries.extend(section);
        }

        if entries.is_empty() {
            return Err(MonitorError::StoreCorrupt(
                "no class section with week<N>-lecture<M> entries".to_string(),
            ));
        }

        entries.sort_by_key(|entry| entry.value_range.start);

        Ok(Self {
            content,
            entries,
            placeholder_marker: placeholder_marker.to_string(),
        })
    }

    /// Typed snapshot of every slot in the document
    pub fn snapshot(&self) -> RecordSnapshot {
        self.entries
            .iter()
            .map(|entry| {
                let raw = &self.content[entry.value_range.clone()];
                (
                    entry.coordinate,
                    SlotValue::classify(raw, &self.placeholder_marker),
                )
            })
            .collect()
    }

    /// Document text with slot values taken from `snapshot`.
    ///
    /// Slots whose value is unchanged, and all text outside slot values, are
    /// copied verbatim. Coordinates not present in the document are ignored.
    pub fn render(&self, snapshot: &RecordSnapshot) -> Result<String> {
        let mut output = String::with_capacity(self.content.len());
        let mut cursor = 0;

        for entry in &self.entries {
            let original = &self.content[entry.value_range.clone()];
            let replacement = match snapshot.get(&entry.coordinate) {
                Some(value) if value.as_str() != original => {
                    let text = value.as_str();
                    if text.contains('\'') || text.contains('\n') {
                        return Err(MonitorError::InvalidSlotValue(format!(
                            "{} value {:?} contains a quote or newline",
                            entry.coordinate, text
                        )));
                    }
                    text
                }
                _ => original,
            };

            output.push_str(&self.content[cursor..entry.value_range.start]);
            output.push_str(replacement);
            cursor = entry.value_range.end;
        }

        output.push_str(&self.content[cursor..]);
        Ok(output)
    }

    pub fn slot_count(&self) -> usize {
        self.entries.len()
    }
}

fn class_for_key(key: &str) -> Option<ClassCode> {
    ClassCode::ALL.into_iter().find(|code| code.as_str() == key)
}

/// Slot entries inside one class block; a repeated key keeps its first value
fn parse_section(content: &str, class_code: ClassCode, body: Range<usize>) -> Vec<SlotEntry> {
    let offset = body.start;
    let mut seen = HashSet::new();
    let mut entries = Vec::new();

    for caps in SLOT_ENTRY.captures_iter(&content[body]) {
        let Some(coordinate) = SlotCoordinate::from_slot_key(class_code, &caps[1]) else {
            continue;
        };
        if !seen.insert(coordinate) {
            debug!("Ignoring repeated key {}", coordinate);
            continue;
        }
        let Some(value) = caps.get(2) else {
            continue;
        };
        entries.push(SlotEntry {
            coordinate,
            value_range: offset + value.start()..offset + value.end(),
        });
    }

    entries
}

/// Byte index of the `}` matching the `{` at `open`, skipping quoted strings
/// and `//` / `/* */` comments
fn find_block_end(content: &str, open: usize) -> Option<usize> {
    let bytes = content.as_bytes();
    let mut depth = 0usize;
    let mut quote: Option<u8> = None;
    let mut i = open;

    while i < bytes.len() {
        let b = bytes[i];
        match quote {
            Some(q) => {
                if b == b'\\' {
                    i += 1;
                } else if b == q {
                    quote = None;
                }
            }
            None => match b {
                b'/' if bytes.get(i + 1) == Some(&b'/') => {
                    i = content[i..].find('\n').map_or(bytes.len(), |end| i + end);
                }
                b'/' if bytes.get(i + 1) == Some(&b'*') => {
                    i = content[i + 2..].find("*/").map(|end| i + 2 + end + 1)?;
                }
                b'\'' | b'"' | b'`' => quote = Some(b),
                b'{' => depth += 1,
                b'}' => {
                    depth -= 1;
                    if depth == 0 {
                        return Some(i);
                    }
                }
                _ => {}
            },
        }
        i += 1;
    }

    None
}
