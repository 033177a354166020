//! Canonical shapes for the two upstream signals.
//!
//! The video analyzer is best-effort: its output may be partial, malformed, or a
//! low-confidence mock. Everything here degrades to defaults instead of failing.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::types::{DamageSet, DamageTag, Severity};

/// Notes shorter than this (after trimming) carry no usable cues.
const MIN_NOTE_CHARS: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoSignal {
    pub severity: Severity,
    pub cars_involved: u32,
    pub damages: DamageSet,
    pub location_type: Option<String>,
    pub immediate_concerns: Vec<String>,
}

impl Default for VideoSignal {
    fn default() -> Self {
        Self {
            severity: Severity::Minor,
            cars_involved: 1,
            damages: DamageSet::new(),
            location_type: None,
            immediate_concerns: Vec::new(),
        }
    }
}

impl VideoSignal {
    /// Builds a signal from structured analyzer output, defaulting every field that is
    /// missing or unreadable.
    pub fn from_value(value: &Value) -> Self {
        let Some(fields) = value.as_object() else {
            debug!("video analysis is not an object, using defaults");
            return Self::default();
        };

        let severity = fields
            .get("severity")
            .and_then(Value::as_str)
            .and_then(Severity::parse_lenient)
            .unwrap_or_default();

        let cars_involved = fields
            .get("cars_involved")
            .and_then(parse_count)
            .unwrap_or(1);

        let damages = match fields.get("damages") {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(Value::as_str)
                .map(DamageTag::new)
                .collect(),
            Some(Value::String(list)) => list.split(',').map(DamageTag::new).collect(),
            _ => DamageSet::new(),
        };

        let location_type = fields
            .get("location_type")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from);

        let immediate_concerns = fields
            .get("immediate_concerns")
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(Value::as_str)
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default();

        Self {
            severity,
            cars_involved,
            damages,
            location_type,
            immediate_concerns,
        }
    }

    /// Builds a signal from a textual analyzer result, which is usually JSON possibly
    /// wrapped in a Markdown code fence or surrounded by prose.
    pub fn from_text(raw: &str) -> Self {
        let cleaned = strip_code_fence(raw);

        if let Ok(value) = serde_json::from_str::<Value>(cleaned) {
            return Self::from_value(&value);
        }

        // Fall back to the outermost braces when the model added commentary.
        if let (Some(start), Some(end)) = (cleaned.find('{'), cleaned.rfind('}')) {
            if start < end {
                if let Ok(value) = serde_json::from_str::<Value>(&cleaned[start..=end]) {
                    return Self::from_value(&value);
                }
            }
        }

        warn!(
            raw_length = raw.len(),
            "could not parse video analysis output, using defaults"
        );
        Self::default()
    }
}

fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let trimmed = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .unwrap_or(trimmed);
    trimmed.strip_suffix("```").unwrap_or(trimmed).trim()
}

fn parse_count(value: &Value) -> Option<u32> {
    let count = match value {
        Value::Number(n) => n.as_u64().or_else(|| {
            n.as_f64()
                .filter(|f| f.is_finite() && *f >= 0.0)
                .map(|f| f.round() as u64)
        })?,
        Value::String(s) => s.trim().parse::<u64>().ok()?,
        _ => return None,
    };
    Some(count.clamp(1, u32::MAX as u64) as u32)
}

/// The user's free-text note about the incident.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TextSignal {
    pub raw_note: String,
    pub has_content: bool,
}

impl TextSignal {
    pub fn from_note(note: impl Into<String>) -> Self {
        let raw_note = note.into();
        let has_content = raw_note.trim().chars().count() > MIN_NOTE_CHARS;
        Self {
            raw_note,
            has_content,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_value_reads_complete_result() {
        let signal = VideoSignal::from_value(&json!({
            "severity": "major",
            "cars_involved": 2,
            "damages": ["front collision", "broken glass"],
            "location_type": "intersection",
            "immediate_concerns": ["airbag deployed"]
        }));

        assert_eq!(signal.severity, Severity::Major);
        assert_eq!(signal.cars_involved, 2);
        assert_eq!(signal.damages.joined(), "front collision, broken glass");
        assert_eq!(signal.location_type.as_deref(), Some("intersection"));
        assert_eq!(signal.immediate_concerns, vec!["airbag deployed".to_string()]);
    }

    #[test]
    fn test_from_value_defaults_partial_result() {
        let signal = VideoSignal::from_value(&json!({
            "severity": "catastrophic-ish",
            "cars_involved": 0,
            "damages": "dents, scratches,"
        }));

        assert_eq!(signal.severity, Severity::Minor);
        assert_eq!(signal.cars_involved, 1);
        assert_eq!(signal.damages.len(), 2);
        assert!(signal.location_type.is_none());
    }

    #[test]
    fn test_from_value_non_object_is_default() {
        assert_eq!(VideoSignal::from_value(&json!([1, 2])), VideoSignal::default());
        assert_eq!(VideoSignal::from_value(&Value::Null), VideoSignal::default());
    }

    #[test]
    fn test_from_text_strips_code_fence() {
        let raw = "```json\n{\"severity\": \"severe\", \"cars_involved\": \"3\"}\n```";
        let signal = VideoSignal::from_text(raw);
        assert_eq!(signal.severity, Severity::Severe);
        assert_eq!(signal.cars_involved, 3);
    }

    #[test]
    fn test_from_text_extracts_embedded_object() {
        let raw = "Here is the analysis: {\"severity\": \"major\"} hope that helps";
        assert_eq!(VideoSignal::from_text(raw).severity, Severity::Major);
    }

    #[test]
    fn test_from_text_garbage_is_default() {
        assert_eq!(VideoSignal::from_text("no idea"), VideoSignal::default());
    }

    #[test]
    fn test_text_signal_content_threshold() {
        assert!(!TextSignal::from_note("  ok   ").has_content);
        assert!(!TextSignal::from_note("12345").has_content);
        assert!(TextSignal::from_note("123456").has_content);
        assert!(!TextSignal::from_note("").has_content);
    }
}
