use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Channel a segment belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SegmentKind {
    /// Reasoning content from inside a `<think>` block.
    Thinking,
    /// Answer content outside any reasoning block.
    Text,
    /// End-of-stream flush, produced only by `finalize()`.
    Complete,
}

impl fmt::Display for SegmentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SegmentKind::Thinking => "thinking",
            SegmentKind::Text => "text",
            SegmentKind::Complete => "complete",
        };
        f.write_str(name)
    }
}

/// One unit of structured output. Immutable once emitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructuredSegment {
    pub kind: SegmentKind,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl StructuredSegment {
    /// Create a segment stamped with the current time.
    pub fn new(kind: SegmentKind, content: impl Into<String>) -> Self {
        Self {
            kind,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn thinking(content: impl Into<String>) -> Self {
        Self::new(SegmentKind::Thinking, content)
    }

    pub fn text(content: impl Into<String>) -> Self {
        Self::new(SegmentKind::Text, content)
    }

    pub fn complete(content: impl Into<String>) -> Self {
        Self::new(SegmentKind::Complete, content)
    }

    /// Check whether this segment carries no content.
    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }
}

impl fmt::Display for StructuredSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.kind, self.content)
    }
}

/// Ordered, append-only sink for the segments produced by one call.
///
/// Thinking contents are also recorded in the stream-wide history when
/// history keeping is enabled.
#[derive(Debug)]
pub(crate) struct SegmentEmitter<'a> {
    segments: Vec<StructuredSegment>,
    history: Option<&'a mut Vec<String>>,
}

impl<'a> SegmentEmitter<'a> {
    pub(crate) fn new(history: Option<&'a mut Vec<String>>) -> Self {
        Self {
            segments: Vec::new(),
            history,
        }
    }

    /// Emit `content` as a Thinking segment. Returns false if it was empty.
    pub(crate) fn thinking(&mut self, content: &str) -> bool {
        if content.is_empty() {
            return false;
        }
        if let Some(history) = self.history.as_deref_mut() {
            history.push(content.to_string());
        }
        self.segments.push(StructuredSegment::thinking(content));
        true
    }

    /// Emit `content` as a Text segment. Returns false if it was empty.
    pub(crate) fn text(&mut self, content: &str) -> bool {
        if content.is_empty() {
            return false;
        }
        self.segments.push(StructuredSegment::text(content));
        true
    }

    pub(crate) fn into_segments(self) -> Vec<StructuredSegment> {
        self.segments
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_emitter_preserves_order_and_skips_empty() {
        let mut history = Vec::new();
        let mut emitter = SegmentEmitter::new(Some(&mut history));
        assert!(emitter.text("a"));
        assert!(!emitter.text(""));
        assert!(emitter.thinking("b"));
        assert!(!emitter.thinking(""));
        assert!(emitter.text("c"));

        let segments = emitter.into_segments();
        let kinds: Vec<_> = segments.iter().map(|s| s.kind).collect();
        assert_eq!(
            kinds,
            vec![SegmentKind::Text, SegmentKind::Thinking, SegmentKind::Text]
        );
        assert_eq!(history, vec!["b".to_string()]);
    }

    #[test]
    fn test_segment_serializes_lowercase_kind() {
        let segment = StructuredSegment::thinking("why");
        let json = serde_json::to_value(&segment).unwrap();
        assert_eq!(json["kind"], "thinking");
        assert_eq!(json["content"], "why");
        assert!(json["timestamp"].is_string());
    }

    #[test]
    fn test_display() {
        assert_eq!(StructuredSegment::text("hi").to_string(), "[text] hi");
        assert_eq!(SegmentKind::Complete.to_string(), "complete");
    }
}
