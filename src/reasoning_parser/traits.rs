use std::fmt;

use crate::{
    config::ConfigError,
    reasoning_parser::segment::{SegmentKind, StructuredSegment},
};

/// Answer and reasoning text folded from an ordered segment list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SegmentedOutput {
    /// Concatenated Text content, in emission order.
    pub answer: String,

    /// Concatenated Thinking content, in emission order.
    pub reasoning: String,
}

impl SegmentedOutput {
    /// Fold segments the way a downstream aggregator does. Complete segments
    /// are ignored; use `push_complete` to route them.
    pub fn from_segments<'a, I>(segments: I) -> Self
    where
        I: IntoIterator<Item = &'a StructuredSegment>,
    {
        let mut output = Self::default();
        for segment in segments {
            output.push(segment);
        }
        output
    }

    /// Append one segment to the channel it belongs to.
    pub fn push(&mut self, segment: &StructuredSegment) {
        match segment.kind {
            SegmentKind::Text => self.answer.push_str(&segment.content),
            SegmentKind::Thinking => self.reasoning.push_str(&segment.content),
            SegmentKind::Complete => {}
        }
    }

    /// Append the final flush to the reasoning channel when the stream ended
    /// inside a reasoning block, otherwise to the answer.
    pub fn push_complete(&mut self, segment: &StructuredSegment, in_reasoning: bool) {
        if in_reasoning {
            self.reasoning.push_str(&segment.content);
        } else {
            self.answer.push_str(&segment.content);
        }
    }

    /// Check if this output contains any text.
    pub fn is_empty(&self) -> bool {
        self.answer.is_empty() && self.reasoning.is_empty()
    }
}

impl fmt::Display for SegmentedOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "SegmentedOutput {{ answer: {} chars, reasoning: {} chars }}",
            self.answer.len(),
            self.reasoning.len()
        )
    }
}

/// Incremental splitter of a completion stream into reasoning and answer
/// segments.
///
/// Implementations are stateful and serve one stream at a time. Calls must
/// be made sequentially, in fragment arrival order.
pub trait StreamSegmenter: Send {
    /// Process the next fragment of the stream.
    ///
    /// Returns the segments that became final with this fragment, in order.
    /// Zero-length fragments produce nothing.
    fn process_fragment(&mut self, fragment: &str) -> Result<Vec<StructuredSegment>, ParseError>;

    /// Flush buffered content as a single Complete segment and reset.
    fn finalize(&mut self) -> StructuredSegment;

    /// Clear all state for reuse on an independent stream.
    fn reset(&mut self);

    /// Check if the segmenter is currently inside a reasoning block.
    fn is_in_reasoning(&self) -> bool;

    /// Segment a complete (non-streamed) text in one shot.
    ///
    /// Any state from an earlier stream is discarded first.
    fn segment_complete(&mut self, text: &str) -> Result<SegmentedOutput, ParseError> {
        self.reset();
        let segments = self.process_fragment(text)?;
        let in_reasoning = self.is_in_reasoning();
        let complete = self.finalize();

        let mut output = SegmentedOutput::from_segments(&segments);
        output.push_complete(&complete, in_reasoning);
        Ok(output)
    }
}

/// Error types for segmentation operations.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("Buffer overflow: {0} bytes exceeds maximum")]
    BufferOverflow(usize),

    #[error("Segmenter configuration error: {0}")]
    Config(#[from] ConfigError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_segments_routes_by_kind() {
        let segments = vec![
            StructuredSegment::text("a"),
            StructuredSegment::thinking("r1"),
            StructuredSegment::text("b"),
            StructuredSegment::thinking("r2"),
            StructuredSegment::complete("ignored"),
        ];
        let output = SegmentedOutput::from_segments(&segments);
        assert_eq!(output.answer, "ab");
        assert_eq!(output.reasoning, "r1r2");
    }

    #[test]
    fn test_push_complete() {
        let mut output = SegmentedOutput::default();
        assert!(output.is_empty());

        output.push_complete(&StructuredSegment::complete("tail"), false);
        assert_eq!(output.answer, "tail");

        output.push_complete(&StructuredSegment::complete("thought"), true);
        assert_eq!(output.reasoning, "thought");
        assert!(!output.is_empty());
    }

    #[test]
    fn test_display() {
        let output = SegmentedOutput {
            answer: "abc".to_string(),
            reasoning: "de".to_string(),
        };
        assert_eq!(
            output.to_string(),
            "SegmentedOutput { answer: 3 chars, reasoning: 2 chars }"
        );
    }
}
