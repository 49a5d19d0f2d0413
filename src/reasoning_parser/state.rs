use std::fmt;

use crate::reasoning_parser::markers::{
    find_first_marker, find_spanning_marker, Marker, MAX_LOOKBACK,
};

/// Coarse phase of the segmenter, as seen from outside.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParserPhase {
    /// Answer text; no reasoning block is open.
    Outside,
    /// Answer text with a partial marker held back for the next fragment.
    IncompleteOpen,
    /// Inside at least one reasoning block.
    Inside,
}

impl fmt::Display for ParserPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ParserPhase::Outside => "outside",
            ParserPhase::IncompleteOpen => "incomplete_open",
            ParserPhase::Inside => "inside",
        };
        f.write_str(name)
    }
}

/// State while no reasoning block is open.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutsideState {
    /// Trailing marker candidate carried over from the previous fragment.
    pub(crate) buffer: String,
    /// Text emitted since the last marker event, joined by single spaces.
    pub(crate) pre_think: String,
    /// The individual Text segments behind `pre_think`.
    pub(crate) emitted_window: Vec<String>,
}

impl OutsideState {
    /// Record an emitted Text segment so an unmatched closing marker can
    /// reclassify it later.
    pub(crate) fn record_text(&mut self, text: &str) {
        if !self.pre_think.is_empty() {
            self.pre_think.push(' ');
        }
        self.pre_think.push_str(text);
        self.emitted_window.push(text.to_string());
    }

    /// Forget everything recorded for reclassification.
    pub(crate) fn clear_reclassification(&mut self) {
        self.pre_think.clear();
        self.emitted_window.clear();
    }
}

/// State while inside a reasoning block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InsideState {
    /// Reasoning text of the current block, nested markers included verbatim.
    pub(crate) buffer: String,
    /// Number of open markers; never zero.
    pub(crate) depth: usize,
}

impl InsideState {
    pub(crate) fn new() -> Self {
        Self {
            buffer: String::new(),
            depth: 1,
        }
    }

    /// Up to `MAX_LOOKBACK` trailing bytes of the buffer, on a char boundary.
    pub(crate) fn lookback_tail(&self) -> &str {
        let mut start = self.buffer.len().saturating_sub(MAX_LOOKBACK);
        while !self.buffer.is_char_boundary(start) {
            start += 1;
        }
        &self.buffer[start..]
    }

    /// Locate the next marker given the buffered text and a new input slice.
    /// Markers that begin in the buffered tail take precedence since they
    /// start further left.
    pub(crate) fn find_marker(&self, input: &str) -> Option<MarkerHit> {
        let tail = self.lookback_tail();
        if let Some((offset, marker)) = find_spanning_marker(tail, head(input)) {
            let in_buffer = tail.len() - offset;
            return Some(MarkerHit {
                marker,
                before: 0,
                in_buffer,
                consumed: marker.len() - in_buffer,
            });
        }

        find_first_marker(input).map(|(offset, marker)| MarkerHit {
            marker,
            before: offset,
            in_buffer: 0,
            consumed: offset + marker.len(),
        })
    }

    /// Move the content preceding `hit` into the buffer, dropping any marker
    /// bytes that were buffered by an earlier fragment.
    pub(crate) fn absorb(&mut self, hit: &MarkerHit, input: &str) {
        let keep = self.buffer.len() - hit.in_buffer;
        self.buffer.truncate(keep);
        self.buffer.push_str(&input[..hit.before]);
    }
}

/// A marker found by `InsideState::find_marker`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct MarkerHit {
    pub(crate) marker: Marker,
    /// Input bytes preceding the marker.
    pub(crate) before: usize,
    /// Marker bytes already sitting at the end of the buffer.
    pub(crate) in_buffer: usize,
    /// Input bytes up to and including the end of the marker.
    pub(crate) consumed: usize,
}

impl MarkerHit {
    pub(crate) fn is_split(&self) -> bool {
        self.in_buffer > 0
    }
}

/// Tagged parser state. `depth == 0` and `Outside` are the same thing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParserState {
    Outside(OutsideState),
    Inside(InsideState),
}

impl Default for ParserState {
    fn default() -> Self {
        ParserState::Outside(OutsideState::default())
    }
}

impl ParserState {
    pub fn phase(&self) -> ParserPhase {
        match self {
            ParserState::Inside(_) => ParserPhase::Inside,
            ParserState::Outside(outside) if !outside.buffer.is_empty() => {
                ParserPhase::IncompleteOpen
            }
            ParserState::Outside(_) => ParserPhase::Outside,
        }
    }

    pub fn depth(&self) -> usize {
        match self {
            ParserState::Outside(_) => 0,
            ParserState::Inside(inside) => inside.depth,
        }
    }

    /// Bytes held for classification once `incoming` more bytes arrive.
    /// Outside, text is emitted as it arrives and only the held candidate
    /// stays behind.
    pub fn retained_len(&self, incoming: usize) -> usize {
        match self {
            ParserState::Outside(outside) => outside.buffer.len(),
            ParserState::Inside(inside) => inside.buffer.len() + incoming,
        }
    }
}

/// Leading bytes of `input` that could complete a marker started in a tail.
pub(crate) fn head(input: &str) -> &str {
    let mut end = input.len().min(MAX_LOOKBACK);
    while !input.is_char_boundary(end) {
        end -= 1;
    }
    &input[..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inside_with(buffer: &str, depth: usize) -> InsideState {
        InsideState {
            buffer: buffer.to_string(),
            depth,
        }
    }

    #[test]
    fn test_lookback_tail_is_bounded() {
        let inside = inside_with("0123456789", 1);
        assert_eq!(inside.lookback_tail(), "3456789");

        let short = inside_with("ab", 1);
        assert_eq!(short.lookback_tail(), "ab");
    }

    #[test]
    fn test_lookback_tail_respects_char_boundaries() {
        // 'é' is two bytes; a naive cut would land inside it.
        let inside = inside_with("ééééé", 1);
        assert!(inside.lookback_tail().len() <= MAX_LOOKBACK);
        assert_eq!(inside.lookback_tail(), "ééé");
    }

    #[test]
    fn test_find_marker_split_across_buffer() {
        let mut inside = inside_with("R</thi", 1);
        let hit = inside.find_marker("nk>T").unwrap();
        assert_eq!(hit.marker, Marker::Close);
        assert_eq!(hit.in_buffer, 5);
        assert_eq!(hit.consumed, 3);
        assert!(hit.is_split());

        inside.absorb(&hit, "nk>T");
        assert_eq!(inside.buffer, "R");
    }

    #[test]
    fn test_find_marker_inside_input() {
        let mut inside = inside_with("abc", 1);
        let hit = inside.find_marker("de</think>f").unwrap();
        assert_eq!(hit.before, 2);
        assert_eq!(hit.consumed, 10);
        assert!(!hit.is_split());

        inside.absorb(&hit, "de</think>f");
        assert_eq!(inside.buffer, "abcde");
    }

    #[test]
    fn test_verbatim_marker_in_buffer_is_not_matched_again() {
        let inside = inside_with("A<think>", 2);
        assert_eq!(inside.find_marker("B"), None);

        let inside = inside_with("A</think>", 1);
        assert_eq!(inside.find_marker("B"), None);
    }

    #[test]
    fn test_phase_reporting() {
        assert_eq!(ParserState::default().phase(), ParserPhase::Outside);

        let held = ParserState::Outside(OutsideState {
            buffer: "<th".to_string(),
            ..Default::default()
        });
        assert_eq!(held.phase(), ParserPhase::IncompleteOpen);
        assert_eq!(held.depth(), 0);

        let inside = ParserState::Inside(inside_with("x", 3));
        assert_eq!(inside.phase(), ParserPhase::Inside);
        assert_eq!(inside.depth(), 3);
    }

    #[test]
    fn test_record_text_joins_with_space() {
        let mut outside = OutsideState::default();
        outside.record_text("one");
        outside.record_text("two");
        assert_eq!(outside.pre_think, "one two");
        assert_eq!(outside.emitted_window, vec!["one", "two"]);

        outside.clear_reclassification();
        assert!(outside.pre_think.is_empty());
        assert!(outside.emitted_window.is_empty());
    }
}
