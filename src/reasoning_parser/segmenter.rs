// Incremental <think>/</think> segmenter.
//
// Fragments are processed by an explicit work loop: each step consumes part
// of the fragment in the current state and hands the remainder to the next
// state, so the number of markers in one fragment never grows the stack.

use std::fmt;

use crate::{
    config::SegmenterConfig,
    reasoning_parser::{
        markers::{
            find_first_marker, find_spanning_marker, pending_marker_start, strip_partial_close,
            Marker, THINK_CLOSE, THINK_OPEN,
        },
        observer::{SegmenterObserver, TraceEvent, Tracer},
        segment::{SegmentEmitter, StructuredSegment},
        state::{head, InsideState, OutsideState, ParserPhase, ParserState},
        traits::{ParseError, StreamSegmenter},
    },
};

/// Segmenter for streams that delimit reasoning with `<think>` and `</think>`.
///
/// Markers may be split across fragments at any byte. Nested markers inside a
/// reasoning block are kept verbatim. A closing marker with no opener turns
/// the answer text emitted since the last marker event into reasoning.
pub struct ThinkSegmenter {
    config: SegmenterConfig,
    state: ParserState,
    thinking_history: Vec<String>,
    observer: Option<Box<dyn SegmenterObserver>>,
}

impl ThinkSegmenter {
    /// Create a segmenter with the default configuration.
    pub fn new() -> Self {
        Self::with_config(SegmenterConfig::default())
    }

    /// Create a segmenter with the given configuration.
    ///
    /// The configuration is used as is; see `try_with_config` for a
    /// validating constructor.
    pub fn with_config(config: SegmenterConfig) -> Self {
        Self {
            config,
            state: ParserState::default(),
            thinking_history: Vec::new(),
            observer: None,
        }
    }

    /// Create a segmenter after validating `config`.
    pub fn try_with_config(config: SegmenterConfig) -> Result<Self, ParseError> {
        config.validate()?;
        Ok(Self::with_config(config))
    }

    /// Attach an observer that receives a trace of every processing step.
    pub fn with_observer(mut self, observer: impl SegmenterObserver + 'static) -> Self {
        self.observer = Some(Box::new(observer));
        self
    }

    pub fn phase(&self) -> ParserPhase {
        self.state.phase()
    }

    /// Number of currently open markers.
    pub fn depth(&self) -> usize {
        self.state.depth()
    }

    /// Contents of every Thinking segment emitted since the last reset.
    pub fn accumulated_thinking(&self) -> &[String] {
        &self.thinking_history
    }

    /// Text segments emitted since the last marker event. These would be
    /// reclassified as reasoning by an unmatched closing marker.
    pub fn emitted_text_window(&self) -> &[String] {
        match &self.state {
            ParserState::Outside(outside) => outside.emitted_window.as_slice(),
            ParserState::Inside(_) => &[],
        }
    }

    fn clear(&mut self) {
        self.state = ParserState::default();
        self.thinking_history.clear();
    }
}

impl Default for ThinkSegmenter {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ThinkSegmenter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ThinkSegmenter")
            .field("config", &self.config)
            .field("state", &self.state)
            .field("thinking_history", &self.thinking_history)
            .field("observer", &self.observer.is_some())
            .finish()
    }
}

impl StreamSegmenter for ThinkSegmenter {
    fn process_fragment(&mut self, fragment: &str) -> Result<Vec<StructuredSegment>, ParseError> {
        let retained = self.state.retained_len(fragment.len());
        if retained > self.config.max_buffer_size {
            return Err(ParseError::BufferOverflow(retained));
        }

        let history = self
            .config
            .keep_thinking_history
            .then_some(&mut self.thinking_history);
        let mut out = SegmentEmitter::new(history);
        let mut tracer = Tracer::new(self.observer.as_deref_mut());

        tracer.emit(TraceEvent::FragmentReceived {
            len: fragment.len(),
            phase: self.state.phase(),
        });

        let mut state = std::mem::take(&mut self.state);
        let mut input = fragment;
        loop {
            let (next, rest) = match state {
                ParserState::Outside(outside) => {
                    step_outside(outside, input, &mut out, &mut tracer)
                }
                ParserState::Inside(inside) => step_inside(inside, input, &mut out, &mut tracer),
            };
            state = next;
            match rest {
                Some(rest) => input = rest,
                None => break,
            }
        }
        self.state = state;

        Ok(out.into_segments())
    }

    fn finalize(&mut self) -> StructuredSegment {
        let phase = self.state.phase();
        let content = match &self.state {
            ParserState::Inside(inside) => strip_partial_close(inside.buffer.trim())
                .trim_end()
                .to_string(),
            ParserState::Outside(outside) => outside.buffer.trim().to_string(),
        };

        Tracer::new(self.observer.as_deref_mut()).emit(TraceEvent::Finalized {
            phase,
            content: &content,
        });

        self.clear();
        StructuredSegment::complete(content)
    }

    fn reset(&mut self) {
        self.clear();
        Tracer::new(self.observer.as_deref_mut()).emit(TraceEvent::Reset);
    }

    fn is_in_reasoning(&self) -> bool {
        matches!(self.state, ParserState::Inside(_))
    }
}

/// One Inside step. Consumes `input` up to and including the marker that
/// closes the outermost block, or all of it if the block stays open.
fn step_inside<'a>(
    mut inside: InsideState,
    mut input: &'a str,
    out: &mut SegmentEmitter<'_>,
    tracer: &mut Tracer<'_>,
) -> (ParserState, Option<&'a str>) {
    loop {
        let Some(hit) = inside.find_marker(input) else {
            inside.buffer.push_str(input);
            return (ParserState::Inside(inside), None);
        };

        if hit.is_split() {
            tracer.emit(TraceEvent::MarkerSplit {
                marker: hit.marker,
                buffered: hit.in_buffer,
            });
        }

        inside.absorb(&hit, input);
        input = &input[hit.consumed..];

        match hit.marker {
            Marker::Open => {
                inside.depth += 1;
                inside.buffer.push_str(THINK_OPEN);
                tracer.emit(TraceEvent::NestedMarker {
                    marker: Marker::Open,
                    depth: inside.depth,
                });
            }
            Marker::Close if inside.depth > 1 => {
                inside.depth -= 1;
                inside.buffer.push_str(THINK_CLOSE);
                tracer.emit(TraceEvent::NestedMarker {
                    marker: Marker::Close,
                    depth: inside.depth,
                });
            }
            Marker::Close => {
                let thinking = inside.buffer.trim();
                out.thinking(thinking);
                tracer.emit(TraceEvent::BlockClosed { thinking });
                return (ParserState::Outside(OutsideState::default()), Some(input));
            }
        }
    }
}

/// One Outside step. Consumes `input` up to and including the first opening
/// marker, or all of it if none appears.
fn step_outside<'a>(
    mut outside: OutsideState,
    mut input: &'a str,
    out: &mut SegmentEmitter<'_>,
    tracer: &mut Tracer<'_>,
) -> (ParserState, Option<&'a str>) {
    // A candidate held from the previous fragment either completes a marker
    // with the start of this one or becomes ordinary leading text.
    let mut lead = std::mem::take(&mut outside.buffer);
    if let Some((offset, marker)) = find_spanning_marker(&lead, head(input)) {
        let in_buffer = lead.len() - offset;
        tracer.emit(TraceEvent::MarkerSplit {
            marker,
            buffered: in_buffer,
        });
        lead.truncate(offset);
        input = &input[marker.len() - in_buffer..];
        if let Some(next) = resolve_outside_marker(&mut outside, &lead, marker, out, tracer) {
            return (next, Some(input));
        }
        lead.clear();
    }

    loop {
        match find_first_marker(input) {
            Some((offset, marker)) => {
                let before = join_lead(&mut lead, &input[..offset]);
                input = &input[offset + marker.len()..];
                let next = resolve_outside_marker(&mut outside, &before, marker, out, tracer);
                if let Some(next) = next {
                    return (next, Some(input));
                }
            }
            None => {
                let text = join_lead(&mut lead, input);
                let (confirmed, candidate) = match pending_marker_start(&text) {
                    Some(start) => text.split_at(start),
                    None => (text.as_str(), ""),
                };

                let confirmed = confirmed.trim();
                if out.text(confirmed) {
                    outside.record_text(confirmed);
                }
                if !candidate.is_empty() {
                    tracer.emit(TraceEvent::CandidateHeld { candidate });
                    outside.buffer.push_str(candidate);
                }
                return (ParserState::Outside(outside), None);
            }
        }
    }
}

/// Apply a marker found while Outside, with `before` being the unclassified
/// text that preceded it. Returns the new state if the marker opened a block.
fn resolve_outside_marker(
    outside: &mut OutsideState,
    before: &str,
    marker: Marker,
    out: &mut SegmentEmitter<'_>,
    tracer: &mut Tracer<'_>,
) -> Option<ParserState> {
    match marker {
        Marker::Open => {
            out.text(before.trim());
            tracer.emit(TraceEvent::BlockOpened);
            Some(ParserState::Inside(InsideState::new()))
        }
        Marker::Close => {
            let combined = format!("{} {}", outside.pre_think, before);
            let thinking = combined.trim();
            out.thinking(thinking);
            tracer.emit(TraceEvent::Reclassified {
                retracted: &outside.emitted_window,
                thinking,
            });
            outside.clear_reclassification();
            None
        }
    }
}

/// Prepend (and drain) any carried-over text to `rest`.
fn join_lead(lead: &mut String, rest: &str) -> String {
    if lead.is_empty() {
        rest.to_string()
    } else {
        let mut text = std::mem::take(lead);
        text.push_str(rest);
        text
    }
}
