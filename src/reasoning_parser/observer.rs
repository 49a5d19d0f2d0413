// Trace hook for the segmenter. Attaching or removing an observer never
// changes which segments are produced.

use tracing::{debug, trace};

use crate::reasoning_parser::{markers::Marker, state::ParserPhase};

/// Step-by-step events reported by the segmenter.
#[derive(Debug, Clone, PartialEq)]
pub enum TraceEvent<'a> {
    /// A fragment is about to be processed.
    FragmentReceived { len: usize, phase: ParserPhase },
    /// A marker was completed across a fragment boundary.
    MarkerSplit { marker: Marker, buffered: usize },
    /// An opening marker started a reasoning block.
    BlockOpened,
    /// A nested marker was kept verbatim inside a reasoning block.
    NestedMarker { marker: Marker, depth: usize },
    /// The outermost reasoning block closed.
    BlockClosed { thinking: &'a str },
    /// A closing marker arrived with no opener; earlier text was reclassified.
    Reclassified {
        retracted: &'a [String],
        thinking: &'a str,
    },
    /// A partial marker is held back until the next fragment.
    CandidateHeld { candidate: &'a str },
    /// The stream was flushed.
    Finalized { phase: ParserPhase, content: &'a str },
    /// All state was cleared.
    Reset,
}

/// Receiver of `TraceEvent`s.
pub trait SegmenterObserver: Send {
    fn on_event(&mut self, event: &TraceEvent<'_>);
}

impl<F> SegmenterObserver for F
where
    F: FnMut(&TraceEvent<'_>) + Send,
{
    fn on_event(&mut self, event: &TraceEvent<'_>) {
        self(event)
    }
}

/// Observer that forwards every event to `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl SegmenterObserver for TracingObserver {
    fn on_event(&mut self, event: &TraceEvent<'_>) {
        match event {
            TraceEvent::FragmentReceived { len, phase } => {
                trace!(len, %phase, "fragment received");
            }
            TraceEvent::MarkerSplit { marker, buffered } => {
                debug!(?marker, buffered, "marker completed across fragment boundary");
            }
            TraceEvent::BlockOpened => debug!("reasoning block opened"),
            TraceEvent::NestedMarker { marker, depth } => {
                trace!(?marker, depth, "nested marker kept verbatim");
            }
            TraceEvent::BlockClosed { thinking } => {
                debug!(thinking_len = thinking.len(), "reasoning block closed");
            }
            TraceEvent::Reclassified {
                retracted,
                thinking,
            } => {
                debug!(
                    retracted_segments = retracted.len(),
                    thinking_len = thinking.len(),
                    "unmatched closing marker, reclassified preceding text"
                );
            }
            TraceEvent::CandidateHeld { candidate } => {
                trace!(candidate, "holding partial marker");
            }
            TraceEvent::Finalized { phase, content } => {
                debug!(%phase, content_len = content.len(), "stream finalized");
            }
            TraceEvent::Reset => trace!("segmenter reset"),
        }
    }
}

/// Optional observer borrowed for the duration of one call.
pub(crate) struct Tracer<'o> {
    observer: Option<&'o mut (dyn SegmenterObserver + 'static)>,
}

impl<'o> Tracer<'o> {
    pub(crate) fn new(observer: Option<&'o mut (dyn SegmenterObserver + 'static)>) -> Self {
        Self { observer }
    }

    pub(crate) fn emit(&mut self, event: TraceEvent<'_>) {
        if let Some(observer) = self.observer.as_deref_mut() {
            observer.on_event(&event);
        }
    }
}
