//! Streaming Adapter and Observer Tests

use std::sync::{Arc, Mutex};

use futures::stream::{self, StreamExt};
use think_segmenter::reasoning_parser::{Marker, SegmenterObserver, TraceEvent, TracingObserver};
use think_segmenter::{
    segment_stream, ParserPhase, SegmentKind, SegmenterConfig, StreamSegmenter, ThinkSegmenter,
};

#[tokio::test]
async fn test_segment_stream_matches_direct_processing() {
    let fragments = vec![
        "Sure. ",
        "<th",
        "ink>The user wants",
        " a sum.</thi",
        "nk>2 + 2 = 4",
    ];

    let items: Vec<_> = segment_stream(stream::iter(fragments.clone()), ThinkSegmenter::new())
        .collect()
        .await;
    let streamed: Vec<_> = items
        .into_iter()
        .map(|item| item.unwrap())
        .map(|segment| (segment.kind, segment.content))
        .collect();

    let mut segmenter = ThinkSegmenter::new();
    let mut direct: Vec<_> = fragments
        .iter()
        .flat_map(|f| segmenter.process_fragment(f).unwrap())
        .map(|segment| (segment.kind, segment.content))
        .collect();
    let complete = segmenter.finalize();
    direct.push((complete.kind, complete.content));

    assert_eq!(streamed, direct);
    assert_eq!(
        streamed,
        vec![
            (SegmentKind::Text, "Sure.".to_string()),
            (SegmentKind::Thinking, "The user wants a sum.".to_string()),
            (SegmentKind::Text, "2 + 2 = 4".to_string()),
            (SegmentKind::Complete, String::new()),
        ]
    );
}

#[tokio::test]
async fn test_segment_stream_flushes_cancelled_reasoning() {
    // Upstream stops mid-block; the buffered reasoning is not lost.
    let fragments = stream::iter(vec!["<think>half a thou".to_string(), "ght </thi".to_string()]);
    let items: Vec<_> = segment_stream(fragments, ThinkSegmenter::new())
        .collect()
        .await;

    assert_eq!(items.len(), 1);
    let complete = items[0].as_ref().unwrap();
    assert_eq!(complete.kind, SegmentKind::Complete);
    assert_eq!(complete.content, "half a thought");
}

#[tokio::test]
async fn test_segment_stream_over_empty_input() {
    let fragments = stream::iter(Vec::<String>::new());
    let items: Vec<_> = segment_stream(fragments, ThinkSegmenter::new())
        .collect()
        .await;
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].as_ref().unwrap().kind, SegmentKind::Complete);
}

/// Records a short label for every event.
struct Recorder(Arc<Mutex<Vec<String>>>);

impl SegmenterObserver for Recorder {
    fn on_event(&mut self, event: &TraceEvent<'_>) {
        let label = match event {
            TraceEvent::FragmentReceived { .. } => "fragment".to_string(),
            TraceEvent::MarkerSplit { marker, buffered } => {
                format!("split {:?} {}", marker, buffered)
            }
            TraceEvent::BlockOpened => "open".to_string(),
            TraceEvent::NestedMarker { depth, .. } => format!("nested {}", depth),
            TraceEvent::BlockClosed { thinking } => format!("closed {}", thinking),
            TraceEvent::Reclassified {
                retracted,
                thinking,
            } => format!("reclassified {} {}", retracted.len(), thinking),
            TraceEvent::CandidateHeld { candidate } => format!("held {}", candidate),
            TraceEvent::Finalized { content, .. } => format!("finalized {}", content),
            TraceEvent::Reset => "reset".to_string(),
        };
        self.0.lock().unwrap().push(label);
    }
}

#[test]
fn test_observer_sees_split_and_reclassification() {
    let events = Arc::new(Mutex::new(Vec::new()));
    let mut segmenter = ThinkSegmenter::new().with_observer(Recorder(Arc::clone(&events)));

    segmenter.process_fragment("hi <thi").unwrap();
    segmenter.process_fragment("nk>x</think>oops</think>").unwrap();
    segmenter.finalize();
    segmenter.reset();

    let events = events.lock().unwrap();
    assert_eq!(
        *events,
        vec![
            "fragment".to_string(),
            "held <thi".to_string(),
            "fragment".to_string(),
            format!("split {:?} 4", Marker::Open),
            "open".to_string(),
            "closed x".to_string(),
            "reclassified 0 oops".to_string(),
            "finalized ".to_string(),
            "reset".to_string(),
        ]
    );
}

#[test]
fn test_observer_does_not_change_output() {
    let fragments = ["a <think>b<th", "ink>c</think>d</th", "ink>e"];

    let mut plain = ThinkSegmenter::new();
    let mut traced = ThinkSegmenter::new().with_observer(TracingObserver);

    for fragment in fragments {
        let expected: Vec<_> = plain
            .process_fragment(fragment)
            .unwrap()
            .into_iter()
            .map(|s| (s.kind, s.content))
            .collect();
        let actual: Vec<_> = traced
            .process_fragment(fragment)
            .unwrap()
            .into_iter()
            .map(|s| (s.kind, s.content))
            .collect();
        assert_eq!(actual, expected);
        assert_eq!(traced.phase(), plain.phase());
        assert_eq!(traced.depth(), plain.depth());
    }
    assert_eq!(traced.finalize().content, plain.finalize().content);
}

#[test]
fn test_segment_complete_one_shot() {
    let mut segmenter = ThinkSegmenter::new();

    let output = segmenter
        .segment_complete("<think>reasoning</think>answer")
        .unwrap();
    assert_eq!(output.reasoning, "reasoning");
    assert_eq!(output.answer, "answer");

    let output = segmenter
        .segment_complete("This is a test without reasoning.")
        .unwrap();
    assert_eq!(output.reasoning, "");
    assert_eq!(output.answer, "This is a test without reasoning.");

    // Leftover state from a half-finished stream does not leak in.
    segmenter.process_fragment("<think>stale").unwrap();
    let output = segmenter.segment_complete("fresh").unwrap();
    assert_eq!(output.answer, "fresh");
    assert_eq!(segmenter.phase(), ParserPhase::Outside);
}

#[test]
fn test_small_buffer_limit_in_one_shot() {
    let config = SegmenterConfig::builder()
        .max_buffer_size(8)
        .build()
        .unwrap();
    let mut segmenter = ThinkSegmenter::with_config(config);

    // Answer text is never held back, so the limit does not apply to it.
    let output = segmenter
        .segment_complete("far more than eight bytes")
        .unwrap();
    assert_eq!(output.answer, "far more than eight bytes");

    segmenter.process_fragment("<think>").unwrap();
    assert!(segmenter.process_fragment("far more than eight bytes").is_err());
}
