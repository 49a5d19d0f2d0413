pub mod markers;
pub mod observer;
pub mod segment;
pub mod segmenter;
pub mod state;
pub mod stream;
pub mod traits;

pub use markers::{Marker, THINK_CLOSE, THINK_OPEN};
pub use observer::{SegmenterObserver, TraceEvent, TracingObserver};
pub use segment::{SegmentKind, StructuredSegment};
pub use segmenter::ThinkSegmenter;
pub use state::{ParserPhase, ParserState};
pub use stream::segment_stream;
pub use traits::{ParseError, SegmentedOutput, StreamSegmenter};
