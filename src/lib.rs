pub mod config;
pub mod logging;
pub mod reasoning_parser;

pub use config::{ConfigError, ConfigResult, SegmenterConfig, SegmenterConfigBuilder};
pub use reasoning_parser::{
    segment_stream, ParseError, ParserPhase, SegmentKind, SegmentedOutput, StreamSegmenter,
    StructuredSegment, ThinkSegmenter, THINK_CLOSE, THINK_OPEN,
};
