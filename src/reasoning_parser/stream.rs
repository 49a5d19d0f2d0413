//! Drive a segmenter from an async stream of fragments.

use std::collections::VecDeque;

use futures_util::stream::{self, Stream, StreamExt};
use tracing::{debug, warn};

use crate::reasoning_parser::{
    segment::StructuredSegment,
    traits::{ParseError, StreamSegmenter},
};

struct Driver<S, P> {
    fragments: S,
    segmenter: P,
    pending: VecDeque<Result<StructuredSegment, ParseError>>,
    finished: bool,
}

/// Turn a stream of text fragments into a stream of segments.
///
/// Fragments are processed in arrival order by `segmenter`, which is owned by
/// the returned stream. When `fragments` ends the segmenter is finalized and
/// the stream yields exactly one Complete segment before ending. A fragment
/// rejected by the segmenter is reported as an error, after which buffered
/// content is flushed the same way and no further fragments are read.
pub fn segment_stream<S, T, P>(
    fragments: S,
    segmenter: P,
) -> impl Stream<Item = Result<StructuredSegment, ParseError>>
where
    S: Stream<Item = T> + Unpin,
    T: AsRef<str>,
    P: StreamSegmenter,
{
    let driver = Driver {
        fragments,
        segmenter,
        pending: VecDeque::new(),
        finished: false,
    };

    stream::unfold(driver, |mut driver| async move {
        loop {
            if let Some(item) = driver.pending.pop_front() {
                return Some((item, driver));
            }
            if driver.finished {
                return None;
            }

            match driver.fragments.next().await {
                Some(fragment) => match driver.segmenter.process_fragment(fragment.as_ref()) {
                    Ok(segments) => driver.pending.extend(segments.into_iter().map(Ok)),
                    Err(e) => {
                        warn!(error = %e, "fragment rejected, flushing segmenter");
                        driver.pending.push_back(Err(e));
                        driver.pending.push_back(Ok(driver.segmenter.finalize()));
                        driver.finished = true;
                    }
                },
                None => {
                    debug!("fragment stream ended, finalizing");
                    driver.pending.push_back(Ok(driver.segmenter.finalize()));
                    driver.finished = true;
                }
            }
        }
    })
}
