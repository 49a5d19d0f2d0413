// Marker scanning helpers for the <think>/</think> vocabulary.
// Every function here is pure; "not found" is the only failure mode.

/// Literal that opens a reasoning block.
pub const THINK_OPEN: &str = "<think>";

/// Literal that closes a reasoning block.
pub const THINK_CLOSE: &str = "</think>";

/// Number of trailing buffer bytes that can hold the start of a marker split
/// across two fragments. A match must always reach into the new fragment, so
/// one byte less than the longest marker is enough.
pub const MAX_LOOKBACK: usize = THINK_CLOSE.len() - 1;

/// One of the two recognised markers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Marker {
    Open,
    Close,
}

impl Marker {
    /// The literal text of this marker.
    pub fn literal(self) -> &'static str {
        match self {
            Marker::Open => THINK_OPEN,
            Marker::Close => THINK_CLOSE,
        }
    }

    /// Length of the literal in bytes.
    pub fn len(self) -> usize {
        self.literal().len()
    }
}

/// Offset of the longest suffix of `text` that is a strict prefix of the
/// opening marker (`<`, `<t`, ... `<think`).
pub fn ends_with_marker_prefix(text: &str) -> Option<usize> {
    longest_partial_suffix(text, THINK_OPEN)
}

/// Offset of the longest suffix of `text` that is a strict prefix of the
/// closing marker (`<`, `</`, ... `</think`).
pub fn ends_with_close_prefix(text: &str) -> Option<usize> {
    longest_partial_suffix(text, THINK_CLOSE)
}

/// Start of the trailing marker candidate that must be held back until the
/// next fragment arrives. Covers partial opening and closing markers alike.
pub fn pending_marker_start(text: &str) -> Option<usize> {
    match (ends_with_marker_prefix(text), ends_with_close_prefix(text)) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (a, b) => a.or(b),
    }
}

/// First offset at which `literal` occurs in `window`.
pub fn find_marker_at(window: &str, literal: &str) -> Option<usize> {
    window.find(literal)
}

/// Marker starting exactly at `offset`, if any.
pub fn marker_at(text: &str, offset: usize) -> Option<Marker> {
    let rest = text.get(offset..)?;
    if rest.starts_with(THINK_OPEN) {
        Some(Marker::Open)
    } else if rest.starts_with(THINK_CLOSE) {
        Some(Marker::Close)
    } else {
        None
    }
}

/// Leftmost marker of either kind in `text`.
///
/// Stops at the first hit, so repeated calls on the remainder after each
/// marker touch every byte once.
pub fn find_first_marker(text: &str) -> Option<(usize, Marker)> {
    text.match_indices('<')
        .find_map(|(offset, _)| marker_at(text, offset).map(|marker| (offset, marker)))
}

/// Leftmost marker that starts inside `tail` and ends inside `head`, where
/// `tail` is the end of already-buffered text (at most `MAX_LOOKBACK` bytes)
/// and `head` is the start of the new fragment. Returns the offset within
/// `tail`.
pub fn find_spanning_marker(tail: &str, head: &str) -> Option<(usize, Marker)> {
    if tail.is_empty() || head.is_empty() {
        return None;
    }

    // A tail this short holds at most one whole marker, and only at offset 0,
    // so the first occurrence of each literal is the only one to check.
    let window = format!("{}{}", tail, head);
    [Marker::Open, Marker::Close]
        .into_iter()
        .filter_map(|marker| {
            let offset = find_marker_at(&window, marker.literal())?;
            (offset < tail.len() && offset + marker.len() > tail.len())
                .then_some((offset, marker))
        })
        .min_by_key(|(offset, _)| *offset)
}

/// Remove a dangling partial closing marker (`</think`, `</thin`, ... `</`)
/// from the end of `text`, longest candidate first.
pub fn strip_partial_close(text: &str) -> &str {
    (2..THINK_CLOSE.len())
        .rev()
        .map(|len| &THINK_CLOSE[..len])
        .find(|partial| text.ends_with(partial))
        .map_or(text, |partial| &text[..text.len() - partial.len()])
}

fn longest_partial_suffix(text: &str, literal: &str) -> Option<usize> {
    let max = text.len().min(literal.len() - 1);
    (1..=max).rev().find_map(|len| {
        let start = text.len() - len;
        if text.is_char_boundary(start) && literal.starts_with(&text[start..]) {
            Some(start)
        } else {
            None
        }
    })
}
