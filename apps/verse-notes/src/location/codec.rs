//! Location codec
//!
//! Pure structural walk over text runs. Nothing here touches a rendering
//! surface; the tree adapter in `html` supplies the runs.

use super::types::{Location, RunPoint, RunRange, Selection, TextRuns};

/// Encode a live selection into a portable location
///
/// Returns `None` when the selection spans anchors, is collapsed or
/// inverted, or when either endpoint does not resolve to a text run.
pub fn encode(selection: &Selection, runs: &TextRuns) -> Option<Location> {
    if selection.spans_anchors() {
        return None;
    }

    let start = runs.offset_of(selection.start.point())?;
    let end = runs.offset_of(selection.end.point())?;
    if start >= end {
        return None;
    }

    Some(Location::new(selection.anchor_id(), start, end))
}

/// Decode a stored location against freshly rendered text runs
///
/// The start resolves to the first run where `start < running + len`, the
/// end to the first run where `end <= running + len`. Returns `None` when the
/// anchor text is now too short, which means the stored location is stale.
pub fn decode(location: &Location, runs: &TextRuns) -> Option<RunRange> {
    if location.start >= location.end {
        return None;
    }

    let mut running = 0;
    let mut start = None;
    let mut end = None;

    for (run, len) in runs.iter().enumerate() {
        if start.is_none() && location.start < running + len {
            start = Some(RunPoint::new(run, location.start - running));
        }
        if location.end <= running + len {
            end = Some(RunPoint::new(run, location.end - running));
            break;
        }
        running += len;
    }

    Some(RunRange {
        start: start?,
        end: end?,
    })
}
