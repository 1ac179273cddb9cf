//! Location types

use serde::{Deserialize, Serialize};

/// Portable location of a text range inside one anchor
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    /// Anchor (verse) identifier
    pub anchor_id: String,
    /// Start offset, inclusive
    pub start: usize,
    /// End offset, exclusive
    pub end: usize,
}

impl Location {
    pub fn new(anchor_id: impl Into<String>, start: usize, end: usize) -> Self {
        Self {
            anchor_id: anchor_id.into(),
            start,
            end,
        }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }
}

/// Lengths of an anchor's text nodes in document order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextRuns {
    lengths: Vec<usize>,
}

impl TextRuns {
    pub fn new(lengths: Vec<usize>) -> Self {
        Self { lengths }
    }

    /// Build runs from text node contents, measured in UTF-16 code units
    pub fn from_texts<'a, I>(texts: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        Self {
            lengths: texts
                .into_iter()
                .map(|t| t.encode_utf16().count())
                .collect(),
        }
    }

    /// Number of runs
    pub fn len(&self) -> usize {
        self.lengths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lengths.is_empty()
    }

    pub fn run_len(&self, run: usize) -> Option<usize> {
        self.lengths.get(run).copied()
    }

    /// Length of the concatenated text
    pub fn total_len(&self) -> usize {
        self.lengths.iter().sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.lengths.iter().copied()
    }

    /// Absolute offset of a point, or `None` if the point lies outside every run
    pub fn offset_of(&self, point: RunPoint) -> Option<usize> {
        let len = self.run_len(point.run)?;
        if point.offset > len {
            return None;
        }
        Some(self.lengths[..point.run].iter().sum::<usize>() + point.offset)
    }
}

/// A position inside one text run: "node and offset within a text node"
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunPoint {
    pub run: usize,
    pub offset: usize,
}

impl RunPoint {
    pub fn new(run: usize, offset: usize) -> Self {
        Self { run, offset }
    }
}

/// A live range resolved against an anchor's text runs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunRange {
    pub start: RunPoint,
    pub end: RunPoint,
}

/// One endpoint of a user selection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionPoint {
    /// Anchor whose subtree contains the endpoint
    pub anchor_id: String,
    /// Text node index within the anchor, document order
    pub run: usize,
    /// Offset within that text node
    pub offset: usize,
}

impl SelectionPoint {
    pub fn new(anchor_id: impl Into<String>, run: usize, offset: usize) -> Self {
        Self {
            anchor_id: anchor_id.into(),
            run,
            offset,
        }
    }

    pub fn point(&self) -> RunPoint {
        RunPoint::new(self.run, self.offset)
    }
}

/// A live text selection as reported by the rendering surface
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub start: SelectionPoint,
    pub end: SelectionPoint,
}

impl Selection {
    pub fn new(start: SelectionPoint, end: SelectionPoint) -> Self {
        Self { start, end }
    }

    /// Selection whose endpoints both lie in one anchor
    pub fn within(anchor_id: &str, start: RunPoint, end: RunPoint) -> Self {
        Self {
            start: SelectionPoint::new(anchor_id, start.run, start.offset),
            end: SelectionPoint::new(anchor_id, end.run, end.offset),
        }
    }

    pub fn anchor_id(&self) -> &str {
        &self.start.anchor_id
    }

    pub fn spans_anchors(&self) -> bool {
        self.start.anchor_id != self.end.anchor_id
    }

    pub fn is_collapsed(&self) -> bool {
        !self.spans_anchors() && self.start.point() == self.end.point()
    }
}
