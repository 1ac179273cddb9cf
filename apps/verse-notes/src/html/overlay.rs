//! Overlay rendering
//!
//! Re-applies stored annotations to freshly rendered anchor subtrees and
//! removes them again. Every pass works from the text runs of the anchor,
//! never from overlays applied earlier, so wrappers already present do not
//! shift later offsets.

use tracing::warn;

use super::tree::{Element, Node};
use crate::annotations::{Annotation, AnnotationKind};
use crate::location::decode;

/// Configuration for overlay elements
#[derive(Debug, Clone)]
pub struct OverlayConfig {
    /// Tag used for wrappers and markers
    pub tag: String,
    /// Class for highlight wrappers
    pub highlight_class: String,
    /// Class for note wrappers
    pub note_class: String,
    /// Class for the zero-width note marker
    pub marker_class: String,
    /// Data attribute carrying the annotation id
    pub id_attribute: String,
    /// Data attribute carrying the note body on the marker
    pub note_attribute: String,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            tag: "span".to_string(),
            highlight_class: "highlight".to_string(),
            note_class: "note".to_string(),
            marker_class: "note-marker".to_string(),
            id_attribute: "data-annotation-id".to_string(),
            note_attribute: "data-note".to_string(),
        }
    }
}

/// Errors applying a single overlay
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OverlayError {
    #[error("Stale location for annotation {id}: [{start}, {end}) does not fit anchor text of length {len}")]
    StaleLocation {
        id: String,
        start: usize,
        end: usize,
        len: usize,
    },

    #[error("Annotation {id} belongs to {expected}, not {actual}")]
    AnchorMismatch {
        id: String,
        expected: String,
        actual: String,
    },
}

/// Outcome of applying a batch of overlays
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplyReport {
    /// Ids applied, in application order
    pub applied: Vec<String>,
    /// Ids skipped because their location no longer resolves
    pub stale: Vec<String>,
}

impl ApplyReport {
    pub fn merge(&mut self, other: ApplyReport) {
        self.applied.extend(other.applied);
        self.stale.extend(other.stale);
    }
}

/// Build the wrapper and, for notes, the marker for an annotation
fn overlay_elements(annotation: &Annotation, config: &OverlayConfig) -> (Element, Option<Node>) {
    let class = match annotation.kind {
        AnnotationKind::Highlight => &config.highlight_class,
        AnnotationKind::Note => &config.note_class,
    };
    let wrapper = Element::new(&config.tag)
        .with_attr("class", class.as_str())
        .with_attr(&config.id_attribute, annotation.id.as_str());

    let marker = match (annotation.kind, &annotation.note) {
        (AnnotationKind::Note, note) => Some(Node::Element(
            Element::new(&config.tag)
                .with_attr("class", config.marker_class.as_str())
                .with_attr(&config.id_attribute, annotation.id.as_str())
                .with_attr(&config.note_attribute, note.clone().unwrap_or_default()),
        )),
        (AnnotationKind::Highlight, _) => None,
    };

    (wrapper, marker)
}

/// Apply one annotation's overlay to its anchor
pub fn apply_overlay(
    anchor: &mut Element,
    annotation: &Annotation,
    config: &OverlayConfig,
) -> Result<(), OverlayError> {
    let actual = anchor.attr("id").unwrap_or_default();
    if actual != annotation.anchor_id {
        return Err(OverlayError::AnchorMismatch {
            id: annotation.id.clone(),
            expected: annotation.anchor_id.clone(),
            actual: actual.to_string(),
        });
    }

    let runs = anchor.text_runs();
    let stale = || OverlayError::StaleLocation {
        id: annotation.id.clone(),
        start: annotation.start,
        end: annotation.end,
        len: runs.total_len(),
    };

    let range = decode(&annotation.location(), &runs).ok_or_else(stale)?;
    let start = runs.offset_of(range.start).ok_or_else(stale)?;
    let end = runs.offset_of(range.end).ok_or_else(stale)?;

    // Earlier overlays stay whole; the new wrapper is split to nest inside them
    let is_wrapper = |el: &Element| {
        el.attr(&config.id_attribute).is_some() && !el.has_class(&config.marker_class)
    };
    let (wrapper, marker) = overlay_elements(annotation, config);
    if anchor.surround_nested(start, end, wrapper, marker, &is_wrapper) {
        Ok(())
    } else {
        Err(stale())
    }
}

/// Apply annotations in order, skipping (and logging) the ones that no longer resolve
pub fn apply_all<'a, I>(anchor: &mut Element, annotations: I, config: &OverlayConfig) -> ApplyReport
where
    I: IntoIterator<Item = &'a Annotation>,
{
    let mut report = ApplyReport::default();
    for annotation in annotations {
        match apply_overlay(anchor, annotation, config) {
            Ok(()) => report.applied.push(annotation.id.clone()),
            Err(e) => {
                warn!("Skipping overlay: {}", e);
                report.stale.push(annotation.id.clone());
            }
        }
    }
    report
}

/// Remove one annotation's overlay, unwrapping its text back into place
///
/// Returns the number of elements removed or unwrapped; a wrapper split by a
/// later overlapping overlay counts once per piece.
pub fn remove_overlay(anchor: &mut Element, id: &str, config: &OverlayConfig) -> usize {
    let is_marker = |el: &Element| {
        el.attr(&config.id_attribute) == Some(id) && el.has_class(&config.marker_class)
    };
    let is_wrapper = |el: &Element| el.attr(&config.id_attribute) == Some(id);

    let count = anchor.remove_where(&is_marker) + anchor.unwrap_where(&is_wrapper);
    anchor.normalize();
    count
}

/// Remove every overlay from an anchor
pub fn clear_overlays(anchor: &mut Element, config: &OverlayConfig) -> usize {
    let is_marker = |el: &Element| {
        el.attr(&config.id_attribute).is_some() && el.has_class(&config.marker_class)
    };
    let is_wrapper = |el: &Element| el.attr(&config.id_attribute).is_some();

    let count = anchor.remove_where(&is_marker) + anchor.unwrap_where(&is_wrapper);
    anchor.normalize();
    count
}
