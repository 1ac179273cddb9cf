//! Anchor subtree handling
//!
//! Parsing verse markup into an owned tree, sanitizing provider markup and
//! rendering annotation overlays onto anchors.

mod overlay;
mod sanitize;
mod tree;

pub use overlay::{
    apply_all, apply_overlay, clear_overlays, remove_overlay, ApplyReport, OverlayConfig,
    OverlayError,
};
pub use sanitize::{sanitize_markup, strip_tags, SanitizeError};
pub use tree::{parse_fragment, utf16_len, Element, MarkupError, Node};
