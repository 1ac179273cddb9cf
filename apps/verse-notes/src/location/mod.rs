//! Location module
//!
//! Converts between live text selections and portable locations.
//!
//! Offsets are UTF-16 code units over the anchor's text nodes in document
//! order. Inline markup contributes no characters, so a location stays valid
//! for any re-render that reproduces the same text.

mod codec;
mod types;

pub use codec::{decode, encode};
pub use types::{Location, RunPoint, RunRange, Selection, SelectionPoint, TextRuns};
