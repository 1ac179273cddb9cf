//! Verse Notes
//!
//! Client-side core for annotating scripture text with highlights and notes.
//!
//! # Modules
//!
//! - `location`: portable `{anchorId, start, end}` locations and the codec
//!   between live selections and those locations
//! - `html`: the anchor subtree adapter, markup sanitizing and overlay rendering
//! - `annotations`: the annotation model, persistence client and store
//! - `text`: remote verse text, chapter rendering and caching

pub mod annotations;
pub mod html;
pub mod location;
pub mod text;

pub use annotations::{
    AnchorId, Annotation, AnnotationError, AnnotationKind, AnnotationStore, ClientConfig,
    DeleteOutcome, HttpPersistence, LoadedAnnotations, PersistenceError, PersistenceService,
    ReaderState, Scope, ValidationError,
};
pub use html::{ApplyReport, Element, Node, OverlayConfig, OverlayError};
pub use location::{Location, RunPoint, RunRange, Selection, SelectionPoint, TextRuns};
pub use text::{BollsProvider, Chapter, ChapterCache, ProviderError, TextProvider, VerseText};
