//! Annotation module
//!
//! Highlights and notes attached to verse ranges.
//!
//! # Features
//!
//! - Annotation model with the JSON wire format shared with browser clients
//! - `PersistenceService` trait with an HTTP implementation
//! - `AnnotationStore`: create, delete, load and re-apply overlays against a
//!   `ReaderState`, discarding responses for chapters no longer shown

mod persistence;
mod store;
mod types;

pub use persistence::{
    ClientConfig, DeleteOutcome, HttpPersistence, PersistenceError, PersistenceService,
};
pub use store::{AnnotationError, AnnotationStore, LoadedAnnotations, ReaderState};
pub use types::{AnchorId, Annotation, AnnotationKind, Scope, ValidationError};
