//! Annotation store
//!
//! Ties the location codec, the overlay renderer and a persistence service
//! together. All view state lives in a [`ReaderState`] that callers pass in
//! by exclusive reference, so no two overlay passes can touch the same
//! chapter at once.

use tracing::{debug, info, warn};

use super::persistence::{DeleteOutcome, PersistenceError, PersistenceService};
use super::types::{Annotation, AnnotationKind, Scope};
use crate::html::{apply_all, apply_overlay, clear_overlays, remove_overlay, ApplyReport};
use crate::html::{OverlayConfig, OverlayError};
use crate::location::{encode, Selection};
use crate::text::Chapter;

/// Errors surfaced by store operations
#[derive(Debug, thiserror::Error)]
pub enum AnnotationError {
    #[error("Invalid selection: {0}")]
    InvalidSelection(String),

    #[error("Note body is empty")]
    EmptyNote,

    #[error(transparent)]
    StaleLocation(#[from] OverlayError),

    #[error("Annotation {0} already exists")]
    PersistenceConflict(String),

    #[error("Persistence failed: {0}")]
    Persistence(PersistenceError),
}

impl AnnotationError {
    /// Whether retrying the same action could succeed
    ///
    /// Only transport failures and server-side (5xx) errors qualify.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            AnnotationError::Persistence(PersistenceError::Transport(_))
                | AnnotationError::Persistence(PersistenceError::Status { status: 500.., .. })
        )
    }
}

impl From<PersistenceError> for AnnotationError {
    fn from(e: PersistenceError) -> Self {
        match e {
            PersistenceError::Conflict(id) => AnnotationError::PersistenceConflict(id),
            other => AnnotationError::Persistence(other),
        }
    }
}

/// What the reader currently shows
#[derive(Debug, Default)]
pub struct ReaderState {
    chapter: Option<Chapter>,
    annotations: Vec<Annotation>,
    selection: Option<Selection>,
}

impl ReaderState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Display a freshly rendered chapter, resetting annotations and selection
    pub fn show_chapter(&mut self, chapter: Chapter) {
        self.chapter = Some(chapter);
        self.annotations.clear();
        self.selection = None;
    }

    pub fn scope(&self) -> Option<&Scope> {
        self.chapter.as_ref().map(Chapter::scope)
    }

    pub fn chapter(&self) -> Option<&Chapter> {
        self.chapter.as_ref()
    }

    /// Annotations currently applied, in application order
    pub fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }

    pub fn select(&mut self, selection: Selection) {
        self.selection = Some(selection);
    }

    pub fn selection(&self) -> Option<&Selection> {
        self.selection.as_ref()
    }

    /// Drop the pending selection
    pub fn close_modal(&mut self) {
        self.selection = None;
    }
}

/// Annotations fetched for a scope, not yet applied
#[derive(Debug, Clone)]
pub struct LoadedAnnotations {
    pub scope: Scope,
    pub annotations: Vec<Annotation>,
}

/// Annotation operations over a persistence service
pub struct AnnotationStore<P> {
    service: P,
    overlay: OverlayConfig,
}

impl<P: PersistenceService> AnnotationStore<P> {
    pub fn new(service: P) -> Self {
        Self::with_overlay_config(service, OverlayConfig::default())
    }

    pub fn with_overlay_config(service: P, overlay: OverlayConfig) -> Self {
        Self { service, overlay }
    }

    pub fn service(&self) -> &P {
        &self.service
    }

    pub fn overlay_config(&self) -> &OverlayConfig {
        &self.overlay
    }

    /// All annotations stored for a scope; an empty list is not an error
    pub async fn load_annotations(&self, scope: &Scope) -> Result<Vec<Annotation>, AnnotationError> {
        Ok(self.service.list(scope).await?)
    }

    /// Fetch annotations, tagged with the scope they were requested for
    pub async fn fetch(&self, scope: &Scope) -> Result<LoadedAnnotations, AnnotationError> {
        let annotations = self.load_annotations(scope).await?;
        Ok(LoadedAnnotations {
            scope: scope.clone(),
            annotations,
        })
    }

    /// Apply fetched annotations if they still match the displayed chapter
    ///
    /// Returns `None` and leaves the state untouched when the response is
    /// for a scope that is no longer displayed.
    pub fn apply_loaded(
        &self,
        state: &mut ReaderState,
        loaded: LoadedAnnotations,
    ) -> Option<ApplyReport> {
        let Some(chapter) = state.chapter.as_mut() else {
            debug!("Discarding annotations for {}: no chapter displayed", loaded.scope);
            return None;
        };
        if chapter.scope() != &loaded.scope {
            debug!(
                "Discarding stale annotations for {} while showing {}",
                loaded.scope,
                chapter.scope()
            );
            return None;
        }

        let mut report = ApplyReport::default();
        for verse in chapter.verses_mut() {
            clear_overlays(&mut verse.anchor, &self.overlay);

            let anchor_id = verse.anchor.attr("id").unwrap_or_default().to_string();
            let for_anchor = loaded
                .annotations
                .iter()
                .filter(|a| a.anchor_id == anchor_id);
            report.merge(apply_all(&mut verse.anchor, for_anchor, &self.overlay));
        }

        for annotation in &loaded.annotations {
            if chapter.anchor(&annotation.anchor_id).is_none() {
                warn!(
                    "Skipping overlay {}: anchor {} not in chapter",
                    annotation.id, annotation.anchor_id
                );
                report.stale.push(annotation.id.clone());
            }
        }

        info!(
            "Applied {} annotations to {} ({} stale)",
            report.applied.len(),
            loaded.scope,
            report.stale.len()
        );
        state.annotations = loaded.annotations;
        Some(report)
    }

    /// Load and apply every annotation of a scope, starting from plain anchors
    pub async fn reapply_all(
        &self,
        state: &mut ReaderState,
        scope: &Scope,
    ) -> Result<Option<ApplyReport>, AnnotationError> {
        let loaded = self.fetch(scope).await?;
        Ok(self.apply_loaded(state, loaded))
    }

    /// Create, persist and apply an annotation for the pending selection
    ///
    /// The overlay is rendered on a copy of the anchor first; the live anchor
    /// only changes after the service accepts the annotation. The selection
    /// is kept on failure so the action can be retried.
    pub async fn create_annotation(
        &self,
        state: &mut ReaderState,
        kind: AnnotationKind,
        note: Option<&str>,
    ) -> Result<Annotation, AnnotationError> {
        let selection = state
            .selection
            .clone()
            .ok_or_else(|| AnnotationError::InvalidSelection("nothing selected".to_string()))?;
        let chapter = state
            .chapter
            .as_mut()
            .ok_or_else(|| AnnotationError::InvalidSelection("no chapter displayed".to_string()))?;
        let scope = chapter.scope().clone();
        let anchor = chapter.anchor_mut(selection.anchor_id()).ok_or_else(|| {
            AnnotationError::InvalidSelection(format!("unknown anchor {}", selection.anchor_id()))
        })?;

        let location = encode(&selection, &anchor.text_runs()).ok_or_else(|| {
            AnnotationError::InvalidSelection(
                "selection is empty, spans verses or cannot be resolved".to_string(),
            )
        })?;

        let note = match kind {
            AnnotationKind::Note => match note.map(str::trim) {
                Some(body) if !body.is_empty() => Some(body.to_string()),
                _ => return Err(AnnotationError::EmptyNote),
            },
            AnnotationKind::Highlight => None,
        };

        let annotation = Annotation::new(kind, location, &scope, note);

        let mut rendered = anchor.clone();
        apply_overlay(&mut rendered, &annotation, &self.overlay)?;

        let stored = self.service.insert(&annotation).await?;
        *anchor = rendered;

        info!("Created {} {} on {}", stored.kind, stored.id, stored.anchor_id);
        state.annotations.push(stored.clone());
        state.selection = None;
        Ok(stored)
    }

    /// Delete an annotation and remove its overlay
    ///
    /// A "not found" answer still removes whatever overlay is shown.
    pub async fn delete_annotation(
        &self,
        state: &mut ReaderState,
        id: &str,
    ) -> Result<DeleteOutcome, AnnotationError> {
        let outcome = self.service.delete(id).await?;
        if outcome == DeleteOutcome::NotFound {
            debug!("Annotation {} was already absent", id);
        }

        let anchor_id = state
            .annotations
            .iter()
            .find(|a| a.id == id)
            .map(|a| a.anchor_id.clone());

        if let Some(chapter) = state.chapter.as_mut() {
            let known = anchor_id.is_some_and(|anchor_id| {
                chapter
                    .anchor_mut(&anchor_id)
                    .map(|anchor| remove_overlay(anchor, id, &self.overlay))
                    .is_some()
            });
            if !known {
                for verse in chapter.verses_mut() {
                    remove_overlay(&mut verse.anchor, id, &self.overlay);
                }
            }
        }

        state.annotations.retain(|a| a.id != id);
        Ok(outcome)
    }
}
