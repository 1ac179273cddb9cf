//! Annotation types
//!
//! Field names match the JSON objects browser clients already exchange with
//! the persistence service (`type`, `verseId`, `bookId`).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::location::Location;

/// Kind of annotation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnnotationKind {
    /// Text highlight
    Highlight,
    /// Highlight carrying a note body
    Note,
}

impl AnnotationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnnotationKind::Highlight => "highlight",
            AnnotationKind::Note => "note",
        }
    }

    /// Prefix for generated ids
    fn id_prefix(&self) -> &'static str {
        match self {
            AnnotationKind::Highlight => "h",
            AnnotationKind::Note => "n",
        }
    }
}

impl fmt::Display for AnnotationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AnnotationKind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "highlight" => Ok(AnnotationKind::Highlight),
            "note" => Ok(AnnotationKind::Note),
            other => Err(ValidationError::UnknownKind(other.to_string())),
        }
    }
}

/// The displayed chapter: translation, book and chapter
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scope {
    pub translation: String,
    pub book_id: u32,
    pub chapter: u32,
}

impl Scope {
    pub fn new(translation: impl Into<String>, book_id: u32, chapter: u32) -> Self {
        Self {
            translation: translation.into(),
            book_id,
            chapter,
        }
    }

    /// Anchor id of a verse in this chapter
    pub fn anchor(&self, verse: u32) -> AnchorId {
        AnchorId::new(self.book_id, self.chapter, verse)
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}:{}", self.translation, self.book_id, self.chapter)
    }
}

/// Identifier of a verse anchor, rendered as `verse-{book}-{chapter}-{verse}`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AnchorId {
    pub book_id: u32,
    pub chapter: u32,
    pub verse: u32,
}

impl AnchorId {
    pub fn new(book_id: u32, chapter: u32, verse: u32) -> Self {
        Self {
            book_id,
            chapter,
            verse,
        }
    }
}

impl fmt::Display for AnchorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "verse-{}-{}-{}", self.book_id, self.chapter, self.verse)
    }
}

impl FromStr for AnchorId {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ValidationError::InvalidAnchor(s.to_string());

        let rest = s.strip_prefix("verse-").ok_or_else(invalid)?;
        let mut parts = rest.split('-').map(|p| p.parse::<u32>().map_err(|_| invalid()));

        let book_id = parts.next().ok_or_else(invalid)??;
        let chapter = parts.next().ok_or_else(invalid)??;
        let verse = parts.next().ok_or_else(invalid)??;
        if parts.next().is_some() {
            return Err(invalid());
        }

        Ok(Self::new(book_id, chapter, verse))
    }
}

/// Reasons an annotation is rejected
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Annotation id is empty")]
    EmptyId,

    #[error("Translation is empty")]
    EmptyTranslation,

    #[error("Invalid range: start {start} must be less than end {end}")]
    InvalidRange { start: usize, end: usize },

    #[error("Note annotations need a non-empty note")]
    MissingNote,

    #[error("Highlight annotations carry no note")]
    UnexpectedNote,

    #[error("Invalid anchor id: {0}")]
    InvalidAnchor(String),

    #[error("Anchor {anchor} is outside book {book_id} chapter {chapter}")]
    ScopeMismatch {
        anchor: String,
        book_id: u32,
        chapter: u32,
    },

    #[error("Unknown annotation kind: {0}")]
    UnknownKind(String),
}

/// A highlight or note attached to a range of one verse
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Annotation {
    /// Client-generated identifier
    pub id: String,
    #[serde(rename = "type", alias = "kind")]
    pub kind: AnnotationKind,
    /// Anchor the range belongs to
    #[serde(rename = "verseId", alias = "anchorId")]
    pub anchor_id: String,
    /// Start offset, inclusive
    pub start: usize,
    /// End offset, exclusive
    pub end: usize,
    /// Note body, present only on notes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    pub translation: String,
    #[serde(rename = "bookId")]
    pub book_id: u32,
    pub chapter: u32,
}

impl Annotation {
    /// Create an annotation with a fresh id in the given scope
    pub fn new(
        kind: AnnotationKind,
        location: Location,
        scope: &Scope,
        note: Option<String>,
    ) -> Self {
        Self {
            id: format!("{}-{}", kind.id_prefix(), Uuid::new_v4().simple()),
            kind,
            anchor_id: location.anchor_id,
            start: location.start,
            end: location.end,
            note,
            translation: scope.translation.clone(),
            book_id: scope.book_id,
            chapter: scope.chapter,
        }
    }

    pub fn location(&self) -> Location {
        Location::new(self.anchor_id.clone(), self.start, self.end)
    }

    pub fn scope(&self) -> Scope {
        Scope::new(self.translation.clone(), self.book_id, self.chapter)
    }

    /// Check the record is internally consistent
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.id.trim().is_empty() {
            return Err(ValidationError::EmptyId);
        }
        if self.translation.trim().is_empty() {
            return Err(ValidationError::EmptyTranslation);
        }
        if self.start >= self.end {
            return Err(ValidationError::InvalidRange {
                start: self.start,
                end: self.end,
            });
        }

        let has_note = self.note.as_deref().is_some_and(|n| !n.trim().is_empty());
        match self.kind {
            AnnotationKind::Note if !has_note => return Err(ValidationError::MissingNote),
            AnnotationKind::Highlight if self.note.is_some() => {
                return Err(ValidationError::UnexpectedNote)
            }
            _ => {}
        }

        let anchor: AnchorId = self.anchor_id.parse()?;
        if anchor.book_id != self.book_id || anchor.chapter != self.chapter {
            return Err(ValidationError::ScopeMismatch {
                anchor: self.anchor_id.clone(),
                book_id: self.book_id,
                chapter: self.chapter,
            });
        }

        Ok(())
    }
}
