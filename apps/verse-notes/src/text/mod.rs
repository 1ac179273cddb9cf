//! Verse text
//!
//! Fetching chapter text from a remote provider, caching it and rendering
//! it into anchor subtrees.

mod cache;
mod chapter;
mod provider;

pub use cache::ChapterCache;
pub use chapter::{render_chapter, render_verse, Chapter, RenderedVerse};
pub use provider::{BollsProvider, ProviderError, TextProvider, VerseText};
