//! Strong's definition lookup
//!
//! A sibling feature of the annotation service: given a word in a verse,
//! find its Strong's number and lexicon entry. The annotation routes never
//! depend on it.

mod blue_letter;
mod types;

pub use blue_letter::{find_strongs_link, parse_lexicon, BlueLetterBible};
pub use types::{DefinitionLookup, DefinitionQuery, LookupError, StrongsDefinition};
