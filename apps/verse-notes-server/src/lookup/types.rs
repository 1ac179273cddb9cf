//! Definition lookup types

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A word in a verse to define
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DefinitionQuery {
    pub word: String,
    pub translation: String,
    pub book_name: String,
    pub chapter: u32,
    pub verse: u32,
}

impl DefinitionQuery {
    /// Verse reference in the `Book+chapter:verse` form the interlinear search expects
    pub fn verse_ref(&self) -> String {
        format!("{}+{}:{}", self.book_name, self.chapter, self.verse)
    }
}

/// Lexicon entry for a word's Strong's number
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StrongsDefinition {
    pub strongs_number: String,
    pub lexeme: String,
    pub transliteration: String,
    pub definition: String,
}

/// Outcomes when no definition can be produced
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LookupError {
    #[error("Definition not found: {0}")]
    NotFound(String),

    #[error("Upstream request failed: {0}")]
    Upstream(String),

    #[error("Unexpected page structure: {0}")]
    Parse(String),
}

/// Definition lookup trait
#[async_trait]
pub trait DefinitionLookup: Send + Sync {
    async fn lookup(&self, query: &DefinitionQuery) -> Result<StrongsDefinition, LookupError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verse_ref() {
        let query = DefinitionQuery {
            word: "loved".to_string(),
            translation: "KJV".to_string(),
            book_name: "John".to_string(),
            chapter: 3,
            verse: 16,
        };
        assert_eq!(query.verse_ref(), "John+3:16");
    }

    #[test]
    fn test_definition_wire_format() {
        let definition = StrongsDefinition {
            strongs_number: "G25".to_string(),
            lexeme: "ἀγαπάω".to_string(),
            transliteration: "agapaō".to_string(),
            definition: "to love".to_string(),
        };

        let json = serde_json::to_value(&definition).unwrap();
        assert_eq!(json["strongsNumber"], "G25");
        assert_eq!(json["transliteration"], "agapaō");
    }
}
