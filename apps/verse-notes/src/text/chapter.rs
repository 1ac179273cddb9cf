//! Chapter rendering
//!
//! Turns provider verses into anchor subtrees, one per verse.

use tracing::warn;

use super::provider::VerseText;
use crate::annotations::Scope;
use crate::html::{parse_fragment, sanitize_markup, strip_tags, Element};

/// A verse number and its anchor subtree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedVerse {
    pub number: u32,
    pub anchor: Element,
}

/// A rendered chapter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chapter {
    scope: Scope,
    verses: Vec<RenderedVerse>,
}

impl Chapter {
    pub fn new(scope: Scope, verses: Vec<RenderedVerse>) -> Self {
        Self { scope, verses }
    }

    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    pub fn verses(&self) -> &[RenderedVerse] {
        &self.verses
    }

    pub fn verses_mut(&mut self) -> &mut [RenderedVerse] {
        &mut self.verses
    }

    /// Anchor subtree by anchor id
    pub fn anchor(&self, anchor_id: &str) -> Option<&Element> {
        self.verses
            .iter()
            .map(|v| &v.anchor)
            .find(|a| a.attr("id") == Some(anchor_id))
    }

    pub fn anchor_mut(&mut self, anchor_id: &str) -> Option<&mut Element> {
        self.verses
            .iter_mut()
            .map(|v| &mut v.anchor)
            .find(|a| a.attr("id") == Some(anchor_id))
    }

    /// Serialize the chapter with verse numbers outside the anchors
    pub fn to_html(&self) -> String {
        let mut out = format!(
            "<div class=\"chapter\" data-translation=\"{}\" data-book-id=\"{}\" data-chapter=\"{}\">",
            html_escape::encode_double_quoted_attribute(&self.scope.translation),
            self.scope.book_id,
            self.scope.chapter
        );
        for verse in &self.verses {
            out.push_str("<p class=\"verse\"><sup class=\"verse-number\">");
            out.push_str(&verse.number.to_string());
            out.push_str("</sup> ");
            verse.anchor.write_html(&mut out);
            out.push_str("</p>");
        }
        out.push_str("</div>");
        out
    }
}

/// Render one verse into its anchor
///
/// Markup that cannot be parsed falls back to its plain text so the verse
/// still renders and stays annotatable.
pub fn render_verse(scope: &Scope, verse: &VerseText) -> RenderedVerse {
    let parsed = sanitize_markup(&verse.text)
        .map_err(|e| e.to_string())
        .and_then(|clean| parse_fragment("span", &clean).map_err(|e| e.to_string()));

    let mut anchor = match parsed {
        Ok(anchor) => anchor,
        Err(e) => {
            warn!(
                "Falling back to plain text for {} verse {}: {}",
                scope, verse.verse, e
            );
            let text = strip_tags(&verse.text).unwrap_or_else(|_| verse.text.clone());
            Element::new("span").with_text(text)
        }
    };
    anchor.set_attr("class", "verse-text");
    anchor.set_attr("id", scope.anchor(verse.verse).to_string());

    RenderedVerse {
        number: verse.verse,
        anchor,
    }
}

/// Render a chapter's verses in the order given
pub fn render_chapter(scope: &Scope, verses: &[VerseText]) -> Chapter {
    Chapter::new(
        scope.clone(),
        verses.iter().map(|v| render_verse(scope, v)).collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::location::{decode, encode, RunPoint, Selection};

    fn verse(number: u32, text: &str) -> VerseText {
        VerseText {
            verse: number,
            text: text.to_string(),
        }
    }

    fn john() -> Scope {
        Scope::new("KJV", 43, 1)
    }

    #[test]
    fn test_render_chapter_anchors() {
        let chapter = render_chapter(
            &john(),
            &[
                verse(1, "In the beginning was the Word"),
                verse(2, "The same was in the beginning with God."),
            ],
        );

        assert_eq!(chapter.verses().len(), 2);
        let anchor = chapter.anchor("verse-43-1-2").unwrap();
        assert_eq!(anchor.attr("class"), Some("verse-text"));
        assert_eq!(anchor.text_content(), "The same was in the beginning with God.");
        assert!(chapter.anchor("verse-43-1-3").is_none());
    }

    #[test]
    fn test_render_strips_strongs_numbers() {
        let chapter = render_chapter(
            &Scope::new("KJV", 1, 1),
            &[verse(1, "In the beginning<S>7225</S> God<S>430</S> created<sup>a</sup>")],
        );

        let anchor = chapter.anchor("verse-1-1-1").unwrap();
        assert_eq!(anchor.text_content(), "In the beginning God created");
    }

    #[test]
    fn test_offsets_survive_rerender_with_inline_markup() {
        let markup = verse(1, "In <i>the</i> beginning was the <b>Word</b>");
        let first = render_verse(&john(), &markup).anchor;
        let runs = first.text_runs();

        // Select "the beginning" starting inside <i>
        let location = encode(
            &Selection::within("verse-43-1-1", RunPoint::new(1, 0), RunPoint::new(2, 10)),
            &runs,
        )
        .unwrap();
        assert_eq!((location.start, location.end), (3, 16));

        let second = render_verse(&john(), &markup).anchor;
        assert_eq!(second, first);
        assert!(decode(&location, &second.text_runs()).is_some());
    }

    #[test]
    fn test_render_verse_tolerates_broken_markup() {
        let rendered = render_verse(&john(), &verse(5, "In the <i beginning"));

        assert_eq!(rendered.anchor.attr("id"), Some("verse-43-1-5"));
        assert!(rendered.anchor.text_content().starts_with("In the"));
    }

    #[test]
    fn test_chapter_html() {
        let chapter = render_chapter(&john(), &[verse(1, "Grace &amp; truth")]);

        assert_eq!(
            chapter.to_html(),
            "<div class=\"chapter\" data-translation=\"KJV\" data-book-id=\"43\" data-chapter=\"1\">\
             <p class=\"verse\"><sup class=\"verse-number\">1</sup> \
             <span class=\"verse-text\" id=\"verse-43-1-1\">Grace &amp; truth</span></p></div>"
        );
    }

    #[test]
    fn test_anchor_mut() {
        let mut chapter = render_chapter(&john(), &[verse(1, "In the beginning")]);
        chapter
            .anchor_mut("verse-43-1-1")
            .unwrap()
            .set_attr("data-selected", "true");

        assert_eq!(
            chapter.anchor("verse-43-1-1").unwrap().attr("data-selected"),
            Some("true")
        );
    }
}
