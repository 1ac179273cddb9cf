//! Blue Letter Bible definition lookup
//!
//! Two page fetches: the interlinear search for the verse, which links each
//! word to its Strong's entry, then the lexicon page for that entry. Both
//! pages are scraped with lol_html selectors.

use std::cell::RefCell;
use std::time::Duration;

use async_trait::async_trait;
use lol_html::{element, rewrite_str, text, RewriteStrSettings};
use tracing::{debug, warn};

use super::types::{DefinitionLookup, DefinitionQuery, LookupError, StrongsDefinition};

/// Blue Letter Bible scraper
pub struct BlueLetterBible {
    client: reqwest::Client,
    base_url: String,
}

impl BlueLetterBible {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, LookupError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LookupError::Upstream(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn search_url(&self, query: &DefinitionQuery) -> String {
        format!(
            "{}/search/preSearch.cfm?Criteria={}&t={}&ss=1&source=from_interlinear&fromverse={}",
            self.base_url,
            urlencoding::encode(&query.word),
            urlencoding::encode(&query.translation),
            urlencoding::encode(&query.verse_ref())
        )
    }

    fn absolute_url(&self, href: &str) -> String {
        if href.starts_with("http://") || href.starts_with("https://") {
            href.to_string()
        } else {
            format!("{}{}", self.base_url, href)
        }
    }

    async fn fetch_page(&self, url: &str) -> Result<String, LookupError> {
        debug!("Fetching {}", url);
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| LookupError::Upstream(e.to_string()))?;

        if !response.status().is_success() {
            warn!("Lexicon source returned {} for {}", response.status(), url);
            return Err(LookupError::Upstream(format!(
                "non-200 status: {}",
                response.status().as_u16()
            )));
        }

        response
            .text()
            .await
            .map_err(|e| LookupError::Upstream(e.to_string()))
    }
}

#[async_trait]
impl DefinitionLookup for BlueLetterBible {
    async fn lookup(&self, query: &DefinitionQuery) -> Result<StrongsDefinition, LookupError> {
        let search = self.fetch_page(&self.search_url(query)).await?;

        let href = find_strongs_link(&search, &query.word)?.ok_or_else(|| {
            LookupError::NotFound(format!(
                "no Strong's link for '{}' in {}",
                query.word,
                query.verse_ref()
            ))
        })?;

        let lexicon = self.fetch_page(&self.absolute_url(&href)).await?;
        parse_lexicon(&lexicon)
    }
}

fn rewrite_error(e: impl std::fmt::Display) -> LookupError {
    LookupError::Parse(e.to_string())
}

fn decode_text(raw: &str) -> String {
    html_escape::decode_html_entities(raw).trim().to_string()
}

/// Find the Strong's link on the interlinear row whose word cell contains `word`
///
/// Matching is case-insensitive and by substring, so punctuation attached to
/// the word in the translation ("men.") still matches.
pub fn find_strongs_link(html: &str, word: &str) -> Result<Option<String>, LookupError> {
    let row = RefCell::new(0usize);
    // (row, word cell text)
    let cells: RefCell<Vec<(usize, String)>> = RefCell::new(Vec::new());
    // (row, href)
    let links: RefCell<Vec<(usize, String)>> = RefCell::new(Vec::new());

    rewrite_str(
        html,
        RewriteStrSettings {
            element_content_handlers: vec![
                element!("tr", |_el| {
                    *row.borrow_mut() += 1;
                    Ok(())
                }),
                element!("td.calque-processed", |_el| {
                    cells.borrow_mut().push((*row.borrow(), String::new()));
                    Ok(())
                }),
                text!("td.calque-processed", |t| {
                    if let Some((_, text)) = cells.borrow_mut().last_mut() {
                        text.push_str(t.as_str());
                    }
                    Ok(())
                }),
                element!("td.strongs-num-unprocessed a[href]", |el| {
                    if let Some(href) = el.get_attribute("href") {
                        links.borrow_mut().push((*row.borrow(), href));
                    }
                    Ok(())
                }),
            ],
            ..RewriteStrSettings::default()
        },
    )
    .map_err(rewrite_error)?;

    let needle = word.to_lowercase();
    let links = links.into_inner();

    let found = cells
        .into_inner()
        .into_iter()
        .filter(|(_, text)| decode_text(text).to_lowercase().contains(&needle))
        .find_map(|(row, _)| {
            links
                .iter()
                .find(|(link_row, _)| *link_row == row)
                .map(|(_, href)| href.clone())
        });

    Ok(found)
}

/// Scrape a lexicon page
pub fn parse_lexicon(html: &str) -> Result<StrongsDefinition, LookupError> {
    let heading = RefCell::new(String::new());
    let lexemes = RefCell::new((0usize, String::new()));
    let translits = RefCell::new((0usize, String::new()));
    let paragraphs: RefCell<Vec<String>> = RefCell::new(Vec::new());
    let whole = RefCell::new(String::new());

    rewrite_str(
        html,
        RewriteStrSettings {
            element_content_handlers: vec![
                text!("#lexicon-head h1", |t| {
                    heading.borrow_mut().push_str(t.as_str());
                    Ok(())
                }),
                element!(".lex-lemma-head .lexeme", |_el| {
                    lexemes.borrow_mut().0 += 1;
                    Ok(())
                }),
                text!(".lex-lemma-head .lexeme", |t| {
                    let mut lexemes = lexemes.borrow_mut();
                    if lexemes.0 == 1 {
                        lexemes.1.push_str(t.as_str());
                    }
                    Ok(())
                }),
                element!(".lex-lemma-head .translit", |_el| {
                    translits.borrow_mut().0 += 1;
                    Ok(())
                }),
                text!(".lex-lemma-head .translit", |t| {
                    let mut translits = translits.borrow_mut();
                    if translits.0 == 1 {
                        translits.1.push_str(t.as_str());
                    }
                    Ok(())
                }),
                element!("#lexDef p", |_el| {
                    paragraphs.borrow_mut().push(String::new());
                    Ok(())
                }),
                text!("#lexDef p", |t| {
                    if let Some(p) = paragraphs.borrow_mut().last_mut() {
                        p.push_str(t.as_str());
                    }
                    Ok(())
                }),
                text!("#lexDef", |t| {
                    whole.borrow_mut().push_str(t.as_str());
                    Ok(())
                }),
            ],
            ..RewriteStrSettings::default()
        },
    )
    .map_err(rewrite_error)?;

    let strongs_number = decode_text(&heading.into_inner());
    if strongs_number.is_empty() {
        return Err(LookupError::Parse("lexicon page has no heading".to_string()));
    }

    let paragraphs: Vec<String> = paragraphs
        .into_inner()
        .iter()
        .map(|p| html_escape::decode_html_entities(p).into_owned())
        .collect();
    let mut definition = paragraphs.join("\n\n").trim().to_string();
    if definition.is_empty() {
        definition = decode_text(&whole.into_inner());
    }

    Ok(StrongsDefinition {
        strongs_number,
        lexeme: decode_text(&lexemes.into_inner().1),
        transliteration: decode_text(&translits.into_inner().1),
        definition,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{extract::Query, http::StatusCode, response::Html, routing::get, Router};
    use std::collections::HashMap;

    const SEARCH_PAGE: &str = r#"
        <html><body><table id="interlinearTable">
          <tr>
            <td class="strongs-num-unprocessed"><a href="/lexicon/g3779/kjv/tr/0-1/">G3779</a></td>
            <td class="calque-processed">For God so</td>
          </tr>
          <tr>
            <td class="calque-processed">the world,</td>
            <td class="strongs-num-unprocessed"><a href="/lexicon/g2889/kjv/tr/0-1/">G2889</a></td>
          </tr>
          <tr>
            <td class="calque-processed">Loved</td>
          </tr>
          <tr>
            <td class="calque-processed">loved</td>
            <td class="strongs-num-unprocessed"><a href="/lexicon/g25/kjv/tr/0-1/">G25</a></td>
          </tr>
        </table></body></html>
    "#;

    const LEXICON_PAGE: &str = r#"
        <html><body>
          <div id="lexicon-head"><h1> G25 </h1></div>
          <div class="lex-lemma-head">
            <span class="lexeme">ἀγαπάω</span>
            <span class="translit">agapaō</span>
          </div>
          <div class="lex-lemma-head">
            <span class="lexeme">second</span>
          </div>
          <div id="lexDef">
            <p>of persons: to welcome, to entertain, to be fond of</p>
            <p>of things: to be well pleased, to be contented at &amp; with</p>
          </div>
        </body></html>
    "#;

    #[test]
    fn test_find_strongs_link_skips_rows_without_link() {
        // "Loved" on row 3 matches first but has no link
        let href = find_strongs_link(SEARCH_PAGE, "LOVED").unwrap();
        assert_eq!(href.as_deref(), Some("/lexicon/g25/kjv/tr/0-1/"));
    }

    #[test]
    fn test_find_strongs_link_matches_with_punctuation() {
        let href = find_strongs_link(SEARCH_PAGE, "world").unwrap();
        assert_eq!(href.as_deref(), Some("/lexicon/g2889/kjv/tr/0-1/"));
    }

    #[test]
    fn test_find_strongs_link_missing_word() {
        assert_eq!(find_strongs_link(SEARCH_PAGE, "begotten").unwrap(), None);
    }

    #[test]
    fn test_parse_lexicon() {
        let definition = parse_lexicon(LEXICON_PAGE).unwrap();

        assert_eq!(definition.strongs_number, "G25");
        assert_eq!(definition.lexeme, "ἀγαπάω");
        assert_eq!(definition.transliteration, "agapaō");
        assert_eq!(
            definition.definition,
            "of persons: to welcome, to entertain, to be fond of\n\n\
             of things: to be well pleased, to be contented at & with"
        );
    }

    #[test]
    fn test_parse_lexicon_without_paragraphs() {
        let page = r#"<div id="lexicon-head"><h1>H157</h1></div>
                      <div id="lexDef"> to love, to like </div>"#;
        let definition = parse_lexicon(page).unwrap();

        assert_eq!(definition.strongs_number, "H157");
        assert_eq!(definition.definition, "to love, to like");
        assert_eq!(definition.lexeme, "");
    }

    #[test]
    fn test_parse_lexicon_without_heading() {
        assert!(matches!(
            parse_lexicon("<html><body>Maintenance</body></html>"),
            Err(LookupError::Parse(_))
        ));
    }

    #[test]
    fn test_search_url() {
        let blb = BlueLetterBible::new("https://www.blueletterbible.org/", Duration::from_secs(1))
            .unwrap();
        let query = DefinitionQuery {
            word: "loved".to_string(),
            translation: "KJV".to_string(),
            book_name: "John".to_string(),
            chapter: 3,
            verse: 16,
        };

        assert_eq!(
            blb.search_url(&query),
            "https://www.blueletterbible.org/search/preSearch.cfm?Criteria=loved&t=KJV&ss=1\
             &source=from_interlinear&fromverse=John%2B3%3A16"
        );
        assert_eq!(
            blb.absolute_url("/lexicon/g25/kjv/tr/0-1/"),
            "https://www.blueletterbible.org/lexicon/g25/kjv/tr/0-1/"
        );
    }

    /// Serve the fixture pages from a local stand-in for the lexicon site
    async fn fixture_site(search_status: StatusCode) -> String {
        let app = Router::new()
            .route(
                "/search/preSearch.cfm",
                get(move |Query(params): Query<HashMap<String, String>>| async move {
                    assert_eq!(params.get("fromverse").map(String::as_str), Some("John+3:16"));
                    (search_status, Html(SEARCH_PAGE))
                }),
            )
            .route(
                "/lexicon/g25/kjv/tr/0-1/",
                get(|| async { Html(LEXICON_PAGE) }),
            );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    fn query(word: &str) -> DefinitionQuery {
        DefinitionQuery {
            word: word.to_string(),
            translation: "KJV".to_string(),
            book_name: "John".to_string(),
            chapter: 3,
            verse: 16,
        }
    }

    #[tokio::test]
    async fn test_lookup_against_local_site() {
        let base = fixture_site(StatusCode::OK).await;
        let blb = BlueLetterBible::new(&base, Duration::from_secs(5)).unwrap();

        let definition = blb.lookup(&query("loved")).await.unwrap();
        assert_eq!(definition.strongs_number, "G25");

        let err = blb.lookup(&query("begotten")).await.unwrap_err();
        assert!(matches!(err, LookupError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_lookup_upstream_failure() {
        let base = fixture_site(StatusCode::SERVICE_UNAVAILABLE).await;
        let blb = BlueLetterBible::new(&base, Duration::from_secs(5)).unwrap();

        let err = blb.lookup(&query("loved")).await.unwrap_err();
        assert!(matches!(err, LookupError::Upstream(_)));
    }
}
