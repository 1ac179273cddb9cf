//! Verse markup sanitizing using lol_html
//!
//! Provider markup is rewritten before it becomes an anchor subtree: active
//! content goes, and so do inline tags whose text is not part of the verse
//! (Strong's numbers, footnote markers).

use lol_html::{element, rewrite_str, RewriteStrSettings};

/// Errors during markup rewriting
#[derive(Debug, thiserror::Error)]
pub enum SanitizeError {
    #[error("HTML rewrite failed: {0}")]
    RewriteError(String),
}

/// Strip scripts, styles, Strong's tags, footnotes and event handlers
pub fn sanitize_markup(markup: &str) -> Result<String, SanitizeError> {
    let result = rewrite_str(
        markup,
        RewriteStrSettings {
            element_content_handlers: vec![
                element!("script", |el| {
                    el.remove();
                    Ok(())
                }),
                element!("style", |el| {
                    el.remove();
                    Ok(())
                }),
                // <S>1234</S> carries a Strong's number, not verse text
                element!("s", |el| {
                    el.remove();
                    Ok(())
                }),
                element!("sup", |el| {
                    el.remove();
                    Ok(())
                }),
                element!("*", |el| {
                    let handlers: Vec<String> = el
                        .attributes()
                        .iter()
                        .map(|attr| attr.name())
                        .filter(|name| name.starts_with("on"))
                        .collect();
                    for name in handlers {
                        el.remove_attribute(&name);
                    }
                    if let Some(href) = el.get_attribute("href") {
                        if href.trim().to_lowercase().starts_with("javascript:") {
                            el.remove_attribute("href");
                        }
                    }
                    Ok(())
                }),
            ],
            ..RewriteStrSettings::default()
        },
    )
    .map_err(|e| SanitizeError::RewriteError(e.to_string()))?;

    Ok(result)
}

/// Reduce markup to its decoded text
pub fn strip_tags(markup: &str) -> Result<String, SanitizeError> {
    let result = rewrite_str(
        markup,
        RewriteStrSettings {
            element_content_handlers: vec![element!("*", |el| {
                el.remove_and_keep_content();
                Ok(())
            })],
            ..RewriteStrSettings::default()
        },
    )
    .map_err(|e| SanitizeError::RewriteError(e.to_string()))?;

    Ok(html_escape::decode_html_entities(&result).into_owned())
}
