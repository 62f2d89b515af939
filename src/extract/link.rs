// src/extract/link.rs
// =============================================================================
// Finds the link to the following chapter on a page.
//
// Rule: the first <a> element (document order) whose visible text contains
// "next chapter", compared case-insensitively. Its href is returned as-is.
// Later matches are ignored.
// =============================================================================

use crate::error::ExtractError;
use scraper::{Html, Selector};

const NEXT_CHAPTER_TEXT: &str = "next chapter";

// Returns:
//   Ok(Some(href)) when a matching anchor exists
//   Ok(None)       when no anchor mentions "next chapter" (end of the chain)
//   Err(..)        when the first matching anchor has no href
pub fn extract_next_link(html: &str) -> Result<Option<String>, ExtractError> {
    let document = Html::parse_document(html);

    // Constant selector, known to be valid
    let selector = Selector::parse("a").unwrap();

    let next_anchor = document.select(&selector).find(|anchor| {
        let text: String = anchor.text().collect();
        text.to_lowercase().contains(NEXT_CHAPTER_TEXT)
    });

    match next_anchor {
        None => Ok(None),
        Some(anchor) => anchor
            .value()
            .attr("href")
            .map(|href| Some(href.to_string()))
            .ok_or(ExtractError::MissingHref),
    }
}
