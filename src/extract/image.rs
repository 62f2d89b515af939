// src/extract/image.rs
// =============================================================================
// Lists the images of a chapter page.
//
// Every <img> element counts, in document order. Duplicates are kept and
// nothing is filtered by extension, so the position of an image in the
// returned Vec is exactly its position on the page. That position later
// becomes the file name ({position}.jpg).
// =============================================================================

use crate::error::ExtractError;
use scraper::{Html, Selector};

// Returns the `src` of every <img>, or MissingSrc for the first image that
// has none. A single malformed image rejects the whole page.
pub fn extract_image_sources(html: &str) -> Result<Vec<String>, ExtractError> {
    let document = Html::parse_document(html);
    let selector = Selector::parse("img").unwrap();

    document
        .select(&selector)
        .enumerate()
        .map(|(position, image)| {
            image
                .value()
                .attr("src")
                .map(str::to_string)
                .ok_or(ExtractError::MissingSrc { position })
        })
        .collect()
}
