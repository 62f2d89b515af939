// src/extract/mod.rs
// =============================================================================
// Pure HTML extraction: raw page text in, URLs out. No I/O happens here.
//
// Submodules:
// - link:  finds the "next chapter" anchor of a page
// - image: lists every <img> source of a page in document order
//
// Both return the raw attribute text. Turning a relative value into an
// absolute URL is done by `resolve_url`, which callers apply with the URL of
// the page the HTML came from.
// =============================================================================

mod image;
mod link;

pub use image::extract_image_sources;
pub use link::extract_next_link;

use url::Url;

// Resolves an attribute value (absolute or relative) against the page URL
//
// Examples:
//   base = "https://site.example/manga/ch1"
//   "ch2"                       -> "https://site.example/manga/ch2"
//   "/img/1.jpg"                -> "https://site.example/img/1.jpg"
//   "https://cdn.example/1.jpg" -> unchanged
pub fn resolve_url(base: &Url, value: &str) -> Option<Url> {
    base.join(value.trim()).ok()
}
