// src/error.rs
// =============================================================================
// Error types shared by the extract, download and crawl modules.
//
// The taxonomy mirrors how far a failure is allowed to reach:
// - ExtractError: malformed markup on one page
// - FetchError:   one HTTP request went wrong (network or status)
// - ChapterError: fatal to ONE chapter task, siblings keep running
// - CrawlError:   stops link-following, launched chapters are still awaited
// - ConfigError:  the run never starts
//
// A failed image is NOT an error here. It is recorded as a value
// (ImageStatus::Failed) and the chapter keeps going.
// =============================================================================

use reqwest::StatusCode;
use std::path::PathBuf;
use thiserror::Error;

/// Malformed markup found while extracting from a page.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ExtractError {
    /// An <img> element without a `src` attribute. `position` is its index
    /// among all images of the page.
    #[error("image #{position} has no src attribute")]
    MissingSrc { position: usize },

    /// The first "next chapter" anchor has no `href` attribute.
    #[error("'next chapter' link has no href attribute")]
    MissingHref,
}

/// A single HTTP request that did not produce a usable response.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to {url} failed: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} returned HTTP {}", format_status(.status))]
    Status { url: String, status: StatusCode },
}

/// Failure that aborts the whole image batch of one chapter.
#[derive(Debug, Error)]
pub enum ChapterError {
    #[error("could not create folder {}: {source}", .path.display())]
    CreateFolder {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("could not fetch chapter page: {0}")]
    Page(#[from] FetchError),

    #[error("malformed page markup: {0}")]
    Markup(#[from] ExtractError),

    #[error("invalid chapter URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("chapter task panicked: {0}")]
    Panicked(String),
}

/// Failure that stops discovering further chapters.
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("could not fetch chapter {chapter} page: {source}")]
    Page {
        chapter: u32,
        #[source]
        source: FetchError,
    },

    #[error("chapter {chapter} page: {source}")]
    Markup {
        chapter: u32,
        #[source]
        source: ExtractError,
    },

    #[error("chapter {chapter} links to an invalid URL '{href}'")]
    InvalidNextUrl { chapter: u32, href: String },
}

/// Problems with the command-line input, detected before any request.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("chapter range {start}..={end} is empty")]
    EmptyRange { start: u32, end: u32 },

    #[error("could not build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
}

// "404 Not Found" style text: code plus canonical reason when known
pub fn format_status(status: &StatusCode) -> String {
    match status.canonical_reason() {
        Some(reason) => format!("{} {}", status.as_u16(), reason),
        None => status.as_u16().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_status_with_reason() {
        assert_eq!(format_status(&StatusCode::NOT_FOUND), "404 Not Found");
    }

    #[test]
    fn test_format_status_without_reason() {
        let status = StatusCode::from_u16(599).unwrap();
        assert_eq!(format_status(&status), "599");
    }

    #[test]
    fn test_status_error_message() {
        let err = FetchError::Status {
            url: "https://site.example/ch1".to_string(),
            status: StatusCode::FORBIDDEN,
        };
        assert_eq!(
            err.to_string(),
            "https://site.example/ch1 returned HTTP 403 Forbidden"
        );
    }

    #[test]
    fn test_missing_src_message() {
        let err = ChapterError::from(ExtractError::MissingSrc { position: 3 });
        assert_eq!(
            err.to_string(),
            "malformed page markup: image #3 has no src attribute"
        );
    }
}
