// src/download/mod.rs
// =============================================================================
// Downloads the images of one chapter page.
//
// Submodules:
// - images: the per-chapter downloader (fetch page, list images, download
//           each one, skip what is already on disk)
//
// This file also holds the plain page fetch shared with the crawler, and the
// report types a chapter task hands back to whoever awaits it.
// =============================================================================

mod images;

pub use images::download_images;

use crate::error::FetchError;
use reqwest::Client;
use serde::Serialize;
use url::Url;

// Fetches a page and returns (final URL, HTML text)
//
// Both a failed request and a non-2xx status count as failure: a 404 page
// has no chapter images and no "next chapter" link worth following.
//
// Why return the URL too?
// - reqwest follows redirects on its own, so the page we get back may live
//   somewhere else than the URL we asked for
// - Relative src/href values in the HTML are relative to where the page was
//   actually served, so callers must resolve against response.url()
pub async fn fetch_page(client: &Client, url: &Url) -> Result<(Url, String), FetchError> {
    let network = |source: reqwest::Error| FetchError::Network {
        url: url.to_string(),
        source,
    };

    let response = client.get(url.clone()).send().await.map_err(network)?;

    if !response.status().is_success() {
        return Err(FetchError::Status {
            url: url.to_string(),
            status: response.status(),
        });
    }

    let final_url = response.url().clone();
    let html = response.text().await.map_err(network)?;
    Ok((final_url, html))
}

/// What happened to one image of a chapter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ImageStatus {
    /// Fetched and written to disk
    Downloaded,
    /// The file was already on disk; no request was made
    Skipped,
    /// Request, status or write failed; the rest of the chapter continued
    Failed { reason: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct ImageResult {
    /// Position on the page, also the file stem ({position}.jpg)
    pub position: usize,
    /// Image source as written in the page
    pub source: String,
    #[serde(flatten)]
    pub status: ImageStatus,
}

/// Outcome of a chapter whose page could be fetched and parsed.
///
/// Images are ordered by position regardless of completion order.
#[derive(Debug, Clone)]
pub struct ChapterReport {
    pub images: Vec<ImageResult>,
}

impl ChapterReport {
    pub fn downloaded(&self) -> usize {
        self.count(|status| matches!(status, ImageStatus::Downloaded))
    }

    pub fn skipped(&self) -> usize {
        self.count(|status| matches!(status, ImageStatus::Skipped))
    }

    pub fn failed(&self) -> usize {
        self.count(|status| matches!(status, ImageStatus::Failed { .. }))
    }

    fn count(&self, predicate: impl Fn(&ImageStatus) -> bool) -> usize {
        self.images.iter().filter(|image| predicate(&image.status)).count()
    }
}
