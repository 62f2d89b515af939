// src/download/images.rs
// =============================================================================
// The per-chapter image downloader.
//
// Steps for one chapter page:
// 1. Create the chapter folder (and parents) if needed
// 2. Fetch the page HTML. Failure here aborts this chapter only.
// 3. List every <img> src. A missing src aborts this chapter only.
// 4. For image #i, target file is {folder}/{i}.jpg:
//    - already on disk  -> Skipped, no request
//    - non-2xx / error  -> Failed, continue with the next image
//    - otherwise        -> body streamed to disk in 1 KiB writes
//
// Images run concurrently through buffer_unordered, bounded by the session's
// image limit. Nothing mutable is shared between images or between chapters:
// each image owns its own target path.
// =============================================================================

use super::{fetch_page, ChapterReport, ImageResult, ImageStatus};
use crate::config::Session;
use crate::error::{format_status, ChapterError};
use crate::extract::{extract_image_sources, resolve_url};
use anyhow::Context;
use futures::stream::{self, StreamExt};
use reqwest::Client;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use url::Url;

/// Size of each write to the target file.
const CHUNK_SIZE: usize = 1024;

const IMAGE_EXTENSION: &str = "jpg";

// Parameters:
//   session: shared client + limits
//   page_url: chapter page listing the images
//   folder: chapter folder, e.g. out/ch3
//
// Returns a report with one entry per image, ordered by position.
pub async fn download_images(
    session: &Session,
    page_url: &Url,
    folder: &Path,
) -> Result<ChapterReport, ChapterError> {
    fs::create_dir_all(folder)
        .await
        .map_err(|source| ChapterError::CreateFolder {
            path: folder.to_path_buf(),
            source,
        })?;

    // After a redirect, relative image paths belong to the served page
    let (page_url, html) = fetch_page(&session.client, page_url).await?;
    let page_url = &page_url;
    let sources = extract_image_sources(&html)?;
    tracing::info!("Found {} image(s) on {}", sources.len(), page_url);

    let limit = session.image_limit.unwrap_or(sources.len()).max(1);

    let downloads = sources.into_iter().enumerate().map(|(position, source)| {
        let client = session.client.clone();
        let target = image_path(folder, position);
        async move {
            let status = download_image(&client, page_url, &source, &target).await;
            ImageResult {
                position,
                source,
                status,
            }
        }
    });

    let mut images: Vec<ImageResult> = stream::iter(downloads)
        .buffer_unordered(limit)
        .collect()
        .await;

    // Completion order is arbitrary, report order is not
    images.sort_by_key(|image| image.position);

    Ok(ChapterReport { images })
}

// {folder}/{position}.jpg, whatever the real image format is
fn image_path(folder: &Path, position: usize) -> PathBuf {
    folder.join(format!("{}.{}", position, IMAGE_EXTENSION))
}

// The file being written; renamed to the real name once complete so a crash
// mid-download never leaves a file that a later run would skip
fn partial_path(target: &Path) -> PathBuf {
    let mut name = target.as_os_str().to_owned();
    name.push(".part");
    PathBuf::from(name)
}

async fn download_image(client: &Client, page_url: &Url, source: &str, target: &Path) -> ImageStatus {
    let filename = target
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();

    if fs::try_exists(target).await.unwrap_or(false) {
        tracing::info!("Skipped {}", filename);
        return ImageStatus::Skipped;
    }

    let Some(url) = resolve_url(page_url, source) else {
        tracing::warn!("Failed to download {}. Not a valid URL", source);
        return ImageStatus::Failed {
            reason: format!("invalid image URL '{}'", source),
        };
    };
    tracing::debug!("Resolved {} to {}", source, url);

    let response = match client.get(url.clone()).send().await {
        Ok(response) => response,
        Err(e) => {
            tracing::warn!("Failed to download {}. {}", url, e);
            return ImageStatus::Failed {
                reason: e.to_string(),
            };
        }
    };

    if !response.status().is_success() {
        let status = format_status(&response.status());
        tracing::warn!("Failed to download {}. Status {}", url, status);
        return ImageStatus::Failed {
            reason: format!("HTTP {}", status),
        };
    }

    match write_body(response, target).await {
        Ok(bytes) => {
            tracing::info!("Downloaded {} ({} bytes)", filename, bytes);
            ImageStatus::Downloaded
        }
        Err(e) => {
            tracing::warn!("Failed to download {}. {:#}", url, e);
            ImageStatus::Failed {
                reason: format!("{:#}", e),
            }
        }
    }
}

// Streams the response body into target. Returns the number of bytes written.
async fn write_body(response: reqwest::Response, target: &Path) -> anyhow::Result<u64> {
    let partial = partial_path(target);

    let result = async {
        let mut file = fs::File::create(&partial)
            .await
            .with_context(|| format!("could not create {}", partial.display()))?;

        let mut written = 0u64;
        let mut body = response.bytes_stream();
        while let Some(chunk) = body.next().await {
            let chunk = chunk.context("connection lost while reading image body")?;
            // The network hands us chunks of any size; we write them out
            // in CHUNK_SIZE pieces and never hold the whole image in memory
            for piece in chunk.chunks(CHUNK_SIZE) {
                file.write_all(piece)
                    .await
                    .with_context(|| format!("could not write {}", partial.display()))?;
                written += piece.len() as u64;
            }
        }
        file.flush().await?;
        drop(file);

        // Why write to .part first and rename afterwards?
        // - The skip check only asks "does {i}.jpg exist?"
        // - If we wrote straight to {i}.jpg and the run was interrupted, a
        //   half-written image would be skipped forever on the next run
        // - A rename within one folder is atomic on common filesystems, so
        //   {i}.jpg either doesn't exist yet or is complete
        fs::rename(&partial, target)
            .await
            .with_context(|| format!("could not rename {}", partial.display()))?;
        Ok::<u64, anyhow::Error>(written)
    }
    .await;

    if result.is_err() {
        // Best effort; the next run overwrites it anyway
        let _ = fs::remove_file(&partial).await;
    }
    result
}
