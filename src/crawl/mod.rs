// src/crawl/mod.rs
// =============================================================================
// This module discovers chapters and launches one download task per chapter.
//
// Submodules:
// - tasks: the bounded set of launched chapter tasks (spawn now, join later)
// - chain: follows "next chapter" links from a start page
// - batch: expands a {chapter} URL template over an index range
//
// Both drivers return a CrawlSummary only after every launched task has
// settled, whatever happened along the way.
// =============================================================================

mod batch;
mod chain;
mod tasks;

pub use batch::batch;
pub use chain::crawl;
pub use tasks::{ChapterOutcome, ChapterTask};

use crate::config::{Config, Mode, Session};
use crate::error::CrawlError;

/// Everything a run produced, in chapter launch order.
#[derive(Debug)]
pub struct CrawlSummary {
    pub chapters: Vec<ChapterOutcome>,
    /// Set when link-following ended on an error instead of the end of the
    /// chain or the chapter limit
    pub stopped_by: Option<CrawlError>,
}

// Runs the mode chosen by the configuration
pub async fn run(config: &Config, session: &Session) -> CrawlSummary {
    match &config.mode {
        Mode::FollowLinks {
            start_url,
            start_chapter,
            last_chapter,
        } => {
            tracing::info!(
                "Crawling from {} (chapters {}..={})",
                start_url,
                start_chapter,
                last_chapter
            );
            crawl(
                session,
                start_url.clone(),
                &config.folder,
                *start_chapter,
                *last_chapter,
            )
            .await
        }
        Mode::Template { pattern, chapters } => {
            tracing::info!(
                "Downloading chapters {}..={} of {}",
                chapters.start(),
                chapters.end(),
                pattern
            );
            batch(session, pattern, &config.folder, chapters.clone()).await
        }
    }
}
