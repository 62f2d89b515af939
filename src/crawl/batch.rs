// src/crawl/batch.rs
// =============================================================================
// Batch mode: the chapter URLs are known up front from a {chapter} template,
// so every chapter in the range is launched directly. No page is read for
// links here; each chapter task fetches only its own page.
// =============================================================================

use super::tasks::{ChapterTask, ChapterTasks};
use super::CrawlSummary;
use crate::config::{expand_template, Session};
use crate::error::ChapterError;
use std::ops::RangeInclusive;
use std::path::Path;
use url::Url;

pub async fn batch(
    session: &Session,
    pattern: &str,
    folder: &Path,
    chapters: RangeInclusive<u32>,
) -> CrawlSummary {
    let mut tasks = ChapterTasks::new(session.clone());

    for chapter in chapters {
        let page_url = expand_template(pattern, chapter);
        let task = ChapterTask::new(chapter, page_url.as_str(), folder);

        match Url::parse(&page_url) {
            Ok(url) => tasks.launch(task, url),
            Err(e) => tasks.reject(
                task,
                ChapterError::InvalidUrl {
                    url: page_url,
                    reason: e.to_string(),
                },
            ),
        }
    }

    tracing::info!("Waiting for {} chapter(s) to finish", tasks.len());
    CrawlSummary {
        chapters: tasks.join_all().await,
        stopped_by: None,
    }
}
