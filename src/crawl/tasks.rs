// src/crawl/tasks.rs
// =============================================================================
// The set of launched chapter tasks.
//
// launch() spawns a chapter download on the tokio runtime and returns at
// once, so the crawler can move on to the next page while earlier chapters
// are still downloading. Before doing any work a task takes a permit from a
// shared Semaphore, which caps how many chapters download at the same time.
// Tasks that are waiting for a permit cost nothing but a little memory.
//
// join_all() consumes the set and waits for every task. It is the only way
// to get results out, so a driver cannot forget to wait: no task outlives it.
// A chapter that fails or even panics becomes an Err outcome, its siblings
// are never cancelled.
//
// Rust concepts:
// - tokio::spawn: runs a future in the background, returns a JoinHandle
// - Arc<Semaphore>: a shared counter of permits, cloned into every task
// - Consuming `self`: join_all(self) moves the set, so it can't be reused
// =============================================================================

use crate::config::Session;
use crate::download::{download_images, ChapterReport};
use crate::error::ChapterError;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tracing::Instrument;
use url::Url;

/// One chapter to download: page URL and target folder.
#[derive(Debug, Clone)]
pub struct ChapterTask {
    pub chapter: u32,
    pub page_url: String,
    pub folder: PathBuf,
}

impl ChapterTask {
    pub fn new(chapter: u32, page_url: impl Into<String>, base_folder: &Path) -> Self {
        ChapterTask {
            chapter,
            page_url: page_url.into(),
            folder: chapter_folder(base_folder, chapter),
        }
    }
}

/// Final state of one chapter task.
#[derive(Debug)]
pub struct ChapterOutcome {
    pub task: ChapterTask,
    pub result: Result<ChapterReport, ChapterError>,
}

enum Pending {
    Spawned(JoinHandle<Result<ChapterReport, ChapterError>>),
    // Never started, e.g. the chapter URL could not be parsed
    Rejected(ChapterError),
}

pub struct ChapterTasks {
    session: Session,
    permits: Option<Arc<Semaphore>>,
    launched: Vec<(ChapterTask, Pending)>,
}

impl ChapterTasks {
    pub fn new(session: Session) -> Self {
        let permits = session
            .chapter_limit
            .map(|limit| Arc::new(Semaphore::new(limit.min(Semaphore::MAX_PERMITS))));

        ChapterTasks {
            session,
            permits,
            launched: Vec::new(),
        }
    }

    // Spawns the download of task.page_url into task.folder without waiting
    pub fn launch(&mut self, task: ChapterTask, page_url: Url) {
        tracing::info!("Launching chapter {} -> {}", task.chapter, task.folder.display());

        let session = self.session.clone();
        let permits = self.permits.clone();
        let folder = task.folder.clone();
        let span = tracing::info_span!("chapter", index = task.chapter);

        let handle = tokio::spawn(
            async move {
                // The permit is a guard: while `_permit` is alive it counts
                // against the limit, and it is released automatically when it
                // is dropped at the end of this block (success, error or panic).
                // Note the name: `_permit` keeps the value alive, whereas a
                // bare `_` would drop it immediately and limit nothing.
                // acquire_owned() needs an Arc so the permit can move into a
                // 'static spawned task instead of borrowing the Semaphore.
                let _permit = match permits {
                    Some(permits) => permits.acquire_owned().await.ok(),
                    None => None,
                };
                tracing::debug!("Started");

                let result = download_images(&session, &page_url, &folder).await;
                match &result {
                    Ok(report) => tracing::info!(
                        "Finished: {} downloaded, {} skipped, {} failed",
                        report.downloaded(),
                        report.skipped(),
                        report.failed()
                    ),
                    Err(e) => tracing::warn!("Chapter failed: {}", e),
                }
                result
            }
            .instrument(span),
        );

        self.launched.push((task, Pending::Spawned(handle)));
    }

    // Records a chapter that could not be started at all
    pub fn reject(&mut self, task: ChapterTask, error: ChapterError) {
        tracing::warn!("Chapter {} not started: {}", task.chapter, error);
        self.launched.push((task, Pending::Rejected(error)));
    }

    pub fn len(&self) -> usize {
        self.launched.len()
    }

    // Waits for every task; outcomes come back in launch order
    pub async fn join_all(self) -> Vec<ChapterOutcome> {
        let mut outcomes = Vec::with_capacity(self.launched.len());

        for (task, pending) in self.launched {
            let result = match pending {
                Pending::Spawned(handle) => match handle.await {
                    Ok(result) => result,
                    Err(e) => Err(ChapterError::Panicked(e.to_string())),
                },
                Pending::Rejected(error) => Err(error),
            };
            outcomes.push(ChapterOutcome { task, result });
        }

        outcomes
    }
}

// {base}/ch{chapter}
pub fn chapter_folder(base: &Path, chapter: u32) -> PathBuf {
    base.join(format!("ch{}", chapter))
}
