// src/report.rs
// =============================================================================
// Renders the CrawlSummary once every chapter has settled, and turns it into
// the process exit code.
//
// Output is either a human-readable table or JSON (--json). Per-image
// progress was already logged while downloading; this is the overview.
//
// Exit codes:
//   0 = every image was downloaded or skipped
//   1 = some image or chapter failed, or the crawl stopped on an error
// =============================================================================

use crate::crawl::{ChapterOutcome, CrawlSummary};
use crate::download::{ChapterReport, ImageResult};
use serde::Serialize;

#[derive(Debug, Serialize)]
struct SummaryView<'a> {
    chapters: Vec<ChapterView<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stopped_by: Option<String>,
    totals: Totals,
}

#[derive(Debug, Serialize)]
struct ChapterView<'a> {
    chapter: u32,
    url: &'a str,
    folder: String,
    #[serde(flatten)]
    state: ChapterState<'a>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
enum ChapterState<'a> {
    Completed {
        downloaded: usize,
        skipped: usize,
        failed: usize,
        images: &'a [ImageResult],
    },
    Failed {
        error: String,
    },
}

#[derive(Debug, Default, Serialize, PartialEq, Eq)]
pub struct Totals {
    pub chapters: usize,
    pub failed_chapters: usize,
    pub downloaded: usize,
    pub skipped: usize,
    pub failed_images: usize,
}

impl Totals {
    pub fn of(summary: &CrawlSummary) -> Self {
        let mut totals = Totals {
            chapters: summary.chapters.len(),
            ..Default::default()
        };
        for outcome in &summary.chapters {
            match &outcome.result {
                Ok(report) => {
                    totals.downloaded += report.downloaded();
                    totals.skipped += report.skipped();
                    totals.failed_images += report.failed();
                }
                Err(_) => totals.failed_chapters += 1,
            }
        }
        totals
    }
}

pub fn exit_code(summary: &CrawlSummary) -> i32 {
    let totals = Totals::of(summary);
    if summary.stopped_by.is_some() || totals.failed_chapters > 0 || totals.failed_images > 0 {
        1
    } else {
        0
    }
}

pub fn print_summary(summary: &CrawlSummary, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", to_json(summary)?);
    } else {
        print_table(summary);
    }
    Ok(())
}

fn to_json(summary: &CrawlSummary) -> serde_json::Result<String> {
    let view = SummaryView {
        chapters: summary.chapters.iter().map(chapter_view).collect(),
        stopped_by: summary.stopped_by.as_ref().map(|e| e.to_string()),
        totals: Totals::of(summary),
    };
    serde_json::to_string_pretty(&view)
}

fn chapter_view(outcome: &ChapterOutcome) -> ChapterView<'_> {
    let state = match &outcome.result {
        Ok(report) => completed(report),
        Err(e) => ChapterState::Failed {
            error: e.to_string(),
        },
    };
    ChapterView {
        chapter: outcome.task.chapter,
        url: &outcome.task.page_url,
        folder: outcome.task.folder.display().to_string(),
        state,
    }
}

fn completed(report: &ChapterReport) -> ChapterState<'_> {
    ChapterState::Completed {
        downloaded: report.downloaded(),
        skipped: report.skipped(),
        failed: report.failed(),
        images: &report.images,
    }
}

fn print_table(summary: &CrawlSummary) {
    println!(
        "{:<10} {:<12} {:<10} {:<10} {:<50}",
        "CHAPTER", "DOWNLOADED", "SKIPPED", "FAILED", "STATUS"
    );
    println!("{}", "=".repeat(92));

    for outcome in &summary.chapters {
        let chapter = format!("ch{}", outcome.task.chapter);
        match &outcome.result {
            Ok(report) => {
                let status = if report.failed() == 0 { "OK" } else { "PARTIAL" };
                println!(
                    "{:<10} {:<12} {:<10} {:<10} {:<50}",
                    chapter,
                    report.downloaded(),
                    report.skipped(),
                    report.failed(),
                    status
                );
            }
            Err(e) => {
                println!("{:<10} {:<12} {:<10} {:<10} FAILED: {}", chapter, "-", "-", "-", e);
            }
        }
    }

    println!();

    let totals = Totals::of(summary);
    println!("Summary:");
    println!("   Chapters:   {} ({} failed)", totals.chapters, totals.failed_chapters);
    println!("   Downloaded: {}", totals.downloaded);
    println!("   Skipped:    {}", totals.skipped);
    println!("   Failed:     {}", totals.failed_images);

    if let Some(e) = &summary.stopped_by {
        println!("   Crawl stopped early: {}", e);
    }
}
