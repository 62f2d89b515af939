// src/crawl/chain.rs
// =============================================================================
// Follows the "next chapter" link chain.
//
// How it works:
// 1. Launch a download task for the current page (do not wait for it)
// 2. Stop if this chapter is the last one allowed
// 3. Fetch the current page and look for its "next chapter" link
// 4. No link -> the chain ended; otherwise continue with the linked page
//
// Whatever ends the loop (end of chain, chapter bound, or an error while
// reading a page), every launched task is awaited before crawl() returns.
// An error only stops discovery of further chapters.
// =============================================================================

use super::tasks::{ChapterTask, ChapterTasks};
use super::CrawlSummary;
use crate::config::Session;
use crate::download::fetch_page;
use crate::error::CrawlError;
use crate::extract::{extract_next_link, resolve_url};
use std::path::Path;
use url::Url;

// Crawls from start_url, naming folders ch{start_chapter}, ch{start_chapter+1}, ...
//
// Chapters start_chapter..=last_chapter are launched at most. When
// last_chapter <= start_chapter only the start page is downloaded and no
// page is fetched for link-following.
pub async fn crawl(
    session: &Session,
    start_url: Url,
    folder: &Path,
    start_chapter: u32,
    last_chapter: u32,
) -> CrawlSummary {
    let mut tasks = ChapterTasks::new(session.clone());

    let stopped_by = follow_chain(
        session,
        &mut tasks,
        start_url,
        folder,
        start_chapter,
        last_chapter,
    )
    .await
    .err();

    if let Some(e) = &stopped_by {
        tracing::error!("Crawl stopped early: {}", e);
    }

    tracing::info!("Waiting for {} chapter(s) to finish", tasks.len());
    let chapters = tasks.join_all().await;

    CrawlSummary {
        chapters,
        stopped_by,
    }
}

async fn follow_chain(
    session: &Session,
    tasks: &mut ChapterTasks,
    start_url: Url,
    folder: &Path,
    start_chapter: u32,
    last_chapter: u32,
) -> Result<(), CrawlError> {
    let mut next = Some(start_url);
    let mut chapter = start_chapter;

    while let Some(url) = next.take() {
        tasks.launch(ChapterTask::new(chapter, url.as_str(), folder), url.clone());

        // The bound is checked right after launching, BEFORE fetching the
        // page for its next link:
        // - last_chapter is the last chapter index we want, inclusive
        // - once it is launched there is nothing left to discover, so
        //   fetching the page again would be a wasted request
        // - it also means `chapter += 1` below can never overflow, because
        //   chapter < last_chapter <= u32::MAX there
        if chapter >= last_chapter {
            tracing::info!("Reached chapter limit ({})", last_chapter);
            break;
        }

        tracing::info!("Visiting {}", url);
        // served_url differs from url when the site redirected us; the next
        // link is relative to the page we actually received
        let (served_url, html) = fetch_page(&session.client, &url)
            .await
            .map_err(|source| CrawlError::Page { chapter, source })?;

        next = match extract_next_link(&html).map_err(|source| CrawlError::Markup { chapter, source })? {
            Some(href) => {
                let resolved = resolve_url(&served_url, &href)
                    .ok_or_else(|| CrawlError::InvalidNextUrl { chapter, href: href.clone() })?;
                tracing::debug!("Next chapter link {} -> {}", href, resolved);
                Some(resolved)
            }
            None => {
                tracing::info!("Chapter {} has no next chapter link", chapter);
                None
            }
        };

        chapter += 1;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ChapterError;
    use reqwest::Client;
    use tempfile::TempDir;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn session() -> Session {
        Session {
            client: Client::new(),
            chapter_limit: Some(2),
            image_limit: Some(2),
        }
    }

    // A chapter page with one image and an optional next link
    fn chapter_page(image: &str, next: Option<&str>) -> String {
        let link = next
            .map(|href| format!(r#"<a href="{}">Next Chapter</a>"#, href))
            .unwrap_or_default();
        format!(
            r#"<html><body><a href="/">Home</a><img src="{}">{}</body></html>"#,
            image, link
        )
    }

    async fn mount(server: &MockServer, route: &str, body: String, expected_calls: u64) {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .expect(expected_calls)
            .mount(server)
            .await;
    }

    async fn mount_image(server: &MockServer, route: &str) {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"img".to_vec()))
            .mount(server)
            .await;
    }

    fn url(server: &MockServer, route: &str) -> Url {
        Url::parse(&format!("{}{}", server.uri(), route)).unwrap()
    }

    fn chapters(summary: &CrawlSummary) -> Vec<u32> {
        summary.chapters.iter().map(|o| o.task.chapter).collect()
    }

    #[tokio::test]
    async fn test_chain_ends_before_the_limit() {
        let server = MockServer::start().await;
        let ch2 = format!("{}/ch2", server.uri());
        // Each page: once for link-following, once by its chapter task
        mount(&server, "/ch1", chapter_page("/img/1", Some(&ch2)), 2).await;
        mount(&server, "/ch2", chapter_page("/img/2", None), 2).await;
        mount_image(&server, "/img/1").await;
        mount_image(&server, "/img/2").await;

        let dir = TempDir::new().unwrap();
        let summary = crawl(&session(), url(&server, "/ch1"), dir.path(), 1, 5).await;

        assert_eq!(chapters(&summary), vec![1, 2]);
        assert!(summary.stopped_by.is_none());
        assert!(dir.path().join("ch1").join("0.jpg").exists());
        assert!(dir.path().join("ch2").join("0.jpg").exists());
        assert!(!dir.path().join("ch3").exists());
    }

    #[tokio::test]
    async fn test_limit_equal_to_start_downloads_one_chapter() {
        let server = MockServer::start().await;
        // Only the chapter task reads the page; no link-following fetch
        mount(&server, "/ch1", chapter_page("/img/1", Some("/ch2")), 1).await;
        mount(&server, "/ch2", chapter_page("/img/2", None), 0).await;
        mount_image(&server, "/img/1").await;

        let dir = TempDir::new().unwrap();
        let summary = crawl(&session(), url(&server, "/ch1"), dir.path(), 4, 4).await;

        assert_eq!(chapters(&summary), vec![4]);
        assert!(dir.path().join("ch4").join("0.jpg").exists());
    }

    #[tokio::test]
    async fn test_limit_stops_an_endless_chain() {
        let server = MockServer::start().await;
        mount(&server, "/ch1", chapter_page("/img/1", Some("/ch2")), 2).await;
        mount(&server, "/ch2", chapter_page("/img/2", Some("/ch3")), 2).await;
        // Last allowed chapter: read by its task only
        mount(&server, "/ch3", chapter_page("/img/3", Some("/ch4")), 1).await;
        mount(&server, "/ch4", chapter_page("/img/4", Some("/ch5")), 0).await;
        for i in 1..=3 {
            mount_image(&server, &format!("/img/{}", i)).await;
        }

        let dir = TempDir::new().unwrap();
        let summary = crawl(&session(), url(&server, "/ch1"), dir.path(), 1, 3).await;

        assert_eq!(chapters(&summary), vec![1, 2, 3]);
        assert!(summary.chapters.iter().all(|o| o.result.is_ok()));
        assert!(!dir.path().join("ch4").exists());
    }

    #[tokio::test]
    async fn test_relative_next_links() {
        let server = MockServer::start().await;
        mount(&server, "/manga/ch1", chapter_page("p1.jpg", Some("ch2")), 2).await;
        mount(&server, "/manga/ch2", chapter_page("p2.jpg", None), 2).await;
        mount_image(&server, "/manga/p1.jpg").await;
        mount_image(&server, "/manga/p2.jpg").await;

        let dir = TempDir::new().unwrap();
        let summary = crawl(&session(), url(&server, "/manga/ch1"), dir.path(), 10, 20).await;

        assert_eq!(chapters(&summary), vec![10, 11]);
        assert_eq!(summary.chapters[1].task.page_url, format!("{}/manga/ch2", server.uri()));
        assert!(dir.path().join("ch11").join("0.jpg").exists());
    }

    #[tokio::test]
    async fn test_next_link_is_relative_to_the_redirected_page() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/latest"))
            .respond_with(
                ResponseTemplate::new(302)
                    .insert_header("Location", format!("{}/manga/ch1", server.uri()).as_str()),
            )
            .mount(&server)
            .await;
        mount(&server, "/manga/ch1", chapter_page("p1.jpg", Some("ch2")), 2).await;
        mount(&server, "/manga/ch2", chapter_page("p2.jpg", None), 2).await;
        // Resolving against /latest would land here
        mount(&server, "/ch2", chapter_page("p2.jpg", None), 0).await;
        mount_image(&server, "/manga/p1.jpg").await;
        mount_image(&server, "/manga/p2.jpg").await;

        let dir = TempDir::new().unwrap();
        let summary = crawl(&session(), url(&server, "/latest"), dir.path(), 1, 5).await;

        assert_eq!(chapters(&summary), vec![1, 2]);
        assert!(summary.stopped_by.is_none());
        assert_eq!(summary.chapters[1].task.page_url, format!("{}/manga/ch2", server.uri()));
        assert!(dir.path().join("ch1").join("0.jpg").exists());
        assert!(dir.path().join("ch2").join("0.jpg").exists());
    }

    #[tokio::test]
    async fn test_page_failure_stops_discovery_but_keeps_launched_chapters() {
        let server = MockServer::start().await;
        mount(&server, "/ch1", chapter_page("/img/1", Some("/ch2")), 2).await;
        Mock::given(method("GET"))
            .and(path("/ch2"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;
        mount_image(&server, "/img/1").await;

        let dir = TempDir::new().unwrap();
        let summary = crawl(&session(), url(&server, "/ch1"), dir.path(), 1, 5).await;

        // ch2 was launched before its page was read for the next link
        assert_eq!(chapters(&summary), vec![1, 2]);
        assert!(matches!(
            summary.stopped_by,
            Some(CrawlError::Page { chapter: 2, .. })
        ));
        assert!(summary.chapters[0].result.is_ok());
        assert!(matches!(summary.chapters[1].result, Err(ChapterError::Page(_))));
        assert!(dir.path().join("ch1").join("0.jpg").exists());
    }

    #[tokio::test]
    async fn test_next_anchor_without_href_stops_the_crawl() {
        let server = MockServer::start().await;
        mount(
            &server,
            "/ch1",
            r#"<img src="/img/1"><a class="btn">Next chapter</a>"#.to_string(),
            2,
        )
        .await;
        mount_image(&server, "/img/1").await;

        let dir = TempDir::new().unwrap();
        let summary = crawl(&session(), url(&server, "/ch1"), dir.path(), 1, 5).await;

        assert_eq!(chapters(&summary), vec![1]);
        assert!(matches!(
            summary.stopped_by,
            Some(CrawlError::Markup { chapter: 1, .. })
        ));
        assert!(summary.chapters[0].result.is_ok());
    }
}
