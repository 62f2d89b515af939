// src/config.rs
// =============================================================================
// Turns the raw command-line arguments into an immutable run configuration.
//
// Two decisions are made here and nowhere else:
// 1. Which mode runs: follow "next chapter" links, or expand a {chapter}
//    template over a known range. The crawl code receives an explicit Mode
//    and never looks at the URL string to guess.
// 2. Which headers every request carries: a Referer of {scheme}://{host}
//    taken from the start URL.
//
// The resulting Session (HTTP client + limits) is cloned into every task.
// reqwest::Client is reference counted internally, so cloning is cheap and
// all tasks share one connection pool.
// =============================================================================

use crate::cli::Cli;
use crate::error::ConfigError;
use reqwest::header::{HeaderMap, HeaderValue, REFERER};
use reqwest::Client;
use std::ops::RangeInclusive;
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

/// Placeholder substituted with the chapter index in batch mode.
pub const CHAPTER_PLACEHOLDER: &str = "{chapter}";

/// How chapters are discovered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    /// Start at `start_url` and follow "next chapter" links. Chapter
    /// `last_chapter` is the last one launched.
    FollowLinks {
        start_url: Url,
        start_chapter: u32,
        last_chapter: u32,
    },
    /// Expand `pattern` once per index in `chapters`; no link-following.
    Template {
        pattern: String,
        chapters: RangeInclusive<u32>,
    },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub mode: Mode,
    pub folder: PathBuf,
    pub referer: String,
    pub chapter_concurrency: usize,
    pub image_concurrency: usize,
    pub timeout: Duration,
}

/// Read-only state shared by every chapter task.
#[derive(Debug, Clone)]
pub struct Session {
    pub client: Client,
    /// Max chapters doing work at once, None = unbounded
    pub chapter_limit: Option<usize>,
    /// Max image downloads in flight inside one chapter, None = unbounded
    pub image_limit: Option<usize>,
}

impl Config {
    pub fn from_cli(cli: &Cli) -> Result<Self, ConfigError> {
        let (mode, referer) = if cli.url.contains(CHAPTER_PLACEHOLDER) {
            if cli.start_chapter > cli.max_chapters {
                return Err(ConfigError::EmptyRange {
                    start: cli.start_chapter,
                    end: cli.max_chapters,
                });
            }
            // The host part might hold the placeholder too, so derive the
            // referer from a concrete chapter URL
            let first = parse_url(&expand_template(&cli.url, cli.start_chapter))?;
            let mode = Mode::Template {
                pattern: cli.url.clone(),
                chapters: cli.start_chapter..=cli.max_chapters,
            };
            (mode, referer_for(&first)?)
        } else {
            let start_url = parse_url(&cli.url)?;
            let referer = referer_for(&start_url)?;
            let mode = Mode::FollowLinks {
                start_url,
                start_chapter: cli.start_chapter,
                last_chapter: cli.max_chapters,
            };
            (mode, referer)
        };

        Ok(Config {
            mode,
            folder: cli.folder.clone(),
            referer,
            chapter_concurrency: cli.chapter_concurrency,
            image_concurrency: cli.image_concurrency,
            timeout: Duration::from_secs(cli.timeout),
        })
    }

    pub fn build_session(&self) -> Result<Session, ConfigError> {
        let mut headers = HeaderMap::new();
        let referer = HeaderValue::from_str(&self.referer).map_err(|e| ConfigError::InvalidUrl {
            url: self.referer.clone(),
            reason: e.to_string(),
        })?;
        headers.insert(REFERER, referer);

        let client = Client::builder()
            .default_headers(headers)
            .timeout(self.timeout)
            .build()
            .map_err(ConfigError::Client)?;

        Ok(Session {
            client,
            chapter_limit: limit(self.chapter_concurrency),
            image_limit: limit(self.image_concurrency),
        })
    }
}

// Replaces every {chapter} with the index
pub fn expand_template(pattern: &str, chapter: u32) -> String {
    pattern.replace(CHAPTER_PLACEHOLDER, &chapter.to_string())
}

// {scheme}://{host}, without port, path or query
pub fn referer_for(url: &Url) -> Result<String, ConfigError> {
    let host = url.host_str().ok_or_else(|| ConfigError::InvalidUrl {
        url: url.to_string(),
        reason: "URL has no host".to_string(),
    })?;
    Ok(format!("{}://{}", url.scheme(), host))
}

fn parse_url(raw: &str) -> Result<Url, ConfigError> {
    Url::parse(raw).map_err(|e| ConfigError::InvalidUrl {
        url: raw.to_string(),
        reason: e.to_string(),
    })
}

// 0 on the command line means "no limit"
fn limit(value: usize) -> Option<usize> {
    (value > 0).then_some(value)
}
