// src/cli.rs
// =============================================================================
// This file defines our command-line interface using the `clap` crate.
//
// Usage:
//   chapter-harvest <url> <folder> <start_chapter> <max_chapters> [flags]
//
// If <url> contains the placeholder {chapter}, every chapter in
// start_chapter..=max_chapters is downloaded directly (batch mode).
// Otherwise the crawler starts at <url> and follows "next chapter" links
// until max_chapters is reached or the chain ends.
// =============================================================================

use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "chapter-harvest",
    version = "0.1.0",
    about = "Download every image of a comic/manga chapter chain",
    long_about = "chapter-harvest follows the 'next chapter' links of a comic or manga site \
                  and downloads the images of each chapter into {folder}/ch{index}/. \
                  Images that already exist on disk are skipped, so an interrupted run \
                  can simply be started again."
)]
pub struct Cli {
    /// Start URL, or a template containing {chapter}
    ///
    /// Example: https://site.example/manga/ch{chapter}
    pub url: String,

    /// Base output folder; chapters are written to ch{index} subfolders
    pub folder: PathBuf,

    /// Index of the first chapter (used for the first folder name)
    pub start_chapter: u32,

    /// Last chapter index to download
    ///
    /// In batch mode this is the inclusive end of the range; a value below
    /// start_chapter is rejected as an empty range (exit code 2).
    /// In crawl mode link-following stops once this index has been launched.
    pub max_chapters: u32,

    /// Maximum number of chapters downloading at the same time (0 = unbounded)
    #[arg(long, default_value_t = 4)]
    pub chapter_concurrency: usize,

    /// Maximum number of images downloading at the same time per chapter (0 = unbounded)
    #[arg(long, default_value_t = 8)]
    pub image_concurrency: usize,

    /// Per-request timeout in seconds
    #[arg(long, default_value_t = 30)]
    pub timeout: u64,

    /// Print the final summary as JSON instead of a table
    #[arg(long)]
    pub json: bool,

    /// Increase log verbosity (-v = debug, -vv = trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_positional_arguments() {
        let cli = Cli::try_parse_from([
            "chapter-harvest",
            "https://site.example/ch1",
            "out",
            "1",
            "10",
        ])
        .unwrap();

        assert_eq!(cli.url, "https://site.example/ch1");
        assert_eq!(cli.folder, PathBuf::from("out"));
        assert_eq!(cli.start_chapter, 1);
        assert_eq!(cli.max_chapters, 10);
        assert_eq!(cli.chapter_concurrency, 4);
        assert_eq!(cli.image_concurrency, 8);
        assert!(!cli.json);
        assert_eq!(cli.verbose, 0);
    }

    #[test]
    fn test_flags() {
        let cli = Cli::try_parse_from([
            "chapter-harvest",
            "https://site.example/ch{chapter}",
            "out",
            "3",
            "5",
            "--chapter-concurrency",
            "0",
            "--image-concurrency",
            "2",
            "--json",
            "-vv",
        ])
        .unwrap();

        assert_eq!(cli.chapter_concurrency, 0);
        assert_eq!(cli.image_concurrency, 2);
        assert!(cli.json);
        assert_eq!(cli.verbose, 2);
    }

    #[test]
    fn test_help_mentions_empty_range() {
        use clap::CommandFactory;

        let help = Cli::command().render_long_help().to_string();
        assert!(help.contains("rejected as an empty range"));
    }

    #[test]
    fn test_chapter_must_be_a_number() {
        let result = Cli::try_parse_from(["chapter-harvest", "https://x.example", "out", "one", "5"]);
        assert!(result.is_err());
    }
}
