// src/main.rs
// =============================================================================
// This is the entry point of our CLI application.
//
// What happens here:
// 1. Parse command-line arguments using clap
// 2. Set up logging (tracing), honouring RUST_LOG or -v/-vv
// 3. Resolve the arguments into a Config: crawl mode or batch mode
// 4. Run the chosen mode; it returns once every chapter task has settled
// 5. Print the summary and exit (0 = all good, 1 = failures, 2 = error)
// =============================================================================

mod cli;
mod config;
mod crawl;
mod download;
mod error;
mod extract;
mod report;

use anyhow::Result;
use clap::Parser;
use cli::Cli;
use config::Config;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let exit_code = match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            // {:#} prints the whole cause chain on one line
            eprintln!("Error: {:#}", e);
            2
        }
    };

    std::process::exit(exit_code);
}

// Returns:
//   Ok(0) = every image downloaded or skipped
//   Ok(1) = some images/chapters failed or the crawl stopped early
//   Err   = bad arguments or client setup failure
async fn run(cli: Cli) -> Result<i32> {
    let config = Config::from_cli(&cli)?;
    let session = config.build_session()?;

    tracing::debug!("Referer: {}", config.referer);

    let summary = crawl::run(&config, &session).await;

    report::print_summary(&summary, cli.json)?;
    Ok(report::exit_code(&summary))
}

// Logs go to stderr so --json output on stdout stays clean
fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "chapter_harvest=info",
        1 => "chapter_harvest=debug",
        _ => "chapter_harvest=trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
