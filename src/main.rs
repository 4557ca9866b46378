use anyhow::Result;
use clap::Parser;
use daftstats::config::{Config, Overrides};
use daftstats::fetcher::HttpFetcher;
use daftstats::s3::S3Store;
use daftstats::segments::{format_summary, Orchestrator, SegmentSet};
use daftstats::storage::HistoryStore;
use daftstats::{debug, tui};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[clap(author, version, about = "Daft.ie Dublin rent and room-sharing price tracker")]
struct Args {
    /// Path to the JSON stats history file (defaults to STATS_FILE or stats.json)
    #[clap(short, long)]
    output: Option<PathBuf>,

    /// Print extra crawl and storage details (same as setting VERBOSE)
    #[clap(short, long)]
    verbose: bool,

    /// Delay before each listing page request, in milliseconds
    #[clap(short, long)]
    delay_ms: Option<u64>,

    /// S3 bucket to read history from and publish it to (overrides S3_BUCKET)
    #[clap(short, long)]
    bucket: Option<String>,

    /// Custom S3-compatible endpoint (overrides S3_ENDPOINT)
    #[clap(short, long)]
    endpoint: Option<String>,

    /// Keep reading history from the bucket but skip the uploads
    #[clap(long)]
    no_upload: bool,

    /// Hide the per-segment progress spinners
    #[clap(long)]
    no_progress: bool,
}

impl Args {
    fn overrides(&self) -> Overrides {
        Overrides {
            output: self.output.clone(),
            verbose: self.verbose,
            delay_ms: self.delay_ms,
            bucket: self.bucket.clone(),
            endpoint: self.endpoint.clone(),
            no_upload: self.no_upload,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let args = Args::parse();
    let config = Config::from_env()?.with_overrides(args.overrides());
    debug::set_verbose(config.verbose);

    println!("Daft.ie Price Tracker");
    println!("=====================");

    let fetcher = HttpFetcher::new(config.fetch_timeout)?;
    let progress = tui::CrawlProgress::new();
    let mut orchestrator = Orchestrator::new(&fetcher, config.index_delay);
    if !args.no_progress {
        orchestrator = orchestrator.with_progress(&progress);
    }

    let report = orchestrator.run_all(&SegmentSet::default()).await?;

    tui::print_summary(&format_summary(&report))?;

    let mut store = HistoryStore::local(config.stats_file.clone());
    if let Some(s3) = &config.s3 {
        let remote = S3Store::connect(&s3.bucket, s3.endpoint.as_deref(), s3.public_read).await;
        store = store.with_remote(Box::new(remote), s3.upload);
    }

    store.persist(&report, chrono::Utc::now()).await?;

    Ok(())
}
