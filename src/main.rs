use anyhow::{anyhow, Context, Result};
use chrono::Utc;
use clap::{Args as ClapArgs, Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;

use yt_outliers::analysis::{analyze_thumbnail, CompletionClient, VisionClient};
use yt_outliers::channels::ChannelGroups;
use yt_outliers::config::{self, Config};
use yt_outliers::db;
use yt_outliers::model::{ResultBundle, SearchMode, SearchParams, SortOrder, Timeframe, VideoRecord};
use yt_outliers::service::{run_search, SearchOutcome};
use yt_outliers::session::Page;
use yt_outliers::youtube::YouTubeClient;

#[derive(Debug, Parser)]
#[command(author, version, about = "Find videos that outperform their channel's average")]
struct Args {
    /// Path to YAML config file
    #[arg(long, default_value = "config.yaml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Search videos, score them and print regular videos and shorts
    Search(SearchArgs),
}

#[derive(Debug, ClapArgs)]
struct SearchArgs {
    /// Keywords to search for
    query: String,

    /// `generic` searches everywhere, `niche` only the selected channel groups
    #[arg(long, default_value = "generic")]
    mode: SearchMode,

    /// JSON file mapping group names to channel ids (niche mode)
    #[arg(long)]
    channels_file: Option<PathBuf>,

    /// Channel group to include; repeat to combine groups (niche mode)
    #[arg(long = "group")]
    groups: Vec<String>,

    /// Upload window: any, 24h, 48h, 7d, 15d, 1m
    #[arg(long, default_value = "any")]
    timeframe: Timeframe,

    /// Sort each bucket by `views` or `outlier` score
    #[arg(long, default_value = "views")]
    sort: SortOrder,

    /// Ignore any cached result and search again
    #[arg(long)]
    refresh: bool,

    /// Analyze the thumbnail of this video id from the results
    #[arg(long)]
    analyze: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .compact()
        .init();

    let args = Args::parse();
    let cfg = config::load(Some(args.config.as_path()))?;
    cfg.ensure_dirs()?;

    let pool = db::init_pool(&cfg.database_url()).await?;
    db::run_migrations(&pool).await?;

    match args.command {
        Command::Search(search) => run(&cfg, &pool, search).await,
    }
}

async fn run(cfg: &Config, pool: &db::Pool, args: SearchArgs) -> Result<()> {
    let channels = match (&args.mode, &args.channels_file) {
        (SearchMode::Niche, Some(path)) => {
            let groups = ChannelGroups::load(path)
                .with_context(|| format!("failed to load {}", path.display()))?;
            let selected = groups.select(args.groups.as_slice());
            if selected.is_empty() {
                info!(available = ?groups.names(), "no channels selected; searching everywhere");
            }
            selected
        }
        _ => Vec::new(),
    };

    let params = SearchParams {
        mode: args.mode,
        channels,
        query: args.query.clone(),
        timeframe: args.timeframe,
        sort: args.sort,
    };

    let provider = YouTubeClient::from_config(cfg)?;
    let options = cfg.search.discover_options();
    let outcome = run_search(pool, &provider, &params, &options, Utc::now(), args.refresh).await?;

    let mut page = Page::default();
    match outcome {
        SearchOutcome::NoResults => {
            println!("No results found.");
            return Ok(());
        }
        SearchOutcome::Cached(results) => {
            println!("(cached)");
            page = page.show_results(results);
        }
        SearchOutcome::Fresh(results) => page = page.show_results(results),
    }

    if let Page::Displaying { results } = &page {
        print_results(results);
    }

    let Some(video_id) = args.analyze.as_deref() else {
        return Ok(());
    };
    let page = page.select_video(video_id)?;
    if let Some(video) = page.selected_video() {
        analyze(cfg, video).await?;
    }
    Ok(())
}

async fn analyze(cfg: &Config, video: &VideoRecord) -> Result<()> {
    let vision = cfg
        .vision
        .as_ref()
        .ok_or_else(|| anyhow!("vision section missing from config"))?;
    let openai = cfg
        .openai
        .as_ref()
        .ok_or_else(|| anyhow!("openai section missing from config"))?;
    let vision = VisionClient::from_config(vision)?;
    let text = CompletionClient::from_config(openai)?;

    let url = video.thumbnail_url.as_deref().unwrap_or_default();
    println!();
    println!("Thumbnail analysis: {}", display_title(video));
    let analysis = analyze_thumbnail(&vision, &text, url).await;
    println!("Vision analysis: {}", analysis.description);
    println!("Narration: {}", analysis.narration);
    Ok(())
}

fn print_results(results: &ResultBundle) {
    print_bucket("Regular videos", &results.regular, "No regular videos found.");
    println!();
    print_bucket("Shorts", &results.shorts, "No shorts found.");
}

fn print_bucket(heading: &str, videos: &[VideoRecord], empty: &str) {
    println!("{heading}");
    if videos.is_empty() {
        println!("  {empty}");
        return;
    }
    for video in videos {
        println!(
            "  [{}] {} | views: {} | outlier score: {}",
            video.id,
            display_title(video),
            video.view_count,
            video.outlier_score
        );
    }
}

fn display_title(video: &VideoRecord) -> &str {
    if video.title.is_empty() {
        "No Title"
    } else {
        &video.title
    }
}
