use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

use yt_outliers::config;
use yt_outliers::db;

#[derive(Parser, Debug)]
#[command(about = "Print every cached search and session log entry")]
struct Args {
    /// Path to YAML config
    #[arg(long, default_value = "config.yaml")]
    config: PathBuf,

    /// Print full result bundles as JSON instead of a summary
    #[arg(long)]
    json: bool,
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
    let pool = db::init_pool(&cfg.database_url()).await?;
    db::run_migrations(&pool).await?;

    let (cache, sessions) = db::list_all(&pool).await?;

    if args.json {
        let dump = serde_json::json!({ "cache": cache, "sessions": sessions });
        println!("{}", serde_json::to_string_pretty(&dump)?);
        return Ok(());
    }

    println!("Cache ({} entries):", cache.len());
    for entry in &cache {
        println!(
            "  {} | {} regular, {} shorts | {}",
            entry.key,
            entry.value.regular.len(),
            entry.value.shorts.len(),
            entry.created_at.to_rfc3339()
        );
    }
    println!("Sessions ({} entries):", sessions.len());
    for entry in &sessions {
        println!(
            "  #{} {} | {} videos | {}",
            entry.id,
            entry.key,
            entry.value.len(),
            entry.logged_at.to_rfc3339()
        );
    }
    Ok(())
}
