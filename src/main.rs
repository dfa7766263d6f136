use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use lecture_assigner::catalog::{FileCatalog, VideoCatalog, YouTubeCatalog};
use lecture_assigner::monitor::{load_config, notify_failure, Monitor};
use lecture_assigner::notify::LogNotifier;

#[derive(Parser)]
#[command(name = "lecture-assigner")]
#[command(version, about = "Assign new lecture recordings to semester schedule slots")]
struct Cli {
    /// Configuration file (defaults to lecture-assigner.toml when present)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Lecture index to update, overriding configuration
    #[arg(short, long, value_name = "FILE")]
    index: Option<PathBuf>,

    /// Read candidates from a JSON file instead of YouTube
    #[arg(long, value_name = "FILE")]
    candidates: Option<PathBuf>,

    /// Compute assignments without writing the index
    #[arg(long)]
    dry_run: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let default_filter = if cli.verbose {
        "lecture_assigner=debug,warn"
    } else {
        "lecture_assigner=info,warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .init();

    let mut config = load_config(cli.config.as_deref(), &LogNotifier).await?;
    if let Some(index) = cli.index {
        config.store.index_path = index;
    }
    info!("{}", config.summary());

    let catalog: Box<dyn VideoCatalog> = match cli.candidates {
        Some(path) => Box::new(FileCatalog::new(path)),
        None => {
            let remote = config.validate_remote().and_then(|_| {
                YouTubeCatalog::new(config.youtube.clone()).map_err(anyhow::Error::from)
            });
            match remote {
                Ok(catalog) => Box::new(catalog),
                Err(e) => {
                    notify_failure(&LogNotifier, &config, &e.to_string()).await;
                    return Err(e);
                }
            }
        }
    };

    let mut monitor = Monitor::new(config, catalog, Box::new(LogNotifier)).with_dry_run(cli.dry_run);
    let summary = monitor.run().await?;

    if cli.dry_run {
        for assignment in &summary.assignments {
            println!(
                "{}\t{}\t{}",
                assignment.coordinate, assignment.video_url, assignment.title
            );
        }
    }

    if summary.rejections.is_empty() {
        info!("🎉 {} assigned from {} candidates", summary.assignments.len(), summary.candidates);
    } else {
        warn!(
            "{} assigned, {} skipped from {} candidates",
            summary.assignments.len(),
            summary.rejections.len(),
            summary.candidates
        );
    }

    Ok(())
}
