use anyhow::Result;
use clap::{Parser, Subcommand};
use lecture_assigner::schedule::ClassCode;
use lecture_assigner::store::{IndexStore, SlotValue};
use lecture_assigner::Config;
use std::path::PathBuf;
use tracing::info;

#[derive(Parser)]
#[command(name = "index-tool")]
#[command(about = "Read-only inspection of the lecture index")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (defaults to lecture-assigner.toml when present)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Lecture index, overriding configuration
    #[arg(long)]
    index: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// List every slot with its state
    List {
        /// Only show one class (e.g. "avc185" or "AVC 185")
        #[arg(long)]
        class: Option<ClassCode>,
    },
    /// Filled and open slot counts per class
    Stats,
    /// Recording ids already placed in the index
    Ids,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter("lecture_assigner=info,index_tool=info,warn")
        .init();

    let cli = Cli::parse();

    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(index) = cli.index {
        config.store.index_path = index;
    }

    let store = IndexStore::new(config.store.index_path.clone(), config.store.backup_suffix.clone());
    let snapshot = store.load(&config.store.placeholder_marker).await?.snapshot();

    match cli.command {
        Commands::List { class } => {
            for (coordinate, value) in snapshot
                .iter()
                .filter(|(c, _)| class.map_or(true, |wanted| c.class_code == wanted))
            {
                let state = match value {
                    SlotValue::Resolved(url) => format!("✅ {}", url),
                    SlotValue::Placeholder(_) => "⬜ unassigned".to_string(),
                };
                println!("{}\t{}", coordinate, state);
            }
        }

        Commands::Stats => {
            info!("📊 Index Statistics:");
            for code in ClassCode::ALL {
                let stats = snapshot.class_stats(code);
                if stats.total_slots == 0 {
                    continue;
                }
                info!(
                    "  {}: {} filled, {} open, {} total",
                    code,
                    stats.filled_slots,
                    stats.open_slots(),
                    stats.total_slots
                );
            }
        }

        Commands::Ids => {
            let mut ids: Vec<String> = snapshot.existing_external_ids().into_iter().collect();
            ids.sort();
            info!("Found {} existing video IDs", ids.len());
            for id in ids {
                println!("{}", id);
            }
        }
    }

    Ok(())
}
