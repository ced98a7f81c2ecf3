use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use biked_data::catalog::{is_remote_reference, load_catalog, save_catalog};
use biked_data::resolve::{
    load_overrides, Fetcher, ImageStore, OverrideMap, Resolver, RunOptions, SearchClient,
    DEFAULT_MIN_IMAGE_BYTES, DEFAULT_TIMEOUT_SECS,
};
use biked_data::util::env as env_util;
use clap::{Parser, Subcommand};
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "biked-data", version, about = "Biked catalog image tooling")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
#[command(rename_all = "kebab-case")]
enum Commands {
    /// Resolve and download a display image for every catalog entry
    Resolve {
        /// Path to the catalog JSON file
        #[arg(long, default_value = "bikes.json")]
        catalog: PathBuf,
        /// Directory for downloaded images
        #[arg(long, default_value = "Images")]
        images_dir: PathBuf,
        /// Optional JSON file with per-identifier overrides
        /// ({"<id>": {"image_url": ..., "search_query": ...}})
        #[arg(long)]
        overrides: Option<PathBuf>,
        /// Re-resolve entries that already have a valid local image
        #[arg(long, default_value_t = false)]
        force: bool,
        /// Politeness delay between entries, in seconds
        #[arg(long, default_value_t = 4)]
        delay_secs: u64,
        /// Minimum accepted image size in bytes
        #[arg(long, default_value_t = DEFAULT_MIN_IMAGE_BYTES)]
        min_bytes: u64,
        /// Maximum number of entries to process
        #[arg(long)]
        limit: Option<usize>,
        /// Log what would be attempted without any network requests
        #[arg(long, default_value_t = false)]
        dry_run: bool,
    },
    /// Print a summary of the catalog
    Show {
        /// Path to the catalog JSON file
        #[arg(long, default_value = "bikes.json")]
        catalog: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    env_util::init_env();
    biked_data::trace::init_tracing("info")?;

    let cli = Cli::parse();
    match cli.command {
        Commands::Resolve {
            catalog,
            images_dir,
            overrides,
            force,
            delay_secs,
            min_bytes,
            limit,
            dry_run,
        } => {
            let entries = load_catalog(&catalog)?;
            info!(entries = entries.len(), catalog = %catalog.display(), "catalog loaded");

            let override_map = match overrides {
                Some(path) => load_overrides(&path)?,
                None => OverrideMap::new(),
            };

            let timeout = env_util::env_parse("BIKED_HTTP_TIMEOUT_SECS", DEFAULT_TIMEOUT_SECS);
            let fetcher = Fetcher::new(timeout).context("failed to build HTTP client")?;
            let search = match env_util::env_opt("BIKED_SEARCH_URL") {
                Some(base) => SearchClient::with_base_url(fetcher.clone(), base),
                None => SearchClient::new(fetcher.clone()),
            };
            let store = ImageStore::new(fetcher.clone(), images_dir, min_bytes);
            let options = RunOptions {
                force: force || env_util::env_flag("BIKED_FORCE", false),
                dry_run,
                delay: Duration::from_secs(delay_secs),
                limit,
            };
            let resolver = Resolver::new(fetcher, search, store, override_map, options);

            let (updated, summary) = resolver.run(&entries).await;
            if !dry_run {
                save_catalog(&catalog, &updated)?;
            }
            info!(
                updated = summary.updated,
                skipped = summary.skipped,
                failed = summary.failed,
                planned = summary.planned,
                "done"
            );
        }
        Commands::Show { catalog } => {
            let entries = load_catalog(&catalog)?;
            let local = entries
                .iter()
                .filter(|e| e.display_image().is_some_and(|i| !is_remote_reference(i)))
                .count();
            println!("{} entries ({} with local images)", entries.len(), local);
            for e in &entries {
                println!(
                    "  {:<24} {} {} -> {}",
                    e.id,
                    e.brand,
                    e.model,
                    e.display_image().unwrap_or("<no image>")
                );
            }
        }
    }
    Ok(())
}
