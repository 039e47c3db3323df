use std::path::PathBuf;
use clap::{Parser, Subcommand};
use anyhow::{Context, Result};

use venue_cache::cache::{FileVenueStore, PurgeScope, VenueStore};
use venue_cache::clock::{Clock, SystemClock};
use venue_cache::config::{default_store_path, ServiceConfig};
use venue_cache::model::CacheLocation;
use venue_cache::telemetry::init_tracing;

#[derive(Parser)]
#[command(name = "venue-cache")]
#[command(about = "Venue cache administration", long_about = None)]
struct Cli {
    /// Cache store file (defaults to VENUE_CACHE_STORE_PATH or the data directory)
    #[arg(short, long)]
    store: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show entry counts per category and freshness band
    Stats,

    /// Remove cached entries
    Purge {
        /// Category to remove, or "all"
        scope: String,
    },

    /// Show the cached venues for one location
    Show {
        category: String,
        city: String,

        #[arg(long)]
        district: Option<String>,

        #[arg(long)]
        neighborhood: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing("venue_cache=info");

    let cli = Cli::parse();
    let config = ServiceConfig::from_env().context("invalid configuration")?;
    let policy = config
        .cache
        .freshness_policy()
        .map_err(|e| anyhow::anyhow!(e))?;

    let path = cli
        .store
        .or(config.cache.store_path)
        .unwrap_or_else(default_store_path);
    let store = FileVenueStore::open(&path)
        .await
        .with_context(|| format!("failed to open cache store {}", path.display()))?;
    let now = SystemClock.now();

    match cli.command {
        Commands::Stats => {
            let stats = store.stats(&policy, now).await?;
            if stats.entries() == 0 {
                println!("Cache is empty ({})", path.display());
                return Ok(());
            }

            println!("{:<24} {:>6} {:>6} {:>8}", "CATEGORY", "FRESH", "STALE", "EXPIRED");
            println!("{}", "=".repeat(48));
            for (category, counts) in &stats.by_category {
                println!(
                    "{:<24} {:>6} {:>6} {:>8}",
                    category, counts.fresh, counts.stale, counts.expired
                );
            }
            println!("{}", "-".repeat(48));
            println!(
                "{:<24} {:>6} {:>6} {:>8}",
                "total", stats.totals.fresh, stats.totals.stale, stats.totals.expired
            );
            println!("{} venues, {:.1}% servable", stats.venues, stats.servable_rate());
        }

        Commands::Purge { ref scope } => {
            let scope = PurgeScope::parse(scope);
            let removed = store.purge(&scope).await?;
            println!("Removed {} entries ({})", removed, scope);
        }

        Commands::Show {
            ref category,
            ref city,
            ref district,
            ref neighborhood,
        } => {
            let location = CacheLocation::new(category.as_str(), city.as_str())
                .district(district.as_deref())
                .neighborhood(neighborhood.as_deref());
            let key = location.cache_key();

            let Some(entry) = store.read(&key).await? else {
                println!("No cache entry for {}", key);
                return Ok(());
            };

            println!("Key:       {}", entry.key);
            println!("State:     {}", entry.freshness(&policy, now));
            println!("Age:       {}h", entry.age(now).num_hours());
            println!("Updated:   {}", entry.updated_at.format("%Y-%m-%d %H:%M"));
            if let Some(refreshed) = entry.last_refresh_at {
                println!("Refreshed: {}", refreshed.format("%Y-%m-%d %H:%M"));
            }
            println!("Venues:    {}", entry.payload.len());
            for venue in &entry.payload {
                let award = venue.award_tier.map(|t| format!(" [{}]", t)).unwrap_or_default();
                let instagram = match (&venue.instagram, venue.instagram_verified) {
                    (Some(url), true) => format!("  {}", url),
                    (Some(url), false) => format!("  {} (unverified)", url),
                    (None, _) => String::new(),
                };
                println!("  - {}{}{}", venue.name, award, instagram);
            }
        }
    }

    Ok(())
}
