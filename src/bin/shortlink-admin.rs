use anyhow::Result;
use clap::{Parser, Subcommand};
use shortlink::clock::SystemClock;
use shortlink::config::Config;
use shortlink::geo::GeoResolver;
use shortlink::service::{RedirectService, StatsError};
use shortlink::storage;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "shortlink-admin")]
#[command(about = "Shortlink management CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a short link
    Create {
        /// Absolute URL to shorten
        url: String,
        /// Minutes until the link stops resolving
        #[arg(long)]
        validity: Option<i64>,
        /// Use this shortcode instead of generating one
        #[arg(long)]
        shortcode: Option<String>,
    },
    /// Show a link and its click history
    Stats {
        shortcode: String,
    },
    /// Delete a link and its click history
    Delete {
        shortcode: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let config = Config::from_env()?;

    let storage = storage::connect(&config.database).await?;
    let service = RedirectService::new(
        Arc::clone(&storage),
        GeoResolver::disabled(),
        Arc::new(SystemClock),
        config.links.clone(),
    );

    match cli.command {
        Commands::Create {
            url,
            validity,
            shortcode,
        } => {
            let record = service
                .create(&url, validity, shortcode.as_deref())
                .await?;
            println!("✓ Created {}", config.short_link(&record.link.shortcode));
            println!("  expires {}", record.link.expiry.to_rfc3339());
        }
        Commands::Stats { shortcode } => match service.stats(&shortcode).await {
            Ok(record) => {
                println!("Target:  {}", record.link.long_url);
                println!("Created: {}", record.link.created_at.to_rfc3339());
                println!("Expires: {}", record.link.expiry.to_rfc3339());
                println!("Clicks:  {}", record.link.click_count);
                if !record.click_logs.is_empty() {
                    println!();
                    println!("{:<32} {:<10} {}", "Timestamp", "Location", "Referrer");
                    println!("{}", "-".repeat(80));
                    for click in record.click_logs {
                        println!(
                            "{:<32} {:<10} {}",
                            click.timestamp.to_rfc3339(),
                            click.location,
                            click.referrer
                        );
                    }
                }
            }
            Err(StatsError::NotFound) => println!("⚠ Shortcode '{}' not found", shortcode),
            Err(e) => return Err(e.into()),
        },
        Commands::Delete { shortcode } => {
            if storage.delete(&shortcode).await? {
                println!("✓ Deleted '{}' and its click history", shortcode);
            } else {
                println!("⚠ Shortcode '{}' not found", shortcode);
            }
        }
    }

    Ok(())
}
